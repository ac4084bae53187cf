//! Diagnostics collected while building member meshes.
//!
//! The finalize pass records topology counts and repairs; the extruder adds the
//! number of cross sections it stitched together. Member tubes are open at
//! both ends, so open edges are expected there and only non-manifold edges
//! point at broken input.

use std::fmt;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeomMeshDiagnostics {
    pub vertex_count: usize,
    pub triangle_count: usize,

    /// Number of cross-section rings stitched into the mesh.
    pub section_count: usize,

    /// Vertices merged during tolerance-based welding. Profiles built from
    /// several touching segments always weld at the shared corners.
    pub welded_vertex_count: usize,

    pub flipped_triangle_count: usize,
    pub degenerate_triangle_count: usize,

    /// Edges with a single adjacent triangle.
    pub open_edge_count: usize,

    /// Edges shared by more than two triangles.
    pub non_manifold_edge_count: usize,

    pub warnings: Vec<String>,
}

impl GeomMeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.open_edge_count == 0
    }

    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Sums the counts of `other` into `self` and appends its warnings.
    pub fn merge(&mut self, other: &GeomMeshDiagnostics) {
        self.vertex_count += other.vertex_count;
        self.triangle_count += other.triangle_count;
        self.section_count += other.section_count;
        self.welded_vertex_count += other.welded_vertex_count;
        self.flipped_triangle_count += other.flipped_triangle_count;
        self.degenerate_triangle_count += other.degenerate_triangle_count;
        self.open_edge_count += other.open_edge_count;
        self.non_manifold_edge_count += other.non_manifold_edge_count;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Short one-line form for log output: `"V:{vertices} T:{triangles} S:{sections} [..]"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "V:{} T:{} S:{}",
            self.vertex_count, self.triangle_count, self.section_count
        )];

        if self.welded_vertex_count > 0 {
            parts.push(format!("welded:{}", self.welded_vertex_count));
        }
        if self.flipped_triangle_count > 0 {
            parts.push(format!("flipped:{}", self.flipped_triangle_count));
        }
        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.open_edge_count > 0 {
            parts.push(format!("open:{}", self.open_edge_count));
        }
        if self.non_manifold_edge_count > 0 {
            parts.push(format!("non-manifold:{}", self.non_manifold_edge_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for GeomMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Sections: {}", self.section_count)?;

        if self.welded_vertex_count > 0 || self.flipped_triangle_count > 0 || self.degenerate_triangle_count > 0 {
            writeln!(f, "  Repairs:")?;
            if self.welded_vertex_count > 0 {
                writeln!(f, "    - Welded vertices: {}", self.welded_vertex_count)?;
            }
            if self.flipped_triangle_count > 0 {
                writeln!(f, "    - Flipped triangles: {}", self.flipped_triangle_count)?;
            }
            if self.degenerate_triangle_count > 0 {
                writeln!(f, "    - Degenerate triangles removed: {}", self.degenerate_triangle_count)?;
            }
        }

        if self.open_edge_count > 0 || self.non_manifold_edge_count > 0 {
            writeln!(f, "  Topology:")?;
            if self.open_edge_count > 0 {
                writeln!(f, "    - Open edges: {}", self.open_edge_count)?;
            }
            if self.non_manifold_edge_count > 0 {
                writeln!(f, "    - Non-manifold edges: {}", self.non_manifold_edge_count)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_issues() {
        let diag = GeomMeshDiagnostics::default();
        assert!(diag.is_watertight());
        assert!(diag.is_manifold());
        assert!(!diag.has_warnings());
    }

    #[test]
    fn test_merge() {
        let mut diag1 = GeomMeshDiagnostics {
            vertex_count: 100,
            triangle_count: 50,
            section_count: 3,
            open_edge_count: 2,
            warnings: vec!["first warning".to_string()],
            ..Default::default()
        };

        let diag2 = GeomMeshDiagnostics {
            vertex_count: 200,
            triangle_count: 100,
            section_count: 4,
            non_manifold_edge_count: 1,
            warnings: vec!["second warning".to_string()],
            ..Default::default()
        };

        diag1.merge(&diag2);

        assert_eq!(diag1.vertex_count, 300);
        assert_eq!(diag1.triangle_count, 150);
        assert_eq!(diag1.section_count, 7);
        assert!(!diag1.is_manifold());
        assert_eq!(diag1.warnings, vec!["first warning", "second warning"]);
    }

    #[test]
    fn test_summary_lists_only_nonzero_issues() {
        let diag = GeomMeshDiagnostics {
            vertex_count: 16,
            triangle_count: 24,
            section_count: 4,
            welded_vertex_count: 12,
            open_edge_count: 8,
            ..Default::default()
        };

        assert_eq!(diag.summary(), "V:16 T:24 S:4 welded:12 open:8");
    }

    #[test]
    fn test_display() {
        let mut diag = GeomMeshDiagnostics {
            vertex_count: 8,
            triangle_count: 8,
            open_edge_count: 8,
            ..Default::default()
        };
        diag.add_warning("test warning");

        let output = format!("{diag}");
        assert!(output.contains("Vertices: 8"));
        assert!(output.contains("Open edges: 8"));
        assert!(output.contains("test warning"));
    }
}
