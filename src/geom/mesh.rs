use std::collections::HashMap;

use super::diagnostics::GeomMeshDiagnostics;
use super::surface::Surface;
use super::{Point3, Tolerance, Vec3};

/// Indexed triangle mesh. `indices` is a triangle list into `positions`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    /// `u` runs around the cross section, `v` along the member.
    pub uvs: Option<Vec<[f64; 2]>>,
    pub normals: Option<Vec<[f64; 3]>>,
}

impl GeomMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            uvs: None,
            normals: None,
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Triangles as index triples, in buffer order.
    #[must_use]
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect()
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    #[must_use]
    pub fn has_valid_attribute_lengths(&self) -> bool {
        let n = self.positions.len();
        self.uvs.as_ref().is_none_or(|uvs| uvs.len() == n)
            && self.normals.as_ref().is_none_or(|normals| normals.len() == n)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.has_triangle_indices() {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if !self.has_valid_attribute_lengths() {
            return Err("mesh attribute buffers do not match vertex count".to_string());
        }
        Ok(())
    }
}

/// Boundary the caller expects after welding. Swept member tubes are open at
/// both ends, so their boundary edges are not worth a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedBoundary {
    Closed,
    Open,
}

/// Welds, cleans and orients a raw triangle soup and computes smooth normals.
pub(crate) fn finalize_mesh(
    points: Vec<Point3>,
    uvs: Option<Vec<[f64; 2]>>,
    indices: Vec<u32>,
    tol: Tolerance,
    expected: ExpectedBoundary,
) -> (GeomMesh, GeomMeshDiagnostics) {
    let (points, uvs, indices, welded_vertex_count) = weld_mesh_vertices(points, uvs.as_deref(), indices, tol);

    let (mut indices, degenerate_triangle_count) = cull_degenerate_triangles(&points, &indices, tol);

    let flipped_triangle_count = fix_triangle_winding_consistency(&mut indices);
    let (open_edge_count, non_manifold_edge_count) = count_edge_topology(&indices);

    let mut warnings = Vec::new();
    if open_edge_count == 0 && non_manifold_edge_count == 0 {
        let volume = signed_volume(&points, &indices);
        if volume.is_finite() && volume < 0.0 {
            flip_all_triangles(&mut indices);
            warnings.push("mesh orientation flipped (outward)".to_string());
        }
    }
    if open_edge_count > 0 && expected == ExpectedBoundary::Closed {
        warnings.push("mesh has open edges".to_string());
    }
    if non_manifold_edge_count > 0 {
        warnings.push("mesh has non-manifold edges".to_string());
    }

    let normals = compute_smooth_normals(&points, &indices);

    let mesh = GeomMesh {
        positions: points.into_iter().map(Point3::to_array).collect(),
        indices,
        uvs,
        normals: Some(normals),
    };

    let diagnostics = GeomMeshDiagnostics {
        vertex_count: mesh.positions.len(),
        triangle_count: mesh.triangle_count(),
        welded_vertex_count,
        flipped_triangle_count,
        degenerate_triangle_count,
        open_edge_count,
        non_manifold_edge_count,
        warnings,
        ..GeomMeshDiagnostics::default()
    };

    (mesh, diagnostics)
}

/// Meshes a surface on a regular `u_count` x `v_count` parameter grid.
///
/// Grid points are stored `u`-fastest; each grid cell becomes two triangles.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn mesh_surface_grid(
    surface: &impl Surface,
    u_count: usize,
    v_count: usize,
) -> Result<(GeomMesh, GeomMeshDiagnostics), String> {
    if u_count < 2 || v_count < 2 {
        return Err(format!("surface grid needs at least 2x2 points, got {u_count}x{v_count}"));
    }
    if u_count.saturating_mul(v_count) > u32::MAX as usize {
        return Err("surface grid exceeds the u32 index range".to_string());
    }

    let (u0, u1) = surface.domain_u();
    let (v0, v1) = surface.domain_v();
    let mut points = Vec::with_capacity(u_count * v_count);
    let mut uvs = Vec::with_capacity(u_count * v_count);
    for j in 0..v_count {
        let vt = j as f64 / (v_count - 1) as f64;
        for i in 0..u_count {
            let ut = i as f64 / (u_count - 1) as f64;
            points.push(surface.point_at(u0 + (u1 - u0) * ut, v0 + (v1 - v0) * vt));
            uvs.push([ut, vt]);
        }
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err("surface evaluated to a non-finite point".to_string());
    }

    let mut indices = Vec::with_capacity((u_count - 1) * (v_count - 1) * 6);
    for j in 0..(v_count - 1) {
        for i in 0..(u_count - 1) {
            let i00 = (j * u_count + i) as u32;
            let i10 = (j * u_count + i + 1) as u32;
            let i01 = ((j + 1) * u_count + i) as u32;
            let i11 = ((j + 1) * u_count + i + 1) as u32;
            indices.extend_from_slice(&[i00, i10, i11, i00, i11, i01]);
        }
    }

    Ok(finalize_mesh(points, Some(uvs), indices, Tolerance::WELD, ExpectedBoundary::Open))
}

/// Merges vertices closer than `tol` using a quantized spatial hash. The first
/// occurrence of a vertex wins, including its UV. Non-finite points are never
/// merged.
pub(crate) fn weld_mesh_vertices(
    points: Vec<Point3>,
    uvs: Option<&[[f64; 2]]>,
    indices: Vec<u32>,
    tol: Tolerance,
) -> (Vec<Point3>, Option<Vec<[f64; 2]>>, Vec<u32>, usize) {
    if !tol.eps.is_finite() || tol.eps <= 0.0 {
        return (points, uvs.map(<[[f64; 2]]>::to_vec), indices, 0);
    }

    let inv = 1.0 / tol.eps;
    let cell_of = |p: Point3| -> Option<(i64, i64, i64)> {
        if !p.is_finite() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let q = |value: f64| (value * inv).floor().clamp(i64::MIN as f64, i64::MAX as f64) as i64;
        Some((q(p.x), q(p.y), q(p.z)))
    };

    let mut buckets: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    let mut remap: Vec<u32> = Vec::with_capacity(points.len());
    let mut out_points: Vec<Point3> = Vec::with_capacity(points.len());
    let mut out_uvs: Option<Vec<[f64; 2]>> = uvs.map(|_| Vec::with_capacity(points.len()));

    for (i, p) in points.iter().copied().enumerate() {
        let key = cell_of(p);

        let found = key.and_then(|(kx, ky, kz)| {
            (-1i64..=1)
                .flat_map(|dx| (-1i64..=1).flat_map(move |dy| (-1i64..=1).map(move |dz| (dx, dy, dz))))
                .filter_map(|(dx, dy, dz)| buckets.get(&(kx + dx, ky + dy, kz + dz)))
                .flatten()
                .copied()
                .find(|&cand| tol.approx_eq_point3(out_points[cand as usize], p))
        });

        let out_idx = if let Some(existing) = found {
            existing
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let new_idx = out_points.len() as u32;
            out_points.push(p);
            if let (Some(src), Some(dst)) = (uvs, out_uvs.as_mut()) {
                dst.push(src.get(i).copied().unwrap_or([0.0, 0.0]));
            }
            if let Some(key) = key {
                buckets.entry(key).or_default().push(new_idx);
            }
            new_idx
        };

        remap.push(out_idx);
    }

    let out_indices = indices
        .into_iter()
        .map(|idx| remap.get(idx as usize).copied().unwrap_or(idx))
        .collect();

    let welded = points.len().saturating_sub(out_points.len());
    (out_points, out_uvs, out_indices, welded)
}

fn cull_degenerate_triangles(points: &[Point3], indices: &[u32], tol: Tolerance) -> (Vec<u32>, usize) {
    let mut out = Vec::with_capacity(indices.len());
    let mut removed = 0usize;

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0], tri[1], tri[2]];
        if i0 == i1 || i1 == i2 || i0 == i2 {
            removed += 1;
            continue;
        }

        let (Some(&a), Some(&b), Some(&c)) = (
            points.get(i0 as usize),
            points.get(i1 as usize),
            points.get(i2 as usize),
        ) else {
            removed += 1;
            continue;
        };

        if tol.approx_eq_point3(a, b) || tol.approx_eq_point3(b, c) || tol.approx_eq_point3(a, c) {
            removed += 1;
            continue;
        }

        let area2 = b.sub_point(a).cross(c.sub_point(a)).length_squared();
        if !area2.is_finite() || area2 <= tol.eps_squared() * tol.eps_squared() {
            removed += 1;
            continue;
        }

        out.extend_from_slice(&[i0, i1, i2]);
    }

    (out, removed)
}

fn edge_key(a: u32, b: u32) -> (u32, u32, bool) {
    if a <= b { (a, b, true) } else { (b, a, false) }
}

/// Makes neighbouring triangles agree on orientation by flood-filling over
/// manifold edges. The first triangle of every connected patch keeps its
/// winding. Returns the number of flipped triangles.
pub(crate) fn fix_triangle_winding_consistency(indices: &mut [u32]) -> usize {
    let tri_count = indices.len() / 3;
    if tri_count == 0 {
        return 0;
    }

    let mut edges: HashMap<(u32, u32), Vec<(usize, bool)>> = HashMap::with_capacity(tri_count * 3);
    for t in 0..tri_count {
        let [i0, i1, i2] = [indices[t * 3], indices[t * 3 + 1], indices[t * 3 + 2]];
        for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
            let (lo, hi, dir) = edge_key(a, b);
            edges.entry((lo, hi)).or_default().push((t, dir));
        }
    }

    let mut visited = vec![false; tri_count];
    let mut flipped = vec![false; tri_count];

    for seed in 0..tri_count {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut stack = vec![seed];

        while let Some(t) = stack.pop() {
            let [i0, i1, i2] = [indices[t * 3], indices[t * 3 + 1], indices[t * 3 + 2]];
            for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
                let (lo, hi, dir_t) = edge_key(a, b);
                let Some(adj) = edges.get(&(lo, hi)) else {
                    continue;
                };
                if adj.len() != 2 {
                    continue;
                }

                let (other, dir_other) = if adj[0].0 == t { adj[1] } else { adj[0] };
                if visited[other] {
                    continue;
                }

                // Consistent neighbours traverse a shared edge in opposite directions.
                visited[other] = true;
                flipped[other] = flipped[t] ^ dir_t ^ dir_other ^ true;
                stack.push(other);
            }
        }
    }

    let mut flipped_count = 0usize;
    for (t, &flip) in flipped.iter().enumerate() {
        if flip {
            indices.swap(t * 3 + 1, t * 3 + 2);
            flipped_count += 1;
        }
    }

    flipped_count
}

/// Returns `(open_edges, non_manifold_edges)`.
fn count_edge_topology(indices: &[u32]) -> (usize, usize) {
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0], tri[1], tri[2]];
        if i0 == i1 || i1 == i2 || i0 == i2 {
            continue;
        }
        for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
            let (lo, hi, _) = edge_key(a, b);
            *edge_counts.entry((lo, hi)).or_insert(0) += 1;
        }
    }

    edge_counts
        .values()
        .fold((0, 0), |(open, non_manifold), &count| match count {
            1 => (open + 1, non_manifold),
            c if c > 2 => (open, non_manifold + 1),
            _ => (open, non_manifold),
        })
}

fn flip_all_triangles(indices: &mut [u32]) {
    for tri in indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
}

fn signed_volume(points: &[Point3], indices: &[u32]) -> f64 {
    let mut volume = 0.0;
    for tri in indices.chunks_exact(3) {
        let (Some(a), Some(b), Some(c)) = (
            points.get(tri[0] as usize),
            points.get(tri[1] as usize),
            points.get(tri[2] as usize),
        ) else {
            continue;
        };
        volume += a.to_vec3().dot(b.to_vec3().cross(c.to_vec3()));
    }
    volume / 6.0
}

/// Area-weighted vertex normals. Isolated vertices get `+Z`.
fn compute_smooth_normals(points: &[Point3], indices: &[u32]) -> Vec<[f64; 3]> {
    let mut sums = vec![Vec3::ZERO; points.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(&a), Some(&b), Some(&c)) = (points.get(i0), points.get(i1), points.get(i2)) else {
            continue;
        };
        let n = b.sub_point(a).cross(c.sub_point(a));
        for i in [i0, i1, i2] {
            sums[i] = sums[i].add(n);
        }
    }

    sums.into_iter()
        .map(|n| n.normalized().unwrap_or(Vec3::Z).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two quads sharing an edge, given as separate vertex sets.
    fn split_strip() -> (Vec<Point3>, Vec<u32>) {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7];
        (points, indices)
    }

    #[test]
    fn weld_merges_shared_edge() {
        let (points, indices) = split_strip();
        let (welded, _, indices, count) =
            weld_mesh_vertices(points, None, indices, Tolerance::default_geom());
        assert_eq!(count, 2);
        assert_eq!(welded.len(), 6);
        assert!(indices.iter().all(|&i| (i as usize) < welded.len()));
    }

    #[test]
    fn weld_keeps_first_uv() {
        let (points, indices) = split_strip();
        let uvs: Vec<[f64; 2]> = (0..8).map(|i| [f64::from(i), 0.0]).collect();
        let (_, uvs, _, _) = weld_mesh_vertices(points, Some(&uvs), indices, Tolerance::default_geom());
        let uvs = uvs.unwrap();
        assert_eq!(uvs.len(), 6);
        assert_eq!(uvs[1], [1.0, 0.0]);
    }

    #[test]
    fn finalize_open_strip_has_no_open_edge_warning() {
        let (points, indices) = split_strip();
        let (mesh, diag) = finalize_mesh(points, None, indices, Tolerance::default_geom(), ExpectedBoundary::Open);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(diag.open_edge_count, 6);
        assert!(diag.is_manifold());
        assert!(!diag.has_warnings());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn finalize_warns_when_closed_mesh_expected() {
        let (points, indices) = split_strip();
        let (_, diag) = finalize_mesh(points, None, indices, Tolerance::default_geom(), ExpectedBoundary::Closed);
        assert!(diag.warnings.iter().any(|w| w == "mesh has open edges"));
    }

    #[test]
    fn culls_collapsed_triangles() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let (out, removed) = cull_degenerate_triangles(&points, &[0, 1, 2, 0, 1, 3, 0, 0, 3], Tolerance::default_geom());
        assert_eq!(out, vec![0, 1, 3]);
        assert_eq!(removed, 2);
    }

    #[test]
    fn winding_fix_flips_inconsistent_neighbour() {
        let mut indices = vec![0, 1, 2, 0, 3, 2];
        let flipped = fix_triangle_winding_consistency(&mut indices);
        assert_eq!(flipped, 1);
        assert_eq!(&indices[3..], &[0, 2, 3]);
    }

    #[test]
    fn surface_grid_mesh_covers_the_patch() {
        let patch = crate::geom::NurbsSurface::from_control_net(
            1,
            1,
            2,
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
            ],
        )
        .unwrap();
        let (mesh, diag) = mesh_surface_grid(&patch, 3, 4).expect("grid mesh should succeed");
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(diag.welded_vertex_count, 0);
        assert!(mesh_surface_grid(&patch, 1, 4).is_err());
    }

    #[test]
    fn smooth_normals_of_flat_strip_point_up() {
        let (points, indices) = split_strip();
        let normals = compute_smooth_normals(&points, &indices);
        for n in normals {
            assert!((n[2] - 1.0).abs() < 1e-12);
        }
    }
}
