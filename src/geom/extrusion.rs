//! Lofts oriented cross sections into one mesh or a set of surfaces per member.
//!
//! Every segment of a profile is sampled into a ring of points at every station;
//! rings of the same segment at consecutive stations are stitched with quads
//! split into two triangles. Segments touching each other weld in the finalize
//! pass, so a multi-segment section still yields one connected mesh.

use super::curve::{averaging_knots, clamped_uniform_knots, interpolate_points};
use super::diagnostics::GeomMeshDiagnostics;
use super::mesh::{ExpectedBoundary, GeomMesh, finalize_mesh};
use super::orient::OrientedProfile;
use super::surface::NurbsSurface;
use super::tween::TweenSegment;
use super::{Point3, Tolerance};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ExtrudeError {
    #[error("extrusion requires at least 2 cross sections, got {found}")]
    TooFewSections { found: usize },
    #[error("cross section {station} has {found} segments, expected {expected}")]
    RingCountMismatch {
        station: usize,
        expected: usize,
        found: usize,
    },
    #[error("segment {segment} of cross section {station} has {found} ring points, expected {expected}")]
    RingPointCountMismatch {
        station: usize,
        segment: usize,
        expected: usize,
        found: usize,
    },
    #[error("segment {segment} of cross section {station} has zero length")]
    ZeroLengthSegment { station: usize, segment: usize },
    #[error("cross section {station} contains non-finite points")]
    NonFinitePoint { station: usize },
    #[error("cross sections {station} and {next} pass through each other")]
    FoldedSections { station: usize, next: usize },
    #[error("extrusion mesh exceeds the 32-bit index range")]
    TooManyVertices,
    #[error("extrusion produced no faces")]
    EmptyMesh,
    #[error("failed to build extrusion surface: {0}")]
    Surface(String),
}

/// Sampled rings of one profile segment, one ring per station.
#[derive(Debug, Clone)]
struct SegmentRings {
    closed: bool,
    rings: Vec<Vec<Point3>>,
}

impl SegmentRings {
    fn ring_len(&self) -> usize {
        self.rings.first().map_or(0, Vec::len)
    }

    /// Number of ring edges, i.e. quads per station gap.
    fn edge_count(&self) -> usize {
        let n = self.ring_len();
        if self.closed { n } else { n.saturating_sub(1) }
    }
}

/// Samples per span: `faces`, raised for closed segments so that their ring has
/// at least three points.
fn samples_per_span(segment: &TweenSegment, faces: usize) -> usize {
    let faces = faces.max(1);
    if segment.is_closed() {
        faces.max(3usize.div_ceil(segment.span_count().max(1)))
    } else {
        faces
    }
}

fn sample_rings(profiles: &[OrientedProfile], faces: usize, tol: Tolerance) -> Result<Vec<SegmentRings>, ExtrudeError> {
    if profiles.len() < 2 {
        return Err(ExtrudeError::TooFewSections { found: profiles.len() });
    }

    let first = &profiles[0];
    let segment_count = first.segments.len();
    let mut segments: Vec<SegmentRings> = first
        .segments
        .iter()
        .map(|segment| SegmentRings {
            closed: segment.is_closed(),
            rings: Vec::with_capacity(profiles.len()),
        })
        .collect();

    for (station, profile) in profiles.iter().enumerate() {
        if profile.segments.len() != segment_count {
            return Err(ExtrudeError::RingCountMismatch {
                station,
                expected: segment_count,
                found: profile.segments.len(),
            });
        }

        for (index, (segment, rings)) in profile.segments.iter().zip(segments.iter_mut()).enumerate() {
            let per_span = samples_per_span(&first.segments[index], faces);
            let ring = segment.sample(per_span);

            if ring.iter().any(|p| !p.is_finite()) {
                return Err(ExtrudeError::NonFinitePoint { station });
            }
            let expected = rings.rings.first().map_or(ring.len(), Vec::len);
            if ring.len() != expected || ring.len() < 2 {
                return Err(ExtrudeError::RingPointCountMismatch {
                    station,
                    segment: index,
                    expected,
                    found: ring.len(),
                });
            }
            let length: f64 = ring.windows(2).map(|w| w[0].distance_to(w[1])).sum();
            if length <= tol.eps {
                return Err(ExtrudeError::ZeroLengthSegment { station, segment: index });
            }

            rings.rings.push(ring);
        }
    }

    check_folding(profiles, &segments, tol)?;
    Ok(segments)
}

/// Every ring point must advance along the member direction of the station it
/// leaves; otherwise the lateral faces fold back through the previous section.
fn check_folding(profiles: &[OrientedProfile], segments: &[SegmentRings], tol: Tolerance) -> Result<(), ExtrudeError> {
    for (station, pair) in profiles.windows(2).enumerate() {
        let direction = pair[0].plane.z_axis;
        let folded = segments.iter().any(|segment| {
            segment.rings[station]
                .iter()
                .zip(&segment.rings[station + 1])
                .any(|(a, b)| b.sub_point(*a).dot(direction) <= tol.eps)
        });
        if folded {
            return Err(ExtrudeError::FoldedSections {
                station,
                next: station + 1,
            });
        }
    }
    Ok(())
}

/// Mesh of one member, or an empty list plus the diagnostic message.
#[must_use]
pub fn extrude_sections_to_mesh(profiles: &[OrientedProfile], faces_per_cross_section: usize) -> (Vec<GeomMesh>, String) {
    match extrude_sections_to_mesh_with_diagnostics(profiles, faces_per_cross_section, Tolerance::WELD) {
        Ok((mesh, diagnostics)) => {
            log::debug!("extrude: {}", diagnostics.summary());
            (vec![mesh], String::new())
        }
        Err(err) => {
            log::debug!("extrude failed: {err}");
            (Vec::new(), err.to_string())
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
pub fn extrude_sections_to_mesh_with_diagnostics(
    profiles: &[OrientedProfile],
    faces_per_cross_section: usize,
    tol: Tolerance,
) -> Result<(GeomMesh, GeomMeshDiagnostics), ExtrudeError> {
    let segments = sample_rings(profiles, faces_per_cross_section, tol)?;
    let station_count = profiles.len();

    let vertex_total: usize = segments.iter().map(|s| s.ring_len() * station_count).sum();
    if u32::try_from(vertex_total).is_err() {
        return Err(ExtrudeError::TooManyVertices);
    }

    let mut points: Vec<Point3> = Vec::with_capacity(vertex_total);
    let mut uvs: Vec<[f64; 2]> = Vec::with_capacity(vertex_total);
    let mut indices: Vec<u32> = Vec::new();

    for segment in &segments {
        let base = points.len() as u32;
        let ring_len = segment.ring_len() as u32;
        let u_div = if segment.closed { ring_len } else { ring_len - 1 };

        for (station, ring) in segment.rings.iter().enumerate() {
            let v = profiles[station].station.fraction;
            for (j, p) in ring.iter().enumerate() {
                points.push(*p);
                uvs.push([j as f64 / f64::from(u_div), v]);
            }
        }

        for i in 0..(station_count as u32 - 1) {
            for j in 0..segment.edge_count() as u32 {
                let j1 = (j + 1) % ring_len;
                let a = base + i * ring_len + j;
                let b = base + i * ring_len + j1;
                let c = base + (i + 1) * ring_len + j1;
                let d = base + (i + 1) * ring_len + j;
                indices.extend_from_slice(&[a, b, c, a, c, d]);
            }
        }
    }

    let (mesh, mut diagnostics) = finalize_mesh(points, Some(uvs), indices, tol, ExpectedBoundary::Open);
    if mesh.triangle_count() == 0 {
        return Err(ExtrudeError::EmptyMesh);
    }
    diagnostics.section_count = station_count;

    Ok((mesh, diagnostics))
}

/// One lofted surface per profile segment, or an empty list plus the
/// diagnostic message.
///
/// Surfaces are degree 1 around the ring, matching the mesh facets, and up to
/// cubic along the member. Every ring column is interpolated at the station
/// fractions, so the surface passes through each oriented section at
/// `v = fraction`.
#[must_use]
pub fn loft_sections_to_surfaces(
    profiles: &[OrientedProfile],
    faces_per_cross_section: usize,
) -> (Vec<NurbsSurface>, String) {
    match loft_sections_to_surfaces_with_tolerance(profiles, faces_per_cross_section, Tolerance::WELD) {
        Ok(surfaces) => (surfaces, String::new()),
        Err(err) => (Vec::new(), err.to_string()),
    }
}

pub fn loft_sections_to_surfaces_with_tolerance(
    profiles: &[OrientedProfile],
    faces_per_cross_section: usize,
    tol: Tolerance,
) -> Result<Vec<NurbsSurface>, ExtrudeError> {
    let segments = sample_rings(profiles, faces_per_cross_section, tol)?;
    let v_count = profiles.len();
    let degree_v = (v_count - 1).min(3);
    let params: Vec<f64> = profiles.iter().map(|profile| profile.station.fraction).collect();
    let knots_v = averaging_knots(&params, degree_v);

    segments
        .into_iter()
        .map(|segment| {
            let closed = segment.closed;
            let rows: Vec<Vec<Point3>> = segment
                .rings
                .into_iter()
                .map(|mut ring| {
                    if closed {
                        ring.push(ring[0]);
                    }
                    ring
                })
                .collect();
            let u_count = rows[0].len();

            let mut control_points = vec![Point3::ORIGIN; u_count * v_count];
            for u in 0..u_count {
                let column: Vec<Point3> = rows.iter().map(|row| row[u]).collect();
                let solved = interpolate_points(&column, &params, &knots_v, degree_v).map_err(ExtrudeError::Surface)?;
                for (v, point) in solved.into_iter().enumerate() {
                    control_points[v * u_count + u] = point;
                }
            }

            NurbsSurface::new(
                1,
                degree_v,
                u_count,
                v_count,
                control_points,
                clamped_uniform_knots(u_count, 1),
                knots_v.clone(),
                None,
            )
            .map_err(ExtrudeError::Surface)
        })
        .collect()
}
