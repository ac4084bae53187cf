//! Places tween profiles on the centerline.
//!
//! The seed frame comes from the member's reference plane: its X axis, made
//! perpendicular to the first tangent, becomes the profile's local X. All later
//! frames are parallel-transported from their predecessor, so a straight member
//! keeps exactly the seed axes and a curved one never flips between stations.

use thiserror::Error;

use super::frame::{FrenetFrame, parallel_transport_frame};
use super::tween::{Station, TweenSegment};
use super::{Plane, Tolerance, Vec3};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrientError {
    #[error("a profile needs at least one segment")]
    NoSegments,
    #[error("expected {expected} stations, got {found}")]
    StationCountMismatch { expected: usize, found: usize },
    #[error("expected {expected} tween curves, got {found}")]
    CurveCountMismatch { expected: usize, found: usize },
}

/// Tween profile moved onto its station plane as one rigid unit.
#[derive(Debug, Clone)]
pub struct OrientedProfile {
    pub station: Station,
    pub plane: Plane,
    pub segments: Vec<TweenSegment>,
}

pub fn orient_sections(
    curves: &[TweenSegment],
    stations: &[Station],
    station_count: usize,
    reference_frame: &Plane,
    segments_per_profile: usize,
) -> Result<Vec<OrientedProfile>, OrientError> {
    orient_sections_with_tolerance(
        curves,
        stations,
        station_count,
        reference_frame,
        segments_per_profile,
        Tolerance::default_geom(),
    )
}

pub fn orient_sections_with_tolerance(
    curves: &[TweenSegment],
    stations: &[Station],
    station_count: usize,
    reference_frame: &Plane,
    segments_per_profile: usize,
    tol: Tolerance,
) -> Result<Vec<OrientedProfile>, OrientError> {
    if segments_per_profile == 0 {
        return Err(OrientError::NoSegments);
    }
    if stations.len() != station_count {
        return Err(OrientError::StationCountMismatch {
            expected: station_count,
            found: stations.len(),
        });
    }
    let expected = station_count * segments_per_profile;
    if curves.len() != expected {
        return Err(OrientError::CurveCountMismatch {
            expected,
            found: curves.len(),
        });
    }

    let mut profiles = Vec::with_capacity(station_count);
    let mut frame: Option<FrenetFrame> = None;

    for (station, profile) in stations.iter().zip(curves.chunks_exact(segments_per_profile)) {
        let next = match frame {
            None => seed_frame(station.tangent, reference_frame, tol),
            Some(prev) => parallel_transport_frame(&prev, station.tangent, tol),
        };
        frame = Some(next);

        let plane = next.to_plane(station.point);
        let xform = plane.to_world();
        profiles.push(OrientedProfile {
            station: *station,
            plane,
            segments: profile.iter().map(|segment| segment.transformed(&xform)).collect(),
        });
    }

    Ok(profiles)
}

/// First station frame, aligned with the reference plane as far as the tangent
/// allows.
#[must_use]
pub fn seed_frame(tangent: Vec3, reference: &Plane, tol: Tolerance) -> FrenetFrame {
    if let Some(frame) = FrenetFrame::from_tangent_with_up(tangent, reference.x_axis, tol) {
        return frame;
    }

    // Reference X runs along the member: keep reference Y as the profile's Y.
    if let Some(frame) = FrenetFrame::from_tangent_with_up(tangent, reference.y_axis, tol) {
        return FrenetFrame::new(frame.tangent, frame.binormal.neg(), frame.normal);
    }

    log::warn!("reference plane is unusable for tangent {tangent:?}, using an arbitrary section frame");
    FrenetFrame::from_tangent(tangent).unwrap_or(FrenetFrame::new(Vec3::Z, Vec3::X, Vec3::Y))
}
