//! Moving frames along a centerline.
//!
//! Frames are propagated station to station by parallel transport: the previous
//! normal is rotated by the minimal rotation that carries the previous tangent
//! onto the new one. Recomputing a frame from scratch at every station is what
//! produces sudden flips on planar or straight members, so only the seed frame is
//! chosen independently.

use super::curve::orthogonal_unit_vector;
use super::{Plane, Point3, Tolerance, Vec3};

/// Orthonormal frame attached to a point of a curve.
///
/// `normal` and `binormal` span the cross-section plane and map onto the local
/// X and Y axes of a profile; `binormal = tangent x normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrenetFrame {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

impl FrenetFrame {
    #[must_use]
    pub const fn new(tangent: Vec3, normal: Vec3, binormal: Vec3) -> Self {
        Self {
            tangent,
            normal,
            binormal,
        }
    }

    /// Frame with an arbitrary but deterministic normal.
    #[must_use]
    pub fn from_tangent(tangent: Vec3) -> Option<Self> {
        let tangent = tangent.normalized()?;
        let normal = orthogonal_unit_vector(tangent);
        let binormal = tangent.cross(normal);
        Some(Self {
            tangent,
            normal,
            binormal,
        })
    }

    /// Frame whose normal is the part of `up` perpendicular to the tangent.
    /// Returns `None` when `up` is (nearly) parallel to the tangent.
    #[must_use]
    pub fn from_tangent_with_up(tangent: Vec3, up: Vec3, tol: Tolerance) -> Option<Self> {
        let tangent = tangent.normalized()?;
        let projected = up.reject_from(tangent);
        if projected.length() <= tol.eps {
            return None;
        }
        let normal = projected.normalized()?;
        let binormal = tangent.cross(normal);
        Some(Self {
            tangent,
            normal,
            binormal,
        })
    }

    /// Plane at `origin` with X = normal, Y = binormal, Z = tangent.
    #[must_use]
    pub fn to_plane(&self, origin: Point3) -> Plane {
        Plane {
            origin,
            x_axis: self.normal,
            y_axis: self.binormal,
            z_axis: self.tangent,
        }
    }
}

/// Carries `prev_frame` onto `new_tangent` with the minimal rotation.
///
/// Parallel tangents keep the previous axes untouched; antiparallel tangents
/// (a cusp) mirror the normal and binormal.
#[must_use]
pub fn parallel_transport_frame(prev_frame: &FrenetFrame, new_tangent: Vec3, tol: Tolerance) -> FrenetFrame {
    let Some(new_tangent) = new_tangent.normalized() else {
        return *prev_frame;
    };
    let old_tangent = prev_frame.tangent;

    let cross = old_tangent.cross(new_tangent);
    if cross.length_squared() < tol.eps_squared() {
        if old_tangent.dot(new_tangent) < 0.0 {
            return FrenetFrame {
                tangent: new_tangent,
                normal: prev_frame.normal.neg(),
                binormal: prev_frame.binormal.neg(),
            };
        }
        return FrenetFrame {
            tangent: new_tangent,
            normal: prev_frame.normal,
            binormal: prev_frame.binormal,
        };
    }

    let rotation_axis = cross.normalized().unwrap_or(Vec3::Z);
    let angle = old_tangent.dot(new_tangent).clamp(-1.0, 1.0).acos();

    let new_normal = rotate_vector(prev_frame.normal, rotation_axis, angle)
        .reject_from(new_tangent)
        .normalized()
        .unwrap_or(prev_frame.normal);
    let new_binormal = new_tangent
        .cross(new_normal)
        .normalized()
        .unwrap_or(prev_frame.binormal);

    FrenetFrame {
        tangent: new_tangent,
        normal: new_normal,
        binormal: new_binormal,
    }
}

/// Rodrigues rotation of `v` about the unit `axis`.
#[must_use]
pub fn rotate_vector(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (sin_angle, cos_angle) = angle.sin_cos();
    let k_cross_v = axis.cross(v);
    let k_dot_v = axis.dot(v);

    v.mul_scalar(cos_angle)
        .add(k_cross_v.mul_scalar(sin_angle))
        .add(axis.mul_scalar(k_dot_v * (1.0 - cos_angle)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_along_parallel_tangent_is_identity() {
        let frame = FrenetFrame::new(Vec3::X, Vec3::Y, Vec3::Z);
        let next = parallel_transport_frame(&frame, Vec3::new(3.0, 0.0, 0.0), Tolerance::default_geom());
        assert_eq!(next, frame);
    }

    #[test]
    fn transport_through_quarter_turn_rotates_normal() {
        let frame = FrenetFrame::new(Vec3::X, Vec3::Z, Vec3::X.cross(Vec3::Z));
        let next = parallel_transport_frame(&frame, Vec3::Y, Tolerance::default_geom());
        let tol = Tolerance::new(1e-12);
        // Rotation about Z keeps the Z normal in place.
        assert!(tol.approx_eq_vec3(next.normal, Vec3::Z));
        assert!(tol.approx_eq_vec3(next.tangent, Vec3::Y));
        assert!(tol.approx_eq_vec3(next.binormal, Vec3::Y.cross(Vec3::Z)));
    }

    #[test]
    fn from_tangent_with_up_rejects_parallel_up() {
        let tol = Tolerance::default_geom();
        assert!(FrenetFrame::from_tangent_with_up(Vec3::Z, Vec3::Z, tol).is_none());
        let frame = FrenetFrame::from_tangent_with_up(Vec3::Z, Vec3::new(1.0, 0.0, 1.0), tol).unwrap();
        assert!(tol.approx_eq_vec3(frame.normal, Vec3::X));
        assert!(tol.approx_eq_vec3(frame.binormal, Vec3::Y));
    }

    #[test]
    fn rotate_vector_quarter_turn() {
        let v = rotate_vector(Vec3::X, Vec3::Z, std::f64::consts::FRAC_PI_2);
        assert!(Tolerance::new(1e-12).approx_eq_vec3(v, Vec3::Y));
    }
}
