use super::curve::{HPoint4, clamped_uniform_knots, de_boor, find_span, is_non_decreasing};
use super::{Point3, Tolerance};

pub trait Surface {
    fn point_at(&self, u: f64, v: f64) -> Point3;

    #[must_use]
    fn domain_u(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn domain_v(&self) -> (f64, f64) {
        (0.0, 1.0)
    }
}

/// Tensor-product NURBS surface. Control points are stored row by row in `v`:
/// index `v_index * u_count + u_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub u_count: usize,
    pub v_count: usize,
    pub control_points: Vec<Point3>,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub weights: Option<Vec<f64>>,
}

impl NurbsSurface {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        u_count: usize,
        v_count: usize,
        control_points: Vec<Point3>,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, String> {
        if u_count < 2 || v_count < 2 {
            return Err("nurbs surface requires at least a 2x2 control net".to_string());
        }
        if degree_u == 0 || degree_v == 0 {
            return Err("nurbs surface degrees must be >= 1".to_string());
        }
        if degree_u >= u_count || degree_v >= v_count {
            return Err("nurbs surface degrees must be < control point counts".to_string());
        }
        if control_points.len() != u_count * v_count {
            return Err("nurbs surface control point count must match u_count*v_count".to_string());
        }

        let expected_u_knots = u_count + degree_u + 1;
        if knots_u.len() != expected_u_knots {
            return Err(format!(
                "nurbs surface u knot length must be {}, got {}",
                expected_u_knots,
                knots_u.len()
            ));
        }

        let expected_v_knots = v_count + degree_v + 1;
        if knots_v.len() != expected_v_knots {
            return Err(format!(
                "nurbs surface v knot length must be {}, got {}",
                expected_v_knots,
                knots_v.len()
            ));
        }

        if !is_non_decreasing(&knots_u) || !is_non_decreasing(&knots_v) {
            return Err("nurbs surface knots must be non-decreasing".to_string());
        }

        if let Some(ref weights) = weights {
            if weights.len() != control_points.len() {
                return Err("nurbs surface weights length must match control point count".to_string());
            }
            if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
                return Err("nurbs surface weights must be finite and > 0".to_string());
            }
        }

        Ok(Self {
            degree_u,
            degree_v,
            u_count,
            v_count,
            control_points,
            knots_u,
            knots_v,
            weights,
        })
    }

    /// Non-rational surface on clamped uniform knots over `[0, 1] x [0, 1]`.
    pub fn from_control_net(
        degree_u: usize,
        degree_v: usize,
        u_count: usize,
        v_count: usize,
        control_points: Vec<Point3>,
    ) -> Result<Self, String> {
        Self::new(
            degree_u,
            degree_v,
            u_count,
            v_count,
            control_points,
            clamped_uniform_knots(u_count, degree_u),
            clamped_uniform_knots(v_count, degree_v),
            None,
        )
    }

    fn control_hpoint(&self, u_index: usize, v_index: usize) -> HPoint4 {
        let idx = v_index * self.u_count + u_index;
        let p = self.control_points[idx];
        let w = self
            .weights
            .as_ref()
            .and_then(|weights| weights.get(idx).copied())
            .unwrap_or(1.0);
        HPoint4::new(p.x * w, p.y * w, p.z * w, w)
    }

    /// Compares surfaces by evaluating a coarse grid.
    #[must_use]
    pub fn approx_eq_sampled(&self, other: &Self, samples: usize, tol: Tolerance) -> bool {
        let samples = samples.max(2);
        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();
        (0..samples).all(|i| {
            (0..samples).all(|j| {
                let u = u0 + (u1 - u0) * i as f64 / (samples - 1) as f64;
                let v = v0 + (v1 - v0) * j as f64 / (samples - 1) as f64;
                tol.approx_eq_point3(self.point_at(u, v), other.point_at(u, v))
            })
        })
    }
}

impl Surface for NurbsSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let p = self.degree_u;
        let q = self.degree_v;

        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();
        let u = u.clamp(u0, u1);
        let v = v.clamp(v0, v1);

        let span_u = find_span(self.u_count - 1, p, u, &self.knots_u);
        let span_v = find_span(self.v_count - 1, q, v, &self.knots_v);

        let mut column = Vec::with_capacity(q + 1);
        for l in 0..=q {
            let v_index = span_v - q + l;
            let mut row: Vec<HPoint4> = (0..=p)
                .map(|j| self.control_hpoint(span_u - p + j, v_index))
                .collect();
            de_boor(&mut row, span_u, p, u, &self.knots_u);
            column.push(row[p]);
        }

        de_boor(&mut column, span_v, q, v, &self.knots_v);
        column[q].to_point3().unwrap_or(self.control_points[0])
    }

    fn domain_u(&self) -> (f64, f64) {
        (self.knots_u[self.degree_u], self.knots_u[self.u_count])
    }

    fn domain_v(&self) -> (f64, f64) {
        (self.knots_v[self.degree_v], self.knots_v[self.v_count])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bilinear_patch() -> NurbsSurface {
        NurbsSurface::from_control_net(
            1,
            1,
            2,
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(2.0, 2.0, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn bilinear_patch_corners_and_center() {
        let surface = bilinear_patch();
        assert_eq!(surface.point_at(0.0, 0.0), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(surface.point_at(1.0, 1.0), Point3::new(2.0, 2.0, 1.0));
        assert_eq!(surface.point_at(0.5, 0.5), Point3::new(1.0, 1.0, 0.25));
    }

    #[test]
    fn rejects_mismatched_control_net() {
        let err = NurbsSurface::from_control_net(1, 1, 3, 2, vec![Point3::ORIGIN; 4]).unwrap_err();
        assert!(err.contains("u_count*v_count"));
    }

    #[test]
    fn sampled_comparison_detects_difference() {
        let a = bilinear_patch();
        let mut b = a.clone();
        b.control_points[3] = Point3::new(2.0, 2.0, 0.0);
        let tol = Tolerance::default_geom();
        assert!(a.approx_eq_sampled(&a.clone(), 5, tol));
        assert!(!a.approx_eq_sampled(&b, 5, tol));
    }
}
