use std::fmt;

use crate::geom::{Arc3, CurveGeometry, Line3, NurbsCurve3, Point3, Polyline3};

use super::RfemError;

/// Geometry kind of an RFEM line record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineType {
    #[default]
    Polyline,
    /// Arc through start, mid and end point.
    Arc,
    /// Full circle through three points.
    Circle,
    /// Interpolating spline; evaluated as a clamped B-spline through its
    /// definition points.
    Spline,
    Nurbs,
}

impl LineType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Polyline => "PolylineType",
            Self::Arc => "ArcType",
            Self::Circle => "CircleType",
            Self::Spline => "SplineType",
            Self::Nurbs => "NURBSplineType",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Polyline, Self::Arc, Self::Circle, Self::Spline, Self::Nurbs]
            .into_iter()
            .find(|kind| kind.name() == name)
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// RFEM line: the centerline of a member or an edge of a surface or opening.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RfLine {
    pub no: i32,
    pub line_type: LineType,
    /// RFEM node list, e.g. `"1,2"` or `"4-7"`.
    pub node_list: String,
    pub control_points: Vec<Point3>,
    /// NURBS weights; empty means non-rational.
    pub weights: Vec<f64>,
    /// NURBS knots; empty means clamped uniform.
    pub knots: Vec<f64>,
    /// NURBS order (degree + 1). Zero picks the highest order up to 4 that the
    /// point count allows.
    pub order: usize,
    pub comment: String,
    pub tag: String,
}

impl RfLine {
    /// Straight two-point line.
    #[must_use]
    pub fn straight(no: i32, start: Point3, end: Point3) -> Self {
        Self {
            no,
            control_points: vec![start, end],
            ..Self::default()
        }
    }

    pub fn to_curve(&self) -> Result<CurveGeometry, RfemError> {
        let points = &self.control_points;
        if points.iter().any(|p| !p.is_finite()) {
            return Err(self.invalid("control points must be finite"));
        }

        match self.line_type {
            LineType::Polyline => match points.as_slice() {
                [start, end] => Ok(CurveGeometry::Line(Line3::new(*start, *end))),
                // A repeated first point closes the outline.
                _ => Polyline3::new(points.clone(), points.len() > 3 && points.first() == points.last())
                    .map(CurveGeometry::Polyline)
                    .map_err(|reason| self.invalid(&reason)),
            },
            LineType::Arc => {
                let [start, mid, end] = self.three_points()?;
                Arc3::from_three_points(start, mid, end)
                    .map(CurveGeometry::Arc)
                    .ok_or_else(|| self.invalid("arc points are collinear"))
            }
            LineType::Circle => {
                let [a, b, c] = self.three_points()?;
                let arc = Arc3::from_three_points(a, b, c)
                    .ok_or_else(|| self.invalid("circle points are collinear"))?;
                Ok(CurveGeometry::Arc(Arc3 {
                    start_angle: 0.0,
                    sweep_angle: std::f64::consts::TAU,
                    ..arc
                }))
            }
            LineType::Spline | LineType::Nurbs => self.to_nurbs().map(CurveGeometry::Nurbs),
        }
    }

    fn to_nurbs(&self) -> Result<NurbsCurve3, RfemError> {
        let count = self.control_points.len();
        if count < 2 {
            return Err(self.invalid("nurbs line needs at least 2 control points"));
        }

        let degree = if self.order == 0 { (count - 1).min(3) } else { self.order - 1 };
        let knots = if self.knots.is_empty() {
            NurbsCurve3::clamped_uniform_knots(count, degree)
        } else {
            self.knots.clone()
        };
        let weights = (!self.weights.is_empty()).then(|| self.weights.clone());

        NurbsCurve3::new(degree, self.control_points.clone(), knots, weights)
            .map_err(|reason| self.invalid(&reason))
    }

    fn three_points(&self) -> Result<[Point3; 3], RfemError> {
        match self.control_points.as_slice() {
            [a, b, c] => Ok([*a, *b, *c]),
            other => Err(self.invalid(&format!(
                "{} needs 3 points, got {}",
                self.line_type,
                other.len()
            ))),
        }
    }

    fn invalid(&self, reason: &str) -> RfemError {
        RfemError::InvalidLine {
            no: self.no,
            reason: reason.to_owned(),
        }
    }
}

impl fmt::Display for RfLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RFEM-Line;No:{};Type:{};NodeList:{};Tag:{};Comment:{};",
            self.no,
            self.line_type,
            super::label_text(&self.node_list),
            super::label_text(&self.tag),
            super::label_text(&self.comment),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Curve3, Tolerance};

    #[test]
    fn two_point_polyline_becomes_a_line() {
        let line = RfLine::straight(1, Point3::ORIGIN, Point3::new(4.0, 0.0, 0.0));
        let curve = line.to_curve().expect("line conversion should succeed");
        assert!(matches!(curve, CurveGeometry::Line(_)));
        assert!((curve.length() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_start_point_closes_polyline() {
        let line = RfLine {
            no: 4,
            control_points: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
            ..RfLine::default()
        };
        let curve = line.to_curve().expect("polyline conversion should succeed");
        assert!(curve.is_closed());
        assert_eq!(curve.span_count(), 3);
    }

    #[test]
    fn circle_line_is_closed() {
        let line = RfLine {
            no: 2,
            line_type: LineType::Circle,
            control_points: vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
            ],
            ..RfLine::default()
        };
        let curve = line.to_curve().expect("circle conversion should succeed");
        assert!(curve.is_closed_within(Tolerance::LOOSE));
        assert!((curve.length() - std::f64::consts::TAU).abs() < 1e-9);
    }

    #[test]
    fn nurbs_line_without_knots_uses_clamped_knots() {
        let line = RfLine {
            no: 3,
            line_type: LineType::Nurbs,
            control_points: vec![
                Point3::ORIGIN,
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
            ],
            ..RfLine::default()
        };
        let curve = line.to_curve().expect("nurbs conversion should succeed");
        let tol = Tolerance::new(1e-9);
        assert!(tol.approx_eq_point3(curve.start_point(), Point3::ORIGIN));
        assert!(tol.approx_eq_point3(curve.end_point(), Point3::new(3.0, 0.0, 0.0)));
        assert_eq!(curve.span_count(), 1);
    }

    #[test]
    fn arc_with_wrong_point_count_is_rejected() {
        let line = RfLine {
            no: 7,
            line_type: LineType::Arc,
            control_points: vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)],
            ..RfLine::default()
        };
        let err = line.to_curve().unwrap_err();
        assert_eq!(err.to_string(), "line 7: ArcType needs 3 points, got 2");
    }
}
