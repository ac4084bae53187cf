use super::{Point3, Tolerance, Transform, Vec3};

pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn is_closed(&self) -> bool {
        false
    }

    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = Tolerance::DERIVATIVE.relative_to(span);
        if !h.is_finite() || h == 0.0 {
            return Vec3::ZERO;
        }

        let t0 = (t - h).max(a);
        let t1 = (t + h).min(b);
        if t1 == t0 {
            return Vec3::ZERO;
        }

        let p0 = self.point_at(t0);
        let p1 = self.point_at(t1);
        p1.sub_point(p0).mul_scalar(1.0 / (t1 - t0))
    }

    /// Returns the unit tangent vector at parameter `t`.
    /// Returns `None` if the derivative is zero or degenerate.
    #[must_use]
    fn tangent_at(&self, t: f64) -> Option<Vec3> {
        self.derivative_at(t).normalized()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line3 {
    pub start: Point3,
    pub end: Point3,
}

impl Line3 {
    #[must_use]
    pub const fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn direction(self) -> Vec3 {
        self.end.sub_point(self.start)
    }
}

impl Curve3 for Line3 {
    fn point_at(&self, t: f64) -> Point3 {
        self.start.lerp(self.end, t)
    }

    fn derivative_at(&self, _t: f64) -> Vec3 {
        self.direction()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Polyline3
// ─────────────────────────────────────────────────────────────────────────────

/// Polyline parameterized by normalized arc length on `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline3 {
    points: Vec<Point3>,
    cumulative_lengths: Vec<f64>,
    total_length: f64,
    closed: bool,
}

impl Polyline3 {
    pub fn new(mut points: Vec<Point3>, closed: bool) -> Result<Self, String> {
        if points.len() < 2 {
            return Err("polyline requires at least 2 points".to_string());
        }
        if closed && points.len() > 2 && points.first() == points.last() {
            points.pop();
        }
        Ok(Self::from_points_unchecked(points, closed))
    }

    fn from_points_unchecked(points: Vec<Point3>, closed: bool) -> Self {
        let mut cumulative_lengths = Vec::with_capacity(points.len());
        cumulative_lengths.push(0.0);
        let mut total = 0.0;
        for window in points.windows(2) {
            total += window[1].sub_point(window[0]).length();
            cumulative_lengths.push(total);
        }

        if closed {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                total += first.sub_point(*last).length();
            }
        }

        Self {
            points,
            cumulative_lengths,
            total_length: total,
            closed,
        }
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub const fn closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub const fn total_length(&self) -> f64 {
        self.total_length
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        }
    }

    /// Parameter intervals of the edges, closing edge last.
    #[must_use]
    pub fn edge_intervals(&self) -> Vec<(f64, f64)> {
        let total = self.total_length;
        if !(total.is_finite() && total > 0.0) {
            return vec![(0.0, 1.0); self.edge_count()];
        }
        let mut breaks: Vec<f64> = self.cumulative_lengths.iter().map(|l| l / total).collect();
        if self.closed {
            breaks.push(1.0);
        } else if let Some(last) = breaks.last_mut() {
            *last = 1.0;
        }
        breaks.windows(2).map(|w| (w[0], w[1])).collect()
    }
}

impl Curve3 for Polyline3 {
    fn point_at(&self, t: f64) -> Point3 {
        if self.total_length <= 0.0 || !self.total_length.is_finite() {
            return self.points[0];
        }

        let mut target = t.clamp(0.0, 1.0) * self.total_length;

        let last_index = self.points.len() - 1;
        if target >= self.cumulative_lengths[last_index] {
            if !self.closed {
                return self.points[last_index];
            }

            let last = self.points[last_index];
            let first = self.points[0];
            let segment_length = first.sub_point(last).length();
            if segment_length == 0.0 {
                return last;
            }
            let ratio = ((target - self.cumulative_lengths[last_index]) / segment_length).clamp(0.0, 1.0);
            return last.lerp(first, ratio);
        }

        let idx = match self
            .cumulative_lengths
            .binary_search_by(|value| value.total_cmp(&target))
        {
            Ok(i) => i.min(last_index - 1),
            Err(i) => i.max(1) - 1,
        };

        let seg_start = self.points[idx];
        let seg_end = self.points[idx + 1];
        let seg_len = seg_end.sub_point(seg_start).length();
        if seg_len == 0.0 {
            return seg_start;
        }
        target -= self.cumulative_lengths[idx];
        seg_start.lerp(seg_end, (target / seg_len).clamp(0.0, 1.0))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Arc3
// ─────────────────────────────────────────────────────────────────────────────

/// Circular arc; a sweep of a full turn is a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc3 {
    pub center: Point3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep_angle: f64,
}

impl Arc3 {
    #[must_use]
    pub fn new(center: Point3, normal: Vec3, radius: f64, start_angle: f64, sweep_angle: f64) -> Self {
        let (x_axis, y_axis) = frame_axes_from_normal(normal);
        Self {
            center,
            x_axis,
            y_axis,
            radius,
            start_angle,
            sweep_angle,
        }
    }

    #[must_use]
    pub fn circle(center: Point3, normal: Vec3, radius: f64) -> Self {
        Self::new(center, normal, radius, 0.0, std::f64::consts::TAU)
    }

    /// Arc through three points, `None` when they are collinear.
    #[must_use]
    pub fn from_three_points(start: Point3, mid: Point3, end: Point3) -> Option<Self> {
        let a = mid.sub_point(start);
        let b = end.sub_point(start);
        let normal = a.cross(b);
        let denom = 2.0 * normal.length_squared();
        if !denom.is_finite() || denom <= Tolerance::ZERO_LENGTH.eps {
            return None;
        }

        let offset = b
            .cross(normal)
            .mul_scalar(a.length_squared())
            .add(normal.cross(a).mul_scalar(b.length_squared()))
            .mul_scalar(1.0 / denom);
        let center = start.add_vec(offset);
        let radius = offset.length();

        let x_axis = start.sub_point(center).normalized()?;
        let z_axis = normal.normalized()?;
        let y_axis = z_axis.cross(x_axis);

        let angle_of = |p: Point3| {
            let v = p.sub_point(center);
            let angle = v.dot(y_axis).atan2(v.dot(x_axis));
            if angle < 0.0 { angle + std::f64::consts::TAU } else { angle }
        };
        let sweep_angle = angle_of(end);

        Some(Self {
            center,
            x_axis,
            y_axis,
            radius,
            start_angle: 0.0,
            sweep_angle,
        })
    }
}

impl Curve3 for Arc3 {
    fn point_at(&self, t: f64) -> Point3 {
        let angle = self.start_angle + self.sweep_angle * t.clamp(0.0, 1.0);
        self.center
            .add_vec(self.x_axis.mul_scalar(self.radius * angle.cos()))
            .add_vec(self.y_axis.mul_scalar(self.radius * angle.sin()))
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let angle = self.start_angle + self.sweep_angle * t.clamp(0.0, 1.0);
        let dx = self.x_axis.mul_scalar(-self.radius * angle.sin());
        let dy = self.y_axis.mul_scalar(self.radius * angle.cos());
        dx.add(dy).mul_scalar(self.sweep_angle)
    }

    fn is_closed(&self) -> bool {
        const FULL_CIRCLE_TOLERANCE: f64 = 1e-9;
        (self.sweep_angle.abs() - std::f64::consts::TAU).abs() < FULL_CIRCLE_TOLERANCE
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NurbsCurve3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NurbsCurve3 {
    pub degree: usize,
    pub control_points: Vec<Point3>,
    pub knots: Vec<f64>,
    pub weights: Option<Vec<f64>>,
}

impl NurbsCurve3 {
    pub fn new(
        degree: usize,
        control_points: Vec<Point3>,
        knots: Vec<f64>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, String> {
        if control_points.len() < 2 {
            return Err("nurbs curve requires at least 2 control points".to_string());
        }
        if degree == 0 {
            return Err("nurbs curve degree must be >= 1".to_string());
        }
        if degree >= control_points.len() {
            return Err("nurbs curve degree must be < control point count".to_string());
        }

        let expected_knot_len = control_points.len() + degree + 1;
        if knots.len() != expected_knot_len {
            return Err(format!(
                "nurbs curve knot length must be {}, got {}",
                expected_knot_len,
                knots.len()
            ));
        }

        if let Some(ref weights) = weights {
            if weights.len() != control_points.len() {
                return Err("nurbs curve weights length must match control point count".to_string());
            }
            if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
                return Err("nurbs curve weights must be finite and > 0".to_string());
            }
        }

        if !is_non_decreasing(&knots) {
            return Err("nurbs curve knots must be non-decreasing".to_string());
        }

        Ok(Self {
            degree,
            control_points,
            knots,
            weights,
        })
    }

    /// Clamped uniform knot vector for `count` control points.
    #[must_use]
    pub fn clamped_uniform_knots(count: usize, degree: usize) -> Vec<f64> {
        clamped_uniform_knots(count, degree)
    }

    /// Non-empty knot intervals inside the curve domain.
    #[must_use]
    pub fn knot_spans(&self) -> Vec<(f64, f64)> {
        let p = self.degree;
        let n = self.control_points.len() - 1;
        (p..=n)
            .filter_map(|i| {
                let (a, b) = (self.knots[i], self.knots[i + 1]);
                (b > a).then_some((a, b))
            })
            .collect()
    }
}

impl Curve3 for NurbsCurve3 {
    fn point_at(&self, t: f64) -> Point3 {
        let p = self.degree;
        let n = self.control_points.len() - 1;
        let (a, b) = self.domain();
        let u = t.clamp(a, b);
        let span = find_span(n, p, u, &self.knots);

        let mut d = Vec::with_capacity(p + 1);
        for j in 0..=p {
            let index = span - p + j;
            let w = self
                .weights
                .as_ref()
                .map_or(1.0, |weights| weights[index]);
            let point = self.control_points[index];
            d.push(HPoint4::new(point.x * w, point.y * w, point.z * w, w));
        }
        de_boor(&mut d, span, p, u, &self.knots);
        d[p].to_point3().unwrap_or(self.control_points[0])
    }

    fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.control_points.len()])
    }

    fn is_closed(&self) -> bool {
        let (a, b) = self.domain();
        Tolerance::default_geom().approx_eq_point3(self.point_at(a), self.point_at(b))
    }

    /// Analytic first derivative: de Boor on the homogeneous hodograph, then
    /// the quotient rule `C' = (A' - w' C) / w`.
    fn derivative_at(&self, t: f64) -> Vec3 {
        let p = self.degree;
        let n = self.control_points.len() - 1;
        let (a, b) = self.domain();
        let u = t.clamp(a, b);
        let span = find_span(n, p, u, &self.knots);

        let mut d = Vec::with_capacity(p + 1);
        for j in 0..=p {
            let index = span - p + j;
            let w = self.weights.as_ref().map_or(1.0, |weights| weights[index]);
            let point = self.control_points[index];
            d.push(HPoint4::new(point.x * w, point.y * w, point.z * w, w));
        }

        let mut hodograph: Vec<HPoint4> = (0..p)
            .map(|j| {
                let i = span - p + j;
                let denom = self.knots[i + p + 1] - self.knots[i + 1];
                let factor = if denom.abs() > Tolerance::ZERO_LENGTH.eps {
                    p as f64 / denom
                } else {
                    0.0
                };
                d[j + 1].sub(d[j]).scale(factor)
            })
            .collect();

        de_boor(&mut d, span, p, u, &self.knots);
        de_boor(&mut hodograph, span, p - 1, u, &self.knots);
        let (value, slope) = (d[p], hodograph[p - 1]);
        if !value.w.is_finite() || value.w.abs() < Tolerance::ZERO_LENGTH.eps {
            return Vec3::ZERO;
        }

        let w_sq = value.w * value.w;
        Vec3::new(
            (slope.x * value.w - value.x * slope.w) / w_sq,
            (slope.y * value.w - value.y * slope.w) / w_sq,
            (slope.z * value.w - value.z * slope.w) / w_sq,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CurveGeometry
// ─────────────────────────────────────────────────────────────────────────────

/// Tagged curve used for centerlines and cross-section segments.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveGeometry {
    Line(Line3),
    Polyline(Polyline3),
    Arc(Arc3),
    Nurbs(NurbsCurve3),
}

impl CurveGeometry {
    /// Number of control spans: 1 for lines and arcs, one per edge for
    /// polylines, one per non-empty knot interval for NURBS curves.
    #[must_use]
    pub fn span_count(&self) -> usize {
        match self {
            Self::Line(_) | Self::Arc(_) => 1,
            Self::Polyline(polyline) => polyline.edge_count(),
            Self::Nurbs(nurbs) => nurbs.knot_spans().len(),
        }
    }

    /// Parameter intervals of the spans, in curve order.
    #[must_use]
    pub fn spans(&self) -> Vec<(f64, f64)> {
        match self {
            Self::Line(_) | Self::Arc(_) => vec![(0.0, 1.0)],
            Self::Polyline(polyline) => polyline.edge_intervals(),
            Self::Nurbs(nurbs) => nurbs.knot_spans(),
        }
    }

    #[must_use]
    pub fn start_point(&self) -> Point3 {
        self.point_at(self.domain().0)
    }

    #[must_use]
    pub fn end_point(&self) -> Point3 {
        self.point_at(self.domain().1)
    }

    /// Closed either by construction or because its ends meet within `tol`.
    #[must_use]
    pub fn is_closed_within(&self, tol: Tolerance) -> bool {
        self.is_closed() || tol.approx_eq_point3(self.start_point(), self.end_point())
    }

    /// Curve length. Closed form for lines, polylines and arcs; NURBS curves
    /// integrate `|C'(t)|` over every knot span.
    #[must_use]
    pub fn length(&self) -> f64 {
        match self {
            Self::Line(line) => line.direction().length(),
            Self::Polyline(polyline) => polyline.total_length(),
            Self::Arc(arc) => arc.radius.abs() * arc.sweep_angle.abs(),
            Self::Nurbs(nurbs) => nurbs
                .knot_spans()
                .into_iter()
                .map(|(a, b)| integrate_speed(nurbs, a, b, gauss_speed(nurbs, a, b), GAUSS_MAX_DEPTH))
                .sum(),
        }
    }

    /// Arc-length reparameterization. Lines, polylines and arcs are already
    /// parameterized proportionally to length, so only NURBS curves are sampled.
    #[must_use]
    pub fn arc_length_table(&self, tolerance: f64) -> ArcLengthTable {
        match self {
            Self::Nurbs(_) => ArcLengthTable::build(self, tolerance),
            _ => {
                let (t0, t1) = self.domain();
                ArcLengthTable::uniform(t0, t1, self.length())
            }
        }
    }

    /// Copy of the curve moved by a rigid or affine transform.
    #[must_use]
    pub fn transformed(&self, xform: &Transform) -> Self {
        match self {
            Self::Line(line) => Self::Line(Line3::new(
                xform.apply_point(line.start),
                xform.apply_point(line.end),
            )),
            Self::Polyline(polyline) => Self::Polyline(Polyline3::from_points_unchecked(
                polyline.points().iter().map(|p| xform.apply_point(*p)).collect(),
                polyline.closed(),
            )),
            Self::Arc(arc) => Self::Arc(Arc3 {
                center: xform.apply_point(arc.center),
                x_axis: xform.apply_vec(arc.x_axis),
                y_axis: xform.apply_vec(arc.y_axis),
                ..*arc
            }),
            Self::Nurbs(nurbs) => Self::Nurbs(NurbsCurve3 {
                control_points: nurbs
                    .control_points
                    .iter()
                    .map(|p| xform.apply_point(*p))
                    .collect(),
                ..nurbs.clone()
            }),
        }
    }
}

impl Curve3 for CurveGeometry {
    fn point_at(&self, t: f64) -> Point3 {
        match self {
            Self::Line(c) => c.point_at(t),
            Self::Polyline(c) => c.point_at(t),
            Self::Arc(c) => c.point_at(t),
            Self::Nurbs(c) => c.point_at(t),
        }
    }

    fn domain(&self) -> (f64, f64) {
        match self {
            Self::Nurbs(c) => c.domain(),
            _ => (0.0, 1.0),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Self::Line(_) => false,
            Self::Polyline(c) => c.is_closed(),
            Self::Arc(c) => c.is_closed(),
            Self::Nurbs(c) => c.is_closed(),
        }
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        match self {
            Self::Line(c) => c.derivative_at(t),
            Self::Polyline(c) => c.derivative_at(t),
            Self::Arc(c) => c.derivative_at(t),
            Self::Nurbs(c) => c.derivative_at(t),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Arc length
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArcLengthEntry {
    parameter: f64,
    arc_length: f64,
}

/// Cumulative arc length sampled adaptively over the curve domain.
///
/// Intervals are bisected until the two half chords exceed the full chord by
/// no more than the fitting tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcLengthTable {
    entries: Vec<ArcLengthEntry>,
}

impl ArcLengthTable {
    const INITIAL_INTERVALS: usize = 16;
    const MAX_DEPTH: u32 = 16;

    #[must_use]
    pub fn build<C: Curve3 + ?Sized>(curve: &C, tolerance: f64) -> Self {
        let tol = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            Tolerance::LOOSE.eps
        };

        let (t0, t1) = curve.domain();
        let mut entries = vec![ArcLengthEntry {
            parameter: t0,
            arc_length: 0.0,
        }];
        let span = t1 - t0;
        if !span.is_finite() || span <= 0.0 {
            return Self { entries };
        }

        let mut prev_t = t0;
        let mut prev_p = curve.point_at(t0);
        for i in 1..=Self::INITIAL_INTERVALS {
            let t = if i == Self::INITIAL_INTERVALS {
                t1
            } else {
                t0 + span * (i as f64 / Self::INITIAL_INTERVALS as f64)
            };
            let p = curve.point_at(t);
            refine_interval(curve, (prev_t, prev_p), (t, p), tol, Self::MAX_DEPTH, &mut entries);
            prev_t = t;
            prev_p = p;
        }

        Self { entries }
    }

    /// Two-entry table for curves whose parameter is proportional to length.
    #[must_use]
    pub fn uniform(t0: f64, t1: f64, length: f64) -> Self {
        Self {
            entries: vec![
                ArcLengthEntry {
                    parameter: t0,
                    arc_length: 0.0,
                },
                ArcLengthEntry {
                    parameter: t1,
                    arc_length: length,
                },
            ],
        }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.entries.last().map_or(0.0, |e| e.arc_length)
    }

    #[must_use]
    pub fn parameter_at_length(&self, target_length: f64) -> f64 {
        let first = self.entries[0];
        let last = self.entries[self.entries.len() - 1];
        if self.entries.len() == 1 || target_length <= 0.0 {
            return first.parameter;
        }
        if target_length >= last.arc_length {
            return last.parameter;
        }

        let idx = self
            .entries
            .partition_point(|entry| entry.arc_length <= target_length)
            .clamp(1, self.entries.len() - 1);
        let e0 = self.entries[idx - 1];
        let e1 = self.entries[idx];

        let segment_length = e1.arc_length - e0.arc_length;
        if segment_length.abs() < Tolerance::ZERO_LENGTH.eps {
            return e0.parameter;
        }
        let ratio = (target_length - e0.arc_length) / segment_length;
        e0.parameter + (e1.parameter - e0.parameter) * ratio
    }

    #[must_use]
    pub fn parameter_at_fraction(&self, fraction: f64) -> f64 {
        self.parameter_at_length(fraction.clamp(0.0, 1.0) * self.length())
    }
}

fn refine_interval<C: Curve3 + ?Sized>(
    curve: &C,
    (a, pa): (f64, Point3),
    (b, pb): (f64, Point3),
    tol: f64,
    depth: u32,
    entries: &mut Vec<ArcLengthEntry>,
) {
    let m = 0.5 * (a + b);
    let pm = curve.point_at(m);
    let chord = pa.distance_to(pb);
    let split = pa.distance_to(pm) + pm.distance_to(pb);

    if depth == 0 || !split.is_finite() || split - chord <= tol {
        let base = entries.last().map_or(0.0, |e| e.arc_length);
        let step = if split.is_finite() { split } else { 0.0 };
        entries.push(ArcLengthEntry {
            parameter: b,
            arc_length: base + step,
        });
        return;
    }

    refine_interval(curve, (a, pa), (m, pm), tol, depth - 1, entries);
    refine_interval(curve, (m, pm), (b, pb), tol, depth - 1, entries);
}

const GAUSS_MAX_DEPTH: u32 = 24;

/// Five-point Gauss-Legendre nodes and weights on `[-1, 1]`.
const GAUSS_NODES: [(f64, f64); 5] = [
    (0.0, 0.568_888_888_888_888_9),
    (-0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (-0.906_179_845_938_664, 0.236_926_885_056_189_1),
    (0.906_179_845_938_664, 0.236_926_885_056_189_1),
];

fn gauss_speed<C: Curve3 + ?Sized>(curve: &C, a: f64, b: f64) -> f64 {
    let (mid, half) = (0.5 * (a + b), 0.5 * (b - a));
    half * GAUSS_NODES
        .iter()
        .map(|&(x, w)| w * curve.derivative_at(mid + half * x).length())
        .sum::<f64>()
}

/// Adaptive Gauss-Legendre: halves until both halves agree with the whole.
fn integrate_speed<C: Curve3 + ?Sized>(curve: &C, a: f64, b: f64, whole: f64, depth: u32) -> f64 {
    let m = 0.5 * (a + b);
    let (left, right) = (gauss_speed(curve, a, m), gauss_speed(curve, m, b));
    let split = left + right;
    if depth == 0 || !split.is_finite() || (split - whole).abs() <= Tolerance::ZERO_LENGTH.relative_to(split.max(1.0)) {
        return if split.is_finite() { split } else { 0.0 };
    }
    integrate_speed(curve, a, m, left, depth - 1) + integrate_speed(curve, m, b, right, depth - 1)
}

// ─────────────────────────────────────────────────────────────────────────────
// B-spline helpers
// ─────────────────────────────────────────────────────────────────────────────

fn frame_axes_from_normal(normal: Vec3) -> (Vec3, Vec3) {
    let z = normal.normalized().unwrap_or(Vec3::Z);
    let x = orthogonal_unit_vector(z);
    let y = z.cross(x).normalized().unwrap_or(Vec3::Y);
    (x, y)
}

pub(super) fn orthogonal_unit_vector(reference: Vec3) -> Vec3 {
    let candidate = if reference.x.abs() < reference.y.abs() {
        Vec3::new(0.0, -reference.z, reference.y)
    } else {
        Vec3::new(-reference.z, 0.0, reference.x)
    };

    candidate.normalized().unwrap_or(Vec3::X)
}

pub(super) fn is_non_decreasing(knots: &[f64]) -> bool {
    knots.windows(2).all(|w| w[0] <= w[1])
}

pub(super) fn clamped_uniform_knots(count: usize, degree: usize) -> Vec<f64> {
    let interior = count.saturating_sub(degree + 1);
    let mut knots = Vec::with_capacity(count + degree + 1);
    knots.extend(std::iter::repeat_n(0.0, degree + 1));
    for i in 1..=interior {
        knots.push(i as f64 / (interior + 1) as f64);
    }
    knots.extend(std::iter::repeat_n(1.0, degree + 1));
    knots
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct HPoint4 {
    x: f64,
    y: f64,
    z: f64,
    w: f64,
}

impl HPoint4 {
    pub(super) const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }

    fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }

    fn lerp(self, rhs: Self, t: f64) -> Self {
        let s = 1.0 - t;
        Self::new(
            self.x * s + rhs.x * t,
            self.y * s + rhs.y * t,
            self.z * s + rhs.z * t,
            self.w * s + rhs.w * t,
        )
    }

    pub(super) fn to_point3(self) -> Option<Point3> {
        if self.w.is_finite() && self.w != 0.0 {
            Some(Point3::new(self.x / self.w, self.y / self.w, self.z / self.w))
        } else {
            None
        }
    }
}

pub(super) fn find_span(n: usize, p: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n + 1] {
        return n;
    }
    if u <= knots[p] {
        return p;
    }

    let mut low = p;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

pub(super) fn de_boor(d: &mut [HPoint4], span: usize, p: usize, u: f64, knots: &[f64]) {
    for r in 1..=p {
        for j in (r..=p).rev() {
            let i = span - p + j;
            let denom = knots[i + p + 1 - r] - knots[i];
            let alpha = if denom == 0.0 { 0.0 } else { (u - knots[i]) / denom };
            d[j] = d[j - 1].lerp(d[j], alpha);
        }
    }
}

/// Clamped knot vector whose interior knots average `degree` consecutive
/// parameters, so every basis function peaks near its data point.
pub(super) fn averaging_knots(params: &[f64], degree: usize) -> Vec<f64> {
    let n = params.len();
    let mut knots = Vec::with_capacity(n + degree + 1);
    knots.extend(std::iter::repeat_n(params[0], degree + 1));
    for j in 1..n.saturating_sub(degree) {
        knots.push(params[j..j + degree].iter().sum::<f64>() / degree as f64);
    }
    knots.extend(std::iter::repeat_n(params[n - 1], degree + 1));
    knots
}

/// Control points of the clamped B-spline through `points` at `params`.
pub(super) fn interpolate_points(
    points: &[Point3],
    params: &[f64],
    knots: &[f64],
    degree: usize,
) -> Result<Vec<Point3>, String> {
    let n = points.len();
    if n < 2 || params.len() != n || knots.len() != n + degree + 1 {
        return Err("interpolation needs matching points, parameters and knots".to_string());
    }
    if n == 2 {
        return Ok(points.to_vec());
    }

    let matrix: Vec<Vec<f64>> = params
        .iter()
        .map(|&t| (0..n).map(|j| basis_function(j, degree, t, knots)).collect())
        .collect();
    let xs = solve_linear_system(&matrix, &points.iter().map(|p| p.x).collect::<Vec<_>>())?;
    let ys = solve_linear_system(&matrix, &points.iter().map(|p| p.y).collect::<Vec<_>>())?;
    let zs = solve_linear_system(&matrix, &points.iter().map(|p| p.z).collect::<Vec<_>>())?;

    Ok((0..n).map(|i| Point3::new(xs[i], ys[i], zs[i])).collect())
}

/// Cox-de Boor recursion. The last knot belongs to the last basis function.
fn basis_function(i: usize, p: usize, t: f64, knots: &[f64]) -> f64 {
    if p == 0 {
        let (a, b) = (knots[i], knots[i + 1]);
        let last = knots[knots.len() - 1];
        return if (t >= a && t < b) || (t == last && b == last && a < b) {
            1.0
        } else {
            0.0
        };
    }

    let mut value = 0.0;
    let left = knots[i + p] - knots[i];
    if left > 0.0 {
        value += (t - knots[i]) / left * basis_function(i, p - 1, t, knots);
    }
    let right = knots[i + p + 1] - knots[i + 1];
    if right > 0.0 {
        value += (knots[i + p + 1] - t) / right * basis_function(i + 1, p - 1, t, knots);
    }
    value
}

/// Gaussian elimination with partial pivoting.
fn solve_linear_system(matrix: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>, String> {
    let n = matrix.len();
    let mut aug: Vec<Vec<f64>> = matrix
        .iter()
        .zip(rhs)
        .map(|(row, &b)| {
            let mut r = row.clone();
            r.push(b);
            r
        })
        .collect();

    for k in 0..n {
        let pivot_row = (k..n)
            .max_by(|&i, &j| aug[i][k].abs().total_cmp(&aug[j][k].abs()))
            .unwrap_or(k);
        if aug[pivot_row][k].abs() < Tolerance::ZERO_LENGTH.eps {
            return Err("singular matrix in interpolation system".to_string());
        }
        aug.swap(k, pivot_row);

        let pivot = aug[k][k];
        for i in (k + 1)..n {
            let factor = aug[i][k] / pivot;
            for j in k..=n {
                aug[i][j] -= factor * aug[k][j];
            }
        }
    }

    let mut result = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| aug[i][j] * result[j]).sum();
        result[i] = (aug[i][n] - tail) / aug[i][i];
    }
    Ok(result)
}
