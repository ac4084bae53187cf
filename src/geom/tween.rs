//! Cross-section interpolation along a member.
//!
//! Segment `i` of the start profile is paired with segment `i` of the end
//! profile. Every station gets one tween profile per segment pair; a tween span
//! evaluates its two source pieces at the same local parameter and hands both
//! points to a [`SectionBlend`]. A pair counts as closed only when both of its
//! segments are. Tween profiles stay in the construction plane
//! (world XY through the origin) until the orientation step places them.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::curve::{ArcLengthTable, Curve3, CurveGeometry};
use super::{Point3, Tolerance, Transform, Vec3};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TweenError {
    #[error("profile contains no curve segments")]
    EmptyProfile,
    #[error("start profile has {start} segments but end profile has {end}")]
    SegmentCountMismatch { start: usize, end: usize },
    #[error("start profile has {start} spans but end profile has {end}")]
    SpanCountMismatch { start: usize, end: usize },
    #[error("segment {0} has no spans")]
    EmptySegment(usize),
    #[error("segment length must be finite and > 0, got {0}")]
    InvalidSegmentLength(f64),
    #[error("centerline has no computable length")]
    DegenerateCenterline,
}

/// Point-wise blend law between a start and an end cross section.
pub trait SectionBlend: fmt::Debug + Send + Sync {
    fn blend(&self, start: Point3, end: Point3, fraction: f64) -> Point3;
}

/// `(1 - f) * start + f * end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearBlend;

impl SectionBlend for LinearBlend {
    fn blend(&self, start: Point3, end: Point3, fraction: f64) -> Point3 {
        start.lerp(end, fraction)
    }
}

/// Sample position on the centerline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Station {
    pub index: usize,
    /// Arc-length fraction in `[0, 1]`.
    pub fraction: f64,
    pub parameter: f64,
    pub point: Point3,
    pub tangent: Vec3,
}

#[derive(Debug, Clone)]
struct SpanRef {
    curve: Arc<CurveGeometry>,
    interval: (f64, f64),
}

impl SpanRef {
    fn point_at(&self, s: f64) -> Point3 {
        let (a, b) = self.interval;
        self.curve.point_at(a + (b - a) * s)
    }
}

#[derive(Debug, Clone)]
struct TweenSpan {
    start: SpanRef,
    end: SpanRef,
}

/// One interpolated profile segment at one station.
///
/// Spans are shared between stations; only the blend fraction and the placement
/// differ. As a [`Curve3`] the domain is `[0, span_count]` and span `i` covers
/// `[i, i + 1]`.
#[derive(Debug, Clone)]
pub struct TweenSegment {
    spans: Arc<[TweenSpan]>,
    closed: bool,
    fraction: f64,
    blend: Arc<dyn SectionBlend>,
    placement: Transform,
}

impl TweenSegment {
    #[must_use]
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub const fn fraction(&self) -> f64 {
        self.fraction
    }

    #[must_use]
    pub const fn placement(&self) -> Transform {
        self.placement
    }

    /// Point on span `span` at local parameter `s` in `[0, 1]`.
    #[must_use]
    pub fn point_at_span(&self, span: usize, s: f64) -> Point3 {
        let span = &self.spans[span.min(self.spans.len() - 1)];
        let s = s.clamp(0.0, 1.0);
        let blended = self
            .blend
            .blend(span.start.point_at(s), span.end.point_at(s), self.fraction);
        self.placement.apply_point(blended)
    }

    /// Ring points with `per_span` samples on every span. Closed segments do
    /// not repeat their first point; open segments end on their last point.
    #[must_use]
    pub fn sample(&self, per_span: usize) -> Vec<Point3> {
        let per_span = per_span.max(1);
        let mut points = Vec::with_capacity(self.spans.len() * per_span + 1);
        for span in 0..self.spans.len() {
            for k in 0..per_span {
                points.push(self.point_at_span(span, k as f64 / per_span as f64));
            }
        }
        if !self.closed {
            points.push(self.point_at_span(self.spans.len() - 1, 1.0));
        }
        points
    }

    /// Copy placed by `xform` on top of the current placement.
    #[must_use]
    pub fn transformed(&self, xform: &Transform) -> Self {
        Self {
            placement: xform.compose(self.placement),
            ..self.clone()
        }
    }
}

impl Curve3 for TweenSegment {
    fn point_at(&self, t: f64) -> Point3 {
        let last = self.spans.len() - 1;
        let t = t.clamp(0.0, self.spans.len() as f64);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let span = (t.floor() as usize).min(last);
        self.point_at_span(span, t - span as f64)
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, self.spans.len() as f64)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Interpolated profiles, stored station-major: the profile of station `i` is
/// `curves[i * segments_per_profile..(i + 1) * segments_per_profile]`.
#[derive(Debug, Clone)]
pub struct TweenResult {
    pub curves: Vec<TweenSegment>,
    pub stations: Vec<Station>,
    pub segments_per_profile: usize,
}

impl TweenResult {
    #[must_use]
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn profile(&self, station: usize) -> &[TweenSegment] {
        let start = station * self.segments_per_profile;
        &self.curves[start..start + self.segments_per_profile]
    }
}

/// `max(floor(length / segment_length), 2)`. Ratios within rounding of a
/// whole number count as that number.
pub fn station_count(length: f64, segment_length: f64) -> Result<usize, TweenError> {
    if !segment_length.is_finite() || segment_length <= 0.0 {
        return Err(TweenError::InvalidSegmentLength(segment_length));
    }
    if !length.is_finite() || length <= 0.0 {
        return Err(TweenError::DegenerateCenterline);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = {
        let ratio = length / segment_length;
        (ratio + Tolerance::DEFAULT.relative_to(ratio.max(1.0))).floor() as usize
    };
    Ok(count.max(2))
}

/// Total span count of a profile.
#[must_use]
pub fn profile_span_count(profile: &[CurveGeometry]) -> usize {
    profile.iter().map(CurveGeometry::span_count).sum()
}

/// Checks that two profiles can be interpolated.
pub fn check_profiles(start: &[CurveGeometry], end: &[CurveGeometry]) -> Result<(), TweenError> {
    if start.is_empty() || end.is_empty() {
        return Err(TweenError::EmptyProfile);
    }
    if start.len() != end.len() {
        return Err(TweenError::SegmentCountMismatch {
            start: start.len(),
            end: end.len(),
        });
    }
    if let Some(index) = start
        .iter()
        .zip(end)
        .position(|(a, b)| a.span_count() == 0 || b.span_count() == 0)
    {
        return Err(TweenError::EmptySegment(index));
    }
    let (start_spans, end_spans) = (profile_span_count(start), profile_span_count(end));
    if start_spans != end_spans || start_spans == 0 {
        return Err(TweenError::SpanCountMismatch {
            start: start_spans,
            end: end_spans,
        });
    }
    Ok(())
}

/// Interpolates from `start` to `end` along `centerline` with the linear blend.
///
/// `tolerance1` is the arc-length fitting tolerance, `tolerance2` the tolerance
/// under which a segment's end points count as joined.
pub fn interpolate_sections(
    centerline: &CurveGeometry,
    start: &[CurveGeometry],
    end: &[CurveGeometry],
    target_segment_length: f64,
    tolerance1: f64,
    tolerance2: f64,
) -> Result<TweenResult, TweenError> {
    interpolate_sections_with_blend(
        centerline,
        start,
        end,
        target_segment_length,
        tolerance1,
        tolerance2,
        Arc::new(LinearBlend),
    )
}

pub fn interpolate_sections_with_blend(
    centerline: &CurveGeometry,
    start: &[CurveGeometry],
    end: &[CurveGeometry],
    target_segment_length: f64,
    tolerance1: f64,
    tolerance2: f64,
    blend: Arc<dyn SectionBlend>,
) -> Result<TweenResult, TweenError> {
    check_profiles(start, end)?;

    let count = station_count(centerline.length(), target_segment_length)?;
    let table = centerline.arc_length_table(tolerance1);
    let stations = build_stations(centerline, &table, count)?;

    let templates = pair_spans(start, end);
    let join_tol = Tolerance::new(if tolerance2.is_finite() && tolerance2 > 0.0 {
        tolerance2
    } else {
        Tolerance::LOOSE.eps
    });
    let closed: Vec<bool> = start
        .iter()
        .zip(end)
        .map(|(a, b)| a.is_closed_within(join_tol) && b.is_closed_within(join_tol))
        .collect();

    let mut curves = Vec::with_capacity(count * templates.len());
    for station in &stations {
        for (spans, &closed) in templates.iter().zip(&closed) {
            curves.push(TweenSegment {
                spans: Arc::clone(spans),
                closed,
                fraction: station.fraction,
                blend: Arc::clone(&blend),
                placement: Transform::identity(),
            });
        }
    }

    log::debug!(
        "tween: {} stations x {} segments ({} paired spans)",
        stations.len(),
        templates.len(),
        templates.iter().map(|spans| spans.len()).sum::<usize>()
    );

    Ok(TweenResult {
        curves,
        stations,
        segments_per_profile: start.len(),
    })
}

/// Pairs segment `i` of `start` with segment `i` of `end`.
///
/// Both segments are cut at the union of their span breaks in normalized
/// segment parameter, so equal span counts pair span by span and unequal
/// counts still keep every source corner on a span boundary.
fn pair_spans(start: &[CurveGeometry], end: &[CurveGeometry]) -> Vec<Arc<[TweenSpan]>> {
    start
        .iter()
        .zip(end)
        .map(|(a, b)| pair_segment(a, b))
        .collect()
}

fn pair_segment(start: &CurveGeometry, end: &CurveGeometry) -> Arc<[TweenSpan]> {
    let (start_spans, end_spans) = (start.spans(), end.spans());
    let (ns, ne) = (start_spans.len(), end_spans.len());
    // Breaks in units of 1 / (ns * ne): exact integers, no float merging.
    let mut cuts: Vec<usize> = (0..=ns).map(|k| k * ne).chain((0..=ne).map(|k| k * ns)).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let (start_curve, end_curve) = (Arc::new(start.clone()), Arc::new(end.clone()));
    cuts.windows(2)
        .map(|w| TweenSpan {
            start: sub_span(&start_curve, &start_spans, ne, (w[0], w[1])),
            end: sub_span(&end_curve, &end_spans, ns, (w[0], w[1])),
        })
        .collect()
}

/// Piece of one source span covering `[from, to]` in units where every
/// source span is `unit` long.
fn sub_span(curve: &Arc<CurveGeometry>, spans: &[(f64, f64)], unit: usize, (from, to): (usize, usize)) -> SpanRef {
    let index = (from / unit).min(spans.len() - 1);
    let (a, b) = spans[index];
    let base = index * unit;
    let s0 = (from - base) as f64 / unit as f64;
    let s1 = (to - base) as f64 / unit as f64;
    SpanRef {
        curve: Arc::clone(curve),
        interval: (a + (b - a) * s0, a + (b - a) * s1),
    }
}

fn build_stations(
    centerline: &CurveGeometry,
    table: &ArcLengthTable,
    count: usize,
) -> Result<Vec<Station>, TweenError> {
    let chord = centerline.end_point().sub_point(centerline.start_point());
    let mut fallback = chord.normalized();
    let mut stations = Vec::with_capacity(count);

    for index in 0..count {
        let fraction = index as f64 / (count - 1) as f64;
        let parameter = table.parameter_at_fraction(fraction);
        let point = centerline.point_at(parameter);
        let tangent = match centerline.tangent_at(parameter) {
            Some(tangent) => tangent,
            None => fallback.ok_or(TweenError::DegenerateCenterline)?,
        };
        fallback = Some(tangent);

        stations.push(Station {
            index,
            fraction,
            parameter,
            point,
            tangent,
        });
    }

    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::curve::{Line3, Polyline3};

    fn rectangle(w: f64, h: f64) -> CurveGeometry {
        CurveGeometry::Polyline(
            Polyline3::new(
                vec![
                    Point3::new(-w / 2.0, -h / 2.0, 0.0),
                    Point3::new(w / 2.0, -h / 2.0, 0.0),
                    Point3::new(w / 2.0, h / 2.0, 0.0),
                    Point3::new(-w / 2.0, h / 2.0, 0.0),
                ],
                true,
            )
            .unwrap(),
        )
    }

    fn beam(length: f64) -> CurveGeometry {
        CurveGeometry::Line(Line3::new(Point3::ORIGIN, Point3::new(length, 0.0, 0.0)))
    }

    #[test]
    fn station_count_clamps_to_two() {
        assert_eq!(station_count(10.0, 1.0), Ok(10));
        assert_eq!(station_count(0.5, 1.0), Ok(2));
        assert_eq!(station_count(10.0, 3.0), Ok(3));
        assert_eq!(station_count(0.3, 0.1), Ok(3));
        assert_eq!(station_count(10.0, 0.0), Err(TweenError::InvalidSegmentLength(0.0)));
        assert_eq!(station_count(0.0, 1.0), Err(TweenError::DegenerateCenterline));
    }

    #[test]
    fn midway_profile_is_average_of_ends() {
        let result = interpolate_sections(&beam(2.0), &[rectangle(0.2, 0.4)], &[rectangle(0.4, 0.8)], 1.0, 0.001, 0.001)
            .unwrap();
        assert_eq!(result.station_count(), 2);

        let result = interpolate_sections(&beam(3.0), &[rectangle(0.2, 0.4)], &[rectangle(0.4, 0.8)], 1.0, 0.001, 0.001)
            .unwrap();
        assert_eq!(result.station_count(), 3);
        let middle = &result.profile(1)[0];
        assert!((middle.fraction() - 0.5).abs() < 1e-12);
        let corner = middle.point_at_span(0, 0.0);
        assert!(Tolerance::new(1e-12).approx_eq_point3(corner, Point3::new(-0.15, -0.3, 0.0)));
    }

    #[test]
    fn closed_ring_sampling_skips_repeated_point() {
        let result =
            interpolate_sections(&beam(1.0), &[rectangle(1.0, 1.0)], &[rectangle(1.0, 1.0)], 1.0, 0.001, 0.001)
                .unwrap();
        let ring = result.curves[0].sample(2);
        assert_eq!(ring.len(), 8);
        assert!(result.curves[0].is_closed());
    }

    #[test]
    fn mismatched_profiles_are_rejected() {
        let open = CurveGeometry::Line(Line3::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)));
        let err = interpolate_sections(&beam(1.0), &[rectangle(1.0, 1.0)], &[open.clone()], 1.0, 0.001, 0.001)
            .unwrap_err();
        assert_eq!(err, TweenError::SpanCountMismatch { start: 4, end: 1 });

        let err = interpolate_sections(&beam(1.0), &[open.clone()], &[open.clone(), open], 1.0, 0.001, 0.001)
            .unwrap_err();
        assert_eq!(err, TweenError::SegmentCountMismatch { start: 1, end: 2 });

        let err = interpolate_sections(&beam(1.0), &[], &[], 1.0, 0.001, 0.001).unwrap_err();
        assert_eq!(err, TweenError::EmptyProfile);

        let collapsed = CurveGeometry::Nurbs(
            crate::geom::NurbsCurve3::new(
                1,
                vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)],
                vec![0.5, 0.5, 0.5, 0.5],
                None,
            )
            .unwrap(),
        );
        let err = interpolate_sections(&beam(1.0), &[collapsed.clone()], &[collapsed], 1.0, 0.001, 0.001)
            .unwrap_err();
        assert_eq!(err, TweenError::EmptySegment(0));
    }

    #[test]
    fn unequal_span_counts_pair_within_segment() {
        // 2 + 1 spans against 1 + 2 spans: equal totals, different splits.
        let a = CurveGeometry::Polyline(
            Polyline3::new(
                vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
                false,
            )
            .unwrap(),
        );
        let b = CurveGeometry::Line(Line3::new(Point3::new(1.0, 1.0, 0.0), Point3::new(0.0, 0.0, 0.0)));
        let c = CurveGeometry::Line(Line3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)));
        let d = CurveGeometry::Polyline(
            Polyline3::new(
                vec![Point3::new(2.0, 0.0, 0.0), Point3::new(2.0, 2.0, 0.0), Point3::new(0.0, 0.0, 0.0)],
                false,
            )
            .unwrap(),
        );

        let result = interpolate_sections(&beam(1.0), &[a, b], &[c.clone(), d.clone()], 1.0, 0.001, 0.001).unwrap();
        let tol = Tolerance::new(1e-12);
        let end_profile = result.profile(1);
        assert_eq!(end_profile[0].span_count(), 2);
        assert_eq!(end_profile[1].span_count(), 2);

        // Segment 0 ends exactly on c; segment 1 keeps d's corner.
        assert!(tol.approx_eq_point3(end_profile[0].point_at_span(0, 1.0), Point3::new(1.0, 0.0, 0.0)));
        assert!(tol.approx_eq_point3(end_profile[0].point_at_span(1, 1.0), c.end_point()));
        assert!(tol.approx_eq_point3(end_profile[1].point_at_span(0, 1.0), Point3::new(2.0, 2.0, 0.0)));
        assert!(tol.approx_eq_point3(end_profile[1].point_at_span(1, 1.0), d.end_point()));

        // The start side still runs through a's corner.
        let start_profile = result.profile(0);
        assert!(tol.approx_eq_point3(start_profile[0].point_at_span(0, 1.0), Point3::new(1.0, 0.0, 0.0)));
        assert!(tol.approx_eq_point3(start_profile[1].point_at_span(0, 1.0), Point3::new(0.5, 0.5, 0.0)));
    }

    #[test]
    fn pair_is_closed_only_when_both_segments_are() {
        let open = CurveGeometry::Polyline(
            Polyline3::new(
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(1.0, 0.0, 0.0),
                    Point3::new(1.0, 1.0, 0.0),
                    Point3::new(0.0, 1.0, 0.0),
                    Point3::new(0.0, 0.5, 0.0),
                ],
                false,
            )
            .unwrap(),
        );
        let result = interpolate_sections(&beam(1.0), &[rectangle(1.0, 1.0)], &[open], 1.0, 0.001, 0.001).unwrap();
        assert!(result.curves.iter().all(|segment| !segment.is_closed()));
    }

    #[test]
    fn stations_follow_centerline() {
        let result =
            interpolate_sections(&beam(10.0), &[rectangle(1.0, 1.0)], &[rectangle(1.0, 1.0)], 1.0, 0.001, 0.001)
                .unwrap();
        assert_eq!(result.station_count(), 10);
        let last = result.stations.last().unwrap();
        assert!(Tolerance::default_geom().approx_eq_point3(last.point, Point3::new(10.0, 0.0, 0.0)));
        assert!(result.stations.iter().all(|s| s.tangent == Vec3::X));
    }

    #[test]
    fn transformed_segment_moves_points() {
        let result =
            interpolate_sections(&beam(1.0), &[rectangle(1.0, 1.0)], &[rectangle(1.0, 1.0)], 1.0, 0.001, 0.001)
                .unwrap();
        let moved = result.curves[0].transformed(&Transform::translate(Vec3::new(0.0, 0.0, 5.0)));
        assert!(Tolerance::default_geom().approx_eq_point3(moved.point_at(0.0), Point3::new(-0.5, -0.5, 5.0)));
    }
}
