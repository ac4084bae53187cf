use std::fmt;

use crate::geom::CurveGeometry;

/// RFEM cross section with its outline drawn in world XY, centroid at the
/// origin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RfCroSec {
    pub no: i32,
    pub description: String,
    pub material_no: i32,
    pub shape: Vec<CurveGeometry>,
    pub comment: String,
}

impl RfCroSec {
    /// Sum of the span counts of all outline segments. Two sections can only
    /// be blended into each other when these and their segment counts match.
    #[must_use]
    pub fn total_span_count(&self) -> usize {
        crate::geom::profile_span_count(&self.shape)
    }

    /// Same segment count and total span count.
    #[must_use]
    pub fn is_similar_to(&self, other: &Self) -> bool {
        self.shape.len() == other.shape.len() && self.total_span_count() == other.total_span_count()
    }
}

impl fmt::Display for RfCroSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RFEM-CroSec;No:{};Description:{};MaterialNo:{};Segments:{};Spans:{};Comment:{};",
            self.no,
            super::label_text(&self.description),
            self.material_no,
            self.shape.len(),
            self.total_span_count(),
            super::label_text(&self.comment),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, Polyline3};

    fn rectangle(half_width: f64, half_height: f64) -> CurveGeometry {
        let points = vec![
            Point3::new(-half_width, -half_height, 0.0),
            Point3::new(half_width, -half_height, 0.0),
            Point3::new(half_width, half_height, 0.0),
            Point3::new(-half_width, half_height, 0.0),
        ];
        CurveGeometry::Polyline(Polyline3::new(points, true).expect("valid rectangle"))
    }

    #[test]
    fn closed_rectangle_counts_four_spans() {
        let section = RfCroSec {
            no: 1,
            shape: vec![rectangle(0.1, 0.2)],
            ..RfCroSec::default()
        };
        assert_eq!(section.total_span_count(), 4);
    }

    #[test]
    fn similarity_compares_segments_and_spans() {
        let small = RfCroSec {
            no: 1,
            shape: vec![rectangle(0.1, 0.2)],
            ..RfCroSec::default()
        };
        let large = RfCroSec {
            no: 2,
            shape: vec![rectangle(0.3, 0.5)],
            ..RfCroSec::default()
        };
        let split = RfCroSec {
            no: 3,
            shape: vec![rectangle(0.1, 0.2), rectangle(0.05, 0.05)],
            ..RfCroSec::default()
        };
        assert!(small.is_similar_to(&large));
        assert!(!small.is_similar_to(&split));
    }
}
