use std::fmt;

use crate::geom::Plane;

use super::RfLine;

/// RFEM member: a beam on a base line with a cross section at either end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RfMember {
    pub no: i32,
    pub line_no: i32,
    pub start_cross_section_no: i32,
    /// Zero for members that carry a single section (tension members, cables).
    pub end_cross_section_no: i32,
    /// Rotation of the section about the member axis, in radians.
    pub rotation_angle: f64,
    pub base_line: RfLine,
    /// Local member frames along the base line; the first one seeds the
    /// section orientation.
    pub frames: Vec<Plane>,
    pub comment: String,
    pub tag: String,
}

impl RfMember {
    /// End cross-section number with the single-section default applied.
    #[must_use]
    pub const fn effective_end_cross_section_no(&self) -> i32 {
        if self.end_cross_section_no == 0 {
            self.start_cross_section_no
        } else {
            self.end_cross_section_no
        }
    }

    /// Seed frame for the section orientation, world XY when none is known.
    #[must_use]
    pub fn start_frame(&self) -> Plane {
        self.frames.first().copied().unwrap_or_else(Plane::world_xy)
    }
}

impl fmt::Display for RfMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RFEM-Member;No:{};LineNo:{};StartCrossSectionNo:{};EndCrossSectionNo:{};Rotation:{:.4}[rad];Tag:{};Comment:{};",
            self.no,
            self.line_no,
            self.start_cross_section_no,
            self.end_cross_section_no,
            self.rotation_angle,
            super::label_text(&self.tag),
            super::label_text(&self.comment),
        )
    }
}
