use std::fmt;

use super::RfLine;

/// Opening cut into a surface, bounded by a closed loop of lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RfOpening {
    pub no: i32,
    pub in_surface_no: i32,
    pub boundary_line_list: String,
    pub area: f64,
    pub edges: Vec<RfLine>,
    pub comment: String,
    pub tag: String,
}

impl fmt::Display for RfOpening {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RFEM-Opening;No:{};InSurfaceNo:{};Area:{}[m2];BoundaryLineList:{};Tag:{};Comment:{};",
            self.no,
            self.in_surface_no,
            self.area,
            super::label_text(&self.boundary_line_list),
            super::label_text(&self.tag),
            super::label_text(&self.comment),
        )
    }
}
