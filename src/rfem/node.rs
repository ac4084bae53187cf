use std::fmt;

use crate::geom::Point3;

/// RFEM node: a numbered point of the analysis model.
#[derive(Debug, Clone, PartialEq)]
pub struct RfNode {
    pub no: i32,
    pub location: Point3,
    pub comment: String,
    pub tag: String,
}

impl RfNode {
    #[must_use]
    pub fn new(no: i32, location: Point3) -> Self {
        Self {
            no,
            location,
            comment: String::new(),
            tag: String::new(),
        }
    }
}

impl fmt::Display for RfNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RFEM-Node;No:{};X:{:.3}[m];Y:{:.3}[m];Z:{:.3}[m];Tag:{};Comment:{};",
            self.no,
            self.location.x,
            self.location.y,
            self.location.z,
            super::label_text(&self.tag),
            super::label_text(&self.comment),
        )
    }
}
