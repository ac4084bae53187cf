//! Extrude-members component: RFEM-staaf + doorsneden → mesh of oppervlakken.
//!
//! De volgorde van de controles en de meldingen volgt het RFEM-menu: eerst
//! moeten beide doorsneden bestaan, daarna moeten ze op elkaar lijken, pas dan
//! wordt er geometrie gebouwd.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geom::{
    extrude_sections_to_mesh, interpolate_sections, loft_sections_to_surfaces, orient_sections,
};
use crate::rfem::{RfCroSec, RfMember, RfObject};
use crate::value::{SurfaceValue, Value};

use super::{Component, ComponentError, ComponentResult, ExtrudeSettings};

/// Grasshopper-pin "Extrussions".
pub const OUTPUT_PIN: &str = "E";

/// Fit-tolerantie voor de booglengte van de hartlijn.
const FIT_TOLERANCE: f64 = 0.001;
/// Tolerantie waaronder de uiteinden van een segment als gesloten gelden.
const JOIN_TOLERANCE: f64 = 0.001;

/// Uitvoervorm van de component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtrudeMode {
    #[default]
    Mesh,
    Surface,
}

impl ExtrudeMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mesh => "MESH",
            Self::Surface => "SURFACE",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "MESH" => Some(Self::Mesh),
            "SURFACE" => Some(Self::Surface),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentImpl {
    pub mode: ExtrudeMode,
}

impl ComponentImpl {
    #[must_use]
    pub const fn new(mode: ExtrudeMode) -> Self {
        Self { mode }
    }
}

impl Component for ComponentImpl {
    fn evaluate(&self, inputs: &[Value], settings: &ExtrudeSettings) -> ComponentResult {
        if inputs.len() < 2 {
            return Err(ComponentError::error(
                "Extrude Members vereist een member en een lijst doorsneden",
            ));
        }

        let member = coerce_member(&inputs[0])?;
        let cross_sections = coerce_cross_sections(&inputs[1])?;
        let geometry = solve_member(member, &cross_sections, settings, self.mode)?;

        let mut outputs = BTreeMap::new();
        outputs.insert(OUTPUT_PIN.to_owned(), Value::List(geometry));
        Ok(outputs)
    }
}

/// Extrudes one member. Validation failures and geometric diagnostics are
/// warnings; nothing is returned alongside them.
pub fn solve_member(
    member: &RfMember,
    cross_sections: &[RfCroSec],
    settings: &ExtrudeSettings,
    mode: ExtrudeMode,
) -> Result<Vec<Value>, ComponentError> {
    let start_no = member.start_cross_section_no;
    let end_no = member.effective_end_cross_section_no();

    let find = |no: i32| cross_sections.iter().find(|section| section.no == no);
    let (Some(start), Some(end)) = (find(start_no), find(end_no)) else {
        return Err(ComponentError::warning(format!(
            "Provide cross sections for member No {}.",
            member.no
        )));
    };

    if !start.is_similar_to(end) {
        return Err(ComponentError::warning(format!(
            "Provide similar cross sections for member No {}.",
            member.no
        )));
    }

    let warn = |err: &dyn std::fmt::Display| {
        ComponentError::warning(format!("member No {}: {err}", member.no))
    };

    let centerline = member.base_line.to_curve().map_err(|err| warn(&err))?;
    let tween = interpolate_sections(
        &centerline,
        &start.shape,
        &end.shape,
        settings.segment_length,
        FIT_TOLERANCE,
        JOIN_TOLERANCE,
    )
    .map_err(|err| warn(&err))?;
    log::debug!(
        "member {}: {} stations, {} segments per profile",
        member.no,
        tween.station_count(),
        tween.segments_per_profile
    );

    let profiles = orient_sections(
        &tween.curves,
        &tween.stations,
        tween.station_count(),
        &member.start_frame(),
        tween.segments_per_profile,
    )
    .map_err(|err| warn(&err))?;

    let faces = settings.faces_per_cross_section.max(1);
    match mode {
        ExtrudeMode::Mesh => {
            let (meshes, message) = extrude_sections_to_mesh(&profiles, faces);
            if !message.is_empty() {
                return Err(ComponentError::warning(message));
            }
            Ok(meshes.into_iter().map(Value::Mesh).collect())
        }
        ExtrudeMode::Surface => {
            let (surfaces, message) = loft_sections_to_surfaces(&profiles, faces);
            if !message.is_empty() {
                return Err(ComponentError::warning(message));
            }
            Ok(surfaces
                .into_iter()
                .map(|surface| Value::Surface(SurfaceValue::Nurbs(surface)))
                .collect())
        }
    }
}

/// Extrudes many members with the same settings, in input order.
#[cfg(feature = "parallel")]
#[must_use]
pub fn solve_members(
    members: &[RfMember],
    cross_sections: &[RfCroSec],
    settings: &ExtrudeSettings,
    mode: ExtrudeMode,
) -> Vec<Result<Vec<Value>, ComponentError>> {
    members
        .par_iter()
        .map(|member| solve_member(member, cross_sections, settings, mode))
        .collect()
}

#[cfg(not(feature = "parallel"))]
#[must_use]
pub fn solve_members(
    members: &[RfMember],
    cross_sections: &[RfCroSec],
    settings: &ExtrudeSettings,
    mode: ExtrudeMode,
) -> Vec<Result<Vec<Value>, ComponentError>> {
    members
        .iter()
        .map(|member| solve_member(member, cross_sections, settings, mode))
        .collect()
}

fn coerce_member(value: &Value) -> Result<&RfMember, ComponentError> {
    if let Value::List(values) = value {
        if let [single] = values.as_slice() {
            return coerce_member(single);
        }
    }
    match value.expect_rfem()? {
        RfObject::Member(member) => Ok(member),
        other => Err(ComponentError::error(format!(
            "Extrude Members verwacht een RFEM-member, kreeg RFEM-{}",
            other.kind()
        ))),
    }
}

fn coerce_cross_sections(value: &Value) -> Result<Vec<RfCroSec>, ComponentError> {
    let items = match value {
        Value::List(values) => values.as_slice(),
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .map(|item| match item.expect_rfem()? {
            RfObject::CrossSection(section) => Ok(section.clone()),
            other => Err(ComponentError::error(format!(
                "Extrude Members verwacht RFEM-doorsneden, kreeg RFEM-{}",
                other.kind()
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Component, ComponentImpl, ExtrudeMode, OUTPUT_PIN, solve_member, solve_members};
    use crate::components::{ExtrudeSettings, MessageLevel};
    use crate::geom::{CurveGeometry, Plane, Point3, Polyline3, Vec3};
    use crate::rfem::{RfCroSec, RfLine, RfMember, RfObject, RfNode};
    use crate::value::{SurfaceValue, Value};

    fn rectangle(no: i32, half_width: f64, half_height: f64) -> RfCroSec {
        let outline = Polyline3::new(
            vec![
                Point3::new(-half_width, -half_height, 0.0),
                Point3::new(half_width, -half_height, 0.0),
                Point3::new(half_width, half_height, 0.0),
                Point3::new(-half_width, half_height, 0.0),
            ],
            true,
        )
        .expect("geldige rechthoek");
        RfCroSec {
            no,
            shape: vec![CurveGeometry::Polyline(outline)],
            ..RfCroSec::default()
        }
    }

    fn beam(no: i32, start: i32, end: i32, length: f64) -> RfMember {
        RfMember {
            no,
            start_cross_section_no: start,
            end_cross_section_no: end,
            base_line: RfLine::straight(1, Point3::ORIGIN, Point3::new(length, 0.0, 0.0)),
            frames: vec![Plane::new(Point3::ORIGIN, Vec3::Y, Vec3::Z).expect("geldig vlak")],
            ..RfMember::default()
        }
    }

    #[test]
    fn extrudes_tapered_beam_to_one_mesh() {
        let component = ComponentImpl::new(ExtrudeMode::Mesh);
        let outputs = component
            .evaluate(
                &[
                    Value::Rfem(RfObject::Member(beam(1, 1, 2, 3.0))),
                    Value::List(vec![
                        Value::Rfem(RfObject::CrossSection(rectangle(1, 0.1, 0.2))),
                        Value::Rfem(RfObject::CrossSection(rectangle(2, 0.2, 0.4))),
                    ]),
                ],
                &ExtrudeSettings::default(),
            )
            .expect("extrude slaagt");

        let Some(Value::List(items)) = outputs.get(OUTPUT_PIN) else {
            panic!("verwacht een lijst op pin {OUTPUT_PIN}");
        };
        assert_eq!(items.len(), 1);
        match &items[0] {
            // 3 stations, 4 spans x 2 faces = 8 ring points.
            Value::Mesh(mesh) => {
                assert_eq!(mesh.vertex_count(), 24);
                assert_eq!(mesh.triangle_count(), 32);
            }
            other => panic!("verwacht Mesh, kreeg {other:?}"),
        }
    }

    #[test]
    fn missing_cross_section_is_a_warning() {
        let err = solve_member(
            &beam(4, 1, 9, 2.0),
            &[rectangle(1, 0.1, 0.2)],
            &ExtrudeSettings::default(),
            ExtrudeMode::Mesh,
        )
        .unwrap_err();
        assert_eq!(err.level(), MessageLevel::Warning);
        assert_eq!(err.message(), "Provide cross sections for member No 4.");
    }

    #[test]
    fn surface_mode_lofts_nurbs_surfaces() {
        let geometry = solve_member(
            &beam(2, 1, 0, 2.0),
            &[rectangle(1, 0.1, 0.2)],
            &ExtrudeSettings::default(),
            ExtrudeMode::Surface,
        )
        .expect("loft slaagt");
        assert_eq!(geometry.len(), 1);
        assert!(matches!(geometry[0], Value::Surface(SurfaceValue::Nurbs(_))));
    }

    #[test]
    fn wrong_input_kind_is_an_error() {
        let component = ComponentImpl::default();
        let err = component
            .evaluate(
                &[
                    Value::Rfem(RfObject::Node(RfNode::new(1, Point3::ORIGIN))),
                    Value::List(Vec::new()),
                ],
                &ExtrudeSettings::default(),
            )
            .unwrap_err();
        assert_eq!(err.level(), MessageLevel::Error);
        assert!(err.message().contains("RFEM-Node"));
    }

    #[test]
    fn non_rfem_cross_section_is_an_error() {
        let err = ComponentImpl::default()
            .evaluate(
                &[
                    Value::List(vec![Value::Rfem(RfObject::Member(beam(1, 1, 0, 2.0)))]),
                    Value::List(vec![Value::Integer(1)]),
                ],
                &ExtrudeSettings::default(),
            )
            .unwrap_err();
        assert_eq!(err.level(), MessageLevel::Error);
        assert_eq!(err.message(), "verwachtte type `Rfem` maar kreeg `Integer`");
    }

    #[test]
    fn solve_members_keeps_input_order() {
        let sections = [rectangle(1, 0.1, 0.2), rectangle(2, 0.3, 0.3)];
        let members = [beam(1, 1, 0, 2.0), beam(2, 5, 0, 2.0), beam(3, 2, 0, 2.0)];
        let results = solve_members(&members, &sections, &ExtrudeSettings::default(), ExtrudeMode::Mesh);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].as_ref().unwrap_err().message(),
            "Provide cross sections for member No 2."
        );
        assert!(results[2].is_ok());
    }
}
