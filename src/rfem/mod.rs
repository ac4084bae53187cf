//! RFEM5 model records and their conversion into engine values.
//!
//! The records are plain data; the automation API's own structures only appear
//! in [`external`], which maps them explicitly in both directions.

use std::fmt;

use thiserror::Error;

use crate::geom::{CurveGeometry, mesh_surface_grid};
use crate::value::{SurfaceValue, TargetShape, Value};

mod cross_section;
pub mod external;
mod line;
mod member;
mod node;
mod opening;
mod surface;

pub use cross_section::RfCroSec;
pub use line::{LineType, RfLine};
pub use member::RfMember;
pub use node::RfNode;
pub use opening::RfOpening;
pub use surface::{
    RfSurface, SurfaceAxes, SurfaceAxesDirection, SurfaceGeometryType, SurfaceStiffnessType,
    SurfaceThicknessType,
};

/// Grid resolution per knot span when a NURBS surface is meshed for preview.
const SURFACE_MESH_DENSITY: usize = 8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RfemError {
    #[error("line {no}: {reason}")]
    InvalidLine { no: i32, reason: String },
    #[error("surface {no} has no control points")]
    MissingControlPoints { no: i32 },
    #[error("surface {no} has a degenerate knot vector")]
    DegenerateKnots { no: i32 },
    #[error("surface {no}: {reason}")]
    InvalidSurface { no: i32, reason: String },
    #[error("surface {no} has no boundary lines")]
    MissingEdges { no: i32 },
    #[error("surface {no} needs an axes line")]
    MissingAxesLine { no: i32 },
    #[error("surface {no} has degenerate local axes")]
    DegenerateAxes { no: i32 },
    #[error("unknown {field} `{name}`")]
    UnknownType { field: &'static str, name: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("{kind} cannot be converted to {shape}")]
    Unsupported { kind: &'static str, shape: TargetShape },
    #[error("{kind} No {no} has no {shape}")]
    NotAvailable {
        kind: &'static str,
        no: i32,
        shape: TargetShape,
    },
    #[error(transparent)]
    Rfem(#[from] RfemError),
}

/// Any RFEM record the engine handles.
#[derive(Debug, Clone, PartialEq)]
pub enum RfObject {
    Node(RfNode),
    Line(RfLine),
    Member(RfMember),
    CrossSection(RfCroSec),
    Surface(RfSurface),
    Opening(RfOpening),
}

impl RfObject {
    #[must_use]
    pub fn no(&self) -> i32 {
        match self {
            Self::Node(node) => node.no,
            Self::Line(line) => line.no,
            Self::Member(member) => member.no,
            Self::CrossSection(section) => section.no,
            Self::Surface(surface) => surface.no,
            Self::Opening(opening) => opening.no,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Node(_) => "Node",
            Self::Line(_) => "Line",
            Self::Member(_) => "Member",
            Self::CrossSection(_) => "CrossSection",
            Self::Surface(_) => "Surface",
            Self::Opening(_) => "Opening",
        }
    }

    fn unsupported(&self, shape: TargetShape) -> ConversionError {
        ConversionError::Unsupported {
            kind: self.kind(),
            shape,
        }
    }

    fn not_available(&self, shape: TargetShape) -> ConversionError {
        ConversionError::NotAvailable {
            kind: self.kind(),
            no: self.no(),
            shape,
        }
    }
}

impl fmt::Display for RfObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => fmt::Display::fmt(node, f),
            Self::Line(line) => fmt::Display::fmt(line, f),
            Self::Member(member) => fmt::Display::fmt(member, f),
            Self::CrossSection(section) => fmt::Display::fmt(section, f),
            Self::Surface(surface) => fmt::Display::fmt(surface, f),
            Self::Opening(opening) => fmt::Display::fmt(opening, f),
        }
    }
}

/// Converts a record into the representation the caller asks for.
pub fn convert(object: &RfObject, shape: TargetShape) -> Result<Value, ConversionError> {
    match shape {
        TargetShape::Integer => Ok(to_integer(object)),
        TargetShape::Point => to_point(object),
        TargetShape::Curve => to_curve(object),
        TargetShape::Plane => to_plane(object),
        TargetShape::Surface => to_surface(object),
        TargetShape::Mesh => to_mesh(object),
    }
}

/// Every record converts to its number.
#[must_use]
pub fn to_integer(object: &RfObject) -> Value {
    Value::Integer(i64::from(object.no()))
}

pub fn to_point(object: &RfObject) -> Result<Value, ConversionError> {
    match object {
        RfObject::Node(node) => Ok(Value::Point(node.location)),
        _ => Err(object.unsupported(TargetShape::Point)),
    }
}

/// Lines and members give one curve; cross sections and openings give the
/// list of their outline curves.
pub fn to_curve(object: &RfObject) -> Result<Value, ConversionError> {
    match object {
        RfObject::Line(line) => Ok(Value::Curve(line.to_curve()?)),
        RfObject::Member(member) => Ok(Value::Curve(member.base_line.to_curve()?)),
        RfObject::CrossSection(section) => Ok(Value::List(
            section.shape.iter().cloned().map(Value::Curve).collect(),
        )),
        RfObject::Opening(opening) => {
            let curves = edge_curves(&opening.edges)?;
            Ok(Value::List(curves.into_iter().map(Value::Curve).collect()))
        }
        _ => Err(object.unsupported(TargetShape::Curve)),
    }
}

pub fn to_plane(object: &RfObject) -> Result<Value, ConversionError> {
    match object {
        RfObject::Member(member) => member
            .frames
            .first()
            .map(|plane| Value::Plane(*plane))
            .ok_or_else(|| object.not_available(TargetShape::Plane)),
        RfObject::Surface(surface) => surface
            .axes
            .map(Value::Plane)
            .ok_or_else(|| object.not_available(TargetShape::Plane)),
        _ => Err(object.unsupported(TargetShape::Plane)),
    }
}

/// NURBS surfaces keep their exact shape; all other surfaces and openings
/// become planar boundary loops.
pub fn to_surface(object: &RfObject) -> Result<Value, ConversionError> {
    match object {
        RfObject::Surface(surface) => {
            if surface.geometry_type == SurfaceGeometryType::Nurbs && surface.has_control_points() {
                return Ok(Value::Surface(SurfaceValue::Nurbs(surface.to_nurbs_surface()?)));
            }
            if surface.edges.is_empty() {
                return Err(object.not_available(TargetShape::Surface));
            }
            let mut loops = edge_curves(&surface.edges)?;
            for opening in &surface.openings {
                loops.extend(edge_curves(&opening.edges)?);
            }
            Ok(Value::Surface(SurfaceValue::Boundary(loops)))
        }
        RfObject::Opening(opening) if !opening.edges.is_empty() => {
            Ok(Value::Surface(SurfaceValue::Boundary(edge_curves(&opening.edges)?)))
        }
        RfObject::Opening(_) => Err(object.not_available(TargetShape::Surface)),
        _ => Err(object.unsupported(TargetShape::Surface)),
    }
}

/// Preview mesh of a NURBS surface. Member meshes need their cross sections and
/// come from the extrude-members component instead.
pub fn to_mesh(object: &RfObject) -> Result<Value, ConversionError> {
    let RfObject::Surface(surface) = object else {
        return Err(object.unsupported(TargetShape::Mesh));
    };
    if !surface.has_control_points() {
        return Err(object.not_available(TargetShape::Mesh));
    }

    let nurbs = surface.to_nurbs_surface()?;
    let u_count = (nurbs.u_count - nurbs.degree_u) * SURFACE_MESH_DENSITY + 1;
    let v_count = (nurbs.v_count - nurbs.degree_v) * SURFACE_MESH_DENSITY + 1;
    let (mesh, diagnostics) = mesh_surface_grid(&nurbs, u_count, v_count)
        .map_err(|reason| RfemError::InvalidSurface { no: surface.no, reason })?;
    log::debug!("surface {} preview mesh: {}", surface.no, diagnostics.summary());
    Ok(Value::Mesh(mesh))
}

fn edge_curves(edges: &[RfLine]) -> Result<Vec<CurveGeometry>, RfemError> {
    edges.iter().map(RfLine::to_curve).collect()
}

pub(crate) fn label_text(text: &str) -> &str {
    if text.is_empty() { "-" } else { text }
}

pub(crate) const fn label_bool(flag: bool) -> &'static str {
    if flag { "True" } else { "False" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Plane, Point3, Vec3};

    fn square_surface() -> RfSurface {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        RfSurface {
            no: 2,
            edges: (0..4)
                .map(|i| RfLine::straight(10 + i32::try_from(i).unwrap(), corners[i], corners[(i + 1) % 4]))
                .collect(),
            ..RfSurface::default()
        }
    }

    #[test]
    fn every_record_converts_to_its_number() {
        let node = RfObject::Node(RfNode::new(12, Point3::ORIGIN));
        assert_eq!(convert(&node, TargetShape::Integer), Ok(Value::Integer(12)));
    }

    #[test]
    fn node_converts_to_point_but_not_to_curve() {
        let node = RfObject::Node(RfNode::new(1, Point3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            convert(&node, TargetShape::Point),
            Ok(Value::Point(Point3::new(1.0, 2.0, 3.0)))
        );
        let err = convert(&node, TargetShape::Curve).unwrap_err();
        assert_eq!(err.to_string(), "Node cannot be converted to Curve");
    }

    #[test]
    fn member_plane_is_its_first_frame() {
        let frame = Plane::new(Point3::ORIGIN, Vec3::Y, Vec3::Z).unwrap();
        let member = RfObject::Member(RfMember {
            no: 4,
            frames: vec![frame],
            ..RfMember::default()
        });
        assert_eq!(convert(&member, TargetShape::Plane), Ok(Value::Plane(frame)));

        let bare = RfObject::Member(RfMember {
            no: 5,
            ..RfMember::default()
        });
        let err = convert(&bare, TargetShape::Plane).unwrap_err();
        assert_eq!(err.to_string(), "Member No 5 has no Plane");
    }

    #[test]
    fn planar_surface_becomes_boundary_loops() {
        let mut surface = square_surface();
        surface.openings.push(RfOpening {
            no: 1,
            in_surface_no: 2,
            edges: vec![RfLine::straight(20, Point3::new(0.2, 0.2, 0.0), Point3::new(0.4, 0.2, 0.0))],
            ..RfOpening::default()
        });
        let value = convert(&RfObject::Surface(surface), TargetShape::Surface).expect("surface conversion");
        match value {
            Value::Surface(SurfaceValue::Boundary(loops)) => assert_eq!(loops.len(), 5),
            other => panic!("verwacht Boundary, kreeg {other:?}"),
        }
    }

    #[test]
    fn nurbs_surface_converts_to_mesh() {
        let surface = RfSurface {
            no: 8,
            geometry_type: SurfaceGeometryType::Nurbs,
            control_points: vec![
                vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
                vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.5)],
            ],
            knots_x: vec![0.0, 0.0, 1.0, 1.0],
            knots_y: vec![0.0, 0.0, 1.0, 1.0],
            order_x: 2,
            order_y: 2,
            ..RfSurface::default()
        };
        let object = RfObject::Surface(surface);

        match convert(&object, TargetShape::Surface).expect("surface conversion") {
            Value::Surface(SurfaceValue::Nurbs(nurbs)) => assert_eq!(nurbs.u_count, 2),
            other => panic!("verwacht Nurbs, kreeg {other:?}"),
        }
        match convert(&object, TargetShape::Mesh).expect("mesh conversion") {
            Value::Mesh(mesh) => {
                assert_eq!(mesh.vertex_count(), 81);
                assert_eq!(mesh.triangle_count(), 128);
            }
            other => panic!("verwacht Mesh, kreeg {other:?}"),
        }
    }

    #[test]
    fn plane_without_computed_axes_is_not_available() {
        let object = RfObject::Surface(square_surface());
        assert_eq!(
            convert(&object, TargetShape::Plane),
            Err(ConversionError::NotAvailable {
                kind: "Surface",
                no: 2,
                shape: TargetShape::Plane,
            })
        );
    }
}
