//! Serde mirrors of the RFEM5 automation records.
//!
//! Field names follow the automation API (`PascalCase`), enums travel as their
//! RFEM names. Every record has one `*_from_external` and one `*_to_external`
//! function; there are no implicit conversions between the two vocabularies.

use serde::{Deserialize, Serialize};

use crate::geom::{Curve3, CurveGeometry, Plane, Point3, Vec3};

use super::{
    LineType, RfCroSec, RfLine, RfMember, RfNode, RfOpening, RfSurface, RfemError, SurfaceAxes,
    SurfaceAxesDirection, SurfaceGeometryType, SurfaceStiffnessType, SurfaceThicknessType,
};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalNode {
    pub no: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub comment: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalLine {
    pub no: i32,
    #[serde(rename = "Type")]
    pub line_type: String,
    pub node_list: String,
    pub control_points: Vec<Point3D>,
    pub weights: Vec<f64>,
    pub knots: Vec<f64>,
    pub order: usize,
    pub comment: String,
    pub tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalPlane {
    pub origin: Point3D,
    pub x_axis: Point3D,
    pub y_axis: Point3D,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalMember {
    pub no: i32,
    pub line_no: i32,
    pub start_cross_section_no: i32,
    pub end_cross_section_no: i32,
    pub rotation_angle: f64,
    pub base_line: ExternalLine,
    pub frames: Vec<ExternalPlane>,
    pub comment: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalCrossSection {
    pub no: i32,
    pub description: String,
    pub material_no: i32,
    /// Outline segments drawn in the section's own XY plane.
    pub shape: Vec<ExternalLine>,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalNurbsSurface {
    pub control_points: Vec<Vec<Point3D>>,
    pub weights: Vec<Vec<f64>>,
    pub knots_x: Vec<f64>,
    pub knots_y: Vec<f64>,
    pub order_x: usize,
    pub order_y: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalSurfaceAxes {
    pub no: i32,
    pub direction: String,
    pub line_list: String,
    pub point1: Point3D,
    pub point2: Point3D,
    pub rotation: f64,
    #[serde(rename = "UserCSNo")]
    pub user_cs_no: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalOpening {
    pub no: i32,
    pub in_surface_no: i32,
    pub boundary_line_list: String,
    pub area: f64,
    pub edges: Vec<ExternalLine>,
    pub comment: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExternalSurface {
    pub no: i32,
    pub comment: String,
    #[serde(rename = "ID")]
    pub id: String,
    pub tag: String,
    pub is_generated: bool,
    pub is_valid: bool,
    pub area: f64,
    pub boundary_line_count: usize,
    pub boundary_line_list: String,
    pub integrated_line_count: usize,
    pub integrated_line_list: String,
    pub integrated_node_count: usize,
    pub integrated_node_list: String,
    pub set_integrated_objects: bool,
    pub eccentricity: f64,
    pub geometry_type: String,
    pub material_no: i32,
    pub stiffness_type: String,
    pub thickness_type: String,
    pub thickness: f64,
    pub nurbs: Option<ExternalNurbsSurface>,
    pub edges: Vec<ExternalLine>,
    pub openings: Vec<ExternalOpening>,
    pub axes: Option<ExternalSurfaceAxes>,
    pub to_modify: bool,
    pub to_delete: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Points and planes
// ─────────────────────────────────────────────────────────────────────────────

#[must_use]
pub fn point_from_external(point: Point3D) -> Point3 {
    Point3::new(point.x, point.y, point.z)
}

#[must_use]
pub fn point_to_external(point: Point3) -> Point3D {
    Point3D {
        x: point.x,
        y: point.y,
        z: point.z,
    }
}

/// `None` when the axes are parallel or zero.
#[must_use]
pub fn plane_from_external(plane: &ExternalPlane) -> Option<Plane> {
    let x = plane.x_axis;
    let y = plane.y_axis;
    Plane::new(
        point_from_external(plane.origin),
        Vec3::new(x.x, x.y, x.z),
        Vec3::new(y.x, y.y, y.z),
    )
}

#[must_use]
pub fn plane_to_external(plane: &Plane) -> ExternalPlane {
    let axis = |v: Vec3| Point3D { x: v.x, y: v.y, z: v.z };
    ExternalPlane {
        origin: point_to_external(plane.origin),
        x_axis: axis(plane.x_axis),
        y_axis: axis(plane.y_axis),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes and lines
// ─────────────────────────────────────────────────────────────────────────────

#[must_use]
pub fn node_from_external(node: &ExternalNode) -> RfNode {
    RfNode {
        no: node.no,
        location: Point3::new(node.x, node.y, node.z),
        comment: node.comment.clone(),
        tag: node.tag.clone(),
    }
}

#[must_use]
pub fn node_to_external(node: &RfNode) -> ExternalNode {
    ExternalNode {
        no: node.no,
        x: node.location.x,
        y: node.location.y,
        z: node.location.z,
        comment: node.comment.clone(),
        tag: node.tag.clone(),
    }
}

/// An empty line type reads as a polyline.
pub fn line_from_external(line: &ExternalLine) -> Result<RfLine, RfemError> {
    let line_type = if line.line_type.is_empty() {
        LineType::Polyline
    } else {
        LineType::from_name(&line.line_type).ok_or_else(|| RfemError::UnknownType {
            field: "line type",
            name: line.line_type.clone(),
        })?
    };

    Ok(RfLine {
        no: line.no,
        line_type,
        node_list: line.node_list.clone(),
        control_points: line.control_points.iter().copied().map(point_from_external).collect(),
        weights: line.weights.clone(),
        knots: line.knots.clone(),
        order: line.order,
        comment: line.comment.clone(),
        tag: line.tag.clone(),
    })
}

#[must_use]
pub fn line_to_external(line: &RfLine) -> ExternalLine {
    ExternalLine {
        no: line.no,
        line_type: line.line_type.name().to_owned(),
        node_list: line.node_list.clone(),
        control_points: line.control_points.iter().copied().map(point_to_external).collect(),
        weights: line.weights.clone(),
        knots: line.knots.clone(),
        order: line.order,
        comment: line.comment.clone(),
        tag: line.tag.clone(),
    }
}

/// Describes a profile segment as an unnumbered RFEM line.
#[must_use]
pub fn curve_to_external(curve: &CurveGeometry) -> ExternalLine {
    let (line_type, points, weights, knots, order) = match curve {
        CurveGeometry::Line(line) => (LineType::Polyline, vec![line.start, line.end], Vec::new(), Vec::new(), 0),
        CurveGeometry::Polyline(polyline) => {
            let mut points = polyline.points().to_vec();
            if polyline.closed() {
                points.push(points[0]);
            }
            (LineType::Polyline, points, Vec::new(), Vec::new(), 0)
        }
        CurveGeometry::Arc(arc) if arc.is_closed() => (
            LineType::Circle,
            vec![arc.point_at(0.0), arc.point_at(1.0 / 3.0), arc.point_at(2.0 / 3.0)],
            Vec::new(),
            Vec::new(),
            0,
        ),
        CurveGeometry::Arc(arc) => (
            LineType::Arc,
            vec![arc.point_at(0.0), arc.point_at(0.5), arc.point_at(1.0)],
            Vec::new(),
            Vec::new(),
            0,
        ),
        CurveGeometry::Nurbs(nurbs) => (
            LineType::Nurbs,
            nurbs.control_points.clone(),
            nurbs.weights.clone().unwrap_or_default(),
            nurbs.knots.clone(),
            nurbs.degree + 1,
        ),
    };

    ExternalLine {
        line_type: line_type.name().to_owned(),
        control_points: points.into_iter().map(point_to_external).collect(),
        weights,
        knots,
        order,
        ..ExternalLine::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Members and cross sections
// ─────────────────────────────────────────────────────────────────────────────

/// Degenerate frames are dropped with a warning; the member then seeds its
/// section orientation from the remaining frames or world XY.
pub fn member_from_external(member: &ExternalMember) -> Result<RfMember, RfemError> {
    let frames = member
        .frames
        .iter()
        .filter_map(|frame| {
            let plane = plane_from_external(frame);
            if plane.is_none() {
                log::warn!("member {}: skipping degenerate frame {frame:?}", member.no);
            }
            plane
        })
        .collect();

    Ok(RfMember {
        no: member.no,
        line_no: member.line_no,
        start_cross_section_no: member.start_cross_section_no,
        end_cross_section_no: member.end_cross_section_no,
        rotation_angle: member.rotation_angle,
        base_line: line_from_external(&member.base_line)?,
        frames,
        comment: member.comment.clone(),
        tag: member.tag.clone(),
    })
}

#[must_use]
pub fn member_to_external(member: &RfMember) -> ExternalMember {
    ExternalMember {
        no: member.no,
        line_no: member.line_no,
        start_cross_section_no: member.start_cross_section_no,
        end_cross_section_no: member.end_cross_section_no,
        rotation_angle: member.rotation_angle,
        base_line: line_to_external(&member.base_line),
        frames: member.frames.iter().map(plane_to_external).collect(),
        comment: member.comment.clone(),
        tag: member.tag.clone(),
    }
}

pub fn cross_section_from_external(section: &ExternalCrossSection) -> Result<RfCroSec, RfemError> {
    let shape = section
        .shape
        .iter()
        .map(|segment| line_from_external(segment)?.to_curve())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RfCroSec {
        no: section.no,
        description: section.description.clone(),
        material_no: section.material_no,
        shape,
        comment: section.comment.clone(),
    })
}

#[must_use]
pub fn cross_section_to_external(section: &RfCroSec) -> ExternalCrossSection {
    ExternalCrossSection {
        no: section.no,
        description: section.description.clone(),
        material_no: section.material_no,
        shape: section.shape.iter().map(curve_to_external).collect(),
        comment: section.comment.clone(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Surfaces and openings
// ─────────────────────────────────────────────────────────────────────────────

pub fn opening_from_external(opening: &ExternalOpening) -> Result<RfOpening, RfemError> {
    Ok(RfOpening {
        no: opening.no,
        in_surface_no: opening.in_surface_no,
        boundary_line_list: opening.boundary_line_list.clone(),
        area: opening.area,
        edges: opening.edges.iter().map(line_from_external).collect::<Result<_, _>>()?,
        comment: opening.comment.clone(),
        tag: opening.tag.clone(),
    })
}

#[must_use]
pub fn opening_to_external(opening: &RfOpening) -> ExternalOpening {
    ExternalOpening {
        no: opening.no,
        in_surface_no: opening.in_surface_no,
        boundary_line_list: opening.boundary_line_list.clone(),
        area: opening.area,
        edges: opening.edges.iter().map(line_to_external).collect(),
        comment: opening.comment.clone(),
        tag: opening.tag.clone(),
    }
}

pub fn surface_axes_from_external(axes: &ExternalSurfaceAxes) -> Result<SurfaceAxes, RfemError> {
    Ok(SurfaceAxes {
        direction: parse_name(&axes.direction, "surface axes direction", SurfaceAxesDirection::from_name)?,
        surface_no: axes.no,
        axes_line_list: axes.line_list.clone(),
        point1: point_from_external(axes.point1),
        point2: point_from_external(axes.point2),
        rotation: axes.rotation,
        user_cs_no: axes.user_cs_no,
    })
}

/// A missing axes record is written as the standard direction.
#[must_use]
pub fn surface_axes_to_external(axes: Option<&SurfaceAxes>) -> ExternalSurfaceAxes {
    let Some(axes) = axes else {
        return ExternalSurfaceAxes {
            direction: SurfaceAxesDirection::Standard.name().to_owned(),
            ..ExternalSurfaceAxes::default()
        };
    };
    ExternalSurfaceAxes {
        no: axes.surface_no,
        direction: axes.direction.name().to_owned(),
        line_list: axes.axes_line_list.clone(),
        point1: point_to_external(axes.point1),
        point2: point_to_external(axes.point2),
        rotation: axes.rotation,
        user_cs_no: axes.user_cs_no,
    }
}

pub fn surface_from_external(surface: &ExternalSurface) -> Result<RfSurface, RfemError> {
    let nurbs = surface.nurbs.clone().unwrap_or_default();
    let geometry_type = parse_name(&surface.geometry_type, "surface geometry type", SurfaceGeometryType::from_name)?;

    Ok(RfSurface {
        no: surface.no,
        comment: surface.comment.clone(),
        id: surface.id.clone(),
        tag: surface.tag.clone(),
        is_generated: surface.is_generated,
        is_valid: surface.is_valid,
        area: surface.area,
        boundary_line_count: surface.boundary_line_count,
        boundary_line_list: surface.boundary_line_list.clone(),
        integrated_line_count: surface.integrated_line_count,
        integrated_line_list: surface.integrated_line_list.clone(),
        integrated_node_count: surface.integrated_node_count,
        integrated_node_list: surface.integrated_node_list.clone(),
        set_integrated_objects: surface.set_integrated_objects,
        control_points: nurbs
            .control_points
            .iter()
            .map(|row| row.iter().copied().map(point_from_external).collect())
            .collect(),
        weights: nurbs.weights,
        knots_x: nurbs.knots_x,
        knots_y: nurbs.knots_y,
        order_x: nurbs.order_x,
        order_y: nurbs.order_y,
        eccentricity: surface.eccentricity,
        geometry_type,
        material_no: surface.material_no,
        stiffness_type: parse_name(&surface.stiffness_type, "stiffness type", SurfaceStiffnessType::from_name)?,
        thickness_type: parse_name(&surface.thickness_type, "thickness type", SurfaceThicknessType::from_name)?,
        thickness: surface.thickness,
        edges: surface.edges.iter().map(line_from_external).collect::<Result<_, _>>()?,
        openings: surface.openings.iter().map(opening_from_external).collect::<Result<_, _>>()?,
        surface_axes: surface.axes.as_ref().map(surface_axes_from_external).transpose()?,
        axes: None,
        to_modify: surface.to_modify,
        to_delete: surface.to_delete,
    })
}

/// Surfaces with a control net are written as NURBS surfaces.
#[must_use]
pub fn surface_to_external(surface: &RfSurface) -> ExternalSurface {
    let nurbs = surface.has_control_points().then(|| ExternalNurbsSurface {
        control_points: surface
            .control_points
            .iter()
            .map(|row| row.iter().copied().map(point_to_external).collect())
            .collect(),
        weights: surface.weights.clone(),
        knots_x: surface.knots_x.clone(),
        knots_y: surface.knots_y.clone(),
        order_x: surface.order_x,
        order_y: surface.order_y,
    });
    let geometry_type = if nurbs.is_some() {
        SurfaceGeometryType::Nurbs
    } else {
        surface.geometry_type
    };

    ExternalSurface {
        no: surface.no,
        comment: surface.comment.clone(),
        id: surface.id.clone(),
        tag: surface.tag.clone(),
        is_generated: surface.is_generated,
        is_valid: surface.is_valid,
        area: surface.area,
        boundary_line_count: surface.boundary_line_count,
        boundary_line_list: surface.boundary_line_list.clone(),
        integrated_line_count: surface.integrated_line_count,
        integrated_line_list: surface.integrated_line_list.clone(),
        integrated_node_count: surface.integrated_node_count,
        integrated_node_list: surface.integrated_node_list.clone(),
        set_integrated_objects: surface.set_integrated_objects,
        eccentricity: surface.eccentricity,
        geometry_type: geometry_type.name().to_owned(),
        material_no: surface.material_no,
        stiffness_type: surface.stiffness_type.name().to_owned(),
        thickness_type: surface.thickness_type.name().to_owned(),
        thickness: surface.thickness,
        nurbs,
        edges: surface.edges.iter().map(line_to_external).collect(),
        openings: surface.openings.iter().map(opening_to_external).collect(),
        axes: Some(surface_axes_to_external(surface.surface_axes.as_ref())),
        to_modify: surface.to_modify,
        to_delete: surface.to_delete,
    }
}

/// Empty names fall back to the enum's default variant.
fn parse_name<T: Default>(name: &str, field: &'static str, parse: fn(&str) -> Option<T>) -> Result<T, RfemError> {
    if name.is_empty() {
        return Ok(T::default());
    }
    parse(name).ok_or_else(|| RfemError::UnknownType {
        field,
        name: name.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Polyline3, Tolerance};

    fn ext_point(x: f64, y: f64, z: f64) -> Point3D {
        Point3D { x, y, z }
    }

    #[test]
    fn node_keeps_coordinates_and_text() {
        let node = RfNode {
            comment: "steunpunt".to_owned(),
            ..RfNode::new(9, Point3::new(1.5, -2.0, 0.25))
        };
        let external = node_to_external(&node);
        assert_eq!((external.no, external.x, external.y, external.z), (9, 1.5, -2.0, 0.25));
        assert_eq!(node_from_external(&external), node);
    }

    #[test]
    fn member_keeps_numbers_and_frames() {
        let external = ExternalMember {
            no: 7,
            start_cross_section_no: 3,
            base_line: ExternalLine {
                no: 1,
                control_points: vec![ext_point(0.0, 0.0, 0.0), ext_point(5.0, 0.0, 0.0)],
                ..ExternalLine::default()
            },
            frames: vec![
                ExternalPlane {
                    origin: ext_point(0.0, 0.0, 0.0),
                    x_axis: ext_point(0.0, 1.0, 0.0),
                    y_axis: ext_point(0.0, 0.0, 1.0),
                },
                ExternalPlane::default(),
            ],
            ..ExternalMember::default()
        };

        let member = member_from_external(&external).expect("member should map");
        assert_eq!(member.no, 7);
        assert_eq!(member.effective_end_cross_section_no(), 3);
        assert_eq!(member.frames.len(), 1);
        assert_eq!(member.frames[0].z_axis, Vec3::X);

        let back = member_to_external(&member);
        assert_eq!(back.base_line.line_type, "PolylineType");
        assert_eq!(back.frames.len(), 1);
    }

    #[test]
    fn closed_polyline_section_survives_the_boundary() {
        let outline = Polyline3::new(
            vec![
                Point3::new(-0.1, -0.2, 0.0),
                Point3::new(0.1, -0.2, 0.0),
                Point3::new(0.1, 0.2, 0.0),
                Point3::new(-0.1, 0.2, 0.0),
            ],
            true,
        )
        .unwrap();
        let section = RfCroSec {
            no: 1,
            description: "RECT 200/400".to_owned(),
            shape: vec![CurveGeometry::Polyline(outline)],
            ..RfCroSec::default()
        };

        let external = cross_section_to_external(&section);
        assert_eq!(external.shape[0].control_points.len(), 5);

        let back = cross_section_from_external(&external).expect("section should map");
        assert_eq!(back.total_span_count(), 4);
        assert!(back.shape[0].is_closed());
    }

    #[test]
    fn arc_segment_maps_through_three_points() {
        let arc = crate::geom::Arc3::new(Point3::ORIGIN, Vec3::Z, 0.5, 0.0, std::f64::consts::PI);
        let external = curve_to_external(&CurveGeometry::Arc(arc));
        assert_eq!(external.line_type, "ArcType");

        let curve = line_from_external(&external)
            .and_then(|line| line.to_curve())
            .expect("arc should map");
        let tol = Tolerance::new(1e-9);
        assert!(tol.approx_eq_point3(curve.start_point(), Point3::new(0.5, 0.0, 0.0)));
        assert!(tol.approx_eq_point3(curve.end_point(), Point3::new(-0.5, 0.0, 0.0)));
    }

    #[test]
    fn unknown_line_type_is_reported() {
        let external = ExternalLine {
            no: 2,
            line_type: "EllipseType".to_owned(),
            ..ExternalLine::default()
        };
        let err = line_from_external(&external).unwrap_err();
        assert_eq!(err.to_string(), "unknown line type `EllipseType`");
    }

    #[test]
    fn missing_surface_axes_are_written_as_standard() {
        let external = surface_to_external(&RfSurface::default());
        let axes = external.axes.expect("axes record is always written");
        assert_eq!(axes.direction, "StandardSurfaceAxesDirection");
        assert!(external.nurbs.is_none());
        assert_eq!(external.geometry_type, "PlaneSurfaceType");
    }

    #[test]
    fn surface_types_parse_by_name() {
        let external = ExternalSurface {
            no: 3,
            geometry_type: "NurbsSurfaceType".to_owned(),
            stiffness_type: "NullStiffnessType".to_owned(),
            axes: Some(ExternalSurfaceAxes {
                direction: "SurfaceAngularRotation".to_owned(),
                rotation: 0.5,
                ..ExternalSurfaceAxes::default()
            }),
            ..ExternalSurface::default()
        };
        let surface = surface_from_external(&external).expect("surface should map");
        assert_eq!(surface.geometry_type, SurfaceGeometryType::Nurbs);
        assert_eq!(surface.stiffness_type, SurfaceStiffnessType::Null);
        assert_eq!(surface.thickness_type, SurfaceThicknessType::Constant);
        assert_eq!(surface.axes_direction(), SurfaceAxesDirection::AngularRotation);
    }
}
