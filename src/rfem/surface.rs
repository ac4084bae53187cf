//! RFEM surfaces: the record itself, its label, the NURBS rebuild and the
//! local axes.
//!
//! RFEM stores NURBS surfaces with an unnormalized knot vector and the control
//! net indexed `[u][v]`. The rebuild maps the knots onto `[0, 1]` and stores the
//! net in the `v`-major layout `NurbsSurface` expects.

use std::fmt;

use crate::geom::{Curve3, NurbsSurface, Plane, Point3, Vec3};

use super::{RfLine, RfOpening, RfemError, label_bool, label_text};

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            /// RFEM automation name of the variant.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

// The first variant of each enum is its default.

named_enum! {
    pub enum SurfaceGeometryType {
        Plane => "PlaneSurfaceType",
        Quadrangle => "QuadrangleSurfaceType",
        Nurbs => "NurbsSurfaceType",
        Rotated => "RotatedSurfaceType",
        Pipe => "PipeSurfaceType",
        Unknown => "UnknownGeometryType",
    }
}

named_enum! {
    pub enum SurfaceStiffnessType {
        Standard => "StandardStiffnessType",
        Orthotropic => "OrthotropicStiffnessType",
        Glass => "GlassStiffnessType",
        Laminate => "LaminateStiffnessType",
        Membrane => "MembraneStiffnessType",
        WithoutMembraneTension => "WithoutMembraneTensionStiffnessType",
        Rigid => "RigidStiffnessType",
        Null => "NullStiffnessType",
    }
}

named_enum! {
    pub enum SurfaceThicknessType {
        Constant => "ConstantThicknessType",
        Linear => "LinearThicknessType",
        Radial => "RadialThicknessType",
        FourNodes => "FourNodesThicknessType",
        Layers => "LayersThicknessType",
    }
}

named_enum! {
    pub enum SurfaceAxesDirection {
        Standard => "StandardSurfaceAxesDirection",
        AngularRotation => "SurfaceAngularRotation",
        AxisXParallelToLine => "SurfaceAxisXParallelToLine",
        AxisYParallelToLine => "SurfaceAxisYParallelToLine",
        AxesParallelToUserCs => "SurfaceAxesParallelToUserCS",
    }
}

/// Local axes definition of a surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceAxes {
    pub direction: SurfaceAxesDirection,
    pub surface_no: i32,
    pub axes_line_list: String,
    pub point1: Point3,
    pub point2: Point3,
    /// Radians, used by `SurfaceAxesDirection::AngularRotation`.
    pub rotation: f64,
    pub user_cs_no: i32,
}

impl SurfaceAxes {
    /// First line number of `axes_line_list`, if any.
    #[must_use]
    pub fn first_axes_line_no(&self) -> Option<i32> {
        self.axes_line_list
            .split([',', '-', ' '])
            .find(|part| !part.is_empty())
            .and_then(|part| part.trim().parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RfSurface {
    pub no: i32,
    pub comment: String,
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

    /// Control net indexed `[u][v]`; empty for non-NURBS surfaces.
    pub control_points: Vec<Vec<Point3>>,
    pub weights: Vec<Vec<f64>>,
    pub knots_x: Vec<f64>,
    pub knots_y: Vec<f64>,
    pub order_x: usize,
    pub order_y: usize,

    pub eccentricity: f64,
    pub geometry_type: SurfaceGeometryType,
    pub material_no: i32,
    pub stiffness_type: SurfaceStiffnessType,
    pub thickness_type: SurfaceThicknessType,
    pub thickness: f64,

    pub edges: Vec<RfLine>,
    pub openings: Vec<RfOpening>,
    pub surface_axes: Option<SurfaceAxes>,
    /// Local axes, set by [`RfSurface::compute_axes`].
    pub axes: Option<Plane>,

    pub to_modify: bool,
    pub to_delete: bool,
}

impl RfSurface {
    #[must_use]
    pub fn has_control_points(&self) -> bool {
        self.control_points.first().is_some_and(|row| !row.is_empty())
    }

    /// Direction of the surface axes, standard when no axes record is set.
    #[must_use]
    pub fn axes_direction(&self) -> SurfaceAxesDirection {
        self.surface_axes
            .as_ref()
            .map_or(SurfaceAxesDirection::Standard, |axes| axes.direction)
    }

    /// Rebuilds the NURBS surface from the RFEM control net.
    pub fn to_nurbs_surface(&self) -> Result<NurbsSurface, RfemError> {
        if !self.has_control_points() {
            return Err(RfemError::MissingControlPoints { no: self.no });
        }

        let u_count = self.control_points.len();
        let v_count = self.control_points[0].len();
        if self.control_points.iter().any(|row| row.len() != v_count) {
            return Err(RfemError::InvalidSurface {
                no: self.no,
                reason: "control point rows differ in length".to_owned(),
            });
        }
        if self.order_x < 2 || self.order_y < 2 {
            return Err(RfemError::InvalidSurface {
                no: self.no,
                reason: format!("orders must be at least 2, got {}x{}", self.order_x, self.order_y),
            });
        }

        let knots_u = normalize_knots(&self.knots_x, u_count, self.order_x).ok_or(RfemError::DegenerateKnots { no: self.no })?;
        let knots_v = normalize_knots(&self.knots_y, v_count, self.order_y).ok_or(RfemError::DegenerateKnots { no: self.no })?;

        let mut control_points = Vec::with_capacity(u_count * v_count);
        for v in 0..v_count {
            for row in &self.control_points {
                control_points.push(row[v]);
            }
        }

        NurbsSurface::new(
            self.order_x - 1,
            self.order_y - 1,
            u_count,
            v_count,
            control_points,
            knots_u,
            knots_v,
            None,
        )
        .map_err(|reason| RfemError::InvalidSurface { no: self.no, reason })
    }

    /// Computes and stores the local axes of the surface.
    ///
    /// `local_x` and `local_y` are the axes RFEM reports for the surface's
    /// local coordinate system. `axes_line` is the line named by the axes
    /// record, needed for the two "parallel to line" directions.
    pub fn compute_axes(&mut self, local_x: Vec3, local_y: Vec3, axes_line: Option<&RfLine>) -> Result<Plane, RfemError> {
        let first_edge = self.edges.first().ok_or(RfemError::MissingEdges { no: self.no })?;
        let origin = first_edge.to_curve()?.start_point();
        let degenerate = RfemError::DegenerateAxes { no: self.no };

        let base = Plane::new(origin, local_x, local_y).ok_or_else(|| degenerate.clone())?;
        let axes = match self.surface_axes.as_ref() {
            Some(axes) if axes.direction == SurfaceAxesDirection::AngularRotation => base.rotated(axes.rotation),
            Some(axes)
                if matches!(
                    axes.direction,
                    SurfaceAxesDirection::AxisXParallelToLine | SurfaceAxesDirection::AxisYParallelToLine
                ) =>
            {
                let line = axes_line.ok_or(RfemError::MissingAxesLine { no: self.no })?;
                let curve = line.to_curve()?;
                let (t0, t1) = curve.domain();
                let along = curve.point_at(t1).sub_point(curve.point_at(t0));
                let plane = if axes.direction == SurfaceAxesDirection::AxisXParallelToLine {
                    Plane::new(origin, along, base.z_axis.cross(along))
                } else {
                    Plane::new(origin, along.cross(base.z_axis), along)
                };
                plane.ok_or(degenerate)?
            }
            _ => base,
        };

        self.axes = Some(axes);
        Ok(axes)
    }
}

/// Maps an RFEM knot vector onto `[0, 1]`. RFEM hands out either the full
/// `count + order` vector or the reduced form without the two outer knots;
/// the reduced form is padded back to full length.
fn normalize_knots(raw: &[f64], count: usize, order: usize) -> Option<Vec<f64>> {
    let full_len = count + order;
    let (first, last) = (*raw.first()?, *raw.last()?);
    let span = last - first;
    if !span.is_finite() || span <= 0.0 {
        return None;
    }

    let scaled = raw.iter().map(|k| (k - first) / span);
    if raw.len() == full_len {
        Some(scaled.collect())
    } else if raw.len() + 2 == full_len {
        let mut full = Vec::with_capacity(full_len);
        full.push(0.0);
        full.extend(scaled);
        full.push(1.0);
        Some(full)
    } else {
        None
    }
}

fn control_points_label(grid: &[Vec<Point3>]) -> String {
    grid.iter()
        .flatten()
        .map(|p| format!("({:.3},{:.3},{:.3})", p.x, p.y, p.z))
        .collect::<Vec<_>>()
        .join(",")
}

/// Panel label; fields are `;`-separated so the host can split them.
impl fmt::Display for RfSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control_points = if self.has_control_points() {
            control_points_label(&self.control_points)
        } else {
            "-".to_owned()
        };
        write!(
            f,
            "RFEM-Surface;No:{};Area:{}[m2];MaterialNo:{};Thickness:{}[m];Type:{};ThicknessType:{};StiffnessType:{};",
            self.no, self.area, self.material_no, self.thickness, self.geometry_type, self.thickness_type, self.stiffness_type,
        )?;
        write!(
            f,
            "BoundaryLineCount:{};BoundaryLineList:{};Eccentricity:{};",
            self.boundary_line_count,
            label_text(&self.boundary_line_list),
            self.eccentricity,
        )?;
        write!(
            f,
            "IntegratedLineCount:{};IntegratedLineList:{};IntegratedNodeCount:{};IntegratedNodeList:{};",
            self.integrated_line_count,
            label_text(&self.integrated_line_list),
            self.integrated_node_count,
            label_text(&self.integrated_node_list),
        )?;
        write!(
            f,
            "SetIntegratedObjects:{};ControlPoints:{};Tag:{};IsValid:{};IsGenerated:{};ID:{};ToModify:{};ToDelete:{};Comment:{};",
            label_bool(self.set_integrated_objects),
            control_points,
            label_text(&self.tag),
            label_bool(self.is_valid),
            label_bool(self.is_generated),
            label_text(&self.id),
            label_bool(self.to_modify),
            label_bool(self.to_delete),
            label_text(&self.comment),
        )
    }
}
