mod core;
mod curve;
mod diagnostics;
mod extrusion;
mod frame;
mod mesh;
mod orient;
mod surface;
mod tween;

pub use core::{Plane, Point3, Tolerance, Transform, Vec3};
pub use curve::{
    Arc3, ArcLengthTable, Curve3, CurveGeometry, Line3, NurbsCurve3, Polyline3,
};
pub use diagnostics::GeomMeshDiagnostics;
pub use extrusion::{
    ExtrudeError, extrude_sections_to_mesh, extrude_sections_to_mesh_with_diagnostics,
    loft_sections_to_surfaces, loft_sections_to_surfaces_with_tolerance,
};
pub use frame::{FrenetFrame, parallel_transport_frame, rotate_vector};
pub use mesh::{GeomMesh, mesh_surface_grid};
pub use orient::{
    OrientError, OrientedProfile, orient_sections, orient_sections_with_tolerance, seed_frame,
};
pub use surface::{NurbsSurface, Surface};
pub use tween::{
    LinearBlend, SectionBlend, Station, TweenError, TweenResult, TweenSegment, check_profiles,
    interpolate_sections, interpolate_sections_with_blend, profile_span_count, station_count,
};
