use rfem_engine::components::extrude_members::{ExtrudeMode, solve_member};
use rfem_engine::components::{ExtrudeMenu, ExtrudeSettings, MessageLevel};
use rfem_engine::geom::{
    CurveGeometry, Line3, Plane, Point3, Polyline3, Vec3, interpolate_sections, orient_sections,
};
use rfem_engine::rfem::{RfCroSec, RfLine, RfMember};
use rfem_engine::value::Value;

fn outline(no: i32, points: Vec<Point3>) -> RfCroSec {
    RfCroSec {
        no,
        shape: vec![CurveGeometry::Polyline(
            Polyline3::new(points, true).expect("valid outline"),
        )],
        ..RfCroSec::default()
    }
}

fn square(no: i32, half: f64) -> RfCroSec {
    outline(
        no,
        vec![
            Point3::new(-half, -half, 0.0),
            Point3::new(half, -half, 0.0),
            Point3::new(half, half, 0.0),
            Point3::new(-half, half, 0.0),
        ],
    )
}

fn triangle(no: i32) -> RfCroSec {
    outline(
        no,
        vec![
            Point3::new(-0.2, -0.1, 0.0),
            Point3::new(0.2, -0.1, 0.0),
            Point3::new(0.0, 0.2, 0.0),
        ],
    )
}

fn straight_member(no: i32, start: i32, end: i32, length: f64) -> RfMember {
    RfMember {
        no,
        start_cross_section_no: start,
        end_cross_section_no: end,
        base_line: RfLine::straight(no, Point3::ORIGIN, Point3::new(length, 0.0, 0.0)),
        frames: vec![Plane::new(Point3::ORIGIN, Vec3::Y, Vec3::Z).expect("valid frame")],
        ..RfMember::default()
    }
}

fn settings(segment_length: f64, faces: usize) -> ExtrudeSettings {
    ExtrudeSettings {
        segment_length,
        faces_per_cross_section: faces,
    }
}

fn single_mesh(values: &[Value]) -> &rfem_engine::geom::GeomMesh {
    match values {
        [Value::Mesh(mesh)] => mesh,
        other => panic!("expected one mesh, got {other:?}"),
    }
}

#[test]
fn station_count_follows_segment_length() {
    let centerline = CurveGeometry::Line(Line3::new(Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0)));
    let profile = square(1, 0.1).shape;

    let tween = interpolate_sections(&centerline, &profile, &profile, 1.0, 0.001, 0.001).expect("tween");
    assert_eq!(tween.station_count(), 10);
    assert_eq!(tween.curves.len(), 10);

    // A segment longer than the member still yields both end sections.
    let tween = interpolate_sections(&centerline, &profile, &profile, 25.0, 0.001, 0.001).expect("tween");
    assert_eq!(tween.station_count(), 2);
}

#[test]
fn missing_and_dissimilar_sections_warn_with_member_number() {
    let sections = [square(1, 0.1), triangle(2)];

    let err = solve_member(&straight_member(5, 1, 3, 2.0), &sections, &settings(1.0, 2), ExtrudeMode::Mesh)
        .unwrap_err();
    assert_eq!(err.level(), MessageLevel::Warning);
    assert_eq!(err.message(), "Provide cross sections for member No 5.");

    let err = solve_member(&straight_member(6, 1, 2, 2.0), &sections, &settings(1.0, 2), ExtrudeMode::Mesh)
        .unwrap_err();
    assert_eq!(err.level(), MessageLevel::Warning);
    assert_eq!(err.message(), "Provide similar cross sections for member No 6.");
}

#[test]
fn zero_end_section_reuses_start_section() {
    let sections = [square(3, 0.15)];
    let values = solve_member(&straight_member(1, 3, 0, 3.0), &sections, &settings(1.0, 2), ExtrudeMode::Mesh)
        .expect("uniform member extrudes");

    let mesh = single_mesh(&values);
    // Uniform section: every ring point keeps its distance to the axis.
    for p in &mesh.positions {
        assert!((p[1].abs() - 0.15).abs() < 1e-9 || (p[2].abs() - 0.15).abs() < 1e-9);
    }
}

#[test]
fn repeated_runs_are_bit_identical() {
    let sections = [square(1, 0.1), square(2, 0.3)];
    let member = straight_member(1, 1, 2, 4.0);

    let first = solve_member(&member, &sections, &settings(0.5, 3), ExtrudeMode::Mesh).expect("first run");
    let second = solve_member(&member, &sections, &settings(0.5, 3), ExtrudeMode::Mesh).expect("second run");

    let (a, b) = (single_mesh(&first), single_mesh(&second));
    assert_eq!(a.indices, b.indices);
    assert_eq!(a.positions.len(), b.positions.len());
    for (pa, pb) in a.positions.iter().zip(&b.positions) {
        for axis in 0..3 {
            assert_eq!(pa[axis].to_bits(), pb[axis].to_bits());
        }
    }
}

#[test]
fn straight_member_keeps_reference_frame_at_every_station() {
    let centerline = CurveGeometry::Line(Line3::new(Point3::ORIGIN, Point3::new(4.0, 0.0, 0.0)));
    let profile = square(1, 0.1).shape;
    let reference = Plane::new(Point3::ORIGIN, Vec3::Y, Vec3::Z).expect("valid frame");

    let tween = interpolate_sections(&centerline, &profile, &profile, 1.0, 0.001, 0.001).expect("tween");
    let profiles = orient_sections(
        &tween.curves,
        &tween.stations,
        tween.station_count(),
        &reference,
        tween.segments_per_profile,
    )
    .expect("orientation");

    assert_eq!(profiles.len(), 4);
    for oriented in &profiles {
        assert!(oriented.plane.x_axis.sub(Vec3::Y).length() < 1e-12);
        assert!(oriented.plane.y_axis.sub(Vec3::Z).length() < 1e-12);
        assert!(oriented.plane.z_axis.sub(Vec3::X).length() < 1e-12);
    }
}

#[test]
fn one_face_per_span_gives_one_ring_point_per_corner() {
    let sections = [square(1, 0.1)];
    let values = solve_member(&straight_member(1, 1, 0, 2.0), &sections, &settings(1.0, 1), ExtrudeMode::Mesh)
        .expect("extrusion");

    let mesh = single_mesh(&values);
    // 2 stations x 4 corners, 4 quads.
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.triangle_count(), 8);
}

#[test]
fn menu_snapshot_controls_the_sweep() {
    let mut menu = ExtrudeMenu::default();
    menu.set("slider_nfac", 0.5).expect("segment slider");
    menu.set("slider_nfac2", 1.0).expect("faces slider");

    let sections = [square(1, 0.1)];
    let values = solve_member(&straight_member(1, 1, 0, 2.0), &sections, &menu.settings(), ExtrudeMode::Mesh)
        .expect("extrusion");

    // 4 stations of 4 ring points.
    assert_eq!(single_mesh(&values).vertex_count(), 16);
}
