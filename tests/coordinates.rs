//! Conversions between authoring, container, world, scene and pointer space

use store_layout::geometry::{
    container_to_world, normalize_degrees, pointer_to_world, world_to_container,
    world_to_pointer, PlanAnchor, UnitScale,
};
use store_layout::{Container, Point, Point3, Rect, Viewport};

const EPSILON: f64 = 1e-6;

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
}

#[test]
fn test_authoring_world_round_trip() {
    let units = UnitScale::default();
    for p in [
        Point::new(0.0, 0.0),
        Point::new(123.45, -678.9),
        Point::new(-1e5, 3.3333),
    ] {
        let back = units.world_to_authoring(units.authoring_to_world(p));
        assert!(close(back, p), "{:?} came back as {:?}", p, back);
    }
    assert!((units.authoring_length(250.0) - 2.5).abs() < EPSILON);
}

#[test]
fn test_world_scene_round_trip() {
    let units = UnitScale::new(100.0, 40.0);
    let world = Point3::new(1.25, 0.5, -3.0);
    let scene = units.world_to_scene(world);
    assert_eq!(scene, Point3::new(50.0, 20.0, -120.0));
    assert!(units.scene_to_world(scene).distance(world) < EPSILON);
}

#[test]
fn test_anchor_centers_the_plan() {
    let container = Container::new(20.0, 10.0);
    let rects = [
        Rect::new(100.0, 100.0, 200.0, 100.0),
        Rect::new(700.0, 300.0, 200.0, 200.0),
    ];
    let anchor = PlanAnchor::new(&rects, UnitScale::default(), &container, None);

    // Plan bounds 100..900 x 100..500, center (500, 300)
    assert_eq!(anchor.plan_bounds(), Some(Rect::new(100.0, 100.0, 800.0, 400.0)));
    assert!(close(anchor.to_world(Point::new(500.0, 300.0)), Point::zero()));
    assert!(close(anchor.to_world(Point::new(100.0, 100.0)), Point::new(-4.0, -2.0)));

    for p in [Point::new(0.0, 0.0), Point::new(812.5, 37.0)] {
        assert!(close(anchor.to_authoring(anchor.to_world(p)), p));
    }

    let footprint = anchor.rect_to_world(&rects[1]);
    assert!(close(footprint.center(), Point::new(3.0, 1.0)));
    assert!((footprint.width - 2.0).abs() < EPSILON);
}

#[test]
fn test_anchor_fit_scales_to_the_container() {
    let container = Container::new(20.0, 10.0);
    let rects = [Rect::new(0.0, 0.0, 400.0, 100.0)];
    let anchor = PlanAnchor::new(&rects, UnitScale::default(), &container, Some(0.5));

    // 4 m x 1 m plan; the width is the tighter axis: 20 / 4 * 0.5 = 2.5
    assert!((anchor.scale() - 0.025).abs() < EPSILON);
    let footprint = anchor.rect_to_world(&rects[0]);
    assert!((footprint.width - 10.0).abs() < EPSILON);
    assert!((footprint.height - 2.5).abs() < EPSILON);
}

#[test]
fn test_empty_plan_anchor_is_the_identity_scale() {
    let container = Container::new(20.0, 10.0);
    let rects: [Rect; 0] = [];
    let anchor = PlanAnchor::new(&rects, UnitScale::default(), &container, Some(0.8));
    assert_eq!(anchor.plan_bounds(), None);
    assert!(close(anchor.to_world(Point::new(100.0, 0.0)), Point::new(1.0, 0.0)));
}

#[test]
fn test_pointer_maps_onto_the_container() {
    let container = Container::new(20.0, 10.0);
    let viewport = Viewport::new(100.0, 50.0, 400.0, 200.0);

    let center = pointer_to_world(Point::new(300.0, 150.0), &viewport, &container);
    assert!(center.distance(Point3::zero()) < EPSILON);

    let corner = pointer_to_world(Point::new(100.0, 50.0), &viewport, &container);
    assert!(corner.distance(Point3::new(-10.0, 0.0, -5.0)) < EPSILON);

    for pointer in [Point::new(123.0, 77.0), Point::new(499.0, 249.0)] {
        let world = pointer_to_world(pointer, &viewport, &container);
        assert_eq!(world.y, 0.0);
        assert!(close(world_to_pointer(world, &viewport, &container), pointer));
    }
}

#[test]
fn test_container_and_world_frames() {
    let container = Container::new(50.0, 30.0);
    let p = Point::new(12.5, 7.0);
    let world = container_to_world(p, &container);
    assert!(close(world, Point::new(-12.5, -8.0)));
    assert!(close(world_to_container(world, &container), p));
    assert_eq!(container.world_rect(), Rect::new(-25.0, -15.0, 50.0, 30.0));
}

#[test]
fn test_normalized_angles_stay_in_range() {
    for degrees in [-1080.5, -360.0, -30.0, 0.0, 359.999, 360.0, 370.0, 1e6] {
        let n = normalize_degrees(degrees);
        assert!((0.0..360.0).contains(&n), "{} normalized to {}", degrees, n);
    }
}
