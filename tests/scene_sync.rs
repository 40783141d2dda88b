//! Scene synchronization and camera framing

use pretty_assertions::assert_eq;
use store_layout::geometry::UnitScale;
use store_layout::scene::{CameraSettings, SyncStats, PREVIEW_ID};
use store_layout::{
    Camera, Catalog, Container, Dimensions, EngineConfig, EntityKind, FloorPlan, PlaceableTemplate,
    PlacedEntity, PlanElement, Point, Point3, Rect, SceneSynchronizer, Session, SyncStrategy,
    Viewport,
};

fn furniture(id: &str, x: f64, z: f64) -> PlacedEntity {
    PlacedEntity::new(id, EntityKind::Furniture, Point3::new(x, 0.0, z))
        .with_template("gondola")
        .with_dimensions(Dimensions::new(2.0, 1.6, 0.9))
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .register(PlaceableTemplate::new(
            "gondola",
            "gondola",
            "Gondole",
            Dimensions::new(2.0, 1.6, 0.9),
        ))
        .expect("Should register gondola");
    catalog
}

/// A session whose plan has a single gondola slot, already assigned
fn session_with_slot() -> Session {
    let mut s = Session::new(EngineConfig::default(), catalog());
    s.load_plan(FloorPlan::new("p", "plan").with_element(PlanElement::new(
        "E1",
        "gondola",
        Rect::new(0.0, 0.0, 200.0, 90.0),
    )))
    .expect("Should load plan");
    s.request_assign("gondola", None).expect("Should assign");
    s
}

/// Node state that matters for equality between two scenes
fn describe(scene: &SceneSynchronizer) -> Vec<(String, Point3, f64, Dimensions, usize)> {
    scene
        .nodes()
        .into_iter()
        .map(|n| {
            (
                n.entity_id.clone(),
                n.position,
                n.rotation,
                n.dimensions(),
                n.parts.len(),
            )
        })
        .collect()
}

#[test]
fn test_inserts_and_removals_balance() {
    let mut scene = SceneSynchronizer::new(UnitScale::default());
    let catalog = catalog();
    let entities: Vec<PlacedEntity> = (1..=6)
        .map(|i| furniture(&format!("P{:03}", i), f64::from(i), 0.0))
        .collect();
    for entity in &entities {
        scene.insert(entity, catalog.get("gondola")).unwrap();
    }
    assert!(scene.remove("P002"));
    assert!(scene.remove("P005"));
    assert!(!scene.remove("P005"));

    assert_eq!(scene.len(), 4);
    let live: Vec<PlacedEntity> = entities
        .into_iter()
        .filter(|e| e.id != "P002" && e.id != "P005")
        .collect();
    assert!(scene.check_invariants(&live));
}

#[test]
fn test_duplicate_insert_is_refused() {
    let mut scene = SceneSynchronizer::new(UnitScale::default());
    let entity = furniture("P001", 0.0, 0.0);
    scene.insert(&entity, None).unwrap();
    assert!(scene.insert(&entity, None).is_err());
    assert_eq!(scene.len(), 1);
}

#[test]
fn test_rotation_is_normalized() {
    let mut scene = SceneSynchronizer::new(UnitScale::default());
    scene.insert(&furniture("P001", 0.0, 0.0), None).unwrap();

    let angle = scene.update_rotation("P001", 370.0).unwrap();
    assert!((angle - 10.0).abs() < 1e-9);
    let angle = scene.update_rotation("P001", -30.0).unwrap();
    assert!((angle - 330.0).abs() < 1e-9);
    assert!((scene.node("P001").unwrap().rotation - 330.0).abs() < 1e-9);
}

#[test]
fn test_resize_rebuilds_under_the_same_id() {
    let mut scene = SceneSynchronizer::new(UnitScale::default());
    scene.insert(&furniture("P001", 1.0, 2.0), None).unwrap();
    let before = scene.key("P001").unwrap();

    let after = scene
        .update_size("P001", Dimensions::new(3.0, 2.0, 1.0))
        .unwrap();
    assert_ne!(before, after);
    let node = scene.node("P001").unwrap();
    assert_eq!(node.dimensions(), Dimensions::new(3.0, 2.0, 1.0));
    assert_eq!(node.position, Point3::new(1.0, 0.0, 2.0));
    assert_eq!(scene.len(), 1);
}

#[test]
fn test_positions_are_scaled_to_scene_units() {
    let mut scene = SceneSynchronizer::new(UnitScale::new(100.0, 10.0));
    scene.insert(&furniture("P001", 1.5, -2.0), None).unwrap();
    assert_eq!(scene.node("P001").unwrap().position, Point3::new(15.0, 0.0, -20.0));

    // Footprints come back in meters
    let bounds = scene.world_bounds().unwrap();
    assert!((bounds.center().x - 1.5).abs() < 1e-9);
    assert!((bounds.center().y + 2.0).abs() < 1e-9);
}

#[test]
fn test_reconcile_matches_rebuild() {
    let catalog = catalog();
    let first = vec![
        furniture("P001", 0.0, 0.0),
        furniture("P002", 1.0, 0.0),
        furniture("P003", 2.0, 0.0),
    ];
    let second = vec![
        furniture("P001", 0.0, 0.0),
        furniture("P003", 5.0, 1.0).with_rotation(90.0),
        furniture("P004", 3.0, 3.0),
        PlacedEntity::new("P002", EntityKind::Wall, Point3::zero()),
    ];

    let mut rebuilt = SceneSynchronizer::new(UnitScale::default());
    rebuilt.bulk_replace(&first, &catalog).unwrap();
    rebuilt.bulk_replace(&second, &catalog).unwrap();

    let mut reconciled = SceneSynchronizer::new(UnitScale::default());
    reconciled.bulk_replace(&first, &catalog).unwrap();
    let stats = reconciled.reconcile(&second, &catalog).unwrap();

    assert_eq!(
        stats,
        SyncStats {
            inserted: 1,
            removed: 0,
            moved: 1,
            rebuilt: 1,
        }
    );
    assert_eq!(describe(&reconciled), describe(&rebuilt));
    assert!(reconciled.check_invariants(&second));
}

#[test]
fn test_bulk_replace_rejects_duplicates_before_clearing() {
    let catalog = catalog();
    let mut scene = SceneSynchronizer::new(UnitScale::default());
    scene
        .bulk_replace(&[furniture("P001", 0.0, 0.0)], &catalog)
        .unwrap();

    let dup = vec![furniture("P002", 0.0, 0.0), furniture("P002", 1.0, 0.0)];
    assert!(scene.bulk_replace(&dup, &catalog).is_err());
    assert!(scene.reconcile(&dup, &catalog).is_err());
    assert!(scene.contains("P001"));
    assert_eq!(scene.len(), 1);
}

#[test]
fn test_preview_never_joins_the_node_map() {
    let mut s = session_with_slot();
    let viewport = Viewport::new(0.0, 0.0, 200.0, 200.0);
    s.drop_template("gondola", Point::new(50.0, 50.0), &viewport)
        .unwrap();
    let before = describe(s.scene());

    s.begin_preview("gondola").unwrap();
    s.hover(Point::new(150.0, 150.0), &viewport).unwrap();
    let ghost = s.scene().preview().expect("ghost node");
    assert!(ghost.ghost);
    assert_eq!(ghost.entity_id, PREVIEW_ID);
    assert_eq!(ghost.position, Point3::new(5.0, 0.0, 5.0));
    assert_eq!(describe(s.scene()), before);

    s.abort_preview().unwrap();
    assert!(s.scene().preview().is_none());
    assert_eq!(describe(s.scene()), before);
    assert!(s.check_invariants());
}

#[test]
fn test_committed_preview_becomes_an_entity() {
    let mut s = session_with_slot();
    let viewport = Viewport::new(0.0, 0.0, 200.0, 200.0);

    s.begin_preview("gondola").unwrap();
    s.hover(Point::new(150.0, 50.0), &viewport).unwrap();
    let entity = s.commit_preview().unwrap();

    assert_eq!(entity.position(), Point3::new(5.0, 0.0, -5.0));
    assert!(!s.preview_active());
    assert!(s.scene().preview().is_none());
    assert!(s.scene().contains(&entity.id));
    assert_eq!(entity.plan_element_id.as_deref(), Some("E1"));
    assert!(s.commit_preview().is_err());
}

#[test]
fn test_session_strategies_agree() {
    let reconcile = EngineConfig::default().with_sync_strategy(SyncStrategy::Reconcile);
    let mut a = Session::new(EngineConfig::default(), catalog());
    let mut b = Session::new(reconcile, catalog());

    for s in [&mut a, &mut b] {
        s.add_structure(EntityKind::Wall, Point3::new(0.0, 0.0, -9.0), 0.0, None)
            .unwrap();
        s.add_structure(EntityKind::Door, Point3::new(2.0, 0.0, -9.0), 0.0, None)
            .unwrap();
        s.set_container(30.0, 30.0).unwrap();
    }
    assert_eq!(describe(a.scene()), describe(b.scene()));
    assert!(a.check_invariants() && b.check_invariants());
}

#[test]
fn test_refit_keeps_a_minimum_distance() {
    let settings = CameraSettings::default();
    let container = Container::new(20.0, 20.0);
    let mut camera = Camera::new(settings, &container);
    let mut scene = SceneSynchronizer::new(UnitScale::default());

    // Empty scene frames the whole container
    let framing = camera.refit(&scene, &container);
    assert!((framing.distance - 30.0).abs() < 1e-9);

    scene
        .insert(
            &PlacedEntity::new("P001", EntityKind::Furniture, Point3::new(4.0, 0.0, 4.0))
                .with_dimensions(Dimensions::new(0.5, 0.5, 0.5)),
            None,
        )
        .unwrap();
    let framing = camera.refit(&scene, &container);
    assert_eq!(framing.distance, settings.min_distance);
    assert_eq!(framing.target, Point3::new(4.0, 0.0, 4.0));
}

#[test]
fn test_zoom_and_pan() {
    let container = Container::new(20.0, 20.0);
    let mut camera = Camera::new(CameraSettings::default(), &container);
    let home = *camera.framing();

    let zoomed = camera.zoom(2.0);
    assert!((zoomed.distance - home.distance / 2.0).abs() < 1e-9);
    assert_eq!(camera.zoom(0.0), zoomed);
    assert_eq!(camera.zoom(-1.0), zoomed);

    let panned = camera.pan(store_layout::scene::PanDirection::Right);
    assert!((panned.target.x - 2.0).abs() < 1e-9);
    assert_eq!(camera.pan(store_layout::scene::PanDirection::Reset), home);
}
