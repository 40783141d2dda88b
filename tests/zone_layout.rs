//! Integration tests for zone validation through the session

use pretty_assertions::assert_eq;
use store_layout::geometry::validate_zone;
use store_layout::{
    Catalog, ConflictReason, Container, EngineConfig, EntityKind, Orientation, Rect, Session,
    SessionError,
};

fn session(width: f64, depth: f64) -> Session {
    Session::new(EngineConfig::new().with_room(width, depth), Catalog::new())
}

#[test]
fn test_side_by_side_zones_are_accepted() {
    let mut s = session(50.0, 30.0);
    let a = s
        .add_zone(None, None, Rect::new(0.0, 0.0, 20.0, 15.0), Orientation::North)
        .expect("A fits");
    let b = s
        .add_zone(None, None, Rect::new(25.0, 0.0, 20.0, 15.0), Orientation::North)
        .expect("B fits");

    assert_eq!(a.zone_id, "Z001");
    assert_eq!(b.zone_id, "Z002");
    assert_eq!(s.zones().zones().len(), 2);
    assert!(s.check_invariants());
}

#[test]
fn test_zone_overlapping_both_neighbours() {
    let mut s = session(50.0, 30.0);
    s.add_zone(Some("A".into()), None, Rect::new(0.0, 0.0, 20.0, 15.0), Orientation::North)
        .unwrap();
    s.add_zone(Some("B".into()), None, Rect::new(25.0, 0.0, 20.0, 15.0), Orientation::North)
        .unwrap();

    let err = s
        .add_zone(None, None, Rect::new(10.0, 0.0, 20.0, 15.0), Orientation::North)
        .unwrap_err();
    match err {
        SessionError::ZoneRejected(reasons) => assert_eq!(
            reasons,
            vec![
                ConflictReason::OverlapsWith("A".to_string()),
                ConflictReason::OverlapsWith("B".to_string()),
            ]
        ),
        other => panic!("Expected ZoneRejected, got {:?}", other),
    }
    // Nothing was committed for the rejected zone
    assert_eq!(s.zones().zones().len(), 2);
    assert_eq!(s.scene().len(), 2);
}

#[test]
fn test_edge_contact_is_not_an_overlap() {
    let container = Container::new(50.0, 30.0);
    let a = Rect::new(0.0, 0.0, 20.0, 15.0);
    let touching = Rect::new(20.0, 0.0, 10.0, 15.0);
    assert!(validate_zone(&touching, &container, [("A", &a)]).is_empty());
}

#[test]
fn test_zone_past_the_container_edges() {
    let mut s = session(50.0, 30.0);
    let err = s
        .add_zone(None, None, Rect::new(40.0, 20.0, 20.0, 15.0), Orientation::North)
        .unwrap_err();
    let message = err.to_string();
    insta::assert_snapshot!(message, @"zone rejected: zone exceeds the container width; zone exceeds the container height");
}

#[test]
fn test_gap_in_zone_ids_is_reused() {
    let mut s = session(50.0, 30.0);
    for x in [0.0, 10.0, 20.0] {
        s.add_zone(None, None, Rect::new(x, 0.0, 5.0, 5.0), Orientation::North)
            .unwrap();
    }
    s.remove_zone("Z002").unwrap();
    assert_eq!(s.zones().next_zone_id(), "Z002");

    let zone = s
        .add_zone(None, None, Rect::new(10.0, 10.0, 5.0, 5.0), Orientation::South)
        .unwrap();
    assert_eq!(zone.zone_id, "Z002");
}

#[test]
fn test_zone_entity_is_centered_in_world_space() {
    let mut s = session(20.0, 10.0);
    s.add_zone(None, Some("Caisse".into()), Rect::new(0.0, 0.0, 4.0, 2.0), Orientation::East)
        .unwrap();

    let entity = s.entity("Z001").expect("zone entity");
    assert_eq!(entity.kind, EntityKind::Zone);
    assert_eq!((entity.x, entity.z), (-8.0, -4.0));
    assert!(s.scene().contains("Z001"));
}

#[test]
fn test_moving_a_zone_goes_through_validation() {
    let mut s = session(20.0, 10.0);
    s.add_zone(None, None, Rect::new(0.0, 0.0, 4.0, 2.0), Orientation::North)
        .unwrap();
    s.add_zone(None, None, Rect::new(10.0, 0.0, 4.0, 2.0), Orientation::North)
        .unwrap();

    // Center of Z002 in world space: (12 - 10, 1 - 5)
    let onto_z002 = store_layout::Point3::new(2.0, 0.0, -4.0);
    assert!(matches!(
        s.move_entity("Z001", onto_z002),
        Err(SessionError::ZoneRejected(_))
    ));
    assert_eq!(s.zones().get("Z001").unwrap().rect, Rect::new(0.0, 0.0, 4.0, 2.0));

    s.move_entity("Z001", store_layout::Point3::new(0.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(s.zones().get("Z001").unwrap().rect, Rect::new(8.0, 4.0, 4.0, 2.0));
    assert_eq!(s.entity("Z001").map(|e| (e.x, e.z)), Some((0.0, 0.0)));
    assert!(matches!(
        s.rotate_entity("Z001", 90.0),
        Err(SessionError::ZoneNotRotatable(_))
    ));
    assert!(s.check_invariants());
}

#[test]
fn test_container_shrink_is_refused_when_a_zone_would_stick_out() {
    let mut s = session(50.0, 30.0);
    s.add_zone(None, None, Rect::new(30.0, 0.0, 20.0, 15.0), Orientation::North)
        .unwrap();
    assert!(s.set_container(40.0, 30.0).is_err());
    assert_eq!(*s.container(), Container::new(50.0, 30.0));

    s.set_container(60.0, 40.0).unwrap();
    // Zone entities are re-centered on the new container
    assert_eq!(s.entity("Z001").map(|e| (e.x, e.z)), Some((10.0, -12.5)));
}

#[test]
fn test_suggestions_skip_occupied_slots() {
    let mut s = session(50.0, 30.0);
    assert_eq!(
        s.zones().suggestions(),
        vec![Rect::new(0.0, 0.0, 20.0, 15.0), Rect::new(30.0, 0.0, 20.0, 15.0)]
    );
    s.add_zone(None, None, Rect::new(0.0, 0.0, 20.0, 15.0), Orientation::North)
        .unwrap();
    assert_eq!(s.zones().suggestions(), vec![Rect::new(30.0, 0.0, 20.0, 15.0)]);
}
