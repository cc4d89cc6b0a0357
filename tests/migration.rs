use vecs::{ComponentTypeId, EcsError, Registry};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Mass(f32);

#[test]
fn put_moves_the_entity_to_a_wider_archetype() {
    let mut registry = Registry::new();

    let h = registry.create((Position { x: 1.0, y: 2.0 },)).unwrap();
    assert_eq!(registry.archetype_count(), 1);

    registry.put(h, (Velocity { dx: 0.5, dy: -0.5 },)).unwrap();
    assert_eq!(registry.archetype_count(), 2);
    assert!(registry.has::<Position>(h));
    assert!(registry.has::<Velocity>(h));

    // Values that survived the migration read back unchanged.
    assert_eq!(*registry.get::<Position>(h).unwrap(), Position { x: 1.0, y: 2.0 });
    assert_eq!(*registry.get::<Velocity>(h).unwrap(), Velocity { dx: 0.5, dy: -0.5 });
    registry.check_integrity().unwrap();
}

#[test]
fn put_of_several_new_components_is_one_transition() {
    let mut registry = Registry::new();

    let h = registry.create((Position { x: 0.0, y: 0.0 },)).unwrap();
    assert_eq!(registry.archetype_count(), 1);

    // Both additions land in a single destination archetype; no
    // intermediate position+velocity archetype appears.
    registry
        .put(h, (Velocity { dx: 1.0, dy: 1.0 }, Mass(9.5)))
        .unwrap();
    assert_eq!(registry.archetype_count(), 2);
    assert_eq!(*registry.get::<Mass>(h).unwrap(), Mass(9.5));
    registry.check_integrity().unwrap();
}

#[test]
fn remove_moves_the_entity_to_a_narrower_archetype() {
    let mut registry = Registry::new();

    let h = registry
        .create((Position { x: 3.0, y: 4.0 }, Velocity { dx: 1.0, dy: 0.0 }, Mass(2.0)))
        .unwrap();

    registry.remove::<(Velocity,)>(h).unwrap();
    assert!(!registry.has::<Velocity>(h));
    assert!(registry.has::<Position>(h));
    assert!(registry.has::<Mass>(h));
    assert_eq!(*registry.get::<Position>(h).unwrap(), Position { x: 3.0, y: 4.0 });
    assert_eq!(*registry.get::<Mass>(h).unwrap(), Mass(2.0));
    registry.check_integrity().unwrap();
}

#[test]
fn removing_an_absent_component_is_an_error() {
    let mut registry = Registry::new();

    let h = registry.create((Position { x: 0.0, y: 0.0 },)).unwrap();
    match registry.remove::<(Velocity,)>(h) {
        Err(EcsError::MissingComponent(e)) => {
            assert_eq!(e.component, ComponentTypeId::of::<Velocity>());
        }
        other => panic!("expected missing component, got {other:?}"),
    }
    // Rejected before any state changed.
    assert!(registry.has::<Position>(h));
    registry.check_integrity().unwrap();
}

#[test]
fn removing_every_component_keeps_the_entity_alive() {
    let mut registry = Registry::new();

    let h = registry
        .create((Position { x: 1.0, y: 1.0 }, Mass(1.0)))
        .unwrap();

    registry.remove::<(Position, Mass)>(h).unwrap();
    assert!(registry.exists(h));
    assert!(registry.types(h).unwrap().is_empty());
    assert!(!registry.has::<Position>(h));
    assert_eq!(registry.size(), 1);

    // The bare entity can grow components again.
    registry.put(h, (Mass(5.0),)).unwrap();
    assert_eq!(*registry.get::<Mass>(h).unwrap(), Mass(5.0));
    registry.check_integrity().unwrap();
}

#[test]
fn swap_remove_repoints_the_relocated_entity() {
    let mut registry = Registry::new();

    let first = registry.create((Position { x: 1.0, y: 0.0 },)).unwrap();
    let middle = registry.create((Position { x: 2.0, y: 0.0 },)).unwrap();
    let last = registry.create((Position { x: 3.0, y: 0.0 },)).unwrap();

    // Erasing the middle row moves the last row into its place; the
    // relocated entity must still resolve through its handle.
    registry.erase(middle).unwrap();
    assert!(!registry.exists(middle));
    assert_eq!(*registry.get::<Position>(first).unwrap(), Position { x: 1.0, y: 0.0 });
    assert_eq!(*registry.get::<Position>(last).unwrap(), Position { x: 3.0, y: 0.0 });
    registry.check_integrity().unwrap();
}

#[test]
fn migration_repoints_the_relocated_entity() {
    let mut registry = Registry::new();

    let a = registry.create((Position { x: 1.0, y: 0.0 },)).unwrap();
    let b = registry.create((Position { x: 2.0, y: 0.0 },)).unwrap();
    let c = registry.create((Position { x: 3.0, y: 0.0 },)).unwrap();

    // Migrating the first row out swap-relocates the third one.
    registry.put(a, (Velocity { dx: 0.0, dy: 1.0 },)).unwrap();
    assert_eq!(*registry.get::<Position>(a).unwrap(), Position { x: 1.0, y: 0.0 });
    assert_eq!(*registry.get::<Position>(b).unwrap(), Position { x: 2.0, y: 0.0 });
    assert_eq!(*registry.get::<Position>(c).unwrap(), Position { x: 3.0, y: 0.0 });
    registry.check_integrity().unwrap();
}

#[test]
fn erased_slots_reissue_with_a_new_generation() {
    let mut registry = Registry::new();

    let old = registry.create((Mass(1.0),)).unwrap();
    registry.erase(old).unwrap();

    let new = registry.create((Mass(2.0),)).unwrap();
    // The slot is reused but the generation differs.
    assert_eq!(new.index(), old.index());
    assert_ne!(new, old);
    assert!(!registry.exists(old));
    assert!(registry.exists(new));
    assert!(registry.get::<Mass>(old).is_err());
    assert_eq!(*registry.get::<Mass>(new).unwrap(), Mass(2.0));
}

#[test]
fn archetypes_are_unique_per_type_set() {
    let mut registry = Registry::new();

    registry.create((Position { x: 0.0, y: 0.0 }, Mass(1.0))).unwrap();
    registry.create((Mass(2.0), Position { x: 1.0, y: 1.0 })).unwrap();
    // Declaration order does not matter; both rows share one archetype.
    assert_eq!(registry.archetype_count(), 1);
    registry.check_integrity().unwrap();
}

#[test]
fn integrity_holds_across_a_mixed_workload() {
    let mut registry = Registry::new();
    let mut handles = Vec::new();

    for i in 0..64_i32 {
        let h = registry.create((Position { x: i as f32, y: 0.0 },)).unwrap();
        handles.push(h);
    }
    for (i, &h) in handles.iter().enumerate() {
        if i % 2 == 0 {
            registry.put(h, (Velocity { dx: 1.0, dy: 0.0 },)).unwrap();
        }
        if i % 3 == 0 {
            registry.put(h, (Mass(i as f32),)).unwrap();
        }
    }
    for &h in handles.iter().step_by(5) {
        registry.erase(h).unwrap();
    }
    for (i, &h) in handles.iter().enumerate() {
        if i % 5 == 0 {
            continue;
        }
        if i % 2 == 0 && i % 3 != 0 {
            registry.remove::<(Velocity,)>(h).unwrap();
        }
        assert_eq!(
            *registry.get::<Position>(h).unwrap(),
            Position { x: i as f32, y: 0.0 },
        );
    }

    registry.check_integrity().unwrap();
}
