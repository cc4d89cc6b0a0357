use vecs::{ComponentTypeId, EcsError, Registry};

#[test]
fn create_get_erase_roundtrip() {
    let mut registry = Registry::new();

    let h1 = registry.create((5_i32, 5.5_f32)).unwrap();
    assert!(registry.exists(h1));
    assert!(registry.has::<i32>(h1));
    assert!(registry.has::<f32>(h1));
    assert!(!registry.has::<f64>(h1));
    assert_eq!(*registry.get::<i32>(h1).unwrap(), 5);
    assert_eq!(*registry.get::<f32>(h1).unwrap(), 5.5);

    registry.erase(h1).unwrap();
    assert!(!registry.exists(h1));
    assert_eq!(registry.get::<i32>(h1), Err(EcsError::StaleHandle));
    assert_eq!(registry.size(), 0);
}

#[test]
fn put_overwrites_every_component_in_place() {
    let mut registry = Registry::new();

    let h2 = registry.create((5_i32, 6.9_f32, 7.3_f64)).unwrap();
    assert!(registry.exists(h2));

    registry.put(h2, (50_i32, 69.0_f32, 73.0_f64)).unwrap();
    assert_eq!(*registry.get::<f32>(h2).unwrap(), 69.0);
    assert_eq!(*registry.get::<f64>(h2).unwrap(), 73.0);
    assert_eq!(*registry.get::<i32>(h2).unwrap(), 50);

    // Overwriting in place never creates a second archetype.
    assert_eq!(registry.archetype_count(), 1);
}

#[test]
fn put_partial_tuple_overwrites_only_named_components() {
    let mut registry = Registry::new();

    let h2 = registry.create((5_i32, 6.9_f32, 7.3_f64)).unwrap();
    registry.put(h2, (50_i32, 69.0_f32, 73.0_f64)).unwrap();

    registry.put(h2, (101.0_f32, 102.0_f64)).unwrap();
    assert_eq!(*registry.get::<f32>(h2).unwrap(), 101.0);
    assert_eq!(*registry.get::<f64>(h2).unwrap(), 102.0);
    assert_eq!(*registry.get::<i32>(h2).unwrap(), 50);
}

#[test]
fn get_many_returns_a_tuple_of_references() {
    let mut registry = Registry::new();

    let h = registry.create((5_i32, 6.9_f32, 7.3_f64)).unwrap();
    let (i, f, d) = registry.get_many::<(i32, f32, f64)>(h).unwrap();
    assert_eq!((*i, *f, *d), (5, 6.9, 7.3));

    let (f, d) = registry.get_many::<(f32, f64)>(h).unwrap();
    assert_eq!((*f, *d), (6.9, 7.3));
}

#[test]
fn get_many_reports_the_missing_component() {
    let mut registry = Registry::new();

    let h = registry.create((5_i32,)).unwrap();
    match registry.get_many::<(i32, f32)>(h) {
        Err(EcsError::MissingComponent(e)) => {
            assert_eq!(e.component, ComponentTypeId::of::<f32>());
        }
        other => panic!("expected missing component, got {other:?}"),
    }
}

#[test]
fn duplicate_component_types_are_rejected() {
    let mut registry = Registry::new();

    match registry.create((1_i32, 2_i32)) {
        Err(EcsError::DuplicateComponent(e)) => {
            assert_eq!(e.component, ComponentTypeId::of::<i32>());
        }
        other => panic!("expected duplicate component, got {other:?}"),
    }
    assert_eq!(registry.size(), 0);

    let h = registry.create((1_i32,)).unwrap();
    assert!(matches!(
        registry.put(h, (2.0_f32, 3.0_f32)),
        Err(EcsError::DuplicateComponent(_))
    ));
    // The failed put changed nothing.
    assert!(!registry.has::<f32>(h));
    assert_eq!(*registry.get::<i32>(h).unwrap(), 1);
}

#[test]
fn types_lists_the_canonical_component_set() {
    let mut registry = Registry::new();

    let h = registry.create((5_i32, 5.5_f32)).unwrap();
    let types = registry.types(h).unwrap();
    assert_eq!(types.len(), 2);
    assert!(types.contains(&ComponentTypeId::of::<i32>()));
    assert!(types.contains(&ComponentTypeId::of::<f32>()));
}

#[test]
fn get_mut_writes_in_place() {
    let mut registry = Registry::new();

    let h = registry.create((5_i32, 5.5_f32)).unwrap();
    *registry.get_mut::<i32>(h).unwrap() = 42;
    assert_eq!(*registry.get::<i32>(h).unwrap(), 42);
    assert_eq!(*registry.get::<f32>(h).unwrap(), 5.5);
}

#[test]
fn clear_invalidates_every_handle() {
    let mut registry = Registry::new();

    let a = registry.create((1_i32,)).unwrap();
    let b = registry.create((2_i32, 2.0_f32)).unwrap();
    let c = registry.create((3.0_f64,)).unwrap();
    assert!(registry.size() > 0);

    registry.clear();
    assert_eq!(registry.size(), 0);
    assert!(!registry.exists(a));
    assert!(!registry.exists(b));
    assert!(!registry.exists(c));
    registry.check_integrity().unwrap();

    // The registry stays usable after a clear.
    let d = registry.create((4_i32,)).unwrap();
    assert!(registry.exists(d));
    assert_eq!(registry.size(), 1);
}

#[test]
fn handles_shard_across_storages_round_robin() {
    let mut registry = Registry::with_storages(4);

    let handles: Vec<_> = (0..8_i32)
        .map(|i| registry.create((i,)).unwrap())
        .collect();

    for (i, &h) in handles.iter().enumerate() {
        assert_eq!(h.storage() as usize, i % 4);
        assert_eq!(*registry.get::<i32>(h).unwrap(), i as i32);
    }
    registry.check_integrity().unwrap();
}

#[test]
fn repeated_reads_are_stable_until_a_write() {
    let mut registry = Registry::new();

    let h = registry.create((7_i32, 1.25_f32)).unwrap();
    for _ in 0..3 {
        assert_eq!(*registry.get::<i32>(h).unwrap(), 7);
        assert_eq!(*registry.get::<f32>(h).unwrap(), 1.25);
    }

    registry.put(h, (8_i32,)).unwrap();
    assert_eq!(*registry.get::<i32>(h).unwrap(), 8);
    assert_eq!(*registry.get::<f32>(h).unwrap(), 1.25);
}
