use vecs::SlotMap;

#[test]
fn insert_lookup_erase() {
    let mut map = SlotMap::<i32>::new(0);

    let i1 = map.insert(1).unwrap();
    let i2 = map.insert(2).unwrap();
    let i3 = map.insert(3).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map.lookup(i1), Some(&1));
    assert_eq!(map.lookup(i2), Some(&2));
    assert_eq!(map.lookup(i3), Some(&3));

    assert_eq!(map.erase(i1), Some(1));
    assert_eq!(map.erase(i2), Some(2));
    assert_eq!(map.len(), 1);
    assert_eq!(map.lookup(i3), Some(&3));
    assert_eq!(map.lookup(i1), None);
    assert_eq!(map.lookup(i2), None);
}

#[test]
fn reclaimed_slots_get_a_bumped_generation() {
    let mut map = SlotMap::<i32>::new(0);

    let i1 = map.insert(1).unwrap();
    let i2 = map.insert(2).unwrap();
    assert_eq!(map.erase(i1), Some(1));
    assert_eq!(map.erase(i2), Some(2));

    let reused = map.insert(4).unwrap();
    // The slot index is reclaimed, but the handle is distinct.
    assert!(reused.index() == i1.index() || reused.index() == i2.index());
    assert_ne!(reused, i1);
    assert_ne!(reused, i2);
    assert_eq!(map.lookup(reused), Some(&4));
    assert_eq!(map.lookup(i1), None);
    assert_eq!(map.lookup(i2), None);
}

#[test]
fn erasing_twice_returns_nothing() {
    let mut map = SlotMap::<&'static str>::new(0);

    let h = map.insert("payload").unwrap();
    assert_eq!(map.erase(h), Some("payload"));
    assert_eq!(map.erase(h), None);
    assert_eq!(map.len(), 0);
}

#[test]
fn handles_carry_their_storage_tag() {
    let mut map = SlotMap::<u8>::new(7);
    let h = map.insert(1).unwrap();
    assert_eq!(h.storage(), 7);
    assert_eq!(h.generation(), 1);

    // A handle from a differently tagged map never resolves here.
    let mut other = SlotMap::<u8>::new(8);
    let foreign = other.insert(2).unwrap();
    assert_eq!(map.lookup(foreign), None);
}

#[test]
fn lookup_mut_updates_the_payload() {
    let mut map = SlotMap::<i32>::new(0);
    let h = map.insert(10).unwrap();
    *map.lookup_mut(h).unwrap() = 11;
    assert_eq!(map.lookup(h), Some(&11));
}

#[test]
fn clear_invalidates_all_live_handles() {
    let mut map = SlotMap::<i32>::new(0);
    let a = map.insert(1).unwrap();
    let b = map.insert(2).unwrap();
    let erased = map.insert(3).unwrap();
    assert_eq!(map.erase(erased), Some(3));

    map.clear();
    assert_eq!(map.len(), 0);
    assert_eq!(map.lookup(a), None);
    assert_eq!(map.lookup(b), None);

    let fresh = map.insert(9).unwrap();
    assert_eq!(map.lookup(fresh), Some(&9));
    assert_ne!(fresh, a);
    assert_ne!(fresh, b);
}

#[test]
fn generations_skip_zero_on_wrap() {
    let mut map = SlotMap::<i32>::new(0);

    // Drive a single slot through the full 16-bit generation range.
    let mut handle = map.insert(0).unwrap();
    for i in 0..(u16::MAX as i32 + 10) {
        assert!(map.erase(handle).is_some());
        handle = map.insert(i).unwrap();
        assert_eq!(handle.index(), 0);
        assert_ne!(handle.generation(), 0, "generation zero was reissued");
    }
    assert_eq!(map.lookup(handle), Some(&(u16::MAX as i32 + 9)));
}

#[test]
fn iter_visits_only_live_slots() {
    let mut map = SlotMap::<i32>::new(0);
    let a = map.insert(1).unwrap();
    let b = map.insert(2).unwrap();
    map.insert(3).unwrap();
    assert_eq!(map.erase(b), Some(2));

    let live: Vec<_> = map.iter().map(|(h, &v)| (h, v)).collect();
    assert_eq!(live.len(), 2);
    assert!(live.contains(&(a, 1)));
    assert!(!live.iter().any(|&(h, _)| h == b));
}
