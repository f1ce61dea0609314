use super::*;

#[test]
fn stacks_from_the_top_of_the_band() {
    let mut slots = SlotAllocator::new(100.0);
    assert_eq!(slots.reserve(1, 30.0), SlotGrant { reserved: true, y: 0.0 });
    assert_eq!(slots.reserve(2, 30.0), SlotGrant { reserved: true, y: 30.0 });
    assert_eq!(slots.reserve(3, 30.0), SlotGrant { reserved: true, y: 60.0 });
    assert_eq!(slots.len(), 3);
}

#[test]
fn full_band_falls_back_to_oldest_offset() {
    let mut slots = SlotAllocator::new(60.0);
    slots.reserve(1, 30.0);
    slots.reserve(2, 30.0);
    let grant = slots.reserve(3, 30.0);
    assert!(!grant.reserved);
    assert_eq!(grant.y, 0.0);

    assert!(slots.release(1, 0.0));
    let grant = slots.reserve(4, 40.0);
    assert!(!grant.reserved);
    assert_eq!(grant.y, 30.0);
}

#[test]
fn empty_band_falls_back_to_zero() {
    let mut slots = SlotAllocator::new(10.0);
    assert_eq!(slots.reserve(1, 20.0), SlotGrant { reserved: false, y: 0.0 });
}

#[test]
fn released_gap_is_reused_first_fit() {
    let mut slots = SlotAllocator::new(100.0);
    slots.reserve(1, 20.0);
    slots.reserve(2, 20.0);
    slots.reserve(3, 20.0);
    assert!(slots.release(2, 20.0));
    assert_eq!(slots.reserve(4, 15.0), SlotGrant { reserved: true, y: 20.0 });
    // A taller request skips the remaining 5 px gap.
    assert_eq!(slots.reserve(5, 10.0), SlotGrant { reserved: true, y: 60.0 });
}

#[test]
fn reservations_never_overlap() {
    let mut slots = SlotAllocator::new(200.0);
    let mut granted = Vec::new();
    for (id, h) in [(1, 25.0), (2, 40.0), (3, 10.0), (4, 33.0), (5, 50.0)] {
        let g = slots.reserve(id, h);
        if g.reserved {
            granted.push((id, g.y, h));
        }
    }
    slots.release(2, 25.0);
    for (id, h) in [(6, 12.0), (7, 20.0), (8, 30.0)] {
        let g = slots.reserve(id, h);
        if g.reserved {
            granted.push((id, g.y, h));
        }
    }
    granted.retain(|(id, _, _)| *id != 2);
    for (i, a) in granted.iter().enumerate() {
        for b in &granted[i + 1..] {
            let disjoint = a.1 + a.2 <= b.1 || b.1 + b.2 <= a.1;
            assert!(disjoint, "{a:?} overlaps {b:?}");
        }
        assert!(a.1 + a.2 <= 200.0);
    }
}

#[test]
fn unknown_release_is_a_no_op() {
    let mut slots = SlotAllocator::new(100.0);
    slots.reserve(1, 10.0);
    assert!(!slots.release(1, 5.0));
    assert!(!slots.release(9, 0.0));
    assert_eq!(slots.len(), 1);
}

#[test]
fn resize_keeps_outstanding_reservations() {
    let mut slots = SlotAllocator::new(100.0);
    slots.reserve(1, 80.0);
    slots.resize(50.0);
    assert_eq!(slots.len(), 1);
    assert!(!slots.reserve(2, 10.0).reserved);
    slots.clear();
    assert!(slots.is_empty());
    assert!(slots.reserve(3, 10.0).reserved);
}
