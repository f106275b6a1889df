// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::clock::{LamportClock, LogicalTime};
use crate::tests::node;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_next_strictly_increasing(observed in proptest::collection::vec(proptest::option::of(0u64..1_000), 1..64)) {
        let mut clock = LamportClock::new(node("local"));
        let mut last: Option<LogicalTime> = None;

        for maybe_remote in observed {
            if let Some(counter) = maybe_remote {
                let remote = LogicalTime::lamport(counter, node("remote"));
                clock.advance_to(&remote).unwrap();
                let t = clock.next().unwrap();
                prop_assert!(t > remote);
                if let Some(prev) = &last {
                    prop_assert!(&t > prev);
                }
                last = Some(t);
            } else {
                let t = clock.next().unwrap();
                if let Some(prev) = &last {
                    prop_assert!(&t > prev);
                }
                last = Some(t);
            }
        }
    }

    #[test]
    fn prop_textual_time_roundtrip(counter in any::<u64>(), port in 1u16..=u16::MAX) {
        let time = LogicalTime::lamport(counter, node(&format!("127.0.0.1:{port}")));
        prop_assert_eq!(time.to_string().parse::<LogicalTime>().unwrap(), time);
    }
}

#[test]
fn test_interleaved_nodes_never_collide() {
    let mut a = LamportClock::new(node("a"));
    let mut b = LamportClock::new(node("b"));
    let mut seen = std::collections::BTreeSet::new();

    for _ in 0..50 {
        assert!(seen.insert(a.next().unwrap()));
        assert!(seen.insert(b.next().unwrap()));
    }
    assert_eq!(seen.len(), 100);
}

#[test]
fn test_observed_maximum_cannot_stall_minting() {
    let mut clock = LamportClock::new(node("local"));
    let poisoned = LogicalTime::lamport(u64::MAX, node("remote"));

    assert!(clock.advance_to(&poisoned).is_err());
    let first = clock.next().unwrap();
    let second = clock.next().unwrap();
    assert!(second > first);
    assert!(second < poisoned);
}
