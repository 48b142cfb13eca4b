use std::num::NonZeroUsize;

use proptest::prelude::*;
use timeline::{SlotLookup, Tick, TickRing};

fn capacity_strategy() -> impl Strategy<Value = usize> {
    (0u32..=6).prop_map(|shift| 1usize << shift)
}

proptest! {
    #[test]
    fn prop_sequential_writes_keep_latest_window(
        capacity in capacity_strategy(),
        start in 0u64..10_000,
        count in 1u64..200,
    ) {
        let mut ring = TickRing::new(NonZeroUsize::new(capacity).unwrap()).unwrap();
        let end = start + count - 1;
        for raw in start..=end {
            ring.insert(Tick::new(raw), raw).unwrap();
        }

        for raw in start..=end {
            let tick = Tick::new(raw);
            let expected_live = end - raw < capacity as u64;
            match ring.lookup(tick) {
                SlotLookup::Hit(value) => {
                    prop_assert!(expected_live);
                    prop_assert_eq!(*value, raw);
                }
                SlotLookup::Stale { found } => {
                    prop_assert!(!expected_live);
                    prop_assert_eq!(ring.slot_index(found), ring.slot_index(tick));
                    prop_assert!(found > tick);
                }
                SlotLookup::Empty => prop_assert!(false, "sequential writes leave no empty slot"),
            }
            prop_assert_eq!(ring.in_window(tick), expected_live);
        }
    }

    #[test]
    fn prop_writes_outside_window_never_alias(
        capacity in capacity_strategy(),
        ticks in prop::collection::vec(0u64..512, 1..128),
    ) {
        let mut ring = TickRing::new(NonZeroUsize::new(capacity).unwrap()).unwrap();
        for raw in ticks {
            let before_newest = ring.newest_tick();
            let result = ring.insert(Tick::new(raw), raw);
            match result {
                Ok(_) => prop_assert_eq!(ring.get(Tick::new(raw)), Some(&raw)),
                Err(_) => {
                    prop_assert_eq!(ring.newest_tick(), before_newest);
                    let newest = before_newest.unwrap();
                    prop_assert!(newest.raw() - raw >= capacity as u64);
                }
            }
        }

        // Every readable entry still maps to its own value.
        for (tick, value) in ring.iter() {
            prop_assert_eq!(tick.raw(), *value);
        }
    }
}
