//! Property-based tests for shift/reset semantics

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use undertow::nondet::all_choices;
use undertow::sequence::sequence;
use undertow::{reset, reset_multi, Scope};

proptest! {
    #[test]
    fn prop_reset_without_shift_is_identity(value in any::<i64>()) {
        let result = reset(move |_scope: Scope<i64>| async move { value });
        prop_assert_eq!(result, Ok(value));
    }

    #[test]
    fn prop_invoked_once_matches_direct_call(value in -1000i32..1000, offset in -1000i32..1000) {
        // reset { k(v) * 2 where k = x + offset } == (v + offset) * 2
        let result = reset(move |scope: Scope<i32>| async move {
            let x: i32 = scope.shift(move |k| async move { k.invoke(value).await * 2 }).await;
            x + offset
        });
        prop_assert_eq!(result, Ok((value + offset) * 2));
    }

    #[test]
    fn prop_discarded_continuation_returns_handler_value(
        value in any::<u16>(),
        ignored in any::<u16>()
    ) {
        let result = reset(move |scope: Scope<u16>| async move {
            let _: u16 = scope.shift(move |_k| async move { value }).await;
            ignored
        });
        prop_assert_eq!(result, Ok(value));
    }

    #[test]
    fn prop_sequence_emits_input_in_order(items in prop::collection::vec(any::<u8>(), 0..200)) {
        let expected = items.clone();
        let emitted = sequence(move |y| async move {
            y.emit_all(items).await;
        });
        prop_assert_eq!(emitted, Ok(expected));
    }

    #[test]
    fn prop_sum_of_shifts(values in prop::collection::vec(-100i64..100, 0..300)) {
        let expected: i64 = values.iter().sum();
        let result = reset(move |scope: Scope<i64>| async move {
            let mut total = 0;
            for v in values {
                let x: i64 = scope.shift(move |k| async move { k.invoke(v).await }).await;
                total += x;
            }
            total
        });
        prop_assert_eq!(result, Ok(expected));
    }

    #[test]
    fn prop_multi_shot_fan_out_is_cartesian(
        xs in prop::collection::vec(0u8..10, 1..4),
        ys in prop::collection::vec(0u8..10, 1..4)
    ) {
        let expected: Vec<(u8, u8)> = xs
            .iter()
            .flat_map(|&x| ys.iter().map(move |&y| (x, y)))
            .collect();
        let result = reset_multi(move |scope: Scope<Vec<(u8, u8)>>| {
            let xs = xs.clone();
            let ys = ys.clone();
            async move {
                let x: u8 = scope
                    .shift(move |k| async move {
                        let mut out = Vec::new();
                        for x in xs {
                            out.extend(k.invoke(x).await);
                        }
                        out
                    })
                    .await;
                let y: u8 = scope
                    .shift(move |k| async move {
                        let mut out = Vec::new();
                        for y in ys {
                            out.extend(k.invoke(y).await);
                        }
                        out
                    })
                    .await;
                vec![(x, y)]
            }
        });
        prop_assert_eq!(result, Ok(expected));
    }

    #[test]
    fn prop_replays_reproduce_earlier_shift_outcomes(
        first in any::<i32>(),
        second in any::<i32>(),
        seeds in prop::collection::vec(any::<i32>(), 1..8)
    ) {
        let observed = Rc::new(RefCell::new(Vec::new()));
        let record = observed.clone();
        let fed = seeds.clone();
        let result = reset_multi(move |scope: Scope<Vec<i32>>| {
            let record = record.clone();
            let fed = fed.clone();
            async move {
                let a: i32 = scope.shift(move |k| async move { k.invoke(first).await }).await;
                let b: i32 = scope.shift(move |k| async move { k.invoke(second).await }).await;
                let c: i32 = scope
                    .shift(move |k| async move {
                        let mut out = Vec::new();
                        for seed in fed {
                            out.extend(k.invoke(seed).await);
                        }
                        out
                    })
                    .await;
                record.borrow_mut().push((a, b));
                vec![c]
            }
        });

        // One live run plus a replay for every further seed.
        prop_assert_eq!(result, Ok(seeds.clone()));
        prop_assert_eq!(observed.borrow().clone(), vec![(first, second); seeds.len()]);
    }

    #[test]
    fn prop_all_choices_matches_filter(limit in 1u32..40, divisor in 1u32..7) {
        let expected: Vec<u32> = (1..=limit).filter(|n| n % divisor == 0).collect();
        let found = all_choices(move |c| async move {
            let n = c.choose((1..=limit).collect()).await;
            c.guard(n % divisor == 0).await;
            n
        });
        prop_assert_eq!(found, Ok(expected));
    }
}
