// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Bounded Merging
//!
//! Each generated case is a bound `k` and a list of values, each with an
//! arrival time on the source and the lifetime of the child it maps to. The
//! merge must behave exactly like a FIFO queue in front of `k` servers.

use std::cell::RefCell;
use std::rc::Rc;

use cim_frp_merge::testing::{RecordingSink, ScriptedStream, SubscriptionProbe, VirtualScheduler};
use cim_frp_merge::{merge_map_concurrently, Notification, Time};
use proptest::prelude::*;

use crate::fixtures::{end, event};

// ============================================================================
// Model
// ============================================================================

/// One value of a generated case
#[derive(Debug, Clone, Copy)]
struct Arrival {
    at: Time,
    lifetime: Time,
}

/// Start time of every value under a k-server FIFO queue
fn fifo_starts(concurrency: usize, arrivals: &[Arrival]) -> Vec<Time> {
    let mut free_at = vec![Time::MIN; concurrency];
    let mut starts = Vec::with_capacity(arrivals.len());
    let mut previous_start = Time::MIN;
    for arrival in arrivals {
        let (slot, earliest) = free_at
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|(_, free)| *free)
            .unwrap_or((0, Time::MIN));
        // FIFO: nobody overtakes the value ahead of it
        let start = arrival.at.max(earliest).max(previous_start);
        free_at[slot] = start + arrival.lifetime;
        previous_start = start;
        starts.push(start);
    }
    starts
}

fn source_end(arrivals: &[Arrival]) -> Time {
    arrivals.last().map_or(0, |arrival| arrival.at)
}

// ============================================================================
// Harness
// ============================================================================

/// What the mapper saw when it was called
#[derive(Debug, Clone)]
struct MapperCall {
    index: usize,
    at: Time,
    open_children: usize,
}

struct Run {
    sink: Rc<RecordingSink<usize>>,
    calls: Vec<MapperCall>,
    probes: Vec<SubscriptionProbe>,
}

fn run_case(concurrency: usize, arrivals: &[Arrival]) -> Run {
    let scheduler = VirtualScheduler::new();

    let mut script: Vec<Notification<usize>> = arrivals
        .iter()
        .enumerate()
        .map(|(index, arrival)| event(arrival.at, index))
        .collect();
    script.push(end(source_end(arrivals)));

    let lifetimes: Vec<Time> = arrivals.iter().map(|arrival| arrival.lifetime).collect();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let probes: Rc<RefCell<Vec<SubscriptionProbe>>> = Rc::new(RefCell::new(Vec::new()));

    let mapper = {
        let clock = scheduler.clone();
        let calls = Rc::clone(&calls);
        let probes = Rc::clone(&probes);
        move |index: usize| {
            let open_children = probes.borrow().iter().map(SubscriptionProbe::open).sum();
            calls.borrow_mut().push(MapperCall {
                index,
                at: clock.now(),
                open_children,
            });
            let child = ScriptedStream::delayed(lifetimes[index], index);
            probes.borrow_mut().push(child.probe());
            child.into_stream()
        }
    };

    let merged = merge_map_concurrently(mapper, concurrency, ScriptedStream::new(script).into_stream())
        .expect("generated concurrency is positive");
    let sink = RecordingSink::new();
    let _handle = merged.run(sink.clone(), scheduler.handle());
    scheduler.run();

    let calls = calls.borrow().clone();
    let probes = probes.borrow().clone();
    Run { sink, calls, probes }
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Arrivals sorted by time, lifetimes independent
fn arrivals() -> impl Strategy<Value = Vec<Arrival>> {
    prop::collection::vec((0i64..20, 0i64..20), 0..=12).prop_map(|pairs| {
        let mut arrivals: Vec<Arrival> = pairs
            .into_iter()
            .map(|(at, lifetime)| Arrival { at, lifetime })
            .collect();
        arrivals.sort_by_key(|arrival| arrival.at);
        arrivals
    })
}

fn concurrency() -> impl Strategy<Value = usize> {
    1usize..=4
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: The merge is a k-server FIFO queue
    ///
    /// Every value is emitted exactly once, at its queue start time plus its
    /// lifetime.
    #[test]
    fn prop_events_match_fifo_model(k in concurrency(), arrivals in arrivals()) {
        let run = run_case(k, &arrivals);

        let mut expected: Vec<(Time, usize)> = fifo_starts(k, &arrivals)
            .into_iter()
            .zip(&arrivals)
            .enumerate()
            .map(|(index, (start, arrival))| (start + arrival.lifetime, index))
            .collect();
        expected.sort();

        let mut actual = run.sink.occurrences();
        actual.sort();

        prop_assert_eq!(actual, expected);
    }

    /// Property: Output times never go backwards
    #[test]
    fn prop_output_is_time_ordered(k in concurrency(), arrivals in arrivals()) {
        let run = run_case(k, &arrivals);
        let times: Vec<Time> = run.sink.notifications().iter().map(Notification::time).collect();

        prop_assert!(
            times.windows(2).all(|pair| pair[0] <= pair[1]),
            "Notification times must be non-decreasing: {:?}",
            times
        );
    }

    /// Property: Values are mapped in arrival order, when a slot is free
    #[test]
    fn prop_mapping_respects_order_and_bound(k in concurrency(), arrivals in arrivals()) {
        let run = run_case(k, &arrivals);
        let starts = fifo_starts(k, &arrivals);

        let order: Vec<usize> = run.calls.iter().map(|call| call.index).collect();
        prop_assert_eq!(order, (0..arrivals.len()).collect::<Vec<_>>());

        for call in &run.calls {
            prop_assert!(
                call.open_children < k,
                "Mapper called with {} children open, bound {}",
                call.open_children,
                k
            );
            prop_assert_eq!(call.at, starts[call.index]);
        }
    }

    /// Property: Exactly one end, after the source and the last child
    #[test]
    fn prop_single_end_after_everything(k in concurrency(), arrivals in arrivals()) {
        let run = run_case(k, &arrivals);

        let last_child = fifo_starts(k, &arrivals)
            .into_iter()
            .zip(&arrivals)
            .map(|(start, arrival)| start + arrival.lifetime)
            .max();
        let expected_end = last_child.map_or(source_end(&arrivals), |last| last.max(source_end(&arrivals)));

        prop_assert_eq!(run.sink.terminal_count(), 1);
        prop_assert_eq!(run.sink.ended_at(), Some(expected_end));
        prop_assert!(run.sink.error().is_none());
    }

    /// Property: Every child subscription is released once the merge ends
    #[test]
    fn prop_children_are_released(k in concurrency(), arrivals in arrivals()) {
        let run = run_case(k, &arrivals);

        prop_assert_eq!(run.probes.len(), arrivals.len());
        for probe in &run.probes {
            prop_assert_eq!(probe.subscriptions(), 1);
            prop_assert_eq!(probe.releases(), 1);
        }
    }

    /// Property: A bound of one runs children back to back
    #[test]
    fn prop_bound_of_one_is_sequential(arrivals in arrivals()) {
        let starts = fifo_starts(1, &arrivals);
        let run = run_case(1, &arrivals);

        let mut previous_end = Time::MIN;
        for (call, arrival) in run.calls.iter().zip(&arrivals) {
            prop_assert!(call.at >= previous_end, "Child {} overlapped its predecessor", call.index);
            prop_assert_eq!(call.at, starts[call.index]);
            previous_end = call.at + arrival.lifetime;
        }
    }
}

#[test]
fn test_fifo_model_matches_worked_example() {
    let arrivals = [
        Arrival { at: 0, lifetime: 30 },
        Arrival { at: 0, lifetime: 10 },
        Arrival { at: 0, lifetime: 5 },
    ];
    assert_eq!(fifo_starts(2, &arrivals), vec![0, 0, 10]);
    assert_eq!(fifo_starts(1, &arrivals), vec![0, 30, 40]);
}
