//! Property-based tests for the interpreter core.
//!
//! These tests use proptest to verify interpreter invariants hold across
//! many randomly generated state tables.

use proptest::prelude::*;
use reflex::machine::{Handler, Machine};
use reflex::table::{Cell, StateTable, StateTableBuilder, NONE};

/// Handler whose predicates never hold and whose actions do nothing;
/// machine motion comes purely from catch-all columns and state requests.
struct Inert;

impl Handler for Inert {
    fn event(&mut self, _m: &Machine<Self>, _id: usize) -> bool {
        false
    }

    fn action(&mut self, _m: &Machine<Self>, _id: Cell) {}
}

/// Any rectangular table whose destinations are in range. Hook cells carry
/// arbitrary in-range action ids or NONE; the sleep marker is excluded so
/// machines stay schedulable.
fn arbitrary_table() -> impl Strategy<Value = StateTable> {
    (1usize..6, 0usize..4).prop_flat_map(|(states, events)| {
        let width = 3 + events + 1;
        prop::collection::vec(NONE..states as Cell, states * width)
            .prop_map(move |cells| StateTable::from_cells(events, cells).unwrap())
    })
}

/// A table with no transitions at all: every event and catch-all cell is
/// empty, hook cells arbitrary.
fn parked_table() -> impl Strategy<Value = StateTable> {
    (1usize..6, 0usize..4).prop_flat_map(|(states, events)| {
        prop::collection::vec((NONE..10, NONE..10, NONE..10), states).prop_map(
            move |hooks| {
                let mut builder = StateTableBuilder::new(events);
                for (on_enter, on_loop, on_exit) in hooks {
                    builder =
                        builder.state(on_enter, on_loop, on_exit, &vec![NONE; events + 1]);
                }
                builder.build().unwrap()
            },
        )
    })
}

fn started(table: &StateTable) -> Machine<Inert> {
    let machine = Machine::new(Inert);
    machine.begin(table.clone());
    machine
}

proptest! {
    #[test]
    fn cycling_never_leaves_the_table(
        table in arbitrary_table(),
        passes in 1usize..20,
    ) {
        let machine = started(&table);
        for _ in 0..passes {
            machine.cycle();
        }
        let state = machine.state();
        prop_assert!(state >= 0);
        prop_assert!((state as usize) < table.states());
    }

    #[test]
    fn steady_state_is_idempotent(
        table in parked_table(),
        passes in 1usize..20,
    ) {
        let machine = started(&table);
        machine.cycle();
        let settled = machine.state();
        for _ in 0..passes {
            machine.cycle();
        }
        prop_assert_eq!(machine.state(), settled);
    }

    #[test]
    fn last_state_request_wins(
        (table, requests) in arbitrary_table().prop_flat_map(|table| {
            let states = table.states();
            (Just(table), prop::collection::vec(0..states, 1..8))
        }),
    ) {
        let machine = started(&table);
        for &request in &requests {
            machine.set_state(request);
        }
        machine.cycle();
        prop_assert_eq!(machine.state(), *requests.last().unwrap() as Cell);
    }

    #[test]
    fn trigger_never_faults_and_stays_in_range(
        table in arbitrary_table(),
        event in 0usize..4,
    ) {
        let machine = started(&table);
        machine.cycle();
        machine.trigger(event);
        let state = machine.state();
        prop_assert!(state >= 0);
        prop_assert!((state as usize) < table.states());
    }

    #[test]
    fn tables_round_trip_through_serde(table in arbitrary_table()) {
        let json = serde_json::to_string(&table).unwrap();
        let back: StateTable = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(table, back);
    }
}
