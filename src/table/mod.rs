//! Immutable state tables.
//!
//! A state table is the whole behavior of a machine *type*: a rectangular
//! grid with one row per state and, in fixed order, an ON_ENTER action
//! column, an ON_LOOP action column, an ON_EXIT action column, one column
//! per declared event and a final catch-all (ELSE) column. Hook columns
//! hold action ids, event columns hold destination state ids, and the
//! [`NONE`] sentinel marks an empty cell.
//!
//! Tables are built once via [`StateTableBuilder`], validated, and then
//! shared read-only (typically behind an `Rc`) by every machine instance
//! of that type. Tables deserialized from config pass through the same
//! validation as built ones.

mod builder;
mod error;

pub use builder::StateTableBuilder;
pub use error::TableError;

use serde::{Deserialize, Serialize};

/// A single table cell: an action id, a destination state id or a sentinel.
pub type Cell = i16;

/// Empty cell: no action in a hook column, no transition in an event column.
pub const NONE: Cell = -1;

/// Reserved ON_LOOP marker. Entering a state whose ON_LOOP cell holds this
/// value puts the machine to sleep until it is woken by a state request.
pub const SLEEP: Cell = -2;

const ON_ENTER: usize = 0;
const ON_LOOP: usize = 1;
const ON_EXIT: usize = 2;
const HOOK_COLUMNS: usize = 3;

/// Immutable per-type state table.
///
/// Row width is fixed at `3 + events + 1`. Instances are cheap to share
/// and never mutated after construction.
///
/// # Example
///
/// ```rust
/// use reflex::table::{StateTableBuilder, NONE, SLEEP};
///
/// // Two states (IDLE, ON), one event (EVT_TOGGLE) plus the catch-all.
/// const IDLE: i16 = 0;
/// const ON: i16 = 1;
///
/// let table = StateTableBuilder::new(1)
///     .state(NONE, SLEEP, NONE, &[ON, NONE])
///     .state(NONE, NONE, NONE, &[IDLE, NONE])
///     .build()
///     .unwrap();
///
/// assert_eq!(table.states(), 2);
/// assert_eq!(table.width(), 5);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct StateTable {
    states: usize,
    events: usize,
    cells: Vec<Cell>,
}

/// Wire shape for deserialization. Routed through [`StateTable::from_cells`]
/// so a table read from config passes the same validation as a built one.
#[derive(Deserialize)]
struct RawTable {
    states: usize,
    events: usize,
    cells: Vec<Cell>,
}

impl TryFrom<RawTable> for StateTable {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self, TableError> {
        let table = StateTable::from_cells(raw.events, raw.cells)?;
        if table.states != raw.states {
            return Err(TableError::StateCountMismatch {
                declared: raw.states,
                actual: table.states,
            });
        }
        Ok(table)
    }
}

impl StateTable {
    /// Build a table directly from a flat cell vector, row-major.
    ///
    /// `cells.len()` must be a whole multiple of the row width implied by
    /// `events`. Most callers should prefer [`StateTableBuilder`].
    pub fn from_cells(events: usize, cells: Vec<Cell>) -> Result<Self, TableError> {
        let width = HOOK_COLUMNS + events + 1;
        if cells.is_empty() {
            return Err(TableError::NoStates);
        }
        if cells.len() % width != 0 {
            return Err(TableError::RaggedRows {
                cells: cells.len(),
                width,
            });
        }
        let table = StateTable {
            states: cells.len() / width,
            events,
            cells,
        };
        table.check_destinations()?;
        Ok(table)
    }

    /// Number of state rows.
    pub fn states(&self) -> usize {
        self.states
    }

    /// Number of declared events, excluding the catch-all column.
    pub fn events(&self) -> usize {
        self.events
    }

    /// Row width: `3 + events + 1`.
    pub fn width(&self) -> usize {
        HOOK_COLUMNS + self.events + 1
    }

    /// The ON_ENTER action cell for `state`.
    pub fn on_enter(&self, state: usize) -> Cell {
        self.cell(state, ON_ENTER)
    }

    /// The ON_LOOP action cell for `state` (may hold [`SLEEP`]).
    pub fn on_loop(&self, state: usize) -> Cell {
        self.cell(state, ON_LOOP)
    }

    /// The ON_EXIT action cell for `state`.
    pub fn on_exit(&self, state: usize) -> Cell {
        self.cell(state, ON_EXIT)
    }

    /// The destination cell for event column `event` in `state`.
    ///
    /// Column `self.events()` addresses the catch-all.
    pub fn destination(&self, state: usize, event: usize) -> Cell {
        self.cell(state, HOOK_COLUMNS + event)
    }

    fn cell(&self, state: usize, column: usize) -> Cell {
        self.cells[state * self.width() + column]
    }

    fn check_destinations(&self) -> Result<(), TableError> {
        for state in 0..self.states {
            for event in 0..=self.events {
                let target = self.destination(state, event);
                if target != NONE && !(0..self.states as Cell).contains(&target) {
                    return Err(TableError::BadDestination {
                        state,
                        column: event,
                        target,
                        states: self.states,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_table() -> StateTable {
        StateTableBuilder::new(2)
            .state(10, NONE, 11, &[1, NONE, NONE])
            .state(NONE, SLEEP, NONE, &[NONE, 0, 0])
            .build()
            .unwrap()
    }

    #[test]
    fn accessors_address_the_declared_columns() {
        let table = two_state_table();

        assert_eq!(table.states(), 2);
        assert_eq!(table.events(), 2);
        assert_eq!(table.width(), 6);

        assert_eq!(table.on_enter(0), 10);
        assert_eq!(table.on_loop(0), NONE);
        assert_eq!(table.on_exit(0), 11);
        assert_eq!(table.destination(0, 0), 1);
        assert_eq!(table.destination(0, 2), NONE);

        assert_eq!(table.on_loop(1), SLEEP);
        assert_eq!(table.destination(1, 1), 0);
        assert_eq!(table.destination(1, 2), 0);
    }

    #[test]
    fn from_cells_rejects_empty_tables() {
        assert!(matches!(
            StateTable::from_cells(1, vec![]),
            Err(TableError::NoStates)
        ));
    }

    #[test]
    fn from_cells_rejects_ragged_rows() {
        let result = StateTable::from_cells(1, vec![NONE, NONE, NONE, NONE]);
        assert!(matches!(result, Err(TableError::RaggedRows { .. })));
    }

    #[test]
    fn from_cells_rejects_out_of_range_destinations() {
        let result = StateTable::from_cells(0, vec![NONE, NONE, NONE, 3]);
        assert!(matches!(
            result,
            Err(TableError::BadDestination { state: 0, target: 3, .. })
        ));
    }

    #[test]
    fn tables_round_trip_through_serde() {
        let table = two_state_table();
        let json = serde_json::to_string(&table).unwrap();
        let back: StateTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
    }

    #[test]
    fn deserialization_validates_like_the_builder() {
        // One row of cells, a declared count of four and a destination past
        // the last row: a machine handed this table would index out of
        // bounds on its first commit.
        let result = serde_json::from_str::<StateTable>(
            r#"{"states":4,"events":0,"cells":[-1,-1,-1,2]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn deserialization_rejects_a_mismatched_state_count() {
        // Cells are well-formed on their own; only the declared count lies.
        let result = serde_json::from_str::<StateTable>(
            r#"{"states":2,"events":0,"cells":[-1,-1,-1,0]}"#,
        );
        assert!(result.is_err());
    }
}
