//! Row-by-row builder for state tables.

use super::error::TableError;
use super::{Cell, StateTable, HOOK_COLUMNS};

/// Builder that assembles a [`StateTable`] one state row at a time.
///
/// Rows are laid out in the order `.state()` is called; the first row is
/// state 0, the machine's initial state. `transitions` carries the event
/// columns in declaration order followed by the catch-all cell, so it must
/// hold exactly `events + 1` values.
///
/// # Example
///
/// ```rust
/// use reflex::table::{StateTableBuilder, NONE};
///
/// const ACT_SAMPLE: i16 = 0;
/// const ACT_UP: i16 = 1;
/// const ACT_DOWN: i16 = 2;
///
/// // The encoder table: IDLE samples, UP/DOWN fire once and fall back.
/// let table = StateTableBuilder::new(2)
///     .state(NONE, ACT_SAMPLE, NONE, &[1, 2, NONE])
///     .state(ACT_UP, NONE, NONE, &[NONE, NONE, 0])
///     .state(ACT_DOWN, NONE, NONE, &[NONE, NONE, 0])
///     .build()
///     .unwrap();
///
/// assert_eq!(table.states(), 3);
/// ```
pub struct StateTableBuilder {
    events: usize,
    rows: Vec<RowSpec>,
}

struct RowSpec {
    on_enter: Cell,
    on_loop: Cell,
    on_exit: Cell,
    transitions: Vec<Cell>,
}

impl StateTableBuilder {
    /// Start a table for a type with `events` declared events (the
    /// catch-all column is implied and not counted here).
    pub fn new(events: usize) -> Self {
        StateTableBuilder {
            events,
            rows: Vec::new(),
        }
    }

    /// Append one state row.
    pub fn state(
        mut self,
        on_enter: Cell,
        on_loop: Cell,
        on_exit: Cell,
        transitions: &[Cell],
    ) -> Self {
        self.rows.push(RowSpec {
            on_enter,
            on_loop,
            on_exit,
            transitions: transitions.to_vec(),
        });
        self
    }

    /// Validate the rows and produce the immutable table.
    pub fn build(self) -> Result<StateTable, TableError> {
        if self.rows.is_empty() {
            return Err(TableError::NoStates);
        }
        let width = HOOK_COLUMNS + self.events + 1;
        let mut cells = Vec::with_capacity(self.rows.len() * width);
        for (state, row) in self.rows.iter().enumerate() {
            if row.transitions.len() != self.events + 1 {
                return Err(TableError::WrongTransitionCount {
                    state,
                    expected: self.events + 1,
                    found: row.transitions.len(),
                });
            }
            cells.push(row.on_enter);
            cells.push(row.on_loop);
            cells.push(row.on_exit);
            cells.extend_from_slice(&row.transitions);
        }
        StateTable::from_cells(self.events, cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::NONE;

    #[test]
    fn builder_requires_at_least_one_state() {
        let result = StateTableBuilder::new(2).build();
        assert!(matches!(result, Err(TableError::NoStates)));
    }

    #[test]
    fn builder_rejects_short_transition_rows() {
        let result = StateTableBuilder::new(2)
            .state(NONE, NONE, NONE, &[NONE, NONE])
            .build();
        assert!(matches!(
            result,
            Err(TableError::WrongTransitionCount {
                state: 0,
                expected: 3,
                found: 2,
            })
        ));
    }

    #[test]
    fn builder_rejects_destinations_past_the_last_row() {
        let result = StateTableBuilder::new(0)
            .state(NONE, NONE, NONE, &[1])
            .build();
        assert!(matches!(result, Err(TableError::BadDestination { .. })));
    }

    #[test]
    fn rows_are_laid_out_in_declaration_order() {
        let table = StateTableBuilder::new(1)
            .state(7, NONE, NONE, &[1, NONE])
            .state(8, NONE, NONE, &[NONE, 0])
            .build()
            .unwrap();

        assert_eq!(table.on_enter(0), 7);
        assert_eq!(table.on_enter(1), 8);
        assert_eq!(table.destination(0, 0), 1);
        assert_eq!(table.destination(1, 1), 0);
    }
}
