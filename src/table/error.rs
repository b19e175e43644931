//! Validation errors for state table construction.

use thiserror::Error;

use super::Cell;

/// Errors reported while building a [`super::StateTable`].
///
/// These surface configuration defects only; the runtime itself never
/// returns errors.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("state table has no state rows")]
    NoStates,

    #[error("cell count {cells} is not a multiple of the row width {width}")]
    RaggedRows { cells: usize, width: usize },

    #[error(
        "state {state} declares {found} transition cells, expected {expected} \
         (events plus the catch-all)"
    )]
    WrongTransitionCount {
        state: usize,
        expected: usize,
        found: usize,
    },

    #[error("declared state count {declared} does not match the {actual} rows in cells")]
    StateCountMismatch { declared: usize, actual: usize },

    #[error(
        "state {state}, event column {column}: destination {target} is outside \
         0..{states}"
    )]
    BadDestination {
        state: usize,
        column: usize,
        target: Cell,
        states: usize,
    },
}
