//! Reflex: a reactive table-driven state machine runtime.
//!
//! Reflex drives many small, independently-clocked state machines from one
//! cooperative polling loop. A machine *type* is an immutable
//! [`StateTable`](table::StateTable) plus a [`Handler`](machine::Handler):
//! an event predicate and an action dispatcher. The
//! [`Machine`](machine::Machine) interpreter executes one cycle at a time:
//! commit a pending transition, run the state's ON_LOOP action, scan the
//! event columns in declaration order and schedule the first eligible
//! destination. Machines observe and wake each other through
//! [`Connector`](connector::Connector)s, and an
//! [`Appliance`](appliance::Appliance) round-robins a whole registry of
//! them without ever blocking.
//!
//! The runtime is single-threaded and non-preemptive; "waiting" is always
//! polling against a [`Clock`](timing::Clock) or a countdown. Failure modes
//! are silent, observable stalls rather than errors: an unreachable trigger
//! is dropped, a table without an eligible column parks its machine, a pull
//! on an unconfigured connector yields the caller's default.
//!
//! # Example
//!
//! ```rust
//! use reflex::machine::{Handler, Machine};
//! use reflex::table::{Cell, StateTableBuilder, NONE, SLEEP};
//! use reflex::timing::Timer;
//!
//! const IDLE: usize = 0;
//! const ON: usize = 1;
//! const EVT_TIMER: usize = 0;
//! const ACT_ON: Cell = 0;
//! const ACT_OFF: Cell = 1;
//!
//! struct Pulse {
//!     timer: Timer,
//!     lit: bool,
//! }
//!
//! impl Handler for Pulse {
//!     fn event(&mut self, m: &Machine<Self>, id: usize) -> bool {
//!         id == EVT_TIMER && self.timer.expired(m.time_in_state())
//!     }
//!
//!     fn action(&mut self, _m: &Machine<Self>, id: Cell) {
//!         match id {
//!             ACT_ON => self.lit = true,
//!             ACT_OFF => self.lit = false,
//!             _ => {}
//!         }
//!     }
//! }
//!
//! // IDLE sleeps until woken; ON falls back to IDLE when the timer runs out.
//! let table = StateTableBuilder::new(1)
//!     .state(ACT_OFF, SLEEP, NONE, &[NONE, NONE])
//!     .state(ACT_ON, NONE, NONE, &[IDLE as Cell, NONE])
//!     .build()
//!     .unwrap();
//!
//! let pulse = Machine::new(Pulse { timer: Timer::new(50), lit: false });
//! pulse.begin(table);
//! pulse.cycle();
//! assert!(!pulse.handler().lit);
//!
//! pulse.set_state(ON);
//! pulse.cycle();
//! assert!(pulse.handler().lit);
//! ```

pub mod appliance;
pub mod connector;
pub mod machine;
pub mod table;
pub mod timing;

// Re-export the working set most applications need.
pub use appliance::Appliance;
pub use connector::{Connector, ConnectorKind, LogOp, RelOp};
pub use machine::{Component, Handler, Machine, Symbols, ON_SWITCH};
pub use table::{Cell, StateTable, StateTableBuilder, TableError, NONE, SLEEP};
pub use timing::{Clock, Counter, ManualClock, SystemClock, Timer};
