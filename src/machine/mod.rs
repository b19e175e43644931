//! The table-driven machine interpreter.
//!
//! A [`Machine`] binds an immutable [`StateTable`] to a [`Handler`], the
//! capability pair a concrete machine type supplies: an event predicate and
//! an action dispatcher. The interpreter owns all per-instance state
//! (current/pending state, dormancy and busy flags, timing counters) and
//! executes it one [`cycle`](Machine::cycle) at a time.
//!
//! All interpreter state lives in `Cell`s so the entire public API takes
//! `&self`: an action that pushes through a connector into another machine,
//! which synchronously triggers back, is stopped by the busy flag instead
//! of a borrow panic. The runtime is single-threaded and cooperative; no
//! call ever blocks.

mod trace;

pub use trace::{write_trace, Symbols, TraceFormatter, TraceFrame, NONE_NAME};

use crate::table::{Cell as TableCell, StateTable, NONE, SLEEP};
use crate::timing::{Clock, SystemClock};
use chrono::Utc;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::io::Write;
use std::rc::Rc;
use trace::Trace;

/// Reserved machine-wide action id, delivered to the handler on every
/// committed transition before anything else happens. Never stored in a
/// table.
pub const ON_SWITCH: TableCell = -3;

/// Settling budget for [`Machine::trigger`]: the machine is cycled at most
/// this many times before delivery is attempted.
const TRIGGER_SETTLE_CYCLES: usize = 8;

/// The capability pair a concrete machine type supplies to the interpreter.
///
/// This replaces subclass overriding: the interpreter calls back into the
/// handler for event predicates and actions, and the handler reaches back
/// through the `&Machine` it is given for timing state, state requests or
/// connector pushes.
pub trait Handler: Sized + 'static {
    /// Event predicate: does event `id` currently hold?
    ///
    /// Consulted during the steady-state scan for every declared event
    /// column with a destination. Expected to be free of interpreter-
    /// visible side effects.
    fn event(&mut self, machine: &Machine<Self>, id: usize) -> bool;

    /// Action dispatcher. Receives table action ids as well as the
    /// reserved ids [`ON_SWITCH`] and [`crate::table::SLEEP`]; unknown ids
    /// must be ignored.
    fn action(&mut self, machine: &Machine<Self>, id: TableCell);

    /// Map the raw current state id to the externally visible value.
    ///
    /// The default is the identity; a concrete machine may expose a
    /// different value domain (a level, a count) through
    /// [`Machine::state`].
    fn state_value(&self, current: TableCell) -> TableCell {
        current
    }
}

/// Object-safe facade over a machine, used by the appliance scheduler and
/// by machine-link connectors.
pub trait Component {
    /// Execute one interpreter pass.
    fn cycle(&self);
    /// Deliver an external event, bypassing its predicate.
    fn trigger(&self, event: usize);
    /// The externally visible state value.
    fn state(&self) -> TableCell;
    /// Dormancy flag: a dormant machine is skipped by the scheduler.
    fn asleep(&self) -> bool;
    /// Reentrancy guard: true while a cycle is in progress.
    fn busy(&self) -> bool;
}

/// Table-driven state machine interpreter.
///
/// # Example
///
/// ```rust
/// use reflex::machine::{Handler, Machine};
/// use reflex::table::{Cell, StateTableBuilder, NONE};
///
/// const OFF: usize = 0;
/// const ON: usize = 1;
/// const EVT_TOGGLE: usize = 0;
///
/// struct Toggle {
///     requested: bool,
/// }
///
/// impl Handler for Toggle {
///     fn event(&mut self, _m: &Machine<Self>, id: usize) -> bool {
///         id == EVT_TOGGLE && std::mem::take(&mut self.requested)
///     }
///     fn action(&mut self, _m: &Machine<Self>, _id: Cell) {}
/// }
///
/// let table = StateTableBuilder::new(1)
///     .state(NONE, NONE, NONE, &[ON as Cell, NONE])
///     .state(NONE, NONE, NONE, &[OFF as Cell, NONE])
///     .build()
///     .unwrap();
///
/// let machine = Machine::new(Toggle { requested: false });
/// machine.begin(table);
/// machine.cycle(); // self-start commits state 0
/// assert_eq!(machine.state(), OFF as Cell);
///
/// machine.handler_mut().requested = true;
/// machine.cycle().cycle(); // scan picks the event, next pass commits
/// assert_eq!(machine.state(), ON as Cell);
/// ```
pub struct Machine<H: Handler> {
    table: RefCell<Option<Rc<StateTable>>>,
    clock: Rc<dyn Clock>,
    handler: RefCell<H>,
    current: Cell<Option<usize>>,
    next: Cell<Option<usize>>,
    last_trigger: Cell<Option<usize>>,
    forced: Cell<Option<usize>>,
    asleep: Cell<bool>,
    busy: Cell<bool>,
    entered_at: Cell<u64>,
    cycles: Cell<u32>,
    trace: RefCell<Option<Trace>>,
}

impl<H: Handler> Machine<H> {
    /// Create a machine over `handler`, clocked by the real wall clock.
    pub fn new(handler: H) -> Self {
        Self::with_clock(handler, Rc::new(SystemClock::new()))
    }

    /// Create a machine with an explicit clock source.
    pub fn with_clock(handler: H, clock: Rc<dyn Clock>) -> Self {
        Machine {
            table: RefCell::new(None),
            clock,
            handler: RefCell::new(handler),
            current: Cell::new(None),
            next: Cell::new(None),
            last_trigger: Cell::new(None),
            forced: Cell::new(None),
            asleep: Cell::new(false),
            busy: Cell::new(false),
            entered_at: Cell::new(0),
            cycles: Cell::new(0),
            trace: RefCell::new(None),
        }
    }

    /// Bind the state table and arm the self-start: the first cycle after
    /// `begin` commits an implicit transition into state 0, running its
    /// ON_ENTER, with no external trigger required.
    pub fn begin(&self, table: impl Into<Rc<StateTable>>) -> &Self {
        let table = table.into();
        log::debug!(
            "machine bound: {} states, {} events",
            table.states(),
            table.events()
        );
        *self.table.borrow_mut() = Some(table);
        self.current.set(None);
        self.next.set(Some(0));
        self.last_trigger.set(None);
        self.forced.set(None);
        self.asleep.set(false);
        self.cycles.set(0);
        self
    }

    /// The externally visible state value: the current state id (or
    /// [`NONE`] before the first commit), mapped through
    /// [`Handler::state_value`].
    ///
    /// A reentrant read from within the handler's own callback falls back
    /// to the raw id.
    pub fn state(&self) -> TableCell {
        let raw = self.current.get().map_or(NONE, |s| s as TableCell);
        match self.handler.try_borrow() {
            Ok(handler) => handler.state_value(raw),
            Err(_) => raw,
        }
    }

    /// Request a transition to `state`, effective on the next cycle.
    ///
    /// Clears the last-trigger record and always wakes the machine. A later
    /// request before the commit overwrites this one without a trace. A
    /// request for a state the table does not have is silently dropped,
    /// like an out-of-range trigger.
    pub fn set_state(&self, state: usize) -> &Self {
        if let Some(table) = self.table.borrow().as_ref() {
            if state >= table.states() {
                log::trace!("state({state}) dropped: no such state row");
                return self;
            }
        }
        self.next.set(Some(state));
        self.last_trigger.set(None);
        self.asleep.set(false);
        self
    }

    /// Execute one interpreter pass: commit a pending transition, then run
    /// ON_LOOP and scan the event columns. Does nothing on a dormant or
    /// busy machine.
    pub fn cycle(&self) -> &Self {
        self.pass();
        self
    }

    /// Cycle repeatedly until `ms` of clock time has elapsed (at least one
    /// pass). Dormant passes still consume wall time; they just do no work.
    pub fn cycle_for(&self, ms: u64) -> &Self {
        let start = self.clock.now();
        loop {
            self.pass();
            if self.clock.now().saturating_sub(start) >= ms {
                break;
            }
        }
        self
    }

    /// Deliver an external event, bypassing its predicate.
    ///
    /// The machine is first cycled up to 8 times (waking it each time) so
    /// it can settle through any chain of predicate-driven transitions into
    /// a state that listens for `event`. If such a state is reached, the
    /// event is marked forced and exactly two more cycles run: one for the
    /// steady-state scan to pick the event up, one to commit the resulting
    /// transition. Otherwise the event is silently dropped, as it is when
    /// the machine is already mid-cycle or the event id is out of range.
    pub fn trigger(&self, event: usize) -> &Self {
        if self.busy.get() {
            log::trace!("trigger({event}) dropped: machine is mid-cycle");
            return self;
        }
        let table = match self.table.borrow().clone() {
            Some(table) => table,
            None => return self,
        };
        if event >= table.events() {
            return self;
        }
        let mut budget = TRIGGER_SETTLE_CYCLES;
        let target = loop {
            self.asleep.set(false);
            self.pass();
            let target = match self.current.get() {
                Some(current) => table.destination(current, event),
                None => NONE,
            };
            budget -= 1;
            if budget == 0 || (target != NONE && self.forced.get().is_none()) {
                break target;
            }
        };
        if target == NONE {
            log::trace!("trigger({event}) dropped: no listening state reached");
            return self;
        }
        self.forced.set(Some(event));
        self.asleep.set(false);
        self.pass(); // scan picks up the forced event
        self.asleep.set(false);
        self.pass(); // commits the transition
        self
    }

    /// Dormancy flag. A dormant machine performs no work until woken by a
    /// state request or [`set_sleep(false)`](Machine::set_sleep).
    pub fn asleep(&self) -> bool {
        self.asleep.get()
    }

    /// Set or clear the dormancy flag explicitly.
    pub fn set_sleep(&self, asleep: bool) -> &Self {
        self.asleep.set(asleep);
        self
    }

    /// The event column that requested the last committed transition, the
    /// table's catch-all column included (its id equals the event count).
    pub fn last_trigger(&self) -> Option<usize> {
        self.last_trigger.get()
    }

    /// Milliseconds spent in the current state.
    pub fn time_in_state(&self) -> u64 {
        self.clock.now().saturating_sub(self.entered_at.get())
    }

    /// Interpreter passes since the last committed transition.
    pub fn cycle_count(&self) -> u32 {
        self.cycles.get()
    }

    /// Install a trace hook: `formatter` is invoked against `sink` with a
    /// [`TraceFrame`] on every committed transition. Write errors are
    /// discarded.
    pub fn set_trace(
        &self,
        sink: Box<dyn Write>,
        format: TraceFormatter,
        symbols: Symbols,
    ) -> &Self {
        *self.trace.borrow_mut() = Some(Trace {
            sink,
            format,
            symbols,
        });
        self
    }

    /// Shared view of the embedded handler state.
    ///
    /// Must not be called from within the handler's own callbacks, which
    /// already hold the handler mutably.
    pub fn handler(&self) -> Ref<'_, H> {
        self.handler.borrow()
    }

    /// Exclusive view of the embedded handler state, for configuration
    /// between cycles.
    pub fn handler_mut(&self) -> RefMut<'_, H> {
        self.handler.borrow_mut()
    }

    /// One pass of the interpreter, under the busy flag.
    fn pass(&self) {
        if self.asleep.get() || self.busy.get() {
            return;
        }
        let table = match self.table.borrow().clone() {
            Some(table) => table,
            None => return,
        };
        self.busy.set(true);
        self.cycles.set(self.cycles.get() + 1);

        if let Some(next) = self.next.get() {
            self.act(ON_SWITCH);
            self.emit_trace(&table, next);
            if let Some(current) = self.current.get() {
                self.act(table.on_exit(current));
            }
            self.current.set(Some(next));
            self.next.set(None);
            self.entered_at.set(self.clock.now());
            self.act(table.on_enter(next));
            self.asleep.set(table.on_loop(next) == SLEEP);
            self.cycles.set(0);
        }

        let current = match self.current.get() {
            Some(current) => current,
            None => {
                self.busy.set(false);
                return;
            }
        };
        self.act(table.on_loop(current));
        for column in 0..=table.events() {
            let target = table.destination(current, column);
            if target == NONE {
                continue;
            }
            let eligible = column == table.events()
                || self.handler.borrow_mut().event(self, column)
                || self.forced.get() == Some(column);
            if eligible {
                self.set_state(target as usize);
                self.last_trigger.set(Some(column));
                self.forced.set(None);
                break;
            }
        }
        self.busy.set(false);
    }

    /// Dispatch one action id to the handler; [`NONE`] cells are skipped,
    /// reserved ids pass through.
    fn act(&self, id: TableCell) {
        if id != NONE {
            self.handler.borrow_mut().action(self, id);
        }
    }

    fn emit_trace(&self, table: &StateTable, next: usize) {
        let mut slot = self.trace.borrow_mut();
        let Some(trace) = slot.as_mut() else {
            return;
        };
        let symbols = trace.symbols;
        let events = table.events();
        let frame = TraceFrame {
            timestamp: Utc::now(),
            label: symbols.label(),
            from: symbols.state_name(self.current.get(), events),
            to: symbols.state_name(Some(next), events),
            trigger: symbols.event_name(self.last_trigger.get()),
            elapsed_ms: self.time_in_state(),
            cycles: self.cycles.get(),
        };
        let _ = (trace.format)(trace.sink.as_mut(), &frame);
    }
}

impl<H: Handler> Component for Machine<H> {
    fn cycle(&self) {
        Machine::cycle(self);
    }

    fn trigger(&self, event: usize) {
        Machine::trigger(self, event);
    }

    fn state(&self) -> TableCell {
        Machine::state(self)
    }

    fn asleep(&self) -> bool {
        Machine::asleep(self)
    }

    fn busy(&self) -> bool {
        self.busy.get()
    }
}
