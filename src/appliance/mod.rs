//! The cooperative round-robin scheduler.
//!
//! An [`Appliance`] holds a registry of machines and drives them from one
//! polling loop: each walk gives every non-dormant, non-busy machine
//! exactly one cycle. The registry never owns machine behavior beyond the
//! [`Component`] facade and entries are never removed.

use crate::machine::Component;
use crate::timing::{Clock, SystemClock};
use std::rc::Rc;

/// Cooperative scheduler over a registry of machines.
///
/// Machines are visited in reverse registration order: the most recently
/// registered machine runs first in every walk.
///
/// # Example
///
/// ```rust,no_run
/// use reflex::appliance::Appliance;
/// # use reflex::machine::{Handler, Machine};
/// # use reflex::table::{Cell, StateTableBuilder, NONE};
/// # struct Inert;
/// # impl Handler for Inert {
/// #     fn event(&mut self, _m: &Machine<Self>, _id: usize) -> bool { false }
/// #     fn action(&mut self, _m: &Machine<Self>, _id: Cell) {}
/// # }
/// # let table = StateTableBuilder::new(0).state(NONE, NONE, NONE, &[NONE]).build().unwrap();
/// # let led = std::rc::Rc::new(Machine::new(Inert));
/// # led.begin(table);
///
/// let mut app = Appliance::new();
/// app.component(led.clone());
/// app.run(0);      // exactly one walk
/// app.run(1000);   // keep walking for a second
/// ```
pub struct Appliance {
    inventory: Vec<Rc<dyn Component>>,
    clock: Rc<dyn Clock>,
}

impl Appliance {
    /// An empty appliance on the real wall clock.
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock::new()))
    }

    /// An empty appliance with an explicit clock source.
    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Appliance {
            inventory: Vec::new(),
            clock,
        }
    }

    /// Register a machine. Registration order is significant: later
    /// registrations run earlier in each walk. Registering the same
    /// machine twice is not checked and cycles it twice per walk.
    pub fn component(&mut self, machine: Rc<dyn Component>) -> &mut Self {
        log::debug!("component registered (#{})", self.inventory.len());
        self.inventory.push(machine);
        self
    }

    /// Number of registered machines.
    pub fn components(&self) -> usize {
        self.inventory.len()
    }

    /// Walk the registry, cycling every non-dormant, non-busy machine
    /// once per walk. One walk when `ms` is 0, otherwise walks repeat
    /// until `ms` of clock time has elapsed. Re-entering `run` from within
    /// an action is not guarded against.
    pub fn run(&self, ms: u64) -> &Self {
        let start = self.clock.now();
        loop {
            for machine in self.inventory.iter().rev() {
                if !machine.asleep() && !machine.busy() {
                    machine.cycle();
                }
            }
            if self.clock.now().saturating_sub(start) >= ms {
                break;
            }
        }
        self
    }
}

impl Default for Appliance {
    fn default() -> Self {
        Self::new()
    }
}
