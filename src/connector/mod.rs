//! Directed signal links between machines.
//!
//! A [`Connector`] decouples a signal source from its observer: the owning
//! machine pushes values out (or pulls them in) without knowing whether the
//! far end is a plain callback or another machine. Exactly one backend is
//! active at a time; any setter replaces the previous backend and metadata
//! atomically.

use crate::machine::Component;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Push callback: `(discriminator, value, rising_edge)`.
pub type PushFn = Box<dyn FnMut(i32, i32, bool)>;

/// Pull callback: `discriminator -> value`.
pub type PullFn = Box<dyn FnMut(i32) -> i32>;

/// Logical-combination tag carried for composite-condition consumers.
///
/// Not interpreted by the connector itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogOp {
    #[default]
    Or,
    And,
}

/// Relational-comparison tag carried for composite-condition consumers.
///
/// Not interpreted by the connector itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RelOp {
    #[default]
    Eq,
    Less,
    Greater,
}

/// The active backend kind, for introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectorKind {
    Push,
    Pull,
    Link,
}

enum Backend {
    Push { callback: PushFn, idx: i32 },
    Pull { callback: PullFn, idx: i32 },
    Link { machine: Rc<dyn Component>, event: usize },
}

/// A directed signal link with a push-callback, pull-callback or
/// machine-link backend.
///
/// # Example
///
/// ```rust
/// use reflex::connector::Connector;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = seen.clone();
///
/// let mut on_change = Connector::new();
/// on_change.set_push(move |idx, v, up| sink.borrow_mut().push((idx, v, up)), 3);
///
/// assert!(on_change.push(42, false, false));
/// assert_eq!(*seen.borrow(), vec![(3, 42, false)]);
/// ```
#[derive(Default)]
pub struct Connector {
    backend: Option<Backend>,
    log_op: LogOp,
    rel_op: RelOp,
}

impl Connector {
    /// An unconfigured connector: pushes fail, pulls return the default.
    pub fn new() -> Self {
        Connector::default()
    }

    /// Configure as a push callback with discriminator `idx`.
    pub fn set_push(&mut self, callback: impl FnMut(i32, i32, bool) + 'static, idx: i32) {
        self.backend = Some(Backend::Push {
            callback: Box::new(callback),
            idx,
        });
        self.log_op = LogOp::default();
        self.rel_op = RelOp::default();
    }

    /// Configure as a pull callback with discriminator `idx`.
    pub fn set_pull(&mut self, callback: impl FnMut(i32) -> i32 + 'static, idx: i32) {
        self.backend = Some(Backend::Pull {
            callback: Box::new(callback),
            idx,
        });
        self.log_op = LogOp::default();
        self.rel_op = RelOp::default();
    }

    /// Configure as a link that triggers `event` on `machine`.
    pub fn set_machine(&mut self, machine: Rc<dyn Component>, event: usize) {
        self.backend = Some(Backend::Link { machine, event });
        self.log_op = LogOp::default();
        self.rel_op = RelOp::default();
    }

    /// Attach composite-condition metadata to the current configuration.
    pub fn set_ops(&mut self, log_op: LogOp, rel_op: RelOp) {
        self.log_op = log_op;
        self.rel_op = rel_op;
    }

    /// Push a value out through the connector.
    ///
    /// A push backend invokes its callback with `(idx, value, up)` and
    /// reports success, unless `no_callback` is set: then nothing happens
    /// and the push reports failure, which lets a fan-out source address
    /// only the machine-link subset of its targets. A machine link triggers
    /// its event and reports success. A pull-only or unconfigured connector
    /// reports failure.
    pub fn push(&mut self, value: i32, up: bool, no_callback: bool) -> bool {
        match &mut self.backend {
            Some(Backend::Push { callback, idx }) => {
                if no_callback {
                    return false;
                }
                callback(*idx, value, up);
                true
            }
            Some(Backend::Link { machine, event }) => {
                machine.trigger(*event);
                true
            }
            _ => false,
        }
    }

    /// Pull a value in through the connector.
    ///
    /// A pull backend returns its callback's result, a machine link returns
    /// the linked machine's state value, anything else returns `default`.
    /// `value` and `up` are accepted for symmetry with [`push`]
    /// (composite consumers address mixed connector sets uniformly) and are
    /// not forwarded.
    pub fn pull(&mut self, _value: i32, _up: bool, default: i32) -> i32 {
        match &mut self.backend {
            Some(Backend::Pull { callback, idx }) => callback(*idx),
            Some(Backend::Link { machine, .. }) => i32::from(machine.state()),
            _ => default,
        }
    }

    /// The stored logical-combination tag.
    pub fn log_op(&self) -> LogOp {
        self.log_op
    }

    /// The stored relational-comparison tag.
    pub fn rel_op(&self) -> RelOp {
        self.rel_op
    }

    /// The active backend kind, if any.
    pub fn kind(&self) -> Option<ConnectorKind> {
        match self.backend {
            Some(Backend::Push { .. }) => Some(ConnectorKind::Push),
            Some(Backend::Pull { .. }) => Some(ConnectorKind::Pull),
            Some(Backend::Link { .. }) => Some(ConnectorKind::Link),
            None => None,
        }
    }

    pub fn connected(&self) -> bool {
        self.backend.is_some()
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("kind", &self.kind())
            .field("log_op", &self.log_op)
            .field("rel_op", &self.rel_op)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Handler, Machine};
    use crate::table::{Cell, StateTableBuilder, NONE, SLEEP};
    use std::cell::RefCell;

    #[test]
    fn push_callback_receives_idx_value_and_edge() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut connector = Connector::new();
        connector.set_push(move |idx, v, up| sink.borrow_mut().push((idx, v, up)), 7);

        assert!(connector.push(42, false, false));
        assert!(connector.push(-1, true, false));
        assert_eq!(*seen.borrow(), vec![(7, 42, false), (7, -1, true)]);
    }

    #[test]
    fn suppressed_push_skips_the_callback_and_fails() {
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let mut connector = Connector::new();
        connector.set_push(move |_, _, _| *counter.borrow_mut() += 1, 0);

        assert!(!connector.push(42, false, true));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn unconfigured_or_pull_only_push_fails() {
        let mut connector = Connector::new();
        assert!(!connector.push(1, false, false));

        connector.set_pull(|_| 0, 0);
        assert!(!connector.push(1, false, false));
    }

    #[test]
    fn pull_returns_callback_result_or_default() {
        let mut connector = Connector::new();
        assert_eq!(connector.pull(0, false, 99), 99);

        connector.set_pull(|idx| idx * 2, 21);
        assert_eq!(connector.pull(0, false, 99), 42);
    }

    struct Inert;
    impl Handler for Inert {
        fn event(&mut self, _m: &Machine<Self>, _id: usize) -> bool {
            false
        }
        fn action(&mut self, _m: &Machine<Self>, _id: Cell) {}
    }

    fn linked_machine() -> Rc<Machine<Inert>> {
        let table = StateTableBuilder::new(1)
            .state(NONE, SLEEP, NONE, &[1, NONE])
            .state(NONE, SLEEP, NONE, &[NONE, NONE])
            .build()
            .unwrap();
        let machine = Rc::new(Machine::new(Inert));
        machine.begin(table);
        machine.cycle();
        machine
    }

    #[test]
    fn machine_link_push_triggers_the_event() {
        let machine = linked_machine();
        let mut connector = Connector::new();
        connector.set_machine(machine.clone(), 0);

        assert_eq!(machine.state(), 0);
        assert!(connector.push(0, false, false));
        assert_eq!(machine.state(), 1);
    }

    #[test]
    fn machine_link_pull_reads_the_state() {
        let machine = linked_machine();
        let mut connector = Connector::new();
        connector.set_machine(machine.clone(), 0);

        assert_eq!(connector.pull(0, false, -7), 0);
        machine.trigger(0);
        assert_eq!(connector.pull(0, false, -7), 1);
    }

    #[test]
    fn machine_link_push_ignores_the_no_callback_flag() {
        let machine = linked_machine();
        let mut connector = Connector::new();
        connector.set_machine(machine.clone(), 0);

        assert!(connector.push(0, false, true));
        assert_eq!(machine.state(), 1);
    }

    #[test]
    fn reconfiguring_replaces_backend_and_metadata() {
        let mut connector = Connector::new();
        connector.set_pull(|_| 1, 0);
        connector.set_ops(LogOp::And, RelOp::Greater);
        assert_eq!(connector.kind(), Some(ConnectorKind::Pull));

        connector.set_push(|_, _, _| {}, 0);
        assert_eq!(connector.kind(), Some(ConnectorKind::Push));
        assert_eq!(connector.log_op(), LogOp::Or);
        assert_eq!(connector.rel_op(), RelOp::Eq);
        assert_eq!(connector.pull(0, false, 5), 5);
    }
}
