//! Clocks and the passive expiry primitives machines embed.
//!
//! The runtime never reads a [`Timer`] or [`Counter`] itself; concrete
//! machines embed them and consult them from their event predicates. The
//! wall clock is an interface so tests and simulations can drive time
//! explicitly.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic millisecond clock consumed by machines and the appliance.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now(&self) -> u64;
}

/// Real wall clock, measured from the moment it is created.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for tests and simulations.
///
/// Time only moves when [`advance`](ManualClock::advance) is called, unless
/// a per-reading step is configured with [`stepping`](ManualClock::stepping),
/// which makes busy-wait loops such as `cycle_for` and `Appliance::run`
/// terminate deterministically.
pub struct ManualClock {
    now: Cell<u64>,
    step: u64,
}

impl ManualClock {
    /// A clock stuck at zero until advanced.
    pub fn new() -> Rc<Self> {
        Rc::new(ManualClock {
            now: Cell::new(0),
            step: 0,
        })
    }

    /// A clock that advances by `step` ms on every reading.
    pub fn stepping(step: u64) -> Rc<Self> {
        Rc::new(ManualClock {
            now: Cell::new(0),
            step,
        })
    }

    /// Move time forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Millisecond countdown consulted against time spent in the current state.
///
/// A timer set to [`off`](Timer::off) never expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timer {
    value: Option<u64>,
}

impl Timer {
    /// A timer that never expires.
    pub fn off() -> Self {
        Timer { value: None }
    }

    pub fn new(ms: u64) -> Self {
        Timer { value: Some(ms) }
    }

    pub fn set(&mut self, ms: u64) {
        self.value = Some(ms);
    }

    /// True once `elapsed` ms (typically `Machine::time_in_state`) have
    /// passed; always false when off.
    pub fn expired(&self, elapsed: u64) -> bool {
        match self.value {
            None => false,
            Some(ms) => elapsed >= ms,
        }
    }
}

/// Discrete countdown.
///
/// A counter set to [`off`](Counter::off) never decrements and never
/// expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counter {
    value: Option<u32>,
}

impl Counter {
    /// A counter that never expires.
    pub fn off() -> Self {
        Counter { value: None }
    }

    pub fn new(count: u32) -> Self {
        Counter { value: Some(count) }
    }

    pub fn set(&mut self, count: u32) {
        self.value = Some(count);
    }

    /// Decrement and return the new value; a no-op returning 0 when the
    /// counter is off or already at zero.
    pub fn decrement(&mut self) -> u32 {
        match self.value {
            Some(v) if v > 0 => {
                self.value = Some(v - 1);
                v - 1
            }
            _ => 0,
        }
    }

    /// True exactly at zero; false when off or still counting.
    pub fn expired(&self) -> bool {
        self.value == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_timer_never_expires() {
        let timer = Timer::off();
        assert!(!timer.expired(0));
        assert!(!timer.expired(u64::MAX));
    }

    #[test]
    fn timer_expires_at_its_duration() {
        let timer = Timer::new(500);
        assert!(!timer.expired(0));
        assert!(!timer.expired(499));
        assert!(timer.expired(500));
        assert!(timer.expired(501));
    }

    #[test]
    fn counter_counts_down_and_stops_at_zero() {
        let mut counter = Counter::new(2);
        assert!(!counter.expired());
        assert_eq!(counter.decrement(), 1);
        assert!(!counter.expired());
        assert_eq!(counter.decrement(), 0);
        assert!(counter.expired());
        assert_eq!(counter.decrement(), 0);
        assert!(counter.expired());
    }

    #[test]
    fn off_counter_never_decrements_or_expires() {
        let mut counter = Counter::off();
        assert_eq!(counter.decrement(), 0);
        assert!(!counter.expired());
    }

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), 0);
        clock.advance(25);
        assert_eq!(clock.now(), 25);
    }

    #[test]
    fn stepping_clock_advances_per_reading() {
        let clock = ManualClock::stepping(10);
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.now(), 10);
        assert_eq!(clock.now(), 20);
    }

    #[test]
    fn timers_round_trip_through_serde() {
        let timer = Timer::new(750);
        let json = serde_json::to_string(&timer).unwrap();
        let back: Timer = serde_json::from_str(&json).unwrap();
        assert_eq!(timer, back);
    }
}
