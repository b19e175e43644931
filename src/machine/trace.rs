//! Transition tracing.
//!
//! A machine with a trace hook installed emits one [`TraceFrame`] per
//! committed transition. Names are resolved from a packed [`Symbols`]
//! table: id 0 is the machine label, then the event names (including the
//! catch-all) and the state names, each in declaration order, separated by
//! NUL bytes.

use chrono::{DateTime, Utc};
use std::io::{self, Write};

/// Placeholder name for an unset state or trigger.
pub const NONE_NAME: &str = "*NONE*";

/// Packed, NUL-separated symbol table for one machine type.
///
/// # Example
///
/// ```rust
/// use reflex::machine::Symbols;
///
/// let symbols = Symbols::new("LED\0EVT_TOGGLE\0ELSE\0IDLE\0ON");
/// assert_eq!(symbols.label(), "LED");
/// assert_eq!(symbols.event_name(Some(0)), "EVT_TOGGLE");
/// assert_eq!(symbols.event_name(None), "*NONE*");
/// // State names follow the label and the 2 event columns.
/// assert_eq!(symbols.state_name(Some(1), 1), "ON");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Symbols {
    packed: &'static str,
}

impl Symbols {
    pub fn new(packed: &'static str) -> Self {
        Symbols { packed }
    }

    /// The machine type label (symbol 0).
    pub fn label(&self) -> &'static str {
        self.lookup(0)
    }

    /// Resolve an event column index, `None` mapping to [`NONE_NAME`].
    /// The catch-all column resolves to its own name (conventionally
    /// `ELSE`).
    pub fn event_name(&self, event: Option<usize>) -> &'static str {
        match event {
            Some(event) => self.lookup(event + 1),
            None => NONE_NAME,
        }
    }

    /// Resolve a state id, `None` mapping to [`NONE_NAME`]. State names
    /// start after the label and the `events + 1` event names.
    pub fn state_name(&self, state: Option<usize>, events: usize) -> &'static str {
        match state {
            Some(state) => self.lookup(events + 2 + state),
            None => NONE_NAME,
        }
    }

    fn lookup(&self, id: usize) -> &'static str {
        self.packed.split('\0').nth(id).unwrap_or(NONE_NAME)
    }
}

/// One committed transition, as handed to the trace formatter.
#[derive(Debug)]
pub struct TraceFrame<'a> {
    /// Wall time at the commit.
    pub timestamp: DateTime<Utc>,
    /// Machine type label.
    pub label: &'a str,
    /// Name of the state being left ([`NONE_NAME`] on the initial entry).
    pub from: &'a str,
    /// Name of the state being entered.
    pub to: &'a str,
    /// Name of the event that requested the transition.
    pub trigger: &'a str,
    /// Milliseconds spent in the previous state.
    pub elapsed_ms: u64,
    /// Interpreter passes spent in the previous state.
    pub cycles: u32,
}

/// Formatter invoked for every trace frame.
pub type TraceFormatter = fn(&mut dyn Write, &TraceFrame) -> io::Result<()>;

/// Default single-line formatter.
pub fn write_trace(out: &mut dyn Write, frame: &TraceFrame) -> io::Result<()> {
    writeln!(
        out,
        "{} {} {} -> {} on {} ({} ms, {} cycles)",
        frame.timestamp.format("%H:%M:%S%.3f"),
        frame.label,
        frame.from,
        frame.to,
        frame.trigger,
        frame.elapsed_ms,
        frame.cycles
    )
}

pub(super) struct Trace {
    pub(super) sink: Box<dyn Write>,
    pub(super) format: TraceFormatter,
    pub(super) symbols: Symbols,
}
