//! A blinking-light sequencer in the style of a classic LED machine.
//!
//! The blinker cycles ON -> OFF a fixed number of times, then parks itself
//! dormant and pushes a "done" signal out through a connector.
//!
//! Run with: cargo run --example blinker

use reflex::connector::Connector;
use reflex::machine::{write_trace, Handler, Machine, Symbols};
use reflex::table::{Cell, StateTableBuilder, NONE, SLEEP};
use reflex::timing::{Counter, Timer};

const IDLE: usize = 0;
const ON: usize = 1;
const OFF: usize = 2;
const DONE: usize = 3;

const EVT_ON_TIMER: usize = 0;
const EVT_COUNTER: usize = 1;
const EVT_OFF_TIMER: usize = 2;
const EVT_BLINK: usize = 3;

const ACT_ON: Cell = 0;
const ACT_OFF: Cell = 1;
const ACT_DONE: Cell = 2;

struct Blinker {
    on_timer: Timer,
    off_timer: Timer,
    counter: Counter,
    repeats: u32,
    on_finish: Connector,
}

impl Blinker {
    fn new(period_ms: u64, repeats: u32) -> Self {
        Blinker {
            on_timer: Timer::new(period_ms),
            off_timer: Timer::new(period_ms),
            counter: Counter::new(repeats),
            repeats,
            on_finish: Connector::new(),
        }
    }
}

impl Handler for Blinker {
    fn event(&mut self, m: &Machine<Self>, id: usize) -> bool {
        match id {
            EVT_ON_TIMER => self.on_timer.expired(m.time_in_state()),
            EVT_OFF_TIMER => self.off_timer.expired(m.time_in_state()),
            EVT_COUNTER => self.counter.expired(),
            _ => false,
        }
    }

    fn action(&mut self, _m: &Machine<Self>, id: Cell) {
        match id {
            ACT_ON => {
                self.counter.decrement();
                println!("  * on");
            }
            ACT_OFF => println!("  . off"),
            ACT_DONE => {
                println!("  done after {} blinks", self.repeats);
                self.counter.set(self.repeats);
                self.on_finish.push(0, false, false);
            }
            _ => {}
        }
    }
}

fn blinker_table() -> reflex::StateTable {
    // ON_ENTER  ON_LOOP  ON_EXIT  ON_TIMER  COUNTER  OFF_TIMER  BLINK  ELSE
    StateTableBuilder::new(4)
        .state(NONE, SLEEP, NONE, &[NONE, NONE, NONE, ON as Cell, NONE])
        .state(ACT_ON, NONE, NONE, &[OFF as Cell, NONE, NONE, NONE, NONE])
        .state(ACT_OFF, NONE, NONE, &[NONE, DONE as Cell, ON as Cell, NONE, NONE])
        .state(ACT_DONE, SLEEP, NONE, &[NONE, NONE, NONE, ON as Cell, NONE])
        .build()
        .expect("blinker table is well-formed")
}

const SYMBOLS: &str = "BLINKER\0\
                       EVT_ON_TIMER\0EVT_COUNTER\0EVT_OFF_TIMER\0EVT_BLINK\0ELSE\0\
                       IDLE\0ON\0OFF\0DONE";

fn main() {
    let machine = Machine::new(Blinker::new(100, 3));
    machine.begin(blinker_table());
    machine.set_trace(
        Box::new(std::io::stdout()),
        write_trace,
        Symbols::new(SYMBOLS),
    );

    machine.cycle();
    assert_eq!(machine.state(), IDLE as Cell);

    println!("blinking 3 times at 100 ms:");
    machine.trigger(EVT_BLINK);
    while machine.state() != DONE as Cell {
        machine.cycle();
    }
    assert!(machine.asleep());

    // A second trigger restarts the sequence from DONE.
    println!("and again:");
    machine.trigger(EVT_BLINK);
    while machine.state() != DONE as Cell {
        machine.cycle();
    }
}
