//! A cyclic traffic light scheduled by an appliance.
//!
//! Each color holds for its own duration, then the catch-all timer event
//! advances the cycle. A trace hook prints every committed transition.
//!
//! Run with: cargo run --example traffic_light

use reflex::machine::{write_trace, Handler, Machine, Symbols};
use reflex::table::{Cell, StateTableBuilder, NONE};
use reflex::timing::Timer;
use reflex::Appliance;
use std::rc::Rc;
use std::time::Instant;

const RED: usize = 0;
const GREEN: usize = 1;
const YELLOW: usize = 2;

const EVT_TIMER: usize = 0;

struct TrafficLight {
    hold: [Timer; 3],
}

impl Handler for TrafficLight {
    fn event(&mut self, m: &Machine<Self>, id: usize) -> bool {
        let state = m.state();
        id == EVT_TIMER && state >= 0 && self.hold[state as usize].expired(m.time_in_state())
    }

    fn action(&mut self, _m: &Machine<Self>, _id: Cell) {}
}

fn main() {
    let table = StateTableBuilder::new(1)
        .state(NONE, NONE, NONE, &[GREEN as Cell, NONE])
        .state(NONE, NONE, NONE, &[YELLOW as Cell, NONE])
        .state(NONE, NONE, NONE, &[RED as Cell, NONE])
        .build()
        .expect("traffic light table is well-formed");

    let light = Rc::new(Machine::new(TrafficLight {
        hold: [Timer::new(400), Timer::new(300), Timer::new(150)],
    }));
    light.begin(table);
    light.set_trace(
        Box::new(std::io::stdout()),
        write_trace,
        Symbols::new("LIGHT\0EVT_TIMER\0ELSE\0RED\0GREEN\0YELLOW"),
    );

    let mut app = Appliance::new();
    app.component(light.clone());

    println!("two seconds of traffic:");
    let start = Instant::now();
    app.run(2000);
    println!(
        "stopped on {} after {} ms",
        match light.state() as usize {
            RED => "red",
            GREEN => "green",
            _ => "yellow",
        },
        start.elapsed().as_millis()
    );
}
