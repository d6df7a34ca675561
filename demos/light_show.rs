//! Example: Driving field lights from the cycle counter
//!
//! Run with: cargo run --example light_show -- 10.0.100.10
//!
//! This example demonstrates:
//! - Staging coil values from an external thread
//! - Deriving flash patterns with cycle_state
//! - The match-reset pulse

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use field_plc::{FieldConfig, FieldEngine, FieldIo};

fn main() {
    env_logger::init();

    let field = Arc::new(FieldEngine::new(FieldConfig::default()));
    field.set_address(std::env::args().nth(1).as_deref());

    let poller = field.clone();
    thread::spawn(move || poller.run());

    field.reset_match();
    println!("Match reset pulsed; flashing lights (ctrl-c to stop)");

    loop {
        // Two-phase flash, 5 cycles per phase: alternate the alliance light
        // strings, and sweep the stack colors on a slower 4-phase pattern.
        let phase = field.cycle_state(2, 0, 5);
        field.set_alliance_lights([phase; 3], [!phase; 3]);
        field.set_stack_lights(
            field.cycle_state(4, 0, 10),
            field.cycle_state(4, 1, 10),
            field.cycle_state(4, 2, 10),
            field.cycle_state(4, 3, 10),
        );
        field.set_field_reset_light(phase);
        thread::sleep(Duration::from_millis(50));
    }
}
