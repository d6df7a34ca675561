//! Example: Watching live field I/O
//!
//! Run with: cargo run --example field_status -- 10.0.100.10
//!
//! This example demonstrates:
//! - Starting the poll loop on its own thread
//! - Subscribing to change notifications
//! - Reading the logical accessors after each change

use std::sync::Arc;
use std::thread;

use field_plc::{FieldConfig, FieldEngine, FieldIo};

fn main() {
    env_logger::init();

    let address = std::env::args().nth(1);
    let field = Arc::new(FieldEngine::new(FieldConfig::default()));
    match address.as_deref() {
        Some(addr) => {
            println!("Polling field controller at {addr}");
            field.set_address(Some(addr));
        }
        None => println!("No address given; running in simulated mode"),
    }

    let poller = field.clone();
    thread::spawn(move || poller.run());

    println!("Inputs:    {:?}", field.input_names());
    println!("Coils:     {:?}", field.coil_names());
    println!("Registers: {:?}", field.register_names());

    let changes = field.subscribe();
    while let Ok(snapshot) = changes.recv() {
        let (red_estops, blue_estops) = field.team_estops();
        let (red_links, blue_links) = field.network_links();
        println!(
            "healthy={} fieldEstop={} redEstops={red_estops:?} blueEstops={blue_estops:?} \
             redLinks={red_links:?} blueLinks={blue_links:?}",
            field.is_healthy(),
            field.field_estop(),
        );
        for (module, connected) in field.module_statuses() {
            if !connected {
                println!("  module {module} disconnected");
            }
        }
        println!("  raw: {}", serde_json::to_string(&snapshot).unwrap());
    }
}
