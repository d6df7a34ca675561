//! # Field PLC I/O Layer
//!
//! A Rust library for driving competition field hardware (stack lights,
//! buzzers, emergency-stop sensing) through an industrial controller over
//! Modbus TCP.
//!
//! The crate covers the field I/O layer only: the logical-to-physical pin
//! mapping, the wire-protocol client, the cyclic poll/retry/health engine,
//! and the change-notification fan-out. Match scheduling, scoring, and the
//! web UI are external consumers of the [`FieldIo`] trait.
//!
//! ## Features
//!
//! - **Fixed-period polling** - one blocking loop per engine writes coils
//!   and reads inputs/registers every cycle, measured from cycle start
//! - **Self-healing** - connection loss never crashes the process; the
//!   engine retries forever and reports health honestly
//! - **Heartbeat-backed fail-safe** - a heartbeat coil is asserted every
//!   cycle; the controller's own watchdog fails outputs safe without it
//! - **Swappable wiring** - hardware generations supply complete pin maps
//!   as data instead of subclassing behavior
//! - **Change notification** - subscribers get a full snapshot after every
//!   cycle in which anything changed, and nothing otherwise
//! - **No panics** - errors are returned as [`Result<T, FieldError>`] and
//!   logged; an invalid pin map degrades health instead of crashing
//!
//! ## Quick Start
//!
//! ```no_run
//! use field_plc::{FieldConfig, FieldEngine, FieldIo};
//! use std::sync::Arc;
//! use std::thread;
//!
//! // Build the engine and point it at the controller.
//! let field = Arc::new(FieldEngine::new(FieldConfig::default()));
//! field.set_address(Some("10.0.100.10"));
//!
//! // The poll loop runs for the process lifetime on its own thread.
//! let poller = field.clone();
//! thread::spawn(move || poller.run());
//!
//! // Stage outputs; the next cycle's write phase pushes them out.
//! field.set_stack_lights(false, false, false, true);
//!
//! // React to I/O changes.
//! let changes = field.subscribe();
//! while let Ok(snapshot) = changes.recv() {
//!     if field.field_estop() {
//!         println!("field E-stop active");
//!     }
//!     let _ = snapshot;
//! }
//! ```
//!
//! ## Hardware generations
//!
//! The generic engine uses the default 1:1 pin layout. A hardware generation
//! with different cabinet wiring wraps the engine with its own tables and
//! derivations; consumers hold an `Arc<dyn FieldIo>` and never care which
//! generation is cabled up:
//!
//! ```no_run
//! use field_plc::{CompactFieldIo, FieldConfig, FieldIo};
//! use std::sync::Arc;
//!
//! let field: Arc<dyn FieldIo> = Arc::new(CompactFieldIo::new(FieldConfig::default()));
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, FieldError>`]. The engine
//! classifies failures by recovery policy: mapping defects are permanent,
//! connection failures retry at a fixed interval, and mid-cycle I/O failures
//! tear the session down for the next iteration to rebuild. Nothing is ever
//! escalated to a process exit - the controller's watchdog is the safety
//! backstop, and this layer's job is to keep trying and report health.
//!
//! ## Wire contract
//!
//! Discrete inputs and coils travel as packed bits with address 0 in the
//! LSB of byte 0; registers are big-endian 16-bit words; every block starts
//! at address 0 and spans the full declared count; the controller is
//! addressed on port 502 with unit ID 0xFF.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
mod engine;
mod error;
mod mbap;
mod notifier;
mod pinmap;
mod request;
mod response;
mod snapshot;
mod tags;
mod transport;
pub mod utils;
mod variants;

#[cfg(test)]
mod test_support;

// Public re-exports
pub use client::ModbusClient;
pub use engine::{FieldConfig, FieldEngine, FieldIo};
pub use error::{exception_description, FieldError, Result};
pub use mbap::{MbapHeader, MBAP_HEADER_SIZE, MODBUS_PORT, UNIT_ID};
pub use notifier::ChangeNotifier;
pub use pinmap::PinMap;
pub use request::{
    ReadDiscreteInputsRequest, ReadHoldingRegistersRequest, WriteMultipleCoilsRequest,
    MAX_READ_BITS, MAX_READ_REGISTERS, MAX_WRITE_COILS,
};
pub use response::{ModbusResponse, MIN_RESPONSE_SIZE};
pub use snapshot::IoSnapshot;
pub use tags::{
    coil_names, input_names, register_names, Coil, Input, IoModule, Register, COIL_COUNT,
    INPUT_COUNT, REGISTER_COUNT, STATIONS_PER_ALLIANCE,
};
pub use transport::{TcpTransport, DEFAULT_TIMEOUT};
pub use variants::CompactFieldIo;
