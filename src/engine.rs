//! Cyclic poll engine for the field controller.
//!
//! This module provides the [`FieldIo`] trait - the narrow surface the rest
//! of the event software consumes - and [`FieldEngine`], the generic
//! implementation that polls a controller over Modbus TCP on a fixed period.
//!
//! # State machine
//!
//! The engine is always in one of four states:
//!
//! - **Disabled**: no address configured. Health is false, but the loop
//!   keeps cycling against the simulated snapshot so dependent logic runs
//!   without hardware attached.
//! - **Disconnected**: address configured, no live session. Each loop
//!   iteration attempts to connect; failures sleep out the retry interval.
//! - **Connected, healthy**: the last full cycle (write coils, read inputs,
//!   read registers) succeeded and the pin mapping is valid.
//! - **Connected, unhealthy**: an operation failed mid-cycle. The session is
//!   torn down immediately and the next iteration reconnects.
//!
//! # Cycle ordering
//!
//! Within a cycle, the coil write always precedes the input and register
//! reads, so an output commanded before the cycle is on the wire before that
//! cycle's inputs are sampled. The heartbeat coil is asserted before every
//! write; the controller's own watchdog fails outputs safe if the heartbeat
//! stops arriving.
//!
//! Each cycle sleeps until the next period boundary measured from the cycle
//! start, so slow I/O does not accumulate drift.
//!
//! # Example
//!
//! ```no_run
//! use field_plc::{FieldConfig, FieldEngine, FieldIo};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let engine = Arc::new(FieldEngine::new(FieldConfig::default()));
//! engine.set_address(Some("10.0.100.10"));
//!
//! let poller = engine.clone();
//! thread::spawn(move || poller.run());
//!
//! let changes = engine.subscribe();
//! while let Ok(snapshot) = changes.recv() {
//!     println!("field E-stop: {}", engine.field_estop());
//!     let _ = snapshot;
//! }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use strum::IntoEnumIterator;

use crate::client::ModbusClient;
use crate::error::Result;
use crate::mbap::MODBUS_PORT;
use crate::notifier::ChangeNotifier;
use crate::pinmap::PinMap;
use crate::snapshot::IoSnapshot;
use crate::tags::{
    coil_names, input_names, register_names, Coil, Input, IoModule, Register, INPUT_COUNT,
    REGISTER_COUNT, STATIONS_PER_ALLIANCE,
};

/// Modulus of the bounded cycle counter driving flash patterns.
const CYCLE_COUNTER_MAX: u32 = 100;

/// Write cycles the match-reset coil stays asserted before it self-clears.
const MATCH_RESET_PULSE_CYCLES: u32 = 5;

/// Timing and transport configuration for a [`FieldEngine`].
///
/// Defaults are the production values; tests compress them.
///
/// # Example
///
/// ```
/// use field_plc::FieldConfig;
/// use std::time::Duration;
///
/// let config = FieldConfig::default().with_timeout(Duration::from_millis(500));
/// assert_eq!(config.loop_period, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct FieldConfig {
    /// TCP port appended when the configured address carries none.
    pub port: u16,
    /// Connect and per-operation I/O timeout.
    pub timeout: Duration,
    /// Fixed poll period, measured from cycle start.
    pub loop_period: Duration,
    /// Sleep between failed connection attempts.
    pub retry_interval: Duration,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            port: MODBUS_PORT,
            timeout: Duration::from_secs(1),
            loop_period: Duration::from_millis(100),
            retry_interval: Duration::from_secs(3),
        }
    }
}

impl FieldConfig {
    /// Sets a custom transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a custom poll period.
    pub fn with_loop_period(mut self, period: Duration) -> Self {
        self.loop_period = period;
        self
    }

    /// Sets a custom reconnect interval.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Sets a custom default port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// The field I/O surface consumed by the rest of the event software.
///
/// Implemented by [`FieldEngine`] and by hardware-generation wrappers such
/// as [`CompactFieldIo`](crate::CompactFieldIo); callers hold an
/// `Arc<dyn FieldIo>` and never care which generation is cabled up.
///
/// E-stop and A-stop accessors report `true` when the stop is **active**,
/// with the wire-level inversion already applied.
pub trait FieldIo: Send + Sync {
    /// Configures the controller address, or clears it to enter simulated
    /// mode. Takes effect on the next loop iteration; a live session to the
    /// previous address is torn down.
    fn set_address(&self, address: Option<&str>);

    /// Whether an address is configured.
    fn is_enabled(&self) -> bool;

    /// Whether the last cycle's I/O succeeded and the pin mapping is valid.
    fn is_healthy(&self) -> bool;

    /// Registers a subscriber that receives a full snapshot after every
    /// cycle in which any input, register, or coil changed.
    fn subscribe(&self) -> flume::Receiver<IoSnapshot>;

    /// Returns a point-in-time copy of the current snapshot.
    fn snapshot(&self) -> IoSnapshot;

    /// Runs the poll loop. Blocks forever; spawn it on its own thread.
    fn run(&self);

    /// Connectivity of the I/O sub-modules, by diagnostic name.
    fn module_statuses(&self) -> HashMap<String, bool>;

    /// Whether the field-level emergency stop is active.
    fn field_estop(&self) -> bool;

    /// Per-station emergency stops, red then blue, `true` = active.
    fn team_estops(&self) -> (
        [bool; STATIONS_PER_ALLIANCE],
        [bool; STATIONS_PER_ALLIANCE],
    );

    /// Per-station autonomous stops, red then blue, `true` = active.
    fn team_astops(&self) -> (
        [bool; STATIONS_PER_ALLIANCE],
        [bool; STATIONS_PER_ALLIANCE],
    );

    /// Per-station Ethernet link presence, red then blue.
    fn network_links(&self) -> (
        [bool; STATIONS_PER_ALLIANCE],
        [bool; STATIONS_PER_ALLIANCE],
    );

    /// Current scored-element counters, red then blue.
    fn goal_counts(&self) -> (u16, u16);

    /// Pulses the match-reset coil and zeroes all volatile registers so
    /// stale values from pre-match testing never leak into a new match.
    fn reset_match(&self);

    /// Sets the scoring-table stack lights.
    fn set_stack_lights(&self, red: bool, blue: bool, orange: bool, green: bool);

    /// Sets the match-ready chime.
    fn set_stack_buzzer(&self, on: bool);

    /// Sets the field reset lamp.
    fn set_field_reset_light(&self, on: bool);

    /// Sets the per-alliance indicator lights, outer to inner.
    fn set_alliance_lights(&self, red: [bool; 3], blue: [bool; 3]);

    /// Derives a repeating on/off pattern from the cycle counter: `true`
    /// while the counter, divided into `duration`-cycle phases, sits on
    /// phase `index` of `period`. Callers build flash patterns from this
    /// without the engine knowing any light semantics.
    fn cycle_state(&self, period: u32, index: u32, duration: u32) -> bool;

    /// Diagnostic names of all discrete inputs.
    fn input_names(&self) -> Vec<&'static str>;

    /// Diagnostic names of all registers.
    fn register_names(&self) -> Vec<&'static str>;

    /// Diagnostic names of all coils.
    fn coil_names(&self) -> Vec<&'static str>;
}

struct EngineState {
    address: Option<String>,
    snapshot: IoSnapshot,
    previous: IoSnapshot,
    cycle_counter: u32,
    match_reset_cycles: u32,
}

/// Generic poll/retry/health engine over a Modbus TCP field controller.
///
/// One engine owns one controller. The snapshot is mutated only by the poll
/// loop; callers stage logical coil values through the mutators and read
/// point-in-time copies, never the live arrays.
pub struct FieldEngine {
    config: FieldConfig,
    pin_map: PinMap,
    mappings_valid: bool,
    io_healthy: AtomicBool,
    reconnect: AtomicBool,
    notifier: ChangeNotifier<IoSnapshot>,
    state: Mutex<EngineState>,
}

impl FieldEngine {
    /// Creates an engine with the default 1:1 pin mapping.
    pub fn new(config: FieldConfig) -> Self {
        Self::build(PinMap::identity(), true, config)
    }

    /// Creates an engine with device-specific wiring tables.
    ///
    /// Invalid tables do not fail construction: the defect is logged once,
    /// the engine falls back to the identity layout so resolution stays in
    /// range, and [`is_healthy`](FieldIo::is_healthy) reports `false` for
    /// the lifetime of the instance. The engine keeps running either way -
    /// physical field safety circuits do not depend on software health.
    pub fn with_pin_tables(
        config: FieldConfig,
        inputs: &[(Input, usize)],
        coils: &[(Coil, usize)],
    ) -> Self {
        match PinMap::from_tables(inputs, coils) {
            Ok(pin_map) => Self::build(pin_map, true, config),
            Err(e) => {
                error!("field controller pin mapping rejected, health pinned false: {e}");
                Self::build(PinMap::identity(), false, config)
            }
        }
    }

    fn build(pin_map: PinMap, mappings_valid: bool, config: FieldConfig) -> Self {
        let mut snapshot = IoSnapshot::default();
        // Seed the simulated snapshot at each channel's resting wire level
        // so accessors read "not active" before any hardware is polled.
        for input in Input::iter() {
            snapshot.inputs[pin_map.input_pin(input)] = input.active_low();
        }

        Self {
            config,
            pin_map,
            mappings_valid,
            io_healthy: AtomicBool::new(false),
            reconnect: AtomicBool::new(false),
            notifier: ChangeNotifier::new(),
            state: Mutex::new(EngineState {
                address: None,
                snapshot,
                previous: snapshot,
                cycle_counter: 0,
                match_reset_cycles: 0,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().expect("engine state poisoned")
    }

    fn address(&self) -> Option<String> {
        self.lock_state().address.clone()
    }

    /// Opens a session and pushes the current coil state, so outputs reach
    /// the controller even when no change triggers them.
    pub(crate) fn open_connection(&self, address: &str) -> Result<ModbusClient> {
        let target = if address.contains(':') {
            address.to_string()
        } else {
            format!("{address}:{}", self.config.port)
        };
        let mut client = ModbusClient::connect(target.as_str(), self.config.timeout)?;
        info!("connected to field controller at {target}");

        if let Err(e) = self.write_coils(&mut client) {
            warn!("initial coil write failed: {e}");
        }
        Ok(client)
    }

    /// Performs a single poll iteration against an optional live session.
    ///
    /// With a session, runs the write/read cycle and tears the session down
    /// on failure. Without one, the snapshot is simulated. Either way the
    /// cycle counter advances (except on a failed I/O cycle) and changes are
    /// published.
    pub(crate) fn poll_once(&self, client: &mut Option<ModbusClient>) {
        let cycle_ok = match client.as_mut() {
            Some(session) => {
                let ok = self.run_io_cycle(session);
                if !ok {
                    // Tear down rather than retry mid-cycle; the outer loop
                    // reconnects on its next iteration.
                    *client = None;
                }
                self.io_healthy.store(ok, Ordering::SeqCst);
                Some(ok)
            }
            None => {
                self.io_healthy.store(false, Ordering::SeqCst);
                None
            }
        };

        let mut state = self.lock_state();
        if cycle_ok != Some(false) {
            state.cycle_counter = (state.cycle_counter + 1) % CYCLE_COUNTER_MAX;
        }

        if state.snapshot != state.previous {
            let snapshot = state.snapshot;
            state.previous = snapshot;
            drop(state);
            self.notifier.publish(snapshot);
        }
    }

    fn run_io_cycle(&self, client: &mut ModbusClient) -> bool {
        if let Err(e) = self.write_coils(client) {
            warn!("field controller coil write failed: {e}");
            return false;
        }
        if let Err(e) = self.read_inputs(client) {
            warn!("field controller input read failed: {e}");
            return false;
        }
        if let Err(e) = self.read_registers(client) {
            warn!("field controller register read failed: {e}");
            return false;
        }
        true
    }

    fn write_coils(&self, client: &mut ModbusClient) -> Result<()> {
        let values = {
            let mut state = self.lock_state();
            // The controller watches this line to decide whether to fail
            // its outputs safe; assert it on every cycle, unconditionally.
            state.snapshot.coils[self.pin_map.coil_pin(Coil::Heartbeat)] = true;
            state.snapshot.coils
        };

        client.write_coils(&values)?;

        let mut state = self.lock_state();
        if state.match_reset_cycles > MATCH_RESET_PULSE_CYCLES {
            // The controller's reset input is edge-triggered; a short pulse
            // is all it needs.
            state.snapshot.coils[self.pin_map.coil_pin(Coil::MatchReset)] = false;
        } else {
            state.match_reset_cycles += 1;
        }
        Ok(())
    }

    fn read_inputs(&self, client: &mut ModbusClient) -> Result<()> {
        let values = client.read_discrete_inputs(INPUT_COUNT as u16)?;
        let mut state = self.lock_state();
        state.snapshot.inputs.copy_from_slice(&values);
        Ok(())
    }

    fn read_registers(&self, client: &mut ModbusClient) -> Result<()> {
        let values = client.read_holding_registers(REGISTER_COUNT as u16)?;
        let mut state = self.lock_state();
        state.snapshot.registers.copy_from_slice(&values);
        Ok(())
    }

    fn read_input(&self, state: &EngineState, input: Input) -> bool {
        state.snapshot.inputs[self.pin_map.input_pin(input)]
    }

    fn stop_states(
        &self,
        state: &EngineState,
        inputs: &[Input; STATIONS_PER_ALLIANCE],
    ) -> [bool; STATIONS_PER_ALLIANCE] {
        let mut stops = [false; STATIONS_PER_ALLIANCE];
        for (stop, &input) in stops.iter_mut().zip(inputs) {
            *stop = !self.read_input(state, input);
        }
        stops
    }

    fn set_coil(&self, state: &mut EngineState, coil: Coil, value: bool) {
        state.snapshot.coils[self.pin_map.coil_pin(coil)] = value;
    }
}

impl Default for FieldEngine {
    fn default() -> Self {
        Self::new(FieldConfig::default())
    }
}

impl FieldIo for FieldEngine {
    fn set_address(&self, address: Option<&str>) {
        let address = address.filter(|a| !a.is_empty()).map(str::to_owned);
        self.lock_state().address = address;
        // Force the loop to drop any live session and reconnect (or go
        // simulated) against the new address.
        self.reconnect.store(true, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.lock_state().address.is_some()
    }

    fn is_healthy(&self) -> bool {
        self.io_healthy.load(Ordering::SeqCst) && self.mappings_valid
    }

    fn subscribe(&self) -> flume::Receiver<IoSnapshot> {
        self.notifier.subscribe()
    }

    fn snapshot(&self) -> IoSnapshot {
        self.lock_state().snapshot
    }

    fn run(&self) {
        let mut client: Option<ModbusClient> = None;
        loop {
            if self.reconnect.swap(false, Ordering::SeqCst) {
                client = None;
            }

            if client.is_none() {
                match self.address() {
                    // Simulated mode; keep cycling without hardware.
                    None => {}
                    Some(address) => match self.open_connection(&address) {
                        Ok(session) => client = Some(session),
                        Err(e) => {
                            warn!("field controller at {address} unreachable: {e}");
                            self.io_healthy.store(false, Ordering::SeqCst);
                            thread::sleep(self.config.retry_interval);
                            continue;
                        }
                    },
                }
            }

            let start = Instant::now();
            self.poll_once(&mut client);
            if let Some(remaining) = self.config.loop_period.checked_sub(start.elapsed()) {
                thread::sleep(remaining);
            }
        }
    }

    fn module_statuses(&self) -> HashMap<String, bool> {
        let state = self.lock_state();
        let mask = state.snapshot.registers[Register::IoLinkStatus as usize];
        IoModule::iter()
            .enumerate()
            .map(|(bit, module)| {
                let name: &'static str = module.into();
                (name.to_owned(), mask & (1 << bit) != 0)
            })
            .collect()
    }

    fn field_estop(&self) -> bool {
        let state = self.lock_state();
        !self.read_input(&state, Input::FieldEstop)
    }

    fn team_estops(&self) -> (
        [bool; STATIONS_PER_ALLIANCE],
        [bool; STATIONS_PER_ALLIANCE],
    ) {
        let state = self.lock_state();
        (
            self.stop_states(&state, &Input::RED_ESTOPS),
            self.stop_states(&state, &Input::BLUE_ESTOPS),
        )
    }

    fn team_astops(&self) -> (
        [bool; STATIONS_PER_ALLIANCE],
        [bool; STATIONS_PER_ALLIANCE],
    ) {
        let state = self.lock_state();
        (
            self.stop_states(&state, &Input::RED_ASTOPS),
            self.stop_states(&state, &Input::BLUE_ASTOPS),
        )
    }

    fn network_links(&self) -> (
        [bool; STATIONS_PER_ALLIANCE],
        [bool; STATIONS_PER_ALLIANCE],
    ) {
        let state = self.lock_state();
        let mut red = [false; STATIONS_PER_ALLIANCE];
        let mut blue = [false; STATIONS_PER_ALLIANCE];
        for (link, &input) in red.iter_mut().zip(&Input::RED_LINKS) {
            *link = self.read_input(&state, input);
        }
        for (link, &input) in blue.iter_mut().zip(&Input::BLUE_LINKS) {
            *link = self.read_input(&state, input);
        }
        (red, blue)
    }

    fn goal_counts(&self) -> (u16, u16) {
        let state = self.lock_state();
        (
            state.snapshot.registers[Register::RedGoalCount as usize],
            state.snapshot.registers[Register::BlueGoalCount as usize],
        )
    }

    fn reset_match(&self) {
        let mut state = self.lock_state();
        self.set_coil(&mut state, Coil::MatchReset, true);
        state.match_reset_cycles = 0;

        // Drop volatile values left over from pre-match testing; the
        // connectivity register reflects cabling and stays.
        for register in Register::iter() {
            if !register.persistent() {
                state.snapshot.registers[register as usize] = 0;
            }
        }
    }

    fn set_stack_lights(&self, red: bool, blue: bool, orange: bool, green: bool) {
        let mut state = self.lock_state();
        self.set_coil(&mut state, Coil::StackLightRed, red);
        self.set_coil(&mut state, Coil::StackLightBlue, blue);
        self.set_coil(&mut state, Coil::StackLightOrange, orange);
        self.set_coil(&mut state, Coil::StackLightGreen, green);
    }

    fn set_stack_buzzer(&self, on: bool) {
        let mut state = self.lock_state();
        self.set_coil(&mut state, Coil::StackBuzzer, on);
    }

    fn set_field_reset_light(&self, on: bool) {
        let mut state = self.lock_state();
        self.set_coil(&mut state, Coil::FieldResetLight, on);
    }

    fn set_alliance_lights(&self, red: [bool; 3], blue: [bool; 3]) {
        let mut state = self.lock_state();
        for (&coil, &on) in Coil::RED_LIGHTS.iter().zip(&red) {
            self.set_coil(&mut state, coil, on);
        }
        for (&coil, &on) in Coil::BLUE_LIGHTS.iter().zip(&blue) {
            self.set_coil(&mut state, coil, on);
        }
    }

    fn cycle_state(&self, period: u32, index: u32, duration: u32) -> bool {
        let counter = self.lock_state().cycle_counter;
        counter / duration.max(1) % period.max(1) == index
    }

    fn input_names(&self) -> Vec<&'static str> {
        input_names()
    }

    fn register_names(&self) -> Vec<&'static str> {
        register_names()
    }

    fn coil_names(&self) -> Vec<&'static str> {
        coil_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::COIL_COUNT;
    use crate::test_support::TestSlave;
    use std::sync::Arc;

    fn test_config() -> FieldConfig {
        FieldConfig::default()
            .with_timeout(Duration::from_millis(250))
            .with_loop_period(Duration::from_millis(10))
            .with_retry_interval(Duration::from_millis(30))
    }

    fn connected_engine(slave: &TestSlave) -> (FieldEngine, Option<ModbusClient>) {
        let engine = FieldEngine::new(test_config());
        engine.set_address(Some(&slave.addr()));
        let client = engine
            .open_connection(&slave.addr())
            .expect("test slave unreachable");
        (engine, Some(client))
    }

    fn wait_for<F: Fn() -> bool>(what: &str, timeout: Duration, predicate: F) {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if predicate() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("timed out waiting for {what}");
    }

    #[test]
    fn test_disabled_engine_reads_inactive_defaults() {
        let engine = FieldEngine::new(test_config());
        let mut client = None;
        for _ in 0..3 {
            engine.poll_once(&mut client);
        }

        assert!(!engine.is_enabled());
        assert!(!engine.is_healthy());
        assert!(!engine.field_estop());
        assert_eq!(engine.team_estops(), ([false; 3], [false; 3]));
        assert_eq!(engine.team_astops(), ([false; 3], [false; 3]));
        assert_eq!(engine.network_links(), ([false; 3], [false; 3]));
        assert_eq!(engine.goal_counts(), (0, 0));
        let statuses = engine.module_statuses();
        assert_eq!(statuses.len(), 4);
        assert!(statuses.values().all(|&connected| !connected));
    }

    #[test]
    fn test_cycle_counter_advances_while_disabled() {
        let engine = FieldEngine::new(test_config());
        let mut client = None;

        // Phase 0 of a 2-phase, 5-cycle pattern.
        assert!(engine.cycle_state(2, 0, 5));
        for _ in 0..5 {
            engine.poll_once(&mut client);
        }
        assert!(engine.cycle_state(2, 1, 5));
        assert!(!engine.cycle_state(2, 0, 5));
    }

    #[test]
    fn test_cycle_counter_wraps() {
        let engine = FieldEngine::new(test_config());
        let mut client = None;
        for _ in 0..CYCLE_COUNTER_MAX {
            engine.poll_once(&mut client);
        }
        assert_eq!(engine.lock_state().cycle_counter, 0);
    }

    #[test]
    fn test_healthy_cycle_against_slave() {
        let slave = TestSlave::start(INPUT_COUNT, REGISTER_COUNT, COIL_COUNT);
        let (engine, mut client) = connected_engine(&slave);

        engine.poll_once(&mut client);
        assert!(client.is_some());
        assert!(engine.is_healthy());
        // Heartbeat must be on the wire after the first cycle.
        assert!(slave.state().coils[0]);
        assert!(slave.state().coil_writes >= 1);
    }

    #[test]
    fn test_inputs_and_registers_flow_into_accessors() {
        let slave = TestSlave::start(INPUT_COUNT, REGISTER_COUNT, COIL_COUNT);
        {
            let mut state = slave.state();
            // All stop channels at resting (high) level except red station 2
            // E-stop pressed and field E-stop pressed.
            for input in Input::iter() {
                state.discrete_inputs[input as usize] = input.active_low();
            }
            state.discrete_inputs[Input::FieldEstop as usize] = false;
            state.discrete_inputs[Input::Red2Estop as usize] = false;
            state.discrete_inputs[Input::BlueLink1 as usize] = true;
            state.holding_registers[Register::IoLinkStatus as usize] = 0b0101;
            state.holding_registers[Register::RedGoalCount as usize] = 7;
        }

        let (engine, mut client) = connected_engine(&slave);
        engine.poll_once(&mut client);

        assert!(engine.field_estop());
        let (red_estops, blue_estops) = engine.team_estops();
        assert_eq!(red_estops, [false, true, false]);
        assert_eq!(blue_estops, [false; 3]);
        let (red_links, blue_links) = engine.network_links();
        assert_eq!(red_links, [false; 3]);
        assert_eq!(blue_links, [true, false, false]);
        assert_eq!(engine.goal_counts(), (7, 0));

        let statuses = engine.module_statuses();
        assert!(statuses["RedDs"]);
        assert!(!statuses["BlueDs"]);
        assert!(statuses["RedIoLink"]);
        assert!(!statuses["BlueIoLink"]);
    }

    #[test]
    fn test_staged_coils_reach_controller_in_write_phase() {
        let slave = TestSlave::start(INPUT_COUNT, REGISTER_COUNT, COIL_COUNT);
        let (engine, mut client) = connected_engine(&slave);

        engine.set_stack_lights(true, false, false, true);
        engine.set_stack_buzzer(true);
        engine.set_alliance_lights([true, false, true], [false; 3]);
        engine.poll_once(&mut client);

        let state = slave.state();
        assert!(state.coils[Coil::StackLightRed as usize]);
        assert!(!state.coils[Coil::StackLightBlue as usize]);
        assert!(state.coils[Coil::StackLightGreen as usize]);
        assert!(state.coils[Coil::StackBuzzer as usize]);
        assert!(state.coils[Coil::RedLightOuter as usize]);
        assert!(!state.coils[Coil::RedLightMiddle as usize]);
        assert!(state.coils[Coil::RedLightInner as usize]);
    }

    #[test]
    fn test_match_reset_pulse() {
        let slave = TestSlave::start(INPUT_COUNT, REGISTER_COUNT, COIL_COUNT);
        let (engine, mut client) = connected_engine(&slave);
        {
            let mut state = engine.lock_state();
            state.snapshot.registers[Register::RedGoalCount as usize] = 12;
            state.snapshot.registers[Register::IoLinkStatus as usize] = 0b1111;
        }

        engine.reset_match();
        {
            let state = engine.lock_state();
            assert!(state.snapshot.coils[Coil::MatchReset as usize]);
            assert_eq!(state.snapshot.registers[Register::RedGoalCount as usize], 0);
            // Connectivity status is persistent across resets.
            assert_eq!(
                state.snapshot.registers[Register::IoLinkStatus as usize],
                0b1111
            );
        }

        // The pulse holds for a handful of write cycles, then self-clears
        // without further caller action.
        for _ in 0..3 {
            engine.poll_once(&mut client);
        }
        assert!(engine.snapshot().coils[Coil::MatchReset as usize]);
        for _ in 0..5 {
            engine.poll_once(&mut client);
        }
        assert!(!engine.snapshot().coils[Coil::MatchReset as usize]);
        assert!(!slave.state().coils[Coil::MatchReset as usize]);
    }

    #[test]
    fn test_notifies_once_per_changed_cycle() {
        let engine = FieldEngine::new(test_config());
        let changes = engine.subscribe();
        let mut client = None;

        // Nothing changed: no publish.
        engine.poll_once(&mut client);
        engine.poll_once(&mut client);
        assert_eq!(changes.try_iter().count(), 0);

        // Two staged changes in one cycle: exactly one publish.
        engine.set_stack_lights(true, true, false, false);
        engine.set_field_reset_light(true);
        engine.poll_once(&mut client);
        assert_eq!(changes.try_iter().count(), 1);

        // Steady state again: no publish.
        engine.poll_once(&mut client);
        assert_eq!(changes.try_iter().count(), 0);

        // Reverting is a change too.
        engine.set_field_reset_light(false);
        engine.poll_once(&mut client);
        let published: Vec<IoSnapshot> = changes.try_iter().collect();
        assert_eq!(published.len(), 1);
        assert!(!published[0].coils[Coil::FieldResetLight as usize]);
    }

    #[test]
    fn test_failed_cycle_degrades_health_and_tears_down() {
        let slave = TestSlave::start(INPUT_COUNT, REGISTER_COUNT, COIL_COUNT);
        let (engine, mut client) = connected_engine(&slave);

        engine.poll_once(&mut client);
        assert!(engine.is_healthy());

        slave.state().fail_with_exception = true;
        engine.poll_once(&mut client);
        assert!(!engine.is_healthy());
        assert!(client.is_none(), "failed cycle must drop the session");

        // Counter does not advance on a failed cycle.
        let counter = engine.lock_state().cycle_counter;
        slave.state().fail_with_exception = true;
        engine.poll_once(&mut client);
        assert_eq!(engine.lock_state().cycle_counter, counter + 1); // simulated cycle advances

        // Self-heal: reconnect and poll clean.
        slave.state().fail_with_exception = false;
        let mut client = Some(engine.open_connection(&slave.addr()).unwrap());
        engine.poll_once(&mut client);
        assert!(engine.is_healthy());
    }

    #[test]
    fn test_failed_cycle_does_not_advance_counter() {
        let slave = TestSlave::start(INPUT_COUNT, REGISTER_COUNT, COIL_COUNT);
        let (engine, mut client) = connected_engine(&slave);
        slave.state().fail_with_exception = true;

        let before = engine.lock_state().cycle_counter;
        engine.poll_once(&mut client);
        assert_eq!(engine.lock_state().cycle_counter, before);
    }

    #[test]
    fn test_invalid_mapping_pins_health_false() {
        let slave = TestSlave::start(INPUT_COUNT, REGISTER_COUNT, COIL_COUNT);
        // Input table with one entry missing.
        let mut inputs: Vec<(Input, usize)> =
            Input::iter().enumerate().map(|(i, t)| (t, i)).collect();
        inputs.pop();
        let coils: Vec<(Coil, usize)> = Coil::iter().enumerate().map(|(i, t)| (t, i)).collect();

        let engine = FieldEngine::with_pin_tables(test_config(), &inputs, &coils);
        engine.set_address(Some(&slave.addr()));
        let mut client = Some(engine.open_connection(&slave.addr()).unwrap());
        engine.poll_once(&mut client);

        // I/O succeeded, but mapping keeps health false permanently.
        assert!(client.is_some());
        assert!(!engine.is_healthy());
        // Accessors still resolve (identity fallback), no panic.
        let _ = engine.field_estop();
    }

    #[test]
    fn test_retry_until_controller_appears() {
        // Find a port with nothing listening, then start the engine's loop
        // against it. After a few failed attempts, bring the slave up on
        // that port and watch health recover.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let engine = Arc::new(FieldEngine::new(test_config()));
        engine.set_address(Some(&format!("127.0.0.1:{port}")));
        assert!(engine.is_enabled());

        let poller = engine.clone();
        thread::spawn(move || poller.run());

        // Several retry intervals pass without a controller.
        thread::sleep(Duration::from_millis(120));
        assert!(!engine.is_healthy());

        let slave = TestSlave::start_on(port, INPUT_COUNT, REGISTER_COUNT, COIL_COUNT);
        wait_for("engine to become healthy", Duration::from_secs(2), || {
            engine.is_healthy()
        });

        // The first healthy cycle carried a heartbeat write.
        assert!(slave.state().coil_writes >= 1);
        assert!(slave.state().coils[Coil::Heartbeat as usize]);
    }

    #[test]
    fn test_set_address_none_returns_to_simulated_mode() {
        let slave = TestSlave::start(INPUT_COUNT, REGISTER_COUNT, COIL_COUNT);
        let engine = Arc::new(FieldEngine::new(test_config()));
        engine.set_address(Some(&slave.addr()));

        let poller = engine.clone();
        thread::spawn(move || poller.run());
        wait_for("initial connect", Duration::from_secs(2), || {
            engine.is_healthy()
        });

        engine.set_address(None);
        wait_for("health to drop", Duration::from_secs(2), || {
            !engine.is_healthy()
        });
        assert!(!engine.is_enabled());
    }

    #[test]
    fn test_name_introspection() {
        let engine = FieldEngine::new(test_config());
        assert_eq!(engine.input_names().len(), INPUT_COUNT);
        assert_eq!(engine.coil_names().len(), COIL_COUNT);
        assert_eq!(engine.register_names().len(), REGISTER_COUNT);
        assert_eq!(engine.input_names()[0], "fieldEstop");
        assert_eq!(engine.coil_names()[0], "heartbeat");
        assert_eq!(engine.register_names()[0], "ioLinkStatus");
    }
}
