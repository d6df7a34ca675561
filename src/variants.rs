//! Hardware-generation variants of the field controller.
//!
//! A variant composes a generic [`FieldEngine`] with its own complete wiring
//! tables and, where a generation needs it, a narrow read-side derivation
//! over the raw inputs. Variants never duplicate poll, retry, or health
//! logic - everything flows through the wrapped engine, and the rest of the
//! system consumes any generation through the [`FieldIo`] trait.

use std::collections::HashMap;

use crate::engine::{FieldConfig, FieldEngine, FieldIo};
use crate::snapshot::IoSnapshot;
use crate::tags::{Coil, Input, COIL_COUNT, INPUT_COUNT, STATIONS_PER_ALLIANCE};

/// Input wiring for the compact single-cabinet controller generation.
///
/// The input block matches the default layout, spelled out in full: variants
/// carry their complete wiring chart rather than overlaying the default.
const INPUT_WIRING: [(Input, usize); INPUT_COUNT] = [
    (Input::FieldEstop, 0),
    (Input::Red1Estop, 1),
    (Input::Red1Astop, 2),
    (Input::Red2Estop, 3),
    (Input::Red2Astop, 4),
    (Input::Red3Estop, 5),
    (Input::Red3Astop, 6),
    (Input::Blue1Estop, 7),
    (Input::Blue1Astop, 8),
    (Input::Blue2Estop, 9),
    (Input::Blue2Astop, 10),
    (Input::Blue3Estop, 11),
    (Input::Blue3Astop, 12),
    (Input::RedLink1, 13),
    (Input::RedLink2, 14),
    (Input::RedLink3, 15),
    (Input::BlueLink1, 16),
    (Input::BlueLink2, 17),
    (Input::BlueLink3, 18),
];

/// Coil wiring for the compact generation, which groups the reset lamp with
/// the reset pulse ahead of the stack-light cluster.
const COIL_WIRING: [(Coil, usize); COIL_COUNT] = [
    (Coil::Heartbeat, 0),
    (Coil::MatchReset, 1),
    (Coil::FieldResetLight, 2),
    (Coil::StackLightGreen, 3),
    (Coil::StackLightOrange, 4),
    (Coil::StackLightRed, 5),
    (Coil::StackLightBlue, 6),
    (Coil::StackBuzzer, 7),
    (Coil::RedLightOuter, 8),
    (Coil::RedLightMiddle, 9),
    (Coil::RedLightInner, 10),
    (Coil::BlueLightOuter, 11),
    (Coil::BlueLightMiddle, 12),
    (Coil::BlueLightInner, 13),
];

/// Physical pins of the field-side E-stop buttons for red stations 1 and 2.
///
/// The compact cabinet exposes field-side buttons for stations 1 and 2 only,
/// and shares their pins with other stop channels instead of extending the
/// input block.
const RED_FIELD_ESTOP_PINS: [usize; 2] = [9, 10];
/// Physical pins of the field-side E-stop buttons for blue stations 1 and 2.
const BLUE_FIELD_ESTOP_PINS: [usize; 2] = [11, 12];

/// Field I/O for the compact single-cabinet controller generation.
///
/// Wraps a generic engine built with the compact wiring tables and merges
/// the field-side E-stop buttons into the per-station E-stop view: a
/// station's stop is active when either its driver-station button or its
/// field-side button is pressed.
///
/// # Example
///
/// ```no_run
/// use field_plc::{CompactFieldIo, FieldConfig, FieldIo};
/// use std::sync::Arc;
///
/// let field: Arc<dyn FieldIo> = Arc::new(CompactFieldIo::new(FieldConfig::default()));
/// field.set_address(Some("10.0.100.10"));
/// ```
pub struct CompactFieldIo {
    engine: FieldEngine,
}

impl CompactFieldIo {
    /// Creates a compact-generation field I/O instance.
    pub fn new(config: FieldConfig) -> Self {
        Self {
            engine: FieldEngine::with_pin_tables(config, &INPUT_WIRING, &COIL_WIRING),
        }
    }
}

impl Default for CompactFieldIo {
    fn default() -> Self {
        Self::new(FieldConfig::default())
    }
}

impl FieldIo for CompactFieldIo {
    fn set_address(&self, address: Option<&str>) {
        self.engine.set_address(address);
    }

    fn is_enabled(&self) -> bool {
        self.engine.is_enabled()
    }

    fn is_healthy(&self) -> bool {
        self.engine.is_healthy()
    }

    fn subscribe(&self) -> flume::Receiver<IoSnapshot> {
        self.engine.subscribe()
    }

    fn snapshot(&self) -> IoSnapshot {
        self.engine.snapshot()
    }

    fn run(&self) {
        self.engine.run();
    }

    fn module_statuses(&self) -> HashMap<String, bool> {
        self.engine.module_statuses()
    }

    fn field_estop(&self) -> bool {
        self.engine.field_estop()
    }

    /// Per-station E-stops with the field-side buttons for stations 1 and 2
    /// merged in (active-low, like every other stop channel).
    fn team_estops(&self) -> (
        [bool; STATIONS_PER_ALLIANCE],
        [bool; STATIONS_PER_ALLIANCE],
    ) {
        let (mut red, mut blue) = self.engine.team_estops();
        let snapshot = self.engine.snapshot();
        for (station, &pin) in RED_FIELD_ESTOP_PINS.iter().enumerate() {
            red[station] = red[station] || !snapshot.inputs[pin];
        }
        for (station, &pin) in BLUE_FIELD_ESTOP_PINS.iter().enumerate() {
            blue[station] = blue[station] || !snapshot.inputs[pin];
        }
        (red, blue)
    }

    fn team_astops(&self) -> (
        [bool; STATIONS_PER_ALLIANCE],
        [bool; STATIONS_PER_ALLIANCE],
    ) {
        self.engine.team_astops()
    }

    fn network_links(&self) -> (
        [bool; STATIONS_PER_ALLIANCE],
        [bool; STATIONS_PER_ALLIANCE],
    ) {
        self.engine.network_links()
    }

    fn goal_counts(&self) -> (u16, u16) {
        self.engine.goal_counts()
    }

    fn reset_match(&self) {
        self.engine.reset_match();
    }

    fn set_stack_lights(&self, red: bool, blue: bool, orange: bool, green: bool) {
        self.engine.set_stack_lights(red, blue, orange, green);
    }

    fn set_stack_buzzer(&self, on: bool) {
        self.engine.set_stack_buzzer(on);
    }

    fn set_field_reset_light(&self, on: bool) {
        self.engine.set_field_reset_light(on);
    }

    fn set_alliance_lights(&self, red: [bool; 3], blue: [bool; 3]) {
        self.engine.set_alliance_lights(red, blue);
    }

    fn cycle_state(&self, period: u32, index: u32, duration: u32) -> bool {
        self.engine.cycle_state(period, index, duration)
    }

    fn input_names(&self) -> Vec<&'static str> {
        self.engine.input_names()
    }

    fn register_names(&self) -> Vec<&'static str> {
        self.engine.register_names()
    }

    fn coil_names(&self) -> Vec<&'static str> {
        self.engine.coil_names()
    }
}
