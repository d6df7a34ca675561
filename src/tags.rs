//! Logical address space for the field controller.
//!
//! This module defines the named I/O points the field logic cares about,
//! independent of any physical controller layout. Each enum is a closed
//! address space: the variant order is the default (identity) physical
//! layout, and the variant count is the block size transferred on the wire
//! every cycle.
//!
//! | Kind | Enum | Count | Direction |
//! |------|------|-------|-----------|
//! | Discrete input | [`Input`] | 19 | controller → software |
//! | Coil | [`Coil`] | 14 | software → controller |
//! | Holding register | [`Register`] | 3 | controller → software |
//!
//! Physical placement is decided by a [`PinMap`](crate::PinMap), never by
//! these enums; a hardware generation that wires the cabinet differently
//! supplies its own map and leaves this module untouched.

use serde::Serialize;
use strum::{EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

/// Number of driver stations per alliance.
pub const STATIONS_PER_ALLIANCE: usize = 3;

/// Discrete inputs read from the controller every cycle.
///
/// E-stop and A-stop channels are wired active-low: the physical circuit is
/// closed (input reads `true`) when the button is *not* pressed, so a cut
/// cable reads as a stop. Accessors on the engine undo the inversion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumCount, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum Input {
    /// Field-level emergency stop button.
    FieldEstop,
    /// Red station 1 emergency stop.
    Red1Estop,
    /// Red station 1 autonomous stop.
    Red1Astop,
    /// Red station 2 emergency stop.
    Red2Estop,
    /// Red station 2 autonomous stop.
    Red2Astop,
    /// Red station 3 emergency stop.
    Red3Estop,
    /// Red station 3 autonomous stop.
    Red3Astop,
    /// Blue station 1 emergency stop.
    Blue1Estop,
    /// Blue station 1 autonomous stop.
    Blue1Astop,
    /// Blue station 2 emergency stop.
    Blue2Estop,
    /// Blue station 2 autonomous stop.
    Blue2Astop,
    /// Blue station 3 emergency stop.
    Blue3Estop,
    /// Blue station 3 autonomous stop.
    Blue3Astop,
    /// Red station 1 Ethernet link present.
    RedLink1,
    /// Red station 2 Ethernet link present.
    RedLink2,
    /// Red station 3 Ethernet link present.
    RedLink3,
    /// Blue station 1 Ethernet link present.
    BlueLink1,
    /// Blue station 2 Ethernet link present.
    BlueLink2,
    /// Blue station 3 Ethernet link present.
    BlueLink3,
}

/// Total number of discrete inputs.
pub const INPUT_COUNT: usize = <Input as EnumCount>::COUNT;

impl Input {
    /// Whether this channel is wired active-low.
    ///
    /// Active-low channels rest at the high wire level; the engine seeds its
    /// simulated snapshot with that resting level so accessors read
    /// "not active" before any hardware has been polled.
    pub fn active_low(self) -> bool {
        !matches!(
            self,
            Input::RedLink1
                | Input::RedLink2
                | Input::RedLink3
                | Input::BlueLink1
                | Input::BlueLink2
                | Input::BlueLink3
        )
    }

    /// Red-alliance E-stop inputs in station order.
    pub const RED_ESTOPS: [Input; STATIONS_PER_ALLIANCE] =
        [Input::Red1Estop, Input::Red2Estop, Input::Red3Estop];
    /// Blue-alliance E-stop inputs in station order.
    pub const BLUE_ESTOPS: [Input; STATIONS_PER_ALLIANCE] =
        [Input::Blue1Estop, Input::Blue2Estop, Input::Blue3Estop];
    /// Red-alliance A-stop inputs in station order.
    pub const RED_ASTOPS: [Input; STATIONS_PER_ALLIANCE] =
        [Input::Red1Astop, Input::Red2Astop, Input::Red3Astop];
    /// Blue-alliance A-stop inputs in station order.
    pub const BLUE_ASTOPS: [Input; STATIONS_PER_ALLIANCE] =
        [Input::Blue1Astop, Input::Blue2Astop, Input::Blue3Astop];
    /// Red-alliance Ethernet-link inputs in station order.
    pub const RED_LINKS: [Input; STATIONS_PER_ALLIANCE] =
        [Input::RedLink1, Input::RedLink2, Input::RedLink3];
    /// Blue-alliance Ethernet-link inputs in station order.
    pub const BLUE_LINKS: [Input; STATIONS_PER_ALLIANCE] =
        [Input::BlueLink1, Input::BlueLink2, Input::BlueLink3];
}

/// Output coils written to the controller every cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumCount, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum Coil {
    /// Liveness line; asserted every cycle so the controller can fail its
    /// outputs safe when the software side goes away.
    Heartbeat,
    /// Edge-triggered match reset; pulsed, never held (see
    /// [`FieldEngine::reset_match`](crate::FieldEngine::reset_match)).
    MatchReset,
    /// Green stack light on the scoring table.
    StackLightGreen,
    /// Orange stack light on the scoring table.
    StackLightOrange,
    /// Red stack light on the scoring table.
    StackLightRed,
    /// Blue stack light on the scoring table.
    StackLightBlue,
    /// Audible match-ready chime.
    StackBuzzer,
    /// Field reset lamp.
    FieldResetLight,
    /// Red alliance indicator light, outer position.
    RedLightOuter,
    /// Red alliance indicator light, middle position.
    RedLightMiddle,
    /// Red alliance indicator light, inner position.
    RedLightInner,
    /// Blue alliance indicator light, outer position.
    BlueLightOuter,
    /// Blue alliance indicator light, middle position.
    BlueLightMiddle,
    /// Blue alliance indicator light, inner position.
    BlueLightInner,
}

/// Total number of coils.
pub const COIL_COUNT: usize = <Coil as EnumCount>::COUNT;

impl Coil {
    /// Red-alliance indicator lights, outer to inner.
    pub const RED_LIGHTS: [Coil; 3] = [
        Coil::RedLightOuter,
        Coil::RedLightMiddle,
        Coil::RedLightInner,
    ];
    /// Blue-alliance indicator lights, outer to inner.
    pub const BLUE_LIGHTS: [Coil; 3] = [
        Coil::BlueLightOuter,
        Coil::BlueLightMiddle,
        Coil::BlueLightInner,
    ];
}

/// 16-bit holding registers read from the controller every cycle.
///
/// Registers are addressed by variant ordinal directly; they have no pin map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumCount, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum Register {
    /// Bitmask of I/O sub-module connectivity, one bit per [`IoModule`].
    IoLinkStatus,
    /// Red-alliance scored-element counter.
    RedGoalCount,
    /// Blue-alliance scored-element counter.
    BlueGoalCount,
}

/// Total number of registers.
pub const REGISTER_COUNT: usize = <Register as EnumCount>::COUNT;

impl Register {
    /// Whether this register survives a match reset.
    ///
    /// Connectivity status reflects physical cabling and must not be zeroed
    /// between matches; everything else is volatile game state.
    pub fn persistent(self) -> bool {
        matches!(self, Register::IoLinkStatus)
    }
}

/// I/O sub-modules reported through the [`Register::IoLinkStatus`] bitmask,
/// bit position = variant ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
pub enum IoModule {
    /// Red driver-station I/O block.
    RedDs,
    /// Blue driver-station I/O block.
    BlueDs,
    /// Red field-element IO-Link master.
    RedIoLink,
    /// Blue field-element IO-Link master.
    BlueIoLink,
}

/// Diagnostic names of all discrete inputs, in address-space order.
pub fn input_names() -> Vec<&'static str> {
    Input::iter().map(<&'static str>::from).collect()
}

/// Diagnostic names of all coils, in address-space order.
pub fn coil_names() -> Vec<&'static str> {
    Coil::iter().map(<&'static str>::from).collect()
}

/// Diagnostic names of all registers, in address-space order.
pub fn register_names() -> Vec<&'static str> {
    Register::iter().map(<&'static str>::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        assert_eq!(INPUT_COUNT, 19);
        assert_eq!(COIL_COUNT, 14);
        assert_eq!(REGISTER_COUNT, 3);
    }

    #[test]
    fn test_ordinals_are_identity_layout() {
        assert_eq!(Input::FieldEstop as usize, 0);
        assert_eq!(Input::BlueLink3 as usize, INPUT_COUNT - 1);
        assert_eq!(Coil::Heartbeat as usize, 0);
        assert_eq!(Coil::BlueLightInner as usize, COIL_COUNT - 1);
    }

    #[test]
    fn test_input_names() {
        let names = input_names();
        assert_eq!(names.len(), INPUT_COUNT);
        assert_eq!(names[0], "fieldEstop");
        assert_eq!(names[1], "red1Estop");
        assert_eq!(names[13], "redLink1");
    }

    #[test]
    fn test_coil_names() {
        let names = coil_names();
        assert_eq!(names[0], "heartbeat");
        assert_eq!(names[1], "matchReset");
        assert_eq!(names[13], "blueLightInner");
    }

    #[test]
    fn test_register_persistence() {
        assert!(Register::IoLinkStatus.persistent());
        assert!(!Register::RedGoalCount.persistent());
        assert!(!Register::BlueGoalCount.persistent());
    }

    #[test]
    fn test_active_low_channels() {
        assert!(Input::FieldEstop.active_low());
        assert!(Input::Red2Astop.active_low());
        assert!(Input::Blue3Estop.active_low());
        assert!(!Input::RedLink1.active_low());
        assert!(!Input::BlueLink3.active_low());
    }

    #[test]
    fn test_station_tables_cover_distinct_inputs() {
        let mut all = Vec::new();
        all.extend_from_slice(&Input::RED_ESTOPS);
        all.extend_from_slice(&Input::BLUE_ESTOPS);
        all.extend_from_slice(&Input::RED_ASTOPS);
        all.extend_from_slice(&Input::BLUE_ASTOPS);
        all.extend_from_slice(&Input::RED_LINKS);
        all.extend_from_slice(&Input::BLUE_LINKS);
        let distinct: std::collections::HashSet<_> = all.iter().copied().collect();
        assert_eq!(distinct.len(), all.len());
        assert_eq!(all.len(), INPUT_COUNT - 1); // everything but the field E-stop
    }
}
