//! Point-in-time image of the controller's I/O state.

use serde::Serialize;

use crate::tags::{COIL_COUNT, INPUT_COUNT, REGISTER_COUNT};

/// The complete set of currently known input, register, and coil values,
/// indexed by physical address.
///
/// The live arrays are owned exclusively by the poll engine; everything
/// outside the engine sees copies of this type, so a consumer can never
/// observe a torn cycle. Equality comparison is what drives change
/// notification, and the `Serialize` impl is the payload shape handed to
/// scoring displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IoSnapshot {
    /// Discrete input values, physical order.
    pub inputs: [bool; INPUT_COUNT],
    /// Holding register values, physical order.
    pub registers: [u16; REGISTER_COUNT],
    /// Commanded coil values, physical order.
    pub coils: [bool; COIL_COUNT],
}

impl Default for IoSnapshot {
    /// All-inactive state: no inputs asserted, registers zero, coils off.
    fn default() -> Self {
        Self {
            inputs: [false; INPUT_COUNT],
            registers: [0; REGISTER_COUNT],
            coils: [false; COIL_COUNT],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inactive() {
        let snapshot = IoSnapshot::default();
        assert!(snapshot.inputs.iter().all(|&v| !v));
        assert!(snapshot.registers.iter().all(|&v| v == 0));
        assert!(snapshot.coils.iter().all(|&v| !v));
    }

    #[test]
    fn test_equality_detects_single_bit_change() {
        let a = IoSnapshot::default();
        let mut b = a;
        assert_eq!(a, b);
        b.inputs[7] = true;
        assert_ne!(a, b);
    }

    #[test]
    fn test_serialized_shape() {
        let mut snapshot = IoSnapshot::default();
        snapshot.registers[0] = 0x000F;
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["inputs"].as_array().unwrap().len(), INPUT_COUNT);
        assert_eq!(json["registers"][0], 15);
        assert_eq!(json["coils"].as_array().unwrap().len(), COIL_COUNT);
    }
}
