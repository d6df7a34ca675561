//! Logical-to-physical pin mapping.
//!
//! A [`PinMap`] associates every logical [`Input`] and [`Coil`] with a
//! physical address in the controller's discrete-input and coil blocks. A
//! map is only ever constructed in a valid state: total (every logical point
//! mapped), injective (no two points share a pin), and in range (every pin
//! inside `[0, count)`). Resolution after construction is therefore
//! infallible, and run-time call sites never handle mapping failures.
//!
//! Hardware generations supply a complete replacement map; there is no
//! partial overlay over the identity layout. A generation that keeps the
//! default wiring for one block spells its tables out in full.
//!
//! # Example
//!
//! ```
//! use field_plc::{Coil, Input, PinMap};
//!
//! let map = PinMap::identity();
//! assert_eq!(map.input_pin(Input::FieldEstop), 0);
//! assert_eq!(map.coil_pin(Coil::Heartbeat), 0);
//! ```

use crate::error::{FieldError, Result};
use crate::tags::{coil_names, input_names, Coil, Input, COIL_COUNT, INPUT_COUNT};

/// Validated, immutable mapping from logical I/O points to physical pins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinMap {
    inputs: [usize; INPUT_COUNT],
    coils: [usize; COIL_COUNT],
}

impl PinMap {
    /// Creates the default 1:1 mapping: physical pin == enumeration ordinal.
    pub fn identity() -> Self {
        let mut inputs = [0; INPUT_COUNT];
        let mut coils = [0; COIL_COUNT];
        for (i, pin) in inputs.iter_mut().enumerate() {
            *pin = i;
        }
        for (i, pin) in coils.iter_mut().enumerate() {
            *pin = i;
        }
        Self { inputs, coils }
    }

    /// Builds a map from explicit wiring tables.
    ///
    /// Both tables must cover their full address space exactly once, with
    /// every pin in range and no pin assigned twice.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Mapping`] describing the first defect found:
    /// a missing or duplicated logical point, an out-of-range pin, or a pin
    /// shared by two points.
    ///
    /// # Example
    ///
    /// ```
    /// use field_plc::{Coil, Input, PinMap};
    /// use strum::IntoEnumIterator;
    ///
    /// // Explicit identity wiring, spelled out the way a variant would.
    /// let inputs: Vec<(Input, usize)> = Input::iter().enumerate().map(|(i, t)| (t, i)).collect();
    /// let coils: Vec<(Coil, usize)> = Coil::iter().enumerate().map(|(i, t)| (t, i)).collect();
    /// let map = PinMap::from_tables(&inputs, &coils).unwrap();
    /// assert_eq!(map, PinMap::identity());
    /// ```
    pub fn from_tables(inputs: &[(Input, usize)], coils: &[(Coil, usize)]) -> Result<Self> {
        let input_pins = resolve_table(
            inputs.iter().map(|&(t, p)| (t as usize, p)),
            &input_names(),
            "input",
        )?;
        let coil_pins = resolve_table(
            coils.iter().map(|&(t, p)| (t as usize, p)),
            &coil_names(),
            "coil",
        )?;
        Ok(Self {
            inputs: input_pins,
            coils: coil_pins,
        })
    }

    /// Returns the physical pin for a logical input.
    pub fn input_pin(&self, input: Input) -> usize {
        self.inputs[input as usize]
    }

    /// Returns the physical pin for a logical coil.
    pub fn coil_pin(&self, coil: Coil) -> usize {
        self.coils[coil as usize]
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::identity()
    }
}

fn resolve_table<const N: usize>(
    entries: impl Iterator<Item = (usize, usize)>,
    names: &[&'static str],
    kind: &str,
) -> Result<[usize; N]> {
    let mut pins = [usize::MAX; N];
    for (index, pin) in entries {
        if pin >= N {
            return Err(FieldError::mapping(format!(
                "{kind} pin {pin} for {} out of range (must be 0-{})",
                names[index],
                N - 1
            )));
        }
        if pins[index] != usize::MAX {
            return Err(FieldError::mapping(format!(
                "{kind} {} mapped more than once",
                names[index]
            )));
        }
        pins[index] = pin;
    }
    for (index, name) in names.iter().enumerate() {
        if pins[index] == usize::MAX {
            return Err(FieldError::mapping(format!("{kind} {name} has no mapping")));
        }
    }
    let mut seen = [false; N];
    for &pin in &pins {
        if seen[pin] {
            return Err(FieldError::mapping(format!(
                "{kind} pin {pin} assigned to more than one point"
            )));
        }
        seen[pin] = true;
    }
    Ok(pins)
}
