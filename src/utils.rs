//! Bit packing and unpacking helpers for the Modbus data model.
//!
//! Discrete inputs and coils travel on the wire as packed bits: address 0 is
//! the least-significant bit of the first byte, address 8 the LSB of the
//! second byte, and so on. Trailing bits in the last byte are padding on the
//! wire and are never read back.
//!
//! # Example
//!
//! ```
//! use field_plc::utils::{pack_bits, unpack_bits};
//!
//! let values = [true, false, false, true, false, false, false, false, true];
//! let bytes = pack_bits(&values);
//! assert_eq!(bytes, vec![0b0000_1001, 0b0000_0001]);
//! assert_eq!(unpack_bits(&bytes, values.len()), values);
//! ```

/// Packs a slice of booleans into bytes, LSB first.
///
/// The output has `ceil(values.len() / 8)` bytes; unused high bits of the
/// last byte are zero.
pub fn pack_bits(values: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; values.len().div_ceil(8)];
    for (i, &bit) in values.iter().enumerate() {
        if bit {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

/// Unpacks `count` booleans from packed bytes, LSB first.
///
/// # Panics
///
/// Panics if `bytes` holds fewer than `count` bits. Callers validate the
/// byte count against the declared quantity before unpacking (see
/// [`ModbusResponse::to_bits`](crate::ModbusResponse::to_bits)).
pub fn unpack_bits(bytes: &[u8], count: usize) -> Vec<bool> {
    assert!(
        bytes.len() * 8 >= count,
        "{} bytes cannot hold {} bits",
        bytes.len(),
        count
    );
    (0..count).map(|i| bytes[i / 8] & (1 << (i % 8)) != 0).collect()
}
