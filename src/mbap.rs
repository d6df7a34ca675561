//! MBAP header structure for Modbus TCP framing.
//!
//! Every Modbus TCP request and response is prefixed by the 7-byte MBAP
//! (Modbus Application Protocol) header:
//!
//! | Bytes | Field | Description |
//! |-------|-------|-------------|
//! | 0-1 | Transaction ID | Request/response correlation, big-endian |
//! | 2-3 | Protocol ID | Always 0x0000 for Modbus |
//! | 4-5 | Length | Byte count of unit ID + PDU, big-endian |
//! | 6 | Unit ID | Slave identifier |
//!
//! The field controller answers on the well-known Modbus port with the
//! broadcast-style unit ID `0xFF`, both fixed by the wiring contract.
//!
//! # Example
//!
//! ```
//! use field_plc::MbapHeader;
//!
//! let header = MbapHeader::new_request(0x0001, 6);
//! assert_eq!(header.to_bytes(), [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0xFF]);
//! ```

use crate::error::{FieldError, Result};

/// MBAP header size in bytes.
pub const MBAP_HEADER_SIZE: usize = 7;

/// Well-known Modbus TCP port.
pub const MODBUS_PORT: u16 = 502;

/// Unit/slave identifier the field controller answers on.
pub const UNIT_ID: u8 = 0xFF;

/// Modbus TCP MBAP header (7 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    /// Transaction identifier, echoed back by the controller.
    pub transaction: u16,
    /// Protocol identifier (0x0000 for Modbus).
    pub protocol: u16,
    /// Number of following bytes, counting the unit ID and the PDU.
    pub length: u16,
    /// Unit/slave identifier.
    pub unit: u8,
}

impl MbapHeader {
    /// Creates a request header for a PDU of `pdu_len` bytes, addressed to
    /// the fixed [`UNIT_ID`].
    pub fn new_request(transaction: u16, pdu_len: usize) -> Self {
        Self {
            transaction,
            protocol: 0x0000,
            length: (pdu_len + 1) as u16,
            unit: UNIT_ID,
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(self) -> [u8; MBAP_HEADER_SIZE] {
        let transaction = self.transaction.to_be_bytes();
        let protocol = self.protocol.to_be_bytes();
        let length = self.length.to_be_bytes();
        [
            transaction[0],
            transaction[1],
            protocol[0],
            protocol[1],
            length[0],
            length[1],
            self.unit,
        ]
    }

    /// Parses a header from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidResponse`] if the slice is too short,
    /// the protocol identifier is not Modbus, or the declared length cannot
    /// hold a function code.
    ///
    /// # Example
    ///
    /// ```
    /// use field_plc::MbapHeader;
    ///
    /// let bytes = [0x00, 0x2A, 0x00, 0x00, 0x00, 0x04, 0xFF];
    /// let header = MbapHeader::from_bytes(&bytes).unwrap();
    /// assert_eq!(header.transaction, 0x2A);
    /// assert_eq!(header.length, 4);
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MBAP_HEADER_SIZE {
            return Err(FieldError::invalid_response(format!(
                "MBAP header too short: expected {} bytes, got {}",
                MBAP_HEADER_SIZE,
                data.len()
            )));
        }

        let header = Self {
            transaction: u16::from_be_bytes([data[0], data[1]]),
            protocol: u16::from_be_bytes([data[2], data[3]]),
            length: u16::from_be_bytes([data[4], data[5]]),
            unit: data[6],
        };

        if header.protocol != 0x0000 {
            return Err(FieldError::invalid_response(format!(
                "unexpected protocol identifier 0x{:04X}",
                header.protocol
            )));
        }
        if header.length < 2 {
            return Err(FieldError::invalid_response(format!(
                "MBAP length {} cannot hold a PDU",
                header.length
            )));
        }

        Ok(header)
    }

    /// Number of bytes that follow the header on the wire.
    pub fn remaining(self) -> usize {
        // Length counts the unit ID, which is part of the header itself.
        self.length as usize - 1
    }
}
