//! Modbus response parsing and validation.
//!
//! A response frame is the MBAP header followed by the PDU: one function
//! code, then function-specific data. An exception response echoes the
//! request's function code with bit 7 set and carries a single exception
//! code byte.
//!
//! # Example
//!
//! ```
//! use field_plc::ModbusResponse;
//!
//! // Read Holding Registers response carrying 0x1234.
//! let bytes = [
//!     0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0xFF, // MBAP
//!     0x03, 0x02, 0x12, 0x34, // FC, byte count, data
//! ];
//! let response = ModbusResponse::from_bytes(&bytes).unwrap();
//! assert_eq!(response.to_words(1).unwrap(), vec![0x1234]);
//! ```

use crate::error::{FieldError, Result};
use crate::mbap::{MbapHeader, MBAP_HEADER_SIZE};
use crate::utils::unpack_bits;

/// Minimum response size: MBAP header plus a function code.
pub const MIN_RESPONSE_SIZE: usize = MBAP_HEADER_SIZE + 1;

/// Parsed Modbus TCP response.
#[derive(Debug, Clone)]
pub struct ModbusResponse {
    /// Response header.
    pub header: MbapHeader,
    /// Function code (with bit 7 set for exception responses).
    pub function: u8,
    /// PDU payload after the function code.
    pub data: Vec<u8>,
}

impl ModbusResponse {
    /// Parses a response from raw frame bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidResponse`] if the frame is shorter than
    /// [`MIN_RESPONSE_SIZE`], the header is malformed, or the payload is
    /// shorter than the header's declared length.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_RESPONSE_SIZE {
            return Err(FieldError::invalid_response(format!(
                "response too short: expected at least {} bytes, got {}",
                MIN_RESPONSE_SIZE,
                data.len()
            )));
        }

        let header = MbapHeader::from_bytes(&data[..MBAP_HEADER_SIZE])?;
        let body = &data[MBAP_HEADER_SIZE..];
        if body.len() < header.remaining() {
            return Err(FieldError::invalid_response(format!(
                "response body shorter than declared: expected {} bytes, got {}",
                header.remaining(),
                body.len()
            )));
        }

        Ok(Self {
            header,
            function: body[0],
            data: body[1..header.remaining()].to_vec(),
        })
    }

    /// Validates that this response answers the given transaction.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidResponse`] on a transaction mismatch,
    /// which means a stale or interleaved frame on the session.
    pub fn check_transaction(&self, expected: u16) -> Result<()> {
        if self.header.transaction == expected {
            Ok(())
        } else {
            Err(FieldError::invalid_response(format!(
                "transaction mismatch: expected 0x{expected:04X}, received 0x{:04X}",
                self.header.transaction
            )))
        }
    }

    /// Validates that the controller did not answer with an exception.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Exception`] carrying the original function code
    /// and the exception code.
    pub fn check_exception(&self) -> Result<()> {
        if self.function & 0x80 == 0 {
            return Ok(());
        }
        let code = self.data.first().copied().unwrap_or(0);
        Err(FieldError::exception(self.function & 0x7F, code))
    }

    /// Decodes a bit-read response into `count` booleans.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidResponse`] if the byte-count prefix or
    /// the payload cannot hold `count` bits.
    pub fn to_bits(&self, count: usize) -> Result<Vec<bool>> {
        let byte_count = *self.data.first().ok_or_else(|| {
            FieldError::invalid_response("bit response missing byte count")
        })? as usize;
        let payload = &self.data[1..];
        if payload.len() < byte_count || byte_count * 8 < count {
            return Err(FieldError::invalid_response(format!(
                "insufficient bit data: got {byte_count} bytes, expected {count} bits"
            )));
        }
        Ok(unpack_bits(&payload[..byte_count], count))
    }

    /// Decodes a register-read response into `count` big-endian words.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidResponse`] if the byte-count prefix or
    /// the payload cannot hold `count` words.
    pub fn to_words(&self, count: usize) -> Result<Vec<u16>> {
        let byte_count = *self.data.first().ok_or_else(|| {
            FieldError::invalid_response("register response missing byte count")
        })? as usize;
        let payload = &self.data[1..];
        if payload.len() < byte_count || byte_count / 2 < count {
            return Err(FieldError::invalid_response(format!(
                "insufficient register data: got {byte_count} bytes, expected {count} words"
            )));
        }
        Ok(payload[..count * 2]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect())
    }
}
