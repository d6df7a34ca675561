//! Modbus request structures and serialization.
//!
//! Each request struct owns its validation and serializes itself to a full
//! TCP frame (MBAP header + PDU). The engine only ever issues three request
//! shapes against the controller, all block transfers:
//!
//! - [`ReadDiscreteInputsRequest`] - function 0x02
//! - [`ReadHoldingRegistersRequest`] - function 0x03
//! - [`WriteMultipleCoilsRequest`] - function 0x0F
//!
//! Quantity limits are the Modbus protocol limits; the field blocks are far
//! below them, but the builders reject out-of-spec requests anyway so a bad
//! caller fails here instead of at the controller.
//!
//! # Example
//!
//! ```
//! use field_plc::ReadDiscreteInputsRequest;
//!
//! let request = ReadDiscreteInputsRequest::new(0x0001, 0, 19).unwrap();
//! let bytes = request.to_bytes();
//! assert_eq!(bytes, hex::decode("000100000006ff0200000013").unwrap());
//! ```

use crate::error::{FieldError, Result};
use crate::mbap::{MbapHeader, MBAP_HEADER_SIZE};
use crate::utils::pack_bits;

/// Read Discrete Inputs function code.
pub(crate) const FC_READ_DISCRETE_INPUTS: u8 = 0x02;
/// Read Holding Registers function code.
pub(crate) const FC_READ_HOLDING_REGISTERS: u8 = 0x03;
/// Write Multiple Coils function code.
pub(crate) const FC_WRITE_MULTIPLE_COILS: u8 = 0x0F;

/// Maximum number of discrete inputs per read (Modbus limit).
pub const MAX_READ_BITS: u16 = 2000;
/// Maximum number of registers per read (Modbus limit).
pub const MAX_READ_REGISTERS: u16 = 125;
/// Maximum number of coils per write (Modbus limit).
pub const MAX_WRITE_COILS: u16 = 1968;

fn check_quantity(quantity: u16, max: u16) -> Result<()> {
    if quantity == 0 {
        return Err(FieldError::invalid_parameter(
            "quantity",
            "must be greater than 0",
        ));
    }
    if quantity > max {
        return Err(FieldError::invalid_parameter(
            "quantity",
            format!("must not exceed {max}"),
        ));
    }
    Ok(())
}

/// Request to read a block of discrete inputs (function 0x02).
#[derive(Debug, Clone)]
pub struct ReadDiscreteInputsRequest {
    header: MbapHeader,
    start: u16,
    quantity: u16,
}

impl ReadDiscreteInputsRequest {
    /// Creates a new read request for `quantity` bits starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if `quantity` is 0 or exceeds [`MAX_READ_BITS`].
    pub fn new(transaction: u16, start: u16, quantity: u16) -> Result<Self> {
        check_quantity(quantity, MAX_READ_BITS)?;
        Ok(Self {
            header: MbapHeader::new_request(transaction, 5),
            start,
            quantity,
        })
    }

    /// Serializes the request to a full TCP frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MBAP_HEADER_SIZE + 5);
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.push(FC_READ_DISCRETE_INPUTS);
        bytes.extend_from_slice(&self.start.to_be_bytes());
        bytes.extend_from_slice(&self.quantity.to_be_bytes());
        bytes
    }
}

/// Request to read a block of holding registers (function 0x03).
#[derive(Debug, Clone)]
pub struct ReadHoldingRegistersRequest {
    header: MbapHeader,
    start: u16,
    quantity: u16,
}

impl ReadHoldingRegistersRequest {
    /// Creates a new read request for `quantity` words starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if `quantity` is 0 or exceeds [`MAX_READ_REGISTERS`].
    pub fn new(transaction: u16, start: u16, quantity: u16) -> Result<Self> {
        check_quantity(quantity, MAX_READ_REGISTERS)?;
        Ok(Self {
            header: MbapHeader::new_request(transaction, 5),
            start,
            quantity,
        })
    }

    /// Serializes the request to a full TCP frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MBAP_HEADER_SIZE + 5);
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.push(FC_READ_HOLDING_REGISTERS);
        bytes.extend_from_slice(&self.start.to_be_bytes());
        bytes.extend_from_slice(&self.quantity.to_be_bytes());
        bytes
    }
}

/// Request to write a block of coils (function 0x0F).
///
/// Values are packed LSB-first: the coil at `start` lands in bit 0 of the
/// first data byte.
#[derive(Debug, Clone)]
pub struct WriteMultipleCoilsRequest {
    header: MbapHeader,
    start: u16,
    values: Vec<bool>,
}

impl WriteMultipleCoilsRequest {
    /// Creates a new write request for `values` starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` is empty or longer than
    /// [`MAX_WRITE_COILS`].
    pub fn new(transaction: u16, start: u16, values: &[bool]) -> Result<Self> {
        if values.is_empty() {
            return Err(FieldError::invalid_parameter("values", "must not be empty"));
        }
        if values.len() > MAX_WRITE_COILS as usize {
            return Err(FieldError::invalid_parameter(
                "values",
                format!("must not exceed {MAX_WRITE_COILS} coils"),
            ));
        }
        let byte_count = values.len().div_ceil(8);
        Ok(Self {
            header: MbapHeader::new_request(transaction, 6 + byte_count),
            start,
            values: values.to_vec(),
        })
    }

    /// Serializes the request to a full TCP frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        let packed = pack_bits(&self.values);
        let mut bytes = Vec::with_capacity(MBAP_HEADER_SIZE + 6 + packed.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.push(FC_WRITE_MULTIPLE_COILS);
        bytes.extend_from_slice(&self.start.to_be_bytes());
        bytes.extend_from_slice(&(self.values.len() as u16).to_be_bytes());
        bytes.push(packed.len() as u8);
        bytes.extend_from_slice(&packed);
        bytes
    }
}
