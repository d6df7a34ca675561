//! Modbus TCP client for the field controller.
//!
//! This module provides the [`ModbusClient`] struct: one live session to the
//! controller, exposing exactly the three block operations the poll engine
//! needs. Each operation produces one request and one response - no retries,
//! no caching, no reconnection. The engine owns all of those policies.
//!
//! Per the wiring contract, every block starts at address 0 and spans the
//! declared count for its category; the client bakes the zero start address
//! in rather than exposing it.
//!
//! # Example
//!
//! ```no_run
//! use field_plc::ModbusClient;
//! use std::time::Duration;
//!
//! let mut client = ModbusClient::connect("10.0.100.10:502", Duration::from_secs(1))?;
//! let inputs = client.read_discrete_inputs(19)?;
//! let registers = client.read_holding_registers(3)?;
//! client.write_coils(&[true; 14])?;
//! # Ok::<(), field_plc::FieldError>(())
//! ```

use std::net::ToSocketAddrs;
use std::time::Duration;

use log::trace;

use crate::error::{FieldError, Result};
use crate::request::{
    ReadDiscreteInputsRequest, ReadHoldingRegistersRequest, WriteMultipleCoilsRequest,
};
use crate::response::ModbusResponse;
use crate::transport::TcpTransport;

/// Modbus TCP client session.
///
/// Owned by the poll engine for the lifetime of one connection; dropped (and
/// with it the socket) on any cycle failure.
pub struct ModbusClient {
    transport: TcpTransport,
    transaction: u16,
}

impl ModbusClient {
    /// Opens a session to the controller at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Connect`](crate::FieldError::Connect) on any
    /// socket or handshake failure. The caller owns retry policy.
    pub fn connect(addr: impl ToSocketAddrs, timeout: Duration) -> Result<Self> {
        let transport = TcpTransport::connect(addr, timeout)?;
        Ok(Self {
            transport,
            transaction: 0,
        })
    }

    fn next_transaction(&mut self) -> u16 {
        self.transaction = self.transaction.wrapping_add(1);
        self.transaction
    }

    /// Sends one frame and parses, correlates, and checks the response.
    fn exchange(&mut self, frame: &[u8], transaction: u16) -> Result<ModbusResponse> {
        trace!("-> {frame:02X?}");
        let raw = self.transport.send_receive(frame)?;
        trace!("<- {raw:02X?}");

        let response = ModbusResponse::from_bytes(&raw)?;
        response.check_transaction(transaction)?;
        response.check_exception()?;
        Ok(response)
    }

    /// Reads `count` discrete inputs starting at address 0, unpacked into
    /// bit order (address 0 = LSB of the first response byte).
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails or the response is short or
    /// malformed.
    pub fn read_discrete_inputs(&mut self, count: u16) -> Result<Vec<bool>> {
        let transaction = self.next_transaction();
        let request = ReadDiscreteInputsRequest::new(transaction, 0, count)?;
        let response = self.exchange(&request.to_bytes(), transaction)?;
        response.to_bits(count as usize)
    }

    /// Reads `count` holding registers starting at address 0, decoded as
    /// big-endian words.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails or the response is short or
    /// malformed.
    pub fn read_holding_registers(&mut self, count: u16) -> Result<Vec<u16>> {
        let transaction = self.next_transaction();
        let request = ReadHoldingRegistersRequest::new(transaction, 0, count)?;
        let response = self.exchange(&request.to_bytes(), transaction)?;
        response.to_words(count as usize)
    }

    /// Writes the full coil block starting at address 0, packed LSB-first.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails or the controller's echo does
    /// not acknowledge the written quantity.
    pub fn write_coils(&mut self, values: &[bool]) -> Result<()> {
        let transaction = self.next_transaction();
        let request = WriteMultipleCoilsRequest::new(transaction, 0, values)?;
        let response = self.exchange(&request.to_bytes(), transaction)?;

        // The echo repeats the start address and quantity.
        if response.data.len() < 4 {
            return Err(FieldError::invalid_response("write coils echo too short"));
        }
        let echoed = u16::from_be_bytes([response.data[2], response.data[3]]);
        if echoed as usize != values.len() {
            return Err(FieldError::invalid_response(format!(
                "write coils echo acknowledged {echoed} coils, expected {}",
                values.len()
            )));
        }
        Ok(())
    }

    /// Returns the remote controller address.
    pub fn remote_addr(&self) -> std::net::SocketAddr {
        self.transport.remote_addr()
    }
}

impl std::fmt::Debug for ModbusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModbusClient")
            .field("transport", &self.transport)
            .field("transaction", &self.transaction)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestSlave;
    use crate::FieldError;

    #[test]
    fn test_read_discrete_inputs() {
        let slave = TestSlave::start(19, 3, 14);
        slave.state().discrete_inputs[0] = true;
        slave.state().discrete_inputs[8] = true;
        slave.state().discrete_inputs[18] = true;

        let mut client = ModbusClient::connect(slave.addr(), Duration::from_secs(1)).unwrap();
        let inputs = client.read_discrete_inputs(19).unwrap();
        assert_eq!(inputs.len(), 19);
        assert!(inputs[0] && inputs[8] && inputs[18]);
        assert!(!inputs[1] && !inputs[17]);
    }

    #[test]
    fn test_read_holding_registers() {
        let slave = TestSlave::start(19, 3, 14);
        slave.state().holding_registers[0] = 0x1234;
        slave.state().holding_registers[2] = 0xABCD;

        let mut client = ModbusClient::connect(slave.addr(), Duration::from_secs(1)).unwrap();
        let registers = client.read_holding_registers(3).unwrap();
        assert_eq!(registers, vec![0x1234, 0x0000, 0xABCD]);
    }

    #[test]
    fn test_write_coils() {
        let slave = TestSlave::start(19, 3, 14);

        let mut values = [false; 14];
        values[0] = true;
        values[9] = true;
        let mut client = ModbusClient::connect(slave.addr(), Duration::from_secs(1)).unwrap();
        client.write_coils(&values).unwrap();

        assert_eq!(slave.state().coils.as_slice(), values.as_slice());
    }

    #[test]
    fn test_exception_response() {
        let slave = TestSlave::start(19, 3, 14);
        slave.state().fail_with_exception = true;

        let mut client = ModbusClient::connect(slave.addr(), Duration::from_secs(1)).unwrap();
        let err = client.read_discrete_inputs(19).unwrap_err();
        match err {
            FieldError::Exception { function, code } => {
                assert_eq!(function, 0x02);
                assert_eq!(code, 0x04);
            }
            other => panic!("expected Exception, got {other:?}"),
        }
    }

    #[test]
    fn test_transactions_increment_across_operations() {
        let slave = TestSlave::start(19, 3, 14);

        let mut client = ModbusClient::connect(slave.addr(), Duration::from_secs(1)).unwrap();
        client.read_discrete_inputs(19).unwrap();
        client.read_holding_registers(3).unwrap();
        client.write_coils(&[false; 14]).unwrap();
        assert_eq!(client.transaction, 3);
    }
}
