//! TCP transport layer for Modbus communication.
//!
//! This module provides the [`TcpTransport`] struct which handles low-level
//! TCP communication with the field controller. The transport layer is
//! separated from the protocol layer: it knows about sockets, timeouts, and
//! MBAP length framing, but nothing about function codes or the field's
//! address spaces.
//!
//! # Design
//!
//! - **Blocking** - connect, send, and receive all block, bounded by one
//!   configurable timeout
//! - **Framed** - receive reads exactly one MBAP-delimited frame from the
//!   stream, so a slow controller can never leave a half-read frame behind
//! - **Single session** - one stream, one remote, no pooling; the poll
//!   engine owns exactly one transport at a time and drops it on any error

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{FieldError, Result};
use crate::mbap::{MbapHeader, MBAP_HEADER_SIZE};

/// Default timeout for connect and per-operation I/O.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// TCP transport for Modbus framing.
pub struct TcpTransport {
    stream: TcpStream,
    remote_addr: SocketAddr,
}

impl TcpTransport {
    /// Opens a TCP session to the controller.
    ///
    /// Resolves `addr`, connects with `timeout`, and applies the same
    /// timeout to every subsequent read and write.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Connect`] on resolution or handshake failure.
    /// This operation never retries internally; the poll engine owns retry
    /// policy.
    pub fn connect(addr: impl ToSocketAddrs, timeout: Duration) -> Result<Self> {
        let remote_addr = addr
            .to_socket_addrs()
            .map_err(FieldError::Connect)?
            .next()
            .ok_or_else(|| {
                FieldError::Connect(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "address resolved to nothing",
                ))
            })?;

        let stream =
            TcpStream::connect_timeout(&remote_addr, timeout).map_err(FieldError::Connect)?;
        stream.set_read_timeout(Some(timeout)).map_err(FieldError::Connect)?;
        stream.set_write_timeout(Some(timeout)).map_err(FieldError::Connect)?;
        stream.set_nodelay(true).map_err(FieldError::Connect)?;

        Ok(Self {
            stream,
            remote_addr,
        })
    }

    /// Sends a request frame and receives one response frame.
    ///
    /// This is a synchronous operation bounded by the transport timeout on
    /// each side.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Timeout`] if either direction times out, or an
    /// I/O / framing error otherwise.
    pub fn send_receive(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        self.stream.write_all(frame).map_err(fold_timeout)?;

        let mut header_bytes = [0u8; MBAP_HEADER_SIZE];
        self.stream
            .read_exact(&mut header_bytes)
            .map_err(fold_timeout)?;
        let header = MbapHeader::from_bytes(&header_bytes)?;

        let mut frame = header_bytes.to_vec();
        let mut body = vec![0u8; header.remaining()];
        self.stream.read_exact(&mut body).map_err(fold_timeout)?;
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Returns the remote controller address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

fn fold_timeout(e: std::io::Error) -> FieldError {
    match e.kind() {
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => FieldError::Timeout,
        _ => FieldError::Io(e),
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("remote_addr", &self.remote_addr)
            .field("local_addr", &self.stream.local_addr().ok())
            .finish()
    }
}
