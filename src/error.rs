//! Error types for the field I/O layer.

use std::io;
use thiserror::Error;

/// Result type alias for field I/O operations.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors that can occur while talking to the field controller.
///
/// The engine sorts these into three classes with different recovery
/// policies (see [`FieldEngine`](crate::FieldEngine)):
///
/// - [`Mapping`](FieldError::Mapping) is a configuration defect. It is
///   permanent for the engine instance and degrades health for its lifetime.
/// - [`Connect`](FieldError::Connect) is transient. The engine retries at a
///   fixed interval for as long as an address is configured.
/// - Everything else is a cycle-level I/O failure. The engine tears the
///   connection down and reconnects on the next loop iteration.
///
/// None of these are ever escalated to a panic or process exit; the physical
/// controller's own watchdog is the safety backstop.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Invalid logical-to-physical pin mapping.
    #[error("invalid pin mapping: {reason}")]
    Mapping {
        /// Description of the mapping defect.
        reason: String,
    },

    /// TCP connection to the controller could not be established.
    #[error("connection failed: {0}")]
    Connect(#[source] io::Error),

    /// Controller rejected a request with a Modbus exception response.
    #[error("controller exception: function 0x{function:02X}, code 0x{code:02X} ({})", exception_description(*.code))]
    Exception {
        /// Function code the exception was raised for (without the 0x80 flag).
        function: u8,
        /// Modbus exception code.
        code: u8,
    },

    /// Invalid parameter provided to a request builder.
    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Malformed or short response received from the controller.
    #[error("invalid response: {reason}")]
    InvalidResponse {
        /// Description of the response defect.
        reason: String,
    },

    /// Communication timeout.
    #[error("communication timeout")]
    Timeout,

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FieldError {
    /// Creates a new `Mapping` error.
    ///
    /// # Example
    ///
    /// ```
    /// use field_plc::FieldError;
    ///
    /// let err = FieldError::mapping("coil pin 20 out of range");
    /// ```
    pub fn mapping(reason: impl Into<String>) -> Self {
        Self::Mapping {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use field_plc::FieldError;
    ///
    /// let err = FieldError::invalid_parameter("count", "must be greater than 0");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    ///
    /// # Example
    ///
    /// ```
    /// use field_plc::FieldError;
    ///
    /// let err = FieldError::invalid_response("response too short");
    /// ```
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Creates a new `Exception` error.
    pub fn exception(function: u8, code: u8) -> Self {
        Self::Exception { function, code }
    }
}

/// Returns a short description for a Modbus exception code.
///
/// # Example
///
/// ```
/// use field_plc::exception_description;
///
/// assert_eq!(exception_description(0x02), "illegal data address");
/// ```
pub fn exception_description(code: u8) -> &'static str {
    match code {
        0x01 => "illegal function",
        0x02 => "illegal data address",
        0x03 => "illegal data value",
        0x04 => "server device failure",
        0x05 => "acknowledge",
        0x06 => "server device busy",
        0x08 => "memory parity error",
        0x0A => "gateway path unavailable",
        0x0B => "gateway target failed to respond",
        _ => "unknown exception",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_display() {
        let err = FieldError::mapping("input pin 30 out of range");
        assert_eq!(
            err.to_string(),
            "invalid pin mapping: input pin 30 out of range"
        );
    }

    #[test]
    fn test_exception_display() {
        let err = FieldError::exception(0x02, 0x02);
        assert_eq!(
            err.to_string(),
            "controller exception: function 0x02, code 0x02 (illegal data address)"
        );
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = FieldError::invalid_parameter("count", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid parameter 'count': must be greater than 0"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = FieldError::Timeout;
        assert_eq!(err.to_string(), "communication timeout");
    }

    #[test]
    fn test_exception_description_unknown() {
        assert_eq!(exception_description(0x7F), "unknown exception");
    }
}
