//! # Tunnel Client Error Handling
//!
//! Every failure a request can produce falls into one of three kinds:
//!
//! - **Validation**: the caller passed arguments outside the protocol contract.
//!   Returned before any frame is built; never recorded as last-error state.
//! - **Network**: the tunnel transport failed, or the response frame could not
//!   be accepted ([`FrameError`]). Recorded on the client.
//! - **Exception**: the remote node answered with an exception response.
//!   Recorded on the client together with its exception code.
//!
//! ```rust
//! use voltage_modbus_tunnel::{ErrorCode, ModbusError};
//!
//! fn describe(error: &ModbusError) -> String {
//!     match error {
//!         ModbusError::Validation { message } => format!("fix the caller: {}", message),
//!         ModbusError::Network { code, .. } if *code == ErrorCode::Timeout => "retry later".into(),
//!         ModbusError::Network { message, .. } => format!("network: {}", message),
//!         ModbusError::Exception { code, message, .. } => format!("device said {:02X}: {}", code, message),
//!     }
//! }
//! ```

use std::fmt;

use thiserror::Error;

use crate::constants::{EXCEPTION_ACKNOWLEDGE, EXCEPTION_SERVER_DEVICE_BUSY};
use crate::status::exception_text;

/// Result type alias for tunnel client operations
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Last-error code recorded by the client after a failed request.
///
/// The numeric values are stable and shared with the gateway tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    /// No error recorded
    #[default]
    NoError,
    /// Transport session could not be established
    Connect,
    /// Request could not be delivered or the gateway rejected it
    Send,
    /// Response missing, malformed or inconsistent
    Recv,
    /// No response within the configured timeout
    Timeout,
    /// Remote node answered with a Modbus exception
    Exception,
}

impl ErrorCode {
    /// Numeric code
    pub fn code(&self) -> u8 {
        match self {
            Self::NoError => 0,
            Self::Connect => 2,
            Self::Send => 3,
            Self::Recv => 4,
            Self::Timeout => 5,
            Self::Exception => 7,
        }
    }

    /// Human-readable text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoError => "no error",
            Self::Connect => "connect error",
            Self::Send => "send error",
            Self::Recv => "recv error",
            Self::Timeout => "recv timeout occur",
            Self::Exception => "modbus exception",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reasons a response frame is rejected by the codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than the frame layout requires
    #[error("short frame: {context} needs {needed} bytes, {available} available")]
    ShortFrame {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// MBAP protocol identifier is not 0
    #[error("protocol id mismatch: {protocol_id}")]
    ProtocolMismatch { protocol_id: u16 },

    /// MBAP length field is 256 or more
    #[error("length field out of range: {length}")]
    LengthOutOfRange { length: u16 },

    /// Response addressed from a different unit
    #[error("unit id mismatch: expected {expected}, got {actual}")]
    UnitMismatch { expected: u8, actual: u8 },

    /// Response correlates to another request
    #[error("transaction id mismatch: expected {expected}, got {actual}")]
    TransactionMismatch { expected: u16, actual: u16 },

    /// Response function code does not echo the request
    #[error("function code mismatch: expected {expected:02X}, got {actual:02X}")]
    FunctionMismatch { expected: u8, actual: u8 },

    /// Byte count field disagrees with the request or the bytes present
    #[error("rx byte count mismatch: declared {declared}, expected {expected}, available {available}")]
    ByteCountMismatch {
        declared: usize,
        expected: usize,
        available: usize,
    },
}

impl FrameError {
    /// Whether the failure was detected in the MBAP header
    pub fn is_header_error(&self) -> bool {
        matches!(
            self,
            Self::ProtocolMismatch { .. }
                | Self::LengthOutOfRange { .. }
                | Self::UnitMismatch { .. }
                | Self::TransactionMismatch { .. }
        )
    }
}

/// Tunnel client error taxonomy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModbusError {
    /// Caller argument out of contract
    #[error("Invalid argument: {message}")]
    Validation { message: String },

    /// Transport or framing failure
    ///
    /// `frame` holds the codec failure when the response itself was rejected.
    #[error("Network error ({code}): {message}")]
    Network {
        code: ErrorCode,
        message: String,
        frame: Option<FrameError>,
    },

    /// Exception response reported by the remote node
    #[error("Modbus exception: function={function:02X}, code={code:02X} ({message})")]
    Exception { function: u8, code: u8, message: String },
}

impl ModbusError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a network error without a frame cause
    pub fn network<S: Into<String>>(code: ErrorCode, message: S) -> Self {
        Self::Network {
            code,
            message: message.into(),
            frame: None,
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::network(ErrorCode::Timeout, message)
    }

    /// Create an exception error; `function` may carry the exception flag
    pub fn exception(function: u8, code: u8) -> Self {
        Self::Exception {
            function: function & 0x7F,
            code,
            message: exception_text(code),
        }
    }

    /// Check if this is a caller argument error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this is a transport or framing error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if this is a device exception
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Exception { .. })
    }

    /// Whether retrying the same request may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation { .. } => false,
            Self::Network { .. } => true,
            Self::Exception { code, .. } => {
                matches!(*code, EXCEPTION_ACKNOWLEDGE | EXCEPTION_SERVER_DEVICE_BUSY)
            }
        }
    }

    /// Last-error code this error records
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::NoError,
            Self::Network { code, .. } => *code,
            Self::Exception { .. } => ErrorCode::Exception,
        }
    }

    /// Exception code, for device exceptions
    pub fn exception_code(&self) -> Option<u8> {
        match self {
            Self::Exception { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Codec failure behind a network error
    pub fn frame_error(&self) -> Option<&FrameError> {
        match self {
            Self::Network { frame, .. } => frame.as_ref(),
            _ => None,
        }
    }
}

impl From<FrameError> for ModbusError {
    fn from(err: FrameError) -> Self {
        Self::Network {
            code: ErrorCode::Recv,
            message: err.to_string(),
            frame: Some(err),
        }
    }
}

impl From<hex::FromHexError> for ModbusError {
    fn from(err: hex::FromHexError) -> Self {
        Self::network(ErrorCode::Recv, format!("invalid hex response: {}", err))
    }
}
