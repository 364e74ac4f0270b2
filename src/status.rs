//! Exception text tables and per-client last-status bookkeeping

use crate::constants::*;
use crate::error::{ErrorCode, ModbusError};

/// Short description of a Modbus exception code
pub fn exception_short_text(code: u8) -> Option<&'static str> {
    let text = match code {
        EXCEPTION_ILLEGAL_FUNCTION => "illegal function",
        EXCEPTION_ILLEGAL_DATA_ADDRESS => "illegal data address",
        EXCEPTION_ILLEGAL_DATA_VALUE => "illegal data value",
        EXCEPTION_SERVER_DEVICE_FAILURE => "slave device failure",
        EXCEPTION_ACKNOWLEDGE => "acknowledge",
        EXCEPTION_SERVER_DEVICE_BUSY => "slave device busy",
        EXCEPTION_MEMORY_PARITY_ERROR => "memory parity error",
        EXCEPTION_GATEWAY_PATH_UNAVAILABLE => "gateway path unavailable",
        EXCEPTION_GATEWAY_TARGET_FAILED => "gateway target device failed to respond",
        _ => return None,
    };
    Some(text)
}

/// Verbose description of a Modbus exception code
pub fn exception_verbose_text(code: u8) -> Option<&'static str> {
    let text = match code {
        EXCEPTION_ILLEGAL_FUNCTION => {
            "The function code received in the query is not an allowable action for the server. \
             The unit may not implement it."
        }
        EXCEPTION_ILLEGAL_DATA_ADDRESS => {
            "The data address received in the query is not an allowable address for the server: \
             the combination of start address and transfer length is invalid."
        }
        EXCEPTION_ILLEGAL_DATA_VALUE => {
            "A value contained in the query data field is not an allowable value for the server, \
             or the structure of the request is inconsistent with its implied length."
        }
        EXCEPTION_SERVER_DEVICE_FAILURE => {
            "An unrecoverable error occurred while the server was attempting to perform the \
             requested action."
        }
        EXCEPTION_ACKNOWLEDGE => {
            "The server has accepted the request and is processing it, but a long duration of \
             time will be required to do so."
        }
        EXCEPTION_SERVER_DEVICE_BUSY => {
            "The server is engaged in processing a long-duration command. The client should \
             retransmit the message later."
        }
        EXCEPTION_MEMORY_PARITY_ERROR => {
            "The extended file area failed to pass a consistency check on the server."
        }
        EXCEPTION_GATEWAY_PATH_UNAVAILABLE => {
            "The gateway was unable to allocate an internal communication path to the target; \
             it is usually misconfigured or overloaded."
        }
        EXCEPTION_GATEWAY_TARGET_FAILED => {
            "No response was obtained from the target device behind the gateway; it is usually \
             not present on the network."
        }
        _ => return None,
    };
    Some(text)
}

fn unreferenced(code: u8) -> String {
    format!("unreferenced exception 0x{:X}", code)
}

/// Short text, falling back to `unreferenced exception 0x..`
pub fn exception_text(code: u8) -> String {
    exception_short_text(code)
        .map(str::to_string)
        .unwrap_or_else(|| unreferenced(code))
}

/// Verbose text, falling back to `unreferenced exception 0x..`
pub fn exception_details(code: u8) -> String {
    exception_verbose_text(code)
        .map(str::to_string)
        .unwrap_or_else(|| unreferenced(code))
}

/// Outcome of the most recent request on a client.
///
/// Reset when a new request starts; written when a network failure or device
/// exception ends it. Validation failures leave it untouched after the reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LastStatus {
    error: ErrorCode,
    exception: Option<u8>,
}

impl LastStatus {
    /// Clear both fields
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a failed request
    pub fn record(&mut self, err: &ModbusError) {
        match err {
            ModbusError::Validation { .. } => {}
            ModbusError::Network { code, .. } => self.error = *code,
            ModbusError::Exception { code, .. } => {
                self.error = ErrorCode::Exception;
                self.exception = Some(*code);
            }
        }
    }

    /// Last error code
    pub fn error(&self) -> ErrorCode {
        self.error
    }

    /// Last exception code, if the last request ended with one
    pub fn exception(&self) -> Option<u8> {
        self.exception
    }

    /// Text for the last error code
    pub fn error_text(&self) -> &'static str {
        self.error.as_str()
    }

    /// Short text for the last exception
    pub fn exception_text(&self) -> String {
        match self.exception {
            Some(code) => exception_text(code),
            None => "no exception".to_string(),
        }
    }

    /// Verbose text for the last exception
    pub fn exception_details(&self) -> String {
        match self.exception {
            Some(code) => exception_details(code),
            None => "no exception".to_string(),
        }
    }

    /// Whether the last request completed without error
    pub fn is_ok(&self) -> bool {
        self.error == ErrorCode::NoError
    }
}
