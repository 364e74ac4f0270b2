//! Tunnel transport boundary
//!
//! The client never touches sockets: it hands a hex-encoded frame to a
//! [`TunnelTransport`] and gets the hex-encoded response back. Sessions are
//! created by a [`TunnelConnector`] from the current [`ConnectionConfig`], so
//! a configuration change can drop the old session and build a new one.

use std::fmt;
use std::future::Future;

use crate::config::ConnectionConfig;
use crate::error::ModbusResult;

/// Gateway endpoint a frame is posted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Requests that only read registers
    Read,
    /// Requests that write registers
    Write,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One open tunnel session.
///
/// Implementations block the calling task until a response arrives or the
/// configured timeout elapses, and report failures as
/// [`ModbusError::Network`](crate::ModbusError::Network) with code `Connect`,
/// `Send` or `Timeout`.
pub trait TunnelTransport: Send {
    /// Exchange one hex-encoded frame for the hex-encoded response
    fn exchange(
        &mut self,
        command: &str,
        direction: Direction,
    ) -> impl Future<Output = ModbusResult<String>> + Send;
}

/// Factory for tunnel sessions
pub trait TunnelConnector: Send {
    type Transport: TunnelTransport;

    /// Open a session for `config`
    fn connect(&self, config: &ConnectionConfig) -> ModbusResult<Self::Transport>;
}

/// Transport statistics accumulated by a client
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub exceptions: u64,
}
