//! # Voltage Modbus Tunnel - Modbus registers over an HTTP gateway
//!
//! Async client for field nodes that are only reachable through a gateway
//! which relays hex-encoded Modbus/TCP frames over HTTP. The library builds
//! and checks the frames itself; the gateway only carries them.
//!
//! ## Features
//!
//! - **Strict framing**: MBAP header, unit id, transaction id and byte counts
//!   are checked on every response
//! - **Three error kinds**: caller mistakes, network failures and device
//!   exceptions are separate [`ModbusError`] variants
//! - **Inspectable state**: the last error and exception stay readable on the
//!   client after each call
//! - **Pluggable transport**: anything implementing [`TunnelConnector`]; the
//!   reqwest-based HTTP tunnel ships behind the `http` feature
//! - **Composite values**: 32-bit integers and floats across register pairs
//!   in any [`ByteOrder`]
//!
//! ## Supported Function Codes
//!
//! | Code | Function | Endpoint |
//! |------|----------|----------|
//! | 0x03 | Read Holding Registers | `/read` |
//! | 0x10 | Write Multiple Registers | `/write` |
//! | 0x17 | Read/Write Multiple Registers | `/write` |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use voltage_modbus_tunnel::{read_f32, ByteOrder, ConnectionConfig, ModbusResult, TunnelClient};
//!
//! #[tokio::main]
//! async fn main() -> ModbusResult<()> {
//!     let config = ConnectionConfig::new("192.168.0.20")?;
//!     let mut client = TunnelClient::http(config, "access-key");
//!
//!     // Observation block of unit 3: [temperature (2), status, humidity (2), status]
//!     let registers = client.read_holding_registers(3, 203, 6).await?;
//!     let temperature = read_f32(&registers, 0, ByteOrder::default());
//!     println!("temperature: {:?}", temperature);
//!
//!     if client.write_multiple_registers(4, 504, &[201, 1]).await? {
//!         println!("switch command accepted");
//!     }
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Protocol constants and gateway defaults
pub mod constants;

/// Error code and exception text tables, last request status
pub mod status;

/// Stack-allocated PDU and request builders
pub mod pdu;

/// MBAP frame encoding and response checking
pub mod frame;

/// Holding register requests and response parsing
pub mod registers;

/// Byte order handling for multi-register data types
pub mod bytes;

// ============================================================================
// Client
// ============================================================================

/// Connection configuration
pub mod config;

/// Tunnel transport traits
pub mod transport;

/// HTTP gateway transport
#[cfg(feature = "http")]
pub mod http;

/// Frame tracing helpers
pub mod trace;

/// Tunnel client
pub mod client;

/// Gateway node command and status codes
pub mod device;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime (users can use voltage_modbus_tunnel::tokio) ===
pub use tokio;

// === Core client API ===
pub use client::TunnelClient;
pub use config::ConnectionConfig;
pub use transport::{Direction, TransportStats, TunnelConnector, TunnelTransport};

#[cfg(feature = "http")]
pub use http::{HttpConnector, HttpTunnel};

// === Error handling ===
pub use error::{ErrorCode, FrameError, ModbusError, ModbusResult};
pub use status::LastStatus;

// === Tracing ===
pub use trace::{FrameDirection, TraceHook};

// === Composite values ===
pub use bytes::{
    f32_to_regs, i32_to_regs, read_f32, read_i32, regs_to_bytes_4, regs_to_f32, regs_to_i32,
    regs_to_u32, u32_to_regs, ByteOrder,
};

// === Protocol limits (commonly needed constants) ===
pub use constants::{
    MAX_PDU_SIZE, MAX_READ_REGISTERS, MAX_WRITE_READ_REGISTERS, MAX_WRITE_REGISTERS,
};

// === PDU (advanced usage) ===
pub use pdu::{ModbusPdu, PduBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!(
        "Voltage Modbus Tunnel v{} - Modbus register client over an HTTP gateway",
        VERSION
    )
}
