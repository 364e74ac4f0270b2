//! Modbus protocol constants used by the tunnel client
//!
//! Frame limits follow the Modbus application protocol:
//! - Maximum PDU size: 253 bytes (inherited from RS485 ADU limit of 256 bytes)
//! - Register limits are calculated to fit within the PDU size constraint
//!
//! Connection defaults mirror the values used by the gateway deployments.

// ============================================================================
// Frame Size Constants
// ============================================================================

/// MBAP header length as carried on the tunnel
/// Format: Transaction ID(2) + Protocol ID(2) + Length(2) + Unit ID(1) = 7 bytes
pub const MBAP_HEADER_LEN: usize = 7;

/// Protocol identifier; always 0 for Modbus
pub const MODBUS_PROTOCOL_ID: u16 = 0;

/// Exclusive upper bound for the MBAP length field (Unit ID + PDU)
pub const MBAP_LENGTH_LIMIT: u16 = 256;

/// Maximum PDU (Protocol Data Unit) size per Modbus specification
/// RS485 ADU (256 bytes) - Slave Address (1 byte) - CRC (2 bytes) = 253 bytes
pub const MAX_PDU_SIZE: usize = 253;

/// Smallest PDU a server can answer with (function code + exception code)
pub const MIN_RESPONSE_PDU_LEN: usize = 2;

/// Size of the 16-bit register address space (addresses 0..=65535)
pub const ADDRESS_SPACE: u32 = 0x1_0000;

// ============================================================================
// Register Operation Limits
// ============================================================================

/// Maximum number of registers for FC03 (Read Holding Registers)
///
/// Response PDU: FC(1) + Byte Count(1) + N × 2 ≤ 253 → N ≤ 125
pub const MAX_READ_REGISTERS: usize = 125;

/// Maximum number of registers for FC16 (Write Multiple Registers)
///
/// Request PDU: FC(1) + Address(2) + Quantity(2) + Byte Count(1) + N × 2 ≤ 253 → N ≤ 123
pub const MAX_WRITE_REGISTERS: usize = 123;

/// Maximum number of registers written by FC23 (Read/Write Multiple Registers)
///
/// Request PDU: FC(1) + Read Address(2) + Read Quantity(2) + Write Address(2)
/// + Write Quantity(2) + Byte Count(1) + N × 2 ≤ 253 → N ≤ 121
pub const MAX_WRITE_READ_REGISTERS: usize = 121;

// ============================================================================
// Modbus Function Codes
// ============================================================================

/// Read Holding Registers (FC03)
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;

/// Write Multiple Registers (FC16)
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Read/Write Multiple Registers (FC23)
pub const FC_WRITE_READ_MULTIPLE_REGISTERS: u8 = 0x17;

/// Bit set on the function code of an exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

// ============================================================================
// Minimum response PDU lengths (checked after exception detection)
// ============================================================================

/// FC03 response: FC + Byte Count + at least one data byte
pub const READ_RESPONSE_MIN_LEN: usize = 3;

/// FC16 response: FC + Address(2) + Quantity(2)
pub const WRITE_RESPONSE_MIN_LEN: usize = 5;

/// FC23 response: FC + Byte Count + at least one register
pub const WRITE_READ_RESPONSE_MIN_LEN: usize = 4;

// ============================================================================
// Modbus Exception Codes
// ============================================================================

/// Illegal Function
pub const EXCEPTION_ILLEGAL_FUNCTION: u8 = 0x01;

/// Illegal Data Address
pub const EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;

/// Illegal Data Value
pub const EXCEPTION_ILLEGAL_DATA_VALUE: u8 = 0x03;

/// Server Device Failure
pub const EXCEPTION_SERVER_DEVICE_FAILURE: u8 = 0x04;

/// Acknowledge
pub const EXCEPTION_ACKNOWLEDGE: u8 = 0x05;

/// Server Device Busy
pub const EXCEPTION_SERVER_DEVICE_BUSY: u8 = 0x06;

/// Memory Parity Error
pub const EXCEPTION_MEMORY_PARITY_ERROR: u8 = 0x08;

/// Gateway Path Unavailable
pub const EXCEPTION_GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;

/// Gateway Target Device Failed to Respond
pub const EXCEPTION_GATEWAY_TARGET_FAILED: u8 = 0x0B;

// ============================================================================
// Connection Defaults
// ============================================================================

/// Default gateway port
pub const DEFAULT_PORT: u16 = 9900;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Exclusive upper bound for the request timeout in seconds
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Default unit id addressed behind the gateway
pub const DEFAULT_UNIT_ID: u8 = 2;
