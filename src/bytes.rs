//! # Composite register values
//!
//! 32-bit integers and floats span two consecutive holding registers. The
//! order in which the four bytes are laid out across the pair differs between
//! devices, so every conversion takes a [`ByteOrder`].
//!
//! ## Naming Convention
//!
//! Uses ABCD notation where A is the most significant byte and D the least.
//! For the 32-bit value `0x12345678` the register pair is:
//!
//! - `BigEndian (ABCD)`: \[0x1234, 0x5678\]
//! - `LittleEndian (DCBA)`: \[0x7856, 0x3412\]
//! - `BigEndianSwap (CDAB)`: \[0x5678, 0x1234\] (gateway nodes, low register first)
//! - `LittleEndianSwap (BADC)`: \[0x3412, 0x7856\]
//!
//! Every conversion is a bit-exact round trip, including NaN payloads and
//! negative zero.

use std::fmt;

/// Byte/word order of a 32-bit value spread over two registers.
///
/// # Example
///
/// ```rust
/// use voltage_modbus_tunnel::ByteOrder;
///
/// let order = ByteOrder::from_str("CDAB").unwrap();
/// assert_eq!(order, ByteOrder::BigEndianSwap);
/// assert!(order.has_word_swap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// ABCD: high register first, each register big-endian
    BigEndian,

    /// DCBA: fully reversed
    LittleEndian,

    /// CDAB: low register first, each register big-endian
    ///
    /// The layout used by the gateway nodes.
    BigEndianSwap,

    /// BADC: high register first, bytes swapped inside each register
    LittleEndianSwap,
}

impl ByteOrder {
    /// Parse the common string spellings (`ABCD`, `CD-AB`, `be`, ...).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match normalized.as_str() {
            "ABCD" | "BE" | "BIGENDIAN" => Some(Self::BigEndian),
            "DCBA" | "LE" | "LITTLEENDIAN" => Some(Self::LittleEndian),
            "CDAB" | "BIGENDIANSWAP" => Some(Self::BigEndianSwap),
            "BADC" | "LITTLEENDIANSWAP" => Some(Self::LittleEndianSwap),
            _ => None,
        }
    }

    /// Get descriptive name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BigEndian => "ABCD (Big-Endian)",
            Self::LittleEndian => "DCBA (Little-Endian)",
            Self::BigEndianSwap => "CDAB (Big-Endian Swap)",
            Self::LittleEndianSwap => "BADC (Little-Endian Swap)",
        }
    }

    /// Check if words are swapped.
    #[inline]
    pub fn has_word_swap(&self) -> bool {
        matches!(self, Self::BigEndianSwap | Self::LittleEndianSwap)
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for ByteOrder {
    /// Default to the gateway node layout (CDAB, low register first).
    fn default() -> Self {
        Self::BigEndianSwap
    }
}

// ============================================================================
// Register <-> Bytes
// ============================================================================

/// Convert 2 registers to the 4 bytes of a big-endian value.
///
/// # Example
///
/// ```rust
/// use voltage_modbus_tunnel::{ByteOrder, regs_to_bytes_4};
///
/// let regs = [0x1234, 0x5678];
/// assert_eq!(regs_to_bytes_4(&regs, ByteOrder::BigEndian), [0x12, 0x34, 0x56, 0x78]);
/// assert_eq!(regs_to_bytes_4(&regs, ByteOrder::BigEndianSwap), [0x56, 0x78, 0x12, 0x34]);
/// ```
#[inline]
pub fn regs_to_bytes_4(regs: &[u16; 2], order: ByteOrder) -> [u8; 4] {
    let [h0, h1] = [regs[0].to_be_bytes(), regs[1].to_be_bytes()];

    match order {
        ByteOrder::BigEndian => [h0[0], h0[1], h1[0], h1[1]],        // ABCD
        ByteOrder::LittleEndian => [h1[1], h1[0], h0[1], h0[0]],     // DCBA
        ByteOrder::BigEndianSwap => [h1[0], h1[1], h0[0], h0[1]],    // CDAB
        ByteOrder::LittleEndianSwap => [h0[1], h0[0], h1[1], h1[0]], // BADC
    }
}

/// Convert the 4 bytes of a big-endian value to 2 registers.
#[inline]
pub fn bytes_4_to_regs(bytes: &[u8; 4], order: ByteOrder) -> [u16; 2] {
    match order {
        ByteOrder::BigEndian => [
            u16::from_be_bytes([bytes[0], bytes[1]]),
            u16::from_be_bytes([bytes[2], bytes[3]]),
        ],
        ByteOrder::LittleEndian => [
            u16::from_be_bytes([bytes[3], bytes[2]]),
            u16::from_be_bytes([bytes[1], bytes[0]]),
        ],
        ByteOrder::BigEndianSwap => [
            u16::from_be_bytes([bytes[2], bytes[3]]),
            u16::from_be_bytes([bytes[0], bytes[1]]),
        ],
        ByteOrder::LittleEndianSwap => [
            u16::from_be_bytes([bytes[1], bytes[0]]),
            u16::from_be_bytes([bytes[3], bytes[2]]),
        ],
    }
}

// ============================================================================
// Register pair -> 32-bit value
// ============================================================================

/// Convert 2 registers to u32.
#[inline]
pub fn regs_to_u32(regs: &[u16; 2], order: ByteOrder) -> u32 {
    u32::from_be_bytes(regs_to_bytes_4(regs, order))
}

/// Convert 2 registers to i32.
#[inline]
pub fn regs_to_i32(regs: &[u16; 2], order: ByteOrder) -> i32 {
    i32::from_be_bytes(regs_to_bytes_4(regs, order))
}

/// Convert 2 registers to f32.
#[inline]
pub fn regs_to_f32(regs: &[u16; 2], order: ByteOrder) -> f32 {
    f32::from_bits(regs_to_u32(regs, order))
}

// ============================================================================
// 32-bit value -> Register pair
// ============================================================================

/// Convert u32 to 2 registers.
#[inline]
pub fn u32_to_regs(value: u32, order: ByteOrder) -> [u16; 2] {
    bytes_4_to_regs(&value.to_be_bytes(), order)
}

/// Convert i32 to 2 registers.
#[inline]
pub fn i32_to_regs(value: i32, order: ByteOrder) -> [u16; 2] {
    bytes_4_to_regs(&value.to_be_bytes(), order)
}

/// Convert f32 to 2 registers.
#[inline]
pub fn f32_to_regs(value: f32, order: ByteOrder) -> [u16; 2] {
    u32_to_regs(value.to_bits(), order)
}

// ============================================================================
// Slice readers
// ============================================================================

fn pair_at(regs: &[u16], offset: usize) -> Option<[u16; 2]> {
    let pair = regs.get(offset..offset.checked_add(2)?)?;
    Some([pair[0], pair[1]])
}

/// Read an i32 from `regs[offset..offset + 2]`; `None` if out of bounds.
///
/// ```rust
/// use voltage_modbus_tunnel::{read_i32, ByteOrder};
///
/// // status block: [opid, state, remaining time (2 registers)]
/// let block = [3, 201, 10, 0];
/// assert_eq!(read_i32(&block, 2, ByteOrder::BigEndianSwap), Some(10));
/// ```
pub fn read_i32(regs: &[u16], offset: usize, order: ByteOrder) -> Option<i32> {
    pair_at(regs, offset).map(|pair| regs_to_i32(&pair, order))
}

/// Read an f32 from `regs[offset..offset + 2]`; `None` if out of bounds.
pub fn read_f32(regs: &[u16], offset: usize, order: ByteOrder) -> Option<f32> {
    pair_at(regs, offset).map(|pair| regs_to_f32(&pair, order))
}

// ============================================================================
// Tests
// ============================================================================
