//! Holding register operations
//!
//! Validates caller arguments, builds request PDUs and decodes responses for
//! the three supported functions:
//!
//! | Code | Function | Registers |
//! |------|----------|-----------|
//! | 0x03 | Read Holding Registers | 1-125 read |
//! | 0x10 | Write Multiple Registers | 1-123 written |
//! | 0x17 | Read/Write Multiple Registers | 1-121 written, 1-125 read |
//!
//! Every range is checked against the 16-bit address space before a PDU is
//! built, so an out-of-range request never reaches the transport.

use crate::constants::*;
use crate::error::{FrameError, ModbusError, ModbusResult};
use crate::pdu::{ModbusPdu, PduBuilder};
use crate::transport::Direction;

/// Check that `count` registers starting at `address` fit the limit and the
/// address space.
pub fn check_range(what: &str, address: u16, count: usize, max: usize) -> ModbusResult<()> {
    if count == 0 || count > max {
        return Err(ModbusError::validation(format!(
            "{} count {} out of range (valid from 1 to {})",
            what, count, max
        )));
    }
    if u32::from(address) + count as u32 > ADDRESS_SPACE {
        return Err(ModbusError::validation(format!(
            "{} of {} registers at {} runs past end of modbus address space",
            what, count, address
        )));
    }
    Ok(())
}

/// A validated holding register request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterRequest {
    /// FC03
    ReadHolding { address: u16, count: u16 },
    /// FC16
    WriteMultiple { address: u16, values: Vec<u16> },
    /// FC23
    WriteReadMultiple {
        write_address: u16,
        values: Vec<u16>,
        read_address: u16,
        read_count: u16,
    },
}

impl RegisterRequest {
    /// Read `count` holding registers at `address`
    pub fn read_holding(address: u16, count: u16) -> ModbusResult<Self> {
        check_range("read", address, count as usize, MAX_READ_REGISTERS)?;
        Ok(Self::ReadHolding { address, count })
    }

    /// Write `values` starting at `address`
    pub fn write_multiple(address: u16, values: &[u16]) -> ModbusResult<Self> {
        check_range("write", address, values.len(), MAX_WRITE_REGISTERS)?;
        Ok(Self::WriteMultiple {
            address,
            values: values.to_vec(),
        })
    }

    /// Write `values` at `write_address`, then read `read_count` registers at
    /// `read_address`, in one exchange
    pub fn write_read_multiple(
        write_address: u16,
        values: &[u16],
        read_address: u16,
        read_count: u16,
    ) -> ModbusResult<Self> {
        check_range("write", write_address, values.len(), MAX_WRITE_READ_REGISTERS)?;
        check_range("read", read_address, read_count as usize, MAX_READ_REGISTERS)?;
        Ok(Self::WriteReadMultiple {
            write_address,
            values: values.to_vec(),
            read_address,
            read_count,
        })
    }

    /// Function code of the request
    pub fn function_code(&self) -> u8 {
        match self {
            Self::ReadHolding { .. } => FC_READ_HOLDING_REGISTERS,
            Self::WriteMultiple { .. } => FC_WRITE_MULTIPLE_REGISTERS,
            Self::WriteReadMultiple { .. } => FC_WRITE_READ_MULTIPLE_REGISTERS,
        }
    }

    /// Gateway endpoint the request is posted to
    pub fn direction(&self) -> Direction {
        match self {
            Self::ReadHolding { .. } => Direction::Read,
            Self::WriteMultiple { .. } | Self::WriteReadMultiple { .. } => Direction::Write,
        }
    }

    /// Minimum PDU length of a non-exception response
    pub fn min_response_len(&self) -> usize {
        match self {
            Self::ReadHolding { .. } => READ_RESPONSE_MIN_LEN,
            Self::WriteMultiple { .. } => WRITE_RESPONSE_MIN_LEN,
            Self::WriteReadMultiple { .. } => WRITE_READ_RESPONSE_MIN_LEN,
        }
    }

    /// Build the request PDU
    pub fn to_pdu(&self) -> ModbusResult<ModbusPdu> {
        match self {
            Self::ReadHolding { address, count } => {
                PduBuilder::build_read_holding_registers(*address, *count)
            }
            Self::WriteMultiple { address, values } => {
                PduBuilder::build_write_multiple_registers(*address, values)
            }
            Self::WriteReadMultiple {
                write_address,
                values,
                read_address,
                read_count,
            } => PduBuilder::build_write_read_multiple_registers(
                *read_address,
                *read_count,
                *write_address,
                values,
            ),
        }
    }

    /// Decode the registers carried by a FC03 or FC23 response
    pub fn parse_registers(&self, pdu: &[u8]) -> Result<Vec<u16>, FrameError> {
        match self {
            Self::ReadHolding { count, .. }
            | Self::WriteReadMultiple {
                read_count: count, ..
            } => parse_register_response(pdu, self.function_code(), *count),
            Self::WriteMultiple { .. } => Err(FrameError::FunctionMismatch {
                expected: FC_READ_HOLDING_REGISTERS,
                actual: self.function_code(),
            }),
        }
    }

    /// Check the echo of a FC16 response
    pub fn parse_write_ack(&self, pdu: &[u8]) -> Result<bool, FrameError> {
        match self {
            Self::WriteMultiple { address, values } => {
                parse_write_response(pdu, *address, values.len() as u16)
            }
            _ => Err(FrameError::FunctionMismatch {
                expected: FC_WRITE_MULTIPLE_REGISTERS,
                actual: self.function_code(),
            }),
        }
    }
}

fn check_function(pdu: &[u8], expected: u8) -> Result<(), FrameError> {
    match pdu.first() {
        Some(&fc) if fc == expected => Ok(()),
        Some(&fc) => Err(FrameError::FunctionMismatch {
            expected,
            actual: fc,
        }),
        None => Err(FrameError::ShortFrame {
            context: "response PDU",
            needed: 1,
            available: 0,
        }),
    }
}

/// Decode `[fc, byte_count, registers...]` into `count` register values.
///
/// The byte count must equal both `2 * count` and the number of data bytes
/// present.
pub fn parse_register_response(pdu: &[u8], function: u8, count: u16) -> Result<Vec<u16>, FrameError> {
    check_function(pdu, function)?;
    if pdu.len() < 2 {
        return Err(FrameError::ShortFrame {
            context: "byte count",
            needed: 2,
            available: pdu.len(),
        });
    }

    let declared = pdu[1] as usize;
    let data = &pdu[2..];
    let expected = count as usize * 2;
    if declared != expected || declared != data.len() {
        return Err(FrameError::ByteCountMismatch {
            declared,
            expected,
            available: data.len(),
        });
    }

    Ok(data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Compare the address and quantity echoed by a FC16 response.
///
/// A well-formed echo of other values yields `Ok(false)`.
pub fn parse_write_response(pdu: &[u8], address: u16, count: u16) -> Result<bool, FrameError> {
    check_function(pdu, FC_WRITE_MULTIPLE_REGISTERS)?;
    if pdu.len() < WRITE_RESPONSE_MIN_LEN {
        return Err(FrameError::ShortFrame {
            context: "write echo",
            needed: WRITE_RESPONSE_MIN_LEN,
            available: pdu.len(),
        });
    }

    let echoed_address = u16::from_be_bytes([pdu[1], pdu[2]]);
    let echoed_count = u16::from_be_bytes([pdu[3], pdu[4]]);
    Ok(echoed_address == address && echoed_count == count)
}
