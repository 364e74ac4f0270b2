//! Gateway node code tables
//!
//! Actuator and irrigation nodes behind the gateway take commands as a
//! register block `[command, opid, params...]` and report their state as
//! status codes. Thirty-two bit parameters (durations, set points) use the
//! node word order, [`ByteOrder::BigEndianSwap`].
//!
//! Sensor nodes expose observation blocks of three registers per value:
//! `[value (2), status, value (2), status, ...]`.

use std::fmt;

use crate::bytes::{f32_to_regs, i32_to_regs, read_f32, ByteOrder};
use crate::constants::MAX_WRITE_REGISTERS;
use crate::error::{ModbusError, ModbusResult};

/// Command codes accepted by gateway nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    Off,
    /// Hand node control to the mode given as the first parameter
    ChangeControl,
    On,
    TimedOn,
    Open,
    Close,
    TimedOpen,
    TimedClose,
    OnceWater,
    JustWater,
    NutrientWater,
}

impl CommandCode {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            2 => Some(Self::ChangeControl),
            201 => Some(Self::On),
            202 => Some(Self::TimedOn),
            301 => Some(Self::Open),
            302 => Some(Self::Close),
            303 => Some(Self::TimedOpen),
            304 => Some(Self::TimedClose),
            401 => Some(Self::OnceWater),
            402 => Some(Self::JustWater),
            403 => Some(Self::NutrientWater),
            _ => None,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Off => 0,
            Self::ChangeControl => 2,
            Self::On => 201,
            Self::TimedOn => 202,
            Self::Open => 301,
            Self::Close => 302,
            Self::TimedOpen => 303,
            Self::TimedClose => 304,
            Self::OnceWater => 401,
            Self::JustWater => 402,
            Self::NutrientWater => 403,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::ChangeControl => "change control",
            Self::On => "on",
            Self::TimedOn => "timed on",
            Self::Open => "open",
            Self::Close => "close",
            Self::TimedOpen => "timed open",
            Self::TimedClose => "timed close",
            Self::OnceWater => "once water",
            Self::JustWater => "just water",
            Self::NutrientWater => "nutrient water",
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating state reported by gateway nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ready,
    Error,
    Busy,
    Working,
    Opening,
    Closing,
    Preparing,
    Supplying,
    Finishing,
}

impl StatusCode {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Ready),
            1 => Some(Self::Error),
            2 => Some(Self::Busy),
            201 => Some(Self::Working),
            301 => Some(Self::Opening),
            302 => Some(Self::Closing),
            401 => Some(Self::Preparing),
            402 => Some(Self::Supplying),
            403 => Some(Self::Finishing),
            _ => None,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Ready => 0,
            Self::Error => 1,
            Self::Busy => 2,
            Self::Working => 201,
            Self::Opening => 301,
            Self::Closing => 302,
            Self::Preparing => 401,
            Self::Supplying => 402,
            Self::Finishing => 403,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Busy => "busy",
            Self::Working => "working",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Preparing => "preparing",
            Self::Supplying => "supplying",
            Self::Finishing => "finishing",
        }
    }

    /// Whether the node is idle and accepts a new command
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who currently controls a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlMode {
    Local,
    Remote,
    Manual,
}

impl ControlMode {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Local),
            2 => Some(Self::Remote),
            3 => Some(Self::Manual),
            _ => None,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Local => 1,
            Self::Remote => 2,
            Self::Manual => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register block carrying one node command.
///
/// ```rust
/// use voltage_modbus_tunnel::device::{CommandCode, NodeCommand};
///
/// let block = NodeCommand::new(CommandCode::TimedOn, 3)
///     .push_i32(10)
///     .into_registers()
///     .unwrap();
/// assert_eq!(block, vec![202, 3, 10, 0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCommand {
    registers: Vec<u16>,
    order: ByteOrder,
}

impl NodeCommand {
    pub fn new(command: CommandCode, opid: u16) -> Self {
        Self {
            registers: vec![command.code(), opid],
            order: ByteOrder::default(),
        }
    }

    /// `[2, opid, mode]`: hand control of the node to `mode`
    pub fn change_control(opid: u16, mode: ControlMode) -> Self {
        Self::new(CommandCode::ChangeControl, opid).push_u16(mode.code())
    }

    /// Use `order` for the 32-bit parameters pushed after this call
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    pub fn push_u16(mut self, value: u16) -> Self {
        self.registers.push(value);
        self
    }

    /// Append a 32-bit signed parameter, such as a duration in seconds
    pub fn push_i32(mut self, value: i32) -> Self {
        self.registers.extend_from_slice(&i32_to_regs(value, self.order));
        self
    }

    /// Append a 32-bit float parameter, such as an EC or pH set point
    pub fn push_f32(mut self, value: f32) -> Self {
        self.registers.extend_from_slice(&f32_to_regs(value, self.order));
        self
    }

    /// Registers built so far
    pub fn registers(&self) -> &[u16] {
        &self.registers
    }

    /// Finish the block, checking it fits one write request
    pub fn into_registers(self) -> ModbusResult<Vec<u16>> {
        if self.registers.len() > MAX_WRITE_REGISTERS {
            return Err(ModbusError::validation(format!(
                "command block of {} registers exceeds {}",
                self.registers.len(),
                MAX_WRITE_REGISTERS
            )));
        }
        Ok(self.registers)
    }
}

/// Registers per observation: a float value followed by its status
pub const OBSERVATION_STRIDE: usize = 3;

/// Value of the `index`-th observation in a sensor block
pub fn read_observation(block: &[u16], index: usize) -> Option<f32> {
    read_f32(block, index.checked_mul(OBSERVATION_STRIDE)?, ByteOrder::default())
}

/// Status register of the `index`-th observation in a sensor block
pub fn observation_status(block: &[u16], index: usize) -> Option<u16> {
    let offset = index.checked_mul(OBSERVATION_STRIDE)?.checked_add(2)?;
    block.get(offset).copied()
}
