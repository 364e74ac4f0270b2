//! Frame tracing
//!
//! Every frame the client sends or receives can be handed to a user hook and
//! is dumped at `debug` level as `Tx [00 01 00 00 00 06 02] 03 00 CB 00 06`.

use std::fmt;
use std::sync::Arc;

use crate::constants::MBAP_HEADER_LEN;

/// Which way a traced frame travelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDirection {
    Tx,
    Rx,
}

impl FrameDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameDirection::Tx => "Tx",
            FrameDirection::Rx => "Rx",
        }
    }
}

impl fmt::Display for FrameDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback receiving each raw frame
pub type TraceHook = Arc<dyn Fn(&[u8], FrameDirection) + Send + Sync>;

/// Upper-case hex dump with the MBAP header bracketed.
///
/// Frames shorter than a header are dumped without brackets.
pub fn format_frame(frame: &[u8]) -> String {
    fn hex_run(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    if frame.len() < MBAP_HEADER_LEN {
        return hex_run(frame);
    }
    let (header, pdu) = frame.split_at(MBAP_HEADER_LEN);
    if pdu.is_empty() {
        format!("[{}]", hex_run(header))
    } else {
        format!("[{}] {}", hex_run(header), hex_run(pdu))
    }
}
