//! MBAP frame codec
//!
//! A tunnel frame is the 7-byte MBAP header followed by the PDU, every
//! multi-byte field big-endian:
//!
//! ```text
//! +----------------+-------------+--------+---------+-----------------+
//! | transaction id | protocol id | length | unit id | PDU             |
//! | 2 bytes        | 2 bytes (0) | 2      | 1       | length - 1      |
//! +----------------+-------------+--------+---------+-----------------+
//! ```
//!
//! The codec is pure: no I/O and no state. Hex conversion for the tunnel
//! happens in the client.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::constants::{
    EXCEPTION_FLAG, MBAP_HEADER_LEN, MBAP_LENGTH_LIMIT, MIN_RESPONSE_PDU_LEN, MODBUS_PROTOCOL_ID,
};
use crate::error::{FrameError, ModbusError, ModbusResult};

/// MBAP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    pub transaction_id: u16,
    pub protocol_id: u16,
    /// Byte count of unit id + PDU
    pub length: u16,
    pub unit_id: u8,
}

impl MbapHeader {
    /// Header for a PDU of `pdu_len` bytes
    pub fn for_pdu(transaction_id: u16, unit_id: u8, pdu_len: usize) -> Result<Self, FrameError> {
        let length = u16::try_from(pdu_len + 1).unwrap_or(u16::MAX);
        if length >= MBAP_LENGTH_LIMIT {
            return Err(FrameError::LengthOutOfRange { length });
        }
        Ok(Self {
            transaction_id,
            protocol_id: MODBUS_PROTOCOL_ID,
            length,
            unit_id,
        })
    }

    /// Parse the first 7 bytes of `raw`
    pub fn parse(raw: &[u8]) -> Result<Self, FrameError> {
        if raw.len() < MBAP_HEADER_LEN {
            return Err(FrameError::ShortFrame {
                context: "MBAP header",
                needed: MBAP_HEADER_LEN,
                available: raw.len(),
            });
        }
        let mut buf = &raw[..MBAP_HEADER_LEN];
        Ok(Self {
            transaction_id: buf.get_u16(),
            protocol_id: buf.get_u16(),
            length: buf.get_u16(),
            unit_id: buf.get_u8(),
        })
    }

    /// Write the header in wire order
    pub fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(self.transaction_id);
        buf.put_u16(self.protocol_id);
        buf.put_u16(self.length);
        buf.put_u8(self.unit_id);
    }

    /// Number of PDU bytes announced by the length field
    #[inline]
    pub fn pdu_len(&self) -> usize {
        (self.length as usize).saturating_sub(1)
    }
}

/// Build a complete frame: MBAP header followed by `pdu`
pub fn encode(pdu: &[u8], transaction_id: u16, unit_id: u8) -> Result<Bytes, FrameError> {
    let header = MbapHeader::for_pdu(transaction_id, unit_id, pdu.len())?;
    let mut buf = BytesMut::with_capacity(MBAP_HEADER_LEN + pdu.len());
    header.put(&mut buf);
    buf.put_slice(pdu);
    Ok(buf.freeze())
}

/// What a response frame must match to be accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameExpectation {
    pub unit_id: u8,
    pub transaction_id: u16,
    /// Minimum PDU length for a non-exception response
    pub min_pdu_len: usize,
    /// Compare the echoed transaction id with the one sent
    pub check_transaction: bool,
}

impl FrameExpectation {
    /// Strict expectation with the minimal PDU length
    pub fn new(unit_id: u8, transaction_id: u16) -> Self {
        Self {
            unit_id,
            transaction_id,
            min_pdu_len: MIN_RESPONSE_PDU_LEN,
            check_transaction: true,
        }
    }

    /// Set the minimum accepted PDU length
    pub fn with_min_pdu_len(mut self, len: usize) -> Self {
        self.min_pdu_len = len;
        self
    }

    /// Enable or disable transaction id correlation
    pub fn with_transaction_check(mut self, enabled: bool) -> Self {
        self.check_transaction = enabled;
        self
    }
}

/// Validate a response frame and return its PDU.
///
/// Exception responses (function code with the high bit set) are returned as
/// [`ModbusError::Exception`]; every other rejection is a [`FrameError`]
/// converted into [`ModbusError::Network`]. Bytes after the announced PDU are
/// ignored.
pub fn decode<'a>(raw: &'a [u8], expect: &FrameExpectation) -> ModbusResult<&'a [u8]> {
    let header = MbapHeader::parse(raw)?;

    if header.protocol_id != MODBUS_PROTOCOL_ID {
        return Err(FrameError::ProtocolMismatch {
            protocol_id: header.protocol_id,
        }
        .into());
    }
    if header.length >= MBAP_LENGTH_LIMIT {
        return Err(FrameError::LengthOutOfRange {
            length: header.length,
        }
        .into());
    }
    if header.unit_id != expect.unit_id {
        return Err(FrameError::UnitMismatch {
            expected: expect.unit_id,
            actual: header.unit_id,
        }
        .into());
    }
    if expect.check_transaction && header.transaction_id != expect.transaction_id {
        return Err(FrameError::TransactionMismatch {
            expected: expect.transaction_id,
            actual: header.transaction_id,
        }
        .into());
    }

    let body = &raw[MBAP_HEADER_LEN..];
    let pdu_len = header.pdu_len();
    if body.len() < pdu_len {
        return Err(FrameError::ShortFrame {
            context: "PDU",
            needed: pdu_len,
            available: body.len(),
        }
        .into());
    }
    if body.len() > pdu_len {
        trace!("ignoring {} trailing bytes after PDU", body.len() - pdu_len);
    }
    let pdu = &body[..pdu_len];

    if pdu.len() < MIN_RESPONSE_PDU_LEN {
        return Err(FrameError::ShortFrame {
            context: "PDU",
            needed: MIN_RESPONSE_PDU_LEN,
            available: pdu.len(),
        }
        .into());
    }
    if pdu[0] & EXCEPTION_FLAG != 0 {
        return Err(ModbusError::exception(pdu[0], pdu[1]));
    }
    if pdu.len() < expect.min_pdu_len {
        return Err(FrameError::ShortFrame {
            context: "response PDU",
            needed: expect.min_pdu_len,
            available: pdu.len(),
        }
        .into());
    }

    Ok(pdu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(tid: u16, protocol: u16, length: u16, unit: u8, pdu: &[u8]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&tid.to_be_bytes());
        raw.extend_from_slice(&protocol.to_be_bytes());
        raw.extend_from_slice(&length.to_be_bytes());
        raw.push(unit);
        raw.extend_from_slice(pdu);
        raw
    }

    fn frame_error(err: ModbusError) -> FrameError {
        err.frame_error().cloned().expect("expected a frame error")
    }

    #[test]
    fn test_encode_layout() {
        let out = encode(&[0x03, 0x00, 0xCB, 0x00, 0x06], 0x1234, 3).unwrap();
        assert_eq!(
            out.as_ref(),
            &[0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0x03, 0x03, 0x00, 0xCB, 0x00, 0x06]
        );
    }

    #[test]
    fn test_encode_rejects_oversized_pdu() {
        assert!(encode(&[0u8; 254], 1, 1).is_ok());
        assert_eq!(
            encode(&[0u8; 255], 1, 1).unwrap_err(),
            FrameError::LengthOutOfRange { length: 256 }
        );
    }

    #[test]
    fn test_decode_valid() {
        let raw = frame(7, 0, 9, 2, &[0x03, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]);
        let pdu = decode(&raw, &FrameExpectation::new(2, 7)).unwrap();
        assert_eq!(pdu, &[0x03, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]);
    }

    #[test]
    fn test_decode_short_header() {
        let err = decode(&[0x00, 0x01, 0x00], &FrameExpectation::new(1, 1)).unwrap_err();
        assert!(matches!(
            frame_error(err),
            FrameError::ShortFrame { needed: 7, available: 3, .. }
        ));
    }

    #[test]
    fn test_decode_protocol_mismatch() {
        let raw = frame(1, 1, 3, 1, &[0x03, 0x00]);
        let err = decode(&raw, &FrameExpectation::new(1, 1)).unwrap_err();
        assert_eq!(frame_error(err), FrameError::ProtocolMismatch { protocol_id: 1 });
    }

    #[test]
    fn test_decode_length_out_of_range() {
        let raw = frame(1, 0, 256, 1, &[0x03, 0x00]);
        let err = decode(&raw, &FrameExpectation::new(1, 1)).unwrap_err();
        assert_eq!(frame_error(err), FrameError::LengthOutOfRange { length: 256 });
    }

    #[test]
    fn test_decode_unit_mismatch() {
        let raw = frame(1, 0, 3, 9, &[0x03, 0x00]);
        let err = decode(&raw, &FrameExpectation::new(1, 1)).unwrap_err();
        assert_eq!(
            frame_error(err),
            FrameError::UnitMismatch { expected: 1, actual: 9 }
        );
    }

    #[test]
    fn test_decode_transaction_check_toggle() {
        let raw = frame(0, 0, 3, 1, &[0x10, 0x00]);
        let strict = FrameExpectation::new(1, 0xBEEF);
        let err = decode(&raw, &strict).unwrap_err();
        assert_eq!(
            frame_error(err),
            FrameError::TransactionMismatch { expected: 0xBEEF, actual: 0 }
        );

        let lenient = strict.with_transaction_check(false);
        assert_eq!(decode(&raw, &lenient).unwrap(), &[0x10, 0x00]);
    }

    #[test]
    fn test_decode_truncated_pdu() {
        let raw = frame(1, 0, 6, 1, &[0x03, 0x02]);
        let err = decode(&raw, &FrameExpectation::new(1, 1)).unwrap_err();
        assert!(matches!(
            frame_error(err),
            FrameError::ShortFrame { needed: 5, available: 2, .. }
        ));
    }

    #[test]
    fn test_decode_pdu_below_minimum() {
        let raw = frame(1, 0, 2, 1, &[0x03]);
        let err = decode(&raw, &FrameExpectation::new(1, 1)).unwrap_err();
        assert!(matches!(
            frame_error(err),
            FrameError::ShortFrame { needed: 2, available: 1, .. }
        ));

        let raw = frame(1, 0, 3, 1, &[0x10, 0x00]);
        let expect = FrameExpectation::new(1, 1).with_min_pdu_len(5);
        let err = decode(&raw, &expect).unwrap_err();
        assert!(matches!(
            frame_error(err),
            FrameError::ShortFrame { needed: 5, available: 2, .. }
        ));
    }

    #[test]
    fn test_decode_exception_before_min_len() {
        let raw = frame(1, 0, 3, 1, &[0x83, 0x02]);
        let expect = FrameExpectation::new(1, 1).with_min_pdu_len(5);
        let err = decode(&raw, &expect).unwrap_err();
        assert_eq!(err.exception_code(), Some(0x02));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let raw = frame(1, 0, 3, 1, &[0x10, 0x00, 0xFF, 0xFF]);
        assert_eq!(
            decode(&raw, &FrameExpectation::new(1, 1)).unwrap(),
            &[0x10, 0x00]
        );
    }

    proptest! {
        #[test]
        fn prop_header_roundtrip(
            tid in any::<u16>(),
            unit in any::<u8>(),
            fc in 0u8..0x80,
            rest in proptest::collection::vec(any::<u8>(), 1..254),
        ) {
            let mut pdu = vec![fc];
            pdu.extend_from_slice(&rest);

            let raw = encode(&pdu, tid, unit).unwrap();
            let header = MbapHeader::parse(&raw).unwrap();
            prop_assert_eq!(header, MbapHeader::for_pdu(tid, unit, pdu.len()).unwrap());
            prop_assert_eq!(header.pdu_len(), pdu.len());

            let decoded = decode(&raw, &FrameExpectation::new(unit, tid)).unwrap();
            prop_assert_eq!(decoded, pdu.as_slice());
        }
    }
}
