#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voltage_modbus_tunnel::frame::{decode, FrameExpectation};
use voltage_modbus_tunnel::registers::{parse_register_response, parse_write_response};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    unit_id: u8,
    transaction_id: u16,
    strict: bool,
    count: u16,
    frame: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    let expect = FrameExpectation::new(input.unit_id, input.transaction_id)
        .with_transaction_check(input.strict);

    if let Ok(pdu) = decode(input.frame, &expect) {
        assert!(pdu.len() >= 2);
        assert!(pdu[0] & 0x80 == 0);

        if let Ok(registers) = parse_register_response(pdu, pdu[0], input.count) {
            assert_eq!(registers.len(), input.count as usize);
        }
        let _ = parse_write_response(pdu, 0, input.count);
    }
});
