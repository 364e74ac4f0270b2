//! End-to-end behaviour of the tunnel client against a scripted gateway

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio_test::{assert_err, assert_ok};
use voltage_modbus_tunnel::device::read_observation;
use voltage_modbus_tunnel::{
    f32_to_regs, read_f32, read_i32, ByteOrder, ConnectionConfig, Direction, ErrorCode, FrameError,
    ModbusError, ModbusResult, TunnelClient, TunnelConnector, TunnelTransport,
};

/// Gateway that answers each request with the next scripted reply
#[derive(Clone, Default)]
struct ScriptedGateway {
    inner: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    seen: Vec<(String, Direction)>,
}

enum Reply {
    /// PDU wrapped in a header echoing the request
    Pdu(Vec<u8>),
    /// Raw hex returned as is
    Hex(String),
    Fail(ModbusError),
}

impl ScriptedGateway {
    fn push(&self, reply: Reply) {
        self.inner.lock().unwrap().replies.push_back(reply);
    }

    fn seen(&self) -> Vec<(String, Direction)> {
        self.inner.lock().unwrap().seen.clone()
    }
}

struct ScriptedSession {
    inner: Arc<Mutex<Script>>,
}

impl TunnelConnector for ScriptedGateway {
    type Transport = ScriptedSession;

    fn connect(&self, _config: &ConnectionConfig) -> ModbusResult<ScriptedSession> {
        Ok(ScriptedSession {
            inner: self.inner.clone(),
        })
    }
}

impl TunnelTransport for ScriptedSession {
    async fn exchange(&mut self, command: &str, direction: Direction) -> ModbusResult<String> {
        let mut script = self.inner.lock().unwrap();
        script.seen.push((command.to_string(), direction));
        let request = hex::decode(command).unwrap();
        match script.replies.pop_front() {
            Some(Reply::Pdu(pdu)) => {
                let mut frame = request[..4].to_vec();
                frame.extend_from_slice(&((pdu.len() + 1) as u16).to_be_bytes());
                frame.push(request[6]);
                frame.extend_from_slice(&pdu);
                Ok(hex::encode(frame))
            }
            Some(Reply::Hex(hex)) => Ok(hex),
            Some(Reply::Fail(err)) => Err(err),
            None => Err(ModbusError::network(ErrorCode::Send, "script exhausted")),
        }
    }
}

fn client() -> (TunnelClient<ScriptedGateway>, ScriptedGateway) {
    let gateway = ScriptedGateway::default();
    let config = ConnectionConfig::new("gateway.local").unwrap();
    (TunnelClient::new(config, gateway.clone()), gateway)
}

#[tokio::test]
async fn read_request_is_hex_frame_on_read_endpoint() {
    let (mut client, gateway) = client();
    gateway.push(Reply::Pdu(vec![0x03, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]));

    let registers = assert_ok!(client.read_holding_registers(2, 0x0010, 3).await);
    assert_eq!(registers, vec![1, 0, 2]);

    let seen = gateway.seen();
    assert_eq!(seen.len(), 1);
    let (command, direction) = &seen[0];
    assert_eq!(*direction, Direction::Read);
    // Transaction id is random; the rest is fixed
    assert_eq!(&command[4..], "000000060203001000 03".replace(' ', ""));
    assert!(command.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[tokio::test]
async fn address_space_boundary() {
    let (mut client, gateway) = client();
    gateway.push(Reply::Pdu(vec![0x03, 0x02, 0xBE, 0xEF]));

    assert_eq!(
        assert_ok!(client.read_holding_registers(2, 65535, 1).await),
        vec![0xBEEF]
    );

    let err = assert_err!(client.read_holding_registers(2, 65535, 2).await);
    assert!(err.is_validation());
    assert_eq!(gateway.seen().len(), 1);
}

#[tokio::test]
async fn short_register_payload_is_byte_count_mismatch() {
    let (mut client, gateway) = client();
    gateway.push(Reply::Pdu(vec![0x03, 0x04, 0x00, 0x01]));

    let err = assert_err!(client.read_holding_registers(2, 0, 2).await);
    assert!(err.is_network());
    assert!(matches!(
        err.frame_error(),
        Some(FrameError::ByteCountMismatch { declared: 4, .. })
    ));
    assert_eq!(client.last_error(), ErrorCode::Recv);
}

#[tokio::test]
async fn write_echo_mismatch_returns_false() {
    let (mut client, gateway) = client();
    gateway.push(Reply::Pdu(vec![0x10, 0x00, 0x11, 0x00, 0x02]));

    let accepted = assert_ok!(client.write_multiple_registers(2, 0x0010, &[1, 2]).await);
    assert!(!accepted);
    assert!(client.last_status().is_ok());
    assert_eq!(gateway.seen()[0].1, Direction::Write);
}

#[tokio::test]
async fn device_exception_carries_texts() {
    let (mut client, gateway) = client();
    gateway.push(Reply::Pdu(vec![0x83, 0x02]));

    let err = assert_err!(client.read_holding_registers(2, 0, 1).await);
    match &err {
        ModbusError::Exception {
            function,
            code,
            message,
        } => {
            assert_eq!(*function, 0x03);
            assert_eq!(*code, 0x02);
            assert_eq!(message, "illegal data address");
        }
        other => panic!("expected exception, got {:?}", other),
    }
    assert_eq!(client.last_error(), ErrorCode::Exception);
    assert_eq!(client.last_exception_text(), "illegal data address");
    assert!(!client.last_exception_details().is_empty());
}

#[tokio::test]
async fn protocol_and_length_errors_release_session() {
    let (mut client, gateway) = client();
    // Protocol id 1
    gateway.push(Reply::Hex("00000001000402030200".to_string()));

    let err = assert_err!(client.read_holding_registers(2, 0, 1).await);
    assert!(matches!(
        err.frame_error(),
        Some(FrameError::ProtocolMismatch { protocol_id: 1 })
    ));
    assert!(!client.is_open());
}

#[tokio::test]
async fn truncated_frame_is_short_frame() {
    let (mut client, gateway) = client();
    gateway.push(Reply::Hex("000100".to_string()));

    let err = assert_err!(client.read_holding_registers(2, 0, 1).await);
    assert!(matches!(err.frame_error(), Some(FrameError::ShortFrame { .. })));
    assert_eq!(client.last_error_text(), "recv error");
}

#[tokio::test]
async fn invalid_hex_reply_is_recv_error() {
    let (mut client, gateway) = client();
    gateway.push(Reply::Hex("not hex".to_string()));

    let err = assert_err!(client.read_holding_registers(2, 0, 1).await);
    assert_eq!(err.error_code(), ErrorCode::Recv);
}

#[tokio::test]
async fn transport_failures_are_recorded() {
    let (mut client, gateway) = client();
    gateway.push(Reply::Fail(ModbusError::network(
        ErrorCode::Connect,
        "connection refused",
    )));

    let err = assert_err!(client.write_multiple_registers(2, 0, &[1]).await);
    assert_eq!(err.error_code(), ErrorCode::Connect);
    assert_eq!(client.last_error_text(), "connect error");

    // The next call resets the status before running
    let err = assert_err!(client.read_holding_registers(2, 0, 0).await);
    assert!(err.is_validation());
    assert_eq!(client.last_error(), ErrorCode::NoError);
}

#[tokio::test]
async fn float_observations_round_trip_through_registers() {
    let (mut client, gateway) = client();
    let order = ByteOrder::default();
    // [temperature (2), status, humidity (2), status]
    let mut pdu = vec![0x03, 0x0C];
    for value in [21.5f32, 63.0] {
        for reg in f32_to_regs(value, order) {
            pdu.extend_from_slice(&reg.to_be_bytes());
        }
        pdu.extend_from_slice(&[0x00, 0x00]);
    }
    gateway.push(Reply::Pdu(pdu));

    let registers = assert_ok!(client.read_holding_registers(3, 203, 6).await);
    assert_eq!(registers.len(), 6);
    assert_eq!(read_f32(&registers, 0, order), Some(21.5));
    assert_eq!(read_f32(&registers, 3, order), Some(63.0));
    assert_eq!(read_observation(&registers, 0), Some(21.5));
    assert_eq!(read_observation(&registers, 1), Some(63.0));
    assert_eq!(registers[2], 0);
    assert_eq!(registers[5], 0);
    assert_eq!(read_f32(&registers, 5, order), None);

    for value in [0.0f32, -123.45, 1.0e6] {
        let regs = f32_to_regs(value, order);
        assert_eq!(read_f32(&regs, 0, order), Some(value));
    }
    assert_eq!(read_i32(&[10, 0], 0, order), Some(10));
}

#[tokio::test]
async fn legacy_gateway_without_transaction_echo() {
    let (mut client, gateway) = client();
    client.set_strict_transaction(false);
    // Gateway answers with transaction id 0 regardless of the request
    gateway.push(Reply::Hex("0000000000050203020007".to_string()));

    // Unit 2 matches the reply; the transaction id is ignored
    let registers = assert_ok!(client.read_holding_registers(2, 0, 1).await);
    assert_eq!(registers, vec![7]);
}
