//! Tunnel client
//!
//! [`TunnelClient`] runs one request at a time through a
//! [`TunnelTransport`] session:
//!
//! 1. reset the last status
//! 2. validate the arguments (a [`ModbusError::Validation`] returns here)
//! 3. build the PDU and the MBAP frame with a fresh transaction id
//! 4. hex-encode the frame and exchange it over the session
//! 5. decode and check the response frame
//! 6. record any network error or device exception, then return
//!
//! Sessions are opened lazily and dropped when the host, port or timeout
//! change, when a response header does not check out, or on [`close`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use voltage_modbus_tunnel::{ConnectionConfig, ModbusResult, TunnelClient};
//!
//! #[tokio::main]
//! async fn main() -> ModbusResult<()> {
//!     let config = ConnectionConfig::new("192.168.0.20")?;
//!     let mut client = TunnelClient::http(config, "access-key");
//!
//!     let registers = client.read_holding_registers(3, 203, 6).await?;
//!     println!("registers: {:?}", registers);
//!
//!     let accepted = client.write_multiple_registers(3, 504, &[201, 1]).await?;
//!     println!("write accepted: {}", accepted);
//!     Ok(())
//! }
//! ```
//!
//! [`close`]: TunnelClient::close

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::ConnectionConfig;
use crate::constants::MIN_RESPONSE_PDU_LEN;
use crate::error::{ErrorCode, FrameError, ModbusError, ModbusResult};
use crate::frame::{self, FrameExpectation};
use crate::pdu::ModbusPdu;
use crate::registers::RegisterRequest;
use crate::status::LastStatus;
use crate::trace::{format_frame, FrameDirection, TraceHook};
use crate::transport::{Direction, TransportStats, TunnelConnector, TunnelTransport};

#[cfg(feature = "http")]
use crate::http::HttpConnector;

/// Register client speaking Modbus through a hex tunnel
pub struct TunnelClient<C: TunnelConnector> {
    config: ConnectionConfig,
    connector: C,
    session: Option<C::Transport>,
    status: LastStatus,
    strict_transaction: bool,
    trace_hook: Option<TraceHook>,
    stats: TransportStats,
}

#[cfg(feature = "http")]
impl TunnelClient<HttpConnector> {
    /// Client for the HTTP gateway, authenticating with `credential`
    pub fn http<S: Into<String>>(config: ConnectionConfig, credential: S) -> Self {
        Self::new(config, HttpConnector::new(credential))
    }
}

impl<C: TunnelConnector> TunnelClient<C> {
    /// Create a client; no session is opened until the first request
    pub fn new(config: ConnectionConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            session: None,
            status: LastStatus::default(),
            strict_transaction: true,
            trace_hook: None,
            stats: TransportStats::default(),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn host(&self) -> &str {
        self.config.host()
    }

    pub fn port(&self) -> u16 {
        self.config.port()
    }

    pub fn timeout(&self) -> std::time::Duration {
        self.config.timeout()
    }

    pub fn unit_id(&self) -> u8 {
        self.config.unit_id()
    }

    /// Change the gateway host, releasing the session if it differs
    pub fn set_host(&mut self, host: &str) -> ModbusResult<()> {
        self.reconfigure(|config| config.set_host(host))
    }

    /// Change the gateway port, releasing the session if it differs
    pub fn set_port(&mut self, port: u16) -> ModbusResult<()> {
        self.reconfigure(|config| config.set_port(port))
    }

    /// Change the request timeout, releasing the session if it differs
    pub fn set_timeout(&mut self, timeout: std::time::Duration) -> ModbusResult<()> {
        self.reconfigure(|config| config.set_timeout(timeout))
    }

    /// Change the addressed unit; the session is kept
    pub fn set_unit_id(&mut self, unit_id: u8) {
        self.config.set_unit_id(unit_id);
    }

    /// Enable or disable the transaction id check on responses
    pub fn set_strict_transaction(&mut self, strict: bool) {
        self.strict_transaction = strict;
    }

    pub fn strict_transaction(&self) -> bool {
        self.strict_transaction
    }

    /// Install a hook called with every raw frame sent and received
    pub fn set_trace_hook<F>(&mut self, hook: F)
    where
        F: Fn(&[u8], FrameDirection) + Send + Sync + 'static,
    {
        self.trace_hook = Some(Arc::new(hook));
    }

    pub fn clear_trace_hook(&mut self) {
        self.trace_hook = None;
    }

    /// Whether a tunnel session is currently held
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Release the tunnel session; the next request opens a new one
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            self.debug_msg("session closed");
        }
    }

    pub fn stats(&self) -> TransportStats {
        self.stats
    }

    /// Status of the last request
    pub fn last_status(&self) -> LastStatus {
        self.status
    }

    pub fn last_error(&self) -> ErrorCode {
        self.status.error()
    }

    pub fn last_error_text(&self) -> &'static str {
        self.status.error_text()
    }

    pub fn last_exception(&self) -> Option<u8> {
        self.status.exception()
    }

    pub fn last_exception_text(&self) -> String {
        self.status.exception_text()
    }

    pub fn last_exception_details(&self) -> String {
        self.status.exception_details()
    }

    /// Read Holding Registers (0x03).
    ///
    /// `count` must be 1-125 and the block must end inside the address space.
    pub async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<u16>> {
        self.status.reset();
        let request = RegisterRequest::read_holding(address, count)?;
        self.config.set_unit_id(unit_id);

        let result = match self.transact(&request).await {
            Ok(pdu) => request.parse_registers(&pdu).map_err(ModbusError::from),
            Err(err) => Err(err),
        };
        self.finish(result)
    }

    /// Write Multiple Registers (0x10).
    ///
    /// Returns `Ok(false)` when the node echoes a different address or count.
    pub async fn write_multiple_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        values: &[u16],
    ) -> ModbusResult<bool> {
        self.status.reset();
        let request = RegisterRequest::write_multiple(address, values)?;
        self.config.set_unit_id(unit_id);

        let result = match self.transact(&request).await {
            Ok(pdu) => request.parse_write_ack(&pdu).map_err(ModbusError::from),
            Err(err) => Err(err),
        };
        if let Ok(false) = result {
            self.debug_msg("write echo does not match request");
        }
        self.finish(result)
    }

    /// Read/Write Multiple Registers (0x17) on the current unit.
    ///
    /// The node applies the write before the read.
    pub async fn write_read_multiple_registers(
        &mut self,
        write_address: u16,
        values: &[u16],
        read_address: u16,
        read_count: u16,
    ) -> ModbusResult<Vec<u16>> {
        self.status.reset();
        let request =
            RegisterRequest::write_read_multiple(write_address, values, read_address, read_count)?;

        let result = match self.transact(&request).await {
            Ok(pdu) => request.parse_registers(&pdu).map_err(ModbusError::from),
            Err(err) => Err(err),
        };
        self.finish(result)
    }

    /// Send an arbitrary PDU and return the response PDU unchanged.
    ///
    /// Only the MBAP header and exception responses are checked.
    pub async fn custom_request(
        &mut self,
        unit_id: u8,
        pdu: &[u8],
        direction: Direction,
    ) -> ModbusResult<Vec<u8>> {
        self.status.reset();
        let pdu = ModbusPdu::from_slice(pdu)?;
        self.config.set_unit_id(unit_id);

        let result = self
            .exchange_pdu(pdu.as_slice(), direction, MIN_RESPONSE_PDU_LEN)
            .await;
        self.finish(result)
    }

    async fn transact(&mut self, request: &RegisterRequest) -> ModbusResult<Vec<u8>> {
        let pdu = request.to_pdu()?;
        self.exchange_pdu(pdu.as_slice(), request.direction(), request.min_response_len())
            .await
    }

    /// Frame `pdu`, run it through the session and return the checked
    /// response PDU
    async fn exchange_pdu(
        &mut self,
        pdu: &[u8],
        direction: Direction,
        min_response_len: usize,
    ) -> ModbusResult<Vec<u8>> {
        let unit_id = self.config.unit_id();
        let transaction_id: u16 = rand::random();
        let tx_frame = frame::encode(pdu, transaction_id, unit_id)?;
        self.on_frame(&tx_frame, FrameDirection::Tx);

        let command = hex::encode(&tx_frame);
        let timeout = self.config.timeout();
        let session = match self.session.take() {
            Some(session) => self.session.insert(session),
            None => self.session.insert(self.connector.connect(&self.config)?),
        };

        self.stats.requests_sent += 1;
        let reply = match tokio::time::timeout(timeout, session.exchange(&command, direction)).await
        {
            Ok(reply) => reply?,
            Err(_) => {
                return Err(ModbusError::timeout(format!(
                    "no response within {:.1}s",
                    timeout.as_secs_f64()
                )))
            }
        };
        self.stats.responses_received += 1;

        let rx_frame = hex::decode(reply.trim())?;
        self.on_frame(&rx_frame, FrameDirection::Rx);

        let expect = FrameExpectation::new(unit_id, transaction_id)
            .with_min_pdu_len(min_response_len)
            .with_transaction_check(self.strict_transaction);
        match frame::decode(&rx_frame, &expect) {
            Ok(rx_pdu) => Ok(rx_pdu.to_vec()),
            Err(err) => {
                if err.frame_error().is_some_and(FrameError::is_header_error) {
                    self.close();
                }
                Err(err)
            }
        }
    }

    /// Record a failed request and pass the result through
    fn finish<T>(&mut self, result: ModbusResult<T>) -> ModbusResult<T> {
        if let Err(err) = &result {
            self.status.record(err);
            match err {
                ModbusError::Validation { .. } => {}
                ModbusError::Network { code, message, .. } => {
                    self.stats.errors += 1;
                    if *code == ErrorCode::Timeout {
                        self.stats.timeouts += 1;
                    }
                    self.debug_msg(message);
                }
                ModbusError::Exception { code, message, .. } => {
                    self.stats.exceptions += 1;
                    self.debug_msg(&format!("modbus exception (code {} \"{}\")", code, message));
                }
            }
        }
        result
    }

    fn on_frame(&self, frame: &[u8], direction: FrameDirection) {
        if tracing::enabled!(tracing::Level::DEBUG) {
            self.debug_msg(&format!("{} {}", direction, format_frame(frame)));
        }
        if let Some(hook) = &self.trace_hook {
            hook(frame, direction);
        }
    }

    fn debug_msg(&self, msg: &str) {
        debug!(
            "({}:{}:{}) {}",
            self.config.host(),
            self.config.port(),
            self.config.unit_id(),
            msg
        );
    }

    /// Apply `change` to a copy of the configuration; adopt it, dropping the
    /// session first, only if it validated and differs
    fn reconfigure<F>(&mut self, change: F) -> ModbusResult<()>
    where
        F: FnOnce(&mut ConnectionConfig) -> ModbusResult<()>,
    {
        let mut next = self.config.clone();
        change(&mut next)?;
        if next != self.config {
            self.close();
            self.config = next;
        }
        Ok(())
    }
}

impl<C: TunnelConnector + fmt::Debug> fmt::Debug for TunnelClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelClient")
            .field("config", &self.config)
            .field("connector", &self.connector)
            .field("open", &self.session.is_some())
            .field("status", &self.status)
            .field("strict_transaction", &self.strict_transaction)
            .finish()
    }
}
