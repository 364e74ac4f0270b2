//! HTTP gateway transport
//!
//! Each exchange is one `POST http://host:port/{read|write}` carrying
//! `{"command": "<hex frame>"}` with the credential in the `Authorization`
//! header. The gateway answers `{"result": true, "response": "<hex frame>"}`
//! or `{"result": false}`.

use std::fmt;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::ConnectionConfig;
use crate::error::{ErrorCode, ModbusError, ModbusResult};
use crate::transport::{Direction, TunnelConnector, TunnelTransport};

#[derive(Debug, Serialize)]
struct TunnelCommand<'a> {
    command: &'a str,
}

#[derive(Debug, Deserialize)]
struct TunnelReply {
    result: bool,
    #[serde(default)]
    response: Option<String>,
}

/// Builds [`HttpTunnel`] sessions carrying a fixed credential
#[derive(Clone)]
pub struct HttpConnector {
    credential: String,
}

impl HttpConnector {
    pub fn new<S: Into<String>>(credential: S) -> Self {
        Self {
            credential: credential.into(),
        }
    }
}

impl fmt::Debug for HttpConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnector")
            .field("credential", &"<redacted>")
            .finish()
    }
}

impl TunnelConnector for HttpConnector {
    type Transport = HttpTunnel;

    fn connect(&self, config: &ConnectionConfig) -> ModbusResult<HttpTunnel> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ModbusError::network(ErrorCode::Connect, e.to_string()))?;
        debug!("opened HTTP tunnel session to {}", config.authority());
        Ok(HttpTunnel {
            client,
            base_url: format!("http://{}", config.authority()),
            credential: self.credential.clone(),
        })
    }
}

/// One HTTP tunnel session; dropping it releases the connection pool
pub struct HttpTunnel {
    client: reqwest::Client,
    base_url: String,
    credential: String,
}

impl HttpTunnel {
    /// Endpoint URL for `direction`
    pub fn url(&self, direction: Direction) -> String {
        format!("{}/{}", self.base_url, direction.as_str())
    }
}

impl fmt::Debug for HttpTunnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTunnel")
            .field("base_url", &self.base_url)
            .field("credential", &"<redacted>")
            .finish()
    }
}

fn classify(err: reqwest::Error) -> ModbusError {
    let code = if err.is_timeout() {
        ErrorCode::Timeout
    } else if err.is_connect() {
        ErrorCode::Connect
    } else {
        ErrorCode::Send
    };
    ModbusError::network(code, err.to_string())
}

fn parse_reply(body: &str) -> ModbusResult<String> {
    let reply: TunnelReply = serde_json::from_str(body)
        .map_err(|e| ModbusError::network(ErrorCode::Recv, format!("invalid gateway reply: {}", e)))?;
    match reply {
        TunnelReply {
            result: true,
            response: Some(response),
        } => Ok(response),
        TunnelReply { result: true, .. } => Err(ModbusError::network(
            ErrorCode::Recv,
            "gateway reply carries no response",
        )),
        TunnelReply { result: false, .. } => {
            Err(ModbusError::network(ErrorCode::Send, "gateway rejected command"))
        }
    }
}

impl TunnelTransport for HttpTunnel {
    async fn exchange(&mut self, command: &str, direction: Direction) -> ModbusResult<String> {
        let url = self.url(direction);
        trace!("POST {} command={}", url, command);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.credential.as_str())
            .header(CONTENT_TYPE, "application/json")
            .json(&TunnelCommand { command })
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;
        trace!("gateway replied {}: {}", status, body);

        if !status.is_success() {
            return Err(ModbusError::network(
                ErrorCode::Send,
                format!("gateway returned HTTP {}", status),
            ));
        }
        parse_reply(&body)
    }
}
