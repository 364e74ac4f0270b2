//! Connection configuration for the gateway tunnel
//!
//! Fields are private; every mutation goes through a validating setter so a
//! [`ConnectionConfig`] is always usable. Deserialization runs the same checks.
//!
//! ```rust
//! use std::time::Duration;
//! use voltage_modbus_tunnel::ConnectionConfig;
//!
//! let config = ConnectionConfig::new("gateway.local")
//!     .unwrap()
//!     .with_port(9900)
//!     .unwrap()
//!     .with_timeout(Duration::from_secs(5))
//!     .unwrap();
//! assert_eq!(config.unit_id(), 2);
//! ```

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, DEFAULT_UNIT_ID, MAX_TIMEOUT_SECS};
use crate::error::{ModbusError, ModbusResult};

/// Validated gateway endpoint and addressing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConnectionConfig", into = "RawConnectionConfig")]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    timeout: Duration,
    unit_id: u8,
}

impl ConnectionConfig {
    /// Configuration for `host` with default port, timeout and unit id
    pub fn new(host: &str) -> ModbusResult<Self> {
        validate_host(host)?;
        Ok(Self {
            host: host.to_string(),
            port: DEFAULT_PORT,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            unit_id: DEFAULT_UNIT_ID,
        })
    }

    /// Builder form of [`set_port`](Self::set_port)
    pub fn with_port(mut self, port: u16) -> ModbusResult<Self> {
        self.set_port(port)?;
        Ok(self)
    }

    /// Builder form of [`set_timeout`](Self::set_timeout)
    pub fn with_timeout(mut self, timeout: Duration) -> ModbusResult<Self> {
        self.set_timeout(timeout)?;
        Ok(self)
    }

    /// Builder form of [`set_unit_id`](Self::set_unit_id)
    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Set the gateway host (IPv4, IPv6 or hostname)
    pub fn set_host(&mut self, host: &str) -> ModbusResult<()> {
        validate_host(host)?;
        self.host = host.to_string();
        Ok(())
    }

    /// Set the gateway port (1-65535)
    pub fn set_port(&mut self, port: u16) -> ModbusResult<()> {
        if port == 0 {
            return Err(ModbusError::validation(
                "port can't be set (valid if 0 < port < 65536)",
            ));
        }
        self.port = port;
        Ok(())
    }

    /// Set the request timeout (0 < timeout < 3600 s)
    pub fn set_timeout(&mut self, timeout: Duration) -> ModbusResult<()> {
        let secs = timeout.as_secs_f64();
        if secs <= 0.0 || secs >= MAX_TIMEOUT_SECS {
            return Err(ModbusError::validation(
                "timeout can't be set (valid between 0 and 3600 seconds)",
            ));
        }
        self.timeout = timeout;
        Ok(())
    }

    /// Set the unit id addressed behind the gateway
    pub fn set_unit_id(&mut self, unit_id: u8) {
        self.unit_id = unit_id;
    }

    /// `host:port`, with IPv6 literals bracketed
    pub fn authority(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => format!("[{}]:{}", self.host, self.port),
            _ => format!("{}:{}", self.host, self.port),
        }
    }
}

/// Accept IP literals and RFC 1123 host names
fn validate_host(host: &str) -> ModbusResult<()> {
    if host.parse::<IpAddr>().is_ok() || is_hostname(host) {
        Ok(())
    } else {
        Err(ModbusError::validation(format!(
            "host '{}' can't be set (not a valid IP address or hostname)",
            host
        )))
    }
}

fn is_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// On-disk shape of [`ConnectionConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawConnectionConfig {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: f64,
    #[serde(default = "default_unit_id")]
    unit_id: u8,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_unit_id() -> u8 {
    DEFAULT_UNIT_ID
}

impl TryFrom<RawConnectionConfig> for ConnectionConfig {
    type Error = ModbusError;

    fn try_from(raw: RawConnectionConfig) -> ModbusResult<Self> {
        let timeout = Duration::try_from_secs_f64(raw.timeout_secs)
            .map_err(|e| ModbusError::validation(format!("invalid timeout: {}", e)))?;
        Self::new(&raw.host)?
            .with_port(raw.port)?
            .with_timeout(timeout)
            .map(|config| config.with_unit_id(raw.unit_id))
    }
}

impl From<ConnectionConfig> for RawConnectionConfig {
    fn from(config: ConnectionConfig) -> Self {
        Self {
            host: config.host,
            port: config.port,
            timeout_secs: config.timeout.as_secs_f64(),
            unit_id: config.unit_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::new("127.0.0.1").unwrap();
        assert_eq!(config.port(), 9900);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.unit_id(), 2);
        assert_eq!(config.authority(), "127.0.0.1:9900");
    }

    #[test]
    fn test_host_validation() {
        assert!(ConnectionConfig::new("gateway-01.example.com").is_ok());
        assert!(ConnectionConfig::new("::1").is_ok());
        assert!(ConnectionConfig::new("").is_err());
        assert!(ConnectionConfig::new("bad host").is_err());
        assert!(ConnectionConfig::new("-leading.example").is_err());
        assert!(ConnectionConfig::new("a..b").is_err());
    }

    #[test]
    fn test_ipv6_authority() {
        let config = ConnectionConfig::new("fe80::1").unwrap().with_port(8080).unwrap();
        assert_eq!(config.authority(), "[fe80::1]:8080");
    }

    #[test]
    fn test_port_and_timeout_validation() {
        let mut config = ConnectionConfig::new("localhost").unwrap();
        assert!(config.set_port(0).unwrap_err().is_validation());
        assert!(config.set_port(65535).is_ok());

        assert!(config.set_timeout(Duration::ZERO).is_err());
        assert!(config.set_timeout(Duration::from_secs(3600)).is_err());
        assert!(config.set_timeout(Duration::from_millis(1500)).is_ok());
        assert_eq!(config.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_deserialize_validates() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"host": "10.0.0.5", "timeout_secs": 2.5, "unit_id": 4}"#)
                .unwrap();
        assert_eq!(config.host(), "10.0.0.5");
        assert_eq!(config.port(), 9900);
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.unit_id(), 4);

        let bad = serde_json::from_str::<ConnectionConfig>(r#"{"host": "10.0.0.5", "port": 0}"#);
        assert!(bad.is_err());
        let bad = serde_json::from_str::<ConnectionConfig>(r#"{"host": "x", "timeout_secs": -1}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = ConnectionConfig::new("gateway").unwrap().with_unit_id(7);
        let json = serde_json::to_string(&config).unwrap();
        let back: ConnectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
