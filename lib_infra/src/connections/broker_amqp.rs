//! # AMQP Broker Connector
//!
//! Dials a RabbitMQ (or any AMQP 0-9-1) broker once. Call it at startup and keep
//! the connection; open and close channels from it as they are needed.

use std::fmt;
use std::str::FromStr;

use lapin::{Connection, ConnectionProperties};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configs::env::{get_config_mandatory, get_config_optional, get_config_parsed, EnvConfigError};
use crate::error::LOG_PREFIX;
use crate::loggers::logger::Logger;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("[lib_infra] unsupported broker protocol `{0}`, expected amqp or amqps")]
    UnsupportedProtocol(String),
    #[error("[lib_infra] failed to connect to RabbitMQ, err: {0}")]
    Dial(String),
}

/// URI scheme; `Amqps` dials over TLS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerProtocol {
    #[default]
    Amqp,
    Amqps,
}

impl BrokerProtocol {
    pub fn scheme(self) -> &'static str {
        match self {
            BrokerProtocol::Amqp => "amqp",
            BrokerProtocol::Amqps => "amqps",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            BrokerProtocol::Amqp => 5672,
            BrokerProtocol::Amqps => 5671,
        }
    }
}

impl FromStr for BrokerProtocol {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amqp" => Ok(BrokerProtocol::Amqp),
            "amqps" => Ok(BrokerProtocol::Amqps),
            _ => Err(BrokerError::UnsupportedProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for BrokerProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// # Broker Configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub protocol: BrokerProtocol,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    /// Virtual host, with or without the leading `/`. Empty means the default vhost.
    #[serde(default)]
    pub vhost: String,
}

fn encode(part: &str) -> String {
    utf8_percent_encode(part, NON_ALPHANUMERIC).to_string()
}

impl BrokerConfig {
    /// Reads `RABBITMQ_PROTOCOL`, `RABBITMQ_USER`, `RABBITMQ_PASSWORD`,
    /// `RABBITMQ_HOST`, `RABBITMQ_PORT` and `RABBITMQ_VHOST`.
    pub fn from_env() -> Result<Self, EnvConfigError> {
        let protocol: BrokerProtocol = get_config_parsed("RABBITMQ_PROTOCOL", BrokerProtocol::Amqp)?;
        Ok(Self {
            protocol,
            user: get_config_mandatory("RABBITMQ_USER")?,
            password: get_config_mandatory("RABBITMQ_PASSWORD")?,
            host: get_config_mandatory("RABBITMQ_HOST")?,
            port: get_config_parsed("RABBITMQ_PORT", protocol.default_port())?,
            vhost: get_config_optional("RABBITMQ_VHOST", "/"),
        })
    }

    fn vhost_path(&self) -> String {
        let name = self.vhost.strip_prefix('/').unwrap_or(&self.vhost);
        if name.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", encode(name))
        }
    }

    /// `<protocol>://user:pass@host:port/vhost`, credentials and vhost percent-encoded.
    pub fn uri(&self) -> String {
        format!(
            "{}://{}:{}@{}:{}{}",
            self.protocol,
            encode(&self.user),
            encode(&self.password),
            self.host,
            self.port,
            self.vhost_path()
        )
    }

    /// Same as [`BrokerConfig::uri`] with the password masked, for logs.
    pub fn redacted_uri(&self) -> String {
        format!(
            "{}://{}:****@{}:{}{}",
            self.protocol,
            encode(&self.user),
            self.host,
            self.port,
            self.vhost_path()
        )
    }
}

/// Dials the broker described by `config`. No retry.
pub async fn connect_broker(config: &BrokerConfig, logger: &Logger) -> Result<Connection, BrokerError> {
    logger.info(&format!("{} Connecting to rabbitMq at {}...", LOG_PREFIX, config.redacted_uri()));
    let connection = Connection::connect(&config.uri(), ConnectionProperties::default())
        .await
        .map_err(|e: lapin::Error| BrokerError::Dial(e.to_string()))?;
    logger.info(&format!("{} Connected to rabbitMq successfully", LOG_PREFIX));
    Ok(connection)
}
