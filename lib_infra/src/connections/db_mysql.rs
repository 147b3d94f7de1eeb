//! # MySQL Connection Manager
//!
//! Builds a `sqlx` MySQL pool from a [`DbConfig`], verifies it with a ping and
//! applies the pool limits. Nothing is retried: a failure here usually means the
//! application should stop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::Connection;
use thiserror::Error;

use crate::configs::env::{get_config_mandatory, get_config_optional, get_config_parsed, EnvConfigError};
use crate::error::LOG_PREFIX;
use crate::loggers::logger::Logger;

/// Query string used when a config carries no parameters of its own.
pub const DEFAULT_QUERY_PARAMS: &str = "?charset=latin1&parseTime=True&loc=Local";

/// The only driver name accepted by [`connect_db`].
pub const SUPPORTED_DRIVER: &str = "mysql";

/// Custom error types for Database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("[lib_infra] only mysql driver is configured, got `{0}`")]
    UnsupportedDriver(String),
    #[error("[lib_infra] failed to connect to database: {0}")]
    Open(String),
    #[error("[lib_infra] database ping failed: {0}")]
    Ping(String),
}

/// # Database Configuration
///
/// Connection parameters and pool limits. Lifetimes are in seconds; `0` means
/// connections are never retired for that reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    pub driver: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub schema: String,
    /// `0` keeps the driver default.
    pub max_open_connections: u32,
    /// Not enforced: the `sqlx` pool has no idle cap. A non-zero value is
    /// reported as ignored when connecting.
    pub max_idle_connections: u32,
    pub max_connection_lifetime_secs: u64,
    pub max_idle_lifetime_secs: u64,
    /// How long the first connection may take before giving up.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Extra DSN parameters, kept in insertion order.
    #[serde(default)]
    pub query_params: Vec<(String, String)>,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            driver: SUPPORTED_DRIVER.to_string(),
            user: String::new(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 3306,
            schema: String::new(),
            max_open_connections: 10,
            max_idle_connections: 2,
            max_connection_lifetime_secs: 0,
            max_idle_lifetime_secs: 0,
            connect_timeout_secs: default_connect_timeout_secs(),
            query_params: Vec::new(),
        }
    }
}

/// Joins `params` into `?k1=v1&k2=v2`, in order. An empty list yields
/// [`DEFAULT_QUERY_PARAMS`].
pub fn parse_query_params(params: &[(String, String)]) -> String {
    if params.is_empty() {
        return DEFAULT_QUERY_PARAMS.to_string();
    }
    let joined = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    format!("?{}", joined)
}

fn default_query_pairs() -> Vec<(String, String)> {
    DEFAULT_QUERY_PARAMS
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl DbConfig {
    /// Reads `DB_DRIVER`, `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT`, `DB_NAME`,
    /// `DB_MAX_OPEN_CONNECTIONS`, `DB_MAX_IDLE_CONNECTIONS`,
    /// `DB_MAX_CONNECTION_LIFETIME`, `DB_MAX_IDLE_LIFETIME` and `DB_CONNECT_TIMEOUT`.
    pub fn from_env() -> Result<Self, EnvConfigError> {
        let defaults = Self::default();
        Ok(Self {
            driver: get_config_optional("DB_DRIVER", SUPPORTED_DRIVER),
            user: get_config_mandatory("DB_USER")?,
            password: get_config_optional("DB_PASSWORD", ""),
            host: get_config_mandatory("DB_HOST")?,
            port: get_config_parsed("DB_PORT", defaults.port)?,
            schema: get_config_mandatory("DB_NAME")?,
            max_open_connections: get_config_parsed("DB_MAX_OPEN_CONNECTIONS", defaults.max_open_connections)?,
            max_idle_connections: get_config_parsed("DB_MAX_IDLE_CONNECTIONS", defaults.max_idle_connections)?,
            max_connection_lifetime_secs: get_config_parsed("DB_MAX_CONNECTION_LIFETIME", 0)?,
            max_idle_lifetime_secs: get_config_parsed("DB_MAX_IDLE_LIFETIME", 0)?,
            connect_timeout_secs: get_config_parsed("DB_CONNECT_TIMEOUT", defaults.connect_timeout_secs)?,
            query_params: Vec::new(),
        })
    }

    /// Data source name in `user:pass@tcp(host:port)/schema?params` form.
    pub fn dsn(&self) -> String {
        format!(
            "{}:{}@tcp({}:{})/{}{}",
            self.user,
            self.password,
            self.host,
            self.port,
            self.schema,
            parse_query_params(&self.query_params)
        )
    }

    /// [`DbConfig::dsn`] with the password masked, for logs.
    pub fn redacted_dsn(&self) -> String {
        format!(
            "{}:****@tcp({}:{})/{}{}",
            self.user,
            self.host,
            self.port,
            self.schema,
            parse_query_params(&self.query_params)
        )
    }

    pub fn validate(&self) -> Result<(), DbError> {
        if self.driver != SUPPORTED_DRIVER {
            return Err(DbError::UnsupportedDriver(self.driver.clone()));
        }
        Ok(())
    }

    /// Translates the config into `sqlx` options.
    ///
    /// `charset` and `collation` parameters are applied; any other parameter
    /// has no `sqlx` equivalent and is returned in the second slot.
    pub fn connect_options(&self) -> (MySqlConnectOptions, Vec<String>) {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.schema);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }

        let params = if self.query_params.is_empty() {
            default_query_pairs()
        } else {
            self.query_params.clone()
        };
        let mut ignored = Vec::new();
        for (key, value) in &params {
            match key.as_str() {
                "charset" => options = options.charset(value),
                "collation" => options = options.collation(value),
                _ => ignored.push(key.clone()),
            }
        }
        (options, ignored)
    }

    fn pool_options(&self, logger: &Logger) -> MySqlPoolOptions {
        let mut pool = MySqlPoolOptions::new().acquire_timeout(Duration::from_secs(self.connect_timeout_secs));

        logger.info(&format!("{} Setting MAX_OPEN_CONNECTIONS to {}", LOG_PREFIX, self.max_open_connections));
        if self.max_open_connections > 0 {
            pool = pool.max_connections(self.max_open_connections);
        }

        if self.max_idle_connections > 0 {
            logger.warn(&format!(
                "{} MAX_IDLE_CONNECTIONS {} is not supported by the driver, ignoring it",
                LOG_PREFIX, self.max_idle_connections
            ));
        }

        logger.info(&format!(
            "{} Setting max open connection lifetime to {}",
            LOG_PREFIX, self.max_connection_lifetime_secs
        ));
        pool = pool.max_lifetime(seconds_or_unbounded(self.max_connection_lifetime_secs));

        logger.info(&format!(
            "{} Setting max idle connection lifetime to {}",
            LOG_PREFIX, self.max_idle_lifetime_secs
        ));
        pool.idle_timeout(seconds_or_unbounded(self.max_idle_lifetime_secs))
    }
}

fn seconds_or_unbounded(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Opens a MySQL pool, pings it and returns it.
///
/// # Errors
/// * [`DbError::UnsupportedDriver`] when `driver` is not `mysql`; nothing is opened.
/// * [`DbError::Open`] when no connection can be established.
/// * [`DbError::Ping`] when the liveness check fails.
pub async fn connect_db(config: &DbConfig, logger: &Logger) -> Result<MySqlPool, DbError> {
    config.validate()?;

    logger.info(&format!("{} Connecting to DB {}...", LOG_PREFIX, config.redacted_dsn()));
    let (connect_options, ignored) = config.connect_options();
    if !ignored.is_empty() {
        logger.debug(&format!("{} Ignoring driver specific DSN parameters: {}", LOG_PREFIX, ignored.join(", ")));
    }

    let pool = config
        .pool_options(logger)
        .connect_with(connect_options)
        .await
        .map_err(|e: sqlx::Error| DbError::Open(e.to_string()))?;

    logger.info(&format!("{} Testing connection...", LOG_PREFIX));
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e: sqlx::Error| DbError::Ping(e.to_string()))?;
    conn.ping()
        .await
        .map_err(|e: sqlx::Error| DbError::Ping(e.to_string()))?;
    drop(conn);

    logger.info(&format!("{} Connected to DB successfully...", LOG_PREFIX));
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loggers::config::{AppEnv, LoggerConfig};

    fn console_logger() -> Logger {
        Logger::init(&LoggerConfig {
            env: AppEnv::Local,
            app_name: "db-tests".to_string(),
            ..LoggerConfig::default()
        })
        .unwrap()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn query_params_keep_insertion_order() {
        assert_eq!(parse_query_params(&pairs(&[("a", "b"), ("c", "d"), ("e", "f")])), "?a=b&c=d&e=f");
        assert_eq!(parse_query_params(&pairs(&[("z", "1"), ("a", "2")])), "?z=1&a=2");
    }

    #[test]
    fn query_params_default_when_empty() {
        assert_eq!(parse_query_params(&[]), DEFAULT_QUERY_PARAMS);
        assert_eq!(parse_query_params(&[]), "?charset=latin1&parseTime=True&loc=Local");
    }

    #[test]
    fn dsn_uses_tcp_form() {
        let config = DbConfig {
            user: "app".to_string(),
            password: "secret".to_string(),
            host: "db.internal".to_string(),
            port: 3307,
            schema: "orders".to_string(),
            ..DbConfig::default()
        };
        assert_eq!(
            config.dsn(),
            "app:secret@tcp(db.internal:3307)/orders?charset=latin1&parseTime=True&loc=Local"
        );

        let config = DbConfig {
            query_params: pairs(&[("charset", "utf8mb4")]),
            ..config
        };
        assert_eq!(config.dsn(), "app:secret@tcp(db.internal:3307)/orders?charset=utf8mb4");
    }

    #[test]
    fn default_params_split_into_pairs() {
        assert_eq!(
            default_query_pairs(),
            pairs(&[("charset", "latin1"), ("parseTime", "True"), ("loc", "Local")])
        );
    }

    #[test]
    fn connect_options_reports_unmapped_params() {
        let (_, ignored) = DbConfig::default().connect_options();
        assert_eq!(ignored, vec!["parseTime".to_string(), "loc".to_string()]);

        let config = DbConfig {
            query_params: pairs(&[("charset", "utf8mb4"), ("collation", "utf8mb4_bin"), ("tls", "skip-verify")]),
            ..DbConfig::default()
        };
        let (_, ignored) = config.connect_options();
        assert_eq!(ignored, vec!["tls".to_string()]);
    }

    #[test]
    fn redacted_dsn_hides_password() {
        let config = DbConfig {
            user: "app".to_string(),
            password: "secret".to_string(),
            host: "db.internal".to_string(),
            schema: "orders".to_string(),
            ..DbConfig::default()
        };
        let redacted = config.redacted_dsn();
        assert_eq!(
            redacted,
            "app:****@tcp(db.internal:3306)/orders?charset=latin1&parseTime=True&loc=Local"
        );
        assert!(!redacted.contains("secret"));
    }

    #[test]
    fn only_exact_mysql_driver_validates() {
        assert!(DbConfig::default().validate().is_ok());
        for driver in ["MySQL", "MYSQL", " mysql ", "mysql\n"] {
            let config = DbConfig {
                driver: driver.to_string(),
                ..DbConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(DbError::UnsupportedDriver(ref d)) if d == driver),
                "driver {:?} should be rejected",
                driver
            );
        }
    }

    #[test]
    fn max_idle_does_not_keep_connections_open() {
        let logger = console_logger();
        let config = DbConfig {
            max_open_connections: 8,
            max_idle_connections: 5,
            max_connection_lifetime_secs: 60,
            ..DbConfig::default()
        };
        let pool = config.pool_options(&logger);
        assert_eq!(pool.get_max_connections(), 8);
        assert_eq!(pool.get_min_connections(), 0);
        assert_eq!(pool.get_max_lifetime(), Some(Duration::from_secs(60)));
        assert_eq!(pool.get_idle_timeout(), None);
    }

    #[tokio::test]
    async fn other_drivers_are_rejected_before_connecting() {
        let logger = console_logger();
        for driver in ["postgres", "sqlite", "", "MySQL", " mysql "] {
            let config = DbConfig {
                driver: driver.to_string(),
                ..DbConfig::default()
            };
            let err = connect_db(&config, &logger).await.unwrap_err();
            assert!(matches!(err, DbError::UnsupportedDriver(ref d) if d == driver));
            assert!(err.to_string().starts_with(LOG_PREFIX));
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_an_open_error() {
        let logger = console_logger();
        let config = DbConfig {
            user: "app".to_string(),
            host: "127.0.0.1".to_string(),
            port: 1,
            schema: "orders".to_string(),
            max_idle_connections: 0,
            connect_timeout_secs: 1,
            ..DbConfig::default()
        };
        let err = connect_db(&config, &logger).await.unwrap_err();
        assert!(matches!(err, DbError::Open(_)));
    }
}
