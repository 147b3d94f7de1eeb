//! # lib_infra
//!
//! Startup helpers that turn configuration structs into live infrastructure handles:
//! a MySQL pool, Redis single-node or cluster clients, an AMQP connection, and a
//! structured logger writing JSON to daily-rotated files.
//!
//! Build the [`Logger`] first; every connector takes it by reference and reports
//! its progress through it.
//!
//! ```no_run
//! use lib_infra::{AppEnv, Logger, LoggerConfig};
//!
//! let logger = Logger::init(&LoggerConfig {
//!     env: AppEnv::Local,
//!     ..LoggerConfig::default()
//! })
//! .expect("logger");
//! logger.info("starting up");
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Environment-backed configuration helpers.
pub mod configs;
/// Connectors for databases, caches and message brokers.
pub mod connections;
/// Crate-level error type and library tag.
pub mod error;
/// JSON response helpers for HTTP handlers.
#[cfg(feature = "http")]
pub mod http;
/// Structured logger with console and rotating-file sinks.
pub mod loggers;
/// Small general-purpose helpers.
pub mod utils;

// Re-export the startup surface
pub use configs::env::*;
pub use error::{InfraError, LOG_PREFIX};
pub use loggers::config::{AppEnv, LoggerConfig};
pub use loggers::logger::{Logger, LoggerError, EXIT_CODE};
pub use utils::time::*;

#[cfg(feature = "db")]
pub use connections::db_mysql::{connect_db, parse_query_params, DbConfig, DbError, DEFAULT_QUERY_PARAMS};

#[cfg(feature = "cache")]
pub use connections::cache_redis::{
    connect_cache, connect_cache_cluster, CacheConfig, CacheError, CacheHandler, ClusterCacheConfig,
    ClusterCacheHandler, PingStatus,
};

#[cfg(feature = "broker")]
pub use connections::broker_amqp::{connect_broker, BrokerConfig, BrokerError, BrokerProtocol};

#[cfg(feature = "http")]
pub use http::{respond_with_error, respond_with_json, HttpError};
