//! # Connections Module
//!
//! Constructors for the external services an application talks to. Each one
//! takes a config struct and the startup [`crate::Logger`], verifies the
//! connection once and hands the live handle to the caller.

/// Module for MySQL connection pooling through `sqlx`.
#[cfg(feature = "db")]
pub mod db_mysql;

/// Module for Redis single-node and cluster clients.
#[cfg(feature = "cache")]
pub mod cache_redis;

/// Module for AMQP broker connections.
#[cfg(feature = "broker")]
pub mod broker_amqp;
