//! # Startup Sequence Smoke Test
//!
//! Runs the startup order an application would use: load `.env` files, build
//! the logger, then connect every service whose variables are present.
//!
//! - `APP_ENV`, `APP_NAME`, `LOG_FOLDER`, `LOG_LEVEL` configure the logger.
//! - `DB_HOST` enables the MySQL check (`DB_USER`, `DB_NAME` are then mandatory).
//! - `REDIS_HOST` enables the single-node check, `REDIS_HOSTS` the cluster one.
//! - `RABBITMQ_HOST` enables the broker check.

use anyhow::{Context, Result};
use lib_infra::{
    connect_broker, connect_cache, connect_cache_cluster, connect_db, get_config_optional, load_env_files,
    BrokerConfig, CacheConfig, ClusterCacheConfig, DbConfig, Logger, LoggerConfig,
};
use serde_json::json;

fn enabled(variable: &str) -> bool {
    !get_config_optional(variable, "").is_empty()
}

async fn run(logger: &Logger) -> Result<()> {
    if enabled("DB_HOST") {
        let config = DbConfig::from_env().context("Failed to read database configuration")?;
        let pool = connect_db(&config, logger).await.context("Database check failed")?;
        logger.log_object("database pool ready", &json!({ "size": pool.size(), "idle": pool.num_idle() }));
        pool.close().await;
    }

    if enabled("REDIS_HOST") {
        let config = CacheConfig::from_env().context("Failed to read redis configuration")?;
        let handler = connect_cache(&config, logger).await.context("Redis check failed")?;
        logger.log_object("redis ready", &json!({ "pong": handler.status.is_pong() }));
    }

    if enabled("REDIS_HOSTS") {
        let config = ClusterCacheConfig::from_env().context("Failed to read redis cluster configuration")?;
        let handler = connect_cache_cluster(&config, logger)
            .await
            .context("Redis cluster check failed")?;
        logger.log_object("redis cluster ready", &json!({ "pong": handler.status.is_pong() }));
    }

    if enabled("RABBITMQ_HOST") {
        let config = BrokerConfig::from_env().context("Failed to read broker configuration")?;
        let connection = connect_broker(&config, logger).await.context("Broker check failed")?;
        let channel = connection.create_channel().await.context("Failed to open a channel")?;
        logger.log_object("broker ready", &json!({ "channel": channel.id() }));
        channel.close(200, "bye").await.context("Failed to close the channel")?;
        connection.close(200, "bye").await.context("Failed to close the connection")?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_files();

    let logger = Logger::init(&LoggerConfig::from_env()).context("Failed to initialize logger")?;
    logger.info(&format!("Bootstrapping {} in {}", logger.app_name(), logger.env()));

    if let Err(e) = run(&logger).await {
        logger.exit_app(format!("{:#}", e));
    }

    logger.info("All configured services answered");
    Ok(())
}
