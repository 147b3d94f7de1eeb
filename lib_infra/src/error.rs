//! # Errors
//!
//! Each module owns its error enum. `InfraError` folds them together so a startup
//! routine can use `?` across every connector.

use thiserror::Error;

use crate::configs::env::EnvConfigError;
use crate::loggers::logger::LoggerError;

/// Tag prepended to every log line and error message emitted by this crate.
pub const LOG_PREFIX: &str = "[lib_infra]";

/// Any failure raised while bootstrapping infrastructure.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Env(#[from] EnvConfigError),

    #[error(transparent)]
    Logger(#[from] LoggerError),

    #[cfg(feature = "db")]
    #[error(transparent)]
    Db(#[from] crate::connections::db_mysql::DbError),

    #[cfg(feature = "cache")]
    #[error(transparent)]
    Cache(#[from] crate::connections::cache_redis::CacheError),

    #[cfg(feature = "broker")]
    #[error(transparent)]
    Broker(#[from] crate::connections::broker_amqp::BrokerError),

    #[cfg(feature = "http")]
    #[error(transparent)]
    Http(#[from] crate::http::HttpError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::env::get_config_mandatory;
    use crate::loggers::config::{AppEnv, LoggerConfig};
    use crate::loggers::logger::Logger;

    fn startup() -> Result<Logger, InfraError> {
        let app_name = get_config_mandatory("LIB_INFRA_TEST_STARTUP_APP_NAME")?;
        let logger = Logger::init(&LoggerConfig {
            env: AppEnv::Other("PRODUCTION".to_string()),
            app_name,
            ..LoggerConfig::default()
        })?;
        Ok(logger)
    }

    #[test]
    fn module_errors_convert_with_question_mark() {
        std::env::remove_var("LIB_INFRA_TEST_STARTUP_APP_NAME");
        let err = startup().unwrap_err();
        assert!(matches!(err, InfraError::Env(EnvConfigError::MissingEnvVar(_))));
        assert!(err.to_string().starts_with(LOG_PREFIX));
    }

    #[test]
    fn logger_errors_keep_their_message() {
        let err: InfraError = LoggerError::MissingLogFolder.into();
        assert_eq!(err.to_string(), "[lib_infra] log folder is required");
    }
}
