//! # Logger
//!
//! A `Logger` owns its own `tracing` dispatcher instead of installing a global one,
//! so connectors receive it explicitly and several loggers can coexist in tests.
//!
//! - `LOCAL`: human-readable lines on stderr.
//! - anything else: JSON lines in `<folder>/<app>-old.<date>.json`, rotated daily,
//!   written through a non-blocking worker that is flushed when the logger drops.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{Dispatch, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::InitError;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;

use super::config::{AppEnv, LoggerConfig};
use super::rotating::LinkedRollingWriter;
use crate::error::LOG_PREFIX;
use crate::utils::time::INTERNAL_TIME_FORMAT_MILLIS;

/// Status passed to `std::process::exit` by [`Logger::exit_app`].
pub const EXIT_CODE: i32 = 2;

/// Level applied when the configuration leaves it empty.
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("[lib_infra] log folder is required")]
    MissingLogFolder,

    #[error("[lib_infra] app name is required")]
    MissingAppName,

    #[error("[lib_infra] bad log level `{0}`")]
    BadLevel(String),

    #[error("[lib_infra] failed to create log folder {path}: {source}")]
    CreateFolder {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[lib_infra] failed to initialize log file: {0}")]
    InitFile(#[from] InitError),

    #[error("[lib_infra] a global logger is already installed")]
    GlobalAlreadySet,
}

// `tracing` needs the level of an event at compile time.
macro_rules! event_with_app {
    ($level:expr, $app:expr, $data:expr, $message:expr) => {
        match $data {
            Some(data) => tracing::event!($level, app = $app, data = data, "{}", $message),
            None => tracing::event!($level, app = $app, "{}", $message),
        }
    };
}

pub struct Logger {
    app_name: String,
    env: AppEnv,
    level: LevelFilter,
    log_folder: Option<PathBuf>,
    dispatch: Dispatch,
    _guard: Option<WorkerGuard>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("app_name", &self.app_name)
            .field("env", &self.env)
            .field("level", &self.level)
            .field("log_folder", &self.log_folder)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Builds a logger from `config`.
    ///
    /// In `LOCAL` this never fails: folder and app name are not needed and an
    /// unparsable level falls back to `info` with a warning. Every other
    /// environment requires a folder (replaced by `<cwd>/logs` in `DEV`), an app
    /// name and a valid level.
    pub fn init(config: &LoggerConfig) -> Result<Self, LoggerError> {
        if config.env == AppEnv::Local {
            return Ok(Self::console(config));
        }

        let log_folder = match (&config.env, std::env::current_dir()) {
            (AppEnv::Dev, Ok(pwd)) => pwd.join("logs"),
            _ => config.log_folder.clone(),
        };
        if log_folder.as_os_str().is_empty() {
            return Err(LoggerError::MissingLogFolder);
        }
        if config.app_name.trim().is_empty() {
            return Err(LoggerError::MissingAppName);
        }
        let level = parse_level(&config.log_level)?;

        fs::create_dir_all(&log_folder).map_err(|source| LoggerError::CreateFolder {
            path: log_folder.display().to_string(),
            source,
        })?;
        let writer = LinkedRollingWriter::new(&log_folder, &config.app_name)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(writer);

        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_target(false)
            .with_ansi(false)
            .with_timer(ChronoLocal::new(INTERNAL_TIME_FORMAT_MILLIS.to_string()))
            .with_writer(non_blocking);
        let subscriber = tracing_subscriber::registry().with(level).with(file_layer);

        let logger = Self {
            app_name: config.app_name.clone(),
            env: config.env.clone(),
            level,
            log_folder: Some(log_folder),
            dispatch: Dispatch::new(subscriber),
            _guard: Some(guard),
        };
        logger.info(&format!("{} Logger initialized successfully", LOG_PREFIX));
        logger.info(&format!(
            "{} Log folder:{} Log level:{} App Name:{}",
            LOG_PREFIX,
            logger.log_folder().map(Path::display).map(|d| d.to_string()).unwrap_or_default(),
            logger.level,
            logger.app_name
        ));
        Ok(logger)
    }

    fn console(config: &LoggerConfig) -> Self {
        let (level, bad_level) = match parse_level(&config.log_level) {
            Ok(level) => (level, None),
            Err(e) => (LevelFilter::INFO, Some(e)),
        };

        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_timer(ChronoLocal::new(INTERNAL_TIME_FORMAT_MILLIS.to_string()))
            .with_writer(std::io::stderr);
        let subscriber = tracing_subscriber::registry().with(level).with(console_layer);

        let logger = Self {
            app_name: config.app_name.clone(),
            env: AppEnv::Local,
            level,
            log_folder: None,
            dispatch: Dispatch::new(subscriber),
            _guard: None,
        };
        if let Some(e) = bad_level {
            logger.warn(&format!("{}, falling back to {}", e, DEFAULT_LOG_LEVEL));
        }
        logger
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn env(&self) -> &AppEnv {
        &self.env
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Folder holding the rotated files, `None` for console loggers.
    pub fn log_folder(&self) -> Option<&Path> {
        self.log_folder.as_deref()
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Makes this logger the process-wide default so plain `tracing` macros reach it.
    pub fn install_global(&self) -> Result<(), LoggerError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| LoggerError::GlobalAlreadySet)
    }

    /// Alias of [`Logger::info`].
    pub fn log(&self, message: &str) {
        self.info(message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::INFO, message, None);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Level::WARN, message, None);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::ERROR, message, None);
    }

    pub fn debug(&self, message: &str) {
        self.emit(Level::DEBUG, message, None);
    }

    /// Alias of [`Logger::log_object_info`].
    pub fn log_object<T: Serialize + ?Sized>(&self, message: &str, object: &T) {
        self.log_object_info(message, object);
    }

    /// Logs `message` with `object` serialized to JSON in the `data` field.
    pub fn log_object_info<T: Serialize + ?Sized>(&self, message: &str, object: &T) {
        self.write_object(Level::INFO, message, object);
    }

    pub fn log_object_warn<T: Serialize + ?Sized>(&self, message: &str, object: &T) {
        self.write_object(Level::WARN, message, object);
    }

    pub fn log_object_error<T: Serialize + ?Sized>(&self, message: &str, object: &T) {
        self.write_object(Level::ERROR, message, object);
    }

    pub fn log_object_debug<T: Serialize + ?Sized>(&self, message: &str, object: &T) {
        self.write_object(Level::DEBUG, message, object);
    }

    /// Logs `err`, flushes the file writer and terminates with [`EXIT_CODE`].
    pub fn exit_app(self, err: impl fmt::Display) -> ! {
        self.error(&err.to_string());
        self.info(&format!("{} Exiting app...", LOG_PREFIX));
        // Dropping the worker guard flushes buffered lines.
        drop(self);
        std::process::exit(EXIT_CODE)
    }

    fn write_object<T: Serialize + ?Sized>(&self, level: Level, message: &str, object: &T) {
        match serde_json::to_string(object) {
            Ok(data) => self.emit(level, message, Some(&data)),
            Err(e) => self.emit(
                Level::ERROR,
                &format!("{} cannot marshal object for `{}`: {}", LOG_PREFIX, message, e),
                None,
            ),
        }
    }

    fn emit(&self, level: Level, message: &str, data: Option<&str>) {
        let app = self.app_name.as_str();
        tracing::dispatcher::with_default(&self.dispatch, || {
            if level == Level::ERROR {
                event_with_app!(Level::ERROR, app, data, message)
            } else if level == Level::WARN {
                event_with_app!(Level::WARN, app, data, message)
            } else if level == Level::INFO {
                event_with_app!(Level::INFO, app, data, message)
            } else if level == Level::DEBUG {
                event_with_app!(Level::DEBUG, app, data, message)
            } else {
                event_with_app!(Level::TRACE, app, data, message)
            }
        });
    }
}

/// Parses a level name. Empty means `info`; logrus style `warning`, `fatal` and
/// `panic` are accepted as `warn`, `error` and `error`. `off` and numeric
/// levels are rejected.
pub fn parse_level(raw: &str) -> Result<LevelFilter, LoggerError> {
    let name = raw.trim().to_ascii_lowercase();
    let name = if name.is_empty() { DEFAULT_LOG_LEVEL } else { name.as_str() };
    match name {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "fatal" | "panic" => Ok(LevelFilter::ERROR),
        _ => Err(LoggerError::BadLevel(raw.to_string())),
    }
}
