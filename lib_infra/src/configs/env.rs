//! # Environment Configuration
//!
//! Reads configuration values from the process environment. Missing mandatory
//! values are reported as errors so the startup sequence decides how to fail.

use std::env::{self, VarError};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvConfigError {
    #[error("[lib_infra] environment variable `{0}` not found")]
    MissingEnvVar(String),

    #[error("[lib_infra] environment variable `{name}` has an invalid value `{value}`")]
    InvalidEnvVar { name: String, value: String },
}

/// Loads `.env`, then the platform specific `.env.windows` or `.env.linux`.
///
/// Missing files are ignored; values already present in the environment win.
pub fn load_env_files() {
    let dotenv_os: &str = if cfg!(target_os = "windows") {
        ".env.windows"
    } else {
        ".env.linux"
    };

    dotenvy::dotenv().ok();
    dotenvy::from_filename(dotenv_os).ok();
}

/// Returns the value of `param`, or `EnvConfigError::MissingEnvVar` when it is not set.
///
/// A value that is not valid unicode is `EnvConfigError::InvalidEnvVar`.
pub fn get_config_mandatory(param: &str) -> Result<String, EnvConfigError> {
    env::var(param).map_err(|e| match e {
        VarError::NotPresent => EnvConfigError::MissingEnvVar(param.to_string()),
        VarError::NotUnicode(raw) => EnvConfigError::InvalidEnvVar {
            name: param.to_string(),
            value: raw.to_string_lossy().into_owned(),
        },
    })
}

/// Returns the value of `param`, or `default_value` when it is not set.
pub fn get_config_optional(param: &str, default_value: &str) -> String {
    env::var(param).unwrap_or_else(|_| default_value.to_string())
}

/// Parses `param` into `T`, falling back to `default_value` when it is not set.
///
/// A set but unparsable value is an error rather than a silent fallback.
pub fn get_config_parsed<T: FromStr>(param: &str, default_value: T) -> Result<T, EnvConfigError> {
    match env::var(param) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| EnvConfigError::InvalidEnvVar {
            name: param.to_string(),
            value: raw,
        }),
        Err(VarError::NotPresent) => Ok(default_value),
        Err(VarError::NotUnicode(raw)) => Err(EnvConfigError::InvalidEnvVar {
            name: param.to_string(),
            value: raw.to_string_lossy().into_owned(),
        }),
    }
}
