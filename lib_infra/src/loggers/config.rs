use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::configs::env::get_config_optional;

/// Deployment environment tag. Comparison against the known tags is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppEnv {
    /// Console output only; no log folder or app name required.
    #[default]
    Local,
    /// File output under `<cwd>/logs/`, whatever folder was configured.
    Dev,
    /// Any other tag (staging, production, ...). File output in the configured folder.
    Other(String),
}

impl AppEnv {
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        if tag.eq_ignore_ascii_case("LOCAL") {
            AppEnv::Local
        } else if tag.eq_ignore_ascii_case("DEV") {
            AppEnv::Dev
        } else {
            AppEnv::Other(tag.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AppEnv::Local => "LOCAL",
            AppEnv::Dev => "DEV",
            AppEnv::Other(tag) => tag,
        }
    }
}

impl FromStr for AppEnv {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AppEnv::parse(s))
    }
}

impl From<String> for AppEnv {
    fn from(tag: String) -> Self {
        AppEnv::parse(&tag)
    }
}

impl From<AppEnv> for String {
    fn from(env: AppEnv) -> Self {
        env.as_str().to_string()
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Logger Configuration
///
/// Options consumed by [`crate::Logger::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Environment tag selecting console or file output.
    pub env: AppEnv,
    /// Name stamped on every entry and used for the log file names.
    pub app_name: String,
    /// Directory receiving the rotated files. Ignored in `Local` and `Dev`.
    pub log_folder: PathBuf,
    /// `trace`, `debug`, `info`, `warn` or `error`. Empty means `info`.
    pub log_level: String,
}

impl LoggerConfig {
    /// Reads `APP_ENV`, `APP_NAME`, `LOG_FOLDER` and `LOG_LEVEL`.
    ///
    /// `APP_ENV` defaults to `LOCAL`; the others default to empty.
    pub fn from_env() -> Self {
        Self {
            env: AppEnv::parse(&get_config_optional("APP_ENV", "LOCAL")),
            app_name: get_config_optional("APP_NAME", ""),
            log_folder: PathBuf::from(get_config_optional("LOG_FOLDER", "")),
            log_level: get_config_optional("LOG_LEVEL", ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_tags_are_case_insensitive() {
        assert_eq!(AppEnv::parse("local"), AppEnv::Local);
        assert_eq!(AppEnv::parse(" Dev "), AppEnv::Dev);
        assert_eq!(AppEnv::parse("production"), AppEnv::Other("production".to_string()));
        assert_eq!("LOCAL".parse::<AppEnv>().unwrap(), AppEnv::Local);
    }

    #[test]
    fn config_deserializes_env_from_plain_string() {
        let config: LoggerConfig = serde_json::from_str(
            r#"{"env":"staging","app_name":"billing","log_folder":"/var/log/billing","log_level":"warn"}"#,
        )
        .unwrap();
        assert_eq!(config.env, AppEnv::Other("staging".to_string()));
        assert_eq!(config.app_name, "billing");

        let round = serde_json::to_value(&config).unwrap();
        assert_eq!(round["env"], "staging");
    }
}
