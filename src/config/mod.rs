//! Configuration module for the developer portal backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid DEVPORTAL_BIND_ADDR {value:?}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid DEVPORTAL_LOG_FORMAT {0:?}, expected \"pretty\" or \"json\"")]
    LogFormat(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key guarding `/api` (auth is disabled when unset)
    pub api_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Base URL used to build code-quality dashboard links
    pub sonar_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("DEVPORTAL_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let db_path = env::var("DEVPORTAL_DB_PATH")
            .unwrap_or_else(|_| "./data/devportal.sqlite".to_string())
            .into();

        let bind_value =
            env::var("DEVPORTAL_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_value
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                value: bind_value.clone(),
                source,
            })?;

        let log_level = env::var("DEVPORTAL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("DEVPORTAL_LOG_FORMAT") {
            Err(_) => LogFormat::Pretty,
            Ok(v) => match v.to_ascii_lowercase().as_str() {
                "pretty" | "" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::LogFormat(v)),
            },
        };

        let sonar_base_url = env::var("DEVPORTAL_SONAR_BASE_URL")
            .unwrap_or_else(|_| "https://sonarcloud.io".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            db_path,
            bind_addr,
            log_level,
            log_format,
            sonar_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases mutate process-wide env vars, so they run sequentially in one test.
    #[test]
    fn test_config_from_env() {
        for var in [
            "DEVPORTAL_API_KEY",
            "DEVPORTAL_DB_PATH",
            "DEVPORTAL_BIND_ADDR",
            "DEVPORTAL_LOG_LEVEL",
            "DEVPORTAL_LOG_FORMAT",
            "DEVPORTAL_SONAR_BASE_URL",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert!(config.api_key.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/devportal.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.sonar_base_url, "https://sonarcloud.io");

        env::set_var("DEVPORTAL_SONAR_BASE_URL", "https://sonar.internal/");
        env::set_var("DEVPORTAL_LOG_FORMAT", "JSON");
        let config = Config::from_env().unwrap();
        assert_eq!(config.sonar_base_url, "https://sonar.internal");
        assert_eq!(config.log_format, LogFormat::Json);

        env::set_var("DEVPORTAL_BIND_ADDR", "not-an-address");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::BindAddr { .. })
        ));

        env::remove_var("DEVPORTAL_BIND_ADDR");
        env::remove_var("DEVPORTAL_LOG_FORMAT");
        env::remove_var("DEVPORTAL_SONAR_BASE_URL");
    }
}
