//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Outbound HTTP client settings.
    pub http_client: HttpClientConfig,

    /// Tool behaviour switches.
    pub tools: ToolsConfig,

    /// Durable error log settings.
    pub error_log: ErrorLogConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Fixed policy for every outbound request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Whole-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Redirects followed before giving up.
    pub max_redirects: usize,

    /// User-Agent sent with every request.
    pub user_agent: String,

    /// Treat non-2xx responses as failures.
    pub reject_error_status: bool,
}

/// Switches that select between the server variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Validate method tokens and URL syntax before any request is made.
    pub strict_validation: bool,

    /// Allow `format: "csv"`.
    pub csv_enabled: bool,
}

/// Durable error log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogConfig {
    /// Whether failures are appended to `path`.
    pub enabled: bool,

    /// Log file, relative to the working directory unless absolute.
    pub path: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read `MCP_LOG_LEVEL`. Safe to call before any subscriber exists.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        std::env::var("MCP_LOG_LEVEL")
            .map(|level| Self { level })
            .unwrap_or_default()
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_redirects: 5,
            user_agent: format!("api-tester-mcp/{}", env!("CARGO_PKG_VERSION")),
            reject_error_status: true,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            strict_validation: true,
            csv_enabled: true,
        }
    }
}

impl Default for ErrorLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("logs/api-tester-errors.log"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "api-tester".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
            http_client: HttpClientConfig::default(),
            tools: ToolsConfig::default(),
            error_log: ErrorLogConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_HTTP_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging = LoggingConfig::from_env();

        config.transport = TransportConfig::from_env();

        let client = &mut config.http_client;
        client.timeout_ms = env_parse("MCP_HTTP_TIMEOUT_MS", client.timeout_ms);
        client.max_redirects = env_parse("MCP_HTTP_MAX_REDIRECTS", client.max_redirects);
        client.reject_error_status =
            env_parse("MCP_HTTP_REJECT_ERROR_STATUS", client.reject_error_status);
        if let Ok(agent) = std::env::var("MCP_HTTP_USER_AGENT") {
            client.user_agent = agent;
        }

        config.tools.strict_validation =
            env_parse("MCP_STRICT_VALIDATION", config.tools.strict_validation);
        config.tools.csv_enabled = env_parse("MCP_CSV_ENABLED", config.tools.csv_enabled);

        config.error_log.enabled = env_parse("MCP_ERROR_LOG_ENABLED", config.error_log.enabled);
        if let Ok(path) = std::env::var("MCP_ERROR_LOG_PATH") {
            config.error_log.path = PathBuf::from(path);
        }

        if config.error_log.enabled {
            info!("Error log: {}", config.error_log.path.display());
        } else {
            warn!("Error log disabled - request failures are only traced");
        }

        config
    }

    /// Reject settings no request could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.http_client.timeout_ms == 0 {
            return Err(Error::config("http_client.timeout_ms must be greater than zero"));
        }
        if self.error_log.enabled && self.error_log.path.as_os_str().is_empty() {
            return Err(Error::config("error_log.path must not be empty"));
        }
        Ok(())
    }
}

/// Read and parse `key`, keeping `default` when unset or invalid.
fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_match_client_policy() {
        let config = Config::default();
        assert_eq!(config.http_client.timeout_ms, 30_000);
        assert_eq!(config.http_client.max_redirects, 5);
        assert!(config.http_client.reject_error_status);
        assert!(config.tools.strict_validation);
        assert!(config.tools.csv_enabled);
        assert!(config.error_log.enabled);
        assert_eq!(
            config.error_log.path,
            PathBuf::from("logs/api-tester-errors.log")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_CSV_ENABLED", "false");
            std::env::set_var("MCP_STRICT_VALIDATION", "false");
            std::env::set_var("MCP_HTTP_TIMEOUT_MS", "1500");
            std::env::set_var("MCP_ERROR_LOG_PATH", "/tmp/api-errors.log");
        }
        let config = Config::from_env();
        assert!(!config.tools.csv_enabled);
        assert!(!config.tools.strict_validation);
        assert_eq!(config.http_client.timeout_ms, 1500);
        assert_eq!(config.error_log.path, PathBuf::from("/tmp/api-errors.log"));
        unsafe {
            std::env::remove_var("MCP_CSV_ENABLED");
            std::env::remove_var("MCP_STRICT_VALIDATION");
            std::env::remove_var("MCP_HTTP_TIMEOUT_MS");
            std::env::remove_var("MCP_ERROR_LOG_PATH");
        }
    }

    #[test]
    fn test_invalid_env_value_keeps_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_HTTP_MAX_REDIRECTS", "lots");
        }
        let config = Config::from_env();
        assert_eq!(config.http_client.max_redirects, 5);
        unsafe {
            std::env::remove_var("MCP_HTTP_MAX_REDIRECTS");
        }
    }

    #[test]
    fn test_log_level_readable_before_full_config() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_LOG_LEVEL", "debug");
        }
        assert_eq!(LoggingConfig::from_env().level, "debug");
        assert_eq!(Config::from_env().logging.level, "debug");
        unsafe {
            std::env::remove_var("MCP_LOG_LEVEL");
        }
        assert_eq!(LoggingConfig::from_env().level, "info");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.http_client.timeout_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
