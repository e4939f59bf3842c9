//! Configuration for MailReach

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `MAILREACH__API__BASE_URL`
pub const ENV_PREFIX: &str = "MAILREACH";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// REST backend configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Session token persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Fetch, polling and normalization behavior
    #[serde(default)]
    pub sync: SyncConfig,
}

/// REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Session token persistence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// File holding persisted tokens. Tokens live in memory only when unset.
    pub token_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Fetch, polling and normalization behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Rows requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Refresh interval of the campaign sending-progress view
    #[serde(default = "default_campaign_poll")]
    pub campaign_poll_secs: u64,

    /// Auto-refresh interval of the single email list
    #[serde(default = "default_single_email_refresh")]
    pub single_email_refresh_secs: u64,

    /// Reject unrecognized response envelopes instead of treating them as empty
    #[serde(default = "default_strict_shapes")]
    pub strict_shapes: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            campaign_poll_secs: default_campaign_poll(),
            single_email_refresh_secs: default_single_email_refresh(),
            strict_shapes: default_strict_shapes(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}

fn default_campaign_poll() -> u64 {
    3
}

fn default_single_email_refresh() -> u64 {
    30
}

fn default_strict_shapes() -> bool {
    true
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from the first file found plus `MAILREACH__*` environment overrides
    pub fn load() -> crate::Result<Self> {
        let paths = [
            PathBuf::from("./mailreach.toml"),
            PathBuf::from("./config.toml"),
            dirs_config_path(),
        ];

        let file = paths.into_iter().find(|p| p.exists());
        Self::load_layered(file.as_deref())
    }

    /// Layer an optional TOML file under environment overrides
    pub fn load_layered(file: Option<&Path>) -> crate::Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            tracing::debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<Config>())
            .map_err(|e| crate::Error::Config(format!("Failed to load config: {}", e)))
    }
}

fn dirs_config_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".config/mailreach/config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.sync.page_size, 10);
        assert!(config.sync.strict_shapes);
        assert!(config.session.token_path.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[api]
base_url = "https://mail.example.com/api"

[session]
token_path = "/tmp/mailreach/session.json"

[sync]
page_size = 25
strict_shapes = false
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://mail.example.com/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(
            config.session.token_path,
            Some(PathBuf::from("/tmp/mailreach/session.json"))
        );
        assert_eq!(config.sync.page_size, 25);
        assert!(!config.sync.strict_shapes);
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_load_layered_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://backend:9000\"\ntimeout_secs = 5").unwrap();

        let config = Config::load_layered(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "http://backend:9000");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.sync.campaign_poll_secs, 3);
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file(Path::new("/nonexistent/mailreach.toml")).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
