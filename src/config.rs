use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Client configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Base URL of the store service
    pub server_url: ConfigValue<String>,
    /// Bearer key sent to the store service
    pub api_key: ConfigValue<Option<String>>,
    /// Account used by commands that need a session
    pub username: ConfigValue<String>,
    pub secret: ConfigValue<Option<String>>,
    /// Connectivity probe bound in milliseconds
    pub probe_timeout_ms: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    server_url: Option<String>,
    api_key: Option<String>,
    username: Option<String>,
    secret: Option<String>,
    probe_timeout_ms: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |name| std::env::var(name).ok())
    }

    fn load_with(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut server_url =
            ConfigValue::new(DEFAULT_SERVER_URL.to_string(), ConfigSource::Default);
        let mut api_key = ConfigValue::new(None, ConfigSource::Default);
        let mut username = ConfigValue::new("admin".to_string(), ConfigSource::Default);
        let mut secret = ConfigValue::new(None, ConfigSource::Default);
        let mut probe_timeout_ms =
            ConfigValue::new(DEFAULT_PROBE_TIMEOUT_MS, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.server_url {
                server_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(key) = file_config.api_key {
                api_key = ConfigValue::new(Some(key), ConfigSource::File);
            }
            if let Some(user) = file_config.username {
                username = ConfigValue::new(user, ConfigSource::File);
            }
            if let Some(s) = file_config.secret {
                secret = ConfigValue::new(Some(s), ConfigSource::File);
            }
            if let Some(ms) = file_config.probe_timeout_ms {
                probe_timeout_ms = ConfigValue::new(ms, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Some(url) = env("SHIFTBOARD_SERVER_URL") {
            server_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Some(key) = env("SHIFTBOARD_API_KEY") {
            api_key = ConfigValue::new(Some(key), ConfigSource::Environment);
        }
        if let Some(user) = env("SHIFTBOARD_USERNAME") {
            username = ConfigValue::new(user, ConfigSource::Environment);
        }
        if let Some(s) = env("SHIFTBOARD_SECRET") {
            secret = ConfigValue::new(Some(s), ConfigSource::Environment);
        }
        if let Some(ms) = env("SHIFTBOARD_PROBE_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            probe_timeout_ms = ConfigValue::new(ms, ConfigSource::Environment);
        }

        Ok(Self {
            server_url,
            api_key,
            username,
            secret,
            probe_timeout_ms,
            config_file,
        })
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.value)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/shiftboard/
    /// - macOS: ~/Library/Application Support/shiftboard/
    /// - Windows: %APPDATA%/shiftboard/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shiftboard")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
