use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_CONFIG: &str = "TRAMCAN_CONFIG";
pub const ENV_DATABASE_PATH: &str = "TRAMCAN_DATABASE_PATH";
pub const ENV_PORT: &str = "TRAMCAN_PORT";
pub const ENV_MAX_CONNECTIONS: &str = "TRAMCAN_MAX_CONNECTIONS";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

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

/// Sync server configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the shared SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Port the HTTP server listens on
    pub port: ConfigValue<u16>,
    /// Upper bound on pooled database connections
    pub max_connections: ConfigValue<u32>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    port: Option<u16>,
    max_connections: Option<u32>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_from(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], reading environment variables through `env`.
    pub fn load_from<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("tramcan.db"),
            ConfigSource::Default,
        );
        let mut port = ConfigValue::new(DEFAULT_PORT, ConfigSource::Default);
        let mut max_connections = ConfigValue::new(DEFAULT_MAX_CONNECTIONS, ConfigSource::Default);
        let mut config_file = None;

        // Explicit path wins over TRAMCAN_CONFIG
        let path = config_path
            .or_else(|| env(ENV_CONFIG).map(PathBuf::from))
            .unwrap_or_else(Self::default_config_path);

        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(p) = file_config.port {
                port = ConfigValue::new(p, ConfigSource::File);
            }
            if let Some(max) = file_config.max_connections {
                max_connections = ConfigValue::new(max, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Some(db_path) = env(ENV_DATABASE_PATH) {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Some(raw) = env(ENV_PORT) {
            let p = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_PORT, raw.clone()))?;
            port = ConfigValue::new(p, ConfigSource::Environment);
        }
        if let Some(raw) = env(ENV_MAX_CONNECTIONS) {
            let max = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_MAX_CONNECTIONS, raw.clone()))?;
            max_connections = ConfigValue::new(max, ConfigSource::Environment);
        }

        if max_connections.value == 0 {
            return Err(ConfigError::InvalidValue("max_connections", "0".to_string()));
        }

        Ok(Self {
            database_path,
            port,
            max_connections,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/tramcan/
    /// - macOS: ~/Library/Application Support/tramcan/
    /// - Windows: %APPDATA%/tramcan/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tramcan")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/tramcan/
    /// - macOS: ~/Library/Application Support/tramcan/
    /// - Windows: %APPDATA%/tramcan/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tramcan")
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
    InvalidValue(&'static str, String),
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
            ConfigError::InvalidValue(key, value) => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
            ConfigError::InvalidValue(..) => None,
        }
    }
}
