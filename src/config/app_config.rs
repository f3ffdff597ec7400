use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::Path};

use super::veracode_config::VeracodeConfig;
use crate::errors::ConfigError;
use crate::logging::{LogFormat, LoggingConfig};

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8080";

/// HTTP 门面配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

/// 日志配置（文件中的原始形式）
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or `veracode_gateway=debug`
    pub level: String,
    /// pretty | compact | json
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LogSettings {
    pub fn to_logging_config(&self) -> LoggingConfig {
        let format = match self.format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        LoggingConfig {
            filter: self.level.clone(),
            format,
            ..LoggingConfig::default()
        }
    }
}

/// Main Application Configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub veracode: VeracodeConfig,
    pub server: ServerConfig,
    pub logging: LogSettings,
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let env_map: HashMap<String, String> = env::vars().collect();
        let config = config.merge_with_env(&env_map);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.to_string_lossy().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path_str.clone(), e))?;
        tracing::debug!(path = %path_str, "Loaded configuration file");
        toml::from_str(&content).map_err(|e| ConfigError::TomlParse(path_str, e))
    }

    pub fn merge_with_env(mut self, env_map: &HashMap<String, String>) -> Self {
        self.veracode = self.veracode.merge_with_env(env_map);
        if let Some(addr) = env_map.get("VERACODE_GATEWAY_ADDR") {
            self.server.addr = addr.clone();
        }
        if let Some(level) = env_map.get("VERACODE_GATEWAY_LOG") {
            self.logging.level = level.clone();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.veracode.validate()?;
        self.server
            .addr
            .parse::<std::net::SocketAddr>()
            .map_err(|e| ConfigError::Other(format!("Invalid server addr {}: {}", self.server.addr, e)))?;
        Ok(())
    }
}
