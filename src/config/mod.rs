pub mod app_config;
pub mod veracode_config;

// Re-export commonly used types
pub use app_config::{AppConfig, LogSettings, ServerConfig};
pub use veracode_config::VeracodeConfig;
