pub mod auth;
pub mod clients;
pub mod config;
pub mod errors;
pub mod logging;
pub mod parsers;
pub mod services;
#[cfg(feature = "server")]
pub mod server; // HTTP 门面
pub mod types;

// Re-export commonly used items for convenience
pub use auth::{ApiContext, Credentials};
pub use clients::{ScanApi, VeracodeClient};
pub use config::AppConfig;
pub use errors::{AppError, ErrorKind, VeracodeError};
pub use services::ScanService;
pub use types::{ReportStatus, ScanReport, ScanSummary};
