//! Vendor API clients

use async_trait::async_trait;

use crate::errors::VeracodeError;

pub mod veracode_client;


pub use veracode_client::{VeracodeClient, VeracodeEndpoints};

/// Raw access to the two Veracode endpoints for one application.
#[async_trait]
pub trait ScanApi: Send + Sync {
    /// Application the calls are scoped to.
    fn app_id(&self) -> &str;

    /// Body of the build list for the application.
    async fn list_scans(&self) -> Result<Vec<u8>, VeracodeError>;

    /// Body of the summary report for one build.
    async fn get_report(&self, scan_id: &str) -> Result<Vec<u8>, VeracodeError>;
}
