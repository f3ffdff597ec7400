use crate::auth::ApiContext;
use crate::clients::{ScanApi, VeracodeClient};
use crate::config::VeracodeConfig;
use crate::errors::{ConfigError, VeracodeError};
use crate::parsers::{parse_scan_list, parse_scan_report};
use crate::types::{ReportStatus, ScanSummary};

use super::latest_scan::LatestScanResolver;

/// Scan operations for one application, backed by any [`ScanApi`].
pub struct ScanService<A: ScanApi> {
    api: A,
}

impl<A: ScanApi> ScanService<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// All scans of the application in vendor order.
    pub async fn list_scans(&self) -> Result<Vec<ScanSummary>, VeracodeError> {
        let body = self.api.list_scans().await?;
        let scans = parse_scan_list(&body)?;
        tracing::debug!(app_id = self.api.app_id(), count = scans.len(), "Listed scans");
        Ok(scans)
    }

    /// Report for one scan. A response without a report element is `ReportNotFound`.
    pub async fn report(&self, scan_id: &str) -> Result<ReportStatus, VeracodeError> {
        fetch_report(&self.api, scan_id).await
    }

    pub async fn latest_report(&self) -> Result<ReportStatus, VeracodeError> {
        LatestScanResolver::new(&self.api).resolve().await
    }
}

impl ScanService<VeracodeClient> {
    /// Service talking to the endpoints in `config` with the caller's credentials.
    pub fn for_context(config: &VeracodeConfig, context: ApiContext) -> Result<Self, ConfigError> {
        VeracodeClient::from_config(config, context).map(Self::new)
    }
}

pub(crate) async fn fetch_report<A: ScanApi + ?Sized>(
    api: &A,
    scan_id: &str,
) -> Result<ReportStatus, VeracodeError> {
    let body = api.get_report(scan_id).await?;
    parse_scan_report(&body)?.ok_or_else(|| VeracodeError::ReportNotFound {
        scan_id: scan_id.to_string(),
    })
}
