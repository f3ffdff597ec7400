use crate::clients::ScanApi;
use crate::errors::VeracodeError;
use crate::parsers::parse_scan_list;
use crate::types::{ReportStatus, ScanSummary};

use super::scan_service::fetch_report;

/// Most recent scan by `scanned_at`; earlier entries win ties and unknown dates sort first.
pub fn select_latest(scans: &[ScanSummary]) -> Option<&ScanSummary> {
    scans.iter().fold(None, |best, scan| match best {
        Some(current) if scan.scanned_at <= current.scanned_at => Some(current),
        _ => Some(scan),
    })
}

/// Lists the application's scans, picks the newest and fetches its report.
pub struct LatestScanResolver<'a, A: ScanApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: ScanApi + ?Sized> LatestScanResolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub async fn resolve(&self) -> Result<ReportStatus, VeracodeError> {
        let body = self.api.list_scans().await?;
        let scans = parse_scan_list(&body)?;

        let latest = select_latest(&scans).ok_or_else(|| VeracodeError::NoScans {
            app_id: self.api.app_id().to_string(),
        })?;

        tracing::info!(
            app_id = self.api.app_id(),
            scan_id = %latest.id,
            scans = scans.len(),
            "Resolved latest scan"
        );

        fetch_report(self.api, &latest.id)
            .await
            .map_err(|source| VeracodeError::LatestReportFailed {
                scan_id: latest.id.clone(),
                source: Box::new(source),
            })
    }
}
