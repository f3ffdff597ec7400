use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::clients::ScanApi;
use crate::errors::VeracodeError;

/// In-memory [`ScanApi`] that counts calls.
pub(crate) struct FakeScanApi {
    pub list_body: Result<String, fn() -> VeracodeError>,
    pub reports: HashMap<String, String>,
    pub list_calls: AtomicUsize,
    pub report_calls: AtomicUsize,
    pub requested: std::sync::Mutex<Vec<String>>,
}

impl FakeScanApi {
    pub fn new(list_body: &str) -> Self {
        Self {
            list_body: Ok(list_body.to_string()),
            reports: HashMap::new(),
            list_calls: AtomicUsize::new(0),
            report_calls: AtomicUsize::new(0),
            requested: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing_list(error: fn() -> VeracodeError) -> Self {
        let mut api = Self::new("");
        api.list_body = Err(error);
        api
    }

    pub fn with_report(mut self, scan_id: &str, body: &str) -> Self {
        self.reports.insert(scan_id.to_string(), body.to_string());
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn report_calls(&self) -> usize {
        self.report_calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScanApi for FakeScanApi {
    fn app_id(&self) -> &str {
        "220896"
    }

    async fn list_scans(&self) -> Result<Vec<u8>, VeracodeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match &self.list_body {
            Ok(body) => Ok(body.clone().into_bytes()),
            Err(make_error) => Err(make_error()),
        }
    }

    async fn get_report(&self, scan_id: &str) -> Result<Vec<u8>, VeracodeError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(scan_id.to_string());
        self.reports
            .get(scan_id)
            .map(|body| body.clone().into_bytes())
            .ok_or(VeracodeError::ServerError { status_code: 500 })
    }
}

pub(crate) fn report_body(build_id: &str, total: u32, unmitigated: u32) -> String {
    format!(
        r#"<summaryreport app_name="Portal" app_id="220896" version="Build {build_id}" build_id="{build_id}" submitter="ci-bot" policy_compliance_status="Pass" total_flaws="{total}" flaws_not_mitigated="{unmitigated}"><static-analysis submitted_date="2024-03-05 09:00:00 UTC" published_date="2024-03-05 10:00:00 UTC"/></summaryreport>"#
    )
}
