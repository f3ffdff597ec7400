use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the Veracode build list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Veracode `build_id`
    pub id: String,
    /// Veracode `version`, usually the build label
    pub name: String,
    /// `policy_updated_date`; `None` when the vendor value could not be read
    pub scanned_at: Option<DateTime<FixedOffset>>,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scanned_at {
            Some(at) => write!(
                f,
                "{} scanned on {} at {} with id of {}",
                self.name,
                at.format("%A, %B %-d, %Y"),
                at.format("%H:%M:%S"),
                self.id
            ),
            None => write!(f, "{} (scan date unknown) with id of {}", self.name, self.id),
        }
    }
}

/// Summary report of a single scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub id: String,
    pub name: String,
    pub submitted_by: String,
    pub application_name: String,
    pub application_id: String,
    /// Vendor policy compliance status, e.g. `Pass` or `Did Not Pass`
    pub compliance_status: String,
    pub total_flaws: u32,
    /// Flaws without an approved mitigation; never more than `total_flaws`
    pub unmitigated_flaws: u32,
    pub submitted_at: DateTime<Utc>,
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scanned on {} at {} had {} unmitigated flaws out of a total of {}.",
            self.name,
            self.submitted_at.format("%A, %B %-d, %Y"),
            self.submitted_at.format("%H:%M:%S"),
            self.unmitigated_flaws,
            self.total_flaws
        )
    }
}

/// Whether Veracode has produced a report for a scan yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "report", rename_all = "snake_case")]
pub enum ReportStatus {
    Ready(ScanReport),
    /// Veracode answered "No report available."
    Unavailable,
}

impl ReportStatus {
    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            ReportStatus::Ready(report) => Some(report),
            ReportStatus::Unavailable => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ReportStatus::Ready(_))
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Ready(report) => report.fmt(f),
            ReportStatus::Unavailable => f.write_str("No Report Available"),
        }
    }
}
