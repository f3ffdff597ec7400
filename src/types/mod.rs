pub mod scan;

pub use scan::{ReportStatus, ScanReport, ScanSummary};
