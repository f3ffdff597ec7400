//! Operations offered to the facade, composed from the client and the parsers

pub mod latest_scan;
pub mod scan_service;

#[cfg(test)]
pub(crate) mod testing;

pub use latest_scan::{select_latest, LatestScanResolver};
pub use scan_service::ScanService;
