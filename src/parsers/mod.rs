//! Translation of Veracode XML payloads into domain records

pub mod response;
pub mod scan_list;
pub mod scan_report;
pub mod timestamp;
pub mod xml;

pub use response::{classify, VendorResponse};
pub use scan_list::parse_scan_list;
pub use scan_report::{parse_scan_report, NO_REPORT_AVAILABLE};
