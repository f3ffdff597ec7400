use super::response::expect_document;
use super::timestamp::parse_lenient;
use super::xml::XmlElement;
use crate::errors::VeracodeError;
use crate::types::ScanSummary;

/// Parse a `getbuildlist.do` response.
///
/// ```xml
/// <buildlist app_id="220896">
///   <build build_id="1005358" version="Sprint 13.3 Scan 1" policy_updated_date="2016-10-12T11:33:27-04:00"/>
/// </buildlist>
/// ```
///
/// Summaries come back in document order. An unreadable `policy_updated_date`
/// does not fail the list; that entry gets `scanned_at: None`.
pub fn parse_scan_list(body: &[u8]) -> Result<Vec<ScanSummary>, VeracodeError> {
    let doc = expect_document(body)?;

    let root = match doc.root() {
        Some(root) if root.has_child_nodes() => root,
        _ => return Ok(Vec::new()),
    };

    root.child_elements().map(summary_from_element).collect()
}

fn summary_from_element(el: &XmlElement) -> Result<ScanSummary, VeracodeError> {
    let id = el.required_identifier("build_id")?;
    let name = el.required_attribute("version")?;
    let raw_date = el.required_attribute("policy_updated_date")?;

    let scanned_at = parse_lenient(raw_date);
    if scanned_at.is_none() {
        tracing::warn!(
            build_id = id,
            policy_updated_date = raw_date,
            "Could not parse scan date, leaving it unset"
        );
    }

    Ok(ScanSummary {
        id: id.to_string(),
        name: name.to_string(),
        scanned_at,
    })
}
