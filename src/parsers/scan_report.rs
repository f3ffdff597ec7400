use super::response::expect_document;
use super::timestamp::parse_report_timestamp;
use super::xml::XmlElement;
use crate::errors::VeracodeError;
use crate::types::{ReportStatus, ScanReport};

/// Body text Veracode returns while a scan has no summary report yet.
pub const NO_REPORT_AVAILABLE: &str = "No report available.";

const STATIC_ANALYSIS: &str = "static-analysis";

/// Parse a `summaryreport.do` response.
///
/// Returns `Ok(None)` when the document has no root or an empty root, and
/// [`ReportStatus::Unavailable`] for the vendor's "No report available." body.
pub fn parse_scan_report(body: &[u8]) -> Result<Option<ReportStatus>, VeracodeError> {
    let doc = expect_document(body)?;

    let root = match doc.root() {
        Some(root) if root.has_child_nodes() => root,
        _ => return Ok(None),
    };

    if root.inner_text().trim() == NO_REPORT_AVAILABLE {
        return Ok(Some(ReportStatus::Unavailable));
    }

    report_from_root(root).map(|report| Some(ReportStatus::Ready(report)))
}

fn report_from_root(root: &XmlElement) -> Result<ScanReport, VeracodeError> {
    let id = root.required_identifier("build_id")?;
    let name = root.required_attribute("version")?;
    let submitted_by = root.required_attribute("submitter")?;
    let application_name = root.required_attribute("app_name")?;
    let application_id = root.required_attribute("app_id")?;
    let compliance_status = root.required_attribute("policy_compliance_status")?;
    let total_flaws = flaw_count(root, "total_flaws")?;
    let unmitigated_flaws = flaw_count(root, "flaws_not_mitigated")?;

    if unmitigated_flaws > total_flaws {
        return Err(VeracodeError::InconsistentFlawCounts {
            total: total_flaws,
            unmitigated: unmitigated_flaws,
        });
    }

    let submitted_at = parse_report_timestamp(&published_date(root)?)?;

    Ok(ScanReport {
        id: id.to_string(),
        name: name.to_string(),
        submitted_by: submitted_by.to_string(),
        application_name: application_name.to_string(),
        application_id: application_id.to_string(),
        compliance_status: compliance_status.to_string(),
        total_flaws,
        unmitigated_flaws,
        submitted_at,
    })
}

fn flaw_count(root: &XmlElement, attribute: &'static str) -> Result<u32, VeracodeError> {
    let raw = root.required_attribute(attribute)?;
    raw.trim()
        .parse::<u32>()
        .map_err(|_| VeracodeError::InvalidFlawCount {
            attribute,
            value: raw.to_string(),
        })
}

/// `published_date` of the first `static-analysis` element, read only when that
/// element also carries `submitted_date`. Anything else yields an empty string,
/// which the strict timestamp parser rejects.
fn published_date(root: &XmlElement) -> Result<String, VeracodeError> {
    match root.find_descendant(STATIC_ANALYSIS) {
        Some(analysis) if analysis.attribute("submitted_date").is_some() => analysis
            .attribute("published_date")
            .map(str::to_string)
            .ok_or(VeracodeError::MissingAttribute {
                element: STATIC_ANALYSIS.to_string(),
                attribute: "published_date",
            }),
        _ => Ok(String::new()),
    }
}
