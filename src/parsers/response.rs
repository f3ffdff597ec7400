use super::xml::XmlDocument;
use crate::errors::VeracodeError;

/// Veracode signals rejected credentials in-band, inside an HTTP 200 body.
pub const ACCESS_DENIED_MARKER: &str = "Access denied";

/// Outcome of inspecting a vendor body before any structural parsing.
#[derive(Debug)]
pub enum VendorResponse {
    Denied,
    Document(XmlDocument),
}

pub fn classify(body: &[u8]) -> Result<VendorResponse, VeracodeError> {
    match XmlDocument::parse(body) {
        Ok(doc) if doc.inner_text().contains(ACCESS_DENIED_MARKER) => Ok(VendorResponse::Denied),
        Ok(doc) => Ok(VendorResponse::Document(doc)),
        Err(err) => {
            // a denial page is not always well-formed XML
            if String::from_utf8_lossy(body).contains(ACCESS_DENIED_MARKER) {
                Ok(VendorResponse::Denied)
            } else {
                Err(err)
            }
        }
    }
}

/// Classify and turn a denial into [`VeracodeError::AccessDenied`].
pub fn expect_document(body: &[u8]) -> Result<XmlDocument, VeracodeError> {
    match classify(body)? {
        VendorResponse::Denied => {
            tracing::warn!("Veracode rejected the supplied credentials");
            Err(VeracodeError::AccessDenied)
        }
        VendorResponse::Document(doc) => Ok(doc),
    }
}
