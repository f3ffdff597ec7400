use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Veracode API error: {0}")]
    Veracode(#[from] VeracodeError),
    #[error("Application error: {0}")]
    Generic(String),
}

/// Coarse classification of a [`VeracodeError`], used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or absent Basic credentials on the incoming request.
    AuthHeader,
    /// Veracode rejected the credentials.
    AccessDenied,
    /// The vendor could not be reached, timed out, or answered with a failure status.
    Transport,
    /// The vendor answered but the payload did not have the expected shape.
    MalformedResponse,
    /// No scans for the application, or no report for the scan.
    NotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AuthHeader => "auth_header",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::Transport => "transport",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::NotFound => "not_found",
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthHeaderError {
    #[error("Authorization header is missing")]
    Missing,

    #[error("Unsupported authorization scheme '{0}', expected Basic")]
    UnsupportedScheme(String),

    #[error("Basic authorization header carries no credentials")]
    EmptyCredentials,

    #[error("Basic credentials are not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Basic credentials do not contain a ':' separator")]
    MissingSeparator,
}

#[derive(Debug, Error)]
pub enum VeracodeError {
    #[error("Invalid Basic credentials: {0}")]
    AuthHeader(#[from] AuthHeaderError),

    #[error("Veracode request failed: Access denied")]
    AccessDenied,

    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request timed out")]
    TimeoutError,

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Response is not well-formed XML: {0}")]
    InvalidXml(String),

    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("Attribute '{attribute}' is not a flaw count: '{value}'")]
    InvalidFlawCount {
        attribute: &'static str,
        value: String,
    },

    #[error("Unmitigated flaws ({unmitigated}) exceed total flaws ({total})")]
    InconsistentFlawCounts { total: u32, unmitigated: u32 },

    #[error("Timestamp '{value}' does not match format '{format}'")]
    InvalidTimestamp { value: String, format: &'static str },

    #[error("No scans found for application {app_id}")]
    NoScans { app_id: String },

    #[error("No report exists for scan {scan_id}")]
    ReportNotFound { scan_id: String },

    #[error("Scan list was retrieved but the report for scan {scan_id} failed: {source}")]
    LatestReportFailed {
        scan_id: String,
        #[source]
        source: Box<VeracodeError>,
    },
}

impl VeracodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VeracodeError::AuthHeader(_) => ErrorKind::AuthHeader,
            VeracodeError::AccessDenied => ErrorKind::AccessDenied,
            VeracodeError::NetworkError(_)
            | VeracodeError::TimeoutError
            | VeracodeError::Cancelled
            | VeracodeError::ServerError { .. } => ErrorKind::Transport,
            VeracodeError::InvalidXml(_)
            | VeracodeError::MissingAttribute { .. }
            | VeracodeError::InvalidFlawCount { .. }
            | VeracodeError::InconsistentFlawCounts { .. }
            | VeracodeError::InvalidTimestamp { .. } => ErrorKind::MalformedResponse,
            VeracodeError::NoScans { .. } | VeracodeError::ReportNotFound { .. } => {
                ErrorKind::NotFound
            }
            VeracodeError::LatestReportFailed { source, .. } => source.kind(),
        }
    }

    /// True when the scan list succeeded and only the follow-up report request failed.
    pub fn is_partial_failure(&self) -> bool {
        matches!(self, VeracodeError::LatestReportFailed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Required configuration field '{0}' is missing or invalid")]
    FieldMissing(String),
    #[error("Wrong url format: {0}")]
    InvalidUrl(String),
    #[error("Other Config Error: {0}")]
    Other(String),
}
