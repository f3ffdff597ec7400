use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

use crate::errors::AuthHeaderError;

/// Veracode API user name and password taken from a Basic authorization header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization` header value.
    ///
    /// Only the `Basic` scheme is accepted (case-insensitive). The parameter is
    /// decoded as ISO-8859-1 and split on the first `:`, so passwords may
    /// themselves contain colons.
    pub fn from_authorization_header(header: Option<&str>) -> Result<Self, AuthHeaderError> {
        let header = header.map(str::trim).filter(|h| !h.is_empty());
        let header = header.ok_or(AuthHeaderError::Missing)?;

        let (scheme, parameter) = match header.split_once(char::is_whitespace) {
            Some((scheme, parameter)) => (scheme, parameter.trim()),
            None => (header, ""),
        };

        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthHeaderError::UnsupportedScheme(scheme.to_string()));
        }
        if parameter.is_empty() {
            return Err(AuthHeaderError::EmptyCredentials);
        }

        let raw = STANDARD.decode(parameter)?;
        // ISO-8859-1 maps every byte to the code point of the same value
        let decoded: String = raw.iter().map(|&b| b as char).collect();

        let (username, password) = decoded
            .split_once(':')
            .ok_or(AuthHeaderError::MissingSeparator)?;

        Ok(Self::new(username, password))
    }

    /// Encode back into an `Authorization` header value.
    pub fn to_basic_header(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.username, self.password))
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything a single vendor call needs: who is asking and for which application.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub credentials: Credentials,
    pub app_id: String,
}

impl ApiContext {
    pub fn new(credentials: Credentials, app_id: impl Into<String>) -> Self {
        Self {
            credentials,
            app_id: app_id.into(),
        }
    }
}
