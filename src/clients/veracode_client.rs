use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::ScanApi;
use crate::auth::ApiContext;
use crate::config::veracode_config::{
    VeracodeConfig, DEFAULT_LIST_BUILDS_URL, DEFAULT_SUMMARY_REPORT_URL, DEFAULT_TIMEOUT_SECONDS,
};
use crate::errors::{ConfigError, VeracodeError};
use crate::logging::OperationTimer;

const LIST_BUILDS_PATH: &str = "/api/5.0/getbuildlist.do";
const SUMMARY_REPORT_PATH: &str = "/api/4.0/summaryreport.do";

/// Absolute URLs of the two Veracode endpoints this client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VeracodeEndpoints {
    pub list_builds: String,
    pub summary_report: String,
}

impl Default for VeracodeEndpoints {
    fn default() -> Self {
        Self {
            list_builds: DEFAULT_LIST_BUILDS_URL.to_string(),
            summary_report: DEFAULT_SUMMARY_REPORT_URL.to_string(),
        }
    }
}

impl VeracodeEndpoints {
    /// Endpoints rooted at another host, keeping Veracode's paths.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            list_builds: format!("{}{}", base, LIST_BUILDS_PATH),
            summary_report: format!("{}{}", base, SUMMARY_REPORT_PATH),
        }
    }
}

/// Client for the Veracode XML API, scoped to one set of credentials and one application.
#[derive(Debug)]
pub struct VeracodeClient {
    context: ApiContext,
    endpoints: VeracodeEndpoints,
    client: Client,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl VeracodeClient {
    pub fn new(context: ApiContext) -> Self {
        VeracodeClient {
            context,
            endpoints: VeracodeEndpoints::default(),
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            cancel: None,
        }
    }

    pub fn from_config(config: &VeracodeConfig, context: ApiContext) -> Result<Self, ConfigError> {
        let client = config.http_client()?;

        Ok(Self::new(context)
            .with_endpoints(config.endpoints())
            .with_timeout(config.timeout())
            .with_http_client(client))
    }

    pub fn with_endpoints(mut self, endpoints: VeracodeEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reuse a connection pool owned by the caller.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Abort in-flight requests once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn context(&self) -> &ApiContext {
        &self.context
    }

    async fn fetch(
        &self,
        operation: &str,
        url: &str,
        query: (&str, &str),
    ) -> Result<Vec<u8>, VeracodeError> {
        let timer = OperationTimer::new(operation)
            .with_metadata("app_id", &self.context.app_id)
            .with_metadata(query.0, query.1);

        tracing::debug!(url, param = query.0, value = query.1, "Calling Veracode API");

        let credentials = &self.context.credentials;
        let request = self
            .client
            .get(url)
            .query(&[query])
            .basic_auth(&credentials.username, Some(&credentials.password))
            .header(header::ACCEPT, "application/xml")
            .timeout(self.timeout);

        let exchange = async {
            let response = request.send().await.map_err(map_reqwest_error)?;
            let status = response.status();
            if !status.is_success() {
                return Err(map_status(status));
            }
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            Ok(body.to_vec())
        };

        let result = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(VeracodeError::Cancelled),
                    result = exchange => result,
                }
            }
            None => exchange.await,
        };

        if let Err(e) = &result {
            tracing::warn!(operation, error = %e, "Veracode request failed");
        }
        timer.finish();
        result
    }
}

fn map_reqwest_error(e: reqwest::Error) -> VeracodeError {
    if e.is_timeout() {
        VeracodeError::TimeoutError
    } else {
        VeracodeError::NetworkError(e)
    }
}

fn map_status(status: StatusCode) -> VeracodeError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => VeracodeError::AccessDenied,
        s => VeracodeError::ServerError {
            status_code: s.as_u16(),
        },
    }
}

#[async_trait]
impl ScanApi for VeracodeClient {
    fn app_id(&self) -> &str {
        &self.context.app_id
    }

    async fn list_scans(&self) -> Result<Vec<u8>, VeracodeError> {
        self.fetch(
            "veracode.list_scans",
            &self.endpoints.list_builds,
            ("app_id", &self.context.app_id),
        )
        .await
    }

    async fn get_report(&self, scan_id: &str) -> Result<Vec<u8>, VeracodeError> {
        self.fetch(
            "veracode.get_report",
            &self.endpoints.summary_report,
            ("build_id", scan_id),
        )
        .await
    }
}
