//! JSON facade over the Veracode XML API
//!
//! Callers authenticate with their own Veracode API credentials via HTTP Basic;
//! the gateway forwards them to Veracode and never stores them.
//!
//! | Route                               | Result                |
//! |-------------------------------------|-----------------------|
//! | `GET /health`                       | `{"ok": true}`        |
//! | `GET /api/{app_id}/scans`           | `[ScanSummary]`       |
//! | `GET /api/{app_id}/scans/latest`    | `ReportStatus`        |
//! | `GET /api/{app_id}/scans/{scan_id}` | `ReportStatus`        |

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use warp::http::header::{HeaderValue, WWW_AUTHENTICATE};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::auth::{ApiContext, Credentials};
use crate::clients::VeracodeClient;
use crate::config::VeracodeConfig;
use crate::errors::{AppError, ErrorKind, VeracodeError};
use crate::services::ScanService;
use crate::types::{ReportStatus, ScanSummary};

const BASIC_CHALLENGE: &str = r#"Basic realm="Veracode""#;

/// Shared across requests: one connection pool and the vendor settings.
#[derive(Debug, Clone)]
pub struct AppState {
    http: reqwest::Client,
    veracode: VeracodeConfig,
}

impl AppState {
    pub fn new(veracode: VeracodeConfig) -> Result<Self, AppError> {
        let http = veracode.http_client()?;
        Ok(Self { http, veracode })
    }

    fn service_for(
        &self,
        app_id: String,
        authorization: Option<String>,
    ) -> Result<ScanService<VeracodeClient>, VeracodeError> {
        let credentials = Credentials::from_authorization_header(authorization.as_deref())?;
        let client = VeracodeClient::new(ApiContext::new(credentials, app_id))
            .with_endpoints(self.veracode.endpoints())
            .with_timeout(self.veracode.timeout())
            .with_http_client(self.http.clone());
        Ok(ScanService::new(client))
    }
}

/// All facade routes with CORS and request logging applied.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_state = warp::any().map(move || state.clone());
    let authorization = warp::header::optional::<String>("authorization");

    // GET /health
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({"ok": true})));

    // GET /api/{app_id}/scans/latest，必须排在 {scan_id} 之前
    let latest = warp::path!("api" / String / "scans" / "latest")
        .and(warp::get())
        .and(authorization.clone())
        .and(with_state.clone())
        .and_then(latest_report);

    // GET /api/{app_id}/scans/{scan_id}
    let report = warp::path!("api" / String / "scans" / String)
        .and(warp::get())
        .and(authorization.clone())
        .and(with_state.clone())
        .and_then(scan_report);

    // GET /api/{app_id}/scans
    let scans = warp::path!("api" / String / "scans")
        .and(warp::get())
        .and(authorization)
        .and(with_state)
        .and_then(list_scans);

    health
        .or(latest)
        .or(report)
        .or(scans)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_credentials(true)
                .allow_headers(["accept", "content-type", "origin", "authorization"])
                .allow_methods(["GET"]),
        )
        .with(warp::log("veracode_gateway::http"))
}

/// Serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<(), AppError> {
    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .map_err(|e| AppError::Generic(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %bound, "Veracode gateway listening");
    server.await;
    tracing::info!("Veracode gateway shut down");
    Ok(())
}

async fn list_scans(
    app_id: String,
    authorization: Option<String>,
    state: Arc<AppState>,
) -> Result<Response, Infallible> {
    let result: Result<Vec<ScanSummary>, VeracodeError> =
        match state.service_for(app_id, authorization) {
            Ok(service) => service.list_scans().await,
            Err(e) => Err(e),
        };
    Ok(respond(result))
}

async fn scan_report(
    app_id: String,
    scan_id: String,
    authorization: Option<String>,
    state: Arc<AppState>,
) -> Result<Response, Infallible> {
    let result: Result<ReportStatus, VeracodeError> =
        match state.service_for(app_id, authorization) {
            Ok(service) => service.report(&scan_id).await,
            Err(e) => Err(e),
        };
    Ok(respond(result))
}

async fn latest_report(
    app_id: String,
    authorization: Option<String>,
    state: Arc<AppState>,
) -> Result<Response, Infallible> {
    let result: Result<ReportStatus, VeracodeError> =
        match state.service_for(app_id, authorization) {
            Ok(service) => service.latest_report().await,
            Err(e) => Err(e),
        };
    Ok(respond(result))
}

fn respond<T: Serialize>(result: Result<T, VeracodeError>) -> Response {
    match result {
        Ok(value) => warp::reply::json(&value).into_response(),
        Err(err) => error_response(&err),
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::AuthHeader | ErrorKind::AccessDenied => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Transport | ErrorKind::MalformedResponse => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(err: &VeracodeError) -> Response {
    let kind = err.kind();
    let status = status_for(kind);

    if status == StatusCode::BAD_GATEWAY {
        tracing::warn!(
            error = %err,
            kind = kind.as_str(),
            partial = err.is_partial_failure(),
            "Upstream failure"
        );
    } else {
        tracing::info!(error = %err, kind = kind.as_str(), "Request rejected");
    }

    let body = warp::reply::json(&json!({
        "error": kind.as_str(),
        "message": err.to_string(),
    }));
    let mut response = warp::reply::with_status(body, status).into_response();
    if status == StatusCode::UNAUTHORIZED {
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::AuthHeader), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::AccessDenied), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Transport), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::MalformedResponse), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = error_response(&VeracodeError::AccessDenied);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            BASIC_CHALLENGE
        );
    }

    #[test]
    fn test_not_found_has_no_challenge() {
        let response = error_response(&VeracodeError::NoScans {
            app_id: "1".to_string(),
        });
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_state_rejects_bad_user_agent() {
        let config = VeracodeConfig {
            user_agent: "bad\nagent".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            AppState::new(config),
            Err(AppError::Config(ConfigError::Other(_)))
        ));
    }

    #[tokio::test]
    async fn test_health() {
        let state = Arc::new(AppState::new(VeracodeConfig::default()).unwrap());
        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&routes(state))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_bad_scheme_is_rejected_before_vendor_call() {
        let config = VeracodeConfig {
            list_builds_url: "http://127.0.0.1:1/list".to_string(),
            ..Default::default()
        };
        let state = Arc::new(AppState::new(config).unwrap());
        let response = warp::test::request()
            .path("/api/220896/scans")
            .header("authorization", "Bearer abc")
            .reply(&routes(state))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"], "auth_header");
    }
}
