#![cfg(feature = "server")]

use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::Value;
use veracode_gateway::clients::VeracodeEndpoints;
use veracode_gateway::config::VeracodeConfig;
use veracode_gateway::server::{routes, AppState};
use veracode_gateway::Credentials;

const BUILD_LIST_PATH: &str = "/api/5.0/getbuildlist.do";
const REPORT_PATH: &str = "/api/4.0/summaryreport.do";

const TWO_BUILDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<buildlist xmlns="https://analysiscenter.veracode.com/schema/2.0/buildlist" account_id="1" app_id="220896" app_name="Portal">
  <build build_id="1005358" version="release-1.4" policy_updated_date="2016-10-12T11:33:27-04:00"/>
  <build build_id="1005412" version="release-1.5" policy_updated_date="2016-11-02T09:00:00-04:00"/>
</buildlist>"#;

const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<summaryreport app_name="Portal" app_id="220896" version="release-1.5" build_id="1005412" submitter="ci-bot" policy_compliance_status="Did Not Pass" total_flaws="40" flaws_not_mitigated="9">
  <static-analysis rating="B" score="81" submitted_date="2016-11-02 13:00:00 UTC" published_date="2016-11-02 14:30:05 UTC">
    <modules><module name="portal.war"/></modules>
  </static-analysis>
</summaryreport>"#;

fn state_for(server: &MockServer) -> Arc<AppState> {
    let endpoints = VeracodeEndpoints::with_base_url(&server.base_url());
    let config = VeracodeConfig {
        list_builds_url: endpoints.list_builds,
        summary_report_url: endpoints.summary_report,
        timeout: 5,
        ..Default::default()
    };
    Arc::new(AppState::new(config).unwrap())
}

fn auth() -> String {
    Credentials::new("alice", "s3cr:et").to_basic_header()
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn scans_without_credentials_is_401() {
    let server = MockServer::start_async().await;
    let vendor = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body(TWO_BUILDS);
        })
        .await;

    let response = warp::test::request()
        .method("GET")
        .path("/api/220896/scans")
        .reply(&routes(state_for(&server)))
        .await;

    assert_eq!(response.status(), 401);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        r#"Basic realm="Veracode""#
    );
    assert_eq!(json_body(response.body())["error"], "auth_header");
    assert_eq!(vendor.hits_async().await, 0);
}

#[tokio::test]
async fn scans_are_returned_as_json() {
    let server = MockServer::start_async().await;
    let vendor = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(BUILD_LIST_PATH)
                .query_param("app_id", "220896")
                .header("Authorization", auth().as_str());
            then.status(200).body(TWO_BUILDS);
        })
        .await;

    let response = warp::test::request()
        .method("GET")
        .path("/api/220896/scans")
        .header("authorization", auth())
        .reply(&routes(state_for(&server)))
        .await;

    vendor.assert_async().await;
    assert_eq!(response.status(), 200);
    let body = json_body(response.body());
    let scans = body.as_array().unwrap();
    assert_eq!(scans.len(), 2);
    assert_eq!(scans[0]["id"], "1005358");
    assert_eq!(scans[0]["name"], "release-1.4");
    assert_eq!(scans[0]["scanned_at"], "2016-10-12T11:33:27-04:00");
    assert_eq!(scans[1]["id"], "1005412");
}

#[tokio::test]
async fn empty_scan_list_is_empty_array() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(BUILD_LIST_PATH);
            then.status(200).body(r#"<buildlist app_id="220896"></buildlist>"#);
        })
        .await;

    let response = warp::test::request()
        .path("/api/220896/scans")
        .header("authorization", auth())
        .reply(&routes(state_for(&server)))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), b"[]");
}

#[tokio::test]
async fn latest_on_empty_list_is_404_without_report_call() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(BUILD_LIST_PATH);
            then.status(200).body(r#"<buildlist app_id="220896"/>"#);
        })
        .await;
    let report = server
        .mock_async(|when, then| {
            when.method(GET).path(REPORT_PATH);
            then.status(200).body(REPORT);
        })
        .await;

    let response = warp::test::request()
        .path("/api/220896/scans/latest")
        .header("authorization", auth())
        .reply(&routes(state_for(&server)))
        .await;

    assert_eq!(response.status(), 404);
    assert_eq!(json_body(response.body())["error"], "not_found");
    assert_eq!(report.hits_async().await, 0);
}

#[tokio::test]
async fn latest_returns_report_of_newest_scan() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(BUILD_LIST_PATH);
            then.status(200).body(TWO_BUILDS);
        })
        .await;
    let report = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(REPORT_PATH)
                .query_param("build_id", "1005412");
            then.status(200).body(REPORT);
        })
        .await;

    let response = warp::test::request()
        .path("/api/220896/scans/latest")
        .header("authorization", auth())
        .reply(&routes(state_for(&server)))
        .await;

    report.assert_async().await;
    assert_eq!(response.status(), 200);
    let body = json_body(response.body());
    assert_eq!(body["status"], "ready");
    assert_eq!(body["report"]["id"], "1005412");
    assert_eq!(body["report"]["compliance_status"], "Did Not Pass");
    assert_eq!(body["report"]["total_flaws"], 40);
    assert_eq!(body["report"]["unmitigated_flaws"], 9);
    assert_eq!(body["report"]["submitted_at"], "2016-11-02T14:30:05Z");
}

#[tokio::test]
async fn report_not_yet_available() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(REPORT_PATH).query_param("build_id", "77");
            then.status(200).body("<error>No report available.</error>");
        })
        .await;

    let response = warp::test::request()
        .path("/api/220896/scans/77")
        .header("authorization", auth())
        .reply(&routes(state_for(&server)))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response.body())["status"], "unavailable");
}

#[tokio::test]
async fn vendor_access_denied_is_401() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body("<error>Access denied.</error>");
        })
        .await;

    let response = warp::test::request()
        .path("/api/220896/scans")
        .header("authorization", auth())
        .reply(&routes(state_for(&server)))
        .await;

    assert_eq!(response.status(), 401);
    assert_eq!(json_body(response.body())["error"], "access_denied");
}

#[tokio::test]
async fn malformed_vendor_payload_is_502() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(REPORT_PATH);
            then.status(200).body(
                r#"<summaryreport build_id="1" version="v" submitter="x" app_name="a" app_id="1" policy_compliance_status="Pass" total_flaws="many" flaws_not_mitigated="0"><static-analysis/></summaryreport>"#,
            );
        })
        .await;

    let response = warp::test::request()
        .path("/api/220896/scans/1")
        .header("authorization", auth())
        .reply(&routes(state_for(&server)))
        .await;

    assert_eq!(response.status(), 502);
    assert_eq!(json_body(response.body())["error"], "malformed_response");
}

#[tokio::test]
async fn unknown_route_is_rejected() {
    let server = MockServer::start_async().await;
    let response = warp::test::request()
        .path("/api/220896")
        .reply(&routes(state_for(&server)))
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn cors_allows_credentialed_browser_calls() {
    let server = MockServer::start_async().await;
    let filter = routes(state_for(&server));

    let preflight = warp::test::request()
        .method("OPTIONS")
        .path("/api/220896/scans")
        .header("origin", "https://dashboard.example")
        .header("access-control-request-method", "GET")
        .header("access-control-request-headers", "authorization")
        .reply(&filter)
        .await;

    assert_eq!(preflight.status(), 200);
    assert_eq!(
        preflight.headers().get("access-control-allow-origin").unwrap(),
        "https://dashboard.example"
    );
    assert_eq!(
        preflight.headers().get("access-control-allow-credentials").unwrap(),
        "true"
    );

    let health = warp::test::request()
        .path("/health")
        .header("origin", "https://dashboard.example")
        .reply(&filter)
        .await;
    assert_eq!(
        health.headers().get("access-control-allow-credentials").unwrap(),
        "true"
    );
}
