mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::ensure_server;

#[tokio::test]
async fn root_reports_name_and_version() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::get(server.url("/")).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "University API");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn health_reports_degraded_without_database() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::get(server.url("/health")).await?;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = resp.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "degraded");
    Ok(())
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, server.url("/api/courses"))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization,x-university")
        .send()
        .await?;

    let headers = resp.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").and_then(|v| v.to_str().ok()),
        Some("true")
    );
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::get(server.url("/api/nothing-here")).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}
