mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::ensure_server;

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::get(server.url("/api/auth/me")).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = resp.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn garbage_bearer_token_is_unauthorized() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::Client::new()
        .get(server.url("/api/courses"))
        .bearer_auth("not.a.jwt")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_rejects_reserved_schema_before_database() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::Client::new()
        .post(server.url("/api/auth/login"))
        .json(&json!({
            "email": "admin@example.edu",
            "password": "long-enough-password",
            "university": "mysql"
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_reports_unavailable_database() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::Client::new()
        .post(server.url("/api/auth/login"))
        .json(&json!({
            "email": "admin@example.edu",
            "password": "long-enough-password",
            "university": "uni_alpha"
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::Client::new()
        .post(server.url("/api/auth/refresh"))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_expires_refresh_cookie() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::Client::new()
        .post(server.url("/api/auth/logout"))
        .header("Cookie", "refresh_token=stale")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let cleared = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|c| c.starts_with("refresh_token=") && c.contains("Max-Age=0"));
    assert!(cleared, "logout must expire the refresh_token cookie");

    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["logged_out"], true);
    Ok(())
}

#[tokio::test]
async fn registration_rejects_invalid_json() -> Result<()> {
    let server = ensure_server().await?;

    let resp = reqwest::Client::new()
        .post(server.url("/api/universities"))
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
