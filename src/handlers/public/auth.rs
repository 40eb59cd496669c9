// handlers/public/auth.rs - token acquisition: login, refresh and logout

use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::mysql::MySqlPool;

use crate::auth::password::verify_password;
use crate::auth::{cookies, hash_refresh_token, issue_access_token, issue_refresh_token, verify_jwt, TokenType};
use crate::config;
use crate::database::models::{RefreshToken, User};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{requested_university, ApiResponse};
use crate::services::university::validate_university_schema;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Alternative to the `x-university` header and cookie
    pub university: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub university: String,
    pub user: User,
}

/// Issue an access token and a stored refresh token for `user`
async fn start_session(
    pool: &MySqlPool,
    schema: &str,
    user: User,
    jar: CookieJar,
) -> Result<(CookieJar, SessionResponse), ApiError> {
    let access = issue_access_token(user.id, schema, user.role)?;
    let refresh = issue_refresh_token(user.id, schema, user.role)?;

    RefreshToken::purge_expired(pool, user.id).await?;
    RefreshToken::store(pool, user.id, &hash_refresh_token(&refresh.token), refresh.claims.expires_at()).await?;

    let jar = jar
        .add(cookies::refresh_token_cookie(&refresh.token))
        .add(cookies::university_cookie(schema));

    let response = SessionResponse {
        access_token: access.token,
        token_type: "Bearer",
        expires_in: config::config().security.access_token_expiry_minutes * 60,
        university: schema.to_string(),
        user,
    };
    Ok((jar, response))
}

/// POST /api/auth/login
pub async fn login(
    headers: HeaderMap,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), ApiError> {
    let Json(body) = payload?;

    let schema = body
        .university
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .or_else(|| requested_university(&headers))
        .ok_or_else(|| ApiError::bad_request("University is required (x-university header or university cookie)"))?;

    let university = validate_university_schema(&schema).await?;
    let pool = DatabaseManager::university_pool(&university.schema_name).await?;

    let email = body.email.trim().to_lowercase();
    let user = match User::find_by_email(&pool, &email).await? {
        Some(user) if verify_password(&body.password, &user.password_hash) => user,
        _ => {
            tracing::info!("Failed login for {} in {}", email, university.schema_name);
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    tracing::info!("User {} logged in to {}", user.id, university.schema_name);
    let (jar, session) = start_session(&pool, &university.schema_name, user, jar).await?;
    Ok((jar, ApiResponse::success(session)))
}

/// Validate, revoke and replace a refresh token
async fn rotate(token: &str, jar: CookieJar) -> Result<(CookieJar, SessionResponse), ApiError> {
    let claims = verify_jwt(token, TokenType::Refresh)?;
    let university = validate_university_schema(&claims.university).await?;
    let pool = DatabaseManager::university_pool(&university.schema_name).await?;

    if !RefreshToken::consume(&pool, claims.sub, &hash_refresh_token(token)).await? {
        return Err(ApiError::unauthorized("Refresh token has been revoked"));
    }

    // The role may have changed since the token was issued
    let user = User::find(&pool, claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    start_session(&pool, &university.schema_name, user, jar).await
}

/// POST /api/auth/refresh - exchange the refresh cookie for a new access token
pub async fn refresh(jar: CookieJar) -> Result<(CookieJar, ApiResponse<SessionResponse>), (CookieJar, ApiError)> {
    let Some(token) = cookies::refresh_token_from(&jar) else {
        return Err((jar, ApiError::unauthorized("Missing refresh token")));
    };

    match rotate(&token, jar.clone()).await {
        Ok((jar, session)) => Ok((jar, ApiResponse::success(session))),
        Err(e) => {
            tracing::debug!("Refresh rejected: {}", e);
            Err((clear_if_rejected(jar, &e), e))
        }
    }
}

/// Drop the refresh cookie only when the token itself was refused (4xx). Outages and
/// configuration errors leave it in place so the client can retry.
fn clear_if_rejected(jar: CookieJar, error: &ApiError) -> CookieJar {
    if (400..500).contains(&error.status_code()) {
        cookies::clear_refresh_token(jar)
    } else {
        jar
    }
}

/// POST /api/auth/logout - revoke the refresh token and clear its cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse<Value>) {
    if let Some(token) = cookies::refresh_token_from(&jar) {
        if let Err(e) = revoke(&token).await {
            tracing::warn!("Could not revoke refresh token on logout: {}", e);
        }
    }

    (
        cookies::clear_refresh_token(jar),
        ApiResponse::success(json!({ "logged_out": true })),
    )
}

async fn revoke(token: &str) -> Result<(), ApiError> {
    let claims = verify_jwt(token, TokenType::Refresh)?;
    let pool = DatabaseManager::university_pool(&claims.university).await?;
    RefreshToken::revoke(&pool, &hash_refresh_token(token)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in_jar() -> CookieJar {
        CookieJar::new().add(cookies::refresh_token_cookie("issued-token"))
    }

    #[test]
    fn refused_tokens_lose_their_cookie() {
        let jar = clear_if_rejected(signed_in_jar(), &ApiError::unauthorized("Refresh token has been revoked"));
        assert!(cookies::refresh_token_from(&jar).is_none());

        let jar = clear_if_rejected(signed_in_jar(), &ApiError::not_found("University 'uni_gone' not found"));
        assert!(cookies::refresh_token_from(&jar).is_none());
    }

    #[test]
    fn outages_keep_the_cookie() {
        let jar = clear_if_rejected(
            signed_in_jar(),
            &ApiError::service_unavailable("Database temporarily unavailable"),
        );
        assert_eq!(cookies::refresh_token_from(&jar).as_deref(), Some("issued-token"));

        let jar = clear_if_rejected(signed_in_jar(), &ApiError::internal_server_error("Database error occurred"));
        assert_eq!(cookies::refresh_token_from(&jar).as_deref(), Some("issued-token"));
    }
}
