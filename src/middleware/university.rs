use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use sqlx::mysql::MySqlPool;

use super::auth::AuthUser;
use crate::auth::cookies;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::services::university::validate_university_schema;

pub const UNIVERSITY_HEADER: &str = "x-university";

/// The university a request operates on, with the pool of its schema
#[derive(Clone, Debug)]
pub struct UniversityContext {
    pub schema: String,
    pub name: String,
    pub pool: MySqlPool,
}

/// University requested explicitly by the client: header first, then cookie
pub fn requested_university(headers: &HeaderMap) -> Option<String> {
    headers
        .get(UNIVERSITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| cookies::university_from(&CookieJar::from_headers(headers)))
}

/// Pick the university for an authenticated request. An explicit choice must be a valid
/// schema name and must match the university the token was issued for.
pub fn select_university(requested: Option<String>, auth_user: &AuthUser) -> Result<String, ApiError> {
    let Some(requested) = requested else {
        return Ok(auth_user.university.clone());
    };

    DatabaseManager::validate_schema_name(&requested)?;
    if requested != auth_user.university {
        return Err(ApiError::forbidden(format!(
            "Token was not issued for university '{}'",
            requested
        )));
    }
    Ok(requested)
}

/// Resolve the university against the directory and attach its pool to the request.
/// Runs after [`super::jwt_auth_middleware`].
pub async fn university_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before university selection"))?;

    let schema = select_university(requested_university(request.headers()), &auth_user)?;
    let university = validate_university_schema(&schema).await?;
    let pool = DatabaseManager::university_pool(&university.schema_name).await?;

    tracing::debug!("Request routed to university {}", university.schema_name);

    request.extensions_mut().insert(UniversityContext {
        schema: university.schema_name,
        name: university.name,
        pool,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use axum::http::HeaderValue;

    fn token_for(university: &str) -> AuthUser {
        AuthUser {
            user_id: 3,
            university: university.to_string(),
            role: Role::Teacher,
        }
    }

    #[test]
    fn header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("university=uni_cookie"));
        assert_eq!(requested_university(&headers).as_deref(), Some("uni_cookie"));

        headers.insert(UNIVERSITY_HEADER, HeaderValue::from_static(" uni_header "));
        assert_eq!(requested_university(&headers).as_deref(), Some("uni_header"));
    }

    #[test]
    fn falls_back_to_the_token() {
        let schema = select_university(None, &token_for("uni_token")).unwrap();
        assert_eq!(schema, "uni_token");
        assert!(requested_university(&HeaderMap::new()).is_none());
    }

    #[test]
    fn mismatch_is_forbidden() {
        let err = select_university(Some("uni_other".into()), &token_for("uni_token")).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn invalid_names_are_bad_requests() {
        let err = select_university(Some("Robert'); DROP".into()), &token_for("uni_token")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
