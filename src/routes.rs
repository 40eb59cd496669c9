use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::{self, AppConfig};
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, university::UNIVERSITY_HEADER, university_middleware};

pub fn app() -> Router {
    let config = config::config();

    let router = Router::new()
        .route("/", get(public::service::root))
        .route("/health", get(public::service::health))
        .merge(public_routes())
        .merge(protected_routes())
        // Global middleware
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(cors_layer(config));

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router {
    use public::{auth, universities};

    Router::new()
        .route("/api/universities", get(universities::list).post(universities::register))
        .route("/api/universities/:schema", get(universities::show))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
}

/// Routes inside one university. Layers run bottom-up: JWT first, then university selection.
fn protected_routes() -> Router {
    use protected::{assignments, auth, courses, lectures, presentations, topics, universities, users};

    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/password", put(auth::change_password))
        .route(
            "/api/universities/current",
            get(universities::current).put(universities::rename_current),
        )
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", get(users::show).put(users::update).delete(users::delete))
        .route("/api/courses", get(courses::list).post(courses::create))
        .route(
            "/api/courses/:id",
            get(courses::show).put(courses::update).delete(courses::delete),
        )
        .route("/api/courses/:id/topics", get(courses::topics))
        .route("/api/topics", post(topics::create))
        .route("/api/topics/:id", get(topics::show).put(topics::update).delete(topics::delete))
        .route("/api/topics/:id/lectures", get(topics::lectures))
        .route("/api/topics/:id/assignments", get(topics::assignments))
        .route("/api/topics/:id/presentations", get(topics::presentations))
        .route("/api/lectures", post(lectures::create))
        .route(
            "/api/lectures/:id",
            get(lectures::show).put(lectures::update).delete(lectures::delete),
        )
        .route("/api/assignments", post(assignments::create))
        .route(
            "/api/assignments/:id",
            get(assignments::show).put(assignments::update).delete(assignments::delete),
        )
        .route("/api/presentations", post(presentations::create))
        .route(
            "/api/presentations/:id",
            get(presentations::show)
                .put(presentations::update)
                .delete(presentations::delete),
        )
        .route_layer(from_fn(university_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

/// Credentialed CORS for the configured dashboard origins
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(UNIVERSITY_HEADER),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{issue_access_token, issue_refresh_token};
    use crate::database::models::Role;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn root_describes_the_service() {
        let (status, body) = send(Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "University API");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let (status, body) = send(Request::get("/api/courses").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn refresh_tokens_are_not_access_tokens() {
        let refresh = issue_refresh_token(1, "uni_alpha", Role::Admin).unwrap();
        let request = Request::get("/api/auth/me")
            .header("authorization", bearer(&refresh.token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_university_header_is_rejected() {
        let access = issue_access_token(1, "uni_alpha", Role::Admin).unwrap();
        let request = Request::get("/api/users")
            .header("authorization", bearer(&access.token))
            .header(UNIVERSITY_HEADER, "Uni Alpha!")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn university_must_match_the_token() {
        let access = issue_access_token(1, "uni_alpha", Role::Admin).unwrap();
        let request = Request::get("/api/courses")
            .header("authorization", bearer(&access.token))
            .header(UNIVERSITY_HEADER, "uni_beta")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let request = Request::get("/api/courses")
            .header("authorization", bearer(&access.token))
            .header("cookie", "university=uni_beta")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn login_needs_a_university() {
        let request = Request::post("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email":"a@example.edu","password":"whatever1"}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn login_rejects_invalid_university_names() {
        let request = Request::post("/api/auth/login")
            .header("content-type", "application/json")
            .header(UNIVERSITY_HEADER, "mysql")
            .body(Body::from(r#"{"email":"a@example.edu","password":"whatever1"}"#))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn refresh_without_cookie_is_unauthorized() {
        let (status, body) = send(Request::post("/api/auth/refresh").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing refresh token");
    }

    #[tokio::test]
    async fn logout_always_clears_the_cookie() {
        let response = app()
            .oneshot(Request::post("/api/auth/logout").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cleared = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with("refresh_token="));
        assert!(cleared);
    }

    #[tokio::test]
    async fn registration_validates_before_provisioning() {
        let request = Request::post("/api/universities")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_JSON");

        let request = Request::post("/api/universities")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"name":"Alpha University","schema":"uni_alpha","admin":{"name":"Root","email":"root@alpha.edu","password":"short"}}"#,
            ))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["field_errors"]["admin.password"].is_string());
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let response = app()
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
