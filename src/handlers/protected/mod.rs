pub mod assignments;
pub mod auth;
pub mod courses;
pub mod lectures;
pub mod presentations;
pub mod topics;
pub mod universities;
pub mod users;

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::routing::get;
    use axum::{Extension, Router};
    use serde_json::Value;
    use sqlx::mysql::MySqlPoolOptions;
    use tower::ServiceExt;

    use crate::database::models::Role;
    use crate::middleware::{AuthUser, UniversityContext};

    // Extractors reject before any query runs, so the pool never connects
    fn router() -> Router {
        let pool = MySqlPoolOptions::new()
            .connect_lazy("mysql://nobody@127.0.0.1:9/uni_test")
            .unwrap();

        Router::new()
            .route("/api/courses/:id", get(super::courses::show))
            .route("/api/users", get(super::users::list))
            .route("/api/topics/:id/lectures", get(super::topics::lectures))
            .layer(Extension(UniversityContext {
                schema: "uni_test".to_string(),
                name: "Test University".to_string(),
                pool,
            }))
            .layer(Extension(AuthUser {
                user_id: 1,
                university: "uni_test".to_string(),
                role: Role::Admin,
            }))
    }

    async fn get_json(uri: &str) -> (StatusCode, Option<String>, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn non_numeric_ids_use_the_error_envelope() {
        let (status, content_type, body) = get_json("/api/courses/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["error"].as_str().unwrap().contains("abc"));

        let (status, _, body) = get_json("/api/topics/1.5/lectures").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unknown_query_values_use_the_error_envelope() {
        let (status, _, body) = get_json("/api/users?role=dean").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, _, body) = get_json("/api/users?page=first").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}
