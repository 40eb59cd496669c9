// handlers/public/service.rs - GET / and GET /health

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "University API",
            "version": version,
            "description": "Multi-tenant university management backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "universities": "/api/universities[/:schema] (public), /api/universities/current (admin)",
                "auth": "/api/auth/login, /api/auth/refresh, /api/auth/logout (public); /api/auth/me, /api/auth/password (protected)",
                "users": "/api/users[/:id] (protected)",
                "courses": "/api/courses[/:id[/topics]] (protected)",
                "topics": "/api/topics[/:id[/lectures|/assignments|/presentations]] (protected)",
                "materials": "/api/lectures, /api/assignments, /api/presentations [/:id] (protected)",
            },
            "university_selection": "x-university header, university cookie, or the token's university claim"
        }
    }))
}

pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();
    let cached_pools = DatabaseManager::cached_pool_count().await;

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "university_pools": cached_pools
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "university_pools": cached_pools
                    }
                })),
            )
        }
    }
}
