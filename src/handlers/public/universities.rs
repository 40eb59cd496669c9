// handlers/public/universities.rs - university directory and self-service registration

use axum::extract::{rejection::JsonRejection, Path};
use axum::Json;
use serde::Deserialize;

use crate::database::models::University;
use crate::handlers::validate;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::university::{self, AdminAccount, Registration};

#[derive(Debug, Deserialize)]
pub struct AdminRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUniversityRequest {
    pub name: String,
    /// Schema that will hold the university's data, e.g. `uni_oxford`
    pub schema: String,
    pub admin: AdminRequest,
}

/// GET /api/universities
pub async fn list() -> ApiResult<Vec<University>> {
    Ok(ApiResponse::success(university::list_universities().await?))
}

/// GET /api/universities/:schema
pub async fn show(Path(schema): Path<String>) -> ApiResult<University> {
    Ok(ApiResponse::success(university::get_university(&schema).await?))
}

/// POST /api/universities - provision a new university and its first admin
pub async fn register(payload: Result<Json<RegisterUniversityRequest>, JsonRejection>) -> ApiResult<Registration> {
    let Json(body) = payload?;

    let admin = AdminAccount {
        name: validate::required_text("admin.name", &body.admin.name, 255)?,
        email: validate::email(&body.admin.email)?,
        password: body.admin.password,
    };
    validate::password("admin.password", &admin.password)?;

    let registration = university::register_university(&body.name, body.schema.trim(), &admin).await?;
    Ok(ApiResponse::created(registration))
}
