// handlers/protected/universities.rs - PUT /api/universities/current

use axum::extract::{rejection::JsonRejection, Extension};
use axum::Json;
use serde::Deserialize;

use crate::database::models::{Role, University};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, UniversityContext};
use crate::services::university;

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// GET /api/universities/current
pub async fn current(Extension(current): Extension<UniversityContext>) -> ApiResult<University> {
    Ok(ApiResponse::success(university::get_university(&current.schema).await?))
}

/// Rename the university of the signed-in admin
pub async fn rename_current(
    Extension(auth_user): Extension<AuthUser>,
    Extension(current): Extension<UniversityContext>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> ApiResult<University> {
    auth_user.require_role(&[Role::Admin])?;
    let Json(body) = payload?;

    let renamed = university::rename_university(&current.schema, &body.name).await?;
    Ok(ApiResponse::success(renamed))
}
