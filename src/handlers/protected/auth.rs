// handlers/protected/auth.rs - the signed-in user

use axum::extract::{rejection::JsonRejection, Extension};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::password::{hash_password, verify_password};
use crate::database::models::user::UserChanges;
use crate::database::models::{RefreshToken, User};
use crate::error::ApiError;
use crate::handlers::validate;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, UniversityContext};

#[derive(Debug, Serialize)]
pub struct UniversitySummary {
    pub schema: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct Me {
    pub user: User,
    pub university: UniversitySummary,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// GET /api/auth/me
pub async fn me(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
) -> ApiResult<Me> {
    let user = User::find(&university.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    Ok(ApiResponse::success(Me {
        user,
        university: UniversitySummary {
            schema: university.schema,
            name: university.name,
        },
    }))
}

/// PUT /api/auth/password - change the own password; every refresh token is revoked
pub async fn change_password(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(body) = payload?;
    validate::password("new_password", &body.new_password)?;

    let user = User::find(&university.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
    if !verify_password(&body.current_password, &user.password_hash) {
        return Err(ApiError::field("current_password", "Current password is incorrect"));
    }

    let changes = UserChanges {
        password_hash: Some(hash_password(&body.new_password)?),
        ..Default::default()
    };
    User::update(&university.pool, user.id, &changes).await?;
    let revoked = RefreshToken::revoke_all_for_user(&university.pool, user.id).await?;

    tracing::info!(
        "User {} in {} changed password, {} sessions revoked",
        user.id,
        university.schema,
        revoked
    );
    Ok(ApiResponse::success(json!({ "updated": true })))
}
