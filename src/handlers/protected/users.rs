// handlers/protected/users.rs - /api/users

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::Deserialize;

use crate::api::pagination::{Paginated, PaginationQuery};
use crate::auth::password::hash_password;
use crate::database::models::user::{NewUser, UserChanges, UserFilter};
use crate::database::models::{Role, User};
use crate::error::ApiError;
use crate::handlers::utils::{found, Deleted};
use crate::handlers::validate;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, UniversityContext};

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<Role>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub student_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub student_id: Option<String>,
}

/// Student ids belong to students only
fn check_student_id(role: Role, student_id: Option<String>) -> Result<Option<String>, ApiError> {
    let student_id = validate::optional_text("student_id", student_id.as_deref(), 64)?;
    if student_id.is_some() && role != Role::Student {
        return Err(ApiError::field("student_id", "Only students can have a student id"));
    }
    Ok(student_id)
}

/// GET /api/users
pub async fn list(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    query: Result<Query<UserListQuery>, QueryRejection>,
) -> ApiResult<Paginated<User>> {
    let Query(query) = query?;
    auth_user.require_role(&[Role::Admin, Role::Teacher])?;

    let page = PaginationQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve();
    let filter = UserFilter {
        role: query.role,
        search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
    };

    let (users, total) = User::list(&university.pool, &filter, page).await?;
    Ok(ApiResponse::success(Paginated::new(users, page, total)))
}

/// GET /api/users/:id - staff see everyone, everybody sees themselves
pub async fn show(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<User> {
    let Path(id) = path?;
    if auth_user.user_id != id {
        auth_user.require_role(&[Role::Admin, Role::Teacher])?;
    }

    let user = found(User::find(&university.pool, id).await?, "User", id)?;
    Ok(ApiResponse::success(user))
}

/// POST /api/users
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    auth_user.require_role(&[Role::Admin])?;
    let Json(body) = payload?;

    validate::password("password", &body.password)?;
    let new_user = NewUser {
        name: validate::required_text("name", &body.name, 255)?,
        email: validate::email(&body.email)?,
        password_hash: hash_password(&body.password)?,
        role: body.role,
        student_id: check_student_id(body.role, body.student_id)?,
    };

    let user = User::create(&university.pool, &new_user).await?;
    tracing::info!("Created {} {} in {}", user.role, user.id, university.schema);
    Ok(ApiResponse::created(user))
}

/// PUT /api/users/:id - partial update
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Path(id) = path?;
    auth_user.require_role(&[Role::Admin])?;
    let Json(body) = payload?;

    let existing = found(User::find(&university.pool, id).await?, "User", id)?;
    let role = body.role.unwrap_or(existing.role);
    if id == auth_user.user_id && role != Role::Admin {
        return Err(ApiError::field("role", "You cannot remove your own admin role"));
    }

    let password_hash = match body.password.as_deref() {
        Some(password) => {
            validate::password("password", password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let changes = UserChanges {
        name: body
            .name
            .as_deref()
            .map(|name| validate::required_text("name", name, 255))
            .transpose()?,
        email: body.email.as_deref().map(validate::email).transpose()?,
        password_hash,
        role: body.role,
        student_id: check_student_id(role, body.student_id)?,
    };

    User::update(&university.pool, id, &changes).await?;
    if role != Role::Student && existing.student_id.is_some() {
        User::clear_student_id(&university.pool, id).await?;
    }

    let user = found(User::find(&university.pool, id).await?, "User", id)?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/:id
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = path?;
    auth_user.require_role(&[Role::Admin])?;
    if id == auth_user.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    if !User::delete(&university.pool, id).await? {
        return Err(ApiError::not_found(format!("User {} not found", id)));
    }
    tracing::info!("Deleted user {} in {}", id, university.schema);
    Ok(ApiResponse::success(Deleted::new(id)))
}
