// handlers/protected/assignments.rs - /api/assignments

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path};
use axum::Json;

use crate::database::models::assignment::{AssignmentChanges, NewAssignment};
use crate::database::models::Assignment;
use crate::error::ApiError;
use crate::handlers::utils::{ensure_topic, found, Deleted, EDITORS};
use crate::handlers::validate;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, UniversityContext};

fn check_max_score(max_score: Option<i32>) -> Result<Option<i32>, ApiError> {
    match max_score {
        Some(score) if score <= 0 => Err(ApiError::field("max_score", "max_score must be positive")),
        other => Ok(other),
    }
}

/// POST /api/assignments
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    payload: Result<Json<NewAssignment>, JsonRejection>,
) -> ApiResult<Assignment> {
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    let topic = ensure_topic(&university.pool, validate::positive_id("topic_id", body.topic_id)?).await?;
    let assignment = NewAssignment {
        topic_id: topic.id,
        title: validate::required_text("title", &body.title, 255)?,
        description: validate::optional_text("description", body.description.as_deref(), 65_535)?,
        due_date: body.due_date,
        max_score: check_max_score(body.max_score)?,
    };

    Ok(ApiResponse::created(Assignment::create(&university.pool, &assignment).await?))
}

/// GET /api/assignments/:id
pub async fn show(
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Assignment> {
    let Path(id) = path?;
    let assignment = found(Assignment::find(&university.pool, id).await?, "Assignment", id)?;
    Ok(ApiResponse::success(assignment))
}

/// PUT /api/assignments/:id
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AssignmentChanges>, JsonRejection>,
) -> ApiResult<Assignment> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    let changes = AssignmentChanges {
        title: body
            .title
            .as_deref()
            .map(|v| validate::required_text("title", v, 255))
            .transpose()?,
        description: validate::optional_text("description", body.description.as_deref(), 65_535)?,
        due_date: body.due_date,
        max_score: check_max_score(body.max_score)?,
    };

    let assignment = found(Assignment::update(&university.pool, id, &changes).await?, "Assignment", id)?;
    Ok(ApiResponse::success(assignment))
}

/// DELETE /api/assignments/:id
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;

    if !Assignment::delete(&university.pool, id).await? {
        return Err(ApiError::not_found(format!("Assignment {} not found", id)));
    }
    Ok(ApiResponse::success(Deleted::new(id)))
}
