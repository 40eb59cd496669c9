// handlers/protected/lectures.rs - /api/lectures

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path};
use axum::Json;

use crate::database::models::lecture::{LectureChanges, NewLecture};
use crate::database::models::Lecture;
use crate::error::ApiError;
use crate::handlers::utils::{ensure_topic, found, Deleted, EDITORS};
use crate::handlers::validate;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, UniversityContext};

/// POST /api/lectures
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    payload: Result<Json<NewLecture>, JsonRejection>,
) -> ApiResult<Lecture> {
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    let topic = ensure_topic(&university.pool, validate::positive_id("topic_id", body.topic_id)?).await?;
    let lecture = NewLecture {
        topic_id: topic.id,
        title: validate::required_text("title", &body.title, 255)?,
        content: validate::optional_text("content", body.content.as_deref(), 65_535)?,
        video_url: validate::optional_url("video_url", body.video_url.as_deref())?,
    };

    Ok(ApiResponse::created(Lecture::create(&university.pool, &lecture).await?))
}

/// GET /api/lectures/:id
pub async fn show(
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Lecture> {
    let Path(id) = path?;
    let lecture = found(Lecture::find(&university.pool, id).await?, "Lecture", id)?;
    Ok(ApiResponse::success(lecture))
}

/// PUT /api/lectures/:id
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<LectureChanges>, JsonRejection>,
) -> ApiResult<Lecture> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    let changes = LectureChanges {
        title: body
            .title
            .as_deref()
            .map(|v| validate::required_text("title", v, 255))
            .transpose()?,
        content: validate::optional_text("content", body.content.as_deref(), 65_535)?,
        video_url: validate::optional_url("video_url", body.video_url.as_deref())?,
    };

    let lecture = found(Lecture::update(&university.pool, id, &changes).await?, "Lecture", id)?;
    Ok(ApiResponse::success(lecture))
}

/// DELETE /api/lectures/:id
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;

    if !Lecture::delete(&university.pool, id).await? {
        return Err(ApiError::not_found(format!("Lecture {} not found", id)));
    }
    Ok(ApiResponse::success(Deleted::new(id)))
}
