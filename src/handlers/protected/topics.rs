// handlers/protected/topics.rs - /api/topics

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path};
use axum::Json;

use crate::database::models::topic::{NewTopic, TopicChanges};
use crate::database::models::{Assignment, Lecture, Presentation, Topic};
use crate::error::ApiError;
use crate::handlers::utils::{ensure_course, found, Deleted, EDITORS};
use crate::handlers::validate;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, UniversityContext};

/// POST /api/topics
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    payload: Result<Json<NewTopic>, JsonRejection>,
) -> ApiResult<Topic> {
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    let course = ensure_course(&university.pool, validate::positive_id("course_id", body.course_id)?).await?;
    if body.position.is_some_and(|p| p < 0) {
        return Err(ApiError::field("position", "position cannot be negative"));
    }
    let topic = NewTopic {
        course_id: course.id,
        title: validate::required_text("title", &body.title, 255)?,
        description: validate::optional_text("description", body.description.as_deref(), 65_535)?,
        position: body.position,
    };

    let topic = Topic::create(&university.pool, &topic).await?;
    Ok(ApiResponse::created(topic))
}

/// GET /api/topics/:id
pub async fn show(
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Topic> {
    let Path(id) = path?;
    let topic = found(Topic::find(&university.pool, id).await?, "Topic", id)?;
    Ok(ApiResponse::success(topic))
}

/// PUT /api/topics/:id
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TopicChanges>, JsonRejection>,
) -> ApiResult<Topic> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    found(Topic::find(&university.pool, id).await?, "Topic", id)?;
    if body.position.is_some_and(|p| p < 0) {
        return Err(ApiError::field("position", "position cannot be negative"));
    }
    let changes = TopicChanges {
        title: body
            .title
            .as_deref()
            .map(|v| validate::required_text("title", v, 255))
            .transpose()?,
        description: validate::optional_text("description", body.description.as_deref(), 65_535)?,
        position: body.position,
    };

    let topic = found(Topic::update(&university.pool, id, &changes).await?, "Topic", id)?;
    Ok(ApiResponse::success(topic))
}

/// DELETE /api/topics/:id
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;

    if !Topic::delete(&university.pool, id).await? {
        return Err(ApiError::not_found(format!("Topic {} not found", id)));
    }
    Ok(ApiResponse::success(Deleted::new(id)))
}

/// GET /api/topics/:id/lectures
pub async fn lectures(
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Lecture>> {
    let Path(id) = path?;
    found(Topic::find(&university.pool, id).await?, "Topic", id)?;
    Ok(ApiResponse::success(Lecture::list_for_topic(&university.pool, id).await?))
}

/// GET /api/topics/:id/assignments
pub async fn assignments(
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Assignment>> {
    let Path(id) = path?;
    found(Topic::find(&university.pool, id).await?, "Topic", id)?;
    Ok(ApiResponse::success(Assignment::list_for_topic(&university.pool, id).await?))
}

/// GET /api/topics/:id/presentations
pub async fn presentations(
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Presentation>> {
    let Path(id) = path?;
    found(Topic::find(&university.pool, id).await?, "Topic", id)?;
    Ok(ApiResponse::success(Presentation::list_for_topic(&university.pool, id).await?))
}
