// handlers/protected/presentations.rs - /api/presentations

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path};
use axum::Json;

use crate::database::models::presentation::{NewPresentation, PresentationChanges};
use crate::database::models::Presentation;
use crate::error::ApiError;
use crate::handlers::utils::{ensure_topic, found, Deleted, EDITORS};
use crate::handlers::validate;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, UniversityContext};

/// POST /api/presentations
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    payload: Result<Json<NewPresentation>, JsonRejection>,
) -> ApiResult<Presentation> {
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    let topic = ensure_topic(&university.pool, validate::positive_id("topic_id", body.topic_id)?).await?;
    let presentation = NewPresentation {
        topic_id: topic.id,
        title: validate::required_text("title", &body.title, 255)?,
        description: validate::optional_text("description", body.description.as_deref(), 65_535)?,
        file_url: validate::optional_url("file_url", body.file_url.as_deref())?,
    };

    Ok(ApiResponse::created(Presentation::create(&university.pool, &presentation).await?))
}

/// GET /api/presentations/:id
pub async fn show(
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Presentation> {
    let Path(id) = path?;
    let presentation = found(Presentation::find(&university.pool, id).await?, "Presentation", id)?;
    Ok(ApiResponse::success(presentation))
}

/// PUT /api/presentations/:id
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PresentationChanges>, JsonRejection>,
) -> ApiResult<Presentation> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    let changes = PresentationChanges {
        title: body
            .title
            .as_deref()
            .map(|v| validate::required_text("title", v, 255))
            .transpose()?,
        description: validate::optional_text("description", body.description.as_deref(), 65_535)?,
        file_url: validate::optional_url("file_url", body.file_url.as_deref())?,
    };

    let presentation = found(
        Presentation::update(&university.pool, id, &changes).await?,
        "Presentation",
        id,
    )?;
    Ok(ApiResponse::success(presentation))
}

/// DELETE /api/presentations/:id
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;

    if !Presentation::delete(&university.pool, id).await? {
        return Err(ApiError::not_found(format!("Presentation {} not found", id)));
    }
    Ok(ApiResponse::success(Deleted::new(id)))
}
