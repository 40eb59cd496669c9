// handlers/protected/courses.rs - /api/courses

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::Deserialize;

use crate::api::pagination::{Paginated, PaginationQuery};
use crate::database::models::course::{CourseChanges, NewCourse};
use crate::database::models::{Course, Role, Topic};
use crate::error::ApiError;
use crate::handlers::utils::{ensure_teacher, found, Deleted, EDITORS};
use crate::handlers::validate;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, UniversityContext};

#[derive(Debug, Default, Deserialize)]
pub struct CourseListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub teacher_id: Option<i64>,
}

/// GET /api/courses
pub async fn list(
    Extension(university): Extension<UniversityContext>,
    query: Result<Query<CourseListQuery>, QueryRejection>,
) -> ApiResult<Paginated<Course>> {
    let Query(query) = query?;
    let page = PaginationQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve();
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let (courses, total) = Course::list(&university.pool, search, query.teacher_id, page).await?;
    Ok(ApiResponse::success(Paginated::new(courses, page, total)))
}

/// GET /api/courses/:id
pub async fn show(
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Course> {
    let Path(id) = path?;
    let course = found(Course::find(&university.pool, id).await?, "Course", id)?;
    Ok(ApiResponse::success(course))
}

/// POST /api/courses - a teacher creating a course without `teacher_id` teaches it
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    payload: Result<Json<NewCourse>, JsonRejection>,
) -> ApiResult<Course> {
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    let teacher_id = match body.teacher_id {
        Some(id) => Some(ensure_teacher(&university.pool, id).await?.id),
        None if auth_user.role == Role::Teacher => Some(auth_user.user_id),
        None => None,
    };
    let course = NewCourse {
        name: validate::required_text("name", &body.name, 255)?,
        code: validate::required_text("code", &body.code, 32)?,
        description: validate::optional_text("description", body.description.as_deref(), 65_535)?,
        teacher_id,
    };

    let course = Course::create(&university.pool, &course).await?;
    tracing::info!("Created course {} ({}) in {}", course.id, course.code, university.schema);
    Ok(ApiResponse::created(course))
}

/// PUT /api/courses/:id
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CourseChanges>, JsonRejection>,
) -> ApiResult<Course> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;
    let Json(body) = payload?;

    found(Course::find(&university.pool, id).await?, "Course", id)?;
    if let Some(teacher_id) = body.teacher_id {
        ensure_teacher(&university.pool, teacher_id).await?;
    }
    let changes = CourseChanges {
        name: body
            .name
            .as_deref()
            .map(|v| validate::required_text("name", v, 255))
            .transpose()?,
        code: body
            .code
            .as_deref()
            .map(|v| validate::required_text("code", v, 32))
            .transpose()?,
        description: validate::optional_text("description", body.description.as_deref(), 65_535)?,
        teacher_id: body.teacher_id,
    };

    let course = found(Course::update(&university.pool, id, &changes).await?, "Course", id)?;
    Ok(ApiResponse::success(course))
}

/// DELETE /api/courses/:id - topics and their materials go with it
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = path?;
    auth_user.require_role(&EDITORS)?;

    if !Course::delete(&university.pool, id).await? {
        return Err(ApiError::not_found(format!("Course {} not found", id)));
    }
    tracing::info!("Deleted course {} in {}", id, university.schema);
    Ok(ApiResponse::success(Deleted::new(id)))
}

/// GET /api/courses/:id/topics
pub async fn topics(
    Extension(university): Extension<UniversityContext>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Topic>> {
    let Path(id) = path?;
    found(Course::find(&university.pool, id).await?, "Course", id)?;
    Ok(ApiResponse::success(Topic::list_for_course(&university.pool, id).await?))
}
