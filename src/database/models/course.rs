use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::mysql::MySqlPool;
use sqlx::FromRow;

use crate::api::pagination::Page;
use crate::database::named_params::{execute, fetch_all, fetch_optional};
use crate::database::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub teacher_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub teacher_id: Option<i64>,
}

const COLUMNS: &str = "id, name, code, description, teacher_id, created_at, updated_at";

const FILTER: &str = "(:search IS NULL OR name LIKE :search OR code LIKE :search) \
     AND (:teacher_id IS NULL OR teacher_id = :teacher_id)";

#[derive(FromRow)]
struct Count {
    total: i64,
}

impl Course {
    pub async fn list(
        pool: &MySqlPool,
        search: Option<&str>,
        teacher_id: Option<i64>,
        page: Page,
    ) -> Result<(Vec<Course>, i64), DatabaseError> {
        let params = json!({
            "search": search.map(|s| format!("%{}%", s)),
            "teacher_id": teacher_id,
            "limit": page.limit,
            "offset": page.offset(),
        });

        let courses = fetch_all(
            pool,
            &format!("SELECT {COLUMNS} FROM courses WHERE {FILTER} ORDER BY name LIMIT :limit OFFSET :offset"),
            &params,
        )
        .await?;
        let count: Option<Count> = fetch_optional(
            pool,
            &format!("SELECT COUNT(*) AS total FROM courses WHERE {FILTER}"),
            &params,
        )
        .await?;

        Ok((courses, count.map(|c| c.total).unwrap_or(0)))
    }

    pub async fn find(pool: &MySqlPool, id: i64) -> Result<Option<Course>, DatabaseError> {
        fetch_optional(
            pool,
            &format!("SELECT {COLUMNS} FROM courses WHERE id = :id"),
            &json!({ "id": id }),
        )
        .await
    }

    pub async fn create(pool: &MySqlPool, course: &NewCourse) -> Result<Course, DatabaseError> {
        let result = execute(
            pool,
            "INSERT INTO courses (name, code, description, teacher_id) \
             VALUES (:name, :code, :description, :teacher_id)",
            &json!({
                "name": course.name,
                "code": course.code,
                "description": course.description,
                "teacher_id": course.teacher_id,
            }),
        )
        .await
        .map_err(|e| e.on_duplicate(format!("Course code '{}' is already in use", course.code)))?;

        Self::find(pool, result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Created course not found".to_string()))
    }

    pub async fn update(pool: &MySqlPool, id: i64, changes: &CourseChanges) -> Result<Option<Course>, DatabaseError> {
        execute(
            pool,
            "UPDATE courses SET \
                name = COALESCE(:name, name), \
                code = COALESCE(:code, code), \
                description = COALESCE(:description, description), \
                teacher_id = COALESCE(:teacher_id, teacher_id) \
             WHERE id = :id",
            &json!({
                "id": id,
                "name": changes.name,
                "code": changes.code,
                "description": changes.description,
                "teacher_id": changes.teacher_id,
            }),
        )
        .await
        .map_err(|e| e.on_duplicate("Course code is already in use"))?;

        Self::find(pool, id).await
    }

    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<bool, DatabaseError> {
        let result = execute(pool, "DELETE FROM courses WHERE id = :id", &json!({ "id": id })).await?;
        Ok(result.rows_affected() > 0)
    }
}
