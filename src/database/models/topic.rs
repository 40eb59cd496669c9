use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::mysql::MySqlPool;
use sqlx::FromRow;

use crate::database::named_params::{execute, fetch_all, fetch_optional};
use crate::database::DatabaseError;

/// A unit of a course; lectures, assignments and presentations hang off it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTopic {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
}

const COLUMNS: &str = "id, course_id, title, description, position, created_at, updated_at";

#[derive(FromRow)]
struct NextPosition {
    position: i64,
}

impl Topic {
    pub async fn list_for_course(pool: &MySqlPool, course_id: i64) -> Result<Vec<Topic>, DatabaseError> {
        fetch_all(
            pool,
            &format!("SELECT {COLUMNS} FROM topics WHERE course_id = :course_id ORDER BY position, id"),
            &json!({ "course_id": course_id }),
        )
        .await
    }

    pub async fn find(pool: &MySqlPool, id: i64) -> Result<Option<Topic>, DatabaseError> {
        fetch_optional(
            pool,
            &format!("SELECT {COLUMNS} FROM topics WHERE id = :id"),
            &json!({ "id": id }),
        )
        .await
    }

    /// Insert a topic. Without an explicit position it goes after the last topic of its course.
    pub async fn create(pool: &MySqlPool, topic: &NewTopic) -> Result<Topic, DatabaseError> {
        let position = match topic.position {
            Some(position) => position,
            None => {
                let next: Option<NextPosition> = fetch_optional(
                    pool,
                    "SELECT CAST(COALESCE(MAX(position) + 1, 0) AS SIGNED) AS position \
                     FROM topics WHERE course_id = :course_id",
                    &json!({ "course_id": topic.course_id }),
                )
                .await?;
                next.map(|n| n.position as i32).unwrap_or(0)
            }
        };

        let result = execute(
            pool,
            "INSERT INTO topics (course_id, title, description, position) \
             VALUES (:course_id, :title, :description, :position)",
            &json!({
                "course_id": topic.course_id,
                "title": topic.title,
                "description": topic.description,
                "position": position,
            }),
        )
        .await?;

        Self::find(pool, result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Created topic not found".to_string()))
    }

    pub async fn update(pool: &MySqlPool, id: i64, changes: &TopicChanges) -> Result<Option<Topic>, DatabaseError> {
        execute(
            pool,
            "UPDATE topics SET \
                title = COALESCE(:title, title), \
                description = COALESCE(:description, description), \
                position = COALESCE(:position, position) \
             WHERE id = :id",
            &json!({
                "id": id,
                "title": changes.title,
                "description": changes.description,
                "position": changes.position,
            }),
        )
        .await?;

        Self::find(pool, id).await
    }

    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<bool, DatabaseError> {
        let result = execute(pool, "DELETE FROM topics WHERE id = :id", &json!({ "id": id })).await?;
        Ok(result.rows_affected() > 0)
    }
}
