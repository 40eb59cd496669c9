use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::mysql::MySqlPool;
use sqlx::FromRow;

use crate::database::named_params::{execute, fetch_all, fetch_optional};
use crate::database::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: i64,
    pub topic_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub max_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub topic_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub max_score: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub max_score: Option<i32>,
}

const COLUMNS: &str = "id, topic_id, title, description, due_date, max_score, created_at, updated_at";

/// MySQL TIMESTAMP literal for a bound value
fn timestamp_param(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|v| v.format("%Y-%m-%d %H:%M:%S").to_string())
}

impl Assignment {
    pub async fn list_for_topic(pool: &MySqlPool, topic_id: i64) -> Result<Vec<Assignment>, DatabaseError> {
        fetch_all(
            pool,
            &format!(
                "SELECT {COLUMNS} FROM assignments WHERE topic_id = :topic_id \
                 ORDER BY due_date IS NULL, due_date, id"
            ),
            &json!({ "topic_id": topic_id }),
        )
        .await
    }

    pub async fn find(pool: &MySqlPool, id: i64) -> Result<Option<Assignment>, DatabaseError> {
        fetch_optional(
            pool,
            &format!("SELECT {COLUMNS} FROM assignments WHERE id = :id"),
            &json!({ "id": id }),
        )
        .await
    }

    pub async fn create(pool: &MySqlPool, assignment: &NewAssignment) -> Result<Assignment, DatabaseError> {
        let result = execute(
            pool,
            "INSERT INTO assignments (topic_id, title, description, due_date, max_score) \
             VALUES (:topic_id, :title, :description, :due_date, :max_score)",
            &json!({
                "topic_id": assignment.topic_id,
                "title": assignment.title,
                "description": assignment.description,
                "due_date": timestamp_param(assignment.due_date),
                "max_score": assignment.max_score,
            }),
        )
        .await?;

        Self::find(pool, result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Created assignment not found".to_string()))
    }

    pub async fn update(
        pool: &MySqlPool,
        id: i64,
        changes: &AssignmentChanges,
    ) -> Result<Option<Assignment>, DatabaseError> {
        execute(
            pool,
            "UPDATE assignments SET \
                title = COALESCE(:title, title), \
                description = COALESCE(:description, description), \
                due_date = COALESCE(:due_date, due_date), \
                max_score = COALESCE(:max_score, max_score) \
             WHERE id = :id",
            &json!({
                "id": id,
                "title": changes.title,
                "description": changes.description,
                "due_date": timestamp_param(changes.due_date),
                "max_score": changes.max_score,
            }),
        )
        .await?;

        Self::find(pool, id).await
    }

    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<bool, DatabaseError> {
        let result = execute(pool, "DELETE FROM assignments WHERE id = :id", &json!({ "id": id })).await?;
        Ok(result.rows_affected() > 0)
    }
}
