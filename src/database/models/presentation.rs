use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::mysql::MySqlPool;
use sqlx::FromRow;

use crate::database::named_params::{execute, fetch_all, fetch_optional};
use crate::database::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Presentation {
    pub id: i64,
    pub topic_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPresentation {
    pub topic_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresentationChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_url: Option<String>,
}

const COLUMNS: &str = "id, topic_id, title, description, file_url, created_at, updated_at";

impl Presentation {
    pub async fn list_for_topic(pool: &MySqlPool, topic_id: i64) -> Result<Vec<Presentation>, DatabaseError> {
        fetch_all(
            pool,
            &format!("SELECT {COLUMNS} FROM presentations WHERE topic_id = :topic_id ORDER BY id"),
            &json!({ "topic_id": topic_id }),
        )
        .await
    }

    pub async fn find(pool: &MySqlPool, id: i64) -> Result<Option<Presentation>, DatabaseError> {
        fetch_optional(
            pool,
            &format!("SELECT {COLUMNS} FROM presentations WHERE id = :id"),
            &json!({ "id": id }),
        )
        .await
    }

    pub async fn create(pool: &MySqlPool, presentation: &NewPresentation) -> Result<Presentation, DatabaseError> {
        let result = execute(
            pool,
            "INSERT INTO presentations (topic_id, title, description, file_url) \
             VALUES (:topic_id, :title, :description, :file_url)",
            &json!({
                "topic_id": presentation.topic_id,
                "title": presentation.title,
                "description": presentation.description,
                "file_url": presentation.file_url,
            }),
        )
        .await?;

        Self::find(pool, result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Created presentation not found".to_string()))
    }

    pub async fn update(
        pool: &MySqlPool,
        id: i64,
        changes: &PresentationChanges,
    ) -> Result<Option<Presentation>, DatabaseError> {
        execute(
            pool,
            "UPDATE presentations SET \
                title = COALESCE(:title, title), \
                description = COALESCE(:description, description), \
                file_url = COALESCE(:file_url, file_url) \
             WHERE id = :id",
            &json!({
                "id": id,
                "title": changes.title,
                "description": changes.description,
                "file_url": changes.file_url,
            }),
        )
        .await?;

        Self::find(pool, id).await
    }

    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<bool, DatabaseError> {
        let result = execute(pool, "DELETE FROM presentations WHERE id = :id", &json!({ "id": id })).await?;
        Ok(result.rows_affected() > 0)
    }
}
