use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::mysql::MySqlPool;
use sqlx::FromRow;

use crate::database::named_params::{execute, fetch_all, fetch_optional};
use crate::database::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lecture {
    pub id: i64,
    pub topic_id: i64,
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLecture {
    pub topic_id: i64,
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LectureChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
}

const COLUMNS: &str = "id, topic_id, title, content, video_url, created_at, updated_at";

impl Lecture {
    pub async fn list_for_topic(pool: &MySqlPool, topic_id: i64) -> Result<Vec<Lecture>, DatabaseError> {
        fetch_all(
            pool,
            &format!("SELECT {COLUMNS} FROM lectures WHERE topic_id = :topic_id ORDER BY id"),
            &json!({ "topic_id": topic_id }),
        )
        .await
    }

    pub async fn find(pool: &MySqlPool, id: i64) -> Result<Option<Lecture>, DatabaseError> {
        fetch_optional(
            pool,
            &format!("SELECT {COLUMNS} FROM lectures WHERE id = :id"),
            &json!({ "id": id }),
        )
        .await
    }

    pub async fn create(pool: &MySqlPool, lecture: &NewLecture) -> Result<Lecture, DatabaseError> {
        let result = execute(
            pool,
            "INSERT INTO lectures (topic_id, title, content, video_url) \
             VALUES (:topic_id, :title, :content, :video_url)",
            &json!({
                "topic_id": lecture.topic_id,
                "title": lecture.title,
                "content": lecture.content,
                "video_url": lecture.video_url,
            }),
        )
        .await?;

        Self::find(pool, result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Created lecture not found".to_string()))
    }

    pub async fn update(pool: &MySqlPool, id: i64, changes: &LectureChanges) -> Result<Option<Lecture>, DatabaseError> {
        execute(
            pool,
            "UPDATE lectures SET \
                title = COALESCE(:title, title), \
                content = COALESCE(:content, content), \
                video_url = COALESCE(:video_url, video_url) \
             WHERE id = :id",
            &json!({
                "id": id,
                "title": changes.title,
                "content": changes.content,
                "video_url": changes.video_url,
            }),
        )
        .await?;

        Self::find(pool, id).await
    }

    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<bool, DatabaseError> {
        let result = execute(pool, "DELETE FROM lectures WHERE id = :id", &json!({ "id": id })).await?;
        Ok(result.rows_affected() > 0)
    }
}
