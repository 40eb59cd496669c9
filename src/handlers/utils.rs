use serde::Serialize;
use sqlx::mysql::MySqlPool;

use crate::database::models::{Course, Role, Topic, User};
use crate::error::ApiError;

/// Roles allowed to change courses, topics and their materials
pub const EDITORS: [Role; 2] = [Role::Admin, Role::Teacher];

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: i64,
    pub deleted: bool,
}

impl Deleted {
    pub fn new(id: i64) -> Self {
        Self { id, deleted: true }
    }
}

/// 404 for a missing path resource
pub fn found<T>(record: Option<T>, what: &str, id: i64) -> Result<T, ApiError> {
    record.ok_or_else(|| ApiError::not_found(format!("{} {} not found", what, id)))
}

// Referenced parents that do not exist are a client error on the body, not a 404

pub async fn ensure_course(pool: &MySqlPool, course_id: i64) -> Result<Course, ApiError> {
    Course::find(pool, course_id)
        .await?
        .ok_or_else(|| ApiError::field("course_id", format!("Course {} does not exist", course_id)))
}

pub async fn ensure_topic(pool: &MySqlPool, topic_id: i64) -> Result<Topic, ApiError> {
    Topic::find(pool, topic_id)
        .await?
        .ok_or_else(|| ApiError::field("topic_id", format!("Topic {} does not exist", topic_id)))
}

pub async fn ensure_teacher(pool: &MySqlPool, teacher_id: i64) -> Result<User, ApiError> {
    match User::find(pool, teacher_id).await? {
        Some(user) if user.role == Role::Teacher => Ok(user),
        Some(_) => Err(ApiError::field(
            "teacher_id",
            format!("User {} is not a teacher", teacher_id),
        )),
        None => Err(ApiError::field(
            "teacher_id",
            format!("Teacher {} does not exist", teacher_id),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_records_are_not_found() {
        let err = found::<i64>(None, "Lecture", 9).unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "Lecture 9 not found");
        assert_eq!(found(Some(1), "Lecture", 9).unwrap(), 1);
    }
}
