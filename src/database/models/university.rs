use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::mysql::MySqlPool;
use sqlx::FromRow;

use crate::database::named_params::{execute, fetch_all, fetch_one, fetch_optional};
use crate::database::DatabaseError;

/// Directory record mapping a university name to the schema holding its data
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct University {
    pub id: i64,
    pub name: String,
    pub schema_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, name, schema_name, created_at, updated_at";

impl University {
    pub async fn list(pool: &MySqlPool) -> Result<Vec<University>, DatabaseError> {
        fetch_all(
            pool,
            &format!("SELECT {COLUMNS} FROM universities ORDER BY name"),
            &json!({}),
        )
        .await
    }

    pub async fn find_by_schema(pool: &MySqlPool, schema: &str) -> Result<Option<University>, DatabaseError> {
        fetch_optional(
            pool,
            &format!("SELECT {COLUMNS} FROM universities WHERE schema_name = :schema"),
            &json!({ "schema": schema }),
        )
        .await
    }

    pub async fn find_by_name(pool: &MySqlPool, name: &str) -> Result<Option<University>, DatabaseError> {
        fetch_optional(
            pool,
            &format!("SELECT {COLUMNS} FROM universities WHERE name = :name"),
            &json!({ "name": name }),
        )
        .await
    }

    pub async fn delete(pool: &MySqlPool, schema: &str) -> Result<bool, DatabaseError> {
        let result = execute(
            pool,
            "DELETE FROM universities WHERE schema_name = :schema",
            &json!({ "schema": schema }),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn rename(pool: &MySqlPool, schema: &str, name: &str) -> Result<University, DatabaseError> {
        execute(
            pool,
            "UPDATE universities SET name = :name WHERE schema_name = :schema",
            &json!({ "name": name, "schema": schema }),
        )
        .await
        .map_err(|e| e.on_duplicate(format!("University '{}' already exists", name)))?;

        // rows_affected is 0 when the name is unchanged, so existence is checked by reading back
        fetch_one(
            pool,
            &format!("SELECT {COLUMNS} FROM universities WHERE schema_name = :schema"),
            &json!({ "schema": schema }),
            "University",
        )
        .await
    }
}
