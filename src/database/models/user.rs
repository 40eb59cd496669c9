use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::error::BoxDynError;
use sqlx::mysql::{MySql, MySqlPool, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Decode, FromRow, Type};
use std::fmt;
use std::str::FromStr;

use crate::api::pagination::Page;
use crate::database::named_params::{execute, fetch_all, fetch_optional, NamedQuery};
use crate::database::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// Stored as VARCHAR; decoding goes through the string form
impl Type<MySql> for Role {
    fn type_info() -> MySqlTypeInfo {
        <str as Type<MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        <str as Type<MySql>>::compatible(ty)
    }
}

impl<'r> Decode<'r, MySql> for Role {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as Decode<MySql>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub student_id: Option<String>,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub student_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub search: Option<String>,
}

const COLUMNS: &str = "id, name, email, password_hash, role, student_id, created_at, updated_at";

const FILTER: &str = "(:role IS NULL OR role = :role) \
     AND (:search IS NULL OR name LIKE :search OR email LIKE :search OR student_id LIKE :search)";

pub(crate) const INSERT_SQL: &str = "INSERT INTO users (name, email, password_hash, role, student_id) \
     VALUES (:name, :email, :password_hash, :role, :student_id)";

impl NewUser {
    pub(crate) fn params(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "email": self.email,
            "password_hash": self.password_hash,
            "role": self.role.as_str(),
            "student_id": self.student_id,
        })
    }
}

#[derive(FromRow)]
struct Count {
    total: i64,
}

impl User {
    pub async fn list(pool: &MySqlPool, filter: &UserFilter, page: Page) -> Result<(Vec<User>, i64), DatabaseError> {
        let params = json!({
            "role": filter.role.map(|r| r.as_str()),
            "search": filter.search.as_ref().map(|s| format!("%{}%", s)),
            "limit": page.limit,
            "offset": page.offset(),
        });

        let users = fetch_all(
            pool,
            &format!("SELECT {COLUMNS} FROM users WHERE {FILTER} ORDER BY id LIMIT :limit OFFSET :offset"),
            &params,
        )
        .await?;
        let count: Option<Count> = fetch_optional(
            pool,
            &format!("SELECT COUNT(*) AS total FROM users WHERE {FILTER}"),
            &params,
        )
        .await?;

        Ok((users, count.map(|c| c.total).unwrap_or(0)))
    }

    pub async fn find(pool: &MySqlPool, id: i64) -> Result<Option<User>, DatabaseError> {
        fetch_optional(
            pool,
            &format!("SELECT {COLUMNS} FROM users WHERE id = :id"),
            &json!({ "id": id }),
        )
        .await
    }

    pub async fn find_by_email(pool: &MySqlPool, email: &str) -> Result<Option<User>, DatabaseError> {
        fetch_optional(
            pool,
            &format!("SELECT {COLUMNS} FROM users WHERE email = :email"),
            &json!({ "email": email }),
        )
        .await
    }

    pub async fn create(pool: &MySqlPool, new_user: &NewUser) -> Result<User, DatabaseError> {
        let result = NamedQuery::new(INSERT_SQL, &new_user.params())?
            .execute(pool)
            .await
            .map_err(|e| e.on_duplicate("A user with this email or student id already exists"))?;

        Self::find(pool, result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Created user not found".to_string()))
    }

    pub async fn update(pool: &MySqlPool, id: i64, changes: &UserChanges) -> Result<Option<User>, DatabaseError> {
        execute(
            pool,
            "UPDATE users SET \
                name = COALESCE(:name, name), \
                email = COALESCE(:email, email), \
                password_hash = COALESCE(:password_hash, password_hash), \
                role = COALESCE(:role, role), \
                student_id = COALESCE(:student_id, student_id) \
             WHERE id = :id",
            &json!({
                "id": id,
                "name": changes.name,
                "email": changes.email,
                "password_hash": changes.password_hash,
                "role": changes.role.map(|r| r.as_str()),
                "student_id": changes.student_id,
            }),
        )
        .await
        .map_err(|e| e.on_duplicate("A user with this email or student id already exists"))?;

        Self::find(pool, id).await
    }

    /// Drop the student id of a user whose role is no longer student
    pub async fn clear_student_id(pool: &MySqlPool, id: i64) -> Result<(), DatabaseError> {
        execute(
            pool,
            "UPDATE users SET student_id = NULL WHERE id = :id AND role <> 'student'",
            &json!({ "id": id }),
        )
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<bool, DatabaseError> {
        let result = execute(pool, "DELETE FROM users WHERE id = :id", &json!({ "id": id })).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Student, Role::Teacher, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Teacher).unwrap(), json!("teacher"));
        let role: Role = serde_json::from_value(json!("admin")).unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.edu".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Student,
            student_id: Some("S-001".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], "student");
        assert_eq!(value["student_id"], "S-001");
    }

    #[test]
    fn insert_params_carry_role_string() {
        let new_user = NewUser {
            name: "Grace".to_string(),
            email: "grace@example.edu".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Teacher,
            student_id: None,
        };
        let q = NamedQuery::new(INSERT_SQL, &new_user.params()).unwrap();
        assert_eq!(q.values.len(), 5);
        assert_eq!(q.values[3], json!("teacher"));
        assert_eq!(q.values[4], serde_json::Value::Null);
    }
}
