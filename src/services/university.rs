//! University directory and tenant provisioning.
//!
//! Every university lives in its own MySQL schema, created from `sql/university.sql`
//! and listed in the `universities` table of the directory database.

use serde::Serialize;
use serde_json::json;
use sqlx::mysql::{MySql, MySqlConnection, MySqlDatabaseError};
use sqlx::{Connection, Executor, FromRow, Transaction};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::password::hash_password;
use crate::auth::AuthError;
use crate::config;
use crate::database::models::user::{self, NewUser};
use crate::database::models::{Role, University, User};
use crate::database::named_params::{fetch_optional, query_university};
use crate::database::{DatabaseError, DatabaseManager, NamedQuery};

const UNIVERSITY_DDL: &str = include_str!("../../sql/university.sql");
const DIRECTORY_DDL: &str = include_str!("../../sql/global.sql");

/// Tables every provisioned university schema must contain
pub const UNIVERSITY_TABLES: [&str; 7] = [
    "users",
    "refresh_tokens",
    "courses",
    "topics",
    "lectures",
    "assignments",
    "presentations",
];

#[derive(Debug, Error)]
pub enum UniversityError {
    #[error("Invalid university name: {0}")]
    InvalidName(String),

    #[error("University already exists: {0}")]
    AlreadyExists(String),

    #[error("University not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<sqlx::Error> for UniversityError {
    fn from(err: sqlx::Error) -> Self {
        UniversityError::Database(DatabaseError::Sqlx(err))
    }
}

/// First administrator of a new university
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub university: University,
    pub admin: User,
}

#[derive(FromRow)]
struct Count {
    total: i64,
}

#[derive(FromRow)]
struct TableName {
    table_name: String,
}

pub fn validate_university_name(name: &str) -> Result<(), UniversityError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if length < 2 {
        return Err(UniversityError::InvalidName(
            "University name must be at least 2 characters".to_string(),
        ));
    }
    if length > 255 {
        return Err(UniversityError::InvalidName(
            "University name must be at most 255 characters".to_string(),
        ));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(UniversityError::InvalidName(
            "University name cannot contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// Check a requested schema name and resolve it to its directory record
pub async fn validate_university_schema(schema: &str) -> Result<University, UniversityError> {
    DatabaseManager::validate_schema_name(schema)?;
    let global = DatabaseManager::global_pool()?;

    University::find_by_schema(&global, schema)
        .await?
        .ok_or_else(|| UniversityError::NotFound(schema.to_string()))
}

pub async fn list_universities() -> Result<Vec<University>, UniversityError> {
    let global = DatabaseManager::global_pool()?;
    Ok(University::list(&global).await?)
}

pub async fn get_university(schema: &str) -> Result<University, UniversityError> {
    validate_university_schema(schema).await
}

pub async fn rename_university(schema: &str, name: &str) -> Result<University, UniversityError> {
    validate_university_name(name)?;
    let global = DatabaseManager::global_pool()?;
    let university = University::rename(&global, schema, name.trim()).await.map_err(|e| match e {
        DatabaseError::Conflict(_) => UniversityError::AlreadyExists(name.trim().to_string()),
        DatabaseError::NotFound(_) => UniversityError::NotFound(schema.to_string()),
        other => UniversityError::Database(other),
    })?;

    info!("Renamed university {} to '{}'", schema, university.name);
    Ok(university)
}

async fn schema_exists(schema: &str) -> Result<bool, UniversityError> {
    let global = DatabaseManager::global_pool()?;
    let count: Option<Count> = fetch_optional(
        &global,
        "SELECT COUNT(*) AS total FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = :schema",
        &json!({ "schema": schema }),
    )
    .await?;
    Ok(count.map(|c| c.total > 0).unwrap_or(false))
}

/// Create a university: its schema, its tables, its first admin and its directory record.
///
/// The directory record and the admin are written in one transaction after the DDL has
/// run. Any failure once the database exists drops it again, so a university is either
/// fully provisioned and listed or absent.
pub async fn register_university(
    name: &str,
    schema: &str,
    admin: &AdminAccount,
) -> Result<Registration, UniversityError> {
    let name = name.trim();
    validate_university_name(name)?;
    DatabaseManager::validate_schema_name(schema)?;

    let global = DatabaseManager::global_pool()?;
    if University::find_by_schema(&global, schema).await?.is_some() || schema_exists(schema).await? {
        return Err(UniversityError::AlreadyExists(schema.to_string()));
    }
    if University::find_by_name(&global, name).await?.is_some() {
        return Err(UniversityError::AlreadyExists(name.to_string()));
    }

    let new_admin = NewUser {
        name: admin.name.trim().to_string(),
        email: admin.email.trim().to_lowercase(),
        password_hash: hash_password(&admin.password)?,
        role: Role::Admin,
        student_id: None,
    };

    let mut conn = DatabaseManager::server_connection().await?;
    let quoted = DatabaseManager::quote_identifier(schema);
    conn.execute(format!("CREATE DATABASE {quoted} CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci").as_str())
        .await
        .map_err(|e| {
            if is_database_exists(&e) {
                UniversityError::AlreadyExists(schema.to_string())
            } else {
                e.into()
            }
        })?;
    info!("Created database for university schema: {}", schema);

    let admin_id = match provision(&mut conn, name, schema, &new_admin).await {
        Ok(id) => id,
        Err(e) => {
            warn!("Provisioning of {} failed, dropping schema: {}", schema, e);
            if let Err(drop_err) = conn.execute(format!("DROP DATABASE IF EXISTS {quoted}").as_str()).await {
                error!("Failed to drop half-provisioned schema {}: {}", schema, drop_err);
            }
            return Err(e);
        }
    };
    if let Err(e) = conn.close().await {
        warn!("Failed to close provisioning connection: {}", e);
    }

    let university = University::find_by_schema(&global, schema)
        .await?
        .ok_or_else(|| UniversityError::NotFound(schema.to_string()))?;
    let pool = DatabaseManager::university_pool(schema).await?;
    let admin = User::find(&pool, admin_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Created admin not found".to_string()))?;

    info!("Registered university '{}' ({})", university.name, schema);
    Ok(Registration { university, admin })
}

/// ER_DB_CREATE_EXISTS: another request created the schema after the pre-check
fn is_database_exists(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| e.number() == 1007),
        _ => false,
    }
}

/// Run the schema script, then write the admin and directory record in one transaction
async fn provision(
    conn: &mut MySqlConnection,
    name: &str,
    schema: &str,
    admin: &NewUser,
) -> Result<i64, UniversityError> {
    conn.execute(format!("USE {}", DatabaseManager::quote_identifier(schema)).as_str())
        .await?;
    for statement in split_statements(UNIVERSITY_DDL) {
        conn.execute(statement.as_str()).await?;
    }

    let mut tx = conn.begin().await?;
    match insert_records(&mut tx, name, schema, admin).await {
        Ok(admin_id) => {
            tx.commit().await?;
            Ok(admin_id)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed for {}: {}", schema, rollback_err);
            }
            Err(e)
        }
    }
}

async fn insert_records(
    tx: &mut Transaction<'_, MySql>,
    name: &str,
    schema: &str,
    admin: &NewUser,
) -> Result<i64, UniversityError> {
    let result = NamedQuery::new(user::INSERT_SQL, &admin.params())?
        .execute(&mut **tx)
        .await?;
    let admin_id = result.last_insert_id() as i64;

    let global_db = DatabaseManager::quote_identifier(&config::config().database.global_db_name);
    NamedQuery::new(
        &format!("INSERT INTO {global_db}.universities (name, schema_name) VALUES (:name, :schema)"),
        &json!({ "name": name, "schema": schema }),
    )?
    .execute(&mut **tx)
    .await
    .map_err(|e| match e.on_duplicate(schema) {
        DatabaseError::Conflict(_) => UniversityError::AlreadyExists(schema.to_string()),
        other => UniversityError::Database(other),
    })?;

    Ok(admin_id)
}

/// Remove a university for good: directory record, cached pool and schema
pub async fn drop_university(schema: &str) -> Result<(), UniversityError> {
    validate_university_schema(schema).await?;
    let global = DatabaseManager::global_pool()?;

    University::delete(&global, schema).await?;
    DatabaseManager::evict_university_pool(schema).await;

    let mut conn = DatabaseManager::server_connection().await?;
    conn.execute(format!("DROP DATABASE IF EXISTS {}", DatabaseManager::quote_identifier(schema)).as_str())
        .await?;
    if let Err(e) = conn.close().await {
        warn!("Failed to close connection: {}", e);
    }

    info!("Dropped university schema: {}", schema);
    Ok(())
}

/// Tables a university schema is missing; empty when it is complete
pub async fn check_university_tables(schema: &str) -> Result<Vec<String>, UniversityError> {
    validate_university_schema(schema).await?;

    let present: Vec<TableName> = query_university(
        schema,
        "SELECT TABLE_NAME AS table_name FROM information_schema.TABLES WHERE TABLE_SCHEMA = DATABASE()",
        &json!({}),
    )
    .await?;

    Ok(missing_tables(present.iter().map(|t| t.table_name.as_str())))
}

fn missing_tables<'a>(present: impl Iterator<Item = &'a str>) -> Vec<String> {
    let present: Vec<&str> = present.collect();
    UNIVERSITY_TABLES
        .iter()
        .filter(|table| !present.iter().any(|p| p.eq_ignore_ascii_case(table)))
        .map(|table| table.to_string())
        .collect()
}

/// Create the directory database and its table if they do not exist yet
pub async fn init_directory() -> Result<(), UniversityError> {
    let global_db = config::config().database.global_db_name.clone();
    if global_db.is_empty() {
        return Err(DatabaseError::ConfigMissing("GLOBAL_DB_NAME").into());
    }
    let quoted = DatabaseManager::quote_identifier(&global_db);

    let mut conn = DatabaseManager::server_connection().await?;
    conn.execute(format!("CREATE DATABASE IF NOT EXISTS {quoted} CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci").as_str())
        .await?;
    conn.execute(format!("USE {quoted}").as_str()).await?;
    for statement in split_statements(DIRECTORY_DDL) {
        conn.execute(statement.as_str()).await?;
    }
    if let Err(e) = conn.close().await {
        warn!("Failed to close connection: {}", e);
    }

    info!("Directory database {} is ready", global_db);
    Ok(())
}

/// Split a SQL script into statements on `;`, ignoring `--` comment lines and
/// semicolons inside quoted literals.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == '\\' && q != '`' {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    current.push(c);
                }
                '-' if chars.peek() == Some(&'-') => skip_line(&mut chars),
                '#' => skip_line(&mut chars),
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    let mut previous = '\0';
                    for c in chars.by_ref() {
                        if previous == '*' && c == '/' {
                            break;
                        }
                        previous = c;
                    }
                    current.push(' ');
                }
                ';' => {
                    let statement = current.trim();
                    if !statement.is_empty() {
                        statements.push(statement.to_string());
                    }
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }
    statements
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    for c in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_scripts_into_statements() {
        let script = "-- header\nCREATE TABLE a (id INT);\n\nCREATE TABLE b (\n  note VARCHAR(10) DEFAULT 'x;y'\n);\n-- trailing\n";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "CREATE TABLE a (id INT)");
        assert!(statements[1].contains("'x;y'"));
        assert!(statements[1].ends_with(')'));
    }

    #[test]
    fn comments_and_escapes_do_not_split_statements() {
        let script = "CREATE TABLE a (id INT); -- the author's note; not SQL\n\
                      CREATE TABLE b (note VARCHAR(10) DEFAULT 'it\\'s;ok'); # another's\n\
                      /* block; comment's */ CREATE TABLE c (id INT);";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0], "CREATE TABLE a (id INT)");
        assert_eq!(statements[1], "CREATE TABLE b (note VARCHAR(10) DEFAULT 'it\\'s;ok')");
        assert_eq!(statements[2], "CREATE TABLE c (id INT)");
    }

    #[test]
    fn keeps_a_final_statement_without_semicolon() {
        let statements = split_statements("SELECT 1;\nSELECT 2");
        assert_eq!(statements, vec!["SELECT 1".to_string(), "SELECT 2".to_string()]);
    }

    #[test]
    fn university_script_creates_every_table() {
        let statements = split_statements(UNIVERSITY_DDL);
        assert_eq!(statements.len(), UNIVERSITY_TABLES.len());
        for table in UNIVERSITY_TABLES {
            assert!(
                statements.iter().any(|s| s.starts_with(&format!("CREATE TABLE IF NOT EXISTS {table} ("))),
                "missing DDL for {table}"
            );
        }
        assert!(statements.iter().all(|s| !s.contains("--")));
    }

    #[test]
    fn directory_script_creates_universities() {
        let statements = split_statements(DIRECTORY_DDL);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS universities"));
    }

    #[test]
    fn reports_missing_tables() {
        let missing = missing_tables(["users", "COURSES", "topics"].into_iter());
        assert_eq!(
            missing,
            vec!["refresh_tokens", "lectures", "assignments", "presentations"]
        );
        assert!(missing_tables(UNIVERSITY_TABLES.into_iter()).is_empty());
    }

    #[test]
    fn validates_university_names() {
        assert!(validate_university_name("Oxford").is_ok());
        assert!(validate_university_name("  X ").is_err());
        assert!(validate_university_name(&"u".repeat(256)).is_err());
        assert!(validate_university_name(&"é".repeat(200)).is_ok());
        assert!(validate_university_name("Bad\u{0}Name").is_err());
    }

    #[tokio::test]
    async fn invalid_schema_is_rejected_before_touching_the_database() {
        let admin = AdminAccount {
            name: "Admin".to_string(),
            email: "admin@example.edu".to_string(),
            password: "secret-password".to_string(),
        };
        let err = register_university("Oxford", "Not Valid", &admin).await.unwrap_err();
        assert!(matches!(err, UniversityError::Database(DatabaseError::InvalidSchemaName(_))));

        let err = validate_university_schema("x").await.unwrap_err();
        assert!(matches!(err, UniversityError::Database(DatabaseError::InvalidSchemaName(_))));
    }
}
