//! Named-parameter SQL for MySQL.
//!
//! Queries are written with `:name` placeholders and a JSON object of values.
//! [`sql_with_named_params`] rewrites them into positional `?` placeholders and
//! returns the values in bind order; the `fetch_*`/`execute` helpers bind and
//! run the result against any pool, while the `*_university`/`*_global`
//! variants pick the pool by schema.

use serde_json::{Map, Value};
use sqlx::mysql::{MySqlPool, MySqlQueryResult, MySqlRow};
use sqlx::{Executor, FromRow, MySql};

use super::manager::{DatabaseError, DatabaseManager};

/// SQL rewritten to positional placeholders, with values in bind order
#[derive(Debug, Clone, PartialEq)]
pub struct NamedQuery {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Translate `:name` placeholders into `?` and collect the bound values.
///
/// Placeholders inside quoted literals are ignored, `::` is never a placeholder
/// and array values expand to a comma separated list (`NULL` when empty).
pub fn sql_with_named_params(sql: &str, params: &Value) -> Result<NamedQuery, DatabaseError> {
    let empty = Map::new();
    let params = match params {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(DatabaseError::InvalidParameters),
    };

    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            out.push(c);
            if c == '\\' && q != '`' {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            } else if c == q {
                // Doubled quote is an escaped quote, stay inside the literal
                if chars.get(i + 1) == Some(&q) {
                    out.push(q);
                    i += 1;
                } else {
                    quote = None;
                }
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if chars.get(i + 1).is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let value = params
                    .get(&name)
                    .ok_or_else(|| DatabaseError::MissingParameter(name.clone()))?;

                match value {
                    Value::Array(items) if items.is_empty() => out.push_str("NULL"),
                    Value::Array(items) => {
                        let marks = vec!["?"; items.len()].join(", ");
                        out.push_str(&marks);
                        values.extend(items.iter().cloned());
                    }
                    other => {
                        out.push('?');
                        values.push(other.clone());
                    }
                }
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(NamedQuery { sql: out, values })
}

// Query and QueryAs share `bind` but no trait, so the conversion is a macro
macro_rules! bind_value {
    ($q:expr, $v:expr) => {
        match $v {
            Value::Null => $q.bind(None::<String>),
            Value::Bool(b) => $q.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    $q.bind(i)
                } else if let Some(u) = n.as_u64() {
                    $q.bind(u)
                } else if let Some(f) = n.as_f64() {
                    $q.bind(f)
                } else {
                    $q.bind(n.to_string())
                }
            }
            Value::String(s) => $q.bind(s.clone()),
            // Arrays are expanded by sql_with_named_params; nested ones are stored as JSON
            Value::Array(_) | Value::Object(_) => $q.bind(sqlx::types::Json($v.clone())),
        }
    };
}

impl NamedQuery {
    pub fn new(sql: &str, params: &Value) -> Result<Self, DatabaseError> {
        sql_with_named_params(sql, params)
    }

    pub async fn fetch_all<'e, T, E>(&self, executor: E) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
        E: Executor<'e, Database = MySql>,
    {
        let mut q = sqlx::query_as::<_, T>(&self.sql);
        for v in &self.values {
            q = bind_value!(q, v);
        }
        Ok(q.fetch_all(executor).await?)
    }

    pub async fn fetch_optional<'e, T, E>(&self, executor: E) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
        E: Executor<'e, Database = MySql>,
    {
        let mut q = sqlx::query_as::<_, T>(&self.sql);
        for v in &self.values {
            q = bind_value!(q, v);
        }
        Ok(q.fetch_optional(executor).await?)
    }

    pub async fn execute<'e, E>(&self, executor: E) -> Result<MySqlQueryResult, DatabaseError>
    where
        E: Executor<'e, Database = MySql>,
    {
        let mut q = sqlx::query(&self.sql);
        for v in &self.values {
            q = bind_value!(q, v);
        }
        Ok(q.execute(executor).await?)
    }
}

/// Run a named query and return every row
pub async fn fetch_all<T>(pool: &MySqlPool, sql: &str, params: &Value) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    NamedQuery::new(sql, params)?.fetch_all(pool).await
}

/// Run a named query and return the first row, if any
pub async fn fetch_optional<T>(pool: &MySqlPool, sql: &str, params: &Value) -> Result<Option<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    NamedQuery::new(sql, params)?.fetch_optional(pool).await
}

/// Run a named query that must return a row; a missing row becomes `NotFound`
pub async fn fetch_one<T>(pool: &MySqlPool, sql: &str, params: &Value, what: &str) -> Result<T, DatabaseError>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    fetch_optional(pool, sql, params)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", what)))
}

/// Run a named statement that returns no rows
pub async fn execute(pool: &MySqlPool, sql: &str, params: &Value) -> Result<MySqlQueryResult, DatabaseError> {
    NamedQuery::new(sql, params)?.execute(pool).await
}

/// Named query against a university schema, dispatched to its cached pool
pub async fn query_university<T>(schema: &str, sql: &str, params: &Value) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let pool = DatabaseManager::university_pool(schema).await?;
    fetch_all(&pool, sql, params).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rewrites_placeholders_in_order() {
        let q = sql_with_named_params(
            "SELECT * FROM users WHERE role = :role AND id > :id",
            &json!({ "id": 10, "role": "student" }),
        )
        .unwrap();
        assert_eq!(q.sql, "SELECT * FROM users WHERE role = ? AND id > ?");
        assert_eq!(q.values, vec![json!("student"), json!(10)]);
    }

    #[test]
    fn repeated_names_bind_twice() {
        let q = sql_with_named_params(
            "SELECT * FROM users WHERE name LIKE :q OR email LIKE :q",
            &json!({ "q": "%ann%" }),
        )
        .unwrap();
        assert_eq!(q.sql, "SELECT * FROM users WHERE name LIKE ? OR email LIKE ?");
        assert_eq!(q.values.len(), 2);
    }

    #[test]
    fn ignores_colons_in_literals_and_casts() {
        let q = sql_with_named_params(
            "SELECT ':not_a_param', \"x:y\", `a:b`, '10:30'::time FROM t WHERE id = :id",
            &json!({ "id": 1 }),
        )
        .unwrap();
        assert_eq!(
            q.sql,
            "SELECT ':not_a_param', \"x:y\", `a:b`, '10:30'::time FROM t WHERE id = ?"
        );
        assert_eq!(q.values, vec![json!(1)]);
    }

    #[test]
    fn handles_escaped_quotes_inside_literals() {
        let q = sql_with_named_params(
            "SELECT 'it''s :fine', 'back\\' :still' FROM t WHERE a = :a",
            &json!({ "a": true }),
        )
        .unwrap();
        assert_eq!(q.sql, "SELECT 'it''s :fine', 'back\\' :still' FROM t WHERE a = ?");
        assert_eq!(q.values, vec![json!(true)]);
    }

    #[test]
    fn expands_arrays_for_in_lists() {
        let q = sql_with_named_params(
            "DELETE FROM topics WHERE id IN (:ids)",
            &json!({ "ids": [1, 2, 3] }),
        )
        .unwrap();
        assert_eq!(q.sql, "DELETE FROM topics WHERE id IN (?, ?, ?)");
        assert_eq!(q.values, vec![json!(1), json!(2), json!(3)]);

        let empty = sql_with_named_params("SELECT 1 FROM t WHERE id IN (:ids)", &json!({ "ids": [] })).unwrap();
        assert_eq!(empty.sql, "SELECT 1 FROM t WHERE id IN (NULL)");
        assert!(empty.values.is_empty());
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let err = sql_with_named_params("SELECT * FROM t WHERE id = :id", &json!({})).unwrap_err();
        assert!(matches!(err, DatabaseError::MissingParameter(name) if name == "id"));
    }

    #[test]
    fn params_must_be_an_object() {
        assert!(matches!(
            sql_with_named_params("SELECT 1", &json!([1])),
            Err(DatabaseError::InvalidParameters)
        ));
        let q = sql_with_named_params("SELECT 1", &Value::Null).unwrap();
        assert_eq!(q.sql, "SELECT 1");
    }

    #[test]
    fn lone_colon_and_digits_are_left_alone() {
        let q = sql_with_named_params("SELECT a : b, :1 FROM t", &json!({})).unwrap();
        assert_eq!(q.sql, "SELECT a : b, :1 FROM t");
    }
}
