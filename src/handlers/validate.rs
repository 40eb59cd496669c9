// Request body validation shared by the handlers. Failures become 400 VALIDATION_ERROR
// responses naming the offending field.

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Trimmed, non-empty text of at most `max` characters
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::field(field, format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::field(field, format!("{} must be at most {} characters", field, max)));
    }
    Ok(value.to_string())
}

/// Like [`required_text`] for optional fields; blank strings count as absent
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max).map(Some),
    }
}

/// Lowercased address with a single `@`, a non-empty local part and a dotted domain
pub fn email(value: &str) -> Result<String, ApiError> {
    let value = value.trim().to_lowercase();
    let invalid = || ApiError::field("email", "Invalid email address");

    if value.len() > 255 || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(value)
}

pub fn password(field: &str, value: &str) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ApiError::field(
            field,
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ApiError::field(
            field,
            format!("Password must be at most {} characters", MAX_PASSWORD_LEN),
        ));
    }
    Ok(())
}

/// Absolute http(s) URL, or nothing
pub fn optional_url(field: &str, value: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            Ok(Some(value.to_string()))
        }
        _ => Err(ApiError::field(field, format!("{} must be an http(s) URL", field))),
    }
}

pub fn positive_id(field: &str, value: i64) -> Result<i64, ApiError> {
    if value <= 0 {
        return Err(ApiError::field(field, format!("{} must be a positive id", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_bounded() {
        assert_eq!(required_text("name", "  Ada  ", 10).unwrap(), "Ada");
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "abcdefghijk", 10).is_err());
        assert_eq!(optional_text("description", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("description", None, 10).unwrap(), None);
        assert_eq!(optional_text("description", Some(" x "), 10).unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn emails() {
        assert_eq!(email(" Ada@Example.EDU ").unwrap(), "ada@example.edu");
        for bad in ["", "ada", "@example.edu", "ada@", "ada@edu", "ada@ex..edu", "a da@example.edu", "a@b@c.edu"] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn passwords() {
        assert!(password("password", "short").is_err());
        assert!(password("password", "long enough").is_ok());
        assert!(password("password", &"x".repeat(129)).is_err());
    }

    #[test]
    fn urls() {
        assert_eq!(
            optional_url("video_url", Some("https://videos.example.edu/1")).unwrap().as_deref(),
            Some("https://videos.example.edu/1")
        );
        assert_eq!(optional_url("video_url", Some("")).unwrap(), None);
        assert!(optional_url("video_url", Some("ftp://example.edu/file")).is_err());
        assert!(optional_url("video_url", Some("not a url")).is_err());
    }

    #[test]
    fn ids() {
        assert!(positive_id("course_id", 0).is_err());
        assert_eq!(positive_id("course_id", 5).unwrap(), 5);
    }
}
