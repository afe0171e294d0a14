use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AppError;

/// A single failed field check, reported to the client as part of a
/// 400 `{errors: [...]}` body.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collects declarative per-field checks, evaluated before any persistence
/// call. `finish` turns a non-empty list into `AppError::Validation`.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    pub fn error(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Required non-empty string (after trimming).
    pub fn require(&mut self, field: &str, value: Option<&str>) {
        match value {
            Some(v) if !v.trim().is_empty() => {}
            _ => self.error(field, &format!("{field} is required")),
        }
    }

    /// Optional string that, when present, must be non-empty after trimming.
    pub fn non_empty(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if v.trim().is_empty() {
                self.error(field, &format!("{field} must not be empty"));
            }
        }
    }

    /// Optional string with a maximum length in characters.
    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.error(field, &format!("{field} must be at most {max} characters"));
            }
        }
    }

    /// Optional string with a minimum length in characters.
    pub fn min_len(&mut self, field: &str, value: Option<&str>, min: usize) {
        if let Some(v) = value {
            if v.chars().count() < min {
                self.error(field, &format!("{field} must be at least {min} characters"));
            }
        }
    }

    /// Required numeric field (present-or-error; the type system covers the
    /// rest once deserialized).
    pub fn require_number(&mut self, field: &str, value: Option<i64>) {
        if value.is_none() {
            self.error(field, &format!("{field} must be a number"));
        }
    }

    /// Optional enum membership check: when present, the raw string must
    /// deserialize to `T`. Returns the parsed value so the caller does not
    /// parse twice.
    pub fn one_of<T: DeserializeOwned>(&mut self, field: &str, value: Option<&str>) -> Option<T> {
        let raw = value?;
        match parse_enum::<T>(raw) {
            Some(parsed) => Some(parsed),
            None => {
                self.error(field, "Invalid value");
                None
            }
        }
    }

    /// Required variant of `one_of`.
    pub fn require_one_of<T: DeserializeOwned>(
        &mut self,
        field: &str,
        value: Option<&str>,
    ) -> Option<T> {
        match value {
            Some(_) => self.one_of::<T>(field, value),
            None => {
                self.error(field, &format!("{field} is required"));
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// Parses a wire-format enum name (e.g. "full-time") into its Rust enum via
/// the serde rename rules, so wire names live in exactly one place.
pub fn parse_enum<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
}

/// Escapes LIKE/ILIKE metacharacters so user input only ever matches
/// literally as a substring.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobType;
    use crate::models::user::ExperienceLevel;

    #[test]
    fn test_require_missing() {
        let mut v = Validator::new();
        v.require("title", None);
        assert!(v.finish().is_err());
    }

    #[test]
    fn test_require_blank() {
        let mut v = Validator::new();
        v.require("title", Some("   "));
        assert!(!v.is_empty());
    }

    #[test]
    fn test_require_present() {
        let mut v = Validator::new();
        v.require("title", Some("Backend Engineer"));
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_non_empty_skips_absent() {
        let mut v = Validator::new();
        v.non_empty("location", None);
        assert!(v.is_empty());
    }

    #[test]
    fn test_max_len() {
        let mut v = Validator::new();
        let long = "x".repeat(501);
        v.max_len("bio", Some(long.as_str()), 500);
        assert!(!v.is_empty());
    }

    #[test]
    fn test_max_len_boundary_ok() {
        let mut v = Validator::new();
        let exact = "x".repeat(500);
        v.max_len("bio", Some(exact.as_str()), 500);
        assert!(v.is_empty());
    }

    #[test]
    fn test_min_len() {
        let mut v = Validator::new();
        v.min_len("password", Some("12345"), 6);
        assert!(!v.is_empty());
    }

    #[test]
    fn test_one_of_valid() {
        let mut v = Validator::new();
        let parsed: Option<JobType> = v.one_of("type", Some("full-time"));
        assert_eq!(parsed, Some(JobType::FullTime));
        assert!(v.is_empty());
    }

    #[test]
    fn test_one_of_invalid() {
        let mut v = Validator::new();
        let parsed: Option<JobType> = v.one_of("type", Some("fulltime"));
        assert!(parsed.is_none());
        assert!(!v.is_empty());
    }

    #[test]
    fn test_one_of_absent_is_ok() {
        let mut v = Validator::new();
        let parsed: Option<ExperienceLevel> = v.one_of("experience", None);
        assert!(parsed.is_none());
        assert!(v.is_empty());
    }

    #[test]
    fn test_require_one_of_absent_fails() {
        let mut v = Validator::new();
        let parsed: Option<JobType> = v.require_one_of("type", None);
        assert!(parsed.is_none());
        assert!(!v.is_empty());
    }

    #[test]
    fn test_errors_accumulate() {
        let mut v = Validator::new();
        v.require("title", None);
        v.require("location", None);
        match v.finish() {
            Err(AppError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_done\\x"), "100\\%\\_done\\\\x");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_parse_enum_kebab() {
        assert_eq!(parse_enum::<JobType>("part-time"), Some(JobType::PartTime));
        assert_eq!(parse_enum::<JobType>("PART-TIME"), None);
    }
}
