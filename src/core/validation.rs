//! Request validation helpers
//!
//! Handlers collect problems into a [`ValidationErrors`] map keyed by the
//! request field name (`email`, `mainTasks[0].title`, ...), then hand it to
//! the response layer which renders it as the `errors` object.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::core::response::ApiError;

/// Field-keyed error messages, ordered by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});

/// Accumulator for field validation errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: FieldErrors,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Append a message under `field`
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Record `message` under `field` when `condition` is false
    pub fn check(&mut self, condition: bool, field: &str, message: &str) {
        if !condition {
            self.add(field, message);
        }
    }

    /// Record "<label> is required" when the value is missing or blank
    pub fn require(&mut self, value: Option<&str>, field: &str, label: &str) -> bool {
        let present = value.is_some_and(|v| !v.trim().is_empty());
        if !present {
            self.add(field, format!("{} is required", label));
        }
        present
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn into_inner(self) -> FieldErrors {
        self.errors
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Basic RFC-ish email shape check
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Non-empty and ASCII letters/digits only
pub fn is_alphanumeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Length in characters (not bytes) within `min..=max`
pub fn length_between(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = value.parse::<NaiveDate>() {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Accepts `HH:MM` (24h) or `HH:MM:SS`
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Parse a wire string into a serde enum (`"inprogress"` -> `ProgressStatus::InProgress`)
pub fn parse_enum<T: DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_string())).ok()
}

/// Parse an id taken from a path or body; `label` names it in the error
pub fn parse_id(value: &str, label: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} ID", label)))
}

/// Form fields that clients send either as strings or as numbers
pub mod string_or_number {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_accumulate_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("email", "Email is required");
        errors.add("email", "Email is invalid");
        errors.add("name", "Name is required");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email").unwrap().len(), 2);
        assert!(errors.contains("name"));
        assert!(!errors.contains("password"));
    }

    #[test]
    fn test_validation_errors_require() {
        let mut errors = ValidationErrors::new();

        assert!(errors.require(Some("value"), "a", "A"));
        assert!(!errors.require(Some("   "), "b", "B"));
        assert!(!errors.require(None, "c", "C"));

        assert_eq!(errors.get("b").unwrap(), ["B is required"]);
        assert_eq!(errors.get("c").unwrap(), ["C is required"]);
        assert!(!errors.contains("a"));
    }

    #[test]
    fn test_validation_errors_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.check(false, "totalMarks", "Total marks must be between 0 and 1000");
        let err = errors.into_result().unwrap_err();
        assert!(err.contains("totalMarks"));
    }

    #[test]
    fn test_validation_errors_display() {
        let mut errors = ValidationErrors::new();
        errors.add("password", "Password is required");
        errors.add("email", "Email is required");

        // BTreeMap keeps fields sorted
        assert_eq!(
            errors.to_string(),
            "email: Email is required; password: Password is required"
        );
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("student@example.com"));
        assert!(is_valid_email("first.last+tag@uni.ac.lk"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("user@domain"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn test_is_alphanumeric() {
        assert!(is_alphanumeric("it22586766"));
        assert!(is_alphanumeric("200012345V"));
        assert!(!is_alphanumeric(""));
        assert!(!is_alphanumeric("it-2258"));
        assert!(!is_alphanumeric("it 2258"));
    }

    #[test]
    fn test_length_between_counts_chars() {
        assert!(length_between("ab", 2, 50));
        assert!(!length_between("a", 2, 50));
        assert!(length_between("ééé", 3, 3));
        assert!(!length_between(&"x".repeat(51), 2, 50));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-03-14"),
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
        assert_eq!(
            parse_date("2025-03-14T10:00:00Z"),
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
        assert!(parse_date("14/03/2025").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_parse_enum() {
        use crate::core::db::models::{ProgressStatus, Specialization};

        assert_eq!(
            parse_enum::<ProgressStatus>("inprogress"),
            Some(ProgressStatus::InProgress)
        );
        assert_eq!(parse_enum::<Specialization>(" SE "), Some(Specialization::Se));
        assert_eq!(parse_enum::<Specialization>("se"), None);
    }

    #[test]
    fn test_string_or_number() {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Form {
            #[serde(default, with = "string_or_number")]
            academic_year: Option<String>,
        }

        let form: Form = serde_json::from_str(r#"{"academicYear": 3}"#).unwrap();
        assert_eq!(form.academic_year.as_deref(), Some("3"));

        let form: Form = serde_json::from_str(r#"{"academicYear": "2"}"#).unwrap();
        assert_eq!(form.academic_year.as_deref(), Some("2"));

        let form: Form = serde_json::from_str("{}").unwrap();
        assert!(form.academic_year.is_none());
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "course").unwrap(), id);

        let err = parse_id("507f1f77bcf86cd799439011", "course").unwrap_err();
        assert_eq!(err.to_string(), "Invalid course ID");
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("23:59"), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(parse_time("08:30:15"), NaiveTime::from_hms_opt(8, 30, 15));
        assert!(parse_time("24:00").is_none());
        assert!(parse_time("noon").is_none());
    }
}
