//! Booking Form Validation
//!
//! Checks an admin-built `BookingConfig` for consistency and checks a
//! citizen's submission against it.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::{BookingConfig, DocumentRequirement, FieldType, FormField};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

/// Optional leading `+`, 7 to 15 digits, separators: space ( ) . -
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?(?:[\s().-]*\d){7,15}[\s().-]*$").expect("phone pattern")
});

/// One problem with one field or document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Field or document id the problem belongs to
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("booking form is misconfigured: {}", summarize(.0))]
    InvalidConfig(Vec<FieldViolation>),

    #[error("booking submission rejected: {}", summarize(.0))]
    InvalidSubmission(Vec<FieldViolation>),
}

impl FormError {
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            FormError::InvalidConfig(v) | FormError::InvalidSubmission(v) => v,
        }
    }
}

/// Check a form definition before it is saved
pub fn validate_config(config: &BookingConfig) -> Result<(), FormError> {
    let mut violations = Vec::new();

    let mut seen = HashSet::new();
    for field in &config.fields {
        if field.id.trim().is_empty() {
            violations.push(FieldViolation::new(&field.label, "field id is empty"));
        } else if !seen.insert(field.id.as_str()) {
            violations.push(FieldViolation::new(&field.id, "duplicate field id"));
        }
        if field.label.trim().is_empty() {
            violations.push(FieldViolation::new(&field.id, "label is empty"));
        }
        match &field.field_type {
            FieldType::Select { options } if options.iter().all(|o| o.trim().is_empty()) => {
                violations.push(FieldViolation::new(&field.id, "select field has no options"));
            }
            FieldType::Number { min: Some(min), max: Some(max) } if min > max => {
                violations.push(FieldViolation::new(&field.id, "minimum is greater than maximum"));
            }
            _ => {}
        }
    }

    let mut seen = HashSet::new();
    for document in &config.documents {
        if document.id.trim().is_empty() {
            violations.push(FieldViolation::new(&document.name, "document id is empty"));
        } else if !seen.insert(document.id.as_str()) {
            violations.push(FieldViolation::new(&document.id, "duplicate document id"));
        }
        if document.name.trim().is_empty() {
            violations.push(FieldViolation::new(&document.id, "document name is empty"));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(FormError::InvalidConfig(violations))
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

fn is_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

fn is_phone(s: &str) -> bool {
    PHONE_RE.is_match(s)
}

/// Type check a non-blank value
fn check_value(field: &FormField, value: &Value) -> Option<String> {
    let text = value.as_str().map(str::trim);
    match &field.field_type {
        FieldType::Text | FieldType::Textarea => match text {
            Some(_) => None,
            None => Some("expected text".to_string()),
        },
        FieldType::Number { min, max } => match as_number(value) {
            None => Some("expected a number".to_string()),
            Some(n) => match (min, max) {
                (Some(min), _) if n < *min => Some(format!("must be at least {}", min)),
                (_, Some(max)) if n > *max => Some(format!("must be at most {}", max)),
                _ => None,
            },
        },
        FieldType::Email => match text {
            Some(s) if is_email(s) => None,
            _ => Some("not a valid email address".to_string()),
        },
        FieldType::Phone => match text {
            Some(s) if is_phone(s) => None,
            _ => Some("not a valid phone number".to_string()),
        },
        FieldType::Date => match text.map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d")) {
            Some(Ok(_)) => None,
            _ => Some("expected a date as YYYY-MM-DD".to_string()),
        },
        FieldType::Select { options } => match text {
            Some(s) if options.iter().any(|o| o == s) => None,
            _ => Some("not one of the offered options".to_string()),
        },
        FieldType::Checkbox => match value {
            Value::Bool(_) => None,
            _ => Some("expected true or false".to_string()),
        },
    }
}

/// Check submitted values against the form. Every problem is reported, not
/// just the first. Keys the form does not define are ignored.
pub fn validate_submission(
    config: &BookingConfig,
    values: &Map<String, Value>,
) -> Result<(), FormError> {
    let mut violations = Vec::new();

    for field in &config.fields {
        let value = values.get(&field.id);

        if is_blank(value) {
            if field.required {
                let message = format!("{} is required", field.label);
                violations.push(FieldViolation::new(&field.id, message));
            }
            continue;
        }

        if let Some(value) = value {
            if let Some(message) = check_value(field, value) {
                violations.push(FieldViolation::new(&field.id, message));
            } else if field.required
                && field.field_type == FieldType::Checkbox
                && value != &Value::Bool(true)
            {
                let message = format!("{} must be checked", field.label);
                violations.push(FieldViolation::new(&field.id, message));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(FormError::InvalidSubmission(violations))
    }
}

/// Required documents whose id is not among `uploaded`, in form order
pub fn missing_documents<'a, S: AsRef<str>>(
    config: &'a BookingConfig,
    uploaded: &[S],
) -> Vec<&'a DocumentRequirement> {
    config
        .documents
        .iter()
        .filter(|d| d.required && !uploaded.iter().any(|u| u.as_ref() == d.id))
        .collect()
}
