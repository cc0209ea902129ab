//! Request field validation.
//!
//! Each helper checks one field, records human-readable messages into a
//! [`FieldErrors`] map keyed by field name, and hands back the cleaned value when the
//! field passed. Handlers report the whole map at once:
//!
//! ```json
//! {"title": ["The title field is required."], "text1": ["The text1 field must not be greater than 255 characters."]}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest accepted value for short text columns.
pub const MAX_STRING_LEN: usize = 255;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validation messages per field, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

/// Human name for a field: `box_id` reads as "box id".
fn attribute(field: &str) -> String {
    field.replace('_', " ")
}

fn required_message(field: &str) -> String {
    format!("The {} field is required.", attribute(field))
}

fn check_max(errors: &mut FieldErrors, field: &str, value: &str, max: Option<usize>) -> bool {
    match max {
        Some(max) if value.chars().count() > max => {
            errors.add(
                field,
                format!(
                    "The {} field must not be greater than {} characters.",
                    attribute(field),
                    max
                ),
            );
            false
        }
        _ => true,
    }
}

/// A string that must be present and non-blank. Surrounding whitespace is trimmed.
pub fn required_string(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: Option<usize>,
) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.add(field, required_message(field));
        return None;
    }
    check_max(errors, field, trimmed, max).then(|| trimmed.to_string())
}

/// A string that may be omitted, but must be non-blank when sent.
///
/// Returns `None` both when the field is absent and when it failed.
pub fn optional_string(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: Option<usize>,
) -> Option<String> {
    value.and_then(|v| required_string(errors, field, Some(v), max))
}

/// A required, syntactically plausible email address, lowercased.
pub fn email(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    let value = required_string(errors, field, value, Some(MAX_STRING_LEN))?;
    if is_plausible_email(&value) {
        Some(value.to_lowercase())
    } else {
        errors.add(
            field,
            format!("The {} field must be a valid email address.", attribute(field)),
        );
        None
    }
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .all(|label| !label.is_empty())
}

/// A required string with a minimum length. Not trimmed.
pub fn password(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.add(field, required_message(field));
            return None;
        }
    };
    if value.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!(
                "The {} field must be at least {} characters.",
                attribute(field),
                MIN_PASSWORD_LEN
            ),
        );
        return None;
    }
    Some(value.to_string())
}

/// A required boolean.
///
/// Accepts `true`, `false`, `1`, `0`, `"1"`, `"0"`, `"true"` and `"false"`.
pub fn boolean(errors: &mut FieldErrors, field: &str, value: Option<&Value>) -> Option<bool> {
    let parsed = match value {
        None | Some(Value::Null) => {
            errors.add(field, required_message(field));
            return None;
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.add(field, required_message(field));
            return None;
        }
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Some(Value::String(s)) => match s.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        Some(_) => None,
    };

    if parsed.is_none() {
        errors.add(
            field,
            format!("The {} field must be true or false.", attribute(field)),
        );
    }
    parsed
}

/// A required integer identifier.
pub fn required_id(errors: &mut FieldErrors, field: &str, value: Option<i64>) -> Option<i64> {
    if value.is_none() {
        errors.add(field, required_message(field));
    }
    value
}

/// Message for an identifier that points at nothing.
pub fn invalid_selection(errors: &mut FieldErrors, field: &str) {
    errors.add(field, format!("The selected {} is invalid.", attribute(field)));
}
