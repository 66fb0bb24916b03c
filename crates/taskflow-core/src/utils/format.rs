use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::api::ApiError;

/// Placeholder for missing values
pub const EMPTY_VALUE: &str = "—";

/// Fallback when an error body carries nothing readable
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

/// Parse the timestamp shapes the API and the CLI deal in: RFC 3339, naive
/// `YYYY-MM-DDTHH:MM[:SS]`, or a bare date.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a date for display, e.g. "Mar 5, 2025"
pub fn format_date(value: Option<&str>) -> String {
    format_with(value, "%b %-d, %Y")
}

/// Format a timestamp for display, e.g. "Mar 5, 2025 14:30"
pub fn format_datetime(value: Option<&str>) -> String {
    format_with(value, "%b %-d, %Y %H:%M")
}

fn format_with(value: Option<&str>, pattern: &str) -> String {
    match value.filter(|v| !v.trim().is_empty()) {
        None => EMPTY_VALUE.to_string(),
        Some(raw) => match parse_timestamp(raw) {
            Some(dt) => dt.format(pattern).to_string(),
            None => raw.to_string(),
        },
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Human-readable message for an API failure.
///
/// Server errors are mined for the message the backend put in the body;
/// everything else uses the error's own description.
pub fn extract_error_message(error: &ApiError) -> String {
    match error.body() {
        Some(body) if !body.trim().is_empty() => {
            message_from_body(body).unwrap_or_else(|| UNEXPECTED_ERROR.to_string())
        }
        _ => error.to_string(),
    }
}

/// Pull a message out of an error body.
///
/// Looks at `detail`, then `non_field_errors`, then the first field error
/// (rendered as "Field name: message"). A body that isn't JSON is returned as
/// is.
pub fn message_from_body(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return Some(crate::api::error::truncate_body(body)),
    };

    match value {
        Value::String(s) => Some(s),
        Value::Array(items) => items.first().map(value_text),
        Value::Object(map) => {
            if let Some(Value::String(detail)) = map.get("detail") {
                return Some(detail.clone());
            }
            if let Some(Value::Array(errors)) = map.get("non_field_errors") {
                if let Some(first) = errors.first() {
                    return Some(value_text(first));
                }
            }
            map.iter()
                .find(|(key, _)| *key != "detail" && *key != "non_field_errors")
                .map(|(field, messages)| {
                    let message = match messages {
                        Value::Array(items) => items.first().map(value_text).unwrap_or_default(),
                        other => value_text(other),
                    };
                    format!("{}: {}", field_label(field), message)
                })
        }
        _ => None,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// "due_date" -> "Due date"
fn field_label(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
