//! Field checks shared by the flow validators.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use super::state::{ErrorMap, Fields};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Character classes a strong password must each contain.
static PASSWORD_CLASSES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [r"[a-z]", r"[A-Z]", r"[0-9]"].map(|pattern| Regex::new(pattern).unwrap())
});

/// Whether `value` looks like an email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

/// Text value of a field. Numbers and booleans render as text; anything else
/// (missing, null, arrays, objects) is empty.
pub fn text(fields: &Fields, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Numeric value of a field, from either a JSON number or numeric text.
pub fn number(fields: &Fields, key: &str) -> Option<Decimal> {
    let raw = text(fields, key);
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Record `message` under `key` when the field is blank.
pub fn require(errors: &mut ErrorMap, fields: &Fields, key: &str, message: &str) -> bool {
    if text(fields, key).trim().is_empty() {
        errors.insert(key.to_string(), message.to_string());
        false
    } else {
        true
    }
}

/// Record `message` under `key` unless the field is a well-formed email.
/// A blank field reports `missing` instead.
pub fn require_email(
    errors: &mut ErrorMap,
    fields: &Fields,
    key: &str,
    missing: &str,
    malformed: &str,
) {
    if require(errors, fields, key, missing) && !is_valid_email(&text(fields, key)) {
        errors.insert(key.to_string(), malformed.to_string());
    }
}

/// Lowercase, uppercase and a digit.
pub fn is_strong_password(value: &str) -> bool {
    PASSWORD_CLASSES.iter().all(|class| class.is_match(value))
}
