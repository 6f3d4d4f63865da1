//! System settings with a single canonical encoding
//!
//! Reason lists (refund, cancellation) must arrive as a JSON array of
//! strings. JSON text inside a string and bare scalars are rejected rather
//! than guessed at.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Setting '{0}' is missing")]
    Missing(String),

    #[error("Setting '{field}' must be a JSON array of strings, got {found}")]
    NotAnArray { field: String, found: &'static str },

    #[error("Setting '{field}' has a non-string entry at index {index}")]
    NonStringEntry { field: String, index: usize },
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a reason list. Entries are trimmed; blank entries are skipped.
pub fn parse_reason_list(field: &str, value: &Value) -> Result<Vec<String>, SettingsError> {
    let Value::Array(entries) = value else {
        return Err(SettingsError::NotAnArray {
            field: field.to_string(),
            found: kind(value),
        });
    };

    let mut reasons = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Value::String(reason) = entry else {
            return Err(SettingsError::NonStringEntry {
                field: field.to_string(),
                index,
            });
        };
        let reason = reason.trim();
        if !reason.is_empty() {
            reasons.push(reason.to_string());
        }
    }
    Ok(reasons)
}

pub const REFUND_REASONS_FIELD: &str = "refundReasons";
pub const CANCEL_REASONS_FIELD: &str = "cancelReasons";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonSettings {
    pub refund_reasons: Vec<String>,
    pub cancel_reasons: Vec<String>,
}

impl ReasonSettings {
    /// Read both lists from a settings object
    pub fn from_value(settings: &Value) -> Result<Self, SettingsError> {
        let field = |name: &str| {
            settings
                .get(name)
                .ok_or_else(|| SettingsError::Missing(name.to_string()))
                .and_then(|value| parse_reason_list(name, value))
        };

        Ok(Self {
            refund_reasons: field(REFUND_REASONS_FIELD)?,
            cancel_reasons: field(CANCEL_REASONS_FIELD)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_of_strings_is_accepted() {
        let reasons = parse_reason_list("refundReasons", &json!(["Moved away", "  ", " Schedule "]))
            .unwrap();
        assert_eq!(reasons, ["Moved away", "Schedule"]);
    }

    #[test]
    fn test_json_encoded_string_is_rejected() {
        let err = parse_reason_list("refundReasons", &json!("[\"Moved away\"]")).unwrap_err();
        assert_eq!(
            err,
            SettingsError::NotAnArray {
                field: "refundReasons".into(),
                found: "a string"
            }
        );
    }

    #[test]
    fn test_scalars_and_mixed_entries_are_rejected() {
        assert!(parse_reason_list("x", &json!(3)).is_err());
        assert!(parse_reason_list("x", &Value::Null).is_err());
        assert_eq!(
            parse_reason_list("x", &json!(["ok", 7])).unwrap_err(),
            SettingsError::NonStringEntry {
                field: "x".into(),
                index: 1
            }
        );
    }

    #[test]
    fn test_reason_settings_from_object() {
        let settings = json!({
            "refundReasons": ["Moved away"],
            "cancelReasons": [],
        });
        let parsed = ReasonSettings::from_value(&settings).unwrap();
        assert_eq!(parsed.refund_reasons, ["Moved away"]);
        assert!(parsed.cancel_reasons.is_empty());

        let missing = ReasonSettings::from_value(&json!({"refundReasons": []})).unwrap_err();
        assert_eq!(missing, SettingsError::Missing("cancelReasons".into()));
    }
}
