//! Stable row identity

/// An entity with a stable identity key.
///
/// Selection is tracked by this key, never by a page-relative index.
pub trait Identified {
    fn identity(&self) -> String;
}

impl Identified for serde_json::Value {
    /// The record's `id` field, string or number. Records without one map
    /// to the empty key.
    fn identity(&self) -> String {
        match self.get("id") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}
