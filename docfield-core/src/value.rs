//! Value universe shared by fields, documents and engines
//!
//! Internal, display and database forms are all `serde_json::Value`. Payloads keep
//! insertion order so serialization follows the construction sequence.

use crate::document::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered JSON object: keyword arguments, raw data, display data, db data
pub type Payload = Map<String, Value>;

/// Reserved key of the unknown-field bucket inside raw data
pub const UNKNOWN_KEY: &str = "_unknown";
/// Reserved key carrying the document id
pub const ID_KEY: &str = "_id";
/// Reserved key carrying the access-control list
pub const ACL_KEY: &str = "_acl";

/// Lazily computed value of a runtime field
#[derive(Debug, Clone, PartialEq)]
pub enum Runtime {
    /// A computed plain value
    Value(Value),
    /// A resolved document (reference or single external field)
    Document(Box<Document>),
    /// Resolved documents of a list-mode external field
    Documents(Vec<Document>),
    /// Per-element cache of a list of runtime fields, `None` while unresolved
    List(Vec<Option<Runtime>>),
}

impl Runtime {
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Runtime::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Runtime::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Input for one field: a plain value to be normalized, or an internal value
/// paired with an already computed runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Plain(Value),
    Resolved(Value, Option<Runtime>),
}

impl FieldValue {
    pub fn internal(&self) -> &Value {
        match self {
            FieldValue::Plain(value) | FieldValue::Resolved(value, _) => value,
        }
    }

    pub fn into_parts(self) -> (Value, Option<Runtime>) {
        match self {
            FieldValue::Plain(value) => (value, None),
            FieldValue::Resolved(value, runtime) => (value, runtime),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Plain(value)
    }
}

/// Marker of a batch operation context threaded through lazy resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: uuid::Uuid,
}

impl Batch {
    pub fn new() -> Self {
        Self { id: uuid::Uuid::new_v4() }
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

/// Emptiness used by required-field checks and display detail selection.
///
/// `0` and `false` are values, not emptiness.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Text form used when building store queries from field values
pub fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_values() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
        assert!(!is_blank(&json!("x")));
    }

    #[test]
    fn query_text_unquotes_strings() {
        assert_eq!(query_text(&json!("A1")), "A1");
        assert_eq!(query_text(&json!(12)), "12");
        assert_eq!(query_text(&json!(true)), "true");
    }
}
