//! Data scope of an engine
//!
//! A scope is a list of constraints on top-level fields, all of which must
//! hold, in the JSON shape `{"fn": "region", "op": "in", "val": ["eu", "us"]}`.

use super::Document;
use crate::error::{DocResult, DocumentError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "in")]
    In,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeConstraint {
    #[serde(rename = "fn")]
    pub field: String,
    pub op: ScopeOp,
    #[serde(rename = "val")]
    pub value: Value,
}

impl ScopeConstraint {
    pub fn new(field: impl Into<String>, op: ScopeOp, value: impl Into<Value>) -> Self {
        Self { field: field.into(), op, value: value.into() }
    }

    /// Whether a field value satisfies the constraint
    pub fn admits(&self, actual: &Value) -> bool {
        match self.op {
            ScopeOp::Eq => actual == &self.value,
            ScopeOp::Ge => matches!(compare(actual, &self.value), Some(Ordering::Greater | Ordering::Equal)),
            ScopeOp::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            ScopeOp::Le => matches!(compare(actual, &self.value), Some(Ordering::Less | Ordering::Equal)),
            ScopeOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            ScopeOp::In => match (&self.value, actual) {
                (Value::Array(options), _) => options.contains(actual),
                (Value::String(text), Value::String(part)) => text.contains(part.as_str()),
                (Value::Object(map), Value::String(key)) => map.contains_key(key),
                _ => false,
            },
        }
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

impl Document {
    /// Fail with an out-of-scope error unless every constraint holds on the
    /// raw field values.
    pub fn check_scope(&self, scope: &[ScopeConstraint]) -> DocResult<()> {
        for constraint in scope {
            let actual = self.value(&constraint.field).unwrap_or(&Value::Null);
            if !constraint.admits(actual) {
                log::debug!(
                    "{} fails scope {} {:?} {}",
                    self.class().name(),
                    constraint.field,
                    constraint.op,
                    constraint.value
                );
                return Err(DocumentError::OutOfScope(self.class().engine().name().to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Registry;
    use crate::testing::{order_class, payload};
    use serde_json::json;

    #[test]
    fn parses_scope_lines() {
        let scope: Vec<ScopeConstraint> =
            serde_json::from_value(json!([{"fn": "amount", "op": ">=", "val": 10}])).unwrap();
        assert_eq!(scope, vec![ScopeConstraint::new("amount", ScopeOp::Ge, 10)]);
    }

    #[test]
    fn operators_compare_field_against_value() {
        assert!(ScopeConstraint::new("x", ScopeOp::Gt, 3).admits(&json!(4)));
        assert!(!ScopeConstraint::new("x", ScopeOp::Gt, 3).admits(&json!(3)));
        assert!(ScopeConstraint::new("x", ScopeOp::Le, 3.5).admits(&json!(3)));
        assert!(ScopeConstraint::new("x", ScopeOp::Lt, "b").admits(&json!("a")));
        assert!(ScopeConstraint::new("x", ScopeOp::In, json!(["eu", "us"])).admits(&json!("eu")));
        assert!(!ScopeConstraint::new("x", ScopeOp::In, json!(["eu", "us"])).admits(&json!("cn")));
        assert!(!ScopeConstraint::new("x", ScopeOp::Ge, 1).admits(&Value::Null));
    }

    #[test]
    fn out_of_scope_documents_are_rejected() {
        let class = order_class(&mut Registry::new());
        let doc = Document::new(&class, payload(json!({"order_id": "A1", "amount": 5}))).unwrap();
        doc.check_scope(&[ScopeConstraint::new("amount", ScopeOp::Lt, 10)]).unwrap();
        let err = doc.check_scope(&[ScopeConstraint::new("amount", ScopeOp::Ge, 10)]).unwrap_err();
        assert!(matches!(err, DocumentError::OutOfScope(_)));
        doc.check_scope(&[]).unwrap();
    }
}
