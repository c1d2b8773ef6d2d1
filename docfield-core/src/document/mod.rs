//! Document instances
//!
//! A [`Document`] owns the raw data of one instance of a [`DocumentClass`]:
//! materialized field values, the unknown-field bucket, the cache of lazily
//! computed runtime values, and the optional id, acl and batch context.
//!
//! # Example
//!
//! ```no_run
//! use docfield_core::prelude::*;
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! let order = registry.register(
//!     ClassDef::document("Order")
//!         .key_fields(["order_id"])
//!         .field("order_id", StringField::new())
//!         .field("amount", IntField::new().required()),
//! )?;
//!
//! let mut doc = Document::with_values(&order, [("order_id", json!("A1").into())])?;
//! assert!(doc.validate().is_err());
//! doc.set("amount", json!(10))?;
//! doc.validate()?;
//! let id = doc.calculate_id()?;
//! # Ok::<(), docfield_core::DocumentError>(())
//! ```

pub mod action;
pub mod scope;
pub mod serialize;

pub use action::{ActionHandler, ActionSpec, CollectionAction, InstanceAction};
pub use scope::{ScopeConstraint, ScopeOp};
pub use serialize::DbOptions;

use crate::acl::Acl;
use crate::error::{DocResult, DocumentError};
use crate::field::{DisplayOptions, Field, ResolveContext};
use crate::schema::DocumentClass;
use crate::value::{is_blank, Batch, FieldValue, Payload, Runtime, ACL_KEY, ID_KEY, UNKNOWN_KEY};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Document {
    class: Arc<DocumentClass>,
    data: Payload,
    unknown: Payload,
    runtime: HashMap<String, Runtime>,
    id: Option<String>,
    acl: Option<Acl>,
    batch: Option<Batch>,
}

impl Document {
    /// Build from keyword values, normalizing each declared field
    pub fn new(class: &Arc<DocumentClass>, payload: Payload) -> DocResult<Self> {
        Self::build(class, payload.into_iter().map(|(k, v)| (k, FieldValue::Plain(v))), true)
    }

    /// Build from field values, some of which may carry a precomputed runtime value
    pub fn with_values<I, K>(class: &Arc<DocumentClass>, values: I) -> DocResult<Self>
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        Self::build(class, values.into_iter().map(|(k, v)| (k.into(), v)), true)
    }

    /// Rebuild from raw data as returned by [`Document::get_raw_data`]; values
    /// of non-runtime fields are taken as they are.
    pub fn from_raw(class: &Arc<DocumentClass>, raw: Payload) -> DocResult<Self> {
        Self::build(class, raw.into_iter().map(|(k, v)| (k, FieldValue::Plain(v))), false)
    }

    fn empty(class: &Arc<DocumentClass>) -> Self {
        let mut data = Payload::new();
        for (name, field) in class.get_all_fields() {
            let options = field.options();
            match &options.default {
                Some(default) if options.stateful && !default.is_null() => {
                    data.insert(name.clone(), default.clone());
                }
                _ => {}
            }
        }
        Self {
            class: Arc::clone(class),
            data,
            unknown: Payload::new(),
            runtime: HashMap::new(),
            id: None,
            acl: None,
            batch: None,
        }
    }

    pub(crate) fn build<I>(class: &Arc<DocumentClass>, entries: I, normalize: bool) -> DocResult<Self>
    where
        I: IntoIterator<Item = (String, FieldValue)>,
    {
        let mut doc = Self::empty(class);
        let mut restored: Vec<(String, FieldValue)> = Vec::new();
        let mut explicit: Vec<(String, FieldValue)> = Vec::new();
        for (key, value) in entries {
            if key == ID_KEY {
                doc.id = id_text(value.internal());
            } else if key == ACL_KEY {
                if !value.internal().is_null() {
                    doc.acl = Some(serde_json::from_value(value.internal().clone())?);
                }
            } else if key == UNKNOWN_KEY {
                if let (Value::Object(bucket), _) = value.into_parts() {
                    restored = bucket.into_iter().map(|(k, v)| (k, FieldValue::Plain(v))).collect();
                }
            } else if !key.starts_with('_') {
                explicit.push((key, value));
            }
        }
        // explicit values win over restored unknown entries of the same name
        for (key, value) in explicit {
            match restored.iter_mut().find(|(existing, _)| *existing == key) {
                Some(slot) => slot.1 = value,
                None => restored.push((key, value)),
            }
        }
        for (key, value) in restored {
            if key.starts_with('_') {
                continue;
            }
            match class.field(&key) {
                Some(field) => doc.assign(&key, field.as_ref(), value, normalize)?,
                None => {
                    let (internal, _) = value.into_parts();
                    doc.unknown.insert(key, internal);
                }
            }
        }
        Ok(doc)
    }

    /// Store an incoming value through the field's internal/runtime split.
    ///
    /// A cached runtime value is only replaced when the new value brings one,
    /// so a value computed from the previous internal value may be served
    /// until the next resolution.
    fn assign(&mut self, name: &str, field: &dyn Field, value: FieldValue, normalize: bool) -> DocResult<()> {
        let options = field.options();
        let value = match value {
            FieldValue::Plain(plain) if normalize || options.runtime => field.guess_value(plain)?,
            other => other,
        };
        let (internal, runtime) = value.into_parts();
        if options.stateful {
            self.data.insert(name.to_string(), internal);
        }
        if let Some(runtime) = runtime {
            self.runtime.insert(name.to_string(), runtime);
        }
        Ok(())
    }

    pub fn class(&self) -> &Arc<DocumentClass> {
        &self.class
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    pub fn acl(&self) -> Option<&Acl> {
        self.acl.as_ref()
    }

    pub fn set_acl(&mut self, acl: Option<Acl>) {
        self.acl = acl;
    }

    pub fn batch(&self) -> Option<&Batch> {
        self.batch.as_ref()
    }

    pub fn set_batch(&mut self, batch: Option<Batch>) {
        self.batch = batch;
    }

    /// Raw internal value of a field, without any resolution
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Unknown-field bucket
    pub fn unknown(&self) -> &Payload {
        &self.unknown
    }

    /// Cached runtime value of a field, without any resolution
    pub fn cached(&self, name: &str) -> Option<&Runtime> {
        self.runtime.get(name)
    }

    /// Read a field.
    ///
    /// Runtime fields are resolved again on every read and the result cached.
    /// A stateful runtime field falls back to its raw value while unresolved;
    /// an external field yields `None`. Other fields return their raw value.
    pub fn get(&mut self, name: &str) -> DocResult<Option<Runtime>> {
        let Some(field) = self.class.field(name).cloned() else {
            return Ok(None);
        };
        let options = field.options();
        if !options.runtime {
            return Ok(self.data.get(name).cloned().map(Runtime::Value));
        }
        let resolved = {
            let ctx = ResolveContext {
                batch: self.batch.as_ref(),
                acl: self.acl.as_ref(),
                internal_data: (!options.stateful).then_some(&self.data),
            };
            let internal = self.data.get(name).cloned().unwrap_or(Value::Null);
            field.get_value(&internal, self.runtime.get(name), &ctx)?
        };
        match resolved {
            Some(runtime) => {
                self.runtime.insert(name.to_string(), runtime.clone());
                Ok(Some(runtime))
            }
            None => {
                self.runtime.remove(name);
                if options.stateful {
                    Ok(self.data.get(name).cloned().map(Runtime::Value))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Assign a field through its normalization; undeclared names land in the
    /// unknown bucket.
    pub fn set(&mut self, name: &str, value: Value) -> DocResult<()> {
        match self.class.field(name).cloned() {
            Some(field) => self.assign(name, field.as_ref(), FieldValue::Plain(value), true),
            None => {
                self.unknown.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    /// Assign an internal value together with its already computed runtime value
    pub fn set_resolved(&mut self, name: &str, internal: Value, runtime: Runtime) -> DocResult<()> {
        let field = self
            .class
            .field(name)
            .cloned()
            .ok_or_else(|| DocumentError::invalid(name, format!("not a field of {}", self.class.name())))?;
        self.assign(name, field.as_ref(), FieldValue::Resolved(internal, Some(runtime)), false)
    }

    /// Materialized data, `_unknown` bucket first
    pub fn get_raw_data(&self) -> Payload {
        let mut raw = Payload::new();
        raw.insert(UNKNOWN_KEY.to_string(), Value::Object(self.unknown.clone()));
        raw.extend(self.data.iter().map(|(k, v)| (k.clone(), v.clone())));
        raw
    }

    /// Raw data with each cached runtime value paired to its internal value
    pub fn get_runtime_data(&self) -> Vec<(String, FieldValue)> {
        let mut entries = vec![(UNKNOWN_KEY.to_string(), FieldValue::Plain(Value::Object(self.unknown.clone())))];
        for (name, value) in &self.data {
            let entry = match self.runtime.get(name) {
                Some(runtime) => FieldValue::Resolved(value.clone(), Some(runtime.clone())),
                None => FieldValue::Plain(value.clone()),
            };
            entries.push((name.clone(), entry));
        }
        let mut runtime_only: Vec<_> =
            self.runtime.iter().filter(|(name, _)| !self.data.contains_key(*name)).collect();
        runtime_only.sort_by(|a, b| a.0.cmp(b.0));
        for (name, runtime) in runtime_only {
            entries.push((name.clone(), FieldValue::Resolved(Value::Null, Some(runtime.clone()))));
        }
        entries
    }

    /// Id derived from the key field values, `None` when the class has no key fields
    pub fn calculate_id(&self) -> DocResult<Option<String>> {
        if self.class.key_fields().is_empty() {
            return Ok(None);
        }
        let values: Vec<Value> = self
            .class
            .key_fields()
            .iter()
            .map(|k| self.data.get(k).cloned().unwrap_or(Value::Null))
            .collect();
        crate::ids::encode(&values).map(Some)
    }

    /// Check required fields, field rules, custom validations and dependent
    /// external fields. No error means valid.
    pub fn validate(&mut self) -> DocResult<()> {
        let class = Arc::clone(&self.class);
        for (name, field) in class.get_all_fields() {
            let options = field.options();
            if options.stateful {
                let value = self.data.get(name).cloned().unwrap_or(Value::Null);
                let declared_default = options.default.as_ref().filter(|d| !d.is_null());
                if is_blank(&value) && class.is_required(name) && declared_default != Some(&value) {
                    return Err(DocumentError::RequiredField(name.clone()));
                }
                if !value.is_null() {
                    field.validate(&value).map_err(|e| e.within(name))?;
                    if let Some(check) = options.validation {
                        check(&value).map_err(|message| DocumentError::invalid(name.as_str(), message))?;
                    }
                }
            } else if field.is_kind("external") && options.dependent && !field.is_list() {
                let sources_set = field
                    .field_map()
                    .is_some_and(|map| map.keys().all(|k| self.data.get(k).is_some_and(|v| !v.is_null())));
                if sources_set && self.get(name)?.is_none() {
                    return Err(DocumentError::DependentCheck {
                        class: class.name().to_string(),
                        field: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Equal when the raw data is equal; runtime caches are not compared
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.unknown == other.unknown
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display = self.render_display(&DisplayOptions::default()).map_err(|_| fmt::Error)?;
        let text = serde_json::to_string(&Value::Object(display)).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldBuilder, IntField, StringField};
    use crate::schema::{ClassDef, Registry};
    use crate::testing::{order_class, payload};
    use serde_json::json;

    #[test]
    fn defaults_then_values() {
        let mut registry = Registry::new();
        let class = registry
            .register(
                ClassDef::document("Ticket")
                    .field("title", StringField::new())
                    .field("priority", IntField::new().default_value(3))
                    .field("owner", StringField::new().default_value(Value::Null)),
            )
            .unwrap();
        let doc = Document::new(&class, payload(json!({"title": 5}))).unwrap();
        assert_eq!(doc.value("priority"), Some(&json!(3)));
        assert_eq!(doc.value("title"), Some(&json!("5")));
        assert_eq!(doc.value("owner"), None);
    }

    #[test]
    fn unknown_values_are_kept() {
        let class = order_class(&mut Registry::new());
        let doc = Document::new(&class, payload(json!({"order_id": "A1", "not_a_real_field": 2}))).unwrap();
        let raw = doc.get_raw_data();
        assert_eq!(raw["order_id"], json!("A1"));
        assert_eq!(raw[UNKNOWN_KEY], json!({"not_a_real_field": 2}));
        assert_eq!(raw.keys().next().map(String::as_str), Some(UNKNOWN_KEY));
    }

    #[test]
    fn explicit_values_win_over_restored_unknown() {
        let class = order_class(&mut Registry::new());
        let doc = Document::new(
            &class,
            payload(json!({"_unknown": {"note": "old", "amount": 4}, "note": "new", "_id": "X", "_secret": 1})),
        )
        .unwrap();
        assert_eq!(doc.unknown().get("note"), Some(&json!("new")));
        assert_eq!(doc.value("amount"), Some(&json!(4)));
        assert_eq!(doc.id(), Some("X"));
        assert!(!doc.unknown().contains_key("_secret"));
    }

    #[test]
    fn set_normalizes_and_routes_unknown_names() {
        let class = order_class(&mut Registry::new());
        let mut doc = Document::new(&class, Payload::new()).unwrap();
        doc.set("amount", json!("12")).unwrap();
        doc.set("colour", json!("red")).unwrap();
        assert_eq!(doc.value("amount"), Some(&json!(12)));
        assert_eq!(doc.unknown().get("colour"), Some(&json!("red")));
        assert_eq!(doc.get("amount").unwrap(), Some(Runtime::Value(json!(12))));
        assert_eq!(doc.get("colour").unwrap(), None);
    }

    #[test]
    fn required_fields_and_custom_validation() {
        fn positive(value: &Value) -> Result<(), String> {
            match value.as_i64() {
                Some(n) if n > 0 => Ok(()),
                _ => Err("must be positive".to_string()),
            }
        }
        let mut registry = Registry::new();
        let class = registry
            .register(
                ClassDef::document("Payment")
                    .key_fields(["ref"])
                    .field("ref", StringField::new())
                    .field("amount", IntField::new().validation(positive))
                    .field("status", StringField::new().required().default_value("")),
            )
            .unwrap();
        let mut doc = Document::new(&class, payload(json!({"amount": 1}))).unwrap();
        assert!(matches!(doc.validate(), Err(DocumentError::RequiredField(f)) if f == "ref"));
        doc.set("ref", json!("R1")).unwrap();
        doc.validate().unwrap();
        doc.set("amount", json!(-1)).unwrap();
        match doc.validate() {
            Err(DocumentError::InvalidValue { field, .. }) => assert_eq!(field, "amount"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn key_values_give_a_stable_id() {
        let class = order_class(&mut Registry::new());
        let doc = Document::new(&class, payload(json!({"order_id": "A1", "amount": 10}))).unwrap();
        let id = doc.calculate_id().unwrap().unwrap();
        assert_eq!(id, "WyJBMSJd");
        assert_eq!(class.id_to_dict(&id).unwrap(), payload(json!({"order_id": "A1"})));

        let mut registry = Registry::new();
        let keyless = registry.register(ClassDef::document("Log").field("line", StringField::new())).unwrap();
        assert_eq!(Document::new(&keyless, Payload::new()).unwrap().calculate_id().unwrap(), None);
    }

    #[test]
    fn display_string_is_compact_json() {
        let class = order_class(&mut Registry::new());
        let doc = Document::new(&class, payload(json!({"order_id": "A1", "amount": 10}))).unwrap();
        assert_eq!(doc.to_string(), r#"{"order_id":"A1","amount":10}"#);
    }
}
