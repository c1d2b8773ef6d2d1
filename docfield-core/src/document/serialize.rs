//! Display and database forms of a document

use super::Document;
use crate::catalog::{self, Catalog};
use crate::engine::Engine;
use crate::error::DocResult;
use crate::field::{DecodeContext, DisplayOptions, Displayed, EncodeContext};
use crate::schema::DocumentClass;
use crate::value::{is_blank, FieldValue, Payload, ID_KEY, UNKNOWN_KEY};
use serde_json::Value;
use std::sync::Arc;

/// Options of [`Document::to_db`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DbOptions<'a> {
    /// Restrict the output to these fields (key fields are always kept)
    pub catalog: Option<&'a Catalog>,
    /// Do not write unknown fields back
    pub ignore_unknown: bool,
    /// Engine whose encoders apply, the class engine when `None`
    pub engine: Option<&'a dyn Engine>,
}

/// Display value of a runtime field: the rendered runtime value when there is
/// one, per element for lists.
fn prefer_detail(shown: Displayed) -> Value {
    match (shown.value, shown.detail) {
        (Value::Array(values), Some(Value::Array(details))) => Value::Array(
            values
                .into_iter()
                .enumerate()
                .map(|(i, value)| match details.get(i) {
                    Some(detail) if !is_blank(detail) => detail.clone(),
                    _ => value,
                })
                .collect(),
        ),
        (_, Some(detail)) if !is_blank(&detail) => detail,
        (value, _) => value,
    }
}

impl Document {
    /// Display form. Runtime fields that are eager, globally or through the
    /// catalog, are resolved first when not cached yet.
    pub fn get_display_data(&mut self, opts: &DisplayOptions<'_>) -> DocResult<Payload> {
        let class = Arc::clone(self.class());
        let selection = catalog::effective(opts.catalog);
        for (name, field) in class.get_all_fields() {
            let options = field.options();
            if !options.runtime || self.runtime.contains_key(name) {
                continue;
            }
            if options.stateful && !self.data.contains_key(name) {
                continue;
            }
            if selection.is_some_and(|c| !c.contains(name)) || (options.hidden && !opts.show_hidden) {
                continue;
            }
            if !catalog::lazy_status(selection, name, opts.lazy) {
                self.get(name)?;
            }
        }
        self.render_display(opts)
    }

    /// Display form from the data and runtime values at hand, without resolving
    pub fn render_display(&self, opts: &DisplayOptions<'_>) -> DocResult<Payload> {
        let selection = catalog::effective(opts.catalog);
        let class = self.class();
        let mut result = Payload::new();
        if selection.is_none() && !self.unknown.is_empty() {
            result.insert(UNKNOWN_KEY.to_string(), Value::Object(self.unknown.clone()));
        }
        for (name, value) in &self.data {
            if selection.is_some_and(|c| !c.contains(name)) {
                continue;
            }
            let Some(field) = class.field(name) else {
                result.insert(name.clone(), value.clone());
                continue;
            };
            if field.options().hidden && !opts.show_hidden {
                continue;
            }
            let shown = field.to_display(value, self.runtime.get(name), &opts.descend(name))?;
            let shown = if field.options().runtime { prefer_detail(shown) } else { shown.value };
            result.insert(name.clone(), shown);
        }
        for (name, field) in class.get_all_fields() {
            let options = field.options();
            if options.stateful || selection.is_some_and(|c| !c.contains(name)) {
                continue;
            }
            if options.hidden && !opts.show_hidden {
                continue;
            }
            let shown = field.to_display(&Value::Null, self.runtime.get(name), &opts.descend(name))?;
            result.insert(name.clone(), shown.detail.unwrap_or(Value::Null));
        }
        if let Some(id) = &self.id {
            result.insert(ID_KEY.to_string(), Value::String(id.clone()));
        }
        Ok(result)
    }

    /// Database form through the engine's encoders
    pub fn to_db(&self, opts: &DbOptions<'_>) -> DocResult<Payload> {
        let class = self.class();
        let engine: &dyn Engine = match opts.engine {
            Some(engine) => engine,
            None => class.engine().as_ref(),
        };
        let selection = catalog::effective(opts.catalog);
        let mut result = Payload::new();
        for (name, value) in &self.data {
            if selection.is_some_and(|c| !c.contains(name)) && !class.is_key(name) {
                continue;
            }
            let Some(field) = class.field(name) else {
                continue;
            };
            if !field.options().stateful {
                continue;
            }
            let ctx = EncodeContext {
                catalog: selection.and_then(|c| c.sub(name)),
                codec: engine.get_encoder(field.lineage(), field.inner().map(|f| f.lineage())),
                ignore_unknown: opts.ignore_unknown,
                engine,
            };
            result.insert(name.clone(), field.to_db(value, &ctx)?);
        }
        if let Some(id) = &self.id {
            result.insert(ID_KEY.to_string(), Value::String(id.clone()));
        }
        if selection.is_none() && !opts.ignore_unknown && engine.capabilities().support_unknown {
            for (key, value) in &self.unknown {
                if !result.contains_key(key) {
                    result.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(result)
    }

    /// Rebuild from the database form. Unknown keys land in the unknown
    /// bucket, values of external fields are dropped.
    pub fn from_db(
        class: &Arc<DocumentClass>,
        payload: Payload,
        engine: Option<&dyn Engine>,
    ) -> DocResult<Document> {
        let engine: &dyn Engine = match engine {
            Some(engine) => engine,
            None => class.engine().as_ref(),
        };
        let mut entries = Vec::with_capacity(payload.len());
        for (key, value) in payload {
            if key.starts_with('_') {
                entries.push((key, FieldValue::Plain(value)));
                continue;
            }
            match class.field(&key) {
                Some(field) if field.options().stateful => {
                    let ctx = DecodeContext {
                        codec: engine.get_decoder(field.lineage(), field.inner().map(|f| f.lineage())),
                        engine,
                    };
                    let decoded = field.from_db(value, &ctx)?;
                    entries.push((key, FieldValue::Plain(decoded)));
                }
                Some(_) => {}
                None => entries.push((key, FieldValue::Plain(value))),
            }
        }
        Document::build(class, entries, false)
    }

    /// Rebuild from the display form, normalizing declared fields
    pub fn from_display(class: &Arc<DocumentClass>, payload: Payload) -> DocResult<Document> {
        let mut entries = Vec::with_capacity(payload.len());
        for (key, value) in payload {
            if key.starts_with('_') {
                entries.push((key, FieldValue::Plain(value)));
                continue;
            }
            match class.field(&key) {
                Some(field) if field.options().stateful => entries.push((key, field.guess_value(value)?)),
                Some(_) => {}
                None => entries.push((key, FieldValue::Plain(value))),
            }
        }
        Document::build(class, entries, false)
    }

    /// A document filled with each field's sample value
    pub fn get_sample(class: &Arc<DocumentClass>) -> DocResult<Document> {
        let entries = class.get_all_fields().iter().map(|(name, field)| (name.clone(), field.sample()));
        Document::build(class, entries, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BaseEngine, Capabilities};
    use crate::field::{FieldBuilder, IntField, StringField};
    use crate::schema::{ClassDef, Registry};
    use crate::testing::{order_class, payload, shop};
    use serde_json::json;

    fn cents(value: Value) -> DocResult<Value> {
        Ok(value.as_i64().map(|n| json!(n * 100)).unwrap_or(value))
    }

    fn units(value: Value) -> DocResult<Value> {
        Ok(value.as_i64().map(|n| json!(n / 100)).unwrap_or(value))
    }

    #[test]
    fn db_round_trip_through_engine_codecs() {
        let engine = BaseEngine::new("cents").with_encoder("int", cents).with_decoder("int", units);
        let class = order_class(&mut Registry::new());
        let mut doc = Document::new(&class, payload(json!({"order_id": "A1", "amount": 7, "extra": true}))).unwrap();
        doc.set_id(Some("A1-id".to_string()));
        let stored = doc.to_db(&DbOptions { engine: Some(&engine), ..Default::default() }).unwrap();
        assert_eq!(Value::Object(stored.clone()), json!({"order_id": "A1", "amount": 700, "_id": "A1-id", "extra": true}));
        let back = Document::from_db(&class, stored, Some(&engine)).unwrap();
        assert_eq!(back.get_raw_data(), doc.get_raw_data());
        assert_eq!(back.id(), Some("A1-id"));
    }

    #[test]
    fn catalog_projection_keeps_keys_and_drops_unknown() {
        let class = order_class(&mut Registry::new());
        let doc = Document::new(&class, payload(json!({"order_id": "A1", "amount": 7, "extra": 1}))).unwrap();
        let selection = Catalog::new().field("amount");
        let stored = doc.to_db(&DbOptions { catalog: Some(&selection), ..Default::default() }).unwrap();
        assert_eq!(Value::Object(stored), json!({"order_id": "A1", "amount": 7}));
        let empty = Catalog::new();
        let stored = doc.to_db(&DbOptions { catalog: Some(&empty), ..Default::default() }).unwrap();
        assert!(stored.contains_key("extra"));
    }

    #[test]
    fn unknown_fields_follow_engine_support() {
        let no_unknown = BaseEngine::new("strict")
            .with_capabilities(Capabilities { support_unknown: false, ..Capabilities::default() });
        let class = order_class(&mut Registry::new());
        let doc = Document::new(&class, payload(json!({"order_id": "A1", "amount": "x", "extra": 1}))).unwrap();
        let stored = doc.to_db(&DbOptions { engine: Some(&no_unknown), ..Default::default() }).unwrap();
        assert!(!stored.contains_key("extra"));
        let stored = doc.to_db(&DbOptions { ignore_unknown: true, ..Default::default() }).unwrap();
        assert!(!stored.contains_key("extra"));
        // a declared field always wins over an unknown entry of the same name
        let mut doc = doc;
        doc.unknown.insert("amount".to_string(), json!("shadow"));
        let stored = doc.to_db(&DbOptions::default()).unwrap();
        assert_eq!(stored["amount"], json!("x"));
    }

    #[test]
    fn hidden_fields_need_show_hidden() {
        let mut registry = Registry::new();
        let class = registry
            .register(
                ClassDef::document("User")
                    .field("name", StringField::new())
                    .field("password", StringField::new().hidden()),
            )
            .unwrap();
        let mut doc = Document::new(&class, payload(json!({"name": "ann", "password": "pw"}))).unwrap();
        let shown = doc.get_display_data(&DisplayOptions::default()).unwrap();
        assert!(!shown.contains_key("password"));
        let shown = doc.get_display_data(&DisplayOptions::default().with_hidden()).unwrap();
        assert_eq!(shown["password"], json!("pw"));
    }

    #[test]
    fn display_shows_unknown_only_without_catalog() {
        let class = order_class(&mut Registry::new());
        let mut doc = Document::new(&class, payload(json!({"order_id": "A1", "extra": 1}))).unwrap();
        let shown = doc.get_display_data(&DisplayOptions::default()).unwrap();
        assert_eq!(shown[UNKNOWN_KEY], json!({"extra": 1}));
        let selection = Catalog::new().field("order_id");
        let shown = doc.get_display_data(&DisplayOptions::default().with_catalog(&selection)).unwrap();
        assert_eq!(Value::Object(shown), json!({"order_id": "A1"}));
    }

    #[test]
    fn from_display_normalizes_and_drops_external_values() {
        let shop = shop();
        let doc = Document::from_display(
            &shop.order,
            payload(json!({"order_id": "A1", "amount": "10", "customer": {"ignored": true}, "tag": "x"})),
        )
        .unwrap();
        assert_eq!(doc.value("amount"), Some(&json!(10)));
        assert!(doc.value("customer").is_none());
        assert_eq!(doc.unknown().get("tag"), Some(&json!("x")));
    }

    #[test]
    fn sample_has_every_stateful_field() {
        let mut registry = Registry::new();
        let class = registry
            .register(
                ClassDef::document("Metric")
                    .field("name", StringField::new())
                    .field("value", IntField::new().required()),
            )
            .unwrap();
        let mut sample = Document::get_sample(&class).unwrap();
        assert_eq!(sample.value("name"), Some(&json!("string")));
        assert!(sample.value("value").is_some());
        sample.validate().unwrap();
    }
}
