use super::{
    impl_field_builder, DecodeContext, DisplayOptions, Displayed, EncodeContext, Field,
    FieldOptions,
};
use crate::document::{DbOptions, Document};
use crate::error::{DocResult, DocumentError};
use crate::schema::DocumentClass;
use crate::value::{FieldValue, Runtime};
use serde_json::Value;
use std::sync::Arc;

/// A nested document of an embedded class, stored inline as its raw data
#[derive(Debug, Clone)]
pub struct EmbeddedDocumentField {
    options: FieldOptions,
    class: Arc<DocumentClass>,
}

impl EmbeddedDocumentField {
    pub fn new(class: &Arc<DocumentClass>) -> Self {
        Self { options: FieldOptions::default(), class: Arc::clone(class) }
    }

    fn expect_object<'v>(&self, value: &'v Value) -> DocResult<Option<&'v serde_json::Map<String, Value>>> {
        match value {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(map)),
            other => Err(DocumentError::invalid(
                "",
                format!("{} expects a dictionary, got {other}", self.class.name()),
            )),
        }
    }
}

impl_field_builder!(EmbeddedDocumentField);

impl Field for EmbeddedDocumentField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["embedded"]
    }

    fn target(&self) -> Option<&Arc<DocumentClass>> {
        Some(&self.class)
    }

    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        match value {
            Value::Null => Ok(FieldValue::Plain(Value::Null)),
            Value::Object(map) => {
                let doc = Document::from_display(&self.class, map)?;
                Ok(FieldValue::Plain(Value::Object(doc.get_raw_data())))
            }
            other => Err(DocumentError::invalid(
                "",
                format!("{} expects a dictionary, got {other}", self.class.name()),
            )),
        }
    }

    fn validate(&self, value: &Value) -> DocResult<()> {
        match self.expect_object(value)? {
            Some(map) => Document::from_raw(&self.class, map.clone())?.validate(),
            None => Ok(()),
        }
    }

    fn to_display(
        &self,
        value: &Value,
        _runtime: Option<&Runtime>,
        opts: &DisplayOptions<'_>,
    ) -> DocResult<Displayed> {
        match value {
            Value::Object(map) => {
                let mut doc = Document::from_raw(&self.class, map.clone())?;
                Ok(Displayed::plain(Value::Object(doc.get_display_data(opts)?)))
            }
            other => Ok(Displayed::plain(other.clone())),
        }
    }

    fn to_db(&self, value: &Value, ctx: &EncodeContext<'_>) -> DocResult<Value> {
        let Some(map) = self.expect_object(value)? else {
            return Ok(Value::Null);
        };
        let doc = Document::from_raw(&self.class, map.clone())?;
        let encoded = doc.to_db(&DbOptions {
            catalog: ctx.catalog,
            ignore_unknown: ctx.ignore_unknown,
            engine: Some(ctx.engine),
        })?;
        ctx.codec.apply(Value::Object(encoded))
    }

    fn from_db(&self, value: Value, ctx: &DecodeContext<'_>) -> DocResult<Value> {
        match ctx.codec.apply(value)? {
            Value::Object(map) => {
                let doc = Document::from_db(&self.class, map, Some(ctx.engine))?;
                Ok(Value::Object(doc.get_raw_data()))
            }
            Value::Null => Ok(Value::Null),
            other => Err(DocumentError::Codec(format!(
                "{} expects a dictionary in database form, got {other}",
                self.class.name()
            ))),
        }
    }

    fn sample(&self) -> FieldValue {
        match Document::get_sample(&self.class) {
            Ok(doc) => FieldValue::Plain(Value::Object(doc.get_raw_data())),
            Err(e) => {
                log::warn!("no sample for embedded {}: {}", self.class.name(), e);
                FieldValue::Plain(Value::Null)
            }
        }
    }
}
