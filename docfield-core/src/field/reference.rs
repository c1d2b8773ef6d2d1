use super::{impl_field_builder, DisplayOptions, Displayed, Field, FieldOptions, ResolveContext};
use crate::document::Document;
use crate::error::{DocResult, DocumentError};
use crate::schema::DocumentClass;
use crate::value::{FieldValue, Runtime};
use serde_json::Value;
use std::sync::Arc;

/// Id of a document of another class, resolved through that class's engine
/// store on read.
#[derive(Debug, Clone)]
pub struct ReferenceField {
    options: FieldOptions,
    class: Arc<DocumentClass>,
}

impl ReferenceField {
    pub fn new(class: &Arc<DocumentClass>) -> Self {
        let options = FieldOptions { runtime: true, ..FieldOptions::default() };
        Self { options, class: Arc::clone(class) }
    }
}

impl_field_builder!(ReferenceField);

impl Field for ReferenceField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["reference"]
    }

    fn target(&self) -> Option<&Arc<DocumentClass>> {
        Some(&self.class)
    }

    /// Accepts an id, or a display payload of the target document which then
    /// becomes the runtime value.
    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        match value {
            Value::Object(map) => {
                let mut doc = Document::from_display(&self.class, map)?;
                let doc_id = match doc.id() {
                    Some(id) => Some(id.to_string()),
                    None => doc.calculate_id()?,
                };
                doc.set_id(doc_id.clone());
                let internal = doc_id.map(Value::String).unwrap_or(Value::Null);
                Ok(FieldValue::Resolved(internal, Some(Runtime::Document(Box::new(doc)))))
            }
            Value::Number(n) => Ok(FieldValue::Resolved(Value::String(n.to_string()), None)),
            other => Ok(FieldValue::Resolved(other, None)),
        }
    }

    fn get_value(
        &self,
        internal: &Value,
        runtime: Option<&Runtime>,
        ctx: &ResolveContext<'_>,
    ) -> DocResult<Option<Runtime>> {
        let Value::String(doc_id) = internal else {
            return Ok(None);
        };
        if let Some(Runtime::Document(doc)) = runtime {
            if doc.id() == Some(doc_id.as_str()) {
                return Ok(runtime.cloned());
            }
        }
        let Some(store) = self.class.engine().store() else {
            return Ok(runtime.cloned());
        };
        let fetched = store.fetch(&self.class, doc_id, ctx.acl, ctx.batch)?;
        if fetched.is_none() {
            log::debug!("reference {}/{} did not resolve", self.class.name(), doc_id);
        }
        Ok(fetched.map(|doc| Runtime::Document(Box::new(doc))))
    }

    fn validate(&self, value: &Value) -> DocResult<()> {
        match value {
            Value::String(_) | Value::Null => Ok(()),
            other => Err(DocumentError::invalid(
                "",
                format!("reference to {} must be a document id, got {other}", self.class.name()),
            )),
        }
    }

    fn to_display(
        &self,
        value: &Value,
        runtime: Option<&Runtime>,
        opts: &DisplayOptions<'_>,
    ) -> DocResult<Displayed> {
        let detail = match runtime {
            Some(Runtime::Document(doc)) => {
                let mut doc = doc.as_ref().clone();
                Some(Value::Object(doc.get_display_data(opts)?))
            }
            _ => None,
        };
        Ok(Displayed { value: value.clone(), detail })
    }

    fn sample(&self) -> FieldValue {
        FieldValue::Resolved(Value::Null, None)
    }
}
