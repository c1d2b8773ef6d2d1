use super::{
    impl_field_builder, DisplayOptions, Displayed, Field, FieldMap, FieldOptions, ResolveContext,
};
use crate::error::DocResult;
use crate::schema::DocumentClass;
use crate::value::{query_text, FieldValue, Payload, Runtime};
use serde_json::{json, Value};
use std::sync::Arc;

/// Document(s) of another class looked up from this document's own values.
///
/// Never materialized: the field only has a runtime value. A dependent field
/// must resolve whenever all of its mapped source fields are set.
#[derive(Debug, Clone)]
pub struct ExternalField {
    options: FieldOptions,
    class: Arc<DocumentClass>,
    field_map: FieldMap,
    list_length: usize,
}

impl ExternalField {
    pub fn new<I, K, V>(class: &Arc<DocumentClass>, field_map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let options = FieldOptions { stateful: false, runtime: true, ..FieldOptions::default() };
        Self {
            options,
            class: Arc::clone(class),
            field_map: field_map.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            list_length: 0,
        }
    }

    /// Resolve up to `list_length` documents instead of one
    pub fn with_list_length(mut self, list_length: usize) -> Self {
        self.list_length = list_length;
        self
    }

    pub fn dependent(mut self) -> Self {
        self.options.dependent = true;
        self
    }

    pub fn list_length(&self) -> usize {
        self.list_length
    }

    fn query(&self, data: &Payload) -> Option<Payload> {
        let mut query = Payload::new();
        for (own, remote) in &self.field_map {
            let value = match data.get(own) {
                None | Some(Value::Null) => return None,
                Some(Value::Array(items)) => {
                    Value::Array(items.iter().map(|i| Value::String(query_text(i))).collect())
                }
                Some(other) => Value::String(query_text(other)),
            };
            query.insert(remote.clone(), value);
        }
        Some(query)
    }

    fn guide(&self, opts: &DisplayOptions<'_>) -> DocResult<Value> {
        Ok(json!({
            "_class": self.class.name(),
            "_mode": "lazy",
            "_lazy": opts.lazy,
            "_catalog": serde_json::to_value(opts.catalog)?,
            "_show_hidden": opts.show_hidden,
            "_field_map": serde_json::to_value(&self.field_map)?,
            "_as_list": self.list_length > 0,
        }))
    }
}

impl_field_builder!(ExternalField);

impl Field for ExternalField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["external"]
    }

    fn is_list(&self) -> bool {
        self.list_length > 0
    }

    fn target(&self) -> Option<&Arc<DocumentClass>> {
        Some(&self.class)
    }

    fn field_map(&self) -> Option<&FieldMap> {
        Some(&self.field_map)
    }

    fn guess_value(&self, _value: Value) -> DocResult<FieldValue> {
        Ok(FieldValue::Resolved(Value::Null, None))
    }

    fn get_value(
        &self,
        _internal: &Value,
        runtime: Option<&Runtime>,
        ctx: &ResolveContext<'_>,
    ) -> DocResult<Option<Runtime>> {
        if runtime.is_some() {
            return Ok(runtime.cloned());
        }
        let Some(query) = ctx.internal_data.and_then(|data| self.query(data)) else {
            return Ok(None);
        };
        let Some(store) = self.class.engine().store() else {
            log::debug!("engine of {} has no store, external field stays unresolved", self.class.name());
            return Ok(None);
        };
        let limit = if self.list_length > 0 { self.list_length } else { 1 };
        let mut found = store.search(&self.class, &query, limit, ctx.acl, ctx.batch)?;
        if found.is_empty() {
            return Ok(None);
        }
        if self.list_length > 0 {
            Ok(Some(Runtime::Documents(found)))
        } else {
            Ok(Some(Runtime::Document(Box::new(found.swap_remove(0)))))
        }
    }

    fn validate(&self, _value: &Value) -> DocResult<()> {
        Ok(())
    }

    fn to_display(
        &self,
        value: &Value,
        runtime: Option<&Runtime>,
        opts: &DisplayOptions<'_>,
    ) -> DocResult<Displayed> {
        let detail = match runtime {
            Some(Runtime::Document(doc)) => Value::Object(doc.as_ref().clone().get_display_data(opts)?),
            Some(Runtime::Documents(docs)) => Value::Array(
                docs.iter()
                    .map(|doc| doc.clone().get_display_data(opts).map(Value::Object))
                    .collect::<DocResult<Vec<_>>>()?,
            ),
            _ => self.guide(opts)?,
        };
        Ok(Displayed { value: value.clone(), detail: Some(detail) })
    }

    fn sample(&self) -> FieldValue {
        FieldValue::Resolved(Value::Null, None)
    }
}
