use super::{
    impl_field_builder, DecodeContext, DisplayOptions, Displayed, EncodeContext, Field,
    FieldOptions, ResolveContext,
};
use crate::error::{DocResult, DocumentError};
use crate::schema::DocumentClass;
use crate::value::{FieldValue, Runtime};
use serde_json::Value;
use std::sync::Arc;

/// List of values of one element field.
///
/// A list of runtime fields is itself runtime; its runtime value caches each
/// element separately so resolving one element leaves the others lazy.
#[derive(Debug, Clone)]
pub struct ListField {
    options: FieldOptions,
    field: Arc<dyn Field>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl ListField {
    pub fn new(field: impl Field + 'static) -> Self {
        let options = FieldOptions { runtime: field.options().runtime, ..FieldOptions::default() };
        Self { options, field: Arc::new(field), min_length: None, max_length: None }
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    fn element_runtime(runtime: Option<&Runtime>, index: usize) -> Option<&Runtime> {
        match runtime {
            Some(Runtime::List(items)) => items.get(index).and_then(Option::as_ref),
            _ => None,
        }
    }
}

impl_field_builder!(ListField);

impl Field for ListField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["list"]
    }

    fn inner(&self) -> Option<&dyn Field> {
        Some(self.field.as_ref())
    }

    fn is_list(&self) -> bool {
        true
    }

    fn target(&self) -> Option<&Arc<DocumentClass>> {
        self.field.target()
    }

    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        let items = match value {
            Value::Null if self.options.runtime => return Ok(FieldValue::Resolved(Value::Null, None)),
            Value::Null => return Ok(FieldValue::Plain(Value::Null)),
            Value::Array(items) => items,
            single => vec![single],
        };
        let mut internals = Vec::with_capacity(items.len());
        let mut runtimes = Vec::with_capacity(items.len());
        for item in items {
            let (internal, runtime) = self.field.guess_value(item)?.into_parts();
            internals.push(internal);
            runtimes.push(runtime);
        }
        if !self.options.runtime {
            return Ok(FieldValue::Plain(Value::Array(internals)));
        }
        let runtime = if runtimes.iter().all(Option::is_none) {
            None
        } else {
            Some(Runtime::List(runtimes))
        };
        Ok(FieldValue::Resolved(Value::Array(internals), runtime))
    }

    fn get_value(
        &self,
        internal: &Value,
        runtime: Option<&Runtime>,
        ctx: &ResolveContext<'_>,
    ) -> DocResult<Option<Runtime>> {
        if !self.options.runtime {
            return Ok(None);
        }
        let Value::Array(items) = internal else {
            return Ok(None);
        };
        let mut resolved = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match Self::element_runtime(runtime, index) {
                Some(cached) => resolved.push(Some(cached.clone())),
                None => resolved.push(self.field.get_value(item, None, ctx)?),
            }
        }
        Ok(Some(Runtime::List(resolved)))
    }

    fn validate(&self, value: &Value) -> DocResult<()> {
        let items = match value {
            Value::Null => return Ok(()),
            Value::Array(items) => items,
            other => return Err(DocumentError::invalid("", format!("expected a list, got {other}"))),
        };
        if let Some(max) = self.max_length {
            if items.len() > max {
                return Err(DocumentError::invalid("", format!("List item > max defined number: {max}")));
            }
        }
        if let Some(min) = self.min_length {
            if items.len() < min {
                return Err(DocumentError::invalid("", format!("List item < min defined number: {min}")));
            }
        }
        items.iter().filter(|item| !item.is_null()).try_for_each(|item| self.field.validate(item))
    }

    fn to_display(
        &self,
        value: &Value,
        runtime: Option<&Runtime>,
        opts: &DisplayOptions<'_>,
    ) -> DocResult<Displayed> {
        let Value::Array(items) = value else {
            return Ok(Displayed::plain(Value::Null));
        };
        let mut values = Vec::with_capacity(items.len());
        let mut details = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let shown = self.field.to_display(item, Self::element_runtime(runtime, index), opts)?;
            values.push(shown.value);
            details.push(shown.detail.unwrap_or(Value::Null));
        }
        let detail = self.options.runtime.then(|| Value::Array(details));
        Ok(Displayed { value: Value::Array(values), detail })
    }

    fn to_db(&self, value: &Value, ctx: &EncodeContext<'_>) -> DocResult<Value> {
        let Value::Array(items) = value else {
            return Ok(Value::Null);
        };
        let inner = ctx.for_inner();
        let encoded = items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| self.field.to_db(item, &inner))
            .collect::<DocResult<Vec<_>>>()?;
        ctx.codec.apply(Value::Array(encoded))
    }

    fn from_db(&self, value: Value, ctx: &DecodeContext<'_>) -> DocResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let inner = ctx.for_inner();
        match ctx.codec.apply(value)? {
            Value::Array(items) => Ok(Value::Array(
                items
                    .into_iter()
                    .map(|item| self.field.from_db(item, &inner))
                    .collect::<DocResult<Vec<_>>>()?,
            )),
            Value::Null => Ok(Value::Null),
            other => Err(DocumentError::Codec(format!("expected a list in database form, got {other}"))),
        }
    }

    fn sample(&self) -> FieldValue {
        match self.field.sample() {
            FieldValue::Plain(value) => FieldValue::Plain(Value::Array(vec![value])),
            FieldValue::Resolved(value, runtime) => FieldValue::Resolved(
                Value::Array(vec![value]),
                runtime.map(|r| Runtime::List(vec![Some(r)])),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BaseEngine, Engine};
    use crate::field::{FieldBuilder, IntField, StringField};
    use serde_json::json;

    fn doubled(value: Value) -> DocResult<Value> {
        Ok(value.as_i64().map(|n| json!(n * 2)).unwrap_or(value))
    }

    fn wrapped(value: Value) -> DocResult<Value> {
        Ok(json!({ "items": value }))
    }

    #[test]
    fn guesses_each_element() {
        let field = ListField::new(IntField::new());
        assert_eq!(field.guess_value(json!(["1", 2])).unwrap().internal(), &json!([1, 2]));
        assert_eq!(field.guess_value(json!("3")).unwrap().internal(), &json!([3]));
        assert!(!field.options().runtime);
    }

    #[test]
    fn length_bounds() {
        let field = ListField::new(StringField::new()).with_min_length(1).with_max_length(2).required();
        assert!(field.validate(&json!(["a"])).is_ok());
        assert!(field.validate(&json!([])).is_err());
        assert!(field.validate(&json!(["a", "b", "c"])).is_err());
        assert!(field.validate(&json!(["a", 1])).is_err());
        assert!(field.validate(&Value::Null).is_ok());
    }

    #[test]
    fn encodes_elements_then_list() {
        let engine = BaseEngine::new("test").with_encoder("list", wrapped).with_encoder("int", doubled);
        let field = ListField::new(IntField::new());
        let ctx = EncodeContext {
            catalog: None,
            codec: engine.get_encoder(field.lineage(), field.inner().map(|f| f.lineage())),
            ignore_unknown: false,
            engine: &engine,
        };
        assert_eq!(field.to_db(&json!([1, null, 3]), &ctx).unwrap(), json!({"items": [2, 6]}));
    }
}
