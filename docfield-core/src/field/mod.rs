//! Field descriptors
//!
//! A field describes one attribute of a document class: its default, its
//! required/unique flags, whether it is materialized (`stateful`) and whether
//! reading it needs a compute step (`runtime`). Fields are declared once per
//! class and shared read-only by every instance; the document dispatches to
//! them explicitly for normalization, lazy resolution, validation and the
//! display/database conversions.

pub mod embedded;
pub mod external;
pub mod list;
pub mod reference;
pub mod scalar;

pub use embedded::EmbeddedDocumentField;
pub use external::ExternalField;
pub use list::ListField;
pub use reference::ReferenceField;
pub use scalar::{BooleanField, DateTimeField, EmailField, FloatField, IntField, StringField};

use crate::acl::Acl;
use crate::catalog::Catalog;
use crate::engine::{CodecPair, Engine};
use crate::error::DocResult;
use crate::schema::DocumentClass;
use crate::value::{Batch, FieldValue, Payload, Runtime};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Own field name → field name on the target class
pub type FieldMap = BTreeMap<String, String>;

/// Caller-supplied field-level check
pub type Validation = fn(&Value) -> Result<(), String>;

#[derive(Clone)]
pub struct FieldOptions {
    pub default: Option<Value>,
    pub required: bool,
    pub unique: bool,
    pub unique_with: Vec<String>,
    pub stateful: bool,
    pub runtime: bool,
    pub hidden: bool,
    pub dependent: bool,
    pub validation: Option<Validation>,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            default: None,
            required: false,
            unique: false,
            unique_with: Vec::new(),
            stateful: true,
            runtime: false,
            hidden: false,
            dependent: false,
            validation: None,
        }
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("default", &self.default)
            .field("required", &self.required)
            .field("unique", &self.unique)
            .field("unique_with", &self.unique_with)
            .field("stateful", &self.stateful)
            .field("runtime", &self.runtime)
            .field("hidden", &self.hidden)
            .field("dependent", &self.dependent)
            .field("validation", &self.validation.is_some())
            .finish()
    }
}

/// Context of a lazy resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveContext<'a> {
    pub batch: Option<&'a Batch>,
    pub acl: Option<&'a Acl>,
    /// Whole raw data of the owning document, for non-stateful fields
    pub internal_data: Option<&'a Payload>,
}

#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions<'a> {
    pub lazy: bool,
    pub catalog: Option<&'a Catalog>,
    pub show_hidden: bool,
}

impl Default for DisplayOptions<'_> {
    fn default() -> Self {
        Self { lazy: true, catalog: None, show_hidden: false }
    }
}

impl<'a> DisplayOptions<'a> {
    pub fn eager() -> Self {
        Self { lazy: false, ..Self::default() }
    }

    pub fn with_catalog(mut self, catalog: &'a Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_hidden(mut self) -> Self {
        self.show_hidden = true;
        self
    }

    /// Options for a compound field's own sub-fields
    pub fn descend(&self, name: &str) -> DisplayOptions<'a> {
        DisplayOptions {
            lazy: self.lazy,
            catalog: self.catalog.and_then(|c| c.sub(name)),
            show_hidden: self.show_hidden,
        }
    }
}

/// Display form of a field: the internal value rendered, plus the rendered
/// runtime value when one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Displayed {
    pub value: Value,
    pub detail: Option<Value>,
}

impl Displayed {
    pub fn plain(value: Value) -> Self {
        Self { value, detail: None }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EncodeContext<'a> {
    pub catalog: Option<&'a Catalog>,
    pub codec: CodecPair,
    pub ignore_unknown: bool,
    pub engine: &'a dyn Engine,
}

impl<'a> EncodeContext<'a> {
    pub fn for_inner(&self) -> Self {
        Self { codec: self.codec.for_inner(), ..*self }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub codec: CodecPair,
    pub engine: &'a dyn Engine,
}

impl<'a> DecodeContext<'a> {
    pub fn for_inner(&self) -> Self {
        Self { codec: self.codec.for_inner(), engine: self.engine }
    }
}

pub trait Field: fmt::Debug + Send + Sync {
    fn options(&self) -> &FieldOptions;

    /// Field kind followed by its ancestor kinds, most specific first
    fn lineage(&self) -> &'static [&'static str];

    fn kind(&self) -> &'static str {
        self.lineage().first().copied().unwrap_or("field")
    }

    fn is_kind(&self, kind: &str) -> bool {
        self.lineage().contains(&kind)
    }

    /// Element field of a composite field
    fn inner(&self) -> Option<&dyn Field> {
        None
    }

    fn is_list(&self) -> bool {
        false
    }

    /// Document class the field points at (embedded, reference, external)
    fn target(&self) -> Option<&Arc<DocumentClass>> {
        None
    }

    fn field_map(&self) -> Option<&FieldMap> {
        None
    }

    /// Normalize an incoming value
    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        Ok(FieldValue::Plain(value))
    }

    /// Resolve the runtime value from the internal value and the previous runtime value
    fn get_value(
        &self,
        _internal: &Value,
        runtime: Option<&Runtime>,
        _ctx: &ResolveContext<'_>,
    ) -> DocResult<Option<Runtime>> {
        Ok(runtime.cloned())
    }

    fn validate(&self, value: &Value) -> DocResult<()>;

    fn to_display(
        &self,
        value: &Value,
        _runtime: Option<&Runtime>,
        _opts: &DisplayOptions<'_>,
    ) -> DocResult<Displayed> {
        Ok(Displayed::plain(value.clone()))
    }

    fn to_db(&self, value: &Value, ctx: &EncodeContext<'_>) -> DocResult<Value> {
        ctx.codec.apply(value.clone())
    }

    fn from_db(&self, value: Value, ctx: &DecodeContext<'_>) -> DocResult<Value> {
        ctx.codec.apply(value)
    }

    fn sample(&self) -> FieldValue;
}

/// Chained option setters shared by every field type
pub trait FieldBuilder: Sized {
    fn options_mut(&mut self) -> &mut FieldOptions;

    fn required(mut self) -> Self {
        self.options_mut().required = true;
        self
    }

    fn unique(mut self) -> Self {
        self.options_mut().unique = true;
        self
    }

    fn unique_with<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options_mut().unique_with = names.into_iter().map(Into::into).collect();
        self
    }

    fn hidden(mut self) -> Self {
        self.options_mut().hidden = true;
        self
    }

    fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.options_mut().default = Some(value.into());
        self
    }

    fn validation(mut self, check: Validation) -> Self {
        self.options_mut().validation = Some(check);
        self
    }
}

/// Implements `FieldBuilder` for a struct holding an `options` member
macro_rules! impl_field_builder {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::field::FieldBuilder for $ty {
                fn options_mut(&mut self) -> &mut $crate::field::FieldOptions {
                    &mut self.options
                }
            }
        )*
    };
}
pub(crate) use impl_field_builder;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_sets_options() {
        let field = StringField::new()
            .required()
            .unique_with(["tenant"])
            .hidden()
            .default_value("n/a");
        let options = field.options();
        assert!(options.required);
        assert!(!options.unique);
        assert_eq!(options.unique_with, vec!["tenant".to_string()]);
        assert!(options.hidden);
        assert!(options.stateful);
        assert!(!options.runtime);
        assert_eq!(options.default, Some(json!("n/a")));
    }

    #[test]
    fn display_options_descend_into_catalog() {
        let catalog = Catalog::new().nested("lines", Catalog::new().field("sku"));
        let opts = DisplayOptions::eager().with_catalog(&catalog);
        let sub = opts.descend("lines");
        assert!(!sub.lazy);
        assert_eq!(sub.catalog.map(|c| c.contains("sku")), Some(true));
        assert!(opts.descend("other").catalog.is_none());
    }
}
