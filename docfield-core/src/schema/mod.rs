//! Document classes
//!
//! A [`DocumentClass`] is the registered, frozen definition of a document or
//! embedded document type: its flattened field table, key fields, unique
//! groups, actions and engine. Classes are declared with [`ClassDef`] and
//! registered explicitly through a [`Registry`] during bootstrap; the field
//! table, unique groups and key fields never change afterwards. Only the
//! dependency map grows, when a later class declares a dependent external
//! field pointing here.

pub mod registry;
pub mod version;

pub use registry::Registry;
pub use version::VersionTable;

use crate::acl::Acl;
use crate::document::ActionSpec;
use crate::engine::Engine;
use crate::error::{DocResult, DocumentError};
use crate::field::{Field, FieldMap};
use crate::ids;
use crate::value::Payload;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Document,
    Embedded,
}

/// Declaration of a class, turned into a [`DocumentClass`] by [`Registry::register`]
pub struct ClassDef {
    pub(crate) name: String,
    pub(crate) kind: ClassKind,
    pub(crate) parent: Option<Arc<DocumentClass>>,
    pub(crate) abstract_class: bool,
    pub(crate) key_fields: Option<Vec<String>>,
    pub(crate) fields: Vec<(String, Arc<dyn Field>)>,
    pub(crate) actions: Vec<(String, ActionSpec)>,
    pub(crate) engine: Option<Arc<dyn Engine>>,
    pub(crate) collection_name: Option<String>,
    pub(crate) table_name: Option<String>,
    pub(crate) fields_map: Option<Payload>,
    pub(crate) version_table_size: Option<usize>,
}

impl ClassDef {
    fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            abstract_class: false,
            key_fields: None,
            fields: Vec::new(),
            actions: Vec::new(),
            engine: None,
            collection_name: None,
            table_name: None,
            fields_map: None,
            version_table_size: None,
        }
    }

    pub fn document(name: impl Into<String>) -> Self {
        Self::new(name, ClassKind::Document)
    }

    pub fn embedded(name: impl Into<String>) -> Self {
        Self::new(name, ClassKind::Embedded)
    }

    /// Inherit fields, key fields, actions, engine and dependencies of `parent`
    pub fn extends(mut self, parent: &Arc<DocumentClass>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    pub fn key_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn field(self, name: impl Into<String>, field: impl Field + 'static) -> Self {
        self.shared_field(name, Arc::new(field))
    }

    pub fn shared_field(mut self, name: impl Into<String>, field: Arc<dyn Field>) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn action(mut self, name: impl Into<String>, spec: ActionSpec) -> Self {
        self.actions.push((name.into(), spec));
        self
    }

    pub fn engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.abstract_class = true;
        self
    }

    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn fields_map(mut self, map: Payload) -> Self {
        self.fields_map = Some(map);
        self
    }

    pub fn version_table_size(mut self, size: usize) -> Self {
        self.version_table_size = Some(size);
        self
    }
}

pub struct DocumentClass {
    pub(crate) name: String,
    pub(crate) kind: ClassKind,
    pub(crate) parent: Option<Arc<DocumentClass>>,
    pub(crate) abstract_class: bool,
    pub(crate) key_fields: Vec<String>,
    pub(crate) fields: Vec<(String, Arc<dyn Field>)>,
    pub(crate) uniques: Vec<Vec<String>>,
    pub(crate) supporting: RwLock<BTreeMap<String, FieldMap>>,
    pub(crate) actions: BTreeMap<String, ActionSpec>,
    pub(crate) engine: Arc<dyn Engine>,
    pub(crate) collection_name: Option<String>,
    pub(crate) table_name: Option<String>,
    pub(crate) fields_map: Option<Payload>,
    pub(crate) versions: Mutex<VersionTable>,
    pub(crate) version_listener_active: AtomicBool,
    pub(crate) address: RwLock<HashMap<String, Payload>>,
}

impl fmt::Debug for DocumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentClass")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("key_fields", &self.key_fields)
            .field("fields", &self.fields.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>())
            .field("engine", &self.engine.name())
            .finish()
    }
}

impl DocumentClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn is_embedded(&self) -> bool {
        self.kind == ClassKind::Embedded
    }

    pub fn parent(&self) -> Option<&Arc<DocumentClass>> {
        self.parent.as_ref()
    }

    pub fn is_abstract(&self) -> bool {
        self.abstract_class
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.key_fields.iter().any(|k| k == name)
    }

    /// Flattened field table in declaration order, parents first
    pub fn get_all_fields(&self) -> &[(String, Arc<dyn Field>)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Arc<dyn Field>> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Required flag as enforced for this class: key fields are always required
    pub fn is_required(&self, name: &str) -> bool {
        self.is_key(name) || self.field(name).is_some_and(|f| f.options().required)
    }

    pub fn uniques(&self) -> &[Vec<String>] {
        &self.uniques
    }

    /// Dependent classes and the field mapping they read from this class
    pub fn supporting(&self) -> BTreeMap<String, FieldMap> {
        self.supporting.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn add_supporting(&self, dependent: &str, field_map: &FieldMap) {
        self.supporting
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(dependent.to_string(), field_map.clone());
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub fn actions(&self) -> &BTreeMap<String, ActionSpec> {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.get(name)
    }

    /// True when `self` is `other` or derives from it
    pub fn is_subclass_of(&self, other: &DocumentClass) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if std::ptr::eq(class, other) {
                return true;
            }
            current = class.parent.as_deref();
        }
        false
    }

    /// Resolve a dotted path through embedded, list-of-embedded and external fields
    pub fn get_field(&self, path: &str) -> Option<Arc<dyn Field>> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        if head.is_empty() {
            return None;
        }
        let field = self.field(head)?;
        let Some(rest) = rest else {
            return Some(Arc::clone(field));
        };
        let nested = match field.inner() {
            Some(inner) if inner.is_kind("embedded") => inner.target(),
            _ if field.is_kind("embedded") || field.is_kind("external") => field.target(),
            _ => None,
        };
        nested.and_then(|class| class.get_field(rest))
    }

    pub fn dict_to_id(&self, key_values: &Payload) -> DocResult<String> {
        if self.key_fields.is_empty() {
            return Err(DocumentError::MissingKeyFields(self.name.clone()));
        }
        let values = self
            .key_fields
            .iter()
            .map(|k| {
                key_values.get(k).cloned().ok_or_else(|| DocumentError::MissingKeyValue {
                    class: self.name.clone(),
                    field: k.clone(),
                })
            })
            .collect::<DocResult<Vec<_>>>()?;
        ids::encode(&values)
    }

    /// One id per combination when some key values are lists
    pub fn dict_to_id_list(&self, key_values: &Payload) -> DocResult<Vec<String>> {
        if self.key_fields.is_empty() {
            return Err(DocumentError::MissingKeyFields(self.name.clone()));
        }
        let mut combos = vec![Payload::new()];
        for (key, value) in key_values {
            let options = match value {
                Value::Array(items) => items.clone(),
                single => vec![single.clone()],
            };
            combos = combos
                .into_iter()
                .flat_map(|combo| {
                    options.iter().map(move |option| {
                        let mut next = combo.clone();
                        next.insert(key.clone(), option.clone());
                        next
                    })
                })
                .collect();
        }
        combos.iter().map(|combo| self.dict_to_id(combo)).collect()
    }

    pub fn id_to_dict(&self, doc_id: &str) -> DocResult<Payload> {
        if self.key_fields.is_empty() {
            return Err(DocumentError::MissingKeyFields(self.name.clone()));
        }
        let values = ids::decode(doc_id)?;
        Ok(self.key_fields.iter().cloned().zip(values).collect())
    }

    pub fn get_version(&self, doc_id: &str) -> DocResult<String> {
        self.versions.lock().unwrap_or_else(PoisonError::into_inner).get(doc_id)
    }

    pub fn set_version(&self, doc_id: &str, code: Option<String>) -> DocResult<String> {
        self.versions.lock().unwrap_or_else(PoisonError::into_inner).set(doc_id, code)
    }

    pub fn purge_version_table(&self) {
        self.versions.lock().unwrap_or_else(PoisonError::into_inner).purge();
    }

    pub fn version_listener_active(&self) -> bool {
        self.version_listener_active.load(Ordering::Acquire)
    }

    pub fn set_version_listener_active(&self, active: bool) {
        self.version_listener_active.store(active, Ordering::Release);
    }

    /// Address of this class for an engine, the class engine when `None`
    pub fn get_address(&self, engine_param: Option<&str>) -> Payload {
        let param = engine_param.unwrap_or_else(|| self.engine.param());
        self.address
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(param)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_address(&self, engine_param: &str, content: Payload) {
        self.address
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(engine_param.to_string(), content);
    }

    /// Collection name: per-engine `_tables` override, declared name, then the
    /// outermost ancestor's declared name, then the class name.
    pub fn collection_name(&self, engine_param: Option<&str>) -> DocResult<String> {
        let address = self.get_address(engine_param);
        if let Some(Value::String(name)) =
            address.get("_tables").and_then(|tables| tables.get(&self.name))
        {
            return Ok(name.clone());
        }
        if let Some(name) = &self.collection_name {
            return Ok(name.clone());
        }
        if self.abstract_class {
            return Err(DocumentError::AbstractCollection(self.name.clone()));
        }
        let mut lineage = Vec::new();
        let mut current = self.parent.as_deref();
        while let Some(class) = current {
            lineage.push(class);
            current = class.parent.as_deref();
        }
        Ok(lineage
            .iter()
            .rev()
            .find_map(|class| class.collection_name.clone())
            .unwrap_or_else(|| self.name.clone()))
    }

    pub fn meta_data(&self) -> Payload {
        let mut meta = Payload::new();
        match self.kind {
            ClassKind::Document => {
                if let Ok(name) = self.collection_name(None) {
                    meta.insert("collection_name".to_string(), Value::String(name));
                }
                meta.insert("description".to_string(), Value::String(self.name.clone()));
                meta.insert("key_fields".to_string(), string_list(&self.key_fields));
                meta.insert(
                    "unique_lists".to_string(),
                    Value::Array(self.uniques.iter().map(|g| string_list(g)).collect()),
                );
                meta.insert("abstract".to_string(), Value::Bool(self.abstract_class));
            }
            ClassKind::Embedded => {
                if let Some(table_name) = &self.table_name {
                    meta.insert("table_name".to_string(), Value::String(table_name.clone()));
                }
                if !self.key_fields.is_empty() {
                    meta.insert("key_fields".to_string(), string_list(&self.key_fields));
                }
                if let Some(fields_map) = &self.fields_map {
                    meta.insert("fields_map".to_string(), Value::Object(fields_map.clone()));
                }
            }
        }
        meta
    }

    /// User id granted by an acl item shaped `{Class}/{id_field}/{user_id}`
    pub fn user_id_from_acl(&self, acl: &Acl, id_field: &str) -> Option<String> {
        let prefix = format!("{}/{}/", self.name, id_field);
        acl.content
            .iter()
            .find(|item| item.obj.starts_with(&prefix))
            .and_then(|item| item.obj.rsplit('/').next())
            .map(str::to_string)
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}
