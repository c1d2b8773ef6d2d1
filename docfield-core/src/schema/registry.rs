//! Bootstrap registration of document classes

use super::{ClassDef, ClassKind, DocumentClass, VersionTable};
use crate::config::ModelConfig;
use crate::engine::{BaseEngine, Engine};
use crate::error::{DocResult, DocumentError};
use crate::field::Field;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};

/// Registered classes, in registration order.
///
/// Registration is append-only: a class is frozen once registered, and only
/// its dependency map may grow when a later class declares a dependent
/// external field targeting it (or one of its ancestors).
#[derive(Debug)]
pub struct Registry {
    classes: Vec<Arc<DocumentClass>>,
    by_name: HashMap<String, usize>,
    default_engine: Arc<dyn Engine>,
    version_table_size: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(&ModelConfig::default())
    }

    pub fn with_config(config: &ModelConfig) -> Self {
        Self {
            classes: Vec::new(),
            by_name: HashMap::new(),
            default_engine: Arc::new(BaseEngine::default()),
            version_table_size: config.version_table_size,
        }
    }

    /// Engine given to classes that neither declare nor inherit one
    pub fn with_engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.default_engine = engine;
        self
    }

    pub fn register(&mut self, def: ClassDef) -> DocResult<Arc<DocumentClass>> {
        if self.by_name.contains_key(&def.name) {
            return Err(DocumentError::Registration(format!("class {} is already registered", def.name)));
        }
        if let Some(parent) = &def.parent {
            if parent.kind != def.kind {
                return Err(DocumentError::Registration(format!(
                    "{} and its parent {} are not the same kind of class",
                    def.name, parent.name
                )));
            }
        }

        let fields = flatten_fields(&def)?;
        let key_fields = def
            .key_fields
            .clone()
            .or_else(|| def.parent.as_ref().map(|p| p.key_fields.clone()))
            .unwrap_or_default();
        if let Some(missing) = key_fields.iter().find(|k| !fields.iter().any(|(n, _)| n == *k)) {
            return Err(DocumentError::Registration(format!(
                "key field {} is not a field of {}",
                missing, def.name
            )));
        }
        for (name, field) in &fields {
            if field.is_kind("external") && field.options().dependent && field.is_list() {
                return Err(DocumentError::Registration(format!(
                    "dependent field {}.{} cannot be a list",
                    def.name, name
                )));
            }
        }

        let uniques = derive_uniques(&fields, &key_fields);
        let engine = def
            .engine
            .clone()
            .or_else(|| def.parent.as_ref().map(|p| Arc::clone(&p.engine)))
            .unwrap_or_else(|| Arc::clone(&self.default_engine));
        let mut actions = def.parent.as_ref().map(|p| p.actions.clone()).unwrap_or_default();
        actions.extend(def.actions.iter().cloned());
        let supporting = def.parent.as_ref().map(|p| p.supporting()).unwrap_or_default();
        let capacity = def.version_table_size.unwrap_or(self.version_table_size);

        let class = Arc::new(DocumentClass {
            name: def.name.clone(),
            kind: def.kind,
            parent: def.parent.clone(),
            abstract_class: def.abstract_class,
            key_fields,
            fields,
            uniques,
            supporting: RwLock::new(supporting),
            actions,
            engine,
            collection_name: def.collection_name.clone(),
            table_name: def.table_name.clone(),
            fields_map: def.fields_map.clone(),
            versions: Mutex::new(VersionTable::new(capacity)),
            version_listener_active: AtomicBool::new(false),
            address: RwLock::new(HashMap::new()),
        });

        self.link_dependencies(&class);
        self.by_name.insert(class.name.clone(), self.classes.len());
        self.classes.push(Arc::clone(&class));
        log::debug!(
            "registered {:?} class {} ({} fields, {} unique groups, engine {})",
            class.kind,
            class.name,
            class.fields.len(),
            class.uniques.len(),
            class.engine.name()
        );
        Ok(class)
    }

    /// Record `class` as dependent on the target of each of its dependent
    /// external fields and on every known subclass of that target.
    fn link_dependencies(&self, class: &Arc<DocumentClass>) {
        for (name, field) in &class.fields {
            if !is_dependent_external(field.as_ref()) {
                continue;
            }
            let (Some(target), Some(field_map)) = (field.target(), field.field_map()) else {
                continue;
            };
            let known = self.classes.iter().chain(std::iter::once(class));
            for supporter in known.filter(|c| c.is_subclass_of(target)) {
                supporter.add_supporting(&class.name, field_map);
                log::trace!("{} supports {}.{}", supporter.name, class.name, name);
            }
        }
    }

    pub fn get(&self, name: &str) -> DocResult<Arc<DocumentClass>> {
        self.by_name
            .get(name)
            .and_then(|index| self.classes.get(*index))
            .cloned()
            .ok_or_else(|| DocumentError::UnknownClass(name.to_string()))
    }

    pub fn classes(&self) -> &[Arc<DocumentClass>] {
        &self.classes
    }

    /// Registered subclasses of a class, the class itself included
    pub fn subclasses(&self, class: &DocumentClass) -> Vec<Arc<DocumentClass>> {
        self.classes.iter().filter(|c| c.is_subclass_of(class)).cloned().collect()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Arc<DocumentClass>> {
        self.classes.iter().filter(|c| c.kind == ClassKind::Document)
    }
}

fn is_dependent_external(field: &dyn Field) -> bool {
    field.is_kind("external") && field.options().dependent && !field.is_list()
}

/// Parent fields first; a redeclared name keeps its position with the new field
fn flatten_fields(def: &ClassDef) -> DocResult<Vec<(String, Arc<dyn Field>)>> {
    let mut fields: Vec<(String, Arc<dyn Field>)> =
        def.parent.as_ref().map(|p| p.fields.clone()).unwrap_or_default();
    for (name, field) in &def.fields {
        if name.is_empty() || name.starts_with('_') {
            return Err(DocumentError::Registration(format!(
                "field name {:?} of {} is reserved",
                name, def.name
            )));
        }
        match fields.iter_mut().find(|(existing, _)| *existing == *name) {
            Some(slot) => slot.1 = Arc::clone(field),
            None => fields.push((name.clone(), Arc::clone(field))),
        }
    }
    Ok(fields)
}

fn derive_uniques(fields: &[(String, Arc<dyn Field>)], key_fields: &[String]) -> Vec<Vec<String>> {
    let mut uniques = Vec::new();
    for (name, field) in fields {
        let options = field.options();
        if options.unique {
            uniques.push(vec![name.clone()]);
        }
        if !options.unique_with.is_empty() {
            let mut group = vec![name.clone()];
            group.extend(options.unique_with.iter().cloned());
            uniques.push(group);
        }
        if key_fields.first() == Some(name) {
            uniques.push(key_fields.to_vec());
        }
    }
    uniques
}
