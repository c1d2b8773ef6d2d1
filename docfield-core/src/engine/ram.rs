//! In-memory engine with a document store
//!
//! Documents are kept in their database form, so every fetch goes through the
//! engine's decoders the same way a real backend would.

use super::{BaseEngine, Capabilities, CodecTable, DocumentStore, Engine};
use crate::acl::Acl;
use crate::config::ModelConfig;
use crate::document::{DbOptions, Document};
use crate::error::{DocResult, DocumentError};
use crate::schema::DocumentClass;
use crate::value::{query_text, Batch, Payload, ID_KEY};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

type Tables = BTreeMap<String, BTreeMap<String, Payload>>;

/// Lookups issued under each batch marker, in arrival order
type BatchLog = HashMap<uuid::Uuid, Vec<String>>;

#[derive(Debug)]
pub struct RamEngine {
    base: BaseEngine,
    ignore_unknown: bool,
    tables: RwLock<Tables>,
    batches: RwLock<BatchLog>,
}

impl RamEngine {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_base(BaseEngine::new(name))
    }

    /// Wrap a configured base engine (codecs, capabilities) with a store
    pub fn from_base(base: BaseEngine) -> Self {
        Self {
            base,
            ignore_unknown: false,
            tables: RwLock::new(BTreeMap::new()),
            batches: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(name: impl Into<String>, config: &ModelConfig) -> Self {
        Self::new(name).with_ignore_unknown(config.ignore_unknown)
    }

    /// Drop unknown fields when persisting
    pub fn with_ignore_unknown(mut self, ignore_unknown: bool) -> Self {
        self.ignore_unknown = ignore_unknown;
        self
    }

    /// Number of stored documents of a class
    pub fn count(&self, class: &DocumentClass) -> DocResult<usize> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.get(class.name()).map_or(0, BTreeMap::len))
    }

    /// Lookups made under a batch: `Class/doc_id` for fetches, `Class?query`
    /// for searches
    pub fn batch_lookups(&self, batch: &Batch) -> DocResult<Vec<String>> {
        let batches = self.batches.read().map_err(|_| poisoned())?;
        Ok(batches.get(&batch.id).cloned().unwrap_or_default())
    }

    /// Forget the lookups of a finished batch
    pub fn close_batch(&self, batch: &Batch) -> DocResult<()> {
        self.batches.write().map_err(|_| poisoned())?.remove(&batch.id);
        Ok(())
    }

    fn record(&self, batch: Option<&Batch>, lookup: String) -> DocResult<()> {
        let Some(batch) = batch else {
            return Ok(());
        };
        log::trace!("batch {} looks up {}", batch.id, lookup);
        self.batches.write().map_err(|_| poisoned())?.entry(batch.id).or_default().push(lookup);
        Ok(())
    }

    /// Decode a stored payload; the document joins the batch it was loaded in
    fn load(&self, class: &Arc<DocumentClass>, payload: Payload, batch: Option<&Batch>) -> DocResult<Document> {
        let mut doc = Document::from_db(class, payload, Some(self))?;
        doc.set_batch(batch.cloned());
        Ok(doc)
    }

    fn readable(class: &DocumentClass, doc_id: &str, acl: Option<&Acl>) -> bool {
        acl.map_or(true, |acl| acl.allows(&format!("{}/key/{}", class.name(), doc_id), "read"))
    }
}

fn poisoned() -> DocumentError {
    DocumentError::Store("ram store lock poisoned".to_string())
}

fn matches(payload: &Payload, query: &Payload) -> bool {
    query.iter().all(|(key, wanted)| {
        let Some(stored) = payload.get(key) else {
            return false;
        };
        let text = query_text(stored);
        match wanted {
            Value::Array(options) => options.iter().any(|o| query_text(o) == text),
            other => query_text(other) == text,
        }
    })
}

impl Engine for RamEngine {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn param(&self) -> &str {
        self.base.param()
    }

    fn encoders(&self) -> &CodecTable {
        self.base.encoders()
    }

    fn decoders(&self) -> &CodecTable {
        self.base.decoders()
    }

    fn capabilities(&self) -> &Capabilities {
        self.base.capabilities()
    }

    fn store(&self) -> Option<&dyn DocumentStore> {
        Some(self)
    }
}

impl DocumentStore for RamEngine {
    fn fetch(
        &self,
        class: &Arc<DocumentClass>,
        doc_id: &str,
        acl: Option<&Acl>,
        batch: Option<&Batch>,
    ) -> DocResult<Option<Document>> {
        self.record(batch, format!("{}/{}", class.name(), doc_id))?;
        if !Self::readable(class, doc_id, acl) {
            log::debug!("acl denies read of {}/{}", class.name(), doc_id);
            return Ok(None);
        }
        let payload = {
            let tables = self.tables.read().map_err(|_| poisoned())?;
            tables.get(class.name()).and_then(|table| table.get(doc_id)).cloned()
        };
        match payload {
            Some(payload) => Ok(Some(self.load(class, payload, batch)?)),
            None => {
                log::trace!("{}/{} not found in {}", class.name(), doc_id, self.name());
                Ok(None)
            }
        }
    }

    fn search(
        &self,
        class: &Arc<DocumentClass>,
        query: &Payload,
        limit: usize,
        acl: Option<&Acl>,
        batch: Option<&Batch>,
    ) -> DocResult<Vec<Document>> {
        self.record(batch, format!("{}?{}", class.name(), Value::Object(query.clone())))?;
        let hits: Vec<Payload> = {
            let tables = self.tables.read().map_err(|_| poisoned())?;
            let Some(table) = tables.get(class.name()) else {
                return Ok(Vec::new());
            };
            let found = table
                .iter()
                .filter(|(id, payload)| matches(payload, query) && Self::readable(class, id, acl))
                .map(|(_, payload)| payload.clone());
            if limit == 0 {
                found.collect()
            } else {
                found.take(limit).collect()
            }
        };
        hits.into_iter().map(|payload| self.load(class, payload, batch)).collect()
    }

    fn create(&self, doc: &Document) -> DocResult<String> {
        let doc_id = match doc.id() {
            Some(id) => id.to_string(),
            None => doc.calculate_id()?.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        };
        let mut payload = doc.to_db(&DbOptions {
            ignore_unknown: self.ignore_unknown,
            engine: Some(self),
            ..Default::default()
        })?;
        payload.insert(ID_KEY.to_string(), Value::String(doc_id.clone()));
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables.entry(doc.class().name().to_string()).or_default().insert(doc_id.clone(), payload);
        log::debug!("stored {}/{} in {}", doc.class().name(), doc_id, self.name());
        Ok(doc_id)
    }

    fn delete(&self, class: &Arc<DocumentClass>, doc_id: &str) -> DocResult<bool> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        Ok(tables.get_mut(class.name()).and_then(|table| table.remove(doc_id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_matching_uses_text_forms() {
        let payload = json!({"customer_id": "C1", "qty": 3}).as_object().cloned().unwrap();
        assert!(matches(&payload, json!({"customer_id": "C1"}).as_object().unwrap()));
        assert!(matches(&payload, json!({"qty": "3"}).as_object().unwrap()));
        assert!(matches(&payload, json!({"customer_id": ["C2", "C1"]}).as_object().unwrap()));
        assert!(!matches(&payload, json!({"customer_id": "C2"}).as_object().unwrap()));
        assert!(!matches(&payload, json!({"missing": "x"}).as_object().unwrap()));
    }
}
