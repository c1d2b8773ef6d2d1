//! Per-class LRU table of document version codes

use crate::error::{DocResult, DocumentError};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
pub struct VersionTable {
    capacity: usize,
    tick: u64,
    entries: HashMap<String, (String, u64)>,
    recency: BTreeMap<u64, String>,
}

impl VersionTable {
    /// `capacity == 0` disables the table: every call yields a fresh code
    pub fn new(capacity: usize) -> Self {
        Self { capacity, tick: 0, entries: HashMap::new(), recency: BTreeMap::new() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.entries.contains_key(doc_id)
    }

    /// Version code of a document, allocating one on first request
    pub fn get(&mut self, doc_id: &str) -> DocResult<String> {
        if doc_id.is_empty() {
            return Err(DocumentError::MissingId);
        }
        if self.capacity == 0 {
            return Ok(new_code());
        }
        let code = match self.entries.get(doc_id) {
            Some((code, _)) => code.clone(),
            None => {
                self.make_room();
                new_code()
            }
        };
        self.store(doc_id, code.clone());
        Ok(code)
    }

    /// Replace the version code of a document, a fresh one if none is given
    pub fn set(&mut self, doc_id: &str, code: Option<String>) -> DocResult<String> {
        if doc_id.is_empty() {
            return Err(DocumentError::MissingId);
        }
        if self.capacity == 0 {
            return Ok(new_code());
        }
        let code = code.unwrap_or_else(new_code);
        if !self.entries.contains_key(doc_id) {
            self.make_room();
        }
        self.store(doc_id, code.clone());
        Ok(code)
    }

    pub fn purge(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn make_room(&mut self) {
        while self.entries.len() >= self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    fn store(&mut self, doc_id: &str, code: String) {
        self.tick += 1;
        if let Some((_, previous)) = self.entries.insert(doc_id.to_string(), (code, self.tick)) {
            self.recency.remove(&previous);
        }
        self.recency.insert(self.tick, doc_id.to_string());
    }
}

fn new_code() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_until_set() {
        let mut table = VersionTable::new(4);
        let first = table.get("a").unwrap();
        assert_eq!(table.get("a").unwrap(), first);
        let replaced = table.set("a", None).unwrap();
        assert_ne!(replaced, first);
        assert_eq!(table.get("a").unwrap(), replaced);
        assert_eq!(table.set("a", Some("v2".to_string())).unwrap(), "v2");
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut table = VersionTable::new(2);
        let a = table.get("a").unwrap();
        table.get("b").unwrap();
        // touching "a" makes "b" the oldest
        assert_eq!(table.get("a").unwrap(), a);
        table.get("c").unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.contains("a"));
        assert!(!table.contains("b"));
        assert!(table.contains("c"));
    }

    #[test]
    fn zero_capacity_never_caches() {
        let mut table = VersionTable::new(0);
        assert_ne!(table.get("a").unwrap(), table.get("a").unwrap());
        assert!(table.is_empty());
    }

    #[test]
    fn missing_id_is_an_error() {
        let mut table = VersionTable::new(2);
        assert!(matches!(table.get(""), Err(DocumentError::MissingId)));
        assert!(matches!(table.set("", None), Err(DocumentError::MissingId)));
        table.get("x").unwrap();
        table.purge();
        assert!(table.is_empty());
    }
}
