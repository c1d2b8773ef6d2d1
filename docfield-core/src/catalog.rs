//! Field selection and eagerness catalog
//!
//! JSON shape: `{"field1": null, "field2": false, "field3": {"sub1": true}}`.
//! `null` keeps the global lazy setting, a boolean overrides it, an object
//! selects sub-fields of a compound field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Nested(Catalog),
    Flag(Option<bool>),
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a field, keeping the global lazy setting
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), CatalogEntry::Flag(None));
        self
    }

    /// Select a field with an explicit lazy override
    pub fn with_lazy(mut self, name: impl Into<String>, lazy: bool) -> Self {
        self.entries.insert(name.into(), CatalogEntry::Flag(Some(lazy)));
        self
    }

    /// Select sub-fields of a compound field
    pub fn nested(mut self, name: impl Into<String>, catalog: Catalog) -> Self {
        self.entries.insert(name.into(), CatalogEntry::Nested(catalog));
        self
    }

    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    /// Sub-catalog of a compound field, if the entry is nested
    pub fn sub(&self, name: &str) -> Option<&Catalog> {
        match self.entries.get(name) {
            Some(CatalogEntry::Nested(catalog)) => Some(catalog),
            _ => None,
        }
    }

    /// Lazy status of a field: an explicit flag wins, otherwise the global setting
    pub fn lazy_status(&self, name: &str, lazy: bool) -> bool {
        match self.entries.get(name) {
            Some(CatalogEntry::Flag(Some(flag))) => *flag,
            _ => lazy,
        }
    }

    /// Flatten to dotted paths: `["field1", "field3.sub1"]`
    pub fn to_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for (name, entry) in &self.entries {
            match entry {
                CatalogEntry::Nested(sub) => {
                    paths.extend(sub.to_paths().into_iter().map(|path| format!("{name}.{path}")));
                }
                CatalogEntry::Flag(_) => paths.push(name.clone()),
            }
        }
        paths
    }
}

/// Treat an empty catalog the same as no catalog
pub(crate) fn effective(catalog: Option<&Catalog>) -> Option<&Catalog> {
    catalog.filter(|c| !c.is_empty())
}

/// Lazy status when the catalog may be absent
pub(crate) fn lazy_status(catalog: Option<&Catalog>, name: &str, lazy: bool) -> bool {
    catalog.map_or(lazy, |c| c.lazy_status(name, lazy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_flags_and_nesting() {
        let catalog =
            Catalog::from_value(json!({"a": null, "b": false, "c": {"d": true}})).unwrap();
        assert!(catalog.contains("a"));
        assert!(catalog.lazy_status("a", true));
        assert!(!catalog.lazy_status("b", true));
        assert!(catalog.lazy_status("c", true));
        assert!(!catalog.lazy_status("c", false));
        assert_eq!(catalog.sub("c").map(|c| c.lazy_status("d", false)), Some(true));
        assert!(catalog.sub("a").is_none());
    }

    #[test]
    fn flattens_to_dotted_paths() {
        let catalog = Catalog::new()
            .field("field1")
            .nested("field2", Catalog::new().field("field3").nested("x", Catalog::new().field("y")));
        assert_eq!(catalog.to_paths(), vec!["field1", "field2.field3", "field2.x.y"]);
    }
}
