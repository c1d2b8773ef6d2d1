//! Per-engine encoder/decoder registry
//!
//! Codecs are registered against field kinds. A lookup walks the field's
//! lineage: exact kind first, then the first registered ancestor kind. Hits and
//! misses are both cached; a missing codec means the value passes verbatim.

use crate::error::DocResult;
use scc::hash_map::Entry;
use scc::HashMap as SccHashMap;
use serde_json::Value;
use std::fmt;

/// Value transformation between internal and database forms
pub type Codec = fn(Value) -> DocResult<Value>;

/// Codec of a field and, for composite fields, of its element field
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecPair {
    pub outer: Option<Codec>,
    pub inner: Option<Codec>,
}

impl CodecPair {
    pub fn single(outer: Option<Codec>) -> Self {
        Self { outer, inner: None }
    }

    /// Codec pair handed to the element field of a composite
    pub fn for_inner(&self) -> Self {
        Self { outer: self.inner, inner: None }
    }

    /// Apply the outer codec, identity when none is registered
    pub fn apply(&self, value: Value) -> DocResult<Value> {
        match self.outer {
            Some(codec) => codec(value),
            None => Ok(value),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.outer.is_none() && self.inner.is_none()
    }
}

pub struct CodecTable {
    entries: Vec<(&'static str, Codec)>,
    cache: SccHashMap<&'static str, Option<Codec>>,
}

impl CodecTable {
    pub fn new() -> Self {
        Self { entries: Vec::new(), cache: SccHashMap::new() }
    }

    /// Register a codec for a field kind. Earlier registrations win ancestor lookups.
    pub fn register(&mut self, kind: &'static str, codec: Codec) {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = codec,
            None => self.entries.push((kind, codec)),
        }
        self.cache = SccHashMap::new();
    }

    pub fn with(mut self, kind: &'static str, codec: Codec) -> Self {
        self.register(kind, codec);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the codec for a lineage (most specific kind first)
    pub fn resolve(&self, lineage: &[&'static str]) -> Option<Codec> {
        let kind = *lineage.first()?;
        if let Some(Entry::Occupied(o)) = self.cache.try_entry(kind) {
            return *o.get();
        }

        let exact = self.entries.iter().find(|(k, _)| *k == kind).map(|(_, c)| *c);
        let resolved = exact.or_else(|| {
            self.entries
                .iter()
                .find(|(k, _)| lineage[1..].contains(k))
                .map(|(_, c)| *c)
        });
        log::trace!(
            "codec lookup for {} resolved to {}",
            kind,
            if resolved.is_some() { "a registered codec" } else { "identity" }
        );
        // Concurrent first lookups compute the same answer; a lost insert is harmless.
        let _ = self.cache.insert_sync(kind, resolved);
        resolved
    }

    pub fn cached(&self, kind: &'static str) -> bool {
        self.cache.contains_sync(&kind)
    }
}

impl Default for CodecTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecTable")
            .field("kinds", &self.entries.iter().map(|(k, _)| *k).collect::<Vec<_>>())
            .finish()
    }
}
