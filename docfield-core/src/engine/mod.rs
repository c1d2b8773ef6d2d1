//! Storage engine abstraction
//!
//! An engine supplies per-kind value codecs, capability flags and, optionally,
//! a [`DocumentStore`] used to resolve reference and external fields. It also
//! owns the shared parsing rules for query and update key suffixes
//! (`price__gt__`, `tags__append__`, ...).

pub mod base;
pub mod codec;
pub mod ram;

pub use base::BaseEngine;
pub use codec::{Codec, CodecPair, CodecTable};
pub use ram::RamEngine;

use crate::acl::Acl;
use crate::document::Document;
use crate::error::DocResult;
use crate::schema::DocumentClass;
use crate::value::{Batch, Payload};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Capability flags. The document core never enforces these; it only declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Documents must have their key fields set to be saved
    pub key_required: bool,
    /// Unknown fields are written back to the store
    pub support_unknown: bool,
    pub engine_scope_check: bool,
    pub engine_unique_check: bool,
    pub engine_foreign_key_check: bool,
    /// Search may be split into a scan and a fetch phase
    pub scan_and_fetch: bool,
    pub store_embedded_as_table: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            key_required: false,
            support_unknown: true,
            engine_scope_check: false,
            engine_unique_check: false,
            engine_foreign_key_check: false,
            scan_and_fetch: false,
            store_embedded_as_table: false,
        }
    }
}

/// Comparison operator of a search key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
    Eq,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Ne => "!=",
            Operator::Eq => "==",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOp {
    Append,
    Remove,
    Delete,
}

pub const OPERATORS: [(&str, Operator); 6] = [
    ("__lt__", Operator::Lt),
    ("__le__", Operator::Le),
    ("__gt__", Operator::Gt),
    ("__ge__", Operator::Ge),
    ("__ne__", Operator::Ne),
    ("__eq__", Operator::Eq),
];

pub const ORDER_TYPES: [(&str, Order); 2] = [("__asc__", Order::Asc), ("__desc__", Order::Desc)];

pub const UPDATE_TYPES: [(&str, UpdateOp); 3] = [
    ("__append__", UpdateOp::Append),
    ("__remove__", UpdateOp::Remove),
    ("__delete__", UpdateOp::Delete),
];

/// Parsed search key. Exactly one of `operator` and `order` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOption {
    pub field: String,
    pub operator: Option<Operator>,
    pub order: Option<Order>,
}

/// Parsed update key. `op == None` means replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOption {
    pub field: String,
    pub op: Option<UpdateOp>,
}

fn field_path(field: &str) -> String {
    field.replace("__", ".")
}

pub fn parse_search_option(key: &str) -> SearchOption {
    let mut field = key;
    let mut operator = Some(Operator::Eq);
    let mut order = None;
    if let Some((suffix, op)) = OPERATORS.iter().find(|(suffix, _)| key.ends_with(suffix)) {
        operator = Some(*op);
        field = &key[..key.len() - suffix.len()];
    }
    if let Some((suffix, ord)) = ORDER_TYPES.iter().find(|(suffix, _)| key.ends_with(suffix)) {
        operator = None;
        order = Some(*ord);
        field = &key[..key.len() - suffix.len()];
    }
    SearchOption { field: field_path(field), operator, order }
}

pub fn parse_update_option(key: &str) -> UpdateOption {
    match UPDATE_TYPES.iter().find(|(suffix, _)| key.ends_with(suffix)) {
        Some((suffix, op)) => UpdateOption {
            field: field_path(&key[..key.len() - suffix.len()]),
            op: Some(*op),
        },
        None => UpdateOption { field: field_path(key), op: None },
    }
}

/// Document persistence used to resolve runtime fields
pub trait DocumentStore: Send + Sync {
    /// Load one document by id, honouring the caller's acl. Lookups made
    /// within a batch carry its marker.
    fn fetch(
        &self,
        class: &Arc<DocumentClass>,
        doc_id: &str,
        acl: Option<&Acl>,
        batch: Option<&Batch>,
    ) -> DocResult<Option<Document>>;

    /// Documents whose fields equal the query values (strings, or lists of
    /// strings meaning "any of")
    fn search(
        &self,
        class: &Arc<DocumentClass>,
        query: &Payload,
        limit: usize,
        acl: Option<&Acl>,
        batch: Option<&Batch>,
    ) -> DocResult<Vec<Document>>;

    /// Persist a document and return its id
    fn create(&self, doc: &Document) -> DocResult<String>;

    fn delete(&self, class: &Arc<DocumentClass>, doc_id: &str) -> DocResult<bool>;
}

pub trait Engine: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Key under which document classes keep this engine's address
    fn param(&self) -> &str {
        self.name()
    }

    fn encoders(&self) -> &CodecTable;

    fn decoders(&self) -> &CodecTable;

    fn capabilities(&self) -> &Capabilities;

    fn store(&self) -> Option<&dyn DocumentStore> {
        None
    }

    fn get_encoder(&self, field: &[&'static str], inner: Option<&[&'static str]>) -> CodecPair {
        CodecPair {
            outer: self.encoders().resolve(field),
            inner: inner.and_then(|lineage| self.encoders().resolve(lineage)),
        }
    }

    fn get_decoder(&self, field: &[&'static str], inner: Option<&[&'static str]>) -> CodecPair {
        CodecPair {
            outer: self.decoders().resolve(field),
            inner: inner.and_then(|lineage| self.decoders().resolve(lineage)),
        }
    }

    fn parse_search_option(&self, key: &str) -> SearchOption {
        parse_search_option(key)
    }

    fn parse_update_option(&self, key: &str) -> UpdateOption {
        parse_update_option(key)
    }
}
