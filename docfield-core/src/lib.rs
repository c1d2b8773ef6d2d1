//! Docfield - Core
//!
//! A document/field modeling library: document classes declared from typed
//! field descriptors, with lazily resolved reference and external fields,
//! composite-key ids, derived unique constraints and three interchangeable
//! forms of every document (raw, display and database).
//!
//! # Architecture
//!
//! - [`field`] - Field descriptors and the [`Field`] protocol
//! - [`schema`] - Class declaration and the bootstrap [`Registry`]
//! - [`document`] - Document instances, validation, serialization and actions
//! - [`engine`] - Pluggable codecs, capability flags and document stores
//! - [`acl`] - Access control lists threaded through lazy resolution
//! - [`config`] / [`logging`] - TOML configuration and logger setup
//!
//! # Example
//!
//! ```rust,ignore
//! use docfield_core::prelude::*;
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! let order = registry.register(
//!     ClassDef::document("Order")
//!         .key_fields(["order_id"])
//!         .field("order_id", StringField::new())
//!         .field("amount", IntField::new().required()),
//! )?;
//! let doc = Document::new(&order, payload)?;
//! let stored = doc.to_db(&DbOptions::default())?;
//! ```

pub mod acl;
pub mod catalog;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod field;
pub mod ids;
pub mod logging;
pub mod schema;
pub mod value;

#[cfg(test)]
pub mod testing;

pub mod prelude;

pub use acl::{Acl, AclItem};
pub use catalog::Catalog;
pub use config::DocfieldConfig;
pub use document::{ActionSpec, DbOptions, Document, ScopeConstraint};
pub use engine::{BaseEngine, DocumentStore, Engine, RamEngine};
pub use error::{DocResult, DocumentError};
pub use field::{DisplayOptions, Field, FieldBuilder};
pub use schema::{ClassDef, DocumentClass, Registry};
pub use value::{Batch, FieldValue, Payload, Runtime};
