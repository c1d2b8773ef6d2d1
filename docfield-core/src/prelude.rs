//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use docfield_core::prelude::*;
//! ```

// === Classes and documents ===
pub use crate::document::{ActionSpec, DbOptions, Document, ScopeConstraint, ScopeOp};
pub use crate::schema::{ClassDef, DocumentClass, Registry};

// === Fields ===
pub use crate::field::{
    BooleanField, DateTimeField, DisplayOptions, EmailField, EmbeddedDocumentField, ExternalField,
    Field, FieldBuilder, FloatField, IntField, ListField, ReferenceField, StringField,
};

// === Engines ===
pub use crate::engine::{BaseEngine, Capabilities, DocumentStore, Engine, RamEngine};

// === Values ===
pub use crate::acl::{Acl, AclItem};
pub use crate::catalog::Catalog;
pub use crate::value::{Batch, FieldValue, Payload, Runtime};

// === Errors and configuration ===
pub use crate::config::DocfieldConfig;
pub use crate::error::{DocResult, DocumentError};
