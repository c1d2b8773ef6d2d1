use cucumber::World;
use docfield_core::engine::{DocumentStore, RamEngine};
use docfield_core::field::{ExternalField, FieldBuilder, IntField, StringField};
use docfield_core::{ClassDef, DbOptions, Document, DocumentError, Payload, Registry};
use serde_json::Value;
use std::sync::Arc;

/// Scenario state: one registry over one in-memory store, and the document
/// under test.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct DocfieldWorld {
    pub store: Arc<RamEngine>,
    pub registry: Registry,
    pub document: Option<Document>,
    pub display: Option<Payload>,
    pub last_error: Option<DocumentError>,
}

impl DocfieldWorld {
    pub fn new() -> Self {
        let store = Arc::new(RamEngine::new("ram"));
        let registry = Registry::new().with_engine(store.clone());
        Self { store, registry, document: None, display: None, last_error: None }
    }

    pub fn register_shop(&mut self) -> Result<(), DocumentError> {
        let customer = self.registry.register(
            ClassDef::document("Customer")
                .key_fields(["customer_id"])
                .field("customer_id", StringField::new())
                .field("name", StringField::new()),
        )?;
        self.registry.register(
            ClassDef::document("Order")
                .key_fields(["order_id"])
                .field("order_id", StringField::new())
                .field("amount", IntField::new().required())
                .field("customer_id", StringField::new())
                .field(
                    "customer",
                    ExternalField::new(&customer, [("customer_id", "customer_id")]).dependent(),
                ),
        )?;
        Ok(())
    }

    pub fn create(&mut self, class: &str, json: &str) -> Result<Document, DocumentError> {
        let class = self.registry.get(class)?;
        match serde_json::from_str(json)? {
            Value::Object(payload) => Document::new(&class, payload),
            other => Err(DocumentError::invalid("", format!("expected a JSON object, got {other}"))),
        }
    }

    pub fn store_document(&mut self, class: &str, json: &str) -> Result<String, DocumentError> {
        let doc = self.create(class, json)?;
        self.store.create(&doc)
    }

    /// Persist the current document and replace it with what the store returns
    pub fn reload(&mut self) -> Result<(), DocumentError> {
        let doc = self.document.take().ok_or(DocumentError::MissingId)?;
        let doc_id = self.store.create(&doc)?;
        let fetched = self.store.fetch(doc.class(), &doc_id, None, None)?;
        self.document = fetched;
        Ok(())
    }

    pub fn db_form(&self) -> Result<Payload, DocumentError> {
        let doc = self.document.as_ref().ok_or(DocumentError::MissingId)?;
        doc.to_db(&DbOptions::default())
    }
}
