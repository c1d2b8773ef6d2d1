use crate::engine::{DocumentStore, RamEngine};
use crate::field::{
    EmbeddedDocumentField, EmailField, ExternalField, FieldBuilder, IntField, ListField, ReferenceField,
    StringField,
};
use crate::schema::{ClassDef, DocumentClass, Registry};
use crate::value::Payload;
use crate::Document;
use serde_json::Value;
use std::sync::Arc;

// --- Shared fixtures ---

pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// `Order` keyed by `order_id` with a required `amount`
pub fn order_class(registry: &mut Registry) -> Arc<DocumentClass> {
    registry
        .register(
            ClassDef::document("Order")
                .key_fields(["order_id"])
                .field("order_id", StringField::new())
                .field("amount", IntField::new().required()),
        )
        .unwrap()
}

/// A small shop whose classes share one in-memory store
pub struct Shop {
    pub registry: Registry,
    pub store: Arc<RamEngine>,
    pub customer: Arc<DocumentClass>,
    pub address: Arc<DocumentClass>,
    pub order: Arc<DocumentClass>,
}

impl Shop {
    pub fn save(&self, class: &Arc<DocumentClass>, value: Value) -> Document {
        let doc = Document::new(class, payload(value)).unwrap();
        let id = self.store.create(&doc).unwrap();
        let mut saved = doc;
        saved.set_id(Some(id));
        saved
    }
}

pub fn shop() -> Shop {
    let store = Arc::new(RamEngine::new("ram"));
    let mut registry = Registry::new().with_engine(store.clone());
    let customer = registry
        .register(
            ClassDef::document("Customer")
                .key_fields(["customer_id"])
                .field("customer_id", StringField::new())
                .field("name", StringField::new())
                .field("email", EmailField::new()),
        )
        .unwrap();
    let address = registry
        .register(
            ClassDef::embedded("Address")
                .field("street", StringField::new())
                .field("city", StringField::new().required()),
        )
        .unwrap();
    let order = registry
        .register(
            ClassDef::document("Order")
                .key_fields(["order_id"])
                .field("order_id", StringField::new())
                .field("amount", IntField::new().required())
                .field("customer_id", StringField::new())
                .field("customer", ExternalField::new(&customer, [("customer_id", "customer_id")]).dependent())
                .field("buyer", ReferenceField::new(&customer))
                .field("address", EmbeddedDocumentField::new(&address))
                .field("tags", ListField::new(StringField::new())),
        )
        .unwrap();
    Shop { registry, store, customer, address, order }
}
