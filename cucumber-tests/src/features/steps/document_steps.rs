use crate::features::world::DocfieldWorld;
use cucumber::{given, then, when};
use docfield_core::{DisplayOptions, DocumentError};
use serde_json::Value;

fn parse(json: &str) -> Value {
    serde_json::from_str(json).expect("step argument must be JSON")
}

#[given("the shop classes")]
async fn given_shop_classes(world: &mut DocfieldWorld) {
    world.register_shop().expect("shop classes must register");
}

#[given(expr = "a stored {string} from {string}")]
async fn given_stored_document(world: &mut DocfieldWorld, class: String, json: String) {
    world.store_document(&class, &json).expect("document must be stored");
}

#[when(expr = "I create an {string} from {string}")]
async fn when_create(world: &mut DocfieldWorld, class: String, json: String) {
    let doc = world.create(&class, &json).expect("document must build");
    world.document = Some(doc);
}

#[when("I validate the document")]
async fn when_validate(world: &mut DocfieldWorld) {
    let doc = world.document.as_mut().expect("no document");
    world.last_error = doc.validate().err();
}

#[when("I save and reload the document")]
async fn when_reload(world: &mut DocfieldWorld) {
    world.reload().expect("round trip through the store");
}

#[when("I display the document eagerly")]
async fn when_display_eager(world: &mut DocfieldWorld) {
    let doc = world.document.as_mut().expect("no document");
    world.display = Some(doc.get_display_data(&DisplayOptions::eager()).expect("display"));
}

#[when("I display the document lazily")]
async fn when_display_lazy(world: &mut DocfieldWorld) {
    let doc = world.document.as_mut().expect("no document");
    world.display = Some(doc.get_display_data(&DisplayOptions::default()).expect("display"));
}

#[then("validation succeeds")]
async fn then_valid(world: &mut DocfieldWorld) {
    assert!(world.last_error.is_none(), "unexpected error: {:?}", world.last_error);
}

#[then(expr = "validation fails naming {string}")]
async fn then_required(world: &mut DocfieldWorld, field: String) {
    match &world.last_error {
        Some(DocumentError::RequiredField(name)) => assert_eq!(name, &field),
        other => panic!("expected a required field error, got {other:?}"),
    }
}

#[then(expr = "validation fails with a dependent check on {string}")]
async fn then_dependent(world: &mut DocfieldWorld, field: String) {
    match &world.last_error {
        Some(DocumentError::DependentCheck { field: name, .. }) => assert_eq!(name, &field),
        other => panic!("expected a dependent check error, got {other:?}"),
    }
}

#[then(expr = "the calculated id decodes to {string}")]
async fn then_id_round_trip(world: &mut DocfieldWorld, json: String) {
    let doc = world.document.as_ref().expect("no document");
    let doc_id = doc.calculate_id().expect("id").expect("class has key fields");
    assert!(!doc_id.is_empty());
    let decoded = doc.class().id_to_dict(&doc_id).expect("id decodes");
    assert_eq!(Value::Object(decoded), parse(&json));
}

#[then(expr = "the unknown field {string} is {string}")]
async fn then_unknown_field(world: &mut DocfieldWorld, name: String, json: String) {
    let doc = world.document.as_ref().expect("no document after reload");
    assert_eq!(doc.unknown().get(&name), Some(&parse(&json)));
    let stored = world.db_form().expect("db form");
    assert_eq!(stored.get(&name), Some(&parse(&json)));
}

#[then(expr = "the displayed {string} has {string} equal to {string}")]
async fn then_display_detail(world: &mut DocfieldWorld, field: String, key: String, json: String) {
    let display = world.display.as_ref().expect("nothing displayed");
    assert_eq!(display[&field][&key], parse(&json));
}

#[then(expr = "the displayed {string} is a lazy guide for {string}")]
async fn then_display_guide(world: &mut DocfieldWorld, field: String, class: String) {
    let display = world.display.as_ref().expect("nothing displayed");
    assert_eq!(display[&field]["_class"], Value::String(class));
    assert_eq!(display[&field]["_mode"], Value::String("lazy".to_string()));
}
