//! Public actions declared on a document class

use super::Document;
use crate::acl::Acl;
use crate::error::{DocResult, DocumentError};
use crate::schema::DocumentClass;
use crate::value::Payload;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type InstanceAction = fn(&mut Document, Option<&Acl>, Payload) -> DocResult<Value>;
pub type CollectionAction = fn(&Arc<DocumentClass>, Option<&Acl>, Payload) -> DocResult<Value>;

#[derive(Clone, Copy)]
pub enum ActionHandler {
    Instance(InstanceAction),
    Collection(CollectionAction),
}

/// An action and the names of its input parameters
#[derive(Clone)]
pub struct ActionSpec {
    inputs: Vec<String>,
    handler: ActionHandler,
}

impl ActionSpec {
    pub fn instance<I, S>(inputs: I, handler: InstanceAction) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { inputs: inputs.into_iter().map(Into::into).collect(), handler: ActionHandler::Instance(handler) }
    }

    pub fn collection<I, S>(inputs: I, handler: CollectionAction) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { inputs: inputs.into_iter().map(Into::into).collect(), handler: ActionHandler::Collection(handler) }
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn handler(&self) -> ActionHandler {
        self.handler
    }

    /// Arguments handed to the handler. When the only declared input is
    /// `payload` and the payload has no such key, the whole payload is it.
    pub fn arguments(&self, payload: Option<Payload>) -> Payload {
        let payload = payload.unwrap_or_default();
        if self.inputs.len() == 1 && self.inputs[0] == "payload" && !payload.contains_key("payload") {
            let mut args = Payload::new();
            args.insert("payload".to_string(), Value::Object(payload));
            args
        } else {
            payload
        }
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.handler {
            ActionHandler::Instance(_) => "instance",
            ActionHandler::Collection(_) => "collection",
        };
        f.debug_struct("ActionSpec").field("inputs", &self.inputs).field("scope", &scope).finish()
    }
}

fn unsupported(action: &str, class: &DocumentClass) -> DocumentError {
    DocumentError::UnsupportedAction { action: action.to_string(), class: class.name().to_string() }
}

impl Document {
    /// Run a public instance action
    pub fn action(&mut self, name: &str, acl: Option<&Acl>, payload: Option<Payload>) -> DocResult<Value> {
        let spec = self.class().action(name).cloned();
        match spec {
            Some(spec) => match spec.handler {
                ActionHandler::Instance(handler) => {
                    log::debug!("action {} on {}", name, self.class().name());
                    handler(self, acl, spec.arguments(payload))
                }
                ActionHandler::Collection(_) => Err(unsupported(name, self.class())),
            },
            None => Err(unsupported(name, self.class())),
        }
    }
}

impl DocumentClass {
    /// Run a public collection action
    pub fn collection_action(
        self: &Arc<Self>,
        name: &str,
        acl: Option<&Acl>,
        payload: Option<Payload>,
    ) -> DocResult<Value> {
        match self.action(name).map(|spec| (spec.handler, spec)) {
            Some((ActionHandler::Collection(handler), spec)) => {
                log::debug!("collection action {} on {}", name, self.name());
                handler(self, acl, spec.arguments(payload))
            }
            _ => Err(unsupported(name, self)),
        }
    }
}
