use super::{Capabilities, CodecTable, Engine};
use crate::engine::codec::Codec;

/// Engine without a store. Codecs default to identity; callers register the
/// ones their backend needs.
#[derive(Debug)]
pub struct BaseEngine {
    name: String,
    param: Option<String>,
    encoders: CodecTable,
    decoders: CodecTable,
    capabilities: Capabilities,
}

impl BaseEngine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param: None,
            encoders: CodecTable::new(),
            decoders: CodecTable::new(),
            capabilities: Capabilities::default(),
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    pub fn with_encoder(mut self, kind: &'static str, codec: Codec) -> Self {
        self.encoders.register(kind, codec);
        self
    }

    pub fn with_decoder(mut self, kind: &'static str, codec: Codec) -> Self {
        self.decoders.register(kind, codec);
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

impl Default for BaseEngine {
    fn default() -> Self {
        Self::new("BaseEngine")
    }
}

impl Engine for BaseEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn param(&self) -> &str {
        self.param.as_deref().unwrap_or(&self.name)
    }

    fn encoders(&self) -> &CodecTable {
        &self.encoders
    }

    fn decoders(&self) -> &CodecTable {
        &self.decoders
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocResult;
    use serde_json::{json, Value};

    fn to_text(value: Value) -> DocResult<Value> {
        Ok(Value::String(value.to_string()))
    }

    #[test]
    fn pairs_outer_and_inner_codecs() {
        let engine = BaseEngine::new("text").with_encoder("list", to_text).with_encoder("number", to_text);
        let pair = engine.get_encoder(&["list"], Some(&["int", "number"]));
        assert!(pair.outer.is_some());
        assert!(pair.inner.is_some());
        assert_eq!(pair.for_inner().apply(json!(3)).unwrap(), json!("3"));

        let pair = engine.get_encoder(&["string"], None);
        assert!(pair.is_identity());
    }

    #[test]
    fn param_defaults_to_name() {
        assert_eq!(BaseEngine::default().param(), "BaseEngine");
        assert_eq!(BaseEngine::new("x").with_param("db_x").param(), "db_x");
    }
}
