//! Deterministic document ids from ordered key values
//!
//! An id is the URL-safe base64 of the JSON array of key values with the
//! trailing `=` padding stripped. The JSON text uses `", "` and `": "`
//! separators and keeps non-ASCII characters unescaped, so ids stay stable
//! across implementations sharing the same stores.

use crate::error::{DocResult, DocumentError};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// JSON text of the key values as embedded in ids
pub fn key_json(values: &[Value]) -> DocResult<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    values.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| DocumentError::Codec(e.to_string()))
}

/// Encode ordered key values into an id
pub fn encode(values: &[Value]) -> DocResult<String> {
    let text = key_json(values)?;
    let encoded = URL_SAFE.encode(text.as_bytes());
    Ok(encoded.trim_end_matches('=').to_string())
}

/// Decode an id back into the ordered key values.
///
/// Exactly the padding that was stripped is restored before decoding.
pub fn decode(doc_id: &str) -> DocResult<Vec<Value>> {
    let trimmed = doc_id.trim_end_matches('=');
    if trimmed.len() % 4 == 1 {
        return Err(DocumentError::InvalidId(doc_id.to_string()));
    }
    let padding = (4 - trimmed.len() % 4) % 4;
    let padded = format!("{trimmed}{}", "=".repeat(padding));
    let bytes = URL_SAFE.decode(padded.as_bytes())?;
    match serde_json::from_slice(&bytes)? {
        Value::Array(values) => Ok(values),
        _ => Err(DocumentError::InvalidId(doc_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_json_uses_spaced_separators() {
        let text = key_json(&[json!("A1"), json!(2), json!({"a": 1, "b": [1, 2]})]).unwrap();
        assert_eq!(text, r#"["A1", 2, {"a": 1, "b": [1, 2]}]"#);
    }

    #[test]
    fn encodes_known_id() {
        // base64url of `["A1"]` is WyJBMSJd
        assert_eq!(encode(&[json!("A1")]).unwrap(), "WyJBMSJd");
        // `["A"]` needs padding once encoded
        let id = encode(&[json!("A")]).unwrap();
        assert_eq!(id, "WyJBIl0");
        assert_eq!(decode(&id).unwrap(), vec![json!("A")]);
    }

    #[test]
    fn restores_every_padding_length() {
        for key in ["A", "AB", "ABC", "ABCD"] {
            let id = encode(&[json!(key)]).unwrap();
            assert!(!id.ends_with('='));
            assert_eq!(decode(&id).unwrap(), vec![json!(key)]);
        }
    }

    #[test]
    fn keeps_non_ascii_text() {
        let text = key_json(&[json!("café")]).unwrap();
        assert_eq!(text, "[\"café\"]");
        let id = encode(&[json!("café"), json!(1)]).unwrap();
        assert_eq!(decode(&id).unwrap(), vec![json!("café"), json!(1)]);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(decode("A").is_err());
        assert!(decode("!!!!").is_err());
        // valid base64 of a JSON object, not an array
        let object_id = URL_SAFE.encode(b"{}");
        assert!(matches!(decode(&object_id), Err(DocumentError::InvalidId(_))));
    }
}
