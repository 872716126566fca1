//! JSON parsing into [`JsonTree`].
//!
//! Parsing goes through `serde_json` with arbitrary precision enabled, so
//! every number is seen as the text it was written as and classified into
//! the narrowest [`JsonNumber`] kind.
//!
//! # Example
//!
//! ```
//! use fieldquill::json::parse_json;
//!
//! let tree = parse_json(r#"{"name": "Alice", "age": 30}"#).unwrap();
//! let name_node = tree.get_node(&[0]).unwrap();
//! assert!(!name_node.is_modified());
//! ```

use indexmap::IndexMap;
use serde_json::Value as SerdeValue;

use super::node::{JsonNode, JsonNumber, JsonValue};
use super::tree::JsonTree;
use crate::error::BackendError;

/// Options controlling how JSON text becomes a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonParseOptions {
    /// Classify fractional numbers as decimals instead of doubles.
    pub floats_as_decimal: bool,
}

/// Parses a JSON document with default options.
///
/// # Errors
///
/// Returns [`BackendError::Json`] if the text is not valid JSON.
pub fn parse_json(content: &str) -> Result<JsonTree, BackendError> {
    parse_json_with(content, JsonParseOptions::default())
}

/// Parses a JSON document.
///
/// # Errors
///
/// Returns [`BackendError::Json`] if the text is not valid JSON.
pub fn parse_json_with(content: &str, options: JsonParseOptions) -> Result<JsonTree, BackendError> {
    let value: SerdeValue = serde_json::from_str(content)?;
    let root = parse_value(&value, options);
    tracing::debug!(bytes = content.len(), "parsed JSON document");
    Ok(JsonTree::new(root))
}

/// Converts a `serde_json::Value` into a `JsonNode`, unmodified.
pub fn parse_value(value: &SerdeValue, options: JsonParseOptions) -> JsonNode {
    let json_value = match value {
        SerdeValue::Null => JsonValue::Null,
        SerdeValue::Bool(b) => JsonValue::Boolean(*b),
        SerdeValue::Number(n) => {
            let text = n.to_string();
            match JsonNumber::from_text(&text, options.floats_as_decimal) {
                Some(number) => JsonValue::Number(number),
                // serde_json accepted it, so this is only reachable for
                // representations we do not classify; keep the text.
                None => JsonValue::Raw(text),
            }
        }
        SerdeValue::String(s) => JsonValue::String(s.clone()),
        SerdeValue::Array(items) => {
            JsonValue::Array(items.iter().map(|item| parse_value(item, options)).collect())
        }
        SerdeValue::Object(map) => {
            let entries: IndexMap<String, JsonNode> = map
                .iter()
                .map(|(key, item)| (key.clone(), parse_value(item, options)))
                .collect();
            JsonValue::Object(entries)
        }
    };
    JsonNode::loaded(json_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_key_order() {
        let tree = parse_json(r#"{"b": 1, "a": 2}"#).unwrap();
        if let JsonValue::Object(entries) = tree.root().value() {
            let keys: Vec<_> = entries.keys().cloned().collect();
            assert_eq!(keys, vec!["b", "a"]);
        } else {
            panic!("expected object root");
        }
    }

    #[test]
    fn test_parse_number_kinds() {
        let tree = parse_json(r#"[1, 3000000000, 1.25, 99999999999999999999]"#).unwrap();
        let kinds: Vec<_> = (0..4)
            .map(|i| tree.get_node(&[i]).unwrap().value().clone())
            .collect();
        assert_eq!(kinds[0], JsonValue::Number(JsonNumber::Integer(1)));
        assert_eq!(kinds[1], JsonValue::Number(JsonNumber::Long(3_000_000_000)));
        assert_eq!(kinds[2], JsonValue::Number(JsonNumber::Double(1.25)));
        assert!(matches!(kinds[3], JsonValue::Number(JsonNumber::BigInteger(_))));
    }

    #[test]
    fn test_parse_decimal_option() {
        let options = JsonParseOptions {
            floats_as_decimal: true,
        };
        let tree = parse_json_with("[1.10]", options).unwrap();
        match tree.get_node(&[0]).unwrap().value() {
            JsonValue::Number(JsonNumber::Decimal(d)) => assert_eq!(d.to_string(), "1.10"),
            other => panic!("expected decimal, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        assert!(matches!(parse_json("{"), Err(BackendError::Json(_))));
    }

    #[test]
    fn test_parsed_tree_is_unmodified() {
        let tree = parse_json(r#"{"a": [1, {"b": null}]}"#).unwrap();
        assert!(!tree.is_modified());
    }
}
