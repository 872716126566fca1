//! JSON serialization of [`JsonNode`] trees.

use super::node::{JsonNode, JsonValue};

/// Recursively serializes a JSON node to a formatted string.
///
/// Arrays and objects holding only scalars are written on one line when the
/// result stays under 80 characters.
pub fn serialize_node(node: &JsonNode, indent_size: usize, current_depth: usize) -> String {
    let indent = " ".repeat(indent_size * current_depth);
    let next_indent = " ".repeat(indent_size * (current_depth + 1));

    match node.value() {
        JsonValue::Object(entries) => {
            if entries.is_empty() {
                return "{}".to_string();
            }

            if entries.values().all(|n| !n.value().is_container()) {
                let compact = serialize_node_spaced(node);
                if compact.len() <= 80 {
                    return compact;
                }
            }

            let mut result = "{\n".to_string();
            for (i, (key, value)) in entries.iter().enumerate() {
                result.push_str(&next_indent);
                result.push_str(&format!("\"{}\": ", escape_json_string(key)));
                result.push_str(&serialize_node(value, indent_size, current_depth + 1));
                if i < entries.len() - 1 {
                    result.push(',');
                }
                result.push('\n');
            }
            result.push_str(&indent);
            result.push('}');
            result
        }
        JsonValue::Array(elements) => {
            if elements.is_empty() {
                return "[]".to_string();
            }

            if elements.iter().all(|n| !n.value().is_container()) {
                let compact = serialize_node_spaced(node);
                if compact.len() <= 80 {
                    return compact;
                }
            }

            let mut result = "[\n".to_string();
            for (i, element) in elements.iter().enumerate() {
                result.push_str(&next_indent);
                result.push_str(&serialize_node(element, indent_size, current_depth + 1));
                if i < elements.len() - 1 {
                    result.push(',');
                }
                result.push('\n');
            }
            result.push_str(&indent);
            result.push(']');
            result
        }
        scalar => serialize_scalar(scalar),
    }
}

/// Serializes a JSON node to a compact single-line string.
pub fn serialize_node_compact(node: &JsonNode) -> String {
    serialize_inline(node, ",", ":")
}

/// Single line with a space after separators: `{"a": 1, "b": 2}`.
fn serialize_node_spaced(node: &JsonNode) -> String {
    serialize_inline(node, ", ", ": ")
}

fn serialize_inline(node: &JsonNode, item_sep: &str, key_sep: &str) -> String {
    match node.value() {
        JsonValue::Object(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .map(|(key, value)| {
                    format!(
                        "\"{}\"{}{}",
                        escape_json_string(key),
                        key_sep,
                        serialize_inline(value, item_sep, key_sep)
                    )
                })
                .collect();
            format!("{{{}}}", parts.join(item_sep))
        }
        JsonValue::Array(elements) => {
            let parts: Vec<String> = elements
                .iter()
                .map(|element| serialize_inline(element, item_sep, key_sep))
                .collect();
            format!("[{}]", parts.join(item_sep))
        }
        scalar => serialize_scalar(scalar),
    }
}

fn serialize_scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => format!("\"{}\"", escape_json_string(s)),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Boolean(b) => b.to_string(),
        JsonValue::Null => "null".to_string(),
        JsonValue::Raw(raw) => raw.clone(),
        JsonValue::Object(_) | JsonValue::Array(_) => String::new(),
    }
}

/// Escapes special characters in a string for JSON serialization.
fn escape_json_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x08' => result.push_str("\\b"),
            '\x0C' => result.push_str("\\f"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }

    result
}
