//! JSON node representation with modification tracking.
//!
//! Each JSON value is wrapped in a `JsonNode` that records whether it has
//! been modified since loading. Numbers keep the kind they were parsed as,
//! which is what field type inference reads.
//!
//! # Example
//!
//! ```
//! use fieldquill::json::{JsonNode, JsonNumber, JsonValue};
//! use indexmap::IndexMap;
//!
//! let mut map = IndexMap::new();
//! map.insert("name".to_string(), JsonNode::new(JsonValue::String("fieldquill".to_string())));
//! map.insert("version".to_string(), JsonNode::new(JsonValue::Number(JsonNumber::Integer(1))));
//! let object = JsonNode::new(JsonValue::Object(map));
//! assert!(object.value().is_object());
//! ```

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::TreeError;
use crate::field::Value;
use crate::tree::NodeKind;

/// JSON numbers, by the narrowest kind that holds them.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonNumber {
    Integer(i32),
    Long(i64),
    BigInteger(BigInt),
    Double(f64),
    Decimal(BigDecimal),
}

impl fmt::Display for JsonNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonNumber::Integer(i) => write!(f, "{}", i),
            JsonNumber::Long(i) => write!(f, "{}", i),
            JsonNumber::BigInteger(i) => write!(f, "{}", i),
            JsonNumber::Double(d) => {
                // Whole doubles keep a fraction or exponent so they reload as doubles
                if !d.is_finite() || d.fract() != 0.0 {
                    write!(f, "{}", d)
                } else if d.abs() < 1e16 {
                    write!(f, "{:.1}", d)
                } else {
                    write!(f, "{:e}", d)
                }
            }
            JsonNumber::Decimal(d) => write!(f, "{}", d),
        }
    }
}

impl JsonNumber {
    /// Classifies number text as it appears in a JSON document.
    ///
    /// Integral text becomes the narrowest integer kind; fractional or
    /// exponent text becomes a double, or a decimal when `floats_as_decimal`.
    pub fn from_text(text: &str, floats_as_decimal: bool) -> Option<Self> {
        let fractional = text.contains(['.', 'e', 'E']);
        if fractional {
            if floats_as_decimal {
                return BigDecimal::from_str(text).ok().map(JsonNumber::Decimal);
            }
            return text.parse::<f64>().ok().map(JsonNumber::Double);
        }
        if let Ok(i) = text.parse::<i32>() {
            return Some(JsonNumber::Integer(i));
        }
        if let Ok(i) = text.parse::<i64>() {
            return Some(JsonNumber::Long(i));
        }
        BigInt::from_str(text).ok().map(JsonNumber::BigInteger)
    }

    pub fn to_value(&self) -> Value {
        match self {
            JsonNumber::Integer(i) => Value::Integer(*i),
            JsonNumber::Long(i) => Value::Long(*i),
            JsonNumber::BigInteger(i) => Value::BigInteger(i.clone()),
            JsonNumber::Double(d) => Value::Double(*d),
            JsonNumber::Decimal(d) => Value::Decimal(d.clone()),
        }
    }
}

/// A JSON value without metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Object(IndexMap<String, JsonNode>),
    Array(Vec<JsonNode>),
    String(String),
    Number(JsonNumber),
    Boolean(bool),
    Null,
    /// Pre-serialized JSON emitted verbatim.
    Raw(String),
}

impl JsonValue {
    pub fn is_object(&self) -> bool {
        matches!(self, JsonValue::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, JsonValue::Array(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, JsonValue::Object(_) | JsonValue::Array(_))
    }

    /// True for containers with no entries.
    pub fn is_empty_container(&self) -> bool {
        match self {
            JsonValue::Object(entries) => entries.is_empty(),
            JsonValue::Array(elements) => elements.is_empty(),
            _ => false,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            JsonValue::Object(_) => NodeKind::Object,
            JsonValue::Array(_) => NodeKind::Array,
            JsonValue::Null => NodeKind::Null,
            _ => NodeKind::Leaf,
        }
    }

    /// Builds the JSON form of a field value. `None` is JSON null.
    pub fn from_field(value: Option<Value>) -> Self {
        let value = match value {
            Some(value) => value,
            None => return JsonValue::Null,
        };
        match value {
            Value::String(s) => JsonValue::String(s),
            Value::Char(c) => JsonValue::String(c.to_string()),
            Value::Boolean(b) => JsonValue::Boolean(b),
            Value::Integer(i) => JsonValue::Number(JsonNumber::Integer(i)),
            Value::Short(i) => JsonValue::Number(JsonNumber::Integer(i32::from(i))),
            Value::Byte(i) => JsonValue::Number(JsonNumber::Integer(i32::from(i))),
            Value::Long(i) => JsonValue::Number(JsonNumber::Long(i)),
            Value::BigInteger(i) => JsonValue::Number(JsonNumber::BigInteger(i)),
            // Go through text so 1.1f32 stays 1.1
            Value::Float(f) => JsonValue::Number(JsonNumber::Double(
                f.to_string().parse().unwrap_or(f64::from(f)),
            )),
            Value::Double(d) => JsonValue::Number(JsonNumber::Double(d)),
            Value::Decimal(d) => JsonValue::Number(JsonNumber::Decimal(d)),
            Value::Complex(raw) => JsonValue::Raw(raw),
        }
    }
}

/// A JSON value wrapped with modification tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonNode {
    pub(crate) value: JsonValue,
    pub(crate) modified: bool,
}

impl JsonNode {
    /// Creates a new node, marked as modified since it did not come from a
    /// parsed document.
    pub fn new(value: JsonValue) -> Self {
        Self {
            value,
            modified: true,
        }
    }

    /// Creates a node loaded from a document, not yet modified.
    pub(crate) fn loaded(value: JsonValue) -> Self {
        Self {
            value,
            modified: false,
        }
    }

    pub fn value(&self) -> &JsonValue {
        &self.value
    }

    /// Returns a mutable reference to the value, marking the node modified.
    pub fn value_mut(&mut self) -> &mut JsonValue {
        self.modified = true;
        &mut self.value
    }

    /// True if this node or any descendant was modified.
    pub fn is_modified(&self) -> bool {
        if self.modified {
            return true;
        }
        match &self.value {
            JsonValue::Object(entries) => entries.values().any(JsonNode::is_modified),
            JsonValue::Array(elements) => elements.iter().any(JsonNode::is_modified),
            _ => false,
        }
    }

    /// Object entries, turning a null node into an empty object first.
    pub(crate) fn entries_mut(&mut self) -> Result<&mut IndexMap<String, JsonNode>, TreeError> {
        if matches!(self.value, JsonValue::Null) {
            *self.value_mut() = JsonValue::Object(IndexMap::new());
        }
        match self.value_mut() {
            JsonValue::Object(entries) => Ok(entries),
            other => Err(TreeError::kind_conflict("object", other.kind().as_str())),
        }
    }

    /// Array elements, turning a null node into an empty array first.
    pub(crate) fn elements_mut(&mut self) -> Result<&mut Vec<JsonNode>, TreeError> {
        if matches!(self.value, JsonValue::Null) {
            *self.value_mut() = JsonValue::Array(Vec::new());
        }
        match self.value_mut() {
            JsonValue::Array(elements) => Ok(elements),
            other => Err(TreeError::kind_conflict("array", other.kind().as_str())),
        }
    }
}
