//! Field values exchanged between documents.
//!
//! A [`FieldValue`] is what a reader produces for one leaf and what a writer
//! consumes. Its `field_type` may be absent on input, in which case the leaf
//! codec infers it from the backing node.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::path::{CollectionKind, PathExpression};

/// Field type enumeration shared by every document backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    String,
    Boolean,
    Integer,
    Long,
    Short,
    Byte,
    Float,
    Double,
    Decimal,
    BigInteger,
    Char,
    Complex,
    Unsupported,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldType::Integer
                | FieldType::Long
                | FieldType::Short
                | FieldType::Byte
                | FieldType::Float
                | FieldType::Double
                | FieldType::Decimal
                | FieldType::BigInteger
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Integer => "INTEGER",
            FieldType::Long => "LONG",
            FieldType::Short => "SHORT",
            FieldType::Byte => "BYTE",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Decimal => "DECIMAL",
            FieldType::BigInteger => "BIG_INTEGER",
            FieldType::Char => "CHAR",
            FieldType::Complex => "COMPLEX",
            FieldType::Unsupported => "UNSUPPORTED",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for field type names that are not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type '{0}'")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .flat_map(char::to_lowercase)
            .collect();
        let field_type = match normalized.as_str() {
            "string" => FieldType::String,
            "boolean" | "bool" => FieldType::Boolean,
            "integer" | "int" => FieldType::Integer,
            "long" => FieldType::Long,
            "short" => FieldType::Short,
            "byte" => FieldType::Byte,
            "float" => FieldType::Float,
            "double" => FieldType::Double,
            "decimal" => FieldType::Decimal,
            "biginteger" | "bigint" => FieldType::BigInteger,
            "char" => FieldType::Char,
            "complex" => FieldType::Complex,
            "unsupported" => FieldType::Unsupported,
            _ => return Err(UnknownFieldType(s.to_string())),
        };
        Ok(field_type)
    }
}

impl TryFrom<String> for FieldType {
    type Error = UnknownFieldType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

/// A scalar value, or an opaque serialized sub-tree for complex fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Short(i16),
    Byte(i8),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    BigInteger(BigInt),
    Char(char),
    /// Pre-serialized sub-tree, stored and emitted verbatim.
    Complex(String),
}

impl Value {
    /// The field type this value naturally carries.
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::String(_) => FieldType::String,
            Value::Boolean(_) => FieldType::Boolean,
            Value::Integer(_) => FieldType::Integer,
            Value::Long(_) => FieldType::Long,
            Value::Short(_) => FieldType::Short,
            Value::Byte(_) => FieldType::Byte,
            Value::Float(_) => FieldType::Float,
            Value::Double(_) => FieldType::Double,
            Value::Decimal(_) => FieldType::Decimal,
            Value::BigInteger(_) => FieldType::BigInteger,
            Value::Char(_) => FieldType::Char,
            Value::Complex(_) => FieldType::Complex,
        }
    }

    /// Textual form, as written to XML text or a string field.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) | Value::Complex(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Long(i) => i.to_string(),
            Value::Short(i) => i.to_string(),
            Value::Byte(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Double(f) => f.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::BigInteger(i) => i.to_string(),
            Value::Char(c) => c.to_string(),
        }
    }

    /// Converts to a `serde_json::Value`, keeping number precision.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::String(s) => Json::String(s.clone()),
            Value::Char(c) => Json::String(c.to_string()),
            Value::Boolean(b) => Json::Bool(*b),
            Value::Integer(i) => Json::from(*i),
            Value::Long(i) => Json::from(*i),
            Value::Short(i) => Json::from(*i),
            Value::Byte(i) => Json::from(*i),
            Value::Float(_) | Value::Double(_) | Value::Decimal(_) | Value::BigInteger(_) => {
                let text = self.to_text();
                serde_json::from_str(&text).unwrap_or(Json::String(text))
            }
            Value::Complex(raw) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Json::String(raw.clone()))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// A leaf value together with its (possibly unknown) field type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldValue {
    pub field_type: Option<FieldType>,
    pub value: Option<Value>,
    pub collection_type: CollectionKind,
}

impl FieldValue {
    /// A value whose type is the value's natural type.
    pub fn new(value: Value) -> Self {
        Self {
            field_type: Some(value.field_type()),
            value: Some(value),
            collection_type: CollectionKind::None,
        }
    }

    /// A value with an explicit declared type.
    pub fn typed(field_type: FieldType, value: Option<Value>) -> Self {
        Self {
            field_type: Some(field_type),
            value,
            collection_type: CollectionKind::None,
        }
    }

    /// A value of unknown type, left for the codec to infer.
    pub fn untyped(value: Option<Value>) -> Self {
        Self {
            field_type: None,
            value,
            collection_type: CollectionKind::None,
        }
    }

    pub fn null() -> Self {
        Self::default()
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Value::String(value.into()))
    }

    /// An opaque pre-serialized sub-tree.
    pub fn complex(serialized: Option<String>) -> Self {
        Self::typed(FieldType::Complex, serialized.map(Value::Complex))
    }

    pub fn with_collection(mut self, collection_type: CollectionKind) -> Self {
        self.collection_type = collection_type;
        self
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_complex(&self) -> bool {
        self.field_type == Some(FieldType::Complex)
    }
}

/// A value read from one concrete position, with the path that reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadField {
    pub path: PathExpression,
    pub value: FieldValue,
}

/// Values read through an unindexed collection, one per element.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGroup {
    /// The requested (unindexed) path.
    pub path: PathExpression,
    /// Elements in collection order; each path has concrete indices.
    pub fields: Vec<ReadField>,
}

impl FieldGroup {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReadField> {
        self.fields.iter()
    }
}

/// Outcome of reading one path.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult {
    Field(ReadField),
    Group(FieldGroup),
    NotFound,
}

impl ReadResult {
    pub fn is_found(&self) -> bool {
        !matches!(self, ReadResult::NotFound)
    }

    /// The single field, if this result is one.
    pub fn field(&self) -> Option<&ReadField> {
        match self {
            ReadResult::Field(field) => Some(field),
            _ => None,
        }
    }

    /// The group, if this result is one.
    pub fn group(&self) -> Option<&FieldGroup> {
        match self {
            ReadResult::Group(group) => Some(group),
            _ => None,
        }
    }

    /// The single value, if this result is a field.
    pub fn value(&self) -> Option<&Value> {
        self.field().and_then(|field| field.value.value.as_ref())
    }
}
