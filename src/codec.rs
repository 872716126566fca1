//! Leaf value marshaling between backends and [`FieldValue`].
//!
//! The codec only moves values in and out of a backend's native leaf form.
//! It never narrows or widens between numeric types: an INTEGER offered to a
//! LONG field is a mismatch, not a conversion. Text is the one exception,
//! since text is how untyped backends store everything; it is parsed with
//! the target type's own parser.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::error::CodecError;
use crate::field::{FieldType, FieldValue, Value};
use crate::tree::NativeLeaf;

/// Converts native leaves to field values and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafCodec;

impl LeafCodec {
    pub fn new() -> Self {
        Self
    }

    /// Reads a leaf, inferring its type unless one is declared.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Format`] when textual content does not parse as
    /// the declared type. Callers fall back to [`LeafCodec::fallback`].
    pub fn decode(
        &self,
        leaf: &NativeLeaf,
        declared: Option<FieldType>,
    ) -> Result<FieldValue, CodecError> {
        match (leaf, declared) {
            (NativeLeaf::Null, declared) => Ok(FieldValue {
                field_type: declared,
                ..FieldValue::null()
            }),
            (NativeLeaf::Structure(serialized), _) => {
                Ok(FieldValue::complex(serialized.clone()))
            }
            (NativeLeaf::Text(text), None) => Ok(FieldValue::string(text.clone())),
            (NativeLeaf::Text(text), Some(field_type)) => {
                let value = parse_as(field_type, text)?;
                Ok(FieldValue::typed(field_type, Some(value)))
            }
            (NativeLeaf::Typed(value), None) => Ok(FieldValue::new(value.clone())),
            (NativeLeaf::Typed(value), Some(field_type)) => {
                if value.field_type() == field_type {
                    return Ok(FieldValue::new(value.clone()));
                }
                match value {
                    Value::String(text) => {
                        let parsed = parse_as(field_type, text)?;
                        Ok(FieldValue::typed(field_type, Some(parsed)))
                    }
                    // Native type wins; conversion belongs to the caller.
                    other => Ok(FieldValue::new(other.clone())),
                }
            }
        }
    }

    /// Best-effort textual reading used when [`LeafCodec::decode`] fails.
    pub fn fallback(&self, leaf: &NativeLeaf) -> FieldValue {
        match leaf {
            NativeLeaf::Null => FieldValue::null(),
            NativeLeaf::Text(text) => FieldValue::string(text.clone()),
            NativeLeaf::Typed(value) => FieldValue::string(value.to_text()),
            NativeLeaf::Structure(serialized) => FieldValue::complex(serialized.clone()),
        }
    }

    /// Prepares a field value for storage.
    ///
    /// The target type is the backend's declared type when it has one,
    /// otherwise the value's own `field_type`.
    ///
    /// # Errors
    ///
    /// [`CodecError::Format`] when text does not parse as the target type,
    /// [`CodecError::Mismatch`] when a typed value differs from the target.
    pub fn encode(
        &self,
        field: &FieldValue,
        declared: Option<FieldType>,
    ) -> Result<Option<Value>, CodecError> {
        let value = match &field.value {
            Some(value) => value,
            None => return Ok(None),
        };
        let target = match declared.or(field.field_type) {
            Some(target) => target,
            None => return Ok(Some(value.clone())),
        };

        match target {
            FieldType::Unsupported => Err(CodecError::Unsupported(target)),
            FieldType::String => Ok(Some(Value::String(value.to_text()))),
            FieldType::Complex => Ok(Some(Value::Complex(value.to_text()))),
            FieldType::Char => {
                let text = value.to_text();
                parse_as(FieldType::Char, &text).map(Some)
            }
            _ if value.field_type() == target => Ok(Some(value.clone())),
            _ => match value {
                Value::String(text) => parse_as(target, text).map(Some),
                Value::Char(ch) => parse_as(target, &ch.to_string()).map(Some),
                other => Err(CodecError::Mismatch {
                    expected: target,
                    found: other.field_type(),
                }),
            },
        }
    }
}

/// Parses text with the parser of `target`.
///
/// # Errors
///
/// Returns [`CodecError::Format`] if the text is not a valid `target`.
pub fn parse_as(target: FieldType, text: &str) -> Result<Value, CodecError> {
    let format_error = || CodecError::Format {
        text: text.to_string(),
        target,
    };
    let trimmed = text.trim();

    let value = match target {
        FieldType::String => Value::String(text.to_string()),
        FieldType::Complex => Value::Complex(text.to_string()),
        FieldType::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Value::Char(ch),
                _ => return Err(format_error()),
            }
        }
        FieldType::Boolean => {
            if trimmed.eq_ignore_ascii_case("true") {
                Value::Boolean(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                Value::Boolean(false)
            } else {
                return Err(format_error());
            }
        }
        FieldType::Integer => Value::Integer(trimmed.parse().map_err(|_| format_error())?),
        FieldType::Long => Value::Long(trimmed.parse().map_err(|_| format_error())?),
        FieldType::Short => Value::Short(trimmed.parse().map_err(|_| format_error())?),
        FieldType::Byte => Value::Byte(trimmed.parse().map_err(|_| format_error())?),
        FieldType::Float => Value::Float(
            trimmed
                .parse::<f32>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(format_error)?,
        ),
        FieldType::Double => Value::Double(
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite())
                .ok_or_else(format_error)?,
        ),
        FieldType::Decimal => {
            Value::Decimal(BigDecimal::from_str(trimmed).map_err(|_| format_error())?)
        }
        FieldType::BigInteger => {
            Value::BigInteger(BigInt::from_str(trimmed).map_err(|_| format_error())?)
        }
        FieldType::Unsupported => return Err(CodecError::Unsupported(target)),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_infers_native_type() {
        let codec = LeafCodec::new();
        let field = codec
            .decode(&NativeLeaf::Typed(Value::Integer(123)), None)
            .unwrap();
        assert_eq!(field.field_type, Some(FieldType::Integer));
        assert_eq!(field.value, Some(Value::Integer(123)));
    }

    #[test]
    fn test_decode_text_without_declared_type_is_string() {
        let codec = LeafCodec::new();
        let field = codec.decode(&NativeLeaf::Text("42".into()), None).unwrap();
        assert_eq!(field, FieldValue::string("42"));
    }

    #[test]
    fn test_decode_text_with_declared_type() {
        let codec = LeafCodec::new();
        let field = codec
            .decode(&NativeLeaf::Text(" 42 ".into()), Some(FieldType::Long))
            .unwrap();
        assert_eq!(field.value, Some(Value::Long(42)));
    }

    #[test]
    fn test_decode_unparseable_text_fails_and_falls_back() {
        let codec = LeafCodec::new();
        let leaf = NativeLeaf::Text("forty-two".into());
        let err = codec.decode(&leaf, Some(FieldType::Integer)).unwrap_err();
        assert!(matches!(err, CodecError::Format { target: FieldType::Integer, .. }));
        assert_eq!(codec.fallback(&leaf), FieldValue::string("forty-two"));
    }

    #[test]
    fn test_decode_does_not_narrow_native_numbers() {
        let codec = LeafCodec::new();
        let field = codec
            .decode(&NativeLeaf::Typed(Value::Long(7)), Some(FieldType::Integer))
            .unwrap();
        assert_eq!(field.value, Some(Value::Long(7)));
        assert_eq!(field.field_type, Some(FieldType::Long));
    }

    #[test]
    fn test_decode_null_keeps_declared_type() {
        let codec = LeafCodec::new();
        let field = codec.decode(&NativeLeaf::Null, Some(FieldType::Integer)).unwrap();
        assert!(field.is_null());
        assert_eq!(field.field_type, Some(FieldType::Integer));
    }

    #[test]
    fn test_encode_stringifies_for_string_target() {
        let codec = LeafCodec::new();
        let encoded = codec
            .encode(&FieldValue::new(Value::Double(1.5)), Some(FieldType::String))
            .unwrap();
        assert_eq!(encoded, Some(Value::String("1.5".into())));
    }

    #[test]
    fn test_encode_parses_text_into_numeric_target() {
        let codec = LeafCodec::new();
        let encoded = codec
            .encode(&FieldValue::string("12.50"), Some(FieldType::Decimal))
            .unwrap();
        assert_eq!(encoded, Some(Value::Decimal("12.50".parse().unwrap())));
    }

    #[test]
    fn test_parse_rejects_non_finite_floats() {
        for text in ["NaN", "inf", "-infinity"] {
            assert!(matches!(
                parse_as(FieldType::Double, text),
                Err(CodecError::Format { .. })
            ));
            assert!(matches!(
                parse_as(FieldType::Float, text),
                Err(CodecError::Format { .. })
            ));
        }
        assert_eq!(parse_as(FieldType::Double, "1e3").unwrap(), Value::Double(1000.0));
    }

    #[test]
    fn test_encode_format_error() {
        let codec = LeafCodec::new();
        let err = codec
            .encode(&FieldValue::string("abc"), Some(FieldType::Short))
            .unwrap_err();
        assert!(matches!(err, CodecError::Format { .. }));
    }

    #[test]
    fn test_encode_rejects_cross_numeric_types() {
        let codec = LeafCodec::new();
        let err = codec
            .encode(&FieldValue::new(Value::Integer(1)), Some(FieldType::Long))
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::Mismatch {
                expected: FieldType::Long,
                found: FieldType::Integer
            }
        );
    }

    #[test]
    fn test_encode_char() {
        let codec = LeafCodec::new();
        assert_eq!(
            codec.encode(&FieldValue::string("x"), Some(FieldType::Char)).unwrap(),
            Some(Value::Char('x'))
        );
        assert!(codec
            .encode(&FieldValue::string("xy"), Some(FieldType::Char))
            .is_err());
    }

    #[test]
    fn test_encode_untyped_passes_through() {
        let codec = LeafCodec::new();
        let value = FieldValue::untyped(Some(Value::Boolean(true)));
        assert_eq!(codec.encode(&value, None).unwrap(), Some(Value::Boolean(true)));
        assert_eq!(codec.encode(&FieldValue::null(), None).unwrap(), None);
    }

    #[test]
    fn test_parse_big_values() {
        assert_eq!(
            parse_as(FieldType::BigInteger, "123456789012345678901234567890")
                .unwrap()
                .to_text(),
            "123456789012345678901234567890"
        );
        assert!(parse_as(FieldType::Byte, "300").is_err());
        assert_eq!(parse_as(FieldType::Boolean, "TRUE").unwrap(), Value::Boolean(true));
    }
}
