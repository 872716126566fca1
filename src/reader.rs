//! Reading field values out of a document.

use crate::audit::AuditLog;
use crate::codec::LeafCodec;
use crate::error::{FieldError, FieldResult};
use crate::field::{FieldGroup, FieldType, FieldValue, ReadField, ReadResult};
use crate::path::PathExpression;
use crate::resolver::{read_walk, Resolved};
use crate::tree::TreeBackend;

/// Reads paths from one document, collecting audits as it goes.
///
/// # Example
///
/// ```
/// use fieldquill::json::parse_json;
/// use fieldquill::field::{FieldType, Value};
/// use fieldquill::reader::DocumentReader;
///
/// let tree = parse_json(r#"{"firstName": "Ozzie", "age": 123}"#).unwrap();
/// let mut reader = DocumentReader::new("source", &tree);
///
/// let result = reader.read("/age").unwrap();
/// let field = result.field().unwrap();
/// assert_eq!(field.value.field_type, Some(FieldType::Integer));
/// assert_eq!(field.value.value, Some(Value::Integer(123)));
/// ```
pub struct DocumentReader<'a, B: TreeBackend> {
    backend: &'a B,
    codec: LeafCodec,
    audits: AuditLog,
}

impl<'a, B: TreeBackend> DocumentReader<'a, B> {
    pub fn new(doc_id: impl Into<String>, backend: &'a B) -> Self {
        Self {
            backend,
            codec: LeafCodec::new(),
            audits: AuditLog::new(doc_id),
        }
    }

    pub fn backend(&self) -> &B {
        self.backend
    }

    /// Reads `path`, inferring leaf types from the backend.
    ///
    /// # Errors
    ///
    /// Only a malformed path is an error; misses come back as
    /// [`ReadResult::NotFound`].
    pub fn read(&mut self, path: &str) -> FieldResult<ReadResult> {
        let path = PathExpression::parse(path)?;
        Ok(self.read_path(&path, None))
    }

    /// Reads `path`, parsing textual leaves as `field_type`.
    ///
    /// # Errors
    ///
    /// See [`DocumentReader::read`].
    pub fn read_typed(&mut self, path: &str, field_type: FieldType) -> FieldResult<ReadResult> {
        let path = PathExpression::parse(path)?;
        Ok(self.read_path(&path, Some(field_type)))
    }

    /// Reads an already parsed path.
    ///
    /// A path with an unindexed collection segment yields a group with one
    /// field per element reached; any other path yields a single field.
    pub fn read_path(&mut self, path: &PathExpression, declared: Option<FieldType>) -> ReadResult {
        let resolved = read_walk(self.backend, path, &mut self.audits);
        if resolved.is_empty() {
            return ReadResult::NotFound;
        }

        let collection_type = path
            .last_segment()
            .map(|segment| segment.collection_kind())
            .unwrap_or_default();
        let mut fields: Vec<ReadField> = resolved
            .into_iter()
            .map(|resolved| {
                let value = self.decode(&resolved, declared).with_collection(collection_type);
                ReadField {
                    path: resolved.path,
                    value,
                }
            })
            .collect();

        if path.has_unindexed_collection() {
            return ReadResult::Group(FieldGroup {
                path: path.clone(),
                fields,
            });
        }
        ReadResult::Field(fields.swap_remove(0))
    }

    fn decode(&mut self, resolved: &Resolved<B::Node>, declared: Option<FieldType>) -> FieldValue {
        let declared = declared.or_else(|| self.backend.declared_type(&resolved.node));
        let leaf = self.backend.get_leaf(&resolved.node);
        match self.codec.decode(&leaf, declared) {
            Ok(value) => value,
            Err(source) => {
                let error = FieldError::TypeMismatch {
                    path: resolved.path.to_string(),
                    source,
                };
                self.audits.warn(&resolved.path, error.to_string());
                self.codec.fallback(&leaf)
            }
        }
    }

    pub fn audits(&self) -> &AuditLog {
        &self.audits
    }

    pub fn audits_mut(&mut self) -> &mut AuditLog {
        &mut self.audits
    }

    pub fn into_audits(self) -> AuditLog {
        self.audits
    }
}
