//! Writing field values into a document.

use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::codec::LeafCodec;
use crate::error::{FieldError, FieldResult};
use crate::field::{FieldValue, Value};
use crate::path::PathExpression;
use crate::resolver::write_walk;
use crate::tree::TreeBackend;

/// What happened to one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Null value; nothing was created.
    Skipped,
    /// The write could not be carried out; an audit says why.
    Abandoned,
}

/// Options affecting how values are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterOptions {
    /// Create leaves holding an explicit null for null values instead of
    /// skipping them.
    pub write_null_leaves: bool,
}

/// Writes values into one document, creating structure on demand.
///
/// # Example
///
/// ```
/// use fieldquill::field::FieldValue;
/// use fieldquill::json::{serialize_node_compact, JsonTree};
/// use fieldquill::writer::DocumentWriter;
///
/// let mut tree = JsonTree::empty();
/// let mut writer = DocumentWriter::new("target", &mut tree);
/// writer.write("/orders[1]/id", FieldValue::string("A-7")).unwrap();
/// drop(writer);
///
/// assert_eq!(
///     serialize_node_compact(tree.root()),
///     r#"{"orders":[{},{"id":"A-7"}]}"#
/// );
/// ```
pub struct DocumentWriter<'a, B: TreeBackend> {
    backend: &'a mut B,
    codec: LeafCodec,
    audits: AuditLog,
    options: WriterOptions,
}

impl<'a, B: TreeBackend> DocumentWriter<'a, B> {
    pub fn new(doc_id: impl Into<String>, backend: &'a mut B) -> Self {
        Self {
            backend,
            codec: LeafCodec::new(),
            audits: AuditLog::new(doc_id),
            options: WriterOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WriterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn backend(&self) -> &B {
        self.backend
    }

    /// Writes `value` at `path`.
    ///
    /// # Errors
    ///
    /// Only a malformed path is an error. Conflicts and conversion failures
    /// are recorded as ERROR audits and reported as
    /// [`WriteOutcome::Abandoned`].
    pub fn write(&mut self, path: &str, value: FieldValue) -> FieldResult<WriteOutcome> {
        let path = PathExpression::parse(path)?;
        Ok(self.write_path(&path, &value))
    }

    /// Writes `value` at an already parsed path.
    ///
    /// A complex value creates a structural node; its serialized content,
    /// if any, is stored verbatim.
    pub fn write_path(&mut self, path: &PathExpression, value: &FieldValue) -> WriteOutcome {
        if value.is_complex() {
            return self.write_structure(path, value);
        }
        if value.is_null() && !self.options.write_null_leaves {
            tracing::debug!(path = %path, "null value, write skipped");
            return WriteOutcome::Skipped;
        }

        let node = match write_walk(self.backend, path, false, &mut self.audits) {
            Ok(Some(node)) => node,
            Ok(None) => return WriteOutcome::Abandoned,
            Err(source) => {
                return self.abandon(FieldError::StructuralConflict {
                    path: path.to_string(),
                    source,
                })
            }
        };

        let declared = self.backend.declared_type(&node);
        let encoded = match self.codec.encode(value, declared) {
            Ok(encoded) => encoded,
            Err(source) => {
                return self.abandon(FieldError::TypeMismatch {
                    path: path.to_string(),
                    source,
                })
            }
        };
        match self.backend.set_leaf(&node, encoded) {
            Ok(()) => WriteOutcome::Written,
            Err(source) => self.abandon(FieldError::StructuralConflict {
                path: path.to_string(),
                source,
            }),
        }
    }

    fn write_structure(&mut self, path: &PathExpression, value: &FieldValue) -> WriteOutcome {
        let node = match write_walk(self.backend, path, true, &mut self.audits) {
            Ok(Some(node)) => node,
            Ok(None) => return WriteOutcome::Abandoned,
            Err(source) => {
                return self.abandon(FieldError::StructuralConflict {
                    path: path.to_string(),
                    source,
                })
            }
        };
        let raw = match &value.value {
            Some(raw) => raw.to_text(),
            None => return WriteOutcome::Written,
        };
        match self.backend.set_leaf(&node, Some(Value::Complex(raw))) {
            Ok(()) => WriteOutcome::Written,
            Err(source) => self.abandon(FieldError::StructuralConflict {
                path: path.to_string(),
                source,
            }),
        }
    }

    fn abandon(&mut self, error: FieldError) -> WriteOutcome {
        let path = match &error {
            FieldError::StructuralConflict { path, .. } | FieldError::TypeMismatch { path, .. } => {
                path.clone()
            }
            _ => String::new(),
        };
        self.audits.error(path, error.to_string());
        WriteOutcome::Abandoned
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
