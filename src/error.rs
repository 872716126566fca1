//! Error types for field access.

use thiserror::Error;

use crate::field::FieldType;
use crate::path::PathError;

/// Result type alias for field access operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors surfaced to the caller of a reader or writer.
///
/// Only [`FieldError::MalformedPath`] and [`FieldError::Backend`] are
/// returned from reads and writes; the other variants are converted into
/// audits at the point they happen and exist so callers (and audits) can
/// describe them uniformly.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Path string violates the grammar.
    #[error("malformed path: {0}")]
    MalformedPath(#[from] PathError),

    /// Optional read miss.
    #[error("no value at {path}")]
    NotFound { path: String },

    /// Leaf cannot be converted to or from the declared type.
    #[error("type mismatch at {path}: {source}")]
    TypeMismatch {
        path: String,
        #[source]
        source: CodecError,
    },

    /// Write target already holds an incompatible node.
    #[error("structural conflict at {path}: {source}")]
    StructuralConflict {
        path: String,
        #[source]
        source: TreeError,
    },

    /// The document itself could not be parsed or serialized.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Document-level parse or serialize failure.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML document: {0}")]
    Xml(String),

    #[error("XML document has no root element")]
    EmptyXml,
}

/// Leaf marshaling failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Text does not parse as the target type.
    #[error("cannot parse '{text}' as {target}")]
    Format { text: String, target: FieldType },

    /// Value of one type offered for a field of another; converting
    /// between them is the caller's job.
    #[error("expected {expected} but found {found}")]
    Mismatch { expected: FieldType, found: FieldType },

    #[error("field type {0} cannot be written")]
    Unsupported(FieldType),
}

/// Backend refusal to create or overwrite a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("expected {expected} but found {found}")]
    KindConflict {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{class} has no field '{field}'")]
    UnknownField { class: String, field: String },

    #[error("field '{field}' is declared {declared}, cannot store {found}")]
    DeclaredType {
        field: String,
        declared: FieldType,
        found: FieldType,
    },

    #[error("cannot instantiate class '{0}'")]
    UnknownClass(String),

    #[error("{0}")]
    Unsupported(String),
}

impl TreeError {
    pub fn kind_conflict(expected: &'static str, found: &'static str) -> Self {
        TreeError::KindConflict { expected, found }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        TreeError::Unsupported(message.into())
    }
}
