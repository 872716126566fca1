//! Error types for field path parsing and index instantiation.

use thiserror::Error;

/// Errors produced while parsing a path or deriving a new path from one.
///
/// Every variant is a "malformed path" condition: fatal for the field being
/// processed, never for the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Unexpected character at a specific byte position.
    #[error("unexpected '{found}' at position {position} in '{path}', expected {expected}")]
    UnexpectedToken {
        path: String,
        position: usize,
        found: String,
        expected: String,
    },
    /// Input ended inside a collection marker.
    #[error("unexpected end of '{path}', expected {expected}")]
    UnexpectedEnd { path: String, expected: String },
    /// Collection index is not a non-negative integer that fits in 32 bits.
    #[error("invalid collection index '{text}' at position {position} in '{path}'")]
    InvalidIndex {
        path: String,
        position: usize,
        text: String,
    },
    /// A collection marker with no name in front of it.
    #[error("segment at position {position} in '{path}' has no name")]
    EmptySegment { path: String, position: usize },
    /// An index was assigned to a segment that carries no collection marker.
    #[error("segment '{segment}' is not a collection")]
    NotACollection { segment: String },
    /// An index was assigned to a segment name the path does not contain.
    #[error("path has no segment named '{segment}'")]
    UnknownSegment { segment: String },
}
