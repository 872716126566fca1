//! Field path grammar and parser.
//!
//! A field path addresses one value (or one collection of values) inside a
//! document by naming each step from the root down to the leaf.
//!
//! # Supported Syntax
//!
//! - `/name` - Named child
//! - `/name[]` / `/name[3]` - Array-style collection, unindexed or indexed
//! - `/name<>` / `/name<3>` - List-style collection
//! - `/name{}` / `/name{3}` - Map-style collection
//! - `/@name` - XML attribute
//! - `/ns:name` - XML namespace-qualified name
//!
//! Predicates, wildcards and functions are not part of the grammar.
//!
//! # Examples
//!
//! ```
//! use fieldquill::path::PathExpression;
//!
//! let path = PathExpression::parse("/orders<4>/address/addressLine1").unwrap();
//! assert!(path.has_collection());
//! assert_eq!(path.last_segment().unwrap().name(), "addressLine1");
//! assert_eq!(path.to_string(), "/orders<4>/address/addressLine1");
//! ```

pub mod ast;
pub mod error;
pub mod parser;

pub use ast::{CollectionKind, PathExpression, PathSegment};
pub use error::PathError;
pub use parser::Parser;
