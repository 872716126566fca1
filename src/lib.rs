//! fieldquill - path-addressed field access for JSON, XML and object graphs.
//!
//! A field path such as `/orders[4]/address/addressLine1` names one value in
//! a document, or with an unindexed collection segment (`/orders[]/id`) one
//! value per element. [`reader::DocumentReader`] reads paths from any
//! [`tree::TreeBackend`]; [`writer::DocumentWriter`] writes them, creating
//! objects and growing collections as needed. Problems below the document
//! level never abort a run: they are collected as [`audit::Audit`]s.
//!
//! # Example
//!
//! ```
//! use fieldquill::field::{FieldValue, Value};
//! use fieldquill::json::JsonTree;
//! use fieldquill::reader::DocumentReader;
//! use fieldquill::writer::DocumentWriter;
//!
//! let mut tree = JsonTree::empty();
//! DocumentWriter::new("target", &mut tree)
//!     .write("/orders[4]/address/addressLine1", FieldValue::string("hello world."))
//!     .unwrap();
//!
//! let mut reader = DocumentReader::new("target", &tree);
//! let result = reader.read("/orders[]/address/addressLine1").unwrap();
//! assert_eq!(result.group().unwrap().len(), 1);
//! ```

pub mod audit;
pub mod codec;
pub mod config;
pub mod error;
pub mod field;
pub mod file;
pub mod json;
pub mod mapping;
pub mod object;
pub mod path;
pub mod reader;
pub mod resolver;
pub mod tree;
pub mod writer;
pub mod xml;
