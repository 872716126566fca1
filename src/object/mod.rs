//! Object-graph backend.
//!
//! Stands in for reflective access to application objects: a [`ClassModel`]
//! describes classes and their fields, and an [`ObjectGraph`] holds the
//! instances built while writing.

pub mod graph;
pub mod model;

pub use graph::{Collection, Instance, ObjectGraph, ObjectId, ObjectNode, Slot};
pub use model::{ClassDef, ClassModel, ClassRegistry, FieldDecl};
