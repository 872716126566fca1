//! Capability interface shared by every document backend.
//!
//! A backend owns its tree and hands out lightweight, cloneable node handles.
//! The resolver walks paths purely through this trait, so JSON trees, XML
//! documents and object graphs are addressed by the same code.

use std::fmt;

use crate::error::TreeError;
use crate::field::{FieldType, Value};
use crate::path::CollectionKind;

/// Structural kind of a node as seen by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Object,
    Array,
    Leaf,
    /// Present, but holding no value.
    Null,
    /// Absent.
    Missing,
}

impl NodeKind {
    pub fn is_structural(self) -> bool {
        matches!(self, NodeKind::Object | NodeKind::Array)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Leaf => "leaf",
            NodeKind::Null => "null",
            NodeKind::Missing => "missing",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What padding elements look like when an array grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Terminal arrays are padded with nulls.
    Leaf,
    /// Structural arrays are padded with empty objects.
    Object,
}

/// A leaf in the backend's own representation.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeLeaf {
    Null,
    /// Textual content with no type information (XML text, attributes).
    Text(String),
    /// Value whose type the backend knows natively.
    Typed(Value),
    /// A structural node; carries its serialized form unless empty.
    Structure(Option<String>),
}

/// Node access and creation for one document.
pub trait TreeBackend {
    /// Handle to a node. Valid as long as the tree is not restructured,
    /// which growth never does: it only appends.
    type Node: Clone + fmt::Debug;

    fn root(&self) -> Self::Node;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    /// Looks up a named child without creating anything.
    fn child_named(&self, node: &Self::Node, name: &str) -> Option<Self::Node>;

    /// Looks up the child a collection segment names.
    ///
    /// Backends without a native array type override this to present
    /// repeated children as an array.
    fn collection_named(&self, node: &Self::Node, name: &str) -> Option<Self::Node> {
        self.child_named(node, name)
    }

    /// Element `index` of an array node.
    fn child_indexed(&self, node: &Self::Node, index: usize) -> Option<Self::Node>;

    /// Number of elements of an array node; zero for anything else.
    fn element_count(&self, node: &Self::Node) -> usize;

    /// Returns the named child object, creating it if absent or null.
    fn ensure_child_object(&mut self, node: &Self::Node, name: &str)
        -> Result<Self::Node, TreeError>;

    /// Returns the named child array, creating it if absent or null.
    fn ensure_child_array(
        &mut self,
        node: &Self::Node,
        name: &str,
        kind: CollectionKind,
    ) -> Result<Self::Node, TreeError>;

    /// Returns the named leaf position, creating a null leaf if absent.
    fn ensure_child_leaf(&mut self, node: &Self::Node, name: &str)
        -> Result<Self::Node, TreeError>;

    /// Pads `array` until it holds at least `len` elements.
    ///
    /// Existing elements are never touched.
    fn grow_array_to(
        &mut self,
        array: &Self::Node,
        len: usize,
        placeholder: Placeholder,
    ) -> Result<(), TreeError>;

    /// Returns element `index` as an object, turning a null placeholder
    /// into an empty object.
    fn ensure_element_object(&mut self, array: &Self::Node, index: usize)
        -> Result<Self::Node, TreeError>;

    /// Stores a leaf value; `None` writes an explicit null.
    fn set_leaf(&mut self, node: &Self::Node, value: Option<Value>) -> Result<(), TreeError>;

    fn get_leaf(&self, node: &Self::Node) -> NativeLeaf;

    /// Type the backend's schema declares for this position, if any.
    fn declared_type(&self, _node: &Self::Node) -> Option<FieldType> {
        None
    }
}
