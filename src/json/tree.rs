//! Path-indexed JSON document tree.
//!
//! `JsonTree` owns the root node and resolves index paths to nodes: for
//! objects the index selects the nth key-value pair, for arrays the nth
//! element. It is also the JSON implementation of [`TreeBackend`], whose
//! node handles are exactly these index paths.
//!
//! # Example
//!
//! ```
//! use fieldquill::json::{parse_json, JsonValue};
//!
//! let tree = parse_json(r#"{"items": [1, 2]}"#).unwrap();
//! // First object field, second array element
//! let node = tree.get_node(&[0, 1]).unwrap();
//! assert!(matches!(node.value(), JsonValue::Number(_)));
//! assert!(tree.get_node(&[0, 99]).is_none());
//! ```

use indexmap::IndexMap;

use super::node::{JsonNode, JsonValue};
use super::serialize::serialize_node_compact;
use crate::error::TreeError;
use crate::field::Value;
use crate::path::CollectionKind;
use crate::tree::{NativeLeaf, NodeKind, Placeholder, TreeBackend};

/// A complete JSON document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonTree {
    root: JsonNode,
}

impl JsonTree {
    /// Creates a new JSON tree with the given root node.
    pub fn new(root: JsonNode) -> Self {
        Self { root }
    }

    /// Creates a tree whose root is an empty object.
    pub fn empty() -> Self {
        Self::new(JsonNode::new(JsonValue::Object(IndexMap::new())))
    }

    pub fn root(&self) -> &JsonNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut JsonNode {
        &mut self.root
    }

    /// True if any node changed since the document was loaded.
    pub fn is_modified(&self) -> bool {
        self.root.is_modified()
    }

    /// Gets an immutable reference to a node at the specified index path.
    ///
    /// Returns `None` if the path is out of bounds at any level or tries to
    /// traverse a non-container value.
    pub fn get_node(&self, path: &[usize]) -> Option<&JsonNode> {
        let mut current = &self.root;

        for &index in path {
            match current.value() {
                JsonValue::Object(entries) => {
                    current = entries.get_index(index)?.1;
                }
                JsonValue::Array(elements) => {
                    current = elements.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    /// Gets a mutable reference to a node at the specified index path.
    ///
    /// Traversal does not mark intermediate nodes as modified; only the
    /// caller's changes through `value_mut()` do.
    pub fn get_node_mut(&mut self, path: &[usize]) -> Option<&mut JsonNode> {
        let mut current = &mut self.root;

        for &index in path {
            current = match &mut current.value {
                JsonValue::Object(entries) => {
                    let (_key, value) = entries.get_index_mut(index)?;
                    value
                }
                JsonValue::Array(elements) => elements.get_mut(index)?,
                _ => return None,
            };
        }

        Some(current)
    }

    fn node_mut(&mut self, path: &[usize]) -> Result<&mut JsonNode, TreeError> {
        self.get_node_mut(path)
            .ok_or_else(|| TreeError::kind_conflict("node", "missing"))
    }

    /// Finds or inserts `name` under the object at `path`, returning the
    /// entry index. `init` is used for inserted entries and to replace a
    /// null entry; `accept` decides whether an existing value can stay.
    fn ensure_entry(
        &mut self,
        path: &[usize],
        name: &str,
        init: fn() -> JsonValue,
        accept: fn(&JsonValue) -> bool,
        expected: &'static str,
    ) -> Result<Vec<usize>, TreeError> {
        let entries = self.node_mut(path)?.entries_mut()?;
        let index = match entries.get_index_of(name) {
            Some(index) => {
                if let Some((_, child)) = entries.get_index_mut(index) {
                    if matches!(child.value(), JsonValue::Null) {
                        *child.value_mut() = init();
                    } else if !accept(child.value()) {
                        return Err(TreeError::kind_conflict(
                            expected,
                            child.value().kind().as_str(),
                        ));
                    }
                }
                index
            }
            None => {
                entries.insert(name.to_string(), JsonNode::new(init()));
                entries.len() - 1
            }
        };
        Ok(child_path(path, index))
    }
}

impl Default for JsonTree {
    fn default() -> Self {
        Self::empty()
    }
}

fn child_path(path: &[usize], index: usize) -> Vec<usize> {
    let mut child = path.to_vec();
    child.push(index);
    child
}

impl TreeBackend for JsonTree {
    type Node = Vec<usize>;

    fn root(&self) -> Vec<usize> {
        Vec::new()
    }

    fn kind(&self, node: &Vec<usize>) -> NodeKind {
        self.get_node(node)
            .map(|n| n.value().kind())
            .unwrap_or(NodeKind::Missing)
    }

    fn child_named(&self, node: &Vec<usize>, name: &str) -> Option<Vec<usize>> {
        match self.get_node(node)?.value() {
            JsonValue::Object(entries) => {
                let index = entries.get_index_of(name)?;
                Some(child_path(node, index))
            }
            _ => None,
        }
    }

    fn child_indexed(&self, node: &Vec<usize>, index: usize) -> Option<Vec<usize>> {
        match self.get_node(node)?.value() {
            JsonValue::Array(elements) if index < elements.len() => Some(child_path(node, index)),
            _ => None,
        }
    }

    fn element_count(&self, node: &Vec<usize>) -> usize {
        match self.get_node(node).map(JsonNode::value) {
            Some(JsonValue::Array(elements)) => elements.len(),
            _ => 0,
        }
    }

    fn ensure_child_object(
        &mut self,
        node: &Vec<usize>,
        name: &str,
    ) -> Result<Vec<usize>, TreeError> {
        self.ensure_entry(
            node,
            name,
            || JsonValue::Object(IndexMap::new()),
            JsonValue::is_object,
            "object",
        )
    }

    fn ensure_child_array(
        &mut self,
        node: &Vec<usize>,
        name: &str,
        _kind: CollectionKind,
    ) -> Result<Vec<usize>, TreeError> {
        self.ensure_entry(
            node,
            name,
            || JsonValue::Array(Vec::new()),
            JsonValue::is_array,
            "array",
        )
    }

    fn ensure_child_leaf(&mut self, node: &Vec<usize>, name: &str) -> Result<Vec<usize>, TreeError> {
        // Any existing value is a candidate; set_leaf decides on overwrite.
        self.ensure_entry(node, name, || JsonValue::Null, |_| true, "leaf")
    }

    fn grow_array_to(
        &mut self,
        array: &Vec<usize>,
        len: usize,
        placeholder: Placeholder,
    ) -> Result<(), TreeError> {
        let elements = self.node_mut(array)?.elements_mut()?;
        while elements.len() < len {
            let padding = match placeholder {
                Placeholder::Leaf => JsonValue::Null,
                Placeholder::Object => JsonValue::Object(IndexMap::new()),
            };
            elements.push(JsonNode::new(padding));
        }
        Ok(())
    }

    fn ensure_element_object(
        &mut self,
        array: &Vec<usize>,
        index: usize,
    ) -> Result<Vec<usize>, TreeError> {
        let elements = self.node_mut(array)?.elements_mut()?;
        let element = elements
            .get_mut(index)
            .ok_or_else(|| TreeError::kind_conflict("object", "missing"))?;
        match element.value() {
            JsonValue::Object(_) => {}
            JsonValue::Null => *element.value_mut() = JsonValue::Object(IndexMap::new()),
            other => {
                return Err(TreeError::kind_conflict("object", other.kind().as_str()));
            }
        }
        Ok(child_path(array, index))
    }

    fn set_leaf(&mut self, node: &Vec<usize>, value: Option<Value>) -> Result<(), TreeError> {
        let target = self.node_mut(node)?;
        let current = target.value();
        if current.is_container() && !current.is_empty_container() {
            return Err(TreeError::kind_conflict("leaf", current.kind().as_str()));
        }
        let finite = match &value {
            Some(Value::Float(f)) => f.is_finite(),
            Some(Value::Double(d)) => d.is_finite(),
            _ => true,
        };
        if !finite {
            return Err(TreeError::unsupported("JSON has no representation for NaN or infinity"));
        }
        *target.value_mut() = JsonValue::from_field(value);
        Ok(())
    }

    fn get_leaf(&self, node: &Vec<usize>) -> NativeLeaf {
        let node = match self.get_node(node) {
            Some(node) => node,
            None => return NativeLeaf::Null,
        };
        match node.value() {
            JsonValue::Null => NativeLeaf::Null,
            JsonValue::String(s) => NativeLeaf::Typed(Value::String(s.clone())),
            JsonValue::Boolean(b) => NativeLeaf::Typed(Value::Boolean(*b)),
            JsonValue::Number(n) => NativeLeaf::Typed(n.to_value()),
            JsonValue::Raw(raw) => NativeLeaf::Structure(Some(raw.clone())),
            container if container.is_empty_container() => NativeLeaf::Structure(None),
            _ => NativeLeaf::Structure(Some(serialize_node_compact(node))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::node::JsonNumber;

    #[test]
    fn test_empty_tree_root_is_object() {
        let tree = JsonTree::empty();
        assert_eq!(tree.kind(&TreeBackend::root(&tree)), NodeKind::Object);
    }

    #[test]
    fn test_ensure_child_object_is_idempotent() {
        let mut tree = JsonTree::empty();
        let root = TreeBackend::root(&tree);
        let first = tree.ensure_child_object(&root, "address").unwrap();
        let second = tree.ensure_child_object(&root, "address").unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.element_count(&root), 0);
    }

    #[test]
    fn test_ensure_child_object_over_leaf_conflicts() {
        let mut tree = JsonTree::empty();
        let root = TreeBackend::root(&tree);
        let leaf = tree.ensure_child_leaf(&root, "name").unwrap();
        tree.set_leaf(&leaf, Some(Value::String("x".into()))).unwrap();
        let err = tree.ensure_child_object(&root, "name").unwrap_err();
        assert_eq!(err, TreeError::kind_conflict("object", "leaf"));
    }

    #[test]
    fn test_grow_array_never_shrinks() {
        let mut tree = JsonTree::empty();
        let root = TreeBackend::root(&tree);
        let array = tree
            .ensure_child_array(&root, "items", CollectionKind::Array)
            .unwrap();
        tree.grow_array_to(&array, 3, Placeholder::Leaf).unwrap();
        tree.grow_array_to(&array, 1, Placeholder::Leaf).unwrap();
        assert_eq!(tree.element_count(&array), 3);
        assert_eq!(tree.kind(&tree.child_indexed(&array, 2).unwrap()), NodeKind::Null);
    }

    #[test]
    fn test_set_leaf_over_populated_object_conflicts() {
        let mut tree = JsonTree::empty();
        let root = TreeBackend::root(&tree);
        let obj = tree.ensure_child_object(&root, "a").unwrap();
        let inner = tree.ensure_child_leaf(&obj, "b").unwrap();
        tree.set_leaf(&inner, Some(Value::Integer(1))).unwrap();
        assert!(tree.set_leaf(&obj, Some(Value::Integer(2))).is_err());
    }

    #[test]
    fn test_get_leaf_reports_number_kind() {
        let mut tree = JsonTree::empty();
        let root = TreeBackend::root(&tree);
        let leaf = tree.ensure_child_leaf(&root, "n").unwrap();
        tree.set_leaf(&leaf, Some(Value::Long(5))).unwrap();
        assert_eq!(tree.get_leaf(&leaf), NativeLeaf::Typed(Value::Long(5)));
        assert_eq!(
            tree.get_node(&leaf).unwrap().value(),
            &JsonValue::Number(JsonNumber::Long(5))
        );
    }
}
