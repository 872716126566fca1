//! Arena-backed XML element tree.
//!
//! Elements live in a flat arena and refer to each other by [`NodeId`].
//! XML has no native array type: a collection segment names the run of
//! same-named children under one parent, and an index picks the nth of
//! them. The path's collection marker, not the number of siblings present,
//! decides whether a name is treated as a collection, so a single
//! `<order>` is still a one-element collection when addressed as
//! `order[]`.

use indexmap::IndexMap;

use super::serialize::serialize_element;
use crate::error::TreeError;
use crate::field::Value;
use crate::path::CollectionKind;
use crate::tree::{NativeLeaf, NodeKind, Placeholder, TreeBackend};

/// Index of an element in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// One XML element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `ns:order`.
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<NodeId>,
    pub text: Option<String>,
    /// Pre-serialized content emitted verbatim after the children.
    pub raw: Option<String>,
    pub parent: Option<NodeId>,
}

impl XmlElement {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            ..Self::default()
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    fn is_empty(&self) -> bool {
        self.children.is_empty()
            && self.text.is_none()
            && self.raw.is_none()
            && self.attributes.is_empty()
    }
}

/// Caller-supplied namespace alias table.
pub type NamespaceTable = IndexMap<String, String>;

/// Node handle for the XML backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum XmlNode {
    /// The document itself; its only child is the document element.
    Document,
    Element(NodeId),
    /// Every child of `parent` named `name`, seen as an array.
    Siblings {
        parent: Option<NodeId>,
        name: String,
    },
    Attribute {
        element: NodeId,
        name: String,
    },
}

/// An XML document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlDocument {
    elements: Vec<XmlElement>,
    root: Option<NodeId>,
    namespaces: NamespaceTable,
}

impl XmlDocument {
    /// Creates a document with no document element.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the alias → URI table used to match `prefix:name` segments.
    pub fn with_namespaces(mut self, namespaces: NamespaceTable) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.root
    }

    pub fn element(&self, id: NodeId) -> &XmlElement {
        &self.elements[id.0]
    }

    pub fn element_mut(&mut self, id: NodeId) -> &mut XmlElement {
        &mut self.elements[id.0]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Appends an element at the end of `parent`'s children, in document
    /// order. Used while parsing.
    pub(crate) fn push_element(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
    ) -> Result<NodeId, TreeError> {
        if parent.is_none() && self.root.is_some() {
            return Err(TreeError::unsupported(format!(
                "document already has a root element, cannot add '{}'",
                name
            )));
        }
        let id = NodeId(self.elements.len());
        self.elements.push(XmlElement::new(name, parent));
        match parent {
            Some(parent) => self.elements[parent.0].children.push(id),
            None => self.root = Some(id),
        }
        Ok(id)
    }

    /// Appends a new element under `parent` (or as document element).
    ///
    /// # Errors
    ///
    /// A document holds a single document element; adding a second one
    /// is a [`TreeError`].
    pub fn append_element(&mut self, parent: Option<NodeId>, name: &str) -> Result<NodeId, TreeError> {
        // Keep same-named siblings together.
        let position = parent.map(|parent| {
            let children = &self.elements[parent.0].children;
            children
                .iter()
                .rposition(|child| self.elements[child.0].name == name)
                .map(|p| p + 1)
                .unwrap_or(children.len())
        });
        let id = self.push_element(parent, name)?;
        if let (Some(parent), Some(position)) = (parent, position) {
            let children = &mut self.elements[parent.0].children;
            children.pop();
            children.insert(position, id);
        }
        self.declare_prefix(id, name);
        Ok(id)
    }

    /// Adds an `xmlns:prefix` declaration on the document element when a
    /// new element uses an aliased prefix nobody declares yet.
    fn declare_prefix(&mut self, id: NodeId, name: &str) {
        let prefix = match name.trim_start_matches('@').split_once(':') {
            Some((prefix, _)) if prefix != "xml" && prefix != "xmlns" => prefix.to_string(),
            _ => return,
        };
        let uri = match self.namespaces.get(&prefix) {
            Some(uri) => uri.clone(),
            None => return,
        };
        if self.namespace_uri(id, Some(&prefix)).is_some() {
            return;
        }
        let holder = self.root.unwrap_or(id);
        self.elements[holder.0]
            .attributes
            .insert(format!("xmlns:{}", prefix), uri);
    }

    /// Resolves a prefix (or the default namespace for `None`) in scope at
    /// `id` by walking up `xmlns` declarations.
    pub fn namespace_uri(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        let attribute = match prefix {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        };
        let mut current = Some(id);
        while let Some(node) = current {
            let element = &self.elements[node.0];
            if let Some(uri) = element.attributes.get(&attribute) {
                return Some(uri.as_str());
            }
            current = element.parent;
        }
        None
    }

    /// Does the element `id` answer to the segment name `name`?
    ///
    /// Exact qualified-name match always counts. A prefixed segment also
    /// matches an element in the same namespace under another prefix, when
    /// the alias table knows the segment's prefix.
    fn name_matches(&self, id: NodeId, name: &str) -> bool {
        let element = &self.elements[id.0];
        if element.name == name {
            return true;
        }
        let (prefix, local) = match name.split_once(':') {
            Some(parts) => parts,
            None => return false,
        };
        if element.local_name() != local {
            return false;
        }
        let wanted = match self.namespaces.get(prefix) {
            Some(uri) => uri.as_str(),
            None => return false,
        };
        self.namespace_uri(id, element.prefix()) == Some(wanted)
    }

    /// Children of `parent` (or the document element) matching `name`.
    pub fn children_named(&self, parent: Option<NodeId>, name: &str) -> Vec<NodeId> {
        match parent {
            Some(parent) => self.elements[parent.0]
                .children
                .iter()
                .copied()
                .filter(|child| self.name_matches(*child, name))
                .collect(),
            None => self
                .root
                .filter(|root| self.name_matches(*root, name))
                .into_iter()
                .collect(),
        }
    }

    fn attribute_key(&self, element: NodeId, name: &str) -> Option<String> {
        let bare = name.trim_start_matches('@');
        let attributes = &self.elements[element.0].attributes;
        if attributes.contains_key(bare) {
            return Some(bare.to_string());
        }
        let (prefix, local) = bare.split_once(':')?;
        let wanted = self.namespaces.get(prefix)?;
        attributes
            .keys()
            .find(|key| match key.split_once(':') {
                Some((p, l)) => {
                    l == local && self.namespace_uri(element, Some(p)) == Some(wanted.as_str())
                }
                None => false,
            })
            .cloned()
    }

    /// The element a handle stands for when used as a parent.
    fn as_parent(&self, node: &XmlNode) -> Option<Option<NodeId>> {
        match node {
            XmlNode::Document => Some(None),
            XmlNode::Element(id) => Some(Some(*id)),
            XmlNode::Siblings { parent, name } => self
                .children_named(*parent, name)
                .first()
                .map(|first| Some(*first)),
            XmlNode::Attribute { .. } => None,
        }
    }

    fn first_or_append(&mut self, parent: Option<NodeId>, name: &str) -> Result<NodeId, TreeError> {
        match self.children_named(parent, name).first() {
            Some(existing) => Ok(*existing),
            None => self.append_element(parent, name),
        }
    }

    fn parent_for_write(&mut self, node: &XmlNode) -> Result<Option<NodeId>, TreeError> {
        match node {
            XmlNode::Document => Ok(None),
            XmlNode::Element(id) => Ok(Some(*id)),
            XmlNode::Siblings { parent, name } => {
                let (parent, name) = (*parent, name.clone());
                self.first_or_append(parent, &name).map(Some)
            }
            XmlNode::Attribute { .. } => Err(TreeError::kind_conflict("element", "attribute")),
        }
    }

    /// Like `parent_for_write`, but refuses elements that already hold text
    /// or raw content, since child elements would turn them into mixed content.
    fn parent_for_children(&mut self, node: &XmlNode) -> Result<Option<NodeId>, TreeError> {
        let parent = self.parent_for_write(node)?;
        if let Some(id) = parent {
            let element = self.element(id);
            if element.children.is_empty() && (element.text.is_some() || element.raw.is_some()) {
                return Err(TreeError::kind_conflict("element", "leaf"));
            }
        }
        Ok(parent)
    }
}

impl TreeBackend for XmlDocument {
    type Node = XmlNode;

    fn root(&self) -> XmlNode {
        XmlNode::Document
    }

    fn kind(&self, node: &XmlNode) -> NodeKind {
        match node {
            XmlNode::Document => NodeKind::Object,
            XmlNode::Siblings { .. } => NodeKind::Array,
            XmlNode::Attribute { element, name } => {
                if self.attribute_key(*element, name).is_some() {
                    NodeKind::Leaf
                } else {
                    NodeKind::Missing
                }
            }
            XmlNode::Element(id) => {
                let element = self.element(*id);
                if !element.children.is_empty() || element.raw.is_some() {
                    NodeKind::Object
                } else if element.text.is_some() {
                    NodeKind::Leaf
                } else if element.attributes.is_empty() {
                    NodeKind::Null
                } else {
                    NodeKind::Object
                }
            }
        }
    }

    fn child_named(&self, node: &XmlNode, name: &str) -> Option<XmlNode> {
        // A plain name on a repeated element resolves against the first one.
        let parent = self.as_parent(node)?;
        if name.starts_with('@') {
            let element = parent?;
            self.attribute_key(element, name)?;
            return Some(XmlNode::Attribute {
                element,
                name: name.to_string(),
            });
        }
        self.children_named(parent, name)
            .first()
            .map(|id| XmlNode::Element(*id))
    }

    fn collection_named(&self, node: &XmlNode, name: &str) -> Option<XmlNode> {
        if name.starts_with('@') {
            return self.child_named(node, name);
        }
        let parent = self.as_parent(node)?;
        if self.children_named(parent, name).is_empty() {
            return None;
        }
        Some(XmlNode::Siblings {
            parent,
            name: name.to_string(),
        })
    }

    fn child_indexed(&self, node: &XmlNode, index: usize) -> Option<XmlNode> {
        match node {
            XmlNode::Siblings { parent, name } => self
                .children_named(*parent, name)
                .get(index)
                .map(|id| XmlNode::Element(*id)),
            _ => None,
        }
    }

    fn element_count(&self, node: &XmlNode) -> usize {
        match node {
            XmlNode::Siblings { parent, name } => self.children_named(*parent, name).len(),
            _ => 0,
        }
    }

    fn ensure_child_object(&mut self, node: &XmlNode, name: &str) -> Result<XmlNode, TreeError> {
        if name.starts_with('@') {
            return Err(TreeError::kind_conflict("element", "attribute"));
        }
        let parent = self.parent_for_children(node)?;
        let id = self.first_or_append(parent, name)?;
        Ok(XmlNode::Element(id))
    }

    fn ensure_child_array(
        &mut self,
        node: &XmlNode,
        name: &str,
        _kind: CollectionKind,
    ) -> Result<XmlNode, TreeError> {
        if name.starts_with('@') {
            return Err(TreeError::kind_conflict("element", "attribute"));
        }
        let parent = self.parent_for_children(node)?;
        Ok(XmlNode::Siblings {
            parent,
            name: name.to_string(),
        })
    }

    fn ensure_child_leaf(&mut self, node: &XmlNode, name: &str) -> Result<XmlNode, TreeError> {
        if name.starts_with('@') {
            let element = self
                .parent_for_write(node)?
                .ok_or_else(|| TreeError::unsupported("the document itself has no attributes"))?;
            let key = self
                .attribute_key(element, name)
                .unwrap_or_else(|| name.trim_start_matches('@').to_string());
            self.declare_prefix(element, &key);
            return Ok(XmlNode::Attribute { element, name: key });
        }
        self.ensure_child_object(node, name)
    }

    fn grow_array_to(
        &mut self,
        array: &XmlNode,
        len: usize,
        _placeholder: Placeholder,
    ) -> Result<(), TreeError> {
        let (parent, name) = match array {
            XmlNode::Siblings { parent, name } => (*parent, name.clone()),
            _ => return Err(TreeError::kind_conflict("array", "element")),
        };
        let mut count = self.children_named(parent, &name).len();
        while count < len {
            self.append_element(parent, &name)?;
            count += 1;
        }
        Ok(())
    }

    fn ensure_element_object(&mut self, array: &XmlNode, index: usize) -> Result<XmlNode, TreeError> {
        self.child_indexed(array, index)
            .ok_or_else(|| TreeError::kind_conflict("element", "missing"))
    }

    fn set_leaf(&mut self, node: &XmlNode, value: Option<Value>) -> Result<(), TreeError> {
        match node {
            XmlNode::Attribute { element, name } => {
                let key = self
                    .attribute_key(*element, name)
                    .unwrap_or_else(|| name.trim_start_matches('@').to_string());
                let attributes = &mut self.element_mut(*element).attributes;
                match value {
                    Some(value) => {
                        attributes.insert(key, value.to_text());
                    }
                    None => {
                        attributes.shift_remove(&key);
                    }
                }
                Ok(())
            }
            XmlNode::Element(id) => {
                let element = self.element_mut(*id);
                match value {
                    Some(Value::Complex(raw)) => element.raw = Some(raw),
                    Some(value) => {
                        if !element.children.is_empty() {
                            return Err(TreeError::kind_conflict("text", "element content"));
                        }
                        element.text = Some(value.to_text());
                    }
                    None => element.text = None,
                }
                Ok(())
            }
            XmlNode::Document => Err(TreeError::kind_conflict("element", "document")),
            XmlNode::Siblings { .. } => Err(TreeError::kind_conflict("element", "array")),
        }
    }

    fn get_leaf(&self, node: &XmlNode) -> NativeLeaf {
        match node {
            XmlNode::Attribute { element, name } => match self.attribute_key(*element, name) {
                Some(key) => {
                    NativeLeaf::Text(self.element(*element).attributes[key.as_str()].clone())
                }
                None => NativeLeaf::Null,
            },
            XmlNode::Element(id) => {
                let element = self.element(*id);
                if element.children.is_empty() && element.raw.is_none() {
                    return match &element.text {
                        Some(text) => NativeLeaf::Text(text.clone()),
                        None if element.is_empty() => NativeLeaf::Null,
                        None => NativeLeaf::Structure(None),
                    };
                }
                NativeLeaf::Structure(Some(serialize_element(self, *id)))
            }
            XmlNode::Document => match self.root {
                Some(root) => NativeLeaf::Structure(Some(serialize_element(self, root))),
                None => NativeLeaf::Null,
            },
            XmlNode::Siblings { .. } => NativeLeaf::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> XmlDocument {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(None, "orders").unwrap();
        doc.append_element(Some(root), "order").unwrap();
        doc.append_element(Some(root), "note").unwrap();
        doc.append_element(Some(root), "order").unwrap();
        doc
    }

    #[test]
    fn test_same_named_siblings_stay_together() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        let names: Vec<_> = doc
            .element(root)
            .children
            .iter()
            .map(|c| doc.element(*c).name.clone())
            .collect();
        assert_eq!(names, vec!["order", "order", "note"]);
    }

    #[test]
    fn test_second_root_element_is_rejected() {
        let mut doc = sample();
        assert!(doc.append_element(None, "other").is_err());
    }

    #[test]
    fn test_siblings_are_an_array() {
        let doc = sample();
        let orders = doc.child_named(&XmlNode::Document, "orders").unwrap();
        let array = doc.collection_named(&orders, "order").unwrap();
        assert_eq!(doc.kind(&array), NodeKind::Array);
        assert_eq!(doc.element_count(&array), 2);
        assert!(doc.child_indexed(&array, 2).is_none());
    }

    #[test]
    fn test_namespace_match_through_alias_table() {
        let mut table = NamespaceTable::new();
        table.insert("x".into(), "urn:orders".into());
        let mut doc = XmlDocument::new().with_namespaces(table);
        let root = doc.append_element(None, "o:orders").unwrap();
        doc.element_mut(root)
            .attributes
            .insert("xmlns:o".into(), "urn:orders".into());

        assert!(doc.child_named(&XmlNode::Document, "x:orders").is_some());
        assert!(doc.child_named(&XmlNode::Document, "y:orders").is_none());
    }

    #[test]
    fn test_new_prefixed_element_declares_namespace() {
        let mut table = NamespaceTable::new();
        table.insert("x".into(), "urn:orders".into());
        let mut doc = XmlDocument::new().with_namespaces(table);
        let root = doc.append_element(None, "x:orders").unwrap();
        assert_eq!(
            doc.element(root).attributes.get("xmlns:x").map(String::as_str),
            Some("urn:orders")
        );
        doc.append_element(Some(root), "x:order").unwrap();
        assert_eq!(doc.element(root).attributes.len(), 1);
    }

    #[test]
    fn test_text_under_element_content_conflicts() {
        let mut doc = sample();
        let orders = XmlNode::Element(doc.root_element().unwrap());
        let err = doc.set_leaf(&orders, Some(Value::String("x".into())));
        assert!(err.is_err());
    }
}
