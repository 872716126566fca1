//! In-memory object graph backend.
//!
//! Instances live in an arena and refer to each other by [`ObjectId`]. Each
//! instance holds named slots; a slot is empty, a scalar, a reference to
//! another instance, or a collection. Declared field types come from the
//! graph's [`ClassModel`] and are reported to the codec, so values read
//! back with the type they were declared with.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use super::model::{ClassModel, ClassRegistry, FieldDecl};
use crate::error::TreeError;
use crate::field::{FieldType, Value};
use crate::path::CollectionKind;
use crate::tree::{NativeLeaf, NodeKind, Placeholder, TreeBackend};

/// Index of an instance in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Contents of a field or collection element.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot {
    #[default]
    Null,
    Value(Value),
    Object(ObjectId),
    Collection(Collection),
}

/// A collection field.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub kind: CollectionKind,
    /// Implementation name chosen by the class model.
    pub implementation: String,
    pub element_class: Option<String>,
    pub items: Vec<Slot>,
}

/// One object in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub class_name: Option<String>,
    pub fields: IndexMap<String, Slot>,
}

/// Node handle for the object-graph backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectNode {
    Instance(ObjectId),
    Field { owner: ObjectId, field: String },
    Element { owner: ObjectId, field: String, index: usize },
}

/// An object graph with a single root instance.
#[derive(Debug, Clone)]
pub struct ObjectGraph<M: ClassModel = ClassRegistry> {
    model: M,
    objects: Vec<Instance>,
    root: ObjectId,
}

impl<M: ClassModel> ObjectGraph<M> {
    /// Creates a graph whose root is a fresh instance of `root_class`
    /// (dynamic when `None`).
    ///
    /// # Errors
    ///
    /// Fails if the model cannot instantiate the root class.
    pub fn new(model: M, root_class: Option<&str>) -> Result<Self, TreeError> {
        let mut graph = Self {
            model,
            objects: Vec::new(),
            root: ObjectId(0),
        };
        graph.root = graph.instantiate(root_class)?;
        Ok(graph)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn root_id(&self) -> ObjectId {
        self.root
    }

    pub fn instance(&self, id: ObjectId) -> &Instance {
        &self.objects[id.0]
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn instantiate(&mut self, class_name: Option<&str>) -> Result<ObjectId, TreeError> {
        let declared = self.model.instantiate(class_name)?;
        let id = ObjectId(self.objects.len());
        self.objects.push(Instance {
            class_name: class_name.map(str::to_string),
            fields: declared.into_iter().map(|name| (name, Slot::Null)).collect(),
        });
        Ok(id)
    }

    fn decl(&self, owner: ObjectId, field: &str) -> Result<Option<FieldDecl>, TreeError> {
        let class = self.objects[owner.0].class_name.as_deref();
        Ok(self.model.field_decl(class, field)?.cloned())
    }

    fn slot(&self, node: &ObjectNode) -> Option<&Slot> {
        match node {
            ObjectNode::Instance(_) => None,
            ObjectNode::Field { owner, field } => self.objects[owner.0].fields.get(field),
            ObjectNode::Element { owner, field, index } => {
                match self.objects[owner.0].fields.get(field)? {
                    Slot::Collection(collection) => collection.items.get(*index),
                    _ => None,
                }
            }
        }
    }

    fn slot_mut(&mut self, node: &ObjectNode) -> Result<&mut Slot, TreeError> {
        let missing = || TreeError::kind_conflict("field", "missing");
        match node {
            ObjectNode::Instance(_) => Err(TreeError::kind_conflict("field", "object")),
            ObjectNode::Field { owner, field } => {
                self.objects[owner.0].fields.get_mut(field).ok_or_else(missing)
            }
            ObjectNode::Element { owner, field, index } => {
                match self.objects[owner.0].fields.get_mut(field) {
                    Some(Slot::Collection(collection)) => {
                        collection.items.get_mut(*index).ok_or_else(missing)
                    }
                    _ => Err(missing()),
                }
            }
        }
    }

    /// The instance a handle refers to, if it refers to one.
    fn object_of(&self, node: &ObjectNode) -> Option<ObjectId> {
        match node {
            ObjectNode::Instance(id) => Some(*id),
            _ => match self.slot(node)? {
                Slot::Object(id) => Some(*id),
                _ => None,
            },
        }
    }

    fn object_for_write(&self, node: &ObjectNode) -> Result<ObjectId, TreeError> {
        match self.object_of(node) {
            Some(id) => Ok(id),
            None => Err(TreeError::kind_conflict("object", self.kind(node).as_str())),
        }
    }

    fn collection_mut(&mut self, node: &ObjectNode) -> Result<&mut Collection, TreeError> {
        match self.slot_mut(node)? {
            Slot::Collection(collection) => Ok(collection),
            _ => Err(TreeError::kind_conflict("array", "field")),
        }
    }

    /// Renders the graph from the root as JSON.
    pub fn to_json(&self) -> Json {
        self.object_json(self.root)
    }

    fn object_json(&self, id: ObjectId) -> Json {
        let fields = self.objects[id.0]
            .fields
            .iter()
            .map(|(name, slot)| (name.clone(), self.slot_json(slot)))
            .collect::<Map<_, _>>();
        Json::Object(fields)
    }

    fn slot_json(&self, slot: &Slot) -> Json {
        match slot {
            Slot::Null => Json::Null,
            Slot::Value(value) => value.to_json(),
            Slot::Object(id) => self.object_json(*id),
            Slot::Collection(collection) => {
                Json::Array(collection.items.iter().map(|item| self.slot_json(item)).collect())
            }
        }
    }
}

impl<M: ClassModel> TreeBackend for ObjectGraph<M> {
    type Node = ObjectNode;

    fn root(&self) -> ObjectNode {
        ObjectNode::Instance(self.root)
    }

    fn kind(&self, node: &ObjectNode) -> NodeKind {
        if let ObjectNode::Instance(_) = node {
            return NodeKind::Object;
        }
        match self.slot(node) {
            None => NodeKind::Missing,
            Some(Slot::Null) => NodeKind::Null,
            Some(Slot::Value(_)) => NodeKind::Leaf,
            Some(Slot::Object(_)) => NodeKind::Object,
            Some(Slot::Collection(_)) => NodeKind::Array,
        }
    }

    fn child_named(&self, node: &ObjectNode, name: &str) -> Option<ObjectNode> {
        let owner = self.object_of(node)?;
        if !self.objects[owner.0].fields.contains_key(name) {
            return None;
        }
        Some(ObjectNode::Field {
            owner,
            field: name.to_string(),
        })
    }

    fn child_indexed(&self, node: &ObjectNode, index: usize) -> Option<ObjectNode> {
        match (node, self.slot(node)?) {
            (ObjectNode::Field { owner, field }, Slot::Collection(collection))
                if index < collection.items.len() =>
            {
                Some(ObjectNode::Element {
                    owner: *owner,
                    field: field.clone(),
                    index,
                })
            }
            _ => None,
        }
    }

    fn element_count(&self, node: &ObjectNode) -> usize {
        match self.slot(node) {
            Some(Slot::Collection(collection)) => collection.items.len(),
            _ => 0,
        }
    }

    fn ensure_child_object(&mut self, node: &ObjectNode, name: &str) -> Result<ObjectNode, TreeError> {
        let owner = self.object_for_write(node)?;
        let decl = self.decl(owner, name)?;
        match &decl {
            Some(decl) if decl.is_collection() => {
                return Err(TreeError::kind_conflict("object", "array"));
            }
            Some(decl) if decl.is_scalar() => {
                return Err(TreeError::kind_conflict("object", "leaf"));
            }
            _ => {}
        }
        let handle = ObjectNode::Field {
            owner,
            field: name.to_string(),
        };
        match self.objects[owner.0].fields.get(name) {
            Some(Slot::Object(_)) => return Ok(handle),
            Some(Slot::Value(_)) => return Err(TreeError::kind_conflict("object", "leaf")),
            Some(Slot::Collection(_)) => return Err(TreeError::kind_conflict("object", "array")),
            Some(Slot::Null) | None => {}
        }
        let class_name = decl.and_then(|decl| decl.class_name);
        let child = self.instantiate(class_name.as_deref())?;
        self.objects[owner.0]
            .fields
            .insert(name.to_string(), Slot::Object(child));
        Ok(handle)
    }

    fn ensure_child_array(
        &mut self,
        node: &ObjectNode,
        name: &str,
        kind: CollectionKind,
    ) -> Result<ObjectNode, TreeError> {
        let owner = self.object_for_write(node)?;
        let decl = self.decl(owner, name)?;
        if let Some(decl) = &decl {
            if !decl.is_collection() {
                let found = if decl.is_object() { "object" } else { "leaf" };
                return Err(TreeError::kind_conflict("array", found));
            }
        }
        let handle = ObjectNode::Field {
            owner,
            field: name.to_string(),
        };
        match self.objects[owner.0].fields.get(name) {
            Some(Slot::Collection(_)) => return Ok(handle),
            Some(Slot::Value(_)) => return Err(TreeError::kind_conflict("array", "leaf")),
            Some(Slot::Object(_)) => return Err(TreeError::kind_conflict("array", "object")),
            Some(Slot::Null) | None => {}
        }
        let kind = match &decl {
            Some(decl) => decl.collection,
            None => kind,
        };
        let collection = Collection {
            kind,
            implementation: self.model.default_collection_impl(kind).to_string(),
            element_class: decl.and_then(|decl| decl.class_name),
            items: Vec::new(),
        };
        tracing::debug!(field = name, implementation = %collection.implementation, "created collection");
        self.objects[owner.0]
            .fields
            .insert(name.to_string(), Slot::Collection(collection));
        Ok(handle)
    }

    fn ensure_child_leaf(&mut self, node: &ObjectNode, name: &str) -> Result<ObjectNode, TreeError> {
        let owner = self.object_for_write(node)?;
        match self.decl(owner, name)? {
            Some(decl) if decl.is_collection() => {
                return Err(TreeError::kind_conflict("leaf", "array"));
            }
            Some(decl) if decl.is_object() => {
                return Err(TreeError::kind_conflict("leaf", "object"));
            }
            _ => {}
        }
        self.objects[owner.0]
            .fields
            .entry(name.to_string())
            .or_insert(Slot::Null);
        Ok(ObjectNode::Field {
            owner,
            field: name.to_string(),
        })
    }

    fn grow_array_to(
        &mut self,
        array: &ObjectNode,
        len: usize,
        placeholder: Placeholder,
    ) -> Result<(), TreeError> {
        let collection = self.collection_mut(array)?;
        let missing = len.saturating_sub(collection.items.len());
        let element_class = collection.element_class.clone();

        let mut padding = Vec::with_capacity(missing);
        for _ in 0..missing {
            padding.push(match placeholder {
                Placeholder::Leaf => Slot::Null,
                Placeholder::Object => Slot::Object(self.instantiate(element_class.as_deref())?),
            });
        }
        self.collection_mut(array)?.items.extend(padding);
        Ok(())
    }

    fn ensure_element_object(&mut self, array: &ObjectNode, index: usize) -> Result<ObjectNode, TreeError> {
        let (owner, field) = match array {
            ObjectNode::Field { owner, field } => (*owner, field.clone()),
            _ => return Err(TreeError::kind_conflict("array", "element")),
        };
        let element = ObjectNode::Element { owner, field, index };
        let element_class = self.collection_mut(array)?.element_class.clone();
        match self.slot(&element) {
            Some(Slot::Object(_)) => return Ok(element),
            Some(Slot::Null) => {}
            Some(Slot::Value(_)) => return Err(TreeError::kind_conflict("object", "leaf")),
            Some(Slot::Collection(_)) => return Err(TreeError::kind_conflict("object", "array")),
            None => return Err(TreeError::kind_conflict("object", "missing")),
        }
        let child = self.instantiate(element_class.as_deref())?;
        *self.slot_mut(&element)? = Slot::Object(child);
        Ok(element)
    }

    fn set_leaf(&mut self, node: &ObjectNode, value: Option<Value>) -> Result<(), TreeError> {
        if let (Some(declared), Some(value)) = (self.declared_type(node), &value) {
            if declared != FieldType::Complex && value.field_type() != declared {
                let field = match node {
                    ObjectNode::Field { field, .. } | ObjectNode::Element { field, .. } => field.clone(),
                    ObjectNode::Instance(id) => id.to_string(),
                };
                return Err(TreeError::DeclaredType {
                    field,
                    declared,
                    found: value.field_type(),
                });
            }
        }
        let slot = self.slot_mut(node)?;
        match &*slot {
            Slot::Object(_) => return Err(TreeError::kind_conflict("leaf", "object")),
            Slot::Collection(collection) if !collection.items.is_empty() => {
                return Err(TreeError::kind_conflict("leaf", "array"));
            }
            _ => {}
        }
        *slot = match value {
            Some(value) => Slot::Value(value),
            None => Slot::Null,
        };
        Ok(())
    }

    fn get_leaf(&self, node: &ObjectNode) -> NativeLeaf {
        let slot = match node {
            ObjectNode::Instance(id) => {
                return NativeLeaf::Structure(Some(self.object_json(*id).to_string()));
            }
            _ => match self.slot(node) {
                Some(slot) => slot,
                None => return NativeLeaf::Null,
            },
        };
        match slot {
            Slot::Null => NativeLeaf::Null,
            Slot::Value(Value::Complex(raw)) => NativeLeaf::Structure(Some(raw.clone())),
            Slot::Value(value) => NativeLeaf::Typed(value.clone()),
            Slot::Collection(collection) if collection.items.is_empty() => NativeLeaf::Structure(None),
            other => NativeLeaf::Structure(Some(self.slot_json(other).to_string())),
        }
    }

    fn declared_type(&self, node: &ObjectNode) -> Option<FieldType> {
        match node {
            ObjectNode::Field { owner, field } | ObjectNode::Element { owner, field, .. } => self
                .decl(*owner, field)
                .ok()
                .flatten()
                .and_then(|decl| decl.field_type),
            ObjectNode::Instance(_) => None,
        }
    }
}
