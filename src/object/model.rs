//! Class model for in-memory object graphs.
//!
//! An object graph has no schema of its own. A [`ClassModel`] supplies one:
//! which classes exist, what fields they declare and of which types, and
//! which collection implementation new collections get. [`ClassRegistry`]
//! is a model populated explicitly by the host application.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::field::FieldType;
use crate::path::CollectionKind;

/// Declaration of one field of a class.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Scalar type of the field, or of its elements for collections.
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
    /// Class of the referenced object, or of the elements for collections.
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub collection: CollectionKind,
}

impl FieldDecl {
    pub fn scalar(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    pub fn object(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    pub fn collection_of(mut self, kind: CollectionKind) -> Self {
        self.collection = kind;
        self
    }

    pub fn is_collection(&self) -> bool {
        self.collection.is_collection()
    }

    /// True for a non-collection field holding a nested object.
    pub fn is_object(&self) -> bool {
        !self.is_collection() && self.class_name.is_some()
    }

    /// True for a non-collection field holding a scalar.
    pub fn is_scalar(&self) -> bool {
        !self.is_collection() && self.class_name.is_none()
    }
}

/// A class and its declared fields, in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDecl>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field declaration.
    pub fn field(mut self, name: impl Into<String>, decl: FieldDecl) -> Self {
        self.fields.insert(name.into(), decl);
        self
    }
}

/// Class metadata consulted by the object-graph backend.
pub trait ClassModel {
    /// Looks up a class. `None` means the class is unknown to the model.
    fn load_class(&self, name: &str) -> Option<&ClassDef>;

    /// Checks that `class_name` can be instantiated and returns the fields
    /// a fresh instance starts with.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownClass`] if the model refuses the class.
    fn instantiate(&self, class_name: Option<&str>) -> Result<Vec<String>, TreeError>;

    /// Implementation name recorded on collections created for `kind`.
    fn default_collection_impl(&self, kind: CollectionKind) -> &'static str;

    /// Declaration of `field` on `class_name`. `Ok(None)` for classes that
    /// accept any field.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownField`] when a known class does not declare it.
    fn field_decl(&self, class_name: Option<&str>, field: &str) -> Result<Option<&FieldDecl>, TreeError> {
        let class = match class_name.and_then(|name| self.load_class(name)) {
            Some(class) => class,
            None => return Ok(None),
        };
        match class.fields.get(field) {
            Some(decl) => Ok(Some(decl)),
            None => Err(TreeError::UnknownField {
                class: class.name.clone(),
                field: field.to_string(),
            }),
        }
    }
}

/// Explicitly populated class table.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassDef>,
    allow_dynamic: bool,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Creates an empty registry. Unregistered classes are dynamic: their
    /// instances accept any field.
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
            allow_dynamic: true,
        }
    }

    /// Creates a registry that refuses to instantiate unregistered classes.
    pub fn strict() -> Self {
        Self {
            allow_dynamic: false,
            ..Self::new()
        }
    }

    pub fn register(&mut self, class: ClassDef) -> &mut Self {
        self.classes.insert(class.name.clone(), class);
        self
    }

    pub fn with_class(mut self, class: ClassDef) -> Self {
        self.register(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassModel for ClassRegistry {
    fn load_class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    fn instantiate(&self, class_name: Option<&str>) -> Result<Vec<String>, TreeError> {
        let name = match class_name {
            Some(name) => name,
            None => return Ok(Vec::new()),
        };
        match self.classes.get(name) {
            Some(class) => Ok(class.fields.keys().cloned().collect()),
            None if self.allow_dynamic => Ok(Vec::new()),
            None => Err(TreeError::UnknownClass(name.to_string())),
        }
    }

    fn default_collection_impl(&self, kind: CollectionKind) -> &'static str {
        match kind {
            CollectionKind::None | CollectionKind::Array => "array",
            CollectionKind::List => "Vec",
            CollectionKind::Map => "IndexMap",
        }
    }
}
