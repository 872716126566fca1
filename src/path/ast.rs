//! Segment model for field path expressions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PathError;
use super::parser::Parser;

/// Collection marker carried by a path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Plain segment, no marker.
    #[default]
    None,
    /// `[]` - arrays, JSON arrays, repeated XML elements.
    Array,
    /// `<>` - list-style collections.
    List,
    /// `{}` - map-style collections.
    Map,
}

impl CollectionKind {
    /// Opening and closing bracket for this marker, if any.
    pub fn brackets(self) -> Option<(char, char)> {
        match self {
            CollectionKind::None => None,
            CollectionKind::Array => Some(('[', ']')),
            CollectionKind::List => Some(('<', '>')),
            CollectionKind::Map => Some(('{', '}')),
        }
    }

    /// Maps an opening bracket to its collection kind.
    pub fn from_open(ch: char) -> Option<Self> {
        match ch {
            '[' => Some(CollectionKind::Array),
            '<' => Some(CollectionKind::List),
            '{' => Some(CollectionKind::Map),
            _ => None,
        }
    }

    pub fn is_collection(self) -> bool {
        self != CollectionKind::None
    }
}

/// One slash-delimited component of a path.
///
/// The name is stored without its collection marker. `index` is only
/// meaningful for collection segments; `None` there means "every element".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    name: String,
    collection: CollectionKind,
    index: Option<u32>,
}

impl PathSegment {
    /// Creates a plain (non-collection) segment.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: CollectionKind::None,
            index: None,
        }
    }

    /// Creates a collection segment, optionally indexed.
    pub fn collection(name: impl Into<String>, kind: CollectionKind, index: Option<u32>) -> Self {
        let index = if kind.is_collection() { index } else { None };
        Self {
            name: name.into(),
            collection: kind,
            index,
        }
    }

    fn root() -> Self {
        Self::named("")
    }

    /// Clean name, without collection marker.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection_kind(&self) -> CollectionKind {
        self.collection
    }

    pub fn is_collection(&self) -> bool {
        self.collection.is_collection()
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// True for a collection segment that names a concrete element.
    pub fn is_indexed(&self) -> bool {
        self.is_collection() && self.index.is_some()
    }

    /// True for `@name` segments, which address XML attributes.
    pub fn is_attribute(&self) -> bool {
        self.name.starts_with('@')
    }

    /// Namespace alias of a `prefix:local` name.
    pub fn prefix(&self) -> Option<&str> {
        let bare = self.name.trim_start_matches('@');
        bare.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Name with the attribute marker and namespace alias removed.
    pub fn local_name(&self) -> &str {
        let bare = self.name.trim_start_matches('@');
        match bare.split_once(':') {
            Some((_, local)) => local,
            None => bare,
        }
    }

    /// Returns a copy of this segment with its index replaced.
    pub fn with_index(&self, index: Option<u32>) -> Self {
        Self::collection(self.name.clone(), self.collection, index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some((open, close)) = self.collection.brackets() {
            match self.index {
                Some(index) => write!(f, "{}{}{}", open, index, close)?,
                None => write!(f, "{}{}", open, close)?,
            }
        }
        Ok(())
    }
}

/// A parsed field path.
///
/// The first segment always stands for the document root and has an empty
/// name; the last segment names the field being read or written. Paths are
/// never mutated in place: index assignment produces a derived copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    segments: Vec<PathSegment>,
}

impl PathExpression {
    /// The path addressing the document root itself.
    pub fn root() -> Self {
        Self {
            segments: vec![PathSegment::root()],
        }
    }

    /// Builds a path from the segments below the root.
    pub fn from_segments(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        let mut path = Self::root();
        path.segments.extend(segments);
        path
    }

    /// Parses a path string.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] for unbalanced collection markers, non-numeric
    /// indices and markers without a name.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        Parser::parse(raw)
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Segments below the root.
    pub fn field_segments(&self) -> &[PathSegment] {
        &self.segments[1..]
    }

    /// Number of segments below the root.
    pub fn len(&self) -> usize {
        self.segments.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_root(&self) -> bool {
        self.is_empty()
    }

    /// Any segment is a collection segment.
    pub fn has_collection(&self) -> bool {
        self.field_segments().iter().any(PathSegment::is_collection)
    }

    /// Some collection segment carries a concrete index.
    pub fn is_indexed_collection(&self) -> bool {
        self.field_segments().iter().any(PathSegment::is_indexed)
    }

    /// Some collection segment has no index, so reading fans out.
    pub fn has_unindexed_collection(&self) -> bool {
        self.field_segments()
            .iter()
            .any(|segment| segment.is_collection() && segment.index().is_none())
    }

    pub fn collection_segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.field_segments().iter().filter(|s| s.is_collection())
    }

    /// The leaf segment, or `None` for the root path.
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.field_segments().last()
    }

    /// The path without its leaf segment. The parent of the root is the root.
    pub fn parent_path(&self) -> Self {
        let mut segments = self.segments.clone();
        if segments.len() > 1 {
            segments.pop();
        }
        Self { segments }
    }

    /// Appends a segment, returning the longer path.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// The sub-path that follows the first collection segment named `name`.
    ///
    /// Used to re-root element paths when a group is fanned out.
    pub fn segment_after(&self, name: &str) -> Option<Self> {
        let position = self
            .field_segments()
            .iter()
            .position(|segment| segment.is_collection() && segment.name() == name)?;
        Some(Self::from_segments(
            self.field_segments()[position + 1..].iter().cloned(),
        ))
    }

    /// Returns a copy with the index of the first segment named
    /// `segment_name` set to `index`.
    ///
    /// # Errors
    ///
    /// [`PathError::UnknownSegment`] if no segment has that name,
    /// [`PathError::NotACollection`] if it carries no collection marker.
    pub fn with_index_at(&self, segment_name: &str, index: u32) -> Result<Self, PathError> {
        let position = self
            .segments
            .iter()
            .skip(1)
            .position(|segment| segment.name() == segment_name)
            .map(|p| p + 1)
            .ok_or_else(|| PathError::UnknownSegment {
                segment: segment_name.to_string(),
            })?;

        let segment = &self.segments[position];
        if !segment.is_collection() {
            return Err(PathError::NotACollection {
                segment: segment.to_string(),
            });
        }

        let mut segments = self.segments.clone();
        segments[position] = segment.with_index(Some(index));
        Ok(Self { segments })
    }

    /// Copies concrete indices from `source` onto this path's collection
    /// segments, pairing them by ordinal position.
    ///
    /// Segments already indexed here keep their index; surplus collection
    /// segments on either side are left untouched.
    pub fn with_indexes_from(&self, source: &PathExpression) -> Self {
        let mut source_indexes = source.collection_segments().map(PathSegment::index);
        let segments = self
            .segments
            .iter()
            .map(|segment| {
                if !segment.is_collection() {
                    return segment.clone();
                }
                match (segment.index(), source_indexes.next().flatten()) {
                    (None, Some(index)) => segment.with_index(Some(index)),
                    _ => segment.clone(),
                }
            })
            .collect();
        Self { segments }
    }

    /// Gives every still-unindexed collection segment the index `index`.
    pub fn fill_indexes(&self, index: u32) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|segment| {
                if segment.is_collection() && segment.index().is_none() {
                    segment.with_index(Some(index))
                } else {
                    segment.clone()
                }
            })
            .collect();
        Self { segments }
    }

    /// The same segment shape with every index removed.
    pub fn clear_indexes(&self) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|segment| segment.with_index(None))
            .collect();
        Self { segments }
    }
}

impl Default for PathExpression {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "/");
        }
        for segment in self.field_segments() {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for PathExpression {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
