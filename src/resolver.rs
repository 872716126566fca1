//! Path resolution against a [`TreeBackend`].
//!
//! Reads fan out: each segment maps the set of current nodes to the set of
//! their matching children, so an unindexed collection segment turns one
//! node into one node per element. Missing branches simply drop out.
//!
//! Writes follow a single branch and create whatever is missing on the way.
//! Collections grow monotonically: padding below the requested index is
//! added but never touched again, so writes to different indices can come
//! in any order.

use crate::audit::AuditLog;
use crate::error::TreeError;
use crate::path::{PathExpression, PathSegment};
use crate::tree::{NodeKind, Placeholder, TreeBackend};

/// A node reached by a read, with the concrete path that reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<N> {
    pub node: N,
    /// The requested path with every collection index filled in.
    pub path: PathExpression,
}

/// Resolves `path` without modifying the tree.
///
/// Misses are dropped silently. Indices past the end of a collection are
/// dropped with a WARN audit.
pub fn read_walk<B: TreeBackend>(
    backend: &B,
    path: &PathExpression,
    audits: &mut AuditLog,
) -> Vec<Resolved<B::Node>> {
    let mut current = vec![Resolved {
        node: backend.root(),
        path: PathExpression::root(),
    }];

    for segment in path.field_segments() {
        let mut next = Vec::new();
        for resolved in &current {
            read_step(backend, resolved, segment, audits, &mut next);
        }
        if next.is_empty() {
            tracing::debug!(path = %path, segment = %segment, "no match");
            return next;
        }
        current = next;
    }
    current
}

fn read_step<B: TreeBackend>(
    backend: &B,
    from: &Resolved<B::Node>,
    segment: &PathSegment,
    audits: &mut AuditLog,
    out: &mut Vec<Resolved<B::Node>>,
) {
    if !segment.is_collection() {
        if let Some(node) = backend.child_named(&from.node, segment.name()) {
            out.push(Resolved {
                node,
                path: from.path.child(segment.clone()),
            });
        }
        return;
    }

    let child = match backend.collection_named(&from.node, segment.name()) {
        Some(child) => child,
        None => return,
    };
    let reached = |index: usize| from.path.child(segment.with_index(Some(index as u32)));

    match backend.kind(&child) {
        NodeKind::Array => match segment.index() {
            Some(index) => match backend.child_indexed(&child, index as usize) {
                Some(node) => out.push(Resolved {
                    node,
                    path: reached(index as usize),
                }),
                None => audits.warn(
                    from.path.child(segment.clone()),
                    format!(
                        "index {} is out of range, collection has {} elements",
                        index,
                        backend.element_count(&child)
                    ),
                ),
            },
            None => {
                for index in 0..backend.element_count(&child) {
                    if let Some(node) = backend.child_indexed(&child, index) {
                        out.push(Resolved {
                            node,
                            path: reached(index),
                        });
                    }
                }
            }
        },
        NodeKind::Null | NodeKind::Missing => {}
        // A single value where a collection was expected is element 0.
        NodeKind::Object | NodeKind::Leaf => match segment.index() {
            None | Some(0) => out.push(Resolved {
                node: child,
                path: reached(0),
            }),
            Some(index) => audits.warn(
                from.path.child(segment.clone()),
                format!(
                    "index {} is out of range, '{}' is a single value",
                    index,
                    segment.name()
                ),
            ),
        },
    }
}

/// Ensures every node on `path` exists and returns the leaf position.
///
/// With `structural_leaf` the last segment is created as an object rather
/// than a leaf. Returns `Ok(None)` when the path has a collection segment
/// without an index, since there is no way to tell which element to write;
/// a WARN audit is recorded.
///
/// # Errors
///
/// Returns the backend's [`TreeError`] when an existing node has the wrong
/// kind for the segment addressing it.
pub fn write_walk<B: TreeBackend>(
    backend: &mut B,
    path: &PathExpression,
    structural_leaf: bool,
    audits: &mut AuditLog,
) -> Result<Option<B::Node>, TreeError> {
    if let Some(segment) = path
        .field_segments()
        .iter()
        .find(|segment| segment.is_collection() && segment.index().is_none())
    {
        audits.warn(
            path,
            format!("collection segment '{}' has no index, write skipped", segment),
        );
        return Ok(None);
    }
    if path.field_segments().is_empty() {
        return Err(TreeError::unsupported("the document root cannot be written as a field"));
    }

    let mut node = backend.root();
    let last = path.len().saturating_sub(1);
    for (position, segment) in path.field_segments().iter().enumerate() {
        let as_leaf = position == last && !structural_leaf;
        node = match segment.index() {
            None if as_leaf => backend.ensure_child_leaf(&node, segment.name())?,
            None => backend.ensure_child_object(&node, segment.name())?,
            Some(index) => write_element(backend, &node, segment, index as usize, as_leaf, path)?,
        };
    }
    Ok(Some(node))
}

fn write_element<B: TreeBackend>(
    backend: &mut B,
    parent: &B::Node,
    segment: &PathSegment,
    index: usize,
    as_leaf: bool,
    path: &PathExpression,
) -> Result<B::Node, TreeError> {
    // An existing single value stands in for element 0.
    if let Some(existing) = backend.collection_named(parent, segment.name()) {
        let kind = backend.kind(&existing);
        if matches!(kind, NodeKind::Object | NodeKind::Leaf) {
            if index == 0 && (as_leaf || kind == NodeKind::Object) {
                return Ok(existing);
            }
            return Err(TreeError::kind_conflict("array", kind.as_str()));
        }
    }

    let array = backend.ensure_child_array(parent, segment.name(), segment.collection_kind())?;
    let before = backend.element_count(&array);
    let placeholder = if as_leaf {
        Placeholder::Leaf
    } else {
        Placeholder::Object
    };
    backend.grow_array_to(&array, index + 1, placeholder)?;
    if before < index + 1 {
        tracing::debug!(
            path = %path,
            segment = segment.name(),
            from = before,
            to = index + 1,
            "grew collection"
        );
    }

    if as_leaf {
        backend
            .child_indexed(&array, index)
            .ok_or_else(|| TreeError::kind_conflict("element", "missing"))
    } else {
        backend.ensure_element_object(&array, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Value;
    use crate::json::JsonTree;
    use crate::tree::NativeLeaf;

    fn path(raw: &str) -> PathExpression {
        PathExpression::parse(raw).unwrap()
    }

    #[test]
    fn test_write_walk_creates_intermediate_nodes() {
        let mut tree = JsonTree::empty();
        let mut audits = AuditLog::new("doc");
        let leaf = write_walk(&mut tree, &path("/a/b/c"), false, &mut audits)
            .unwrap()
            .unwrap();
        tree.set_leaf(&leaf, Some(Value::Integer(1))).unwrap();

        let found = read_walk(&tree, &path("/a/b/c"), &mut audits);
        assert_eq!(found.len(), 1);
        assert_eq!(tree.get_leaf(&found[0].node), NativeLeaf::Typed(Value::Integer(1)));
        assert!(audits.is_empty());
    }

    #[test]
    fn test_write_walk_abandons_unindexed_collection() {
        let mut tree = JsonTree::empty();
        let mut audits = AuditLog::new("doc");
        let leaf = write_walk(&mut tree, &path("/a[]/b"), false, &mut audits).unwrap();
        assert!(leaf.is_none());
        assert_eq!(audits.len(), 1);
        assert!(tree.child_named(&TreeBackend::root(&tree), "a").is_none());
    }

    #[test]
    fn test_terminal_array_padded_with_nulls() {
        let mut tree = JsonTree::empty();
        let mut audits = AuditLog::new("doc");
        write_walk(&mut tree, &path("/tags[2]"), false, &mut audits)
            .unwrap()
            .unwrap();
        let tags = tree.child_named(&TreeBackend::root(&tree), "tags").unwrap();
        assert_eq!(tree.element_count(&tags), 3);
        for index in 0..3 {
            let element = tree.child_indexed(&tags, index).unwrap();
            assert_eq!(tree.kind(&element), NodeKind::Null);
        }
    }

    #[test]
    fn test_read_walk_fans_out_with_concrete_paths() {
        let mut tree = JsonTree::empty();
        let mut audits = AuditLog::new("doc");
        for index in 0..3 {
            let raw = format!("/items[{}]/id", index);
            let leaf = write_walk(&mut tree, &path(&raw), false, &mut audits)
                .unwrap()
                .unwrap();
            tree.set_leaf(&leaf, Some(Value::Integer(index))).unwrap();
        }

        let found = read_walk(&tree, &path("/items[]/id"), &mut audits);
        let paths: Vec<String> = found.iter().map(|r| r.path.to_string()).collect();
        assert_eq!(paths, vec!["/items[0]/id", "/items[1]/id", "/items[2]/id"]);
    }

    #[test]
    fn test_read_walk_out_of_range_warns() {
        let mut tree = JsonTree::empty();
        let mut audits = AuditLog::new("doc");
        write_walk(&mut tree, &path("/items[0]/id"), false, &mut audits).unwrap();

        let found = read_walk(&tree, &path("/items[5]/id"), &mut audits);
        assert!(found.is_empty());
        assert_eq!(audits.len(), 1);
        assert_eq!(audits.entries()[0].path, "/items[5]");
    }

    #[test]
    fn test_single_value_is_element_zero() {
        let mut tree = JsonTree::empty();
        let mut audits = AuditLog::new("doc");
        let leaf = write_walk(&mut tree, &path("/address/city"), false, &mut audits)
            .unwrap()
            .unwrap();
        tree.set_leaf(&leaf, Some(Value::String("Oslo".into()))).unwrap();

        assert_eq!(read_walk(&tree, &path("/address[0]/city"), &mut audits).len(), 1);
        assert!(read_walk(&tree, &path("/address[1]/city"), &mut audits).is_empty());
        assert_eq!(audits.len(), 1);

        let again = write_walk(&mut tree, &path("/address[0]/city"), false, &mut audits).unwrap();
        assert_eq!(again, Some(leaf));
        assert!(write_walk(&mut tree, &path("/address[1]/city"), false, &mut audits).is_err());
    }
}
