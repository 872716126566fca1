//! JSON tree backend.
//!
//! JSON documents are parsed into an owned [`JsonTree`] of [`JsonNode`]s.
//! Nodes are addressed by index paths (`Vec<usize>`), the same addressing
//! the tree uses for navigation: object entries by insertion position,
//! array elements by index. Growth only appends, so handles stay valid
//! across writes.

pub mod node;
pub mod parser;
pub mod serialize;
pub mod tree;

pub use node::{JsonNode, JsonNumber, JsonValue};
pub use parser::{parse_json, parse_json_with, JsonParseOptions};
pub use serialize::{serialize_node, serialize_node_compact};
pub use tree::JsonTree;
