//! XML DOM backend.
//!
//! Documents are parsed into an arena of elements ([`XmlDocument`]). Element
//! names may be namespace-qualified (`ns:name`); attribute segments start
//! with `@`. Prefixes are matched through a caller-supplied alias table.

pub mod dom;
pub mod parser;
pub mod serialize;

pub use dom::{NamespaceTable, NodeId, XmlDocument, XmlElement, XmlNode};
pub use parser::{parse_xml, parse_xml_with};
pub use serialize::{serialize_document, serialize_element};
