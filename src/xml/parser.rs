//! XML parsing into [`XmlDocument`].
//!
//! Whitespace-only text between elements is dropped. CDATA is folded into
//! element text. Comments, processing instructions and the doctype are not
//! kept.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::dom::{NamespaceTable, NodeId, XmlDocument};
use crate::error::BackendError;

/// Parses an XML document.
///
/// # Errors
///
/// Returns [`BackendError::Xml`] for malformed markup and
/// [`BackendError::EmptyXml`] when there is no document element.
pub fn parse_xml(content: &str) -> Result<XmlDocument, BackendError> {
    parse_xml_with(content, NamespaceTable::new())
}

/// Parses an XML document using `namespaces` to match prefixed names.
///
/// # Errors
///
/// See [`parse_xml`].
pub fn parse_xml_with(content: &str, namespaces: NamespaceTable) -> Result<XmlDocument, BackendError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut doc = XmlDocument::new().with_namespaces(namespaces);
    let mut stack = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            BackendError::Xml(format!("{} at byte {}", e, reader.buffer_position()))
        })?;
        let opens = matches!(event, Event::Start(_));
        match event {
            Event::Start(start) | Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let id = doc
                    .push_element(stack.last().copied(), &name)
                    .map_err(|e| BackendError::Xml(e.to_string()))?;
                for attribute in start.attributes() {
                    let attribute = attribute.map_err(|e| BackendError::Xml(e.to_string()))?;
                    let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
                    let value = attribute
                        .unescape_value()
                        .map_err(|e| BackendError::Xml(e.to_string()))?
                        .into_owned();
                    doc.element_mut(id).attributes.insert(key, value);
                }
                if opens {
                    stack.push(id);
                }
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| BackendError::Xml(e.to_string()))?;
                append_text(&mut doc, stack.last().copied(), &text);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                append_text(&mut doc, stack.last().copied(), &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(BackendError::Xml(format!(
            "unclosed element '{}'",
            doc.element(*open).name
        )));
    }
    if doc.root_element().is_none() {
        return Err(BackendError::EmptyXml);
    }
    tracing::debug!(elements = doc.len(), "parsed XML document");
    Ok(doc)
}

fn append_text(doc: &mut XmlDocument, current: Option<NodeId>, text: &str) {
    let id = match current {
        Some(id) => id,
        None => return,
    };
    if text.is_empty() {
        return;
    }
    doc.element_mut(id)
        .text
        .get_or_insert_with(String::new)
        .push_str(text);
}
