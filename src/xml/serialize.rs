//! XML serialization.
//!
//! Documents are written through `quick_xml::Writer`, which handles
//! escaping of text and attribute values. Raw content stored on an element
//! (opaque complex values) is emitted unescaped.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::dom::{NodeId, XmlDocument};
use crate::error::BackendError;

/// Serializes a whole document with an XML declaration.
///
/// # Errors
///
/// Returns [`BackendError::EmptyXml`] for a document without a root
/// element.
pub fn serialize_document(doc: &XmlDocument, indent_size: usize) -> Result<String, BackendError> {
    let root = doc.root_element().ok_or(BackendError::EmptyXml)?;
    let mut writer = if indent_size > 0 {
        Writer::new_with_indent(Vec::new(), b' ', indent_size)
    } else {
        Writer::new(Vec::new())
    };
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    write_element(&mut writer, doc, root)?;

    let mut output = into_string(writer.into_inner())?;
    output.push('\n');
    Ok(output)
}

/// Serializes one element and its subtree on a single line.
pub fn serialize_element(doc: &XmlDocument, id: NodeId) -> String {
    let mut writer = Writer::new(Vec::new());
    match write_element(&mut writer, doc, id) {
        Ok(()) => into_string(writer.into_inner()).unwrap_or_default(),
        Err(_) => String::new(),
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    doc: &XmlDocument,
    id: NodeId,
) -> Result<(), BackendError> {
    let element = doc.element(id);
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let has_content =
        element.text.is_some() || element.raw.is_some() || !element.children.is_empty();
    if !has_content {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    if let Some(text) = &element.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
    }
    for child in &element.children {
        write_element(writer, doc, *child)?;
    }
    if let Some(raw) = &element.raw {
        writer
            .write_event(Event::Text(BytesText::from_escaped(raw.as_str())))
            .map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)
}

fn xml_error(err: impl std::fmt::Display) -> BackendError {
    BackendError::Xml(err.to_string())
}

fn into_string(bytes: Vec<u8>) -> Result<String, BackendError> {
    String::from_utf8(bytes).map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_escapes_text_and_attributes() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(None, "note").unwrap();
        doc.element_mut(root)
            .attributes
            .insert("title".into(), "a \"b\"".into());
        doc.element_mut(root).text = Some("1 < 2 & 3".into());

        let xml = serialize_element(&doc, root);
        assert_eq!(xml, r#"<note title="a &quot;b&quot;">1 &lt; 2 &amp; 3</note>"#);
    }

    #[test]
    fn test_serialize_empty_element() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(None, "empty").unwrap();
        assert_eq!(serialize_element(&doc, root), "<empty/>");
    }

    #[test]
    fn test_serialize_raw_is_verbatim() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(None, "wrapper").unwrap();
        doc.element_mut(root).raw = Some("<inner>x</inner>".into());
        assert_eq!(serialize_element(&doc, root), "<wrapper><inner>x</inner></wrapper>");
    }

    #[test]
    fn test_serialize_document_has_declaration() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(None, "a").unwrap();
        doc.append_element(Some(root), "b").unwrap();
        let xml = serialize_document(&doc, 2).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<b/>"));
    }

    #[test]
    fn test_serialize_empty_document_fails() {
        assert!(matches!(
            serialize_document(&XmlDocument::new(), 2),
            Err(BackendError::EmptyXml)
        ));
    }
}
