//! Integration tests for document loading and saving.

use std::fs;
use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::{NamedTempFile, TempDir};

use fieldquill::config::Config;
use fieldquill::field::{FieldType, FieldValue, Value};
use fieldquill::file::loader::{load_document, parse_document};
use fieldquill::file::saver::{save_document, serialize_document};
use fieldquill::file::{DocumentFormat, LoadedDocument};
use fieldquill::reader::DocumentReader;
use fieldquill::writer::DocumentWriter;

fn read_text(path: &std::path::Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_load_json_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("order.json");
    fs::write(&path, r#"{"id": 7}"#).unwrap();

    let doc = load_document(&path, &Config::default()).unwrap();
    assert_eq!(doc.format(), DocumentFormat::Json);
}

#[test]
fn test_load_sniffs_unknown_extension() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "  <order id=\"7\"/>").unwrap();

    let doc = load_document(temp_file.path(), &Config::default()).unwrap();
    assert_eq!(doc.format(), DocumentFormat::Xml);
}

#[test]
fn test_load_invalid_document_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"{"id": "#).unwrap();

    let err = load_document(&path, &Config::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("broken.json"));
}

#[test]
fn test_load_gzipped_xml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.xml.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(b"<orders><order><id>A-1</id></order></orders>")
        .unwrap();
    fs::write(&path, encoder.finish().unwrap()).unwrap();

    let doc = load_document(&path, &Config::default()).unwrap();
    let xml = match &doc {
        LoadedDocument::Xml(xml) => xml,
        other => panic!("expected XML, got {:?}", other.format()),
    };
    let mut reader = DocumentReader::new("orders", xml);
    let result = reader.read("/orders/order[0]/id").unwrap();
    assert_eq!(result.value(), Some(&Value::String("A-1".into())));
}

#[test]
fn test_floats_as_decimal_option() {
    let config = Config {
        json_floats_as_decimal: true,
        ..Config::default()
    };
    let doc = parse_document(r#"{"price": 19.99}"#, DocumentFormat::Json, &config).unwrap();
    let tree = match &doc {
        LoadedDocument::Json(tree) => tree,
        _ => unreachable!(),
    };
    let mut reader = DocumentReader::new("prices", tree);
    let result = reader.read("/price").unwrap();
    assert_eq!(
        result.field().unwrap().value.field_type,
        Some(FieldType::Decimal)
    );
}

#[test]
fn test_write_and_save_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.json");
    let config = Config::default();

    let mut doc = LoadedDocument::empty(DocumentFormat::Json, &config);
    if let LoadedDocument::Json(tree) = &mut doc {
        let mut writer = DocumentWriter::new("out", tree);
        writer
            .write("/orders[1]/id", FieldValue::string("A-2"))
            .unwrap();
    }
    save_document(&path, &doc, &config).unwrap();

    let content = read_text(&path);
    assert!(content.ends_with('\n'));
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value, serde_json::json!({"orders": [{}, {"id": "A-2"}]}));
}

#[test]
fn test_save_xml_is_indented() {
    let config = Config::default();
    let doc = parse_document(
        "<orders><order><id>A-1</id></order></orders>",
        DocumentFormat::Xml,
        &config,
    )
    .unwrap();

    let xml = serialize_document(&doc, &config).unwrap();
    assert_eq!(
        xml,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<orders>\n  <order>\n    <id>A-1</id>\n  </order>\n</orders>\n"
    );
}

#[test]
fn test_save_empty_xml_fails() {
    let config = Config::default();
    let doc = LoadedDocument::empty(DocumentFormat::Xml, &config);
    assert!(serialize_document(&doc, &config).is_err());
}

#[test]
fn test_save_gzipped_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.json.gz");
    let config = Config::default();
    let doc = parse_document(r#"{"a": 1}"#, DocumentFormat::Json, &config).unwrap();

    save_document(&path, &doc, &config).unwrap();

    let mut decoder = GzDecoder::new(fs::File::open(&path).unwrap());
    let mut content = String::new();
    decoder.read_to_string(&mut content).unwrap();
    assert_eq!(content, "{\"a\": 1}\n");

    let reloaded = load_document(&path, &config).unwrap();
    assert_eq!(reloaded.format(), DocumentFormat::Json);
}

#[test]
fn test_backup_created_when_enabled() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.json");
    fs::write(&path, "{\"old\": true}\n").unwrap();

    let config = Config {
        create_backup: true,
        ..Config::default()
    };
    let doc = parse_document(r#"{"new": true}"#, DocumentFormat::Json, &config).unwrap();
    save_document(&path, &doc, &config).unwrap();

    assert_eq!(read_text(&dir.path().join("out.json.bak")), "{\"old\": true}\n");
    assert_eq!(read_text(&path), "{\"new\": true}\n");
}
