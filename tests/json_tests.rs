//! End-to-end reads and writes against JSON documents.

use fieldquill::audit::AuditSeverity;
use fieldquill::error::FieldError;
use fieldquill::field::{FieldType, FieldValue, ReadResult, Value};
use fieldquill::json::{parse_json, serialize_node_compact, JsonTree};
use fieldquill::reader::DocumentReader;
use fieldquill::writer::{DocumentWriter, WriteOutcome};

fn write(tree: &mut JsonTree, path: &str, value: FieldValue) -> WriteOutcome {
    let mut writer = DocumentWriter::new("target", tree);
    writer.write(path, value).unwrap()
}

fn compact(tree: &JsonTree) -> String {
    serialize_node_compact(tree.root())
}

fn type_of(reader: &mut DocumentReader<'_, JsonTree>, path: &str) -> Option<FieldType> {
    reader
        .read(path)
        .unwrap()
        .field()
        .and_then(|field| field.value.field_type)
}

#[test]
fn test_write_pads_structural_collection() {
    let mut tree = JsonTree::empty();
    let outcome = write(
        &mut tree,
        "/orders[4]/address/addressLine1",
        FieldValue::string("hello world."),
    );
    assert_eq!(outcome, WriteOutcome::Written);
    assert_eq!(
        compact(&tree),
        r#"{"orders":[{},{},{},{},{"address":{"addressLine1":"hello world."}}]}"#
    );
}

#[test]
fn test_sparse_growth_leaves_padding_unread() {
    let mut tree = JsonTree::empty();
    write(&mut tree, "/a<7>/b", FieldValue::string("seven"));

    let mut reader = DocumentReader::new("target", &tree);
    for index in 0..7 {
        let result = reader.read(&format!("/a<{}>/b", index)).unwrap();
        assert_eq!(result, ReadResult::NotFound, "index {}", index);
    }
    let result = reader.read("/a<7>/b").unwrap();
    assert_eq!(result.value(), Some(&Value::String("seven".into())));
}

#[test]
fn test_out_of_order_writes_touch_only_their_index() {
    let mut tree = JsonTree::empty();
    write(&mut tree, "/a<4>/x", FieldValue::string("four"));
    write(&mut tree, "/a<1>/y", FieldValue::string("one"));
    assert_eq!(
        compact(&tree),
        r#"{"a":[{},{"y":"one"},{},{},{"x":"four"}]}"#
    );

    let mut reader = DocumentReader::new("target", &tree);
    let result = reader.read("/a<>").unwrap();
    let group = result.group().unwrap();
    assert_eq!(group.len(), 5);

    let populated: Vec<usize> = group
        .iter()
        .enumerate()
        .filter(|(_, field)| field.value.value.is_some())
        .map(|(index, _)| index)
        .collect();
    assert_eq!(populated, vec![1, 4]);
}

#[test]
fn test_rewriting_padding_does_not_renumber() {
    let mut tree = JsonTree::empty();
    write(&mut tree, "/a[2]", FieldValue::new(Value::Integer(2)));
    write(&mut tree, "/a[0]", FieldValue::new(Value::Integer(0)));
    write(&mut tree, "/a[1]", FieldValue::new(Value::Integer(1)));
    assert_eq!(compact(&tree), r#"{"a":[0,1,2]}"#);
}

#[test]
fn test_terminal_collection_padded_with_nulls() {
    let mut tree = JsonTree::empty();
    write(&mut tree, "/tags[2]", FieldValue::string("c"));
    assert_eq!(compact(&tree), r#"{"tags":[null,null,"c"]}"#);
}

#[test]
fn test_fan_out_substitutes_indices() {
    let tree = parse_json(r#"{"orders": [{"id": "a"}, {"id": "b"}, {"id": "c"}]}"#).unwrap();
    let mut reader = DocumentReader::new("source", &tree);
    let result = reader.read("/orders[]/id").unwrap();
    let group = result.group().unwrap();

    assert_eq!(group.len(), 3);
    let paths: Vec<String> = group.iter().map(|field| field.path.to_string()).collect();
    assert_eq!(
        paths,
        vec!["/orders[0]/id", "/orders[1]/id", "/orders[2]/id"]
    );
    let values: Vec<String> = group
        .iter()
        .map(|field| field.value.value.as_ref().unwrap().to_text())
        .collect();
    assert_eq!(values, vec!["a", "b", "c"]);
    assert_eq!(group.path.to_string(), "/orders[]/id");
}

#[test]
fn test_fan_out_drops_missing_branches() {
    let tree =
        parse_json(r#"{"orders": [{"id": "a"}, {"note": "no id"}, {"id": "c"}]}"#).unwrap();
    let mut reader = DocumentReader::new("source", &tree);
    let result = reader.read("/orders[]/id").unwrap();
    let group = result.group().unwrap();
    assert_eq!(group.len(), 2);
    assert_eq!(group.fields[1].path.to_string(), "/orders[2]/id");
    assert!(reader.audits().is_empty());
}

#[test]
fn test_nested_fan_out() {
    let tree = parse_json(
        r#"{"orders": [{"lines": [{"sku": 1}, {"sku": 2}]}, {"lines": [{"sku": 3}]}]}"#,
    )
    .unwrap();
    let mut reader = DocumentReader::new("source", &tree);
    let result = reader.read("/orders[]/lines[]/sku").unwrap();
    let paths: Vec<String> = result
        .group()
        .unwrap()
        .iter()
        .map(|field| field.path.to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/orders[0]/lines[0]/sku",
            "/orders[0]/lines[1]/sku",
            "/orders[1]/lines[0]/sku"
        ]
    );
}

#[test]
fn test_out_of_range_read_warns() {
    let tree = parse_json(r#"{"orders": [{"id": "a"}]}"#).unwrap();
    let mut reader = DocumentReader::new("source", &tree);
    let result = reader.read("/orders[3]/id").unwrap();
    assert_eq!(result, ReadResult::NotFound);

    let audits = reader.audits().entries();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].severity, AuditSeverity::Warn);
    assert_eq!(audits[0].doc_id, "source");
    assert_eq!(audits[0].path, "/orders[3]");
}

#[test]
fn test_single_value_stands_in_for_index_zero() {
    let tree = parse_json(r#"{"order": {"id": "solo"}}"#).unwrap();
    let mut reader = DocumentReader::new("source", &tree);
    let result = reader.read("/order[0]/id").unwrap();
    assert_eq!(result.value(), Some(&Value::String("solo".into())));
    assert_eq!(reader.read("/order[1]/id").unwrap(), ReadResult::NotFound);
}

#[test]
fn test_plain_segment_over_array_misses() {
    let tree = parse_json(r#"{"orders": [{"id": "a"}]}"#).unwrap();
    let mut reader = DocumentReader::new("source", &tree);
    assert_eq!(reader.read("/orders/id").unwrap(), ReadResult::NotFound);
}

#[test]
fn test_type_inference_from_json_numbers() {
    let tree = parse_json(r#"{"firstName": "Ozzie"}"#).unwrap();
    let mut reader = DocumentReader::new("source", &tree);
    let field = reader.read("/firstName").unwrap();
    let field = field.field().unwrap();
    assert_eq!(field.value.field_type, Some(FieldType::String));
    assert_eq!(field.value.value, Some(Value::String("Ozzie".into())));

    let tree = parse_json(r#"{"firstName": 123}"#).unwrap();
    let mut reader = DocumentReader::new("source", &tree);
    let field = reader.read("/firstName").unwrap();
    let field = field.field().unwrap();
    assert_eq!(field.value.field_type, Some(FieldType::Integer));
    assert_eq!(field.value.value, Some(Value::Integer(123)));
}

#[test]
fn test_number_sub_kinds() {
    let tree = parse_json(
        r#"{"int": 7, "long": 9000000000, "double": 1.5, "big": 123456789012345678901234567890}"#,
    )
    .unwrap();
    let mut reader = DocumentReader::new("source", &tree);
    assert_eq!(type_of(&mut reader, "/int"), Some(FieldType::Integer));
    assert_eq!(type_of(&mut reader, "/long"), Some(FieldType::Long));
    assert_eq!(type_of(&mut reader, "/double"), Some(FieldType::Double));
    assert_eq!(type_of(&mut reader, "/big"), Some(FieldType::BigInteger));
}

#[test]
fn test_integer_round_trip() {
    let mut tree = JsonTree::empty();
    write(&mut tree, "/count", FieldValue::new(Value::Integer(42)));

    let mut reader = DocumentReader::new("target", &tree);
    let result = reader.read("/count").unwrap();
    let field = result.field().unwrap();
    assert_eq!(field.value.field_type, Some(FieldType::Integer));
    assert_eq!(field.value.value, Some(Value::Integer(42)));
}

#[test]
fn test_malformed_path_is_an_error() {
    let mut tree = JsonTree::empty();
    let mut writer = DocumentWriter::new("target", &mut tree);
    let err = writer
        .write("/orders[4/address", FieldValue::string("x"))
        .unwrap_err();
    assert!(matches!(err, FieldError::MalformedPath(_)));
    drop(writer);
    assert_eq!(compact(&tree), "{}");
}

#[test]
fn test_unindexed_write_is_abandoned_with_warning() {
    let mut tree = JsonTree::empty();
    let mut writer = DocumentWriter::new("target", &mut tree);
    let outcome = writer
        .write("/orders[]/id", FieldValue::string("x"))
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Abandoned);
    assert_eq!(writer.audits().entries()[0].severity, AuditSeverity::Warn);
    drop(writer);
    assert_eq!(compact(&tree), "{}");
}

#[test]
fn test_structural_conflict_continues_with_other_fields() {
    let mut tree = parse_json(r#"{"customer": "flat"}"#).unwrap();
    let mut writer = DocumentWriter::new("target", &mut tree);
    let conflict = writer
        .write("/customer/name", FieldValue::string("Ozzie"))
        .unwrap();
    let ok = writer.write("/status", FieldValue::string("open")).unwrap();

    assert_eq!(conflict, WriteOutcome::Abandoned);
    assert_eq!(ok, WriteOutcome::Written);
    let errors: Vec<_> = writer
        .audits()
        .at_least(AuditSeverity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "/customer/name");
    drop(writer);
    assert_eq!(compact(&tree), r#"{"customer":"flat","status":"open"}"#);
}

#[test]
fn test_leaf_overwritten_when_compatible() {
    let mut tree = parse_json(r#"{"status": "draft"}"#).unwrap();
    write(&mut tree, "/status", FieldValue::new(Value::Boolean(true)));
    assert_eq!(compact(&tree), r#"{"status":true}"#);
}

#[test]
fn test_typed_string_value_is_parsed_on_write() {
    let mut tree = JsonTree::empty();
    let value = FieldValue::typed(FieldType::Decimal, Some(Value::String("12.50".into())));
    write(&mut tree, "/total", value);
    assert_eq!(compact(&tree), r#"{"total":12.50}"#);
}

#[test]
fn test_complex_value_creates_structure_only() {
    let mut tree = JsonTree::empty();
    write(&mut tree, "/orders[1]/address", FieldValue::complex(None));
    write(&mut tree, "/orders[1]/address/city", FieldValue::string("Leeds"));
    assert_eq!(
        compact(&tree),
        r#"{"orders":[{},{"address":{"city":"Leeds"}}]}"#
    );
}

#[test]
fn test_non_finite_numbers_are_abandoned() {
    let mut tree = JsonTree::empty();
    let mut writer = DocumentWriter::new("target", &mut tree);
    let typed = FieldValue::typed(FieldType::Double, Some(Value::String("NaN".into())));
    assert_eq!(writer.write("/bad", typed).unwrap(), WriteOutcome::Abandoned);
    let native = FieldValue::new(Value::Double(f64::INFINITY));
    assert_eq!(writer.write("/worse", native).unwrap(), WriteOutcome::Abandoned);
    assert_eq!(
        writer.write("/good", FieldValue::string("x")).unwrap(),
        WriteOutcome::Written
    );
    assert_eq!(writer.audits().len(), 2);
    assert!(writer.audits().has_errors());
    drop(writer);

    let text = compact(&tree);
    assert_eq!(text, r#"{"good":"x"}"#);
    assert!(parse_json(&text).is_ok());
}

#[test]
fn test_large_whole_double_reloads_as_double() {
    let mut tree = JsonTree::empty();
    write(&mut tree, "/d", FieldValue::new(Value::Double(1e20)));
    write(&mut tree, "/small", FieldValue::new(Value::Double(3.0)));
    let text = compact(&tree);
    assert_eq!(text, r#"{"d":1e20,"small":3.0}"#);

    let reloaded = parse_json(&text).unwrap();
    let mut reader = DocumentReader::new("target", &reloaded);
    assert_eq!(type_of(&mut reader, "/d"), Some(FieldType::Double));
    assert_eq!(reader.read("/d").unwrap().value(), Some(&Value::Double(1e20)));
    assert_eq!(type_of(&mut reader, "/small"), Some(FieldType::Double));
}

#[test]
fn test_root_path_write_is_abandoned() {
    let mut tree = parse_json(r#"{"keep": 1}"#).unwrap();
    let mut writer = DocumentWriter::new("target", &mut tree);
    assert_eq!(
        writer.write("/", FieldValue::string("x")).unwrap(),
        WriteOutcome::Abandoned
    );
    assert_eq!(writer.audits().entries()[0].severity, AuditSeverity::Error);
    drop(writer);
    assert_eq!(compact(&tree), r#"{"keep":1}"#);

    let mut empty = JsonTree::empty();
    assert_eq!(write(&mut empty, "", FieldValue::string("x")), WriteOutcome::Abandoned);
    assert_eq!(compact(&empty), "{}");
}
