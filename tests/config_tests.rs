use fieldquill::config::Config;
use fieldquill::xml::NamespaceTable;
use tempfile::TempDir;

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.indent_size, 2);
    assert!(!config.create_backup);
    assert_eq!(config.log_level, "warn");
    assert!(!config.json_floats_as_decimal);
    assert!(!config.write_null_leaves);
    assert!(!config.compress_output);
    assert!(config.xml_namespaces.is_empty());
}

#[test]
fn test_serialize_default_config() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("Failed to serialize config");

    assert!(toml_str.contains("indent_size = 2"));
    assert!(toml_str.contains("create_backup = false"));
    assert!(toml_str.contains("log_level = \"warn\""));
    assert!(toml_str.contains("write_null_leaves = false"));
}

#[test]
fn test_deserialize_full_config() {
    let toml_str = r#"
        indent_size = 4
        create_backup = true
        log_level = "debug"
        json_floats_as_decimal = true
        write_null_leaves = true
        compress_output = true

        [xml_namespaces]
        ord = "urn:example:orders"
        inv = "urn:example:invoices"
    "#;

    let config: Config = toml::from_str(toml_str).expect("Failed to deserialize config");

    assert_eq!(config.indent_size, 4);
    assert!(config.create_backup);
    assert_eq!(config.log_level, "debug");
    assert!(config.json_floats_as_decimal);
    assert!(config.write_null_leaves);
    assert!(config.compress_output);
    assert_eq!(config.xml_namespaces.len(), 2);
    // Table order is kept
    let aliases: Vec<&str> = config.xml_namespaces.keys().map(String::as_str).collect();
    assert_eq!(aliases, vec!["ord", "inv"]);
}

#[test]
fn test_deserialize_empty_config() {
    let config: Config = toml::from_str("").expect("Failed to deserialize config");
    assert_eq!(config, Config::default());
}

#[test]
fn test_derived_options() {
    let config = Config {
        json_floats_as_decimal: true,
        write_null_leaves: true,
        ..Config::default()
    };
    assert!(config.json_options().floats_as_decimal);
    assert!(config.writer_options().write_null_leaves);
}

#[test]
fn test_save_and_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut namespaces = NamespaceTable::new();
    namespaces.insert("ord".to_string(), "urn:example:orders".to_string());
    let original = Config {
        indent_size: 8,
        create_backup: true,
        log_level: "info".to_string(),
        xml_namespaces: namespaces,
        ..Config::default()
    };

    original.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn test_load_from_invalid_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "indent_size = \"wide\"").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_load_from_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
}
