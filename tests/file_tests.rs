//! Integration tests for file I/O operations.

use flate2::write::GzEncoder;
use flate2::Compression;
use respdiff::config::OutputFormat;
use respdiff::document::{DataValue, PathKey};
use respdiff::file::loader::load_data_file;
use respdiff::file::saver::save_data;
use std::fs;
use std::io::Write;
use tempfile::TempDir;

const LIMIT: u64 = 1 << 20;

#[test]
fn test_load_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("body.json");
    fs::write(&path, r#"{"user": {"name": "Alice", "tags": ["a", "b"]}}"#).unwrap();

    let value = load_data_file(&path, LIMIT).unwrap();
    assert_eq!(
        value.get_path(&["user".into(), "tags".into(), PathKey::Index(1)]),
        Some(&DataValue::from("b"))
    );
}

#[test]
fn test_load_yaml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("body.yaml");
    fs::write(&path, "user:\n  name: Alice\n  age: 30\n").unwrap();

    let value = load_data_file(&path, LIMIT).unwrap();
    assert_eq!(
        value.get_path(&["user".into(), "age".into()]),
        Some(&DataValue::from(30i64))
    );
}

#[test]
fn test_load_gzipped_jsonl_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl.gz");

    let file = fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(b"{\"id\":1}\n{\"id\":2}\n").unwrap();
    encoder.finish().unwrap();

    let value = load_data_file(&path, LIMIT).unwrap();
    assert_eq!(value.as_seq().map(<[DataValue]>::len), Some(2));
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = load_data_file(dir.path().join("nope.json"), LIMIT);
    assert!(result.is_err());
}

#[test]
fn test_load_invalid_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{not json").unwrap();

    let err = load_data_file(&path, LIMIT).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse JSON"));
}

#[test]
fn test_load_refuses_oversized_input() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.json");
    fs::write(&path, format!("[{}]", vec!["1"; 200].join(","))).unwrap();

    let err = load_data_file(&path, 64).unwrap_err();
    assert!(err.to_string().contains("byte limit"));
}

#[test]
fn test_save_json_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.json");
    let value = DataValue::Seq(vec!["a".into(), 1i64.into(), true.into()]);

    save_data(&path, &value, OutputFormat::Json, true).unwrap();

    assert!(!dir.path().join("out.tmp").exists());
    assert_eq!(load_data_file(&path, LIMIT).unwrap(), value);
}

#[test]
fn test_save_gzipped_yaml_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.yaml.gz");
    let value = respdiff::document::parser::parse_json(r#"{"a": {"b": [1, 2]}}"#).unwrap();

    save_data(&path, &value, OutputFormat::Yaml, true).unwrap();

    let raw = fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    assert_eq!(load_data_file(&path, LIMIT).unwrap(), value);
}
