use specmcp::core::error::{ErrorKind, SpecError};
use specmcp::plugins::openapi;
use specmcp::plugins::persist::{SaveFormat, load, save};
use std::fs;
use tempfile::tempdir;

fn generated_json() -> String {
    serde_json::to_string(&openapi::assemble("Todo API", None, None).specification).unwrap()
}

#[test]
fn json_save_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("api.json");
    let spec = generated_json();

    let receipt = save(&spec, &path, "json").unwrap();

    assert_eq!(receipt.format, SaveFormat::Json);
    assert_eq!(receipt.file_size, fs::metadata(&path).unwrap().len());
    assert_eq!(receipt.message, format!("Spec saved to {}", path.display()));
    assert!(receipt.file_path.ends_with("api.json"));

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("{\n  \"openapi\": \"3.1.0\""));
    let original: serde_json::Value = serde_json::from_str(&spec).unwrap();
    assert_eq!(load(&path).unwrap(), original);
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("specs").join("v1").join("api.json");
    save("{\"a\": 1}", &path, "json").unwrap();
    assert!(path.exists());
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_save_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("api.yaml");
    let spec = generated_json();

    let receipt = save(&spec, &path, "yaml").unwrap();
    assert_eq!(receipt.format, SaveFormat::Yaml);

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("openapi:"));
    let original: serde_json::Value = serde_json::from_str(&spec).unwrap();
    assert_eq!(load(&path).unwrap(), original);
}

#[cfg(feature = "yaml")]
#[test]
fn malformed_yaml_is_invalid_yaml_not_io_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "openapi: [unclosed\n  - : :").unwrap();

    let err = load(&path).unwrap_err();

    assert!(matches!(err, SpecError::InvalidYaml(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidYaml);
    assert!(err.suggestion().contains("YAML syntax"));
}

// Built with `cargo test --no-default-features`: YAML is reported, never a panic.
#[cfg(not(feature = "yaml"))]
#[test]
fn yaml_without_encoder_is_missing_dependency() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("api.yaml");

    let err = save("{\"openapi\": \"3.1.0\"}", &path, "yaml").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingDependency);
    assert!(!dir.path().join("out").exists());

    let existing = dir.path().join("x.yaml");
    fs::write(&existing, "openapi: 3.1.0\n").unwrap();
    let err = load(&existing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingDependency);
}

#[test]
fn unsupported_format_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("api.xml");

    let err = save("{}", &path, "xml").unwrap_err();

    assert!(matches!(err, SpecError::UnsupportedFormat(ref f) if f == "xml"));
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    assert!(!dir.path().join("out").exists());
}

#[test]
fn format_is_case_sensitive() {
    let dir = tempdir().unwrap();
    let err = save("{}", &dir.path().join("api.json"), "JSON").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn invalid_json_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("api.json");

    let err = save("{not json", &path, "json").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidJson);
    assert!(!path.exists());
}

#[test]
fn save_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("api.json");
    fs::write(&path, "old contents that are much longer than the new ones").unwrap();

    save("{}", &path, "json").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
}

#[test]
fn load_missing_file_is_file_not_found() {
    let dir = tempdir().unwrap();
    let err = load(&dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
}
