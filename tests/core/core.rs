use serde_json::{Value, json};
use specmcp::core::config::{Config, load_config};
use specmcp::core::error::{ErrorKind, SpecError};
use specmcp::core::rpc::{ToolContext, ToolRegistry, ToolRequest};
use specmcp::core::time::command_envelope;
use specmcp::core::trace::{TraceEvent, read_last_traces};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CONSTITUTION: &str = "# Constitution\n- Use JWT for auth\n- Must have tests\n";

fn project(root: &Path) -> ToolContext {
    fs::create_dir_all(root.join(".specify")).unwrap();
    fs::write(root.join(".specify/constitution.md"), CONSTITUTION).unwrap();
    ToolContext::new(Config::default(), root.to_path_buf())
}

fn call(ctx: &ToolContext, op: &str, params: Value) -> specmcp::core::rpc::ToolResponse {
    ToolRegistry::standard().dispatch(
        ctx,
        ToolRequest {
            op: op.to_string(),
            params,
            id: format!("req-{}", op),
        },
    )
}

#[test]
fn config_loads_from_default_location() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".specmcp")).unwrap();
    fs::write(
        dir.path().join(".specmcp/config.toml"),
        "save_format = \"yaml\"\nconstitution_path = \"docs/constitution.md\"\n",
    )
    .unwrap();

    let config = load_config(dir.path(), None).unwrap();
    assert_eq!(config.save_format, "yaml");
    assert_eq!(config.constitution_path, Path::new("docs/constitution.md"));
    assert_eq!(config.profile, "constitution");
}

#[test]
fn config_absent_is_default() {
    let dir = tempdir().unwrap();
    assert_eq!(load_config(dir.path(), None).unwrap(), Config::default());
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("custom.toml");
    let err = load_config(dir.path(), Some(&missing)).unwrap_err();
    assert!(matches!(err, SpecError::FileNotFound(_)));
}

#[test]
fn malformed_config_is_invalid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "trace = \"sometimes\"\n").unwrap();
    let err = load_config(dir.path(), Some(&path)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn parse_op_uses_configured_constitution() {
    let dir = tempdir().unwrap();
    let ctx = project(dir.path());

    let response = call(&ctx, "constitution.parse", Value::Null);

    assert!(response.success, "{:?}", response.error);
    let result = response.result.unwrap();
    assert_eq!(result["constitution"]["patterns"]["auth"], "JWT");
    assert_eq!(
        result["summary"],
        "No clear tech stack found | 2 principles defined"
    );
    assert_eq!(response.receipt.op, "constitution.parse");
    assert_eq!(response.receipt.inputs_hash.len(), 64);
}

#[test]
fn generate_then_verify_through_dispatch() {
    let dir = tempdir().unwrap();
    let ctx = project(dir.path());

    let generated = call(
        &ctx,
        "spec.generate",
        json!({
            "requirements": "Todo API",
            "constitution_path": ".specify/constitution.md"
        }),
    );
    let spec = generated.result.unwrap()["specification"].clone();
    assert_eq!(spec["security"], json!([{"bearerAuth": []}]));

    // inline document form
    let verified = call(&ctx, "spec.verify", json!({ "spec_content": spec }));
    let report = verified.result.unwrap();
    assert_eq!(report["compliance_score"], 100);
    assert_eq!(report["is_compliant"], true);

    // text form
    let verified = call(
        &ctx,
        "spec.verify",
        json!({ "spec_content": "{\"openapi\":\"3.1.0\",\"paths\":{}}" }),
    );
    assert_eq!(verified.result.unwrap()["compliance_score"], 70);
}

#[test]
fn verify_with_bad_json_is_invalid_json_envelope() {
    let dir = tempdir().unwrap();
    let ctx = project(dir.path());

    let response = call(&ctx, "spec.verify", json!({ "spec_content": "{not json" }));

    assert!(!response.success);
    assert!(response.result.is_none());
    let error = response.error.unwrap();
    assert_eq!(error.code, "InvalidJSON");
    assert_eq!(error.suggestion, "Make sure you're providing valid OpenAPI JSON");
}

#[test]
fn verify_with_unknown_profile_is_invalid_params() {
    let dir = tempdir().unwrap();
    let ctx = project(dir.path());
    let response = call(
        &ctx,
        "spec.verify",
        json!({ "spec_content": "{}", "profile": "lenient" }),
    );
    assert_eq!(response.error.unwrap().code, "InvalidParams");
}

#[test]
fn save_op_reports_touched_path() {
    let dir = tempdir().unwrap();
    let ctx = project(dir.path());

    let response = call(
        &ctx,
        "spec.save",
        json!({ "spec_content": {"openapi": "3.1.0"}, "output_path": "specs/api.json" }),
    );

    assert!(response.success, "{:?}", response.error);
    assert!(dir.path().join("specs/api.json").exists());
    assert_eq!(response.receipt.touched_paths.len(), 1);
    assert!(response.receipt.touched_paths[0].ends_with("api.json"));
    assert_eq!(response.result.unwrap()["format"], "json");
}

#[test]
fn save_op_defaults_to_configured_format() {
    let dir = tempdir().unwrap();
    let mut ctx = project(dir.path());
    ctx.config.save_format = "xml".to_string();

    let response = call(
        &ctx,
        "spec.save",
        json!({ "spec_content": "{}", "output_path": "api.out" }),
    );
    assert_eq!(response.error.unwrap().code, "UnsupportedFormat");
    assert!(!dir.path().join("api.out").exists());
}

#[test]
fn missing_constitution_is_file_not_found_envelope() {
    let dir = tempdir().unwrap();
    let ctx = ToolContext::new(Config::default(), dir.path().to_path_buf());
    let response = call(&ctx, "constitution.parse", json!({}));
    assert_eq!(response.error.unwrap().code, "FileNotFound");
}

#[test]
fn traced_dispatch_appends_redacted_events() {
    let dir = tempdir().unwrap();
    let mut ctx = project(dir.path());
    ctx.config.trace = true;

    call(
        &ctx,
        "spec.generate",
        json!({ "requirements": "Login with password: hunter2hunter2" }),
    );
    call(&ctx, "spec.delete", Value::Null);

    let lines = read_last_traces(&dir.path().join(".specmcp/traces.jsonl"), 10).unwrap();
    assert_eq!(lines.len(), 2);

    let first: TraceEvent = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first.op, "spec.generate");
    assert!(first.success);
    assert!(!lines[0].contains("hunter2hunter2"));

    let second: TraceEvent = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(second.trace_id, "req-spec.delete");
    assert!(!second.success);
}

#[test]
fn untraced_dispatch_writes_nothing() {
    let dir = tempdir().unwrap();
    let ctx = project(dir.path());
    call(&ctx, "tools.list", Value::Null);
    assert!(!dir.path().join(".specmcp/traces.jsonl").exists());
}

#[test]
fn command_envelope_flattens_failures() {
    let failure = serde_json::to_value(SpecError::UnsupportedFormat("xml".into()).to_failure())
        .unwrap();
    let envelope = command_envelope("save", "error", failure);
    assert_eq!(envelope["cmd"], "save");
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["kind"], "UnsupportedFormat");
    assert_eq!(envelope["envelope_version"], "1.0.0");
}
