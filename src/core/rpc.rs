//! JSON request/response dispatch for the spec tools.
//!
//! Tools are plain functions collected into an explicit [`ToolRegistry`];
//! nothing registers itself globally. Callers build a registry (usually
//! [`ToolRegistry::standard`]) and hand requests to [`ToolRegistry::dispatch`].
//!
//! # Response Envelope
//!
//! Every response carries:
//! - `success`: whether the tool ran to completion
//! - `receipt`: op name, timestamp, input/output hashes, touched paths
//! - `result` on success, or `error` with a machine-readable `code` and a
//!   remediation `suggestion` on failure

use crate::core::config::Config;
use crate::core::error::SpecError;
use crate::core::trace::{self, TraceEvent};
use crate::plugins::compliance::{self, RuleProfile};
use crate::plugins::{constitution, openapi, persist};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Digest;
use std::path::{Path, PathBuf};

/// Standard request envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolRequest {
    /// Tool to invoke, e.g. `spec.verify`
    pub op: String,
    #[serde(default)]
    pub params: Value,
    /// Request ID for correlation
    #[serde(default = "default_request_id")]
    pub id: String,
}

pub fn default_request_id() -> String {
    crate::core::time::new_event_id()
}

/// Standard response envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolResponse {
    pub id: String,
    pub success: bool,
    pub receipt: Receipt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Receipt {
    pub op: String,
    /// Unix epoch seconds, `Z`-suffixed
    pub timestamp: String,
    pub inputs_hash: String,
    pub outputs_hash: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub touched_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolError {
    /// Error kind, e.g. `InvalidJSON`
    pub code: String,
    pub message: String,
    pub suggestion: String,
}

/// What a tool hands back to the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub result: Value,
    pub touched_paths: Vec<String>,
}

/// Shared inputs for every tool call.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub config: Config,
    /// Base for relative paths in params.
    pub project_root: PathBuf,
}

impl ToolContext {
    pub fn new(config: Config, project_root: PathBuf) -> Self {
        Self {
            config,
            project_root,
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn constitution_path(&self, explicit: Option<&Path>) -> PathBuf {
        self.resolve(explicit.unwrap_or(self.config.constitution_path.as_path()))
    }
}

pub type ToolHandler = fn(&ToolContext, Value) -> Result<ToolOutput, SpecError>;

#[derive(Clone)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [&'static str],
    pub handler: ToolHandler,
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Tool>) -> Self {
        Self { tools }
    }

    /// The four spec tools plus `tools.list`.
    pub fn standard() -> Self {
        Self::new(vec![
            Tool {
                name: "constitution.parse",
                description: "Parse a constitution into tech stack, patterns, principles and standards",
                params: &["path?"],
                handler: parse_tool,
            },
            Tool {
                name: "spec.generate",
                description: "Assemble an OpenAPI 3.1 skeleton, applying the constitution's auth pattern",
                params: &["requirements", "constitution_path?", "title?"],
                handler: generate_tool,
            },
            Tool {
                name: "spec.verify",
                description: "Score a spec against the constitution's rules",
                params: &["spec_content", "constitution_path?", "profile?"],
                handler: verify_tool,
            },
            Tool {
                name: "spec.save",
                description: "Write a spec to disk as json or yaml",
                params: &["spec_content", "output_path", "format?"],
                handler: save_tool,
            },
        ])
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    fn listing(&self) -> Value {
        let mut entries: Vec<Value> = self
            .tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "params": t.params,
                })
            })
            .collect();
        entries.push(serde_json::json!({
            "name": "tools.list",
            "description": "List available tools",
            "params": [],
        }));
        Value::Array(entries)
    }

    fn invoke(&self, ctx: &ToolContext, op: &str, params: Value) -> Result<ToolOutput, SpecError> {
        if op == "tools.list" {
            return Ok(ToolOutput {
                result: self.listing(),
                touched_paths: vec![],
            });
        }
        let tool = self
            .get(op)
            .ok_or_else(|| SpecError::UnknownTool(op.to_string()))?;
        (tool.handler)(ctx, params)
    }

    /// Run one request. Never panics on bad input; every failure becomes an
    /// error envelope.
    pub fn dispatch(&self, ctx: &ToolContext, request: ToolRequest) -> ToolResponse {
        tracing::debug!(op = %request.op, id = %request.id, "dispatch");
        let response = match self.invoke(ctx, &request.op, request.params.clone()) {
            Ok(output) => success_response(request.id.clone(), &request.op, &request.params, output),
            Err(err) => {
                tracing::warn!(op = %request.op, kind = %err.kind(), error = %err, "tool failed");
                error_response(request.id.clone(), &request.op, &request.params, &err)
            }
        };

        if ctx.config.trace {
            let event = TraceEvent {
                trace_id: request.id.clone(),
                ts: response.receipt.timestamp.clone(),
                op: request.op.clone(),
                success: response.success,
                request: request.params,
                response: serde_json::to_value(&response).unwrap_or(Value::Null),
            };
            if let Err(e) = trace::append_trace(&ctx.resolve(&ctx.config.trace_path), event) {
                tracing::warn!(error = %e, "could not append trace event");
            }
        }
        response
    }
}

fn sha256_hex(value: &impl Serialize) -> String {
    format!(
        "{:x}",
        sha2::Sha256::digest(serde_json::to_string(value).unwrap_or_default())
    )
}

pub fn success_response(id: String, op: &str, params: &Value, output: ToolOutput) -> ToolResponse {
    ToolResponse {
        id,
        success: true,
        receipt: Receipt {
            op: op.to_string(),
            timestamp: crate::core::time::now_epoch_z(),
            inputs_hash: sha256_hex(params),
            outputs_hash: sha256_hex(&output.result),
            touched_paths: output.touched_paths,
        },
        result: Some(output.result),
        error: None,
    }
}

pub fn error_response(id: String, op: &str, params: &Value, err: &SpecError) -> ToolResponse {
    ToolResponse {
        id,
        success: false,
        receipt: Receipt {
            op: op.to_string(),
            timestamp: crate::core::time::now_epoch_z(),
            inputs_hash: sha256_hex(params),
            outputs_hash: format!("{:x}", sha2::Sha256::digest("error")),
            touched_paths: vec![],
        },
        result: None,
        error: Some(ToolError {
            code: err.kind().to_string(),
            message: err.to_string(),
            suggestion: err.suggestion(),
        }),
    }
}

/// Spec bodies arrive either as JSON text or as an inline document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SpecContent {
    Text(String),
    Document(Value),
}

impl SpecContent {
    /// Text form; inline documents are serialized compactly.
    pub fn into_text(self) -> Result<String, SpecError> {
        match self {
            SpecContent::Text(text) => Ok(text),
            SpecContent::Document(doc) => Ok(serde_json::to_string(&doc)?),
        }
    }
}

fn params<T: DeserializeOwned>(value: Value) -> Result<T, SpecError> {
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|e| SpecError::InvalidParams(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct ParseParams {
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct GenerateParams {
    requirements: String,
    constitution_path: Option<PathBuf>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
    spec_content: SpecContent,
    constitution_path: Option<PathBuf>,
    profile: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveParams {
    spec_content: SpecContent,
    output_path: PathBuf,
    format: Option<String>,
}

fn parse_tool(ctx: &ToolContext, raw: Value) -> Result<ToolOutput, SpecError> {
    let p: ParseParams = params(raw)?;
    let parsed = constitution::parse(&ctx.constitution_path(p.path.as_deref()))?;
    Ok(ToolOutput {
        result: serde_json::to_value(parsed)?,
        touched_paths: vec![],
    })
}

fn generate_tool(ctx: &ToolContext, raw: Value) -> Result<ToolOutput, SpecError> {
    let p: GenerateParams = params(raw)?;
    let constitution_path = p.constitution_path.as_deref().map(|path| ctx.resolve(path));
    let generated = openapi::generate(
        &p.requirements,
        constitution_path.as_deref(),
        p.title.as_deref(),
    );
    Ok(ToolOutput {
        result: serde_json::to_value(generated)?,
        touched_paths: vec![],
    })
}

fn verify_tool(ctx: &ToolContext, raw: Value) -> Result<ToolOutput, SpecError> {
    let p: VerifyParams = params(raw)?;
    let profile: RuleProfile = p
        .profile
        .as_deref()
        .unwrap_or(ctx.config.profile.as_str())
        .parse()?;
    let report = compliance::verify(
        &p.spec_content.into_text()?,
        &ctx.constitution_path(p.constitution_path.as_deref()),
        profile,
    )?;
    Ok(ToolOutput {
        result: serde_json::to_value(report)?,
        touched_paths: vec![],
    })
}

fn save_tool(ctx: &ToolContext, raw: Value) -> Result<ToolOutput, SpecError> {
    let p: SaveParams = params(raw)?;
    let format = p.format.unwrap_or_else(|| ctx.config.save_format.clone());
    let output_path = ctx.resolve(&p.output_path);
    let receipt = persist::save(&p.spec_content.into_text()?, &output_path, &format)?;
    Ok(ToolOutput {
        touched_paths: vec![receipt.file_path.clone()],
        result: serde_json::to_value(receipt)?,
    })
}
