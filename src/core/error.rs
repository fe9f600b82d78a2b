use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Spec content is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Spec content is not valid YAML: {0}")]
    InvalidYaml(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Missing dependency: {0}")]
    MissingDependency(String),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid config {}: {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

/// Machine-readable error classification carried in failure envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    FileNotFound,
    #[serde(rename = "InvalidJSON")]
    InvalidJson,
    #[serde(rename = "InvalidYAML")]
    InvalidYaml,
    UnsupportedFormat,
    MissingDependency,
    #[serde(rename = "IOFailure")]
    IoFailure,
    InvalidConfig,
    UnknownTool,
    InvalidParams,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::InvalidJson => "InvalidJSON",
            ErrorKind::InvalidYaml => "InvalidYAML",
            ErrorKind::UnsupportedFormat => "UnsupportedFormat",
            ErrorKind::MissingDependency => "MissingDependency",
            ErrorKind::IoFailure => "IOFailure",
            ErrorKind::InvalidConfig => "InvalidConfig",
            ErrorKind::UnknownTool => "UnknownTool",
            ErrorKind::InvalidParams => "InvalidParams",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SpecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpecError::FileNotFound(_) => ErrorKind::FileNotFound,
            SpecError::InvalidJson(_) => ErrorKind::InvalidJson,
            SpecError::InvalidYaml(_) => ErrorKind::InvalidYaml,
            SpecError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            SpecError::MissingDependency(_) => ErrorKind::MissingDependency,
            SpecError::IoError(_) => ErrorKind::IoFailure,
            SpecError::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            SpecError::UnknownTool(_) => ErrorKind::UnknownTool,
            SpecError::InvalidParams(_) => ErrorKind::InvalidParams,
        }
    }

    /// Remediation hint shown next to the error.
    pub fn suggestion(&self) -> String {
        match self {
            SpecError::FileNotFound(_) => {
                "Make sure you're in a SpecKit project directory with .specify/constitution.md"
                    .to_string()
            }
            SpecError::InvalidJson(_) => {
                "Make sure you're providing valid OpenAPI JSON".to_string()
            }
            SpecError::InvalidYaml(_) => {
                "Check the YAML syntax, or save the spec as JSON instead".to_string()
            }
            SpecError::UnsupportedFormat(_) => "Use 'json' or 'yaml'".to_string(),
            SpecError::MissingDependency(_) => {
                "Rebuild specmcp with the `yaml` feature enabled".to_string()
            }
            SpecError::IoError(_) => "Check file path and permissions".to_string(),
            SpecError::InvalidConfig { .. } => {
                "Fix the TOML syntax or remove the config file to use defaults".to_string()
            }
            SpecError::UnknownTool(_) => {
                "Run the `tools.list` op to see available tools".to_string()
            }
            SpecError::InvalidParams(_) => {
                "Check the op's required params with `tools.list`".to_string()
            }
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure {
            success: false,
            kind: self.kind(),
            error: self.to_string(),
            suggestion: self.suggestion(),
        }
    }
}

/// Structured failure result returned at the call boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub success: bool,
    pub kind: ErrorKind,
    pub error: String,
    pub suggestion: String,
}
