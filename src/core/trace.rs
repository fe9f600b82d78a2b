//! Append-only JSONL trace of dispatched ops.
//!
//! Requirements text and spec bodies routinely carry example credentials,
//! so every event is redacted before it touches disk.

use crate::core::error::SpecError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub trace_id: String,
    pub ts: String,
    pub op: String,
    pub success: bool,
    pub request: Value,
    pub response: Value,
}

static SECRET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r"(A3T[A-Z0-9]|AKIA|AGPA|AIDA|AROA|AIPA|ANPA|ANVA|ASIA)[0-9A-Z]{16}",
            "[AWS_KEY_REDACTED]",
        ),
        (
            r"(ghp|gho|ghu|ghs|ghr)_[a-zA-Z0-9_]{36,255}",
            "[GITHUB_TOKEN_REDACTED]",
        ),
        // JWTs pasted as OpenAPI examples
        (
            r"eyJ[a-zA-Z0-9_\-]{8,}\.[a-zA-Z0-9_\-]{8,}\.[a-zA-Z0-9_\-]+",
            "[JWT_REDACTED]",
        ),
        (r"(?i)bearer\s+[a-zA-Z0-9_\-\.]{20,}", "[BEARER_REDACTED]"),
        (
            r"-----BEGIN (?:RSA |DSA |EC |OPENSSH )?PRIVATE KEY-----[\s\S]*?-----END (?:RSA |DSA |EC |OPENSSH )?PRIVATE KEY-----",
            "[PEM_KEY_REDACTED]",
        ),
        (
            r#"(?i)(postgres|postgresql|mysql|mongodb|redis)://[^\s'"]+:[^\s'"]+@[^\s'"]+"#,
            "[CONNECTION_STRING_REDACTED]",
        ),
        (
            r#"(?i)(api[_-]?key|apikey|client_secret|secret[_-]?key)['"]?\s*[:=]\s*['"]?[a-zA-Z0-9_\-]{20,}['"]?"#,
            "[API_KEY_REDACTED]",
        ),
        (
            r#"(?i)(password|passwd|pwd)['"]?\s*[:=]\s*['"]?[^\s'"]{8,}['"]?"#,
            "[PASSWORD_REDACTED]",
        ),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Redact secrets from a plain string value.
pub fn redact_string(input: &str) -> String {
    let mut result = input.to_string();
    for (pattern, replacement) in SECRET_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }
    result
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    ["token", "secret", "password", "api_key", "authorization"]
        .iter()
        .any(|needle| lower.contains(needle))
}

/// Recursively redact a JSON value.
///
/// Values under sensitive-looking keys are replaced wholesale; every other
/// string is scanned for secret patterns. OpenAPI keywords such as
/// `tokenUrl` hold URLs, not secrets, so those keys are only pattern-scanned.
pub fn redact(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(&key) && !key.ends_with("Url") && val.is_string() {
                    redacted.insert(key, Value::String("[REDACTED]".to_string()));
                } else {
                    redacted.insert(key, redact(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        Value::String(s) => Value::String(redact_string(&s)),
        other => other,
    }
}

pub fn append_trace(trace_path: &Path, event: TraceEvent) -> Result<(), SpecError> {
    if let Some(parent) = trace_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(trace_path)?;

    let redacted = TraceEvent {
        request: redact(event.request),
        response: redact(event.response),
        ..event
    };

    let line = serde_json::to_string(&redacted)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Last `n` raw trace lines, oldest first.
pub fn read_last_traces(trace_path: &Path, n: usize) -> Result<Vec<String>, SpecError> {
    if !trace_path.exists() {
        return Ok(vec![]);
    }
    let content = fs::read_to_string(trace_path)?;
    let lines: Vec<String> = content.lines().map(|s| s.to_string()).collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].to_vec())
}
