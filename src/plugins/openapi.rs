//! OpenAPI 3.1 skeleton assembly.
//!
//! This is a fixed-schema generator: requirements text lands in
//! `info.description` and nothing else. The only branching is the security
//! scheme picked from the constitution's auth pattern.

use crate::plugins::constitution::{self, ConstitutionDocument};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;

pub const OPENAPI_VERSION: &str = "3.1.0";
pub const DEFAULT_TITLE: &str = "Generated API";
pub const SPEC_FORMAT: &str = "openapi-3.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    OAuth2,
}

impl AuthScheme {
    /// Exact match on the extracted auth pattern.
    pub fn from_pattern(pattern: &str) -> Option<Self> {
        match pattern {
            "JWT" => Some(AuthScheme::Bearer),
            "OAuth2" => Some(AuthScheme::OAuth2),
            _ => None,
        }
    }

    pub fn scheme_name(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "bearerAuth",
            AuthScheme::OAuth2 => "oauth2",
        }
    }

    fn definition(&self) -> Value {
        match self {
            AuthScheme::Bearer => json!({
                "type": "http",
                "scheme": "bearer",
                "bearerFormat": "JWT"
            }),
            AuthScheme::OAuth2 => json!({
                "type": "oauth2",
                "flows": {
                    "authorizationCode": {
                        "authorizationUrl": "https://example.com/oauth/authorize",
                        "tokenUrl": "https://example.com/oauth/token",
                        "scopes": {}
                    }
                }
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSpec {
    pub specification: Value,
    pub format: String,
    pub constitution_applied: bool,
    pub notes: Vec<String>,
}

fn skeleton(requirements: &str, title: Option<&str>) -> Value {
    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_TITLE);
    json!({
        "openapi": OPENAPI_VERSION,
        "info": {
            "title": title,
            "version": "1.0.0",
            "description": requirements
        },
        "servers": [
            {"url": "https://api.example.com", "description": "Production server"}
        ],
        "paths": {},
        "components": {
            "schemas": {},
            "securitySchemes": {}
        }
    })
}

fn health_operation() -> Value {
    json!({
        "get": {
            "summary": "Health check endpoint",
            "responses": {
                "200": {
                    "description": "Service is healthy",
                    "content": {
                        "application/json": {
                            "schema": {
                                "type": "object",
                                "properties": {
                                    "status": {"type": "string", "example": "ok"}
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Assemble a spec from an already-parsed constitution.
pub fn assemble(
    requirements: &str,
    constitution: Option<&ConstitutionDocument>,
    title: Option<&str>,
) -> GeneratedSpec {
    let mut spec = skeleton(requirements, title);

    let scheme = constitution
        .and_then(ConstitutionDocument::auth)
        .and_then(AuthScheme::from_pattern);
    if let Some(scheme) = scheme {
        spec["components"]["securitySchemes"][scheme.scheme_name()] = scheme.definition();
        if scheme == AuthScheme::Bearer {
            let mut requirement = serde_json::Map::new();
            requirement.insert(scheme.scheme_name().to_string(), json!([]));
            spec["security"] = json!([requirement]);
        }
    }
    spec["paths"]["/health"] = health_operation();

    let mut notes = vec![
        "Basic OpenAPI 3.1 specification generated".to_string(),
        "Add more endpoints based on your requirements".to_string(),
    ];
    notes.push(match scheme {
        Some(s) => format!("Authentication configured ({})", s.scheme_name()),
        None => "No authentication configured".to_string(),
    });

    GeneratedSpec {
        specification: spec,
        format: SPEC_FORMAT.to_string(),
        constitution_applied: constitution.is_some(),
        notes,
    }
}

/// Assemble a spec, reading the constitution from `constitution_path` when given.
///
/// An unreadable constitution does not fail generation; it is logged and the
/// spec is built without it.
pub fn generate(
    requirements: &str,
    constitution_path: Option<&Path>,
    title: Option<&str>,
) -> GeneratedSpec {
    let constitution = constitution_path.and_then(|path| match constitution::parse(path) {
        Ok(parsed) => Some(parsed.constitution),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "constitution ignored");
            None
        }
    });
    assemble(requirements, constitution.as_ref(), title)
}
