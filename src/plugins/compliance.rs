//! Constitution compliance scoring for OpenAPI-shaped documents.
//!
//! Rules are a fixed, ordered table. Each rule inspects the parsed spec and
//! the constitution independently of every other rule; a failure becomes one
//! violation and costs 20 points (error) or 10 points (warning).

use crate::core::error::SpecError;
use crate::plugins::constitution::{self, ConstitutionDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;

pub const MAX_SCORE: u32 = 100;
pub const ERROR_DEDUCTION: u32 = 20;
pub const WARNING_DEDUCTION: u32 = 10;

const COMPLIANT_SUMMARY: &str = "Fully compliant";
const COMPLIANT_RECOMMENDATION: &str = "Specification follows all constitution rules";
const ERROR_RESPONSE_CODES: &[&str] = &["400", "401", "403", "404", "500"];
const HTTP_METHODS: &[&str] = &[
    "get", "post", "put", "delete", "patch", "options", "head", "trace",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn deduction(&self) -> u32 {
        match self {
            Severity::Error => ERROR_DEDUCTION,
            Severity::Warning => WARNING_DEDUCTION,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleProfile {
    /// Only the rules derived from the constitution.
    #[default]
    Constitution,
    /// Constitution rules plus structural OpenAPI checks.
    Strict,
}

impl FromStr for RuleProfile {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "constitution" | "default" => Ok(RuleProfile::Constitution),
            "strict" => Ok(RuleProfile::Strict),
            other => Err(SpecError::InvalidParams(format!(
                "unknown rule profile '{}' (expected 'constitution' or 'strict')",
                other
            ))),
        }
    }
}

/// Everything a rule predicate may look at.
pub struct RuleInput<'a> {
    pub spec: &'a Value,
    /// Lowercased spec text as received.
    pub spec_text: &'a str,
    pub constitution: &'a ConstitutionDocument,
}

/// Predicate result. `Fail` carries the text substituted for `{subject}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(String),
    NotApplicable,
}

pub struct ComplianceRule {
    pub name: &'static str,
    pub severity: Severity,
    pub message: &'static str,
    pub suggestion: &'static str,
    pub check: fn(&RuleInput<'_>) -> Outcome,
}

impl ComplianceRule {
    fn violation(&self, subject: &str) -> Violation {
        Violation {
            rule: self.name.to_string(),
            severity: self.severity,
            message: self.message.replace("{subject}", subject),
            suggestion: self.suggestion.replace("{subject}", subject),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub is_compliant: bool,
    pub compliance_score: u32,
    pub violations: Vec<Violation>,
    pub checks_passed: Vec<String>,
    pub summary: String,
    pub recommendations: Vec<String>,
}

fn check_framework(input: &RuleInput<'_>) -> Outcome {
    match input.constitution.framework() {
        None => Outcome::NotApplicable,
        Some(framework) if input.spec_text.contains(&framework.to_lowercase()) => Outcome::Pass,
        Some(framework) => Outcome::Fail(framework.to_string()),
    }
}

fn has_entries(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

fn security_schemes(spec: &Value) -> Option<&Value> {
    spec.get("components").and_then(|c| c.get("securitySchemes"))
}

fn check_auth_scheme(input: &RuleInput<'_>) -> Outcome {
    match input.constitution.auth() {
        None => Outcome::NotApplicable,
        Some(_) if has_entries(security_schemes(input.spec)) => Outcome::Pass,
        Some(auth) => Outcome::Fail(auth.to_string()),
    }
}

fn check_health_endpoint(input: &RuleInput<'_>) -> Outcome {
    let has_health = input
        .spec
        .get("paths")
        .and_then(Value::as_object)
        .is_some_and(|paths| paths.contains_key("/health"));
    if has_health {
        Outcome::Pass
    } else {
        Outcome::Fail("/health".to_string())
    }
}

fn check_openapi_version(input: &RuleInput<'_>) -> Outcome {
    match input.spec.get("openapi").and_then(Value::as_str) {
        Some("3.1.0") => Outcome::Pass,
        Some(other) => Outcome::Fail(other.to_string()),
        None => Outcome::Fail("none".to_string()),
    }
}

/// `(path, method, operation)` for every HTTP operation under `paths`.
fn operations(spec: &Value) -> Vec<(&str, &str, &Value)> {
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return vec![];
    };
    paths
        .iter()
        .filter_map(|(path, item)| item.as_object().map(|ops| (path.as_str(), ops)))
        .flat_map(|(path, ops)| {
            ops.iter()
                .filter(|(method, _)| HTTP_METHODS.contains(&method.as_str()))
                .map(move |(method, op)| (path, method.as_str(), op))
        })
        .collect()
}

fn check_auth_enforcement(input: &RuleInput<'_>) -> Outcome {
    if !has_entries(security_schemes(input.spec)) {
        return Outcome::NotApplicable;
    }
    if has_entries(input.spec.get("security")) {
        return Outcome::Pass;
    }
    let unprotected: Vec<String> = operations(input.spec)
        .into_iter()
        .filter(|(path, _, op)| *path != "/health" && op.get("security").is_none())
        .map(|(path, method, _)| format!("{} {}", method.to_uppercase(), path))
        .collect();
    if unprotected.is_empty() {
        Outcome::Pass
    } else {
        Outcome::Fail(unprotected.join(", "))
    }
}

fn check_error_responses(input: &RuleInput<'_>) -> Outcome {
    let has_error_schema = input
        .spec
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(|s| s.get("Error"))
        .is_some();
    let declares_error_codes = operations(input.spec).iter().any(|(_, _, op)| {
        op.get("responses")
            .and_then(Value::as_object)
            .is_some_and(|responses| {
                responses
                    .keys()
                    .any(|code| ERROR_RESPONSE_CODES.contains(&code.as_str()))
            })
    });
    if has_error_schema && declares_error_codes {
        Outcome::Pass
    } else {
        Outcome::Fail(String::new())
    }
}

fn check_schema_typing(input: &RuleInput<'_>) -> Outcome {
    let Some(schemas) = input
        .spec
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
        .filter(|s| !s.is_empty())
    else {
        return Outcome::NotApplicable;
    };
    let untyped: Vec<&str> = schemas
        .iter()
        .filter(|(_, schema)| {
            !["type", "$ref", "properties", "allOf", "oneOf", "anyOf"]
                .iter()
                .any(|key| schema.get(key).is_some())
        })
        .map(|(name, _)| name.as_str())
        .collect();
    if untyped.is_empty() {
        Outcome::Pass
    } else {
        Outcome::Fail(untyped.join(", "))
    }
}

pub const CONSTITUTION_RULES: &[ComplianceRule] = &[
    ComplianceRule {
        name: "Tech Stack Compliance",
        severity: Severity::Warning,
        message: "Constitution requires {subject}, not found in spec",
        suggestion: "Add {subject} references to spec description",
        check: check_framework,
    },
    ComplianceRule {
        name: "Authentication Required",
        severity: Severity::Error,
        message: "Constitution requires {subject} authentication",
        suggestion: "Add {subject} security scheme to components.securitySchemes",
        check: check_auth_scheme,
    },
    ComplianceRule {
        name: "Health Endpoint Required",
        severity: Severity::Warning,
        message: "All services should have a /health endpoint",
        suggestion: "Add GET /health endpoint for monitoring",
        check: check_health_endpoint,
    },
];

pub const STRICT_RULES: &[ComplianceRule] = &[
    ComplianceRule {
        name: "OpenAPI Version",
        severity: Severity::Error,
        message: "Expected OpenAPI 3.1.0, got {subject}",
        suggestion: "Update openapi field to 3.1.0",
        check: check_openapi_version,
    },
    ComplianceRule {
        name: "Authentication Enforcement",
        severity: Severity::Warning,
        message: "Operations not requiring auth: {subject}",
        suggestion: "Add a security requirement to protected operations",
        check: check_auth_enforcement,
    },
    ComplianceRule {
        name: "Error Handling",
        severity: Severity::Warning,
        message: "Incomplete error response definitions",
        suggestion: "Add an Error schema and declare HTTP error responses on operations",
        check: check_error_responses,
    },
    ComplianceRule {
        name: "Schema Typing",
        severity: Severity::Warning,
        message: "Schemas without type definitions: {subject}",
        suggestion: "Give every schema a type, $ref, or properties",
        check: check_schema_typing,
    },
];

/// Rules evaluated for `profile`, in order.
pub fn rules_for(profile: RuleProfile) -> Vec<&'static ComplianceRule> {
    let strict: &'static [ComplianceRule] = match profile {
        RuleProfile::Constitution => &[],
        RuleProfile::Strict => STRICT_RULES,
    };
    CONSTITUTION_RULES.iter().chain(strict.iter()).collect()
}

/// `max(0, 100 - Σ deductions)`.
pub fn compliance_score(violations: &[Violation]) -> u32 {
    let deductions: u32 = violations.iter().map(|v| v.severity.deduction()).sum();
    MAX_SCORE.saturating_sub(deductions)
}

pub fn summarize(violations: &[Violation]) -> String {
    if violations.is_empty() {
        COMPLIANT_SUMMARY.to_string()
    } else {
        format!("{} violation(s) found", violations.len())
    }
}

pub fn recommendations(violations: &[Violation]) -> Vec<String> {
    if violations.is_empty() {
        vec![COMPLIANT_RECOMMENDATION.to_string()]
    } else {
        violations.iter().map(|v| v.suggestion.clone()).collect()
    }
}

/// Evaluate an already-parsed spec. `spec_text` is the text the framework
/// rule searches; pass the original input when available.
pub fn evaluate(
    spec: &Value,
    spec_text: &str,
    constitution: &ConstitutionDocument,
    profile: RuleProfile,
) -> ComplianceReport {
    let lowered = spec_text.to_lowercase();
    let input = RuleInput {
        spec,
        spec_text: &lowered,
        constitution,
    };

    let mut violations = Vec::new();
    let mut checks_passed = Vec::new();
    for rule in rules_for(profile) {
        match (rule.check)(&input) {
            Outcome::Pass => checks_passed.push(rule.name.to_string()),
            Outcome::Fail(subject) => {
                tracing::debug!(rule = rule.name, severity = rule.severity.as_str(), "rule failed");
                violations.push(rule.violation(&subject));
            }
            Outcome::NotApplicable => {}
        }
    }

    ComplianceReport {
        is_compliant: violations.is_empty(),
        compliance_score: compliance_score(&violations),
        summary: summarize(&violations),
        recommendations: recommendations(&violations),
        checks_passed,
        violations,
    }
}

/// Parse `spec_text` as JSON and score it. Malformed JSON aborts scoring.
pub fn check_compliance(
    spec_text: &str,
    constitution: &ConstitutionDocument,
    profile: RuleProfile,
) -> Result<ComplianceReport, SpecError> {
    let spec: Value = serde_json::from_str(spec_text)?;
    Ok(evaluate(&spec, spec_text, constitution, profile))
}

/// Load the constitution at `constitution_path`, then score `spec_text`.
pub fn verify(
    spec_text: &str,
    constitution_path: &Path,
    profile: RuleProfile,
) -> Result<ComplianceReport, SpecError> {
    let parsed = constitution::parse(constitution_path)?;
    let report = check_compliance(spec_text, &parsed.constitution, profile)?;
    tracing::info!(
        score = report.compliance_score,
        violations = report.violations.len(),
        "verified spec"
    );
    Ok(report)
}
