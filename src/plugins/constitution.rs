//! Constitution parsing.
//!
//! A constitution is free text. Everything structured about it is recovered
//! by two passes: an ordered keyword table (first match wins per category)
//! and a bullet-line scan for principles.

use crate::core::error::SpecError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const MAX_PRINCIPLES: usize = 10;
pub const MIN_PRINCIPLE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Language,
    Framework,
    Database,
    Deployment,
    Architecture,
    ApiStyle,
    Auth,
    Testing,
    TypeHints,
    Documentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    TechStack,
    Patterns,
    Standards,
}

impl Category {
    pub fn section(&self) -> Section {
        match self {
            Category::Language
            | Category::Framework
            | Category::Database
            | Category::Deployment => Section::TechStack,
            Category::Architecture | Category::ApiStyle | Category::Auth => Section::Patterns,
            Category::Testing | Category::TypeHints | Category::Documentation => {
                Section::Standards
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Language => "language",
            Category::Framework => "framework",
            Category::Database => "database",
            Category::Deployment => "deployment",
            Category::Architecture => "architecture",
            Category::ApiStyle => "api_style",
            Category::Auth => "auth",
            Category::Testing => "testing",
            Category::TypeHints => "type_hints",
            Category::Documentation => "documentation",
        }
    }
}

/// How a row's markers must appear in the lowercased text.
#[derive(Debug, Clone, Copy)]
pub enum Markers {
    AnyOf(&'static [&'static str]),
    AllOf(&'static [&'static str]),
}

impl Markers {
    fn matches(&self, haystack: &str) -> bool {
        match self {
            Markers::AnyOf(needles) => needles.iter().any(|n| haystack.contains(n)),
            Markers::AllOf(needles) => needles.iter().all(|n| haystack.contains(n)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub category: Category,
    pub value: &'static str,
    pub markers: Markers,
}

const fn any(
    category: Category,
    value: &'static str,
    needles: &'static [&'static str],
) -> KeywordRule {
    KeywordRule {
        category,
        value,
        markers: Markers::AnyOf(needles),
    }
}

/// Ordered marker table. Within a category the first matching row wins, so
/// more specific markers must precede the ones they contain
/// ("typescript"/"javascript" before "java", "kubernetes" before "docker").
pub const KEYWORD_TABLE: &[KeywordRule] = &[
    any(Category::Language, "Python", &["python"]),
    any(
        Category::Language,
        "TypeScript/JavaScript",
        &["typescript", "javascript"],
    ),
    any(Category::Language, "Java", &["java"]),
    any(Category::Language, "Go", &["go"]),
    any(Category::Framework, "FastAPI", &["fastapi"]),
    any(Category::Framework, "Django", &["django"]),
    any(Category::Framework, "Express", &["express"]),
    any(Category::Framework, "Spring", &["spring"]),
    any(Category::Database, "PostgreSQL", &["postgresql", "postgres"]),
    any(Category::Database, "MongoDB", &["mongodb"]),
    any(Category::Database, "MySQL", &["mysql"]),
    any(Category::Deployment, "Kubernetes", &["kubernetes"]),
    any(Category::Deployment, "Docker", &["docker"]),
    any(Category::Architecture, "Microservices", &["microservices"]),
    any(Category::Architecture, "Monolithic", &["monolith"]),
    any(Category::ApiStyle, "REST", &["rest", "restful"]),
    any(Category::ApiStyle, "GraphQL", &["graphql"]),
    any(Category::ApiStyle, "gRPC", &["grpc"]),
    any(Category::Auth, "JWT", &["jwt"]),
    any(Category::Auth, "OAuth2", &["oauth"]),
    KeywordRule {
        category: Category::Testing,
        value: "Required",
        markers: Markers::AllOf(&["test", "coverage"]),
    },
    any(Category::TypeHints, "Required", &["type hint", "typing"]),
    any(
        Category::Documentation,
        "Required",
        &["documentation", "docstring"],
    ),
];

/// Scan `content` against the keyword table. Only matched categories appear.
pub fn extract_keywords(content: &str) -> BTreeMap<Category, String> {
    let lower = content.to_lowercase();
    let mut found = BTreeMap::new();
    for rule in KEYWORD_TABLE {
        if found.contains_key(&rule.category) {
            continue;
        }
        if rule.markers.matches(&lower) {
            tracing::trace!(category = rule.category.as_str(), value = rule.value, "keyword match");
            found.insert(rule.category, rule.value.to_string());
        }
    }
    found
}

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•]|\d+\.)\s+(.*)$").expect("valid bullet regex")
});

/// First ten bullet or numbered lines whose text exceeds ten characters.
pub fn extract_principles(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(str::trim)
        .filter_map(|line| BULLET.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|principle| principle.chars().count() > MIN_PRINCIPLE_CHARS)
        .take(MAX_PRINCIPLES)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstitutionDocument {
    pub tech_stack: BTreeMap<Category, String>,
    pub patterns: BTreeMap<Category, String>,
    pub principles: Vec<String>,
    pub standards: BTreeMap<Category, String>,
}

impl ConstitutionDocument {
    pub fn from_text(content: &str) -> Self {
        let mut doc = ConstitutionDocument {
            principles: extract_principles(content),
            ..Default::default()
        };
        for (category, value) in extract_keywords(content) {
            let target = match category.section() {
                Section::TechStack => &mut doc.tech_stack,
                Section::Patterns => &mut doc.patterns,
                Section::Standards => &mut doc.standards,
            };
            target.insert(category, value);
        }
        doc
    }

    pub fn framework(&self) -> Option<&str> {
        self.tech_stack.get(&Category::Framework).map(String::as_str)
    }

    pub fn auth(&self) -> Option<&str> {
        self.patterns.get(&Category::Auth).map(String::as_str)
    }

    /// One-line human summary, e.g. `Language: Python | API: REST | 3 principles defined`.
    pub fn summary(&self) -> String {
        let labelled = [
            ("Language", self.tech_stack.get(&Category::Language)),
            ("Framework", self.tech_stack.get(&Category::Framework)),
            ("Architecture", self.patterns.get(&Category::Architecture)),
            ("API", self.patterns.get(&Category::ApiStyle)),
        ];
        let parts: Vec<String> = labelled
            .iter()
            .filter_map(|(label, value)| value.map(|v| format!("{}: {}", label, v)))
            .collect();

        let head = if parts.is_empty() {
            "No clear tech stack found".to_string()
        } else {
            parts.join(" | ")
        };
        format!("{} | {} principles defined", head, self.principles.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstitutionMetadata {
    pub file_path: String,
    /// Length in characters, not bytes.
    pub file_size: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedConstitution {
    pub constitution: ConstitutionDocument,
    pub metadata: ConstitutionMetadata,
    pub summary: String,
}

/// Read and parse the constitution at `path`.
pub fn parse(path: &Path) -> Result<ParsedConstitution, SpecError> {
    if !path.exists() {
        return Err(SpecError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let constitution = ConstitutionDocument::from_text(&content);
    let summary = constitution.summary();
    tracing::debug!(path = %absolute.display(), %summary, "parsed constitution");

    Ok(ParsedConstitution {
        constitution,
        metadata: ConstitutionMetadata {
            file_path: absolute.display().to_string(),
            file_size: content.chars().count(),
            lines: content.split('\n').count(),
        },
        summary,
    })
}
