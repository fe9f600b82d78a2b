use specmcp::core::error::{ErrorKind, SpecError};
use specmcp::plugins::constitution::{
    Category, ConstitutionDocument, MAX_PRINCIPLES, extract_keywords, extract_principles, parse,
};
use std::fs;
use tempfile::tempdir;

const SAMPLE: &str = "# Project Constitution

## Tech Stack
- Python 3.12 with FastAPI
- PostgreSQL for persistence
- Deployed with Docker on Kubernetes

## Architecture
We build Microservices exposing RESTful APIs secured with JWT.

## Standards
1. Test coverage must stay above 80 percent
2. All public functions carry type hints
* Documentation lives next to the code
- Short one
";

#[test]
fn sample_constitution_extracts_every_section() {
    let doc = ConstitutionDocument::from_text(SAMPLE);

    assert_eq!(doc.tech_stack[&Category::Language], "Python");
    assert_eq!(doc.tech_stack[&Category::Framework], "FastAPI");
    assert_eq!(doc.tech_stack[&Category::Database], "PostgreSQL");
    assert_eq!(doc.tech_stack[&Category::Deployment], "Kubernetes");

    assert_eq!(doc.patterns[&Category::Architecture], "Microservices");
    assert_eq!(doc.patterns[&Category::ApiStyle], "REST");
    assert_eq!(doc.patterns[&Category::Auth], "JWT");

    assert_eq!(doc.standards[&Category::Testing], "Required");
    assert_eq!(doc.standards[&Category::TypeHints], "Required");
    assert_eq!(doc.standards[&Category::Documentation], "Required");
}

#[test]
fn sample_principles_keep_document_order() {
    let principles = extract_principles(SAMPLE);
    assert_eq!(
        principles,
        vec![
            "Python 3.12 with FastAPI",
            "PostgreSQL for persistence",
            "Deployed with Docker on Kubernetes",
            "Test coverage must stay above 80 percent",
            "All public functions carry type hints",
            "Documentation lives next to the code",
        ]
    );
}

#[test]
fn no_markers_means_empty_mappings_but_principles_survive() {
    let text = "- Keep each module small\n- Review every change twice";
    let doc = ConstitutionDocument::from_text(text);
    assert!(doc.tech_stack.is_empty());
    assert!(doc.patterns.is_empty());
    assert!(doc.standards.is_empty());
    assert_eq!(doc.principles.len(), 2);
}

#[test]
fn principles_are_capped_at_ten() {
    let text: String = (0..25)
        .map(|i| format!("- Principle number {} is long enough\n", i))
        .collect();
    let principles = extract_principles(&text);
    assert_eq!(principles.len(), MAX_PRINCIPLES);
    assert_eq!(principles[0], "Principle number 0 is long enough");
    assert_eq!(principles[9], "Principle number 9 is long enough");
}

#[test]
fn principles_never_include_short_remainders() {
    let text = "- tiny\n* also tiny\n• 0123456789\n• 01234567890\n3. ten chars!";
    let principles = extract_principles(text);
    assert_eq!(principles, vec!["01234567890"]);
}

#[test]
fn indented_bullets_are_trimmed_first() {
    let principles = extract_principles("    -   Indented bullet with extra spaces   ");
    assert_eq!(principles, vec!["Indented bullet with extra spaces"]);
}

#[test]
fn first_marker_in_table_order_wins() {
    // "rest" precedes "graphql" in the table even though GraphQL appears first in the text
    let found = extract_keywords("GraphQL gateway in front of REST services");
    assert_eq!(found[&Category::ApiStyle], "REST");

    let found = extract_keywords("Built with Spring and Express adapters");
    assert_eq!(found[&Category::Framework], "Express");
}

#[test]
fn matching_is_case_insensitive() {
    let found = extract_keywords("MONGODB and OAUTH everywhere");
    assert_eq!(found[&Category::Database], "MongoDB");
    assert_eq!(found[&Category::Auth], "OAuth2");
}

#[test]
fn summary_lists_stack_then_principle_count() {
    let doc = ConstitutionDocument::from_text(SAMPLE);
    assert_eq!(
        doc.summary(),
        "Language: Python | Framework: FastAPI | Architecture: Microservices | API: REST | 6 principles defined"
    );
}

#[test]
fn parse_reports_metadata() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("constitution.md");
    fs::write(&path, SAMPLE).unwrap();

    let parsed = parse(&path).unwrap();
    assert_eq!(parsed.metadata.file_size, SAMPLE.chars().count());
    assert_eq!(parsed.metadata.lines, SAMPLE.split('\n').count());
    assert!(parsed.metadata.file_path.ends_with("constitution.md"));
    assert_eq!(parsed.summary, parsed.constitution.summary());
}

#[test]
fn file_size_counts_characters() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("constitution.md");
    let text = "• Déploiement continu sur Kubernetes\n";
    fs::write(&path, text).unwrap();

    let parsed = parse(&path).unwrap();
    assert_eq!(parsed.metadata.file_size, 37);
    assert!(text.len() > 37);
    assert_eq!(parsed.constitution.principles, vec!["Déploiement continu sur Kubernetes"]);
}

#[test]
fn parse_missing_file_is_file_not_found() {
    let dir = tempdir().unwrap();
    let err = parse(&dir.path().join("missing.md")).unwrap_err();
    assert!(matches!(err, SpecError::FileNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
}

#[test]
fn parsed_constitution_serializes_with_snake_case_keys() {
    let doc = ConstitutionDocument::from_text("Go services with gRPC");
    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["tech_stack"]["language"], "Go");
    assert_eq!(value["patterns"]["api_style"], "gRPC");
}
