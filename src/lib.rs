//! specmcp: spec-driven development tools for SpecKit-style projects.
//!
//! A project's *constitution* (conventionally `.specify/constitution.md`) is
//! free text describing the intended tech stack, architecture, and
//! principles. specmcp reads it with plain keyword and bullet-line matching,
//! assembles OpenAPI 3.1 skeletons that honour its auth pattern, and scores
//! candidate specs against a fixed rule table.
//!
//! The score is a heuristic summary, not a validation: there is no OpenAPI
//! schema checking beyond JSON well-formedness.
//!
//! # Operations
//!
//! - `parse`: constitution text → [`plugins::constitution::ParsedConstitution`]
//! - `generate`: requirements (+ constitution) → [`plugins::openapi::GeneratedSpec`]
//! - `verify`: spec JSON + constitution → [`plugins::compliance::ComplianceReport`]
//! - `save`: spec JSON → file (json or yaml)
//!
//! Every operation is also reachable through the JSON envelope dispatcher in
//! [`core::rpc`], which is what agent tooling talks to.
//!
//! # Examples
//!
//! ```bash
//! # What does the constitution ask for?
//! specmcp parse .specify/constitution.md
//!
//! # Build a skeleton and save it
//! specmcp generate --requirements "User auth API" --title "Auth API" --out specs/auth.json
//!
//! # Score it; fail CI below 90
//! specmcp verify --spec specs/auth.json --min-score 90
//!
//! # Same thing through the envelope interface
//! specmcp rpc --op spec.verify --params '{"spec_content": "{}"}'
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: errors, config, logging, trace, envelopes and dispatch
//! - [`plugins`]: constitution parsing, compliance scoring, spec assembly, persistence

pub mod core;
pub mod plugins;

mod cli;

use cli::{
    Cli, Command, GenerateCli, OutputFormat, ParseCli, RpcCli, RulesCli, SaveCli, VerifyCli,
};
use colored::Colorize;
use crate::core::config::{self, Config};
use crate::core::error::SpecError;
use crate::core::rpc::{self, ToolContext, ToolRegistry, ToolRequest};
use crate::core::{logging, output, time};
use crate::plugins::compliance::{self, ComplianceReport, RuleProfile, Severity};
use crate::plugins::constitution::{self, ParsedConstitution};
use crate::plugins::{openapi, persist};

use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;

pub const SPECMCP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit status when `verify --min-score` is not met.
const EXIT_BELOW_MIN_SCORE: u8 = 2;

fn command_meta(command: &Command) -> (&'static str, OutputFormat) {
    match command {
        Command::Parse(c) => ("parse", c.render.format),
        Command::Generate(c) => ("generate", c.render.format),
        Command::Verify(c) => ("verify", c.render.format),
        Command::Save(c) => ("save", c.render.format),
        Command::Rules(c) => ("rules", c.render.format),
        Command::Rpc(_) => ("rpc", OutputFormat::Json),
        Command::Version => ("version", OutputFormat::Text),
    }
}

pub fn run() -> Result<ExitCode, SpecError> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Command::Version = cli.command {
        println!("v{}", SPECMCP_VERSION);
        return Ok(ExitCode::SUCCESS);
    }

    let (cmd, format) = command_meta(&cli.command);
    let current_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => return Ok(report_failure(cmd, format, &SpecError::from(e))),
    };
    let config = match config::load_config(&current_dir, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return Ok(report_failure(cmd, format, &e)),
    };
    let ctx = ToolContext::new(config, current_dir);

    let outcome = match cli.command {
        Command::Parse(c) => run_parse(&ctx, c),
        Command::Generate(c) => run_generate(&ctx, c),
        Command::Verify(c) => run_verify(&ctx, c),
        Command::Save(c) => run_save(&ctx, c),
        Command::Rules(c) => run_rules(&ctx, c),
        Command::Rpc(c) => run_rpc(&ctx, c),
        Command::Version => Ok(ExitCode::SUCCESS),
    };

    match outcome {
        Ok(code) => Ok(code),
        Err(e) => Ok(report_failure(cmd, format, &e)),
    }
}

/// Render a failure at the CLI boundary. Never propagates.
fn report_failure(cmd: &str, format: OutputFormat, err: &SpecError) -> ExitCode {
    tracing::debug!(cmd, kind = %err.kind(), "command failed");
    match format {
        OutputFormat::Json => {
            let failure = serde_json::to_value(err.to_failure()).unwrap_or_default();
            print_json(&time::command_envelope(cmd, "error", failure));
        }
        OutputFormat::Text => {
            eprintln!(
                "{} {} {}",
                "✗".bright_red().bold(),
                err.kind().as_str().bright_red(),
                err
            );
            eprintln!("  {} {}", "hint:".bright_yellow(), err.suggestion());
        }
    }
    ExitCode::FAILURE
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("could not render JSON output: {}", e),
    }
}

fn print_ok(cmd: &str, result: &impl serde::Serialize) -> Result<(), SpecError> {
    let value = serde_json::to_value(result)?;
    print_json(&time::command_envelope(cmd, "ok", value));
    Ok(())
}

fn read_stdin() -> Result<String, SpecError> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn read_text(path: &Path) -> Result<String, SpecError> {
    if !path.exists() {
        return Err(SpecError::FileNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

fn resolve_profile(config: &Config, explicit: Option<&str>) -> Result<RuleProfile, SpecError> {
    explicit.unwrap_or(config.profile.as_str()).parse()
}

fn run_parse(ctx: &ToolContext, cli: ParseCli) -> Result<ExitCode, SpecError> {
    let parsed = constitution::parse(&ctx.constitution_path(cli.path.as_deref()))?;
    match cli.render.format {
        OutputFormat::Json => print_ok("parse", &parsed)?,
        OutputFormat::Text => render_constitution(&parsed),
    }
    Ok(ExitCode::SUCCESS)
}

fn render_constitution(parsed: &ParsedConstitution) {
    let doc = &parsed.constitution;
    println!(
        "{} {} ({} lines, {} bytes)",
        "Constitution:".bright_cyan().bold(),
        parsed.metadata.file_path,
        parsed.metadata.lines,
        parsed.metadata.file_size
    );
    println!("{} {}", "Summary:".bright_white().bold(), parsed.summary);

    let sections = [
        ("Tech stack", &doc.tech_stack),
        ("Patterns", &doc.patterns),
        ("Standards", &doc.standards),
    ];
    for (title, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        println!("{}", format!("{}:", title).bright_white().bold());
        let lines =
            output::key_value_lines(entries.iter().map(|(k, v)| (k.as_str(), v.as_str())), 2);
        for line in lines {
            println!("{}", line);
        }
    }

    if !doc.principles.is_empty() {
        println!("{}", "Principles:".bright_white().bold());
        for (i, principle) in doc.principles.iter().enumerate() {
            println!("  {}. {}", i + 1, output::compact_line(principle, 100));
        }
    }
}

fn run_generate(ctx: &ToolContext, cli: GenerateCli) -> Result<ExitCode, SpecError> {
    let requirements = match (cli.requirements, cli.requirements_file) {
        (Some(text), _) => text,
        (None, Some(path)) => read_text(&path)?,
        (None, None) => {
            return Err(SpecError::InvalidParams(
                "either --requirements or --requirements-file is required".to_string(),
            ));
        }
    };
    let constitution_path = cli.constitution.as_deref().map(|p| ctx.resolve(p));
    let generated = openapi::generate(
        &requirements,
        constitution_path.as_deref(),
        cli.title.as_deref(),
    );

    let receipt = match &cli.out {
        Some(out) => {
            let format = cli
                .save_format
                .clone()
                .unwrap_or_else(|| ctx.config.save_format.clone());
            let spec_json = serde_json::to_string(&generated.specification)?;
            Some(persist::save(&spec_json, out, &format)?)
        }
        None => None,
    };

    match cli.render.format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&generated)?;
            if let Some(receipt) = &receipt {
                value["saved"] = serde_json::to_value(receipt)?;
            }
            print_ok("generate", &value)?;
        }
        OutputFormat::Text => {
            if let Some(receipt) = &receipt {
                for note in &generated.notes {
                    println!("  {} {}", "▸".bright_cyan(), note);
                }
                println!("{} {}", "✓".bright_green().bold(), receipt.message);
            } else {
                // bare spec on stdout so it can be piped into `save` or `verify`
                println!("{}", persist::render(&generated.specification, persist::SaveFormat::Json)?);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Spec text for `verify`. YAML files are converted so rules see JSON text.
fn verify_input(cli: &VerifyCli) -> Result<String, SpecError> {
    if let Some(text) = &cli.spec_json {
        return Ok(text.clone());
    }
    match &cli.spec {
        Some(path) if persist::SaveFormat::from_path(path) == persist::SaveFormat::Yaml => {
            Ok(serde_json::to_string(&persist::load(path)?)?)
        }
        Some(path) => read_text(path),
        None => read_stdin(),
    }
}

fn run_verify(ctx: &ToolContext, cli: VerifyCli) -> Result<ExitCode, SpecError> {
    let profile = resolve_profile(&ctx.config, cli.profile.as_deref())?;
    let spec_text = verify_input(&cli)?;
    let report = compliance::verify(
        &spec_text,
        &ctx.constitution_path(cli.constitution.as_deref()),
        profile,
    )?;

    match cli.render.format {
        OutputFormat::Json => print_ok("verify", &report)?,
        OutputFormat::Text => render_report(&report),
    }

    match cli.min_score {
        Some(min) if report.compliance_score < min => {
            tracing::info!(score = report.compliance_score, min, "score below minimum");
            Ok(ExitCode::from(EXIT_BELOW_MIN_SCORE))
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn render_report(report: &ComplianceReport) {
    if report.is_compliant {
        println!("{} {}", "✅".green(), report.summary.bright_green().bold());
    } else {
        println!("{}  {}", "⚠️".yellow(), report.summary.bright_yellow().bold());
    }
    println!(
        "{} {}/100",
        "Score:".bright_white().bold(),
        report.compliance_score
    );

    if !report.violations.is_empty() {
        println!("{}", "Violations:".bright_white().bold());
        for v in &report.violations {
            let tag = match v.severity {
                Severity::Error => "[ERROR]".bright_red().bold(),
                Severity::Warning => "[WARN]".bright_yellow().bold(),
            };
            println!("  {} {}: {}", tag, v.rule, v.message);
            println!("      {} {}", "→".bright_cyan(), v.suggestion);
        }
    }
    if !report.checks_passed.is_empty() {
        println!(
            "{} {}",
            "Passed:".bright_white().bold(),
            output::preview_messages(&report.checks_passed, 8, 60)
        );
    }
}

fn run_save(ctx: &ToolContext, cli: SaveCli) -> Result<ExitCode, SpecError> {
    let spec_json = match cli.input.as_deref() {
        Some(path) if path != Path::new("-") => read_text(path)?,
        _ => read_stdin()?,
    };
    let format = cli
        .save_format
        .unwrap_or_else(|| ctx.config.save_format.clone());
    let receipt = persist::save(&spec_json, &cli.output, &format)?;

    match cli.render.format {
        OutputFormat::Json => print_ok("save", &receipt)?,
        OutputFormat::Text => {
            println!("{} {}", "✓".bright_green().bold(), receipt.message);
            println!(
                "  {} {} ({} bytes, {})",
                "▸".bright_cyan(),
                receipt.file_path,
                receipt.file_size,
                receipt.format.as_str()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_rules(ctx: &ToolContext, cli: RulesCli) -> Result<ExitCode, SpecError> {
    let profile = resolve_profile(&ctx.config, cli.profile.as_deref())?;
    let rules = compliance::rules_for(profile);

    match cli.render.format {
        OutputFormat::Json => {
            let listing: Vec<serde_json::Value> = rules
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "name": r.name,
                        "severity": r.severity,
                        "deduction": r.severity.deduction(),
                        "message": r.message,
                        "suggestion": r.suggestion,
                    })
                })
                .collect();
            print_ok("rules", &serde_json::json!({ "profile": profile, "rules": listing }))?;
        }
        OutputFormat::Text => {
            for (i, rule) in rules.iter().enumerate() {
                println!(
                    "{:>2}. {:<28} {:<8} -{}",
                    i + 1,
                    rule.name,
                    rule.severity.as_str(),
                    rule.severity.deduction()
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_rpc(ctx: &ToolContext, cli: RpcCli) -> Result<ExitCode, SpecError> {
    let registry = ToolRegistry::standard();

    let request = if cli.stdin {
        serde_json::from_str::<ToolRequest>(&read_stdin()?)
            .map_err(|e| SpecError::InvalidParams(format!("request envelope: {}", e)))
    } else {
        let params = match cli.params.as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| SpecError::InvalidParams(format!("--params: {}", e))),
            None => Ok(serde_json::Value::Null),
        };
        params.map(|params| ToolRequest {
            op: cli.op.unwrap_or_default(),
            params,
            id: rpc::default_request_id(),
        })
    };

    let response = match request {
        Ok(request) => registry.dispatch(ctx, request),
        Err(e) => rpc::error_response(
            rpc::default_request_id(),
            "unknown",
            &serde_json::Value::Null,
            &e,
        ),
    };

    print_json(&serde_json::to_value(&response)?);
    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
