//! CLI struct definitions for the specmcp command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "specmcp",
    version = env!("CARGO_PKG_VERSION"),
    about = "Spec-driven development tools: parse a constitution, assemble OpenAPI skeletons, and score specs for compliance."
)]
pub(crate) struct Cli {
    /// Config file (defaults to `.specmcp/config.toml` when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Enable debug logging on stderr (overridden by SPECMCP_LOG).
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args, Debug)]
pub(crate) struct FormatArg {
    /// Output format: 'text' or 'json'.
    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ParseCli {
    /// Constitution file (defaults to the configured constitution path).
    pub path: Option<PathBuf>,
    #[clap(flatten)]
    pub render: FormatArg,
}

#[derive(clap::Args, Debug)]
#[clap(group(clap::ArgGroup::new("requirements_source").required(true)))]
pub(crate) struct GenerateCli {
    /// Requirements text; stored as `info.description`.
    #[clap(long, group = "requirements_source")]
    pub requirements: Option<String>,
    /// Read requirements text from a file.
    #[clap(long, group = "requirements_source")]
    pub requirements_file: Option<PathBuf>,
    /// Constitution whose auth pattern selects the security scheme.
    #[clap(long)]
    pub constitution: Option<PathBuf>,
    /// API title (defaults to "Generated API").
    #[clap(long)]
    pub title: Option<String>,
    /// Also save the generated spec to this path.
    #[clap(long)]
    pub out: Option<PathBuf>,
    /// Format for `--out`: 'json' or 'yaml' (defaults to the configured format).
    #[clap(long)]
    pub save_format: Option<String>,
    #[clap(flatten)]
    pub render: FormatArg,
}

#[derive(clap::Args, Debug)]
pub(crate) struct VerifyCli {
    /// Spec file to check (`.json`, or `.yaml`/`.yml`).
    #[clap(long, conflicts_with = "spec_json")]
    pub spec: Option<PathBuf>,
    /// Spec JSON passed inline. Without `--spec` or `--spec-json`, stdin is read.
    #[clap(long)]
    pub spec_json: Option<String>,
    /// Constitution file (defaults to the configured constitution path).
    #[clap(long)]
    pub constitution: Option<PathBuf>,
    /// Rule profile: 'constitution' or 'strict'.
    #[clap(long)]
    pub profile: Option<String>,
    /// Exit with status 2 when the score is below this value.
    #[clap(long)]
    pub min_score: Option<u32>,
    #[clap(flatten)]
    pub render: FormatArg,
}

#[derive(clap::Args, Debug)]
pub(crate) struct SaveCli {
    /// Destination file; parent directories are created.
    #[clap(long, short = 'o')]
    pub output: PathBuf,
    /// JSON spec to save. Reads stdin when omitted or '-'.
    #[clap(long, short = 'i')]
    pub input: Option<PathBuf>,
    /// 'json' or 'yaml' (defaults to the configured format).
    #[clap(long)]
    pub save_format: Option<String>,
    #[clap(flatten)]
    pub render: FormatArg,
}

#[derive(clap::Args, Debug)]
pub(crate) struct RulesCli {
    /// Rule profile: 'constitution' or 'strict'.
    #[clap(long)]
    pub profile: Option<String>,
    #[clap(flatten)]
    pub render: FormatArg,
}

#[derive(clap::Args, Debug)]
pub(crate) struct RpcCli {
    /// Tool to invoke, e.g. `spec.verify`
    #[clap(long, required_unless_present = "stdin")]
    pub op: Option<String>,
    /// JSON parameters
    #[clap(long)]
    pub params: Option<String>,
    /// Read a full request envelope from stdin instead of the command line
    #[clap(long, conflicts_with_all = ["op", "params"])]
    pub stdin: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Extract tech stack, patterns, principles and standards from a constitution
    Parse(ParseCli),
    /// Assemble an OpenAPI 3.1 skeleton from requirements text
    Generate(GenerateCli),
    /// Score an OpenAPI document against the constitution
    Verify(VerifyCli),
    /// Save a JSON spec as json or yaml
    Save(SaveCli),
    /// List the compliance rules for a profile
    Rules(RulesCli),
    /// Invoke a tool with a JSON request/response envelope
    Rpc(RpcCli),
    /// Print the version
    Version,
}
