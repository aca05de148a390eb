use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "taskwire-runner")]
#[command(about = "Taskwire template CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Parse a template document and report validation issues.
    Validate(ValidateCommand),
    /// Print the canonical encoding or digest of a template.
    Canon(CanonCommand),
    /// Execute a template against the in-process operator.
    Run(RunCommand),
}

#[derive(Debug, Clone, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ValidateCommand {
    #[arg(long)]
    pub template: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, clap::Args)]
pub struct CanonCommand {
    #[arg(long)]
    pub template: PathBuf,
    #[arg(long, default_value_t = false)]
    pub digest: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RunCommand {
    #[arg(long)]
    pub template: PathBuf,
    /// Fixed service outputs, one entry per service name.
    #[arg(long)]
    pub bindings: Option<PathBuf>,
    /// Task input as a JSON literal.
    #[arg(long)]
    pub input: Option<String>,
    /// Metadata entries, `key=value`, repeatable.
    #[arg(long)]
    pub meta: Vec<String>,
    /// Write the event stream as JSONL to a file, or `-` for stdout.
    #[arg(long)]
    pub events_jsonl: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
