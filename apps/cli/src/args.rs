//! # CLI Argument Definitions
//!
//! Command-line structure of the `blueprint` binary, built with `clap`.

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Render JSON documents through declarative view definitions.
#[derive(Debug, Parser)]
#[command(name = "blueprint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Render JSON documents through declarative view definitions")]
pub struct Cli {
    #[command(flatten)]
    pub logging: LogArgs,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: AppCommands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum AppCommands {
    /// Render an object or an array of objects through a view definition
    Render(RenderArgs),
    /// Print what a view definition compiles to, without rendering
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// View definition file (TOML, JSON or YAML)
    #[arg(short, long)]
    pub view: PathBuf,

    /// Input JSON document; stdin when omitted or `-`
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Render option as `key=value`; the value is parsed as JSON when possible
    #[arg(short = 'o', long = "option", value_parser = parse_option)]
    pub options: Vec<(String, Value)>,

    /// Pretty-print the rendered JSON
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// View definition file (TOML, JSON or YAML)
    #[arg(short, long)]
    pub view: PathBuf,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Also write logs to daily rolling files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Format file logs as JSON lines
    #[arg(long, global = true, requires = "log_dir")]
    pub json_logs: bool,
}

/// Parses `key=value`. Values that are not valid JSON are kept as strings.
fn parse_option(raw: &str) -> Result<(String, Value), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("expected `key=value`, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("option key is empty in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}
