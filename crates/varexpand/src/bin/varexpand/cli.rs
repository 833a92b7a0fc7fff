//! varexpand cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; varexpand ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Expand variables
    ///
    /// Reads KEY=VALUE lines from stdin unless any other source is provided
    #[command(alias = "x")]
    Expand(ExpandCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct ExpandCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub expansion: ExpansionArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a file (.hcl or KEY=VALUE lines)
    #[clap(short = 'f', long = "input-file")]
    pub files: Vec<PathBuf>,

    /// Load *.env and *vars.hcl files from given directory
    #[clap(short = 'd', long = "input-dir")]
    pub directories: Vec<PathBuf>,

    /// Layer all variables over the process environment
    #[clap(short = 'e', long = "with-env")]
    pub with_env: bool,

    /// Additional KEY=VALUE assignments, applied last
    pub assignments: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct ExpansionArgs {
    /// How escaped markers ($$) appear in the output
    #[arg(long = "escapes", default_value_t)]
    pub escapes: Escapes,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum Escapes {
    #[default]
    Preserve,
    Collapse,
}

impl std::fmt::Display for Escapes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Escapes::Preserve => f.write_str("preserve"),
            Escapes::Collapse => f.write_str("collapse"),
        }
    }
}

impl From<Escapes> for varexpand::EscapeMode {
    fn from(value: Escapes) -> Self {
        match value {
            Escapes::Preserve => varexpand::EscapeMode::Preserve,
            Escapes::Collapse => varexpand::EscapeMode::Collapse,
        }
    }
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
    Dotenv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
            OutputFormat::Dotenv => f.write_str("dotenv"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Every loaded entry and where it came from
    Sources(InputArgs),
    /// Dependency graph (dotenv format prints one edge per line)
    Graph(DevGraphCommand),
    /// Expansion order
    Order(InputArgs),
}

#[derive(Parser, Debug)]
pub struct DevGraphCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}
