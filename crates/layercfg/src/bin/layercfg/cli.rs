//! layercfg cli interface

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
    /// This is equivalent to running { cd <directory>; layercfg ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged value of a key
    Get(GetCommand),

    /// Exit with status 0 when any input has the key, 1 otherwise
    Has(HasCommand),

    /// Print everything, merged
    All(AllCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct GetCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Printed when the key is missing (parsed as json, otherwise used as string)
    #[clap(long = "default")]
    pub default: Option<String>,

    /// Key path, `.` or `/` delimited
    pub key: String,
}

#[derive(Parser, Debug)]
pub struct HasCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Key path, `.` or `/` delimited
    pub key: String,
}

#[derive(Parser, Debug)]
pub struct AllCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a file or directory
    ///
    /// Can be specified multiple times. Earlier inputs take precedence.
    #[clap(short = 'i', long = "input")]
    pub inputs: Vec<PathBuf>,

    /// Load files from work directory, after all other inputs
    #[clap(short = 'w', long = "input-workdir")]
    pub workdir: bool,

    /// Override a value: KEY=VALUE
    ///
    /// VALUE is parsed as json, otherwise used as string.
    #[clap(short = 's', long = "set", value_parser = parse_assignment)]
    pub overrides: Vec<(String, String)>,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
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
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Cached, stored and resolved data of every input
    Inspect,
}
