use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "nodm",
    about = "Inspect and edit nodm record stores",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Backend URI; repeat to chain several (reads fall through, writes go to the first)
    #[arg(long = "store", value_name = "URI", global = true)]
    pub stores: Vec<String>,

    /// TOML store configuration, used when no --store is given
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the names in a section, optionally filtered
    Names(NamesArgs),
    /// Print one stored record
    Get(GetArgs),
    /// Store a raw JSON record
    Put(PutArgs),
}

#[derive(Args, Debug)]
pub struct NamesArgs {
    pub section: String,
    /// Condition PATH=VALUE on a dotted field path; VALUE is JSON, or a plain string
    #[arg(long = "where", value_name = "PATH=VALUE")]
    pub conditions: Vec<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    pub section: String,
    pub name: String,
}

#[derive(Args, Debug)]
pub struct PutArgs {
    pub section: String,
    pub name: String,
    /// The record, a JSON object
    pub record: String,
}
