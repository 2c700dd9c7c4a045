use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod check;
pub mod schemas;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a JSON payload against a schema document.
    Check(CheckArgs),
    /// List the schemas a directory provides.
    Schemas(SchemasArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Check(args) => check::run(args, format),
        Command::Schemas(args) => schemas::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// JSON payload file ("-" reads stdin).
    pub payload: PathBuf,
    /// Schema document file.
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["schema_dir", "name"],
        required_unless_present = "schema_dir"
    )]
    pub schema: Option<PathBuf>,
    /// Directory of `<name>.schema.json` documents.
    #[arg(long, value_name = "DIR", requires = "name")]
    pub schema_dir: Option<PathBuf>,
    /// Schema name to use from --schema-dir.
    #[arg(long, requires = "schema_dir")]
    pub name: Option<String>,
    /// Print failure messages even when they are not safe to show callers.
    #[arg(long)]
    pub show_unsafe: bool,
    /// Print the payload after format and parse write-backs.
    #[arg(long)]
    pub print_normalized: bool,
}

#[derive(Args, Debug)]
pub struct SchemasArgs {
    /// Directory of `<name>.schema.json` documents.
    pub dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
