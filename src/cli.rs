use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Import survey-response spreadsheets using the survey definition",
    long_about = None
)]
pub struct Cli {
    /// YAML configuration file (falls back to $SURVEY_IMPORT_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the response-code to column mapping derived from a survey definition
    Mapping(MappingArgs),
    /// Check a response spreadsheet's header against a survey definition
    Check(CheckArgs),
    /// Validate, obfuscate ids, and bulk-insert a response spreadsheet
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct MappingArgs {
    /// Survey definition (.lss) file, or '-' for stdin
    #[arg(short, long)]
    pub schema: PathBuf,
    /// Output format
    #[arg(long, default_value = "csv")]
    pub format: MappingFormat,
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum MappingFormat {
    Csv,
    Json,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Survey definition (.lss) file, or '-' for stdin
    #[arg(short, long)]
    pub schema: PathBuf,
    /// Response spreadsheet (.xlsx, .ods, .csv, ...), or '-' for a workbook on stdin
    #[arg(short, long)]
    pub responses: PathBuf,
    /// Character encoding of csv/tsv responses (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Survey definition (.lss) file, or '-' for stdin
    #[arg(short, long)]
    pub schema: PathBuf,
    /// Response spreadsheet (.xlsx, .ods, .csv, ...), or '-' for a workbook on stdin
    #[arg(short, long)]
    pub responses: PathBuf,
    /// SQLite database holding the survey_<id> response table
    #[arg(short, long)]
    pub database: Option<PathBuf>,
    /// Fixed batch salt (0-9999) instead of a random one
    #[arg(long)]
    pub salt: Option<u16>,
    /// Print the insert statement without writing anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Character encoding of csv/tsv responses (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}
