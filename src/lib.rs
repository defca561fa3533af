pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod import_cmd;
pub mod io_utils;
pub mod mapping;
pub mod obfuscate;
pub mod responses;
pub mod sql;
pub mod store;
pub mod survey;
pub mod validate;

use std::{
    env,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, info};
use serde::Serialize;

use crate::{
    cli::{CheckArgs, Cli, Commands, MappingArgs, MappingFormat},
    config::ImportConfig,
    error::{ImportError, ValidationError},
    mapping::CodeMapping,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("survey_import", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = ImportConfig::resolve(cli.config.as_deref())?;
    match cli.command {
        Commands::Mapping(args) => handle_mapping(&args),
        Commands::Check(args) => handle_check(&args, &config),
        Commands::Import(args) => import_cmd::execute(&args, &config),
    }
}

#[derive(Serialize)]
struct MappingReport<'a> {
    survey_id: u64,
    table: String,
    mapping: &'a CodeMapping,
}

fn handle_mapping(args: &MappingArgs) -> Result<()> {
    let bytes = io_utils::read_input(&args.schema)?;
    let schema = survey::parse_survey(&bytes)
        .with_context(|| format!("Parsing survey definition {:?}", args.schema))?;
    let mapping = mapping::build_code_mapping(&schema);

    let out: Box<dyn Write> = match &args.output {
        Some(path) if !io_utils::is_dash(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    };
    match args.format {
        MappingFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["code", "column"])?;
            for (code, column) in mapping.iter() {
                writer.write_record([code, column])?;
            }
            writer.flush()?;
        }
        MappingFormat::Json => {
            let report = MappingReport {
                survey_id: schema.survey_id,
                table: schema.table_name(),
                mapping: &mapping,
            };
            let mut out = out;
            serde_json::to_writer_pretty(&mut out, &report).context("Writing mapping JSON")?;
            writeln!(out)?;
            out.flush()?;
        }
    }
    info!(
        "Survey {} maps {} response code(s)",
        schema.survey_id,
        mapping.len()
    );
    Ok(())
}

fn handle_check(args: &CheckArgs, config: &ImportConfig) -> Result<()> {
    let encoding = io_utils::resolve_encoding(
        args.input_encoding
            .as_deref()
            .or(config.input_encoding.as_deref()),
    )?;
    let (schema_bytes, sheet_bytes) = read_inputs(&args.schema, &args.responses)?;
    let format = io_utils::resolve_sheet_format(&args.responses, encoding)?;
    match import::check_import(&schema_bytes, &sheet_bytes, format) {
        Ok(checked) => {
            info!(
                "✓ {:?} matches survey {} ({} column(s), {} row(s))",
                args.responses,
                checked.schema.survey_id,
                checked.responses.codes.len(),
                checked.responses.row_count()
            );
            Ok(())
        }
        Err(ImportError::Validation(err)) => Err(report_mismatches(&err)),
        Err(err) => Err(err).with_context(|| format!("Checking {:?}", args.responses)),
    }
}

/// Reads the survey definition and the response file; at most one may be stdin.
pub(crate) fn read_inputs(schema: &Path, responses: &Path) -> Result<(Vec<u8>, Vec<u8>)> {
    if io_utils::is_dash(schema) && io_utils::is_dash(responses) {
        bail!("Only one of --schema and --responses can read from stdin");
    }
    let schema_bytes = io_utils::read_input(schema)?;
    let sheet_bytes = io_utils::read_input(responses)?;
    Ok((schema_bytes, sheet_bytes))
}

/// Prints every header mismatch on its own line and returns the summary error.
pub(crate) fn report_mismatches(err: &ValidationError) -> anyhow::Error {
    for message in &err.messages {
        println!("{message}");
    }
    anyhow::anyhow!(
        "{} spreadsheet header(s) are not present in this survey",
        err.messages.len()
    )
}
