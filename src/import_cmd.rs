use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{
    cli::ImportArgs,
    config::ImportConfig,
    error::ImportError,
    import::{self, PreparedImport},
    io_utils,
    obfuscate::BatchSalt,
    read_inputs, report_mismatches,
    store::SqliteStore,
};

pub fn execute(args: &ImportArgs, config: &ImportConfig) -> Result<()> {
    let encoding = io_utils::resolve_encoding(
        args.input_encoding
            .as_deref()
            .or(config.input_encoding.as_deref()),
    )?;
    let salt = args
        .salt
        .or(config.salt)
        .map(BatchSalt::new)
        .transpose()?;
    let (schema_bytes, sheet_bytes) = read_inputs(&args.schema, &args.responses)?;
    let format = io_utils::resolve_sheet_format(&args.responses, encoding)?;

    if args.dry_run {
        let prepared = import::prepare_import(&schema_bytes, &sheet_bytes, format, salt)
            .map_err(|err| describe(err, args))?;
        print_dry_run(&prepared);
        return Ok(());
    }

    let database = args
        .database
        .as_ref()
        .or(config.database.as_ref())
        .ok_or_else(|| {
            anyhow!("No database configured; pass --database or set `database` in the config file")
        })?;
    let mut store = SqliteStore::open(database)
        .with_context(|| format!("Opening database {database:?}"))?;
    let outcome = import::run_import(&mut store, &schema_bytes, &sheet_bytes, format, salt)
        .map_err(|err| describe(err, args))?;
    info!(
        "Imported {} row(s) into {} (batch salt {:04})",
        outcome.rows_written,
        outcome.table,
        outcome.salt.value()
    );
    Ok(())
}

fn describe(err: ImportError, args: &ImportArgs) -> anyhow::Error {
    match err {
        ImportError::Validation(err) => report_mismatches(&err),
        other => anyhow::Error::new(other).context(format!(
            "Importing {:?} with survey definition {:?}",
            args.responses, args.schema
        )),
    }
}

fn print_dry_run(prepared: &PreparedImport) {
    println!("{}", prepared.batch.statement.sql);
    info!(
        "Dry run: {} row(s) prepared for {} (batch salt {:04}); nothing written",
        prepared.batch.rows.len(),
        prepared.batch.statement.table,
        prepared.salt.value()
    );
}
