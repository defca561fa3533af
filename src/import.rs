//! End-to-end import: survey definition + response spreadsheet -> one batch.
//!
//! [`prepare_import`] runs every pure stage and stops at the first failure
//! (header mismatches are collected, not fail-fast). [`run_import`] then hands
//! the batch to a caller-owned [`ResponseStore`] and waits for it to finish.

use log::{error, info};

use crate::{
    error::ImportError,
    mapping::{CodeMapping, build_code_mapping},
    obfuscate::{BatchSalt, obfuscate_ids},
    responses::{ResponseTable, SheetFormat, extract_responses},
    sql::{InsertBatch, build_insert},
    store::ResponseStore,
    survey::{SurveySchema, parse_survey},
    validate::validate_codes,
};

/// Schema and responses that have passed header validation.
#[derive(Debug, Clone)]
pub struct CheckedImport {
    pub schema: SurveySchema,
    pub mapping: CodeMapping,
    pub responses: ResponseTable,
}

/// A batch ready for the storage collaborator.
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub batch: InsertBatch,
    pub salt: BatchSalt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub table: String,
    pub rows_written: usize,
    pub salt: BatchSalt,
}

/// Parses both inputs and validates the spreadsheet header against the survey.
pub fn check_import(
    schema_bytes: &[u8],
    sheet_bytes: &[u8],
    format: SheetFormat,
) -> Result<CheckedImport, ImportError> {
    let schema = parse_survey(schema_bytes)?;
    let mapping = build_code_mapping(&schema);
    let responses = extract_responses(sheet_bytes, format)?;
    validate_codes(&responses.codes, &mapping)?;
    Ok(CheckedImport {
        schema,
        mapping,
        responses,
    })
}

pub fn prepare_import(
    schema_bytes: &[u8],
    sheet_bytes: &[u8],
    format: SheetFormat,
    salt: Option<BatchSalt>,
) -> Result<PreparedImport, ImportError> {
    let CheckedImport {
        schema,
        mapping,
        mut responses,
    } = check_import(schema_bytes, sheet_bytes, format)?;

    let salt = salt.unwrap_or_else(BatchSalt::random);
    obfuscate_ids(&mut responses.rows, salt)?;
    let statement = build_insert(&schema.table_name(), &responses.codes, &mapping)?;
    Ok(PreparedImport {
        batch: InsertBatch {
            statement,
            rows: responses.rows,
        },
        salt,
    })
}

pub fn run_import(
    store: &mut dyn ResponseStore,
    schema_bytes: &[u8],
    sheet_bytes: &[u8],
    format: SheetFormat,
    salt: Option<BatchSalt>,
) -> Result<ImportOutcome, ImportError> {
    let prepared = prepare_import(schema_bytes, sheet_bytes, format, salt)?;
    let table = prepared.batch.statement.table.clone();
    info!(
        "Importing {} row(s) into {}...",
        prepared.batch.rows.len(),
        table
    );
    let rows_written = store.insert_batch(&prepared.batch).map_err(|err| {
        error!("Error {table}: {err}");
        err
    })?;
    info!("OK {table}");
    Ok(ImportOutcome {
        table,
        rows_written,
        salt: prepared.salt,
    })
}
