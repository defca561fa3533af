//! Input helpers shared by the command handlers.
//!
//! - `-` as a path reads standard input.
//! - The response file format is chosen from its extension: workbooks go
//!   through calamine, `.csv`/`.tsv` through the csv reader.
//! - Delimited input is decoded with `encoding_rs`, defaulting to UTF-8.

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

use crate::{error::SheetError, responses::SheetFormat};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    if is_dash(path) {
        let mut buf = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("Reading standard input")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("Opening input file {path:?}"))
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Standard input is assumed to carry a workbook.
pub fn resolve_sheet_format(
    path: &Path,
    encoding: &'static Encoding,
) -> Result<SheetFormat, SheetError> {
    if is_dash(path) {
        return Ok(SheetFormat::Workbook);
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" => Ok(SheetFormat::Delimited {
            delimiter: DEFAULT_CSV_DELIMITER,
            encoding,
        }),
        "tsv" => Ok(SheetFormat::Delimited {
            delimiter: DEFAULT_TSV_DELIMITER,
            encoding,
        }),
        ext if WORKBOOK_EXTENSIONS.contains(&ext) => Ok(SheetFormat::Workbook),
        other => Err(SheetError::UnsupportedFormat(other.to_string())),
    }
}
