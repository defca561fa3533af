//! Response-table extraction from spreadsheets.
//!
//! The first row of the first sheet holds response codes; every following row
//! is one response. Cells are read positionally: each data row yields exactly
//! one value per header code, with empty cells kept as [`CellValue::Null`].

use std::{fmt, io::Cursor};

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDateTime, TimeDelta};
use encoding_rs::Encoding;
use log::debug;
use serde::Serialize;

use crate::error::SheetError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Elapsed time from a duration-formatted cell such as `[h]:mm:ss`.
    Duration(#[serde(serialize_with = "serialize_duration")] TimeDelta),
}

fn serialize_duration<S: serde::Serializer>(
    value: &TimeDelta,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&DurationText(*value))
}

/// `[-]H:MM:SS[.fff]` with hours allowed past 24.
struct DurationText(TimeDelta);

impl fmt::Display for DurationText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.num_milliseconds();
        let sign = if millis < 0 { "-" } else { "" };
        let millis = millis.unsigned_abs();
        let (secs, frac) = (millis / 1000, millis % 1000);
        write!(
            f,
            "{sign}{}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        )?;
        if frac > 0 {
            write!(f, ".{frac:03}")?;
        }
        Ok(())
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => {
                if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{v}")
                }
            }
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Duration(delta) => write!(f, "{}", DurationText(*delta)),
        }
    }
}

/// How the response spreadsheet is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// Any workbook calamine understands (xlsx, xlsm, xlsb, xls, ods).
    Workbook,
    /// Delimited text with the given separator.
    Delimited {
        delimiter: u8,
        encoding: &'static Encoding,
    },
}

/// Header codes plus positionally aligned response rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTable {
    pub codes: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResponseTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub fn extract_responses(bytes: &[u8], format: SheetFormat) -> Result<ResponseTable, SheetError> {
    match format {
        SheetFormat::Workbook => extract_workbook(bytes),
        SheetFormat::Delimited {
            delimiter,
            encoding,
        } => extract_delimited(bytes, delimiter, encoding),
    }
}

fn extract_workbook(bytes: &[u8]) -> Result<ResponseTable, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::NoSheets)??;
    table_from_range(&range)
}

fn table_from_range(range: &Range<Data>) -> Result<ResponseTable, SheetError> {
    // Positions are absolute so that column A is always the first code, even
    // when the used range starts further right or further down.
    let (last_row, last_col) = range.end().ok_or(SheetError::EmptyHeader)?;

    let header = (0..=last_col)
        .map(|col| range.get_value((0, col)).map(cell_text).unwrap_or_default())
        .collect::<Vec<_>>();
    let codes = trim_trailing_empty(header);
    if codes.is_empty() {
        return Err(SheetError::EmptyHeader);
    }

    let mut rows = Vec::new();
    for row in 1..=last_row {
        let values = (0..codes.len())
            .map(|col| {
                range
                    .get_value((row, col as u32))
                    .map(cell_value)
                    .unwrap_or(CellValue::Null)
            })
            .collect::<Vec<_>>();
        if values.iter().all(CellValue::is_null) {
            debug!("Skipping empty spreadsheet row {}", row + 1);
            continue;
        }
        rows.push(values);
    }
    Ok(ResponseTable { codes, rows })
}

fn extract_delimited(
    bytes: &[u8],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<ResponseTable, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.byte_records();
    let header = match records.next() {
        Some(record) => decode_record(&record?, encoding)?
            .into_iter()
            .map(|code| code.trim().to_string())
            .collect(),
        None => return Err(SheetError::EmptyHeader),
    };
    let codes = trim_trailing_empty(header);
    if codes.is_empty() {
        return Err(SheetError::EmptyHeader);
    }

    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        let decoded = decode_record(&record?, encoding)?;
        let values = (0..codes.len())
            .map(|col| match decoded.get(col) {
                Some(text) if !text.is_empty() => CellValue::Text(text.clone()),
                _ => CellValue::Null,
            })
            .collect::<Vec<_>>();
        if values.iter().all(CellValue::is_null) {
            debug!("Skipping empty spreadsheet row {}", idx + 2);
            continue;
        }
        rows.push(values);
    }
    Ok(ResponseTable { codes, rows })
}

fn decode_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> Result<Vec<String>, SheetError> {
    record
        .iter()
        .map(|field| {
            let (text, _, had_errors) = encoding.decode(field);
            if had_errors {
                Err(SheetError::Decode(encoding.name()))
            } else {
                Ok(text.into_owned())
            }
        })
        .collect()
}

fn trim_trailing_empty(mut header: Vec<String>) -> Vec<String> {
    while header.last().is_some_and(|code| code.is_empty()) {
        header.pop();
    }
    header
}

/// Header cells become response codes, so they are compared as text.
fn cell_text(cell: &Data) -> String {
    match cell_value(cell) {
        CellValue::Null => String::new(),
        CellValue::Text(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => dt
            .as_duration()
            .map(CellValue::Duration)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(err) => CellValue::Text(format!("#{err:?}")),
    }
}
