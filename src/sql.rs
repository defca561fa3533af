//! Parameterised bulk-insert statement construction.
//!
//! Column order in the statement follows the spreadsheet header order exactly,
//! which is what lets each positional response row serve as a parameter set.
//! Identifiers come from the code mapping, never from spreadsheet text; they
//! are wrapped in backticks because generated column names start with a digit.

use serde::Serialize;

use crate::{error::SqlError, mapping::CodeMapping, responses::CellValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub sql: String,
}

impl InsertStatement {
    pub fn parameter_count(&self) -> usize {
        self.columns.len()
    }
}

/// A statement plus the parameter rows it is executed with, written as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBatch {
    pub statement: InsertStatement,
    pub rows: Vec<Vec<CellValue>>,
}

pub fn build_insert(
    table: &str,
    codes: &[String],
    mapping: &CodeMapping,
) -> Result<InsertStatement, SqlError> {
    if codes.is_empty() {
        return Err(SqlError::NoColumns);
    }
    let columns = codes
        .iter()
        .map(|code| {
            mapping
                .get(code)
                .map(str::to_string)
                .ok_or_else(|| SqlError::UnmappedCode(code.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let quoted = columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Result<Vec<_>, _>>()?;
    let placeholders = vec!["?"; columns.len()];
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table)?,
        quoted.join(","),
        placeholders.join(",")
    );

    Ok(InsertStatement {
        table: table.to_string(),
        columns,
        sql,
    })
}

fn quote_identifier(identifier: &str) -> Result<String, SqlError> {
    if identifier.is_empty() || identifier.contains('`') {
        return Err(SqlError::UnsafeIdentifier(identifier.to_string()));
    }
    Ok(format!("`{identifier}`"))
}
