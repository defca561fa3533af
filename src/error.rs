//! Error types for every stage of a survey import.
//!
//! Each stage owns a focused error enum; [`ImportError`] wraps them so the
//! pipeline can fail fast with `?` while callers can still match on the kind
//! (schema, spreadsheet, validation, identifier, statement, storage).

use thiserror::Error;

/// Failure while reading a survey-definition document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Survey definition is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Malformed survey definition: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Survey definition root element must be <document>, found <{0}>")]
    UnexpectedRoot(String),

    #[error("Survey definition has no <{0}> section")]
    MissingSection(&'static str),

    #[error("Row {row} of <{section}> is missing field <{field}>")]
    MissingField {
        section: &'static str,
        row: usize,
        field: &'static str,
    },

    #[error("Field <{field}> holds '{value}', expected an unsigned integer")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Unknown question type '{0}'")]
    UnknownQuestionType(String),

    #[error("Subquestion scale '{0}' is not 0 or 1")]
    InvalidScale(String),

    #[error("Question {qid} in group {gid} is defined more than once")]
    DuplicateQuestion { gid: u64, qid: u64 },

    #[error("Subquestion {qid} of question {parent_qid} is defined more than once")]
    DuplicateSubquestion { qid: u64, parent_qid: u64 },

    #[error("Subquestion {qid} references parent question {parent_qid} in group {gid}, which does not exist")]
    ParentNotFound { qid: u64, parent_qid: u64, gid: u64 },

    #[error("Survey definition does not contain any questions")]
    NoQuestions,
}

/// Failure while extracting the response table from a spreadsheet.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Unable to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Unable to read delimited file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to decode text with encoding {0}")]
    Decode(&'static str),

    #[error("Workbook does not contain any sheets")]
    NoSheets,

    #[error("Spreadsheet header row is empty")]
    EmptyHeader,

    #[error("Unsupported spreadsheet extension '{0}'")]
    UnsupportedFormat(String),
}

/// Every spreadsheet header that the code mapping does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} spreadsheet header(s) do not match the survey: {}", .messages.len(), .messages.join("; "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

/// Failure while rewriting the record identifier column.
///
/// `row` counts data rows from 1 after blank rows were dropped, so it is not a
/// spreadsheet line number.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Batch salt {0} is out of range (expected 0..10000)")]
    SaltOutOfRange(u16),

    #[error("Data row {row}: identifier '{value}' is not a non-negative whole number")]
    NotAnInteger { row: usize, value: String },

    #[error("Data row {row}: obfuscated identifier '{digits}' does not fit in a 64-bit integer")]
    Overflow { row: usize, digits: String },
}

/// Failure while assembling the insert statement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SqlError {
    #[error("Response code '{0}' has no column in the code mapping")]
    UnmappedCode(String),

    #[error("Identifier '{0}' cannot be safely quoted")]
    UnsafeIdentifier(String),

    #[error("Insert statement requires at least one column")]
    NoColumns,
}

/// Failure reported by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Row {row} has {actual} value(s) but the statement expects {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Represents all the ways an import can fail.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Sql(#[from] SqlError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}
