//! Storage collaborators that receive a prepared [`InsertBatch`].

use std::path::Path;

use log::debug;
use rusqlite::{
    Connection, OpenFlags, params_from_iter,
    types::{ToSql, ToSqlOutput, Value, ValueRef},
};

use crate::{error::StoreError, responses::CellValue, sql::InsertBatch};

/// Writes a whole batch atomically: either every row lands or none do.
pub trait ResponseStore {
    /// Returns the number of rows written.
    fn insert_batch(&mut self, batch: &InsertBatch) -> Result<usize, StoreError>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens an existing database; a missing file is an error rather than
    /// a fresh empty database.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

impl ResponseStore for SqliteStore {
    fn insert_batch(&mut self, batch: &InsertBatch) -> Result<usize, StoreError> {
        let expected = batch.statement.parameter_count();
        if let Some((idx, row)) = batch
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != expected)
        {
            return Err(StoreError::RowWidth {
                row: idx + 1,
                expected,
                actual: row.len(),
            });
        }

        let tx = self.conn.transaction()?;
        let mut written = 0usize;
        {
            let mut stmt = tx.prepare_cached(&batch.statement.sql)?;
            for row in &batch.rows {
                written += stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;
        debug!(
            "Committed {written} row(s) into {}",
            batch.statement.table
        );
        Ok(written)
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            CellValue::Null => ToSqlOutput::Owned(Value::Null),
            CellValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            CellValue::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            CellValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            CellValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            CellValue::DateTime(_) | CellValue::Duration(_) => {
                ToSqlOutput::Owned(Value::Text(self.to_string()))
            }
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::InsertStatement;

    fn store_with_table() -> SqliteStore {
        let store = SqliteStore::open_in_memory().expect("open");
        store
            .connection()
            .execute_batch("CREATE TABLE survey_1 (id INTEGER PRIMARY KEY, `1X1X1` TEXT);")
            .expect("create table");
        store
    }

    fn batch(rows: Vec<Vec<CellValue>>) -> InsertBatch {
        InsertBatch {
            statement: InsertStatement {
                table: "survey_1".into(),
                columns: vec!["id".into(), "1X1X1".into()],
                sql: "INSERT INTO `survey_1` (`id`,`1X1X1`) VALUES (?,?)".into(),
            },
            rows,
        }
    }

    fn count(store: &SqliteStore) -> i64 {
        store
            .connection()
            .query_row("SELECT COUNT(*) FROM survey_1", [], |row| row.get(0))
            .expect("count")
    }

    #[test]
    fn writes_every_row_in_one_transaction() {
        let mut store = store_with_table();
        let written = store
            .insert_batch(&batch(vec![
                vec![CellValue::Integer(1), CellValue::Text("a".into())],
                vec![CellValue::Integer(2), CellValue::Null],
            ]))
            .expect("insert");
        assert_eq!(written, 2);
        assert_eq!(count(&store), 2);
    }

    #[test]
    fn constraint_failure_rolls_back_the_batch() {
        let mut store = store_with_table();
        let err = store
            .insert_batch(&batch(vec![
                vec![CellValue::Integer(1), CellValue::Text("a".into())],
                vec![CellValue::Integer(1), CellValue::Text("b".into())],
            ]))
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert_eq!(count(&store), 0);
    }

    #[test]
    fn opening_a_missing_file_does_not_create_it() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing.db");
        let err = SqliteStore::open(&path).err().expect("open must fail");
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert!(!path.exists());
    }

    #[test]
    fn durations_are_stored_as_text() {
        let mut store = store_with_table();
        store
            .insert_batch(&batch(vec![vec![
                CellValue::Integer(1),
                CellValue::Duration(chrono::TimeDelta::try_minutes(90).expect("90m")),
            ]]))
            .expect("insert");
        let stored: String = store
            .connection()
            .query_row("SELECT `1X1X1` FROM survey_1", [], |row| row.get(0))
            .expect("select");
        assert_eq!(stored, "1:30:00");
    }

    #[test]
    fn rows_with_wrong_width_are_rejected_before_writing() {
        let mut store = store_with_table();
        let err = store
            .insert_batch(&batch(vec![vec![CellValue::Integer(1)]]))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::RowWidth {
                row: 1,
                expected: 2,
                actual: 1
            }
        ));
        assert_eq!(count(&store), 0);
    }
}
