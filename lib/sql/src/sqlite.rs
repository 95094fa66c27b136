use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path)
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Self::configure(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Self::configure(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn configure(conn: &Connection) -> Result<(), SQLError> {
        // WAL for concurrent readers; a busy timeout so writers queue
        // instead of failing immediately.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;",
        )
        .map_err(|e| SQLError::Connection(e.to_string()))
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut columns = Vec::with_capacity(column_names.len());
                for (i, name) in column_names.iter().enumerate() {
                    let val = match row.get_ref(i)? {
                        ValueRef::Null => Value::Null,
                        ValueRef::Integer(i) => Value::Integer(i),
                        ValueRef::Real(f) => Value::Real(f),
                        ValueRef::Text(t) => {
                            Value::Text(String::from_utf8_lossy(t).into_owned())
                        }
                        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
                    };
                    columns.push((name.clone(), val));
                }
                Ok(Row { columns })
            })
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let affected = conn
            .execute(sql, param_refs.as_slice())
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        Ok(affected as u64)
    }

    fn exec_batch(&self, sql: &str) -> Result<(), SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        conn.execute_batch(sql)
            .map_err(|e| SQLError::Execution(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let db = SqliteStore::open_in_memory().unwrap();
        db.exec(
            "CREATE TABLE items (id TEXT PRIMARY KEY, status TEXT NOT NULL, n INTEGER)",
            &[],
        )
        .unwrap();
        db
    }

    #[test]
    fn exec_and_query_round_trip() {
        let db = store();
        let affected = db
            .exec(
                "INSERT INTO items (id, status, n) VALUES (?1, ?2, ?3)",
                &[
                    Value::Text("a".into()),
                    Value::Text("PENDING".into()),
                    Value::Integer(1),
                ],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let rows = db
            .query("SELECT id, status, n FROM items", &[])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("id"), Some("a"));
        assert_eq!(rows[0].get_str("status"), Some("PENDING"));
        assert_eq!(rows[0].get_i64("n"), Some(1));
    }

    #[test]
    fn null_binds_and_reads_back() {
        let db = store();
        db.exec(
            "INSERT INTO items (id, status, n) VALUES (?1, ?2, ?3)",
            &[
                Value::Text("a".into()),
                Value::Text("PENDING".into()),
                Value::opt_int(None),
            ],
        )
        .unwrap();
        let rows = db.query("SELECT n FROM items WHERE id = 'a'", &[]).unwrap();
        assert!(matches!(rows[0].get("n"), Some(Value::Null)));
        assert_eq!(rows[0].get_i64("n"), None);
    }

    #[test]
    fn guarded_update_reports_affected_rows() {
        let db = store();
        db.exec(
            "INSERT INTO items (id, status, n) VALUES ('a', 'PENDING', 0)",
            &[],
        )
        .unwrap();

        let won = db
            .exec(
                "UPDATE items SET status = 'WORKING' WHERE id = 'a' AND status = 'PENDING'",
                &[],
            )
            .unwrap();
        assert_eq!(won, 1);

        // Second attempt sees the changed status and touches nothing.
        let lost = db
            .exec(
                "UPDATE items SET status = 'WORKING' WHERE id = 'a' AND status = 'PENDING'",
                &[],
            )
            .unwrap();
        assert_eq!(lost, 0);
    }

    #[test]
    fn query_error_on_bad_sql() {
        let db = store();
        assert!(db.query("SELECT nope FROM missing", &[]).is_err());
    }

    #[test]
    fn exec_batch_runs_multiple_statements() {
        let db = SqliteStore::open_in_memory().unwrap();
        db.exec_batch(
            "CREATE TABLE a (id TEXT PRIMARY KEY);
             CREATE TABLE b (id TEXT PRIMARY KEY);
             CREATE INDEX idx_b_id ON b(id);",
        )
        .unwrap();
        db.exec("INSERT INTO a (id) VALUES ('1')", &[]).unwrap();
        db.exec("INSERT INTO b (id) VALUES ('2')", &[]).unwrap();
        assert_eq!(db.query("SELECT id FROM b", &[]).unwrap().len(), 1);
    }
}
