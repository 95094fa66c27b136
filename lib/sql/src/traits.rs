use crate::error::SQLError;

/// A dynamically-typed SQL parameter value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// `Some(s)` binds as TEXT, `None` binds as NULL.
    pub fn opt_text(s: Option<String>) -> Value {
        match s {
            Some(s) => Value::Text(s),
            None => Value::Null,
        }
    }

    /// `Some(i)` binds as INTEGER, `None` binds as NULL.
    pub fn opt_int(i: Option<i64>) -> Value {
        match i {
            Some(i) => Value::Integer(i),
            None => Value::Null,
        }
    }
}

/// A row returned from a SQL query — column name to value.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a text column value by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an integer column value by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get a real column value by name.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Real(f)) => Some(*f),
            _ => None,
        }
    }
}

/// SQLStore provides a SQL execution interface backed by an embedded database.
pub trait SQLStore: Send + Sync {
    /// Execute a query and return rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError>;

    /// Execute a statement (INSERT/UPDATE/DELETE) and return affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError>;

    /// Execute a batch of semicolon-separated statements without parameters.
    /// Used for schema initialisation; `exec` handles a single statement only.
    fn exec_batch(&self, sql: &str) -> Result<(), SQLError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opt_constructors() {
        assert!(matches!(Value::opt_text(Some("a".into())), Value::Text(_)));
        assert!(matches!(Value::opt_text(None), Value::Null));
        assert!(matches!(Value::opt_int(Some(7)), Value::Integer(7)));
        assert!(matches!(Value::opt_int(None), Value::Null));
    }

    #[test]
    fn row_getters() {
        let row = Row {
            columns: vec![
                ("id".to_string(), Value::Text("abc".to_string())),
                ("count".to_string(), Value::Integer(3)),
                ("ratio".to_string(), Value::Real(0.5)),
                ("gone".to_string(), Value::Null),
            ],
        };
        assert_eq!(row.get_str("id"), Some("abc"));
        assert_eq!(row.get_i64("count"), Some(3));
        assert_eq!(row.get_f64("ratio"), Some(0.5));
        assert_eq!(row.get_str("gone"), None);
        assert_eq!(row.get_str("missing"), None);
    }
}
