//! JDBC-style connection interface
//!
//! Statements and cursors are owned values. Dropping them releases the
//! underlying warehouse resources, so a `?` or an early return can never leak
//! an open statement.

use chrono::{DateTime, NaiveDateTime, Utc};
use metacat_core::ConnectorError;

/// A value bound to, or read from, a SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Short type label used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Text(_) => "TEXT",
            Self::Int(_) => "INT",
            Self::Timestamp(_) => "TIMESTAMP",
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

/// One result row; column lookup ignores ASCII case
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    pub fn with(mut self, column: impl Into<String>, value: SqlValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push((column.into(), value));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Raw value of a column
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    fn require(&self, column: &str) -> Result<&SqlValue, ConnectorError> {
        self.get(column)
            .ok_or_else(|| ConnectorError::InvalidData(format!("Missing column {} in result", column)))
    }

    /// Read a timestamp column; SQL NULL maps to `None`
    ///
    /// Text values are accepted in RFC 3339 form or as `YYYY-MM-DD HH:MM:SS[.f]`
    /// (taken as UTC).
    pub fn get_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, ConnectorError> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Timestamp(ts) => Ok(Some(*ts)),
            SqlValue::Text(text) => parse_timestamp(text).map(Some).ok_or_else(|| {
                ConnectorError::InvalidData(format!(
                    "Column {} value '{}' is not a timestamp",
                    column, text
                ))
            }),
            other => Err(ConnectorError::InvalidData(format!(
                "Column {} has type {}, expected TIMESTAMP",
                column,
                other.type_name()
            ))),
        }
    }

    /// Read a text column; SQL NULL maps to `None`
    pub fn get_string(&self, column: &str) -> Result<Option<String>, ConnectorError> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(text) => Ok(Some(text.clone())),
            other => Err(ConnectorError::InvalidData(format!(
                "Column {} has type {}, expected TEXT",
                column,
                other.type_name()
            ))),
        }
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Positional parameters of a prepared statement (1-based, like JDBC)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Vec<Option<SqlValue>>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parameter `index`; rebinding a slot replaces its value
    pub fn set(&mut self, index: usize, value: SqlValue) -> Result<(), ConnectorError> {
        if index == 0 {
            return Err(ConnectorError::Query("Parameter index starts at 1".to_string()));
        }
        if self.values.len() < index {
            self.values.resize(index, None);
        }
        self.values[index - 1] = Some(value);
        Ok(())
    }

    /// All values, checked against the number of placeholders in the statement
    pub fn resolve(&self, expected: usize) -> Result<Vec<SqlValue>, ConnectorError> {
        if self.values.len() > expected {
            return Err(ConnectorError::Query(format!(
                "Statement has {} parameters but {} were bound",
                expected,
                self.values.len()
            )));
        }
        (0..expected)
            .map(|i| {
                self.values
                    .get(i)
                    .cloned()
                    .flatten()
                    .ok_or_else(|| ConnectorError::Query(format!("Parameter {} is not bound", i + 1)))
            })
            .collect()
    }
}

/// Count `?` placeholders outside single-quoted literals
pub fn placeholder_count(sql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for ch in sql.chars() {
        match ch {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

/// Open connection to a warehouse
#[async_trait::async_trait]
pub trait Connection: Send + Sync {
    /// Prepare a statement with `?` placeholders
    async fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>, ConnectorError>;
}

/// Prepared statement; released when dropped
#[async_trait::async_trait]
pub trait Statement: Send {
    /// Bind parameter `index` (1-based)
    fn bind(&mut self, index: usize, value: SqlValue) -> Result<(), ConnectorError>;

    /// Bind a text parameter, `None` binding SQL NULL
    fn bind_string(&mut self, index: usize, value: Option<&str>) -> Result<(), ConnectorError> {
        self.bind(index, SqlValue::from(value))
    }

    /// Run the statement and open a cursor over its rows
    async fn execute_query(&mut self) -> Result<Box<dyn ResultSet>, ConnectorError>;
}

/// Forward-only cursor; released when dropped
#[async_trait::async_trait]
pub trait ResultSet: Send {
    /// Next row, or `None` when exhausted
    async fn next(&mut self) -> Result<Option<Row>, ConnectorError>;
}
