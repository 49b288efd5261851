//! Snowflake connection over the REST API
//!
//! Implements [`Connection`] on top of `snowflake-api`, so the audit lookup
//! (or any other statement) can run against a live account. The REST API has
//! no server-side parameter binding: bound values are rendered into the
//! statement text as escaped literals just before execution. Results are
//! fetched eagerly, so statements and cursors hold no server resources.
//!
//! Requires the `snowflake` feature and these privileges:
//! - USAGE on the database and schema
//! - SELECT on INFORMATION_SCHEMA views
//!
//! ## Usage
//!
//! ```rust,ignore
//! let connection = SnowflakeConnection::with_password(
//!     "xy12345.us-east-1",
//!     "username",
//!     "password"
//! )
//! .with_warehouse("COMPUTE_WH")
//! .with_role("ANALYST")
//! .build()?;
//! ```
//!
//! Reference: https://docs.snowflake.com/en/sql-reference/info-schema

use chrono::{DateTime, SecondsFormat, Utc};
use metacat_connector::{Connection, SqlValue, Statement};
use metacat_core::{ConnectorError, SnowflakeConfig};
use std::fmt;

#[cfg(feature = "snowflake")]
use metacat_connector::{placeholder_count, Parameters, ResultSet, Row};

#[cfg(feature = "snowflake")]
use snowflake_api::SnowflakeApi;

#[cfg(feature = "snowflake")]
use std::sync::Arc;

/// Snowflake authentication credentials
#[derive(Clone)]
pub enum SnowflakeCredentials {
    /// Password-based authentication
    Password(String),
    /// Key-pair authentication (PEM format private key)
    PrivateKey(String),
}

impl fmt::Debug for SnowflakeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(***)"),
            Self::PrivateKey(_) => f.write_str("PrivateKey(***)"),
        }
    }
}

/// Builder for SnowflakeConnection
#[derive(Debug, Clone)]
pub struct SnowflakeConnectionBuilder {
    account: String,
    username: String,
    credentials: SnowflakeCredentials,
    warehouse: Option<String>,
    role: Option<String>,
    database: Option<String>,
    schema: Option<String>,
}

impl SnowflakeConnectionBuilder {
    fn new(account: String, username: String, credentials: SnowflakeCredentials) -> Self {
        Self {
            account,
            username,
            credentials,
            warehouse: None,
            role: None,
            database: None,
            schema: None,
        }
    }

    /// Create new builder with password authentication
    pub fn with_password(
        account: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(
            account.into(),
            username.into(),
            SnowflakeCredentials::Password(password.into()),
        )
    }

    /// Create new builder with key-pair authentication
    pub fn with_key_pair(
        account: impl Into<String>,
        username: impl Into<String>,
        private_key_pem: impl Into<String>,
    ) -> Self {
        Self::new(
            account.into(),
            username.into(),
            SnowflakeCredentials::PrivateKey(private_key_pem.into()),
        )
    }

    /// Create a builder from the `[snowflake]` config section
    ///
    /// Reads the private key file when key-pair authentication is configured.
    pub fn from_config(config: &SnowflakeConfig) -> Result<Self, ConnectorError> {
        config
            .validate()
            .map_err(|e| ConnectorError::Config(e.to_string()))?;

        let builder = match (&config.password, &config.private_key_path) {
            (Some(password), _) => Self::with_password(&config.account, &config.user, password),
            (None, Some(path)) => {
                let pem = std::fs::read_to_string(path).map_err(|e| {
                    ConnectorError::Config(format!(
                        "Cannot read private key {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::with_key_pair(&config.account, &config.user, pem)
            }
            (None, None) => {
                return Err(ConnectorError::Config("No Snowflake credentials configured".to_string()))
            }
        };

        Ok(Self {
            warehouse: config.warehouse.clone(),
            role: config.role.clone(),
            database: config.database.clone(),
            schema: config.schema.clone(),
            ..builder
        })
    }

    /// Set the warehouse to use
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    /// Set the role to use
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the default database
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the default schema
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Build the connection
    #[cfg(feature = "snowflake")]
    pub fn build(self) -> Result<SnowflakeConnection, ConnectorError> {
        let api = match &self.credentials {
            SnowflakeCredentials::Password(password) => {
                SnowflakeApi::with_password_auth(
                    &self.account,
                    self.warehouse.as_deref(),
                    self.database.as_deref(),
                    self.schema.as_deref(),
                    &self.username,
                    self.role.as_deref(),
                    password,
                )
                .map_err(|e| ConnectorError::Connection(format!(
                    "Failed to authenticate with Snowflake: {}",
                    e
                )))?
            }
            SnowflakeCredentials::PrivateKey(private_key_pem) => {
                SnowflakeApi::with_certificate_auth(
                    &self.account,
                    self.warehouse.as_deref(),
                    self.database.as_deref(),
                    self.schema.as_deref(),
                    &self.username,
                    self.role.as_deref(),
                    private_key_pem,
                )
                .map_err(|e| ConnectorError::Connection(format!(
                    "Failed to authenticate with key-pair: {}",
                    e
                )))?
            }
        };

        tracing::debug!(account = %self.account, "Snowflake connection configured");

        Ok(SnowflakeConnection {
            api: Arc::new(api),
            account: self.account,
        })
    }

    /// Build without snowflake feature
    #[cfg(not(feature = "snowflake"))]
    pub fn build(self) -> Result<SnowflakeConnection, ConnectorError> {
        Err(ConnectorError::Config(
            "Snowflake support not compiled. Rebuild with: cargo build --features snowflake".to_string()
        ))
    }
}

/// Connection to a Snowflake account
pub struct SnowflakeConnection {
    #[cfg(feature = "snowflake")]
    api: Arc<SnowflakeApi>,

    account: String,
}

impl SnowflakeConnection {
    /// Create a builder with password authentication
    pub fn with_password(
        account: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> SnowflakeConnectionBuilder {
        SnowflakeConnectionBuilder::with_password(account, username, password)
    }

    /// Create a builder with key-pair authentication
    pub fn with_key_pair(
        account: impl Into<String>,
        username: impl Into<String>,
        private_key_pem: impl Into<String>,
    ) -> SnowflakeConnectionBuilder {
        SnowflakeConnectionBuilder::with_key_pair(account, username, private_key_pem)
    }

    /// Account locator this connection talks to
    pub fn account(&self) -> &str {
        &self.account
    }
}

impl fmt::Debug for SnowflakeConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeConnection")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Connection for SnowflakeConnection {
    #[cfg(feature = "snowflake")]
    async fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>, ConnectorError> {
        Ok(Box::new(SnowflakeStatement {
            api: Arc::clone(&self.api),
            sql: sql.to_string(),
            parameters: Parameters::new(),
        }))
    }

    #[cfg(not(feature = "snowflake"))]
    async fn prepare(&self, _sql: &str) -> Result<Box<dyn Statement>, ConnectorError> {
        Err(ConnectorError::Config(
            "Snowflake support not compiled. Rebuild with: cargo build --features snowflake".to_string()
        ))
    }
}

#[cfg(feature = "snowflake")]
struct SnowflakeStatement {
    api: Arc<SnowflakeApi>,
    sql: String,
    parameters: Parameters,
}

#[cfg(feature = "snowflake")]
#[async_trait::async_trait]
impl Statement for SnowflakeStatement {
    fn bind(&mut self, index: usize, value: SqlValue) -> Result<(), ConnectorError> {
        self.parameters.set(index, value)
    }

    async fn execute_query(&mut self) -> Result<Box<dyn ResultSet>, ConnectorError> {
        use snowflake_api::QueryResult;

        let values = self.parameters.resolve(placeholder_count(&self.sql))?;
        let query = render_sql(&self.sql, &values);
        tracing::debug!(query = %query, "Executing Snowflake statement");

        let result = self.api.exec(&query).await.map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("Insufficient privileges") || err_str.contains("Permission") {
                ConnectorError::PermissionDenied(err_str)
            } else {
                ConnectorError::Query(err_str)
            }
        })?;

        let rows = match result {
            QueryResult::Arrow(batches) => {
                let mut rows = Vec::new();
                for batch in &batches {
                    rows.extend(arrow::batch_rows(batch)?);
                }
                rows
            }
            QueryResult::Json(_) => {
                return Err(ConnectorError::InvalidData(
                    "Unexpected JSON result format".to_string()
                ));
            }
            QueryResult::Empty => Vec::new(),
        };

        Ok(Box::new(SnowflakeResultSet { rows: rows.into() }))
    }
}

#[cfg(feature = "snowflake")]
struct SnowflakeResultSet {
    rows: std::collections::VecDeque<Row>,
}

#[cfg(feature = "snowflake")]
#[async_trait::async_trait]
impl ResultSet for SnowflakeResultSet {
    async fn next(&mut self) -> Result<Option<Row>, ConnectorError> {
        Ok(self.rows.pop_front())
    }
}

/// Replace each `?` outside string literals with the matching value as a
/// Snowflake literal
pub fn render_sql(sql: &str, values: &[SqlValue]) -> String {
    let mut rendered = String::with_capacity(sql.len() + values.len() * 16);
    let mut values = values.iter();
    let mut in_literal = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                rendered.push(ch);
            }
            '?' if !in_literal => match values.next() {
                Some(value) => rendered.push_str(&sql_literal(value)),
                None => rendered.push(ch),
            },
            _ => rendered.push(ch),
        }
    }
    rendered
}

fn sql_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::Text(text) => quote(text),
        SqlValue::Timestamp(ts) => format!(
            "{}::timestamp_tz",
            quote(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        ),
    }
}

/// Single-quote `text`; Snowflake treats backslash as an escape in literals
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "''"))
}

/// Decode Snowflake's scaled-integer timestamp: `raw` counts units of
/// 10^-scale seconds since the epoch
#[cfg_attr(not(feature = "snowflake"), allow(dead_code))]
fn scaled_timestamp(raw: i64, scale: u32) -> Option<DateTime<Utc>> {
    let scale = scale.min(9);
    let unit = 10_i64.pow(scale);
    let secs = raw.div_euclid(unit);
    let nanos = raw.rem_euclid(unit) * 10_i64.pow(9 - scale);
    DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
}

#[cfg(feature = "snowflake")]
mod arrow {
    //! Arrow result batches to rows

    use super::scaled_timestamp;
    use arrow_array::cast::AsArray;
    use arrow_array::types::{Int32Type, Int64Type};
    use arrow_array::{Array, RecordBatch};
    use arrow_schema::{DataType, Field};
    use chrono::DateTime;
    use metacat_connector::{Row, SqlValue};
    use metacat_core::ConnectorError;

    pub(super) fn batch_rows(batch: &RecordBatch) -> Result<Vec<Row>, ConnectorError> {
        let schema = batch.schema();
        let mut rows = vec![Row::new(); batch.num_rows()];

        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            for (row_idx, row) in rows.iter_mut().enumerate() {
                row.push(field.name().clone(), cell_value(field, column.as_ref(), row_idx)?);
            }
        }

        Ok(rows)
    }

    fn cell_value(field: &Field, column: &dyn Array, row: usize) -> Result<SqlValue, ConnectorError> {
        if column.is_null(row) {
            return Ok(SqlValue::Null);
        }

        let metadata = field.metadata();
        let is_timestamp = metadata
            .get("logicalType")
            .is_some_and(|t| t.starts_with("TIMESTAMP"));
        let scale: u32 = metadata
            .get("scale")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let invalid = || {
            ConnectorError::InvalidData(format!(
                "Cannot decode column {} of type {}",
                field.name(),
                column.data_type()
            ))
        };

        match column.data_type() {
            DataType::Utf8 => Ok(SqlValue::Text(column.as_string::<i32>().value(row).to_string())),
            DataType::Int64 if is_timestamp => {
                let raw = column.as_primitive::<Int64Type>().value(row);
                scaled_timestamp(raw, scale).map(SqlValue::Timestamp).ok_or_else(invalid)
            }
            DataType::Int64 => Ok(SqlValue::Int(column.as_primitive::<Int64Type>().value(row))),
            DataType::Int32 => Ok(SqlValue::Int(i64::from(column.as_primitive::<Int32Type>().value(row)))),
            DataType::Struct(_) if is_timestamp => {
                // epoch + fraction for high-precision timestamps; otherwise a
                // scaled epoch next to a timezone offset
                let parts = column.as_struct();
                let epoch = parts
                    .column_by_name("epoch")
                    .and_then(|c| c.as_primitive_opt::<Int64Type>())
                    .map(|a| a.value(row))
                    .ok_or_else(invalid)?;
                let fraction = parts
                    .column_by_name("fraction")
                    .and_then(|c| c.as_primitive_opt::<Int32Type>())
                    .map(|a| a.value(row));

                let ts = match fraction {
                    Some(nanos) => DateTime::from_timestamp(epoch, u32::try_from(nanos).map_err(|_| invalid())?),
                    None => scaled_timestamp(epoch, scale),
                };
                ts.map(SqlValue::Timestamp).ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_audit_query() {
        let sql = "select created from information_schema.tables where table_catalog=? and table_schema=? and table_name=?";
        let rendered = render_sql(
            sql,
            &[SqlValue::from("DB"), SqlValue::from("DB"), SqlValue::from("T1")],
        );
        assert_eq!(
            rendered,
            "select created from information_schema.tables where table_catalog='DB' and table_schema='DB' and table_name='T1'"
        );
    }

    #[test]
    fn test_render_escapes_literals() {
        let rendered = render_sql(
            "select ? , '?', ?, ?",
            &[SqlValue::from("O'Brien\\x"), SqlValue::Null, SqlValue::Int(-3)],
        );
        assert_eq!(rendered, r"select 'O''Brien\\x' , '?', NULL, -3");
    }

    #[test]
    fn test_render_timestamp() {
        let ts = Utc.with_ymd_and_hms(2021, 6, 15, 8, 30, 0).unwrap();
        assert_eq!(
            render_sql("?", &[SqlValue::Timestamp(ts)]),
            "'2021-06-15T08:30:00Z'::timestamp_tz"
        );
    }

    #[test]
    fn test_scaled_timestamp() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let secs = expected.timestamp();

        assert_eq!(scaled_timestamp(secs, 0), Some(expected));
        assert_eq!(scaled_timestamp(secs * 1000 + 250, 3), Some(expected + chrono::Duration::milliseconds(250)));
        assert_eq!(scaled_timestamp(-1, 3), Utc.timestamp_opt(-1, 999_000_000).single());
    }

    #[test]
    fn test_from_config_password() {
        let config = SnowflakeConfig {
            account: "xy12345".to_string(),
            user: "METACAT".to_string(),
            password: Some("pass".to_string()),
            private_key_path: None,
            warehouse: Some("COMPUTE_WH".to_string()),
            role: None,
            database: Some("ANALYTICS".to_string()),
            schema: None,
        };

        let builder = SnowflakeConnectionBuilder::from_config(&config).unwrap();
        assert_eq!(builder.warehouse.as_deref(), Some("COMPUTE_WH"));
        assert_eq!(builder.database.as_deref(), Some("ANALYTICS"));
        assert!(matches!(builder.credentials, SnowflakeCredentials::Password(_)));
        assert!(!format!("{:?}", builder).contains("pass\""));
    }

    #[test]
    fn test_from_config_missing_key_file() {
        let config = SnowflakeConfig {
            account: "xy12345".to_string(),
            user: "METACAT".to_string(),
            password: None,
            private_key_path: Some("/nonexistent/metacat/rsa_key.p8".into()),
            warehouse: None,
            role: None,
            database: None,
            schema: None,
        };

        let result = SnowflakeConnectionBuilder::from_config(&config);
        assert!(matches!(result, Err(ConnectorError::Config(_))));
    }

    #[cfg(not(feature = "snowflake"))]
    #[test]
    fn test_build_without_feature() {
        let result = SnowflakeConnection::with_password("account", "user", "pass").build();
        assert!(matches!(result, Err(ConnectorError::Config(_))));
    }
}
