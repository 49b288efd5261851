//! Table audit info from Snowflake's INFORMATION_SCHEMA
//!
//! Creation and last-altered times are not part of the column introspection,
//! so they are read with one extra query per table:
//!
//! ```sql
//! select created, last_altered from information_schema.tables
//!  where table_catalog=? and table_schema=? and table_name=?
//! ```
//!
//! The database segment is bound to both `table_catalog` and `table_schema`.
//! Audit info is optional: when the query finds nothing or fails, the
//! descriptor is left as it was and the reason is logged at info level.

use crate::normalizer::normalize;
use metacat_connector::Connection;
use metacat_core::{AuditInfo, ConnectorError, QualifiedName, TableInfo};

/// Audit query, bound as (database, database, table)
pub const SQL_GET_AUDIT_INFO: &str = "select created, last_altered from information_schema.tables \
     where table_catalog=? and table_schema=? and table_name=?";

const COL_CREATED: &str = "CREATED";
const COL_LAST_ALTERED: &str = "LAST_ALTERED";

/// Outcome of one audit lookup
#[derive(Debug, Clone, PartialEq)]
pub enum AuditLookup {
    /// The table has a row in `INFORMATION_SCHEMA.TABLES`
    Found(AuditInfo),

    /// The query ran but returned no row
    NotFound,

    /// Anything else went wrong
    Failed(ConnectorError),
}

/// Fills in `TableInfo::audit` from the warehouse
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditEnricher;

impl AuditEnricher {
    pub fn new() -> Self {
        Self
    }

    /// Look up the audit info of table `name` (normalized first)
    pub async fn lookup(&self, connection: &dyn Connection, name: &QualifiedName) -> AuditLookup {
        match query_audit_info(connection, &normalize(name)).await {
            Ok(Some(audit)) => AuditLookup::Found(audit),
            Ok(None) => AuditLookup::NotFound,
            Err(error) => AuditLookup::Failed(error),
        }
    }

    /// Attach audit info to `table`; never fails
    ///
    /// Returns the lookup outcome so callers can tell what happened; the
    /// descriptor is only modified on [`AuditLookup::Found`].
    pub async fn enrich(&self, connection: &dyn Connection, table: &mut TableInfo) -> AuditLookup {
        let name = normalize(&table.name);
        let outcome = self.lookup(connection, &name).await;

        match &outcome {
            AuditLookup::Found(audit) => table.set_audit(*audit),
            AuditLookup::NotFound => {
                tracing::info!(table = %name, "No audit info found for table");
            }
            AuditLookup::Failed(error) => {
                tracing::info!(table = %name, error = %error, "Ignoring. Error getting the audit info for table");
            }
        }

        outcome
    }
}

/// Run the audit query for an already normalized table name
///
/// Statement and cursor are dropped, and so released, on every return path.
async fn query_audit_info(
    connection: &dyn Connection,
    name: &QualifiedName,
) -> Result<Option<AuditInfo>, ConnectorError> {
    let (database, table) = match (name.database_name(), name.table_name()) {
        (Some(database), Some(table)) => (database, table),
        _ => {
            return Err(ConnectorError::InvalidName(
                name.clone(),
                "audit lookup needs a database and a table".to_string(),
            ))
        }
    };

    tracing::debug!(table = %name, "Querying audit info");

    let mut statement = connection.prepare(SQL_GET_AUDIT_INFO).await?;
    statement.bind_string(1, Some(database))?;
    statement.bind_string(2, Some(database))?;
    statement.bind_string(3, Some(table))?;

    let mut rows = statement.execute_query().await?;
    let row = match rows.next().await? {
        Some(row) => row,
        None => return Ok(None),
    };

    Ok(Some(AuditInfo::new(
        row.get_timestamp(COL_CREATED)?,
        row.get_timestamp(COL_LAST_ALTERED)?,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use metacat_connector::{MockConnection, Row, SqlValue};
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn audit_row(created: (i32, u32, u32), altered: (i32, u32, u32)) -> Row {
        Row::new()
            .with("CREATED", SqlValue::Timestamp(Utc.with_ymd_and_hms(created.0, created.1, created.2, 0, 0, 0).unwrap()))
            .with("LAST_ALTERED", SqlValue::Timestamp(Utc.with_ymd_and_hms(altered.0, altered.1, altered.2, 0, 0, 0).unwrap()))
    }

    fn info_lines(lines: &[&str]) -> usize {
        lines.iter().filter(|line| line.contains("INFO")).count()
    }

    #[tokio::test]
    async fn test_found_row_sets_both_dates() {
        let connection = MockConnection::new().with_rows(vec![audit_row((2020, 1, 1), (2021, 6, 15))]);
        let mut table = TableInfo::new(QualifiedName::table("cat", "db", "t1"));

        let outcome = AuditEnricher::new().enrich(&connection, &mut table).await;

        let expected = AuditInfo::new(
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2021, 6, 15, 0, 0, 0).unwrap()),
        );
        assert_eq!(outcome, AuditLookup::Found(expected));
        assert_eq!(table.audit, Some(expected));
    }

    #[tokio::test]
    async fn test_binds_database_twice_then_table() {
        let connection = MockConnection::new();
        let mut table = TableInfo::new(QualifiedName::table("cat", "db", "t1"));

        AuditEnricher::new().enrich(&connection, &mut table).await;

        let executed = connection.executed_statements();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].sql, SQL_GET_AUDIT_INFO);
        assert_eq!(
            executed[0].parameters,
            vec![SqlValue::from("DB"), SqlValue::from("DB"), SqlValue::from("T1")]
        );
        // The descriptor's own identity is left as supplied
        assert_eq!(table.name, QualifiedName::table("cat", "db", "t1"));
    }

    #[tokio::test]
    async fn test_null_columns_give_empty_dates() {
        let connection = MockConnection::new().with_rows(vec![Row::new()
            .with("created", SqlValue::Null)
            .with("last_altered", SqlValue::Null)]);
        let mut table = TableInfo::new(QualifiedName::table("CAT", "DB", "T1"));

        AuditEnricher::new().enrich(&connection, &mut table).await;
        assert_eq!(table.audit, Some(AuditInfo::default()));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_no_row_leaves_audit_absent() {
        let connection = MockConnection::new();
        let mut table = TableInfo::new(QualifiedName::table("CAT", "DB", "T1"));

        let outcome = AuditEnricher::new().enrich(&connection, &mut table).await;

        assert_eq!(outcome, AuditLookup::NotFound);
        assert!(table.audit.is_none());
        assert_eq!(connection.open_resources(), 0);
        assert!(logs_contain("No audit info found for table"));
        logs_assert(|lines: &[&str]| match info_lines(lines) {
            1 => Ok(()),
            n => Err(format!("expected one info line, got {}", n)),
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_query_error_is_swallowed_and_logged_once() {
        let connection = MockConnection::new()
            .with_query_error(ConnectorError::Connection("connection reset".to_string()));
        let mut table = TableInfo::new(QualifiedName::table("CAT", "DB", "T1"));

        let outcome = AuditEnricher::new().enrich(&connection, &mut table).await;

        assert!(matches!(outcome, AuditLookup::Failed(ConnectorError::Connection(_))));
        assert!(table.audit.is_none());
        assert_eq!(connection.statements_opened(), 1);
        assert_eq!(connection.open_resources(), 0);
        assert!(logs_contain("Ignoring. Error getting the audit info for table"));
        assert!(logs_contain("CAT/DB/T1"));
        logs_assert(|lines: &[&str]| match info_lines(lines) {
            1 => Ok(()),
            n => Err(format!("expected one info line, got {}", n)),
        });
    }

    #[tokio::test]
    async fn test_prepare_error_opens_nothing() {
        let connection = MockConnection::new()
            .with_prepare_error(ConnectorError::PermissionDenied("no usage on database".to_string()));
        let mut table = TableInfo::new(QualifiedName::table("CAT", "DB", "T1"));

        let outcome = AuditEnricher::new().enrich(&connection, &mut table).await;

        assert!(matches!(outcome, AuditLookup::Failed(ConnectorError::PermissionDenied(_))));
        assert_eq!(connection.statements_opened(), 0);
        assert!(table.audit.is_none());
    }

    #[tokio::test]
    async fn test_fetch_error_releases_cursor() {
        let connection = MockConnection::new()
            .with_rows(vec![audit_row((2020, 1, 1), (2021, 6, 15))])
            .with_fetch_error(ConnectorError::Query("result chunk expired".to_string()));
        let mut table = TableInfo::new(QualifiedName::table("CAT", "DB", "T1"));

        let outcome = AuditEnricher::new().enrich(&connection, &mut table).await;

        assert!(matches!(outcome, AuditLookup::Failed(ConnectorError::Query(_))));
        assert_eq!(connection.cursors_opened(), 1);
        assert_eq!(connection.open_resources(), 0);
        assert!(table.audit.is_none());
    }

    #[tokio::test]
    async fn test_malformed_timestamp_fails() {
        let connection = MockConnection::new().with_rows(vec![Row::new()
            .with("CREATED", SqlValue::Int(42))
            .with("LAST_ALTERED", SqlValue::Null)]);
        let mut table = TableInfo::new(QualifiedName::table("CAT", "DB", "T1"));

        let outcome = AuditEnricher::new().enrich(&connection, &mut table).await;

        assert!(matches!(outcome, AuditLookup::Failed(ConnectorError::InvalidData(_))));
        assert!(table.audit.is_none());
        assert_eq!(connection.open_resources(), 0);
    }

    #[tokio::test]
    async fn test_name_without_table_skips_query() {
        let connection = MockConnection::new();
        let name = QualifiedName::database("CAT", "DB");

        let outcome = AuditEnricher::new().lookup(&connection, &name).await;

        assert!(matches!(outcome, AuditLookup::Failed(ConnectorError::InvalidName(_, _))));
        assert!(connection.executed_statements().is_empty());
    }
}
