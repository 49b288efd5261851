//! Test fixtures for Snowflake connector integration tests
//!
//! Tables are stored the way Snowflake stores them: every identifier in
//! uppercase.

use chrono::{DateTime, TimeZone, Utc};
use metacat_connector::{MockConnection, MockTableService, MockTableServiceBuilder, Row, SqlValue};
use metacat_core::{FieldInfo, QualifiedName, TableInfo};
use metacat_snowflake::SnowflakeConnectorTableService;

pub const CATALOG: &str = "CAT";
pub const DATABASE: &str = "DB";

/// Table name in canonical case
pub fn table_name(table: &str) -> QualifiedName {
    QualifiedName::table(CATALOG, DATABASE, table)
}

/// Midnight UTC on the given date
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A row of `INFORMATION_SCHEMA.TABLES` as the audit query returns it
pub fn audit_row(created: DateTime<Utc>, last_altered: DateTime<Utc>) -> Row {
    Row::new()
        .with("CREATED", SqlValue::Timestamp(created))
        .with("LAST_ALTERED", SqlValue::Timestamp(last_altered))
}

/// Parameters the audit query binds for `table` in the fixture database
pub fn audit_parameters(table: &str) -> Vec<SqlValue> {
    vec![
        SqlValue::from(DATABASE),
        SqlValue::from(DATABASE),
        SqlValue::from(table),
    ]
}

/// Typical orders table
pub fn orders_table() -> TableInfo {
    TableInfo::new(table_name("T1")).with_fields(vec![
        FieldInfo::new("ID", "NUMBER(38,0)").with_nullable(false),
        FieldInfo::new("CUSTOMER_ID", "NUMBER(38,0)").with_nullable(false),
        FieldInfo::new("TOTAL", "NUMBER(10,2)"),
        FieldInfo::new("CREATED_AT", "TIMESTAMP_NTZ"),
    ])
}

/// Wrapped base service holding T1, T2 and T10 plus a table in another schema
pub fn snowflake_service(connection: MockConnection) -> SnowflakeConnectorTableService<MockTableService> {
    let base = MockTableServiceBuilder::new()
        .with_table(orders_table())
        .with_table(TableInfo::new(table_name("T2")))
        .with_table(TableInfo::new(table_name("T10")))
        .with_table(TableInfo::new(QualifiedName::table(CATALOG, "OTHER", "T1")))
        .with_connection(connection)
        .build();

    SnowflakeConnectorTableService::new(base)
}
