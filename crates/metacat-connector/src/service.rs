//! Table service traits

use crate::connection::Connection;
use metacat_core::{
    ConnectorError, ConnectorRequestContext, Pageable, QualifiedName, Sort, TableInfo,
};

/// Hook a base table service calls after building each table descriptor
///
/// Connectors implement this to attach warehouse-specific details that the
/// generic introspection path cannot see. Implementations must not fail the
/// fetch; whatever they cannot fill in stays absent.
#[async_trait::async_trait]
pub trait TableInfoDetails: Send + Sync {
    /// Populate extra details on `table` using the service's open connection
    async fn set_table_info_details(&self, connection: &dyn Connection, table: &mut TableInfo);
}

/// Hook that adds nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDetails;

#[async_trait::async_trait]
impl TableInfoDetails for NoDetails {
    async fn set_table_info_details(&self, _connection: &dyn Connection, _table: &mut TableInfo) {}
}

/// Generic catalog table service that warehouse connectors wrap
///
/// Owns connection management, SQL generation for introspection, type
/// conversion and error translation. `get` and `list` invoke `details` once
/// per descriptor they build, before returning it.
#[async_trait::async_trait]
pub trait BaseCatalogTableService: Send + Sync {
    /// Fetch one table
    async fn get(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        details: &dyn TableInfoDetails,
    ) -> Result<TableInfo, ConnectorError>;

    /// List tables under the database `name`
    async fn list(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        prefix: Option<&QualifiedName>,
        sort: Option<&Sort>,
        pageable: Option<&Pageable>,
        details: &dyn TableInfoDetails,
    ) -> Result<Vec<TableInfo>, ConnectorError>;

    /// List table names under the database `name`
    async fn list_names(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        prefix: Option<&QualifiedName>,
        sort: Option<&Sort>,
        pageable: Option<&Pageable>,
    ) -> Result<Vec<QualifiedName>, ConnectorError>;

    /// Check whether a table exists
    async fn exists(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<bool, ConnectorError>;

    /// Rename a table
    async fn rename(
        &self,
        context: &ConnectorRequestContext,
        old_name: &QualifiedName,
        new_name: &QualifiedName,
    ) -> Result<(), ConnectorError>;

    /// Drop a table
    async fn delete(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<(), ConnectorError>;
}

/// Table operations a connector exposes to the catalog
#[async_trait::async_trait]
pub trait ConnectorTableService: Send + Sync {
    /// Fetch one table
    async fn get(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<TableInfo, ConnectorError>;

    /// List tables under the database `name`
    async fn list(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        prefix: Option<&QualifiedName>,
        sort: Option<&Sort>,
        pageable: Option<&Pageable>,
    ) -> Result<Vec<TableInfo>, ConnectorError>;

    /// List table names under the database `name`
    async fn list_names(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        prefix: Option<&QualifiedName>,
        sort: Option<&Sort>,
        pageable: Option<&Pageable>,
    ) -> Result<Vec<QualifiedName>, ConnectorError>;

    /// Check whether a table exists
    async fn exists(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<bool, ConnectorError>;

    /// Rename a table
    async fn rename(
        &self,
        context: &ConnectorRequestContext,
        old_name: &QualifiedName,
        new_name: &QualifiedName,
    ) -> Result<(), ConnectorError>;

    /// Drop a table
    async fn delete(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<(), ConnectorError>;
}
