//! Snowflake table service

use crate::audit::AuditEnricher;
use crate::normalizer::normalize;
use metacat_connector::{BaseCatalogTableService, Connection, ConnectorTableService, TableInfoDetails};
use metacat_core::{
    ConnectorError, ConnectorRequestContext, Pageable, QualifiedName, Sort, TableInfo,
};
use std::fmt;

/// Table service for Snowflake
///
/// Wraps a generic table service. Every name argument is uppercased before it
/// reaches the wrapped service, and every descriptor the wrapped service
/// builds gets its audit info filled in. Errors from the wrapped service are
/// returned unchanged; list prefixes, sorting and paging pass straight through.
pub struct SnowflakeConnectorTableService<S> {
    inner: S,
    audit: AuditEnricher,
}

impl<S: BaseCatalogTableService> SnowflakeConnectorTableService<S> {
    /// Wrap `inner`
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            audit: AuditEnricher::new(),
        }
    }

    /// The wrapped service
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap into the wrapped service
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> fmt::Debug for SnowflakeConnectorTableService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeConnectorTableService")
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<S: BaseCatalogTableService> TableInfoDetails for SnowflakeConnectorTableService<S> {
    async fn set_table_info_details(&self, connection: &dyn Connection, table: &mut TableInfo) {
        self.audit.enrich(connection, table).await;
    }
}

#[async_trait::async_trait]
impl<S: BaseCatalogTableService> ConnectorTableService for SnowflakeConnectorTableService<S> {
    async fn get(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<TableInfo, ConnectorError> {
        let name = normalize(name);
        tracing::debug!(table = %name, "get");
        self.inner.get(context, &name, self).await
    }

    async fn list(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        prefix: Option<&QualifiedName>,
        sort: Option<&Sort>,
        pageable: Option<&Pageable>,
    ) -> Result<Vec<TableInfo>, ConnectorError> {
        let name = normalize(name);
        tracing::debug!(database = %name, "list");
        self.inner.list(context, &name, prefix, sort, pageable, self).await
    }

    async fn list_names(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        prefix: Option<&QualifiedName>,
        sort: Option<&Sort>,
        pageable: Option<&Pageable>,
    ) -> Result<Vec<QualifiedName>, ConnectorError> {
        let name = normalize(name);
        tracing::debug!(database = %name, "list_names");
        self.inner.list_names(context, &name, prefix, sort, pageable).await
    }

    async fn exists(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<bool, ConnectorError> {
        let name = normalize(name);
        tracing::debug!(table = %name, "exists");
        self.inner.exists(context, &name).await
    }

    async fn rename(
        &self,
        context: &ConnectorRequestContext,
        old_name: &QualifiedName,
        new_name: &QualifiedName,
    ) -> Result<(), ConnectorError> {
        let old_name = normalize(old_name);
        let new_name = normalize(new_name);
        tracing::debug!(from = %old_name, to = %new_name, "rename");
        self.inner.rename(context, &old_name, &new_name).await
    }

    async fn delete(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<(), ConnectorError> {
        let name = normalize(name);
        tracing::debug!(table = %name, "delete");
        self.inner.delete(context, &name).await
    }
}
