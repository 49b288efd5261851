//! In-memory table service and connection for testing
//!
//! Neither type talks to a warehouse. They are useful for:
//! - Unit testing connectors that wrap a [`BaseCatalogTableService`]
//! - Checking which names and options actually reach the base service
//! - Checking that statements and cursors are released
//! - Simulating warehouse failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use metacat_connector::{MockConnection, MockTableServiceBuilder, SqlValue, Row};
//!
//! let connection = MockConnection::new()
//!     .with_rows(vec![Row::new().with("CREATED", SqlValue::Null)]);
//!
//! let service = MockTableServiceBuilder::new()
//!     .with_table(TableInfo::new(QualifiedName::table("sf", "PUBLIC", "ORDERS")))
//!     .with_connection(connection.clone())
//!     .build();
//!
//! // ... exercise the connector, then:
//! assert_eq!(connection.open_resources(), 0);
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! // Every statement fails to execute
//! let connection = MockConnection::new()
//!     .with_query_error(ConnectorError::Connection("reset by peer".into()));
//!
//! // One table is unreadable
//! service.add_error_for_table(name, ConnectorError::PermissionDenied("no".into())).await;
//! ```

use crate::connection::{placeholder_count, Connection, Parameters, ResultSet, Row, SqlValue, Statement};
use crate::service::{BaseCatalogTableService, TableInfoDetails};
use metacat_core::{
    ConnectorError, ConnectorRequestContext, Pageable, QualifiedName, Sort, SortOrder, TableInfo,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// A statement executed against a [`MockConnection`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub parameters: Vec<SqlValue>,
}

/// Shared bookkeeping for a connection and everything opened from it
#[derive(Debug, Default)]
struct ResourceTracker {
    executed: Mutex<Vec<ExecutedStatement>>,
    statements_opened: AtomicUsize,
    statements_closed: AtomicUsize,
    cursors_opened: AtomicUsize,
    cursors_closed: AtomicUsize,
}

/// Mock warehouse connection
///
/// Answers every query with canned rows, selected by the bound parameters
/// when a matching response was registered. Clones share the same resource
/// counters, so a test can keep a clone and inspect it after handing the
/// connection to a service.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    responses: Vec<(Vec<SqlValue>, Vec<Row>)>,
    default_rows: Vec<Row>,
    prepare_error: Option<ConnectorError>,
    query_error: Option<ConnectorError>,
    fetch_error: Option<ConnectorError>,
    tracker: Arc<ResourceTracker>,
}

impl MockConnection {
    /// Create a connection whose queries return no rows
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned when no parameter-specific response matches
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.default_rows = rows;
        self
    }

    /// Rows returned when the bound parameters equal `parameters`
    pub fn with_response(mut self, parameters: Vec<SqlValue>, rows: Vec<Row>) -> Self {
        self.responses.push((parameters, rows));
        self
    }

    /// Fail every `prepare` call
    pub fn with_prepare_error(mut self, error: ConnectorError) -> Self {
        self.prepare_error = Some(error);
        self
    }

    /// Fail every `execute_query` call
    pub fn with_query_error(mut self, error: ConnectorError) -> Self {
        self.query_error = Some(error);
        self
    }

    /// Fail every row fetch
    pub fn with_fetch_error(mut self, error: ConnectorError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    /// Statements executed so far, in order
    pub fn executed_statements(&self) -> Vec<ExecutedStatement> {
        self.tracker
            .executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn statements_opened(&self) -> usize {
        self.tracker.statements_opened.load(Ordering::SeqCst)
    }

    pub fn statements_closed(&self) -> usize {
        self.tracker.statements_closed.load(Ordering::SeqCst)
    }

    pub fn cursors_opened(&self) -> usize {
        self.tracker.cursors_opened.load(Ordering::SeqCst)
    }

    pub fn cursors_closed(&self) -> usize {
        self.tracker.cursors_closed.load(Ordering::SeqCst)
    }

    /// Statements plus cursors opened but not yet released
    pub fn open_resources(&self) -> usize {
        (self.statements_opened() - self.statements_closed())
            + (self.cursors_opened() - self.cursors_closed())
    }

    fn rows_for(&self, parameters: &[SqlValue]) -> Vec<Row> {
        self.responses
            .iter()
            .find(|(bound, _)| bound.as_slice() == parameters)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_else(|| self.default_rows.clone())
    }
}

#[async_trait::async_trait]
impl Connection for MockConnection {
    async fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>, ConnectorError> {
        if let Some(error) = &self.prepare_error {
            return Err(error.clone());
        }

        self.tracker.statements_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStatement {
            connection: self.clone(),
            sql: sql.to_string(),
            parameters: Parameters::new(),
        }))
    }
}

struct MockStatement {
    connection: MockConnection,
    sql: String,
    parameters: Parameters,
}

#[async_trait::async_trait]
impl Statement for MockStatement {
    fn bind(&mut self, index: usize, value: SqlValue) -> Result<(), ConnectorError> {
        self.parameters.set(index, value)
    }

    async fn execute_query(&mut self) -> Result<Box<dyn ResultSet>, ConnectorError> {
        let parameters = self.parameters.resolve(placeholder_count(&self.sql))?;

        self.connection
            .tracker
            .executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ExecutedStatement {
                sql: self.sql.clone(),
                parameters: parameters.clone(),
            });

        if let Some(error) = &self.connection.query_error {
            return Err(error.clone());
        }

        self.connection.tracker.cursors_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockResultSet {
            rows: self.connection.rows_for(&parameters).into(),
            fetch_error: self.connection.fetch_error.clone(),
            tracker: Arc::clone(&self.connection.tracker),
        }))
    }
}

impl Drop for MockStatement {
    fn drop(&mut self) {
        self.connection.tracker.statements_closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockResultSet {
    rows: VecDeque<Row>,
    fetch_error: Option<ConnectorError>,
    tracker: Arc<ResourceTracker>,
}

#[async_trait::async_trait]
impl ResultSet for MockResultSet {
    async fn next(&mut self) -> Result<Option<Row>, ConnectorError> {
        if let Some(error) = &self.fetch_error {
            return Err(error.clone());
        }
        Ok(self.rows.pop_front())
    }
}

impl Drop for MockResultSet {
    fn drop(&mut self) {
        self.tracker.cursors_closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// A call received by [`MockTableService`]
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Get {
        name: QualifiedName,
    },
    List {
        name: QualifiedName,
        prefix: Option<QualifiedName>,
        sort: Option<Sort>,
        pageable: Option<Pageable>,
    },
    ListNames {
        name: QualifiedName,
        prefix: Option<QualifiedName>,
        sort: Option<Sort>,
        pageable: Option<Pageable>,
    },
    Exists {
        name: QualifiedName,
    },
    Rename {
        old_name: QualifiedName,
        new_name: QualifiedName,
    },
    Delete {
        name: QualifiedName,
    },
}

/// Mock base table service
///
/// Stores tables in memory keyed by their exact name, records every call it
/// receives, and runs the caller's detail hook against its [`MockConnection`]
/// for each descriptor it returns from `get` and `list`.
pub struct MockTableService {
    /// Tables by exact name
    tables: Arc<RwLock<BTreeMap<QualifiedName, TableInfo>>>,

    /// Errors to return for specific names
    errors: Arc<RwLock<HashMap<QualifiedName, ConnectorError>>>,

    /// Calls received, in order
    calls: Arc<RwLock<Vec<MockCall>>>,

    /// Request contexts received, in order
    contexts: Arc<RwLock<Vec<ConnectorRequestContext>>>,

    /// Connection handed to detail hooks
    connection: MockConnection,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,
}

impl MockTableService {
    /// Create an empty service using `connection` for detail hooks
    pub fn new(connection: MockConnection) -> Self {
        Self {
            tables: Arc::new(RwLock::new(BTreeMap::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            contexts: Arc::new(RwLock::new(Vec::new())),
            connection,
            latency_ms: 0,
        }
    }

    /// Configure simulated latency for all operations
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Store a table under its own name
    pub async fn add_table(&self, table: TableInfo) {
        self.tables.write().await.insert(table.name.clone(), table);
    }

    /// Configure an error to be returned for any call naming `name`
    pub async fn add_error_for_table(&self, name: QualifiedName, error: ConnectorError) {
        self.errors.write().await.insert(name, error);
    }

    /// Calls received so far
    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.read().await.clone()
    }

    /// Request contexts received so far
    pub async fn contexts(&self) -> Vec<ConnectorRequestContext> {
        self.contexts.read().await.clone()
    }

    /// Names of all stored tables
    pub async fn table_names(&self) -> Vec<QualifiedName> {
        self.tables.read().await.keys().cloned().collect()
    }

    pub fn connection(&self) -> &MockConnection {
        &self.connection
    }

    async fn record(&self, context: &ConnectorRequestContext, call: MockCall) {
        self.contexts.write().await.push(context.clone());
        self.calls.write().await.push(call);
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }

    async fn check_error(&self, name: &QualifiedName) -> Result<(), ConnectorError> {
        match self.errors.read().await.get(name) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Tables in the database `name`, filtered, sorted and paged
    async fn select(
        &self,
        name: &QualifiedName,
        prefix: Option<&QualifiedName>,
        sort: Option<&Sort>,
        pageable: Option<&Pageable>,
    ) -> Vec<TableInfo> {
        let prefix = prefix.and_then(|p| p.table_name());
        let tables = self.tables.read().await;
        let mut selected: Vec<TableInfo> = tables
            .values()
            .filter(|t| {
                t.name.catalog_name() == name.catalog_name()
                    && t.name.database_name() == name.database_name()
            })
            .filter(|t| match (prefix, t.name.table_name()) {
                (Some(prefix), Some(table)) => table.starts_with(prefix),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect();

        if let Some(sort) = sort {
            if sort.order == SortOrder::Desc {
                selected.reverse();
            }
        }

        match pageable {
            Some(pageable) => pageable.apply(selected),
            None => selected,
        }
    }
}

impl Clone for MockTableService {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            errors: Arc::clone(&self.errors),
            calls: Arc::clone(&self.calls),
            contexts: Arc::clone(&self.contexts),
            connection: self.connection.clone(),
            latency_ms: self.latency_ms,
        }
    }
}

#[async_trait::async_trait]
impl BaseCatalogTableService for MockTableService {
    async fn get(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        details: &dyn TableInfoDetails,
    ) -> Result<TableInfo, ConnectorError> {
        self.record(context, MockCall::Get { name: name.clone() }).await;
        self.simulate_latency().await;
        self.check_error(name).await?;

        let mut table = self
            .tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectorError::TableNotFound(name.clone()))?;

        details.set_table_info_details(&self.connection, &mut table).await;
        Ok(table)
    }

    async fn list(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        prefix: Option<&QualifiedName>,
        sort: Option<&Sort>,
        pageable: Option<&Pageable>,
        details: &dyn TableInfoDetails,
    ) -> Result<Vec<TableInfo>, ConnectorError> {
        self.record(
            context,
            MockCall::List {
                name: name.clone(),
                prefix: prefix.cloned(),
                sort: sort.cloned(),
                pageable: pageable.copied(),
            },
        )
        .await;
        self.simulate_latency().await;
        self.check_error(name).await?;

        let mut tables = self.select(name, prefix, sort, pageable).await;
        for table in tables.iter_mut() {
            details.set_table_info_details(&self.connection, table).await;
        }
        Ok(tables)
    }

    async fn list_names(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
        prefix: Option<&QualifiedName>,
        sort: Option<&Sort>,
        pageable: Option<&Pageable>,
    ) -> Result<Vec<QualifiedName>, ConnectorError> {
        self.record(
            context,
            MockCall::ListNames {
                name: name.clone(),
                prefix: prefix.cloned(),
                sort: sort.cloned(),
                pageable: pageable.copied(),
            },
        )
        .await;
        self.simulate_latency().await;
        self.check_error(name).await?;

        Ok(self
            .select(name, prefix, sort, pageable)
            .await
            .into_iter()
            .map(|t| t.name)
            .collect())
    }

    async fn exists(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<bool, ConnectorError> {
        self.record(context, MockCall::Exists { name: name.clone() }).await;
        self.simulate_latency().await;
        self.check_error(name).await?;

        Ok(self.tables.read().await.contains_key(name))
    }

    async fn rename(
        &self,
        context: &ConnectorRequestContext,
        old_name: &QualifiedName,
        new_name: &QualifiedName,
    ) -> Result<(), ConnectorError> {
        self.record(
            context,
            MockCall::Rename {
                old_name: old_name.clone(),
                new_name: new_name.clone(),
            },
        )
        .await;
        self.simulate_latency().await;
        self.check_error(old_name).await?;
        self.check_error(new_name).await?;

        let mut tables = self.tables.write().await;
        if !tables.contains_key(old_name) {
            return Err(ConnectorError::TableNotFound(old_name.clone()));
        }
        if old_name == new_name {
            return Ok(());
        }
        if tables.contains_key(new_name) {
            return Err(ConnectorError::TableAlreadyExists(new_name.clone()));
        }

        if let Some(mut table) = tables.remove(old_name) {
            table.name = new_name.clone();
            tables.insert(new_name.clone(), table);
        }
        Ok(())
    }

    async fn delete(
        &self,
        context: &ConnectorRequestContext,
        name: &QualifiedName,
    ) -> Result<(), ConnectorError> {
        self.record(context, MockCall::Delete { name: name.clone() }).await;
        self.simulate_latency().await;
        self.check_error(name).await?;

        self.tables
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ConnectorError::TableNotFound(name.clone()))
    }
}

/// Builder for creating MockTableService with predefined tables
///
/// # Example
///
/// ```rust,ignore
/// let service = MockTableServiceBuilder::new()
///     .with_table(TableInfo::new(QualifiedName::table("sf", "PUBLIC", "ORDERS")))
///     .with_error(
///         QualifiedName::table("sf", "PUBLIC", "SECRETS"),
///         ConnectorError::PermissionDenied("restricted".into()),
///     )
///     .build();
/// ```
pub struct MockTableServiceBuilder {
    tables: BTreeMap<QualifiedName, TableInfo>,
    errors: HashMap<QualifiedName, ConnectorError>,
    connection: MockConnection,
    latency_ms: u64,
}

impl MockTableServiceBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            errors: HashMap::new(),
            connection: MockConnection::new(),
            latency_ms: 0,
        }
    }

    /// Add a table
    pub fn with_table(mut self, table: TableInfo) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Add an error for a name
    pub fn with_error(mut self, name: QualifiedName, error: ConnectorError) -> Self {
        self.errors.insert(name, error);
        self
    }

    /// Use this connection for detail hooks
    pub fn with_connection(mut self, connection: MockConnection) -> Self {
        self.connection = connection;
        self
    }

    /// Set latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Build the service
    pub fn build(self) -> MockTableService {
        let mut service = MockTableService::new(self.connection).with_latency(self.latency_ms);
        service.tables = Arc::new(RwLock::new(self.tables));
        service.errors = Arc::new(RwLock::new(self.errors));
        service
    }
}

impl Default for MockTableServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
