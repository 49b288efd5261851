//! Catalog table service seam for warehouse connectors
//!
//! This crate defines the capability a generic catalog table service exposes
//! to warehouse-specific connectors, and a JDBC-style connection interface the
//! connectors use for their own supplementary queries.
//!
//! ## Layers
//!
//! - [`BaseCatalogTableService`] - the generic service: introspection, paging
//!   and sorting. Calls back into a [`TableInfoDetails`] hook after it builds
//!   each descriptor.
//! - [`ConnectorTableService`] - the surface a connector presents to the
//!   catalog. Connectors wrap a base service and implement this.
//! - [`Connection`] - prepared statements and cursors against the warehouse.
//!
//! ## Example
//!
//! ```rust,ignore
//! use metacat_connector::{MockConnection, MockTableService, BaseCatalogTableService, NoDetails};
//!
//! let service = MockTableService::new(MockConnection::new());
//! service.add_table(TableInfo::new(QualifiedName::table("sf", "PUBLIC", "ORDERS"))).await;
//! let table = service.get(&ctx, &name, &NoDetails).await?;
//! ```

pub mod service;
pub mod connection;
pub mod mock;

pub use service::{BaseCatalogTableService, ConnectorTableService, TableInfoDetails, NoDetails};
pub use connection::{Connection, Statement, ResultSet, SqlValue, Row, Parameters, placeholder_count};
pub use mock::{MockTableService, MockTableServiceBuilder, MockCall, MockConnection, ExecutedStatement};
