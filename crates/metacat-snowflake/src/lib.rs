//! Snowflake connector for the catalog table service
//!
//! Snowflake stores unquoted identifiers in uppercase and does not return
//! table creation or alteration times through the generic introspection
//! path. This crate wraps any [`BaseCatalogTableService`] so that:
//!
//! - every name reaching the wrapped service is uppercased first
//!   ([`normalizer`]);
//! - every table descriptor it builds gets its audit record from
//!   `INFORMATION_SCHEMA.TABLES` ([`audit`]), on a best-effort basis.
//!
//! ## Features
//!
//! - `snowflake` - [`SnowflakeConnection`], a [`Connection`] over the
//!   Snowflake REST API
//!
//! ## Example
//!
//! ```rust,ignore
//! use metacat_snowflake::SnowflakeConnectorTableService;
//! use metacat_connector::ConnectorTableService;
//!
//! let service = SnowflakeConnectorTableService::new(base_service);
//! let table = service.get(&ctx, &"snowflake/public/orders".parse()?).await?;
//! assert_eq!(table.name.to_string(), "SNOWFLAKE/PUBLIC/ORDERS");
//! ```
//!
//! [`BaseCatalogTableService`]: metacat_connector::BaseCatalogTableService
//! [`Connection`]: metacat_connector::Connection

pub mod normalizer;
pub mod audit;
pub mod service;
pub mod connection;

pub use normalizer::{normalize, same_object};
pub use audit::{AuditEnricher, AuditLookup};
pub use service::SnowflakeConnectorTableService;
pub use connection::{SnowflakeConnection, SnowflakeConnectionBuilder, SnowflakeCredentials};
