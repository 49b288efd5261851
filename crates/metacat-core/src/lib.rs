//! Metacat Core
//!
//! Domain model shared by the catalog connectors: qualified names, table
//! descriptors with their audit record, request context and configuration.
//! Names compare exactly; warehouse-specific case rules live in the connectors.

pub mod name;
pub mod table;
pub mod request;
pub mod error;
pub mod config;

pub use name::{QualifiedName, NameParseError};
pub use table::{TableInfo, AuditInfo, FieldInfo};
pub use request::{ConnectorRequestContext, Sort, SortOrder, Pageable};
pub use error::ConnectorError;
pub use config::{ConnectorConfig, SnowflakeConfig, ConfigError};
