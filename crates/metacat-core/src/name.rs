//! Qualified names for catalog objects
//!
//! A name addresses a catalog, a database within it, a table within the
//! database, and optionally a partition of that table. The textual form joins
//! the present segments with `/`, e.g. `prodhive/analytics/events`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hierarchical identifier of a catalog object
///
/// Segments are stored exactly as supplied. Connectors for warehouses that
/// fold identifier case are expected to derive a canonical copy before
/// talking to the warehouse; see [`QualifiedName::map_segments`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    catalog_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    table_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    partition_name: Option<String>,
}

impl QualifiedName {
    /// Name of a whole catalog
    pub fn catalog(catalog_name: impl Into<String>) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            database_name: None,
            table_name: None,
            partition_name: None,
        }
    }

    /// Name of a database (schema) inside a catalog
    pub fn database(catalog_name: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            database_name: Some(database_name.into()),
            ..Self::catalog(catalog_name)
        }
    }

    /// Name of a table
    pub fn table(
        catalog_name: impl Into<String>,
        database_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            table_name: Some(table_name.into()),
            ..Self::database(catalog_name, database_name)
        }
    }

    /// Name of a table partition
    pub fn partition(
        catalog_name: impl Into<String>,
        database_name: impl Into<String>,
        table_name: impl Into<String>,
        partition_name: impl Into<String>,
    ) -> Self {
        Self {
            partition_name: Some(partition_name.into()),
            ..Self::table(catalog_name, database_name, table_name)
        }
    }

    pub fn catalog_name(&self) -> &str {
        &self.catalog_name
    }

    pub fn database_name(&self) -> Option<&str> {
        self.database_name.as_deref()
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn partition_name(&self) -> Option<&str> {
        self.partition_name.as_deref()
    }

    /// True when the name stops at the database segment
    pub fn is_database_definition(&self) -> bool {
        self.database_name.is_some() && self.table_name.is_none()
    }

    /// True when the name stops at the table segment
    pub fn is_table_definition(&self) -> bool {
        self.table_name.is_some() && self.partition_name.is_none()
    }

    /// Present segments, outermost first
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.catalog_name.as_str())
            .chain(self.database_name.as_deref())
            .chain(self.table_name.as_deref())
            .chain(self.partition_name.as_deref())
    }

    /// Build a new name by applying `f` to every present segment
    ///
    /// Absent segments stay absent, so the shape of the name never changes.
    pub fn map_segments<F>(&self, f: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        Self {
            catalog_name: f(&self.catalog_name),
            database_name: self.database_name.as_deref().map(&f),
            table_name: self.table_name.as_deref().map(&f),
            partition_name: self.partition_name.as_deref().map(&f),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in self.segments() {
            if !first {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}

/// Errors produced when parsing a textual qualified name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameParseError {
    #[error("Qualified name is empty")]
    Empty,

    #[error("Qualified name '{0}' has an empty segment")]
    EmptySegment(String),

    #[error("Qualified name '{0}' has more than four segments")]
    TooManySegments(String),
}

impl FromStr for QualifiedName {
    type Err = NameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(NameParseError::Empty);
        }

        let parts: Vec<&str> = trimmed.split('/').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(NameParseError::EmptySegment(s.to_string()));
        }

        match parts.as_slice() {
            [catalog] => Ok(Self::catalog(*catalog)),
            [catalog, database] => Ok(Self::database(*catalog, *database)),
            [catalog, database, table] => Ok(Self::table(*catalog, *database, *table)),
            [catalog, database, table, partition] => {
                Ok(Self::partition(*catalog, *database, *table, *partition))
            }
            _ => Err(NameParseError::TooManySegments(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_accessors() {
        let name = QualifiedName::table("prod", "analytics", "events");
        assert_eq!(name.catalog_name(), "prod");
        assert_eq!(name.database_name(), Some("analytics"));
        assert_eq!(name.table_name(), Some("events"));
        assert_eq!(name.partition_name(), None);
        assert!(name.is_table_definition());
        assert!(!name.is_database_definition());
        assert_eq!(name.to_string(), "prod/analytics/events");
    }

    #[test]
    fn test_parse_each_depth() {
        assert_eq!("prod".parse::<QualifiedName>().unwrap(), QualifiedName::catalog("prod"));
        assert_eq!(
            "prod/analytics".parse::<QualifiedName>().unwrap(),
            QualifiedName::database("prod", "analytics")
        );
        assert_eq!(
            " prod/analytics/events/ ".parse::<QualifiedName>().unwrap(),
            QualifiedName::table("prod", "analytics", "events")
        );
        assert_eq!(
            "prod/analytics/events/dateint=20240101".parse::<QualifiedName>().unwrap(),
            QualifiedName::partition("prod", "analytics", "events", "dateint=20240101")
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<QualifiedName>(), Err(NameParseError::Empty));
        assert!(matches!(
            "prod//events".parse::<QualifiedName>(),
            Err(NameParseError::EmptySegment(_))
        ));
        assert!(matches!(
            "a/b/c/d/e".parse::<QualifiedName>(),
            Err(NameParseError::TooManySegments(_))
        ));
    }

    #[test]
    fn test_map_segments_keeps_shape() {
        let name = QualifiedName::database("prod", "analytics");
        let mapped = name.map_segments(|s| format!("{}_x", s));
        assert_eq!(mapped, QualifiedName::database("prod_x", "analytics_x"));
        assert!(mapped.table_name().is_none());
        // The source is untouched
        assert_eq!(name.catalog_name(), "prod");
    }

    #[test]
    fn test_segments_order() {
        let name = QualifiedName::partition("c", "d", "t", "p");
        assert_eq!(name.segments().collect::<Vec<_>>(), vec!["c", "d", "t", "p"]);
    }
}
