//! Per-request context and listing options

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Context of a single catalog request
///
/// Connectors treat this as opaque and hand it to whatever they delegate to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRequestContext {
    /// Time the request entered the catalog service
    pub timestamp: DateTime<Utc>,

    /// Caller identity, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Whether the caller asked for table metadata in listings
    #[serde(default)]
    pub include_metadata: bool,
}

impl ConnectorRequestContext {
    /// Create a context stamped with the current time
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            user_name: None,
            include_metadata: false,
        }
    }

    /// Set the caller identity
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Set whether metadata is included in listings
    pub fn with_include_metadata(mut self, include_metadata: bool) -> Self {
        self.include_metadata = include_metadata;
        self
    }
}

impl Default for ConnectorRequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sort request for listings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    /// Attribute to sort by (e.g. `name`)
    pub sort_by: String,

    #[serde(default)]
    pub order: SortOrder,
}

impl Sort {
    pub fn new(sort_by: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort_by: sort_by.into(),
            order,
        }
    }
}

/// Page window for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pageable {
    /// Number of entries to skip
    #[serde(default)]
    pub offset: usize,

    /// Maximum number of entries; `None` means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Pageable {
    pub fn new(offset: usize, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }

    /// Apply the window to an already ordered sequence
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pageable_window() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(Pageable::new(1, Some(2)).apply(items.clone()), vec![2, 3]);
        assert_eq!(Pageable::new(3, None).apply(items.clone()), vec![4, 5]);
        assert_eq!(Pageable::new(10, Some(2)).apply(items), Vec::<i32>::new());
    }

    #[test]
    fn context_builder() {
        let ctx = ConnectorRequestContext::new()
            .with_user_name("etl")
            .with_include_metadata(true);
        assert_eq!(ctx.user_name.as_deref(), Some("etl"));
        assert!(ctx.include_metadata);
    }

    #[test]
    fn sort_order_defaults_to_ascending() {
        let sort: Sort = serde_json::from_str(r#"{"sort_by":"name"}"#).unwrap();
        assert_eq!(sort, Sort::new("name", SortOrder::Asc));
    }
}
