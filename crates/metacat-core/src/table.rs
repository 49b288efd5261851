//! Table descriptors and their audit record

use crate::name::QualifiedName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Creation and last-modification timestamps of a catalog object
///
/// Sourced independently of the primary metadata introspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_date: Option<DateTime<Utc>>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl AuditInfo {
    pub fn new(created_date: Option<DateTime<Utc>>, last_modified_date: Option<DateTime<Utc>>) -> Self {
        Self {
            created_date,
            last_modified_date,
        }
    }
}

/// A column of a table as reported by the warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Column name
    pub name: String,

    /// Type as spelled by the source warehouse (e.g. `NUMBER(38,0)`)
    pub source_type: String,

    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FieldInfo {
    /// Create a nullable field with no comment
    pub fn new(name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            nullable: true,
            comment: None,
        }
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Catalog record for a single table
///
/// Built by a table service during a fetch. The audit record starts absent and
/// may be filled in once before the descriptor is returned; a descriptor
/// without audit information is still complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: QualifiedName,

    #[serde(default)]
    pub fields: Vec<FieldInfo>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditInfo>,
}

impl TableInfo {
    /// Create a descriptor with no fields and no audit record
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            fields: Vec::new(),
            metadata: HashMap::new(),
            audit: None,
        }
    }

    /// Set fields
    pub fn with_fields(mut self, fields: Vec<FieldInfo>) -> Self {
        self.fields = fields;
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach the audit record
    pub fn set_audit(&mut self, audit: AuditInfo) {
        self.audit = Some(audit);
    }

    /// Find a field by exact name
    pub fn find_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}
