//! Canonical identifier case for Snowflake
//!
//! Snowflake resolves unquoted identifiers in uppercase and stores them that
//! way in `INFORMATION_SCHEMA`. Uppercasing uses the Unicode default mapping
//! from `str::to_uppercase`, which does not depend on any locale.

use metacat_core::QualifiedName;

/// Snowflake's canonical form of `name`: every segment uppercased
pub fn normalize(name: &QualifiedName) -> QualifiedName {
    name.map_segments(str::to_uppercase)
}

/// Whether two names address the same Snowflake object
pub fn same_object(a: &QualifiedName, b: &QualifiedName) -> bool {
    normalize(a) == normalize(b)
}
