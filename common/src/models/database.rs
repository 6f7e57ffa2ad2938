//! Database entity models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A PostgreSQL database, inside a container or directly on a host.
///
/// `name` is unique within its scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Database {
    /// Database name.
    pub name: String,
    /// Owning role.
    pub owner: String,
    /// Server encoding, e.g. `UTF8`.
    pub encoding: String,
    /// Human-readable size as reported by `pg_size_pretty`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Database comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Database {
    /// Creates a database entry without size or description.
    pub fn new(name: &str, owner: &str, encoding: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            encoding: encoding.to_string(),
            size: None,
            description: None,
        }
    }

    /// Sets the reported size.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }
}
