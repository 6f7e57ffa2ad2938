//! Server models.
//!
//! A server is a remote host that runs PostgreSQL, either inside Docker
//! containers or directly on the host.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Server reachability status as reported in the server list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ServerStatus {
    /// Server answered the last probe.
    Online,
    /// Server did not answer the last probe.
    Offline,
    /// A probe is in progress.
    Pending,
    /// Status has not been checked.
    #[default]
    Unknown,
}

impl From<String> for ServerStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "online" => ServerStatus::Online,
            "offline" => ServerStatus::Offline,
            "pending" => ServerStatus::Pending,
            _ => ServerStatus::Unknown,
        }
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStatus::Online => write!(f, "online"),
            ServerStatus::Offline => write!(f, "offline"),
            ServerStatus::Pending => write!(f, "pending"),
            ServerStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A remote host listed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Server {
    /// Unique server identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Host name or address.
    pub host: String,
    /// SSH port.
    pub port: u16,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Reachability status.
    #[serde(default)]
    pub status: ServerStatus,
}
