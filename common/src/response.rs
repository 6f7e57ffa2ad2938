//! Wire envelopes for list endpoints, health checks and errors.
//!
//! List endpoints do not wrap their payload in a generic `data` field; each
//! one names its collection and reports the parent identifiers it was scoped
//! to plus a `total`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Container, Database, Server};

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Short error title.
    #[serde(default)]
    pub error: String,

    /// Detailed, human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// HTTP status code repeated in the body.
    #[serde(default)]
    pub code: u16,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// Service status, `"healthy"` when everything is fine.
    pub status: String,
    /// Time the check was answered.
    pub timestamp: DateTime<Utc>,
    /// Seconds since the service started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
}

/// Response of `GET /api/v1/servers`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServerList {
    pub servers: Vec<Server>,
    pub total: usize,
}

impl ServerList {
    pub fn new(servers: Vec<Server>) -> Self {
        Self {
            total: servers.len(),
            servers,
        }
    }
}

/// Response of `GET /api/v1/servers/{serverID}/containers`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContainerList {
    pub containers: Vec<Container>,
    pub server_id: String,
    pub total: usize,
}

impl ContainerList {
    pub fn new(server_id: impl Into<String>, containers: Vec<Container>) -> Self {
        Self {
            total: containers.len(),
            server_id: server_id.into(),
            containers,
        }
    }
}

/// Response of both database list endpoints (container and host scope).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatabaseList {
    pub databases: Vec<Database>,
    pub server_id: String,
    /// Set for container-scoped listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    /// `"host"` for host-scoped listings.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub scope_type: Option<String>,
    pub total: usize,
}

impl DatabaseList {
    /// Creates a container-scoped listing.
    pub fn for_container(
        server_id: impl Into<String>,
        container_id: impl Into<String>,
        databases: Vec<Database>,
    ) -> Self {
        Self {
            total: databases.len(),
            server_id: server_id.into(),
            container_id: Some(container_id.into()),
            scope_type: None,
            databases,
        }
    }

    /// Creates a host-scoped listing.
    pub fn for_host(server_id: impl Into<String>, databases: Vec<Database>) -> Self {
        Self {
            total: databases.len(),
            server_id: server_id.into(),
            container_id: None,
            scope_type: Some("host".to_string()),
            databases,
        }
    }
}

/// Response of `GET /api/v1/servers/{serverID}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServerReachability {
    pub server_id: String,
    /// `"reachable"` or `"unreachable"`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerReachability {
    pub fn is_reachable(&self) -> bool {
        self.status == "reachable"
    }
}
