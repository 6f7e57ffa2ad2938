//! PostgreSQL container models.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of a container.
///
/// The backend may send either the normalised value or the raw status column
/// of `docker ps` (`"Up 3 hours"`, `"Exited (0) 2 days ago"`, ...); both
/// deserialize into one of these four states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ContainerStatus {
    Running,
    Stopped,
    Paused,
    Restarting,
}

impl ContainerStatus {
    /// Normalises a status string.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if lower == "paused" || (lower.starts_with("up") && lower.contains("(paused)")) {
            ContainerStatus::Paused
        } else if lower == "running" || lower.starts_with("up ") || lower == "up" {
            ContainerStatus::Running
        } else if lower.starts_with("restarting") {
            ContainerStatus::Restarting
        } else {
            ContainerStatus::Stopped
        }
    }

    /// Whether databases inside the container can be listed.
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerStatus::Running)
    }
}

impl From<String> for ContainerStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerStatus::Running => write!(f, "running"),
            ContainerStatus::Stopped => write!(f, "stopped"),
            ContainerStatus::Paused => write!(f, "paused"),
            ContainerStatus::Restarting => write!(f, "restarting"),
        }
    }
}

/// A PostgreSQL container on a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Container {
    /// Docker container id.
    pub id: String,
    /// Container name.
    pub name: String,
    /// Image reference, e.g. `postgres:16`.
    pub image: String,
    /// Lifecycle state.
    pub status: ContainerStatus,
    /// Published ports as reported by Docker.
    #[serde(default)]
    pub ports: Vec<String>,
    /// Container labels.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Container {
    /// First twelve characters of the id, the way Docker prints it.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(12) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_status_text_is_normalised() {
        assert_eq!(ContainerStatus::parse("Up 3 hours"), ContainerStatus::Running);
        assert_eq!(
            ContainerStatus::parse("Up 2 minutes (Paused)"),
            ContainerStatus::Paused
        );
        assert_eq!(
            ContainerStatus::parse("Restarting (1) 3 seconds ago"),
            ContainerStatus::Restarting
        );
        assert_eq!(
            ContainerStatus::parse("Exited (0) 5 days ago"),
            ContainerStatus::Stopped
        );
        assert_eq!(ContainerStatus::parse("Created"), ContainerStatus::Stopped);
        assert_eq!(ContainerStatus::parse("running"), ContainerStatus::Running);
    }

    #[test]
    fn test_container_deserializes_without_labels() {
        let container: Container = serde_json::from_str(
            r#"{
                "id": "3f2a9c1b7d4e5f60718293a4",
                "name": "pg1",
                "image": "postgres:16",
                "status": "Up 4 days",
                "ports": ["0.0.0.0:5432->5432/tcp"],
                "created": "2024-03-01T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(container.status, ContainerStatus::Running);
        assert!(container.labels.is_empty());
        assert_eq!(container.short_id(), "3f2a9c1b7d4e");
    }
}
