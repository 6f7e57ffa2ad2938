//! Fixture data served by the mock backend.
//!
//! Loaded from a JSON file (`MOCK_FIXTURES`) shaped like
//! `{"servers": [{...server, "containers": [{...container, "databases": [...]}],
//! "host_databases": [...]}]}`, or the built-in demo set when unset.

use std::path::Path;

use chrono::{TimeZone, Utc};
use common::errors::{AppError, AppResult};
use common::models::{Container, ContainerStatus, Database, Server, ServerStatus};
use serde::Deserialize;

/// A container together with the databases inside it.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureContainer {
    #[serde(flatten)]
    pub container: Container,
    #[serde(default)]
    pub databases: Vec<Database>,
}

/// A server with its containers and host databases.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureServer {
    #[serde(flatten)]
    pub server: Server,
    /// Answer of the reachability probe.
    #[serde(default = "default_reachable")]
    pub reachable: bool,
    #[serde(default)]
    pub containers: Vec<FixtureContainer>,
    #[serde(default)]
    pub host_databases: Vec<Database>,
}

fn default_reachable() -> bool {
    true
}

/// Complete fixture set.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixtures {
    pub servers: Vec<FixtureServer>,
}

impl Fixtures {
    /// Reads fixtures from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)?;
        serde_json::from_slice(&raw).map_err(|e| {
            AppError::Config(format!("invalid fixture file {}: {}", path.display(), e))
        })
    }

    /// Loads `MOCK_FIXTURES` if set, the demo set otherwise.
    pub fn from_env() -> AppResult<Self> {
        match std::env::var("MOCK_FIXTURES") {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::demo()),
        }
    }

    pub fn servers(&self) -> Vec<Server> {
        self.servers.iter().map(|s| s.server.clone()).collect()
    }

    pub fn server(&self, server_id: &str) -> AppResult<&FixtureServer> {
        self.servers
            .iter()
            .find(|s| s.server.id == server_id)
            .ok_or_else(|| AppError::NotFound(format!("server with ID {} not found", server_id)))
    }

    /// Finds a container by full id or name.
    pub fn container(&self, server_id: &str, container_id: &str) -> AppResult<&FixtureContainer> {
        self.server(server_id)?
            .containers
            .iter()
            .find(|c| c.container.id == container_id || c.container.name == container_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "container {} not found on server {}",
                    container_id, server_id
                ))
            })
    }

    pub fn container_database(
        &self,
        server_id: &str,
        container_id: &str,
        db_name: &str,
    ) -> AppResult<&Database> {
        find_database(
            &self.container(server_id, container_id)?.databases,
            db_name,
        )
    }

    pub fn host_database(&self, server_id: &str, db_name: &str) -> AppResult<&Database> {
        find_database(&self.server(server_id)?.host_databases, db_name)
    }

    /// Demo data: one server with containers, one host-only server.
    pub fn demo() -> Self {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).single().unwrap_or_default();

        let pg1 = FixtureContainer {
            container: Container {
                id: "3f9c2a7d1b4e6f8a0c2d4e6f8a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b".into(),
                name: "pg1".into(),
                image: "postgres:16".into(),
                status: ContainerStatus::Running,
                ports: vec!["5432/tcp".into()],
                labels: Default::default(),
                created,
            },
            databases: vec![
                Database::new("app_db", "app", "UTF8").with_size("24 MB"),
                Database::new("analytics", "postgres", "UTF8").with_size("310 MB"),
            ],
        };
        let pg_legacy = FixtureContainer {
            container: Container {
                id: "9a8b7c6d5e4f3a2b1c0d9e8f7a6b5c4d3e2f1a0b9c8d7e6f5a4b3c2d1e0f9a8b".into(),
                name: "pg-legacy".into(),
                image: "postgres:12".into(),
                status: ContainerStatus::Stopped,
                ports: vec![],
                labels: Default::default(),
                created,
            },
            databases: vec![Database::new("legacy", "postgres", "LATIN1")],
        };

        Self {
            servers: vec![
                FixtureServer {
                    server: Server {
                        id: "srv1".into(),
                        name: "Primary".into(),
                        host: "10.0.0.5".into(),
                        port: 22,
                        description: Some("Docker host with application databases".into()),
                        status: ServerStatus::Online,
                    },
                    reachable: true,
                    containers: vec![pg1, pg_legacy],
                    host_databases: vec![Database::new("postgres", "postgres", "UTF8")],
                },
                FixtureServer {
                    server: Server {
                        id: "srv2".into(),
                        name: "Reporting".into(),
                        host: "10.0.0.6".into(),
                        port: 22,
                        description: None,
                        status: ServerStatus::Unknown,
                    },
                    reachable: false,
                    containers: vec![],
                    host_databases: vec![Database::new("billing", "billing", "UTF8")
                        .with_size("1.2 GB")],
                },
            ],
        }
    }
}

fn find_database<'a>(databases: &'a [Database], db_name: &str) -> AppResult<&'a Database> {
    databases
        .iter()
        .find(|d| d.name == db_name)
        .ok_or_else(|| AppError::NotFound(format!("database {} not found", db_name)))
}
