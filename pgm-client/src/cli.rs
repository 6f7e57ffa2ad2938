//! `pgm` command line.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use common::config::ClientConfig;
use common::errors::{AppError, AppResult};
use common::models::{Container, Database, DumpOptions, Server};

use crate::session::Session;

/// Browse PostgreSQL servers, containers and databases, and download dumps.
#[derive(Parser, Debug, Clone)]
#[command(name = "pgm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PostgreSQL manager client")]
#[command(long_about = r#"
Talks to the PostgreSQL manager backend.

Configuration is read from PGM_API_BASE_URL, PGM_API_TIMEOUT_MS and
PGM_DOWNLOAD_DIR (or a .env file); the flags below take precedence.

Examples:
  pgm servers
  pgm containers srv1
  pgm databases srv1 --container pg1
  pgm dump srv1 app_db --container pg1 --data-only
  pgm dump srv1 billing --schema-only --output-dir ./dumps
  pgm dump srv1 billing --output-file billing-nightly.sql
"#)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check backend health
    Health,

    /// List servers
    Servers,

    /// Check whether a server is reachable
    Status {
        #[arg(value_name = "SERVER")]
        server: String,
    },

    /// List PostgreSQL containers on a server
    Containers {
        #[arg(value_name = "SERVER")]
        server: String,
    },

    /// List databases in a container or on the host
    Databases {
        #[arg(value_name = "SERVER")]
        server: String,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Download a database dump
    Dump {
        #[arg(value_name = "SERVER")]
        server: String,

        #[arg(value_name = "DATABASE")]
        database: String,

        /// Container id, short id or name; host database when omitted
        #[arg(long, value_name = "ID")]
        container: Option<String>,

        /// Dump data only
        #[arg(long, conflicts_with = "schema_only")]
        data_only: bool,

        /// Dump schema only
        #[arg(long)]
        schema_only: bool,

        /// Directory to save the dump into
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// File name to save the dump under instead of the generated one
        #[arg(long, value_name = "NAME")]
        output_file: Option<String>,
    },
}

/// Container or host scope for `databases`.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ScopeArgs {
    /// Container id, short id or name
    #[arg(long, value_name = "ID")]
    pub container: Option<String>,

    /// Databases running directly on the host
    #[arg(long)]
    pub host: bool,
}

impl Cli {
    /// Loads the client configuration and applies the flags on top.
    pub fn config(&self) -> AppResult<ClientConfig> {
        let output_dir = match &self.command {
            Command::Dump { output_dir, .. } => output_dir.clone(),
            _ => None,
        };
        ClientConfig::load()?.with_overrides(self.base_url.clone(), self.timeout_ms, output_dir)
    }
}

/// Runs a command against a session and returns what should be printed.
pub async fn execute(session: &Session, command: &Command) -> AppResult<String> {
    match command {
        Command::Health => {
            let health = session.api().health().await?;
            Ok(format!("{} ({})", health.status, health.timestamp.to_rfc3339()))
        }
        Command::Servers => {
            session.load_servers().await;
            let servers = session.servers().result().await?.unwrap_or_default();
            Ok(render_servers(&servers))
        }
        Command::Status { server } => {
            let status = session.api().server_status(server).await?;
            match (status.is_reachable(), status.error) {
                (true, _) => Ok(format!("{}: reachable", status.server_id)),
                (false, Some(error)) => Ok(format!("{}: unreachable ({})", status.server_id, error)),
                (false, None) => Ok(format!("{}: {}", status.server_id, status.status)),
            }
        }
        Command::Containers { server } => {
            session.select_server_by_id(server).await?;
            let containers = session.containers().result().await?.unwrap_or_default();
            Ok(render_containers(&containers))
        }
        Command::Databases { server, scope } => {
            session.select_server_by_id(server).await?;
            match &scope.container {
                Some(container) => {
                    session.select_container_by_id(container).await?;
                }
                None if scope.host => session.select_host().await?,
                None => {
                    return Err(AppError::Validation(
                        "either --container or --host is required".into(),
                    ))
                }
            }
            let databases = session.databases().result().await?.unwrap_or_default();
            Ok(render_databases(&databases))
        }
        Command::Dump {
            server,
            database,
            container,
            data_only,
            schema_only,
            output_file,
            ..
        } => {
            session.select_server_by_id(server).await?;
            match container {
                Some(container) => {
                    session.select_container_by_id(container).await?;
                }
                None => session.select_host().await?,
            }
            session.select_database_by_name(database).await?;

            let saved = session
                .download(
                    DumpOptions::from_flags(*data_only, *schema_only),
                    output_file.as_deref(),
                )
                .await?;
            Ok(format!(
                "saved {} ({} bytes)",
                saved.path.display(),
                saved.bytes
            ))
        }
    }
}

fn render_servers(servers: &[Server]) -> String {
    let mut out = format!("{:<16} {:<24} {:<28} {}\n", "ID", "NAME", "HOST", "STATUS");
    for s in servers {
        let _ = writeln!(
            out,
            "{:<16} {:<24} {:<28} {}",
            s.id,
            s.name,
            format!("{}:{}", s.host, s.port),
            s.status
        );
    }
    let _ = write!(out, "{} server(s)", servers.len());
    out
}

fn render_containers(containers: &[Container]) -> String {
    let mut out = format!("{:<14} {:<24} {:<20} {}\n", "ID", "NAME", "IMAGE", "STATUS");
    for c in containers {
        let _ = writeln!(
            out,
            "{:<14} {:<24} {:<20} {}",
            c.short_id(),
            c.name,
            c.image,
            c.status
        );
    }
    let _ = write!(out, "{} container(s)", containers.len());
    out
}

fn render_databases(databases: &[Database]) -> String {
    let mut out = format!("{:<24} {:<16} {:<10} {}\n", "NAME", "OWNER", "ENCODING", "SIZE");
    for d in databases {
        let _ = writeln!(
            out,
            "{:<24} {:<16} {:<10} {}",
            d.name,
            d.owner,
            d.encoding,
            d.size.as_deref().unwrap_or("-")
        );
    }
    let _ = write!(out, "{} database(s)", databases.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_flags_are_mutually_exclusive() {
        let err = Cli::try_parse_from([
            "pgm",
            "dump",
            "srv1",
            "app_db",
            "--data-only",
            "--schema-only",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_databases_requires_exactly_one_scope() {
        assert!(Cli::try_parse_from(["pgm", "databases", "srv1"]).is_err());
        assert!(
            Cli::try_parse_from(["pgm", "databases", "srv1", "--host", "--container", "pg1"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["pgm", "databases", "srv1", "--host"]).unwrap();
        match cli.command {
            Command::Databases { server, scope } => {
                assert_eq!(server, "srv1");
                assert!(scope.host);
                assert_eq!(scope.container, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dump_output_file() {
        let cli = Cli::try_parse_from([
            "pgm",
            "dump",
            "srv1",
            "billing",
            "--output-file",
            "billing-nightly.sql",
        ])
        .unwrap();
        match cli.command {
            Command::Dump {
                container,
                output_file,
                ..
            } => {
                assert_eq!(container, None);
                assert_eq!(output_file.as_deref(), Some("billing-nightly.sql"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pgm",
            "servers",
            "--base-url",
            "http://backend:9000",
            "--timeout-ms",
            "500",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://backend:9000"));
        assert_eq!(cli.timeout_ms, Some(500));
    }

    #[test]
    fn test_render_databases_marks_missing_size() {
        let out = render_databases(&[
            Database::new("app_db", "app", "UTF8").with_size("8 MB"),
            Database::new("billing", "postgres", "UTF8"),
        ]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("app_db") && lines[1].ends_with("8 MB"));
        assert!(lines[2].ends_with('-'));
        assert_eq!(lines[3], "2 database(s)");
    }
}
