//! Server → container/host → database selection cascade.
//!
//! [`Selection::apply`] is a pure transition function. Selecting an ancestor
//! clears every descendant in the same step, so no observer can see a
//! container that belongs to a different server than the one selected.

use common::errors::{AppError, AppResult};
use common::models::{Container, Database, Server};

/// Where the selected database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Inside a PostgreSQL container.
    Container(Container),
    /// Directly on the server host.
    Host,
}

/// Dependency key for the database resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatabaseScope {
    Container {
        server_id: String,
        container_id: String,
    },
    Host {
        server_id: String,
    },
}

impl DatabaseScope {
    pub fn server_id(&self) -> &str {
        match self {
            DatabaseScope::Container { server_id, .. } | DatabaseScope::Host { server_id } => {
                server_id
            }
        }
    }
}

/// Selection change requested by the user.
#[derive(Debug, Clone)]
pub enum SelectionEvent {
    SelectServer(Option<Server>),
    SelectContainer(Option<Container>),
    SelectHost,
    SelectDatabase(Option<Database>),
}

/// Fully-resolved selection a dump can be requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpTarget {
    pub server: Server,
    /// `None` for host databases.
    pub container: Option<Container>,
    pub database: Database,
}

/// Current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    server: Option<Server>,
    scope: Option<Scope>,
    database: Option<Database>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(&self) -> Option<&Server> {
        self.server.as_ref()
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn container(&self) -> Option<&Container> {
        match &self.scope {
            Some(Scope::Container(container)) => Some(container),
            _ => None,
        }
    }

    pub fn is_host_scope(&self) -> bool {
        matches!(self.scope, Some(Scope::Host))
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Applies an event, returning the next selection.
    ///
    /// Rejected events leave `self` untouched and return
    /// [`AppError::SelectionIncomplete`].
    pub fn apply(&self, event: SelectionEvent) -> AppResult<Selection> {
        match event {
            SelectionEvent::SelectServer(server) => Ok(Selection {
                server,
                scope: None,
                database: None,
            }),
            SelectionEvent::SelectContainer(container) => {
                self.require_server("select a server before choosing a container")?;
                Ok(Selection {
                    server: self.server.clone(),
                    scope: container.map(Scope::Container),
                    database: None,
                })
            }
            SelectionEvent::SelectHost => {
                self.require_server("select a server before browsing host databases")?;
                Ok(Selection {
                    server: self.server.clone(),
                    scope: Some(Scope::Host),
                    database: None,
                })
            }
            SelectionEvent::SelectDatabase(database) => {
                if database.is_some() && self.scope.is_none() {
                    return Err(AppError::SelectionIncomplete(
                        "select a container or the host before choosing a database".into(),
                    ));
                }
                Ok(Selection {
                    database,
                    ..self.clone()
                })
            }
        }
    }

    /// Dependency for the container resource.
    pub fn container_deps(&self) -> Option<String> {
        self.server.as_ref().map(|s| s.id.clone())
    }

    /// Dependency for the database resource.
    pub fn database_deps(&self) -> Option<DatabaseScope> {
        let server = self.server.as_ref()?;
        match self.scope.as_ref()? {
            Scope::Container(container) => Some(DatabaseScope::Container {
                server_id: server.id.clone(),
                container_id: container.id.clone(),
            }),
            Scope::Host => Some(DatabaseScope::Host {
                server_id: server.id.clone(),
            }),
        }
    }

    /// Returns the dump target, or names the first missing level.
    pub fn dump_target(&self) -> AppResult<DumpTarget> {
        let server = self
            .server
            .clone()
            .ok_or_else(|| AppError::SelectionIncomplete("no server selected".into()))?;
        let container = match &self.scope {
            Some(Scope::Container(container)) => Some(container.clone()),
            Some(Scope::Host) => None,
            None => {
                return Err(AppError::SelectionIncomplete(
                    "no container or host selected".into(),
                ))
            }
        };
        let database = self
            .database
            .clone()
            .ok_or_else(|| AppError::SelectionIncomplete("no database selected".into()))?;

        Ok(DumpTarget {
            server,
            container,
            database,
        })
    }

    fn require_server(&self, hint: &str) -> AppResult<()> {
        if self.server.is_none() {
            return Err(AppError::SelectionIncomplete(hint.to_string()));
        }
        Ok(())
    }
}
