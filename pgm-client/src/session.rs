//! Browsing session: one API client, one selection, one resource per level.

use std::sync::Arc;

use common::config::ClientConfig;
use common::errors::{AppError, AppResult};
use common::models::{Container, Database, DumpOptions, Server};
use tokio::sync::RwLock;

use crate::api::{ApiClient, ManagerApi};
use crate::download::{Downloader, DumpSink, FileSink, SavedDump};
use crate::resource::{Outcome, Resource, Staged};
use crate::selection::{DatabaseScope, Selection, SelectionEvent};

/// Client-side state for browsing servers, containers and databases.
///
/// Selection changes are applied before the fetches they trigger are
/// issued. A resource whose ancestor is unselected resolves to an empty
/// list without calling the API.
pub struct Session {
    api: Arc<dyn ManagerApi>,
    selection: RwLock<Selection>,
    servers: Resource<(), Vec<Server>>,
    containers: Resource<Option<String>, Vec<Container>>,
    databases: Resource<Option<DatabaseScope>, Vec<Database>>,
    downloader: Downloader,
}

impl Session {
    /// Creates a session over an injected API and dump sink.
    pub fn new(api: Arc<dyn ManagerApi>, sink: Arc<dyn DumpSink>) -> Self {
        let servers = {
            let api = api.clone();
            Resource::new("servers", move |_: ()| {
                let api = api.clone();
                async move { api.list_servers().await }
            })
        };

        let containers = {
            let api = api.clone();
            Resource::new("containers", move |server_id: Option<String>| {
                let api = api.clone();
                async move {
                    match server_id {
                        Some(server_id) => api.list_containers(&server_id).await,
                        None => Ok(Vec::new()),
                    }
                }
            })
        };

        let databases = {
            let api = api.clone();
            Resource::new("databases", move |scope: Option<DatabaseScope>| {
                let api = api.clone();
                async move {
                    match scope {
                        Some(DatabaseScope::Container {
                            server_id,
                            container_id,
                        }) => api.list_databases(&server_id, &container_id).await,
                        Some(DatabaseScope::Host { server_id }) => {
                            api.list_host_databases(&server_id).await
                        }
                        None => Ok(Vec::new()),
                    }
                }
            })
        };

        Self {
            downloader: Downloader::new(api.clone(), sink),
            api,
            selection: RwLock::new(Selection::new()),
            servers,
            containers,
            databases,
        }
    }

    /// Creates a session talking HTTP to the configured backend and saving
    /// dumps into the configured directory.
    pub fn from_config(config: &ClientConfig) -> AppResult<Self> {
        let api = Arc::new(ApiClient::new(config)?);
        let sink = Arc::new(FileSink::new(config.download_dir.clone()));
        Ok(Self::new(api, sink))
    }

    pub fn api(&self) -> &Arc<dyn ManagerApi> {
        &self.api
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    pub fn servers(&self) -> &Resource<(), Vec<Server>> {
        &self.servers
    }

    pub fn containers(&self) -> &Resource<Option<String>, Vec<Container>> {
        &self.containers
    }

    pub fn databases(&self) -> &Resource<Option<DatabaseScope>, Vec<Database>> {
        &self.databases
    }

    /// Copy of the current selection.
    pub async fn selection(&self) -> Selection {
        self.selection.read().await.clone()
    }

    /// Fetches the server list, or fetches it again if already loaded.
    pub async fn load_servers(&self) -> Outcome {
        match self.servers.set_deps(()).await {
            Outcome::Unchanged => self.servers.refetch().await,
            outcome => outcome,
        }
    }

    pub async fn refresh_containers(&self) -> Outcome {
        self.containers.refetch().await
    }

    pub async fn refresh_databases(&self) -> Outcome {
        self.databases.refetch().await
    }

    pub async fn select_server(&self, server: Option<Server>) -> AppResult<()> {
        self.transition(SelectionEvent::SelectServer(server)).await
    }

    pub async fn select_container(&self, container: Option<Container>) -> AppResult<()> {
        self.transition(SelectionEvent::SelectContainer(container))
            .await
    }

    pub async fn select_host(&self) -> AppResult<()> {
        self.transition(SelectionEvent::SelectHost).await
    }

    pub async fn select_database(&self, database: Option<Database>) -> AppResult<()> {
        self.transition(SelectionEvent::SelectDatabase(database))
            .await
    }

    /// Selects a server from the loaded list, loading it first if needed.
    pub async fn select_server_by_id(&self, id: &str) -> AppResult<Server> {
        if self.servers.deps().await.is_none() {
            self.load_servers().await;
        }
        let servers = self.servers.result().await?.unwrap_or_default();
        let server = servers
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("server {}", id)))?;

        self.select_server(Some(server.clone())).await?;
        Ok(server)
    }

    /// Selects a container of the current server by id, short id or name.
    pub async fn select_container_by_id(&self, key: &str) -> AppResult<Container> {
        let server_id = self
            .selection()
            .await
            .container_deps()
            .ok_or_else(|| AppError::SelectionIncomplete("no server selected".into()))?;
        if self.containers.deps().await != Some(Some(server_id)) {
            self.sync().await;
        }

        let containers = self.containers.result().await?.unwrap_or_default();
        let container = containers
            .into_iter()
            .find(|c| c.id == key || c.name == key || (key.len() >= 12 && c.id.starts_with(key)))
            .ok_or_else(|| AppError::NotFound(format!("container {}", key)))?;

        self.select_container(Some(container.clone())).await?;
        Ok(container)
    }

    /// Selects a database of the current scope by name.
    pub async fn select_database_by_name(&self, name: &str) -> AppResult<Database> {
        let scope = self.selection().await.database_deps().ok_or_else(|| {
            AppError::SelectionIncomplete("no container or host selected".into())
        })?;
        if self.databases.deps().await != Some(Some(scope)) {
            self.sync().await;
        }

        let databases = self.databases.result().await?.unwrap_or_default();
        let database = databases
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| AppError::NotFound(format!("database {}", name)))?;

        self.select_database(Some(database.clone())).await?;
        Ok(database)
    }

    /// Downloads a dump of the selected database, optionally under
    /// `file_name` instead of the generated name.
    pub async fn download(
        &self,
        options: DumpOptions,
        file_name: Option<&str>,
    ) -> AppResult<SavedDump> {
        let selection = self.selection().await;
        self.downloader
            .download_selection(&selection, options, file_name)
            .await
    }

    async fn transition(&self, event: SelectionEvent) -> AppResult<()> {
        let staged = {
            let mut selection = self.selection.write().await;
            let next = selection.apply(event)?;
            *selection = next;
            self.stage(&selection).await
        };
        self.fetch(staged).await;
        Ok(())
    }

    /// Pushes the current selection into the downstream resources.
    async fn sync(&self) {
        let staged = {
            let selection = self.selection.read().await;
            self.stage(&selection).await
        };
        self.fetch(staged).await;
    }

    /// Issues tickets for `selection` while the caller holds the selection
    /// lock, so ticket order follows the order of selection writes.
    async fn stage(&self, selection: &Selection) -> StagedFetches {
        (
            self.containers.stage(selection.container_deps()).await,
            self.databases.stage(selection.database_deps()).await,
        )
    }

    async fn fetch(&self, (containers, databases): StagedFetches) {
        tokio::join!(
            self.containers.run_staged(containers),
            self.databases.run_staged(databases),
        );
    }
}

type StagedFetches = (
    Option<Staged<Option<String>>>,
    Option<Staged<Option<DatabaseScope>>>,
);

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use common::models::{ContainerStatus, ServerStatus};
    use common::response::{HealthStatus, ServerReachability};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory backend recording every call.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        /// Server whose container listing answers late.
        slow_server: Option<&'static str>,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn server(id: &str) -> Server {
        Server {
            id: id.into(),
            name: id.to_uppercase(),
            host: format!("{}.lan", id),
            port: 22,
            description: None,
            status: ServerStatus::Online,
        }
    }

    fn container(id: &str) -> Container {
        Container {
            id: id.into(),
            name: format!("{}-name", id),
            image: "postgres:15".into(),
            status: ContainerStatus::Running,
            ports: vec![],
            labels: Default::default(),
            created: chrono::Utc.with_ymd_and_hms(2024, 2, 2, 8, 0, 0).unwrap(),
        }
    }

    #[async_trait]
    impl ManagerApi for FakeApi {
        async fn health(&self) -> AppResult<HealthStatus> {
            Err(AppError::Internal("unused".into()))
        }

        async fn list_servers(&self) -> AppResult<Vec<Server>> {
            self.record("servers".into());
            Ok(vec![server("srv1"), server("srv2")])
        }

        async fn server_status(&self, _server_id: &str) -> AppResult<ServerReachability> {
            Err(AppError::Internal("unused".into()))
        }

        async fn list_containers(&self, server_id: &str) -> AppResult<Vec<Container>> {
            self.record(format!("containers:{}", server_id));
            if self.slow_server == Some(server_id) {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            Ok(vec![container(&format!("{}-pg", server_id))])
        }

        async fn list_databases(
            &self,
            server_id: &str,
            container_id: &str,
        ) -> AppResult<Vec<Database>> {
            self.record(format!("databases:{}:{}", server_id, container_id));
            Ok(vec![Database::new("app_db", "app", "UTF8")])
        }

        async fn list_host_databases(&self, server_id: &str) -> AppResult<Vec<Database>> {
            self.record(format!("host-databases:{}", server_id));
            Ok(vec![Database::new("billing", "postgres", "UTF8")])
        }

        async fn dump(
            &self,
            server_id: &str,
            container_id: Option<&str>,
            database: &str,
            options: DumpOptions,
        ) -> AppResult<Vec<u8>> {
            self.record(format!(
                "dump:{}:{}:{}:{:?}",
                server_id,
                container_id.unwrap_or("host"),
                database,
                options.kind()
            ));
            Ok(b"-- dump".to_vec())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        saved: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl DumpSink for MemorySink {
        async fn save(&self, filename: &str, contents: &[u8]) -> AppResult<PathBuf> {
            self.saved
                .lock()
                .unwrap()
                .push((filename.to_string(), contents.to_vec()));
            Ok(PathBuf::from(filename))
        }
    }

    fn session() -> (Session, Arc<FakeApi>, Arc<MemorySink>) {
        let api = Arc::new(FakeApi::default());
        let sink = Arc::new(MemorySink::default());
        (Session::new(api.clone(), sink.clone()), api, sink)
    }

    #[tokio::test]
    async fn test_server_change_resets_and_refetches() {
        let (session, api, _) = session();
        session.select_server_by_id("srv1").await.unwrap();
        session.select_container_by_id("srv1-pg").await.unwrap();
        session.select_database_by_name("app_db").await.unwrap();

        session.select_server(Some(server("srv2"))).await.unwrap();

        let selection = session.selection().await;
        assert!(selection.container().is_none());
        assert!(selection.database().is_none());
        assert_eq!(
            session.containers().data().await.unwrap()[0].id,
            "srv2-pg"
        );
        assert_eq!(session.databases().data().await, Some(vec![]));
        assert_eq!(
            api.calls(),
            vec![
                "servers",
                "containers:srv1",
                "databases:srv1:srv1-pg",
                "containers:srv2",
            ]
        );
    }

    #[tokio::test]
    async fn test_reselecting_server_clears_choices_without_refetch() {
        let (session, api, _) = session();
        session.select_server_by_id("srv1").await.unwrap();
        session.select_host().await.unwrap();
        session.select_database_by_name("billing").await.unwrap();

        session.select_server(Some(server("srv1"))).await.unwrap();

        let selection = session.selection().await;
        assert_eq!(selection.scope(), None);
        assert_eq!(selection.database(), None);
        assert_eq!(session.databases().data().await, Some(vec![]));
        assert_eq!(
            api.calls(),
            vec!["servers", "containers:srv1", "host-databases:srv1"]
        );
    }

    #[tokio::test]
    async fn test_concurrent_server_changes_follow_last_selection() {
        let api = Arc::new(FakeApi {
            slow_server: Some("srv1"),
            ..Default::default()
        });
        let session = Session::new(api.clone(), Arc::new(MemorySink::default()));

        let (first, second) = tokio::join!(
            session.select_server(Some(server("srv1"))),
            session.select_server(Some(server("srv2"))),
        );
        first.unwrap();
        second.unwrap();

        let selected = session.selection().await.container_deps();
        assert_eq!(session.containers().deps().await, Some(selected.clone()));

        let containers = session.containers().snapshot().await;
        assert!(!containers.loading);
        assert_eq!(
            containers.data.unwrap()[0].id,
            format!("{}-pg", selected.unwrap())
        );
    }

    #[tokio::test]
    async fn test_null_server_resolves_empty_without_request() {
        let (session, api, _) = session();
        session.select_server(None).await.unwrap();

        let containers = session.containers().snapshot().await;
        assert_eq!(containers.data, Some(vec![]));
        assert!(!containers.loading);
        assert_eq!(session.databases().data().await, Some(vec![]));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_host_scope_lists_host_databases() {
        let (session, api, sink) = session();
        session.select_server_by_id("srv2").await.unwrap();
        session.select_host().await.unwrap();
        session.select_database_by_name("billing").await.unwrap();

        let saved = session.download(DumpOptions::schema_only(), None).await.unwrap();
        assert!(saved.filename.starts_with("srv2_host_billing_schema_"));

        let calls = api.calls();
        assert!(calls.contains(&"host-databases:srv2".to_string()));
        assert_eq!(calls.last().unwrap(), "dump:srv2:host:billing:SchemaOnly");
        assert_eq!(sink.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_incomplete_selection_blocks_download() {
        let (session, api, sink) = session();
        session.select_server_by_id("srv1").await.unwrap();

        let err = session.download(DumpOptions::full(), None).await.unwrap_err();
        assert!(err.is_client_side());
        assert!(!api.calls().iter().any(|c| c.starts_with("dump")));
        assert!(sink.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (session, _, _) = session();
        let err = session.select_server_by_id("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = session.select_container_by_id("pg1").await.unwrap_err();
        assert!(matches!(err, AppError::SelectionIncomplete(_)));
    }
}
