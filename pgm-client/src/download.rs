//! Dump download flow.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::errors::{AppError, AppResult};
use common::models::{Container, Database, DumpKind, DumpOptions, Server};
use common::utils::{custom_dump_filename, dump_filename};
use tokio::io::AsyncWriteExt;

use crate::api::ManagerApi;
use crate::selection::{DumpTarget, Selection};

/// Destination for downloaded dumps.
#[async_trait]
pub trait DumpSink: Send + Sync {
    /// Stores `contents` under a name derived from `filename` and returns
    /// where it ended up.
    async fn save(&self, filename: &str, contents: &[u8]) -> AppResult<PathBuf>;
}

/// Writes dumps into a directory.
///
/// Existing files are never overwritten; a numeric suffix is appended
/// instead (`name-1.sql`, `name-2.sql`, ...).
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

const MAX_NAME_ATTEMPTS: usize = 1000;

#[async_trait]
impl DumpSink for FileSink {
    async fn save(&self, filename: &str, contents: &[u8]) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = match (attempt, ext) {
                (0, _) => filename.to_string(),
                (n, Some(ext)) => format!("{}-{}.{}", stem, n, ext),
                (n, None) => format!("{}-{}", stem, n),
            };
            let path = self.dir.join(&name);

            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match file {
                Ok(mut file) => {
                    file.write_all(contents).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Io(format!(
            "no free file name for {} in {}",
            filename,
            self.dir.display()
        )))
    }
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDump {
    pub path: PathBuf,
    pub filename: String,
    pub bytes: usize,
    pub kind: DumpKind,
}

/// Requests dumps and hands them to a [`DumpSink`].
#[derive(Clone)]
pub struct Downloader {
    api: Arc<dyn ManagerApi>,
    sink: Arc<dyn DumpSink>,
    clock: fn() -> DateTime<Utc>,
}

impl Downloader {
    pub fn new(api: Arc<dyn ManagerApi>, sink: Arc<dyn DumpSink>) -> Self {
        Self {
            api,
            sink,
            clock: Utc::now,
        }
    }

    /// Replaces the clock used for file name timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Downloads a dump of `database`.
    ///
    /// With a container the container-scoped endpoint is used, without one
    /// the host-scoped endpoint. `file_name` replaces the generated name.
    pub async fn download(
        &self,
        server: &Server,
        container: Option<&Container>,
        database: &Database,
        options: DumpOptions,
        file_name: Option<&str>,
    ) -> AppResult<SavedDump> {
        tracing::info!(
            server = %server.id,
            container = container.map(|c| c.id.as_str()).unwrap_or("host"),
            database = %database.name,
            kind = ?options.kind(),
            "requesting dump"
        );

        let contents = self
            .api
            .dump(
                &server.id,
                container.map(|c| c.id.as_str()),
                &database.name,
                options,
            )
            .await?;

        let filename = match file_name {
            Some(name) => custom_dump_filename(name),
            None => dump_filename(
                &server.id,
                container.map(|c| c.name.as_str()),
                &database.name,
                options.kind(),
                (self.clock)(),
            ),
        };
        let path = self.sink.save(&filename, &contents).await?;

        tracing::info!(path = %path.display(), bytes = contents.len(), "dump saved");
        Ok(SavedDump {
            path,
            filename,
            bytes: contents.len(),
            kind: options.kind(),
        })
    }

    /// Downloads a dump for a resolved target.
    pub async fn download_target(
        &self,
        target: &DumpTarget,
        options: DumpOptions,
        file_name: Option<&str>,
    ) -> AppResult<SavedDump> {
        self.download(
            &target.server,
            target.container.as_ref(),
            &target.database,
            options,
            file_name,
        )
        .await
    }

    /// Downloads a dump for the current selection.
    ///
    /// An incomplete selection fails before any request is made.
    pub async fn download_selection(
        &self,
        selection: &Selection,
        options: DumpOptions,
        file_name: Option<&str>,
    ) -> AppResult<SavedDump> {
        let target = selection.dump_target()?;
        self.download_target(&target, options, file_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::models::{ContainerStatus, ServerStatus};
    use common::response::{HealthStatus, ServerReachability};
    use std::sync::Mutex;

    /// Backend that only answers dumps, recording the requested scope.
    #[derive(Default)]
    struct DumpOnlyApi {
        requested: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl ManagerApi for DumpOnlyApi {
        async fn health(&self) -> AppResult<HealthStatus> {
            Err(AppError::Internal("unused".into()))
        }
        async fn list_servers(&self) -> AppResult<Vec<Server>> {
            Err(AppError::Internal("unused".into()))
        }
        async fn server_status(&self, _: &str) -> AppResult<ServerReachability> {
            Err(AppError::Internal("unused".into()))
        }
        async fn list_containers(&self, _: &str) -> AppResult<Vec<Container>> {
            Err(AppError::Internal("unused".into()))
        }
        async fn list_databases(&self, _: &str, _: &str) -> AppResult<Vec<Database>> {
            Err(AppError::Internal("unused".into()))
        }
        async fn list_host_databases(&self, _: &str) -> AppResult<Vec<Database>> {
            Err(AppError::Internal("unused".into()))
        }
        async fn dump(
            &self,
            _server_id: &str,
            container_id: Option<&str>,
            _database: &str,
            _options: DumpOptions,
        ) -> AppResult<Vec<u8>> {
            self.requested
                .lock()
                .unwrap()
                .push(container_id.map(str::to_string));
            Ok(b"COPY public.items FROM stdin;".to_vec())
        }
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 14, 3, 9).unwrap()
    }

    #[tokio::test]
    async fn test_download_names_file_after_container() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(DumpOnlyApi::default());
        let downloader = Downloader::new(api.clone(), Arc::new(FileSink::new(dir.path())))
            .with_clock(fixed_clock);

        let server = Server {
            id: "srv1".into(),
            name: "Primary".into(),
            host: "10.0.0.5".into(),
            port: 22,
            description: None,
            status: ServerStatus::Online,
        };
        let container = Container {
            id: "3f9c2a7d1b4e".into(),
            name: "pg1".into(),
            image: "postgres:16".into(),
            status: ContainerStatus::Running,
            ports: vec![],
            labels: Default::default(),
            created: fixed_clock(),
        };
        let database = Database::new("app_db", "app", "UTF8");

        let saved = downloader
            .download(&server, Some(&container), &database, DumpOptions::data_only(), None)
            .await
            .unwrap();
        assert_eq!(saved.filename, "srv1_pg1_app_db_data_2024-05-17T14-03-09.sql");
        assert_eq!(saved.kind, DumpKind::DataOnly);
        assert_eq!(saved.bytes, 29);
        assert_eq!(std::fs::read(&saved.path).unwrap().len(), 29);

        let saved = downloader
            .download(&server, None, &database, DumpOptions::full(), None)
            .await
            .unwrap();
        assert_eq!(saved.filename, "srv1_host_app_db_full_2024-05-17T14-03-09.sql");

        let saved = downloader
            .download(
                &server,
                None,
                &database,
                DumpOptions::full(),
                Some("app db nightly"),
            )
            .await
            .unwrap();
        assert_eq!(saved.filename, "app_db_nightly.sql");
        assert_eq!(saved.path, dir.path().join("app_db_nightly.sql"));

        assert_eq!(
            *api.requested.lock().unwrap(),
            vec![Some("3f9c2a7d1b4e".to_string()), None, None]
        );
    }

    #[tokio::test]
    async fn test_file_sink_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("dumps"));

        let first = sink.save("srv1_pg1_app_full_x.sql", b"one").await.unwrap();
        let second = sink.save("srv1_pg1_app_full_x.sql", b"two").await.unwrap();

        assert_eq!(first.file_name().unwrap(), "srv1_pg1_app_full_x.sql");
        assert_eq!(second.file_name().unwrap(), "srv1_pg1_app_full_x-1.sql");
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }
}
