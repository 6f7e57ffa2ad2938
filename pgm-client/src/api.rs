//! Typed backend API.

use async_trait::async_trait;
use common::config::ClientConfig;
use common::errors::AppResult;
use common::models::{Container, Database, DumpOptions, Server};
use common::response::{ContainerList, DatabaseList, HealthStatus, ServerList, ServerReachability};

use crate::endpoints::{self, PathParams};
use crate::http::{HttpClient, RequestOptions};

/// Backend operations used by the session and the CLI.
#[async_trait]
pub trait ManagerApi: Send + Sync {
    /// `GET /health`.
    async fn health(&self) -> AppResult<HealthStatus>;

    /// Lists configured servers.
    async fn list_servers(&self) -> AppResult<Vec<Server>>;

    /// Probes whether a server is reachable.
    async fn server_status(&self, server_id: &str) -> AppResult<ServerReachability>;

    /// Lists PostgreSQL containers on a server.
    async fn list_containers(&self, server_id: &str) -> AppResult<Vec<Container>>;

    /// Lists databases inside a container.
    async fn list_databases(&self, server_id: &str, container_id: &str)
        -> AppResult<Vec<Database>>;

    /// Lists databases running directly on the host.
    async fn list_host_databases(&self, server_id: &str) -> AppResult<Vec<Database>>;

    /// Downloads a dump. `container_id` selects the container-scoped
    /// endpoint; `None` selects the host-scoped one.
    async fn dump(
        &self,
        server_id: &str,
        container_id: Option<&str>,
        database: &str,
        options: DumpOptions,
    ) -> AppResult<Vec<u8>>;
}

/// [`ManagerApi`] over HTTP.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
}

impl ApiClient {
    /// Creates a client from configuration.
    pub fn new(config: &ClientConfig) -> AppResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[async_trait]
impl ManagerApi for ApiClient {
    async fn health(&self) -> AppResult<HealthStatus> {
        self.http
            .request_json(endpoints::HEALTH, &PathParams::none(), RequestOptions::get())
            .await
    }

    async fn list_servers(&self) -> AppResult<Vec<Server>> {
        let list: ServerList = self
            .http
            .request_json(endpoints::SERVERS, &PathParams::none(), RequestOptions::get())
            .await?;
        Ok(list.servers)
    }

    async fn server_status(&self, server_id: &str) -> AppResult<ServerReachability> {
        self.http
            .request_json(
                endpoints::SERVER_STATUS,
                &PathParams::none().server(server_id),
                RequestOptions::get(),
            )
            .await
    }

    async fn list_containers(&self, server_id: &str) -> AppResult<Vec<Container>> {
        let list: ContainerList = self
            .http
            .request_json(
                endpoints::CONTAINERS,
                &PathParams::none().server(server_id),
                RequestOptions::get(),
            )
            .await?;
        Ok(list.containers)
    }

    async fn list_databases(
        &self,
        server_id: &str,
        container_id: &str,
    ) -> AppResult<Vec<Database>> {
        let list: DatabaseList = self
            .http
            .request_json(
                endpoints::CONTAINER_DATABASES,
                &PathParams::none().server(server_id).container(container_id),
                RequestOptions::get(),
            )
            .await?;
        Ok(list.databases)
    }

    async fn list_host_databases(&self, server_id: &str) -> AppResult<Vec<Database>> {
        let list: DatabaseList = self
            .http
            .request_json(
                endpoints::HOST_DATABASES,
                &PathParams::none().server(server_id),
                RequestOptions::get(),
            )
            .await?;
        Ok(list.databases)
    }

    async fn dump(
        &self,
        server_id: &str,
        container_id: Option<&str>,
        database: &str,
        options: DumpOptions,
    ) -> AppResult<Vec<u8>> {
        let mut request = RequestOptions::get();
        for (key, value) in options.query_pairs() {
            request = request.query(key, value);
        }

        match container_id {
            Some(container_id) => {
                let params = PathParams::none()
                    .server(server_id)
                    .container(container_id)
                    .database(database);
                self.http
                    .request_bytes(endpoints::CONTAINER_DUMP, &params, request)
                    .await
            }
            None => {
                let params = PathParams::none().server(server_id).database(database);
                self.http
                    .request_bytes(endpoints::HOST_DUMP, &params, request)
                    .await
            }
        }
    }
}
