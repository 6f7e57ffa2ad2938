//! PostgreSQL 管理后端夹具服务
//!
//! 以 JSON 夹具数据实现后端 REST 接口，供本地开发与客户端集成测试使用：
//! - 服务器、容器、数据库列表
//! - 服务器可达性检查
//! - 合成的 SQL dump 下载

pub mod dump;
pub mod fixtures;
pub mod handlers;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::{middleware, routing::get, Json, Router};
use common::errors::AppResult;
use common::middleware::request_id::request_id_middleware;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use fixtures::Fixtures;
pub use state::AppState;

pub const SERVICE_NAME: &str = "mock-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PostgreSQL 管理后端 API",
        version = "0.1.0",
        description = "服务器/容器/数据库浏览与 dump 下载"
    ),
    paths(
        handlers::health_check,
        handlers::list_servers,
        handlers::server_status,
        handlers::list_containers,
        handlers::list_container_databases,
        handlers::list_host_databases,
        handlers::container_dump,
        handlers::host_dump,
    ),
    components(schemas(
        common::models::Server,
        common::models::ServerStatus,
        common::models::Container,
        common::models::ContainerStatus,
        common::models::Database,
        common::response::ServerList,
        common::response::ContainerList,
        common::response::DatabaseList,
        common::response::HealthStatus,
        common::response::ServerReachability,
        common::response::ErrorBody,
    )),
    tags(
        (name = "servers", description = "服务器端点"),
        (name = "containers", description = "容器端点"),
        (name = "databases", description = "数据库端点"),
        (name = "dumps", description = "dump 下载端点"),
        (name = "health", description = "健康检查端点")
    )
)]
pub struct ApiDoc;

/// 创建带中间件的完整路由
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router(state.clone()))
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback(handlers::not_found)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// A service instance running in the background on a local port.
pub struct MockServer {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub base_url: String,
    pub addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
}

impl MockServer {
    /// Binds `127.0.0.1:0` and serves `router` until stopped.
    pub async fn start(router: Router) -> AppResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "夹具服务异常退出");
            }
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            addr,
            shutdown_tx,
        })
    }

    /// Serves the full application over `state`.
    pub async fn with_state(state: AppState) -> AppResult<Self> {
        Self::start(create_router(state)).await
    }

    pub fn stop(self) {
        let _ = self.shutdown_tx.send(());
    }
}
