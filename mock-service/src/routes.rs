//! 夹具服务路由模块

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// 创建路由（`/health` 与 `/api/v1`）
pub fn router(state: AppState) -> Router<AppState> {
    let api = Router::new()
        .route("/servers", get(handlers::list_servers))
        .route("/servers/{server_id}/status", get(handlers::server_status))
        .route(
            "/servers/{server_id}/containers",
            get(handlers::list_containers),
        )
        .route(
            "/servers/{server_id}/containers/{container_id}/databases",
            get(handlers::list_container_databases),
        )
        .route(
            "/servers/{server_id}/containers/{container_id}/databases/{db_name}/dump",
            get(handlers::container_dump),
        )
        .route(
            "/servers/{server_id}/host/databases",
            get(handlers::list_host_databases),
        )
        .route(
            "/servers/{server_id}/host/databases/{db_name}/dump",
            get(handlers::host_dump),
        )
        .route_layer(middleware::from_fn_with_state(state, simulated_latency));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api)
}

/// 模拟网络延迟
async fn simulated_latency(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.latency.is_zero() {
        tokio::time::sleep(state.latency).await;
    }
    next.run(request).await
}
