//! Handler模块

use axum::{
    extract::{Path, Query, State},
    http::{header, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use common::errors::AppError;
use common::models::{Container, Database, DumpOptions, DumpQuery};
use common::response::{ContainerList, DatabaseList, HealthStatus, ServerList, ServerReachability};

use crate::dump;
use crate::state::AppState;

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthStatus)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime: Some(state.started.elapsed().as_secs()),
    })
}

/// 列出所有服务器
#[utoipa::path(
    get,
    path = "/api/v1/servers",
    tag = "servers",
    responses(
        (status = 200, description = "服务器列表", body = ServerList)
    )
)]
pub async fn list_servers(State(state): State<AppState>) -> Json<ServerList> {
    Json(ServerList::new(state.fixtures.servers()))
}

/// 检查服务器是否可达
#[utoipa::path(
    get,
    path = "/api/v1/servers/{server_id}/status",
    tag = "servers",
    params(
        ("server_id" = String, Path, description = "服务器 ID")
    ),
    responses(
        (status = 200, description = "可达性检查结果", body = ServerReachability),
        (status = 404, description = "服务器未找到", body = common::response::ErrorBody)
    )
)]
pub async fn server_status(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> Result<Json<ServerReachability>, AppError> {
    let server = state.fixtures.server(&server_id)?;
    let (status, error) = if server.reachable {
        ("reachable", None)
    } else {
        (
            "unreachable",
            Some(format!("dial tcp {}:{}: connection refused", server.server.host, server.server.port)),
        )
    };
    Ok(Json(ServerReachability {
        server_id,
        status: status.to_string(),
        error,
    }))
}

/// 列出服务器上的 PostgreSQL 容器
#[utoipa::path(
    get,
    path = "/api/v1/servers/{server_id}/containers",
    tag = "containers",
    params(
        ("server_id" = String, Path, description = "服务器 ID")
    ),
    responses(
        (status = 200, description = "容器列表", body = ContainerList),
        (status = 404, description = "服务器未找到", body = common::response::ErrorBody)
    )
)]
pub async fn list_containers(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> Result<Json<ContainerList>, AppError> {
    let containers = state
        .fixtures
        .server(&server_id)?
        .containers
        .iter()
        .map(|c| c.container.clone())
        .collect();
    Ok(Json(ContainerList::new(server_id, containers)))
}

/// 列出容器内的数据库
#[utoipa::path(
    get,
    path = "/api/v1/servers/{server_id}/containers/{container_id}/databases",
    tag = "databases",
    params(
        ("server_id" = String, Path, description = "服务器 ID"),
        ("container_id" = String, Path, description = "容器 ID")
    ),
    responses(
        (status = 200, description = "数据库列表", body = DatabaseList),
        (status = 404, description = "服务器或容器未找到", body = common::response::ErrorBody),
        (status = 500, description = "容器未运行", body = common::response::ErrorBody)
    )
)]
pub async fn list_container_databases(
    State(state): State<AppState>,
    Path((server_id, container_id)): Path<(String, String)>,
) -> Result<Json<DatabaseList>, AppError> {
    let fixture = state.fixtures.container(&server_id, &container_id)?;
    ensure_running(&fixture.container)?;
    let databases = fixture.databases.clone();
    Ok(Json(DatabaseList::for_container(
        server_id,
        container_id,
        databases,
    )))
}

/// 列出主机上直接运行的数据库
#[utoipa::path(
    get,
    path = "/api/v1/servers/{server_id}/host/databases",
    tag = "databases",
    params(
        ("server_id" = String, Path, description = "服务器 ID")
    ),
    responses(
        (status = 200, description = "数据库列表", body = DatabaseList),
        (status = 404, description = "服务器未找到", body = common::response::ErrorBody)
    )
)]
pub async fn list_host_databases(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> Result<Json<DatabaseList>, AppError> {
    let databases = state.fixtures.server(&server_id)?.host_databases.clone();
    Ok(Json(DatabaseList::for_host(server_id, databases)))
}

/// 下载容器内数据库的 dump
#[utoipa::path(
    get,
    path = "/api/v1/servers/{server_id}/containers/{container_id}/databases/{db_name}/dump",
    tag = "dumps",
    params(
        ("server_id" = String, Path, description = "服务器 ID"),
        ("container_id" = String, Path, description = "容器 ID"),
        ("db_name" = String, Path, description = "数据库名"),
        ("data_only" = Option<bool>, Query, description = "仅导出数据"),
        ("schema_only" = Option<bool>, Query, description = "仅导出结构")
    ),
    responses(
        (status = 200, description = "SQL dump", body = String, content_type = "application/sql"),
        (status = 404, description = "服务器、容器或数据库未找到", body = common::response::ErrorBody)
    )
)]
pub async fn container_dump(
    State(state): State<AppState>,
    Path((server_id, container_id, db_name)): Path<(String, String, String)>,
    Query(query): Query<DumpQuery>,
) -> Result<Response, AppError> {
    let container = &state.fixtures.container(&server_id, &container_id)?.container;
    ensure_running(container)?;
    let database = state
        .fixtures
        .container_database(&server_id, &container_id, &db_name)?;

    let scope = format!("container {}", container.name);
    let label: String = container.id.chars().take(8).collect();
    Ok(dump_response(&server_id, &label, &scope, database, query.options()))
}

/// 下载主机数据库的 dump
#[utoipa::path(
    get,
    path = "/api/v1/servers/{server_id}/host/databases/{db_name}/dump",
    tag = "dumps",
    params(
        ("server_id" = String, Path, description = "服务器 ID"),
        ("db_name" = String, Path, description = "数据库名"),
        ("data_only" = Option<bool>, Query, description = "仅导出数据"),
        ("schema_only" = Option<bool>, Query, description = "仅导出结构")
    ),
    responses(
        (status = 200, description = "SQL dump", body = String, content_type = "application/sql"),
        (status = 404, description = "服务器或数据库未找到", body = common::response::ErrorBody)
    )
)]
pub async fn host_dump(
    State(state): State<AppState>,
    Path((server_id, db_name)): Path<(String, String)>,
    Query(query): Query<DumpQuery>,
) -> Result<Response, AppError> {
    let database = state.fixtures.host_database(&server_id, &db_name)?;
    Ok(dump_response(&server_id, "host", "host", database, query.options()))
}

/// 未知路由
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

fn ensure_running(container: &Container) -> Result<(), AppError> {
    if container.status.is_running() {
        return Ok(());
    }
    Err(AppError::Internal(format!(
        "container {} is {}, cannot exec psql",
        container.name, container.status
    )))
}

fn dump_response(
    server_id: &str,
    label: &str,
    scope: &str,
    database: &Database,
    options: DumpOptions,
) -> Response {
    tracing::info!(
        server = server_id,
        scope,
        database = %database.name,
        kind = ?options.kind(),
        "生成 dump"
    );

    let body = dump::render(server_id, scope, database, options, Utc::now());
    let filename = format!("{}_{}_{}.sql", server_id, label, database.name);
    (
        [
            (header::CONTENT_TYPE, "application/sql".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response()
}
