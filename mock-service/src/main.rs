//! PostgreSQL 管理后端夹具服务
//!
//! 读取 `MOCK_FIXTURES` 指定的 JSON 夹具（未设置时使用内置演示数据），
//! 并在 `SERVER_HOST:SERVER_PORT` 上提供后端 REST 接口。

use std::time::Duration;

use common::config::{load_dotenv, AppConfig};
use mock_service::{create_router, AppState, Fixtures, SERVICE_NAME};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);
    let fixtures = Fixtures::from_env()?;
    let latency = std::env::var("MOCK_LATENCY_MS")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_millis)
        .unwrap_or_default();

    info!(
        servers = fixtures.servers.len(),
        latency_ms = latency.as_millis() as u64,
        "夹具已加载"
    );

    // 创建应用状态与路由
    let state = AppState::new(config.clone(), fixtures).with_latency(latency);
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
