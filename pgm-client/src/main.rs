//! `pgm` 命令行入口

use std::process::ExitCode;

use clap::Parser;
use common::config::load_dotenv;
use pgm_client::cli::{self, Cli};
use pgm_client::Session;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();

    // 初始化日志追踪（输出到 stderr，stdout 留给命令结果）
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.downcast_ref::<common::AppError>() {
                Some(app) => eprintln!("error: {}", app.user_message()),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = cli.config()?;
    tracing::debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "配置已加载");

    let session = Session::from_config(&config)?;
    Ok(cli::execute(&session, &cli.command).await?)
}
