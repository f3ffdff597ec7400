use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use veracode_gateway::config::AppConfig;
use veracode_gateway::errors::{AppError, ConfigError};
use veracode_gateway::logging::init_logging;
use veracode_gateway::{ApiContext, ScanService, VeracodeClient};

/// Veracode 扫描结果网关
#[derive(Parser, Debug)]
#[command(name = "veracode-gateway", version)]
#[command(about = "Query Veracode scan results as JSON, or serve them over HTTP")]
struct Cli {
    /// 配置文件（TOML）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 启动 HTTP 门面
    Serve {
        /// 监听地址，覆盖配置
        #[arg(long)]
        addr: Option<String>,
    },
    /// 列出应用的全部扫描
    Scans {
        #[arg(long)]
        app_id: String,
    },
    /// 获取指定扫描的报告
    Report {
        #[arg(long)]
        app_id: String,
        #[arg(long)]
        scan_id: String,
    },
    /// 获取最新扫描的报告
    Latest {
        #[arg(long)]
        app_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    let mut logging = config.logging.to_logging_config();
    if cli.verbose {
        logging = logging.verbose();
    }
    init_logging(logging)?;

    match cli.command {
        Command::Serve { addr } => serve(config, addr).await,
        Command::Scans { app_id } => {
            let service = service_for(&config, app_id)?;
            print_json(&service.list_scans().await?)
        }
        Command::Report { app_id, scan_id } => {
            let service = service_for(&config, app_id)?;
            print_json(&service.report(&scan_id).await?)
        }
        Command::Latest { app_id } => {
            let service = service_for(&config, app_id)?;
            print_json(&service.latest_report().await?)
        }
    }
}

#[cfg(feature = "server")]
async fn serve(config: AppConfig, addr: Option<String>) -> Result<(), AppError> {
    use std::sync::Arc;
    use veracode_gateway::server::{self, AppState};

    let addr = addr.unwrap_or_else(|| config.server.addr.clone());
    let addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| ConfigError::Other(format!("Invalid addr {}: {}", addr, e)))?;

    let state = Arc::new(AppState::new(config.veracode)?);
    server::serve(state, addr).await
}

#[cfg(not(feature = "server"))]
async fn serve(_config: AppConfig, _addr: Option<String>) -> Result<(), AppError> {
    Err(AppError::Generic(
        "HTTP facade not compiled in; rebuild with the 'server' feature".to_string(),
    ))
}

/// Credentials come from configuration; Ctrl-C aborts the in-flight request.
fn service_for(config: &AppConfig, app_id: String) -> Result<ScanService<VeracodeClient>, AppError> {
    let credentials = config.veracode.credentials()?;
    let context = ApiContext::new(credentials, app_id);

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling request");
            trigger.cancel();
        }
    });

    let client = VeracodeClient::from_config(&config.veracode, context)?.with_cancellation(token);
    Ok(ScanService::new(client))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Generic(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
