use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use backend::{create_router, AppState, Config, DocumentStore, MemoryStore, RedisStore};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "taskboard", version, about = "REST API for tasks and users")]
struct Cli {
    /// TOML config file (defaults to ./taskboard.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `server.port`
    #[arg(long)]
    port: Option<u16>,

    /// Keep documents in memory instead of Redis
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("taskboard error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let store: Arc<dyn DocumentStore> = if cli.memory {
        tracing::warn!("using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let store = RedisStore::connect(&config.redis.url, config.redis.key_prefix.clone())
            .await
            .with_context(|| format!("failed to connect to Redis at {}", config.redis.url))?;
        Arc::new(store)
    };

    let app = create_router(AppState::new(store, config.query));

    let addr = config.bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, redis = %config.redis.url, memory = cli.memory, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("TASKBOARD_LOG")
        .unwrap_or_else(|_| EnvFilter::new("backend=info,taskboard=info,tower_http=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
