//! Recon orchestrator server: runs migrations, starts the Pipeline
//! Orchestrator's stage-queue subscribers alongside the admin REST API.
//! Grounded on `bin/agentic_server.rs`'s connect-pool -> build-router ->
//! serve shape.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use recon_orchestrator::{init_tracing, OrchestratorConfig};
use recon_pipeline::{HttpxScanService, PipelineOrchestrator, SubfinderScanService};

#[derive(Parser)]
#[command(name = "recon-orchestrator-server")]
#[command(about = "Runs the reconnaissance orchestrator's stage queues and admin API")]
struct Args {
    /// Path to a TOML config file. Falls back to env vars + defaults if absent.
    #[arg(long, env = "RECON_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = match args.config {
        Some(path) => OrchestratorConfig::load(&path)?,
        None => OrchestratorConfig::from_env(),
    };

    tracing::info!(bind_addr = %config.bind_addr, "starting recon orchestrator");

    let pool = recon_store::connect(&config.database_url).await?;
    recon_store::run_migrations(&pool).await?;

    let bus = Arc::new(recon_bus::EventBus::connect(&config.amqp_url).await?);
    let resolver: Arc<dyn recon_core::ToolPathResolver> = Arc::new(config.tool_path_table());

    let mut orchestrator = PipelineOrchestrator::new(bus.clone());
    orchestrator.register(Arc::new(SubfinderScanService {
        pool: pool.clone(),
        resolver: resolver.clone(),
        timeout: Duration::from_secs(recon_core::DEFAULT_TIMEOUT_SECS),
    }));
    orchestrator.register(Arc::new(HttpxScanService {
        pool: pool.clone(),
        resolver: resolver.clone(),
        timeout: Duration::from_secs(recon_core::DEFAULT_TIMEOUT_SECS),
    }));
    let orchestrator = Arc::new(orchestrator);

    let orchestrator_handle = tokio::spawn(orchestrator.run());

    let app = recon_orchestrator::api::create_router(pool)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "admin API listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        result = orchestrator_handle => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}
