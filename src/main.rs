use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use quote_archive::config::{CollectorConfig, LoaderConfig, ServerConfig, StorageConfig};
use quote_archive::db::PgIntradayStore;
use quote_archive::external::alphavantage::AlphaVantageProvider;
use quote_archive::jobs::{collect_quotes_job, load_latest_job};
use quote_archive::logging::{self, LoggingConfig};
use quote_archive::models::InvocationResult;
use quote_archive::services::collector_service::CollectorService;
use quote_archive::services::job_scheduler_service::JobSchedulerService;
use quote_archive::services::loader_service::LoaderService;
use quote_archive::storage::SnapshotArchive;
use quote_archive::{app, AppState};

#[derive(Parser)]
#[command(name = "quote-archive")]
#[command(about = "Archives intraday quotes and loads them into Postgres", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every configured symbol once and archive the raw responses
    Collect,

    /// Load the newest archived snapshot into stock_intraday
    Load,

    /// Serve the HTTP trigger (POST /api/jobs/collect, POST /api/jobs/load)
    Serve {
        /// Also run both jobs on COLLECT_SCHEDULE / LOAD_SCHEDULE
        #[arg(long)]
        schedule: bool,
    },
}

impl Commands {
    fn component(&self) -> &'static str {
        match self {
            Commands::Collect => "collect",
            Commands::Load => "load",
            Commands::Serve { .. } => "serve",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logging::init_logging(LoggingConfig::from_env(cli.command.component())?)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Collect => {
            let archive = SnapshotArchive::from_config(&StorageConfig::from_env()?)?;
            let collector = build_collector(archive)?;
            let result = collect_quotes_job::run(&collector).await;
            report(&result)
        }
        Commands::Load => {
            let archive = SnapshotArchive::from_config(&StorageConfig::from_env()?)?;
            let config = LoaderConfig::from_env()?;
            let store = Arc::new(PgIntradayStore::from_config(&config)?);
            let loader = LoaderService::new(archive, store.clone(), config.interval, config.prefix);

            let result = load_latest_job::run(&loader).await;
            store.close().await;
            report(&result)
        }
        Commands::Serve { schedule } => {
            serve(schedule).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_collector(archive: SnapshotArchive) -> anyhow::Result<CollectorService> {
    let config = CollectorConfig::from_env()?;
    let provider = Arc::new(AlphaVantageProvider::from_config(&config));

    Ok(CollectorService::new(
        provider,
        archive,
        config.symbols,
        config.interval,
    ))
}

/// Prints the result for the caller and maps it to the process exit code.
fn report(result: &InvocationResult) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn serve(schedule: bool) -> anyhow::Result<()> {
    let server = ServerConfig::from_env()?;
    let loader_config = LoaderConfig::from_env()?;

    // One archive for both jobs, so the in-memory backend is shared too.
    let archive = SnapshotArchive::from_config(&StorageConfig::from_env()?)?;
    let collector = build_collector(archive.clone())?;
    let store = Arc::new(PgIntradayStore::from_config(&loader_config)?);
    let loader = LoaderService::new(
        archive,
        store.clone(),
        loader_config.interval,
        loader_config.prefix,
    );

    let state = AppState {
        collector: Arc::new(collector),
        loader: Arc::new(loader),
    };

    let mut scheduler = if schedule {
        let mut scheduler = JobSchedulerService::new(state.clone()).await?;
        scheduler.start(&server).await?;
        Some(scheduler)
    } else {
        None
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("🚀 quote-archive listening at http://{}/", addr);

    axum::serve(listener, app::create_app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.stop().await?;
    }
    store.close().await;

    Ok(())
}
