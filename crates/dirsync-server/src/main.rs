//! Dirsync - GitLab to identity store reconciliation service

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::Settings;
use dirsync_db::{connect_identity_store, PgAccountRepository};
use dirsync_identity::{DisplayNameExtension, GitLabDirectory, Reconciler};

type GitLabReconciler = Reconciler<GitLabDirectory, PgAccountRepository>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let settings = Settings::load().context("Failed to load configuration")?;

    info!("Starting dirsync v{}", env!("CARGO_PKG_VERSION"));
    info!("Reconciling users from {}", settings.gitlab.host_url);
    if settings.sync.dry_run {
        warn!("Dry run enabled: no accounts will be created or updated");
    }

    let reconciler = initialize_reconciler(&settings).await?;

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    match settings.sync.interval_secs {
        Some(secs) => run_scheduled(&reconciler, Duration::from_secs(secs), shutdown).await,
        None => run_once(&reconciler, shutdown).await,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dirsync=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

async fn initialize_reconciler(settings: &Settings) -> Result<GitLabReconciler> {
    let directory =
        GitLabDirectory::new(settings.gitlab_config()).context("Invalid GitLab configuration")?;

    info!("Connecting to PostgreSQL...");
    let store = connect_identity_store(&settings.database_config())
        .await
        .context("Failed to initialize identity store")?;
    info!("Identity store ready");

    let mut reconciler = Reconciler::with_options(
        Arc::new(directory),
        Arc::new(store),
        settings.reconciler_options(),
    );
    if settings.sync.copy_display_name {
        reconciler = reconciler.with_extension(Arc::new(DisplayNameExtension));
    }

    Ok(reconciler)
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested, finishing in-flight users");
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });
}

async fn run_once(reconciler: &GitLabReconciler, shutdown: CancellationToken) -> Result<()> {
    let report = reconciler
        .reconcile_until(shutdown)
        .await
        .context("Reconciliation pass failed")?;

    info!("Pass finished with status {:?}", report.status());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_scheduled(
    reconciler: &GitLabReconciler,
    period: Duration,
    shutdown: CancellationToken,
) -> Result<()> {
    info!("Running a reconciliation pass every {}s", period.as_secs());
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        // A directory outage fails this pass only; the next tick retries
        if let Err(e) = reconciler.reconcile_until(shutdown.clone()).await {
            error!("Reconciliation pass failed: {}", e);
        }
    }

    info!("Scheduler stopped");
    Ok(())
}
