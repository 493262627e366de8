//! # bodyfuel
//!
//! Runs the workout generation scheduler and the task executor against
//! in-memory storage seeded with demo data.
//!
//! Usage:
//!   bodyfuel                              # run until Ctrl-C
//!   bodyfuel --config bodyfuel.toml       # load settings from TOML
//!   bodyfuel --interval-secs 5 --run-for-secs 30 --verbose

mod config;
mod seed;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bodyfuel_core::app::{ProfileService, TaskExecutor, WorkoutScheduler};
use bodyfuel_core::impls::{InMemoryStore, InMemoryTransactionManager, LoggingNotificationSender};
use bodyfuel_core::ports::{Clock, IdGenerator, SystemClock, TransactionManager, UlidGenerator};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "bodyfuel", version, about = "BodyFuel workout generator")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the scheduler interval
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    run_for_secs: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct UserSummary {
    username: String,
    workouts: usize,
    latest_prediction_calories: Option<u32>,
    latest_exercises: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(interval) = cli.interval_secs {
        config.scheduler.interval_secs = interval;
    }

    let filter = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let store = InMemoryStore::new();
    let repos = InMemoryStore::repositories(&store);
    let tx: Arc<dyn TransactionManager> = Arc::new(InMemoryTransactionManager::new(Arc::clone(&store)));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(SystemClock));

    let profile = ProfileService::new(repos.clone(), Arc::clone(&tx), Arc::clone(&clock), Arc::clone(&ids));
    let users = seed::seed(&profile).await.context("seed demo data")?;

    let scheduler = WorkoutScheduler::new(
        repos.clone(),
        Arc::clone(&tx),
        Arc::clone(&clock),
        Arc::clone(&ids),
        config.scheduler.clone(),
    )
    .with_analyzer(config.analyzer.clone())
    .with_selector(config.selector.clone());

    // first pass right away so the demo has something to show
    let report = scheduler.run_tick().await;
    tracing::info!(
        processed = report.processed,
        generated = report.generated,
        skipped = report.skipped,
        failed = report.failed,
        "initial tick finished"
    );

    let scheduler = scheduler.start();
    let executor = TaskExecutor::new(
        repos.clone(),
        Arc::clone(&tx),
        Arc::clone(&clock),
        Arc::new(LoggingNotificationSender),
        config.executor.clone(),
    )
    .start();

    match cli.run_for_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                res = tokio::signal::ctrl_c() => res.context("listen for ctrl-c")?,
            }
        }
        None => tokio::signal::ctrl_c().await.context("listen for ctrl-c")?,
    }

    tracing::info!("shutting down");
    scheduler.stop().await;
    executor.stop().await;

    let mut summary = Vec::with_capacity(users.len());
    for user_id in users {
        let user = profile.get_user(user_id).await?;
        let workouts = profile.list_workouts(user_id).await?;
        let latest = workouts.first();
        summary.push(UserSummary {
            username: user.username,
            workouts: workouts.len(),
            latest_prediction_calories: latest.map(|w| w.prediction_calories),
            latest_exercises: latest
                .map(|w| w.exercises.iter().map(|e| format!("{} {}x{}", e.name, e.sets, e.reps)).collect())
                .unwrap_or_default(),
        });
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
