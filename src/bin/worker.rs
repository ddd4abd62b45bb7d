//! AlphaDesk Worker
//!
//! Runs the scheduled analysis and portfolio jobs. With a job name argument
//! (e.g. `worker daily-analysis`) it runs that job once and exits.

use alphadesk::config::AppConfig;
use alphadesk::core::runtime::{PipelineRuntime, RunReport};
use alphadesk::core::scheduler::JobScheduler;
use alphadesk::db::{InMemoryStore, PostgresStore, Store};
use alphadesk::jobs::{JobContext, JobName, JobRegistry};
use alphadesk::logging;
use alphadesk::metrics::Metrics;
use alphadesk::services::{
    LogNotifier, MarketDataSource, NotificationSender, TelegramNotifier, YahooFinanceClient,
};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = AppConfig::from_env()?;
    info!("Starting AlphaDesk Worker");
    info!(environment = %config.environment, "Environment");

    if config.universe.is_empty() {
        warn!("No universe configured (UNIVERSE_TICKERS / UNIVERSE_FILE) - daily analysis will be a no-op");
    } else {
        info!(tickers = config.universe.len(), "Universe: {} tickers", config.universe.len());
    }

    let metrics = Arc::new(Metrics::new()?);

    let store: Arc<dyn Store> = match config.database_url {
        Some(ref url) => {
            info!("Connecting to database...");
            let store = PostgresStore::connect(url).await?;
            info!("Database connected");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set - using in-memory store, state is lost on exit");
            Arc::new(InMemoryStore::new())
        }
    };

    let market_data: Arc<dyn MarketDataSource> = Arc::new(YahooFinanceClient::new(
        config.yahoo_base_url.clone(),
        config.fetch.clone(),
    )?);

    let notifier: Arc<dyn NotificationSender> = match config.telegram_bot_token {
        Some(ref token) => Arc::new(TelegramNotifier::new(
            config.telegram_api_url.clone(),
            token.clone(),
            config.fetch.request_timeout,
        )?),
        None => {
            warn!("TELEGRAM_BOT_TOKEN not set - alert notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };
    info!(notifier = notifier.name(), "Notification channel: {}", notifier.name());

    let context = Arc::new(JobContext::new(
        &config,
        store,
        market_data,
        notifier,
        Some(metrics.clone()),
    ));
    let runtime = PipelineRuntime::new(context, JobRegistry::new());

    // One-shot mode
    if let Some(arg) = env::args().nth(1) {
        let job = JobName::parse(&arg).ok_or_else(|| {
            let known: Vec<&str> = JobName::all().iter().map(|j| j.slug()).collect();
            format!("Unknown job '{}'. Known jobs: {}", arg, known.join(", "))
        })?;
        return match runtime.run(job).await {
            RunReport::Finished(outcome) => {
                info!(job = %job, outcome = %outcome.summary(), "Job finished");
                Ok(())
            }
            RunReport::Failed(message) => Err(format!("{} failed: {}", job, message).into()),
            RunReport::AlreadyRunning => Err(format!("{} is already running", job).into()),
        };
    }

    info!("Starting job scheduler...");
    let scheduler = JobScheduler::new(runtime.clone(), &config.schedules, config.session.timezone())?;
    scheduler.start().await;

    info!("Worker started, waiting for shutdown signal...");
    signal::ctrl_c().await?;
    info!("Shutting down worker...");
    scheduler.stop().await;
    for status in runtime.statuses().await {
        info!(job = %status.name, state = %status.state, "Final status");
    }
    if let Ok(text) = metrics.export() {
        info!(bytes = text.len(), "Metrics at shutdown:\n{}", text);
    }
    info!("Worker stopped");

    Ok(())
}
