//! Job handlers for the scheduled pipeline
//!
//! Each handler returns a `JobOutcome` on success. Errors propagate to the
//! runtime wrapper which records them; nothing here catches a job-level error.

use crate::alerts::AlertEvaluator;
use crate::analysis::intraday::refresh_all;
use crate::analysis::metrics::MetricsComputer;
use crate::error::{PipelineError, Result};
use crate::jobs::context::JobContext;
use crate::jobs::types::{JobName, JobOutcome};
use crate::portfolio::custom::revalue;
use crate::portfolio::lifecycle::PortfolioRotation;
use crate::portfolio::selector::PortfolioSelector;
use crate::portfolio::tracker::update_performance;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Dispatch a job by name
pub async fn run_job(job: JobName, ctx: &JobContext) -> Result<JobOutcome> {
    match job {
        JobName::IntradayStockUpdate => handle_intraday_update(ctx).await,
        JobName::DailyStockAnalysis => handle_daily_analysis(ctx).await,
        JobName::DailyPerformanceUpdate => handle_performance_update(ctx).await,
        JobName::MonthlyPortfolioCreation => handle_portfolio_creation(ctx).await,
        JobName::PriceAlertChecks => handle_alert_checks(ctx).await,
        JobName::CustomPortfolioValuation => handle_custom_valuation(ctx).await,
    }
}

async fn live_prices(ctx: &JobContext, tickers: Vec<String>) -> Result<HashMap<String, f64>> {
    if tickers.is_empty() {
        return Ok(HashMap::new());
    }
    let quotes = ctx.market_data.get_quotes(&tickers).await?;
    Ok(quotes
        .iter()
        .filter_map(|q| q.live_price().map(|p| (q.symbol.clone(), p)))
        .collect())
}

/// Intraday refresh of stored metrics from live quotes; market hours only
pub async fn handle_intraday_update(ctx: &JobContext) -> Result<JobOutcome> {
    let now = ctx.now();
    if !ctx.session.is_open_at(now) {
        info!("IntradayStockUpdate: market is closed, skipping");
        return Ok(JobOutcome::Skipped("market closed".into()));
    }

    let stored = ctx.store.list_stock_metrics().await?;
    if stored.is_empty() {
        info!("IntradayStockUpdate: no stocks stored yet, nothing to refresh");
        return Ok(JobOutcome::Completed("no stocks to update".into()));
    }

    let tickers: Vec<String> = stored.iter().map(|s| s.ticker.clone()).collect();
    let quotes = ctx.market_data.get_quotes(&tickers).await?;
    if quotes.is_empty() {
        warn!(tickers = tickers.len(), "IntradayStockUpdate: no live quotes returned, aborting update");
        return Ok(JobOutcome::Completed("no live quotes".into()));
    }

    let updates = refresh_all(&stored, &quotes, now);
    let skipped = stored.len() - updates.len();
    let written = ctx.store.apply_intraday_updates(&updates).await?;

    if let Some(ref metrics) = ctx.metrics {
        metrics.tickers_processed_total.inc_by(written as u64);
        metrics.tickers_skipped_total.inc_by(skipped as u64);
    }
    info!(
        updated = written,
        skipped = skipped,
        "IntradayStockUpdate: refreshed {} stocks ({} without a usable quote)",
        written,
        skipped
    );
    Ok(JobOutcome::Completed(format!(
        "updated {} stocks, {} skipped",
        written, skipped
    )))
}

/// Full recompute over the configured universe
pub async fn handle_daily_analysis(ctx: &JobContext) -> Result<JobOutcome> {
    if ctx.universe.is_empty() {
        warn!("DailyStockAnalysis: universe is empty, nothing to analyse");
        return Ok(JobOutcome::Completed("empty universe".into()));
    }

    let now = ctx.now();
    let today = ctx.session.local_date(now);
    let computer = MetricsComputer::new(
        ctx.market_data.clone(),
        ctx.benchmark_ticker.clone(),
        ctx.concurrency,
    );
    let run = computer.compute_universe(&ctx.universe, now, today).await;

    if let Some(ref metrics) = ctx.metrics {
        metrics.tickers_processed_total.inc_by(run.records.len() as u64);
        metrics.tickers_skipped_total.inc_by(run.failures.len() as u64);
    }

    if run.records.is_empty() {
        return Err(PipelineError::MarketData(format!(
            "all {} tickers failed",
            run.failures.len()
        )));
    }

    let computed = run.records.len();
    let failed = run.failures.len();
    ctx.store.upsert_stock_metrics(run.records).await?;
    info!(
        computed = computed,
        failed = failed,
        benchmark_perf_1y = run.benchmark_perf_1y,
        "DailyStockAnalysis: stored metrics for {} stocks ({} skipped)",
        computed,
        failed
    );
    Ok(JobOutcome::Completed(format!(
        "analysed {} stocks, {} skipped",
        computed, failed
    )))
}

/// Mark every stored portfolio to market and write today's history point
pub async fn handle_performance_update(ctx: &JobContext) -> Result<JobOutcome> {
    let portfolios = ctx.store.list_portfolios().await?;
    if portfolios.is_empty() {
        info!("DailyPerformanceUpdate: no portfolios to update");
        return Ok(JobOutcome::Completed("no portfolios".into()));
    }

    let tickers: BTreeSet<String> = portfolios.iter().flat_map(|p| p.tickers()).collect();
    let prices = live_prices(ctx, tickers.into_iter().collect()).await?;
    let today = ctx.session.local_date(ctx.now());

    for mut portfolio in portfolios.iter().cloned() {
        update_performance(&mut portfolio, &prices, today);
        debug!(
            portfolio = %portfolio.name,
            value = portfolio.current_value,
            return_pct = portfolio.current_return,
            "DailyPerformanceUpdate: updated '{}'",
            portfolio.name
        );
        ctx.store.save_portfolio(&portfolio).await?;
    }

    info!(count = portfolios.len(), "DailyPerformanceUpdate: updated {} portfolios", portfolios.len());
    Ok(JobOutcome::Completed(format!(
        "updated {} portfolios",
        portfolios.len()
    )))
}

/// Build this period's strategy portfolios and rotate them in
pub async fn handle_portfolio_creation(ctx: &JobContext) -> Result<JobOutcome> {
    let stocks = ctx.store.list_stock_metrics().await?;
    if stocks.is_empty() {
        info!("MonthlyPortfolioCreation: no stock metrics stored, skipping");
        return Ok(JobOutcome::Completed("no stock metrics".into()));
    }

    let now = ctx.now();
    let period = ctx.session.local_date(now);
    let selector = PortfolioSelector::new(ctx.market_data.clone(), ctx.concurrency);
    let incoming = selector.build(&stocks, now, period).await;

    let existing = ctx.store.list_portfolios().await?;
    let rotation = PortfolioRotation::plan(&existing, incoming);
    rotation.verify()?;
    ctx.store.apply_rotation(&rotation).await?;

    let names: Vec<&str> = rotation.activated.iter().map(|p| p.name.as_str()).collect();
    info!(
        activated = ?names,
        superseded = rotation.superseded.len(),
        "MonthlyPortfolioCreation: activated {} portfolios",
        names.len()
    );
    Ok(JobOutcome::Completed(format!(
        "activated {}, superseded {}",
        names.len(),
        rotation.superseded.len()
    )))
}

/// Evaluate active price alerts; market hours only
pub async fn handle_alert_checks(ctx: &JobContext) -> Result<JobOutcome> {
    let now = ctx.now();
    if !ctx.session.is_open_at(now) {
        info!("PriceAlertChecks: market is closed, skipping");
        return Ok(JobOutcome::Skipped("market closed".into()));
    }

    let evaluator = AlertEvaluator::new(
        ctx.store.clone(),
        ctx.market_data.clone(),
        ctx.notifier.clone(),
        ctx.currency_symbol.clone(),
    );
    let run = evaluator.evaluate(now).await?;

    if let Some(ref metrics) = ctx.metrics {
        metrics.alerts_fired_total.inc_by(run.fired as u64);
    }
    Ok(JobOutcome::Completed(format!(
        "checked {}, fired {}",
        run.checked, run.fired
    )))
}

/// Revalue every active custom portfolio from its open trades
pub async fn handle_custom_valuation(ctx: &JobContext) -> Result<JobOutcome> {
    let portfolios: Vec<_> = ctx
        .store
        .list_custom_portfolios()
        .await?
        .into_iter()
        .filter(|p| p.active)
        .collect();
    if portfolios.is_empty() {
        return Ok(JobOutcome::Completed("no custom portfolios".into()));
    }

    let mut open_trades = Vec::with_capacity(portfolios.len());
    for portfolio in &portfolios {
        let trades: Vec<_> = ctx
            .store
            .trades_for(portfolio.id)
            .await?
            .into_iter()
            .filter(|t| t.is_open())
            .collect();
        open_trades.push(trades);
    }

    let tickers: BTreeSet<String> = open_trades
        .iter()
        .flatten()
        .map(|t| t.ticker.clone())
        .collect();
    let prices = live_prices(ctx, tickers.into_iter().collect()).await?;
    let today = ctx.session.local_date(ctx.now());

    for (mut portfolio, trades) in portfolios.into_iter().zip(open_trades.iter()) {
        revalue(&mut portfolio, trades, &prices, today);
        ctx.store.save_custom_portfolio(&portfolio).await?;
    }

    info!(count = open_trades.len(), "CustomPortfolioValuation: revalued {} portfolios", open_trades.len());
    Ok(JobOutcome::Completed(format!(
        "revalued {} portfolios",
        open_trades.len()
    )))
}
