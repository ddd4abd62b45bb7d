//! The scheduled jobs end to end over in-memory collaborators

use super::test_utils::{daily_bars, date, rising_year, utc, RecordingNotifier};
use alphadesk::config::AppConfig;
use alphadesk::core::runtime::{PipelineRuntime, RunReport};
use alphadesk::db::{InMemoryStore, Store};
use alphadesk::jobs::{FixedClock, JobContext, JobName, JobRegistry};
use alphadesk::metrics::Metrics;
use alphadesk::models::{AlertCondition, JobState, PriceAlert, Quote, Strategy};
use alphadesk::portfolio::custom::CustomPortfolios;
use alphadesk::queries::Queries;
use alphadesk::services::StaticMarketData;
use std::sync::Arc;

const UNIVERSE: [&str; 4] = ["AAA.NS", "BBB.NS", "CCC.NS", "DDD.NS"];

struct Pipeline {
    store: Arc<InMemoryStore>,
    source: StaticMarketData,
    notifier: RecordingNotifier,
    metrics: Arc<Metrics>,
    runtime: PipelineRuntime,
}

impl Pipeline {
    async fn new() -> Self {
        let today = date(2025, 3, 3);
        let source = StaticMarketData::new();
        source.set_bars("^CRSLDX", daily_bars(today, &[100.0, 104.0, 105.0])).await;
        for (i, ticker) in UNIVERSE.iter().enumerate() {
            let step = 0.2 * (i + 1) as f64;
            let bars = rising_year(today, 50.0, step);
            let last = bars.last().map(|b| b.close).unwrap_or(50.0);
            source.set_bars(ticker, bars).await;
            source
                .set_quote(
                    Quote::new(*ticker, last * 1.01)
                        .with_previous_close(last)
                        .with_long_name(format!("{} Industries", ticker))
                        .with_fundamentals(10.0, 25.0),
                )
                .await;
        }

        let mut config = AppConfig::from_lookup(|_| None).expect("config");
        config.universe = UNIVERSE.iter().map(|t| t.to_string()).collect();

        let store = Arc::new(InMemoryStore::new());
        let notifier = RecordingNotifier::new();
        let metrics = Arc::new(Metrics::new().expect("metrics"));
        // Monday 11:30 in Kolkata
        let ctx = JobContext::new(
            &config,
            store.clone(),
            Arc::new(source.clone()),
            Arc::new(notifier.clone()),
            Some(metrics.clone()),
        )
        .with_clock(Arc::new(FixedClock(utc(2025, 3, 3, 6, 0))));
        let runtime = PipelineRuntime::new(Arc::new(ctx), JobRegistry::new());

        Self {
            store,
            source,
            notifier,
            metrics,
            runtime,
        }
    }

    async fn run_ok(&self, job: JobName) {
        let report = self.runtime.run(job).await;
        assert!(
            matches!(report, RunReport::Finished(_)),
            "{} did not finish: {:?}",
            job,
            report
        );
    }
}

#[tokio::test]
async fn daily_cycle_builds_and_tracks_portfolios() {
    let pipeline = Pipeline::new().await;
    let queries = Queries::new(pipeline.store.clone());

    pipeline.run_ok(JobName::DailyStockAnalysis).await;
    let stocks = pipeline.store.list_stock_metrics().await.expect("stocks");
    assert_eq!(stocks.len(), UNIVERSE.len());
    assert!(stocks.iter().all(|s| s.benchmark_perf_1y == 5.0));
    assert!(stocks.iter().all(|s| s.momentum_score == s.recomputed_momentum()));

    pipeline.run_ok(JobName::MonthlyPortfolioCreation).await;
    let active = queries.active_portfolios().await.expect("active");
    assert_eq!(active.len(), 2);
    let momentum = queries
        .active_portfolio(Strategy::Momentum)
        .await
        .expect("query")
        .expect("momentum portfolio");
    assert_eq!(momentum.name, "Momentum Kings - March 2025");
    // fastest riser has the best 6M performance
    assert_eq!(momentum.constituents[0].ticker, "DDD.NS");
    let alpha = queries
        .active_portfolio(Strategy::Alpha)
        .await
        .expect("query")
        .expect("alpha portfolio");
    assert_eq!(alpha.constituents.len(), UNIVERSE.len());

    for ticker in UNIVERSE {
        let quote = Quote::new(ticker, 1_000.0).with_previous_close(990.0);
        pipeline.source.set_quote(quote).await;
    }
    pipeline.run_ok(JobName::DailyPerformanceUpdate).await;
    let tracked = queries
        .active_portfolio(Strategy::Alpha)
        .await
        .expect("query")
        .expect("alpha portfolio");
    assert!(tracked.current_return > 0.0);
    assert!(tracked.peak_return >= tracked.current_return);
    assert_eq!(tracked.history.len(), 1);
    assert_eq!(tracked.history[0].date, date(2025, 3, 3));

    // a second generation in the same month replaces rather than stacks
    pipeline.run_ok(JobName::MonthlyPortfolioCreation).await;
    assert_eq!(queries.active_portfolios().await.expect("active").len(), 2);
    assert_eq!(pipeline.store.list_portfolios().await.expect("all").len(), 2);

    let statuses = pipeline.runtime.statuses().await;
    let ran: Vec<_> = statuses.iter().filter(|s| s.state == JobState::Ok).collect();
    assert_eq!(ran.len(), 3);

    let exported = pipeline.metrics.export().expect("export");
    assert!(exported.contains("alphadesk_job_runs_total"));
}

#[tokio::test]
async fn intraday_alerts_and_custom_valuation() {
    let pipeline = Pipeline::new().await;
    pipeline.run_ok(JobName::DailyStockAnalysis).await;

    pipeline
        .store
        .create_alert(PriceAlert::new("user-1", "AAA.NS", 500.0, AlertCondition::Above, "chat-1"))
        .await
        .expect("alert");
    pipeline
        .store
        .create_alert(PriceAlert::new("user-2", "BBB.NS", 1.0, AlertCondition::Below, "chat-2"))
        .await
        .expect("alert");

    let custom = CustomPortfolios::new(pipeline.store.clone());
    let portfolio = custom.create("Core holdings", "user-1").await.expect("create");
    custom
        .buy(portfolio.id, "AAA.NS", 10.0, 100.0, date(2025, 3, 3))
        .await
        .expect("buy");

    pipeline
        .source
        .set_quote(Quote::new("AAA.NS", 520.0).with_previous_close(500.0))
        .await;

    pipeline.run_ok(JobName::IntradayStockUpdate).await;
    let aaa = pipeline
        .store
        .get_stock_metrics("AAA.NS")
        .await
        .expect("get")
        .expect("stored");
    assert_eq!(aaa.current_price, 520.0);
    assert_eq!(aaa.perf_1d, 4.0);

    pipeline.run_ok(JobName::PriceAlertChecks).await;
    pipeline.run_ok(JobName::PriceAlertChecks).await;
    let sent = pipeline.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "chat-1");
    assert!(sent[0].1.contains("`AAA.NS`"));
    assert_eq!(pipeline.store.active_alerts().await.expect("active").len(), 1);

    pipeline.run_ok(JobName::CustomPortfolioValuation).await;
    let valued = pipeline
        .store
        .get_custom_portfolio(portfolio.id)
        .await
        .expect("get")
        .expect("stored");
    assert_eq!(valued.current_value, 5200.0);
    assert_eq!(valued.overall_return, 4200.0);
    assert!((valued.overall_return_percent - 420.0).abs() < 1e-9);
}
