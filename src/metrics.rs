//! Prometheus metrics for the scheduled pipeline

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub job_runs_total: IntCounterVec,
    pub job_duration_seconds: HistogramVec,
    pub tickers_processed_total: IntCounter,
    pub tickers_skipped_total: IntCounter,
    pub alerts_fired_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("alphadesk".to_string()), None)?;

        let job_runs_total = IntCounterVec::new(
            Opts::new("job_runs_total", "Scheduled job runs by outcome"),
            &["job", "outcome"],
        )?;
        let job_duration_seconds = HistogramVec::new(
            HistogramOpts::new("job_duration_seconds", "Scheduled job wall time")
                .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0]),
            &["job"],
        )?;
        let tickers_processed_total = IntCounter::new(
            "tickers_processed_total",
            "Tickers whose metrics were computed or refreshed",
        )?;
        let tickers_skipped_total = IntCounter::new(
            "tickers_skipped_total",
            "Tickers skipped because of missing or failed data",
        )?;
        let alerts_fired_total =
            IntCounter::new("alerts_fired_total", "Price alerts that crossed their target")?;

        registry.register(Box::new(job_runs_total.clone()))?;
        registry.register(Box::new(job_duration_seconds.clone()))?;
        registry.register(Box::new(tickers_processed_total.clone()))?;
        registry.register(Box::new(tickers_skipped_total.clone()))?;
        registry.register(Box::new(alerts_fired_total.clone()))?;

        Ok(Self {
            registry,
            job_runs_total,
            job_duration_seconds,
            tickers_processed_total,
            tickers_skipped_total,
            alerts_fired_total,
        })
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
