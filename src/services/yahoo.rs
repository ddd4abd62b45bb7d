//! Yahoo Finance backed market data source
//!
//! Daily bars come from the v8 chart endpoint, live quotes from the v7 quote
//! endpoint in batches. Every request carries the configured timeout and is
//! retried with exponential backoff on transport errors, 429 and 5xx.

use crate::config::FetchSettings;
use crate::error::{PipelineError, Result};
use crate::models::{HistoricalBar, Quote};
use crate::services::market_data::MarketDataSource;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use futures_util::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: reqwest::Client,
    base_url: String,
    settings: FetchSettings,
}

impl YahooFinanceClient {
    pub fn new(base_url: impl Into<String>, settings: FetchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
        })
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(self.settings.retries)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let fetch = || async {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await?
                .error_for_status()?;
            response.json::<T>().await
        };

        fetch
            .retry(self.backoff())
            .when(is_retryable)
            .notify(|err: &reqwest::Error, after: Duration| {
                warn!(url = %url, error = %err, "Yahoo request failed, retrying in {:?}", after);
            })
            .await
            .map_err(PipelineError::from)
    }

    async fn fetch_quote_batch(&self, batch: &[String]) -> Result<Vec<Quote>> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        let response: QuoteEnvelope = self
            .get_json(&url, &[("symbols", batch.join(","))])
            .await?;
        Ok(response
            .quote_response
            .result
            .into_iter()
            .map(QuoteRow::into_quote)
            .collect())
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    match err.status() {
        Some(status) => status.is_server_error() || status.as_u16() == 429,
        None => !err.is_decode(),
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn get_historical_bars(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HistoricalBar>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let period1 = day_start_timestamp(from);
        let period2 = day_start_timestamp(to + ChronoDuration::days(1));
        let envelope: ChartEnvelope = self
            .get_json(
                &url,
                &[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1d".to_string()),
                ],
            )
            .await?;

        let result = envelope
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| match envelope.chart.error {
                Some(err) => PipelineError::MarketData(format!(
                    "chart error for {}: {}",
                    ticker, err.description
                )),
                None => PipelineError::MarketData(format!("no chart data for {}", ticker)),
            })?;

        let bars = result.into_bars();
        debug!(ticker = %ticker, count = bars.len(), "Fetched {} daily bars for {}", bars.len(), ticker);
        Ok(bars)
    }

    async fn get_quotes(&self, tickers: &[String]) -> Result<Vec<Quote>> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<&[String]> = tickers.chunks(self.settings.quote_batch_size.max(1)).collect();
        let fetches: Vec<_> = batches
            .iter()
            .enumerate()
            .map(|(idx, batch)| async move { (idx, self.fetch_quote_batch(batch).await) })
            .collect();
        let results: Vec<(usize, Result<Vec<Quote>>)> = stream::iter(fetches)
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut quotes = Vec::with_capacity(tickers.len());
        let mut failed_batches = 0usize;
        for (idx, result) in results {
            match result {
                Ok(batch) => quotes.extend(batch),
                Err(e) => {
                    failed_batches += 1;
                    warn!(batch = idx, size = batches[idx].len(), error = %e, "Quote batch {} failed, omitting", idx);
                }
            }
        }

        if failed_batches == batches.len() {
            return Err(PipelineError::MarketData(format!(
                "all {} quote batches failed",
                failed_batches
            )));
        }
        Ok(quotes)
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Zip the column arrays into bars, dropping rows without a close
    fn into_bars(self) -> Vec<HistoricalBar> {
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        let at = |col: &Vec<Option<f64>>, i: usize| col.get(i).copied().flatten();
        let offset = self.meta.gmtoffset;

        let mut bars: Vec<HistoricalBar> = self
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let close = at(&quote.close, i)?;
                let date = DateTime::<Utc>::from_timestamp(ts + offset, 0)?.date_naive();
                Some(HistoricalBar {
                    date,
                    open: at(&quote.open, i).unwrap_or(close),
                    high: at(&quote.high, i).unwrap_or(close),
                    low: at(&quote.low, i).unwrap_or(close),
                    close,
                    volume: at(&quote.volume, i).unwrap_or(0.0),
                })
            })
            .collect();
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        bars
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<QuoteRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRow {
    symbol: String,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_previous_close: Option<f64>,
    regular_market_change_percent: Option<f64>,
    regular_market_volume: Option<f64>,
    market_cap: Option<f64>,
    fifty_day_average: Option<f64>,
    two_hundred_day_average: Option<f64>,
    fifty_two_week_low: Option<f64>,
    fifty_two_week_high: Option<f64>,
    #[serde(rename = "averageDailyVolume3Month")]
    average_daily_volume_3_month: Option<f64>,
    eps_trailing_twelve_months: Option<f64>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<f64>,
}

impl QuoteRow {
    fn into_quote(self) -> Quote {
        Quote {
            symbol: self.symbol,
            long_name: self.long_name.or(self.short_name),
            price: self.regular_market_price,
            previous_close: self.regular_market_previous_close,
            change_percent: self.regular_market_change_percent,
            volume: self.regular_market_volume,
            market_cap: self.market_cap,
            fifty_day_average: self.fifty_day_average,
            two_hundred_day_average: self.two_hundred_day_average,
            fifty_two_week_low: self.fifty_two_week_low,
            fifty_two_week_high: self.fifty_two_week_high,
            average_volume_3_month: self.average_daily_volume_3_month,
            eps_trailing_twelve_months: self.eps_trailing_twelve_months,
            trailing_pe: self.trailing_pe,
        }
    }
}
