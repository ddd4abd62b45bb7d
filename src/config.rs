//! Environment-driven configuration
//!
//! Values are read from the process environment (populated from `.env` by the
//! binary). `AppConfig::from_lookup` takes any key lookup so configuration can
//! be built from a map in tests without touching the real environment.

use crate::analysis::session::MarketSession;
use crate::error::{PipelineError, Result};
use crate::jobs::types::JobName;
use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BENCHMARK: &str = "^CRSLDX";
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Get the deployment environment name (`APP_ENV`, default "development")
pub fn get_environment() -> String {
    std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string())
}

/// Cron cadence for every scheduled job, evaluated in the market timezone
#[derive(Debug, Clone)]
pub struct JobSchedules {
    expressions: HashMap<JobName, String>,
}

impl JobSchedules {
    pub fn default_expression(job: JobName) -> &'static str {
        match job {
            JobName::IntradayStockUpdate => "0 */10 * * * *",
            JobName::DailyStockAnalysis => "0 0 17 * * *",
            JobName::DailyPerformanceUpdate => "0 0 2 * * *",
            JobName::MonthlyPortfolioCreation => "0 0 1 1 * *",
            JobName::PriceAlertChecks => "0 */5 * * * *",
            JobName::CustomPortfolioValuation => "0 0 16 * * Mon-Fri",
        }
    }

    pub fn env_key(job: JobName) -> &'static str {
        match job {
            JobName::IntradayStockUpdate => "SCHEDULE_INTRADAY",
            JobName::DailyStockAnalysis => "SCHEDULE_DAILY_ANALYSIS",
            JobName::DailyPerformanceUpdate => "SCHEDULE_PERFORMANCE",
            JobName::MonthlyPortfolioCreation => "SCHEDULE_PORTFOLIO_CREATION",
            JobName::PriceAlertChecks => "SCHEDULE_ALERTS",
            JobName::CustomPortfolioValuation => "SCHEDULE_CUSTOM_VALUATION",
        }
    }

    pub fn expression(&self, job: JobName) -> &str {
        self.expressions
            .get(&job)
            .map(|s| s.as_str())
            .unwrap_or_else(|| Self::default_expression(job))
    }

    pub fn set(&mut self, job: JobName, expression: impl Into<String>) {
        self.expressions.insert(job, expression.into());
    }
}

impl Default for JobSchedules {
    fn default() -> Self {
        let expressions = JobName::all()
            .iter()
            .map(|&job| (job, Self::default_expression(job).to_string()))
            .collect();
        Self { expressions }
    }
}

/// Market-data fetch tuning
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub retries: usize,
    pub quote_batch_size: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrency: 8,
            request_timeout: Duration::from_secs(15),
            retries: 2,
            quote_batch_size: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database_url: Option<String>,
    pub universe: Vec<String>,
    pub benchmark_ticker: String,
    pub session: MarketSession,
    pub schedules: JobSchedules,
    pub fetch: FetchSettings,
    pub yahoo_base_url: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_api_url: String,
    pub currency_symbol: String,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let universe = match (get("UNIVERSE_TICKERS"), get("UNIVERSE_FILE")) {
            (Some(list), _) => parse_ticker_list(&list),
            (None, Some(path)) => {
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    PipelineError::Config(format!("cannot read UNIVERSE_FILE '{}': {}", path, e))
                })?;
                parse_ticker_file(&contents)
            }
            (None, None) => Vec::new(),
        };

        let timezone_name = get("MARKET_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = Tz::from_str(&timezone_name).map_err(|e| {
            PipelineError::Config(format!("MARKET_TIMEZONE '{}': {}", timezone_name, e))
        })?;
        let open = parse_time("MARKET_OPEN", get("MARKET_OPEN").as_deref(), "09:00")?;
        let close = parse_time("MARKET_CLOSE", get("MARKET_CLOSE").as_deref(), "15:40")?;
        if close <= open {
            return Err(PipelineError::Config(format!(
                "MARKET_CLOSE ({}) must be after MARKET_OPEN ({})",
                close, open
            )));
        }
        let days = match get("MARKET_DAYS") {
            Some(raw) => parse_weekdays(&raw)?,
            None => vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        };

        let mut schedules = JobSchedules::default();
        for &job in JobName::all() {
            if let Some(expr) = get(JobSchedules::env_key(job)) {
                cron::Schedule::from_str(&expr).map_err(|e| {
                    PipelineError::Config(format!(
                        "{} '{}' is not a valid cron expression: {}",
                        JobSchedules::env_key(job),
                        expr,
                        e
                    ))
                })?;
                schedules.set(job, expr);
            }
        }

        let defaults = FetchSettings::default();
        let fetch = FetchSettings {
            concurrency: parse_number("FETCH_CONCURRENCY", get("FETCH_CONCURRENCY"), defaults.concurrency)?
                .max(1),
            request_timeout: Duration::from_secs(parse_number(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout.as_secs(),
            )?),
            retries: parse_number("FETCH_RETRIES", get("FETCH_RETRIES"), defaults.retries)?,
            quote_batch_size: parse_number(
                "QUOTE_BATCH_SIZE",
                get("QUOTE_BATCH_SIZE"),
                defaults.quote_batch_size,
            )?
            .max(1),
        };

        Ok(Self {
            environment: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
            database_url: get("DATABASE_URL"),
            universe,
            benchmark_ticker: get("BENCHMARK_TICKER").unwrap_or_else(|| DEFAULT_BENCHMARK.to_string()),
            session: MarketSession::new(timezone, open, close, days),
            schedules,
            fetch,
            yahoo_base_url: get("YAHOO_BASE_URL").unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string()),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_api_url: get("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            currency_symbol: get("CURRENCY_SYMBOL").unwrap_or_else(|| "₹".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

/// Parse a comma separated ticker list, upper-casing and de-duplicating
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    dedup_tickers(raw.split(','))
}

/// Parse a universe file: one ticker per line, `#` starts a comment
pub fn parse_ticker_file(contents: &str) -> Vec<String> {
    dedup_tickers(
        contents
            .lines()
            .map(|line| line.split('#').next().unwrap_or("")),
    )
}

fn dedup_tickers<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn parse_time(key: &str, raw: Option<&str>, default: &str) -> Result<NaiveTime> {
    let value = raw.unwrap_or(default);
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| PipelineError::Config(format!("{} '{}' must be HH:MM: {}", key, value, e)))
}

fn parse_weekdays(raw: &str) -> Result<Vec<Weekday>> {
    raw.split(',')
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .map(|d| {
            Weekday::from_str(d)
                .map_err(|_| PipelineError::Config(format!("MARKET_DAYS: unknown weekday '{}'", d)))
        })
        .collect()
}

fn parse_number<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| PipelineError::Config(format!("{} '{}' is not a valid number", key, value))),
        None => Ok(default),
    }
}
