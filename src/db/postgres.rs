//! PostgreSQL-backed store
//!
//! Each entity is kept as a JSONB document next to the columns that are
//! filtered or indexed on (ticker, strategy, active flag). Bulk metrics
//! upserts and portfolio rotations each run in a single transaction.

use crate::db::store::Store;
use crate::error::{PipelineError, Result};
use crate::models::{
    CustomPortfolio, IntradayUpdate, ModelPortfolio, PriceAlert, StockMetrics, Trade,
};
use crate::portfolio::lifecycle::PortfolioRotation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::types::Json;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS stock_metrics (
        ticker TEXT PRIMARY KEY,
        momentum_score DOUBLE PRECISION NOT NULL,
        alpha DOUBLE PRECISION NOT NULL,
        last_refreshed TIMESTAMPTZ NOT NULL,
        data JSONB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS model_portfolios (
        name TEXT PRIMARY KEY,
        strategy TEXT NOT NULL,
        active BOOLEAN NOT NULL,
        generated_at TIMESTAMPTZ NOT NULL,
        data JSONB NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS model_portfolios_strategy_active
        ON model_portfolios (strategy, active)",
    "CREATE TABLE IF NOT EXISTS price_alerts (
        id UUID PRIMARY KEY,
        ticker TEXT NOT NULL,
        active BOOLEAN NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        data JSONB NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS price_alerts_active_ticker ON price_alerts (active, ticker)",
    "CREATE TABLE IF NOT EXISTS custom_portfolios (
        id UUID PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL,
        data JSONB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS trades (
        id UUID PRIMARY KEY,
        portfolio_id UUID NOT NULL,
        trade_date DATE NOT NULL,
        data JSONB NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS trades_portfolio ON trades (portfolio_id)",
];

const UPSERT_STOCK: &str = "INSERT INTO stock_metrics (ticker, momentum_score, alpha, last_refreshed, data)
     VALUES ($1, $2, $3, $4, $5)
     ON CONFLICT (ticker) DO UPDATE SET
        momentum_score = EXCLUDED.momentum_score,
        alpha = EXCLUDED.alpha,
        last_refreshed = EXCLUDED.last_refreshed,
        data = EXCLUDED.data";

const UPSERT_PORTFOLIO: &str = "INSERT INTO model_portfolios (name, strategy, active, generated_at, data)
     VALUES ($1, $2, $3, $4, $5)
     ON CONFLICT (name) DO UPDATE SET
        strategy = EXCLUDED.strategy,
        active = EXCLUDED.active,
        generated_at = EXCLUDED.generated_at,
        data = EXCLUDED.data";

pub struct PostgresStore {
    client: Arc<RwLock<Client>>,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| PipelineError::Storage(format!("Failed to connect to database: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Database connection error");
            }
        });

        let store = Self {
            client: Arc::new(RwLock::new(client)),
        };
        store.init_schema().await?;
        info!("Database schema ready");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let client = self.client.read().await;
        for statement in SCHEMA {
            client.batch_execute(statement).await.map_err(|e| {
                PipelineError::Storage(format!("Failed to initialise schema: {}", e))
            })?;
        }
        Ok(())
    }

    async fn query_docs<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Vec<T>> {
        let client = self.client.read().await;
        let rows = client.query(sql, params).await?;
        rows.iter().map(doc).collect()
    }
}

fn doc<T: DeserializeOwned>(row: &Row) -> Result<T> {
    let Json(value): Json<T> = row
        .try_get("data")
        .map_err(|e| PipelineError::Storage(format!("Failed to decode row: {}", e)))?;
    Ok(value)
}

#[async_trait]
impl Store for PostgresStore {
    async fn upsert_stock_metrics(&self, records: Vec<StockMetrics>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut client = self.client.write().await;
        let tx = client.transaction().await?;
        let statement = tx.prepare(UPSERT_STOCK).await?;
        for record in &records {
            tx.execute(
                &statement,
                &[
                    &record.ticker,
                    &record.momentum_score,
                    &record.alpha,
                    &record.last_refreshed,
                    &Json(record),
                ],
            )
            .await?;
        }
        tx.commit().await?;
        debug!(count = records.len(), "Upserted {} stock metrics", records.len());
        Ok(records.len())
    }

    async fn list_stock_metrics(&self) -> Result<Vec<StockMetrics>> {
        self.query_docs("SELECT data FROM stock_metrics ORDER BY ticker", &[])
            .await
    }

    async fn get_stock_metrics(&self, ticker: &str) -> Result<Option<StockMetrics>> {
        Ok(self
            .query_docs("SELECT data FROM stock_metrics WHERE ticker = $1", &[&ticker])
            .await?
            .into_iter()
            .next())
    }

    async fn apply_intraday_updates(&self, updates: &[IntradayUpdate]) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        let tickers: Vec<&str> = updates.iter().map(|u| u.ticker.as_str()).collect();

        let mut client = self.client.write().await;
        let tx = client.transaction().await?;
        let rows = tx
            .query(
                "SELECT data FROM stock_metrics WHERE ticker = ANY($1) FOR UPDATE",
                &[&tickers],
            )
            .await?;
        let statement = tx.prepare(UPSERT_STOCK).await?;

        let mut touched = 0;
        for row in &rows {
            let mut stock: StockMetrics = doc(row)?;
            if let Some(update) = updates.iter().find(|u| u.ticker == stock.ticker) {
                update.apply_to(&mut stock);
                tx.execute(
                    &statement,
                    &[
                        &stock.ticker,
                        &stock.momentum_score,
                        &stock.alpha,
                        &stock.last_refreshed,
                        &Json(&stock),
                    ],
                )
                .await?;
                touched += 1;
            }
        }
        tx.commit().await?;
        Ok(touched)
    }

    async fn list_portfolios(&self) -> Result<Vec<ModelPortfolio>> {
        self.query_docs(
            "SELECT data FROM model_portfolios ORDER BY generated_at, name",
            &[],
        )
        .await
    }

    async fn get_portfolio(&self, name: &str) -> Result<Option<ModelPortfolio>> {
        Ok(self
            .query_docs("SELECT data FROM model_portfolios WHERE name = $1", &[&name])
            .await?
            .into_iter()
            .next())
    }

    async fn save_portfolio(&self, portfolio: &ModelPortfolio) -> Result<()> {
        let client = self.client.read().await;
        client
            .execute(
                UPSERT_PORTFOLIO,
                &[
                    &portfolio.name,
                    &portfolio.strategy.as_str(),
                    &portfolio.is_active(),
                    &portfolio.generated_at,
                    &Json(portfolio),
                ],
            )
            .await?;
        Ok(())
    }

    async fn apply_rotation(&self, rotation: &PortfolioRotation) -> Result<()> {
        if rotation.is_noop() {
            return Ok(());
        }
        let mut client = self.client.write().await;
        let tx = client.transaction().await?;
        let superseded = tx
            .execute(
                "UPDATE model_portfolios
                 SET active = false, data = jsonb_set(data, '{status}', '\"Superseded\"')
                 WHERE active = true",
                &[],
            )
            .await?;
        let statement = tx.prepare(UPSERT_PORTFOLIO).await?;
        for portfolio in &rotation.activated {
            tx.execute(
                &statement,
                &[
                    &portfolio.name,
                    &portfolio.strategy.as_str(),
                    &portfolio.is_active(),
                    &portfolio.generated_at,
                    &Json(portfolio),
                ],
            )
            .await?;
        }
        tx.commit().await?;
        info!(
            superseded = superseded,
            activated = rotation.activated.len(),
            "Portfolio rotation committed"
        );
        Ok(())
    }

    async fn create_alert(&self, alert: PriceAlert) -> Result<()> {
        let client = self.client.read().await;
        client
            .execute(
                "INSERT INTO price_alerts (id, ticker, active, created_at, data)
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &alert.id,
                    &alert.ticker,
                    &alert.active,
                    &alert.created_at,
                    &Json(&alert),
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_alerts(&self) -> Result<Vec<PriceAlert>> {
        self.query_docs("SELECT data FROM price_alerts ORDER BY created_at", &[])
            .await
    }

    async fn active_alerts(&self) -> Result<Vec<PriceAlert>> {
        self.query_docs(
            "SELECT data FROM price_alerts WHERE active = true ORDER BY created_at",
            &[],
        )
        .await
    }

    async fn deactivate_alert(&self, id: Uuid, triggered_at: DateTime<Utc>) -> Result<bool> {
        let client = self.client.read().await;
        let triggered = triggered_at.to_rfc3339();
        let updated = client
            .execute(
                "UPDATE price_alerts
                 SET active = false,
                     data = jsonb_set(jsonb_set(data, '{active}', 'false'),
                                      '{triggered_at}', to_jsonb($2::text))
                 WHERE id = $1 AND active = true",
                &[&id, &triggered],
            )
            .await?;
        Ok(updated == 1)
    }

    async fn save_custom_portfolio(&self, portfolio: &CustomPortfolio) -> Result<()> {
        let client = self.client.read().await;
        client
            .execute(
                "INSERT INTO custom_portfolios (id, created_at, data) VALUES ($1, $2, $3)
                 ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data",
                &[&portfolio.id, &portfolio.created_at, &Json(portfolio)],
            )
            .await?;
        Ok(())
    }

    async fn get_custom_portfolio(&self, id: Uuid) -> Result<Option<CustomPortfolio>> {
        Ok(self
            .query_docs("SELECT data FROM custom_portfolios WHERE id = $1", &[&id])
            .await?
            .into_iter()
            .next())
    }

    async fn list_custom_portfolios(&self) -> Result<Vec<CustomPortfolio>> {
        self.query_docs("SELECT data FROM custom_portfolios ORDER BY created_at", &[])
            .await
    }

    async fn save_trade(&self, trade: &Trade) -> Result<()> {
        let client = self.client.read().await;
        client
            .execute(
                "INSERT INTO trades (id, portfolio_id, trade_date, data) VALUES ($1, $2, $3, $4)
                 ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data",
                &[&trade.id, &trade.portfolio_id, &trade.trade_date, &Json(trade)],
            )
            .await?;
        Ok(())
    }

    async fn trades_for(&self, portfolio_id: Uuid) -> Result<Vec<Trade>> {
        self.query_docs(
            "SELECT data FROM trades WHERE portfolio_id = $1 ORDER BY trade_date",
            &[&portfolio_id],
        )
        .await
    }
}
