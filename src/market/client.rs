use super::types::{ChartResponse, OptionsResponse};
use super::MarketDataProvider;
use crate::errors::{EngineError, EngineResult};
use crate::state::Contract;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use reqwest::Client;

/// Yahoo-style chart/options REST client. All methods return Result, never panic.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
                .pool_max_idle_per_host(4)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn public_get<T: serde::de::DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "market data request");
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::Network(format!("GET {path}: HTTP {status}: {body}")));
        }

        resp.json::<T>().await.map_err(|e| EngineError::Parse(format!("GET {path}: {e}")))
    }

    async fn chart(&self, query: &str) -> EngineResult<ChartResponse> {
        let resp: ChartResponse = self.public_get(query).await?;
        if let Some(err) = resp.api_error() {
            return Err(EngineError::Parse(format!("chart error: {err}")));
        }
        Ok(resp)
    }

    async fn options(&self, query: &str) -> EngineResult<OptionsResponse> {
        let resp: OptionsResponse = self.public_get(query).await?;
        if let Some(err) = resp.api_error() {
            return Err(EngineError::Parse(format!("options error: {err}")));
        }
        Ok(resp)
    }
}

impl MarketDataProvider for YahooClient {
    async fn current_price(&self, symbol: &str) -> EngineResult<f64> {
        let resp = self
            .chart(&format!("/v8/finance/chart/{symbol}?range=1d&interval=1d"))
            .await
            .map_err(|e| EngineError::PriceUnavailable(format!("{symbol}: {e}")))?;

        let price = resp
            .regular_market_price()
            .ok_or_else(|| EngineError::PriceUnavailable(format!("{symbol}: no market price in response")))?;

        if price <= 0.0 || !price.is_finite() {
            return Err(EngineError::PriceUnavailable(format!("{symbol}: invalid price {price}")));
        }
        Ok(price)
    }

    async fn historical_closes(&self, symbol: &str, lookback_days: i64) -> EngineResult<Vec<(NaiveDate, f64)>> {
        let (period1, period2) = history_window(Utc::now(), lookback_days)?;
        let resp = self
            .chart(&format!(
                "/v8/finance/chart/{symbol}?period1={period1}&period2={period2}&interval=1d"
            ))
            .await
            .map_err(|e| EngineError::HistoryUnavailable(format!("{symbol}: {e}")))?;

        let closes = resp.daily_closes();
        tracing::debug!(symbol, lookback_days, closes = closes.len(), "history fetched");
        Ok(closes)
    }

    async fn option_expirations(&self, symbol: &str) -> EngineResult<Vec<NaiveDate>> {
        let resp = self
            .options(&format!("/v7/finance/options/{symbol}"))
            .await
            .map_err(|e| EngineError::OptionChainUnavailable(format!("{symbol}: {e}")))?;
        Ok(resp.expiration_dates())
    }

    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> EngineResult<Vec<Contract>> {
        let epoch = expiration
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| EngineError::InvalidParameter(format!("bad expiration {expiration}")))?;

        let resp = self
            .options(&format!("/v7/finance/options/{symbol}?date={epoch}"))
            .await
            .map_err(|e| EngineError::OptionChainUnavailable(format!("{symbol} {expiration}: {e}")))?;
        Ok(resp.calls(expiration))
    }
}

/// `(period1, period2)` epoch seconds covering the last `lookback_days` before `now`.
fn history_window(now: DateTime<Utc>, lookback_days: i64) -> EngineResult<(i64, i64)> {
    let from = TimeDelta::try_days(lookback_days)
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .ok_or_else(|| EngineError::InvalidParameter(format!("lookback of {lookback_days} days is out of range")))?;
    Ok((from.timestamp(), now.timestamp()))
}
