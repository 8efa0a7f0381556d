pub mod client;
pub mod selector;
pub mod types;

use crate::errors::EngineResult;
use crate::state::Contract;
use chrono::NaiveDate;

/// Market data consumed by a run. Everything is fetched and frozen before
/// the first path is simulated; implementations do not retry.
#[allow(async_fn_in_trait)]
pub trait MarketDataProvider {
    /// Latest traded price. Fails with `PriceUnavailable`.
    async fn current_price(&self, symbol: &str) -> EngineResult<f64>;

    /// Daily closes over the last `lookback_days` calendar days, oldest first.
    /// Fails with `HistoryUnavailable`.
    async fn historical_closes(&self, symbol: &str, lookback_days: i64) -> EngineResult<Vec<(NaiveDate, f64)>>;

    /// Listed option expiration dates.
    async fn option_expirations(&self, symbol: &str) -> EngineResult<Vec<NaiveDate>>;

    /// Call contracts expiring on `expiration`.
    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> EngineResult<Vec<Contract>>;
}
