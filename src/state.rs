use crate::errors::{EngineError, EngineResult};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;

// ── Simulation inputs ──

/// Frozen inputs for every path of one run. Shared read-only across workers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParameters {
    pub s0: f64,
    pub drift_per_step: f64,
    pub volatility_per_step: f64,
    /// Step size in the time unit of drift/volatility (days).
    pub dt: f64,
    pub step_count: usize,
    pub start: DateTime<Utc>,
    /// Calendar increment between consecutive path points.
    pub step_interval: TimeDelta,
}

impl SimulationParameters {
    /// Validated constructor. Rejects non-positive `s0`, `dt` or `step_count`
    /// and negative or non-finite volatility.
    pub fn new(
        s0: f64,
        drift_per_step: f64,
        volatility_per_step: f64,
        dt: f64,
        step_count: usize,
        start: DateTime<Utc>,
        step_interval: TimeDelta,
    ) -> EngineResult<Self> {
        if !s0.is_finite() || s0 <= 0.0 {
            return Err(EngineError::InvalidParameter(format!("s0 must be positive, got {s0}")));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(EngineError::InvalidParameter(format!("dt must be positive, got {dt}")));
        }
        if step_count == 0 {
            return Err(EngineError::InvalidParameter("step_count must be >= 1".into()));
        }
        if !drift_per_step.is_finite() {
            return Err(EngineError::InvalidParameter(format!("drift must be finite, got {drift_per_step}")));
        }
        if !volatility_per_step.is_finite() || volatility_per_step < 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "volatility must be finite and non-negative, got {volatility_per_step}"
            )));
        }
        Ok(Self {
            s0,
            drift_per_step,
            volatility_per_step,
            dt,
            step_count,
            start,
            step_interval,
        })
    }

    /// Timestamp of the point at `step` (0 = start).
    #[inline]
    pub fn timestamp_at(&self, step: usize) -> DateTime<Utc> {
        self.start + self.step_interval * step as i32
    }
}

// ── Contract ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub symbol: Option<String>,
    pub strike: f64,
    /// Purchase cost (ask price).
    pub premium: f64,
    pub expiration: NaiveDate,
}

impl Contract {
    /// Break-even level drawn as the reference line: strike + premium.
    #[inline]
    pub fn reference_level(&self) -> f64 {
        self.strike + self.premium
    }
}

// ── Paths and results ──

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// One simulated trajectory: `step_count + 1` points, index 0 at `s0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePath {
    pub points: Vec<PricePoint>,
}

impl PricePath {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest price reached anywhere on the path.
    #[inline]
    pub fn max_price(&self) -> Option<f64> {
        self.points.iter().map(|p| p.price).reduce(f64::max)
    }

    #[cfg(test)]
    pub fn terminal_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// Mean price per step index across all paths.
    pub expected_path: Vec<PricePoint>,
    /// Mean of all discounted payoffs.
    pub expected_present_value: f64,
    pub path_count: usize,
    /// Sample standard deviation of the discounted payoffs.
    pub payoff_std_dev: f64,
    /// `payoff_std_dev / sqrt(path_count)`.
    pub standard_error: f64,
}

/// Everything a run produces: inputs frozen before simulation, raw paths,
/// one discounted payoff per path, and the aggregate.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub symbol: String,
    pub params: SimulationParameters,
    pub contract: Contract,
    pub horizon_days: i64,
    pub seed: u64,
    pub paths: Vec<PricePath>,
    pub payoffs: Vec<f64>,
    pub result: SimulationResult,
}
