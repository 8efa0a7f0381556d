use crate::config::FixedParameters;
use crate::errors::{EngineError, EngineResult};
use statrs::statistics::Statistics;

/// Minimum number of closes needed to form one return.
pub const MIN_HISTORY: usize = 2;

/// Minimum number of closes for a sample standard deviation (two returns).
pub const MIN_HISTORY_FOR_VOLATILITY: usize = MIN_HISTORY + 1;

/// Per-step drift and volatility estimated from a close series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepStatistics {
    pub drift_per_step: f64,
    pub volatility_per_step: f64,
    /// Number of returns the estimate is based on (0 for fixed overrides).
    pub observations: usize,
}

/// Where drift and volatility come from for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterSource {
    /// Estimate from the historical closes over the lookback window.
    Historical,
    /// Explicit testing override. Never selected implicitly.
    Fixed(FixedParameters),
}

impl ParameterSource {
    pub fn from_override(fixed: Option<FixedParameters>) -> Self {
        fixed.map_or(Self::Historical, Self::Fixed)
    }
}

impl From<FixedParameters> for StepStatistics {
    fn from(fixed: FixedParameters) -> Self {
        Self {
            drift_per_step: fixed.drift_per_step,
            volatility_per_step: fixed.volatility_per_step,
            observations: 0,
        }
    }
}

/// Period-over-period percentage returns: `p[i] / p[i-1] - 1`.
/// Output length is `closes.len() - 1`.
pub fn percentage_returns(closes: &[f64]) -> EngineResult<Vec<f64>> {
    if closes.len() < MIN_HISTORY {
        return Err(EngineError::InsufficientData {
            required: MIN_HISTORY,
            available: closes.len(),
        });
    }

    if let Some(bad) = closes.iter().find(|p| !p.is_finite() || **p <= 0.0) {
        return Err(EngineError::InvalidParameter(format!(
            "historical close must be positive and finite, got {bad}"
        )));
    }

    Ok(closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

/// Drift = mean of returns, volatility = sample standard deviation (n - 1).
/// Needs at least two returns; the sample deviation of one is undefined.
pub fn estimate_from_closes(closes: &[f64]) -> EngineResult<StepStatistics> {
    if closes.len() < MIN_HISTORY_FOR_VOLATILITY {
        return Err(EngineError::InsufficientData {
            required: MIN_HISTORY_FOR_VOLATILITY,
            available: closes.len(),
        });
    }
    let returns = percentage_returns(closes)?;

    let drift_per_step = returns.iter().copied().mean();
    let volatility_per_step = returns.iter().copied().std_dev();

    if !drift_per_step.is_finite() || !volatility_per_step.is_finite() {
        return Err(EngineError::InvalidParameter(format!(
            "non-finite estimate: drift={drift_per_step} volatility={volatility_per_step}"
        )));
    }

    tracing::debug!(
        observations = returns.len(),
        drift = drift_per_step,
        volatility = volatility_per_step,
        "estimated step statistics"
    );

    Ok(StepStatistics {
        drift_per_step,
        volatility_per_step,
        observations: returns.len(),
    })
}
