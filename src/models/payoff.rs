use crate::errors::{EngineError, EngineResult};
use crate::state::{Contract, PricePath};

/// Days per year used for discounting.
const DAYS_PER_YEAR: f64 = 365.0;

/// Lookback-style payoff on the path maximum, discounted to present value.
///
/// payoff     = max(path) - K - premium        (not floored at zero)
/// discounted = payoff / (1 + r)^(horizon_days / 365)
///
/// Built once per run and shared read-only by every path.
#[derive(Debug, Clone, Copy)]
pub struct PayoffEvaluator {
    strike: f64,
    premium: f64,
    discount_factor: f64,
}

impl PayoffEvaluator {
    pub fn new(contract: &Contract, annual_risk_free_rate: f64, horizon_days: f64) -> EngineResult<Self> {
        if !contract.strike.is_finite() || !contract.premium.is_finite() {
            return Err(EngineError::InvalidParameter(format!(
                "contract strike/premium must be finite: {} / {}",
                contract.strike, contract.premium
            )));
        }
        if !horizon_days.is_finite() || horizon_days < 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "horizon must be non-negative, got {horizon_days} days"
            )));
        }
        if !annual_risk_free_rate.is_finite() || annual_risk_free_rate <= -1.0 {
            return Err(EngineError::InvalidParameter(format!(
                "risk-free rate must be > -1, got {annual_risk_free_rate}"
            )));
        }

        Ok(Self {
            strike: contract.strike,
            premium: contract.premium,
            discount_factor: discount_factor(annual_risk_free_rate, horizon_days),
        })
    }

    #[inline]
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Undiscounted payoff against the highest price on the path.
    #[inline]
    pub fn raw_payoff(&self, path: &PricePath) -> EngineResult<f64> {
        let max = path
            .max_price()
            .ok_or_else(|| EngineError::InvalidParameter("cannot evaluate payoff of an empty path".into()))?;
        Ok(max - self.strike - self.premium)
    }

    #[inline]
    pub fn discounted_payoff(&self, path: &PricePath) -> EngineResult<f64> {
        Ok(self.raw_payoff(path)? / self.discount_factor)
    }
}

/// `(1 + r)^(days / 365)`
#[inline]
pub fn discount_factor(annual_rate: f64, horizon_days: f64) -> f64 {
    (1.0 + annual_rate).powf(horizon_days / DAYS_PER_YEAR)
}
