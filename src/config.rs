use crate::errors::{EngineError, EngineResult};
use std::path::PathBuf;

/// Upper bound for `HORIZON_DAYS` and `LOOKBACK_DAYS` (about ten years).
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// How many calendar days of history feed the parameter estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookbackWindow {
    /// Same number of calendar days as the simulation horizon.
    MatchHorizon,
    Days(i64),
}

impl LookbackWindow {
    /// Resolve the window against the effective horizon of a run.
    #[inline]
    pub fn days(&self, horizon_days: i64) -> i64 {
        match self {
            Self::MatchHorizon => horizon_days,
            Self::Days(d) => *d,
        }
    }
}

/// Explicit testing override for drift and volatility.
/// Never used unless both values are configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedParameters {
    pub drift_per_step: f64,
    pub volatility_per_step: f64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub symbol: String,
    pub horizon_days: i64,
    pub path_count: usize,
    pub step_count: usize,
    pub annual_risk_free_rate: f64,
    pub lookback: LookbackWindow,
    pub seed: Option<u64>,
    pub fixed_parameters: Option<FixedParameters>,
    pub market_data_base_url: String,
    pub report_path: Option<PathBuf>,
    pub report_include_paths: bool,
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let horizon_days = parse::<i64>("HORIZON_DAYS", &var_or("HORIZON_DAYS", "7"))?;
        let path_count = parse::<usize>("PATH_COUNT", &var_or("PATH_COUNT", "200"))?;
        let step_count = parse::<usize>("STEP_COUNT", &var_or("STEP_COUNT", "100"))?;
        let annual_risk_free_rate =
            parse::<f64>("ANNUAL_RISK_FREE_RATE", &var_or("ANNUAL_RISK_FREE_RATE", "0.03"))?;

        let lookback = match var_or("LOOKBACK_DAYS", "horizon").trim() {
            "horizon" => LookbackWindow::MatchHorizon,
            raw => LookbackWindow::Days(parse::<i64>("LOOKBACK_DAYS", raw)?),
        };

        let seed = lookup("SEED")
            .map(|raw| parse::<u64>("SEED", &raw))
            .transpose()?;

        let fixed_parameters = match (lookup("FIXED_DRIFT_PER_STEP"), lookup("FIXED_VOLATILITY_PER_STEP")) {
            (Some(drift), Some(vol)) => Some(FixedParameters {
                drift_per_step: parse::<f64>("FIXED_DRIFT_PER_STEP", &drift)?,
                volatility_per_step: parse::<f64>("FIXED_VOLATILITY_PER_STEP", &vol)?,
            }),
            (None, None) => None,
            _ => {
                return Err(EngineError::Config(
                    "FIXED_DRIFT_PER_STEP and FIXED_VOLATILITY_PER_STEP must be set together".into(),
                ))
            }
        };

        let report_include_paths =
            parse::<bool>("REPORT_INCLUDE_PATHS", &var_or("REPORT_INCLUDE_PATHS", "false"))?;

        let cfg = Self {
            symbol: var_or("SYMBOL", "AAPL"),
            horizon_days,
            path_count,
            step_count,
            annual_risk_free_rate,
            lookback,
            seed,
            fixed_parameters,
            market_data_base_url: var_or("MARKET_DATA_BASE_URL", "https://query2.finance.yahoo.com"),
            report_path: lookup("REPORT_PATH").map(PathBuf::from),
            report_include_paths,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> EngineResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::Config("SYMBOL must not be empty".into()));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.horizon_days) {
            return Err(EngineError::Config(format!(
                "HORIZON_DAYS must be in 1..={MAX_WINDOW_DAYS}, got {}",
                self.horizon_days
            )));
        }
        if self.path_count == 0 {
            return Err(EngineError::Config("PATH_COUNT must be >= 1".into()));
        }
        if self.step_count == 0 {
            return Err(EngineError::Config("STEP_COUNT must be >= 1".into()));
        }
        if !self.annual_risk_free_rate.is_finite() || self.annual_risk_free_rate <= -1.0 {
            return Err(EngineError::Config(format!(
                "ANNUAL_RISK_FREE_RATE must be finite and > -1, got {}",
                self.annual_risk_free_rate
            )));
        }
        if let LookbackWindow::Days(d) = self.lookback {
            if !(1..=MAX_WINDOW_DAYS).contains(&d) {
                return Err(EngineError::Config(format!("LOOKBACK_DAYS must be in 1..={MAX_WINDOW_DAYS}, got {d}")));
            }
        }
        if let Some(fixed) = self.fixed_parameters {
            if !fixed.drift_per_step.is_finite()
                || !fixed.volatility_per_step.is_finite()
                || fixed.volatility_per_step < 0.0
            {
                return Err(EngineError::Config(format!("invalid fixed parameters: {fixed:?}")));
            }
        }
        Ok(())
    }
}

fn parse<T>(key: &str, raw: &str) -> EngineResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| EngineError::Config(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> EngineResult<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.symbol, "AAPL");
        assert_eq!(cfg.horizon_days, 7);
        assert_eq!(cfg.path_count, 200);
        assert_eq!(cfg.step_count, 100);
        assert!((cfg.annual_risk_free_rate - 0.03).abs() < 1e-12);
        assert_eq!(cfg.lookback, LookbackWindow::MatchHorizon);
        assert!(cfg.seed.is_none());
        assert!(cfg.fixed_parameters.is_none());
        assert!(!cfg.report_include_paths);
    }

    #[test]
    fn test_lookback_resolves_against_horizon() {
        let cfg = config_from(&[("LOOKBACK_DAYS", "30")]).unwrap();
        assert_eq!(cfg.lookback, LookbackWindow::Days(30));
        assert_eq!(cfg.lookback.days(7), 30);
        assert_eq!(LookbackWindow::MatchHorizon.days(7), 7);
    }

    #[test]
    fn test_fixed_parameters_require_both() {
        let err = config_from(&[("FIXED_DRIFT_PER_STEP", "0.001")]).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));

        let cfg = config_from(&[
            ("FIXED_DRIFT_PER_STEP", "0.001"),
            ("FIXED_VOLATILITY_PER_STEP", "0.02"),
        ])
        .unwrap();
        assert_eq!(
            cfg.fixed_parameters,
            Some(FixedParameters { drift_per_step: 0.001, volatility_per_step: 0.02 })
        );
    }

    #[test]
    fn test_rejects_zero_steps_and_bad_numbers() {
        assert!(matches!(config_from(&[("STEP_COUNT", "0")]), Err(EngineError::Config(_))));
        assert!(matches!(config_from(&[("PATH_COUNT", "many")]), Err(EngineError::Config(_))));
        assert!(matches!(config_from(&[("HORIZON_DAYS", "0")]), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rejects_windows_beyond_ten_years() {
        assert!(matches!(config_from(&[("HORIZON_DAYS", "100000000")]), Err(EngineError::Config(_))));
        assert!(matches!(config_from(&[("LOOKBACK_DAYS", "100000000")]), Err(EngineError::Config(_))));
        assert!(matches!(config_from(&[("LOOKBACK_DAYS", "0")]), Err(EngineError::Config(_))));

        let cfg = config_from(&[("HORIZON_DAYS", "3650"), ("LOOKBACK_DAYS", "3650")]).unwrap();
        assert_eq!(cfg.horizon_days, MAX_WINDOW_DAYS);
        assert_eq!(cfg.lookback, LookbackWindow::Days(MAX_WINDOW_DAYS));
    }
}
