use crate::errors::EngineResult;
use crate::state::{Contract, PricePath, SimulationResult, SimulationRun};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Payload handed to the visualization consumer. Rendering happens elsewhere.
#[derive(Debug, Serialize)]
pub struct SimulationReport<'a> {
    pub symbol: &'a str,
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub horizon_days: i64,
    pub s0: f64,
    pub drift_per_step: f64,
    pub volatility_per_step: f64,
    pub contract: &'a Contract,
    /// Horizontal reference line: strike + premium.
    pub reference_level: f64,
    pub result: &'a SimulationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<&'a [PricePath]>,
    /// Discounted payoff of each path, index-aligned with `paths`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoffs: Option<&'a [f64]>,
}

impl<'a> SimulationReport<'a> {
    pub fn from_run(run: &'a SimulationRun, include_paths: bool) -> Self {
        Self {
            symbol: &run.symbol,
            generated_at: Utc::now(),
            seed: run.seed,
            horizon_days: run.horizon_days,
            s0: run.params.s0,
            drift_per_step: run.params.drift_per_step,
            volatility_per_step: run.params.volatility_per_step,
            contract: &run.contract,
            reference_level: run.contract.reference_level(),
            result: &run.result,
            paths: include_paths.then_some(run.paths.as_slice()),
            payoffs: include_paths.then_some(run.payoffs.as_slice()),
        }
    }
}

/// Serialize the report as pretty JSON to `path`, creating parent dirs.
pub fn write_report(path: &Path, run: &SimulationRun, include_paths: bool) -> EngineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let report = SimulationReport::from_run(run, include_paths);
    let body = serde_json::to_vec_pretty(&report)?;
    std::fs::write(path, body)?;

    tracing::info!(path = %path.display(), include_paths, "report written");
    Ok(())
}
