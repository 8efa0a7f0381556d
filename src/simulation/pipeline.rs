use crate::config::AppConfig;
use crate::errors::{EngineError, EngineResult};
use crate::market::selector::{select_contract, select_expiration};
use crate::market::MarketDataProvider;
use crate::models::aggregate::aggregate;
use crate::models::estimator::{estimate_from_closes, ParameterSource, StepStatistics};
use crate::models::payoff::PayoffEvaluator;
use crate::simulation::runner;
use crate::state::{SimulationParameters, SimulationRun};
use chrono::{DateTime, TimeDelta, Utc};

/// One complete valuation run.
///
/// Phases:
///   1. Fetch: spot, expirations, chain; select the contract.
///   2. Freeze: horizon, history (or fixed override), drift/volatility,
///      simulation parameters. Any failure up to here aborts the run.
///   3. Simulate: independent paths on the rayon pool, one payoff each.
///   4. Aggregate: barrier over every path and payoff.
///
/// The effective horizon runs from `start` to the selected expiration, which
/// may differ from the requested `config.horizon_days`.
pub async fn run_simulation<P: MarketDataProvider>(
    config: &AppConfig,
    provider: &P,
    start: DateTime<Utc>,
) -> EngineResult<SimulationRun> {
    let symbol = config.symbol.as_str();
    tracing::info!(symbol, horizon_days = config.horizon_days, "simulation run starting");

    // ── 1. Fetch ──

    let target = TimeDelta::try_days(config.horizon_days)
        .and_then(|horizon| start.checked_add_signed(horizon))
        .ok_or_else(|| {
            EngineError::InvalidParameter(format!(
                "horizon of {} days from {start} is out of calendar range",
                config.horizon_days
            ))
        })?
        .date_naive();

    let s0 = provider.current_price(symbol).await?;

    let expirations = provider.option_expirations(symbol).await?;
    let expiration = select_expiration(target, &expirations)?;

    let chain = provider.option_chain(symbol, expiration).await?;
    let contract = select_contract(expiration, &chain)?;

    let horizon_days = (contract.expiration - start.date_naive()).num_days();
    if horizon_days < 1 {
        return Err(EngineError::InvalidParameter(format!(
            "expiration {} is not after start {}",
            contract.expiration,
            start.date_naive()
        )));
    }

    tracing::info!(
        symbol,
        s0,
        %target,
        expiration = %contract.expiration,
        horizon_days,
        strike = contract.strike,
        premium = contract.premium,
        "contract selected"
    );

    // ── 2. Freeze ──

    let stats: StepStatistics = match ParameterSource::from_override(config.fixed_parameters) {
        ParameterSource::Historical => {
            let lookback_days = config.lookback.days(horizon_days);
            let history = provider.historical_closes(symbol, lookback_days).await?;
            let closes: Vec<f64> = history.iter().map(|&(_, close)| close).collect();
            tracing::debug!(lookback_days, closes = closes.len(), "estimating from history");
            estimate_from_closes(&closes)?
        }
        ParameterSource::Fixed(fixed) => {
            tracing::warn!(
                drift = fixed.drift_per_step,
                volatility = fixed.volatility_per_step,
                "using fixed drift/volatility override, history ignored"
            );
            fixed.into()
        }
    };

    let step_count = config.step_count;
    let steps_i32 = i32::try_from(step_count)
        .map_err(|_| EngineError::InvalidParameter(format!("step_count too large: {step_count}")))?;
    let horizon = TimeDelta::try_days(horizon_days)
        .ok_or_else(|| EngineError::InvalidParameter(format!("horizon out of range: {horizon_days} days")))?;
    let params = SimulationParameters::new(
        s0,
        stats.drift_per_step,
        stats.volatility_per_step,
        horizon_days as f64 / step_count as f64,
        step_count,
        start,
        horizon / steps_i32,
    )?;

    let evaluator = PayoffEvaluator::new(&contract, config.annual_risk_free_rate, horizon_days as f64)?;
    let seed = config.seed.unwrap_or_else(rand::random::<u64>);

    tracing::info!(
        drift = params.drift_per_step,
        volatility = params.volatility_per_step,
        observations = stats.observations,
        dt = params.dt,
        discount_factor = evaluator.discount_factor(),
        steps = step_count,
        paths = config.path_count,
        seed,
        "parameters frozen"
    );

    // ── 3. Simulate ──

    let started = std::time::Instant::now();
    let output = runner::generate(&params, &evaluator, config.path_count, seed)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    // ── 4. Aggregate ──

    let result = aggregate(&output.paths, &output.payoffs)?;

    tracing::info!(
        symbol,
        expected_present_value = result.expected_present_value,
        standard_error = result.standard_error,
        paths = result.path_count,
        elapsed_ms,
        "simulation complete"
    );

    Ok(SimulationRun {
        symbol: symbol.to_string(),
        params,
        contract,
        horizon_days,
        seed,
        paths: output.paths,
        payoffs: output.payoffs,
        result,
    })
}
