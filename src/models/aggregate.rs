use crate::errors::{EngineError, EngineResult};
use crate::state::{PricePath, PricePoint, SimulationResult};
use statrs::statistics::Statistics;

/// Mean price per step index across all paths.
///
/// Paths are aligned by index, not by timestamp; timestamps are taken from
/// the first path. Deviations from the first path are summed in slice order
/// and added back, so a step where every path agrees (index 0 = `s0`) comes
/// out exact. Other orderings differ only by floating-point summation error.
pub fn expected_path(paths: &[PricePath]) -> EngineResult<Vec<PricePoint>> {
    let first = paths
        .first()
        .ok_or_else(|| EngineError::InvalidParameter("no paths to aggregate".into()))?;
    if first.is_empty() {
        return Err(EngineError::InvalidParameter("paths must not be empty".into()));
    }
    let len = first.len();

    let mut sums = vec![0.0_f64; len];
    for (idx, path) in paths.iter().enumerate() {
        if path.len() != len {
            return Err(EngineError::InvalidParameter(format!(
                "path {idx} has {} points, expected {len}",
                path.len()
            )));
        }
        for ((sum, point), base) in sums.iter_mut().zip(&path.points).zip(&first.points) {
            *sum += point.price - base.price;
        }
    }

    let n = paths.len() as f64;
    Ok(first
        .points
        .iter()
        .zip(sums)
        .map(|(point, sum)| PricePoint {
            timestamp: point.timestamp,
            price: point.price + sum / n,
        })
        .collect())
}

/// Mean of the discounted payoffs.
pub fn expected_present_value(payoffs: &[f64]) -> EngineResult<f64> {
    if payoffs.is_empty() {
        return Err(EngineError::InvalidParameter("no payoffs to aggregate".into()));
    }
    Ok(payoffs.iter().copied().mean())
}

/// Barrier step: combine every path and every payoff into the run result.
/// `payoff_std_dev` and `standard_error` are NaN for a single path.
pub fn aggregate(paths: &[PricePath], payoffs: &[f64]) -> EngineResult<SimulationResult> {
    if paths.len() != payoffs.len() {
        return Err(EngineError::InvalidParameter(format!(
            "{} paths but {} payoffs",
            paths.len(),
            payoffs.len()
        )));
    }

    let expected_path = expected_path(paths)?;
    let expected_present_value = expected_present_value(payoffs)?;
    let payoff_std_dev = payoffs.iter().copied().std_dev();
    let standard_error = payoff_std_dev / (payoffs.len() as f64).sqrt();

    Ok(SimulationResult {
        expected_path,
        expected_present_value,
        path_count: paths.len(),
        payoff_std_dev,
        standard_error,
    })
}
