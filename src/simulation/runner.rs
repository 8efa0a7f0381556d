use crate::errors::{EngineError, EngineResult};
use crate::models::gbm::{simulate_path, GaussianStream};
use crate::models::payoff::PayoffEvaluator;
use crate::state::{PricePath, SimulationParameters};
use rayon::prelude::*;

/// Raw Monte Carlo output: one path and one discounted payoff per index.
#[derive(Debug, Clone)]
pub struct MonteCarloOutput {
    pub paths: Vec<PricePath>,
    pub payoffs: Vec<f64>,
}

/// Generate `path_count` independent paths across the rayon pool and
/// evaluate each one.
///
/// Path `i` always draws from `GaussianStream::for_path(base_seed, i)`, so
/// output is identical regardless of thread count or scheduling. Workers
/// share only `params` and `evaluator`, both read-only.
pub fn generate(
    params: &SimulationParameters,
    evaluator: &PayoffEvaluator,
    path_count: usize,
    base_seed: u64,
) -> EngineResult<MonteCarloOutput> {
    if path_count == 0 {
        return Err(EngineError::InvalidParameter("path_count must be >= 1".into()));
    }

    let evaluated: Vec<(PricePath, f64)> = (0..path_count)
        .into_par_iter()
        .map(|idx| -> EngineResult<(PricePath, f64)> {
            let mut draws = GaussianStream::for_path(base_seed, idx as u64);
            let path = simulate_path(params, &mut draws);
            let payoff = evaluator.discounted_payoff(&path)?;
            Ok((path, payoff))
        })
        .collect::<EngineResult<Vec<_>>>()?;

    let (paths, payoffs) = evaluated.into_iter().unzip();
    Ok(MonteCarloOutput { paths, payoffs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aggregate::aggregate;
    use crate::state::Contract;
    use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};

    fn params(drift: f64, vol: f64) -> SimulationParameters {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 14, 30, 0).unwrap();
        SimulationParameters::new(100.0, drift, vol, 0.07, 100, start, TimeDelta::minutes(100)).unwrap()
    }

    fn evaluator() -> PayoffEvaluator {
        let contract = Contract {
            symbol: None,
            strike: 100.0,
            premium: 2.0,
            expiration: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        };
        PayoffEvaluator::new(&contract, 0.03, 7.0).unwrap()
    }

    #[test]
    fn test_path_i_uses_stream_i() {
        let p = params(0.001, 0.02);
        let out = generate(&p, &evaluator(), 16, 77).unwrap();
        assert_eq!(out.paths.len(), 16);
        assert_eq!(out.payoffs.len(), 16);
        for (idx, path) in out.paths.iter().enumerate() {
            let expected = simulate_path(&p, &mut GaussianStream::for_path(77, idx as u64));
            assert_eq!(path, &expected, "path {idx}");
        }
    }

    #[test]
    fn test_reproducible_across_runs() {
        let p = params(0.001, 0.02);
        let a = generate(&p, &evaluator(), 64, 5).unwrap();
        let b = generate(&p, &evaluator(), 64, 5).unwrap();
        assert_eq!(a.paths, b.paths);
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.payoffs), bits(&b.payoffs));
    }

    #[test]
    fn test_zero_paths_rejected() {
        assert!(matches!(
            generate(&params(0.0, 0.0), &evaluator(), 0, 1),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_constant_paths_constant_payoff() {
        let out = generate(&params(0.0, 0.0), &evaluator(), 8, 1).unwrap();
        let expected = (100.0 - 100.0 - 2.0) / evaluator().discount_factor();
        assert!(out.payoffs.iter().all(|&v| v == expected));
        let result = aggregate(&out.paths, &out.payoffs).unwrap();
        assert!(result.expected_path.iter().all(|pt| pt.price == 100.0));
    }

    /// Spread of the estimate across independent seeds should shrink
    /// roughly as 1/sqrt(path_count): 16x the paths, ~4x tighter.
    #[test]
    fn test_estimate_spread_shrinks_with_path_count() {
        let p = params(0.0005, 0.02);
        let eval = evaluator();
        let repeats = 40;

        let spread = |path_count: usize| {
            let estimates: Vec<f64> = (0..repeats)
                .map(|r| {
                    let out = generate(&p, &eval, path_count, 10_000 + r as u64).unwrap();
                    aggregate(&out.paths, &out.payoffs).unwrap().expected_present_value
                })
                .collect();
            let mean = estimates.iter().sum::<f64>() / repeats as f64;
            (estimates.iter().map(|e| (e - mean) * (e - mean)).sum::<f64>() / (repeats - 1) as f64).sqrt()
        };

        let small = spread(25);
        let large = spread(400);
        let ratio = small / large;
        assert!((2.0..8.0).contains(&ratio), "spread ratio {ratio} (small={small}, large={large})");
    }
}
