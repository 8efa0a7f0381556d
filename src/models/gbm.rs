use crate::state::{PricePath, PricePoint, SimulationParameters};
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Source of independent standard-normal variates, consumed one per step.
pub trait NormalSource {
    fn next_standard_normal(&mut self) -> f64;
}

/// Seeded N(0, 1) stream. One instance per path; never shared.
pub struct GaussianStream {
    rng: Xoshiro256PlusPlus,
}

impl GaussianStream {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Stream for path `path_index` of a run seeded with `base_seed`.
    /// Independent of which worker thread generates the path.
    pub fn for_path(base_seed: u64, path_index: u64) -> Self {
        Self::from_seed(derive_path_seed(base_seed, path_index))
    }
}

impl NormalSource for GaussianStream {
    #[inline]
    fn next_standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}

/// SplitMix64 finalizer over `base_seed + golden_gamma * (path_index + 1)`.
/// Distinct indices map to well-separated generator seeds.
#[inline]
pub fn derive_path_seed(base_seed: u64, path_index: u64) -> u64 {
    let mut z = base_seed.wrapping_add(path_index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generate one discretized GBM path (Euler step on the price level):
///
/// P_i = P_{i-1} + mu * P_{i-1} * dt + sigma * P_{i-1} * sqrt(dt) * Z_i
///
/// Output has `step_count + 1` points, the first exactly `s0`.
/// The additive increment can push prices below zero for large sigma; this
/// is not clamped.
pub fn simulate_path<S: NormalSource + ?Sized>(params: &SimulationParameters, draws: &mut S) -> PricePath {
    let drift_dt = params.drift_per_step * params.dt;
    let vol_sqrt_dt = params.volatility_per_step * params.dt.sqrt();

    let mut points = Vec::with_capacity(params.step_count + 1);
    let mut price = params.s0;
    points.push(PricePoint {
        timestamp: params.start,
        price,
    });

    for step in 1..=params.step_count {
        let z = draws.next_standard_normal();
        let increment = drift_dt * price + vol_sqrt_dt * price * z;
        price += increment;
        points.push(PricePoint {
            timestamp: params.timestamp_at(step),
            price,
        });
    }

    PricePath { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeDelta, TimeZone, Utc};

    /// Replays a fixed list of draws, cycling when exhausted.
    struct ScriptedDraws {
        values: Vec<f64>,
        next: usize,
    }

    impl NormalSource for ScriptedDraws {
        fn next_standard_normal(&mut self) -> f64 {
            let z = self.values[self.next % self.values.len()];
            self.next += 1;
            z
        }
    }

    fn params(drift: f64, vol: f64, steps: usize) -> SimulationParameters {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 14, 30, 0).unwrap();
        SimulationParameters::new(100.0, drift, vol, 0.07, steps, start, TimeDelta::minutes(100)).unwrap()
    }

    #[test]
    fn test_length_and_start() {
        for steps in [1, 2, 17, 100] {
            let p = params(0.001, 0.02, steps);
            let path = simulate_path(&p, &mut GaussianStream::from_seed(9));
            assert_eq!(path.len(), steps + 1);
            assert_eq!(path.points[0].price, 100.0);
            assert_eq!(path.points[0].timestamp, p.start);
            assert_eq!(path.points[steps].timestamp, p.start + TimeDelta::minutes(100 * steps as i64));
        }
    }

    #[test]
    fn test_same_seed_bit_identical() {
        let p = params(0.001, 0.02, 100);
        let a = simulate_path(&p, &mut GaussianStream::for_path(42, 7));
        let b = simulate_path(&p, &mut GaussianStream::for_path(42, 7));
        assert_eq!(a, b);
        for (x, y) in a.points.iter().zip(&b.points) {
            assert_eq!(x.price.to_bits(), y.price.to_bits());
        }
    }

    #[test]
    fn test_distinct_paths_differ() {
        let p = params(0.001, 0.02, 100);
        let a = simulate_path(&p, &mut GaussianStream::for_path(42, 0));
        let b = simulate_path(&p, &mut GaussianStream::for_path(42, 1));
        assert_ne!(a.terminal_price(), b.terminal_price());
        assert_ne!(derive_path_seed(42, 0), derive_path_seed(42, 1));
        assert_ne!(derive_path_seed(42, 0), derive_path_seed(43, 0));
    }

    #[test]
    fn test_zero_drift_zero_vol_constant() {
        let p = params(0.0, 0.0, 50);
        let path = simulate_path(&p, &mut GaussianStream::from_seed(1));
        assert!(path.points.iter().all(|pt| pt.price == 100.0));
    }

    #[test]
    fn test_increment_formula() {
        let p = params(0.01, 0.2, 2);
        let mut draws = ScriptedDraws { values: vec![1.0, -0.5], next: 0 };
        let path = simulate_path(&p, &mut draws);

        let sqrt_dt = 0.07_f64.sqrt();
        let p1 = 100.0 + 0.01 * 100.0 * 0.07 + 0.2 * 100.0 * sqrt_dt * 1.0;
        let p2 = p1 + 0.01 * p1 * 0.07 + 0.2 * p1 * sqrt_dt * -0.5;
        assert_relative_eq!(path.points[1].price, p1, epsilon = 1e-10);
        assert_relative_eq!(path.points[2].price, p2, epsilon = 1e-10);
        assert_eq!(draws.next, 2, "one draw per step");
    }

    #[test]
    fn test_pure_drift_compounds() {
        let p = params(0.01, 0.0, 10);
        let path = simulate_path(&p, &mut GaussianStream::from_seed(3));
        let expected = 100.0 * (1.0 + 0.01 * 0.07_f64).powi(10);
        assert_relative_eq!(path.terminal_price().unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_stream_moments() {
        let mut stream = GaussianStream::from_seed(2024);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| stream.next_standard_normal()).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|z| (z - mean) * (z - mean)).sum::<f64>() / (n - 1) as f64;
        assert!(mean.abs() < 0.05, "mean={mean}");
        assert!((var - 1.0).abs() < 0.05, "var={var}");
    }
}
