pub mod estimator;
pub mod gbm;
pub mod payoff;
pub mod aggregate;
