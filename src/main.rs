mod config;
mod errors;
mod market;
mod models;
mod report;
mod simulation;
mod state;

use crate::market::client::YahooClient;
use crate::simulation::pipeline;

#[tokio::main]
async fn main() {
    // Structured logging to stderr; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("gbm_option_sim starting");

    // Load config
    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let provider = YahooClient::new(&cfg.market_data_base_url);

    // Everything below is fail-fast: no partial result is published on error.
    let run = match pipeline::run_simulation(&cfg, &provider, chrono::Utc::now()).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, symbol = %cfg.symbol, "simulation failed");
            std::process::exit(1);
        }
    };

    if let Some(path) = cfg.report_path.as_deref() {
        if let Err(e) = report::write_report(path, &run, cfg.report_include_paths) {
            tracing::error!(error = %e, "report write failed");
            std::process::exit(1);
        }
    }

    let terminal = run.result.expected_path.last().map(|p| p.price).unwrap_or(run.params.s0);
    println!(
        "{} {} strike={:.2} premium={:.2} expected_terminal={:.2} expected_present_value={:.4} (+/- {:.4}, {} paths, seed {})",
        run.symbol,
        run.contract.expiration,
        run.contract.strike,
        run.contract.premium,
        terminal,
        run.result.expected_present_value,
        run.result.standard_error,
        run.result.path_count,
        run.seed,
    );
}
