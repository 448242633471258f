//! Thin runner: wires config, logging and the store, then executes one
//! pipeline run. All pipeline logic lives in the library.
//!
//! Usage: `run_summary [sales|sales_detailed|vendor]` (default: sales)

use salesflow::{run_pipeline, EtlConfig, PipelineSpec, SqliteStore};

fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let variant = std::env::args().nth(1).unwrap_or_else(|| "sales".to_string());
    let spec = match variant.as_str() {
        "sales" => PipelineSpec::sales_summary(),
        "sales_detailed" => PipelineSpec::sales_summary_detailed(),
        "vendor" => PipelineSpec::vendor_summary(),
        other => {
            log::error!("unknown pipeline variant '{}'", other);
            std::process::exit(2);
        }
    };

    let config = EtlConfig::from_env();
    log::info!("📊 Configuration:");
    log::info!("   DB path: {}", config.db_path);
    log::info!("   Statement deadline: {} ms", config.statement_deadline_ms);

    let report = SqliteStore::open(&config).and_then(|store| run_pipeline(&store, &spec));
    match report {
        Ok(report) => {
            log::info!(
                "Summary '{}' materialized: {} rows read, {} rows written",
                report.destination,
                report.rows_read,
                report.rows_written
            );
        }
        Err(e) => {
            log::error!("Pipeline '{}' failed: {}", spec.name, e);
            std::process::exit(1);
        }
    }
}
