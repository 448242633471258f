//! Runtime configuration from environment variables

use std::env;

/// Configuration for a pipeline run, loaded from environment variables
/// with sensible defaults. Logging setup stays in the binary; loading the
/// library has no side effects.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    /// Path to the SQLite database file
    pub db_path: String,

    /// How long a locked database is retried before failing (ms)
    pub busy_timeout_ms: u64,

    /// Deadline for the read query and for the bulk load (ms). Exceeding
    /// it interrupts the statement and fails the run.
    pub statement_deadline_ms: u64,
}

impl EtlConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SALESFLOW_DB_PATH` (default: /var/lib/salesflow/salesflow.db)
    /// - `SALESFLOW_BUSY_TIMEOUT_MS` (default: 5000)
    /// - `SALESFLOW_STATEMENT_DEADLINE_MS` (default: 30000)
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("SALESFLOW_DB_PATH")
                .unwrap_or_else(|_| "/var/lib/salesflow/salesflow.db".to_string()),

            busy_timeout_ms: env::var("SALESFLOW_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5_000),

            statement_deadline_ms: env::var("SALESFLOW_STATEMENT_DEADLINE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30_000),
        }
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            db_path: "/var/lib/salesflow/salesflow.db".to_string(),
            busy_timeout_ms: 5_000,
            statement_deadline_ms: 30_000,
        }
    }
}
