//! Error taxonomy for pipeline runs
//!
//! Every stage fails fast with a typed error naming the stage and cause.
//! There is no log-and-continue path anywhere in the pipeline: a run either
//! completes with the destination table fully replaced or returns one of
//! these variants.

#[derive(Debug)]
pub enum EtlError {
    /// The read query failed (bad SQL, unreachable store, permission).
    Query(String),
    /// A cleaning or derivation pass failed on the in-memory table.
    Transform {
        stage: &'static str,
        detail: String,
    },
    /// Drop/create/load against the destination table failed. The
    /// materializer rolls back, so the previous table survives intact.
    Storage(String),
}

impl EtlError {
    pub fn transform(stage: &'static str, detail: impl Into<String>) -> Self {
        EtlError::Transform {
            stage,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for EtlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EtlError::Query(e) => write!(f, "query error: {}", e),
            EtlError::Transform { stage, detail } => {
                write!(f, "transform error in stage '{}': {}", stage, detail)
            }
            EtlError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for EtlError {}
