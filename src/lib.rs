//! # salesflow
//!
//! Batch ETL that aggregates transactional sales/purchase facts into
//! denormalized summary tables for reporting. Every run recomputes the
//! full summary from scratch:
//!
//! ```text
//! AggregationQuery
//!     ↓ store.execute_read()
//! TabularResult
//!     ↓ cleaner::clean()        fill absent → trim → round
//!     ↓ derive::derive()        derived metrics, 2 dp, zero-denominator → 0
//!     ↓ store.replace_table()   transactional drop + create + load
//! destination summary table
//! ```
//!
//! The relational store is an external collaborator reached only through
//! the [`store::SummaryStore`] trait. A run either completes with the
//! destination fully replaced or fails with a typed [`error::EtlError`]
//! naming the stage; no partial state ever reaches the store.

pub mod cleaner;
pub mod config;
pub mod derive;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod store;
pub mod table;

// Re-export commonly used types
pub use cleaner::CleaningPlan;
pub use config::EtlConfig;
pub use derive::{DerivedColumn, Formula};
pub use error::EtlError;
pub use pipeline::{run_pipeline, PipelineSpec, RunReport};
pub use query::AggregationQuery;
pub use schema::{ColumnDef, DestinationSchema};
pub use store::{SqliteStore, SummaryStore};
pub use table::{Column, SemanticType, TabularResult, Value};
