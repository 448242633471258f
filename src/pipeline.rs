//! Pipeline orchestration
//!
//! One `PipelineSpec` per summary variant: read query, cleaning plan,
//! derivation set, helper columns to drop, destination schema. A run is a
//! single pass: read → contract check → clean → derive → materialize.
//! Every stage fails fast with a typed error; there is no best-effort mode.

use crate::cleaner::{self, CleaningPlan};
use crate::derive::{self, DerivedColumn, Formula};
use crate::error::EtlError;
use crate::query::{self, AggregationQuery};
use crate::schema::{self, DestinationSchema};
use crate::store::SummaryStore;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

/// Everything one summary variant needs for a full run.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: &'static str,
    pub query: AggregationQuery,
    pub cleaning: CleaningPlan,
    pub derivations: Vec<DerivedColumn>,
    /// Helper columns consumed by derivations but absent from the
    /// destination schema, dropped after the derive stage.
    pub drop_after_derive: &'static [&'static str],
    pub schema: DestinationSchema,
}

impl PipelineSpec {
    /// Canonical rolled-up sales summary: daily grain by channel, brand,
    /// product category and country, with a derived profit margin.
    pub fn sales_summary() -> Self {
        Self {
            name: "sales_summary",
            query: query::sales_rolled_up(),
            cleaning: CleaningPlan {
                text_columns: &["channel", "brand", "product_category", "country"],
                decimal_columns: &["return_amount", "discount_amount"],
            },
            derivations: vec![
                DerivedColumn::new(
                    "total_cost",
                    Formula::Product {
                        left: "unit_cost",
                        right: "sales_quantity",
                    },
                ),
                DerivedColumn::new(
                    "total_sales",
                    Formula::Product {
                        left: "unit_price",
                        right: "sales_quantity",
                    },
                ),
                DerivedColumn::new(
                    "net_sales",
                    Formula::NetOfCharges {
                        base: "total_sales",
                        charges: ["return_amount", "discount_amount"],
                    },
                ),
                DerivedColumn::new(
                    "net_profit",
                    Formula::Difference {
                        minuend: "net_sales",
                        subtrahend: "total_cost",
                    },
                ),
                DerivedColumn::new(
                    "profit_margin",
                    Formula::Ratio {
                        numerator: "net_profit",
                        denominator: "net_sales",
                        percent: true,
                    },
                ),
            ],
            drop_after_derive: &["unit_cost", "unit_price", "sales_quantity"],
            schema: schema::sales_summary_rolled_up(),
        }
    }

    /// Detailed sales summary at the full dimension grain.
    pub fn sales_summary_detailed() -> Self {
        Self {
            name: "sales_summary_detailed",
            query: query::sales_detailed(),
            cleaning: CleaningPlan {
                text_columns: &[
                    "months",
                    "channel_name",
                    "brand_name",
                    "class_name",
                    "continent_name",
                    "country_name",
                    "state_province_name",
                    "product_category_name",
                    "product_sub_category_name",
                ],
                decimal_columns: &[
                    "unit_cost",
                    "unit_price",
                    "return_amount",
                    "discount_amount",
                ],
            },
            derivations: vec![
                DerivedColumn::new(
                    "total_cost",
                    Formula::Product {
                        left: "unit_cost",
                        right: "sales_quantity",
                    },
                ),
                DerivedColumn::new(
                    "total_sales",
                    Formula::Product {
                        left: "unit_price",
                        right: "sales_quantity",
                    },
                ),
                DerivedColumn::new(
                    "net_sales",
                    Formula::NetOfCharges {
                        base: "total_sales",
                        charges: ["return_amount", "discount_amount"],
                    },
                ),
                DerivedColumn::new(
                    "net_profit",
                    Formula::Difference {
                        minuend: "net_sales",
                        subtrahend: "total_cost",
                    },
                ),
            ],
            drop_after_derive: &[],
            schema: schema::sales_summary_detailed(),
        }
    }

    /// Per-vendor purchase/sales summary.
    pub fn vendor_summary() -> Self {
        Self {
            name: "vendor_summary",
            query: query::vendor_summary(),
            cleaning: CleaningPlan {
                text_columns: &["vendor_name"],
                decimal_columns: &[
                    "total_purchase",
                    "total_sales",
                    "total_excise_tax",
                    "total_freight_cost",
                ],
            },
            derivations: vec![
                DerivedColumn::new(
                    "gross_profit",
                    Formula::Difference {
                        minuend: "total_sales",
                        subtrahend: "total_purchase",
                    },
                ),
                DerivedColumn::new(
                    "profit_margin",
                    Formula::Ratio {
                        numerator: "gross_profit",
                        denominator: "total_sales",
                        percent: true,
                    },
                ),
                DerivedColumn::new(
                    "stock_turnover",
                    Formula::Ratio {
                        numerator: "sales_quantity",
                        denominator: "purchase_quantity",
                        percent: false,
                    },
                ),
                DerivedColumn::new(
                    "sales_to_purchase_ratio",
                    Formula::Ratio {
                        numerator: "total_sales",
                        denominator: "total_purchase",
                        percent: false,
                    },
                ),
            ],
            drop_after_derive: &[],
            schema: schema::vendor_summary(),
        }
    }
}

/// Machine-readable summary of a completed run, logged as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pipeline: &'static str,
    pub destination: &'static str,
    pub rows_read: usize,
    pub rows_written: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Run one pipeline end to end. On success the destination table contains
/// exactly the final rows; on any error the previous table is untouched.
pub fn run_pipeline(
    store: &dyn SummaryStore,
    spec: &PipelineSpec,
) -> Result<RunReport, EtlError> {
    let started_at = Utc::now();
    info!("🚀 Starting pipeline '{}'", spec.name);

    let mut table = store.execute_read(spec.query.sql)?;
    verify_contract(&table.column_names(), spec.query.columns)?;
    let rows_read = table.row_count();

    cleaner::clean(&mut table, &spec.cleaning)?;
    derive::derive(&mut table, &spec.derivations)?;
    if !spec.drop_after_derive.is_empty() {
        table.drop_columns(spec.drop_after_derive)?;
    }

    let rows_written = store.replace_table(&spec.schema, &table)?;

    let report = RunReport {
        pipeline: spec.name,
        destination: spec.schema.table,
        rows_read,
        rows_written,
        started_at,
        finished_at: Utc::now(),
    };
    info!(
        "✅ Pipeline '{}' complete: {}",
        spec.name,
        serde_json::to_string(&report).unwrap_or_default()
    );
    Ok(report)
}

/// The query's output contract is consumed positionally by the cleaning
/// and derivation plans, so name or order drift fails the run up front.
fn verify_contract(actual: &[&str], declared: &[&str]) -> Result<(), EtlError> {
    if actual != declared {
        return Err(EtlError::Query(format!(
            "query output {:?} does not match declared contract {:?}",
            actual, declared
        )));
    }
    Ok(())
}
