//! Cleaning pass over a tabular result
//!
//! Three in-place operations, each independently idempotent, always run in
//! the same order: fill absent values, trim declared text columns, round
//! declared decimal columns. Fill runs first so trim stringifies the
//! post-fill value and so no null ever reaches a dividing derivation.
//!
//! Fill deliberately does not special-case text columns: an absent text
//! cell becomes numeric 0 and the trim pass stringifies it to "0". That
//! matches the summary tables consumers already depend on.

use crate::error::EtlError;
use crate::table::{TabularResult, Value};
use log::{debug, info};
use rust_decimal::Decimal;

/// Declared per-variant cleaning targets.
#[derive(Debug, Clone)]
pub struct CleaningPlan {
    pub text_columns: &'static [&'static str],
    pub decimal_columns: &'static [&'static str],
}

/// Run fill → trim → round. Fails the whole stage on the first problem;
/// a partially cleaned table is never handed downstream.
pub fn clean(table: &mut TabularResult, plan: &CleaningPlan) -> Result<(), EtlError> {
    let filled = fill_absent(table);
    info!("🧹 Cleaner: filled {} absent values with 0", filled);

    trim(table, plan.text_columns)?;
    round(table, plan.decimal_columns)?;
    Ok(())
}

/// Replace every absent cell with integer 0, regardless of what the
/// column otherwise holds. Returns the number of cells filled.
pub fn fill_absent(table: &mut TabularResult) -> usize {
    let mut filled = 0;
    for column in table.columns_mut() {
        for value in &mut column.values {
            if value.is_null() {
                *value = Value::Int(0);
                filled += 1;
            }
        }
    }
    filled
}

/// Coerce each declared column to its text representation and strip
/// leading/trailing whitespace.
pub fn trim(table: &mut TabularResult, columns: &[&str]) -> Result<(), EtlError> {
    for name in columns {
        let column = table.column_mut(name).ok_or_else(|| {
            EtlError::transform("trim", format!("column '{}' not found", name))
        })?;
        for value in &mut column.values {
            *value = Value::Text(value.to_text().trim().to_string());
        }
        debug!("trimmed column '{}'", name);
    }
    Ok(())
}

/// Round each declared column to 2 fractional digits. Uses half-to-even
/// (banker's rounding), the `rust_decimal` default, so 2.345 rounds to
/// 2.34 and 2.355 to 2.36. Integer cells are promoted to 2-scale decimals.
pub fn round(table: &mut TabularResult, columns: &[&str]) -> Result<(), EtlError> {
    for name in columns {
        let column = table.column_mut(name).ok_or_else(|| {
            EtlError::transform("round", format!("column '{}' not found", name))
        })?;
        for (row, value) in column.values.iter_mut().enumerate() {
            let num = value.as_decimal().ok_or_else(|| {
                EtlError::transform(
                    "round",
                    format!("column '{}' row {} is not numeric: {:?}", name, row, value),
                )
            })?;
            *value = Value::Num(round2(num));
        }
        debug!("rounded column '{}' to 2 decimal places", name);
    }
    Ok(())
}

/// Round to scale 2, half-to-even.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}
