//! Derived-metric engine
//!
//! Appends new columns to a tabular result, each computed row-wise from a
//! fixed formula over existing columns and rounded to 2 decimal places.
//! Derivation is a pure function of same-row inputs: rerunning it on an
//! unchanged table produces identical values.
//!
//! Degenerate-input convention: a zero denominator yields 0, on every row,
//! never NaN and never a panic. Division is the only formula that can
//! degenerate; operands reach this stage post-fill so absent cells cannot
//! occur, and a non-numeric operand fails the whole stage.

use crate::cleaner::round2;
use crate::error::EtlError;
use crate::table::{Column, TabularResult, Value};
use log::info;
use rust_decimal::Decimal;

/// Arithmetic rule for one derived column. Operand names refer to columns
/// that must already exist when the rule runs, so earlier derived columns
/// can feed later ones within the same set.
#[derive(Debug, Clone)]
pub enum Formula {
    /// minuend - subtrahend
    Difference {
        minuend: &'static str,
        subtrahend: &'static str,
    },
    /// left * right
    Product {
        left: &'static str,
        right: &'static str,
    },
    /// base - (charges[0] + charges[1])
    NetOfCharges {
        base: &'static str,
        charges: [&'static str; 2],
    },
    /// numerator / denominator, times 100 when `percent`; 0 when the
    /// denominator is 0
    Ratio {
        numerator: &'static str,
        denominator: &'static str,
        percent: bool,
    },
}

/// A derived column: output name plus the formula that produces it.
#[derive(Debug, Clone)]
pub struct DerivedColumn {
    pub name: &'static str,
    pub formula: Formula,
}

impl DerivedColumn {
    pub const fn new(name: &'static str, formula: Formula) -> Self {
        Self { name, formula }
    }
}

/// Evaluate every derived column in order, appending each to the table.
/// Fails the whole stage on a missing or non-numeric operand; a summary
/// table silently missing a derived column is worse than a failed run.
pub fn derive(table: &mut TabularResult, derived: &[DerivedColumn]) -> Result<(), EtlError> {
    for spec in derived {
        let values = evaluate(table, spec)?;
        table.add_column(Column::new(spec.name, values))?;
        info!("📈 Derived column '{}' ({} rows)", spec.name, table.row_count());
    }
    Ok(())
}

fn evaluate(table: &TabularResult, spec: &DerivedColumn) -> Result<Vec<Value>, EtlError> {
    let values: Vec<Decimal> = match &spec.formula {
        Formula::Difference { minuend, subtrahend } => {
            let a = operand(table, spec.name, minuend)?;
            let b = operand(table, spec.name, subtrahend)?;
            a.iter().zip(&b).map(|(x, y)| round2(x - y)).collect()
        }
        Formula::Product { left, right } => {
            let a = operand(table, spec.name, left)?;
            let b = operand(table, spec.name, right)?;
            a.iter().zip(&b).map(|(x, y)| round2(x * y)).collect()
        }
        Formula::NetOfCharges { base, charges } => {
            let a = operand(table, spec.name, base)?;
            let c0 = operand(table, spec.name, charges[0])?;
            let c1 = operand(table, spec.name, charges[1])?;
            a.iter()
                .zip(c0.iter().zip(&c1))
                .map(|(x, (y, z))| round2(x - (y + z)))
                .collect()
        }
        Formula::Ratio {
            numerator,
            denominator,
            percent,
        } => {
            let num = operand(table, spec.name, numerator)?;
            let den = operand(table, spec.name, denominator)?;
            num.iter()
                .zip(&den)
                .map(|(n, d)| {
                    if d.is_zero() {
                        Decimal::ZERO
                    } else if *percent {
                        round2(n / d * Decimal::ONE_HUNDRED)
                    } else {
                        round2(n / d)
                    }
                })
                .collect()
        }
    };
    Ok(values.into_iter().map(Value::Num).collect())
}

/// Fetch an operand column as decimals. Errors name both the derived
/// column and the operand so a failed run points at the exact formula.
fn operand(
    table: &TabularResult,
    derived: &'static str,
    name: &str,
) -> Result<Vec<Decimal>, EtlError> {
    let column = table.column(name).ok_or_else(|| {
        EtlError::transform(
            "derive",
            format!("'{}' needs missing operand column '{}'", derived, name),
        )
    })?;
    column
        .values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            value.as_decimal().ok_or_else(|| {
                EtlError::transform(
                    "derive",
                    format!(
                        "'{}' operand '{}' row {} is not numeric: {:?}",
                        derived, name, row, value
                    ),
                )
            })
        })
        .collect()
}
