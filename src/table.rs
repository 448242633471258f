//! In-memory tabular result
//!
//! `TabularResult` is the unit of work passed between pipeline stages: an
//! ordered sequence of named columns with equal row counts. The read stage
//! creates one, the cleaner and derivation engine mutate it in place, and
//! the materializer consumes it.

use crate::error::EtlError;
use rust_decimal::Decimal;

/// A single cell value. Cells are self-describing; the declared column
/// types live on the destination schema (`schema::ColumnDef`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Num(Decimal),
    Text(String),
}

impl Value {
    /// Numeric view of the cell, used by rounding and derivation.
    /// Text cells parse if they hold a decimal literal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Num(d) => Some(*d),
            Value::Text(t) => t.trim().parse().ok(),
        }
    }

    /// Text representation used by the trim pass. A numeric cell becomes
    /// its literal form, so a filled-in `Int(0)` stringifies to `"0"`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Num(d) => d.to_string(),
            Value::Text(t) => t.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Declared column type for destination schemas. Precision and scale are
/// carried so DDL reproduces the original NUMERIC(p, s) declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Integer,
    Decimal { precision: u8, scale: u8 },
    Varchar(u16),
    Char(u8),
    Date,
}

/// A named column of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Ordered collection of equal-length, uniquely-named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularResult {
    columns: Vec<Column>,
}

impl TabularResult {
    /// Build a result, validating the two structural invariants:
    /// unique column names and identical row counts.
    pub fn new(columns: Vec<Column>) -> Result<Self, EtlError> {
        let mut result = Self {
            columns: Vec::with_capacity(columns.len()),
        };
        for column in columns {
            result.add_column(column)?;
        }
        Ok(result)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Append a column, enforcing the structural invariants.
    pub fn add_column(&mut self, column: Column) -> Result<(), EtlError> {
        if self.column(&column.name).is_some() {
            return Err(EtlError::transform(
                "table",
                format!("duplicate column name '{}'", column.name),
            ));
        }
        if !self.columns.is_empty() && column.values.len() != self.row_count() {
            return Err(EtlError::transform(
                "table",
                format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.values.len(),
                    self.row_count()
                ),
            ));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Remove the named columns. Missing names are a transform error so a
    /// drifted query contract fails the run instead of passing silently.
    pub fn drop_columns(&mut self, names: &[&str]) -> Result<(), EtlError> {
        for name in names {
            if self.column(name).is_none() {
                return Err(EtlError::transform(
                    "table",
                    format!("cannot drop missing column '{}'", name),
                ));
            }
        }
        self.columns.retain(|c| !names.contains(&c.name.as_str()));
        Ok(())
    }

    /// True if any cell in any column is absent.
    pub fn has_nulls(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.values.iter().any(Value::is_null))
    }
}
