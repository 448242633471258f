//! Destination table schemas
//!
//! Plain schema descriptors consumed by the materializer: a table name and
//! a list of typed column definitions, from which DDL and the insert
//! statement are generated. No ORM layer, no shared metadata registry; each
//! pipeline variant constructs its own schema locally.
//!
//! Column names and NUMERIC precisions reproduce the existing reporting
//! tables bit-for-bit so downstream consumers keep working.

use crate::table::SemanticType;

/// One destination column: name, declared type, nullability.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: SemanticType,
    pub nullable: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, ty: SemanticType) -> Self {
        // Summary columns are nullable in the destination store; the
        // cleaner guarantees no nulls actually arrive.
        Self {
            name,
            ty,
            nullable: true,
        }
    }
}

/// A versioned destination table contract. Dropped and recreated on every
/// pipeline run; there is no schema migration.
#[derive(Debug, Clone)]
pub struct DestinationSchema {
    pub table: &'static str,
    pub columns: Vec<ColumnDef>,
}

impl DestinationSchema {
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table)
    }

    /// CREATE TABLE with a synthetic autoincrement primary key ahead of the
    /// schema columns, matching the existing reporting tables.
    pub fn create_sql(&self) -> String {
        let mut cols = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        for col in &self.columns {
            let mut def = format!("{} {}", col.name, sql_type(col.ty));
            if !col.nullable {
                def.push_str(" NOT NULL");
            }
            cols.push(def);
        }
        format!("CREATE TABLE {} (\n    {}\n)", self.table, cols.join(",\n    "))
    }

    /// Parameterized insert naming the schema columns, so row columns can
    /// be a superset in any order.
    pub fn insert_sql(&self) -> String {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        let params: Vec<&str> = self.columns.iter().map(|_| "?").collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            params.join(", ")
        )
    }
}

fn sql_type(ty: SemanticType) -> String {
    match ty {
        SemanticType::Integer => "INTEGER".to_string(),
        SemanticType::Decimal { precision, scale } => {
            format!("NUMERIC({}, {})", precision, scale)
        }
        SemanticType::Varchar(len) => format!("VARCHAR({})", len),
        SemanticType::Char(len) => format!("CHAR({})", len),
        SemanticType::Date => "DATE".to_string(),
    }
}

const MONEY: SemanticType = SemanticType::Decimal {
    precision: 10,
    scale: 2,
};
const TOTAL: SemanticType = SemanticType::Decimal {
    precision: 15,
    scale: 2,
};
const NAME: SemanticType = SemanticType::Varchar(255);

/// Rolled-up `sales_summary` (canonical variant).
pub fn sales_summary_rolled_up() -> DestinationSchema {
    DestinationSchema {
        table: "sales_summary",
        columns: vec![
            ColumnDef::new("dates", SemanticType::Date),
            ColumnDef::new("channel", NAME),
            ColumnDef::new("brand", NAME),
            ColumnDef::new("product_category", NAME),
            ColumnDef::new("country", NAME),
            ColumnDef::new("return_amount", MONEY),
            ColumnDef::new("discount_amount", MONEY),
            ColumnDef::new("total_cost", TOTAL),
            ColumnDef::new("total_sales", TOTAL),
            ColumnDef::new("net_sales", TOTAL),
            ColumnDef::new("net_profit", TOTAL),
            ColumnDef::new("profit_margin", MONEY),
        ],
    }
}

/// Detailed `sales_summary` with the full dimension grain.
pub fn sales_summary_detailed() -> DestinationSchema {
    DestinationSchema {
        table: "sales_summary",
        columns: vec![
            ColumnDef::new("dates", SemanticType::Date),
            ColumnDef::new("years", SemanticType::Integer),
            ColumnDef::new("quarters", SemanticType::Char(2)),
            ColumnDef::new("months", NAME),
            ColumnDef::new("channel_name", NAME),
            ColumnDef::new("brand_name", NAME),
            ColumnDef::new("class_name", NAME),
            ColumnDef::new("continent_name", NAME),
            ColumnDef::new("country_name", NAME),
            ColumnDef::new("state_province_name", NAME),
            ColumnDef::new("product_category_name", NAME),
            ColumnDef::new("product_sub_category_name", NAME),
            ColumnDef::new("unit_cost", MONEY),
            ColumnDef::new("unit_price", MONEY),
            ColumnDef::new("sales_quantity", SemanticType::Integer),
            ColumnDef::new("return_quantity", SemanticType::Integer),
            ColumnDef::new("return_amount", MONEY),
            ColumnDef::new("discount_quantity", SemanticType::Integer),
            ColumnDef::new("discount_amount", MONEY),
            ColumnDef::new("total_cost", TOTAL),
            ColumnDef::new("total_sales", TOTAL),
            ColumnDef::new("net_sales", TOTAL),
            ColumnDef::new("net_profit", TOTAL),
        ],
    }
}

/// Per-vendor `vendor_summary`.
pub fn vendor_summary() -> DestinationSchema {
    DestinationSchema {
        table: "vendor_summary",
        columns: vec![
            ColumnDef::new("vendor_name", NAME),
            ColumnDef::new("purchase_quantity", SemanticType::Integer),
            ColumnDef::new("total_purchase", TOTAL),
            ColumnDef::new("total_excise_tax", MONEY),
            ColumnDef::new("total_freight_cost", MONEY),
            ColumnDef::new("sales_quantity", SemanticType::Integer),
            ColumnDef::new("total_sales", TOTAL),
            ColumnDef::new("gross_profit", TOTAL),
            ColumnDef::new("profit_margin", MONEY),
            ColumnDef::new("stock_turnover", MONEY),
            ColumnDef::new("sales_to_purchase_ratio", MONEY),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sql_shape() {
        let schema = sales_summary_rolled_up();
        let ddl = schema.create_sql();
        assert!(ddl.starts_with("CREATE TABLE sales_summary"));
        assert!(ddl.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(ddl.contains("dates DATE"));
        assert!(ddl.contains("profit_margin NUMERIC(10, 2)"));
        assert!(ddl.contains("net_profit NUMERIC(15, 2)"));
    }

    #[test]
    fn test_insert_sql_names_every_column() {
        let schema = vendor_summary();
        let sql = schema.insert_sql();
        assert!(sql.starts_with("INSERT INTO vendor_summary ("));
        for col in &schema.columns {
            assert!(sql.contains(col.name));
        }
        assert_eq!(
            sql.matches('?').count(),
            schema.columns.len(),
            "one placeholder per schema column"
        );
    }

    #[test]
    fn test_drop_sql_is_idempotent_form() {
        assert_eq!(
            sales_summary_detailed().drop_sql(),
            "DROP TABLE IF EXISTS sales_summary"
        );
    }
}
