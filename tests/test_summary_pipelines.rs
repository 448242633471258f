//! End-to-end runs of the summary pipelines against a real SQLite store.
//!
//! Fixtures populate the raw fact and dimension tables, then each test
//! runs a full pipeline and inspects the materialized destination table.

#[cfg(test)]
mod summary_pipeline_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use salesflow::{run_pipeline, EtlConfig, PipelineSpec, SqliteStore, SummaryStore};
    use tempfile::tempdir;

    fn open_store(db_path: &std::path::Path) -> SqliteStore {
        let config = EtlConfig {
            db_path: db_path.to_str().unwrap().to_string(),
            ..EtlConfig::default()
        };
        SqliteStore::open(&config).unwrap()
    }

    fn load_sales_fixtures(store: &SqliteStore) {
        store
            .execute_batch(
                "
            CREATE TABLE sales (
                dates TEXT, channel_key INTEGER, product_key INTEGER,
                geo_key INTEGER, product_sub_category_key INTEGER,
                unit_cost REAL, unit_price REAL,
                sales_quantity INTEGER, return_quantity INTEGER,
                return_amount REAL, discount_quantity INTEGER,
                discount_amount REAL
            );
            CREATE TABLE channels (channel_key INTEGER, channel_name TEXT);
            CREATE TABLE products (product_key INTEGER, brand_name TEXT, class_name TEXT);
            CREATE TABLE geography (
                geo_key INTEGER, continent_name TEXT,
                country_name TEXT, state_province_name TEXT
            );
            CREATE TABLE product_sub_category (
                product_sub_category_key INTEGER,
                product_category_name TEXT, product_sub_category_name TEXT
            );
            CREATE TABLE calender (dates TEXT, years INTEGER, quarters TEXT, months TEXT);

            -- Two rows sharing one aggregation key: quantities add up,
            -- unit cost/price take the MIN, not an average.
            INSERT INTO sales VALUES
                ('2024-01-15', 1, 1, 1, 1, 5.00, 9.99, 2, 0, 1.00, 1, 0.50),
                ('2024-01-15', 1, 1, 1, 1, 5.10, 10.01, 3, 0, 0.00, 0, 0.00);
            -- A row whose channel has no dimension match (channel_key 2)
            INSERT INTO sales VALUES
                ('2024-01-16', 2, 1, 1, 1, 4.00, 8.00, 1, 0, 0.00, 0, 0.00);

            INSERT INTO channels VALUES (1, '  Online  ');
            INSERT INTO products VALUES (1, 'Contoso', 'Economy');
            INSERT INTO geography VALUES (1, 'Europe', 'Germany', 'Bavaria');
            INSERT INTO product_sub_category VALUES (1, 'Audio', 'Headphones');
            INSERT INTO calender VALUES ('2024-01-15', 2024, 'Q1', 'January');
            INSERT INTO calender VALUES ('2024-01-16', 2024, 'Q1', 'January');
            ",
            )
            .unwrap();
    }

    fn load_vendor_fixtures(store: &SqliteStore) {
        store
            .execute_batch(
                "
            CREATE TABLE purchases (
                vendor_key INTEGER, purchase_quantity INTEGER,
                purchase_amount REAL, excise_tax REAL, freight_cost REAL
            );
            CREATE TABLE vendor_sales_facts (
                vendor_key INTEGER, sales_quantity INTEGER, sales_amount REAL
            );
            CREATE TABLE vendors (vendor_key INTEGER, vendor_name TEXT);

            INSERT INTO purchases VALUES
                (1, 6, 30.00, 0.60, 2.00),
                (1, 4, 30.00, 0.40, 2.50);
            -- Vendor 2 has zero purchases: every ratio denominator is 0
            INSERT INTO purchases VALUES (2, 0, 0.00, 0.00, 0.00);

            INSERT INTO vendor_sales_facts VALUES (1, 8, 100.00);
            INSERT INTO vendor_sales_facts VALUES (2, 0, 0.00);

            INSERT INTO vendors VALUES (1, '  Acme  ');
            INSERT INTO vendors VALUES (2, 'Globex');
            ",
            )
            .unwrap();
    }

    #[test]
    fn test_sales_rolled_up_end_to_end() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("etl.db"));
        load_sales_fixtures(&store);

        let report = run_pipeline(&store, &PipelineSpec::sales_summary()).unwrap();
        assert_eq!(report.rows_read, 2);
        assert_eq!(report.rows_written, 2);

        let conn = Connection::open(dir.path().join("etl.db")).unwrap();

        // MIN reducer: unit_price 9.99/10.01 pre-aggregates to 9.99, so
        // total_sales = 9.99 * 5, not an average-based figure.
        let (total_cost, total_sales, net_sales, net_profit, margin): (f64, f64, f64, f64, f64) =
            conn.query_row(
                "SELECT total_cost, total_sales, net_sales, net_profit, profit_margin
                 FROM sales_summary WHERE channel = 'Online'",
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .unwrap();
        assert_eq!(total_cost, 25.00);
        assert_eq!(total_sales, 49.95);
        assert_eq!(net_sales, 48.45);
        assert_eq!(net_profit, 23.45);
        assert_eq!(margin, 48.40);

        // Unmatched channel dimension: absent value filled with 0 and
        // stringified by the trim pass.
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sales_summary WHERE channel = '0'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);

        // Helper columns were dropped before materialization
        let has_unit_price: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('sales_summary')
                 WHERE name = 'unit_price'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(has_unit_price, 0);
    }

    #[test]
    fn test_double_run_is_full_replace_not_append() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("etl.db"));
        load_sales_fixtures(&store);

        let spec = PipelineSpec::sales_summary();
        let first = run_pipeline(&store, &spec).unwrap();
        let second = run_pipeline(&store, &spec).unwrap();
        assert_eq!(first.rows_written, second.rows_written);

        let conn = Connection::open(dir.path().join("etl.db")).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sales_summary", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count as usize, first.rows_written);
    }

    #[test]
    fn test_sales_detailed_end_to_end() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("etl.db"));
        load_sales_fixtures(&store);

        let report = run_pipeline(&store, &PipelineSpec::sales_summary_detailed()).unwrap();
        assert_eq!(report.rows_written, 2);

        let conn = Connection::open(dir.path().join("etl.db")).unwrap();
        let (quarters, months, net_profit): (String, String, f64) = conn
            .query_row(
                "SELECT quarters, months, net_profit
                 FROM sales_summary WHERE channel_name = 'Online'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(quarters, "Q1");
        assert_eq!(months, "January");
        assert_eq!(net_profit, 23.45);

        // Detailed variant keeps the per-unit columns
        let (unit_cost, unit_price): (f64, f64) = conn
            .query_row(
                "SELECT unit_cost, unit_price FROM sales_summary
                 WHERE channel_name = 'Online'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(unit_cost, 5.00);
        assert_eq!(unit_price, 9.99);
    }

    #[test]
    fn test_vendor_summary_with_degenerate_denominators() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("etl.db"));
        load_vendor_fixtures(&store);

        run_pipeline(&store, &PipelineSpec::vendor_summary()).unwrap();

        let conn = Connection::open(dir.path().join("etl.db")).unwrap();

        // Vendor 1: sales 100, purchases 60 -> gross 40.00, margin 40.00,
        // turnover 8/10 = 0.80, ratio 100/60 = 1.67
        let (gross, margin, turnover, ratio): (f64, f64, f64, f64) = conn
            .query_row(
                "SELECT gross_profit, profit_margin, stock_turnover, sales_to_purchase_ratio
                 FROM vendor_summary WHERE vendor_name = 'Acme'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(gross, 40.00);
        assert_eq!(margin, 40.00);
        assert_eq!(turnover, 0.80);
        assert_eq!(ratio, 1.67);

        // Vendor 2: all denominators zero -> convention says 0, not NaN
        let (margin2, turnover2, ratio2): (f64, f64, f64) = conn
            .query_row(
                "SELECT profit_margin, stock_turnover, sales_to_purchase_ratio
                 FROM vendor_summary WHERE vendor_name = 'Globex'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(margin2, 0.0);
        assert_eq!(turnover2, 0.0);
        assert_eq!(ratio2, 0.0);
    }

    #[test]
    fn test_missing_source_table_fails_loudly() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("etl.db"));
        // No fixtures: the read query must fail the run, not continue
        let err = run_pipeline(&store, &PipelineSpec::sales_summary()).unwrap_err();
        assert!(err.to_string().contains("query error"));
    }

    #[test]
    fn test_cleaned_output_has_no_absent_values() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("etl.db"));
        load_sales_fixtures(&store);

        run_pipeline(&store, &PipelineSpec::sales_summary()).unwrap();

        let table = store
            .execute_read("SELECT dates, channel, brand, product_category, country FROM sales_summary")
            .unwrap();
        assert!(!table.has_nulls());
    }

    #[test]
    fn test_min_reducer_verified_at_store_level() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("etl.db"));
        load_sales_fixtures(&store);

        // Directly run the aggregation query and check the reducer output
        let table = store
            .execute_read(salesflow::query::sales_rolled_up().sql)
            .unwrap();
        let prices = &table.column("unit_price").unwrap().values;
        let min_price = prices
            .iter()
            .filter_map(|v| v.as_decimal())
            .min()
            .unwrap();
        assert_eq!(min_price, dec!(8.00));
        assert!(prices
            .iter()
            .filter_map(|v| v.as_decimal())
            .any(|p| p == dec!(9.99)));
    }
}
