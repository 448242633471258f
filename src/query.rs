//! Aggregation query builder
//!
//! Each summary variant carries one fixed read query: a CTE pre-aggregates
//! the fact table at its grouping key, then left-joins dimension tables so
//! every pre-aggregated row survives even without a dimension match.
//!
//! Reducer policy: `SUM` for additive measures (quantities, amounts), `MIN`
//! for quasi-constant measures (unit cost, unit price, freight cost) that
//! should not vary within a key. If the raw data does vary, MIN wins over
//! any other value in the group, which is observable and tested.

/// A read query plus its declared output contract. Downstream stages
/// consume the result positionally, so the column list is part of the
/// query, not an afterthought.
#[derive(Debug, Clone)]
pub struct AggregationQuery {
    pub sql: &'static str,
    pub columns: &'static [&'static str],
}

/// Rolled-up sales summary (canonical variant): daily grain by channel,
/// brand, product category and country. The outer SELECT re-groups the
/// pre-aggregated CTE onto dimension names, so duplicate dimension matches
/// collapse instead of fanning out.
pub fn sales_rolled_up() -> AggregationQuery {
    AggregationQuery {
        sql: "
        WITH sales_summary AS (
            SELECT
                dates,
                channel_key,
                product_key,
                geo_key,
                product_sub_category_key,
                MIN(unit_cost) AS unit_cost,
                MIN(unit_price) AS unit_price,
                SUM(sales_quantity) AS sales_quantity,
                SUM(return_amount) AS return_amount,
                SUM(discount_amount) AS discount_amount
            FROM
                sales
            GROUP BY
                dates,
                channel_key,
                product_key,
                geo_key,
                product_sub_category_key
        )
        SELECT
            ss.dates AS dates,
            ch.channel_name AS channel,
            pd.brand_name AS brand,
            psc.product_category_name AS product_category,
            gg.country_name AS country,
            MIN(ss.unit_cost) AS unit_cost,
            MIN(ss.unit_price) AS unit_price,
            SUM(ss.sales_quantity) AS sales_quantity,
            SUM(ss.return_amount) AS return_amount,
            SUM(ss.discount_amount) AS discount_amount
        FROM
            sales_summary ss
            LEFT JOIN channels ch
                ON ss.channel_key = ch.channel_key
            LEFT JOIN products pd
                ON ss.product_key = pd.product_key
            LEFT JOIN geography gg
                ON ss.geo_key = gg.geo_key
            LEFT JOIN product_sub_category psc
                ON ss.product_sub_category_key = psc.product_sub_category_key
        GROUP BY
            ss.dates,
            ch.channel_name,
            pd.brand_name,
            psc.product_category_name,
            gg.country_name",
        columns: &[
            "dates",
            "channel",
            "brand",
            "product_category",
            "country",
            "unit_cost",
            "unit_price",
            "sales_quantity",
            "return_amount",
            "discount_amount",
        ],
    }
}

/// Detailed sales summary: full dimension attributes at the CTE grain with
/// no outer re-group. Duplicate dimension matches are NOT deduplicated
/// here; a fan-out join inflates rows, which is this variant's contract.
pub fn sales_detailed() -> AggregationQuery {
    AggregationQuery {
        sql: "
        WITH sales_summary AS (
            SELECT
                dates,
                channel_key,
                product_key,
                geo_key,
                product_sub_category_key,
                MIN(unit_cost) AS unit_cost,
                MIN(unit_price) AS unit_price,
                SUM(sales_quantity) AS sales_quantity,
                SUM(return_quantity) AS return_quantity,
                SUM(return_amount) AS return_amount,
                SUM(discount_quantity) AS discount_quantity,
                SUM(discount_amount) AS discount_amount
            FROM sales
            GROUP BY
                dates,
                channel_key,
                product_key,
                geo_key,
                product_sub_category_key
        )
        SELECT
            ss.dates AS dates,
            cd.years AS years,
            cd.quarters AS quarters,
            cd.months AS months,
            ch.channel_name AS channel_name,
            pd.brand_name AS brand_name,
            pd.class_name AS class_name,
            gg.continent_name AS continent_name,
            gg.country_name AS country_name,
            gg.state_province_name AS state_province_name,
            psc.product_category_name AS product_category_name,
            psc.product_sub_category_name AS product_sub_category_name,
            ss.unit_cost AS unit_cost,
            ss.unit_price AS unit_price,
            ss.sales_quantity AS sales_quantity,
            ss.return_quantity AS return_quantity,
            ss.return_amount AS return_amount,
            ss.discount_quantity AS discount_quantity,
            ss.discount_amount AS discount_amount
        FROM sales_summary ss
        LEFT JOIN calender cd
            ON ss.dates = cd.dates
        LEFT JOIN channels ch
            ON ss.channel_key = ch.channel_key
        LEFT JOIN products pd
            ON ss.product_key = pd.product_key
        LEFT JOIN geography gg
            ON ss.geo_key = gg.geo_key
        LEFT JOIN product_sub_category psc
            ON ss.product_sub_category_key = psc.product_sub_category_key",
        columns: &[
            "dates",
            "years",
            "quarters",
            "months",
            "channel_name",
            "brand_name",
            "class_name",
            "continent_name",
            "country_name",
            "state_province_name",
            "product_category_name",
            "product_sub_category_name",
            "unit_cost",
            "unit_price",
            "sales_quantity",
            "return_quantity",
            "return_amount",
            "discount_quantity",
            "discount_amount",
        ],
    }
}

/// Vendor purchase/sales summary: per-vendor grain over two fact tables.
/// Freight cost uses the MIN reducer (quasi-constant per vendor); the
/// MIN-vs-AVG question is tracked in DESIGN.md, not guessed at here.
pub fn vendor_summary() -> AggregationQuery {
    AggregationQuery {
        sql: "
        WITH purchase_summary AS (
            SELECT
                vendor_key,
                SUM(purchase_quantity) AS purchase_quantity,
                SUM(purchase_amount) AS total_purchase,
                SUM(excise_tax) AS total_excise_tax,
                MIN(freight_cost) AS total_freight_cost
            FROM purchases
            GROUP BY vendor_key
        ),
        vendor_sales AS (
            SELECT
                vendor_key,
                SUM(sales_quantity) AS sales_quantity,
                SUM(sales_amount) AS total_sales
            FROM vendor_sales_facts
            GROUP BY vendor_key
        )
        SELECT
            vd.vendor_name AS vendor_name,
            ps.purchase_quantity AS purchase_quantity,
            ps.total_purchase AS total_purchase,
            ps.total_excise_tax AS total_excise_tax,
            ps.total_freight_cost AS total_freight_cost,
            vs.sales_quantity AS sales_quantity,
            vs.total_sales AS total_sales
        FROM purchase_summary ps
        LEFT JOIN vendors vd
            ON ps.vendor_key = vd.vendor_key
        LEFT JOIN vendor_sales vs
            ON ps.vendor_key = vs.vendor_key",
        columns: &[
            "vendor_name",
            "purchase_quantity",
            "total_purchase",
            "total_excise_tax",
            "total_freight_cost",
            "sales_quantity",
            "total_sales",
        ],
    }
}
