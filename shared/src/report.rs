//! Reporting helpers
//!
//! Pure aggregation over in-memory collections. Display layers load products
//! and sales from the storage engine and hand them here; nothing in this
//! module performs I/O.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Product, Sale};

/// Dashboard summary - headline numbers for the landing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub product_count: usize,
    pub low_stock_count: usize,
    pub today_sale_count: usize,
    pub today_revenue: f64,
}

/// Per-product sales aggregate within a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    /// Denormalized product name as recorded on the sales
    pub product_name: String,
    pub units_sold: u32,
    pub revenue: f64,
}

/// Sales report - totals and top sellers, optionally for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    /// Day filter the report was built with (`YYYY-MM-DD`), if any
    pub date: Option<String>,
    pub sale_count: usize,
    pub total_revenue: f64,
    pub total_units: u32,
    /// Top sellers by revenue, descending
    pub top_products: Vec<ProductSales>,
}

/// Number of top sellers included in a [`SalesReport`]
pub const TOP_PRODUCT_LIMIT: usize = 5;

/// Products whose stock is strictly below `threshold`.
///
/// A product with `stock == threshold` is not low on stock.
pub fn low_stock_products<'a>(products: &'a [Product], threshold: u32) -> Vec<&'a Product> {
    products.iter().filter(|p| p.stock < threshold).collect()
}

/// Headline numbers for the dashboard.
///
/// `today` is the calendar-day string sales are matched against.
pub fn dashboard_summary(
    products: &[Product],
    sales: &[Sale],
    today: &str,
    low_stock_threshold: u32,
) -> DashboardSummary {
    let today_sales: Vec<&Sale> = sales.iter().filter(|s| s.date == today).collect();
    DashboardSummary {
        product_count: products.len(),
        low_stock_count: low_stock_products(products, low_stock_threshold).len(),
        today_sale_count: today_sales.len(),
        today_revenue: today_sales.iter().map(|s| s.total).sum(),
    }
}

/// Build a sales report, optionally restricted to one calendar day.
///
/// Sales are grouped by their denormalized product name, so history for a
/// deleted product still shows up under the name it was sold as.
pub fn sales_report(sales: &[Sale], date: Option<&str>) -> SalesReport {
    let filtered: Vec<&Sale> = match date {
        Some(day) => sales.iter().filter(|s| s.date == day).collect(),
        None => sales.iter().collect(),
    };

    let mut by_product: HashMap<&str, (u32, f64)> = HashMap::new();
    for sale in &filtered {
        let entry = by_product.entry(sale.product_name.as_str()).or_insert((0, 0.0));
        entry.0 += sale.quantity;
        entry.1 += sale.total;
    }

    let mut top_products: Vec<ProductSales> = by_product
        .into_iter()
        .map(|(name, (units_sold, revenue))| ProductSales {
            product_name: name.to_string(),
            units_sold,
            revenue,
        })
        .collect();
    top_products.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    top_products.truncate(TOP_PRODUCT_LIMIT);

    SalesReport {
        date: date.map(str::to_string),
        sale_count: filtered.len(),
        total_revenue: filtered.iter().map(|s| s.total).sum(),
        total_units: filtered.iter().map(|s| s.quantity).sum(),
        top_products,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: u64, name: &str, stock: u32) -> Product {
        Product {
            id,
            name: name.to_string(),
            category: "General".to_string(),
            price: 10.0,
            stock,
        }
    }

    fn sale(id: u64, product_name: &str, quantity: u32, total: f64, date: &str) -> Sale {
        Sale {
            id,
            product_id: id,
            product_name: product_name.to_string(),
            quantity,
            price: total / quantity as f64,
            total,
            date: date.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_strictly_below_threshold() {
        let products = vec![product(1, "Rice", 4), product(2, "Beans", 5), product(3, "Oil", 6)];

        let low = low_stock_products(&products, 5);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Rice");
    }

    #[test]
    fn dashboard_counts_only_todays_sales() {
        let products = vec![product(1, "Rice", 3), product(2, "Beans", 50)];
        let sales = vec![
            sale(1, "Rice", 2, 100.0, "2026-08-27"),
            sale(2, "Beans", 1, 30.0, "2026-08-27"),
            sale(3, "Rice", 5, 250.0, "2026-08-26"),
        ];

        let summary = dashboard_summary(&products, &sales, "2026-08-27", 10);
        assert_eq!(summary.product_count, 2);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.today_sale_count, 2);
        assert_eq!(summary.today_revenue, 130.0);
    }

    #[test]
    fn sales_report_groups_by_product_name() {
        let sales = vec![
            sale(1, "Rice", 2, 100.0, "2026-08-27"),
            sale(2, "Rice", 3, 150.0, "2026-08-27"),
            sale(3, "Beans", 1, 30.0, "2026-08-27"),
        ];

        let report = sales_report(&sales, None);
        assert_eq!(report.sale_count, 3);
        assert_eq!(report.total_revenue, 280.0);
        assert_eq!(report.total_units, 6);
        assert_eq!(report.top_products.len(), 2);
        assert_eq!(report.top_products[0].product_name, "Rice");
        assert_eq!(report.top_products[0].units_sold, 5);
        assert_eq!(report.top_products[0].revenue, 250.0);
    }

    #[test]
    fn sales_report_date_filter() {
        let sales = vec![
            sale(1, "Rice", 2, 100.0, "2026-08-27"),
            sale(2, "Rice", 5, 250.0, "2026-08-26"),
        ];

        let report = sales_report(&sales, Some("2026-08-26"));
        assert_eq!(report.sale_count, 1);
        assert_eq!(report.total_revenue, 250.0);
        assert_eq!(report.date.as_deref(), Some("2026-08-26"));
    }

    #[test]
    fn top_products_are_capped() {
        let sales: Vec<Sale> = (0..8)
            .map(|i| sale(i, &format!("P{i}"), 1, (i + 1) as f64, "2026-08-27"))
            .collect();

        let report = sales_report(&sales, None);
        assert_eq!(report.top_products.len(), TOP_PRODUCT_LIMIT);
        assert_eq!(report.top_products[0].product_name, "P7");
    }
}
