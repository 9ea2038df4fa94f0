//! # Monthly Statistics
//!
//! Folds a month of sales into per-category revenue and quantity buckets.
//!
//! ## Fold
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  universe (creation order):   [ Shampoo ]  [ Masks ]  [ Oils ]          │
//! │                                    ▲           ▲          ▲             │
//! │  name → index map ─────────────────┴───────────┴──────────┘             │
//! │                                                                         │
//! │  for each sale:        totalSales += 1                                  │
//! │    for each line:      bucket = lowest index among the product's        │
//! │                                 category names                          │
//! │                        bucket.total    += price × quantity              │
//! │                        bucket.quantity += quantity                      │
//! │                                                                         │
//! │  totalRevenue      = Σ bucket.total      (never summed separately)      │
//! │  totalProductsSold = Σ bucket.quantity                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A product tagged with several categories credits exactly one bucket:
//! the first one in universe order. Lines whose product matches no bucket
//! still count the sale but add no revenue.

use std::collections::HashMap;

use crate::calendar::MonthWindow;
use crate::money::Money;
use crate::types::Sale;

/// One bucket of a monthly report.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStatistics {
    pub name: String,
    pub total: Money,
    pub quantity: i64,
    pub percentage_of_total_revenue: f64,
    pub percentage_of_total_products_sold: f64,
}

/// Monthly dashboard for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    pub total_revenue: Money,
    pub total_sales: i64,
    pub total_products_sold: i64,
    pub average_daily_sales: f64,
    /// In major units.
    pub average_daily_revenue: f64,
    pub categories: Vec<CategoryStatistics>,
}

#[derive(Debug)]
struct Bucket<'a> {
    name: &'a str,
    total: Money,
    quantity: i64,
}

/// Returns `part / whole × 100`, or 0 when `whole` is 0.
fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Builds the dashboard for `sales` that fall in `window`.
///
/// `universe` is the channel's category names in creation order. Every
/// name becomes a bucket, so zero buckets are still reported. The caller
/// is responsible for passing only sales of the right channel and window.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use salon_core::{statistics::aggregate, MonthWindow};
///
/// let window = MonthWindow::containing(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()).unwrap();
/// let report = aggregate(&[], &["Face".to_string()], &window);
/// assert_eq!(report.total_sales, 0);
/// assert_eq!(report.categories[0].percentage_of_total_revenue, 0.0);
/// ```
pub fn aggregate(sales: &[Sale], universe: &[String], window: &MonthWindow) -> DashboardOverview {
    let mut buckets: Vec<Bucket<'_>> = Vec::with_capacity(universe.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(universe.len());

    for name in universe {
        // A duplicated name keeps its first position.
        index.entry(name.as_str()).or_insert_with(|| {
            buckets.push(Bucket {
                name: name.as_str(),
                total: Money::zero(),
                quantity: 0,
            });
            buckets.len() - 1
        });
    }

    let mut total_sales = 0_i64;

    for sale in sales {
        total_sales += 1;

        for line in &sale.products {
            let first_match = line
                .product
                .category_names()
                .filter_map(|name| index.get(name).copied())
                .min();

            if let Some(i) = first_match {
                let bucket = &mut buckets[i];
                bucket.total += line.product.line_total(line.product_quantity);
                bucket.quantity = bucket.quantity.saturating_add(line.product_quantity);
            }
        }
    }

    let total_revenue: Money = buckets.iter().map(|b| b.total).sum();
    let total_products_sold: i64 = buckets.iter().map(|b| b.quantity).sum();
    let days = window.days_in_month();

    let categories = buckets
        .into_iter()
        .map(|b| CategoryStatistics {
            name: b.name.to_string(),
            total: b.total,
            quantity: b.quantity,
            percentage_of_total_revenue: percentage(b.total.cents(), total_revenue.cents()),
            percentage_of_total_products_sold: percentage(b.quantity, total_products_sold),
        })
        .collect();

    DashboardOverview {
        total_revenue,
        total_sales,
        total_products_sold,
        average_daily_sales: total_sales as f64 / days as f64,
        average_daily_revenue: total_revenue.to_major() / days as f64,
        categories,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
