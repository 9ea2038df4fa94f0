//! # Domain Types
//!
//! Core domain types used throughout Salon Stock.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │◄─►│    Category     │   │      Sale       │       │
//! │  │  ─────────────  │ N:M  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  price (Money)  │   │  name (unique   │   │  user_id        │       │
//! │  │  stock          │   │   per channel)  │   │  created_at     │       │
//! │  │  channel        │   │  channel        │   │  products[]  ───┼──┐    │
//! │  └────────▲────────┘   └─────────────────┘   └─────────────────┘  │    │
//! │           │                                                       │    │
//! │           │            ┌─────────────────┐                        │    │
//! │           └────────────│  SaleProduct    │◄───────────────────────┘    │
//! │                        │  product_quantity                            │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sale is not scoped to a channel. Channel filters over sales require
//! *every* line-item product to belong to the channel, so a mixed-channel
//! sale matches neither channel.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Channel
// =============================================================================

/// Sales/distribution partition for products, categories and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Channel {
    HairCare,
    Cosmetic,
}

impl Channel {
    /// Every channel, in declaration order.
    pub const ALL: [Channel; 2] = [Channel::HairCare, Channel::Cosmetic];

    /// Wire/storage representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::HairCare => "HAIR_CARE",
            Channel::Cosmetic => "COSMETIC",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "HAIR_CARE" => Ok(Channel::HairCare),
            "COSMETIC" => Ok(Channel::Cosmetic),
            _ => Err(ValidationError::NotAllowed {
                field: "channel".to_string(),
                allowed: Channel::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Stock Policy
// =============================================================================

/// What sale creation does when a product does not have enough stock.
///
/// ## Policies
/// - `AllowNegative` (default): always decrement, stock may go below zero.
/// - `RejectInsufficient`: fail the whole sale when any product's stock
///   does not cover the quantity sold in that sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    #[default]
    AllowNegative,
    RejectInsufficient,
}

impl StockPolicy {
    /// Decides whether `requested` units of a product may be sold when
    /// `available` are in stock.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::{CoreError, StockPolicy};
    ///
    /// assert!(StockPolicy::AllowNegative.check("p1", 2, 5).is_ok());
    /// assert!(matches!(
    ///     StockPolicy::RejectInsufficient.check("p1", 2, 5),
    ///     Err(CoreError::InsufficientStock { available: 2, requested: 5, .. })
    /// ));
    /// ```
    pub fn check(&self, product_id: &str, available: i64, requested: i64) -> CoreResult<()> {
        match self {
            StockPolicy::RejectInsufficient if available < requested => {
                Err(CoreError::InsufficientStock {
                    product_id: product_id.to_string(),
                    available,
                    requested,
                })
            }
            _ => Ok(()),
        }
    }
}

impl FromStr for StockPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow_negative" => Ok(StockPolicy::AllowNegative),
            "reject_insufficient" => Ok(StockPolicy::RejectInsufficient),
            _ => Err(ValidationError::NotAllowed {
                field: "stock_policy".to_string(),
                allowed: vec![
                    "allow_negative".to_string(),
                    "reject_insufficient".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category. Names are unique within a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub channel: Channel,
}

// =============================================================================
// Product
// =============================================================================

/// A product with its category associations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Current stock level. May be negative after oversells.
    pub stock: i64,

    /// Restock threshold; the product is "low stock" below this.
    pub min_stock: i64,

    /// Upper stock target.
    pub max_stock: i64,

    /// Channel this product is sold through.
    pub channel: Channel,

    /// Associated categories.
    pub categories: Vec<Category>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// True when stock has dropped under the minimum threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.min_stock
    }

    /// Returns `price × quantity`.
    #[inline]
    pub fn line_total(&self, quantity: i64) -> Money {
        self.price.multiply_quantity(quantity)
    }

    /// Iterates over the names of this product's categories.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }
}

/// Validated input for creating or fully replacing a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    pub channel: Channel,
    /// Category names; created on first use within the channel.
    pub categories: Vec<String>,
}

impl NewProduct {
    /// Category names with duplicates removed, first occurrence wins.
    pub fn unique_categories(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.categories.len());
        for name in &self.categories {
            let name = name.trim();
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }
}

/// Filter for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub channel: Option<Channel>,
    /// Keep only products with `stock < min_stock`.
    pub low_stock: bool,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Line items, in insertion order.
    pub products: Vec<SaleProduct>,
}

impl Sale {
    /// Sum of `price × quantity` over all line items at current prices.
    pub fn total(&self) -> Money {
        self.products
            .iter()
            .map(|line| line.product.line_total(line.product_quantity))
            .sum()
    }
}

/// A line item in a sale, with a snapshot of the product as it is now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleProduct {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub product_quantity: i64,
    pub product: Product,
}

/// One requested line of a new sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Validated input for creating a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub user_id: String,
    /// Defaults to the creation time when `None`.
    pub created_at: Option<DateTime<Utc>>,
    pub products: Vec<NewSaleLine>,
}

impl NewSale {
    /// Total quantity requested per product id.
    ///
    /// The same product may appear on several lines; stock checks need
    /// the combined amount.
    pub fn quantities_by_product(&self) -> BTreeMap<&str, i64> {
        let mut totals = BTreeMap::new();
        for line in &self.products {
            *totals.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
        }
        totals
    }
}

/// Filter for sale listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    /// Every line-item product must belong to this channel.
    pub channel: Option<Channel>,
    /// Exact match on the selling user.
    pub user_id: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price_cents: i64, stock: i64, min_stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            name: "Argan Shampoo".to_string(),
            price: Money::from_cents(price_cents),
            stock,
            min_stock,
            max_stock: 50,
            channel: Channel::HairCare,
            categories: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_channel_round_trip_strings() {
        assert_eq!("HAIR_CARE".parse::<Channel>().unwrap(), Channel::HairCare);
        assert_eq!("COSMETIC".parse::<Channel>().unwrap(), Channel::Cosmetic);
        assert!("cosmetic".parse::<Channel>().is_err());
        assert_eq!(Channel::HairCare.to_string(), "HAIR_CARE");
        assert_eq!(
            serde_json::to_string(&Channel::Cosmetic).unwrap(),
            "\"COSMETIC\""
        );
    }

    #[test]
    fn test_stock_policy_parse() {
        assert_eq!(StockPolicy::default(), StockPolicy::AllowNegative);
        assert_eq!(
            "reject_insufficient".parse::<StockPolicy>().unwrap(),
            StockPolicy::RejectInsufficient
        );
        assert!("strict".parse::<StockPolicy>().is_err());
    }

    #[test]
    fn test_stock_policy_check() {
        assert!(StockPolicy::AllowNegative.check("p1", 0, 9).is_ok());
        assert!(StockPolicy::RejectInsufficient.check("p1", 9, 9).is_ok());

        let err = StockPolicy::RejectInsufficient.check("p1", 5, 6).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p1: available 5, requested 6"
        );
    }

    #[test]
    fn test_low_stock() {
        assert!(product(100, 2, 5).is_low_stock());
        assert!(!product(100, 5, 5).is_low_stock());
    }

    #[test]
    fn test_line_total() {
        assert_eq!(product(500, 10, 0).line_total(3).cents(), 1500);
    }

    #[test]
    fn test_unique_categories() {
        let input = NewProduct {
            name: "Serum".to_string(),
            price: Money::from_cents(100),
            stock: 1,
            min_stock: 0,
            max_stock: 1,
            channel: Channel::Cosmetic,
            categories: vec!["Face".into(), "Eyes".into(), " Face ".into()],
        };
        assert_eq!(input.unique_categories(), vec!["Face", "Eyes"]);
    }

    #[test]
    fn test_quantities_by_product_combines_lines() {
        let sale = NewSale {
            user_id: "u1".to_string(),
            created_at: None,
            products: vec![
                NewSaleLine { product_id: "p1".into(), quantity: 2 },
                NewSaleLine { product_id: "p2".into(), quantity: 1 },
                NewSaleLine { product_id: "p1".into(), quantity: 3 },
            ],
        };
        let totals = sale.quantities_by_product();
        assert_eq!(totals["p1"], 5);
        assert_eq!(totals["p2"], 1);
    }

    #[test]
    fn test_sale_totals() {
        let now = Utc::now();
        let sale = Sale {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            created_at: now,
            products: vec![SaleProduct {
                id: "l1".to_string(),
                sale_id: "s1".to_string(),
                product_id: "p1".to_string(),
                product_quantity: 3,
                product: product(500, 7, 0),
            }],
        };
        assert_eq!(sale.total().cents(), 1500);
    }
}
