//! # salon-core: Pure Business Logic for Salon Stock
//!
//! This crate is the **heart** of Salon Stock. It contains the domain types
//! and all arithmetic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Salon Stock Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (axum)                              │   │
//! │  │    /products  ──►  /sales  ──►  /sales/statistics               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ salon-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ statistics │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  fold into │  │   rules   │  │   │
//! │  │   │   Sale    │  │           │  │  buckets   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    salon-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, sale transactions            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Sale, line items, inputs)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`calendar`] - Calendar-month report windows
//! - [`pagination`] - Page/offset math for sale listings
//! - [`statistics`] - Monthly per-category dashboard aggregation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use salon_core::money::Money;
//!
//! // Create money from cents (never accumulate floats!)
//! let price = Money::from_cents(500); // 5.00
//! let line_total = price.multiply_quantity(3);
//! assert_eq!(line_total.cents(), 1500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calendar;
pub mod error;
pub mod money;
pub mod pagination;
pub mod statistics;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calendar::MonthWindow;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pagination::{PageRequest, Pagination};
pub use statistics::{CategoryStatistics, DashboardOverview};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when a listing request does not carry a usable one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page a listing request may ask for; bigger sizes are clamped.
pub const MAX_PAGE_SIZE: i64 = 1_000;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 10000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Highest accepted unit price, in cents (1,000,000.00).
///
/// ## Headroom
/// ```text
/// MAX_PRICE_CENTS × MAX_ITEM_QUANTITY ≈ 1e12 cents per line
/// i64::MAX                            ≈ 9.2e18 cents
/// ```
/// Millions of maximal lines fit in a monthly total before `Money`
/// arithmetic has to saturate.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Maximum length of product and category names.
pub const MAX_NAME_LENGTH: usize = 191;
