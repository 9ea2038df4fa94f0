//! # Repository Module
//!
//! Database repository implementations for Salon Stock.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler / service                                                │
//! │       │                                                                 │
//! │       │  db.sales().create(&new_sale)                                  │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create(&self, sale)          one transaction                      │
//! │  ├── list(&self, filter, page)                                         │
//! │  ├── in_window(&self, channel, month)                                  │
//! │  └── delete(&self, id)                                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes that span several statements take a `&mut SqliteConnection` so
//! they can run inside the caller's transaction.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD with category tagging
//! - [`CategoryRepository`](category::CategoryRepository) - Category universe in creation order
//! - [`SaleRepository`](sale::SaleRepository) - Sale transactions and queries

pub mod category;
pub mod product;
pub mod sale;
