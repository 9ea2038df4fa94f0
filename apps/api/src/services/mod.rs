//! Services that sit between handlers and storage.
//!
//! Both services are generic over [`SalesGateway`](salon_db::SalesGateway)
//! and receive it by value; handlers pass a clone of the shared
//! [`Database`](salon_db::Database).

pub mod sales;
pub mod statistics;

pub use sales::{SalePage, SaleService};
pub use statistics::StatisticsService;
