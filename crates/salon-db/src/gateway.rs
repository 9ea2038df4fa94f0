//! # Sales Gateway
//!
//! The storage seam used by the sale transaction engine and the statistics
//! aggregator in `salon-api`.
//!
//! ```text
//!   SaleService<G>         StatisticsService<G>
//!         │                        │
//!         └────────┬───────────────┘
//!                  ▼
//!          G: SalesGateway
//!                  │
//!        ┌─────────┴──────────┐
//!        ▼                    ▼
//!    Database (SQLite)    in-memory fakes (tests)
//! ```
//!
//! Services receive the gateway as a generic parameter, never through a
//! global.

use std::future::Future;

use salon_core::{Channel, MonthWindow, NewSale, PageRequest, Sale, SaleFilter};

use crate::error::DbResult;
use crate::pool::Database;

/// Storage operations needed to record and report on sales.
pub trait SalesGateway: Send + Sync {
    /// Records one sale atomically and returns it re-read from storage.
    fn create_sale(&self, sale: &NewSale) -> impl Future<Output = DbResult<Sale>> + Send;

    /// Records every sale in one transaction, or none of them.
    fn create_many_sales(
        &self,
        sales: &[NewSale],
    ) -> impl Future<Output = DbResult<Vec<Sale>>> + Send;

    /// Sales of `channel` inside `window`, newest first, with
    /// lines → product → categories loaded.
    fn sales_in_window(
        &self,
        channel: Channel,
        window: MonthWindow,
    ) -> impl Future<Output = DbResult<Vec<Sale>>> + Send;

    /// The channel's category universe in creation order.
    fn category_names(&self, channel: Channel) -> impl Future<Output = DbResult<Vec<String>>> + Send;

    /// A page of sales plus the total number matching `filter`.
    fn list_sales(
        &self,
        filter: &SaleFilter,
        page: PageRequest,
    ) -> impl Future<Output = DbResult<(Vec<Sale>, i64)>> + Send;
}

impl SalesGateway for Database {
    async fn create_sale(&self, sale: &NewSale) -> DbResult<Sale> {
        self.sales().create(sale).await
    }

    async fn create_many_sales(&self, sales: &[NewSale]) -> DbResult<Vec<Sale>> {
        self.sales().create_many(sales).await
    }

    async fn sales_in_window(&self, channel: Channel, window: MonthWindow) -> DbResult<Vec<Sale>> {
        self.sales().in_window(channel, &window).await
    }

    async fn category_names(&self, channel: Channel) -> DbResult<Vec<String>> {
        self.categories().names(channel).await
    }

    async fn list_sales(&self, filter: &SaleFilter, page: PageRequest) -> DbResult<(Vec<Sale>, i64)> {
        self.sales().list(filter, page).await
    }
}
