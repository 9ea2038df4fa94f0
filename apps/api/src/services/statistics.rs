//! # Statistics Aggregator
//!
//! Loads a channel's sales for one calendar month plus its category
//! universe, then runs the pure fold from `salon_core::statistics`.

use tracing::debug;

use salon_core::statistics::aggregate;
use salon_core::{Channel, DashboardOverview, MonthWindow};
use salon_db::SalesGateway;

use crate::error::ApiResult;

#[derive(Debug, Clone)]
pub struct StatisticsService<G> {
    gateway: G,
}

impl<G: SalesGateway> StatisticsService<G> {
    pub fn new(gateway: G) -> Self {
        StatisticsService { gateway }
    }

    /// Monthly dashboard for `channel`.
    pub async fn monthly(&self, channel: Channel, window: MonthWindow) -> ApiResult<DashboardOverview> {
        let sales = self.gateway.sales_in_window(channel, window).await?;
        let universe = self.gateway.category_names(channel).await?;

        let overview = aggregate(&sales, &universe, &window);

        debug!(
            channel = %channel,
            month = %window.first_day(),
            sales = overview.total_sales,
            revenue = %overview.total_revenue,
            "Computed monthly statistics"
        );
        Ok(overview)
    }
}
