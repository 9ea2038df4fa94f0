//! # Sale Transaction Engine
//!
//! Validates sale input and hands it to the storage gateway, which writes
//! header, lines and stock decrements in one transaction.
//!
//! ```text
//! NewSale ──► validate_new_sale ──► G::create_sale ──► Sale (re-read)
//!                  │ Err                   │ Err
//!                  ▼                       ▼
//!             400, nothing          404 / 422 / 500, nothing
//!             touched               committed
//! ```

use tracing::debug;

use salon_core::validation::validate_new_sale;
use salon_core::{Channel, MonthWindow, NewSale, PageRequest, Pagination, Sale, SaleFilter};
use salon_db::SalesGateway;

use crate::error::ApiResult;

/// One page of sales.
#[derive(Debug, Clone)]
pub struct SalePage {
    pub data: Vec<Sale>,
    pub pagination: Pagination,
}

/// Sale workflows over an injected gateway.
#[derive(Debug, Clone)]
pub struct SaleService<G> {
    gateway: G,
}

impl<G: SalesGateway> SaleService<G> {
    pub fn new(gateway: G) -> Self {
        SaleService { gateway }
    }

    /// Validates and records one sale.
    pub async fn create(&self, sale: &NewSale) -> ApiResult<Sale> {
        validate_new_sale(sale)?;
        Ok(self.gateway.create_sale(sale).await?)
    }

    /// Validates every sale first, then records them all in one
    /// transaction.
    pub async fn create_many(&self, sales: &[NewSale]) -> ApiResult<Vec<Sale>> {
        for sale in sales {
            validate_new_sale(sale)?;
        }
        debug!(count = sales.len(), "Recording sale batch");
        Ok(self.gateway.create_many_sales(sales).await?)
    }

    /// A page of sales with pagination metadata.
    pub async fn list(&self, filter: &SaleFilter, page: PageRequest) -> ApiResult<SalePage> {
        let (data, total_count) = self.gateway.list_sales(filter, page).await?;
        Ok(SalePage {
            data,
            pagination: Pagination::new(total_count, &page),
        })
    }

    /// Raw sales of a channel in one month, newest first.
    pub async fn in_month(&self, channel: Channel, window: MonthWindow) -> ApiResult<Vec<Sale>> {
        Ok(self.gateway.sales_in_window(channel, window).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::FakeGateway;
    use salon_core::NewSaleLine;

    fn sale(user_id: &str, quantity: i64) -> NewSale {
        NewSale {
            user_id: user_id.to_string(),
            created_at: None,
            products: vec![NewSaleLine {
                product_id: "p1".to_string(),
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn test_invalid_sale_never_reaches_storage() {
        let gateway = FakeGateway::default();
        let service = SaleService::new(gateway.clone());

        let err = service.create(&sale("", 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = service.create(&sale("u1", 0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert_eq!(gateway.writes(), 0);
    }

    #[tokio::test]
    async fn test_batch_validates_every_sale_first() {
        let gateway = FakeGateway::default();
        let service = SaleService::new(gateway.clone());

        let err = service
            .create_many(&[sale("u1", 1), sale("u2", 10_000)])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(gateway.writes(), 0);

        let created = service.create_many(&[sale("u1", 1), sale("u2", 2)]).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(gateway.writes(), 1);
    }

    #[tokio::test]
    async fn test_list_builds_pagination() {
        let gateway = FakeGateway::default().with_total(45);
        let service = SaleService::new(gateway);

        let page = service
            .list(&SaleFilter::default(), PageRequest::new(Some(3), Some(20)))
            .await
            .unwrap();
        assert_eq!(page.pagination.total_count, 45);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.current_page, 3);
    }
}
