//! # Sale Handlers
//!
//! Sale recording, listing and the monthly dashboard under
//! `/api/v1/sales`.
//!
//! ## Default Months
//! ```text
//! GET /sales/statistics?channel=COSMETIC           → current month
//! GET /sales/month?channel=COSMETIC                → previous month
//! GET /sales/...&month=2024-04 | 2024-04-17 | RFC 3339 → that month
//! ```
//!
//! The statistics payload keeps camelCase keys (`totalRevenue`, ...);
//! entities keep snake_case (`user_id`, `product_quantity`).

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use salon_core::validation::{parse_channel, parse_created_at, parse_month};
use salon_core::{
    CategoryStatistics, CoreError, DashboardOverview, MonthWindow, NewSale, NewSaleLine, PageRequest,
    Pagination, Sale, SaleFilter, SaleProduct,
};

use crate::error::{ApiError, ApiResult};
use crate::handlers::product::ProductDto;
use crate::state::AppState;

// =============================================================================
// Input
// =============================================================================

/// Sale payload: `{ user_id, created_at?, products: [{ id, quantity }] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleInput {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub products: Vec<SaleLineInput>,
}

/// One line; the product may be named by `id` or `product_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleLineInput {
    #[serde(alias = "product_id")]
    pub id: String,
    pub quantity: i64,
}

impl TryFrom<SaleInput> for NewSale {
    type Error = ApiError;

    fn try_from(input: SaleInput) -> Result<Self, Self::Error> {
        let created_at = input
            .created_at
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(parse_created_at)
            .transpose()?;

        Ok(NewSale {
            user_id: input.user_id.trim().to_string(),
            created_at,
            products: input
                .products
                .into_iter()
                .map(|line| NewSaleLine {
                    product_id: line.id.trim().to_string(),
                    quantity: line.quantity,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleListQuery {
    pub channel: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub channel: Option<String>,
    pub month: Option<String>,
}

/// Lenient page number parsing: anything unparsable is treated as absent.
fn page_param(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Resolves `month`, or falls back to the month containing today.
fn requested_window(month: Option<&str>) -> ApiResult<Option<MonthWindow>> {
    match month.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => Ok(Some(MonthWindow::containing(parse_month(m)?)?)),
        None => Ok(None),
    }
}

fn current_window() -> ApiResult<MonthWindow> {
    Ok(MonthWindow::containing(Utc::now().date_naive())?)
}

// =============================================================================
// Output
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleProductDto {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub product_quantity: i64,
    pub product: ProductDto,
}

impl From<SaleProduct> for SaleProductDto {
    fn from(line: SaleProduct) -> Self {
        SaleProductDto {
            id: line.id,
            sale_id: line.sale_id,
            product_id: line.product_id,
            product_quantity: line.product_quantity,
            product: line.product.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDto {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub products: Vec<SaleProductDto>,
}

impl From<Sale> for SaleDto {
    fn from(sale: Sale) -> Self {
        SaleDto {
            id: sale.id,
            user_id: sale.user_id,
            created_at: sale.created_at.to_rfc3339(),
            products: sale.products.into_iter().map(SaleProductDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedSalesDto {
    pub data: Vec<SaleDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatisticsDto {
    pub name: String,
    pub total: f64,
    pub quantity: i64,
    pub percentage_of_total_revenue: f64,
    pub percentage_of_total_products_sold: f64,
}

impl From<CategoryStatistics> for CategoryStatisticsDto {
    fn from(c: CategoryStatistics) -> Self {
        CategoryStatisticsDto {
            name: c.name,
            total: c.total.to_major(),
            quantity: c.quantity,
            percentage_of_total_revenue: c.percentage_of_total_revenue,
            percentage_of_total_products_sold: c.percentage_of_total_products_sold,
        }
    }
}

/// Monthly dashboard. Money in major units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverviewDto {
    pub total_revenue: f64,
    pub total_sales: i64,
    pub total_products_sold: i64,
    pub average_daily_sales: f64,
    pub average_daily_revenue: f64,
    pub categories: Vec<CategoryStatisticsDto>,
}

impl From<DashboardOverview> for DashboardOverviewDto {
    fn from(o: DashboardOverview) -> Self {
        DashboardOverviewDto {
            total_revenue: o.total_revenue.to_major(),
            total_sales: o.total_sales,
            total_products_sold: o.total_products_sold,
            average_daily_sales: o.average_daily_sales,
            average_daily_revenue: o.average_daily_revenue,
            categories: o
                .categories
                .into_iter()
                .map(CategoryStatisticsDto::from)
                .collect(),
        }
    }
}

fn to_dtos(sales: Vec<Sale>) -> Vec<SaleDto> {
    sales.into_iter().map(SaleDto::from).collect()
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /sales?channel&page&pageSize&user_id`
pub async fn list_sales(
    State(state): State<AppState>,
    query: Result<Query<SaleListQuery>, QueryRejection>,
) -> ApiResult<Json<PaginatedSalesDto>> {
    let Query(query) = query?;

    let filter = SaleFilter {
        channel: query
            .channel
            .as_deref()
            .map(|c| parse_channel(Some(c)))
            .transpose()?,
        user_id: query.user_id.filter(|u| !u.trim().is_empty()),
    };
    let page = PageRequest::new(
        page_param(query.page.as_deref()),
        page_param(query.page_size.as_deref()),
    );

    let result = state.sales().list(&filter, page).await?;
    debug!(
        rows = result.data.len(),
        total = result.pagination.total_count,
        "Listed sales"
    );

    Ok(Json(PaginatedSalesDto {
        data: to_dtos(result.data),
        pagination: result.pagination,
    }))
}

/// `GET /sales/month?channel&month`: raw sales of one month.
pub async fn sales_in_month(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SaleDto>>> {
    let Query(query) = query?;
    let channel = parse_channel(query.channel.as_deref())?;

    let window = match requested_window(query.month.as_deref())? {
        Some(window) => window,
        None => current_window()?.previous()?,
    };

    let sales = state.sales().in_month(channel, window).await?;
    debug!(%channel, month = %window.first_day(), count = sales.len(), "Listed sales in month");

    Ok(Json(to_dtos(sales)))
}

/// `GET /sales/statistics?channel&month`
pub async fn monthly_statistics(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> ApiResult<Json<DashboardOverviewDto>> {
    let Query(query) = query?;
    let channel = parse_channel(query.channel.as_deref())?;

    let window = match requested_window(query.month.as_deref())? {
        Some(window) => window,
        None => current_window()?,
    };

    let overview = state.statistics().monthly(channel, window).await?;
    Ok(Json(overview.into()))
}

/// `GET /sales/{id}`
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDto>> {
    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(id))?;

    Ok(Json(sale.into()))
}

/// `POST /sales`
pub async fn create_sale(
    State(state): State<AppState>,
    body: Result<Json<SaleInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let sale = NewSale::try_from(input)?;

    let sale = state.sales().create(&sale).await?;
    info!(
        id = %sale.id,
        user_id = %sale.user_id,
        lines = sale.products.len(),
        total = %sale.total(),
        "Sale created"
    );

    Ok((StatusCode::CREATED, Json(SaleDto::from(sale))))
}

/// `POST /sales/bulk`: all or nothing.
pub async fn create_sales(
    State(state): State<AppState>,
    body: Result<Json<Vec<SaleInput>>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(inputs) = body?;
    let sales = inputs
        .into_iter()
        .map(NewSale::try_from)
        .collect::<ApiResult<Vec<_>>>()?;

    let created = state.sales().create_many(&sales).await?;
    info!(count = created.len(), "Sales created");

    Ok((StatusCode::CREATED, Json(to_dtos(created))))
}

/// `DELETE /sales/{id}`. Stock is not restored.
pub async fn delete_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDto>> {
    let sale = state.db.sales().delete(&id).await?;
    info!(id = %sale.id, "Sale deleted");

    Ok(Json(sale.into()))
}
