//! Route table for `/api/v1`.
//!
//! ```text
//! /health
//! /products            GET  POST
//! /products/bulk            POST
//! /products/{id}       GET  PUT  PATCH  DELETE
//! /sales               GET  POST
//! /sales/bulk               POST
//! /sales/month         GET
//! /sales/statistics    GET
//! /sales/{id}          GET  DELETE
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{self, product, sale};
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(product_routes())
        .merge(sale_routes())
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(product::list_products).post(product::create_product),
        )
        .route("/products/bulk", post(product::create_products))
        .route(
            "/products/{id}",
            get(product::get_product)
                .put(product::update_product)
                .patch(product::update_product)
                .delete(product::delete_product),
        )
}

fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sale::list_sales).post(sale::create_sale))
        .route("/sales/bulk", post(sale::create_sales))
        .route("/sales/month", get(sale::sales_in_month))
        .route("/sales/statistics", get(sale::monthly_statistics))
        .route("/sales/{id}", get(sale::get_sale).delete(sale::delete_sale))
}
