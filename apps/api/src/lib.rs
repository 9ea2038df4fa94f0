//! # Salon Stock API
//!
//! HTTP server for the hair-care and cosmetic channels: product catalog,
//! sale recording and monthly statistics.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Salon Stock API                                │
//! │                                                                         │
//! │  Client ──► /api/v1 ──► CORS ──► TraceLayer ──► handlers                │
//! │                                                    │                    │
//! │          ┌─────────────────────────┬───────────────┴───────┐            │
//! │          ▼                         ▼                       ▼            │
//! │  ProductRepository          SaleService<G>       StatisticsService<G>   │
//! │          │                         │                       │            │
//! │          └──────────────────► SQLite (salon-db) ◄──────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Every variable has a default, so a bare `salon-api`
//! starts against `./data/salon.db` on port 3000.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the application router with middleware attached.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use salon_db::{Database, DbConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        create_app(AppState::new(db))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    async fn create_product(app: &Router, body: Value) -> String {
        let (status, product) = send(app, "POST", "/api/v1/products", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{product}");
        product["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("OK".to_string()));
    }

    #[tokio::test]
    async fn test_sale_decrements_stock_and_feeds_statistics() {
        let app = app().await;
        let p1 = create_product(
            &app,
            json!({
                "name": "Argan Oil",
                "price": 5.0,
                "stock": 10,
                "min_stock": 1,
                "max_stock": 20,
                "channel": "HAIR_CARE",
                "categories": ["Oils", "Treatments"]
            }),
        )
        .await;

        let (status, sale) = send(
            &app,
            "POST",
            "/api/v1/sales",
            Some(json!({ "user_id": "u1", "products": [{ "id": p1, "quantity": 3 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sale["products"].as_array().unwrap().len(), 1);
        assert_eq!(sale["products"][0]["product_quantity"], 3);

        let (_, product) = send(&app, "GET", &format!("/api/v1/products/{p1}"), None).await;
        assert_eq!(product["stock"], 7);
        assert_eq!(product["price"], 5.0);

        let (status, stats) = send(&app, "GET", "/api/v1/sales/statistics?channel=HAIR_CARE", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(stats["totalRevenue"].as_f64().unwrap() >= 15.0);
        assert_eq!(stats["totalSales"], 1);
        assert_eq!(stats["totalProductsSold"], 3);
        assert_eq!(stats["categories"][0]["name"], "Oils");
        assert_eq!(stats["categories"][0]["total"], 15.0);
        assert_eq!(stats["categories"][0]["percentageOfTotalRevenue"], 100.0);
        assert_eq!(stats["categories"][1]["total"], 0.0);
    }

    #[tokio::test]
    async fn test_empty_month_lists_every_category() {
        let app = app().await;
        for (name, category) in [("Lip Tint", "Lips"), ("Mascara", "Eyes")] {
            create_product(
                &app,
                json!({
                    "name": name,
                    "price": 9.9,
                    "stock": 5,
                    "max_stock": 10,
                    "channel": "COSMETIC",
                    "categories": [category]
                }),
            )
            .await;
        }

        let (status, stats) = send(
            &app,
            "GET",
            "/api/v1/sales/statistics?channel=COSMETIC&month=2020-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalRevenue"], 0.0);
        assert_eq!(stats["totalSales"], 0);
        assert_eq!(stats["averageDailySales"], 0.0);

        let categories = stats["categories"].as_array().unwrap();
        let names: Vec<&str> = categories.iter().map(|c| c["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["Lips", "Eyes"]);
        assert!(categories
            .iter()
            .all(|c| c["quantity"] == 0 && c["percentageOfTotalProductsSold"] == 0.0));
    }

    #[tokio::test]
    async fn test_missing_resources() {
        let app = app().await;

        let (status, body) = send(&app, "GET", "/api/v1/products/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = send(&app, "GET", "/api/v1/sales/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", "/api/v1/sales/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/sales",
            Some(json!({ "user_id": "u1", "products": [{ "id": "ghost", "quantity": 1 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, page) = send(&app, "GET", "/api/v1/sales", None).await;
        assert_eq!(page["pagination"]["totalCount"], 0);
        assert_eq!(page["data"], json!([]));
    }

    #[tokio::test]
    async fn test_bad_input_is_a_validation_error() {
        let app = app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/sales",
            Some(json!({ "user_id": "u1", "products": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/sales",
            Some(json!({ "user_id": "u1", "products": [{ "id": "p1", "quantity": 0 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "POST", "/api/v1/products", Some(json!({ "name": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(&app, "GET", "/api/v1/sales/statistics", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/api/v1/sales/month?channel=SPA", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_price_is_rejected() {
        let app = app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/products",
            Some(json!({ "name": "Gold Serum", "price": 1e16, "stock": 10, "max_stock": 10, "channel": "COSMETIC" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (_, products) = send(&app, "GET", "/api/v1/products", None).await;
        assert_eq!(products, json!([]));

        // Highest accepted price still totals without overflow.
        let p1 = create_product(
            &app,
            json!({ "name": "Gold Serum", "price": 1_000_000.0, "stock": 1000, "max_stock": 1000, "channel": "COSMETIC" }),
        )
        .await;
        let (status, sale) = send(
            &app,
            "POST",
            "/api/v1/sales",
            Some(json!({ "user_id": "u1", "products": [{ "id": p1, "quantity": 1000 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{sale}");
    }

    #[tokio::test]
    async fn test_low_stock_flag() {
        let app = app().await;
        let p1 = create_product(
            &app,
            json!({ "name": "Dry Shampoo", "price": 7.0, "stock": 1, "min_stock": 3, "max_stock": 10, "channel": "HAIR_CARE" }),
        )
        .await;

        let (_, product) = send(&app, "GET", &format!("/api/v1/products/{p1}"), None).await;
        assert_eq!(product["low_stock"], true);

        let (_, listed) = send(&app, "GET", "/api/v1/products?low_stock=true", None).await;
        assert_eq!(listed[0]["id"], p1.as_str());
    }

    #[tokio::test]
    async fn test_sold_product_cannot_be_deleted() {
        let app = app().await;
        let p1 = create_product(
            &app,
            json!({ "name": "Clay Mask", "price": 12.0, "stock": 4, "max_stock": 8, "channel": "COSMETIC" }),
        )
        .await;

        let (status, sale) = send(
            &app,
            "POST",
            "/api/v1/sales",
            Some(json!({ "user_id": "u1", "products": [{ "product_id": p1, "quantity": 1 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "DELETE", &format!("/api/v1/products/{p1}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let sale_id = sale["id"].as_str().unwrap();
        let (status, _) = send(&app, "DELETE", &format!("/api/v1/sales/{sale_id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/products/{p1}"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_month_listing_and_bulk_sales() {
        let app = app().await;
        let p1 = create_product(
            &app,
            json!({ "name": "Keratin Mask", "price": 20.0, "stock": 50, "max_stock": 60, "channel": "HAIR_CARE" }),
        )
        .await;

        let (status, created) = send(
            &app,
            "POST",
            "/api/v1/sales/bulk",
            Some(json!([
                { "user_id": "u1", "created_at": "2024-04-10", "products": [{ "id": p1, "quantity": 2 }] },
                { "user_id": "u2", "created_at": "2024-05-01T00:00:00Z", "products": [{ "id": p1, "quantity": 1 }] }
            ])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.as_array().unwrap().len(), 2);

        let (status, april) = send(
            &app,
            "GET",
            "/api/v1/sales/month?channel=HAIR_CARE&month=2024-04",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(april.as_array().unwrap().len(), 1);
        assert_eq!(april[0]["user_id"], "u1");

        let (_, page) = send(&app, "GET", "/api/v1/sales?user_id=u2&pageSize=abc", None).await;
        assert_eq!(page["pagination"]["totalCount"], 1);
        assert_eq!(page["pagination"]["pageSize"], 20);

        let (status, page) = send(&app, "GET", "/api/v1/sales?pageSize=9223372036854775807", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["pagination"]["pageSize"], 1000);
        assert_eq!(page["pagination"]["totalPages"], 1);
        assert_eq!(page["data"].as_array().unwrap().len(), 2);

        let (_, product) = send(&app, "GET", &format!("/api/v1/products/{p1}"), None).await;
        assert_eq!(product["stock"], 47);
    }
}
