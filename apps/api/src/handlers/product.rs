//! # Product Handlers
//!
//! Catalog endpoints under `/api/v1/products`.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /products { name, price: 5.0, channel, categories: [..] }        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductInput ──► NewProduct (price → cents, channel parsed)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_product ──► ProductRepository::create (one transaction)     │
//! │       │                     │                                           │
//! │       │                     └── categories upserted by (name, channel)  │
//! │       ▼                                                                 │
//! │  201 ProductDto (price back in major units)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use salon_core::validation::{parse_channel, validate_product};
use salon_core::{Category, CoreError, Money, NewProduct, Product, ProductFilter, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

/// Product as returned over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    /// Major units, e.g. `5.0`.
    pub price: f64,
    pub stock: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    /// `stock < min_stock`; the product needs restocking.
    pub low_stock: bool,
    pub channel: String,
    pub categories: Vec<CategoryDto>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    pub channel: String,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        CategoryDto {
            id: c.id,
            name: c.name,
            channel: c.channel.to_string(),
        }
    }
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        let low_stock = p.is_low_stock();
        ProductDto {
            id: p.id,
            name: p.name,
            price: p.price.to_major(),
            stock: p.stock,
            min_stock: p.min_stock,
            max_stock: p.max_stock,
            low_stock,
            channel: p.channel.to_string(),
            categories: p.categories.into_iter().map(CategoryDto::from).collect(),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Create/update payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub max_stock: i64,
    pub channel: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl TryFrom<ProductInput> for NewProduct {
    type Error = ApiError;

    fn try_from(input: ProductInput) -> Result<Self, Self::Error> {
        let price = Money::from_major(input.price).ok_or_else(|| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "expected a finite amount".to_string(),
        })?;

        let product = NewProduct {
            name: input.name.trim().to_string(),
            price,
            stock: input.stock,
            min_stock: input.min_stock,
            max_stock: input.max_stock,
            channel: parse_channel(Some(&input.channel))?,
            categories: input.categories,
        };

        validate_product(&product)?;
        Ok(product)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub channel: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /products?channel&low_stock`
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ProductDto>>> {
    let Query(query) = query?;

    let filter = ProductFilter {
        channel: query
            .channel
            .as_deref()
            .map(|c| parse_channel(Some(c)))
            .transpose()?,
        low_stock: query.low_stock,
    };

    let products = state.db.products().list(&filter).await?;
    debug!(count = products.len(), ?filter, "Listed products");

    Ok(Json(products.into_iter().map(ProductDto::from).collect()))
}

/// `GET /products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDto>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id))?;

    Ok(Json(product.into()))
}

/// `POST /products`
pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let input = NewProduct::try_from(input)?;

    let product = state.db.products().create(&input).await?;
    info!(id = %product.id, name = %product.name, "Product created");

    Ok((StatusCode::CREATED, Json(ProductDto::from(product))))
}

/// `POST /products/bulk`
pub async fn create_products(
    State(state): State<AppState>,
    body: Result<Json<Vec<ProductInput>>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(inputs) = body?;
    let inputs = inputs
        .into_iter()
        .map(NewProduct::try_from)
        .collect::<ApiResult<Vec<_>>>()?;

    let products = state.db.products().create_many(&inputs).await?;
    info!(count = products.len(), "Products created");

    let dtos: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();
    Ok((StatusCode::CREATED, Json(dtos)))
}

/// `PUT|PATCH /products/{id}`: full replacement.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<Json<ProductDto>> {
    let Json(input) = body?;
    let input = NewProduct::try_from(input)?;

    let product = state.db.products().update(&id, &input).await?;
    info!(id = %product.id, "Product updated");

    Ok(Json(product.into()))
}

/// `DELETE /products/{id}`
///
/// Products referenced by a recorded sale cannot be deleted (409).
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDto>> {
    let product = state.db.products().delete(&id).await?;
    info!(id = %product.id, "Product deleted");

    Ok(Json(product.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use salon_core::Channel;

    fn input() -> ProductInput {
        ProductInput {
            name: "  Argan Shampoo ".to_string(),
            price: 12.5,
            stock: 10,
            min_stock: 2,
            max_stock: 40,
            channel: "HAIR_CARE".to_string(),
            categories: vec!["Shampoo".to_string()],
        }
    }

    #[test]
    fn test_input_converts_to_cents() {
        let product = NewProduct::try_from(input()).unwrap();
        assert_eq!(product.name, "Argan Shampoo");
        assert_eq!(product.price.cents(), 1250);
        assert_eq!(product.channel, Channel::HairCare);
    }

    #[test]
    fn test_input_rejections() {
        let bad_price = ProductInput { price: 0.0, ..input() };
        assert!(NewProduct::try_from(bad_price).is_err());

        let bad_channel = ProductInput {
            channel: "GROCERY".to_string(),
            ..input()
        };
        assert!(NewProduct::try_from(bad_channel).is_err());

        let bad_levels = ProductInput {
            min_stock: 50,
            ..input()
        };
        assert!(NewProduct::try_from(bad_levels).is_err());
    }
}
