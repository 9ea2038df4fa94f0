//! # Product Repository
//!
//! Database operations for products and their category links.
//!
//! ## Key Operations
//! - Filtered listing (channel, low stock)
//! - CRUD with category tagging
//! - Batch creation in one transaction
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create / update (one transaction)                                     │
//! │                                                                         │
//! │  1. INSERT products  |  UPDATE products (0 rows → NotFound)            │
//! │  2. (update only) DELETE FROM product_categories WHERE product_id      │
//! │  3. for each distinct category name:                                   │
//! │       upsert category (name, channel) ──► INSERT product_categories    │
//! │  4. COMMIT                                                             │
//! │  5. re-read product with categories                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::category::upsert_category;
use salon_core::{Category, Channel, Money, NewProduct, Product, ProductFilter};

// =============================================================================
// Row Mapping
// =============================================================================

/// Column list shared by every product read, aliased as `p`.
pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.price_cents, p.stock, p.min_stock, \
     p.max_stock, p.channel, p.created_at, p.updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    pub channel: Channel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub(crate) fn into_product(self, categories: Vec<Category>) -> Product {
        Product {
            id: self.id,
            name: self.name,
            price: Money::from_cents(self.price_cents),
            stock: self.stock,
            min_stock: self.min_stock,
            max_stock: self.max_stock,
            channel: self.channel,
            categories,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductCategoryRow {
    product_id: String,
    id: String,
    name: String,
    channel: Channel,
}

/// Loads the categories of `product_ids`, each list in category creation
/// order.
pub(crate) async fn categories_for(
    conn: &mut SqliteConnection,
    product_ids: &[&str],
) -> DbResult<HashMap<String, Vec<Category>>> {
    let mut by_product: HashMap<String, Vec<Category>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(by_product);
    }

    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
        "SELECT pc.product_id, c.id, c.name, c.channel \
         FROM product_categories pc \
         JOIN categories c ON c.id = pc.category_id \
         WHERE pc.product_id IN (",
    );
    let mut ids = qb.separated(", ");
    for id in product_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY c.rowid");

    let rows: Vec<ProductCategoryRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    for row in rows {
        by_product.entry(row.product_id).or_default().push(Category {
            id: row.id,
            name: row.name,
            channel: row.channel,
        });
    }

    Ok(by_product)
}

/// Attaches categories to product rows, preserving row order.
pub(crate) async fn hydrate(
    conn: &mut SqliteConnection,
    rows: Vec<ProductRow>,
) -> DbResult<Vec<Product>> {
    let mut categories = {
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        categories_for(conn, &ids).await?
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let cats = categories.remove(&row.id).unwrap_or_default();
            row.into_product(cats)
        })
        .collect())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let low = repo.list(&ProductFilter { channel: Some(Channel::HairCare), low_stock: true }).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products with their categories, ordered by name.
    ///
    /// ## Filters
    /// - `channel`: only products of that channel
    /// - `low_stock`: only products with `stock < min_stock`
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        debug!(channel = ?filter.channel, low_stock = filter.low_stock, "Listing products");

        let mut conn = self.pool.acquire().await?;

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE 1 = 1"));
        if let Some(channel) = filter.channel {
            qb.push(" AND p.channel = ").push_bind(channel);
        }
        if filter.low_stock {
            qb.push(" AND p.stock < p.min_stock");
        }
        qb.push(" ORDER BY p.name, p.rowid");

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&mut *conn).await?;
        let products = hydrate(&mut conn, rows).await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Creates a product and links its categories in one transaction.
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;
        let id = insert_product(&mut tx, input).await?;
        tx.commit().await?;

        info!(id = %id, name = %input.name, channel = %input.channel, "Product created");
        self.reload(&id).await
    }

    /// Creates several products in one transaction. Any failure rolls
    /// back the whole batch.
    pub async fn create_many(&self, inputs: &[NewProduct]) -> DbResult<Vec<Product>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(inputs.len());
        for input in inputs {
            ids.push(insert_product(&mut tx, input).await?);
        }
        tx.commit().await?;

        info!(count = ids.len(), "Products created");

        let mut products = Vec::with_capacity(ids.len());
        for id in &ids {
            products.push(self.reload(id).await?);
        }
        Ok(products)
    }

    /// Replaces a product's fields and category set.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no product with this id
    pub async fn update(&self, id: &str, input: &NewProduct) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                stock = ?4,
                min_stock = ?5,
                max_stock = ?6,
                channel = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.price.cents())
        .bind(input.stock)
        .bind(input.min_stock)
        .bind(input.max_stock)
        .bind(input.channel)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        sqlx::query("DELETE FROM product_categories WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        link_categories(&mut tx, id, input).await?;
        tx.commit().await?;

        info!(id = %id, "Product updated");
        self.reload(id).await
    }

    /// Deletes a product and returns it as it was.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no product with this id
    /// * `DbError::ForeignKeyViolation` - the product appears on a sale
    pub async fn delete(&self, id: &str) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, "Product deleted");
        Ok(product)
    }

    async fn reload(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(hydrate(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn insert_product(conn: &mut SqliteConnection, input: &NewProduct) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    debug!(id = %id, name = %input.name, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, price_cents, stock, min_stock, max_stock,
            channel, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        "#,
    )
    .bind(&id)
    .bind(input.name.trim())
    .bind(input.price.cents())
    .bind(input.stock)
    .bind(input.min_stock)
    .bind(input.max_stock)
    .bind(input.channel)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    link_categories(conn, &id, input).await?;
    Ok(id)
}

async fn link_categories(
    conn: &mut SqliteConnection,
    product_id: &str,
    input: &NewProduct,
) -> DbResult<()> {
    for name in input.unique_categories() {
        let category = upsert_category(conn, name, input.channel).await?;

        sqlx::query(
            "INSERT INTO product_categories (product_id, category_id) VALUES (?1, ?2)",
        )
        .bind(product_id)
        .bind(&category.id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn input(name: &str, channel: Channel, categories: &[&str]) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: Money::from_cents(1500),
            stock: 10,
            min_stock: 3,
            max_stock: 30,
            channel,
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_links_categories_once() {
        let db = db().await;
        let product = db
            .products()
            .create(&input("Argan Oil", Channel::HairCare, &["Oils", "Treatments", "Oils"]))
            .await
            .unwrap();

        assert_eq!(product.price.cents(), 1500);
        let names: Vec<&str> = product.category_names().collect();
        assert_eq!(names, vec!["Oils", "Treatments"]);

        let fetched = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched, product);
    }

    #[tokio::test]
    async fn test_categories_shared_within_channel() {
        let db = db().await;
        let a = db.products().create(&input("A", Channel::Cosmetic, &["Face"])).await.unwrap();
        let b = db.products().create(&input("B", Channel::Cosmetic, &["Face"])).await.unwrap();

        assert_eq!(a.categories[0].id, b.categories[0].id);
        assert_eq!(db.categories().names(Channel::Cosmetic).await.unwrap(), vec!["Face"]);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = db().await;
        let repo = db.products();
        repo.create(&input("Shampoo", Channel::HairCare, &[])).await.unwrap();
        let mut low = input("Conditioner", Channel::HairCare, &[]);
        low.stock = 1;
        repo.create(&low).await.unwrap();
        repo.create(&input("Lipstick", Channel::Cosmetic, &[])).await.unwrap();

        let all = repo.list(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "Conditioner");

        let hair = repo
            .list(&ProductFilter { channel: Some(Channel::HairCare), low_stock: false })
            .await
            .unwrap();
        assert_eq!(hair.len(), 2);

        let low_stock = repo
            .list(&ProductFilter { channel: None, low_stock: true })
            .await
            .unwrap();
        assert_eq!(low_stock.len(), 1);
        assert_eq!(low_stock[0].name, "Conditioner");
    }

    #[tokio::test]
    async fn test_update_replaces_categories() {
        let db = db().await;
        let repo = db.products();
        let created = repo.create(&input("Serum", Channel::Cosmetic, &["Face"])).await.unwrap();

        let mut changed = input("Night Serum", Channel::Cosmetic, &["Skincare"]);
        changed.stock = 4;
        let updated = repo.update(&created.id, &changed).await.unwrap();

        assert_eq!(updated.name, "Night Serum");
        assert_eq!(updated.stock, 4);
        let names: Vec<&str> = updated.category_names().collect();
        assert_eq!(names, vec!["Skincare"]);
        // old category stays in the universe
        assert_eq!(
            db.categories().names(Channel::Cosmetic).await.unwrap(),
            vec!["Face", "Skincare"]
        );
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = db().await;
        let err = db
            .products()
            .update("missing", &input("X", Channel::Cosmetic, &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_returns_product() {
        let db = db().await;
        let repo = db.products();
        let created = repo.create(&input("Gel", Channel::HairCare, &["Styling"])).await.unwrap();

        let deleted = repo.delete(&created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&created.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_create_many() {
        let db = db().await;
        let created = db
            .products()
            .create_many(&[
                input("One", Channel::HairCare, &["Oils"]),
                input("Two", Channel::Cosmetic, &["Face"]),
            ])
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].name, "One");
        assert_eq!(created[1].channel, Channel::Cosmetic);
    }
}
