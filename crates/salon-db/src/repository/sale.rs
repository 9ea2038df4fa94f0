//! # Sale Repository
//!
//! Database operations for sales and their line items.
//!
//! ## Sale Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  create() - ONE transaction                             │
//! │                                                                         │
//! │  1. CHECK PRODUCTS                                                     │
//! │     └── every product id exists          (else NotFound, rollback)     │
//! │     └── RejectInsufficient only:                                       │
//! │         stock ≥ Σ quantity per product   (else InsufficientStock)      │
//! │                                                                         │
//! │  2. INSERT sales header (user_id, created_at)                          │
//! │                                                                         │
//! │  3. FOR EACH LINE                                                      │
//! │     └── INSERT sale_products (sale_id, product_id, product_quantity)   │
//! │     └── UPDATE products SET stock = stock - quantity                   │
//! │                                                                         │
//! │  4. COMMIT, then re-read the sale with lines → product → categories    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Channel Filter
//! A sale matches a channel when NO line references a product of another
//! channel:
//!
//! ```sql
//! NOT EXISTS (SELECT 1 FROM sale_products sp JOIN products p ...
//!             WHERE sp.sale_id = s.id AND p.channel <> ?)
//! ```
//!
//! Mixed-channel sales therefore match neither channel.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::{categories_for, ProductRow, PRODUCT_COLUMNS};
use salon_core::{Channel, MonthWindow, NewSale, PageRequest, Sale, SaleFilter, SaleProduct, StockPolicy};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    line_id: String,
    sale_id: String,
    product_quantity: i64,
    #[sqlx(flatten)]
    product: ProductRow,
}

/// Loads line items (with product snapshots) for `headers` and assembles
/// full sales, preserving header order.
async fn assemble(conn: &mut SqliteConnection, headers: Vec<SaleRow>) -> DbResult<Vec<Sale>> {
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
        "SELECT sp.id AS line_id, sp.sale_id, sp.product_quantity, {PRODUCT_COLUMNS} \
         FROM sale_products sp \
         JOIN products p ON p.id = sp.product_id \
         WHERE sp.sale_id IN ("
    ));
    let mut ids = qb.separated(", ");
    for header in &headers {
        ids.push_bind(header.id.clone());
    }
    ids.push_unseparated(") ORDER BY sp.rowid");

    let lines: Vec<LineRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    let categories = {
        let mut product_ids: Vec<&str> = lines.iter().map(|l| l.product.id.as_str()).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        categories_for(conn, &product_ids).await?
    };

    let mut by_sale: HashMap<String, Vec<SaleProduct>> = HashMap::new();
    for line in lines {
        let product_categories = categories.get(&line.product.id).cloned().unwrap_or_default();
        let product = line.product.into_product(product_categories);
        by_sale.entry(line.sale_id.clone()).or_default().push(SaleProduct {
            id: line.line_id,
            sale_id: line.sale_id,
            product_id: product.id.clone(),
            product_quantity: line.product_quantity,
            product,
        });
    }

    Ok(headers
        .into_iter()
        .map(|header| Sale {
            products: by_sale.remove(&header.id).unwrap_or_default(),
            id: header.id,
            user_id: header.user_id,
            created_at: header.created_at,
        })
        .collect())
}

/// Appends the `WHERE` clause shared by listing and counting.
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SaleFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(channel) = filter.channel {
        push_channel_filter(qb, channel);
    }
    if let Some(user_id) = &filter.user_id {
        qb.push(" AND s.user_id = ").push_bind(user_id.clone());
    }
}

fn push_channel_filter(qb: &mut QueryBuilder<'_, Sqlite>, channel: Channel) {
    qb.push(
        " AND NOT EXISTS (SELECT 1 FROM sale_products sp \
         JOIN products p ON p.id = sp.product_id \
         WHERE sp.sale_id = s.id AND p.channel <> ",
    )
    .push_bind(channel)
    .push(")");
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    stock_policy: StockPolicy,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, stock_policy: StockPolicy) -> Self {
        SaleRepository { pool, stock_policy }
    }

    /// Gets a sale with its line items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let header: Option<SaleRow> =
            sqlx::query_as("SELECT s.id, s.user_id, s.created_at FROM sales s WHERE s.id = ?1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        match header {
            Some(header) => Ok(assemble(&mut conn, vec![header]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Records a sale atomically.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - a line references an unknown product
    /// * `DbError::Domain(CoreError::InsufficientStock)` - strict policy and not enough stock
    ///
    /// Nothing is written when an error is returned.
    pub async fn create(&self, sale: &NewSale) -> DbResult<Sale> {
        let mut tx = self.pool.begin().await?;
        let id = insert_sale(&mut tx, sale, self.stock_policy).await?;
        tx.commit().await?;

        info!(
            id = %id,
            user_id = %sale.user_id,
            lines = sale.products.len(),
            "Sale created"
        );
        self.reload(&id).await
    }

    /// Records several sales in ONE transaction. Any failure rolls back
    /// every sale of the batch.
    pub async fn create_many(&self, sales: &[NewSale]) -> DbResult<Vec<Sale>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(sales.len());
        for sale in sales {
            ids.push(insert_sale(&mut tx, sale, self.stock_policy).await?);
        }
        tx.commit().await?;

        info!(count = ids.len(), "Sales created");

        let mut created = Vec::with_capacity(ids.len());
        for id in &ids {
            created.push(self.reload(id).await?);
        }
        Ok(created)
    }

    /// Pages through sales, newest first.
    ///
    /// ## Returns
    /// The page of sales and the total number of sales matching `filter`.
    pub async fn list(&self, filter: &SaleFilter, page: PageRequest) -> DbResult<(Vec<Sale>, i64)> {
        debug!(
            channel = ?filter.channel,
            user_id = ?filter.user_id,
            limit = page.limit(),
            offset = page.offset(),
            "Listing sales"
        );

        let mut conn = self.pool.acquire().await?;

        let mut count_qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM sales s");
        push_filter(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&mut *conn).await?;

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT s.id, s.user_id, s.created_at FROM sales s");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY s.created_at DESC, s.rowid DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let headers: Vec<SaleRow> = qb.build_query_as().fetch_all(&mut *conn).await?;
        let sales = assemble(&mut conn, headers).await?;

        debug!(count = sales.len(), total, "Listed sales");
        Ok((sales, total))
    }

    /// Sales of `channel` created inside `window`, newest first.
    pub async fn in_window(&self, channel: Channel, window: &MonthWindow) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT s.id, s.user_id, s.created_at FROM sales s WHERE s.created_at >= ",
        );
        qb.push_bind(window.start())
            .push(" AND s.created_at < ")
            .push_bind(window.end());
        push_channel_filter(&mut qb, channel);
        qb.push(" ORDER BY s.created_at DESC, s.rowid DESC");

        let headers: Vec<SaleRow> = qb.build_query_as().fetch_all(&mut *conn).await?;
        let sales = assemble(&mut conn, headers).await?;

        debug!(
            channel = %channel,
            from = %window.start(),
            to = %window.end(),
            count = sales.len(),
            "Loaded sales in window"
        );
        Ok(sales)
    }

    /// Deletes a sale and its line items. Stock is not restored.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no sale with this id
    pub async fn delete(&self, id: &str) -> DbResult<Sale> {
        let sale = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        info!(id = %id, "Sale deleted");
        Ok(sale)
    }

    async fn reload(&self, id: &str) -> DbResult<Sale> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }
}

// =============================================================================
// Transaction body
// =============================================================================

/// Writes one sale on `conn`, which must be inside a transaction.
async fn insert_sale(
    conn: &mut SqliteConnection,
    sale: &NewSale,
    policy: StockPolicy,
) -> DbResult<String> {
    let requested: BTreeMap<&str, i64> = sale.quantities_by_product();

    for (product_id, quantity) in &requested {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(*product_id)
            .fetch_optional(&mut *conn)
            .await?;

        let stock = stock.ok_or_else(|| DbError::not_found("Product", *product_id))?;

        policy.check(product_id, stock, *quantity)?;
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let created_at = sale.created_at.unwrap_or(now);

    debug!(id = %id, user_id = %sale.user_id, "Inserting sale");

    sqlx::query("INSERT INTO sales (id, user_id, created_at) VALUES (?1, ?2, ?3)")
        .bind(&id)
        .bind(sale.user_id.trim())
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

    for line in &sale.products {
        sqlx::query(
            r#"
            INSERT INTO sale_products (id, sale_id, product_id, product_quantity)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;

        sqlx::query("UPDATE products SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }

    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone};
    use salon_core::{CoreError, Money, NewProduct, NewSaleLine, Product};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, name: &str, channel: Channel, stock: i64, category: &str) -> Product {
        db.products()
            .create(&NewProduct {
                name: name.to_string(),
                price: Money::from_cents(500),
                stock,
                min_stock: 0,
                max_stock: 100,
                channel,
                categories: vec![category.to_string()],
            })
            .await
            .unwrap()
    }

    fn new_sale(user_id: &str, lines: &[(&str, i64)]) -> NewSale {
        NewSale {
            user_id: user_id.to_string(),
            created_at: None,
            products: lines
                .iter()
                .map(|(id, quantity)| NewSaleLine {
                    product_id: id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_create_decrements_stock() {
        let db = db().await;
        let p1 = product(&db, "Shampoo", Channel::HairCare, 10, "Shampoo").await;
        let p2 = product(&db, "Mask", Channel::HairCare, 5, "Masks").await;

        let sale = db
            .sales()
            .create(&new_sale("u1", &[(p1.id.as_str(), 3), (p2.id.as_str(), 2), (p1.id.as_str(), 1)]))
            .await
            .unwrap();

        assert_eq!(sale.user_id, "u1");
        assert_eq!(sale.products.len(), 3);
        assert_eq!(sale.products[0].product_quantity, 3);
        assert_eq!(sale.products[0].product.categories[0].name, "Shampoo");
        assert_eq!(stock_of(&db, &p1.id).await, 10 - 3 - 1);
        assert_eq!(stock_of(&db, &p2.id).await, 5 - 2);
    }

    #[tokio::test]
    async fn test_missing_product_writes_nothing() {
        let db = db().await;
        let p1 = product(&db, "Shampoo", Channel::HairCare, 10, "Shampoo").await;

        let err = db
            .sales()
            .create(&new_sale("u1", &[(p1.id.as_str(), 2), ("does-not-exist", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(count(&db, "sale_products").await, 0);
        assert_eq!(stock_of(&db, &p1.id).await, 10);
    }

    #[tokio::test]
    async fn test_default_policy_allows_negative_stock() {
        let db = db().await;
        let p1 = product(&db, "Gel", Channel::HairCare, 1, "Styling").await;

        db.sales().create(&new_sale("u1", &[(p1.id.as_str(), 4)])).await.unwrap();
        assert_eq!(stock_of(&db, &p1.id).await, -3);
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_and_rolls_back() {
        let db = Database::new(DbConfig::in_memory().stock_policy(StockPolicy::RejectInsufficient))
            .await
            .unwrap();
        let p1 = product(&db, "Gel", Channel::HairCare, 5, "Styling").await;

        // 3 + 3 on two lines exceeds 5 even though each line fits
        let err = db
            .sales()
            .create(&new_sale("u1", &[(p1.id.as_str(), 3), (p1.id.as_str(), 3)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 5, requested: 6, .. })
        ));
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(stock_of(&db, &p1.id).await, 5);

        db.sales().create(&new_sale("u1", &[(p1.id.as_str(), 5)])).await.unwrap();
        assert_eq!(stock_of(&db, &p1.id).await, 0);
    }

    #[tokio::test]
    async fn test_create_many_is_all_or_nothing() {
        let db = db().await;
        let p1 = product(&db, "Lipstick", Channel::Cosmetic, 10, "Lips").await;

        let err = db
            .sales()
            .create_many(&[new_sale("u1", &[(p1.id.as_str(), 1)]), new_sale("u2", &[("ghost", 1)])])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(stock_of(&db, &p1.id).await, 10);

        let created = db
            .sales()
            .create_many(&[new_sale("u1", &[(p1.id.as_str(), 1)]), new_sale("u2", &[(p1.id.as_str(), 2)])])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[1].user_id, "u2");
        assert_eq!(stock_of(&db, &p1.id).await, 7);
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let db = db().await;
        let p1 = product(&db, "Blush", Channel::Cosmetic, 1000, "Face").await;

        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let batch: Vec<NewSale> = (0..45)
            .map(|i| {
                let mut sale = new_sale("u1", &[(p1.id.as_str(), 1)]);
                sale.created_at = Some(base + chrono::Duration::minutes(i));
                sale
            })
            .collect();
        db.sales().create_many(&batch).await.unwrap();

        let filter = SaleFilter::default();
        let (first, total) = db.sales().list(&filter, PageRequest::new(Some(1), Some(20))).await.unwrap();
        assert_eq!(total, 45);
        assert_eq!(first.len(), 20);
        assert!(first[0].created_at > first[1].created_at);

        let (last, _) = db.sales().list(&filter, PageRequest::new(Some(3), Some(20))).await.unwrap();
        assert_eq!(last.len(), 5);
        assert_eq!(last[4].created_at, base);
    }

    #[tokio::test]
    async fn test_list_filters_channel_and_user() {
        let db = db().await;
        let hair = product(&db, "Shampoo", Channel::HairCare, 10, "Shampoo").await;
        let face = product(&db, "Powder", Channel::Cosmetic, 10, "Face").await;

        db.sales().create(&new_sale("u1", &[(hair.id.as_str(), 1)])).await.unwrap();
        db.sales().create(&new_sale("u2", &[(face.id.as_str(), 1)])).await.unwrap();
        // mixed sale matches neither channel
        db.sales().create(&new_sale("u1", &[(hair.id.as_str(), 1), (face.id.as_str(), 1)])).await.unwrap();

        let by_channel = SaleFilter { channel: Some(Channel::HairCare), user_id: None };
        let (sales, total) = db.sales().list(&by_channel, PageRequest::default()).await.unwrap();
        assert_eq!((sales.len(), total), (1, 1));

        let by_user = SaleFilter { channel: None, user_id: Some("u1".to_string()) };
        let (_, total) = db.sales().list(&by_user, PageRequest::default()).await.unwrap();
        assert_eq!(total, 2);

        let both = SaleFilter { channel: Some(Channel::Cosmetic), user_id: Some("u1".to_string()) };
        let (sales, total) = db.sales().list(&both, PageRequest::default()).await.unwrap();
        assert!(sales.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_in_window_is_half_open() {
        let db = db().await;
        let p1 = product(&db, "Mascara", Channel::Cosmetic, 10, "Eyes").await;

        for ts in [
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
        ] {
            let mut sale = new_sale("u1", &[(p1.id.as_str(), 1)]);
            sale.created_at = Some(ts);
            db.sales().create(&sale).await.unwrap();
        }

        let march = MonthWindow::containing(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap();
        let sales = db.sales().in_window(Channel::Cosmetic, &march).await.unwrap();
        assert_eq!(sales.len(), 2);
        assert!(sales.iter().all(|s| march.contains(s.created_at)));

        let none = db.sales().in_window(Channel::HairCare, &march).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_lines_keeps_stock() {
        let db = db().await;
        let p1 = product(&db, "Toner", Channel::Cosmetic, 10, "Face").await;
        let sale = db.sales().create(&new_sale("u1", &[(p1.id.as_str(), 2)])).await.unwrap();

        let deleted = db.sales().delete(&sale.id).await.unwrap();
        assert_eq!(deleted.id, sale.id);
        assert_eq!(count(&db, "sale_products").await, 0);
        assert_eq!(stock_of(&db, &p1.id).await, 8);
        assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_none());
        assert!(matches!(db.sales().delete(&sale.id).await.unwrap_err(), DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_sold_product_cannot_be_deleted() {
        let db = db().await;
        let p1 = product(&db, "Toner", Channel::Cosmetic, 10, "Face").await;
        db.sales().create(&new_sale("u1", &[(p1.id.as_str(), 1)])).await.unwrap();

        let err = db.products().delete(&p1.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(db.products().get_by_id(&p1.id).await.unwrap().is_some());
    }
}
