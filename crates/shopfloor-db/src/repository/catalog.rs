//! # Catalog Repository
//!
//! Minimal writes and lookups for shops, brands, categories and products.
//!
//! Directory management lives outside this system; these operations exist
//! so the seed binary and the tests can build a catalog to sell from.
//! Product stock is set once on insert and afterwards belongs to the
//! [`StockLedger`](crate::StockLedger).

use chrono::Utc;
use shopfloor_core::validation::{validate_name, validate_new_product};
use shopfloor_core::{Brand, Category, CoreError, NewProduct, Product, Shop};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// Repository for the catalog and directories.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    pub async fn insert_shop(&self, name: &str) -> DbResult<Shop> {
        validate_name("name", name)?;
        let shop = Shop {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };
        debug!(id = %shop.id, name = %shop.name, "Inserting shop");

        sqlx::query("INSERT INTO shops (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&shop.id)
            .bind(&shop.name)
            .bind(shop.created_at)
            .execute(&self.pool)
            .await?;

        Ok(shop)
    }

    pub async fn insert_brand(&self, name: &str) -> DbResult<Brand> {
        validate_name("name", name)?;
        let brand = Brand {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };
        debug!(id = %brand.id, name = %brand.name, "Inserting brand");

        sqlx::query("INSERT INTO brands (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&brand.id)
            .bind(&brand.name)
            .bind(brand.created_at)
            .execute(&self.pool)
            .await?;

        Ok(brand)
    }

    pub async fn insert_category(&self, name: &str) -> DbResult<Category> {
        validate_name("name", name)?;
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };
        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.created_at)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    /// Inserts a product with its opening stock.
    ///
    /// ## Errors
    /// - `ShopNotFound` if the shop doesn't exist
    /// - `ForeignKeyViolation` for an unknown brand or category
    pub async fn insert_product(&self, new: &NewProduct) -> DbResult<Product> {
        validate_new_product(new)?;

        let mut conn = self.pool.acquire().await?;
        ensure_shop(&mut conn, &new.shop_id).await?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            length: new.length,
            width: new.width,
            thickness: new.thickness,
            weight: new.weight,
            quantity: new.quantity,
            brand_id: new.brand_id.clone(),
            shop_id: new.shop_id.clone(),
            category_id: new.category_id.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, quantity = product.quantity, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, length, width, thickness, weight, quantity,
                brand_id, shop_id, category_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.length)
        .bind(product.width)
        .bind(product.thickness)
        .bind(product.weight)
        .bind(product.quantity)
        .bind(&product.brand_id)
        .bind(&product.shop_id)
        .bind(&product.category_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID, or `ProductNotFound`.
    pub async fn get_product(&self, id: &str) -> DbResult<Product> {
        debug!(id = %id, "Getting product");

        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, length, width, thickness, weight, quantity,
                   brand_id, shop_id, category_id, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Number of products in the catalog.
    pub async fn count_products(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Gets a shop by ID, or `ShopNotFound`.
    pub async fn get_shop(&self, id: &str) -> DbResult<Shop> {
        sqlx::query_as::<_, Shop>("SELECT id, name, created_at FROM shops WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::ShopNotFound(id.to_string()).into())
    }
}

/// Fails with `ShopNotFound` unless the shop exists.
pub(crate) async fn ensure_shop(conn: &mut SqliteConnection, shop_id: &str) -> DbResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM shops WHERE id = ?1")
        .bind(shop_id)
        .fetch_optional(conn)
        .await?;

    match exists {
        Some(_) => Ok(()),
        None => Err(CoreError::ShopNotFound(shop_id.to_string()).into()),
    }
}
