//! Postgres-backed record store over a sqlx pool.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CartStore, CatalogStore, StoreError, StoreResult, UserStore};
use crate::models::{CartLine, Category, Product, User};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_err(err: sqlx::Error) -> StoreError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Backend(err),
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
        let products = match category {
            Some(category) => {
                sqlx::query_as::<_, Product>(
                    "SELECT * FROM products WHERE category = $1 ORDER BY created_at DESC, id DESC",
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(
                    "SELECT * FROM products ORDER BY created_at DESC, id DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(products)
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO products (id, brand, name, description, price, discount_price, category, image_url, rating, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(product.id)
        .bind(&product.brand)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(product.rating)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO categories (id, name, image_url, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.image_url)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn get_line(&self, id: Uuid) -> StoreResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>("SELECT * FROM cart_lines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(line)
    }

    async fn find_line(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            "SELECT * FROM cart_lines WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(line)
    }

    async fn lines_for_user(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT * FROM cart_lines WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    async fn insert_line(&self, line: &CartLine) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO cart_lines (id, user_id, product_id, quantity, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(line.id)
        .bind(line.user_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.created_at)
        .bind(line.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }

    async fn update_line(&self, line: &CartLine) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE cart_lines SET quantity = $2, updated_at = $3 WHERE id = $1")
                .bind(line.id)
                .bind(line.quantity)
                .bind(line.updated_at)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_line(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES ($1, $2, $3, $4)")
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_insert_err)?;
        Ok(())
    }
}
