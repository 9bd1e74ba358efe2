//! In-memory record store.
//!
//! Backs the service when `DATABASE_URL` is unset and serves as the substrate
//! for the cart and bag tests. Semantics mirror the Postgres backend,
//! including the unique (user, product) backstop on cart lines. Lock poison
//! is recovered from rather than propagated: no method leaves the tables in a
//! partially updated state, so the data is intact even after a panic.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use super::{CartStore, CatalogStore, StoreError, StoreResult, UserStore};
use crate::models::{CartLine, Category, Product, User};

#[derive(Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    categories: Vec<Category>,
    users: Vec<User>,
    lines: HashMap<Uuid, CartLine>,
}

#[derive(Default)]
pub struct MemStore {
    tables: RwLock<Tables>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemStore {
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.tables.read().unwrap_or_else(PoisonError::into_inner).products.get(&id).cloned())
    }

    async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .cloned()
            .collect();
        products.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(products)
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if tables.products.contains_key(&product.id) {
            return Err(StoreError::Conflict);
        }
        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.products.remove(&id).ok_or(StoreError::NotFound)?;
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories = self.tables.read().unwrap_or_else(PoisonError::into_inner).categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner).categories.push(category.clone());
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemStore {
    async fn get_line(&self, id: Uuid) -> StoreResult<Option<CartLine>> {
        Ok(self.tables.read().unwrap_or_else(PoisonError::into_inner).lines.get(&id).cloned())
    }

    async fn find_line(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables
            .lines
            .values()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
            .cloned())
    }

    async fn lines_for_user(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut lines: Vec<CartLine> = tables
            .lines
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        lines.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(lines)
    }

    async fn insert_line(&self, line: &CartLine) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let duplicate = tables
            .lines
            .values()
            .any(|l| l.user_id == line.user_id && l.product_id == line.product_id);
        if duplicate || tables.lines.contains_key(&line.id) {
            return Err(StoreError::Conflict);
        }
        tables.lines.insert(line.id, line.clone());
        Ok(())
    }

    async fn update_line(&self, line: &CartLine) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let stored = tables.lines.get_mut(&line.id).ok_or(StoreError::NotFound)?;
        *stored = line.clone();
        Ok(())
    }

    async fn delete_line(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.lines.remove(&id).ok_or(StoreError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner).users.push(user.clone());
        Ok(())
    }
}
