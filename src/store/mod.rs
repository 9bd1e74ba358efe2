//! Record store: per-entity repository traits plus the two backends.
//!
//! Records are looked up by id or by simple field predicates; everything else
//! (merging, pricing, ownership) is business logic that lives above this
//! layer. Handlers and the cart manager hold an `Arc<dyn RecordStore>`
//! constructed once at startup and passed in explicitly.

mod memory;
mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CartLine, Category, Product, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflicting record")]
    Conflict,

    #[error("backend failure: {0}")]
    Backend(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    /// Products, newest first, optionally filtered by category name.
    async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>>;
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<()>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn insert_category(&self, category: &Category) -> StoreResult<()>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_line(&self, id: Uuid) -> StoreResult<Option<CartLine>>;
    /// The line for a (user, product) pair, if one exists.
    async fn find_line(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>>;
    /// All of a user's lines, ordered by creation time then id so repeated
    /// reads of unchanged state see the same sequence.
    async fn lines_for_user(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>>;
    async fn insert_line(&self, line: &CartLine) -> StoreResult<()>;
    async fn update_line(&self, line: &CartLine) -> StoreResult<()>;
    async fn delete_line(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
}

/// Union of the per-entity stores, for components that need all of them.
pub trait RecordStore: CatalogStore + CartStore + UserStore {}

impl<T: CatalogStore + CartStore + UserStore> RecordStore for T {}
