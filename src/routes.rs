//! HTTP adapter: thin axum handlers over the record store and cart manager.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::cart::CartManager;
use crate::error::{CommerceError, Result};
use crate::models::{
    AddToBagRequest, BagView, Category, CreateCategoryRequest, CreateProductRequest, LineView,
    Product, UpdateQuantityRequest, User,
};
use crate::store::{CatalogStore, RecordStore, StoreError, UserStore};

const DEFAULT_USER_EMAIL: &str = "default@wardrobe.shop";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub carts: CartManager,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/:id", delete(delete_product))
        .route(
            "/api/v1/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/v1/users/default",
            get(default_user).post(default_user_created),
        )
        .route("/api/v1/bag/add", post(add_to_bag))
        .route("/api/v1/bag/update/:id", put(update_quantity))
        .route("/api/v1/bag/remove/:id", delete(remove_from_bag))
        .route("/api/v1/bag/details", get(bag_details))
        .route("/api/v1/bag/items", get(bag_items))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "wardrobe-commerce" }))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProductFilter {
    category: Option<String>,
}

async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    let products = state.store.list_products(filter.category.as_deref()).await?;
    Ok(Json(products))
}

async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    request.validate()?;
    let product = request.into_product();
    state.store.insert_product(&product).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Hard delete. Bag lines referencing the product are left in place; the bag
/// aggregator reports them as dangling on the next read.
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    match state.store.delete_product(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound) => Err(CommerceError::ProductNotFound),
        Err(err) => Err(err.into()),
    }
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = state.store.list_categories().await?;
    Ok(Json(categories))
}

async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    request.validate()?;
    let category = request.into_category();
    state.store.insert_category(&category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn get_or_create_default_user(state: &AppState) -> Result<(User, bool)> {
    if let Some(user) = state.store.find_user_by_email(DEFAULT_USER_EMAIL).await? {
        return Ok((user, false));
    }
    let user = User {
        id: Uuid::now_v7(),
        name: "Default User".into(),
        email: Some(DEFAULT_USER_EMAIL.into()),
        created_at: Utc::now(),
    };
    state.store.insert_user(&user).await?;
    tracing::info!(user_id = %user.id, "default user created");
    Ok((user, true))
}

async fn default_user(State(state): State<AppState>) -> Result<Json<User>> {
    let (user, _) = get_or_create_default_user(&state).await?;
    Ok(Json(user))
}

async fn default_user_created(State(state): State<AppState>) -> Result<(StatusCode, Json<User>)> {
    let (user, created) = get_or_create_default_user(&state).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(user)))
}

// ---------------------------------------------------------------------------
// Bag
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OwnerParam {
    user_id: Uuid,
}

async fn add_to_bag(
    State(state): State<AppState>,
    Json(request): Json<AddToBagRequest>,
) -> Result<(StatusCode, Json<LineView>)> {
    let line = state
        .carts
        .add_line(request.user_id, request.product_id, request.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

async fn update_quantity(
    State(state): State<AppState>,
    Path(line_id): Path<Uuid>,
    Query(owner): Query<OwnerParam>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<LineView>> {
    let line = state
        .carts
        .update_line(line_id, owner.user_id, request.quantity)
        .await?;
    Ok(Json(line))
}

async fn remove_from_bag(
    State(state): State<AppState>,
    Path(line_id): Path<Uuid>,
    Query(owner): Query<OwnerParam>,
) -> Result<StatusCode> {
    state.carts.remove_line(line_id, owner.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bag_details(
    State(state): State<AppState>,
    Query(owner): Query<OwnerParam>,
) -> Result<Json<BagView>> {
    let bag = state.carts.bag_details(owner.user_id).await?;
    Ok(Json(bag))
}

async fn bag_items(
    State(state): State<AppState>,
    Query(owner): Query<OwnerParam>,
) -> Result<Json<Vec<LineView>>> {
    let items = state.carts.list_lines(owner.user_id).await?;
    Ok(Json(items))
}
