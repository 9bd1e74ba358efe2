//! Persisted records and the request/response shapes built from them.
//!
//! Records are plain data; persistence behavior lives behind the traits in
//! [`crate::store`]. All monetary fields use [`Decimal`] so totals are exact
//! at the currency's native precision.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Catalog product. `price` is the reference MRP per unit; `discount_price`,
/// when present, is the amount actually charged per unit and must not exceed
/// `price`. The cart only ever reads products.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub brand: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category: String,
    pub image_url: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Minimal owner record. Carts are keyed by `User::id`; everything else about
/// the user is out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One (user, product) pairing with a quantity. At most one line exists per
/// pair; the cart manager merges duplicate adds rather than inserting twice.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    pub fn new(user_id: Uuid, product_id: Uuid, quantity: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Derived read model for a single bag line. Rebuilt from live product data on
/// every request, so the snapshot and the computed amounts never go stale.
#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub product_name: String,
    pub product_brand: String,
    pub product_image_url: String,
    pub product_price: Decimal,
    pub product_discount_price: Option<Decimal>,
    /// Amount payable for this line.
    pub item_total: Decimal,
    /// Undiscounted reference total for this line.
    pub item_mrp: Decimal,
}

/// Derived read model for the whole bag. Never persisted or cached.
#[derive(Debug, Clone, Serialize)]
pub struct BagView {
    pub user_id: Uuid,
    pub items: Vec<LineView>,
    pub total_mrp: Decimal,
    pub total_discount: Decimal,
    pub total_amount: Decimal,
    pub delivery_fee: Decimal,
    pub final_total: Decimal,
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "discount_within_price", skip_on_field_errors = true))]
pub struct CreateProductRequest {
    #[validate(length(min = 1))]
    pub brand: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "non_negative_price")]
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub image_url: String,
}

impl CreateProductRequest {
    pub fn into_product(self) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            brand: self.brand,
            name: self.name,
            description: self.description,
            price: self.price,
            discount_price: self.discount_price,
            category: self.category,
            image_url: self.image_url,
            rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("price_negative"));
    }
    Ok(())
}

fn discount_within_price(req: &CreateProductRequest) -> Result<(), ValidationError> {
    if let Some(discount) = req.discount_price {
        if discount.is_sign_negative() || discount > req.price {
            return Err(ValidationError::new("discount_exceeds_price"));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub image_url: String,
}

impl CreateCategoryRequest {
    pub fn into_category(self) -> Category {
        Category {
            id: Uuid::now_v7(),
            name: self.name,
            image_url: self.image_url,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToBagRequest {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}
