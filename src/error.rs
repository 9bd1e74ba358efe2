//! Error taxonomy for the bag and catalog operations.
//!
//! Every failure maps to a distinct, stable `error` kind in the response body
//! so clients never have to parse free-text messages.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, CommerceError>;

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("product not found")]
    ProductNotFound,

    #[error("cart line not found")]
    LineNotFound,

    #[error("cart line belongs to another user")]
    Forbidden,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A cart line references a product that has since been deleted. Detected
    /// during aggregation and aborts the whole bag computation; a partial bag
    /// would misstate the amount owed.
    #[error("cart line {line_id} references missing product {product_id}")]
    DanglingReference { line_id: Uuid, product_id: Uuid },

    /// A pricing invariant no longer holds (e.g. negative aggregate
    /// discount). Surfaced, never silently clamped.
    #[error("pricing invariant violated: {0}")]
    Invariant(String),

    #[error("invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("storage failure")]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl CommerceError {
    fn kind(&self) -> &'static str {
        match self {
            Self::ProductNotFound => "product_not_found",
            Self::LineNotFound => "line_not_found",
            Self::Forbidden => "forbidden",
            Self::InvalidQuantity => "invalid_quantity",
            Self::DanglingReference { .. } => "dangling_reference",
            Self::Invariant(_) => "invariant_violation",
            Self::Validation(_) => "validation",
            Self::Store(_) => "store_failure",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::ProductNotFound | Self::LineNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidQuantity | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DanglingReference { .. } => StatusCode::CONFLICT,
            Self::Invariant(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CommerceError {
    fn into_response(self) -> Response {
        if let Self::Store(ref err) = self {
            tracing::error!(error = %err, "record store failure");
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
