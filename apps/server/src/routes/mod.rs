//! Route table.

pub mod customers;
pub mod health;
pub mod invoices;
pub mod items;
pub mod settings;

use axum::routing::{get, patch};
use axum::Router;
use serde::Deserialize;
use wrench_core::validation::validate_uuid;

use crate::error::ApiError;
use crate::AppState;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 50;
/// Largest page size a client may ask for.
pub const MAX_LIMIT: i64 = 200;
/// Result count for the type-ahead search endpoints.
pub const SEARCH_LIMIT: i64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/customers",
            get(customers::list).post(customers::create),
        )
        .route("/api/customers/search", get(customers::search))
        .route("/api/items", get(items::list).post(items::create))
        .route("/api/items/search", get(items::search))
        .route("/api/items/:id", patch(items::update))
        .route("/api/invoices", get(invoices::list).post(invoices::create))
        .route("/api/invoices/search", get(invoices::search))
        .route(
            "/api/invoices/:id",
            get(invoices::get).delete(invoices::delete),
        )
        .route("/api/invoices/:id/payment", patch(invoices::amend_payment))
        .route("/api/invoices/:id/html", get(invoices::html))
        .route("/api/invoices/:id/pdf", get(invoices::pdf))
        .route("/api/settings", get(settings::get).put(settings::update))
}

/// `?limit=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// `?q=` on type-ahead search endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Rejects malformed path IDs before they reach the database.
pub(crate) fn check_id(id: &str) -> Result<(), ApiError> {
    validate_uuid(id).map_err(ApiError::from)
}
