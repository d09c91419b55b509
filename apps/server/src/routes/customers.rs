//! Customer endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use wrench_core::validation::{clamp_limit, validate_search_query};
use wrench_core::{Customer, CustomerDetails};

use super::{ListParams, SearchParams, DEFAULT_LIMIT, MAX_LIMIT, SEARCH_LIMIT};
use crate::error::ApiError;
use crate::AppState;

/// `GET /api/customers`, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    Ok(Json(state.db.customers().list(limit).await?))
}

/// `POST /api/customers`. 409 when the name and phone pair exists.
pub async fn create(
    State(state): State<AppState>,
    Json(details): Json<CustomerDetails>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let details = details.normalized()?;
    let customer = state.db.customers().insert(&details).await?;

    info!(id = %customer.id, name = %customer.name, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// `GET /api/customers/search?q=`, name or phone substring.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let query = validate_search_query(&params.q)?;
    Ok(Json(state.db.customers().search(&query, SEARCH_LIMIT).await?))
}
