//! Catalog item endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use wrench_core::validation::{clamp_limit, validate_search_query};
use wrench_core::{Item, ItemUpdate, NewItem};

use super::{check_id, ListParams, SearchParams, DEFAULT_LIMIT, MAX_LIMIT, SEARCH_LIMIT};
use crate::error::ApiError;
use crate::AppState;

/// `GET /api/items`, ordered by name.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    Ok(Json(state.db.items().list(limit).await?))
}

/// `POST /api/items`. 409 when the name is taken.
pub async fn create(
    State(state): State<AppState>,
    Json(item): Json<NewItem>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = item.normalized()?;
    let created = state.db.items().insert(&item).await?;

    info!(id = %created.id, name = %created.name, quantity = created.quantity, "Item created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/items/search?q=`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let query = validate_search_query(&params.q)?;
    Ok(Json(state.db.items().search(&query, SEARCH_LIMIT).await?))
}

/// `PATCH /api/items/:id`: quantity (stock count), price, and/or name.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ItemUpdate>,
) -> Result<Json<Item>, ApiError> {
    check_id(&id)?;
    let update = update.normalized()?;
    if update.is_empty() {
        return Err(ApiError::validation("Nothing to update"));
    }

    let item = state.db.items().update(&id, &update).await?;

    info!(id = %item.id, quantity = item.quantity, price = %item.price, "Item updated");
    Ok(Json(item))
}
