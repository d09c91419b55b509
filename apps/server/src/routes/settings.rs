//! Shop-wide invoice defaults.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;
use wrench_core::{PaymentMethod, PaymentStatus, SettingsUpdate, ShopSettings};

use crate::error::ApiError;
use crate::AppState;

/// Settings as shown to clients, with decimal percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsDto {
    pub tax: f64,
    pub discount: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
}

impl From<ShopSettings> for SettingsDto {
    fn from(settings: ShopSettings) -> Self {
        SettingsDto {
            tax: settings.tax.percentage(),
            discount: settings.discount.percentage(),
            payment_method: settings.payment_method,
            payment_status: settings.payment_status,
        }
    }
}

/// `GET /api/settings`
pub async fn get(State(state): State<AppState>) -> Result<Json<SettingsDto>, ApiError> {
    let settings = state.db.settings().get_or_init().await?;
    Ok(Json(settings.into()))
}

/// `PUT /api/settings`. Absent fields keep their current value.
pub async fn update(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsDto>, ApiError> {
    let repo = state.db.settings();
    let current = repo.get_or_init().await?;
    let next = update.apply(&current)?;
    let saved = repo.update(&next).await?;

    info!(
        tax = saved.tax.percentage(),
        discount = saved.discount.percentage(),
        method = saved.payment_method.as_str(),
        status = saved.payment_status.as_str(),
        "Shop settings updated"
    );
    Ok(Json(saved.into()))
}
