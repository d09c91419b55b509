//! Invoice endpoints.
//!
//! Creation and deletion go through [`InvoiceService`](wrench_db::InvoiceService)
//! so numbering, persistence and stock movement stay in one place. The
//! handlers only translate between HTTP and the service, which also does
//! the lifecycle logging.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Serialize;
use wrench_core::{CreatedInvoice, Invoice, NewInvoice, PaymentAmendment, ResolvedInvoice};
use wrench_db::{InventoryReport, InvoiceFilter};

use super::{check_id, ListParams};
use crate::error::ApiError;
use crate::AppState;

/// Body returned by `DELETE /api/invoices/:id`.
#[derive(Debug, Serialize)]
pub struct DeletedInvoice {
    pub message: String,
    pub stock_restored: usize,
    pub inventory: InventoryReport,
}

/// `GET /api/invoices`, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let invoices = state.db.invoice_service().list(params.limit).await?;
    Ok(Json(invoices))
}

/// `POST /api/invoices`
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<NewInvoice>,
) -> Result<(StatusCode, Json<CreatedInvoice>), ApiError> {
    let settings = state.db.settings().get_or_init().await?;
    let created = state.db.invoice_service().create(request, &settings).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/invoices/search?q=&customer_name=&payment_status=&limit=`
pub async fn search(
    State(state): State<AppState>,
    Query(filter): Query<InvoiceFilter>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let invoices = state.db.invoice_service().search(&filter).await?;
    Ok(Json(invoices))
}

/// `GET /api/invoices/:id` with customer and referenced catalog items.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResolvedInvoice>, ApiError> {
    check_id(&id)?;
    Ok(Json(state.db.invoice_service().resolve(&id).await?))
}

/// `DELETE /api/invoices/:id`. Restores stock before removing the record.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedInvoice>, ApiError> {
    check_id(&id)?;
    let report = state.db.invoice_service().delete(&id).await?;

    Ok(Json(DeletedInvoice {
        message: "Invoice deleted".to_string(),
        stock_restored: report.adjusted.len(),
        inventory: report,
    }))
}

/// `PATCH /api/invoices/:id/payment`
pub async fn amend_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(amendment): Json<PaymentAmendment>,
) -> Result<Json<Invoice>, ApiError> {
    check_id(&id)?;
    let invoice = state
        .db
        .invoice_service()
        .amend_payment(&id, &amendment)
        .await?;
    Ok(Json(invoice))
}

/// `GET /api/invoices/:id/html`
pub async fn html(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    check_id(&id)?;
    let page = state
        .db
        .invoice_service()
        .render_html(&id, &state.shop)
        .await?;
    Ok(Html(page))
}

/// `GET /api/invoices/:id/pdf`, displayed inline.
pub async fn pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    check_id(&id)?;
    let bytes = state
        .db
        .invoice_service()
        .render_pdf(&id, &state.shop)
        .await?;

    let disposition = format!("inline; filename=\"invoice-{id}.pdf\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
