//! # Wrench POS Server
//!
//! HTTP/JSON API for the Wrench POS invoicing backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          HTTP Routes                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/customers│  │  /api/items    │  │  /api/invoices             ││
//! │  │                │  │                │  │                            ││
//! │  │ • list/create  │  │ • list/create  │  │ • list/create/search       ││
//! │  │ • search       │  │ • search       │  │ • get/delete               ││
//! │  │                │  │ • patch        │  │ • payment amendment        ││
//! │  └────────────────┘  └────────────────┘  │ • html / pdf documents     ││
//! │                                          └────────────────────────────┘│
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  /api/settings │  │  /health       │                                │
//! │  │ • get / put    │  │ • liveness+DB  │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  AppState { db: Database, shop: ShopProfile } shared by every handler  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use wrench_core::ShopProfile;
use wrench_db::Database;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorCode};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub shop: Arc<ShopProfile>,
}

impl AppState {
    pub fn new(db: Database, shop: ShopProfile) -> Self {
        AppState {
            db,
            shop: Arc::new(shop),
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
