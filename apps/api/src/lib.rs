//! # Shopfloor API
//!
//! JSON over HTTP for the cart, sale recorder and checkout.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Routes                                      │
//! │                                                                         │
//! │  ┌────────────────────┐  ┌────────────────────┐  ┌───────────────────┐ │
//! │  │  /api/cart         │  │  /api/sales        │  │  /api/receipts    │ │
//! │  │                    │  │                    │  │                   │ │
//! │  │ • GET    list      │  │ • GET    list      │  │ • GET /{id}       │ │
//! │  │ • POST   add       │  │ • POST   record    │  │                   │ │
//! │  │ • PUT    /{id}     │  │ • GET/PUT/DELETE   │  ├───────────────────┤ │
//! │  │ • DELETE /{id}     │  │          /{id}     │  │  /api/products    │ │
//! │  │ • DELETE clear     │  │ • POST   checkout  │  │ • GET /{id}/      │ │
//! │  │                    │  │                    │  │      movements    │ │
//! │  └────────────────────┘  └────────────────────┘  └───────────────────┘ │
//! │                                                                         │
//! │  Layers: TraceLayer (request spans) → CorsLayer → handlers             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `SHOPFLOOR_DB_PATH` - SQLite database file (default: ./shopfloor.db)
//! - `HTTP_PORT` - HTTP server port (default: 8080)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `DB_BUSY_TIMEOUT_SECS` - Write lock wait (default: 5)
//! - `RUST_LOG` - Log filter (default: info,shopfloor=debug,sqlx=warn)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use axum::Router;
use shopfloor_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode, ErrorDetails};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}

/// Builds the full router with its layers.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
