//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shopfloor                              │
//! │                                                                         │
//! │  Client                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  POST /api/sales/checkout                                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Business rule? ─── DbError::Domain(CoreError) ─► 404 / 400     │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Store failure? ─── DbError::QueryFailed(..) ───► 500 (logged)  │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  {"code": "INSUFFICIENT_STOCK",                                         │
//! │   "message": "Insufficient stock for p-1: available 2, requested 3",    │
//! │   "product_id": "p-1", "available": 2, "requested": 3}                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Infrastructure failures never leak their details: they are logged with
//! `tracing::error!` and the client gets a generic message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shopfloor_core::{CoreError, ValidationError};
use shopfloor_db::DbError;

/// Error returned from every handler.
///
/// ## Serialization
/// ```json
/// {
///   "code": "SALE_NOT_FOUND",
///   "message": "Sale not found: 5f0c..."
/// }
/// ```
///
/// Stock and checkout failures also carry [`ErrorDetails`] next to
/// `code` and `message`:
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Checkout line 1 (product p-2, shop s-1) rejected: ...",
///   "line": 1, "product_id": "p-2", "shop_id": "s-1",
///   "available": 1, "requested": 3, "shortfall": 2
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,

    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Structured context for display, when the error has any
    pub details: ErrorDetails,
}

/// Which checkout line failed and by how much stock fell short.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<i64>,
}

impl ErrorDetails {
    fn from_core(err: &CoreError) -> Self {
        let mut details = ErrorDetails::default();

        if let CoreError::CheckoutLineRejected {
            line,
            product_id,
            shop_id,
            ..
        } = err
        {
            details.line = Some(*line);
            details.product_id = Some(product_id.clone());
            details.shop_id = Some(shop_id.clone());
        }

        if let CoreError::InsufficientStock {
            product_id,
            available,
            requested,
        } = err.root()
        {
            details.product_id = Some(product_id.clone());
            details.available = Some(*available);
            details.requested = Some(*requested);
            details.shortfall = err.shortfall();
        }

        details
    }
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ProductNotFound,
    ShopNotFound,
    CartEntryNotFound,
    SaleNotFound,
    ReceiptNotFound,
    /// Any other missing record
    NotFound,
    InsufficientStock,
    InvalidPayment,
    ValidationError,
    /// Request body or query string could not be parsed
    BadRequest,
    /// Missing `x-user-id`
    Unauthenticated,
    /// The store could not take the write lock in time
    Busy,
    DatabaseError,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: ErrorCode,
    message: &'a str,
    #[serde(flatten)]
    details: &'a ErrorDetails,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            details: ErrorDetails::default(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthenticated, message)
    }

    fn database(message: &str) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
            details: &self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Converts core errors to API errors.
///
/// A rejected checkout line keeps the full message (line index and product)
/// but takes status and code from the error it wraps. Line and stock figures
/// are copied into [`ErrorDetails`].
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let details = ErrorDetails::from_core(&err);
        let (status, code) = match err.root() {
            CoreError::ProductNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::ProductNotFound),
            CoreError::ShopNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::ShopNotFound),
            CoreError::CartEntryNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::CartEntryNotFound),
            CoreError::SaleNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::SaleNotFound),
            CoreError::ReceiptNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::ReceiptNotFound),
            CoreError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, ErrorCode::InsufficientStock),
            CoreError::InvalidPayment { .. } => (StatusCode::BAD_REQUEST, ErrorCode::InvalidPayment),
            CoreError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
            CoreError::CheckoutLineRejected { .. } => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
        };
        ApiError {
            details,
            ..ApiError::new(status, code, message)
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::from(CoreError::Validation(err))
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { entity, id } => ApiError::new(
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                format!("{} not found: {}", entity, id),
            ),
            DbError::UniqueViolation { field, value } => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!(%message, "Foreign key violation");
                ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::Busy => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::Busy,
                "Database is busy, retry the request",
            ),
            DbError::CheckViolation { message } => {
                tracing::error!(%message, "Constraint violation");
                ApiError::database("Database operation failed")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!(error = %e, "Database connection failed");
                ApiError::database("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!(error = %e, "Database migration failed");
                ApiError::database("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!(error = %e, "Database query failed");
                ApiError::database("Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!(error = %e, "Transaction failed");
                ApiError::database("Database transaction failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::database("Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!(error = %e, "Internal database error");
                ApiError::database("Database operation failed")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_family_maps_to_404() {
        let err: ApiError = DbError::Domain(CoreError::SaleNotFound("s-1".into())).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, ErrorCode::SaleNotFound);
        assert_eq!(err.message, "Sale not found: s-1");
    }

    #[test]
    fn test_rejected_line_takes_root_status() {
        let err: ApiError = CoreError::CheckoutLineRejected {
            line: 1,
            product_id: "p-2".into(),
            shop_id: "s-1".into(),
            reason: Box::new(CoreError::insufficient_stock("p-2", 1, 3)),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err: ApiError = CoreError::CheckoutLineRejected {
            line: 0,
            product_id: "p-9".into(),
            shop_id: "s-1".into(),
            reason: Box::new(CoreError::ProductNotFound("p-9".into())),
        }
        .into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }

    #[test]
    fn test_rejected_line_body_carries_line_and_shortfall() {
        let err: ApiError = CoreError::CheckoutLineRejected {
            line: 1,
            product_id: "p-2".into(),
            shop_id: "s-1".into(),
            reason: Box::new(CoreError::insufficient_stock("p-2", 1, 3)),
        }
        .into();

        let body = serde_json::to_value(ErrorBody {
            code: err.code,
            message: &err.message,
            details: &err.details,
        })
        .unwrap();
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert_eq!(body["line"], 1);
        assert_eq!(body["product_id"], "p-2");
        assert_eq!(body["shop_id"], "s-1");
        assert_eq!(body["available"], 1);
        assert_eq!(body["requested"], 3);
        assert_eq!(body["shortfall"], 2);
    }

    #[test]
    fn test_plain_errors_have_no_details() {
        let err: ApiError = CoreError::SaleNotFound("s-1".into()).into();
        assert_eq!(err.details, ErrorDetails::default());

        let body = serde_json::to_value(ErrorBody {
            code: err.code,
            message: &err.message,
            details: &err.details,
        })
        .unwrap();
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);

        let err: ApiError = CoreError::insufficient_stock("p-1", 2, 3).into();
        assert_eq!(err.details.line, None);
        assert_eq!(err.details.product_id.as_deref(), Some("p-1"));
        assert_eq!(err.details.shortfall, Some(1));
    }

    #[test]
    fn test_infrastructure_errors_hide_details() {
        let err: ApiError = DbError::QueryFailed("near \"SELEC\": syntax error".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("SELEC"));
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_STOCK\"");
    }
}
