//! # API Error Types
//!
//! Maps engine and database errors onto HTTP responses.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  400  validation failures, malformed input                              │
//! │  401  billing webhook without (or with a wrong) token                   │
//! │  404  unknown ids                                                       │
//! │  409  slot already taken, cash session already open                     │
//! │  422  business-rule rejections (status machine, credits, stock,         │
//! │       unconfirmed discount, mixed package tender, no open session)      │
//! │  500  everything else                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The booking site retries on 409 by refreshing availability; the admin
//! SPA surfaces 422 bodies verbatim to the operator.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use navalha_core::CoreError;
use navalha_db::DbError;

/// Errors a request handler can produce.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Upstream billing function failed: {0}")]
    Upstream(String),
}

impl ApiError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Core(err) => match err {
                CoreError::SlotConflict { .. } => "slot_conflict",
                CoreError::InvalidStatusTransition { .. } => "invalid_transition",
                CoreError::DeleteNotAllowed { .. } => "delete_not_allowed",
                CoreError::PackageExhausted { .. } => "package_exhausted",
                CoreError::InsufficientStock { .. } => "insufficient_stock",
                CoreError::DiscountNotConfirmed { .. } => "discount_not_confirmed",
                CoreError::MixedPackagePayment => "mixed_package_payment",
                CoreError::NoOpenCashSession { .. } => "no_open_cash_session",
                CoreError::InvalidPaymentAmount { .. } => "invalid_payment_amount",
                CoreError::Validation(_) => "validation",
            },
            ApiError::Db(err) => match err {
                DbError::NotFound { .. } => "not_found",
                DbError::SlotTaken { .. } => "slot_conflict",
                DbError::SessionAlreadyOpen { .. } => "session_already_open",
                DbError::InvalidTransition { .. } => "invalid_transition",
                DbError::DeleteNotAllowed { .. } => "delete_not_allowed",
                DbError::PackageExhausted { .. } => "package_exhausted",
                DbError::InsufficientStock { .. } => "insufficient_stock",
                _ => "internal",
            },
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Upstream(_) => "upstream",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => match err {
                CoreError::Validation(_) | CoreError::InvalidPaymentAmount { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CoreError::SlotConflict { .. } => StatusCode::CONFLICT,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ApiError::Db(err) => match err {
                DbError::NotFound { .. } => StatusCode::NOT_FOUND,
                DbError::SlotTaken { .. } | DbError::SessionAlreadyOpen { .. } => {
                    StatusCode::CONFLICT
                }
                DbError::InvalidTransition { .. }
                | DbError::DeleteNotAllowed { .. }
                | DbError::PackageExhausted { .. }
                | DbError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        }))
    }
}

impl From<navalha_core::ValidationError> for ApiError {
    fn from(err: navalha_core::ValidationError) -> Self {
        ApiError::Core(CoreError::Validation(err))
    }
}

/// Result type for request handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts_map_to_409() {
        let err = ApiError::Db(DbError::slot_taken("2026-03-02", "10:00"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "slot_conflict");

        let err = ApiError::Db(DbError::SessionAlreadyOpen {
            shop_id: "s1".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_business_rules_map_to_422() {
        let err = ApiError::Core(CoreError::MixedPackagePayment);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::Db(DbError::InvalidTransition {
            from: "pendente".to_string(),
            to: "finalizado".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = ApiError::from(navalha_core::ValidationError::Required {
            field: "customer_name".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
