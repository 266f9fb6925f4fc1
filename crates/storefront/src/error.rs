//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error renders as a JSON
//! body `{"error": "..."}`; checkout validation failures add a `violations`
//! list so the client can highlight each offending field.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sleek_shop_core::{CartError, CheckoutError, CustomerField, Violation};
use thiserror::Error;

use crate::services::PaymentInFlight;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart rejected the change.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout rejected the request.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with work already in progress.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// One violation as reported to the client.
#[derive(Debug, Serialize)]
pub struct ViolationView {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<CustomerField>,
    pub message: String,
}

impl From<&Violation> for ViolationView {
    fn from(violation: &Violation) -> Self {
        Self {
            code: violation.code(),
            field: violation.field(),
            message: violation.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<ViolationView>,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Cart(_) | Self::Checkout(CheckoutError::Validation(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Checkout(CheckoutError::InvalidTransition { .. }) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PaymentInFlight> for AppError {
    fn from(err: PaymentInFlight) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Session(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match self {
            Self::Session(_) | Self::Internal(_) => ErrorBody {
                error: "Internal server error".to_string(),
                violations: Vec::new(),
            },
            Self::Checkout(CheckoutError::Validation(err)) => ErrorBody {
                error: err.to_string(),
                violations: err.violations.iter().map(ViolationView::from).collect(),
            },
            Self::Checkout(err) => ErrorBody {
                error: err.to_string(),
                violations: Vec::new(),
            },
            Self::Cart(err) => ErrorBody {
                error: err.to_string(),
                violations: Vec::new(),
            },
            Self::NotFound(message) | Self::BadRequest(message) | Self::Conflict(message) => {
                ErrorBody {
                    error: message,
                    violations: Vec::new(),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart and
/// checkout actions leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}
