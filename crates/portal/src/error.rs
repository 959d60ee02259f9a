//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server errors are captured to Sentry
//! before responding. Failures inside a flow (validation, a rejected PATCH)
//! never reach this type: they become a banner on the dashboard instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::culto::CultoError;
use crate::shopify::ShopifyError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Culto API call failed.
    #[error("Culto error: {0}")]
    Culto(#[from] CultoError),

    /// Shopify API call failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Session store failed to load or save.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Visitor is not bound to a Shopify customer.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Culto(_) | Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Template(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Template(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Culto(_) | Self::Shopify(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from the bound Shopify customer.
pub fn set_sentry_user(customer_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the customer.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a customer action.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cancel", "Confirmed cancellation", Some(&[("subscription_id", "sub_1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("sub_123".to_string());
        assert_eq!(err.to_string(), "Not found: sub_123");

        let err = AppError::BadRequest("invalid shop".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid shop");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_errors_are_bad_gateway() {
        let culto = CultoError::Api {
            status: 500,
            context: "Failed to fetch subscriptions",
            body: "boom".to_string(),
        };
        assert_eq!(get_status(AppError::from(culto)), StatusCode::BAD_GATEWAY);

        let shopify = ShopifyError::NotFound("Customer not found".to_string());
        assert_eq!(get_status(AppError::from(shopify)), StatusCode::BAD_GATEWAY);
    }
}
