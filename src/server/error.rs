//! API error types and JSON response formatting.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{Error, ValidationError};
use crate::store::StoreError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details in the response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that converts to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// No live page with this id in any namespace.
    pub fn page_not_found(page_id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "PAGE_NOT_FOUND",
            format!("Page '{}' not found", page_id),
        )
        .with_details(serde_json::json!({ "page_id": page_id }))
    }

    /// The slug did not resolve within the retry budget.
    pub fn slug_not_found(slug: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "SLUG_NOT_FOUND",
            format!("No page is published under '{}'", slug),
        )
        .with_details(serde_json::json!({ "slug": slug }))
    }

    /// A required query parameter is missing.
    pub fn missing_parameter(name: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "MISSING_PARAMETER",
            format!("Query parameter '{}' is required", name),
        )
    }

    /// The request was dropped because the server is shutting down.
    pub fn unavailable() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SHUTTING_DOWN",
            "Server is shutting down",
        )
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        match err {
            ValidationError::EmptyTitle => {
                Self::new(StatusCode::BAD_REQUEST, "EMPTY_TITLE", message)
            }
            ValidationError::InvalidSlug(slug) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_SLUG", message)
                    .with_details(serde_json::json!({ "slug": slug }))
            }
            ValidationError::ReservedSlug(slug) => {
                Self::new(StatusCode::BAD_REQUEST, "RESERVED_SLUG", message)
                    .with_details(serde_json::json!({ "slug": slug }))
            }
            ValidationError::SlugTaken { slug, page_id } => {
                Self::new(StatusCode::CONFLICT, "SLUG_TAKEN", message)
                    .with_details(serde_json::json!({ "slug": slug, "page_id": page_id }))
            }
            ValidationError::UnknownComponentType(kind) => {
                Self::new(StatusCode::BAD_REQUEST, "UNKNOWN_COMPONENT_TYPE", message)
                    .with_details(serde_json::json!({ "type": kind }))
            }
            ValidationError::InvalidAlignment {
                component_id,
                value,
            } => Self::new(StatusCode::BAD_REQUEST, "INVALID_ALIGNMENT", message).with_details(
                serde_json::json!({ "component_id": component_id, "value": value }),
            ),
            ValidationError::DuplicateComponent(id) => {
                Self::new(StatusCode::BAD_REQUEST, "DUPLICATE_COMPONENT", message)
                    .with_details(serde_json::json!({ "component_id": id }))
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Rejected { path, .. } => {
                Self::new(StatusCode::BAD_GATEWAY, "STORE_REJECTED", err.to_string())
                    .with_details(serde_json::json!({ "path": path }))
            }
            StoreError::Closed => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORE_CLOSED", err.to_string())
            }
            _ => Self::new(StatusCode::BAD_GATEWAY, "STORE_ERROR", err.to_string()),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(err) => err.into(),
            Error::Store(err) => err.into(),
            Error::NotOwner { page_id } => Self::new(
                StatusCode::FORBIDDEN,
                "NOT_OWNER",
                format!("Page '{}' belongs to another author", page_id),
            )
            .with_details(serde_json::json!({ "page_id": page_id })),
            Error::PageNotFound(page_id) => Self::page_not_found(&page_id),
            Error::Io(err) => Self::internal(err.to_string()),
        }
    }
}
