//! Typed errors for filter validation and list fetching
//!
//! - [`FilterError`]: a request asked for something the resource cannot filter,
//!   sort or page by. Always a client-input error (HTTP 400).
//! - [`ListError`]: a list request failed on the client side (transport,
//!   status, decoding) or the server reported `success: false`.
//!
//! - [`StoreError`] / [`ApiError`]: server-side failures of a list endpoint.
//!
//! Both are rendered to users as plain strings; [`FilterError`] also turns into
//! the standard `{ success: false, error, details }` envelope when returned from
//! an axum handler.

use crate::core::field::FieldType;
use crate::core::filter::FilterOperator;
use crate::core::query::ApiResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors raised while validating a filter state against a resource schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("Unknown filter field '{field}' for {resource}")]
    UnknownField { resource: String, field: String },

    #[error("Operator '{operator}' is not valid for {field_type} field '{field}'")]
    InvalidOperator {
        field: String,
        operator: FilterOperator,
        field_type: FieldType,
    },

    #[error("Operator '{operator}' on field '{field}' requires a value")]
    MissingValue {
        field: String,
        operator: FilterOperator,
    },

    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Unknown sort field '{field}' for {resource}")]
    UnknownSortField { resource: String, field: String },

    #[error("Sort field '{field}' appears more than once")]
    DuplicateSortField { field: String },

    #[error("Invalid '{param}' parameter: {message}")]
    MalformedParameter { param: String, message: String },

    #[error("Page size {limit} is not allowed (allowed: {allowed:?})")]
    LimitNotAllowed { limit: usize, allowed: Vec<usize> },
}

impl FilterError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FilterError::UnknownField { .. } => "UNKNOWN_FILTER_FIELD",
            FilterError::InvalidOperator { .. } => "INVALID_OPERATOR",
            FilterError::MissingValue { .. } => "MISSING_VALUE",
            FilterError::InvalidValue { .. } => "INVALID_VALUE",
            FilterError::UnknownSortField { .. } => "UNKNOWN_SORT_FIELD",
            FilterError::DuplicateSortField { .. } => "DUPLICATE_SORT_FIELD",
            FilterError::MalformedParameter { .. } => "MALFORMED_PARAMETER",
            FilterError::LimitNotAllowed { .. } => "LIMIT_NOT_ALLOWED",
        }
    }

    /// Diagnostic payload carried in the envelope's `details`
    pub fn details(&self) -> serde_json::Value {
        match self {
            FilterError::UnknownField { field, .. }
            | FilterError::UnknownSortField { field, .. }
            | FilterError::DuplicateSortField { field }
            | FilterError::InvalidValue { field, .. } => {
                json!({ "code": self.error_code(), "field": field })
            }
            FilterError::InvalidOperator {
                field,
                operator,
                field_type,
            } => json!({
                "code": self.error_code(),
                "field": field,
                "operator": operator,
                "fieldType": field_type,
            }),
            FilterError::MissingValue { field, operator } => json!({
                "code": self.error_code(),
                "field": field,
                "operator": operator,
            }),
            FilterError::MalformedParameter { param, .. } => {
                json!({ "code": self.error_code(), "param": param })
            }
            FilterError::LimitNotAllowed { allowed, .. } => {
                json!({ "code": self.error_code(), "allowed": allowed })
            }
        }
    }
}

impl IntoResponse for FilterError {
    fn into_response(self) -> Response {
        tracing::debug!(code = self.error_code(), error = %self, "Rejected list request");
        let body = ApiResponse::<()>::failure(self.to_string(), Some(self.details()));
        (self.status_code(), Json(body)).into_response()
    }
}

/// Errors surfaced by the generic list fetcher
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListError {
    /// The request never produced an HTTP response
    #[error("{0}")]
    Transport(String),

    /// Non-2xx status without a usable envelope
    #[error("Failed to fetch {resource}")]
    Status { resource: String, status: u16 },

    /// The server answered `success: false`; `message` is shown verbatim
    #[error("{message}")]
    Server {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// 2xx response whose body is not a usable envelope
    #[error("Invalid {resource} response")]
    InvalidResponse { resource: String },
}

/// Errors raised by a resource store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to acquire {0} lock")]
    Poisoned(&'static str),
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Resource store failure");
        let body = ApiResponse::<()>::failure("An internal error occurred", None);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Anything a list endpoint can fail with
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Filter(e) => e.into_response(),
            ApiError::Store(e) => e.into_response(),
        }
    }
}
