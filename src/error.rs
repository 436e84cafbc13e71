use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::metadata::MetadataError;
use crate::domain::aggregates::{BasketError, OrderError, StockProblem};
use crate::domain::value_objects::MoneyError;
use crate::webhook::signature::SignatureError;

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient stock")]
    OutOfStock(Vec<StockProblem>),

    #[error("Sign-in required")]
    Unauthorized,

    #[error("Webhook signature rejected: {0}")]
    Signature(#[from] SignatureError),

    #[error("Checkout metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

impl StorefrontError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::Signature(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::OutOfStock(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Metadata(_) | Self::Database(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when a unique constraint rejected the write.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(db)) if db.is_unique_violation())
    }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(err: validator::ValidationErrors) -> Self {
        StorefrontError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for StorefrontError {
    fn from(rejection: JsonRejection) -> Self {
        StorefrontError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for StorefrontError {
    fn from(rejection: QueryRejection) -> Self {
        StorefrontError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for StorefrontError {
    fn from(rejection: PathRejection) -> Self {
        StorefrontError::Validation(rejection.body_text())
    }
}

impl From<MoneyError> for StorefrontError {
    fn from(err: MoneyError) -> Self {
        StorefrontError::Validation(err.to_string())
    }
}

impl From<BasketError> for StorefrontError {
    fn from(err: BasketError) -> Self {
        StorefrontError::Validation(err.to_string())
    }
}

impl From<OrderError> for StorefrontError {
    fn from(err: OrderError) -> Self {
        StorefrontError::Conflict(err.to_string())
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = match &self {
            Self::OutOfStock(problems) => json!({
                "error": self.to_string(),
                "status": status.as_u16(),
                "items": problems,
            }),
            _ => json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
