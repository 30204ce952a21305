use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::{DbErr, SqlErr};

use crate::models::envelope::{FieldErrorEnvelope, MessageEnvelope};

/// Per-field validation messages, rendered as `{"error": {field: [messages]}}`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record a "required" message when `value` is blank.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("The {field} field is required"));
        }
    }

    /// Record a "required" message when an id is absent or not positive.
    pub fn require_id(&mut self, field: &str, value: Option<i32>) {
        if !matches!(value, Some(id) if id > 0) {
            self.add(field, format!("The {field} field is required"));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self))
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request that never reached storage.
    Validation(String),
    /// One or more required fields missing or malformed.
    InvalidFields(FieldErrors),
    Unauthorized(&'static str),
    Forbidden,
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    /// Database operation failed; detail is logged, never sent.
    Persistence(String),
    /// Filesystem write or delete failed; detail is logged, never sent.
    Storage(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Persistence(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::InvalidFields(errors) => {
                return (
                    status,
                    Json(FieldErrorEnvelope::new(status, errors.into_inner())),
                )
                    .into_response();
            }
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::PayloadTooLarge(msg) => msg,
            AppError::Unauthorized(msg) => msg.to_string(),
            AppError::Forbidden => "Insufficient permissions".to_string(),
            AppError::Persistence(detail) => {
                tracing::error!("Persistence error: {}", detail);
                "A database error occurred".to_string()
            }
            AppError::Storage(detail) => {
                tracing::error!("Storage error: {}", detail);
                "A file storage error occurred".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "An internal error occurred".to_string()
            }
        };

        (status, Json(MessageEnvelope::new(status, message))).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!("Unique constraint violation: {detail}");
                AppError::Conflict("A record with the same unique value already exists".into())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::debug!("Foreign key violation: {detail}");
                AppError::Validation("Referenced record does not exist or is still in use".into())
            }
            _ => AppError::Persistence(err.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::PayloadTooLarge(format!("Uploaded file exceeds {limit} bytes"))
            }
            StorageError::InvalidName(msg) => AppError::Validation(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}
