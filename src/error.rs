// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the gateway's HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::backend::BackendError;
use crate::mapper::MapError;
use crate::settings::SettingsError;
use crate::signature::SignatureError;

/// Every failure a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Operator misconfiguration.
    #[error("{0}")]
    Config(String),

    /// Schema requested without a form id anywhere.
    #[error("Form ID is not specified or configured.")]
    MissingFormId,

    #[error(transparent)]
    Auth(SignatureError),

    #[error(transparent)]
    Validation(#[from] MapError),

    #[error("Request body exceeds {0} bytes.")]
    BodyTooLarge(usize),

    #[error("Form backend is not active.")]
    UpstreamUnavailable,

    #[error("Report not found.")]
    NotFound,

    #[error("No files found in this report.")]
    NoFilesFound,

    #[error("No route was found matching the URL and request method.")]
    NoRoute,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub data: ErrorData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorData {
    pub status: u16,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Config(_) | ApiError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingFormId | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(SignatureError::SecretNotConfigured) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Auth(SignatureError::InvalidSignature) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UpstreamUnavailable => StatusCode::NOT_IMPLEMENTED,
            ApiError::NotFound | ApiError::NoFilesFound | ApiError::NoRoute => {
                StatusCode::NOT_FOUND
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Config(_)
            | ApiError::MissingFormId
            | ApiError::Auth(SignatureError::SecretNotConfigured) => "mcp_config_error",
            ApiError::Auth(_) => "mcp_auth_error",
            ApiError::Validation(_) => "validation_error",
            ApiError::BodyTooLarge(_) => "payload_too_large",
            ApiError::UpstreamUnavailable => "plugin_error",
            ApiError::NotFound => "not_found",
            ApiError::NoFilesFound => "no_files_found",
            ApiError::NoRoute => "rest_no_route",
            ApiError::Backend(_) => "backend_error",
        }
    }
}

impl From<SignatureError> for ApiError {
    fn from(err: SignatureError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        // Keep storage details out of the response.
        error!(error = %err, "Failed to load settings");
        ApiError::Config("Settings could not be loaded.".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "Request failed");
        }
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            data: ErrorData {
                status: status.as_u16(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
