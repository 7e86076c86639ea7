// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cadport_core::PipelineStage;
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No files were uploaded.")]
    MissingFile,

    #[error("File too large: maximum size is {max_mb} MB")]
    FileTooLarge { max_mb: usize },

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Conversion failed. Reason: {message}")]
    Conversion {
        stage: PipelineStage,
        message: String,
    },

    #[error("Invalid model name: {0}")]
    InvalidName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ApiError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE"),
            ApiError::Multipart(e) => (e.status(), "MULTIPART_ERROR"),
            ApiError::Conversion { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONVERSION_FAILED"),
            ApiError::InvalidName(_) => (StatusCode::BAD_REQUEST, "INVALID_NAME"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        };

        let stage = match &self {
            ApiError::Conversion { stage, .. } => Some(stage.as_str()),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            stage,
        };

        (status, Json(body)).into_response()
    }
}

impl From<cadport_core::Error> for ApiError {
    fn from(err: cadport_core::Error) -> Self {
        if let Some(stage) = err.stage() {
            return ApiError::Conversion {
                stage,
                message: err.to_string(),
            };
        }

        match err {
            cadport_core::Error::NotFound(name) => {
                ApiError::NotFound(format!("GLTF file not found: {}", name))
            }
            cadport_core::Error::InvalidName(name) => ApiError::InvalidName(name),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
