// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Artifact catalog endpoint.

use crate::error::ApiError;
use crate::types::FilesQuery;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

/// Content type of packaged artifacts.
pub const GLTF_CONTENT_TYPE: &str = "model/gltf+json";

/// GET /api/files - List converted models, or fetch one with `?fileName=`.
pub async fn get_files(
    State(state): State<AppState>,
    Query(query): Query<FilesQuery>,
) -> Result<Response, ApiError> {
    let catalog = state.catalog.clone();

    match query.model() {
        Some(name) => {
            let name = name.to_string();
            tracing::debug!(model = %name, "Artifact lookup");

            let data = tokio::task::spawn_blocking(move || catalog.read(&name)).await??;

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, GLTF_CONTENT_TYPE)
                .header(header::CONTENT_LENGTH, data.len())
                .body(Body::from(data))
                .map_err(|e| ApiError::Internal(e.to_string()))
        }
        None => {
            let entries = tokio::task::spawn_blocking(move || catalog.list()).await??;
            tracing::debug!(count = entries.len(), "Listed artifacts");
            Ok(Json(entries).into_response())
        }
    }
}
