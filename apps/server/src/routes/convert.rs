// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP upload and conversion endpoint.

use crate::error::ApiError;
use crate::types::ConvertResponse;
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use cadport_core::UploadedFile;

/// Multipart field names accepted for the STEP upload.
const UPLOAD_FIELDS: [&str; 2] = ["stepFile", "file"];

/// A body cut off by the request size limit surfaces as a multipart error.
fn multipart_error(err: MultipartError, max_mb: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::FileTooLarge { max_mb }
    } else {
        ApiError::Multipart(err)
    }
}

/// Extract the uploaded STEP file from a multipart request.
async fn extract_upload(multipart: &mut Multipart, max_mb: usize) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_mb))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        tracing::debug!(field_name = %field_name, "Processing multipart field");

        if !UPLOAD_FIELDS.contains(&field_name.as_str()) {
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            tracing::warn!(field_name = %field_name, "Upload field has no file name");
            continue;
        };

        let bytes = field.bytes().await.map_err(|e| multipart_error(e, max_mb))?;
        tracing::debug!(file_name = %file_name, size = bytes.len(), "Extracted file from multipart");
        return Ok(UploadedFile::new(file_name, bytes.to_vec()));
    }

    tracing::warn!("No 'stepFile' field found in multipart request");
    Err(ApiError::MissingFile)
}

/// POST /api/convert - Convert an uploaded STEP file to glTF.
pub async fn convert(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let upload = extract_upload(&mut multipart, state.config.max_file_size_mb).await?;

    if upload.bytes.len() > state.config.max_file_size_bytes() {
        return Err(ApiError::FileTooLarge {
            max_mb: state.config.max_file_size_mb,
        });
    }

    // Conversion does blocking file I/O and waits on the mesher process
    let converter = state.converter.clone();
    let report = tokio::task::spawn_blocking(move || converter.convert(upload)).await??;

    tracing::info!(
        model = %report.name,
        path = %report.artifact_path.display(),
        "Conversion complete"
    );

    Ok(Json(ConvertResponse::from(report)))
}
