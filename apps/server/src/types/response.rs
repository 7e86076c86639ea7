// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use cadport_core::{ConversionReport, ConversionStats};
use serde::Serialize;

/// Successful conversion response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub message: &'static str,
    /// Path of the packaged glTF document.
    pub final_artifact_path: String,
    /// Logical model name, usable as `fileName` on `GET /api/files`.
    pub model: String,
    /// SHA-256 of the uploaded STEP file.
    pub sha256: String,
    pub stats: ConversionStats,
}

impl From<ConversionReport> for ConvertResponse {
    fn from(report: ConversionReport) -> Self {
        Self {
            message: "Conversion complete.",
            final_artifact_path: report.artifact_path.display().to_string(),
            model: report.name,
            sha256: report.source_sha256,
            stats: report.stats,
        }
    }
}
