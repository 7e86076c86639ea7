// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP conversion pipeline.
//!
//! A conversion runs four blocking stages in order:
//!
//! 1. **persist** the raw upload to `<root>/<name>/<file name>`
//! 2. **parse** the persisted bytes into mesh buffers
//! 3. **serialize** the buffers to `<root>/<name>/<name>.obj`
//! 4. **package** the OBJ into `<root>/<name>/<name>.gltf`
//!
//! The first failing stage aborts the conversion. Files written by earlier
//! stages stay on disk for inspection; the catalog only ever surfaces the
//! final `.gltf`, so leftovers never show up as models.

use crate::error::{Error, PipelineStage, Result};
use crate::gltf::{GltfPackager, PackageOptions};
use crate::mesh::MeshBuffer;
use crate::obj;
use crate::parser::GeometryParser;
use crate::storage::{self, ArtifactStore, ARTIFACT_EXTENSION, MESH_EXTENSION};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// A STEP file received for conversion
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name as supplied by the client (e.g. `bracket.step`)
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Conversion statistics.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStats {
    /// Number of mesh buffers returned by the parser.
    pub mesh_count: usize,
    /// Vertex records written to the OBJ document.
    pub vertex_count: usize,
    /// Face records written to the OBJ document.
    pub face_count: usize,
    /// Time spent in the geometry parser (ms).
    pub parse_time_ms: u64,
    /// Total conversion time (ms).
    pub total_time_ms: u64,
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    /// Logical model name (directory name under the storage root).
    pub name: String,
    /// Packaged glTF document.
    pub artifact_path: PathBuf,
    /// Intermediate OBJ document.
    pub mesh_path: PathBuf,
    /// Persisted raw upload.
    pub source_path: PathBuf,
    /// SHA-256 of the uploaded bytes (hex).
    pub source_sha256: String,
    pub stats: ConversionStats,
}

/// Drives uploads through persist → parse → serialize → package
#[derive(Clone)]
pub struct Converter {
    store: ArtifactStore,
    parser: Arc<dyn GeometryParser>,
    packager: Arc<dyn GltfPackager>,
}

struct Persisted {
    name: String,
    dir: PathBuf,
    source_path: PathBuf,
    sha256: String,
}

impl Converter {
    pub fn new(
        store: ArtifactStore,
        parser: Arc<dyn GeometryParser>,
        packager: Arc<dyn GltfPackager>,
    ) -> Self {
        Self {
            store,
            parser,
            packager,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Convert one upload. Returns the report (including the final
    /// artifact path) only when every stage succeeded.
    pub fn convert(&self, upload: UploadedFile) -> Result<ConversionReport> {
        let total_start = Instant::now();

        tracing::info!(
            file_name = %upload.file_name,
            size = upload.bytes.len(),
            "Starting STEP conversion"
        );

        let result = self.run(upload, total_start);
        if let Err(e) = &result {
            tracing::error!(
                stage = %e.stage().map(|s| s.as_str()).unwrap_or("unknown"),
                error = %e,
                "Conversion failed"
            );
        }
        result
    }

    fn run(&self, upload: UploadedFile, total_start: Instant) -> Result<ConversionReport> {
        let persisted = self.persist(upload)?;
        let name = persisted.name.as_str();

        let parse_start = Instant::now();
        let buffers = self.parse(&persisted)?;
        let parse_time = parse_start.elapsed();

        let (mesh_path, vertex_count, face_count) = self.serialize(name, &buffers)?;
        let artifact_path = self.package(name, &persisted.dir, &mesh_path)?;

        let total_time = total_start.elapsed();
        let stats = ConversionStats {
            mesh_count: buffers.len(),
            vertex_count,
            face_count,
            parse_time_ms: parse_time.as_millis() as u64,
            total_time_ms: total_time.as_millis() as u64,
        };

        tracing::info!(
            model = %name,
            meshes = stats.mesh_count,
            vertices = stats.vertex_count,
            faces = stats.face_count,
            total_time_ms = stats.total_time_ms,
            "Conversion complete"
        );

        Ok(ConversionReport {
            name: persisted.name,
            artifact_path,
            mesh_path,
            source_path: persisted.source_path,
            source_sha256: persisted.sha256,
            stats,
        })
    }

    fn persist(&self, upload: UploadedFile) -> Result<Persisted> {
        let stage_err = |e: Error| Error::Persist(e.to_string());

        let name = storage::logical_name(&upload.file_name).map_err(stage_err)?;
        let file_name = storage::sanitize_file_name(&upload.file_name).map_err(stage_err)?;

        // The raw upload must not occupy a derived file's slot
        for extension in [MESH_EXTENSION, ARTIFACT_EXTENSION] {
            if file_name.eq_ignore_ascii_case(&format!("{}.{}", name, extension)) {
                return Err(Error::Persist(format!(
                    "upload name {:?} collides with the derived {} file",
                    file_name, extension
                )));
            }
        }

        let dir = self.store.ensure_directory(&name).map_err(stage_err)?;
        let source_path = dir.join(&file_name);

        std::fs::write(&source_path, &upload.bytes)
            .map_err(|e| stage_err(Error::io(&source_path, e)))?;

        let sha256 = hex::encode(Sha256::digest(&upload.bytes));

        tracing::debug!(
            stage = %PipelineStage::Persist,
            model = %name,
            path = %source_path.display(),
            sha256 = %sha256,
            "Persisted upload"
        );

        Ok(Persisted {
            name,
            dir,
            source_path,
            sha256,
        })
    }

    fn parse(&self, persisted: &Persisted) -> Result<Vec<MeshBuffer>> {
        let bytes = std::fs::read(&persisted.source_path)
            .map_err(|e| Error::Parse(Error::io(&persisted.source_path, e).to_string()))?;

        let outcome = self
            .parser
            .parse(&bytes)
            .map_err(|e| Error::Parse(format!("{:#}", e)))?;

        if !outcome.success {
            return Err(Error::Parse("parser reported failure".into()));
        }
        if outcome.meshes.is_empty() {
            return Err(Error::Parse("parser returned no meshes".into()));
        }
        for (i, buffer) in outcome.meshes.iter().enumerate() {
            buffer
                .validate()
                .map_err(|reason| Error::Parse(format!("mesh {}: {}", i, reason)))?;
        }

        tracing::debug!(
            stage = %PipelineStage::Parse,
            model = %persisted.name,
            meshes = outcome.meshes.len(),
            "Parsed STEP geometry"
        );

        Ok(outcome.meshes)
    }

    fn serialize(&self, name: &str, buffers: &[MeshBuffer]) -> Result<(PathBuf, usize, usize)> {
        let document = obj::serialize(buffers);
        let mesh_path = self
            .store
            .mesh_path(name)
            .map_err(|e| Error::Serialize(e.to_string()))?;

        std::fs::write(&mesh_path, document.to_string())
            .map_err(|e| Error::Serialize(Error::io(&mesh_path, e).to_string()))?;

        tracing::debug!(
            stage = %PipelineStage::Serialize,
            model = %name,
            path = %mesh_path.display(),
            vertices = document.vertex_count(),
            faces = document.face_count(),
            "Wrote OBJ document"
        );

        Ok((mesh_path, document.vertex_count(), document.face_count()))
    }

    fn package(&self, name: &str, dir: &Path, mesh_path: &Path) -> Result<PathBuf> {
        let options = PackageOptions {
            output_directory: dir.to_path_buf(),
        };

        let document = self
            .packager
            .package(mesh_path, &options)
            .map_err(|e| Error::Package(format!("{:#}", e)))?;

        let artifact_path = self
            .store
            .artifact_path(name)
            .map_err(|e| Error::Package(e.to_string()))?;
        let text = serde_json::to_string_pretty(&document)
            .map_err(|e| Error::Package(e.to_string()))?;

        std::fs::write(&artifact_path, text)
            .map_err(|e| Error::Package(Error::io(&artifact_path, e).to_string()))?;

        tracing::debug!(
            stage = %PipelineStage::Package,
            model = %name,
            path = %artifact_path.display(),
            "Wrote glTF document"
        );

        Ok(artifact_path)
    }
}
