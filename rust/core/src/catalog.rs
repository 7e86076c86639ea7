// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Catalog of packaged glTF artifacts.
//!
//! There is no index: every query walks the storage root, so an artifact is
//! visible as soon as its conversion has written it.

use crate::error::{Error, Result};
use crate::storage::{self, ARTIFACT_EXTENSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A packaged artifact as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Logical model name (directory name)
    pub name: String,
    /// Artifact file name, `<name>.gltf`
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Retrieval URL, keyed by the model name
    pub url: String,
}

/// Read-only view over the storage root
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    public_url: String,
}

impl Catalog {
    /// `public_url` is the API base used to template retrieval URLs, e.g.
    /// `http://localhost:8080/api`.
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Retrieval URL of a model
    pub fn url_for(&self, name: &str) -> String {
        format!("{}/files?fileName={}", self.public_url, name)
    }

    /// List every model directory holding its canonical artifact.
    pub fn list(&self) -> Result<Vec<CatalogEntry>> {
        let read_dir = match std::fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.root, e)),
        };

        let mut entries = Vec::new();

        for entry in read_dir {
            let entry = entry.map_err(|e| Error::io(&self.root, e))?;
            let path = entry.path();

            let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
            if !file_type.is_dir() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::debug!(path = %path.display(), "Skipping non UTF-8 directory");
                continue;
            };
            if storage::validate_name(&name).is_err() {
                continue;
            }

            if let Some(catalog_entry) = self.entry_for(&path, &name)? {
                entries.push(catalog_entry);
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(root = %self.root.display(), count = entries.len(), "Listed artifacts");
        Ok(entries)
    }

    /// Build the entry for one model directory, if its artifact exists.
    fn entry_for(&self, dir: &Path, name: &str) -> Result<Option<CatalogEntry>> {
        let file_name = format!("{}.{}", name, ARTIFACT_EXTENSION);
        let artifact = dir.join(&file_name);

        let metadata = match std::fs::metadata(&artifact) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.log_stray_artifacts(dir);
                return Ok(None);
            }
            Err(e) => return Err(Error::io(&artifact, e)),
        };

        let modified = metadata
            .modified()
            .map_err(|e| Error::io(&artifact, e))?;

        Ok(Some(CatalogEntry {
            name: name.to_string(),
            file_name,
            size: metadata.len(),
            modified: DateTime::<Utc>::from(modified),
            url: self.url_for(name),
        }))
    }

    /// Only `<name>/<name>.gltf` is served; say so when a directory holds
    /// some other `.gltf` instead.
    fn log_stray_artifacts(&self, dir: &Path) {
        let Ok(read_dir) = std::fs::read_dir(dir) else {
            return;
        };
        for path in read_dir.flatten().map(|e| e.path()) {
            let is_artifact = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ARTIFACT_EXTENSION));
            if is_artifact {
                tracing::debug!(path = %path.display(), "Ignoring non-canonical artifact");
            }
        }
    }

    /// Path of a model's canonical artifact, `<root>/<name>/<name>.gltf`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        storage::validate_name(name)?;

        let path = self
            .root
            .join(name)
            .join(format!("{}.{}", name, ARTIFACT_EXTENSION));

        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::NotFound(name.to_string()))
        }
    }

    /// Resolve and read a model's artifact.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(name.to_string()),
            _ => Error::io(&path, e),
        })
    }
}
