// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On-disk layout of converted models.
//!
//! Every model lives in `<root>/<logical name>/` next to its derived files:
//! the raw upload, `<name>.obj` and `<name>.gltf`.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Extension of the intermediate mesh document
pub const MESH_EXTENSION: &str = "obj";

/// Extension of the packaged artifact served to viewers
pub const ARTIFACT_EXTENSION: &str = "gltf";

const MAX_NAME_LEN: usize = 255;

/// Storage root holding one directory per logical model name
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (and create if missing) a storage root.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| Error::io(root, e))?;
        let root = root.canonicalize().map_err(|e| Error::io(root, e))?;

        tracing::debug!(root = %root.display(), "Opened artifact store");
        Ok(Self { root })
    }

    /// Absolute storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a model, whether or not it exists yet
    pub fn model_dir(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// `<root>/<name>/<name>.obj`
    pub fn mesh_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self
            .model_dir(name)?
            .join(format!("{}.{}", name, MESH_EXTENSION)))
    }

    /// `<root>/<name>/<name>.gltf`
    pub fn artifact_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self
            .model_dir(name)?
            .join(format!("{}.{}", name, ARTIFACT_EXTENSION)))
    }

    /// Return the model directory, creating any missing segments.
    ///
    /// Idempotent; existing content is never touched.
    pub fn ensure_directory(&self, name: &str) -> Result<PathBuf> {
        let dir = self.model_dir(name)?;
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(dir)
    }
}

/// Sanitize an uploaded file name down to a safe base file name.
///
/// Only the last path segment is kept (`/` and `\` both separate) and any
/// character outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_file_name(file_name: &str) -> Result<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    validate_name(&sanitized)?;
    Ok(sanitized)
}

/// Derive the logical model name from an uploaded file name (its
/// sanitized stem).
pub fn logical_name(file_name: &str) -> Result<String> {
    let sanitized = sanitize_file_name(file_name)?;
    let stem = match sanitized.rfind('.') {
        Some(dot) if dot > 0 => &sanitized[..dot],
        _ => sanitized.as_str(),
    };

    validate_name(stem)?;
    Ok(stem.to_string())
}

/// Check that a name can be used as a single directory component under the
/// storage root.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}
