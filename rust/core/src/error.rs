// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline and catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the conversion pipeline and the artifact catalog
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model name: {0:?}")]
    InvalidName(String),

    #[error("Failed to write STEP file: {0}")]
    Persist(String),

    #[error("Failed to convert STEP to mesh: {0}")]
    Parse(String),

    #[error("Failed to write OBJ file: {0}")]
    Serialize(String),

    #[error("Failed to convert OBJ to GLTF: {0}")]
    Package(String),

    #[error("GLTF file not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened at.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Pipeline stage this error was raised by, if any.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Error::Persist(_) => Some(PipelineStage::Persist),
            Error::Parse(_) => Some(PipelineStage::Parse),
            Error::Serialize(_) => Some(PipelineStage::Serialize),
            Error::Package(_) => Some(PipelineStage::Package),
            _ => None,
        }
    }
}

/// The four sequential stages of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Persist,
    Parse,
    Serialize,
    Package,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Persist => "persist",
            PipelineStage::Parse => "parse",
            PipelineStage::Serialize => "serialize",
            PipelineStage::Package => "package",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
