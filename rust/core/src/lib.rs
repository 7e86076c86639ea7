// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # cadport Core
//!
//! Conversion-and-storage pipeline that turns an uploaded STEP file into a
//! web-renderable glTF document and keeps every derived artifact on disk.
//!
//! ## Overview
//!
//! - **Artifact storage**: [`ArtifactStore`] maps a logical model name to
//!   `<root>/<name>/`, creating it on demand
//! - **OBJ serialization**: [`obj::serialize`] flattens parsed mesh buffers
//!   into one OBJ document with globally offset face indices
//! - **Conversion**: [`Converter`] runs persist → parse → serialize → package
//! - **Catalog**: [`Catalog`] lists packaged artifacts and resolves names
//!
//! The STEP mesher and the glTF packager are injected through the
//! [`GeometryParser`] and [`GltfPackager`] traits.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadport_core::{ArtifactStore, CommandParser, Converter, ObjGltfPackager, UploadedFile};
//! use std::sync::Arc;
//!
//! let store = ArtifactStore::open("./uploads")?;
//! let converter = Converter::new(
//!     store,
//!     Arc::new(CommandParser::new("occt-mesher")),
//!     Arc::new(ObjGltfPackager::default()),
//! );
//!
//! let report = converter.convert(UploadedFile::new("bracket.step", bytes))?;
//! println!("glTF written to {}", report.artifact_path.display());
//! ```

pub mod catalog;
pub mod error;
pub mod gltf;
pub mod mesh;
pub mod obj;
pub mod parser;
pub mod pipeline;
pub mod storage;

pub use catalog::{Catalog, CatalogEntry};
pub use error::{Error, PipelineStage, Result};
pub use gltf::{GltfPackager, ObjGltfPackager, PackageOptions};
pub use mesh::MeshBuffer;
pub use obj::MeshDocument;
pub use parser::{CommandParser, GeometryParser, ParseOutcome};
pub use pipeline::{ConversionReport, ConversionStats, Converter, UploadedFile};
pub use storage::{ArtifactStore, ARTIFACT_EXTENSION, MESH_EXTENSION};
