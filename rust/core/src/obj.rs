// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ serialization of parsed mesh buffers.
//!
//! All buffers are concatenated into one document. Each buffer's local,
//! 0-based face indices are shifted by the number of vertices emitted before
//! it (plus one, OBJ indices are 1-based), so a face never references a
//! vertex of a later buffer.

use crate::mesh::MeshBuffer;
use std::fmt;

/// Serialized OBJ text: `v x y z` and `f a b c` lines in emission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshDocument {
    lines: Vec<String>,
    vertex_count: usize,
    face_count: usize,
}

impl MeshDocument {
    /// Document lines in emission order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of `v` records
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of `f` records
    pub fn face_count(&self) -> usize {
        self.face_count
    }
}

impl fmt::Display for MeshDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Serialize mesh buffers into a single OBJ document.
///
/// Floats use the shortest representation that parses back to the same
/// `f32`. Trailing partial triples are skipped; index validity is the
/// caller's concern (see [`MeshBuffer::validate`]).
pub fn serialize(buffers: &[MeshBuffer]) -> MeshDocument {
    let total_vertices: usize = buffers.iter().map(|b| b.vertex_count()).sum();
    let total_faces: usize = buffers.iter().map(|b| b.triangle_count()).sum();

    let mut document = MeshDocument {
        lines: Vec::with_capacity(total_vertices + total_faces),
        vertex_count: 0,
        face_count: 0,
    };

    let mut vertex_offset: u64 = 1;

    for buffer in buffers {
        for p in buffer.positions.chunks_exact(3) {
            document.lines.push(format!("v {} {} {}", p[0], p[1], p[2]));
            document.vertex_count += 1;
        }

        for tri in buffer.indices.chunks_exact(3) {
            document.lines.push(format!(
                "f {} {} {}",
                tri[0] as u64 + vertex_offset,
                tri[1] as u64 + vertex_offset,
                tri[2] as u64 + vertex_offset
            ));
            document.face_count += 1;
        }

        vertex_offset += buffer.vertex_count() as u64;
    }

    tracing::debug!(
        buffers = buffers.len(),
        vertices = document.vertex_count,
        faces = document.face_count,
        "Serialized OBJ document"
    );

    document
}
