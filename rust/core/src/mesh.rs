// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh buffers produced by STEP tessellation

use serde::{Deserialize, Serialize};

/// One tessellated chunk of a STEP model with local vertex/index arrays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffer {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Triangle indices (i0, i1, i2), 0-based and local to this buffer
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    /// Create a buffer from flat position and index arrays
    pub fn new(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if buffer carries no vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Check that both arrays hold whole triples, every coordinate is finite
    /// and every index points into this buffer's own vertices.
    pub fn validate(&self) -> Result<(), String> {
        if self.positions.len() % 3 != 0 {
            return Err(format!(
                "position array length {} is not a multiple of 3",
                self.positions.len()
            ));
        }
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index array length {} is not a multiple of 3",
                self.indices.len()
            ));
        }

        if let Some(bad) = self.positions.iter().position(|v| !v.is_finite()) {
            return Err(format!(
                "position component {} is not finite ({})",
                bad, self.positions[bad]
            ));
        }

        let vertex_count = self.vertex_count();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(format!(
                "index {} out of range for {} vertices",
                bad, vertex_count
            ));
        }

        Ok(())
    }
}
