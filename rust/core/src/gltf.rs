// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OBJ → glTF 2.0 packaging.
//!
//! [`ObjGltfPackager`] produces a self-contained `.gltf` JSON document: one
//! node and mesh per OBJ object, positions/normals/indices packed into a
//! single buffer embedded as a base64 data URI.

use anyhow::{bail, Context};
use base64::Engine;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const COMPONENT_FLOAT: u32 = 5126;
const COMPONENT_UNSIGNED_INT: u32 = 5125;
const MODE_TRIANGLES: u32 = 4;

/// Options handed to a packager
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Directory the packaged document will be written to
    pub output_directory: PathBuf,
}

/// External OBJ → glTF capability
pub trait GltfPackager: Send + Sync {
    fn package(&self, mesh_document: &Path, options: &PackageOptions) -> anyhow::Result<Value>;
}

/// Native packager built on `tobj`
#[derive(Debug, Clone)]
pub struct ObjGltfPackager {
    generator: String,
    /// RGBA base color of the default material
    base_color: [f32; 4],
}

impl Default for ObjGltfPackager {
    fn default() -> Self {
        Self {
            generator: format!("cadport {}", env!("CARGO_PKG_VERSION")),
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

/// Byte layout of one primitive inside the shared buffer
struct PrimitiveLayout {
    name: String,
    vertex_count: usize,
    index_count: usize,
    min: [f32; 3],
    max: [f32; 3],
}

impl GltfPackager for ObjGltfPackager {
    fn package(&self, mesh_document: &Path, options: &PackageOptions) -> anyhow::Result<Value> {
        let (models, _materials) = tobj::load_obj(
            mesh_document,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .with_context(|| format!("failed to load {}", mesh_document.display()))?;

        let models: Vec<tobj::Model> = models
            .into_iter()
            .filter(|m| !m.mesh.positions.is_empty() && !m.mesh.indices.is_empty())
            .collect();

        if models.is_empty() {
            bail!("OBJ file contains no triangles");
        }

        tracing::debug!(
            models = models.len(),
            output_directory = %options.output_directory.display(),
            "Packaging OBJ as glTF"
        );

        let mut bin: Vec<u8> = Vec::new();
        let mut layouts = Vec::with_capacity(models.len());

        for model in &models {
            let mesh = &model.mesh;
            let normals = calculate_normals(&mesh.positions, &mesh.indices);
            let (min, max) = bounds(&mesh.positions);

            extend_f32(&mut bin, &mesh.positions);
            extend_f32(&mut bin, &normals);
            for index in &mesh.indices {
                bin.extend_from_slice(&index.to_le_bytes());
            }

            layouts.push(PrimitiveLayout {
                name: model.name.clone(),
                vertex_count: mesh.positions.len() / 3,
                index_count: mesh.indices.len(),
                min,
                max,
            });
        }

        Ok(self.build_document(&layouts, &bin))
    }
}

impl ObjGltfPackager {
    fn build_document(&self, layouts: &[PrimitiveLayout], bin: &[u8]) -> Value {
        let mut buffer_views = Vec::new();
        let mut accessors = Vec::new();
        let mut meshes = Vec::new();
        let mut nodes = Vec::new();
        let mut offset = 0usize;

        for (i, layout) in layouts.iter().enumerate() {
            let vec3_len = layout.vertex_count * 3 * 4;
            let index_len = layout.index_count * 4;
            let base = accessors.len();

            buffer_views.push(json!({
                "buffer": 0, "byteOffset": offset, "byteLength": vec3_len, "target": ARRAY_BUFFER
            }));
            accessors.push(json!({
                "bufferView": buffer_views.len() - 1,
                "componentType": COMPONENT_FLOAT,
                "count": layout.vertex_count,
                "type": "VEC3",
                "min": layout.min,
                "max": layout.max,
            }));
            offset += vec3_len;

            buffer_views.push(json!({
                "buffer": 0, "byteOffset": offset, "byteLength": vec3_len, "target": ARRAY_BUFFER
            }));
            accessors.push(json!({
                "bufferView": buffer_views.len() - 1,
                "componentType": COMPONENT_FLOAT,
                "count": layout.vertex_count,
                "type": "VEC3",
            }));
            offset += vec3_len;

            buffer_views.push(json!({
                "buffer": 0, "byteOffset": offset, "byteLength": index_len, "target": ELEMENT_ARRAY_BUFFER
            }));
            accessors.push(json!({
                "bufferView": buffer_views.len() - 1,
                "componentType": COMPONENT_UNSIGNED_INT,
                "count": layout.index_count,
                "type": "SCALAR",
            }));
            offset += index_len;

            meshes.push(json!({
                "name": layout.name,
                "primitives": [{
                    "attributes": { "POSITION": base, "NORMAL": base + 1 },
                    "indices": base + 2,
                    "material": 0,
                    "mode": MODE_TRIANGLES,
                }],
            }));
            nodes.push(json!({ "name": layout.name, "mesh": i }));
        }

        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bin)
        );

        let scene_nodes: Vec<usize> = (0..nodes.len()).collect();

        json!({
            "asset": { "version": "2.0", "generator": self.generator },
            "scene": 0,
            "scenes": [{ "nodes": scene_nodes }],
            "nodes": nodes,
            "meshes": meshes,
            "materials": [{
                "name": "default",
                "pbrMetallicRoughness": {
                    "baseColorFactor": self.base_color,
                    "metallicFactor": 0.0,
                    "roughnessFactor": 1.0,
                },
                "doubleSided": false,
            }],
            "accessors": accessors,
            "bufferViews": buffer_views,
            "buffers": [{ "byteLength": bin.len(), "uri": uri }],
        })
    }
}

fn extend_f32(bin: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        bin.extend_from_slice(&v.to_le_bytes());
    }
}

fn bounds(positions: &[f32]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for p in positions.chunks_exact(3) {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    (min, max)
}

/// Area-weighted smooth vertex normals
fn calculate_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut normals = vec![0.0f32; positions.len()];
    let vertex = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (v0, v1, v2) = (vertex(i0), vertex(i1), vertex(i2));
        let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        // Cross product length is twice the triangle area, which is the weight
        let n = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];
        for &i in &[i0, i1, i2] {
            normals[i * 3] += n[0];
            normals[i * 3 + 1] += n[1];
            normals[i * 3 + 2] += n[2];
        }
    }

    for n in normals.chunks_exact_mut(3) {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len > f32::EPSILON {
            n[0] /= len;
            n[1] /= len;
            n[2] /= len;
        } else {
            n.copy_from_slice(&[0.0, 0.0, 1.0]);
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    const QUAD: &str = "v 0 0 0\nv 2 0 0\nv 2 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4";

    fn package_text(obj: &str) -> anyhow::Result<Value> {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("quad.obj");
        std::fs::write(&path, obj).unwrap();
        ObjGltfPackager::default().package(
            &path,
            &PackageOptions {
                output_directory: tmp.path().to_path_buf(),
            },
        )
    }

    #[test]
    fn test_package_quad() {
        let doc = package_text(QUAD).unwrap();

        assert_eq!(doc["asset"]["version"], "2.0");
        assert_eq!(doc["meshes"].as_array().unwrap().len(), 1);

        let position = &doc["accessors"][0];
        assert_eq!(position["count"], 4);
        assert_eq!(position["min"], json!([0.0, 0.0, 0.0]));
        assert_eq!(position["max"], json!([2.0, 1.0, 0.0]));
        assert_eq!(doc["accessors"][2]["count"], 6);

        // 4 positions + 4 normals (12 bytes each) + 6 u32 indices
        let expected_len = 4 * 12 * 2 + 6 * 4;
        assert_eq!(doc["buffers"][0]["byteLength"], expected_len);

        let uri = doc["buffers"][0]["uri"].as_str().unwrap();
        let payload = uri.strip_prefix("data:application/octet-stream;base64,").unwrap();
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        assert_eq!(bytes.len(), expected_len);
    }

    #[test]
    fn test_buffer_views_are_contiguous() {
        let doc = package_text(QUAD).unwrap();
        let views = doc["bufferViews"].as_array().unwrap();

        let mut expected_offset = 0;
        for view in views {
            assert_eq!(view["byteOffset"], expected_offset);
            expected_offset += view["byteLength"].as_u64().unwrap();
        }
        assert_eq!(doc["buffers"][0]["byteLength"], expected_offset);
    }

    #[test]
    fn test_package_rejects_empty_obj() {
        assert!(package_text("# nothing here\n").is_err());
    }

    #[test]
    fn test_package_missing_file() {
        let result = ObjGltfPackager::default().package(
            Path::new("/nonexistent/model.obj"),
            &PackageOptions {
                output_directory: PathBuf::from("/nonexistent"),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_flat_triangle_normals_point_up() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = calculate_normals(&positions, &[0, 1, 2]);
        for n in normals.chunks_exact(3) {
            assert_relative_eq!(n[0], 0.0);
            assert_relative_eq!(n[1], 0.0);
            assert_relative_eq!(n[2], 1.0);
        }
    }

    #[test]
    fn test_unreferenced_vertex_gets_default_normal() {
        let positions = [0.0; 12];
        let normals = calculate_normals(&positions, &[]);
        assert_eq!(&normals[9..], &[0.0, 0.0, 1.0]);
    }
}
