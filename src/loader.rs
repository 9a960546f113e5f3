//! glTF import into loader descriptors.

use std::path::Path;

use cgmath::{Quaternion, Vector3};
use gltf::mesh::util::ReadIndices;
use log::{debug, warn};

use crate::data::{MaterialData, MeshData, PrimitiveData, TextureData};
use crate::error::{EngineError, EngineResult};

/// Reads every mesh-carrying node of the default scene (or the first scene
/// when no default is set), depth first.
pub fn load_model(path: &Path) -> EngineResult<Vec<MeshData>> {
    let (document, buffers, images) = gltf::import(path).map_err(|source| match source {
        gltf::Error::Io(source) => EngineError::Io {
            path: path.to_path_buf(),
            source,
        },
        source => EngineError::Gltf {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| EngineError::MissingScene {
            path: path.to_path_buf(),
        })?;

    let loader = Loader {
        path,
        buffers: &buffers,
        images: &images,
    };

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        loader.visit_node(&node, &mut meshes)?;
    }

    debug!("Loaded {} meshes from {:?}", meshes.len(), path);
    Ok(meshes)
}

struct Loader<'a> {
    path: &'a Path,
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
}

impl Loader<'_> {
    fn visit_node(&self, node: &gltf::Node, meshes: &mut Vec<MeshData>) -> EngineResult<()> {
        if let Some(mesh) = node.mesh() {
            meshes.push(self.read_mesh(node, &mesh)?);
        }

        for child in node.children() {
            self.visit_node(&child, meshes)?;
        }
        Ok(())
    }

    fn read_mesh(&self, node: &gltf::Node, mesh: &gltf::Mesh) -> EngineResult<MeshData> {
        let (translation, [x, y, z, w], scale) = node.transform().decomposed();

        let name = node
            .name()
            .or_else(|| mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

        let primitives = mesh
            .primitives()
            .map(|primitive| self.read_primitive(&primitive))
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(MeshData {
            name,
            translation: Vector3::from(translation),
            rotation: Quaternion::new(w, x, y, z),
            scale: Vector3::from(scale),
            primitives,
        })
    }

    fn read_primitive(&self, primitive: &gltf::Primitive) -> EngineResult<PrimitiveData> {
        let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).map(|data| &data.0[..]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| self.missing("POSITION"))?
            .collect();

        let texcoords: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .ok_or_else(|| self.missing("TEXCOORD_0"))?
            .into_f32()
            .collect();

        let normals: Vec<[f32; 3]> = match reader.read_normals() {
            Some(normals) => normals.collect(),
            None => {
                warn!("Primitive in {:?} has no normals, using zero normals", self.path);
                vec![[0.0; 3]; positions.len()]
            }
        };

        let (indices, index_count, index_type) = match reader.read_indices() {
            Some(ReadIndices::U8(iter)) => {
                let indices: Vec<u8> = iter.collect();
                let count = indices.len();
                (indices, count, glow::UNSIGNED_BYTE)
            }
            Some(ReadIndices::U16(iter)) => {
                let indices: Vec<u16> = iter.collect();
                (bytemuck::cast_slice(&indices).to_vec(), indices.len(), glow::UNSIGNED_SHORT)
            }
            Some(ReadIndices::U32(iter)) => {
                let indices: Vec<u32> = iter.collect();
                (bytemuck::cast_slice(&indices).to_vec(), indices.len(), glow::UNSIGNED_INT)
            }
            None => {
                return Err(EngineError::MissingIndices {
                    path: self.path.to_path_buf(),
                })
            }
        };

        Ok(PrimitiveData {
            positions: bytemuck::cast_slice(&positions).to_vec(),
            normals: bytemuck::cast_slice(&normals).to_vec(),
            texcoords: bytemuck::cast_slice(&texcoords).to_vec(),
            indices,
            index_count,
            mode: primitive.mode().as_gl_enum(),
            index_type,
            material: self.read_material(&primitive.material()),
        })
    }

    fn read_material(&self, material: &gltf::Material) -> MaterialData {
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, _] = pbr.base_color_factor();

        let texture = pbr.base_color_texture().and_then(|info| {
            let texture = info.texture();
            let image = texture.source();
            let Some(data) = self.images.get(image.index()) else {
                warn!("Image {} referenced by {:?} was not decoded", image.index(), self.path);
                return None;
            };

            let name = image
                .name()
                .map(str::to_string)
                .or_else(|| match image.source() {
                    gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
                    gltf::image::Source::View { .. } => None,
                })
                .unwrap_or_else(|| format!("image_{}", image.index()));

            let (components, bits) = image_layout(data.format);
            let sampler = texture.sampler();

            Some(TextureData {
                name,
                width: data.width,
                height: data.height,
                components,
                bits,
                pixels: data.pixels.clone(),
                wrap_s: sampler.wrap_s().as_gl_enum(),
                wrap_t: sampler.wrap_t().as_gl_enum(),
            })
        });

        MaterialData {
            base_color: Vector3::new(r, g, b),
            texture,
        }
    }

    fn missing(&self, attribute: &'static str) -> EngineError {
        EngineError::MissingAttribute {
            path: self.path.to_path_buf(),
            attribute,
        }
    }
}

fn image_layout(format: gltf::image::Format) -> (u32, u32) {
    use gltf::image::Format;

    match format {
        Format::R8 => (1, 8),
        Format::R8G8 => (2, 8),
        Format::R8G8B8 => (3, 8),
        Format::R8G8B8A8 => (4, 8),
        Format::R16 => (1, 16),
        Format::R16G16 => (2, 16),
        Format::R16G16B16 => (3, 16),
        Format::R16G16B16A16 => (4, 16),
        Format::R32G32B32FLOAT => (3, 32),
        Format::R32G32B32A32FLOAT => (4, 32),
    }
}
