//! Wavefront OBJ / MTL import backed by `tobj`.

use std::cell::Cell;
use std::io::Read;

use super::loader::ModelLoadError;
use super::material::{MaterialDesc, TextureMaps};
use super::model_asset::{ImportedNode, ImportedScene, MeshData};

/// Phong specular used when an MTL entry omits `Ks`
const DEFAULT_SPECULAR: [f32; 3] = [0.067, 0.067, 0.067];
const DEFAULT_SHININESS: f32 = 30.0;
const COMPANION_MTLLIB: &[u8] = b"mtllib companion.mtl\n";

#[derive(Debug, Clone)]
pub struct ObjImporter {
    options: tobj::LoadOptions,
}

impl Default for ObjImporter {
    fn default() -> Self {
        Self {
            options: tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ignore_points: true,
                ignore_lines: true,
                ..Default::default()
            },
        }
    }
}

impl ObjImporter {
    /// Parses OBJ source. `material_library` is the companion MTL; its
    /// materials are bound by `usemtl` name whether or not the OBJ carries
    /// an `mtllib` line. Libraries the OBJ names itself are not fetched.
    pub fn import(
        &self,
        source: &[u8],
        material_library: Option<&[u8]>,
    ) -> Result<ImportedScene, ModelLoadError> {
        let library = match material_library {
            Some(bytes) => {
                let mut mtl_reader = bytes;
                Some(tobj::load_mtl_buf(&mut mtl_reader).map_err(ModelLoadError::MaterialLibrary)?)
            }
            None => None,
        };

        // The companion is announced ahead of the OBJ's own lines so every
        // `usemtl` can see its names; it is merged only once
        let prelude: &[u8] = if library.is_some() {
            COMPANION_MTLLIB
        } else {
            b""
        };
        let mut reader = prelude.chain(source);
        let companion = Cell::new(library);
        let (models, materials) = tobj::load_obj_buf(&mut reader, &self.options, |_| {
            Ok(companion.take().unwrap_or_default())
        })?;
        let materials = materials.map_err(ModelLoadError::MaterialLibrary)?;

        let mut scene = ImportedScene {
            materials: materials.iter().map(material_from_mtl).collect(),
            ..Default::default()
        };

        for model in &models {
            let data = mesh_from_obj(&model.mesh);
            if data.is_empty() {
                continue;
            }

            let mut node = ImportedNode::new(model.name.clone());
            node.mesh = Some(scene.meshes.len());
            node.material = model
                .mesh
                .material_id
                .filter(|id| *id < scene.materials.len());
            scene.meshes.push(data);
            scene.nodes.push(node);
        }

        Ok(scene)
    }
}

fn mesh_from_obj(mesh: &tobj::Mesh) -> MeshData {
    MeshData {
        positions: mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect(),
        normals: mesh
            .normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect(),
        // OBJ texture space has its origin bottom-left
        uvs: mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| [t[0], 1.0 - t[1]])
            .collect(),
        indices: mesh.indices.clone(),
    }
}

fn material_from_mtl(material: &tobj::Material) -> MaterialDesc {
    let param = |key: &str| material.unknown_param.get(key).map(String::as_str);

    let normal = material
        .normal_texture
        .as_deref()
        .or_else(|| param("map_Bump"))
        .or_else(|| param("map_bump"))
        .or_else(|| param("bump"))
        .or_else(|| param("norm"));

    MaterialDesc::Phong {
        name: material.name.clone(),
        diffuse: material.diffuse.unwrap_or([1.0; 3]),
        specular: material.specular.unwrap_or(DEFAULT_SPECULAR),
        shininess: material.shininess.unwrap_or(DEFAULT_SHININESS),
        emissive: material
            .emissive
            .or_else(|| param("Ke").and_then(parse_rgb))
            .unwrap_or([0.0; 3]),
        opacity: material.dissolve.unwrap_or(1.0),
        maps: TextureMaps {
            base_color: material.diffuse_texture.as_deref().and_then(texture_path),
            normal: normal.and_then(texture_path),
            emissive: param("map_Ke").and_then(texture_path),
            occlusion: material.ambient_texture.as_deref().and_then(texture_path),
        },
    }
}

/// Last token of a texture statement; map options such as `-bm 0.5` precede the file name.
fn texture_path(statement: &str) -> Option<String> {
    statement.split_whitespace().last().map(str::to_string)
}

fn parse_rgb(value: &str) -> Option<[f32; 3]> {
    let mut components = value.split_whitespace().map(str::parse::<f32>);
    let r = components.next()?.ok()?;
    let g = components.next().and_then(Result::ok).unwrap_or(r);
    let b = components.next().and_then(Result::ok).unwrap_or(r);
    Some([r, g, b])
}
