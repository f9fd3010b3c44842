use std::sync::Arc;

use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, AssetPath, LoadContext, ReadAssetBytesError};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::backends::ImportBackends;
use super::material::fallback_material;
use super::model_asset::{ImportedScene, ModelAsset, ModelNode};
use crate::engine::loading::format::{ModelFormat, url_extension};

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Could not read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read material library '{path}': {source}")]
    MaterialRead {
        path: String,
        #[source]
        source: ReadAssetBytesError,
    },

    #[error("Failed to parse OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Failed to parse material library: {0}")]
    MaterialLibrary(tobj::LoadError),

    #[error("Failed to parse FBX: {0}")]
    Fbx(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Unsupported model format: .{0}. Use .obj or .fbx")]
    UnsupportedFormat(String),
}

/// Per-load options passed through `AssetServer::load_with_settings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelLoaderSettings {
    /// Format chosen by the caller; falls back to the path's extension.
    pub format: Option<ModelFormat>,
    /// Companion MTL for OBJ models, resolved like any asset path.
    pub material_url: Option<String>,
}

/// Single asset loader for every model format.
///
/// Registering one loader for [`ModelAsset`] lets typed loads reach it
/// whatever the extension's case; the format itself is chosen from the
/// settings and handed to the shared [`ImportBackends`].
pub struct ModelLoader {
    backends: Arc<ImportBackends>,
}

impl ModelLoader {
    pub fn new(backends: Arc<ImportBackends>) -> Self {
        Self { backends }
    }
}

impl AssetLoader for ModelLoader {
    type Asset = ModelAsset;
    type Settings = ModelLoaderSettings;
    type Error = ModelLoadError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        settings: &ModelLoaderSettings,
        load_context: &mut LoadContext<'_>,
    ) -> Result<ModelAsset, ModelLoadError> {
        let format = match settings.format {
            Some(format) => format,
            None => {
                let path = load_context.path().to_string_lossy().into_owned();
                ModelFormat::from_url(&path)
                    .map_err(|_| ModelLoadError::UnsupportedFormat(url_extension(&path)))?
            }
        };

        let mut source = Vec::new();
        reader.read_to_end(&mut source).await?;

        let companion = match (format, settings.material_url.as_deref()) {
            (ModelFormat::Obj, Some(url)) if !url.is_empty() => Some(
                load_context
                    .read_asset_bytes(url.to_string())
                    .await
                    .map_err(|source| ModelLoadError::MaterialRead {
                        path: url.to_string(),
                        source,
                    })?,
            ),
            _ => None,
        };

        let scene = self.backends.import(format, &source, companion.as_deref())?;

        // OBJ textures are named relative to the MTL; FBX ones relative to the model
        let texture_base = match (format, settings.material_url.as_deref()) {
            (ModelFormat::Obj, Some(url)) if !url.is_empty() => AssetPath::parse(url).into_owned(),
            _ => load_context.asset_path().clone_owned(),
        };

        debug!(
            "Imported {} ({} meshes on {} nodes, {} materials)",
            load_context.path().display(),
            scene.meshes.len(),
            scene.mesh_node_count(),
            scene.materials.len()
        );

        Ok(build_model_asset(scene, &texture_base, load_context))
    }

    fn extensions(&self) -> &[&str] {
        &["obj", "fbx"]
    }
}

/// Registers meshes, materials and textures as labelled sub-assets.
fn build_model_asset(
    scene: ImportedScene,
    texture_base: &AssetPath<'static>,
    load_context: &mut LoadContext<'_>,
) -> ModelAsset {
    let mut meshes = Vec::with_capacity(scene.meshes.len());
    for (index, data) in scene.meshes.into_iter().enumerate() {
        meshes.push(load_context.add_labeled_asset(format!("Mesh{index}"), data.into_mesh()));
    }

    let mut materials = Vec::with_capacity(scene.materials.len());
    for (index, desc) in scene.materials.iter().enumerate() {
        let material = desc.to_standard_material(|slot, path| {
            match texture_base.resolve_embed(path) {
                Ok(resolved) => load_context.load::<Image>(resolved),
                Err(err) => {
                    warn!("Texture '{path}' for {slot:?} could not be resolved: {err}");
                    Handle::default()
                }
            }
        });
        materials.push(load_context.add_labeled_asset(format!("Material{index}"), material));
    }

    // Meshes without a material share one fallback per model
    let mut fallback: Option<Handle<StandardMaterial>> = None;
    let nodes = scene
        .nodes
        .into_iter()
        .map(|node| {
            let mesh = node.mesh.and_then(|index| meshes.get(index).cloned());
            let material = match (&mesh, node.material.and_then(|i| materials.get(i).cloned())) {
                (Some(_), Some(material)) => Some(material),
                (Some(_), None) => Some(
                    fallback
                        .get_or_insert_with(|| {
                            load_context
                                .add_labeled_asset("FallbackMaterial".to_string(), fallback_material())
                        })
                        .clone(),
                ),
                (None, _) => None,
            };
            ModelNode {
                name: node.name,
                parent: node.parent,
                transform: node.transform,
                mesh,
                material,
            }
        })
        .collect();

    ModelAsset { nodes }
}
