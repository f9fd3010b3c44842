//! Model assets and the importers that produce them.
//!
//! OBJ and FBX sources are parsed into a format-neutral scene description,
//! then registered with bevy as meshes, materials and textures under one
//! [`model_asset::ModelAsset`].

/// Process-wide import backends, created once and shared by every viewport.
pub mod backends;

/// World-space bounding boxes of loaded models.
pub mod bounds;

/// Binary FBX scene import.
pub mod fbx;

/// FBX polygon and layer-element triangulation.
pub mod fbx_geometry;

/// Bevy asset loader dispatching to the import backends.
pub mod loader;

/// Imported material kinds, their texture slots and release of material resources.
pub mod material;

pub mod model_asset;

/// Wavefront OBJ and MTL import.
pub mod obj;
