use std::sync::{Arc, OnceLock};

use bevy::log::info;

use super::fbx::FbxImporter;
use super::loader::ModelLoadError;
use super::model_asset::ImportedScene;
use super::obj::ObjImporter;
use crate::engine::loading::format::ModelFormat;

static IMPORT_BACKENDS: OnceLock<Arc<ImportBackends>> = OnceLock::new();

/// Parsers for every supported model format.
///
/// Built once per process on first use and shared by every viewport.
#[derive(Debug, Default)]
pub struct ImportBackends {
    obj: ObjImporter,
    fbx: FbxImporter,
}

impl ImportBackends {
    /// Parses `source` as `format`. `companion` is the OBJ material library
    /// and is ignored for FBX.
    pub fn import(
        &self,
        format: ModelFormat,
        source: &[u8],
        companion: Option<&[u8]>,
    ) -> Result<ImportedScene, ModelLoadError> {
        match format {
            ModelFormat::Obj => self.obj.import(source, companion),
            ModelFormat::Fbx => self.fbx.import(source),
        }
    }
}

/// The shared import backends, initialised on first call.
pub fn import_backends() -> Arc<ImportBackends> {
    Arc::clone(IMPORT_BACKENDS.get_or_init(|| {
        info!("✓ Model import backends initialised (obj, fbx)");
        Arc::new(ImportBackends::default())
    }))
}
