use serde::{Deserialize, Serialize};

use crate::engine::core::error::ViewerError;

/// Model file formats the viewport can import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFormat {
    /// Wavefront OBJ, optionally with a companion MTL material library.
    Obj,
    /// Autodesk FBX, binary encoding.
    Fbx,
}

impl ModelFormat {
    /// Picks the importer from the URL's file extension, ignoring case.
    pub fn from_url(url: &str) -> Result<Self, ViewerError> {
        let extension = url_extension(url);
        match extension.as_str() {
            "obj" => Ok(Self::Obj),
            "fbx" => Ok(Self::Fbx),
            _ => Err(ViewerError::UnsupportedFormat(extension)),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Fbx => "fbx",
        }
    }
}

/// Lower-cased text after the last `.` of the URL path.
///
/// Query strings and fragments are dropped first. A URL with no `.` yields
/// the whole path, so `"model"` reports as `.model`.
pub fn url_extension(url: &str) -> String {
    let path = asset_path(url);
    let extension = match path.rfind('.') {
        Some(index) => &path[index + 1..],
        None => path,
    };
    extension.to_ascii_lowercase()
}

/// The URL with query string and fragment removed, as handed to the asset server.
///
/// A fragment would otherwise be read as a sub-asset label.
pub fn asset_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or_default()
}
