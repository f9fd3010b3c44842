use bevy::prelude::*;
use constants::render_settings::DEFAULT_ASSET_ROOT;
use serde::{Deserialize, Serialize};

use super::error::ViewerError;

/// Per-instance viewer options, fixed for the lifetime of one viewport.
///
/// Deserialised from the JSON the host page passes in. Keys are camelCase,
/// with the short `src` / `mtl` / `background` spellings accepted as aliases.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    #[serde(default, alias = "src")]
    pub source_url: String,

    #[serde(default, alias = "mtl")]
    pub material_url: Option<String>,

    #[serde(default, alias = "background")]
    pub background_color: Option<Background>,

    #[serde(default)]
    pub auto_rotate: bool,

    #[serde(default = "default_model_scale")]
    pub model_scale: f32,

    #[serde(default = "default_asset_root")]
    pub asset_root: String,
}

fn default_model_scale() -> f32 {
    1.0
}

fn default_asset_root() -> String {
    DEFAULT_ASSET_ROOT.to_string()
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            material_url: None,
            background_color: None,
            auto_rotate: false,
            model_scale: default_model_scale(),
            asset_root: default_asset_root(),
        }
    }
}

impl ViewerConfig {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_material(mut self, material_url: impl Into<String>) -> Self {
        self.material_url = Some(material_url.into());
        self
    }

    pub fn with_model_scale(mut self, model_scale: f32) -> Self {
        self.model_scale = model_scale;
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background_color = Some(background);
        self
    }

    pub fn with_auto_rotate(mut self, auto_rotate: bool) -> Self {
        self.auto_rotate = auto_rotate;
        self
    }

    /// Uniform scale for the model root. Zero, negative and non-finite
    /// values collapse to 1.0.
    pub fn effective_scale(&self) -> f32 {
        if self.model_scale.is_finite() && self.model_scale > 0.0 {
            self.model_scale
        } else {
            1.0
        }
    }

    pub fn background(&self) -> Background {
        self.background_color.unwrap_or(Background::Transparent)
    }
}

/// Surface clear behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Background {
    Transparent,
    Color(Color),
}

impl Background {
    pub fn parse(value: &str) -> Result<Self, ViewerError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(Self::Transparent);
        }

        Srgba::hex(trimmed)
            .map(|colour| Self::Color(colour.into()))
            .map_err(|_| ViewerError::InvalidBackground(trimmed.to_string()))
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Transparent)
    }
}

impl TryFrom<String> for Background {
    type Error = ViewerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Background> for String {
    fn from(background: Background) -> Self {
        match background {
            Background::Transparent => "transparent".to_string(),
            Background::Color(colour) => colour.to_srgba().to_hex(),
        }
    }
}
