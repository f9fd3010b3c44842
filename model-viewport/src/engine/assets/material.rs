use bevy::prelude::*;
use constants::render_settings::FALLBACK_MATERIAL_COLOUR;

/// Texture slots a viewport material can hold.
///
/// Releasing a material walks exactly these slots, nothing is discovered
/// by inspecting the material at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    BaseColor,
    Normal,
    Emissive,
    MetallicRoughness,
    Occlusion,
    Depth,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 6] = [
        TextureSlot::BaseColor,
        TextureSlot::Normal,
        TextureSlot::Emissive,
        TextureSlot::MetallicRoughness,
        TextureSlot::Occlusion,
        TextureSlot::Depth,
    ];

    fn field(self, material: &mut StandardMaterial) -> &mut Option<Handle<Image>> {
        match self {
            TextureSlot::BaseColor => &mut material.base_color_texture,
            TextureSlot::Normal => &mut material.normal_map_texture,
            TextureSlot::Emissive => &mut material.emissive_texture,
            TextureSlot::MetallicRoughness => &mut material.metallic_roughness_texture,
            TextureSlot::Occlusion => &mut material.occlusion_texture,
            TextureSlot::Depth => &mut material.depth_map,
        }
    }

    pub fn get(self, material: &StandardMaterial) -> Option<&Handle<Image>> {
        match self {
            TextureSlot::BaseColor => material.base_color_texture.as_ref(),
            TextureSlot::Normal => material.normal_map_texture.as_ref(),
            TextureSlot::Emissive => material.emissive_texture.as_ref(),
            TextureSlot::MetallicRoughness => material.metallic_roughness_texture.as_ref(),
            TextureSlot::Occlusion => material.occlusion_texture.as_ref(),
            TextureSlot::Depth => material.depth_map.as_ref(),
        }
    }

    pub fn assign(self, material: &mut StandardMaterial, texture: Handle<Image>) {
        *self.field(material) = Some(texture);
    }

    pub fn take(self, material: &mut StandardMaterial) -> Option<Handle<Image>> {
        self.field(material).take()
    }
}

/// Texture paths attached to an imported material, relative to the file that named them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureMaps {
    pub base_color: Option<String>,
    pub normal: Option<String>,
    pub emissive: Option<String>,
    pub occlusion: Option<String>,
}

/// Imported surface description, one variant per shading model.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialDesc {
    Phong {
        name: String,
        diffuse: [f32; 3],
        specular: [f32; 3],
        shininess: f32,
        emissive: [f32; 3],
        opacity: f32,
        maps: TextureMaps,
    },
    Lambert {
        name: String,
        diffuse: [f32; 3],
        emissive: [f32; 3],
        opacity: f32,
        maps: TextureMaps,
    },
}

impl MaterialDesc {
    /// Slots a Phong surface can carry.
    const PHONG_SLOTS: &'static [TextureSlot] = &[
        TextureSlot::BaseColor,
        TextureSlot::Normal,
        TextureSlot::Emissive,
        TextureSlot::Occlusion,
    ];

    /// Lambert surfaces have no specular response, so no occlusion map either.
    const LAMBERT_SLOTS: &'static [TextureSlot] = &[
        TextureSlot::BaseColor,
        TextureSlot::Normal,
        TextureSlot::Emissive,
    ];

    pub fn name(&self) -> &str {
        match self {
            MaterialDesc::Phong { name, .. } | MaterialDesc::Lambert { name, .. } => name,
        }
    }

    pub fn supported_slots(&self) -> &'static [TextureSlot] {
        match self {
            MaterialDesc::Phong { .. } => Self::PHONG_SLOTS,
            MaterialDesc::Lambert { .. } => Self::LAMBERT_SLOTS,
        }
    }

    fn maps(&self) -> &TextureMaps {
        match self {
            MaterialDesc::Phong { maps, .. } | MaterialDesc::Lambert { maps, .. } => maps,
        }
    }

    /// Texture paths paired with the slot they fill.
    pub fn textures(&self) -> Vec<(TextureSlot, &str)> {
        let maps = self.maps();
        self.supported_slots()
            .iter()
            .filter_map(|slot| {
                let path = match slot {
                    TextureSlot::BaseColor => maps.base_color.as_deref(),
                    TextureSlot::Normal => maps.normal.as_deref(),
                    TextureSlot::Emissive => maps.emissive.as_deref(),
                    TextureSlot::Occlusion => maps.occlusion.as_deref(),
                    TextureSlot::MetallicRoughness | TextureSlot::Depth => None,
                };
                path.filter(|p| !p.is_empty()).map(|p| (*slot, p))
            })
            .collect()
    }

    /// Converts to a PBR material. `load_texture` resolves each slot path to an image handle.
    pub fn to_standard_material(
        &self,
        mut load_texture: impl FnMut(TextureSlot, &str) -> Handle<Image>,
    ) -> StandardMaterial {
        let (diffuse, emissive, opacity, roughness, reflectance) = match self {
            MaterialDesc::Phong {
                diffuse,
                specular,
                shininess,
                emissive,
                opacity,
                ..
            } => (
                *diffuse,
                *emissive,
                *opacity,
                shininess_to_roughness(*shininess),
                specular_to_reflectance(*specular),
            ),
            MaterialDesc::Lambert {
                diffuse,
                emissive,
                opacity,
                ..
            } => (*diffuse, *emissive, *opacity, 1.0, 0.0),
        };
        let opacity = opacity.clamp(0.0, 1.0);

        let mut material = StandardMaterial {
            base_color: Color::srgba(diffuse[0], diffuse[1], diffuse[2], opacity),
            emissive: LinearRgba::rgb(emissive[0], emissive[1], emissive[2]),
            perceptual_roughness: roughness,
            reflectance,
            metallic: 0.0,
            alpha_mode: if opacity < 1.0 {
                AlphaMode::Blend
            } else {
                AlphaMode::Opaque
            },
            ..default()
        };

        for (slot, path) in self.textures() {
            slot.assign(&mut material, load_texture(slot, path));
        }

        material
    }
}

/// Blinn-Phong exponent to GGX roughness, clamped to the range bevy renders well.
pub fn shininess_to_roughness(shininess: f32) -> f32 {
    if !shininess.is_finite() || shininess <= 0.0 {
        return 1.0;
    }
    (2.0 / (shininess + 2.0)).sqrt().clamp(0.089, 1.0)
}

/// Mean specular colour as a dielectric reflectance value.
pub fn specular_to_reflectance(specular: [f32; 3]) -> f32 {
    let mean = (specular[0] + specular[1] + specular[2]) / 3.0;
    if mean.is_finite() { mean.clamp(0.0, 1.0) } else { 0.5 }
}

/// Neutral grey, non-metallic surface for meshes imported without a material.
pub fn fallback_material() -> StandardMaterial {
    let hex = FALLBACK_MATERIAL_COLOUR;
    StandardMaterial {
        base_color: Color::srgb_u8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8),
        metallic: 0.0,
        perceptual_roughness: 1.0,
        ..default()
    }
}

/// Counts of GPU-side resources handed back by a release pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleasedResources {
    pub meshes: usize,
    pub materials: usize,
    pub textures: usize,
}

impl std::ops::AddAssign for ReleasedResources {
    fn add_assign(&mut self, other: Self) {
        self.meshes += other.meshes;
        self.materials += other.materials;
        self.textures += other.textures;
    }
}

/// Whether a material still in `materials` holds `texture` in any slot.
pub fn texture_in_use(materials: &Assets<StandardMaterial>, texture: &Handle<Image>) -> bool {
    let id = texture.id();
    materials.iter().any(|(_, material)| {
        TextureSlot::ALL
            .iter()
            .any(|slot| slot.get(material).is_some_and(|held| held.id() == id))
    })
}

/// Removes a material and the textures in its slots that no remaining
/// material refers to.
///
/// The asset server hands out one image per path, so a texture file named
/// by two models is one asset; it stays until its last material goes.
/// Materials and textures shared between meshes are only counted by the
/// caller that actually removes them.
pub fn release_material(
    materials: &mut Assets<StandardMaterial>,
    images: &mut Assets<Image>,
    material: &Handle<StandardMaterial>,
) -> ReleasedResources {
    let mut released = ReleasedResources::default();
    let Some(mut removed) = materials.remove(material) else {
        return released;
    };
    released.materials = 1;

    for slot in TextureSlot::ALL {
        let Some(texture) = slot.take(&mut removed) else {
            continue;
        };
        if texture_in_use(materials, &texture) {
            continue;
        }
        if images.remove(&texture).is_some() {
            released.textures += 1;
        }
    }

    released
}
