use bevy::prelude::*;
use constants::render_settings::{
    AMBIENT_BRIGHTNESS_SCALE, AMBIENT_INTENSITY, DIRECTIONAL_ILLUMINANCE_SCALE,
    DIRECTIONAL_INTENSITY, DIRECTIONAL_LIGHT_POSITION,
};

use crate::engine::core::app_state::ViewportEntity;

/// White fill light for the whole scene.
pub fn ambient_light() -> AmbientLight {
    AmbientLight {
        color: Color::WHITE,
        brightness: AMBIENT_INTENSITY * AMBIENT_BRIGHTNESS_SCALE,
        ..default()
    }
}

/// One white key light shining at the origin, shadows off.
pub fn spawn_lighting(commands: &mut Commands) -> Entity {
    commands.insert_resource(ambient_light());

    let [x, y, z] = DIRECTIONAL_LIGHT_POSITION;
    commands
        .spawn((
            Name::new("Key Light"),
            DirectionalLight {
                color: Color::WHITE,
                illuminance: DIRECTIONAL_INTENSITY * DIRECTIONAL_ILLUMINANCE_SCALE,
                shadows_enabled: false,
                ..default()
            },
            Transform::from_xyz(x, y, z).looking_at(Vec3::ZERO, Vec3::Y),
            ViewportEntity,
        ))
        .id()
}
