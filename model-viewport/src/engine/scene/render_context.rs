use bevy::prelude::*;
use bevy::render::camera::ClearColorConfig;
use constants::render_settings::{
    CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR, DEFAULT_CAMERA_POSITION,
};

use super::grid::spawn_reference_grid;
use super::lighting::spawn_lighting;
use crate::engine::camera::ViewportCamera;
use crate::engine::camera::orbit_controller::OrbitController;
use crate::engine::core::app_state::ViewportEntity;
use crate::engine::core::config::{Background, ViewerConfig};

/// Clear colour for the drawing surface; transparent unless a colour is configured.
pub fn clear_colour(config: &ViewerConfig) -> ClearColorConfig {
    match config.background() {
        Background::Transparent => ClearColorConfig::Custom(Color::NONE),
        Background::Color(colour) => ClearColorConfig::Custom(colour),
    }
}

/// Perspective projection before any model has been framed.
pub fn default_projection() -> Projection {
    Projection::Perspective(PerspectiveProjection {
        fov: CAMERA_FOV_DEGREES.to_radians(),
        near: CAMERA_NEAR,
        far: CAMERA_FAR,
        aspect_ratio: 1.0,
    })
}

/// Builds the scene the model is dropped into: camera with its orbit
/// controller, lights and the reference grid.
pub fn setup_render_context(
    mut commands: Commands,
    config: Res<ViewerConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let [x, y, z] = DEFAULT_CAMERA_POSITION;
    commands.spawn((
        Name::new("Viewport Camera"),
        Camera3d::default(),
        Camera {
            clear_color: clear_colour(&config),
            ..default()
        },
        default_projection(),
        Transform::from_xyz(x, y, z).looking_at(Vec3::ZERO, Vec3::Y),
        OrbitController::new(config.auto_rotate),
        ViewportCamera,
        ViewportEntity,
    ));

    spawn_lighting(&mut commands);
    spawn_reference_grid(&mut commands, &mut meshes, &mut materials);

    info!(
        "✓ Render context ready (background: {}, auto-rotate: {})",
        if config.background().is_transparent() {
            "transparent"
        } else {
            "solid"
        },
        config.auto_rotate
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_selects_clear_colour() {
        let transparent = ViewerConfig::new("a.obj");
        assert!(matches!(
            clear_colour(&transparent),
            ClearColorConfig::Custom(colour) if colour == Color::NONE
        ));

        let solid = Color::srgb_u8(0x10, 0x18, 0x20);
        let configured = ViewerConfig::new("a.obj").with_background(Background::Color(solid));
        assert!(matches!(
            clear_colour(&configured),
            ClearColorConfig::Custom(colour) if colour == solid
        ));
    }

    #[test]
    fn default_projection_uses_sixty_degree_fov() {
        let Projection::Perspective(perspective) = default_projection() else {
            panic!("default projection should be perspective");
        };
        assert!((perspective.fov - 60f32.to_radians()).abs() < 1e-6);
        assert_eq!(perspective.near, 0.1);
        assert_eq!(perspective.far, 1000.0);
    }
}
