//! Reference grid lying on the XZ plane.

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::view::NoFrustumCulling;
use constants::render_settings::{
    GRID_CENTRE_COLOUR, GRID_DIVISIONS, GRID_LINE_COLOUR, GRID_OPACITY, GRID_SIZE,
};

use crate::engine::core::app_state::ViewportEntity;

#[derive(Component)]
pub struct ReferenceGrid;

/// Opaque colour from a `0xRRGGBB` value.
pub fn hex_colour(hex: u32) -> Color {
    Color::srgb_u8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

fn linear_components(colour: Color) -> [f32; 4] {
    let linear = colour.to_linear();
    [linear.red, linear.green, linear.blue, linear.alpha]
}

/// Line mesh for a square grid of `size` units split into `divisions` cells
/// per side, centred on the origin. The two centre lines use `centre`, every
/// other line `line`.
pub fn create_grid_mesh(size: f32, divisions: u32, centre: Color, line: Color) -> Mesh {
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;
    let centre_index = divisions / 2;
    let centre = linear_components(centre);
    let line = linear_components(line);

    let mut positions = Vec::with_capacity((divisions as usize + 1) * 4);
    let mut colours = Vec::with_capacity(positions.capacity());

    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        let colour = if divisions % 2 == 0 && i == centre_index {
            centre
        } else {
            line
        };

        // Line parallel to Z, then parallel to X
        positions.push([offset, 0.0, -half]);
        positions.push([offset, 0.0, half]);
        positions.push([-half, 0.0, offset]);
        positions.push([half, 0.0, offset]);
        colours.extend_from_slice(&[colour; 4]);
    }

    let indices = (0..positions.len() as u32).collect();

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colours);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Spawn the reference grid with its own translucent unlit material
pub fn spawn_reference_grid(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> Entity {
    let grid_material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, GRID_OPACITY),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    let grid_mesh = create_grid_mesh(
        GRID_SIZE,
        GRID_DIVISIONS,
        hex_colour(GRID_CENTRE_COLOUR),
        hex_colour(GRID_LINE_COLOUR),
    );

    commands
        .spawn((
            Name::new("Reference Grid"),
            Mesh3d(meshes.add(grid_mesh)),
            MeshMaterial3d(grid_material),
            Visibility::Visible,
            NoFrustumCulling,
            Transform::IDENTITY,
            ReferenceGrid,
            ViewportEntity,
        ))
        .id()
}
