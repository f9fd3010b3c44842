use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::engine::assets::material::{ReleasedResources, release_material};

/// Asset stores and hierarchy access needed to free what a sub-tree owns.
#[derive(SystemParam)]
pub struct SceneResources<'w, 's> {
    children: Query<'w, 's, &'static Children>,
    surfaces: Query<
        'w,
        's,
        (
            Option<&'static Mesh3d>,
            Option<&'static MeshMaterial3d<StandardMaterial>>,
        ),
    >,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    images: ResMut<'w, Assets<Image>>,
}

impl SceneResources<'_, '_> {
    pub fn meshes(&self) -> &Assets<Mesh> {
        &self.meshes
    }

    /// Releases the geometry, material and slot textures of `root` and
    /// every descendant. Entities themselves are left for the caller to despawn.
    pub fn release_subtree(&mut self, root: Entity) -> ReleasedResources {
        let mut released = ReleasedResources::default();
        let mut stack = vec![root];

        while let Some(entity) = stack.pop() {
            released += self.release_entity(entity);
            if let Ok(children) = self.children.get(entity) {
                stack.extend_from_slice(&children[..]);
            }
        }

        released
    }

    fn release_entity(&mut self, entity: Entity) -> ReleasedResources {
        let mut released = ReleasedResources::default();
        let Ok((mesh, material)) = self.surfaces.get(entity) else {
            return released;
        };

        if let Some(mesh) = mesh {
            if self.meshes.remove(&mesh.0).is_some() {
                released.meshes += 1;
            }
        }
        if let Some(material) = material {
            released += release_material(&mut self.materials, &mut self.images, &material.0);
        }

        released
    }

    /// Releases every sub-tree rooted at `roots`.
    pub fn release_all(&mut self, roots: impl IntoIterator<Item = Entity>) -> ReleasedResources {
        let mut released = ReleasedResources::default();
        for root in roots {
            released += self.release_subtree(root);
        }
        released
    }
}
