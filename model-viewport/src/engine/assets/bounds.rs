use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;

use super::model_asset::ModelAsset;

/// Axis-aligned bounds of a model in world space.
/// Starts empty (inverted infinities) and grows as points are added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for ModelBounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl ModelBounds {
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Self::EMPTY;
        for point in points {
            bounds.expand(point);
        }
        bounds
    }

    /// Grows the bounds to contain `point`. A non-finite point makes the
    /// bounds permanently non-finite.
    pub fn expand(&mut self, point: Vec3) {
        if self.min.is_nan() || !point.is_finite() {
            self.min = Vec3::NAN;
            self.max = Vec3::NAN;
            return;
        }
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// False for empty bounds and for any geometry containing non-finite coordinates.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Centre point the camera orbits around after framing.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// World-space bounds of every mesh in `model`, with the model root at `root`.
///
/// Node transforms are composed down the hierarchy the same way the spawned
/// entities will be, so the result matches what ends up on screen.
pub fn model_bounds(model: &ModelAsset, meshes: &Assets<Mesh>, root: &Transform) -> ModelBounds {
    let root_matrix = root.compute_matrix();
    let mut world_matrices: Vec<Mat4> = Vec::with_capacity(model.nodes.len());
    let mut bounds = ModelBounds::EMPTY;

    for (index, node) in model.nodes.iter().enumerate() {
        let parent = node
            .parent
            .filter(|parent| *parent < index)
            .and_then(|parent| world_matrices.get(parent).copied())
            .unwrap_or(root_matrix);
        let world = parent * node.transform.compute_matrix();
        world_matrices.push(world);

        let Some(mesh) = node.mesh.as_ref().and_then(|handle| meshes.get(handle)) else {
            continue;
        };
        if let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        {
            for position in positions {
                bounds.expand(world.transform_point3(Vec3::from(*position)));
            }
        }
    }

    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::model_asset::{MeshData, ModelNode};

    fn cube_mesh(meshes: &mut Assets<Mesh>, half: f32) -> Handle<Mesh> {
        let positions = vec![[-half, -half, -half], [half, half, half], [half, -half, half]];
        meshes.add(
            MeshData {
                positions,
                indices: vec![0, 1, 2],
                ..default()
            }
            .into_mesh(),
        )
    }

    fn node(parent: Option<usize>, transform: Transform, mesh: Option<Handle<Mesh>>) -> ModelNode {
        ModelNode {
            name: "node".into(),
            parent,
            transform,
            mesh,
            material: None,
        }
    }

    #[test]
    fn empty_bounds_are_not_finite() {
        let bounds = ModelBounds::EMPTY;
        assert!(bounds.is_empty());
        assert!(!bounds.is_finite());
    }

    #[test]
    fn non_finite_point_poisons_bounds() {
        let bounds = ModelBounds::from_points([Vec3::ONE, Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ZERO]);
        assert!(!bounds.is_finite());
    }

    #[test]
    fn centre_and_size() {
        let bounds = ModelBounds::from_points([Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 6.0)]);
        assert_eq!(bounds.center(), Vec3::new(1.0, 2.0, 4.0));
        assert_eq!(bounds.size(), Vec3::new(4.0, 4.0, 4.0));
    }

    #[test]
    fn bounds_follow_hierarchy_and_root_scale() {
        let mut meshes = Assets::<Mesh>::default();
        let mesh = cube_mesh(&mut meshes, 0.5);
        let model = ModelAsset {
            nodes: vec![
                node(None, Transform::from_xyz(10.0, 0.0, 0.0), None),
                node(Some(0), Transform::from_xyz(0.0, 1.0, 0.0), Some(mesh)),
            ],
        };

        let bounds = model_bounds(&model, &meshes, &Transform::from_scale(Vec3::splat(2.0)));

        assert!((bounds.center() - Vec3::new(20.0, 2.0, 0.0)).length() < 1e-4);
        assert!((bounds.size() - Vec3::splat(2.0)).length() < 1e-4);
    }

    #[test]
    fn model_without_meshes_has_empty_bounds() {
        let meshes = Assets::<Mesh>::default();
        let model = ModelAsset {
            nodes: vec![node(None, Transform::IDENTITY, None)],
        };
        assert!(model_bounds(&model, &meshes, &Transform::IDENTITY).is_empty());
    }
}
