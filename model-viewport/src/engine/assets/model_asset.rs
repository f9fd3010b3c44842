use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};

use super::material::MaterialDesc;

/// A loaded model: a flat list of nodes, parents before children.
#[derive(Asset, TypePath, Debug, Default)]
pub struct ModelAsset {
    pub nodes: Vec<ModelNode>,
}

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    /// Index of the parent node; `None` attaches to the model root.
    pub parent: Option<usize>,
    pub transform: Transform,
    pub mesh: Option<Handle<Mesh>>,
    pub material: Option<Handle<StandardMaterial>>,
}

impl ModelAsset {
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.mesh.is_some()).count()
    }
}

/// Triangle geometry as produced by an importer, before it becomes a bevy [`Mesh`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Builds a triangle-list mesh, computing normals when the source had none.
    pub fn into_mesh(self) -> Mesh {
        let has_normals = self.normals.len() == self.positions.len();
        let has_uvs = self.uvs.len() == self.positions.len();

        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        if has_uvs {
            mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        }
        mesh.insert_indices(Indices::U32(self.indices));

        if has_normals {
            mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        } else {
            mesh.compute_normals();
        }

        // Normal maps need tangents; only possible with UVs
        if has_uvs {
            if let Err(err) = mesh.generate_tangents() {
                debug!("Skipping tangent generation: {err}");
            }
        }

        mesh
    }
}

/// Importer output: plain data, no asset handles yet.
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialDesc>,
    pub nodes: Vec<ImportedNode>,
}

#[derive(Debug, Clone)]
pub struct ImportedNode {
    pub name: String,
    pub parent: Option<usize>,
    pub transform: Transform,
    pub mesh: Option<usize>,
    pub material: Option<usize>,
}

impl ImportedNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            transform: Transform::IDENTITY,
            mesh: None,
            material: None,
        }
    }
}

impl ImportedScene {
    pub fn mesh_node_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.mesh.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    fn triangle() -> MeshData {
        MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn missing_normals_are_computed() {
        let mesh = triangle().into_mesh();

        let Some(VertexAttributeValues::Float32x3(normals)) = mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
        else {
            panic!("expected computed normals");
        };
        assert_eq!(normals.len(), 3);
        for normal in normals {
            assert!((Vec3::from(*normal) - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn mismatched_uvs_are_dropped() {
        let mut data = triangle();
        data.uvs = vec![[0.0, 0.0]];
        let mesh = data.into_mesh();
        assert!(mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_none());
    }

    #[test]
    fn empty_geometry_is_reported() {
        assert!(MeshData::default().is_empty());
        assert!(!triangle().is_empty());
        assert_eq!(triangle().triangle_count(), 1);
    }
}
