//! Turns FBX polygon meshes into indexed triangle lists.
//!
//! FBX stores polygons as a flat index stream where the last corner of each
//! polygon is written as `!index` (bitwise not). Per-corner attributes
//! (normals, UVs) live in layer elements with their own mapping and
//! reference modes.

use super::loader::ModelLoadError;
use super::model_asset::MeshData;

/// Which element an attribute value is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingMode {
    ByPolygonVertex,
    ByControlPoint,
    ByPolygon,
    AllSame,
}

impl MappingMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ByPolygonVertex" => Some(Self::ByPolygonVertex),
            "ByVertex" | "ByVertice" | "ByControlPoint" => Some(Self::ByControlPoint),
            "ByPolygon" => Some(Self::ByPolygon),
            "AllSame" => Some(Self::AllSame),
            _ => None,
        }
    }
}

/// One attribute layer. `indices` is present for `IndexToDirect` references.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerElement<T> {
    pub mapping: MappingMode,
    pub values: Vec<T>,
    pub indices: Option<Vec<i32>>,
}

impl<T: Copy> LayerElement<T> {
    fn lookup(&self, polygon_vertex: usize, control_point: usize, polygon: usize) -> Option<T> {
        let slot = match self.mapping {
            MappingMode::ByPolygonVertex => polygon_vertex,
            MappingMode::ByControlPoint => control_point,
            MappingMode::ByPolygon => polygon,
            MappingMode::AllSame => 0,
        };
        let direct = match &self.indices {
            Some(indices) => usize::try_from(*indices.get(slot)?).ok()?,
            None => slot,
        };
        self.values.get(direct).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGeometry {
    pub control_points: Vec<[f32; 3]>,
    pub polygon_vertex_index: Vec<i32>,
    pub normals: Option<LayerElement<[f32; 3]>>,
    pub uvs: Option<LayerElement<[f32; 2]>>,
}

#[derive(Clone, Copy)]
struct Corner {
    polygon_vertex: usize,
    control_point: usize,
}

/// Fan-triangulates every polygon, one output vertex per polygon corner.
///
/// An attribute layer that cannot be resolved for some corner is dropped
/// for the whole mesh rather than producing a partial attribute.
pub fn triangulate(raw: &RawGeometry) -> Result<MeshData, ModelLoadError> {
    let mut mesh = MeshData::default();
    let mut keep_normals = raw.normals.is_some();
    let mut keep_uvs = raw.uvs.is_some();

    let mut polygon: Vec<Corner> = Vec::new();
    let mut polygon_index = 0usize;

    for (polygon_vertex, &raw_index) in raw.polygon_vertex_index.iter().enumerate() {
        let closes = raw_index < 0;
        let control_point = (if closes { !raw_index } else { raw_index }) as usize;
        if control_point >= raw.control_points.len() {
            return Err(ModelLoadError::InvalidGeometry(format!(
                "polygon references control point {control_point} of {}",
                raw.control_points.len()
            )));
        }
        polygon.push(Corner {
            polygon_vertex,
            control_point,
        });

        if closes {
            emit_polygon(raw, &polygon, polygon_index, &mut mesh, &mut keep_normals, &mut keep_uvs);
            polygon.clear();
            polygon_index += 1;
        }
    }

    // Tolerate a stream whose final polygon was never closed
    if !polygon.is_empty() {
        emit_polygon(raw, &polygon, polygon_index, &mut mesh, &mut keep_normals, &mut keep_uvs);
    }

    if !keep_normals {
        mesh.normals.clear();
    }
    if !keep_uvs {
        mesh.uvs.clear();
    }
    Ok(mesh)
}

fn emit_polygon(
    raw: &RawGeometry,
    polygon: &[Corner],
    polygon_index: usize,
    mesh: &mut MeshData,
    keep_normals: &mut bool,
    keep_uvs: &mut bool,
) {
    if polygon.len() < 3 {
        return;
    }

    let base = mesh.positions.len() as u32;
    for corner in polygon {
        mesh.positions.push(raw.control_points[corner.control_point]);

        if *keep_normals {
            match raw.normals.as_ref().and_then(|layer| {
                layer.lookup(corner.polygon_vertex, corner.control_point, polygon_index)
            }) {
                Some(normal) => mesh.normals.push(normal),
                None => *keep_normals = false,
            }
        }

        if *keep_uvs {
            match raw.uvs.as_ref().and_then(|layer| {
                layer.lookup(corner.polygon_vertex, corner.control_point, polygon_index)
            }) {
                Some([u, v]) => mesh.uvs.push([u, 1.0 - v]),
                None => *keep_uvs = false,
            }
        }
    }

    for i in 1..polygon.len() as u32 - 1 {
        mesh.indices.extend_from_slice(&[base, base + i, base + i + 1]);
    }
}
