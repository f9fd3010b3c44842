//! Binary FBX import over the `fbxcel` node tree.
//!
//! Only the parts a static viewer needs are read: `Model` hierarchy with
//! local transforms, `Geometry` meshes, `Material` colours and `Texture`
//! file references wired through `Connections`.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use bevy::prelude::*;
use fbxcel::low::v7400::AttributeValue;
use fbxcel::tree::any::AnyTree;
use fbxcel::tree::v7400::{NodeHandle, Tree};

use super::fbx_geometry::{LayerElement, MappingMode, RawGeometry, triangulate};
use super::loader::ModelLoadError;
use super::material::{MaterialDesc, TextureMaps, TextureSlot};
use super::model_asset::{ImportedNode, ImportedScene, MeshData};

const ASCII_FBX_MARKER: &[u8] = b"; FBX";

#[derive(Debug, Clone, Copy, Default)]
pub struct FbxImporter;

struct FbxModel {
    id: i64,
    name: String,
    transform: Transform,
    parent: Option<i64>,
    geometry: Option<i64>,
    materials: Vec<i64>,
}

struct FbxMaterial {
    desc: MaterialDesc,
}

impl FbxImporter {
    pub fn import(&self, bytes: &[u8]) -> Result<ImportedScene, ModelLoadError> {
        let tree = parse_tree(bytes)?;
        let root = tree.root();
        let objects = root
            .first_child_by_name("Objects")
            .ok_or_else(|| ModelLoadError::Fbx("file has no Objects section".into()))?;

        let mut geometries: HashMap<i64, MeshData> = HashMap::new();
        let mut models: Vec<FbxModel> = Vec::new();
        let mut materials: HashMap<i64, FbxMaterial> = HashMap::new();
        let mut textures: HashMap<i64, String> = HashMap::new();

        for object in objects.children() {
            let Some(id) = object.attributes().first().and_then(attr_i64) else {
                continue;
            };
            match object.name() {
                "Geometry" if object_class(object) == Some("Mesh") => {
                    geometries.insert(id, triangulate(&read_geometry(object)?)?);
                }
                "Model" => models.push(FbxModel {
                    id,
                    name: object_name(object),
                    transform: read_local_transform(object),
                    parent: None,
                    geometry: None,
                    materials: Vec::new(),
                }),
                "Material" => {
                    materials.insert(
                        id,
                        FbxMaterial {
                            desc: read_material(object),
                        },
                    );
                }
                "Texture" => {
                    if let Some(path) = read_texture_path(object) {
                        textures.insert(id, path);
                    }
                }
                _ => {}
            }
        }

        let model_index: HashMap<i64, usize> =
            models.iter().enumerate().map(|(i, m)| (m.id, i)).collect();

        if let Some(connections) = root.first_child_by_name("Connections") {
            for connection in connections.children_by_name("C") {
                let attributes = connection.attributes();
                let kind = attributes.first().and_then(attr_str);
                let (Some(child), Some(parent)) = (
                    attributes.get(1).and_then(attr_i64),
                    attributes.get(2).and_then(attr_i64),
                ) else {
                    continue;
                };

                match kind {
                    Some("OO") => {
                        let Some(&parent_model) = model_index.get(&parent) else {
                            continue;
                        };
                        if geometries.contains_key(&child) {
                            models[parent_model].geometry.get_or_insert(child);
                        } else if materials.contains_key(&child) {
                            models[parent_model].materials.push(child);
                        } else if let Some(&child_model) = model_index.get(&child) {
                            models[child_model].parent = Some(parent);
                        }
                    }
                    Some("OP") => {
                        let property = attributes.get(3).and_then(attr_str).unwrap_or_default();
                        if let (Some(path), Some(material), Some(slot)) = (
                            textures.get(&child),
                            materials.get_mut(&parent),
                            texture_slot_for_property(property),
                        ) {
                            assign_map(&mut material.desc, slot, path.clone());
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(assemble_scene(models, &model_index, geometries, materials))
    }
}

fn parse_tree(bytes: &[u8]) -> Result<Tree, ModelLoadError> {
    if bytes.starts_with(ASCII_FBX_MARKER) {
        return Err(ModelLoadError::Fbx(
            "ASCII FBX is not supported, export as binary".into(),
        ));
    }

    match AnyTree::from_seekable_reader(Cursor::new(bytes))
        .map_err(|err| ModelLoadError::Fbx(err.to_string()))?
    {
        AnyTree::V7400(_, tree, _) => Ok(tree),
        _ => Err(ModelLoadError::Fbx("unsupported FBX version".into())),
    }
}

/// Orders models parents-first and resolves mesh / material indices.
fn assemble_scene(
    models: Vec<FbxModel>,
    model_index: &HashMap<i64, usize>,
    mut geometries: HashMap<i64, MeshData>,
    mut materials: HashMap<i64, FbxMaterial>,
) -> ImportedScene {
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (index, model) in models.iter().enumerate() {
        match model.parent.and_then(|parent| model_index.get(&parent)) {
            Some(&parent) if parent != index => children.entry(parent).or_default().push(index),
            _ => roots.push(index),
        }
    }

    let mut scene = ImportedScene::default();
    let mut mesh_slots: HashMap<i64, usize> = HashMap::new();
    let mut material_slots: HashMap<i64, usize> = HashMap::new();
    let mut node_of_model: HashMap<usize, usize> = HashMap::new();
    let mut visited: HashSet<usize> = HashSet::new();

    // Reverse so the stack pops roots in file order
    let mut stack: Vec<usize> = roots.into_iter().rev().collect();
    while let Some(index) = stack.pop() {
        if !visited.insert(index) {
            continue;
        }
        let model = &models[index];

        let mut node = ImportedNode::new(model.name.clone());
        node.transform = model.transform;
        node.parent = model
            .parent
            .and_then(|parent| model_index.get(&parent))
            .and_then(|parent| node_of_model.get(parent))
            .copied();

        if let Some(geometry) = model.geometry {
            node.mesh = match mesh_slots.get(&geometry) {
                Some(&slot) => Some(slot),
                None => geometries.remove(&geometry).filter(|mesh| !mesh.is_empty()).map(|mesh| {
                    scene.meshes.push(mesh);
                    mesh_slots.insert(geometry, scene.meshes.len() - 1);
                    scene.meshes.len() - 1
                }),
            };
        }

        if let Some(&material) = model.materials.first() {
            node.material = match material_slots.get(&material) {
                Some(&slot) => Some(slot),
                None => materials.remove(&material).map(|material_entry| {
                    scene.materials.push(material_entry.desc);
                    material_slots.insert(material, scene.materials.len() - 1);
                    scene.materials.len() - 1
                }),
            };
        }

        node_of_model.insert(index, scene.nodes.len());
        scene.nodes.push(node);

        if let Some(kids) = children.get(&index) {
            stack.extend(kids.iter().rev());
        }
    }

    scene
}

fn read_geometry(node: NodeHandle<'_>) -> Result<RawGeometry, ModelLoadError> {
    let control_points = node
        .first_child_by_name("Vertices")
        .and_then(|vertices| vertices.attributes().first())
        .and_then(attr_f64_array)
        .ok_or_else(|| ModelLoadError::Fbx("mesh geometry without Vertices".into()))?;
    let polygon_vertex_index = node
        .first_child_by_name("PolygonVertexIndex")
        .and_then(|indices| indices.attributes().first())
        .and_then(attr_i32_array)
        .ok_or_else(|| ModelLoadError::Fbx("mesh geometry without PolygonVertexIndex".into()))?;

    Ok(RawGeometry {
        control_points: control_points
            .chunks_exact(3)
            .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
            .collect(),
        polygon_vertex_index,
        normals: read_layer(node, "LayerElementNormal", "Normals", "NormalsIndex", |v| {
            v.chunks_exact(3)
                .map(|n| [n[0] as f32, n[1] as f32, n[2] as f32])
                .collect()
        }),
        uvs: read_layer(node, "LayerElementUV", "UV", "UVIndex", |v| {
            v.chunks_exact(2).map(|t| [t[0] as f32, t[1] as f32]).collect()
        }),
    })
}

fn read_layer<T>(
    geometry: NodeHandle<'_>,
    layer_name: &str,
    values_name: &str,
    index_name: &str,
    convert: impl Fn(&[f64]) -> Vec<T>,
) -> Option<LayerElement<T>> {
    let layer = geometry.first_child_by_name(layer_name)?;
    let string_child = |name: &str| {
        layer
            .first_child_by_name(name)
            .and_then(|child| child.attributes().first())
            .and_then(attr_str)
    };

    let mapping = MappingMode::parse(string_child("MappingInformationType")?)?;
    let values = layer
        .first_child_by_name(values_name)
        .and_then(|child| child.attributes().first())
        .and_then(attr_f64_array)?;

    let indices = match string_child("ReferenceInformationType") {
        Some("IndexToDirect") | Some("Index") => Some(
            layer
                .first_child_by_name(index_name)
                .and_then(|child| child.attributes().first())
                .and_then(attr_i32_array)?,
        ),
        _ => None,
    };

    Some(LayerElement {
        mapping,
        values: convert(&values),
        indices,
    })
}

fn read_local_transform(node: NodeHandle<'_>) -> Transform {
    let translation = property_vec3(node, "Lcl Translation").unwrap_or(Vec3::ZERO);
    let pre_rotation = property_vec3(node, "PreRotation")
        .map(euler_xyz_degrees)
        .unwrap_or(Quat::IDENTITY);
    let rotation = property_vec3(node, "Lcl Rotation")
        .map(euler_xyz_degrees)
        .unwrap_or(Quat::IDENTITY);
    let scale = property_vec3(node, "Lcl Scaling").unwrap_or(Vec3::ONE);

    Transform {
        translation,
        rotation: pre_rotation * rotation,
        scale,
    }
}

/// FBX default rotation order: X applied first, then Y, then Z.
pub fn euler_xyz_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::ZYX,
        degrees.z.to_radians(),
        degrees.y.to_radians(),
        degrees.x.to_radians(),
    )
}

fn read_material(node: NodeHandle<'_>) -> MaterialDesc {
    let name = object_name(node);
    let shading = node
        .first_child_by_name("ShadingModel")
        .and_then(|child| child.attributes().first())
        .and_then(attr_str)
        .unwrap_or("phong")
        .to_ascii_lowercase();

    let colour = |primary: &str, fallback: &str, default: [f32; 3]| {
        property_vec3(node, primary)
            .or_else(|| property_vec3(node, fallback))
            .map(|c| c.to_array())
            .unwrap_or(default)
    };
    let diffuse = colour("DiffuseColor", "Diffuse", [1.0; 3]);
    let emissive_factor = property_f64(node, "EmissiveFactor").unwrap_or(1.0) as f32;
    let emissive = colour("EmissiveColor", "Emissive", [0.0; 3]).map(|c| c * emissive_factor);
    let opacity = property_f64(node, "Opacity")
        .or_else(|| property_f64(node, "TransparencyFactor").map(|t| 1.0 - t))
        .unwrap_or(1.0) as f32;

    if shading == "lambert" {
        MaterialDesc::Lambert {
            name,
            diffuse,
            emissive,
            opacity,
            maps: TextureMaps::default(),
        }
    } else {
        MaterialDesc::Phong {
            name,
            diffuse,
            specular: colour("SpecularColor", "Specular", [0.067; 3]),
            shininess: property_f64(node, "Shininess")
                .or_else(|| property_f64(node, "ShininessExponent"))
                .unwrap_or(30.0) as f32,
            emissive,
            opacity,
            maps: TextureMaps::default(),
        }
    }
}

fn read_texture_path(node: NodeHandle<'_>) -> Option<String> {
    ["RelativeFilename", "FileName", "Filename"]
        .into_iter()
        .filter_map(|name| node.first_child_by_name(name))
        .filter_map(|child| child.attributes().first().and_then(attr_str))
        .find(|path| !path.is_empty())
        .map(normalise_texture_path)
}

/// Forward slashes; absolute paths from the authoring machine keep only the file name.
pub fn normalise_texture_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/') || path.chars().nth(1) == Some(':');
    if absolute {
        path.rsplit('/').next().unwrap_or_default().to_string()
    } else {
        path
    }
}

/// Material property a texture connection targets.
pub fn texture_slot_for_property(property: &str) -> Option<TextureSlot> {
    match property {
        "DiffuseColor" | "Diffuse" | "Maya|TEX_color_map" => Some(TextureSlot::BaseColor),
        "NormalMap" | "Bump" => Some(TextureSlot::Normal),
        "EmissiveColor" | "Emissive" => Some(TextureSlot::Emissive),
        "AmbientColor" => Some(TextureSlot::Occlusion),
        _ => None,
    }
}

fn assign_map(desc: &mut MaterialDesc, slot: TextureSlot, path: String) {
    let maps = match desc {
        MaterialDesc::Phong { maps, .. } | MaterialDesc::Lambert { maps, .. } => maps,
    };
    let target = match slot {
        TextureSlot::BaseColor => &mut maps.base_color,
        TextureSlot::Normal => &mut maps.normal,
        TextureSlot::Emissive => &mut maps.emissive,
        TextureSlot::Occlusion => &mut maps.occlusion,
        TextureSlot::MetallicRoughness | TextureSlot::Depth => return,
    };
    target.get_or_insert(path);
}

/// `"Name\0\x01Class"` becomes `"Name"`.
pub fn strip_class_suffix(raw: &str) -> &str {
    raw.split('\u{0}').next().unwrap_or_default()
}

fn object_name(node: NodeHandle<'_>) -> String {
    node.attributes()
        .get(1)
        .and_then(attr_str)
        .map(strip_class_suffix)
        .unwrap_or_default()
        .to_string()
}

fn object_class<'a>(node: NodeHandle<'a>) -> Option<&'a str> {
    node.attributes().get(2).and_then(attr_str)
}

fn properties<'a>(node: NodeHandle<'a>) -> impl Iterator<Item = (&'a str, &'a [AttributeValue])> {
    node.first_child_by_name("Properties70")
        .into_iter()
        .flat_map(|properties| properties.children_by_name("P"))
        .filter_map(|property| {
            let attributes = property.attributes();
            let name = attributes.first().and_then(attr_str)?;
            Some((name, attributes.get(4..).unwrap_or(&[])))
        })
}

fn property_vec3(node: NodeHandle<'_>, name: &str) -> Option<Vec3> {
    let (_, values) = properties(node).find(|(key, _)| *key == name)?;
    match values {
        [x, y, z, ..] => Some(Vec3::new(
            attr_f64(x)? as f32,
            attr_f64(y)? as f32,
            attr_f64(z)? as f32,
        )),
        _ => None,
    }
}

fn property_f64(node: NodeHandle<'_>, name: &str) -> Option<f64> {
    let (_, values) = properties(node).find(|(key, _)| *key == name)?;
    values.first().and_then(attr_f64)
}

fn attr_i64(value: &AttributeValue) -> Option<i64> {
    match value {
        AttributeValue::I64(v) => Some(*v),
        AttributeValue::I32(v) => Some(i64::from(*v)),
        AttributeValue::I16(v) => Some(i64::from(*v)),
        _ => None,
    }
}

fn attr_f64(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::F64(v) => Some(*v),
        AttributeValue::F32(v) => Some(f64::from(*v)),
        AttributeValue::I64(v) => Some(*v as f64),
        AttributeValue::I32(v) => Some(f64::from(*v)),
        AttributeValue::I16(v) => Some(f64::from(*v)),
        _ => None,
    }
}

fn attr_str(value: &AttributeValue) -> Option<&str> {
    match value {
        AttributeValue::String(v) => Some(v.as_str()),
        _ => None,
    }
}

fn attr_f64_array(value: &AttributeValue) -> Option<Vec<f64>> {
    match value {
        AttributeValue::ArrF64(v) => Some(v.clone()),
        AttributeValue::ArrF32(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
        _ => None,
    }
}

fn attr_i32_array(value: &AttributeValue) -> Option<Vec<i32>> {
    match value {
        AttributeValue::ArrI32(v) => Some(v.clone()),
        AttributeValue::ArrI64(v) => v.iter().map(|x| i32::try_from(*x).ok()).collect(),
        _ => None,
    }
}
