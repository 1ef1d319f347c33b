//! JSON scene description.
//!
//! A plain serde model of a [`Scene`], with numeric values given inline and
//! objects referring to each other by position:
//!
//! ```json
//! {
//!   "data": [
//!     { "shape": "VEC3", "values": [0, 0, 0, 1, 0, 0, 0, 1, 0] },
//!     { "component_type": "u16", "shape": "SCALAR", "values": [0, 1, 2] }
//!   ],
//!   "meshes": [
//!     { "name": "triangle", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }
//!   ],
//!   "nodes": [{ "mesh": 0 }]
//! }
//! ```

use super::{
    Animation, AnimationChannel, AnimationPath, AnimationSampler, Attribute, DataId,
    Interpolation, Mesh, MeshId, Node, NodeId, Primitive, PrimitiveMode, Scene, Semantic, Skin,
    SkinId,
};
use crate::error::{LayoutError, Result};
use crate::layout::AccessorData;
use crate::types::{ComponentType, ElementShape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub data: Vec<DataDescription>,
    #[serde(default)]
    pub meshes: Vec<MeshDescription>,
    #[serde(default)]
    pub skins: Vec<SkinDescription>,
    #[serde(default)]
    pub animations: Vec<AnimationDescription>,
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    /// Root nodes. Parentless nodes when empty.
    #[serde(default)]
    pub roots: Vec<usize>,
}

/// A typed array with its values written out as numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDescription {
    #[serde(default = "default_component_type")]
    pub component_type: ComponentType,
    pub shape: ElementShape,
    pub values: Vec<f64>,
    #[serde(default)]
    pub normalized: bool,
}

fn default_component_type() -> ComponentType {
    ComponentType::F32
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshDescription {
    #[serde(default)]
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveDescription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimitiveDescription {
    /// Attribute name to data index.
    pub attributes: BTreeMap<String, usize>,
    #[serde(default)]
    pub indices: Option<usize>,
    #[serde(default)]
    pub mode: PrimitiveMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkinDescription {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inverse_bind_matrices: Option<usize>,
    pub joints: Vec<usize>,
    #[serde(default)]
    pub skeleton: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationDescription {
    #[serde(default)]
    pub name: Option<String>,
    pub samplers: Vec<SamplerDescription>,
    pub channels: Vec<ChannelDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerDescription {
    pub input: usize,
    pub output: usize,
    #[serde(default)]
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDescription {
    pub sampler: usize,
    pub node: usize,
    pub path: AnimationPath,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDescription {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mesh: Option<usize>,
    #[serde(default)]
    pub skin: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub translation: Option<[f32; 3]>,
    /// Unit quaternion as `[x, y, z, w]`.
    #[serde(default)]
    pub rotation: Option<[f32; 4]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
}

impl SceneDescription {
    /// Parse a description from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build and validate the scene.
    ///
    /// Fails with `ShapeMismatch` if a data entry does not hold a whole number
    /// of elements and with `InvalidScene` for dangling references or integer
    /// values that do not fit their component type.
    pub fn into_scene(self) -> Result<Scene> {
        let mut scene = Scene::new();

        for entry in self.data {
            let bytes = encode_values(entry.component_type, &entry.values)?;
            let data = AccessorData::new(entry.component_type, entry.shape, bytes)?
                .with_normalized(entry.normalized);
            scene.add_data(data);
        }

        for mesh in self.meshes {
            let primitives = mesh
                .primitives
                .into_iter()
                .map(|p| {
                    let mut attributes: Vec<Attribute> = p
                        .attributes
                        .iter()
                        .map(|(name, &data)| Attribute {
                            semantic: Semantic::parse(name),
                            data: DataId(data),
                        })
                        .collect();
                    attributes.sort_by(|a, b| a.semantic.cmp(&b.semantic));
                    Primitive {
                        attributes,
                        indices: p.indices.map(DataId),
                        mode: p.mode,
                    }
                })
                .collect();
            scene.add_mesh(Mesh {
                name: mesh.name,
                primitives,
            });
        }

        for skin in self.skins {
            scene.add_skin(Skin {
                name: skin.name,
                inverse_bind_matrices: skin.inverse_bind_matrices.map(DataId),
                joints: skin.joints.into_iter().map(NodeId).collect(),
                skeleton: skin.skeleton.map(NodeId),
            });
        }

        for animation in self.animations {
            scene.add_animation(Animation {
                name: animation.name,
                samplers: animation
                    .samplers
                    .into_iter()
                    .map(|s| AnimationSampler {
                        input: DataId(s.input),
                        output: DataId(s.output),
                        interpolation: s.interpolation,
                    })
                    .collect(),
                channels: animation
                    .channels
                    .into_iter()
                    .map(|c| AnimationChannel {
                        sampler: c.sampler,
                        node: NodeId(c.node),
                        path: c.path,
                    })
                    .collect(),
            });
        }

        for node in self.nodes {
            scene.add_node(Node {
                name: node.name,
                mesh: node.mesh.map(MeshId),
                skin: node.skin.map(SkinId),
                children: node.children.into_iter().map(NodeId).collect(),
                translation: node.translation.map(glam::Vec3::from_array),
                rotation: node.rotation.map(glam::Quat::from_array),
                scale: node.scale.map(glam::Vec3::from_array),
            });
        }

        for root in self.roots {
            scene.add_root(NodeId(root));
        }

        scene.validate()?;
        Ok(scene)
    }
}

/// Convert numbers to little-endian components.
///
/// Integer types only accept whole numbers within their range.
fn encode_values(component_type: ComponentType, values: &[f64]) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(values.len() * component_type.size());
    for (index, &value) in values.iter().enumerate() {
        let fits = |min: f64, max: f64| value.fract() == 0.0 && (min..=max).contains(&value);
        let in_range = match component_type {
            ComponentType::I8 => fits(i8::MIN as f64, i8::MAX as f64),
            ComponentType::U8 => fits(0.0, u8::MAX as f64),
            ComponentType::I16 => fits(i16::MIN as f64, i16::MAX as f64),
            ComponentType::U16 => fits(0.0, u16::MAX as f64),
            ComponentType::U32 => fits(0.0, u32::MAX as f64),
            ComponentType::F32 | ComponentType::F64 => true,
        };
        if !in_range {
            return Err(LayoutError::InvalidScene(format!(
                "value {} at index {} does not fit {:?}",
                value, index, component_type
            )));
        }

        match component_type {
            ComponentType::I8 => bytes.extend_from_slice(&(value as i8).to_le_bytes()),
            ComponentType::U8 => bytes.extend_from_slice(&(value as u8).to_le_bytes()),
            ComponentType::I16 => bytes.extend_from_slice(&(value as i16).to_le_bytes()),
            ComponentType::U16 => bytes.extend_from_slice(&(value as u16).to_le_bytes()),
            ComponentType::U32 => bytes.extend_from_slice(&(value as u32).to_le_bytes()),
            ComponentType::F32 => bytes.extend_from_slice(&(value as f32).to_le_bytes()),
            ComponentType::F64 => bytes.extend_from_slice(&value.to_le_bytes()),
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"{
        "data": [
            { "shape": "VEC3", "values": [0, 0, 0, 1, 0, 0, 0, 1, 0] },
            { "shape": "VEC2", "values": [0, 0, 1, 0, 0, 1] },
            { "shape": "VEC3", "values": [0, 0, 1, 0, 0, 1, 0, 0, 1] },
            { "component_type": "u16", "shape": "SCALAR", "values": [0, 1, 2] }
        ],
        "meshes": [{
            "name": "triangle",
            "primitives": [{
                "attributes": { "TEXCOORD_0": 1, "POSITION": 0, "NORMAL": 2 },
                "indices": 3
            }]
        }],
        "nodes": [{ "name": "root", "mesh": 0, "translation": [1, 2, 3] }]
    }"#;

    #[test]
    fn test_parse_triangle() {
        let scene = SceneDescription::from_json(TRIANGLE).unwrap().into_scene().unwrap();
        assert_eq!(scene.data_count(), 4);

        let primitive = &scene.meshes()[0].primitives[0];
        let semantics: Vec<String> = primitive.attributes.iter().map(|a| a.semantic.to_string()).collect();
        assert_eq!(semantics, vec!["POSITION", "NORMAL", "TEXCOORD_0"]);
        assert_eq!(primitive.mode, PrimitiveMode::Triangles);

        let indices = scene.data(primitive.indices.unwrap()).unwrap();
        assert_eq!(indices.component_type(), ComponentType::U16);
        assert_eq!(indices.data(), &[0, 0, 1, 0, 2, 0]);

        let node = &scene.nodes()[0];
        assert_eq!(node.translation, Some(glam::Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_partial_element_is_rejected() {
        let json = r#"{ "data": [{ "shape": "VEC3", "values": [0, 0] }] }"#;
        let result = SceneDescription::from_json(json).unwrap().into_scene();
        assert!(matches!(result, Err(LayoutError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_dangling_mesh_is_rejected() {
        let json = r#"{ "nodes": [{ "mesh": 4 }] }"#;
        let result = SceneDescription::from_json(json).unwrap().into_scene();
        assert!(matches!(result, Err(LayoutError::InvalidScene(_))));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        assert!(matches!(SceneDescription::from_json("{ nope"), Err(LayoutError::Json(_))));
    }

    #[test]
    fn test_encode_values() {
        assert_eq!(encode_values(ComponentType::U8, &[1.0, 255.0]).unwrap(), vec![1, 255]);
        assert_eq!(
            encode_values(ComponentType::I16, &[-2.0]).unwrap(),
            (-2i16).to_le_bytes().to_vec()
        );
        assert_eq!(
            encode_values(ComponentType::F32, &[0.5]).unwrap(),
            0.5f32.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        for (component_type, value) in [
            (ComponentType::U8, 300.0),
            (ComponentType::U16, 1.7),
            (ComponentType::U32, -1.0),
            (ComponentType::I8, 128.0),
        ] {
            let result = encode_values(component_type, &[0.0, value]);
            assert!(matches!(result, Err(LayoutError::InvalidScene(_))), "{:?} {}", component_type, value);
        }

        let json = r#"{ "data": [{ "component_type": "u8", "shape": "SCALAR", "values": [1, 256] }] }"#;
        let result = SceneDescription::from_json(json).unwrap().into_scene();
        assert!(matches!(result, Err(LayoutError::InvalidScene(_))));
    }
}
