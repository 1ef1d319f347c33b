//! glTF/GLB export.

use crate::collect::{layout_scene, BufferMode, CollectionConfig, SceneResources};
use crate::error::{LayoutError, Result};
use crate::layout::{AccessorId, LayoutStructure};
use crate::scene::{AnimationPath, DataId, Interpolation, PrimitiveMode, Scene, Semantic};
use crate::types::{ComponentType, ElementShape, ViewTarget};
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

/// A `.gltf` document and the external buffers it refers to.
#[derive(Debug, Clone)]
pub struct GltfExport {
    /// File stem of the document.
    pub name: String,
    pub json: String,
    /// `(uri, bytes)` per buffer, in document order.
    pub buffers: Vec<(String, Vec<u8>)>,
}

impl GltfExport {
    /// Write the document and its buffers into `dir`, returning the document path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for (uri, bytes) in &self.buffers {
            std::fs::write(dir.join(uri), bytes)?;
        }
        let path = dir.join(format!("{}.gltf", self.name));
        std::fs::write(&path, &self.json)?;
        Ok(path)
    }
}

/// Export a scene to GLB format (binary glTF).
///
/// The GLB container holds a single binary chunk, so the scene is always laid
/// out into one buffer regardless of `config.buffer_mode`.
pub fn export_glb(scene: &Scene, config: &CollectionConfig) -> Result<Vec<u8>> {
    export_glb_with_layout(scene, config).map(|(glb, _)| glb)
}

/// Export a scene as GLB and hand back the layout it was written from.
pub fn export_glb_with_layout(
    scene: &Scene,
    config: &CollectionConfig,
) -> Result<(Vec<u8>, LayoutStructure)> {
    let config = config.clone().with_buffer_mode(BufferMode::Single);
    let (layout, resources) = layout_scene(scene, &config)?;
    if layout.buffers().is_empty() && scene.nodes().is_empty() {
        return Err(LayoutError::Export("Cannot export empty scene".to_string()));
    }
    warn_on_diagnostics(&layout);

    let mut root = build_document(scene, &layout, &resources)?;
    // The GLB binary chunk stands in for the buffer's uri
    for buffer in &mut root.buffers {
        buffer.uri = None;
    }

    let json_string = json::serialize::to_string(&root)
        .map_err(|e| LayoutError::Export(format!("Failed to serialize glTF JSON: {}", e)))?;
    let bin = layout.buffers().first().map(|b| b.data()).unwrap_or(&[]);

    let glb = write_glb(json_string.as_bytes(), bin);

    Ok((glb, layout))
}

/// Export a scene as a `.gltf` document with one `.bin` file per buffer.
pub fn export_gltf(scene: &Scene, config: &CollectionConfig) -> Result<GltfExport> {
    let (layout, resources) = layout_scene(scene, config)?;
    warn_on_diagnostics(&layout);

    let root = build_document(scene, &layout, &resources)?;
    let json = json::serialize::to_string_pretty(&root)
        .map_err(|e| LayoutError::Export(format!("Failed to serialize glTF JSON: {}", e)))?;

    let buffers = layout
        .into_buffers()
        .into_iter()
        .map(|buffer| {
            let uri = buffer
                .uri()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}{}.bin", config.base_name, buffer.id().index()));
            (uri, buffer.data().to_vec())
        })
        .collect();

    Ok(GltfExport {
        name: config.base_name.clone(),
        json,
        buffers,
    })
}

/// Build the glTF document for a scene and its finalized layout.
///
/// Accessors, buffer views and buffers appear in the same order as in the
/// layout, so layout ids double as document indices.
pub fn build_document(
    scene: &Scene,
    layout: &LayoutStructure,
    resources: &SceneResources,
) -> Result<json::Root> {
    let bounded = bounded_accessors(scene, resources);

    let buffers = layout
        .buffers()
        .iter()
        .map(|buffer| json::Buffer {
            byte_length: USize64(buffer.byte_length() as u64),
            name: None,
            uri: buffer.uri().map(str::to_string),
            extensions: Default::default(),
            extras: Default::default(),
        })
        .collect();

    let buffer_views = layout
        .buffer_views()
        .iter()
        .map(|view| json::buffer::View {
            buffer: json::Index::new(view.buffer().index() as u32),
            byte_length: USize64(view.byte_length() as u64),
            byte_offset: Some(USize64(view.byte_offset() as u64)),
            byte_stride: view.byte_stride().map(json::buffer::Stride),
            name: None,
            target: view_target(view.target()).map(Valid),
            extensions: Default::default(),
            extras: Default::default(),
        })
        .collect();

    let accessors = layout
        .accessors()
        .iter()
        .map(|accessor| {
            let data = accessor.data();
            let (min, max) = data
                .bounds()
                .filter(|_| bounded.contains(&accessor.id()))
                .map(|(min, max)| (Some(json::Value::from(min)), Some(json::Value::from(max))))
                .unwrap_or((None, None));
            Ok(json::Accessor {
                buffer_view: Some(json::Index::new(accessor.buffer_view().index() as u32)),
                byte_offset: Some(USize64(accessor.byte_offset() as u64)),
                count: USize64(accessor.count() as u64),
                component_type: Valid(json::accessor::GenericComponentType(component_type(
                    accessor.component_type(),
                )?)),
                extensions: Default::default(),
                extras: Default::default(),
                type_: Valid(accessor_type(accessor.shape())),
                min,
                max,
                name: None,
                normalized: accessor.is_normalized(),
                sparse: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let index = |data: DataId| -> Result<json::Index<json::Accessor>> {
        resources
            .accessor(data)
            .map(|id| json::Index::new(id.index() as u32))
            .ok_or_else(|| {
                LayoutError::Export(format!("Data {} was not collected into the layout", data.index()))
            })
    };

    let mut meshes = Vec::with_capacity(scene.meshes().len());
    for mesh in scene.meshes() {
        let mut primitives = Vec::with_capacity(mesh.primitives.len());
        for primitive in &mesh.primitives {
            let mut attributes = BTreeMap::new();
            for attribute in &primitive.attributes {
                attributes.insert(Valid(semantic(&attribute.semantic)), index(attribute.data)?);
            }
            primitives.push(json::mesh::Primitive {
                attributes,
                extensions: Default::default(),
                extras: Default::default(),
                indices: primitive.indices.map(index).transpose()?,
                material: None,
                mode: Valid(primitive_mode(primitive.mode)),
                targets: None,
            });
        }
        meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: mesh.name.clone(),
            primitives,
            weights: None,
        });
    }

    let mut skins = Vec::with_capacity(scene.skins().len());
    for skin in scene.skins() {
        skins.push(json::Skin {
            extensions: Default::default(),
            extras: Default::default(),
            inverse_bind_matrices: skin.inverse_bind_matrices.map(index).transpose()?,
            joints: skin.joints.iter().map(|j| json::Index::new(j.index() as u32)).collect(),
            name: skin.name.clone(),
            skeleton: skin.skeleton.map(|s| json::Index::new(s.index() as u32)),
        });
    }

    let mut animations = Vec::with_capacity(scene.animations().len());
    for animation in scene.animations() {
        let mut samplers = Vec::with_capacity(animation.samplers.len());
        for sampler in &animation.samplers {
            samplers.push(json::animation::Sampler {
                extensions: Default::default(),
                extras: Default::default(),
                input: index(sampler.input)?,
                interpolation: Valid(interpolation(sampler.interpolation)),
                output: index(sampler.output)?,
            });
        }
        let channels = animation
            .channels
            .iter()
            .map(|channel| json::animation::Channel {
                sampler: json::Index::new(channel.sampler as u32),
                target: json::animation::Target {
                    extensions: Default::default(),
                    extras: Default::default(),
                    node: json::Index::new(channel.node.index() as u32),
                    path: Valid(animation_path(channel.path)),
                },
                extensions: Default::default(),
                extras: Default::default(),
            })
            .collect();
        animations.push(json::Animation {
            extensions: Default::default(),
            extras: Default::default(),
            channels,
            name: animation.name.clone(),
            samplers,
        });
    }

    let nodes = scene
        .nodes()
        .iter()
        .map(|node| json::Node {
            camera: None,
            children: if node.children.is_empty() {
                None
            } else {
                Some(
                    node.children
                        .iter()
                        .map(|c| json::Index::new(c.index() as u32))
                        .collect(),
                )
            },
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: node.mesh.map(|m| json::Index::new(m.index() as u32)),
            name: node.name.clone(),
            rotation: node.rotation.map(|q| json::scene::UnitQuaternion(q.to_array())),
            scale: node.scale.map(|s| s.to_array()),
            translation: node.translation.map(|t| t.to_array()),
            skin: node.skin.map(|s| json::Index::new(s.index() as u32)),
            weights: None,
        })
        .collect();

    let roots: Vec<json::Index<json::Node>> = scene
        .roots()
        .iter()
        .map(|r| json::Index::new(r.index() as u32))
        .collect();
    // A scene needs at least one node
    let (scenes, default_scene) = if roots.is_empty() {
        (Vec::new(), None)
    } else {
        let scene = json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            nodes: roots,
        };
        (vec![scene], Some(json::Index::new(0)))
    };

    Ok(json::Root {
        accessors,
        animations,
        asset: json::Asset {
            generator: Some(format!("gltf-buffer-layout {}", env!("CARGO_PKG_VERSION"))),
            ..Default::default()
        },
        buffers,
        buffer_views,
        meshes,
        nodes,
        scenes,
        scene: default_scene,
        skins,
        ..Default::default()
    })
}

/// Wrap a JSON document and a binary buffer into a GLB v2 container.
fn write_glb(json_bytes: &[u8], buffer_data: &[u8]) -> Vec<u8> {
    // Pad JSON to 4-byte alignment
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let padded_json_len = json_bytes.len() + json_padding;

    // Pad buffer to 4-byte alignment
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let padded_buffer_len = buffer_data.len() + buffer_padding;
    let has_bin = !buffer_data.is_empty();

    let total_size = 12 // GLB header
        + 8 + padded_json_len // JSON chunk
        + if has_bin { 8 + padded_buffer_len } else { 0 }; // BIN chunk

    let mut glb = Vec::with_capacity(total_size);

    // GLB Header
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&(total_size as u32).to_le_bytes());

    // JSON Chunk
    glb.extend_from_slice(&(padded_json_len as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(json_bytes);
    glb.extend_from_slice(&vec![0x20u8; json_padding]); // padding (spaces)

    if has_bin {
        glb.extend_from_slice(&(padded_buffer_len as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(buffer_data);
        glb.extend_from_slice(&vec![0u8; buffer_padding]); // padding (zeros)
    }

    glb
}

fn warn_on_diagnostics(layout: &LayoutStructure) {
    if !layout.diagnostics().is_empty() {
        log::warn!(
            "Exporting layout with {} alignment diagnostics",
            layout.diagnostics().len()
        );
    }
}

/// Accessors that carry `min`/`max`: positions and animation key times.
fn bounded_accessors(scene: &Scene, resources: &SceneResources) -> HashSet<AccessorId> {
    let positions = scene
        .meshes()
        .iter()
        .flat_map(|m| m.primitives.iter())
        .filter_map(|p| p.attribute(&Semantic::Position));
    let inputs = scene
        .animations()
        .iter()
        .flat_map(|a| a.samplers.iter())
        .map(|s| s.input);
    positions
        .chain(inputs)
        .filter_map(|data| resources.accessor(data))
        .collect()
}

fn component_type(component_type: ComponentType) -> Result<json::accessor::ComponentType> {
    Ok(match component_type {
        ComponentType::I8 => json::accessor::ComponentType::I8,
        ComponentType::U8 => json::accessor::ComponentType::U8,
        ComponentType::I16 => json::accessor::ComponentType::I16,
        ComponentType::U16 => json::accessor::ComponentType::U16,
        ComponentType::U32 => json::accessor::ComponentType::U32,
        ComponentType::F32 => json::accessor::ComponentType::F32,
        ComponentType::F64 => {
            return Err(LayoutError::Export(
                "64-bit float accessors cannot be stored in a glTF 2.0 document".to_string(),
            ))
        }
    })
}

fn accessor_type(shape: ElementShape) -> json::accessor::Type {
    match shape {
        ElementShape::Scalar => json::accessor::Type::Scalar,
        ElementShape::Vec2 => json::accessor::Type::Vec2,
        ElementShape::Vec3 => json::accessor::Type::Vec3,
        ElementShape::Vec4 => json::accessor::Type::Vec4,
        ElementShape::Mat2 => json::accessor::Type::Mat2,
        ElementShape::Mat3 => json::accessor::Type::Mat3,
        ElementShape::Mat4 => json::accessor::Type::Mat4,
    }
}

fn view_target(target: ViewTarget) -> Option<json::buffer::Target> {
    match target {
        ViewTarget::General => None,
        ViewTarget::VertexAttributes => Some(json::buffer::Target::ArrayBuffer),
        ViewTarget::Indices => Some(json::buffer::Target::ElementArrayBuffer),
    }
}

fn semantic(semantic: &Semantic) -> json::mesh::Semantic {
    match semantic {
        Semantic::Position => json::mesh::Semantic::Positions,
        Semantic::Normal => json::mesh::Semantic::Normals,
        Semantic::Tangent => json::mesh::Semantic::Tangents,
        Semantic::TexCoord(set) => json::mesh::Semantic::TexCoords(*set),
        Semantic::Color(set) => json::mesh::Semantic::Colors(*set),
        Semantic::Joints(set) => json::mesh::Semantic::Joints(*set),
        Semantic::Weights(set) => json::mesh::Semantic::Weights(*set),
        // gltf-json writes the leading underscore itself
        Semantic::Custom(name) => {
            json::mesh::Semantic::Extras(name.strip_prefix('_').unwrap_or(name).to_string())
        }
    }
}

fn primitive_mode(mode: PrimitiveMode) -> json::mesh::Mode {
    match mode {
        PrimitiveMode::Points => json::mesh::Mode::Points,
        PrimitiveMode::Lines => json::mesh::Mode::Lines,
        PrimitiveMode::LineLoop => json::mesh::Mode::LineLoop,
        PrimitiveMode::LineStrip => json::mesh::Mode::LineStrip,
        PrimitiveMode::Triangles => json::mesh::Mode::Triangles,
        PrimitiveMode::TriangleStrip => json::mesh::Mode::TriangleStrip,
        PrimitiveMode::TriangleFan => json::mesh::Mode::TriangleFan,
    }
}

fn interpolation(interpolation: Interpolation) -> json::animation::Interpolation {
    match interpolation {
        Interpolation::Linear => json::animation::Interpolation::Linear,
        Interpolation::Step => json::animation::Interpolation::Step,
        Interpolation::CubicSpline => json::animation::Interpolation::CubicSpline,
    }
}

fn animation_path(path: AnimationPath) -> json::animation::Property {
    match path {
        AnimationPath::Translation => json::animation::Property::Translation,
        AnimationPath::Rotation => json::animation::Property::Rotation,
        AnimationPath::Scale => json::animation::Property::Scale,
        AnimationPath::Weights => json::animation::Property::MorphTargetWeights,
    }
}
