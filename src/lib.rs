//! # glTF Buffer Layout
//!
//! A Rust library for laying out typed arrays into glTF 2.0 accessors,
//! buffer views and buffers.
//!
//! ## Overview
//!
//! Vertex attributes, indices, skinning matrices and animation keys are
//! grouped into buffer views and buffers, then laid out so that every view and
//! accessor respects the format's alignment rules. Views shared by several
//! vertex attributes are interleaved at a common stride.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gltf_buffer_layout::{export_glb, AccessorData, CollectionConfig, Mesh, Node, Primitive, Scene, Semantic};
//!
//! let mut scene = Scene::new();
//! let positions = scene.add_data(AccessorData::from_vec3(&positions));
//! let indices = scene.add_data(AccessorData::from_u16(&indices));
//! let mesh = scene.add_mesh(
//!     Mesh::new("triangle").with_primitive(
//!         Primitive::new()
//!             .with_attribute(Semantic::Position, positions)
//!             .with_indices(indices),
//!     ),
//! );
//! scene.add_node(Node::new("triangle").with_mesh(mesh));
//!
//! let glb_bytes = export_glb(&scene, &CollectionConfig::default())?;
//! ```
//!
//! ## Using the layout engine directly
//!
//! The [`layout`] module can be used without a scene: add accessors to a
//! [`LayoutBuilder`], close views and buffers, and finalize.
//!
//! ```ignore
//! use gltf_buffer_layout::{AccessorData, LayoutBuilder, ViewTarget};
//!
//! let mut builder = LayoutBuilder::new();
//! builder.add_accessor(AccessorData::from_vec3(&positions));
//! builder.add_accessor(AccessorData::from_vec2(&uvs));
//! builder.close_buffer_view(ViewTarget::VertexAttributes);
//! builder.close_buffer(Some("mesh.bin".to_string()));
//! let layout = builder.finalize()?;
//! ```

pub mod error;
pub mod types;
pub mod layout;
pub mod scene;
pub mod collect;
pub mod export;

// Re-export main types for convenience
pub use error::{LayoutError, Result};
pub use types::{ComponentType, ElementShape, ViewTarget};
pub use layout::{
    Accessor, AccessorData, AccessorId, Buffer, BufferId, BufferView, BufferViewId,
    LayoutBuilder, LayoutDiagnostic, LayoutStructure,
};
pub use scene::description::SceneDescription;
pub use scene::{
    Animation, AnimationPath, Interpolation, Mesh, Node, Primitive, PrimitiveMode, Scene,
    Semantic, Skin,
};
pub use collect::{
    layout_scene, BufferMode, BufferPerMeshStrategy, CollectionConfig, CollectionStrategy,
    SceneResources, SingleBufferStrategy,
};
pub use export::{build_document, export_glb, export_glb_with_layout, export_gltf, GltfExport};

/// Load a scene from a JSON scene description file.
pub fn load_scene<P: AsRef<std::path::Path>>(path: P) -> Result<Scene> {
    let text = std::fs::read_to_string(path)?;
    load_scene_from_str(&text)
}

/// Load a scene from JSON scene description text (for WASM compatibility).
pub fn load_scene_from_str(text: &str) -> Result<Scene> {
    SceneDescription::from_json(text)?.into_scene()
}

#[cfg(feature = "wasm")]
pub mod wasm;
