//! Document export formats.
//!
//! Turns a scene and its finalized layout into a glTF document, either as a
//! self-contained GLB or as a `.gltf` file with external buffers.

pub mod gltf;

pub use gltf::{build_document, export_glb, export_glb_with_layout, export_gltf, GltfExport};
