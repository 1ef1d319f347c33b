//! WASM bindings for gltf-buffer-layout.
//!
//! This module provides JavaScript-friendly APIs for use in the browser.

use crate::CollectionConfig;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the browser console
    console_error_panic_hook::set_once();
}

/// Layout options.
#[wasm_bindgen]
pub struct LayoutOptions {
    interleave_attributes: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl LayoutOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> LayoutOptions {
        LayoutOptions {
            interleave_attributes: true,
        }
    }

    #[wasm_bindgen(setter)]
    pub fn set_interleave_attributes(&mut self, value: bool) {
        self.interleave_attributes = value;
    }
}

impl LayoutOptions {
    // GLB output always uses one embedded buffer, so only interleaving applies.
    fn config(&self) -> CollectionConfig {
        CollectionConfig::default().with_interleaving(self.interleave_attributes)
    }
}

/// Layout result containing GLB data.
#[wasm_bindgen]
pub struct LayoutResult {
    glb_data: Vec<u8>,
    accessor_count: usize,
    buffer_view_count: usize,
    diagnostics: Vec<String>,
}

#[wasm_bindgen]
impl LayoutResult {
    /// Get the GLB binary data.
    #[wasm_bindgen(getter)]
    pub fn glb_data(&self) -> Vec<u8> {
        self.glb_data.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn accessor_count(&self) -> usize {
        self.accessor_count
    }

    #[wasm_bindgen(getter)]
    pub fn buffer_view_count(&self) -> usize {
        self.buffer_view_count
    }

    /// Alignment problems found during layout, one message each.
    #[wasm_bindgen(getter)]
    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.clone()
    }
}

/// Lay out a JSON scene description and return GLB data.
///
/// JSON format:
/// ```json
/// {
///   "data": [{ "shape": "VEC3", "values": [0, 0, 0, 1, 0, 0, 0, 1, 0] }],
///   "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
///   "nodes": [{ "mesh": 0 }]
/// }
/// ```
#[wasm_bindgen]
pub fn scene_json_to_glb(json: &str, options: Option<LayoutOptions>) -> Result<LayoutResult, JsError> {
    let scene = crate::load_scene_from_str(json).map_err(|e| JsError::new(&e.to_string()))?;
    let config = options.unwrap_or_default().config();

    let (glb_data, layout) =
        crate::export_glb_with_layout(&scene, &config).map_err(|e| JsError::new(&e.to_string()))?;

    Ok(LayoutResult {
        glb_data,
        accessor_count: layout.accessors().len(),
        buffer_view_count: layout.buffer_views().len(),
        diagnostics: layout.diagnostics().iter().map(|d| d.to_string()).collect(),
    })
}
