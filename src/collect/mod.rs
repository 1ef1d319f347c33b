//! Collection strategies: which typed arrays of a scene go into which buffer
//! views and buffers.
//!
//! The grouping rules are the same for every strategy:
//!
//! - each primitive's index array gets its own index view,
//! - a primitive's vertex attributes share one view when interleaving is
//!   enabled, otherwise each attribute gets its own view,
//! - each skin's inverse bind matrices get one view,
//! - each animation sampler input and output get one view each.
//!
//! Strategies only differ in how views are split across buffers. Data
//! referenced from several places is laid out once.

use crate::error::Result;
use crate::layout::{AccessorId, BufferId, LayoutBuilder, LayoutStructure};
use crate::scene::{Animation, DataId, MeshId, Scene, SkinId};
use crate::types::ViewTarget;
use std::collections::HashMap;

/// How buffer views are distributed over buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferMode {
    /// Everything in one buffer. Required for GLB output.
    #[default]
    Single,
    /// One buffer per mesh, plus one for skins and one for animations.
    PerMesh,
}

/// Collection configuration.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Put all vertex attributes of a primitive in one strided view.
    pub interleave_attributes: bool,
    pub buffer_mode: BufferMode,
    /// Prefix of the generated buffer URIs.
    pub base_name: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interleave_attributes: true,
            buffer_mode: BufferMode::Single,
            base_name: "scene".to_string(),
        }
    }
}

impl CollectionConfig {
    /// Create config with interleaving switched on or off.
    pub fn with_interleaving(mut self, interleave: bool) -> Self {
        self.interleave_attributes = interleave;
        self
    }

    pub fn with_buffer_mode(mut self, mode: BufferMode) -> Self {
        self.buffer_mode = mode;
        self
    }

    pub fn with_base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = name.into();
        self
    }

    /// The strategy implementing this configuration.
    pub fn strategy(&self) -> Box<dyn CollectionStrategy> {
        match self.buffer_mode {
            BufferMode::Single => Box::new(SingleBufferStrategy::new(self.clone())),
            BufferMode::PerMesh => Box::new(BufferPerMeshStrategy::new(self.clone())),
        }
    }
}

/// Where each piece of scene data ended up.
#[derive(Debug, Clone, Default)]
pub struct SceneResources {
    accessors: HashMap<DataId, AccessorId>,
    buffers: Vec<BufferId>,
}

impl SceneResources {
    /// The accessor holding a piece of scene data.
    pub fn accessor(&self, data: DataId) -> Option<AccessorId> {
        self.accessors.get(&data).copied()
    }

    /// Buffers produced by the strategy, in order.
    pub fn buffers(&self) -> &[BufferId] {
        &self.buffers
    }

    /// Number of distinct data laid out.
    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }
}

/// Decides how a scene's typed arrays are grouped into views and buffers.
pub trait CollectionStrategy {
    /// Feed the scene's data to `builder`, closing every view and buffer.
    fn collect(&self, scene: &Scene, builder: &mut LayoutBuilder) -> Result<SceneResources>;
}

/// Lay out a scene with the strategy selected by `config`.
pub fn layout_scene(
    scene: &Scene,
    config: &CollectionConfig,
) -> Result<(LayoutStructure, SceneResources)> {
    scene.validate()?;
    let mut builder = LayoutBuilder::new();
    let resources = config.strategy().collect(scene, &mut builder)?;
    let layout = builder.finalize()?;
    Ok((layout, resources))
}

/// All data in one buffer.
#[derive(Debug, Clone, Default)]
pub struct SingleBufferStrategy {
    config: CollectionConfig,
}

impl SingleBufferStrategy {
    pub fn new(config: CollectionConfig) -> Self {
        Self { config }
    }
}

impl CollectionStrategy for SingleBufferStrategy {
    fn collect(&self, scene: &Scene, builder: &mut LayoutBuilder) -> Result<SceneResources> {
        let mut collector = Collector::new(scene, builder, self.config.interleave_attributes);
        for mesh in scene.mesh_order() {
            collector.collect_mesh(mesh);
        }
        for skin in scene.skin_order() {
            collector.collect_skin(skin);
        }
        for animation in scene.animations() {
            collector.collect_animation(animation);
        }
        collector.close_buffer(format!("{}.bin", self.config.base_name));
        Ok(collector.finish())
    }
}

/// One buffer per mesh, then one for all skins and one for all animations.
#[derive(Debug, Clone, Default)]
pub struct BufferPerMeshStrategy {
    config: CollectionConfig,
}

impl BufferPerMeshStrategy {
    pub fn new(config: CollectionConfig) -> Self {
        Self { config }
    }
}

impl CollectionStrategy for BufferPerMeshStrategy {
    fn collect(&self, scene: &Scene, builder: &mut LayoutBuilder) -> Result<SceneResources> {
        let base = &self.config.base_name;
        let mut collector = Collector::new(scene, builder, self.config.interleave_attributes);
        for mesh in scene.mesh_order() {
            collector.collect_mesh(mesh);
            collector.close_buffer(format!("{}_mesh{}.bin", base, mesh.index()));
        }
        for skin in scene.skin_order() {
            collector.collect_skin(skin);
        }
        collector.close_buffer(format!("{}_skins.bin", base));
        for animation in scene.animations() {
            collector.collect_animation(animation);
        }
        collector.close_buffer(format!("{}_animations.bin", base));
        Ok(collector.finish())
    }
}

/// Shared grouping logic behind the strategies.
struct Collector<'a> {
    scene: &'a Scene,
    builder: &'a mut LayoutBuilder,
    interleave: bool,
    resources: SceneResources,
    pending_accessors: usize,
    pending_views: usize,
}

impl<'a> Collector<'a> {
    fn new(scene: &'a Scene, builder: &'a mut LayoutBuilder, interleave: bool) -> Self {
        Self {
            scene,
            builder,
            interleave,
            resources: SceneResources::default(),
            pending_accessors: 0,
            pending_views: 0,
        }
    }

    /// Add data unless it was laid out before.
    fn add(&mut self, id: DataId) {
        if self.resources.accessors.contains_key(&id) {
            return;
        }
        if let Some(data) = self.scene.data(id) {
            let accessor = self.builder.add_accessor(data.clone());
            self.resources.accessors.insert(id, accessor);
            self.pending_accessors += 1;
        }
    }

    /// Close pending accessors into a view, if there are any.
    fn close_view(&mut self, target: ViewTarget) {
        if self.pending_accessors == 0 {
            return;
        }
        self.builder.close_buffer_view(target);
        self.pending_accessors = 0;
        self.pending_views += 1;
    }

    /// Close pending views into a buffer, if there are any.
    fn close_buffer(&mut self, uri: String) {
        if self.pending_views == 0 {
            return;
        }
        let id = self.builder.close_buffer(Some(uri));
        self.resources.buffers.push(id);
        self.pending_views = 0;
    }

    fn collect_mesh(&mut self, id: MeshId) {
        let Some(mesh) = self.scene.mesh(id) else {
            return;
        };
        for primitive in &mesh.primitives {
            for attribute in &primitive.attributes {
                self.add(attribute.data);
                if !self.interleave {
                    self.close_view(ViewTarget::VertexAttributes);
                }
            }
            self.close_view(ViewTarget::VertexAttributes);

            if let Some(indices) = primitive.indices {
                self.add(indices);
                self.close_view(ViewTarget::Indices);
            }
        }
    }

    fn collect_skin(&mut self, id: SkinId) {
        if let Some(matrices) = self.scene.skin(id).and_then(|s| s.inverse_bind_matrices) {
            self.add(matrices);
            self.close_view(ViewTarget::General);
        }
    }

    fn collect_animation(&mut self, animation: &Animation) {
        for sampler in &animation.samplers {
            self.add(sampler.input);
            self.close_view(ViewTarget::General);
            self.add(sampler.output);
            self.close_view(ViewTarget::General);
        }
    }

    fn finish(self) -> SceneResources {
        log::debug!(
            "Collected {} accessors into {} buffers",
            self.resources.accessor_count(),
            self.resources.buffers.len()
        );
        self.resources
    }
}
