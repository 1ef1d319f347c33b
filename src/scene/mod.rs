//! A minimal scene graph feeding the layout engine.
//!
//! All objects live in arenas on [`Scene`] and refer to each other through
//! typed indices, so shared objects (a mesh instanced by several nodes, key
//! times reused by several samplers) are identified by index rather than by
//! address.

mod animation;
pub mod description;
mod mesh;

pub use animation::{
    Animation, AnimationChannel, AnimationPath, AnimationSampler, Interpolation, Skin,
};
pub use mesh::{Attribute, Mesh, Primitive, PrimitiveMode, Semantic};

use crate::error::{LayoutError, Result};
use crate::layout::AccessorData;
use crate::types::ElementShape;
use std::collections::HashSet;

/// Index of a typed array in [`Scene::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataId(pub(crate) usize);

/// Index of a mesh in [`Scene::meshes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub(crate) usize);

/// Index of a skin in [`Scene::skins`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkinId(pub(crate) usize);

/// Index of a node in [`Scene::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

macro_rules! impl_index {
    ($($id:ident),*) => {
        $(
            impl $id {
                /// Position in the owning arena.
                pub fn index(&self) -> usize {
                    self.0
                }
            }
        )*
    };
}

impl_index!(DataId, MeshId, SkinId, NodeId);

/// A node of the scene hierarchy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub mesh: Option<MeshId>,
    pub skin: Option<SkinId>,
    pub children: Vec<NodeId>,
    pub translation: Option<glam::Vec3>,
    pub rotation: Option<glam::Quat>,
    pub scale: Option<glam::Vec3>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_mesh(mut self, mesh: MeshId) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_skin(mut self, skin: SkinId) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn with_child(mut self, child: NodeId) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_translation(mut self, translation: glam::Vec3) -> Self {
        self.translation = Some(translation);
        self
    }

    pub fn with_rotation(mut self, rotation: glam::Quat) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_scale(mut self, scale: glam::Vec3) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Typed arrays and the objects referring to them.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    data: Vec<AccessorData>,
    meshes: Vec<Mesh>,
    skins: Vec<Skin>,
    animations: Vec<Animation>,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_data(&mut self, data: AccessorData) -> DataId {
        self.data.push(data);
        DataId(self.data.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_skin(&mut self, skin: Skin) -> SkinId {
        self.skins.push(skin);
        SkinId(self.skins.len() - 1)
    }

    pub fn add_animation(&mut self, animation: Animation) {
        self.animations.push(animation);
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Mark a node as a root of the default scene.
    pub fn add_root(&mut self, node: NodeId) {
        self.roots.push(node);
    }

    pub fn data(&self, id: DataId) -> Option<&AccessorData> {
        self.data.get(id.0)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn skin(&self, id: SkinId) -> Option<&Skin> {
        self.skins.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn data_count(&self) -> usize {
        self.data.len()
    }

    /// Roots of the default scene.
    ///
    /// When no root was added explicitly, every node that is nobody's child.
    pub fn roots(&self) -> Vec<NodeId> {
        if !self.roots.is_empty() {
            return self.roots.clone();
        }
        let children: HashSet<NodeId> = self
            .nodes
            .iter()
            .flat_map(|n| n.children.iter().copied())
            .collect();
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| !children.contains(id))
            .collect()
    }

    /// Nodes reachable from the roots, depth first, each visited once.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.roots().into_iter().rev().collect();

        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if !visited.insert(id) {
                continue;
            }
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }

        order
    }

    /// Meshes in traversal order, each once, followed by meshes no node uses.
    pub fn mesh_order(&self) -> Vec<MeshId> {
        let reachable = self.traverse().into_iter().filter_map(|id| self.nodes[id.0].mesh);
        ordered_once(reachable, self.meshes.len(), MeshId, "mesh")
    }

    /// Skins in traversal order, each once, followed by skins no node uses.
    pub fn skin_order(&self) -> Vec<SkinId> {
        let reachable = self.traverse().into_iter().filter_map(|id| self.nodes[id.0].skin);
        ordered_once(reachable, self.skins.len(), SkinId, "skin")
    }

    /// Check that every index refers to an existing object and that the
    /// referenced data has a shape the format accepts for its use.
    pub fn validate(&self) -> Result<()> {
        for (m, mesh) in self.meshes.iter().enumerate() {
            for (p, primitive) in mesh.primitives.iter().enumerate() {
                let context = format!("mesh {} primitive {}", m, p);
                let mut vertex_count = None;
                for attribute in &primitive.attributes {
                    let data = self.require_data(attribute.data, &context)?;
                    match vertex_count {
                        None => vertex_count = Some(data.count()),
                        Some(count) if count != data.count() => {
                            return Err(LayoutError::InvalidScene(format!(
                                "{}: attribute {} has {} elements, expected {}",
                                context,
                                attribute.semantic,
                                data.count(),
                                count
                            )));
                        }
                        Some(_) => {}
                    }
                }
                if let Some(indices) = primitive.indices {
                    let data = self.require_data(indices, &context)?;
                    if !data.component_type().is_index_type() || data.shape() != ElementShape::Scalar {
                        return Err(LayoutError::InvalidScene(format!(
                            "{}: indices must be scalar u8, u16 or u32, got {:?} {:?}",
                            context,
                            data.component_type(),
                            data.shape()
                        )));
                    }
                }
            }
        }

        for (s, skin) in self.skins.iter().enumerate() {
            let context = format!("skin {}", s);
            if let Some(matrices) = skin.inverse_bind_matrices {
                let data = self.require_data(matrices, &context)?;
                if data.shape() != ElementShape::Mat4 || data.count() < skin.joints.len() {
                    return Err(LayoutError::InvalidScene(format!(
                        "{}: inverse bind matrices must be one MAT4 per joint",
                        context
                    )));
                }
            }
            for joint in skin.joints.iter().chain(skin.skeleton.iter()) {
                self.require_node(*joint, &context)?;
            }
        }

        for (a, animation) in self.animations.iter().enumerate() {
            let context = format!("animation {}", a);
            for sampler in &animation.samplers {
                let input = self.require_data(sampler.input, &context)?;
                if input.shape() != ElementShape::Scalar || !input.component_type().is_float() {
                    return Err(LayoutError::InvalidScene(format!(
                        "{}: sampler input must be scalar floats",
                        context
                    )));
                }
                self.require_data(sampler.output, &context)?;
            }
            for channel in &animation.channels {
                if channel.sampler >= animation.samplers.len() {
                    return Err(LayoutError::InvalidScene(format!(
                        "{}: channel refers to missing sampler {}",
                        context, channel.sampler
                    )));
                }
                self.require_node(channel.node, &context)?;
            }
        }

        for (n, node) in self.nodes.iter().enumerate() {
            let context = format!("node {}", n);
            if let Some(mesh) = node.mesh {
                if self.mesh(mesh).is_none() {
                    return Err(LayoutError::InvalidScene(format!(
                        "{}: missing mesh {}",
                        context, mesh.0
                    )));
                }
            }
            if let Some(skin) = node.skin {
                if self.skin(skin).is_none() {
                    return Err(LayoutError::InvalidScene(format!(
                        "{}: missing skin {}",
                        context, skin.0
                    )));
                }
            }
            for child in &node.children {
                self.require_node(*child, &context)?;
            }
        }

        for root in &self.roots {
            self.require_node(*root, "scene roots")?;
        }

        Ok(())
    }

    fn require_data(&self, id: DataId, context: &str) -> Result<&AccessorData> {
        self.data(id).ok_or_else(|| {
            LayoutError::InvalidScene(format!("{}: missing data {}", context, id.0))
        })
    }

    fn require_node(&self, id: NodeId, context: &str) -> Result<&Node> {
        self.node(id).ok_or_else(|| {
            LayoutError::InvalidScene(format!("{}: missing node {}", context, id.0))
        })
    }
}

/// Deduplicate `reachable`, keeping first occurrences, then append the
/// remaining ids of an arena of `len` objects.
fn ordered_once<T: Copy + Eq + std::hash::Hash>(
    reachable: impl Iterator<Item = T>,
    len: usize,
    make: fn(usize) -> T,
    kind: &str,
) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut order: Vec<T> = reachable.filter(|id| seen.insert(*id)).collect();
    for index in 0..len {
        let id = make(index);
        if seen.insert(id) {
            log::warn!("{} {} is not used by any node in the scene", kind, index);
            order.push(id);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(scene: &mut Scene) -> MeshId {
        let positions = scene.add_data(AccessorData::from_vec3(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]));
        let indices = scene.add_data(AccessorData::from_u16(&[0, 1, 2]));
        scene.add_mesh(
            Mesh::new("triangle").with_primitive(
                Primitive::new()
                    .with_attribute(Semantic::Position, positions)
                    .with_indices(indices),
            ),
        )
    }

    #[test]
    fn test_roots_default_to_parentless_nodes() {
        let mut scene = Scene::new();
        let child = scene.add_node(Node::new("child"));
        let parent = scene.add_node(Node::new("parent").with_child(child));
        let other = scene.add_node(Node::new("other"));
        assert_eq!(scene.roots(), vec![parent, other]);

        scene.add_root(other);
        assert_eq!(scene.roots(), vec![other]);
    }

    #[test]
    fn test_traverse_visits_shared_children_once() {
        let mut scene = Scene::new();
        let shared = scene.add_node(Node::new("shared"));
        let a = scene.add_node(Node::new("a").with_child(shared));
        let b = scene.add_node(Node::new("b").with_child(shared));
        let root = scene.add_node(Node::new("root").with_child(a).with_child(b));
        scene.add_root(root);

        assert_eq!(scene.traverse(), vec![root, a, shared, b]);
    }

    #[test]
    fn test_mesh_order_deduplicates_instances() {
        let mut scene = Scene::new();
        let first = triangle(&mut scene);
        let second = triangle(&mut scene);
        let unused = triangle(&mut scene);
        scene.add_node(Node::new("a").with_mesh(second));
        scene.add_node(Node::new("b").with_mesh(first));
        scene.add_node(Node::new("c").with_mesh(second));

        assert_eq!(scene.mesh_order(), vec![second, first, unused]);
    }

    #[test]
    fn test_validate_accepts_well_formed_scene() {
        let mut scene = Scene::new();
        let mesh = triangle(&mut scene);
        scene.add_node(Node::new("a").with_mesh(mesh));
        scene.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_float_indices() {
        let mut scene = Scene::new();
        let positions = scene.add_data(AccessorData::from_vec3(&[[0.0; 3]]));
        let indices = scene.add_data(AccessorData::from_scalars(&[0.0]));
        scene.add_mesh(
            Mesh::new("bad").with_primitive(
                Primitive::new()
                    .with_attribute(Semantic::Position, positions)
                    .with_indices(indices),
            ),
        );
        assert!(matches!(scene.validate(), Err(LayoutError::InvalidScene(_))));
    }

    #[test]
    fn test_validate_rejects_mismatched_attribute_counts() {
        let mut scene = Scene::new();
        let positions = scene.add_data(AccessorData::from_vec3(&[[0.0; 3]; 3]));
        let normals = scene.add_data(AccessorData::from_vec3(&[[0.0; 3]; 2]));
        scene.add_mesh(
            Mesh::new("bad").with_primitive(
                Primitive::new()
                    .with_attribute(Semantic::Position, positions)
                    .with_attribute(Semantic::Normal, normals),
            ),
        );
        assert!(matches!(scene.validate(), Err(LayoutError::InvalidScene(_))));
    }

    #[test]
    fn test_validate_rejects_dangling_indices() {
        let mut scene = Scene::new();
        scene.add_node(Node::new("a").with_child(NodeId(7)));
        assert!(matches!(scene.validate(), Err(LayoutError::InvalidScene(_))));

        let mut scene = Scene::new();
        let node = scene.add_node(Node::new("a"));
        let mut animation = Animation::new("anim");
        animation.animate(node, AnimationPath::Translation, DataId(0), DataId(1), Interpolation::Linear);
        scene.add_animation(animation);
        assert!(matches!(scene.validate(), Err(LayoutError::InvalidScene(_))));
    }
}
