//! Skins and keyframe animations.

use super::{DataId, NodeId};
use serde::{Deserialize, Serialize};

/// Joint hierarchy and inverse bind matrices used for skinning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skin {
    pub name: Option<String>,
    /// One `MAT4` per joint.
    pub inverse_bind_matrices: Option<DataId>,
    pub joints: Vec<NodeId>,
    pub skeleton: Option<NodeId>,
}

/// The node property an animation channel drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPath {
    Translation,
    Rotation,
    Scale,
    Weights,
}

/// How values between keyframes are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

/// Keyframe times and the values at those times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSampler {
    /// Scalar float key times.
    pub input: DataId,
    pub output: DataId,
    pub interpolation: Interpolation,
}

/// Connects a sampler to a node property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationChannel {
    /// Index into the owning animation's samplers.
    pub sampler: usize,
    pub node: NodeId,
    pub path: AnimationPath,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Animation {
    pub name: Option<String>,
    pub samplers: Vec<AnimationSampler>,
    pub channels: Vec<AnimationChannel>,
}

impl Animation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Add a sampler driving `path` of `node` and return the sampler index.
    pub fn animate(
        &mut self,
        node: NodeId,
        path: AnimationPath,
        input: DataId,
        output: DataId,
        interpolation: Interpolation,
    ) -> usize {
        let sampler = self.samplers.len();
        self.samplers.push(AnimationSampler {
            input,
            output,
            interpolation,
        });
        self.channels.push(AnimationChannel { sampler, node, path });
        sampler
    }
}
