//! Element shapes (scalar, vector, matrix) and buffer view targets.

use serde::{Deserialize, Serialize};

/// The arity of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementShape {
    /// Number of components making up one element.
    pub fn components(&self) -> usize {
        match self {
            ElementShape::Scalar => 1,
            ElementShape::Vec2 => 2,
            ElementShape::Vec3 => 3,
            ElementShape::Vec4 => 4,
            ElementShape::Mat2 => 4,
            ElementShape::Mat3 => 9,
            ElementShape::Mat4 => 16,
        }
    }
}

/// What a buffer view is used for.
///
/// Index views are never strided, vertex attribute views may share a stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTarget {
    /// Animation keys, inverse bind matrices and other non-vertex data.
    #[default]
    General,
    /// Vertex attributes (`ARRAY_BUFFER`).
    VertexAttributes,
    /// Mesh indices (`ELEMENT_ARRAY_BUFFER`).
    Indices,
}

impl ViewTarget {
    /// Whether views with this target may carry a common byte stride.
    pub fn allows_stride(&self) -> bool {
        !matches!(self, ViewTarget::Indices)
    }
}
