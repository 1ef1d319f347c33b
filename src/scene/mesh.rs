//! Meshes, primitives and vertex attribute semantics.

use super::DataId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The meaning of a vertex attribute.
///
/// Variant order is the order attributes are laid out in when a primitive's
/// attributes are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    TexCoord(u32),
    Color(u32),
    Joints(u32),
    Weights(u32),
    /// Application specific attribute, conventionally prefixed with `_`.
    Custom(String),
}

impl Semantic {
    /// Parse an attribute name such as `POSITION` or `TEXCOORD_1`.
    pub fn parse(name: &str) -> Self {
        match name {
            "POSITION" => return Semantic::Position,
            "NORMAL" => return Semantic::Normal,
            "TANGENT" => return Semantic::Tangent,
            _ => {}
        }
        let indexed = |prefix: &str| {
            name.strip_prefix(prefix)
                .and_then(|set| set.parse::<u32>().ok())
        };
        if let Some(set) = indexed("TEXCOORD_") {
            Semantic::TexCoord(set)
        } else if let Some(set) = indexed("COLOR_") {
            Semantic::Color(set)
        } else if let Some(set) = indexed("JOINTS_") {
            Semantic::Joints(set)
        } else if let Some(set) = indexed("WEIGHTS_") {
            Semantic::Weights(set)
        } else {
            Semantic::Custom(name.to_string())
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semantic::Position => write!(f, "POSITION"),
            Semantic::Normal => write!(f, "NORMAL"),
            Semantic::Tangent => write!(f, "TANGENT"),
            Semantic::TexCoord(set) => write!(f, "TEXCOORD_{}", set),
            Semantic::Color(set) => write!(f, "COLOR_{}", set),
            Semantic::Joints(set) => write!(f, "JOINTS_{}", set),
            Semantic::Weights(set) => write!(f, "WEIGHTS_{}", set),
            Semantic::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Topology of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// One vertex attribute of a primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub semantic: Semantic,
    pub data: DataId,
}

/// Geometry drawn with a single draw call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Primitive {
    /// Vertex attributes in layout order.
    pub attributes: Vec<Attribute>,
    /// Optional index array (scalar `u8`, `u16` or `u32`).
    pub indices: Option<DataId>,
    pub mode: PrimitiveMode,
}

impl Primitive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, semantic: Semantic, data: DataId) -> Self {
        self.attributes.push(Attribute { semantic, data });
        self
    }

    pub fn with_indices(mut self, data: DataId) -> Self {
        self.indices = Some(data);
        self
    }

    pub fn with_mode(mut self, mode: PrimitiveMode) -> Self {
        self.mode = mode;
        self
    }

    /// The attribute with the given semantic.
    pub fn attribute(&self, semantic: &Semantic) -> Option<DataId> {
        self.attributes
            .iter()
            .find(|a| &a.semantic == semantic)
            .map(|a| a.data)
    }
}

/// A named set of primitives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            primitives: Vec::new(),
        }
    }

    pub fn with_primitive(mut self, primitive: Primitive) -> Self {
        self.primitives.push(primitive);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_parse_round_trip() {
        for name in ["POSITION", "NORMAL", "TANGENT", "TEXCOORD_0", "COLOR_1", "JOINTS_0", "WEIGHTS_2", "_HEAT"] {
            assert_eq!(Semantic::parse(name).to_string(), name);
        }
        assert_eq!(Semantic::parse("TEXCOORD_3"), Semantic::TexCoord(3));
        assert_eq!(Semantic::parse("TEXCOORD_x"), Semantic::Custom("TEXCOORD_x".to_string()));
    }

    #[test]
    fn test_semantic_order() {
        let mut semantics = vec![
            Semantic::TexCoord(0),
            Semantic::Custom("_A".to_string()),
            Semantic::Normal,
            Semantic::Position,
        ];
        semantics.sort();
        assert_eq!(
            semantics,
            vec![
                Semantic::Position,
                Semantic::Normal,
                Semantic::TexCoord(0),
                Semantic::Custom("_A".to_string()),
            ]
        );
    }
}
