//! Numeric component kinds stored in accessors.

use serde::{Deserialize, Serialize};

/// The primitive numeric type of each component of an accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
    /// Double precision. The layout engine handles it, glTF 2.0 documents cannot.
    F64,
}

impl ComponentType {
    /// All component types in order of their GL constant.
    pub const ALL: [ComponentType; 7] = [
        ComponentType::I8,
        ComponentType::U8,
        ComponentType::I16,
        ComponentType::U16,
        ComponentType::U32,
        ComponentType::F32,
        ComponentType::F64,
    ];

    /// Size of one component in bytes.
    pub fn size(&self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
            ComponentType::F64 => 8,
        }
    }

    /// Whether this is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, ComponentType::F32 | ComponentType::F64)
    }

    /// Whether values of this type may be used as mesh indices.
    pub fn is_index_type(&self) -> bool {
        matches!(self, ComponentType::U8 | ComponentType::U16 | ComponentType::U32)
    }

    /// Decode one little-endian component from the start of `bytes`.
    ///
    /// `bytes` must hold at least [`size`](Self::size) bytes.
    pub fn decode(&self, bytes: &[u8]) -> f64 {
        match self {
            ComponentType::I8 => bytes[0] as i8 as f64,
            ComponentType::U8 => bytes[0] as f64,
            ComponentType::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ComponentType::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ComponentType::U32 => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ComponentType::F32 => {
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ComponentType::F64 => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }
}
