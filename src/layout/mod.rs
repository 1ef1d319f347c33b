//! Buffer layout engine.
//!
//! Typed arrays are added to a [`LayoutBuilder`] as [`AccessorData`], grouped
//! into buffer views and buffers, and laid out by [`LayoutBuilder::finalize`].
//! The result is a [`LayoutStructure`] holding located [`Accessor`]s,
//! [`BufferView`]s and [`Buffer`]s whose offsets, lengths and strides follow
//! the glTF alignment rules:
//!
//! - a buffer view starts at a multiple of the least common multiple of the
//!   component sizes of its accessors,
//! - an accessor starts at a multiple of its own component size,
//! - a view shared by several accessors (other than an index view) gets a
//!   common byte stride that is a multiple of 4.
//!
//! ```ignore
//! use gltf_buffer_layout::layout::{AccessorData, LayoutBuilder};
//! use gltf_buffer_layout::types::ViewTarget;
//!
//! let mut builder = LayoutBuilder::new();
//! let positions = builder.add_accessor(AccessorData::from_vec3(&positions));
//! let normals = builder.add_accessor(AccessorData::from_vec3(&normals));
//! builder.close_buffer_view(ViewTarget::VertexAttributes);
//! builder.add_accessor(AccessorData::from_u16(&indices));
//! builder.close_buffer_view(ViewTarget::Indices);
//! builder.close_buffer(None);
//!
//! let layout = builder.finalize()?;
//! assert!(layout.diagnostics().is_empty());
//! ```

pub mod align;
mod accessor;
mod buffer;
mod builder;
mod structure;
mod validate;
mod view;

pub use accessor::{Accessor, AccessorData};
pub use buffer::Buffer;
pub use builder::LayoutBuilder;
pub use structure::LayoutStructure;
pub use validate::LayoutDiagnostic;
pub use view::BufferView;

/// Common strides of vertex attribute views are rounded up to this multiple.
pub const STRIDE_ALIGNMENT: usize = 4;

/// Smallest byte stride a buffer view may declare.
pub const MIN_BYTE_STRIDE: usize = 4;

/// Largest byte stride a buffer view may declare.
pub const MAX_BYTE_STRIDE: usize = 252;

/// Index of an accessor within one layout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessorId(pub(crate) usize);

impl AccessorId {
    /// Position of the accessor in creation order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of a buffer view within one layout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferViewId(pub(crate) usize);

impl BufferViewId {
    /// Position of the buffer view in creation order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of a buffer within one layout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) usize);

impl BufferId {
    /// Position of the buffer in creation order.
    pub fn index(&self) -> usize {
        self.0
    }
}
