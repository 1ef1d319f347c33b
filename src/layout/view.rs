//! Located buffer views.

use super::{AccessorId, BufferId, BufferViewId};
use crate::types::ViewTarget;

/// A contiguous region of a buffer holding one or more accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferView {
    pub(crate) id: BufferViewId,
    pub(crate) buffer: BufferId,
    pub(crate) accessors: Vec<AccessorId>,
    pub(crate) target: ViewTarget,
    pub(crate) byte_offset: usize,
    pub(crate) byte_length: usize,
    pub(crate) byte_stride: Option<usize>,
}

impl BufferView {
    pub fn id(&self) -> BufferViewId {
        self.id
    }

    /// The buffer this view was closed into.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Member accessors in the order they were added.
    pub fn accessors(&self) -> &[AccessorId] {
        &self.accessors
    }

    pub fn target(&self) -> ViewTarget {
        self.target
    }

    /// Offset of the view from the start of the buffer.
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// Common stride shared by all members. Only set for strided views.
    pub fn byte_stride(&self) -> Option<usize> {
        self.byte_stride
    }

    /// Offset one past the last byte of the view within the buffer.
    pub fn end(&self) -> usize {
        self.byte_offset + self.byte_length
    }
}
