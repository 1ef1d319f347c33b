//! Located buffers.

use super::{BufferId, BufferView, BufferViewId};

/// The final binary payload made of one or more buffer views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    pub(crate) id: BufferId,
    pub(crate) uri: Option<String>,
    pub(crate) buffer_views: Vec<BufferViewId>,
    pub(crate) data: Vec<u8>,
}

impl Buffer {
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Identifier given when the buffer was closed. `None` for an embedded GLB buffer.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Member views in layout order.
    pub fn buffer_views(&self) -> &[BufferViewId] {
        &self.buffer_views
    }

    /// The concatenated bytes, padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_length(&self) -> usize {
        self.data.len()
    }

    /// The bytes covered by `view`, or `None` if the view lies outside the buffer.
    pub fn view_bytes(&self, view: &BufferView) -> Option<&[u8]> {
        self.data.get(view.byte_offset()..view.end())
    }
}
