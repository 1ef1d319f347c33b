//! The finalized result of a layout session.

use super::{
    Accessor, AccessorId, Buffer, BufferId, BufferView, BufferViewId, LayoutDiagnostic,
};

/// Located accessors, buffer views and buffers of one layout session.
///
/// Each list is in creation order and indexed by the matching id, which gives
/// the accessor→view and view→buffer mappings directly.
#[derive(Debug, Clone)]
pub struct LayoutStructure {
    accessors: Vec<Accessor>,
    buffer_views: Vec<BufferView>,
    buffers: Vec<Buffer>,
    diagnostics: Vec<LayoutDiagnostic>,
}

impl LayoutStructure {
    pub(crate) fn new(
        accessors: Vec<Accessor>,
        buffer_views: Vec<BufferView>,
        buffers: Vec<Buffer>,
        diagnostics: Vec<LayoutDiagnostic>,
    ) -> Self {
        Self {
            accessors,
            buffer_views,
            buffers,
            diagnostics,
        }
    }

    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    pub fn buffer_views(&self) -> &[BufferView] {
        &self.buffer_views
    }

    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    pub fn accessor(&self, id: AccessorId) -> Option<&Accessor> {
        self.accessors.get(id.0)
    }

    pub fn buffer_view(&self, id: BufferViewId) -> Option<&BufferView> {
        self.buffer_views.get(id.0)
    }

    pub fn buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(id.0)
    }

    /// The view an accessor lives in.
    pub fn view_of(&self, accessor: AccessorId) -> Option<&BufferView> {
        self.accessor(accessor)
            .and_then(|a| self.buffer_view(a.buffer_view()))
    }

    /// The buffer a view lives in.
    pub fn buffer_of(&self, view: BufferViewId) -> Option<&Buffer> {
        self.buffer_view(view).and_then(|v| self.buffer(v.buffer()))
    }

    /// Layout inconsistencies found during finalize. Empty for a correct layout.
    pub fn diagnostics(&self) -> &[LayoutDiagnostic] {
        &self.diagnostics
    }

    /// Total number of bytes over all buffers.
    pub fn total_byte_length(&self) -> usize {
        self.buffers.iter().map(|b| b.byte_length()).sum()
    }

    /// Read an accessor's elements back out of its buffer, tightly packed.
    ///
    /// For a correct layout this equals the accessor's original data.
    pub fn read_accessor(&self, id: AccessorId) -> Option<Vec<u8>> {
        let accessor = self.accessor(id)?;
        let view = self.buffer_view(accessor.buffer_view())?;
        let buffer = self.buffer(view.buffer())?;

        let size = accessor.element_size();
        let start = view.byte_offset() + accessor.byte_offset();
        let mut out = Vec::with_capacity(accessor.count() * size);
        for i in 0..accessor.count() {
            let at = start + i * accessor.byte_stride();
            out.extend_from_slice(buffer.data().get(at..at + size)?);
        }
        Some(out)
    }

    /// Consume the structure, keeping only the buffers.
    pub fn into_buffers(self) -> Vec<Buffer> {
        self.buffers
    }
}
