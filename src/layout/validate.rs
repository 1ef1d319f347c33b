//! Post-layout consistency checks.
//!
//! Nothing here fails a layout. Every finding is returned as a
//! [`LayoutDiagnostic`] and logged, and the laid out buffers are kept so the
//! offending bytes can still be inspected.

use super::{Accessor, AccessorId, Buffer, BufferView, BufferViewId, MAX_BYTE_STRIDE, MIN_BYTE_STRIDE};
use thiserror::Error;

/// A violated layout invariant. Signals a defect in the layout, not in the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutDiagnostic {
    /// An accessor offset is not a multiple of its component size.
    #[error(
        "accessor {} in buffer view {} is misaligned: offset {offset_in_view} in view, \
         {offset_in_buffer} in buffer, alignment {alignment}",
        .accessor.index(),
        .buffer_view.index()
    )]
    Misaligned {
        accessor: AccessorId,
        buffer_view: BufferViewId,
        offset_in_view: usize,
        offset_in_buffer: usize,
        alignment: usize,
    },

    /// A common stride outside the range the format accepts.
    #[error("buffer view {} has byte stride {byte_stride}", .buffer_view.index())]
    StrideOutOfRange {
        buffer_view: BufferViewId,
        byte_stride: usize,
    },

    /// An accessor needed padding inside its view to reach its alignment.
    ///
    /// The padding is still inserted, so the layout stays readable.
    #[error(
        "accessor {} (member {position}) needed {padding} padding byte(s) in buffer view {}",
        .accessor.index(),
        .buffer_view.index()
    )]
    MemberPadding {
        accessor: AccessorId,
        buffer_view: BufferViewId,
        /// Position of the accessor among the view's members.
        position: usize,
        padding: usize,
    },
}

/// Check every accessor of every view of every buffer.
pub(crate) fn validate(
    accessors: &[Accessor],
    buffer_views: &[BufferView],
    buffers: &[Buffer],
) -> Vec<LayoutDiagnostic> {
    let mut diagnostics = Vec::new();

    for buffer in buffers {
        for view_id in buffer.buffer_views() {
            let view = &buffer_views[view_id.index()];

            if let Some(stride) = view.byte_stride() {
                if !(MIN_BYTE_STRIDE..=MAX_BYTE_STRIDE).contains(&stride) {
                    diagnostics.push(LayoutDiagnostic::StrideOutOfRange {
                        buffer_view: view.id(),
                        byte_stride: stride,
                    });
                }
            }

            for accessor_id in view.accessors() {
                let accessor = &accessors[accessor_id.index()];
                let alignment = accessor.alignment();
                let offset_in_view = accessor.byte_offset();
                let offset_in_buffer = view.byte_offset() + offset_in_view;
                if offset_in_view % alignment != 0 || offset_in_buffer % alignment != 0 {
                    diagnostics.push(LayoutDiagnostic::Misaligned {
                        accessor: accessor.id(),
                        buffer_view: view.id(),
                        offset_in_view,
                        offset_in_buffer,
                        alignment,
                    });
                }
            }
        }
    }

    for diagnostic in &diagnostics {
        log::error!("Layout inconsistency: {}", diagnostic);
    }

    diagnostics
}
