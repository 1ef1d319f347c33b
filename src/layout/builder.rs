//! Accumulation of accessors into buffer views and buffers, and the layout pass.

use super::accessor::{Accessor, AccessorData};
use super::align::{lcm_all, padding_for, round_up};
use super::validate::{validate, LayoutDiagnostic};
use super::{
    AccessorId, Buffer, BufferId, BufferView, BufferViewId, LayoutStructure, STRIDE_ALIGNMENT,
};
use crate::error::{LayoutError, Result};
use crate::types::{ComponentType, ElementShape, ViewTarget};

/// A buffer view that has been closed but not laid out.
#[derive(Debug, Clone)]
struct ViewDraft {
    accessors: Vec<AccessorId>,
    target: ViewTarget,
}

/// A buffer that has been closed but not laid out.
#[derive(Debug, Clone)]
struct BufferDraft {
    uri: Option<String>,
    buffer_views: Vec<BufferViewId>,
}

/// Where the layout pass placed an accessor.
#[derive(Debug, Clone, Copy, Default)]
struct AccessorPlacement {
    buffer_view: usize,
    byte_offset: usize,
    byte_stride: usize,
}

/// Where the layout pass placed a buffer view.
#[derive(Debug, Clone, Copy, Default)]
struct ViewPlacement {
    buffer: usize,
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

/// Stateful builder for one layout session.
///
/// Accessors are added one at a time and stay pending until
/// [`close_buffer_view`](Self::close_buffer_view) groups them. Closed views stay
/// pending until [`close_buffer`](Self::close_buffer) groups them. Nothing is
/// laid out until [`finalize`](Self::finalize).
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    accessors: Vec<AccessorData>,
    buffer_views: Vec<ViewDraft>,
    buffers: Vec<BufferDraft>,
    pending_accessors: Vec<AccessorId>,
    pending_views: Vec<BufferViewId>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an accessor to the currently open buffer view.
    pub fn add_accessor(&mut self, data: AccessorData) -> AccessorId {
        let id = AccessorId(self.accessors.len());
        self.accessors.push(data);
        self.pending_accessors.push(id);
        id
    }

    /// Add raw tightly packed bytes to the currently open buffer view.
    ///
    /// Fails with [`LayoutError::ShapeMismatch`] if the bytes are not a whole
    /// number of `(component_type, shape)` elements.
    pub fn add_array(
        &mut self,
        component_type: ComponentType,
        shape: ElementShape,
        data: impl Into<Vec<u8>>,
    ) -> Result<AccessorId> {
        let data = AccessorData::new(component_type, shape, data)?;
        Ok(self.add_accessor(data))
    }

    /// Close all pending accessors into a new buffer view.
    pub fn close_buffer_view(&mut self, target: ViewTarget) -> BufferViewId {
        let id = BufferViewId(self.buffer_views.len());
        self.buffer_views.push(ViewDraft {
            accessors: std::mem::take(&mut self.pending_accessors),
            target,
        });
        self.pending_views.push(id);
        id
    }

    /// Close all pending buffer views into a new buffer.
    ///
    /// Views added afterwards go to the next buffer.
    pub fn close_buffer(&mut self, uri: Option<String>) -> BufferId {
        let id = BufferId(self.buffers.len());
        self.buffers.push(BufferDraft {
            uri,
            buffer_views: std::mem::take(&mut self.pending_views),
        });
        id
    }

    /// Whether any accessor or buffer view is still waiting to be closed.
    pub fn has_pending(&self) -> bool {
        !self.pending_accessors.is_empty() || !self.pending_views.is_empty()
    }

    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }

    pub fn buffer_view_count(&self) -> usize {
        self.buffer_views.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Lay out every buffer and return the located structure.
    ///
    /// Fails if accessors or views are still pending. Alignment problems found
    /// after layout do not fail; they are returned as diagnostics on the
    /// [`LayoutStructure`].
    pub fn finalize(self) -> Result<LayoutStructure> {
        if !self.pending_accessors.is_empty() {
            return Err(LayoutError::UnclosedBufferView {
                pending: self.pending_accessors.len(),
            });
        }
        if !self.pending_views.is_empty() {
            return Err(LayoutError::UnclosedBuffer {
                pending: self.pending_views.len(),
            });
        }

        let mut accessor_placements = vec![AccessorPlacement::default(); self.accessors.len()];
        let mut view_placements = vec![ViewPlacement::default(); self.buffer_views.len()];
        let mut diagnostics = Vec::new();
        let mut buffers = Vec::with_capacity(self.buffers.len());

        for (index, draft) in self.buffers.into_iter().enumerate() {
            let data = layout_buffer(
                index,
                &draft,
                &self.buffer_views,
                &self.accessors,
                &mut accessor_placements,
                &mut view_placements,
                &mut diagnostics,
            );
            log::debug!(
                "Laid out buffer {} ({} views, {} bytes)",
                index,
                draft.buffer_views.len(),
                data.len()
            );
            buffers.push(Buffer {
                id: BufferId(index),
                uri: draft.uri,
                buffer_views: draft.buffer_views,
                data,
            });
        }

        let buffer_views: Vec<BufferView> = self
            .buffer_views
            .into_iter()
            .zip(view_placements)
            .enumerate()
            .map(|(index, (draft, placement))| BufferView {
                id: BufferViewId(index),
                buffer: BufferId(placement.buffer),
                accessors: draft.accessors,
                target: draft.target,
                byte_offset: placement.byte_offset,
                byte_length: placement.byte_length,
                byte_stride: placement.byte_stride,
            })
            .collect();

        let accessors: Vec<Accessor> = self
            .accessors
            .into_iter()
            .zip(accessor_placements)
            .enumerate()
            .map(|(index, (data, placement))| {
                Accessor::new(
                    AccessorId(index),
                    data,
                    BufferViewId(placement.buffer_view),
                    placement.byte_offset,
                    placement.byte_stride,
                )
            })
            .collect();

        diagnostics.extend(validate(&accessors, &buffer_views, &buffers));

        Ok(LayoutStructure::new(accessors, buffer_views, buffers, diagnostics))
    }
}

/// The common stride of a view, if its members share one.
///
/// Only views with more than one member that are not index views are strided.
/// The stride is the widest element (or requested stride) rounded up to a
/// multiple of 4.
fn common_stride(view: &ViewDraft, accessors: &[AccessorData]) -> Option<usize> {
    if !view.target.allows_stride() || view.accessors.len() < 2 {
        return None;
    }
    let widest = view
        .accessors
        .iter()
        .map(|id| {
            let accessor = &accessors[id.0];
            accessor
                .element_size()
                .max(accessor.declared_stride().unwrap_or(0))
        })
        .max()
        .unwrap_or(0);
    Some(round_up(widest, STRIDE_ALIGNMENT))
}

/// Lay out one buffer, recording placements, and return its bytes.
fn layout_buffer(
    buffer_index: usize,
    draft: &BufferDraft,
    views: &[ViewDraft],
    accessors: &[AccessorData],
    accessor_placements: &mut [AccessorPlacement],
    view_placements: &mut [ViewPlacement],
    diagnostics: &mut Vec<LayoutDiagnostic>,
) -> Vec<u8> {
    let mut data: Vec<u8> = Vec::new();

    for &view_id in &draft.buffer_views {
        let view = &views[view_id.0];

        let alignment = lcm_all(view.accessors.iter().map(|id| accessors[id.0].alignment()));
        let padding = padding_for(data.len(), alignment);
        data.resize(data.len() + padding, 0);
        let view_offset = data.len();

        let stride = common_stride(view, accessors);
        if let Some(stride) = stride {
            log::debug!(
                "Buffer view {} shares stride {} across {} accessors",
                view_id.0,
                stride,
                view.accessors.len()
            );
        }

        let mut view_cursor = 0;
        for (position, &accessor_id) in view.accessors.iter().enumerate() {
            let accessor = &accessors[accessor_id.0];

            let member_padding = padding_for(view_cursor, accessor.alignment());
            if member_padding != 0 {
                let diagnostic = LayoutDiagnostic::MemberPadding {
                    accessor: accessor_id,
                    buffer_view: view_id,
                    position,
                    padding: member_padding,
                };
                log::error!("Layout inconsistency: {}", diagnostic);
                diagnostics.push(diagnostic);
                data.resize(data.len() + member_padding, 0);
                view_cursor += member_padding;
            }

            let element_stride = stride.unwrap_or(accessor.element_size());
            accessor_placements[accessor_id.0] = AccessorPlacement {
                buffer_view: view_id.0,
                byte_offset: view_cursor,
                byte_stride: element_stride,
            };

            if element_stride != accessor.element_size() {
                data.extend_from_slice(&accessor.restrided(element_stride));
            } else {
                data.extend_from_slice(accessor.data());
            }
            view_cursor += accessor.count() * element_stride;
        }

        view_placements[view_id.0] = ViewPlacement {
            buffer: buffer_index,
            byte_offset: view_offset,
            byte_length: view_cursor,
            byte_stride: stride,
        };
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(count: usize, start: f32) -> Vec<f32> {
        (0..count).map(|i| start + i as f32).collect()
    }

    #[test]
    fn test_single_tightly_packed_accessor() {
        let mut builder = LayoutBuilder::new();
        let values = floats(9, 1.0);
        let accessor = builder
            .add_accessor(AccessorData::from_f32(ElementShape::Vec3, &values).unwrap());
        let view = builder.close_buffer_view(ViewTarget::General);
        let buffer = builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        let view = layout.buffer_view(view).unwrap();
        assert_eq!(view.byte_offset(), 0);
        assert_eq!(view.byte_length(), 36);
        assert_eq!(view.byte_stride(), None);

        let buffer = layout.buffer(buffer).unwrap();
        assert_eq!(buffer.byte_length(), 36);
        assert_eq!(buffer.data(), bytemuck::cast_slice::<f32, u8>(&values));

        let accessor = layout.accessor(accessor).unwrap();
        assert_eq!(accessor.byte_offset(), 0);
        assert_eq!(accessor.byte_stride(), 12);
        assert!(layout.diagnostics().is_empty());
    }

    #[test]
    fn test_lone_accessor_round_trips() {
        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_u8(&[1, 2, 3]));
        builder.close_buffer_view(ViewTarget::Indices);
        let shorts = AccessorData::from_values(ComponentType::I16, ElementShape::Vec3, &[-1i16, 2, -3, 4, -5, 6])
            .unwrap();
        let id = builder.add_accessor(shorts.clone());
        builder.close_buffer_view(ViewTarget::VertexAttributes);
        builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        let accessor = layout.accessor(id).unwrap();
        let view = layout.view_of(id).unwrap();
        let buffer = layout.buffer_of(view.id()).unwrap();
        let bytes = buffer.view_bytes(view).unwrap();
        assert_eq!(bytes, shorts.data());
        assert_eq!(layout.read_accessor(id).unwrap(), shorts.data());
        assert_eq!((view.byte_offset() + accessor.byte_offset()) % 2, 0);
    }

    #[test]
    fn test_interleaved_vertex_view() {
        let positions = floats(12, 0.0);
        let normals = floats(12, 100.0);
        let uvs = floats(8, 200.0);

        let mut builder = LayoutBuilder::new();
        let pos = builder.add_accessor(AccessorData::from_f32(ElementShape::Vec3, &positions).unwrap());
        let norm = builder.add_accessor(AccessorData::from_f32(ElementShape::Vec3, &normals).unwrap());
        let uv = builder.add_accessor(AccessorData::from_f32(ElementShape::Vec2, &uvs).unwrap());
        let view = builder.close_buffer_view(ViewTarget::VertexAttributes);
        let buffer = builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        let view = layout.buffer_view(view).unwrap();
        assert_eq!(view.byte_stride(), Some(12));
        assert_eq!(view.byte_length(), 4 * 12 * 3);

        for id in [pos, norm, uv] {
            assert_eq!(layout.accessor(id).unwrap().byte_stride(), 12);
        }
        assert_eq!(layout.accessor(pos).unwrap().byte_offset(), 0);
        assert_eq!(layout.accessor(norm).unwrap().byte_offset(), 48);
        assert_eq!(layout.accessor(uv).unwrap().byte_offset(), 96);

        let data = layout.buffer(buffer).unwrap().data();
        assert_eq!(&data[0..48], bytemuck::cast_slice::<f32, u8>(&positions));
        assert_eq!(&data[48..96], bytemuck::cast_slice::<f32, u8>(&normals));

        let uv_bytes = bytemuck::cast_slice::<f32, u8>(&uvs);
        for i in 0..4 {
            let chunk = &data[96 + i * 12..96 + (i + 1) * 12];
            assert_eq!(&chunk[0..8], &uv_bytes[i * 8..i * 8 + 8]);
            assert_eq!(&chunk[8..12], &[0, 0, 0, 0]);
        }

        assert_eq!(layout.read_accessor(uv).unwrap(), uv_bytes);
        assert!(layout.diagnostics().is_empty());
    }

    #[test]
    fn test_restride_of_narrow_member() {
        let wide = floats(6, 0.0);
        let narrow = floats(4, 50.0);

        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_f32(ElementShape::Vec3, &wide).unwrap());
        let b = builder.add_accessor(AccessorData::from_f32(ElementShape::Vec2, &narrow).unwrap());
        builder.close_buffer_view(ViewTarget::VertexAttributes);
        let buffer = builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        let accessor = layout.accessor(b).unwrap();
        let start = layout.view_of(b).unwrap().byte_offset() + accessor.byte_offset();
        let data = layout.buffer(buffer).unwrap().data();
        let original = bytemuck::cast_slice::<f32, u8>(&narrow);
        for i in 0..2 {
            let at = start + i * 12;
            assert_eq!(&data[at..at + 8], &original[i * 8..i * 8 + 8]);
            assert_eq!(&data[at + 8..at + 12], &[0, 0, 0, 0]);
        }
    }

    #[test]
    fn test_mixed_alignment_inserts_padding_between_views() {
        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_u8(&[0, 1, 2]));
        let indices = builder.close_buffer_view(ViewTarget::Indices);
        builder.add_accessor(AccessorData::from_vec3(&[[1.0, 2.0, 3.0]]));
        let floats_view = builder.close_buffer_view(ViewTarget::VertexAttributes);
        let buffer = builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        assert_eq!(layout.buffer_view(indices).unwrap().byte_offset(), 0);
        assert_eq!(layout.buffer_view(indices).unwrap().byte_length(), 3);
        assert_eq!(layout.buffer_view(floats_view).unwrap().byte_offset(), 4);

        let data = layout.buffer(buffer).unwrap().data();
        assert_eq!(data.len(), 16);
        assert_eq!(&data[0..4], &[0, 1, 2, 0]);
    }

    #[test]
    fn test_index_view_is_never_strided() {
        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_u16(&[0, 1, 2]));
        let second = builder.add_accessor(AccessorData::from_u32(&[3, 4]));
        let view = builder.close_buffer_view(ViewTarget::Indices);
        builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        let view_id = view;
        let view = layout.buffer_view(view).unwrap();
        assert_eq!(view.byte_stride(), None);
        // 6 bytes of u16, padded to 8 for the u32 member
        let second_accessor = layout.accessor(second).unwrap();
        assert_eq!(second_accessor.byte_offset(), 8);
        assert_eq!(second_accessor.byte_stride(), 4);
        assert_eq!(view.byte_length(), 16);
        assert_eq!(
            layout.diagnostics(),
            &[LayoutDiagnostic::MemberPadding {
                accessor: second,
                buffer_view: view_id,
                position: 1,
                padding: 2,
            }]
        );
    }

    #[test]
    fn test_stride_rounded_to_multiple_of_four() {
        let mut builder = LayoutBuilder::new();
        let colors = AccessorData::from_values(ComponentType::U8, ElementShape::Vec3, &[255u8; 6])
            .unwrap()
            .with_normalized(true);
        builder.add_accessor(colors);
        builder.add_accessor(AccessorData::from_values(ComponentType::U16, ElementShape::Vec2, &[1u16; 4]).unwrap());
        let view = builder.close_buffer_view(ViewTarget::VertexAttributes);
        builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        let view = layout.buffer_view(view).unwrap();
        assert_eq!(view.byte_stride(), Some(4));
        assert_eq!(view.byte_length(), 2 * 4 + 2 * 4);
    }

    #[test]
    fn test_declared_stride_widens_common_stride() {
        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_vec3(&[[0.0; 3]; 2]).with_byte_stride(22));
        builder.add_accessor(AccessorData::from_vec2(&[[0.0; 2]; 2]));
        let view = builder.close_buffer_view(ViewTarget::VertexAttributes);
        builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        assert_eq!(layout.buffer_view(view).unwrap().byte_stride(), Some(24));
    }

    #[test]
    fn test_buffers_are_laid_out_independently() {
        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_u8(&[7]));
        builder.close_buffer_view(ViewTarget::Indices);
        let first = builder.close_buffer(Some("first.bin".to_string()));
        builder.add_accessor(AccessorData::from_scalars(&[1.0]));
        let view = builder.close_buffer_view(ViewTarget::General);
        let second = builder.close_buffer(Some("second.bin".to_string()));
        let layout = builder.finalize().unwrap();

        assert_eq!(layout.buffer(first).unwrap().byte_length(), 1);
        assert_eq!(layout.buffer(second).unwrap().uri(), Some("second.bin"));
        assert_eq!(layout.buffer_view(view).unwrap().byte_offset(), 0);
        assert_eq!(layout.buffer_view(view).unwrap().buffer(), second);
    }

    #[test]
    fn test_odd_count_before_double_member_is_padded() {
        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_vec3(&[[1.0; 3]]));
        let doubles = AccessorData::from_values(ComponentType::F64, ElementShape::Scalar, &[2.0f64]).unwrap();
        let double = builder.add_accessor(doubles.clone());
        let view = builder.close_buffer_view(ViewTarget::General);
        builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        // stride 12, one element, then 4 bytes of padding to reach 8-byte alignment
        let double_accessor = layout.accessor(double).unwrap();
        assert_eq!(double_accessor.byte_offset(), 16);
        assert_eq!(layout.buffer_view(view).unwrap().byte_length(), 28);
        assert_eq!(layout.read_accessor(double).unwrap(), doubles.data());
        assert_eq!(
            layout.diagnostics(),
            &[LayoutDiagnostic::MemberPadding {
                accessor: double,
                buffer_view: view,
                position: 1,
                padding: 4,
            }]
        );
    }

    #[test]
    fn test_naturally_aligned_members_need_no_padding() {
        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_u16(&[0, 1, 2, 3]));
        let wide = builder.add_accessor(AccessorData::from_u32(&[4, 5]));
        builder.close_buffer_view(ViewTarget::Indices);
        builder.close_buffer(None);
        let layout = builder.finalize().unwrap();

        assert_eq!(layout.accessor(wide).unwrap().byte_offset(), 8);
        assert!(layout.diagnostics().is_empty());
    }

    #[test]
    fn test_add_array_rejects_shape_mismatch() {
        let mut builder = LayoutBuilder::new();
        let result = builder.add_array(ComponentType::U16, ElementShape::Vec2, vec![0u8; 6]);
        assert!(matches!(result, Err(LayoutError::ShapeMismatch { byte_length: 6, element_size: 4 })));
        assert!(!builder.has_pending());
    }

    #[test]
    fn test_finalize_with_pending_accessors_fails() {
        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_u8(&[1]));
        assert!(matches!(builder.finalize(), Err(LayoutError::UnclosedBufferView { pending: 1 })));
    }

    #[test]
    fn test_finalize_with_pending_views_fails() {
        let mut builder = LayoutBuilder::new();
        builder.add_accessor(AccessorData::from_u8(&[1]));
        builder.close_buffer_view(ViewTarget::Indices);
        builder.add_accessor(AccessorData::from_u8(&[2]));
        builder.close_buffer_view(ViewTarget::Indices);
        assert!(builder.has_pending());
        assert!(matches!(builder.finalize(), Err(LayoutError::UnclosedBuffer { pending: 2 })));
    }

    #[test]
    fn test_empty_builder_finalizes() {
        let layout = LayoutBuilder::new().finalize().unwrap();
        assert!(layout.buffers().is_empty());
        assert!(layout.diagnostics().is_empty());
    }
}
