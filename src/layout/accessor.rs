//! Typed array descriptors.

use super::{AccessorId, BufferViewId};
use crate::error::{LayoutError, Result};
use crate::types::{ComponentType, ElementShape};

/// A typed array waiting to be laid out.
///
/// The data is always tightly packed: `data.len() == count * element_size`.
/// Strided copies only ever exist inside a laid out buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorData {
    component_type: ComponentType,
    shape: ElementShape,
    count: usize,
    normalized: bool,
    byte_stride: Option<usize>,
    data: Vec<u8>,
}

impl AccessorData {
    /// Wrap tightly packed little-endian bytes.
    ///
    /// Fails with [`LayoutError::ShapeMismatch`] if the byte length is not a
    /// whole number of elements.
    pub fn new(
        component_type: ComponentType,
        shape: ElementShape,
        data: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let data = data.into();
        let element_size = component_type.size() * shape.components();
        if data.len() % element_size != 0 {
            return Err(LayoutError::ShapeMismatch {
                byte_length: data.len(),
                element_size,
            });
        }
        Ok(Self {
            component_type,
            shape,
            count: data.len() / element_size,
            normalized: false,
            byte_stride: None,
            data,
        })
    }

    /// Wrap a slice of plain values, one component per value.
    pub fn from_values<T: bytemuck::Pod>(
        component_type: ComponentType,
        shape: ElementShape,
        values: &[T],
    ) -> Result<Self> {
        Self::new(component_type, shape, bytemuck::cast_slice::<T, u8>(values))
    }

    /// Float components of the given shape.
    pub fn from_f32(shape: ElementShape, values: &[f32]) -> Result<Self> {
        Self::from_values(ComponentType::F32, shape, values)
    }

    /// Scalar floats, e.g. animation key times.
    pub fn from_scalars(values: &[f32]) -> Self {
        Self::packed(ComponentType::F32, ElementShape::Scalar, values)
    }

    /// Two-component float vectors.
    pub fn from_vec2(values: &[[f32; 2]]) -> Self {
        Self::packed(ComponentType::F32, ElementShape::Vec2, values)
    }

    /// Three-component float vectors.
    pub fn from_vec3(values: &[[f32; 3]]) -> Self {
        Self::packed(ComponentType::F32, ElementShape::Vec3, values)
    }

    /// Four-component float vectors.
    pub fn from_vec4(values: &[[f32; 4]]) -> Self {
        Self::packed(ComponentType::F32, ElementShape::Vec4, values)
    }

    /// Column-major 4x4 float matrices.
    pub fn from_mat4(values: &[glam::Mat4]) -> Self {
        let flat: Vec<f32> = values.iter().flat_map(|m| m.to_cols_array()).collect();
        Self::packed(ComponentType::F32, ElementShape::Mat4, &flat)
    }

    /// Scalar `u8` values, e.g. small index arrays.
    pub fn from_u8(values: &[u8]) -> Self {
        Self::packed(ComponentType::U8, ElementShape::Scalar, values)
    }

    /// Scalar `u16` values.
    pub fn from_u16(values: &[u16]) -> Self {
        Self::packed(ComponentType::U16, ElementShape::Scalar, values)
    }

    /// Scalar `u32` values.
    pub fn from_u32(values: &[u32]) -> Self {
        Self::packed(ComponentType::U32, ElementShape::Scalar, values)
    }

    /// Four-component `u16` vectors, e.g. joint indices.
    pub fn from_u16x4(values: &[[u16; 4]]) -> Self {
        Self::packed(ComponentType::U16, ElementShape::Vec4, values)
    }

    // Whole elements per value, so the length is a multiple of the element size.
    fn packed<T: bytemuck::Pod>(
        component_type: ComponentType,
        shape: ElementShape,
        values: &[T],
    ) -> Self {
        let data = bytemuck::cast_slice::<T, u8>(values).to_vec();
        let element_size = component_type.size() * shape.components();
        Self {
            component_type,
            shape,
            count: data.len() / element_size,
            normalized: false,
            byte_stride: None,
            data,
        }
    }

    /// Mark integer components as normalized.
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Request a minimum byte stride when this accessor shares a view.
    pub fn with_byte_stride(mut self, byte_stride: usize) -> Self {
        self.byte_stride = Some(byte_stride);
        self
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn shape(&self) -> ElementShape {
        self.shape
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// The stride requested with [`with_byte_stride`](Self::with_byte_stride), if any.
    pub fn declared_stride(&self) -> Option<usize> {
        self.byte_stride
    }

    /// The tightly packed bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes per element.
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.shape.components()
    }

    /// Required alignment of every offset touching this accessor.
    pub fn alignment(&self) -> usize {
        self.component_type.size()
    }

    /// Bytes of one element.
    pub fn element(&self, index: usize) -> Option<&[u8]> {
        let size = self.element_size();
        self.data.get(index * size..(index + 1) * size)
    }

    /// Copy the elements into a buffer with `stride` bytes per element.
    ///
    /// Element `i` lands at `i * stride`; the trailing `stride - element_size`
    /// bytes of each element are zero.
    pub fn restrided(&self, stride: usize) -> Vec<u8> {
        let size = self.element_size();
        debug_assert!(stride >= size, "stride {} below element size {}", stride, size);
        let mut out = vec![0u8; self.count * stride];
        for (i, element) in self.data.chunks_exact(size).enumerate() {
            out[i * stride..i * stride + size].copy_from_slice(element);
        }
        out
    }

    /// Per-component minimum and maximum. `None` when there are no elements.
    pub fn bounds(&self) -> Option<(Vec<f64>, Vec<f64>)> {
        if self.count == 0 {
            return None;
        }
        let components = self.shape.components();
        let component_size = self.component_type.size();
        let mut min = vec![f64::MAX; components];
        let mut max = vec![f64::MIN; components];

        for element in self.data.chunks_exact(self.element_size()) {
            for (c, bytes) in element.chunks_exact(component_size).enumerate() {
                let value = self.component_type.decode(bytes);
                min[c] = min[c].min(value);
                max[c] = max[c].max(value);
            }
        }

        Some((min, max))
    }
}

/// An accessor after layout: its data plus where it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    id: AccessorId,
    data: AccessorData,
    buffer_view: BufferViewId,
    byte_offset: usize,
    byte_stride: usize,
}

impl Accessor {
    pub(crate) fn new(
        id: AccessorId,
        data: AccessorData,
        buffer_view: BufferViewId,
        byte_offset: usize,
        byte_stride: usize,
    ) -> Self {
        Self {
            id,
            data,
            buffer_view,
            byte_offset,
            byte_stride,
        }
    }

    pub fn id(&self) -> AccessorId {
        self.id
    }

    /// The canonical, tightly packed data.
    pub fn data(&self) -> &AccessorData {
        &self.data
    }

    /// The view this accessor was closed into.
    pub fn buffer_view(&self) -> BufferViewId {
        self.buffer_view
    }

    /// Offset of the first element relative to the start of the view.
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Distance between consecutive elements in the buffer.
    pub fn byte_stride(&self) -> usize {
        self.byte_stride
    }

    pub fn component_type(&self) -> ComponentType {
        self.data.component_type()
    }

    pub fn shape(&self) -> ElementShape {
        self.data.shape()
    }

    pub fn count(&self) -> usize {
        self.data.count()
    }

    pub fn element_size(&self) -> usize {
        self.data.element_size()
    }

    pub fn alignment(&self) -> usize {
        self.data.alignment()
    }

    pub fn is_normalized(&self) -> bool {
        self.data.is_normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_computes_count() {
        let data = AccessorData::new(ComponentType::F32, ElementShape::Vec3, vec![0u8; 36]).unwrap();
        assert_eq!(data.count(), 3);
        assert_eq!(data.element_size(), 12);
        assert_eq!(data.alignment(), 4);
    }

    #[test]
    fn test_new_rejects_partial_elements() {
        let result = AccessorData::new(ComponentType::F32, ElementShape::Vec3, vec![0u8; 30]);
        match result {
            Err(LayoutError::ShapeMismatch { byte_length, element_size }) => {
                assert_eq!(byte_length, 30);
                assert_eq!(element_size, 12);
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_from_f32_rejects_partial_elements() {
        assert!(AccessorData::from_f32(ElementShape::Vec2, &[1.0, 2.0, 3.0]).is_err());
        let ok = AccessorData::from_f32(ElementShape::Vec2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(ok.count(), 2);
    }

    #[test]
    fn test_typed_constructors() {
        assert_eq!(AccessorData::from_u16(&[0, 1, 2]).data().len(), 6);
        assert_eq!(AccessorData::from_vec2(&[[0.0, 1.0]]).element_size(), 8);
        let mats = AccessorData::from_mat4(&[glam::Mat4::IDENTITY, glam::Mat4::IDENTITY]);
        assert_eq!(mats.count(), 2);
        assert_eq!(mats.element_size(), 64);
        assert_eq!(mats.shape(), ElementShape::Mat4);
    }

    #[test]
    fn test_restrided_pads_each_element() {
        let data = AccessorData::from_vec2(&[[1.0, 2.0], [3.0, 4.0]]);
        let out = data.restrided(12);
        assert_eq!(out.len(), 24);
        assert_eq!(&out[0..8], data.element(0).unwrap());
        assert_eq!(&out[8..12], &[0, 0, 0, 0]);
        assert_eq!(&out[12..20], data.element(1).unwrap());
        assert_eq!(&out[20..24], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_bounds() {
        let data = AccessorData::from_vec3(&[[0.0, -1.0, 2.0], [3.0, 1.0, -2.0]]);
        let (min, max) = data.bounds().unwrap();
        assert_eq!(min, vec![0.0, -1.0, -2.0]);
        assert_eq!(max, vec![3.0, 1.0, 2.0]);

        assert!(AccessorData::from_scalars(&[]).bounds().is_none());
    }
}
