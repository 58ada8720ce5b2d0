//! Vertex buffer data: one region of attribute data inside a vertex buffer.

use std::sync::Arc;

use strata_core::geometry::{ArrayFormat, ArrayHandle, ArrayStorage, GeometryArray};

use crate::backend::{AttributeSource, GpuBackend, GpuSequence, VertexAttributeBinding};
use crate::resources::{BufferData, ModifiedTracker};

use super::buffer::VertexBufferId;
use super::mode::RenderMode;

/// How an attribute pointer addresses its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayAddress {
    /// Offset into the host storage of the region.
    Client(u64),
    /// Offset into the GPU buffer holding the region.
    Buffer(u64),
}

/// One attribute inside a [`VertexBufferData`] region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexArray {
    format: ArrayFormat,
    offset: u64,
    stride: u32,
    address: ArrayAddress,
}

impl VertexArray {
    pub fn format(&self) -> &ArrayFormat {
        &self.format
    }

    /// Byte offset of the attribute inside each vertex record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Address the attribute pointer currently uses.
    pub fn address(&self) -> ArrayAddress {
        self.address
    }
}

/// A region of vertex records and the attributes interleaved in it.
///
/// Belongs to at most one [`VertexBuffer`](super::VertexBuffer) at a time;
/// adding it to a buffer moves it there.
#[derive(Debug)]
pub struct VertexBufferData {
    data: BufferData,
    arrays: Vec<VertexArray>,
    vertex_count: u32,
    owner: Option<VertexBufferId>,
    pub(crate) sequence: Option<GpuSequence>,
}

impl VertexBufferData {
    /// Create data over `storage` holding `vertex_count` records.
    pub fn new(storage: Arc<ArrayStorage>, vertex_count: u32) -> Self {
        Self {
            data: BufferData::new(storage),
            arrays: Vec::new(),
            vertex_count,
            owner: None,
            sequence: None,
        }
    }

    /// Create data for a root geometry array and its interleaved children.
    ///
    /// Returns `None` for an empty chain.
    pub fn from_chain(chain: &[(ArrayHandle, &GeometryArray)], vertex_count: u32) -> Option<Self> {
        let (_, root) = chain.first()?;
        let mut data = Self::new(Arc::clone(root.storage()), vertex_count);
        for (_, array) in chain {
            data.add_array(*array.format(), array.offset() as u64, array.stride() as u32);
        }
        Some(data)
    }

    /// Describe one more attribute stored in this region.
    pub fn add_array(&mut self, format: ArrayFormat, offset: u64, stride: u32) {
        self.arrays.push(VertexArray {
            format,
            offset,
            stride,
            address: ArrayAddress::Client(offset),
        });
    }

    pub fn arrays(&self) -> &[VertexArray] {
        &self.arrays
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Bytes per vertex record, the unit of modified ranges.
    pub fn element_size(&self) -> u64 {
        self.arrays
            .first()
            .map(|a| match a.stride {
                0 => a.format.element_size() as u64,
                stride => stride as u64,
            })
            .unwrap_or(1)
    }

    pub fn buffer_data(&self) -> &BufferData {
        &self.data
    }

    /// Vertex buffer this data currently belongs to.
    pub fn owner(&self) -> Option<VertexBufferId> {
        self.owner
    }

    /// Whether a bind sequence was captured for this data.
    pub fn has_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    /// Mark `count` vertices starting at `first` as modified.
    ///
    /// The range is converted to bytes and waits for the next
    /// [`VertexBuffer::update`](super::VertexBuffer::update).
    pub fn modified(&self, first: usize, count: usize) {
        self.tracker().mark_elements(first, count);
    }

    /// Tracker for registering with the geometry that owns the storage.
    pub fn tracker(&self) -> ModifiedTracker {
        self.data.tracker(self.element_size())
    }

    pub(crate) fn attach(&mut self, owner: VertexBufferId, first: u64) {
        self.owner = Some(owner);
        self.data.set_first(first);
    }

    pub(crate) fn detach(&mut self) {
        self.owner = None;
        self.sequence = None;
        self.data.set_first(0);
    }

    /// Recompute attribute addresses for `mode`.
    pub(crate) fn set_addressing(&mut self, mode: RenderMode) {
        let first = self.data.first();
        for array in &mut self.arrays {
            array.address = if mode.requires_buffer_object() {
                ArrayAddress::Buffer(first + array.offset)
            } else {
                ArrayAddress::Client(array.offset)
            };
        }
    }

    /// Issue one attribute pointer per array.
    pub(crate) fn bind_arrays(&self, backend: &dyn GpuBackend) {
        let bytes = self.data.storage().read();
        for array in &self.arrays {
            let source = match array.address {
                ArrayAddress::Client(offset) => {
                    AttributeSource::Client(bytes.get(offset as usize..).unwrap_or(&[]))
                }
                ArrayAddress::Buffer(offset) => AttributeSource::Buffer(offset),
            };
            backend.set_vertex_attribute(&VertexAttributeBinding {
                format: array.format,
                stride: array.stride,
                source,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_core::geometry::{Geometry, VertexAttribute};

    use super::*;

    fn normal_tangent_geometry() -> (Geometry, ArrayHandle) {
        let mut geometry = Geometry::new();
        let handles = geometry
            .add_interleaved(
                &[
                    ArrayFormat::float3(VertexAttribute::Normal),
                    ArrayFormat::float3(VertexAttribute::Tangent),
                ],
                vec![0; 24 * 4],
            )
            .unwrap();
        (geometry, handles[0])
    }

    #[test]
    fn test_from_chain_describes_interleaved_arrays() {
        let (geometry, root) = normal_tangent_geometry();
        let data = VertexBufferData::from_chain(&geometry.chain(root), 4).unwrap();

        assert_eq!(data.arrays().len(), 2);
        assert_eq!(data.arrays()[1].offset(), 12);
        assert_eq!(data.element_size(), 24);
        assert_eq!(data.buffer_data().size(), 96);
        assert!(data.owner().is_none());
    }

    #[test]
    fn test_from_empty_chain() {
        assert!(VertexBufferData::from_chain(&[], 4).is_none());
    }

    #[test]
    fn test_modified_uses_vertex_size() {
        let (geometry, root) = normal_tangent_geometry();
        let data = VertexBufferData::from_chain(&geometry.chain(root), 4).unwrap();
        data.modified(1, 2);
        assert_eq!(data.buffer_data().modified().get(), Some(24..72));
    }

    #[test]
    fn test_addressing_follows_mode() {
        let (geometry, root) = normal_tangent_geometry();
        let mut data = VertexBufferData::from_chain(&geometry.chain(root), 4).unwrap();
        data.data.set_first(100);

        data.set_addressing(RenderMode::VertexBufferObject);
        assert_eq!(data.arrays()[1].address(), ArrayAddress::Buffer(112));

        data.set_addressing(RenderMode::VertexArray);
        assert_eq!(data.arrays()[1].address(), ArrayAddress::Client(12));
    }
}
