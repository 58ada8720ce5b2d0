//! Mesh arrays: geometry root arrays bound into vertex buffer data.

use strata_core::geometry::{ArrayHandle, ListenerId, VertexAttribute};

use crate::vertex::VertexBufferData;

use super::stream::MeshStream;

/// Handle of a [`MeshArray`] inside its mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshArrayHandle(u32);

impl MeshArrayHandle {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One geometry root array, with its interleaved children, bound into a
/// [`VertexBufferData`].
///
/// While the mesh is built the data lives in a stream buffer and
/// [`data`](Self::data) returns `None`.
#[derive(Debug)]
pub struct MeshArray {
    root: ArrayHandle,
    attributes: Vec<VertexAttribute>,
    data: Option<VertexBufferData>,
    slot: Option<(MeshStream, usize)>,
    listener: ListenerId,
}

impl MeshArray {
    pub(crate) fn new(
        root: ArrayHandle,
        attributes: Vec<VertexAttribute>,
        data: VertexBufferData,
        listener: ListenerId,
    ) -> Self {
        Self {
            root,
            attributes,
            data: Some(data),
            slot: None,
            listener,
        }
    }

    /// Root array in the geometry.
    pub fn root(&self) -> ArrayHandle {
        self.root
    }

    /// Attributes of the root and its children, in chain order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Stream the array was assigned to by the last build.
    pub fn stream(&self) -> Option<MeshStream> {
        self.slot.map(|(stream, _)| stream)
    }

    pub fn data(&self) -> Option<&VertexBufferData> {
        self.data.as_ref()
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    pub(crate) fn take_data(&mut self) -> Option<VertexBufferData> {
        self.data.take()
    }

    /// Record that the data now sits at `index` of `stream`'s buffer.
    pub(crate) fn assign(&mut self, stream: MeshStream, index: usize) {
        self.slot = Some((stream, index));
    }

    pub(crate) fn slot(&self) -> Option<(MeshStream, usize)> {
        self.slot
    }

    /// Take the data back from a stream buffer.
    pub(crate) fn restore(&mut self, data: VertexBufferData) {
        self.data = Some(data);
        self.slot = None;
    }
}

/// Arrays of one mesh, addressed by handle, kept in attach order.
#[derive(Debug, Default)]
pub(crate) struct MeshArrays {
    arrays: Vec<MeshArray>,
}

impl MeshArrays {
    pub fn insert(&mut self, array: MeshArray) -> MeshArrayHandle {
        let handle = MeshArrayHandle(self.arrays.len() as u32);
        self.arrays.push(array);
        handle
    }

    pub fn get(&self, handle: MeshArrayHandle) -> Option<&MeshArray> {
        self.arrays.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: MeshArrayHandle) -> Option<&mut MeshArray> {
        self.arrays.get_mut(handle.index())
    }

    pub fn handles(&self) -> impl Iterator<Item = MeshArrayHandle> {
        (0..self.arrays.len() as u32).map(MeshArrayHandle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MeshArray> {
        self.arrays.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MeshArray> {
        self.arrays.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn clear(&mut self) {
        self.arrays.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strata_core::geometry::{ArrayFormat, Geometry, ListenTarget};

    use super::*;

    fn position_array(geometry: &Geometry, root: ArrayHandle) -> MeshArray {
        let chain = geometry.chain(root);
        let data = VertexBufferData::from_chain(&chain, geometry.vertex_count()).unwrap();
        let listener = geometry.add_listener(ListenTarget::Array(root), Arc::new(data.tracker()));
        MeshArray::new(root, vec![VertexAttribute::Position], data, listener)
    }

    #[test]
    fn test_arrays_keep_attach_order() {
        let mut geometry = Geometry::new();
        let a = geometry
            .add_array(ArrayFormat::float3(VertexAttribute::Position), vec![0; 36])
            .unwrap();
        let b = geometry
            .add_array(ArrayFormat::float3(VertexAttribute::Normal), vec![0; 36])
            .unwrap();

        let mut arrays = MeshArrays::default();
        let first = arrays.insert(position_array(&geometry, a));
        let second = arrays.insert(position_array(&geometry, b));

        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays.handles().collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(arrays.get(second).unwrap().root(), b);
        assert_eq!(geometry.listener_count(), 2);
    }

    #[test]
    fn test_take_and_restore() {
        let mut geometry = Geometry::new();
        let root = geometry
            .add_array(ArrayFormat::float3(VertexAttribute::Position), vec![0; 36])
            .unwrap();
        let mut array = position_array(&geometry, root);

        let data = array.take_data().unwrap();
        array.assign(MeshStream::Geometry, 0);
        assert!(array.data().is_none());
        assert_eq!(array.stream(), Some(MeshStream::Geometry));

        array.restore(data);
        assert!(array.data().is_some());
        assert_eq!(array.stream(), None);
    }
}
