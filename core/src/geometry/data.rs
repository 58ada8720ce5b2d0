//! The [`Geometry`] container.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::attribute::ArrayFormat;
use super::error::GeometryError;
use super::storage::{ArrayListener, ArrayStorage, ListenTarget, ListenerId};
use super::topology::{IndexFormat, PrimitiveTopology};

/// Handle to an array inside one [`Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayHandle(u32);

impl ArrayHandle {
    /// Position of the array in its geometry.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One attribute array of a geometry.
///
/// A root array owns its storage. Child arrays live interleaved in the
/// storage of their root, at `offset` inside every `stride`-byte record.
#[derive(Debug, Clone)]
pub struct GeometryArray {
    format: ArrayFormat,
    storage: Arc<ArrayStorage>,
    offset: usize,
    stride: usize,
    root: Option<ArrayHandle>,
    children: Vec<ArrayHandle>,
}

impl GeometryArray {
    pub fn format(&self) -> &ArrayFormat {
        &self.format
    }

    pub fn storage(&self) -> &Arc<ArrayStorage> {
        &self.storage
    }

    /// Byte offset of this attribute inside each vertex record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes between consecutive vertices.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn is_root(&self) -> bool {
        self.root.is_none()
    }

    /// Root this array is interleaved into, if it is a child.
    pub fn root(&self) -> Option<ArrayHandle> {
        self.root
    }

    pub fn children(&self) -> &[ArrayHandle] {
        &self.children
    }
}

/// Index data of a geometry.
#[derive(Debug, Clone)]
pub struct IndexArray {
    format: IndexFormat,
    count: u32,
    storage: Arc<ArrayStorage>,
}

impl IndexArray {
    pub fn format(&self) -> IndexFormat {
        self.format
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn storage(&self) -> &Arc<ArrayStorage> {
        &self.storage
    }
}

struct Registration {
    id: ListenerId,
    target: ListenTarget,
    listener: Arc<dyn ArrayListener>,
}

/// CPU-side description of a piece of geometry.
///
/// Holds the vertex arrays, an optional index array and the primitive
/// topology. All arrays share one vertex count, fixed by the first array added.
/// Consumers register [`ArrayListener`]s to learn which element ranges change
/// after edits through [`Geometry::update_vertices`] and [`Geometry::update_indices`].
///
/// # Example
///
/// ```ignore
/// let mut geometry = Geometry::new().with_topology(PrimitiveTopology::TriangleList);
/// geometry.add_array_pod(ArrayFormat::float3(VertexAttribute::Position), &positions)?;
/// geometry.add_interleaved(
///     &[
///         ArrayFormat::float3(VertexAttribute::Normal),
///         ArrayFormat::float3(VertexAttribute::Tangent),
///     ],
///     normal_tangent_bytes,
/// )?;
/// geometry.set_indices_u32(&indices)?;
/// let geometry = Arc::new(geometry);
/// ```
pub struct Geometry {
    label: Option<String>,
    topology: PrimitiveTopology,
    vertex_count: Option<u32>,
    arrays: Vec<GeometryArray>,
    indices: Option<IndexArray>,
    listeners: Mutex<Vec<Registration>>,
    next_listener: AtomicU64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

impl Geometry {
    /// Create an empty triangle-list geometry.
    pub fn new() -> Self {
        Self {
            label: None,
            topology: PrimitiveTopology::TriangleList,
            vertex_count: None,
            arrays: Vec::new(),
            indices: None,
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Set the primitive topology.
    #[must_use]
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.topology = topology;
    }

    /// Number of vertices, zero while no array has been added.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count.unwrap_or(0)
    }

    /// Add a tightly packed root array.
    pub fn add_array(
        &mut self,
        format: ArrayFormat,
        data: Vec<u8>,
    ) -> Result<ArrayHandle, GeometryError> {
        let handles = self.add_interleaved(&[format], data)?;
        Ok(handles[0])
    }

    /// Add a tightly packed root array from plain values.
    pub fn add_array_pod<T: bytemuck::Pod>(
        &mut self,
        format: ArrayFormat,
        data: &[T],
    ) -> Result<ArrayHandle, GeometryError> {
        self.add_array(format, bytemuck::cast_slice(data).to_vec())
    }

    /// Add several attributes interleaved in one block of vertex records.
    ///
    /// The first format becomes the root array, the rest become its children.
    /// Returns the handles in the order of `formats`.
    pub fn add_interleaved(
        &mut self,
        formats: &[ArrayFormat],
        data: Vec<u8>,
    ) -> Result<Vec<ArrayHandle>, GeometryError> {
        if formats.is_empty() {
            return Err(GeometryError::EmptyLayout);
        }
        if let Some(bad) = formats.iter().find(|f| !(1..=4).contains(&f.components)) {
            return Err(GeometryError::InvalidComponents(bad.components));
        }

        let stride: usize = formats.iter().map(ArrayFormat::element_size).sum();
        if data.len() % stride != 0 {
            return Err(GeometryError::MisalignedData {
                len: data.len(),
                stride,
            });
        }
        let found = (data.len() / stride) as u32;
        match self.vertex_count {
            Some(expected) if expected != found => {
                log::warn!(
                    "Geometry {:?}: rejecting array with {} vertices, expected {}",
                    self.label,
                    found,
                    expected
                );
                return Err(GeometryError::VertexCountMismatch { expected, found });
            }
            _ => self.vertex_count = Some(found),
        }

        let storage = Arc::new(ArrayStorage::new(data));
        let root = ArrayHandle(self.arrays.len() as u32);
        let mut handles = Vec::with_capacity(formats.len());
        let mut offset = 0;
        for (i, format) in formats.iter().enumerate() {
            let handle = ArrayHandle(self.arrays.len() as u32);
            self.arrays.push(GeometryArray {
                format: *format,
                storage: Arc::clone(&storage),
                offset,
                stride,
                root: (i > 0).then_some(root),
                children: Vec::new(),
            });
            offset += format.element_size();
            handles.push(handle);
        }
        self.arrays[root.index()].children = handles[1..].to_vec();

        log::trace!(
            "Geometry {:?}: added {:?} with {} children ({} vertices)",
            self.label,
            formats[0].attribute,
            formats.len() - 1,
            found
        );
        Ok(handles)
    }

    /// Set the index array.
    pub fn set_indices(&mut self, format: IndexFormat, data: Vec<u8>) -> Result<(), GeometryError> {
        if data.len() % format.size() != 0 {
            return Err(GeometryError::MisalignedData {
                len: data.len(),
                stride: format.size(),
            });
        }
        let count = (data.len() / format.size()) as u32;
        self.indices = Some(IndexArray {
            format,
            count,
            storage: Arc::new(ArrayStorage::new(data)),
        });
        Ok(())
    }

    /// Set 16-bit indices.
    pub fn set_indices_u16(&mut self, indices: &[u16]) -> Result<(), GeometryError> {
        self.set_indices(IndexFormat::Uint16, bytemuck::cast_slice(indices).to_vec())
    }

    /// Set 32-bit indices.
    pub fn set_indices_u32(&mut self, indices: &[u32]) -> Result<(), GeometryError> {
        self.set_indices(IndexFormat::Uint32, bytemuck::cast_slice(indices).to_vec())
    }

    pub fn index_array(&self) -> Option<&IndexArray> {
        self.indices.as_ref()
    }

    pub fn array(&self, handle: ArrayHandle) -> Option<&GeometryArray> {
        self.arrays.get(handle.index())
    }

    /// All arrays, roots and children, in insertion order.
    pub fn arrays(&self) -> impl Iterator<Item = (ArrayHandle, &GeometryArray)> {
        self.arrays
            .iter()
            .enumerate()
            .map(|(i, array)| (ArrayHandle(i as u32), array))
    }

    /// Arrays that are not interleaved into another array.
    pub fn root_arrays(&self) -> impl Iterator<Item = ArrayHandle> + '_ {
        self.arrays()
            .filter(|(_, array)| array.is_root())
            .map(|(handle, _)| handle)
    }

    /// A root followed by its children. Empty if `root` is unknown or a child.
    pub fn chain(&self, root: ArrayHandle) -> Vec<(ArrayHandle, &GeometryArray)> {
        let Some(array) = self.array(root).filter(|a| a.is_root()) else {
            return Vec::new();
        };
        std::iter::once((root, array))
            .chain(
                array
                    .children
                    .iter()
                    .filter_map(|&child| self.array(child).map(|a| (child, a))),
            )
            .collect()
    }

    // ========================================================================
    // Change notification
    // ========================================================================

    /// Register a listener for modified ranges of `target`.
    pub fn add_listener(
        &self,
        target: ListenTarget,
        listener: Arc<dyn ArrayListener>,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Registration {
            id,
            target,
            listener,
        });
        id
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Tell listeners of `target` that `count` elements from `first` changed.
    pub fn notify_modified(&self, target: ListenTarget, first: usize, count: usize) {
        let listeners: Vec<Arc<dyn ArrayListener>> = self
            .listeners
            .lock()
            .iter()
            .filter(|r| r.target == target)
            .map(|r| Arc::clone(&r.listener))
            .collect();
        for listener in listeners {
            listener.array_modified(first, count);
        }
    }

    /// Overwrite whole vertex records of a root array and notify listeners.
    pub fn update_vertices(
        &self,
        root: ArrayHandle,
        first: usize,
        data: &[u8],
    ) -> Result<(), GeometryError> {
        let array = self.array(root).ok_or(GeometryError::UnknownArray(root))?;
        if !array.is_root() {
            return Err(GeometryError::NotRootArray(root));
        }
        if data.len() % array.stride != 0 {
            return Err(GeometryError::MisalignedData {
                len: data.len(),
                stride: array.stride,
            });
        }
        let count = data.len() / array.stride;
        let len = self.vertex_count() as usize;
        if first + count > len {
            return Err(GeometryError::OutOfRange {
                first,
                end: first + count,
                len,
            });
        }
        array.storage.write_at(first * array.stride, data);
        self.notify_modified(ListenTarget::Array(root), first, count);
        Ok(())
    }

    /// Overwrite indices starting at `first` and notify listeners.
    pub fn update_indices(&self, first: usize, data: &[u8]) -> Result<(), GeometryError> {
        let indices = self.indices.as_ref().ok_or(GeometryError::NoIndices)?;
        let size = indices.format.size();
        if data.len() % size != 0 {
            return Err(GeometryError::MisalignedData {
                len: data.len(),
                stride: size,
            });
        }
        let count = data.len() / size;
        let len = indices.count as usize;
        if first + count > len {
            return Err(GeometryError::OutOfRange {
                first,
                end: first + count,
                len,
            });
        }
        indices.storage.write_at(first * size, data);
        self.notify_modified(ListenTarget::Indices, first, count);
        Ok(())
    }
}

impl std::fmt::Debug for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geometry")
            .field("label", &self.label)
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("arrays", &self.arrays.len())
            .field("index_count", &self.indices.as_ref().map(|i| i.count))
            .field("listeners", &self.listener_count())
            .finish()
    }
}
