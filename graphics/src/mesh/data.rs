//! Mesh: geometry partitioned into stream buffers.
//!
//! A [`Mesh`] binds one [`Geometry`] and packs its arrays into up to four
//! stream vertex buffers plus an optional index buffer.
//!
//! # Streams
//!
//! Each root array of the geometry, with the arrays interleaved into it,
//! becomes one [`MeshArray`]. At build time each array is assigned a
//! [`MeshStream`]:
//! - [`BuildMode::IndependentStreams`]: by the attributes of the array
//!   (see [`MeshStream::for_chain`])
//! - [`BuildMode::GlobalStream`]: everything goes to [`MeshStream::Geometry`]
//!
//! Only streams that received an array are built and bound.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use strata_core::geometry::{Geometry, ListenTarget, ListenerId, PrimitiveTopology};

use crate::binding::{ActiveMesh, DrawPath};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::vertex::{IndexBuffer, RenderMode, VertexBuffer, VertexBufferData};

use super::array::{MeshArray, MeshArrayHandle, MeshArrays};
use super::stream::{BuildMode, MeshStream, StreamSet, StreamUsages};

/// Identifies a mesh for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Whether a mesh keeps its geometry alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeometryOwnership {
    /// The mesh holds a strong reference and releases it on clear or drop.
    #[default]
    Owned,
    /// The mesh holds a weak reference; the caller keeps the geometry alive.
    Shared,
}

#[derive(Debug)]
enum GeometryRef {
    Owned(Arc<Geometry>),
    Shared(Weak<Geometry>),
}

impl GeometryRef {
    fn get(&self) -> Option<Arc<Geometry>> {
        match self {
            Self::Owned(geometry) => Some(Arc::clone(geometry)),
            Self::Shared(geometry) => geometry.upgrade(),
        }
    }
}

/// Geometry packed into stream vertex buffers and an optional index buffer.
///
/// # Lifecycle
///
/// 1. Attach geometry once with [`set_geometry`](Self::set_geometry)
/// 2. [`build`](Self::build) the buffers
/// 3. Repeatedly [`bind`](Self::bind) and draw through the device
/// 4. [`clear`](Self::clear) to attach different geometry
///
/// # Example
///
/// ```ignore
/// let mut mesh = Mesh::from_geometry(geometry, GeometryOwnership::Owned)?;
/// mesh.build(&device, BuildMode::IndependentStreams, &StreamUsages::default())?;
///
/// mesh.bind(&mut device)?;
/// device.render_mesh()?;
/// device.unbind_mesh();
/// ```
pub struct Mesh {
    id: MeshId,
    geometry: Option<GeometryRef>,
    label: Option<String>,
    topology: PrimitiveTopology,
    vertex_count: u32,
    arrays: MeshArrays,
    streams: [VertexBuffer; MeshStream::COUNT],
    used: StreamSet,
    index_buffer: Option<IndexBuffer>,
    index_listener: Option<ListenerId>,
    build_mode: Option<BuildMode>,
    render_mode: Option<RenderMode>,
    /// Watched by the device while this mesh is bound.
    token: Arc<()>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            id: MeshId::next(),
            geometry: None,
            label: None,
            topology: PrimitiveTopology::default(),
            vertex_count: 0,
            arrays: MeshArrays::default(),
            streams: Default::default(),
            used: StreamSet::empty(),
            index_buffer: None,
            index_listener: None,
            build_mode: None,
            render_mode: None,
            token: Arc::new(()),
        }
    }

    /// Create a mesh with `geometry` attached.
    pub fn from_geometry(
        geometry: Arc<Geometry>,
        ownership: GeometryOwnership,
    ) -> Result<Self, GraphicsError> {
        let mut mesh = Self::new();
        mesh.set_geometry(geometry, ownership)?;
        Ok(mesh)
    }

    /// Attach `geometry`.
    ///
    /// Each root array becomes a [`MeshArray`] whose data tracks edits made
    /// through the geometry. The index array, if any, feeds the index buffer.
    ///
    /// Fails with [`GraphicsError::DuplicateGeometryAttach`] if geometry is
    /// already attached; the mesh is left untouched.
    pub fn set_geometry(
        &mut self,
        geometry: Arc<Geometry>,
        ownership: GeometryOwnership,
    ) -> Result<(), GraphicsError> {
        if self.geometry.is_some() {
            log::warn!("Mesh {:?}: geometry is already attached", self.id);
            return Err(GraphicsError::DuplicateGeometryAttach);
        }

        let vertex_count = geometry.vertex_count();
        for root in geometry.root_arrays() {
            let chain = geometry.chain(root);
            let Some(data) = VertexBufferData::from_chain(&chain, vertex_count) else {
                continue;
            };
            let attributes = chain
                .iter()
                .map(|(_, array)| array.format().attribute)
                .collect();
            let listener = geometry.add_listener(ListenTarget::Array(root), Arc::new(data.tracker()));
            self.arrays
                .insert(MeshArray::new(root, attributes, data, listener));
        }

        if let Some(indices) = geometry.index_array() {
            let index_buffer = IndexBuffer::from_index_array(indices);
            if let Some(tracker) = index_buffer.tracker() {
                self.index_listener =
                    Some(geometry.add_listener(ListenTarget::Indices, Arc::new(tracker)));
            }
            self.index_buffer = Some(index_buffer);
        }

        self.vertex_count = vertex_count;
        self.topology = geometry.topology();
        self.label = geometry.label().map(str::to_string);
        log::debug!(
            "Mesh {:?}: attached geometry {:?} ({} arrays, {} vertices, indexed: {})",
            self.id,
            self.label,
            self.arrays.len(),
            vertex_count,
            self.index_buffer.is_some()
        );

        self.geometry = Some(match ownership {
            GeometryOwnership::Owned => GeometryRef::Owned(geometry),
            GeometryOwnership::Shared => GeometryRef::Shared(Arc::downgrade(&geometry)),
        });
        Ok(())
    }

    /// Detach the geometry and release every buffer.
    ///
    /// Listeners registered with the geometry are removed. Geometry may be
    /// attached again afterwards. A device this mesh was bound to stops
    /// drawing it.
    pub fn clear(&mut self) {
        self.token = Arc::new(());
        self.unregister_listeners();
        self.geometry = None;
        self.arrays.clear();
        self.streams = Default::default();
        self.used = StreamSet::empty();
        self.index_buffer = None;
        self.build_mode = None;
        self.render_mode = None;
        self.vertex_count = 0;
        self.label = None;
        self.topology = PrimitiveTopology::default();
    }

    /// Unbind the mesh from `device` if it is bound there, then [`clear`](Self::clear).
    pub fn release(&mut self, device: &mut GraphicsDevice) {
        device.forget_mesh(self.id);
        self.clear();
    }

    fn unregister_listeners(&mut self) {
        let Some(geometry) = self.geometry.as_ref().and_then(GeometryRef::get) else {
            self.index_listener = None;
            return;
        };
        for array in self.arrays.iter() {
            geometry.remove_listener(array.listener());
        }
        if let Some(listener) = self.index_listener.take() {
            geometry.remove_listener(listener);
        }
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build in independent-stream mode with the device's configured usages
    /// and preferred render mode.
    pub fn auto_build(&mut self, device: &GraphicsDevice) -> Result<(), GraphicsError> {
        let usages = device.config().stream_usages();
        self.build(device, BuildMode::IndependentStreams, &usages)
    }

    /// Build in the device's preferred render mode.
    pub fn build(
        &mut self,
        device: &GraphicsDevice,
        build_mode: BuildMode,
        usages: &StreamUsages,
    ) -> Result<(), GraphicsError> {
        let requested = device.config().render.preferred_mode;
        self.build_with(device, build_mode, usages, requested)
    }

    /// Assign arrays to streams and build every used stream and the index
    /// buffer.
    ///
    /// `requested` is lowered to the best mode the device supports, and that
    /// mode is used for every buffer of the mesh. On failure everything built
    /// so far is released and the mesh can be built again.
    pub fn build_with(
        &mut self,
        device: &GraphicsDevice,
        build_mode: BuildMode,
        usages: &StreamUsages,
        requested: RenderMode,
    ) -> Result<(), GraphicsError> {
        if self.is_built() {
            return Err(GraphicsError::AlreadyBuilt);
        }
        let mode = device.select_render_mode(requested);

        self.assign_streams(build_mode)?;
        if let Err(e) = self.build_buffers(device, usages, mode) {
            log::error!("Mesh {:?}: build failed: {}", self.id, e);
            self.unassign_streams();
            return Err(e);
        }

        self.build_mode = Some(build_mode);
        self.render_mode = Some(mode);
        log::debug!(
            "Mesh {:?}: built {:?} streams {:?}, {:?}, indexed: {}",
            self.id,
            build_mode,
            self.used,
            mode,
            self.index_buffer.is_some()
        );
        Ok(())
    }

    fn assign_streams(&mut self, build_mode: BuildMode) -> Result<(), GraphicsError> {
        for stream in &mut self.streams {
            stream.set_vertex_count(self.vertex_count)?;
        }

        let handles: Vec<MeshArrayHandle> = self.arrays.handles().collect();
        for handle in handles {
            let Some(array) = self.arrays.get_mut(handle) else {
                continue;
            };
            let stream = match build_mode {
                BuildMode::IndependentStreams => {
                    MeshStream::for_chain(array.attributes().iter().copied())
                }
                BuildMode::GlobalStream => MeshStream::Geometry,
            };
            let Some(data) = array.take_data() else {
                continue;
            };

            let buffer = &mut self.streams[stream.index()];
            if let Err(e) = buffer.accepts(&data) {
                log::warn!("Mesh {:?}: array rejected by {:?}: {}", self.id, stream, e);
                array.restore(data);
                self.unassign_streams();
                return Err(e);
            }
            let index = buffer.data().len();
            buffer.add_data(data)?;
            array.assign(stream, index);
            self.used |= stream.flag();
        }
        Ok(())
    }

    /// Move data back from the stream buffers into their arrays.
    fn unassign_streams(&mut self) {
        for stream in MeshStream::ALL {
            let entries = self.streams[stream.index()].take_data();
            for (index, data) in entries.into_iter().enumerate() {
                if let Some(array) = self
                    .arrays
                    .iter_mut()
                    .find(|a| a.slot() == Some((stream, index)))
                {
                    array.restore(data);
                }
            }
        }
        if let Some(index_buffer) = &mut self.index_buffer {
            index_buffer.release();
        }
        self.used = StreamSet::empty();
    }

    fn build_buffers(
        &mut self,
        device: &GraphicsDevice,
        usages: &StreamUsages,
        mode: RenderMode,
    ) -> Result<(), GraphicsError> {
        for stream in self.used.streams() {
            self.streams[stream.index()].build(device, usages.stream(stream), mode)?;
        }
        if let Some(index_buffer) = &mut self.index_buffer {
            index_buffer.build(device, usages.indices, mode)?;
        }
        Ok(())
    }

    /// Switch every buffer of the mesh to `mode`.
    ///
    /// Either all buffers switch or none do.
    pub fn set_render_mode(&mut self, mode: RenderMode) -> Result<(), GraphicsError> {
        let current = self.render_mode.ok_or(GraphicsError::NotBuilt)?;
        let build_mode = self
            .used
            .streams()
            .find_map(|s| self.streams[s.index()].build_mode())
            .or_else(|| self.index_buffer.as_ref().and_then(IndexBuffer::build_mode))
            .unwrap_or(current);
        if !RenderMode::can_switch(build_mode, mode) {
            log::warn!(
                "Mesh {:?}: cannot use {:?} on a mesh built as {:?}",
                self.id,
                mode,
                build_mode
            );
            return Err(GraphicsError::InvalidModeTransition {
                from: current,
                to: mode,
            });
        }
        for stream in self.used.streams() {
            self.streams[stream.index()].set_render_mode(mode)?;
        }
        if let Some(index_buffer) = &mut self.index_buffer {
            index_buffer.set_render_mode(mode)?;
        }
        self.render_mode = Some(mode);
        Ok(())
    }

    /// Upload ranges modified through the geometry since the last update.
    /// Returns the number of uploads.
    pub fn update(&self) -> usize {
        let streams: usize = self
            .used
            .streams()
            .map(|s| self.streams[s.index()].update())
            .sum();
        streams + self.index_buffer.as_ref().map_or(0, IndexBuffer::update)
    }

    // ========================================================================
    // Use
    // ========================================================================

    /// Bind the mesh for drawing.
    ///
    /// Binds every stream that is both used by this mesh and enabled on the
    /// device, then the index buffer, and selects the indexed draw path if
    /// there is one.
    pub fn bind(&self, device: &mut GraphicsDevice) -> Result<(), GraphicsError> {
        if !self.is_built() {
            return Err(GraphicsError::NotBuilt);
        }
        device.bindings_mut().clear_buffers();

        let enabled = device.enabled_streams();
        for stream in (self.used & enabled).streams() {
            self.streams[stream.index()].bind(device)?;
        }
        let draw_path = match &self.index_buffer {
            Some(index_buffer) => {
                index_buffer.bind(device)?;
                DrawPath::Indexed
            }
            None => DrawPath::Arrays,
        };

        device.bindings_mut().set_mesh(Some(ActiveMesh {
            id: self.id,
            topology: self.topology,
            draw_path,
            token: Arc::downgrade(&self.token),
        }));
        log::trace!("Mesh {:?}: bound ({:?})", self.id, draw_path);
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// The attached geometry, if it is still alive.
    pub fn geometry(&self) -> Option<Arc<Geometry>> {
        self.geometry.as_ref().and_then(GeometryRef::get)
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn arrays(&self) -> impl Iterator<Item = &MeshArray> {
        self.arrays.iter()
    }

    pub fn array(&self, handle: MeshArrayHandle) -> Option<&MeshArray> {
        self.arrays.get(handle)
    }

    pub fn is_built(&self) -> bool {
        self.build_mode.is_some()
    }

    pub fn build_mode(&self) -> Option<BuildMode> {
        self.build_mode
    }

    pub fn render_mode(&self) -> Option<RenderMode> {
        self.render_mode
    }

    /// Streams that received at least one array.
    pub fn used_streams(&self) -> StreamSet {
        self.used
    }

    pub fn is_stream_used(&self, stream: MeshStream) -> bool {
        self.used.contains(stream.flag())
    }

    /// Number of stream buffers that were built.
    pub fn built_stream_count(&self) -> usize {
        self.streams.iter().filter(|s| s.is_built()).count()
    }

    pub fn stream(&self, stream: MeshStream) -> &VertexBuffer {
        &self.streams[stream.index()]
    }

    pub fn uses_index_buffer(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn index_buffer(&self) -> Option<&IndexBuffer> {
        self.index_buffer.as_ref()
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.unregister_listeners();
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("arrays", &self.arrays.len())
            .field("used", &self.used)
            .field("indexed", &self.index_buffer.is_some())
            .field("build_mode", &self.build_mode)
            .field("render_mode", &self.render_mode)
            .finish()
    }
}
