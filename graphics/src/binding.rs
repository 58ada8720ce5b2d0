//! Binding context: what the next draw call operates on.
//!
//! A [`GraphicsDevice`](crate::GraphicsDevice) holds one [`BindingState`].
//! Binding a vertex buffer, index buffer or mesh replaces the previous one.

use std::sync::{Arc, Weak};

use strata_core::geometry::{ArrayStorage, IndexFormat, PrimitiveTopology};

use crate::mesh::{MeshId, MeshStream, StreamSet};
use crate::vertex::{IndexBufferId, VertexBufferId};

/// The active vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveVertexBuffer {
    pub id: VertexBufferId,
    pub vertex_count: u32,
}

/// Where the active index buffer keeps its indices.
#[derive(Debug, Clone)]
pub enum IndexBinding {
    /// Host memory, read at draw time.
    Client(Arc<ArrayStorage>),
    /// The buffer bound to the element array target.
    Buffer,
}

/// The active index buffer.
#[derive(Debug, Clone)]
pub struct ActiveIndexBuffer {
    pub id: IndexBufferId,
    pub format: IndexFormat,
    pub count: u32,
    pub binding: IndexBinding,
}

/// Draw call pair a bound mesh uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPath {
    /// Non-indexed, counting the active vertex buffer.
    Arrays,
    /// Indexed, counting the active index buffer.
    Indexed,
}

/// The bound mesh.
///
/// Holds a weak handle to the mesh's binding token. Once the mesh is
/// cleared or dropped the slot reads as empty, along with the buffer
/// slots it filled.
#[derive(Debug, Clone)]
pub struct ActiveMesh {
    pub id: MeshId,
    pub topology: PrimitiveTopology,
    pub draw_path: DrawPath,
    pub(crate) token: Weak<()>,
}

impl ActiveMesh {
    /// Whether the mesh still holds the buffers it bound.
    pub fn is_alive(&self) -> bool {
        self.token.strong_count() > 0
    }
}

/// Current bindings plus the global stream switches.
#[derive(Debug, Clone)]
pub struct BindingState {
    vertex_buffer: Option<ActiveVertexBuffer>,
    index_buffer: Option<ActiveIndexBuffer>,
    mesh: Option<ActiveMesh>,
    material_active: bool,
    enabled_streams: StreamSet,
}

impl Default for BindingState {
    fn default() -> Self {
        Self::new(StreamSet::all())
    }
}

impl BindingState {
    pub fn new(enabled_streams: StreamSet) -> Self {
        Self {
            vertex_buffer: None,
            index_buffer: None,
            mesh: None,
            material_active: false,
            enabled_streams,
        }
    }

    /// A bound mesh that has since been cleared or dropped.
    fn mesh_is_stale(&self) -> bool {
        self.mesh.as_ref().is_some_and(|m| !m.is_alive())
    }

    pub fn vertex_buffer(&self) -> Option<&ActiveVertexBuffer> {
        if self.mesh_is_stale() {
            return None;
        }
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&ActiveIndexBuffer> {
        if self.mesh_is_stale() {
            return None;
        }
        self.index_buffer.as_ref()
    }

    /// The bound mesh, if it is still alive.
    pub fn mesh(&self) -> Option<&ActiveMesh> {
        self.mesh.as_ref().filter(|m| m.is_alive())
    }

    pub fn material_active(&self) -> bool {
        self.material_active
    }

    pub fn enabled_streams(&self) -> StreamSet {
        self.enabled_streams
    }

    pub fn is_stream_enabled(&self, stream: MeshStream) -> bool {
        self.enabled_streams.contains(stream.flag())
    }

    pub(crate) fn set_vertex_buffer(&mut self, active: Option<ActiveVertexBuffer>) {
        self.drop_stale_mesh();
        self.vertex_buffer = active;
    }

    pub(crate) fn set_index_buffer(&mut self, active: Option<ActiveIndexBuffer>) {
        self.drop_stale_mesh();
        self.index_buffer = active;
    }

    fn drop_stale_mesh(&mut self) {
        if self.mesh_is_stale() {
            self.mesh = None;
            self.clear_buffers();
        }
    }

    pub(crate) fn set_mesh(&mut self, active: Option<ActiveMesh>) {
        self.mesh = active;
    }

    pub(crate) fn set_material_active(&mut self, active: bool) {
        self.material_active = active;
    }

    pub(crate) fn set_stream_enabled(&mut self, stream: MeshStream, enabled: bool) {
        self.enabled_streams.set(stream.flag(), enabled);
    }

    /// Forget the active vertex and index buffers.
    pub(crate) fn clear_buffers(&mut self) {
        self.vertex_buffer = None;
        self.index_buffer = None;
    }

    /// Forget `id` and the buffers it bound, if it is the bound mesh.
    pub(crate) fn forget_mesh(&mut self, id: MeshId) -> bool {
        if self.mesh.as_ref().map(|m| m.id) != Some(id) {
            return false;
        }
        self.mesh = None;
        self.clear_buffers();
        true
    }
}
