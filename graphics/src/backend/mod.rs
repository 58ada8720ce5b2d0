//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the fixed-function
//! era calls the resource layer issues: buffer objects, vertex attribute
//! pointers, captured bind sequences (vertex array objects) and draw calls.
//!
//! # Available Backends
//!
//! - `dummy` (default): Records every call without touching a GPU, for
//!   testing and headless use
//!
//! # Architecture
//!
//! Each backend implements the [`GpuBackend`] trait. GPU objects handed out
//! by a backend are wrapped in [`GpuBuffer`] and [`GpuSequence`], which delete
//! the object through the backend when dropped.

#[cfg(feature = "dummy")]
pub mod dummy;

use std::sync::Arc;

use strata_core::geometry::{ArrayFormat, IndexFormat, PrimitiveTopology};

use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::materials::{Material, PointSprite};
use crate::types::{BufferTarget, BufferUsage};

#[cfg(feature = "dummy")]
pub use dummy::{BackendCall, DummyBackend, RecordedSource};

/// Backend name of a GPU buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuBufferId(u64);

impl GpuBufferId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Backend name of a captured bind sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceId(u64);

impl SequenceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Where a vertex attribute reads its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSource<'a> {
    /// Host memory, starting at the first element of the attribute.
    Client(&'a [u8]),
    /// Byte offset into the buffer bound to [`BufferTarget::Array`].
    Buffer(u64),
}

/// One vertex attribute pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributeBinding<'a> {
    pub format: ArrayFormat,
    /// Bytes between consecutive vertices.
    pub stride: u32,
    pub source: AttributeSource<'a>,
}

/// Where indexed draws read their indices from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSource<'a> {
    /// Host memory.
    Client(&'a [u8]),
    /// Byte offset into the buffer bound to [`BufferTarget::ElementArray`].
    Buffer(u64),
}

/// Trait for GPU backend implementations.
///
/// All calls come from the thread that owns the graphics context. The
/// trait is `Send + Sync` so resources can hold the backend in an `Arc`.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Query what the host supports. Called once per device.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Allocate a buffer object of `size` bytes.
    fn create_buffer(
        &self,
        target: BufferTarget,
        size: u64,
        usage: BufferUsage,
    ) -> Result<GpuBufferId, GraphicsError>;

    /// Write data to a buffer.
    fn upload_buffer(&self, buffer: GpuBufferId, offset: u64, data: &[u8]);

    /// Release a buffer object.
    fn delete_buffer(&self, buffer: GpuBufferId);

    /// Bind a buffer to `target`, or unbind with `None`.
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<GpuBufferId>);

    /// Set and enable one vertex attribute pointer.
    fn set_vertex_attribute(&self, binding: &VertexAttributeBinding<'_>);

    /// Disable every enabled vertex attribute pointer.
    fn disable_vertex_attributes(&self);

    /// Start capturing bind calls into a new sequence.
    fn begin_sequence(&self) -> Result<SequenceId, GraphicsError>;

    /// Stop capturing.
    fn end_sequence(&self);

    /// Replay a captured sequence.
    fn call_sequence(&self, sequence: SequenceId);

    /// Release a captured sequence.
    fn delete_sequence(&self, sequence: SequenceId);

    /// Draw `count` vertices starting at `first`, `instances` times.
    fn draw_arrays(&self, topology: PrimitiveTopology, first: u32, count: u32, instances: u32);

    /// Draw `count` indices, `instances` times.
    fn draw_elements(
        &self,
        topology: PrimitiveTopology,
        format: IndexFormat,
        count: u32,
        source: IndexSource<'_>,
        instances: u32,
    );

    /// Apply point sprite state, or restore defaults with `None`.
    fn apply_point_sprite(&self, sprite: Option<&PointSprite>);

    /// Apply material colors and blending, or restore defaults with `None`.
    fn apply_material(&self, material: Option<&Material>);
}

/// Owned GPU buffer object, deleted on drop.
pub struct GpuBuffer {
    backend: Arc<dyn GpuBackend>,
    id: GpuBufferId,
    size: u64,
}

impl GpuBuffer {
    pub(crate) fn new(backend: Arc<dyn GpuBackend>, id: GpuBufferId, size: u64) -> Self {
        Self { backend, id, size }
    }

    pub fn id(&self) -> GpuBufferId {
        self.id
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn backend(&self) -> &dyn GpuBackend {
        self.backend.as_ref()
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.backend.delete_buffer(self.id);
    }
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("backend", &self.backend.name())
            .field("id", &self.id)
            .field("size", &self.size)
            .finish()
    }
}

/// Owned captured bind sequence, deleted on drop.
pub struct GpuSequence {
    backend: Arc<dyn GpuBackend>,
    id: SequenceId,
}

impl GpuSequence {
    pub(crate) fn new(backend: Arc<dyn GpuBackend>, id: SequenceId) -> Self {
        Self { backend, id }
    }

    pub fn id(&self) -> SequenceId {
        self.id
    }
}

impl Drop for GpuSequence {
    fn drop(&mut self) {
        self.backend.delete_sequence(self.id);
    }
}

impl std::fmt::Debug for GpuSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuSequence")
            .field("backend", &self.backend.name())
            .field("id", &self.id)
            .finish()
    }
}

/// Selects and creates the appropriate backend based on available features.
#[cfg(feature = "dummy")]
pub fn create_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    log::info!("Using dummy backend");
    Ok(Arc::new(dummy::DummyBackend::new()))
}
