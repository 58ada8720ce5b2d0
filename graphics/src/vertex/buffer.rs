//! Vertex buffers and their per-mode use strategies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::{GpuBackend, GpuSequence};
use crate::binding::ActiveVertexBuffer;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Buffer;
use crate::types::{BufferTarget, BufferUsage};

use super::data::VertexBufferData;
use super::mode::RenderMode;

/// Identifies a vertex buffer for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferId(u64);

impl VertexBufferId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

type UseFn = fn(&VertexBuffer, &dyn GpuBackend);

/// Use strategy for each [`RenderMode`], indexed by mode.
const USE_STRATEGIES: [UseFn; 4] = [
    use_client_arrays,
    use_buffer_object,
    use_vertex_array_objects,
    use_unified_vertex_array_object,
];

fn use_client_arrays(vb: &VertexBuffer, backend: &dyn GpuBackend) {
    backend.bind_buffer(BufferTarget::Array, None);
    for data in &vb.data {
        data.bind_arrays(backend);
    }
}

fn use_buffer_object(vb: &VertexBuffer, backend: &dyn GpuBackend) {
    vb.buffer.bind(backend);
    for data in &vb.data {
        data.bind_arrays(backend);
    }
}

fn use_vertex_array_objects(vb: &VertexBuffer, backend: &dyn GpuBackend) {
    vb.buffer.bind(backend);
    for data in &vb.data {
        if let Some(sequence) = &data.sequence {
            backend.call_sequence(sequence.id());
        }
    }
}

fn use_unified_vertex_array_object(vb: &VertexBuffer, backend: &dyn GpuBackend) {
    if let Some(sequence) = vb.data.first().and_then(|d| d.sequence.as_ref()) {
        backend.call_sequence(sequence.id());
    }
}

/// An ordered set of [`VertexBufferData`] sharing one GPU buffer.
///
/// A vertex buffer is built once in a [`RenderMode`]. The mode selects the
/// strategy [`bind`](Self::bind) runs. After the build, the buffer may be
/// switched to any mode its build mode is compatible with
/// (see [`RenderMode::can_switch`]).
///
/// # Example
///
/// ```ignore
/// let mut vb = VertexBuffer::new();
/// vb.add_data(VertexBufferData::from_chain(&geometry.chain(root), count).unwrap())?;
/// vb.build(&device, BufferUsage::StaticDraw, RenderMode::VertexBufferObject)?;
///
/// vb.bind(&mut device)?;
/// device.draw_arrays(PrimitiveTopology::TriangleList)?;
/// ```
pub struct VertexBuffer {
    id: VertexBufferId,
    buffer: Buffer,
    data: Vec<VertexBufferData>,
    vertex_count: Option<u32>,
    build_mode: Option<RenderMode>,
    render_mode: RenderMode,
    use_fn: UseFn,
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexBuffer {
    /// Create an empty, unbuilt vertex buffer.
    pub fn new() -> Self {
        Self {
            id: VertexBufferId::next(),
            buffer: Buffer::new(BufferTarget::Array),
            data: Vec::new(),
            vertex_count: None,
            build_mode: None,
            render_mode: RenderMode::VertexArray,
            use_fn: USE_STRATEGIES[RenderMode::VertexArray.index()],
        }
    }

    pub fn id(&self) -> VertexBufferId {
        self.id
    }

    /// Vertex count shared by all data, zero while unset.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count.unwrap_or(0)
    }

    /// Set the vertex count. Fails if attached data disagrees.
    pub fn set_vertex_count(&mut self, count: u32) -> Result<(), GraphicsError> {
        if let Some(data) = self.data.iter().find(|d| d.vertex_count() != count) {
            log::warn!(
                "VertexBuffer {:?}: vertex count {} disagrees with attached data ({})",
                self.id,
                count,
                data.vertex_count()
            );
            return Err(GraphicsError::VertexCountMismatch {
                expected: count,
                found: data.vertex_count(),
            });
        }
        self.vertex_count = Some(count);
        Ok(())
    }

    pub fn data(&self) -> &[VertexBufferData] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn is_built(&self) -> bool {
        self.build_mode.is_some()
    }

    /// Mode the buffer was built in.
    pub fn build_mode(&self) -> Option<RenderMode> {
        self.build_mode
    }

    /// Mode [`bind`](Self::bind) currently uses.
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Check that `data` could be added without changing anything.
    pub fn accepts(&self, data: &VertexBufferData) -> Result<(), GraphicsError> {
        if self.is_built() {
            return Err(GraphicsError::AlreadyBuilt);
        }
        match self.vertex_count {
            Some(expected) if expected != data.vertex_count() => {
                Err(GraphicsError::VertexCountMismatch {
                    expected,
                    found: data.vertex_count(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Append data. The first data added fixes the vertex count.
    ///
    /// Rejected data is dropped; use [`accepts`](Self::accepts) first to keep it.
    pub fn add_data(&mut self, mut data: VertexBufferData) -> Result<(), GraphicsError> {
        self.accepts(&data).inspect_err(|e| {
            log::warn!("VertexBuffer {:?}: rejecting data: {}", self.id, e);
        })?;
        self.vertex_count.get_or_insert(data.vertex_count());
        let first = self.buffer.reserve(data.buffer_data().size());
        data.attach(self.id, first);
        self.data.push(data);
        Ok(())
    }

    /// Remove and return the data at `index` from an unbuilt buffer.
    pub fn remove_data(&mut self, index: usize) -> Result<VertexBufferData, GraphicsError> {
        if self.is_built() {
            return Err(GraphicsError::AlreadyBuilt);
        }
        if index >= self.data.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "data index {} out of range for {} entries",
                index,
                self.data.len()
            )));
        }
        let mut removed = self.data.remove(index);
        removed.detach();
        self.relayout();
        Ok(removed)
    }

    /// Release GPU objects and hand back every data entry, detached.
    pub fn take_data(&mut self) -> Vec<VertexBufferData> {
        self.release();
        self.buffer.reset_layout();
        self.vertex_count = None;
        let mut data = std::mem::take(&mut self.data);
        for entry in &mut data {
            entry.detach();
        }
        data
    }

    fn relayout(&mut self) {
        self.buffer.reset_layout();
        for data in &mut self.data {
            let first = self.buffer.reserve(data.buffer_data().size());
            data.attach(self.id, first);
        }
    }

    /// Build the buffer in `mode`.
    ///
    /// Fails with [`GraphicsError::UnsupportedRenderMode`] if the device
    /// cannot render in `mode`; nothing changes in that case.
    pub fn build(
        &mut self,
        device: &GraphicsDevice,
        usage: BufferUsage,
        mode: RenderMode,
    ) -> Result<(), GraphicsError> {
        if !device.supports_render_mode(mode) {
            log::warn!(
                "VertexBuffer {:?}: {:?} is not supported by this device",
                self.id,
                mode
            );
            return Err(GraphicsError::UnsupportedRenderMode(mode));
        }
        self.build_with(device.backend(), usage, mode)
    }

    pub(crate) fn build_with(
        &mut self,
        backend: &Arc<dyn GpuBackend>,
        usage: BufferUsage,
        mode: RenderMode,
    ) -> Result<(), GraphicsError> {
        if self.is_built() {
            return Err(GraphicsError::AlreadyBuilt);
        }
        if mode.requires_buffer_object() {
            self.buffer
                .build(backend, usage, self.data.iter().map(|d| d.buffer_data()))?;
        }
        self.build_mode = Some(mode);
        self.apply_render_mode(mode);

        let captured = match mode {
            RenderMode::VertexArrayObject => self.capture_sequences(backend),
            RenderMode::UnifiedVertexArrayObject => self.capture_unified_sequence(backend),
            _ => Ok(()),
        };
        if let Err(e) = captured {
            log::error!("VertexBuffer {:?}: sequence capture failed: {}", self.id, e);
            self.release();
            return Err(e);
        }

        log::debug!(
            "VertexBuffer {:?}: built {} data entries, {} vertices, {:?}",
            self.id,
            self.data.len(),
            self.vertex_count(),
            mode
        );
        Ok(())
    }

    fn capture_sequences(&mut self, backend: &Arc<dyn GpuBackend>) -> Result<(), GraphicsError> {
        for data in &mut self.data {
            let id = backend.begin_sequence()?;
            data.bind_arrays(backend.as_ref());
            backend.end_sequence();
            data.sequence = Some(GpuSequence::new(Arc::clone(backend), id));
        }
        Ok(())
    }

    fn capture_unified_sequence(
        &mut self,
        backend: &Arc<dyn GpuBackend>,
    ) -> Result<(), GraphicsError> {
        if self.data.is_empty() {
            log::debug!("VertexBuffer {:?}: no data to capture", self.id);
            return Ok(());
        }
        let id = backend.begin_sequence()?;
        self.buffer.bind(backend.as_ref());
        for data in &self.data {
            data.bind_arrays(backend.as_ref());
        }
        backend.end_sequence();
        self.data[0].sequence = Some(GpuSequence::new(Arc::clone(backend), id));
        Ok(())
    }

    /// Switch the mode used by [`bind`](Self::bind).
    ///
    /// An incompatible mode is logged and reported; the current mode stays.
    pub fn set_render_mode(&mut self, mode: RenderMode) -> Result<(), GraphicsError> {
        let build_mode = self.build_mode.ok_or(GraphicsError::NotBuilt)?;
        if !RenderMode::can_switch(build_mode, mode) {
            log::warn!(
                "VertexBuffer {:?}: cannot use {:?} on a buffer built as {:?}",
                self.id,
                mode,
                build_mode
            );
            return Err(GraphicsError::InvalidModeTransition {
                from: self.render_mode,
                to: mode,
            });
        }
        self.apply_render_mode(mode);
        Ok(())
    }

    fn apply_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
        self.use_fn = USE_STRATEGIES[mode.index()];
        for data in &mut self.data {
            data.set_addressing(mode);
        }
    }

    /// Make this buffer the active vertex buffer of `device`.
    pub fn bind(&self, device: &mut GraphicsDevice) -> Result<(), GraphicsError> {
        if !self.is_built() {
            return Err(GraphicsError::NotBuilt);
        }
        (self.use_fn)(self, device.backend().as_ref());
        device
            .bindings_mut()
            .set_vertex_buffer(Some(ActiveVertexBuffer {
                id: self.id,
                vertex_count: self.vertex_count(),
            }));
        log::trace!("VertexBuffer {:?}: bound ({:?})", self.id, self.render_mode);
        Ok(())
    }

    /// Mark `count` vertices from `first` of the data at `index` as modified.
    pub fn modified(&self, index: usize, first: usize, count: usize) {
        if let Some(data) = self.data.get(index) {
            data.modified(first, count);
        }
    }

    /// Upload pending modified ranges. Returns the number of uploads.
    pub fn update(&self) -> usize {
        self.buffer.update(self.data.iter().map(|d| d.buffer_data()))
    }

    /// Drop GPU objects and return to the unbuilt state, keeping the data.
    pub fn release(&mut self) {
        for data in &mut self.data {
            data.sequence = None;
        }
        self.buffer.release();
        self.build_mode = None;
        self.apply_render_mode(RenderMode::VertexArray);
    }
}

impl std::fmt::Debug for VertexBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("id", &self.id)
            .field("data", &self.data.len())
            .field("vertex_count", &self.vertex_count)
            .field("build_mode", &self.build_mode)
            .field("render_mode", &self.render_mode)
            .field("buffer", &self.buffer)
            .finish()
    }
}
