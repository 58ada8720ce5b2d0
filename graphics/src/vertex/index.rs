//! Index buffers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use strata_core::geometry::{ArrayStorage, IndexArray, IndexFormat};

use crate::backend::GpuBackend;
use crate::binding::{ActiveIndexBuffer, IndexBinding};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::{Buffer, BufferData, ModifiedTracker};
use crate::types::{BufferTarget, BufferUsage};

use super::mode::RenderMode;

/// Identifies an index buffer for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferId(u64);

impl IndexBufferId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index data backed by one [`Buffer`].
///
/// Built in the same [`RenderMode`] as the vertex buffers it is drawn with.
/// In [`RenderMode::VertexArray`] the indices stay in host memory and no
/// buffer object is allocated.
pub struct IndexBuffer {
    id: IndexBufferId,
    buffer: Buffer,
    data: Option<BufferData>,
    format: IndexFormat,
    count: u32,
    build_mode: Option<RenderMode>,
    render_mode: RenderMode,
}

impl Default for IndexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuffer {
    /// Create an index buffer with no indices.
    pub fn new() -> Self {
        Self {
            id: IndexBufferId::next(),
            buffer: Buffer::new(BufferTarget::ElementArray),
            data: None,
            format: IndexFormat::default(),
            count: 0,
            build_mode: None,
            render_mode: RenderMode::VertexArray,
        }
    }

    /// Create an index buffer over the index array of a geometry.
    pub fn from_index_array(indices: &IndexArray) -> Self {
        let mut ib = Self::new();
        ib.place(Arc::clone(indices.storage()), indices.format(), indices.count());
        ib
    }

    /// Set `count` indices of `format` stored in `storage`.
    pub fn set_indices(
        &mut self,
        storage: Arc<ArrayStorage>,
        format: IndexFormat,
        count: u32,
    ) -> Result<(), GraphicsError> {
        if self.is_built() {
            return Err(GraphicsError::AlreadyBuilt);
        }
        self.place(storage, format, count);
        Ok(())
    }

    fn place(&mut self, storage: Arc<ArrayStorage>, format: IndexFormat, count: u32) {
        let mut data = BufferData::new(storage);
        self.buffer.reset_layout();
        let first = self.buffer.reserve(data.size());
        data.set_first(first);
        self.data = Some(data);
        self.format = format;
        self.count = count;
    }

    pub fn id(&self) -> IndexBufferId {
        self.id
    }

    pub fn format(&self) -> IndexFormat {
        self.format
    }

    pub fn count(&self) -> u32 {
        self.count
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

    /// Build the index buffer in `mode`.
    pub fn build(
        &mut self,
        device: &GraphicsDevice,
        usage: BufferUsage,
        mode: RenderMode,
    ) -> Result<(), GraphicsError> {
        if !device.supports_render_mode(mode) {
            log::warn!(
                "IndexBuffer {:?}: {:?} is not supported by this device",
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
        let data = self.data.as_ref().ok_or_else(|| {
            GraphicsError::InvalidParameter("index buffer has no indices".to_string())
        })?;
        if mode.requires_buffer_object() {
            self.buffer.build(backend, usage, [data])?;
        }
        self.build_mode = Some(mode);
        self.render_mode = mode;
        log::debug!(
            "IndexBuffer {:?}: built {} {:?} indices, {:?}",
            self.id,
            self.count,
            self.format,
            mode
        );
        Ok(())
    }

    /// Switch the mode used by [`bind`](Self::bind), following the same
    /// rules as [`VertexBuffer::set_render_mode`](super::VertexBuffer::set_render_mode).
    pub fn set_render_mode(&mut self, mode: RenderMode) -> Result<(), GraphicsError> {
        let build_mode = self.build_mode.ok_or(GraphicsError::NotBuilt)?;
        if !RenderMode::can_switch(build_mode, mode) {
            log::warn!(
                "IndexBuffer {:?}: cannot use {:?} on a buffer built as {:?}",
                self.id,
                mode,
                build_mode
            );
            return Err(GraphicsError::InvalidModeTransition {
                from: self.render_mode,
                to: mode,
            });
        }
        self.render_mode = mode;
        Ok(())
    }

    /// Tracker converting index ranges into byte ranges of this buffer.
    pub fn tracker(&self) -> Option<ModifiedTracker> {
        self.data
            .as_ref()
            .map(|d| d.tracker(self.format.size() as u64))
    }

    /// Mark `count` indices starting at `first` as modified.
    pub fn modified(&self, first: usize, count: usize) {
        if let Some(tracker) = self.tracker() {
            tracker.mark_elements(first, count);
        }
    }

    /// Upload pending modified ranges. Returns the number of uploads.
    pub fn update(&self) -> usize {
        self.buffer.update(self.data.as_ref())
    }

    /// Make this buffer the active index buffer of `device`.
    pub fn bind(&self, device: &mut GraphicsDevice) -> Result<(), GraphicsError> {
        if !self.is_built() {
            return Err(GraphicsError::NotBuilt);
        }
        let binding = match (&self.data, self.render_mode.requires_buffer_object()) {
            (Some(_), true) => {
                self.buffer.bind(device.backend().as_ref());
                IndexBinding::Buffer
            }
            (Some(data), false) => {
                device
                    .backend()
                    .bind_buffer(BufferTarget::ElementArray, None);
                IndexBinding::Client(Arc::clone(data.storage()))
            }
            (None, _) => return Err(GraphicsError::NotBuilt),
        };
        device
            .bindings_mut()
            .set_index_buffer(Some(ActiveIndexBuffer {
                id: self.id,
                format: self.format,
                count: self.count,
                binding,
            }));
        Ok(())
    }

    /// Drop the GPU allocation and return to the unbuilt state.
    pub fn release(&mut self) {
        self.buffer.release();
        self.build_mode = None;
        self.render_mode = RenderMode::VertexArray;
    }
}

impl std::fmt::Debug for IndexBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuffer")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("count", &self.count)
            .field("build_mode", &self.build_mode)
            .field("render_mode", &self.render_mode)
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strata_core::geometry::Geometry;

    use super::*;
    use crate::backend::{BackendCall, DummyBackend};
    use crate::device::DeviceCapabilities;

    fn indexed_geometry() -> Geometry {
        let mut geometry = Geometry::new();
        geometry.set_indices_u32(&[0, 1, 2, 2, 3, 0]).unwrap();
        geometry
    }

    #[test]
    fn test_from_index_array() {
        let geometry = indexed_geometry();
        let ib = IndexBuffer::from_index_array(geometry.index_array().unwrap());
        assert_eq!(ib.count(), 6);
        assert_eq!(ib.format(), IndexFormat::Uint32);
        assert_eq!(ib.buffer().size(), 24);
        assert!(!ib.is_built());
    }

    #[test]
    fn test_build_allocates_element_buffer() {
        let dummy = Arc::new(DummyBackend::new());
        let mut device = GraphicsDevice::with_backend(dummy.clone());
        let geometry = indexed_geometry();
        let mut ib = IndexBuffer::from_index_array(geometry.index_array().unwrap());

        ib.build(&device, BufferUsage::StaticDraw, RenderMode::VertexBufferObject)
            .unwrap();
        ib.bind(&mut device).unwrap();

        let id = ib.buffer().gpu_id().unwrap();
        let calls = dummy.calls();
        assert!(matches!(
            calls[0],
            BackendCall::CreateBuffer {
                target: BufferTarget::ElementArray,
                size: 24,
                ..
            }
        ));
        assert_eq!(
            calls.last(),
            Some(&BackendCall::BindBuffer {
                target: BufferTarget::ElementArray,
                buffer: Some(id)
            })
        );
        let active = device.bindings().index_buffer().unwrap();
        assert_eq!(active.count, 6);
        assert_eq!(active.format, IndexFormat::Uint32);
    }

    #[rstest]
    #[case::vertex_buffer_object(RenderMode::VertexBufferObject)]
    #[case::vertex_array_object(RenderMode::VertexArrayObject)]
    #[case::unified(RenderMode::UnifiedVertexArrayObject)]
    fn test_build_in_unsupported_mode_fails(#[case] mode: RenderMode) {
        let dummy = Arc::new(DummyBackend::with_capabilities(
            DeviceCapabilities::minimal(),
        ));
        let device = GraphicsDevice::with_backend(dummy.clone());
        let geometry = indexed_geometry();
        let mut ib = IndexBuffer::from_index_array(geometry.index_array().unwrap());

        assert!(matches!(
            ib.build(&device, BufferUsage::StaticDraw, mode),
            Err(GraphicsError::UnsupportedRenderMode(m)) if m == mode
        ));
        assert!(!ib.is_built());
        assert_eq!(
            dummy.count_calls(|c| matches!(c, BackendCall::CreateBuffer { .. })),
            0
        );
    }

    #[test]
    fn test_client_indices_skip_allocation() {
        let dummy = Arc::new(DummyBackend::new());
        let mut device = GraphicsDevice::with_backend(dummy.clone());
        let geometry = indexed_geometry();
        let mut ib = IndexBuffer::from_index_array(geometry.index_array().unwrap());

        ib.build(&device, BufferUsage::StaticDraw, RenderMode::VertexArray)
            .unwrap();
        ib.bind(&mut device).unwrap();

        assert_eq!(
            dummy.count_calls(|c| matches!(c, BackendCall::CreateBuffer { .. })),
            0
        );
        assert!(matches!(
            device.bindings().index_buffer().map(|a| &a.binding),
            Some(IndexBinding::Client(_))
        ));
    }

    #[test]
    fn test_switch_to_client_indices() {
        let dummy = Arc::new(DummyBackend::new());
        let mut device = GraphicsDevice::with_backend(dummy.clone());
        let geometry = indexed_geometry();
        let mut ib = IndexBuffer::from_index_array(geometry.index_array().unwrap());
        ib.build(&device, BufferUsage::StaticDraw, RenderMode::VertexArray)
            .unwrap();

        assert!(matches!(
            ib.set_render_mode(RenderMode::VertexBufferObject),
            Err(GraphicsError::InvalidModeTransition { .. })
        ));
        assert_eq!(ib.render_mode(), RenderMode::VertexArray);

        let mut ib = IndexBuffer::from_index_array(geometry.index_array().unwrap());
        ib.build(&device, BufferUsage::StaticDraw, RenderMode::VertexBufferObject)
            .unwrap();
        ib.set_render_mode(RenderMode::VertexArray).unwrap();
        ib.bind(&mut device).unwrap();
        assert!(matches!(
            device.bindings().index_buffer().map(|a| &a.binding),
            Some(IndexBinding::Client(_))
        ));
    }

    #[test]
    fn test_build_without_indices_fails() {
        let device = GraphicsDevice::with_backend(Arc::new(DummyBackend::new()));
        let mut ib = IndexBuffer::new();
        assert!(matches!(
            ib.build(&device, BufferUsage::StaticDraw, RenderMode::VertexBufferObject),
            Err(GraphicsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_partial_update() {
        let dummy = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::with_backend(dummy.clone());
        let geometry = indexed_geometry();
        let mut ib = IndexBuffer::from_index_array(geometry.index_array().unwrap());
        ib.build(&device, BufferUsage::StaticDraw, RenderMode::VertexBufferObject)
            .unwrap();
        dummy.clear_calls();

        ib.modified(2, 3);
        assert_eq!(ib.update(), 1);
        assert_eq!(
            dummy.calls(),
            vec![BackendCall::UploadBuffer {
                buffer: ib.buffer().gpu_id().unwrap(),
                offset: 8,
                len: 12
            }]
        );
    }
}
