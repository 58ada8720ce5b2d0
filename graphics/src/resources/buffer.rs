//! GPU buffer resource.

use std::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::geometry::{ArrayListener, ArrayStorage};

use crate::backend::{GpuBackend, GpuBuffer, GpuBufferId};
use crate::error::GraphicsError;
use crate::types::{BufferTarget, BufferUsage};

/// Byte range of a region that changed since its last upload.
///
/// Successive marks merge into one covering range.
#[derive(Debug, Default)]
pub struct ModifiedRange {
    range: Mutex<Option<Range<u64>>>,
}

impl ModifiedRange {
    /// Mark `range` (bytes relative to the region start) as modified.
    pub fn mark(&self, range: Range<u64>) {
        if range.is_empty() {
            return;
        }
        let mut current = self.range.lock();
        *current = Some(match current.take() {
            Some(old) => old.start.min(range.start)..old.end.max(range.end),
            None => range,
        });
    }

    /// The pending range, if any.
    pub fn get(&self) -> Option<Range<u64>> {
        self.range.lock().clone()
    }

    pub fn is_modified(&self) -> bool {
        self.range.lock().is_some()
    }

    /// Remove and return the pending range.
    pub fn take(&self) -> Option<Range<u64>> {
        self.range.lock().take()
    }
}

/// Converts modified element ranges into byte ranges of one region.
///
/// Registered with a geometry as its [`ArrayListener`], so edits to the
/// geometry mark the matching bytes of the GPU copy dirty.
#[derive(Debug, Clone)]
pub struct ModifiedTracker {
    element_size: u64,
    modified: Arc<ModifiedRange>,
}

impl ModifiedTracker {
    pub fn new(element_size: u64, modified: Arc<ModifiedRange>) -> Self {
        Self {
            element_size,
            modified,
        }
    }

    /// Mark `count` elements starting at element `first`.
    pub fn mark_elements(&self, first: usize, count: usize) {
        let start = first as u64 * self.element_size;
        let end = start + count as u64 * self.element_size;
        self.modified.mark(start..end);
    }
}

impl ArrayListener for ModifiedTracker {
    fn array_modified(&self, first: usize, count: usize) {
        self.mark_elements(first, count);
    }
}

/// One region of a [`Buffer`].
///
/// The bytes live in host storage shared with the geometry that produced
/// them. `first` is the byte offset of the region inside its buffer.
#[derive(Debug)]
pub struct BufferData {
    storage: Arc<ArrayStorage>,
    first: u64,
    size: u64,
    modified: Arc<ModifiedRange>,
}

impl BufferData {
    /// A region covering the whole of `storage`.
    pub fn new(storage: Arc<ArrayStorage>) -> Self {
        let size = storage.len() as u64;
        Self {
            storage,
            first: 0,
            size,
            modified: Arc::new(ModifiedRange::default()),
        }
    }

    pub fn storage(&self) -> &Arc<ArrayStorage> {
        &self.storage
    }

    /// Byte offset inside the owning buffer.
    pub fn first(&self) -> u64 {
        self.first
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> &Arc<ModifiedRange> {
        &self.modified
    }

    /// Tracker converting `element_size`-byte element ranges into this region.
    pub fn tracker(&self, element_size: u64) -> ModifiedTracker {
        ModifiedTracker::new(element_size, Arc::clone(&self.modified))
    }

    pub(crate) fn set_first(&mut self, first: u64) {
        self.first = first;
    }
}

/// A GPU buffer object made of consecutive [`BufferData`] regions.
///
/// The buffer does not own its regions: callers pass them to
/// [`build`](Self::build) and [`update`](Self::update). Region offsets are
/// handed out by [`reserve`](Self::reserve) in the order regions are added.
#[derive(Debug)]
pub struct Buffer {
    target: BufferTarget,
    usage: BufferUsage,
    size: u64,
    built: bool,
    gpu: Option<GpuBuffer>,
}

impl Buffer {
    /// Create an empty, unbuilt buffer for `target`.
    pub fn new(target: BufferTarget) -> Self {
        Self {
            target,
            usage: BufferUsage::default(),
            size: 0,
            built: false,
            gpu: None,
        }
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Total size in bytes of all reserved regions.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Backend name of the allocation, once built.
    pub fn gpu_id(&self) -> Option<GpuBufferId> {
        self.gpu.as_ref().map(GpuBuffer::id)
    }

    /// Append a region of `size` bytes and return its offset.
    pub fn reserve(&mut self, size: u64) -> u64 {
        let first = self.size;
        self.size += size;
        first
    }

    /// Forget all reserved regions.
    pub fn reset_layout(&mut self) {
        self.size = 0;
    }

    /// Allocate the GPU buffer and upload every region.
    ///
    /// Pending modified ranges of the regions are cleared, since the full
    /// upload covers them. A buffer with no bytes is marked built without
    /// allocating. A buffer larger than the backend's `max_buffer_size`
    /// fails with [`GraphicsError::AllocationFailure`].
    pub fn build<'a>(
        &mut self,
        backend: &Arc<dyn GpuBackend>,
        usage: BufferUsage,
        regions: impl IntoIterator<Item = &'a BufferData>,
    ) -> Result<(), GraphicsError> {
        if self.built {
            return Err(GraphicsError::AlreadyBuilt);
        }
        self.usage = usage;

        if self.size == 0 {
            log::debug!("Buffer: building empty {:?} buffer, no allocation", self.target);
            self.built = true;
            return Ok(());
        }

        let limit = backend.capabilities().max_buffer_size;
        if self.size > limit {
            log::error!(
                "Buffer: {} bytes for {:?} exceeds the device limit of {} bytes",
                self.size,
                self.target,
                limit
            );
            return Err(GraphicsError::AllocationFailure(format!(
                "{} bytes exceeds max buffer size {}",
                self.size, limit
            )));
        }

        let id = backend
            .create_buffer(self.target, self.size, usage)
            .inspect_err(|e| {
                log::error!(
                    "Buffer: failed to allocate {} bytes for {:?}: {}",
                    self.size,
                    self.target,
                    e
                );
            })?;
        let gpu = GpuBuffer::new(Arc::clone(backend), id, self.size);

        for region in regions {
            let bytes = region.storage.read();
            let len = (region.size as usize).min(bytes.len());
            backend.upload_buffer(id, region.first, &bytes[..len]);
            region.modified.take();
        }

        log::trace!(
            "Buffer: built {:?} {:?} ({} bytes, {:?})",
            self.target,
            id,
            self.size,
            usage
        );
        self.gpu = Some(gpu);
        self.built = true;
        Ok(())
    }

    /// Upload the modified ranges of `regions`. Returns the number of uploads.
    ///
    /// Does nothing on an unbuilt buffer; the ranges stay pending.
    pub fn update<'a>(&self, regions: impl IntoIterator<Item = &'a BufferData>) -> usize {
        let Some(gpu) = &self.gpu else {
            return 0;
        };
        let mut uploads = 0;
        for region in regions {
            let Some(range) = region.modified.take() else {
                continue;
            };
            let bytes = region.storage.read();
            let end = (range.end.min(region.size) as usize).min(bytes.len());
            let start = (range.start as usize).min(end);
            if start == end {
                continue;
            }
            gpu.backend()
                .upload_buffer(gpu.id(), region.first + start as u64, &bytes[start..end]);
            uploads += 1;
        }
        uploads
    }

    /// Bind this buffer to its target.
    pub fn bind(&self, backend: &dyn GpuBackend) {
        backend.bind_buffer(self.target, self.gpu_id());
    }

    /// Drop the GPU allocation and return to the unbuilt state.
    pub fn release(&mut self) {
        self.gpu = None;
        self.built = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, DummyBackend};
    use crate::device::DeviceCapabilities;

    fn region(bytes: usize) -> BufferData {
        BufferData::new(Arc::new(ArrayStorage::new(vec![7; bytes])))
    }

    #[test]
    fn test_modified_range_merges() {
        let range = ModifiedRange::default();
        range.mark(8..16);
        range.mark(4..10);
        range.mark(20..24);
        assert_eq!(range.get(), Some(4..24));
        assert_eq!(range.take(), Some(4..24));
        assert!(!range.is_modified());
    }

    #[test]
    fn test_modified_range_ignores_empty() {
        let range = ModifiedRange::default();
        range.mark(5..5);
        assert!(!range.is_modified());
    }

    #[test]
    fn test_tracker_converts_elements_to_bytes() {
        let data = region(48);
        let tracker = data.tracker(12);
        tracker.array_modified(1, 2);
        assert_eq!(data.modified().get(), Some(12..36));
    }

    #[test]
    fn test_reserve_lays_out_regions() {
        let mut buffer = Buffer::new(BufferTarget::Array);
        assert_eq!(buffer.reserve(48), 0);
        assert_eq!(buffer.reserve(32), 48);
        assert_eq!(buffer.size(), 80);
        buffer.reset_layout();
        assert_eq!(buffer.size(), 0);
    }

    #[test]
    fn test_build_uploads_every_region() {
        let dummy = Arc::new(DummyBackend::new());
        let backend: Arc<dyn GpuBackend> = dummy.clone();
        let mut a = region(48);
        let mut b = region(32);
        let mut buffer = Buffer::new(BufferTarget::Array);
        a.set_first(buffer.reserve(a.size()));
        b.set_first(buffer.reserve(b.size()));
        a.modified().mark(0..4);

        buffer
            .build(&backend, BufferUsage::DynamicDraw, [&a, &b])
            .unwrap();

        let id = buffer.gpu_id().unwrap();
        assert_eq!(
            dummy.calls(),
            vec![
                BackendCall::CreateBuffer {
                    buffer: id,
                    target: BufferTarget::Array,
                    size: 80,
                    usage: BufferUsage::DynamicDraw,
                },
                BackendCall::UploadBuffer {
                    buffer: id,
                    offset: 0,
                    len: 48
                },
                BackendCall::UploadBuffer {
                    buffer: id,
                    offset: 48,
                    len: 32
                },
            ]
        );
        assert!(!a.modified().is_modified());
        assert!(matches!(
            buffer.build(&backend, BufferUsage::StaticDraw, [&a]),
            Err(GraphicsError::AlreadyBuilt)
        ));
    }

    #[test]
    fn test_update_uploads_only_dirty_ranges() {
        let dummy = Arc::new(DummyBackend::new());
        let backend: Arc<dyn GpuBackend> = dummy.clone();
        let mut a = region(48);
        let mut b = region(32);
        let mut buffer = Buffer::new(BufferTarget::Array);
        a.set_first(buffer.reserve(a.size()));
        b.set_first(buffer.reserve(b.size()));
        buffer.build(&backend, BufferUsage::StaticDraw, [&a, &b]).unwrap();
        dummy.clear_calls();

        b.tracker(8).mark_elements(1, 2);
        assert_eq!(buffer.update([&a, &b]), 1);
        assert_eq!(
            dummy.calls(),
            vec![BackendCall::UploadBuffer {
                buffer: buffer.gpu_id().unwrap(),
                offset: 56,
                len: 16
            }]
        );
        assert_eq!(buffer.update([&a, &b]), 0);
    }

    #[test]
    fn test_update_clamps_past_end() {
        let dummy = Arc::new(DummyBackend::new());
        let backend: Arc<dyn GpuBackend> = dummy.clone();
        let a = region(16);
        let mut buffer = Buffer::new(BufferTarget::Array);
        buffer.reserve(a.size());
        buffer.build(&backend, BufferUsage::StaticDraw, [&a]).unwrap();
        dummy.clear_calls();

        a.modified().mark(8..64);
        assert_eq!(buffer.update([&a]), 1);
        assert_eq!(
            dummy.calls()[0],
            BackendCall::UploadBuffer {
                buffer: buffer.gpu_id().unwrap(),
                offset: 8,
                len: 8
            }
        );
    }

    #[test]
    fn test_update_on_unbuilt_keeps_pending() {
        let a = region(16);
        let buffer = Buffer::new(BufferTarget::Array);
        a.modified().mark(0..4);
        assert_eq!(buffer.update([&a]), 0);
        assert!(a.modified().is_modified());
    }

    #[test]
    fn test_empty_buffer_builds_without_allocation() {
        let dummy = Arc::new(DummyBackend::new());
        let backend: Arc<dyn GpuBackend> = dummy.clone();
        let mut buffer = Buffer::new(BufferTarget::ElementArray);
        buffer.build(&backend, BufferUsage::StaticDraw, []).unwrap();
        assert!(buffer.is_built());
        assert!(buffer.gpu_id().is_none());
        assert!(dummy.calls().is_empty());
    }

    #[test]
    fn test_oversized_buffer_fails_without_allocation() {
        let dummy = Arc::new(DummyBackend::with_capabilities(DeviceCapabilities {
            max_buffer_size: 32,
            ..Default::default()
        }));
        let backend: Arc<dyn GpuBackend> = dummy.clone();
        let a = region(48);
        let mut buffer = Buffer::new(BufferTarget::Array);
        buffer.reserve(a.size());

        assert!(matches!(
            buffer.build(&backend, BufferUsage::StaticDraw, [&a]),
            Err(GraphicsError::AllocationFailure(_))
        ));
        assert!(!buffer.is_built());
        assert!(dummy.calls().is_empty());

        let small = region(32);
        let mut fits = Buffer::new(BufferTarget::Array);
        fits.reserve(small.size());
        fits.build(&backend, BufferUsage::StaticDraw, [&small]).unwrap();
        assert!(fits.is_built());
    }

    #[test]
    fn test_release_deletes_gpu_buffer() {
        let dummy = Arc::new(DummyBackend::new());
        let backend: Arc<dyn GpuBackend> = dummy.clone();
        let a = region(16);
        let mut buffer = Buffer::new(BufferTarget::Array);
        buffer.reserve(a.size());
        buffer.build(&backend, BufferUsage::StaticDraw, [&a]).unwrap();
        let id = buffer.gpu_id().unwrap();

        buffer.release();
        assert!(!buffer.is_built());
        assert_eq!(dummy.calls().last(), Some(&BackendCall::DeleteBuffer(id)));
    }
}
