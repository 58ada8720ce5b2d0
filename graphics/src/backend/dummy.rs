//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations. It hands out
//! increasing object names and records every call in order, so tests can
//! assert on exactly what the resource layer asked the GPU to do.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use strata_core::geometry::{IndexFormat, PrimitiveTopology, VertexAttribute};

use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::materials::{Material, PointSprite};
use crate::types::{BufferTarget, BufferUsage};

use super::{
    AttributeSource, GpuBackend, GpuBufferId, IndexSource, SequenceId, VertexAttributeBinding,
};

/// Data source of a recorded attribute pointer or indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedSource {
    /// Host memory of the given length.
    Client(usize),
    /// Offset into the bound buffer.
    Buffer(u64),
}

/// One call made to a [`DummyBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateBuffer {
        buffer: GpuBufferId,
        target: BufferTarget,
        size: u64,
        usage: BufferUsage,
    },
    UploadBuffer {
        buffer: GpuBufferId,
        offset: u64,
        len: usize,
    },
    DeleteBuffer(GpuBufferId),
    BindBuffer {
        target: BufferTarget,
        buffer: Option<GpuBufferId>,
    },
    SetVertexAttribute {
        attribute: VertexAttribute,
        components: u8,
        stride: u32,
        source: RecordedSource,
    },
    DisableVertexAttributes,
    BeginSequence(SequenceId),
    EndSequence,
    CallSequence(SequenceId),
    DeleteSequence(SequenceId),
    DrawArrays {
        topology: PrimitiveTopology,
        first: u32,
        count: u32,
        instances: u32,
    },
    DrawElements {
        topology: PrimitiveTopology,
        format: IndexFormat,
        count: u32,
        source: RecordedSource,
        instances: u32,
    },
    ApplyPointSprite(Option<PointSprite>),
    ApplyMaterial { active: bool },
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    capabilities: DeviceCapabilities,
    calls: Mutex<Vec<BackendCall>>,
    next_id: AtomicU64,
    fail_allocations: AtomicBool,
    fail_sequences: AtomicBool,
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyBackend {
    /// Create a new dummy backend reporting full capabilities.
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities::default())
    }

    /// Create a dummy backend reporting the given capabilities.
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_allocations: AtomicBool::new(false),
            fail_sequences: AtomicBool::new(false),
        }
    }

    /// Make subsequent buffer and sequence creation fail.
    pub fn set_fail_allocations(&self, fail: bool) {
        self.fail_allocations.store(fail, Ordering::Release);
    }

    /// Make subsequent sequence capture fail while buffers still allocate.
    pub fn set_fail_sequences(&self, fail: bool) {
        self.fail_sequences.store(fail, Ordering::Release);
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().push(call);
    }

    fn allocate(&self, what: &str) -> Result<u64, GraphicsError> {
        if self.fail_allocations.load(Ordering::Acquire) {
            log::error!("DummyBackend: injected allocation failure for {what}");
            return Err(GraphicsError::AllocationFailure(format!(
                "dummy backend refused to allocate {what}"
            )));
        }
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn create_buffer(
        &self,
        target: BufferTarget,
        size: u64,
        usage: BufferUsage,
    ) -> Result<GpuBufferId, GraphicsError> {
        let buffer = GpuBufferId::new(self.allocate("buffer")?);
        log::trace!("DummyBackend: creating buffer {buffer:?} ({target:?}, size: {size})");
        self.record(BackendCall::CreateBuffer {
            buffer,
            target,
            size,
            usage,
        });
        Ok(buffer)
    }

    fn upload_buffer(&self, buffer: GpuBufferId, offset: u64, data: &[u8]) {
        log::trace!(
            "DummyBackend: uploading {} bytes to {buffer:?} at {offset}",
            data.len()
        );
        self.record(BackendCall::UploadBuffer {
            buffer,
            offset,
            len: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: GpuBufferId) {
        log::trace!("DummyBackend: deleting buffer {buffer:?}");
        self.record(BackendCall::DeleteBuffer(buffer));
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<GpuBufferId>) {
        self.record(BackendCall::BindBuffer { target, buffer });
    }

    fn set_vertex_attribute(&self, binding: &VertexAttributeBinding<'_>) {
        let source = match binding.source {
            AttributeSource::Client(bytes) => RecordedSource::Client(bytes.len()),
            AttributeSource::Buffer(offset) => RecordedSource::Buffer(offset),
        };
        self.record(BackendCall::SetVertexAttribute {
            attribute: binding.format.attribute,
            components: binding.format.components,
            stride: binding.stride,
            source,
        });
    }

    fn disable_vertex_attributes(&self) {
        self.record(BackendCall::DisableVertexAttributes);
    }

    fn begin_sequence(&self) -> Result<SequenceId, GraphicsError> {
        if self.fail_sequences.load(Ordering::Acquire) {
            log::error!("DummyBackend: injected sequence capture failure");
            return Err(GraphicsError::AllocationFailure(
                "dummy backend refused to capture a sequence".to_string(),
            ));
        }
        let sequence = SequenceId::new(self.allocate("sequence")?);
        log::trace!("DummyBackend: capturing sequence {sequence:?}");
        self.record(BackendCall::BeginSequence(sequence));
        Ok(sequence)
    }

    fn end_sequence(&self) {
        self.record(BackendCall::EndSequence);
    }

    fn call_sequence(&self, sequence: SequenceId) {
        self.record(BackendCall::CallSequence(sequence));
    }

    fn delete_sequence(&self, sequence: SequenceId) {
        log::trace!("DummyBackend: deleting sequence {sequence:?}");
        self.record(BackendCall::DeleteSequence(sequence));
    }

    fn draw_arrays(&self, topology: PrimitiveTopology, first: u32, count: u32, instances: u32) {
        self.record(BackendCall::DrawArrays {
            topology,
            first,
            count,
            instances,
        });
    }

    fn draw_elements(
        &self,
        topology: PrimitiveTopology,
        format: IndexFormat,
        count: u32,
        source: IndexSource<'_>,
        instances: u32,
    ) {
        let source = match source {
            IndexSource::Client(bytes) => RecordedSource::Client(bytes.len()),
            IndexSource::Buffer(offset) => RecordedSource::Buffer(offset),
        };
        self.record(BackendCall::DrawElements {
            topology,
            format,
            count,
            source,
            instances,
        });
    }

    fn apply_point_sprite(&self, sprite: Option<&PointSprite>) {
        self.record(BackendCall::ApplyPointSprite(sprite.copied()));
    }

    fn apply_material(&self, material: Option<&Material>) {
        self.record(BackendCall::ApplyMaterial {
            active: material.is_some(),
        });
    }
}
