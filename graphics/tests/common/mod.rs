//! Common utilities for mesh integration tests.
//!
//! Every test runs against the recording [`DummyBackend`], so assertions can
//! be made on the exact GPU calls issued by the resource layer.

use std::sync::Arc;

use strata_graphics::{
    ArrayFormat, BackendCall, DeviceCapabilities, DummyBackend, Geometry, GraphicsConfig,
    GraphicsDevice, VertexAttribute,
};

/// Install a test logger once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Capability sets
// ============================================================================

/// Named device capability profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caps {
    /// Everything supported.
    Full,
    /// Buffer objects but no captured sequences.
    NoVao,
    /// Client arrays only.
    Minimal,
}

impl Caps {
    pub fn capabilities(self) -> DeviceCapabilities {
        match self {
            Caps::Full => DeviceCapabilities::default(),
            Caps::NoVao => DeviceCapabilities {
                vertex_array_objects: false,
                ..Default::default()
            },
            Caps::Minimal => DeviceCapabilities::minimal(),
        }
    }
}

/// A device over a fresh dummy backend, plus the backend for inspection.
pub fn device(caps: Caps) -> (Arc<DummyBackend>, GraphicsDevice) {
    device_with_config(caps, GraphicsConfig::default())
}

pub fn device_with_config(
    caps: Caps,
    config: GraphicsConfig,
) -> (Arc<DummyBackend>, GraphicsDevice) {
    init_logging();
    let dummy = Arc::new(DummyBackend::with_capabilities(caps.capabilities()));
    let device = GraphicsDevice::new(dummy.clone(), config);
    (dummy, device)
}

// ============================================================================
// Geometry builders
// ============================================================================

/// Geometry with one tightly packed array per attribute.
///
/// Vectors get 3 float components, texture coordinates 2.
pub fn geometry(attributes: &[VertexAttribute], vertices: usize) -> Geometry {
    let mut geometry = Geometry::new();
    for &attribute in attributes {
        let format = match attribute {
            VertexAttribute::TexCoord(_) => ArrayFormat::float2(attribute),
            _ => ArrayFormat::float3(attribute),
        };
        let floats: Vec<f32> = (0..vertices * format.components as usize)
            .map(|i| i as f32)
            .collect();
        geometry
            .add_array_pod(format, &floats)
            .expect("valid test geometry");
    }
    geometry
}

/// Positions of a unit quad with two triangles worth of 32-bit indices.
pub fn indexed_quad() -> Geometry {
    let mut geometry = geometry(&[VertexAttribute::Position], 4);
    geometry
        .set_indices_u32(&[0, 1, 2, 2, 3, 0])
        .expect("valid test indices");
    geometry
}

// ============================================================================
// Call inspection
// ============================================================================

pub fn created_buffers(dummy: &DummyBackend) -> usize {
    dummy.count_calls(|c| matches!(c, BackendCall::CreateBuffer { .. }))
}

pub fn draw_calls(dummy: &DummyBackend) -> Vec<BackendCall> {
    dummy
        .calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                BackendCall::DrawArrays { .. } | BackendCall::DrawElements { .. }
            )
        })
        .collect()
}

/// Attributes pointed at since the last `clear_calls`, in order.
pub fn attribute_pointers(dummy: &DummyBackend) -> Vec<VertexAttribute> {
    dummy
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BackendCall::SetVertexAttribute { attribute, .. } => Some(attribute),
            _ => None,
        })
        .collect()
}
