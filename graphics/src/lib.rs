//! # Strata Graphics
//!
//! Vertex buffer, index buffer and mesh resources for the Strata renderer.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`VertexBuffer`] / [`IndexBuffer`] - GPU buffers built once in a
//!   [`RenderMode`] and bound through a per-mode strategy
//! - [`Mesh`] - Geometry partitioned into stream buffers
//! - [`GraphicsDevice`] - Capabilities, binding context and draw calls
//! - [`Material`] / [`PointSprite`] - Fixed-function material state
//! - [`backend`] - Trait for GPU backends, plus a recording dummy backend
//!
//! ## Example
//!
//! ```ignore
//! use strata_graphics::{GraphicsConfig, GraphicsDevice, loader};
//!
//! let mut device = GraphicsDevice::create(GraphicsConfig::default())?;
//! let meshes = loader::load_obj_meshes(&device, source, None)?;
//!
//! for mesh in &meshes {
//!     mesh.bind(&mut device)?;
//!     device.render_mesh()?;
//! }
//! device.unbind_mesh();
//! ```

pub mod backend;
pub mod binding;
pub mod config;
pub mod device;
pub mod error;
pub mod loader;
pub mod materials;
pub mod mesh;
pub mod resources;
pub mod types;
pub mod vertex;

// Re-export main types for convenience
pub use backend::{GpuBackend, GpuBufferId, SequenceId};
#[cfg(feature = "dummy")]
pub use backend::{BackendCall, DummyBackend};
pub use binding::{BindingState, DrawPath};
pub use config::{load_config, load_or_default, GraphicsConfig};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::GraphicsError;
pub use materials::{BlendComponent, BlendFactor, Material, MaterialColor, PointSprite};
pub use mesh::{BuildMode, GeometryOwnership, Mesh, MeshStream, StreamSet, StreamUsages};
pub use resources::{Buffer, BufferData};
pub use types::{BufferTarget, BufferUsage};
pub use vertex::{IndexBuffer, RenderMode, VertexBuffer, VertexBufferData};

// Re-export the geometry types meshes are built from
pub use strata_core::geometry::{
    ArrayFormat, ElementType, Geometry, IndexFormat, PrimitiveTopology, VertexAttribute,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// Logs the library version.
pub fn init() {
    strata_core::init();
    log::info!("Strata Graphics v{} initialized", VERSION);
}
