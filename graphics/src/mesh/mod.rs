//! Mesh types for the graphics engine.
//!
//! This module packs geometry into GPU buffers for drawing:
//!
//! - [`Mesh`] - Geometry partitioned into up to four stream vertex buffers
//!   and an optional index buffer
//! - [`MeshArray`] - One geometry root array bound into vertex buffer data
//! - [`MeshStream`] / [`StreamSet`] - The fixed stream slots
//! - [`BuildMode`] - Independent streams or one global stream

mod array;
mod data;
mod stream;

pub use array::{MeshArray, MeshArrayHandle};
pub use data::{GeometryOwnership, Mesh, MeshId};
pub use stream::{BuildMode, MeshStream, StreamSet, StreamUsages};
