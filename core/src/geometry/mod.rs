//! CPU-side geometry.
//!
//! This module provides GPU-agnostic geometry descriptions consumed by the
//! graphics crate:
//!
//! - [`Geometry`] - Vertex arrays, optional indices and topology
//! - [`ArrayFormat`] / [`VertexAttribute`] - What each array carries
//! - [`ArrayListener`] - Notification of modified element ranges

mod attribute;
mod data;
mod error;
mod storage;
mod topology;

pub use attribute::{ArrayFormat, AttributeKind, ElementType, VertexAttribute};
pub use data::{ArrayHandle, Geometry, GeometryArray, IndexArray};
pub use error::GeometryError;
pub use storage::{ArrayListener, ArrayStorage, ListenTarget, ListenerId};
pub use topology::{IndexFormat, PrimitiveTopology};
