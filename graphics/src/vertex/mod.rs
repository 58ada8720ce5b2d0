//! Vertex and index buffers.
//!
//! - [`VertexBufferData`] - One region of interleaved attributes
//! - [`VertexBuffer`] - Regions sharing one GPU buffer, bound through a
//!   per-[`RenderMode`] strategy
//! - [`IndexBuffer`] - Index data for indexed draws

mod buffer;
mod data;
mod index;
mod mode;

pub use buffer::{VertexBuffer, VertexBufferId};
pub use data::{ArrayAddress, VertexArray, VertexBufferData};
pub use index::{IndexBuffer, IndexBufferId};
pub use mode::RenderMode;
