//! GPU resources.
//!
//! This module contains the memory-level resource types the vertex and
//! index buffers are built on:
//! - [`Buffer`] - One GPU buffer object laid out as a sequence of regions
//! - [`BufferData`] - One region, backed by shared host storage
//! - [`ModifiedRange`] / [`ModifiedTracker`] - Dirty ranges awaiting upload

mod buffer;

pub use buffer::{Buffer, BufferData, ModifiedRange, ModifiedTracker};
