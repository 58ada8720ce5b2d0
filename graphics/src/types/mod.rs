//! Shared graphics types.

mod buffer;

pub use buffer::{BufferTarget, BufferUsage};
