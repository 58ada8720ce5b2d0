//! Error types for OBJ parsing.

use crate::geometry::GeometryError;

/// Errors that can occur while reading a Wavefront OBJ file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjError {
    /// Malformed statement.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    /// A face references a vertex, texcoord or normal that does not exist.
    #[error("line {line}: index {index} out of range for {len} elements")]
    IndexOutOfRange { line: usize, index: i64, len: usize },
    /// The parsed data could not be turned into a geometry.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
}
