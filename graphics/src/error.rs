//! Graphics error types.

use strata_core::geometry::GeometryError;
use strata_core::obj::ObjError;

use crate::vertex::RenderMode;

/// Errors that can occur in the graphics system.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// Host or GPU memory could not be allocated.
    #[error("allocation failed: {0}")]
    AllocationFailure(String),
    /// A built buffer was switched to a mode its build mode does not support.
    #[error("cannot switch render mode from {from:?} to {to:?}")]
    InvalidModeTransition { from: RenderMode, to: RenderMode },
    /// The device cannot render in the requested mode.
    #[error("render mode {0:?} is not supported by this device")]
    UnsupportedRenderMode(RenderMode),
    /// Geometry was attached to a mesh that already has geometry.
    #[error("mesh already has geometry attached")]
    DuplicateGeometryAttach,
    /// Vertex data disagrees with the vertex count of its buffer.
    #[error("vertex count mismatch: expected {expected}, found {found}")]
    VertexCountMismatch { expected: u32, found: u32 },
    /// Operation needs a built resource.
    #[error("resource has not been built")]
    NotBuilt,
    /// Resources are built once; clear and recreate to rebuild.
    #[error("resource is already built")]
    AlreadyBuilt,
    /// Mesh draw with no mesh bound.
    #[error("no mesh is bound")]
    NoActiveMesh,
    /// Non-indexed draw with no vertex buffer bound.
    #[error("no vertex buffer is bound")]
    NoActiveVertexBuffer,
    /// Indexed draw with no index buffer bound.
    #[error("no index buffer is bound")]
    NoActiveIndexBuffer,
    /// A requested feature is not supported.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Geometry construction or update failed.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// OBJ import failed.
    #[error(transparent)]
    Obj(#[from] ObjError),
    /// Configuration could not be read.
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::DuplicateGeometryAttach;
        assert_eq!(err.to_string(), "mesh already has geometry attached");

        let err = GraphicsError::InvalidModeTransition {
            from: RenderMode::VertexBufferObject,
            to: RenderMode::UnifiedVertexArrayObject,
        };
        assert_eq!(
            err.to_string(),
            "cannot switch render mode from VertexBufferObject to UnifiedVertexArrayObject"
        );

        let err = GraphicsError::VertexCountMismatch {
            expected: 8,
            found: 4,
        };
        assert_eq!(err.to_string(), "vertex count mismatch: expected 8, found 4");
    }

    #[test]
    fn test_geometry_error_converts() {
        let err: GraphicsError = GeometryError::NoIndices.into();
        assert_eq!(err.to_string(), "geometry has no index array");
    }
}
