//! Error types for geometry construction and updates.

use super::data::ArrayHandle;

/// Errors that can occur while building or editing a [`Geometry`](super::Geometry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// An array disagrees with the vertex count already set on the geometry.
    #[error("vertex count mismatch: geometry has {expected} vertices, array has {found}")]
    VertexCountMismatch { expected: u32, found: u32 },
    /// Data length is not a whole number of records.
    #[error("data length {len} is not a multiple of the {stride}-byte record size")]
    MisalignedData { len: usize, stride: usize },
    /// Component count outside 1..=4.
    #[error("invalid component count {0}, expected 1 to 4")]
    InvalidComponents(u8),
    /// An interleaved array was described with no attributes.
    #[error("interleaved array needs at least one attribute")]
    EmptyLayout,
    /// The handle does not name an array of this geometry.
    #[error("unknown array handle {0:?}")]
    UnknownArray(ArrayHandle),
    /// Vertex updates must go through the root of an interleaved array.
    #[error("array {0:?} is a child array, update its root instead")]
    NotRootArray(ArrayHandle),
    /// Index update on a geometry without indices.
    #[error("geometry has no index array")]
    NoIndices,
    /// Update range past the end of the array.
    #[error("range {first}..{end} out of bounds for {len} elements")]
    OutOfRange { first: usize, end: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeometryError::VertexCountMismatch {
            expected: 8,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "vertex count mismatch: geometry has 8 vertices, array has 4"
        );
        assert_eq!(
            GeometryError::InvalidComponents(5).to_string(),
            "invalid component count 5, expected 1 to 4"
        );
    }
}
