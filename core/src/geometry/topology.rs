//! Primitive assembly and index formats.

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
    /// Vertices form a fan around the first vertex.
    TriangleFan,
}

impl PrimitiveTopology {
    /// Get the number of vertices per primitive (for non-strip topologies).
    pub fn vertices_per_primitive(&self) -> Option<u32> {
        match self {
            Self::PointList => Some(1),
            Self::LineList => Some(2),
            Self::TriangleList => Some(3),
            Self::LineStrip | Self::TriangleStrip | Self::TriangleFan => None,
        }
    }

    /// Number of primitives drawn from `count` vertices or indices.
    pub fn primitive_count(&self, count: u32) -> u32 {
        match self {
            Self::PointList => count,
            Self::LineList => count / 2,
            Self::LineStrip => count.saturating_sub(1),
            Self::TriangleList => count / 3,
            Self::TriangleStrip | Self::TriangleFan => count.saturating_sub(2),
        }
    }
}

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 8-bit unsigned integers.
    Uint8,
    /// 16-bit unsigned integers (max 65535 vertices).
    #[default]
    Uint16,
    /// 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_index_format_size() {
        assert_eq!(IndexFormat::Uint8.size(), 1);
        assert_eq!(IndexFormat::Uint16.size(), 2);
        assert_eq!(IndexFormat::Uint32.size(), 4);
    }

    #[rstest]
    #[case::triangle_list(PrimitiveTopology::TriangleList, 6, 2)]
    #[case::triangle_strip(PrimitiveTopology::TriangleStrip, 6, 4)]
    #[case::triangle_fan(PrimitiveTopology::TriangleFan, 1, 0)]
    #[case::line_strip_empty(PrimitiveTopology::LineStrip, 0, 0)]
    #[case::line_list(PrimitiveTopology::LineList, 5, 2)]
    #[case::point_list(PrimitiveTopology::PointList, 5, 5)]
    fn test_primitive_count(
        #[case] topology: PrimitiveTopology,
        #[case] count: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(topology.primitive_count(count), expected);
    }

    #[test]
    fn test_vertices_per_primitive() {
        assert_eq!(PrimitiveTopology::TriangleList.vertices_per_primitive(), Some(3));
        assert_eq!(PrimitiveTopology::TriangleFan.vertices_per_primitive(), None);
    }
}
