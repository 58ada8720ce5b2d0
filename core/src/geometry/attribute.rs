//! Vertex attribute kinds and element types.

/// Scalar type of one component of a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    #[default]
    Float,
    Double,
}

impl ElementType {
    /// Size in bytes of one component.
    pub fn size(&self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
            Self::Double => 8,
        }
    }
}

/// What a vertex array carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    Normal,
    Tangent,
    Binormal,
    Color,
    /// Numbered texture coordinate set.
    TexCoord(u8),
    /// Generic shader attribute slot.
    Generic(u8),
}

/// Coarse family of a [`VertexAttribute`].
///
/// Meshes use the family to decide which stream an array is packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Position,
    /// Normal, tangent and binormal.
    NormalFamily,
    TexCoord,
    /// Colors and generic attributes.
    Other,
}

impl VertexAttribute {
    /// Family this attribute belongs to.
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Position => AttributeKind::Position,
            Self::Normal | Self::Tangent | Self::Binormal => AttributeKind::NormalFamily,
            Self::TexCoord(_) => AttributeKind::TexCoord,
            Self::Color | Self::Generic(_) => AttributeKind::Other,
        }
    }
}

/// Layout of one attribute inside a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayFormat {
    pub attribute: VertexAttribute,
    pub element_type: ElementType,
    /// Number of components per vertex (1 to 4).
    pub components: u8,
}

impl ArrayFormat {
    /// Create a new array format.
    pub fn new(attribute: VertexAttribute, element_type: ElementType, components: u8) -> Self {
        Self {
            attribute,
            element_type,
            components,
        }
    }

    /// Three floats per vertex, the usual position/normal layout.
    pub fn float3(attribute: VertexAttribute) -> Self {
        Self::new(attribute, ElementType::Float, 3)
    }

    /// Two floats per vertex.
    pub fn float2(attribute: VertexAttribute) -> Self {
        Self::new(attribute, ElementType::Float, 2)
    }

    /// Size in bytes of this attribute for one vertex.
    pub fn element_size(&self) -> usize {
        self.element_type.size() * self.components as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_sizes() {
        assert_eq!(ElementType::UnsignedByte.size(), 1);
        assert_eq!(ElementType::Short.size(), 2);
        assert_eq!(ElementType::Float.size(), 4);
        assert_eq!(ElementType::Double.size(), 8);
    }

    #[test]
    fn test_attribute_kinds() {
        assert_eq!(VertexAttribute::Position.kind(), AttributeKind::Position);
        assert_eq!(VertexAttribute::Tangent.kind(), AttributeKind::NormalFamily);
        assert_eq!(VertexAttribute::Binormal.kind(), AttributeKind::NormalFamily);
        assert_eq!(VertexAttribute::TexCoord(3).kind(), AttributeKind::TexCoord);
        assert_eq!(VertexAttribute::Color.kind(), AttributeKind::Other);
        assert_eq!(VertexAttribute::Generic(7).kind(), AttributeKind::Other);
    }

    #[test]
    fn test_array_format_element_size() {
        let format = ArrayFormat::float3(VertexAttribute::Normal);
        assert_eq!(format.element_size(), 12);

        let format = ArrayFormat::new(VertexAttribute::Color, ElementType::UnsignedByte, 4);
        assert_eq!(format.element_size(), 4);
    }
}
