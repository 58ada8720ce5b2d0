//! Mesh streams and build modes.

use bitflags::bitflags;
use strata_core::geometry::{AttributeKind, VertexAttribute};

use crate::types::BufferUsage;

/// Fixed partition of a mesh's attribute data.
///
/// Each stream is backed by at most one vertex buffer. The order is both
/// the slot index and the binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshStream {
    /// Positions and anything interleaved with them.
    Geometry,
    /// Normals, tangents and binormals.
    Normal,
    /// Texture coordinate sets.
    TexCoord,
    /// Colors and generic attributes.
    Auxiliary,
}

bitflags! {
    /// A set of [`MeshStream`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StreamSet: u8 {
        const GEOMETRY = 1 << 0;
        const NORMAL = 1 << 1;
        const TEXCOORD = 1 << 2;
        const AUXILIARY = 1 << 3;
    }
}

impl MeshStream {
    pub const COUNT: usize = 4;

    pub const ALL: [MeshStream; Self::COUNT] =
        [Self::Geometry, Self::Normal, Self::TexCoord, Self::Auxiliary];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn flag(self) -> StreamSet {
        match self {
            Self::Geometry => StreamSet::GEOMETRY,
            Self::Normal => StreamSet::NORMAL,
            Self::TexCoord => StreamSet::TEXCOORD,
            Self::Auxiliary => StreamSet::AUXILIARY,
        }
    }

    /// Stream for a root array and its children, given their attributes in
    /// chain order.
    ///
    /// A position anywhere pins the chain to [`MeshStream::Geometry`].
    /// Otherwise the last matching rule wins: normal-family attributes select
    /// [`MeshStream::Normal`], other non-texcoord attributes select
    /// [`MeshStream::Auxiliary`], and a texcoord selects
    /// [`MeshStream::TexCoord`] only over an auxiliary or empty choice.
    pub fn for_chain(attributes: impl IntoIterator<Item = VertexAttribute>) -> Self {
        let mut stream = None;
        for attribute in attributes {
            match attribute.kind() {
                AttributeKind::Position => return Self::Geometry,
                AttributeKind::NormalFamily => stream = Some(Self::Normal),
                AttributeKind::TexCoord => {
                    if matches!(stream, None | Some(Self::Auxiliary)) {
                        stream = Some(Self::TexCoord);
                    }
                }
                AttributeKind::Other => stream = Some(Self::Auxiliary),
            }
        }
        stream.unwrap_or(Self::Auxiliary)
    }
}

impl StreamSet {
    /// Streams in the set, in slot order.
    pub fn streams(self) -> impl Iterator<Item = MeshStream> {
        MeshStream::ALL
            .into_iter()
            .filter(move |s| self.contains(s.flag()))
    }
}

/// How a mesh distributes its arrays over streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildMode {
    /// Each array goes to the stream its attributes select.
    #[default]
    IndependentStreams,
    /// Every array goes to [`MeshStream::Geometry`].
    GlobalStream,
}

/// Usage hints for the stream buffers and the index buffer of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamUsages {
    /// Indexed by [`MeshStream::index`].
    pub streams: [BufferUsage; MeshStream::COUNT],
    pub indices: BufferUsage,
}

impl Default for StreamUsages {
    fn default() -> Self {
        Self {
            streams: [
                BufferUsage::StaticDraw,
                BufferUsage::StaticDraw,
                BufferUsage::StaticDraw,
                BufferUsage::DynamicDraw,
            ],
            indices: BufferUsage::StaticDraw,
        }
    }
}

impl StreamUsages {
    pub fn stream(&self, stream: MeshStream) -> BufferUsage {
        self.streams[stream.index()]
    }
}
