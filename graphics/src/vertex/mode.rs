//! Render modes and the rules for switching between them.

use serde::Deserialize;

/// Strategy used to present vertex data to the GPU.
///
/// Ordered by what the host must support: each mode needs everything the
/// modes below it need.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Client-side arrays read from host memory at draw time.
    #[default]
    VertexArray,
    /// Data uploaded to buffer objects, attribute pointers set on every use.
    VertexBufferObject,
    /// One captured bind sequence per vertex buffer data entry.
    VertexArrayObject,
    /// One captured bind sequence covering every entry, held by the first.
    UnifiedVertexArrayObject,
}

/// `COMPATIBILITY[build][requested]`: may a buffer built in `build` mode
/// be switched to `requested`?
const COMPATIBILITY: [[bool; 4]; 4] = [
    // VA     VBO    VAO    UVAO
    [true, false, false, false], // built as VA
    [true, true, false, false],  // built as VBO
    [true, true, true, false],   // built as VAO
    [true, true, false, true],   // built as unified VAO
];

impl RenderMode {
    /// All modes, lowest requirement first.
    pub const ALL: [RenderMode; 4] = [
        Self::VertexArray,
        Self::VertexBufferObject,
        Self::VertexArrayObject,
        Self::UnifiedVertexArrayObject,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Whether data must live in a GPU buffer object.
    pub fn requires_buffer_object(self) -> bool {
        self >= Self::VertexBufferObject
    }

    /// Whether the mode replays captured bind sequences.
    pub fn uses_sequences(self) -> bool {
        self >= Self::VertexArrayObject
    }

    /// Whether a buffer built in `build` mode may be used in `requested` mode.
    ///
    /// Client arrays are always available. Buffer objects need a buffer-backed
    /// build. Sequence modes need exactly the sequences their own build captured.
    pub fn can_switch(build: RenderMode, requested: RenderMode) -> bool {
        COMPATIBILITY[build.index()][requested.index()]
    }
}
