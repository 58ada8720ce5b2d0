//! Graphics configuration loaded from TOML.
//!
//! ```toml
//! [render]
//! preferred_mode = "vertex_buffer_object"
//! disable_vertex_array_objects = true
//!
//! [usage]
//! auxiliary = "stream_draw"
//!
//! [streams]
//! normal = false
//!
//! [loader]
//! generate_indices = false
//! ```
//!
//! Every section and field is optional.

use std::path::Path;

use serde::Deserialize;
use strata_core::obj::ObjOptions;

use crate::error::GraphicsError;
use crate::mesh::{StreamSet, StreamUsages};
use crate::types::BufferUsage;
use crate::vertex::RenderMode;

/// Top-level graphics configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub render: RenderConfig,
    pub usage: UsageConfig,
    pub streams: StreamConfig,
    pub loader: LoaderConfig,
}

/// Render mode selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Highest mode meshes are built in. Lowered to what the device supports.
    pub preferred_mode: RenderMode,
    /// Treat the device as lacking vertex array objects.
    pub disable_vertex_array_objects: bool,
    /// Treat the device as lacking buffer objects.
    pub disable_vertex_buffer_objects: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            preferred_mode: RenderMode::UnifiedVertexArrayObject,
            disable_vertex_array_objects: false,
            disable_vertex_buffer_objects: false,
        }
    }
}

/// Usage hints for mesh streams and index buffers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    pub geometry: BufferUsage,
    pub normal: BufferUsage,
    pub texcoord: BufferUsage,
    pub auxiliary: BufferUsage,
    pub indices: BufferUsage,
}

impl Default for UsageConfig {
    fn default() -> Self {
        let usages = StreamUsages::default();
        Self {
            geometry: usages.streams[0],
            normal: usages.streams[1],
            texcoord: usages.streams[2],
            auxiliary: usages.streams[3],
            indices: usages.indices,
        }
    }
}

/// Initial global stream switches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub geometry: bool,
    pub normal: bool,
    pub texcoord: bool,
    pub auxiliary: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            geometry: true,
            normal: true,
            texcoord: true,
            auxiliary: true,
        }
    }
}

impl StreamConfig {
    pub fn enabled(&self) -> StreamSet {
        let mut set = StreamSet::empty();
        set.set(StreamSet::GEOMETRY, self.geometry);
        set.set(StreamSet::NORMAL, self.normal);
        set.set(StreamSet::TEXCOORD, self.texcoord);
        set.set(StreamSet::AUXILIARY, self.auxiliary);
        set
    }
}

/// Asset import options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Build index buffers for imported meshes by de-duplicating vertices.
    pub generate_indices: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            generate_indices: true,
        }
    }
}

impl LoaderConfig {
    pub fn obj_options(&self) -> ObjOptions {
        ObjOptions {
            generate_indices: self.generate_indices,
        }
    }
}

impl GraphicsConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, GraphicsError> {
        toml::from_str(content).map_err(|e| GraphicsError::Config(e.to_string()))
    }

    /// Usage hints in stream order.
    pub fn stream_usages(&self) -> StreamUsages {
        StreamUsages {
            streams: [
                self.usage.geometry,
                self.usage.normal,
                self.usage.texcoord,
                self.usage.auxiliary,
            ],
            indices: self.usage.indices,
        }
    }
}

/// Load a configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GraphicsConfig, GraphicsError> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| GraphicsError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Load a configuration, falling back to defaults if it cannot be read.
pub fn load_or_default(path: &Path) -> GraphicsConfig {
    match load_config(path) {
        Ok(config) => {
            log::info!(
                "Loaded graphics config from {} (preferred mode {:?})",
                path.display(),
                config.render.preferred_mode
            );
            config
        }
        Err(e) => {
            log::warn!("No graphics config ({e}), using defaults");
            GraphicsConfig::default()
        }
    }
}
