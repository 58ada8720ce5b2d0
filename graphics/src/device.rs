//! Graphics device.
//!
//! The [`GraphicsDevice`] owns the backend, the capabilities probed from it
//! and the binding context. Buffers and meshes are built against it and bound
//! into it; draw calls operate on whatever is currently bound.

use std::sync::Arc;

use strata_core::geometry::PrimitiveTopology;

use crate::backend::{self, GpuBackend, IndexSource};
use crate::binding::{BindingState, DrawPath, IndexBinding};
use crate::config::GraphicsConfig;
use crate::error::GraphicsError;
use crate::materials::Material;
use crate::mesh::{MeshId, MeshStream, StreamSet};
use crate::types::BufferTarget;
use crate::vertex::RenderMode;

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Whether vertex data can live in GPU buffer objects.
    pub vertex_buffer_objects: bool,
    /// Whether attribute bindings can be captured into vertex array objects.
    pub vertex_array_objects: bool,
    /// Whether draws can be instanced.
    pub hardware_instancing: bool,
    /// Largest buffer, in bytes, that can be built.
    pub max_buffer_size: u64,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            vertex_buffer_objects: true,
            vertex_array_objects: true,
            hardware_instancing: true,
            max_buffer_size: 1 << 30, // 1 GB
        }
    }
}

impl DeviceCapabilities {
    /// Client arrays only.
    pub fn minimal() -> Self {
        Self {
            vertex_buffer_objects: false,
            vertex_array_objects: false,
            hardware_instancing: false,
            ..Default::default()
        }
    }

    /// Whether buffers can be built and bound in `mode`.
    pub fn supports(&self, mode: RenderMode) -> bool {
        match mode {
            RenderMode::VertexArray => true,
            RenderMode::VertexBufferObject => self.vertex_buffer_objects,
            RenderMode::VertexArrayObject | RenderMode::UnifiedVertexArrayObject => {
                self.vertex_buffer_objects && self.vertex_array_objects
            }
        }
    }

    /// Highest supported mode not above `requested`.
    pub fn select_render_mode(&self, requested: RenderMode) -> RenderMode {
        RenderMode::ALL
            .into_iter()
            .rev()
            .filter(|&mode| mode <= requested)
            .find(|&mode| self.supports(mode))
            .unwrap_or(RenderMode::VertexArray)
    }

    /// Unified vertex array objects, then buffer objects, then client arrays.
    pub fn best_render_mode(&self) -> RenderMode {
        self.select_render_mode(RenderMode::UnifiedVertexArrayObject)
    }
}

/// A graphics device: backend, capabilities and binding context.
///
/// Capabilities are probed from the backend once, when the device is
/// created, and masked by the `[render]` section of the configuration.
///
/// # Example
///
/// ```ignore
/// let mut device = GraphicsDevice::create(GraphicsConfig::default())?;
///
/// let mut mesh = Mesh::from_geometry(geometry, GeometryOwnership::Owned)?;
/// mesh.auto_build(&device)?;
///
/// mesh.bind(&mut device)?;
/// device.render_mesh()?;
/// device.unbind_mesh();
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    capabilities: DeviceCapabilities,
    config: GraphicsConfig,
    bindings: BindingState,
}

impl GraphicsDevice {
    /// Create a device over `backend`.
    pub fn new(backend: Arc<dyn GpuBackend>, config: GraphicsConfig) -> Self {
        let mut capabilities = backend.capabilities();
        if config.render.disable_vertex_buffer_objects {
            capabilities.vertex_buffer_objects = false;
        }
        if config.render.disable_vertex_array_objects {
            capabilities.vertex_array_objects = false;
        }
        log::info!(
            "GraphicsDevice: {} backend, best render mode {:?}",
            backend.name(),
            capabilities.best_render_mode()
        );
        log::debug!("GraphicsDevice: capabilities {capabilities:?}");

        let bindings = BindingState::new(config.streams.enabled());
        Self {
            backend,
            capabilities,
            config,
            bindings,
        }
    }

    /// Create a device over `backend` with the default configuration.
    pub fn with_backend(backend: Arc<dyn GpuBackend>) -> Self {
        Self::new(backend, GraphicsConfig::default())
    }

    /// Create a device over the default backend.
    pub fn create(config: GraphicsConfig) -> Result<Self, GraphicsError> {
        Ok(Self::new(backend::create_backend()?, config))
    }

    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    pub fn supports_render_mode(&self, mode: RenderMode) -> bool {
        self.capabilities.supports(mode)
    }

    /// Highest mode not above `requested` this device supports.
    pub fn select_render_mode(&self, requested: RenderMode) -> RenderMode {
        let mode = self.capabilities.select_render_mode(requested);
        if mode != requested {
            log::debug!("GraphicsDevice: {requested:?} unavailable, using {mode:?}");
        }
        mode
    }

    /// Mode meshes are built in by default.
    pub fn preferred_render_mode(&self) -> RenderMode {
        self.select_render_mode(self.config.render.preferred_mode)
    }

    pub fn bindings(&self) -> &BindingState {
        &self.bindings
    }

    pub(crate) fn bindings_mut(&mut self) -> &mut BindingState {
        &mut self.bindings
    }

    // ========================================================================
    // Stream switches
    // ========================================================================

    pub fn enable_stream(&mut self, stream: MeshStream) {
        self.set_stream_enabled(stream, true);
    }

    pub fn disable_stream(&mut self, stream: MeshStream) {
        self.set_stream_enabled(stream, false);
    }

    /// Turn binding of `stream` on or off for every mesh bound afterwards.
    pub fn set_stream_enabled(&mut self, stream: MeshStream, enabled: bool) {
        self.bindings.set_stream_enabled(stream, enabled);
    }

    pub fn is_stream_enabled(&self, stream: MeshStream) -> bool {
        self.bindings.is_stream_enabled(stream)
    }

    pub fn enabled_streams(&self) -> StreamSet {
        self.bindings.enabled_streams()
    }

    // ========================================================================
    // Draws
    // ========================================================================

    /// Draw every vertex of the active vertex buffer.
    pub fn draw_arrays(&self, topology: PrimitiveTopology) -> Result<(), GraphicsError> {
        self.issue_arrays(topology, 1)
    }

    /// Draw every vertex of the active vertex buffer `instances` times.
    pub fn draw_arrays_instanced(
        &self,
        topology: PrimitiveTopology,
        instances: u32,
    ) -> Result<(), GraphicsError> {
        if self.check_instancing(instances)? {
            self.issue_arrays(topology, instances)?;
        }
        Ok(())
    }

    /// Draw every index of the active index buffer.
    pub fn draw_indexed(&self, topology: PrimitiveTopology) -> Result<(), GraphicsError> {
        self.issue_indexed(topology, 1)
    }

    /// Draw every index of the active index buffer `instances` times.
    pub fn draw_indexed_instanced(
        &self,
        topology: PrimitiveTopology,
        instances: u32,
    ) -> Result<(), GraphicsError> {
        if self.check_instancing(instances)? {
            self.issue_indexed(topology, instances)?;
        }
        Ok(())
    }

    /// Returns `false` when there is nothing to draw.
    fn check_instancing(&self, instances: u32) -> Result<bool, GraphicsError> {
        if instances == 0 {
            return Ok(false);
        }
        if !self.capabilities.hardware_instancing {
            log::warn!("GraphicsDevice: instanced draw without hardware instancing");
            return Err(GraphicsError::FeatureNotSupported(
                "hardware instancing".to_string(),
            ));
        }
        Ok(true)
    }

    fn issue_arrays(&self, topology: PrimitiveTopology, instances: u32) -> Result<(), GraphicsError> {
        let Some(active) = self.bindings.vertex_buffer() else {
            log::warn!("GraphicsDevice: draw with no vertex buffer bound");
            return Err(GraphicsError::NoActiveVertexBuffer);
        };
        self.backend
            .draw_arrays(topology, 0, active.vertex_count, instances);
        Ok(())
    }

    fn issue_indexed(
        &self,
        topology: PrimitiveTopology,
        instances: u32,
    ) -> Result<(), GraphicsError> {
        let Some(active) = self.bindings.index_buffer() else {
            log::warn!("GraphicsDevice: indexed draw with no index buffer bound");
            return Err(GraphicsError::NoActiveIndexBuffer);
        };
        match &active.binding {
            IndexBinding::Buffer => self.backend.draw_elements(
                topology,
                active.format,
                active.count,
                IndexSource::Buffer(0),
                instances,
            ),
            IndexBinding::Client(storage) => {
                let bytes = storage.read();
                self.backend.draw_elements(
                    topology,
                    active.format,
                    active.count,
                    IndexSource::Client(&bytes),
                    instances,
                );
            }
        }
        Ok(())
    }

    /// Draw the bound mesh.
    pub fn render_mesh(&self) -> Result<(), GraphicsError> {
        self.render_mesh_instanced(1)
    }

    /// Draw the bound mesh `instances` times.
    ///
    /// A single instance is drawn with the plain draw call and needs no
    /// instancing support.
    pub fn render_mesh_instanced(&self, instances: u32) -> Result<(), GraphicsError> {
        let Some(mesh) = self.bindings.mesh().cloned() else {
            log::warn!("GraphicsDevice: render with no mesh bound");
            return Err(GraphicsError::NoActiveMesh);
        };
        match (mesh.draw_path, instances) {
            (DrawPath::Arrays, 1) => self.draw_arrays(mesh.topology),
            (DrawPath::Arrays, n) => self.draw_arrays_instanced(mesh.topology, n),
            (DrawPath::Indexed, 1) => self.draw_indexed(mesh.topology),
            (DrawPath::Indexed, n) => self.draw_indexed_instanced(mesh.topology, n),
        }
    }

    /// Unbind the active vertex and index buffers.
    pub fn finish(&mut self) {
        if self.bindings.vertex_buffer().is_none() && self.bindings.index_buffer().is_none() {
            return;
        }
        self.backend.bind_buffer(BufferTarget::Array, None);
        self.backend.bind_buffer(BufferTarget::ElementArray, None);
        self.backend.disable_vertex_attributes();
        self.bindings.clear_buffers();
    }

    /// Unbind the bound mesh and its buffers.
    pub fn unbind_mesh(&mut self) {
        self.finish();
        if let Some(mesh) = self.bindings.mesh() {
            log::trace!("GraphicsDevice: unbound mesh {:?}", mesh.id);
        }
        self.bindings.set_mesh(None);
        self.bindings.clear_buffers();
    }

    /// Unbind `mesh` if it is the bound mesh.
    pub(crate) fn forget_mesh(&mut self, mesh: MeshId) {
        if self.bindings.forget_mesh(mesh) {
            self.backend.bind_buffer(BufferTarget::Array, None);
            self.backend.bind_buffer(BufferTarget::ElementArray, None);
            self.backend.disable_vertex_attributes();
            log::trace!("GraphicsDevice: forgot mesh {:?}", mesh);
        }
    }

    // ========================================================================
    // Materials
    // ========================================================================

    /// Apply `material`, or restore default state with `None`.
    ///
    /// Restoring does nothing unless a material is active.
    pub fn use_material(&mut self, material: Option<&Material>) {
        match material {
            Some(material) => {
                self.backend.apply_material(Some(material));
                self.backend.apply_point_sprite(
                    material
                        .use_point_sprite()
                        .then(|| material.point_sprite()),
                );
                self.bindings.set_material_active(true);
            }
            None if self.bindings.material_active() => {
                self.backend.apply_point_sprite(None);
                self.backend.apply_material(None);
                self.bindings.set_material_active(false);
            }
            None => {}
        }
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("capabilities", &self.capabilities)
            .field("bindings", &self.bindings)
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
