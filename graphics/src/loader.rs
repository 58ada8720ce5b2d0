//! Mesh loading from Wavefront OBJ.
//!
//! The loader only goes through the public [`Mesh`] API; it never issues
//! GPU calls of its own.

use std::path::Path;
use std::sync::Arc;

use strata_core::obj::{parse_obj, ObjOptions};

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::mesh::{GeometryOwnership, Mesh};

/// Parse OBJ `source` and build one mesh per object.
///
/// `options` defaults to the `[loader]` section of the device configuration.
/// On failure no mesh is returned; meshes built before the failure are
/// dropped.
pub fn load_obj_meshes(
    device: &GraphicsDevice,
    source: &str,
    options: Option<ObjOptions>,
) -> Result<Vec<Mesh>, GraphicsError> {
    let options = options.unwrap_or_else(|| device.config().loader.obj_options());
    let model = parse_obj(source, &options)?;

    let mut meshes = Vec::with_capacity(model.meshes.len());
    for obj_mesh in &model.meshes {
        let geometry = Arc::new(obj_mesh.to_geometry()?);
        let mut mesh = Mesh::from_geometry(geometry, GeometryOwnership::Owned)?;
        mesh.auto_build(device).inspect_err(|e| {
            log::error!("OBJ loader: failed to build mesh {:?}: {}", obj_mesh.name, e);
        })?;
        meshes.push(mesh);
    }

    log::info!(
        "OBJ loader: loaded {} meshes (indexed: {})",
        meshes.len(),
        options.generate_indices
    );
    Ok(meshes)
}

/// Read an OBJ file and build one mesh per object.
pub fn load_obj_file(
    device: &GraphicsDevice,
    path: &Path,
    options: Option<ObjOptions>,
) -> Result<Vec<Mesh>, GraphicsError> {
    let source = std::fs::read_to_string(path).inspect_err(|e| {
        log::error!("OBJ loader: failed to read {}: {}", path.display(), e);
    })?;
    load_obj_meshes(device, &source, options)
}
