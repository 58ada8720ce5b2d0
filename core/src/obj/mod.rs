//! Wavefront OBJ import.
//!
//! Parses `.obj` text into one [`ObjMesh`] per object or group. Faces are
//! triangulated as fans. Each mesh carries positions and, when every face
//! corner provides them, texture coordinates and normals.
//!
//! # Example
//!
//! ```ignore
//! use strata_core::obj::{parse_obj, ObjOptions};
//!
//! let source = std::fs::read_to_string("cube.obj")?;
//! let model = parse_obj(&source, &ObjOptions::default())?;
//! for mesh in &model.meshes {
//!     let geometry = mesh.to_geometry()?;
//!     println!("{:?}: {} vertices", mesh.name, geometry.vertex_count());
//! }
//! ```

mod error;
mod parser;

pub use error::ObjError;
pub use parser::{parse_obj, ObjMesh, ObjModel, ObjOptions};
