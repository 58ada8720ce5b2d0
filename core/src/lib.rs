//! # Strata Core
//!
//! GPU-agnostic data for the Strata renderer: geometry descriptions shared
//! with the graphics crate, and the Wavefront OBJ parser.

pub mod geometry;
pub mod obj;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core library version.
pub fn init() {
    log::info!("Strata Core v{} initialized", VERSION);
}
