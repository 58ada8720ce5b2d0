//! Material system for the graphics engine.
//!
//! - [`Material`] - Lighting colors, blending and an optional point sprite
//! - [`PointSprite`] - Point rasterization state
//!
//! Materials are applied with [`GraphicsDevice::use_material`](crate::GraphicsDevice::use_material).

mod material;
mod point_sprite;

pub use material::{BlendComponent, BlendFactor, BlendOperation, Material, MaterialColor};
pub use point_sprite::PointSprite;
