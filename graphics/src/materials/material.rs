//! Material definition.
//!
//! A [`Material`] carries the fixed-function lighting colors, blending and
//! point sprite state applied by [`GraphicsDevice::use_material`](crate::GraphicsDevice::use_material).

use super::point_sprite::PointSprite;

/// Blend factor for blending operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    /// 0.0
    #[default]
    Zero,
    /// 1.0
    One,
    /// Source color
    Src,
    /// 1 - source color
    OneMinusSrc,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
    /// Destination color
    Dst,
    /// 1 - destination color
    OneMinusDst,
    /// Destination alpha
    DstAlpha,
    /// 1 - destination alpha
    OneMinusDstAlpha,
    /// min(source alpha, 1 - destination alpha)
    SrcAlphaSaturated,
}

/// Blend operation for combining colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// source + destination
    #[default]
    Add,
    /// source - destination
    Subtract,
    /// destination - source
    ReverseSubtract,
}

/// Blend component configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// Source factor.
    pub src_factor: BlendFactor,
    /// Destination factor.
    pub dst_factor: BlendFactor,
    /// Blend operation.
    pub operation: BlendOperation,
}

impl Default for BlendComponent {
    fn default() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::Zero,
            operation: BlendOperation::Add,
        }
    }
}

impl BlendComponent {
    /// Create an over blending component (standard alpha blending).
    pub fn over() -> Self {
        Self {
            src_factor: BlendFactor::SrcAlpha,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        }
    }

    /// Create an additive blending component.
    pub fn additive() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::One,
            operation: BlendOperation::Add,
        }
    }
}

/// Which lighting color of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialColor {
    Ambient,
    Diffuse,
    Specular,
    Emission,
}

impl MaterialColor {
    pub const ALL: [MaterialColor; 4] = [
        Self::Ambient,
        Self::Diffuse,
        Self::Specular,
        Self::Emission,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Lighting colors, blending and point sprite state.
///
/// # Example
///
/// ```ignore
/// let mut material = Material::new();
/// material.set_color(MaterialColor::Diffuse, [1.0, 0.5, 0.0, 1.0]);
/// material.set_blending(BlendComponent::over());
/// material.set_point_sprite(PointSprite::new().with_size(8.0));
/// material.set_use_point_sprite(true);
///
/// device.use_material(Some(&material));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    label: Option<String>,
    colors: [[f32; 4]; 4],
    shininess: f32,
    blending: bool,
    blend: BlendComponent,
    point_sprite: PointSprite,
    use_point_sprite: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            label: None,
            colors: [
                [0.2, 0.2, 0.2, 1.0],
                [0.8, 0.8, 0.8, 1.0],
                [0.0, 0.0, 0.0, 1.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            shininess: 0.0,
            blending: false,
            blend: BlendComponent::default(),
            point_sprite: PointSprite::default(),
            use_point_sprite: false,
        }
    }
}

impl Material {
    /// Create a material with the default lighting colors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get an RGBA color.
    pub fn color(&self, which: MaterialColor) -> [f32; 4] {
        self.colors[which.index()]
    }

    pub fn set_color(&mut self, which: MaterialColor, rgba: [f32; 4]) {
        self.colors[which.index()] = rgba;
    }

    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }

    /// Blend function, if blending is enabled.
    pub fn blending(&self) -> Option<&BlendComponent> {
        self.blending.then_some(&self.blend)
    }

    /// Set the blend function and enable blending.
    pub fn set_blending(&mut self, blend: BlendComponent) {
        self.blend = blend;
        self.blending = true;
    }

    /// Turn blending on or off, keeping the blend function.
    pub fn set_blending_enabled(&mut self, enabled: bool) {
        self.blending = enabled;
    }

    pub fn point_sprite(&self) -> &PointSprite {
        &self.point_sprite
    }

    pub fn point_sprite_mut(&mut self) -> &mut PointSprite {
        &mut self.point_sprite
    }

    pub fn set_point_sprite(&mut self, point_sprite: PointSprite) {
        self.point_sprite = point_sprite;
    }

    /// Whether the point sprite is applied with the material.
    pub fn use_point_sprite(&self) -> bool {
        self.use_point_sprite
    }

    pub fn set_use_point_sprite(&mut self, enabled: bool) {
        self.use_point_sprite = enabled;
    }
}

// Ensure Material is Send + Sync
static_assertions::assert_impl_all!(Material: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_colors() {
        let material = Material::new();
        assert_eq!(material.color(MaterialColor::Ambient), [0.2, 0.2, 0.2, 1.0]);
        assert_eq!(material.color(MaterialColor::Diffuse), [0.8, 0.8, 0.8, 1.0]);
        assert_eq!(material.color(MaterialColor::Specular), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(material.color(MaterialColor::Emission), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(material.shininess(), 0.0);
        assert!(material.blending().is_none());
        assert!(!material.use_point_sprite());
    }

    #[test]
    fn test_blending_toggle_keeps_function() {
        let mut material = Material::new();
        material.set_blending(BlendComponent::over());
        assert_eq!(material.blending(), Some(&BlendComponent::over()));

        material.set_blending_enabled(false);
        assert!(material.blending().is_none());
        material.set_blending_enabled(true);
        assert_eq!(
            material.blending().map(|b| b.src_factor),
            Some(BlendFactor::SrcAlpha)
        );
    }

    #[test]
    fn test_point_sprite_model() {
        let mut material = Material::new().with_label("sparks");
        material.point_sprite_mut().set_size(6.0);
        material.set_use_point_sprite(true);
        assert_eq!(material.point_sprite().size(), 6.0);
        assert_eq!(material.label(), Some("sparks"));
    }
}
