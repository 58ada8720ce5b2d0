//! Point sprite state.

/// How points are rasterized while a material with point sprites is in use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSprite {
    size: f32,
    smooth: bool,
    textured: bool,
    attenuation: [f32; 3],
    min_size: f32,
    max_size: f32,
}

impl Default for PointSprite {
    fn default() -> Self {
        Self {
            size: 1.0,
            smooth: false,
            textured: false,
            attenuation: [1.0, 0.0, 0.0],
            min_size: 1.0,
            max_size: 64.0,
        }
    }
}

impl PointSprite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point size in pixels.
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    /// Whether points are antialiased.
    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        self.smooth = smooth;
    }

    /// Whether texture coordinates are generated across each point.
    pub fn is_textured(&self) -> bool {
        self.textured
    }

    pub fn set_textured(&mut self, textured: bool) {
        self.textured = textured;
    }

    /// Constant, linear and quadratic distance attenuation.
    pub fn attenuation(&self) -> [f32; 3] {
        self.attenuation
    }

    pub fn set_attenuation(&mut self, constant: f32, linear: f32, quadratic: f32) {
        self.attenuation = [constant, linear, quadratic];
    }

    pub fn min_size(&self) -> f32 {
        self.min_size
    }

    pub fn max_size(&self) -> f32 {
        self.max_size
    }

    /// Clamp range of the attenuated size.
    pub fn set_size_range(&mut self, min_size: f32, max_size: f32) {
        self.min_size = min_size;
        self.max_size = max_size;
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Enable texture coordinate generation.
    #[must_use]
    pub fn with_texture(mut self) -> Self {
        self.textured = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let sprite = PointSprite::default();
        assert_eq!(sprite.size(), 1.0);
        assert!(!sprite.is_smooth());
        assert!(!sprite.is_textured());
        assert_eq!(sprite.attenuation(), [1.0, 0.0, 0.0]);
        assert_eq!(sprite.min_size(), 1.0);
        assert_eq!(sprite.max_size(), 64.0);
    }

    #[test]
    fn test_setters() {
        let mut sprite = PointSprite::new().with_size(4.0).with_texture();
        sprite.set_smooth(true);
        sprite.set_attenuation(0.0, 0.5, 0.25);
        sprite.set_size_range(2.0, 32.0);

        assert_eq!(sprite.size(), 4.0);
        assert!(sprite.is_textured());
        assert!(sprite.is_smooth());
        assert_eq!(sprite.attenuation(), [0.0, 0.5, 0.25]);
        assert_eq!((sprite.min_size(), sprite.max_size()), (2.0, 32.0));
    }
}
