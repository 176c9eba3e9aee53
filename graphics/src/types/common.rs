//! Common types shared across the graphics system.

// ============================================================================
// Extent2d
// ============================================================================

/// 2D extent for textures and render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent2d {
    /// Create a new extent.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Width divided by height, with a guard against zero height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Integer pixel rectangle used for viewports.
///
/// The origin is the lower-left corner, matching the OpenGL viewport
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the lower-left corner.
    pub x: i32,
    /// Y coordinate of the lower-left corner.
    pub y: i32,
    /// Width of the rectangle.
    pub width: u32,
    /// Height of the rectangle.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from dimensions with origin at (0, 0).
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Width divided by height, with a guard against zero height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl From<Extent2d> for Rect {
    fn from(extent: Extent2d) -> Self {
        Self::from_dimensions(extent.width, extent.height)
    }
}

// ============================================================================
// Color
// ============================================================================

/// Linear RGBA color with `f32` channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a new color.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from RGB channels.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Channels as an array, in RGBA order.
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Convert to 8-bit RGBA, clamping each channel to `[0, 1]`.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_pixel_count() {
        let extent = Extent2d::new(64, 32);
        assert_eq!(extent.pixel_count(), 2048);
    }

    #[test]
    fn test_aspect_ratio_guards_zero_height() {
        let rect = Rect::from_dimensions(1920, 0);
        assert_eq!(rect.aspect_ratio(), 1920.0);
    }

    #[test]
    fn test_color_to_rgba8_clamps() {
        let color = Color::new(1.5, -0.2, 0.5, 1.0);
        assert_eq!(color.to_rgba8(), [255, 0, 128, 255]);
    }
}
