//! Texture formats and CPU-side pixel data.

use crate::error::GraphicsError;
use crate::types::Extent2d;

// ============================================================================
// TextureFormat
// ============================================================================

/// Pixel formats supported by the texture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA, the working format for decoded image assets.
    #[default]
    Rgba8,
    /// 8-bit RGB without alpha.
    Rgb8,
    /// Single 8-bit channel.
    R8,
    /// Combined 24-bit depth and 8-bit stencil, render targets only.
    Depth24Stencil8,
}

impl TextureFormat {
    /// Number of bytes per pixel for CPU-side payloads.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
            Self::R8 => 1,
            Self::Depth24Stencil8 => 4,
        }
    }

    /// Whether this format is a depth/stencil format.
    ///
    /// Depth/stencil textures are only valid as render target attachments
    /// and never carry CPU-side pixel data.
    pub fn is_depth_stencil(&self) -> bool {
        matches!(self, Self::Depth24Stencil8)
    }
}

// ============================================================================
// CpuTexture
// ============================================================================

/// Decoded pixel data waiting to be uploaded to the GPU.
///
/// This is the hand-off payload between the loading thread, which decodes
/// image bytes, and the render thread, which turns the pixels into a GPU
/// texture. The buffer is tightly packed with no row padding.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    format: TextureFormat,
    extent: Extent2d,
    pixels: Vec<u8>,
    label: String,
}

impl CpuTexture {
    /// Create a texture from raw pixel data.
    ///
    /// The pixel buffer length must match `width * height` times the
    /// format's bytes per pixel, and depth/stencil formats are rejected.
    pub fn new(
        format: TextureFormat,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, GraphicsError> {
        if format.is_depth_stencil() {
            return Err(GraphicsError::InvalidParameter(format!(
                "{format:?} cannot carry CPU pixel data"
            )));
        }
        let extent = Extent2d::new(width, height);
        let expected = extent.pixel_count() * format.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(GraphicsError::InvalidParameter(format!(
                "pixel buffer is {} bytes, expected {} for {}x{} {:?}",
                pixels.len(),
                expected,
                width,
                height,
                format
            )));
        }
        Ok(Self {
            format,
            extent,
            pixels,
            label: String::new(),
        })
    }

    /// Create an RGBA8 texture from raw pixel data.
    pub fn rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, GraphicsError> {
        Self::new(TextureFormat::Rgba8, width, height, pixels)
    }

    /// Create a 1x1 RGBA8 texture of a single color.
    ///
    /// Used for the built-in placeholder set.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            format: TextureFormat::Rgba8,
            extent: Extent2d::new(1, 1),
            pixels: rgba.to_vec(),
            label: String::new(),
        }
    }

    /// Attach a human-readable label, usually the asset path.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Pixel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Texture dimensions.
    pub fn extent(&self) -> Extent2d {
        self.extent
    }

    /// Raw pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Label attached via [`CpuTexture::with_label`].
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Approximate CPU memory held by this texture, in bytes.
    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }
}
