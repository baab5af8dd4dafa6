//! Texture asset
//!
//! Decodes PNG, JPEG and BMP images into tightly packed RGBA8 pixels ready
//! for upload by a render backend.

use super::{Asset, AssetError};

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    /// Create a solid color texture (useful for testing and defaults)
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: color.repeat(pixel_count),
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA pixel data, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at (`x`, `y`)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let rgba = self.pixels.get(offset..offset + 4)?;
        Some([rgba[0], rgba[1], rgba[2], rgba[3]])
    }
}

impl Asset for Texture {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to decode texture: {e}")))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded texture {width}x{height}");

        Ok(Self { width, height, pixels: rgba.into_raw() })
    }

    fn release(&mut self) {
        self.pixels = Vec::new();
    }
}
