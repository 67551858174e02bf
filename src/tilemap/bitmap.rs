//! Pixel bitmaps of 4-bit palette indices, stored one byte per pixel.
//!
//! Index 0 is transparent; indices 1-15 map into the editor palette. The same
//! type doubles as the per-cell layer-flag grid of a tilemap, where each
//! "pixel" is a flag byte for the matching grid cell.

/// A width x height grid of palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Create an all-transparent bitmap of the given dimensions.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Create a bitmap from raw pixel data. Returns `None` if the buffer
    /// length does not match the dimensions.
    pub fn from_pixels(width: u16, height: u16, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Palette index at (x, y). Out-of-range coordinates read as transparent.
    pub fn get(&self, x: u16, y: u16) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Set the palette index at (x, y). Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: u16, y: u16, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.pixels[y as usize * self.width as usize + x as usize] = value;
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// True if every pixel is transparent.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }
}
