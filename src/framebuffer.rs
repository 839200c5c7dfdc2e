//! 1-bpp framebuffer matching the memory LCD line format.
//!
//! Rows are 18 bytes, MSB is the leftmost pixel, a set bit is `BinaryColor::On`
//! (white on the panel). The panel driver streams rows straight out of here.

use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Pixel, Size},
};

use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub const ROW_BYTES: usize = (SCREEN_WIDTH as usize + 7) / 8;
pub const FRAME_BYTES: usize = ROW_BYTES * SCREEN_HEIGHT as usize;

pub struct Framebuffer {
    bits: [u8; FRAME_BYTES],
}

impl Framebuffer {
    pub const fn new() -> Self {
        Self { bits: [0; FRAME_BYTES] }
    }

    pub fn fill(&mut self, color: BinaryColor) {
        let byte = if color.is_on() { 0xFF } else { 0x00 };
        self.bits.fill(byte);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return None;
        }
        let byte = self.bits[y as usize * ROW_BYTES + (x / 8) as usize];
        if byte & (0x80 >> (x % 8)) != 0 {
            Some(BinaryColor::On)
        } else {
            Some(BinaryColor::Off)
        }
    }

    /// Packed pixels of row `y` (0-based).
    pub fn row(&self, y: usize) -> &[u8] {
        &self.bits[y * ROW_BYTES..(y + 1) * ROW_BYTES]
    }

    #[inline]
    fn set(&mut self, x: u32, y: u32, color: BinaryColor) {
        let index = y as usize * ROW_BYTES + (x / 8) as usize;
        let mask = 0x80u8 >> (x % 8);
        if color.is_on() {
            self.bits[index] |= mask;
        } else {
            self.bits[index] &= !mask;
        }
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Drop anything off-screen
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
                self.set(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}
