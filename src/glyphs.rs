//! Digit glyph catalog and the packaged-asset loader.
//!
//! Twenty glyphs are packaged with the firmware: digits 0-9 in a bold and a
//! regular weight. Each asset is a zlib stream holding a small header
//! (width, height as little-endian `u16`) followed by 1-bpp rows, MSB first.
//!
//! `GlyphStore` inflates an asset into an owned `GlyphImage` and keeps a count
//! of images that are still alive, so teardown can be checked for leaks.

use alloc::{rc::Rc, vec::Vec};
use core::cell::Cell;
use core::fmt;

use embedded_graphics::{
    image::ImageRaw,
    pixelcolor::BinaryColor,
    prelude::Size,
};
use miniz_oxide::inflate::decompress_to_vec_zlib_with_limit;

use crate::config::{GLYPH_HEIGHT, GLYPH_WIDTH, MAX_GLYPH_PAYLOAD};

pub const DIGIT_COUNT: usize = 10;
pub const GLYPH_COUNT: usize = 2 * DIGIT_COUNT;

const HEADER_LEN: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Style {
    Bold,
    Regular,
}

impl Style {
    pub const ALL: [Style; 2] = [Style::Bold, Style::Regular];
}

/// A decimal digit, always in `0..=9`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digit(u8);

impl Digit {
    pub fn new(value: u8) -> Option<Self> {
        (value < DIGIT_COUNT as u8).then_some(Self(value))
    }

    /// Parse an ASCII `'0'..='9'` byte.
    pub fn from_ascii(c: u8) -> Option<Self> {
        c.is_ascii_digit().then(|| Self(c - b'0'))
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Digit> {
        (0..DIGIT_COUNT as u8).map(Digit)
    }
}

/// Identifier of one packaged glyph asset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlyphId(u8);

const DIGIT_NAMES: [&str; DIGIT_COUNT] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

impl GlyphId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn digit(self) -> Digit {
        Digit(self.0 % DIGIT_COUNT as u8)
    }

    pub fn style(self) -> Style {
        if (self.0 as usize) < DIGIT_COUNT {
            Style::Bold
        } else {
            Style::Regular
        }
    }
}

impl fmt::Display for GlyphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let weight = match self.style() {
            Style::Bold => "bold",
            Style::Regular => "regular",
        };
        write!(f, "{}_{}", DIGIT_NAMES[self.digit().value() as usize], weight)
    }
}

/// The catalog: (digit, style) -> asset.
pub fn glyph_for(digit: Digit, style: Style) -> GlyphId {
    match style {
        Style::Bold => GlyphId(digit.value()),
        Style::Regular => GlyphId(DIGIT_COUNT as u8 + digit.value()),
    }
}

pub type AssetTable = [Option<&'static [u8]>; GLYPH_COUNT];

/// Glyph assets compiled into the firmware image, in `GlyphId` order.
pub static PACKAGED_GLYPHS: AssetTable = [
    Some(include_bytes!("../assets/glyphs/zero_bold.bin")),
    Some(include_bytes!("../assets/glyphs/one_bold.bin")),
    Some(include_bytes!("../assets/glyphs/two_bold.bin")),
    Some(include_bytes!("../assets/glyphs/three_bold.bin")),
    Some(include_bytes!("../assets/glyphs/four_bold.bin")),
    Some(include_bytes!("../assets/glyphs/five_bold.bin")),
    Some(include_bytes!("../assets/glyphs/six_bold.bin")),
    Some(include_bytes!("../assets/glyphs/seven_bold.bin")),
    Some(include_bytes!("../assets/glyphs/eight_bold.bin")),
    Some(include_bytes!("../assets/glyphs/nine_bold.bin")),
    Some(include_bytes!("../assets/glyphs/zero_regular.bin")),
    Some(include_bytes!("../assets/glyphs/one_regular.bin")),
    Some(include_bytes!("../assets/glyphs/two_regular.bin")),
    Some(include_bytes!("../assets/glyphs/three_regular.bin")),
    Some(include_bytes!("../assets/glyphs/four_regular.bin")),
    Some(include_bytes!("../assets/glyphs/five_regular.bin")),
    Some(include_bytes!("../assets/glyphs/six_regular.bin")),
    Some(include_bytes!("../assets/glyphs/seven_regular.bin")),
    Some(include_bytes!("../assets/glyphs/eight_regular.bin")),
    Some(include_bytes!("../assets/glyphs/nine_regular.bin")),
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssetError {
    Missing(GlyphId),
    Corrupt(GlyphId),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Missing(id) => write!(f, "glyph asset `{id}` is missing"),
            AssetError::Corrupt(id) => write!(f, "glyph asset `{id}` is corrupt"),
        }
    }
}

/// A decoded glyph bitmap. Counted as live until dropped.
pub struct GlyphImage {
    id: GlyphId,
    size: Size,
    pixels: Vec<u8>,
    live: Rc<Cell<usize>>,
}

impl GlyphImage {
    pub fn id(&self) -> GlyphId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn raw(&self) -> ImageRaw<'_, BinaryColor> {
        ImageRaw::new(&self.pixels, self.size.width)
    }

    /// Pixel at (x, y) inside the glyph, `None` outside it.
    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let stride = row_stride(self.size.width);
        let byte = self.pixels[y as usize * stride + (x / 8) as usize];
        if byte & (0x80 >> (x % 8)) != 0 {
            Some(BinaryColor::On)
        } else {
            Some(BinaryColor::Off)
        }
    }
}

impl fmt::Debug for GlyphImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphImage")
            .field("id", &self.id)
            .field("size", &self.size)
            .finish()
    }
}

impl Drop for GlyphImage {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

#[inline]
fn row_stride(width: u32) -> usize {
    (width as usize + 7) / 8
}

/// Loads glyph images from an asset table.
pub struct GlyphStore {
    assets: &'static AssetTable,
    live: Rc<Cell<usize>>,
}

impl GlyphStore {
    pub fn new(assets: &'static AssetTable) -> Self {
        Self {
            assets,
            live: Rc::new(Cell::new(0)),
        }
    }

    pub fn packaged() -> Self {
        Self::new(&PACKAGED_GLYPHS)
    }

    /// Number of images handed out and not yet dropped.
    pub fn live_images(&self) -> usize {
        self.live.get()
    }

    pub fn load(&self, id: GlyphId) -> Result<GlyphImage, AssetError> {
        let packed = self.assets[id.index()].ok_or(AssetError::Missing(id))?;
        let payload = decompress_to_vec_zlib_with_limit(packed, MAX_GLYPH_PAYLOAD)
            .map_err(|_| AssetError::Corrupt(id))?;

        if payload.len() < HEADER_LEN {
            return Err(AssetError::Corrupt(id));
        }
        let width = u16::from_le_bytes([payload[0], payload[1]]) as u32;
        let height = u16::from_le_bytes([payload[2], payload[3]]) as u32;
        if width != GLYPH_WIDTH || height != GLYPH_HEIGHT {
            return Err(AssetError::Corrupt(id));
        }
        if payload.len() != HEADER_LEN + row_stride(width) * height as usize {
            return Err(AssetError::Corrupt(id));
        }
        let pixels = payload[HEADER_LEN..].to_vec();

        self.live.set(self.live.get() + 1);
        Ok(GlyphImage {
            id,
            size: Size::new(width, height),
            pixels,
            live: Rc::clone(&self.live),
        })
    }

    /// Decode every asset once so a broken pack is caught at startup.
    pub fn verify_all(&self) -> Result<(), AssetError> {
        for style in Style::ALL {
            for digit in Digit::all() {
                self.load(glyph_for(digit, style))?;
            }
        }
        Ok(())
    }
}
