//! Compile-time configuration: screen geometry, slot layout and timing.
//!
//! Display is a 144x168 monochrome memory LCD, (0,0) is top-left corner.
//! The four digit slots sit in the screen quadrants with a 4px margin.

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::{Point, Size},
    primitives::Rectangle,
};

use crate::glyphs::Style;

// Panel geometry
pub const SCREEN_WIDTH: u32 = 144;
pub const SCREEN_HEIGHT: u32 = 168;

// Every glyph asset is exactly one slot in size
pub const GLYPH_WIDTH: u32 = 72;
pub const GLYPH_HEIGHT: u32 = 73;

pub const SLOT_COUNT: usize = 4;

// Background + 4 digits, the rest is headroom
pub const MAX_LAYERS: usize = 8;

pub const BACKGROUND_COLOR: BinaryColor = BinaryColor::Off;

/// Fixed placement and style of one digit slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlotLayout {
    pub frame: Rectangle,
    pub style: Style,
}

const fn slot_rect(x: i32, y: i32) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size::new(GLYPH_WIDTH, GLYPH_HEIGHT))
}

/// Indexed by slot number: hours on top in bold, minutes below in regular.
pub const SLOT_LAYOUT: [SlotLayout; SLOT_COUNT] = [
    SlotLayout { frame: slot_rect(4, 4), style: Style::Bold },
    SlotLayout { frame: slot_rect(74, 4), style: Style::Bold },
    SlotLayout { frame: slot_rect(4, 86), style: Style::Regular },
    SlotLayout { frame: slot_rect(74, 86), style: Style::Regular },
];

// Main loop timing (device only)
pub const CLOCK_POLL_MS: u64 = 500;
pub const VCOM_TOGGLE_MS: u64 = 1000;
pub const DEBOUNCE_MS: u64 = 240;

// Upper bound on an inflated glyph asset: header + 73 rows of 9 bytes
pub const MAX_GLYPH_PAYLOAD: usize = 4 + 9 * 73;
