#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod framebuffer;
pub mod glyphs;
pub mod layer;
pub mod rtc;
pub mod sharp_mlcd;
pub mod slots;

#[cfg(feature = "esp32s3")]
pub mod display;
#[cfg(feature = "esp32s3")]
pub mod input;
#[cfg(feature = "esp32s3")]
pub mod wiring;

pub use app::{WatchEvent, Watchface};
pub use error::WatchfaceError;
pub use slots::{DigitSlots, Slot, SlotState};
