use core::fmt;

use crate::glyphs::AssetError;
use crate::layer::LayerTreeFull;

/// Errors surfaced by the watchface itself. All of them are fatal on the
/// device: a face with missing digits has nothing sensible to fall back to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WatchfaceError {
    Asset(AssetError),
    LayerTreeFull,
    NotADigit(u8),
    /// A tick carried an hour or minute that cannot be shown.
    InvalidTime { hour: u8, minute: u8 },
}

impl From<AssetError> for WatchfaceError {
    fn from(e: AssetError) -> Self {
        Self::Asset(e)
    }
}

impl From<LayerTreeFull> for WatchfaceError {
    fn from(_: LayerTreeFull) -> Self {
        Self::LayerTreeFull
    }
}

impl fmt::Display for WatchfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchfaceError::Asset(e) => write!(f, "{e}"),
            WatchfaceError::LayerTreeFull => f.write_str("window layer tree is full"),
            WatchfaceError::NotADigit(c) => write!(f, "byte 0x{c:02X} is not an ASCII digit"),
            WatchfaceError::InvalidTime { hour, minute } => {
                write!(f, "time {hour:02}:{minute:02} is out of range")
            }
        }
    }
}
