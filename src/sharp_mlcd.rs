// Sharp memory-in-pixel LCD driver (LS013B7DH05 class, 144x168, 1 bpp).
// Works with any embedded-hal 1.0 `SpiDevice` and a DISP enable pin.
//
// Protocol (SPI mode 0, MSB first, SCS is active HIGH):
//   Every transfer starts with a mode byte: M0 (0x80) = data update,
//   M1 (0x40) = VCOM level, M2 (0x20) = all clear.
//   Data update: for each line, gate address (1-based, sent LSB first so the
//   byte is bit-reversed here), 18 data bytes, 8 dummy bits; then 8 more
//   dummy bits closing the transfer.
//   VCOM must alternate about once a second or the panel builds up DC bias.

use core::fmt;

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::config::SCREEN_HEIGHT;
use crate::framebuffer::{Framebuffer, ROW_BYTES};

const MODE_UPDATE: u8 = 0x80;
const MODE_VCOM: u8 = 0x40;
const MODE_CLEAR: u8 = 0x20;

const LINES: usize = SCREEN_HEIGHT as usize;
const LINE_LEN: usize = 1 + ROW_BYTES + 1;
pub const FLUSH_LEN: usize = 1 + LINES * LINE_LEN + 1;

/// Error type that wraps SPI and GPIO errors.
#[derive(Debug)]
pub enum SharpError<SpiE, GpioE> {
    Spi(SpiE),
    Gpio(GpioE),
}

impl<SpiE: fmt::Debug, GpioE: fmt::Debug> fmt::Display for SharpError<SpiE, GpioE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharpError::Spi(e) => write!(f, "panel SPI error: {e:?}"),
            SharpError::Gpio(e) => write!(f, "panel DISP pin error: {e:?}"),
        }
    }
}

pub struct SharpMemoryDisplay<SPI, DISP> {
    spi: SPI,
    disp: DISP,
    vcom: bool,
    enabled: bool,
    tx: [u8; FLUSH_LEN],
}

impl<SPI, DISP> SharpMemoryDisplay<SPI, DISP>
where
    SPI: SpiDevice<u8>,
    DISP: OutputPin,
{
    /// Clear panel memory, then switch the display on. Call once at startup.
    pub fn new(
        spi: SPI,
        disp: DISP,
        delay: &mut impl DelayNs,
    ) -> Result<Self, SharpError<SPI::Error, DISP::Error>> {
        let mut this = Self {
            spi,
            disp,
            vcom: false,
            enabled: false,
            tx: [0; FLUSH_LEN],
        };
        // Keep the glass off until memory holds something sane
        this.disp.set_low().map_err(SharpError::Gpio)?;
        this.clear()?;
        delay.delay_us(30);
        this.set_enabled(true)?;
        Ok(this)
    }

    #[inline]
    fn vcom_bit(&self) -> u8 {
        if self.vcom {
            MODE_VCOM
        } else {
            0
        }
    }

    pub fn vcom(&self) -> bool {
        self.vcom
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    // All-clear: every pixel white-off (black on a reflective panel)
    pub fn clear(&mut self) -> Result<(), SharpError<SPI::Error, DISP::Error>> {
        let cmd = [MODE_CLEAR | self.vcom_bit(), 0x00];
        self.spi.write(&cmd).map_err(SharpError::Spi)
    }

    /// Flip VCOM with a mode-only transfer; call about once per second.
    pub fn toggle_vcom(&mut self) -> Result<(), SharpError<SPI::Error, DISP::Error>> {
        self.vcom = !self.vcom;
        let cmd = [self.vcom_bit(), 0x00];
        self.spi.write(&cmd).map_err(SharpError::Spi)
    }

    /// Show or blank the panel without touching its memory.
    pub fn set_enabled(&mut self, on: bool) -> Result<(), SharpError<SPI::Error, DISP::Error>> {
        if on {
            self.disp.set_high().map_err(SharpError::Gpio)?;
        } else {
            self.disp.set_low().map_err(SharpError::Gpio)?;
        }
        self.enabled = on;
        Ok(())
    }

    /// Write every line of `fb` in a single chip-select window.
    pub fn flush(&mut self, fb: &Framebuffer) -> Result<(), SharpError<SPI::Error, DISP::Error>> {
        self.tx[0] = MODE_UPDATE | self.vcom_bit();
        for y in 0..LINES {
            let base = 1 + y * LINE_LEN;
            self.tx[base] = ((y + 1) as u8).reverse_bits();
            self.tx[base + 1..base + 1 + ROW_BYTES].copy_from_slice(fb.row(y));
            self.tx[base + LINE_LEN - 1] = 0x00;
        }
        self.tx[FLUSH_LEN - 1] = 0x00;
        self.spi.write(&self.tx).map_err(SharpError::Spi)
    }

    pub fn release(self) -> (SPI, DISP) {
        (self.spi, self.disp)
    }
}
