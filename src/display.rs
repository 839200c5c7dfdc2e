//! Panel bring-up: SPI bus, chip select and the Sharp memory LCD driver.
//
// The memory LCD selects on a HIGH chip-select, while `ExclusiveDevice`
// drives CS low for the duration of a transaction, so the pin is wrapped.

use esp_hal::{
    delay::Delay,
    gpio::Output,
    spi::master::{Config, Spi},
    spi::Mode,
    time::Rate,
    Blocking,
};

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};

use crate::sharp_mlcd::SharpMemoryDisplay;
use crate::wiring::DisplayPins;

/// Output pin with inverted polarity.
pub struct ActiveHigh<P>(pub P);

impl<P: OutputPin> ErrorType for ActiveHigh<P> {
    type Error = P::Error;
}

impl<P: OutputPin> OutputPin for ActiveHigh<P> {
    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }
}

pub type DisplayType<'a> = SharpMemoryDisplay<
    ExclusiveDevice<Spi<'a, Blocking>, ActiveHigh<Output<'a>>, NoDelay>,
    Output<'a>,
>;

pub fn setup_display<'a>(display_pins: DisplayPins<'a>) -> DisplayType<'a> {
    let DisplayPins {
        spi2,
        sclk,
        mosi,
        scs,
        disp,
    } = display_pins;

    // Panel is rated for 1 MHz typ / 2 MHz max, Mode 0
    let spi = Spi::new(
        spi2,
        Config::default()
            .with_frequency(Rate::from_mhz(2))
            .with_mode(Mode::_0),
    )
    .expect("SPI2 config rejected")
    .with_sck(sclk)
    .with_mosi(mosi);

    let spi_dev = ExclusiveDevice::new(spi, ActiveHigh(scs), NoDelay).expect("LCD SCS pin");
    let mut delay = Delay::new();

    SharpMemoryDisplay::new(spi_dev, disp, &mut delay).expect("memory LCD init failed")
}
