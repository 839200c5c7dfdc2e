// Board pin map for the ESP32-S3 + Sharp 1.28" memory LCD + PCF85063 build.
//! The following wiring is assumed:
//! - LCD SCLK => GPIO12
//! - LCD SI (MOSI) => GPIO11
//! - LCD SCS => GPIO10 (active high, inverted in `display.rs`)
//! - LCD DISP => GPIO13
//! - RTC SDA => GPIO8
//! - RTC SCL => GPIO9
//! - Wake button => GPIO0 (BOOT), to GND when pressed, internal pull-up
//! - 3.3V / GND shared
//! EXTCOMIN is tied low; VCOM is toggled in software over SPI.

use esp_hal::gpio::{Event, Input, InputConfig, Io, Level, Output, OutputConfig, Pull};
use esp_hal::peripherals::{Peripherals, GPIO11, GPIO12, GPIO8, GPIO9, I2C0, SPI2};

pub struct DisplayPins<'a> {
    pub spi2: SPI2<'a>,
    pub sclk: GPIO12<'a>,
    pub mosi: GPIO11<'a>,
    pub scs: Output<'a>,
    pub disp: Output<'a>,
}

pub struct RtcPins<'a> {
    pub i2c0: I2C0<'a>,
    pub sda: GPIO8<'a>,
    pub scl: GPIO9<'a>,
}

pub struct BoardPins<'a> {
    pub display_pins: DisplayPins<'a>,
    pub rtc_pins: RtcPins<'a>,
    pub wake_btn: Input<'a>,
}

pub fn init_board_pins<'a>(p: Peripherals) -> (Io<'a>, BoardPins<'a>) {
    let io = Io::new(p.IO_MUX);

    // SCS idles low (deselected), DISP low until the panel memory is cleared
    let scs = Output::new(p.GPIO10, Level::Low, OutputConfig::default());
    let disp = Output::new(p.GPIO13, Level::Low, OutputConfig::default());

    let mut wake_btn = Input::new(p.GPIO0, InputConfig::default().with_pull(Pull::Up));
    wake_btn.listen(Event::AnyEdge);

    (
        io,
        BoardPins {
            display_pins: DisplayPins {
                spi2: p.SPI2,
                sclk: p.GPIO12,
                mosi: p.GPIO11,
                scs,
                disp,
            },
            rtc_pins: RtcPins {
                i2c0: p.I2C0,
                sda: p.GPIO8,
                scl: p.GPIO9,
            },
            wake_btn,
        },
    )
}
