// RTC driver for PCF85063A/PCF85063TP real-time clock chips.
// Datasheet: https://files.waveshare.com/wiki/common/Pcf85063atl1118-NdPQpTGE-loeW7GbZ7.pdf
//
// The watch keeps local time in the chip, so no timezone handling here.

use embedded_hal::i2c::I2c;

use crate::clock::{ClockError, DateTime, WallClock};

pub const PCF85063_ADDR: u8 = 0x51;

// Time registers start at 0x04: sec, min, hour, day, weekday, month, year
const REG_SECONDS: u8 = 0x04;
const OS_FLAG: u8 = 0x80; // oscillator stopped since last time set

pub struct Pcf85063<I2C> {
    i2c: I2C,
}

impl<I2C, E> Pcf85063<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn into_inner(self) -> I2C {
        self.i2c
    }

    /// Read the time. The flag is true when the oscillator stopped (power
    /// loss) and the value should not be trusted.
    pub fn read_datetime(&mut self) -> Result<(DateTime, bool), E> {
        let mut regs = [0u8; 7];
        self.i2c.write_read(PCF85063_ADDR, &[REG_SECONDS], &mut regs)?;
        let stopped = regs[0] & OS_FLAG != 0;
        let dt = DateTime {
            second: bcd_decode(regs[0] & 0x7F),
            minute: bcd_decode(regs[1] & 0x7F),
            hour: bcd_decode(regs[2] & 0x3F),
            day: bcd_decode(regs[3] & 0x3F),
            // regs[4] is the weekday, derived from the date, not needed
            month: bcd_decode(regs[5] & 0x1F),
            year: 2000 + bcd_decode(regs[6]) as u16,
        };
        Ok((dt, stopped))
    }

    /// Set the time; also clears the oscillator-stopped flag.
    pub fn set_datetime(&mut self, dt: &DateTime) -> Result<(), E> {
        let frame = [
            REG_SECONDS,
            bcd_encode(dt.second),
            bcd_encode(dt.minute),
            bcd_encode(dt.hour),
            bcd_encode(dt.day),
            0, // weekday not used
            bcd_encode(dt.month),
            bcd_encode((dt.year % 100) as u8),
        ];
        self.i2c.write(PCF85063_ADDR, &frame)
    }
}

impl<I2C, E> WallClock for Pcf85063<I2C>
where
    I2C: I2c<Error = E>,
{
    fn now(&mut self) -> Result<DateTime, ClockError> {
        let (dt, stopped) = self.read_datetime().map_err(|_| ClockError::Bus)?;
        if stopped {
            return Err(ClockError::Unreliable);
        }
        if !dt.is_valid() {
            return Err(ClockError::Invalid);
        }
        Ok(dt)
    }
}

#[inline]
fn bcd_decode(v: u8) -> u8 {
    (v >> 4) * 10 + (v & 0x0F)
}

#[inline]
fn bcd_encode(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}
