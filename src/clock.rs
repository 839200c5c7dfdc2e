//! Wall-clock time, the minute tick source and a software fallback clock.

use core::fmt::{self, Write};

use crate::app::WatchEvent;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,  // full year, e.g., 2024
    pub month: u8,  // 1-12
    pub day: u8,    // 1-31
    pub hour: u8,   // 0-23
    pub minute: u8, // 0-59
    pub second: u8, // 0-59
}

impl DateTime {
    /// Midnight on 2000-01-01, the RTC's reset value.
    pub const EPOCH_2000: DateTime = DateTime {
        year: 2000,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Time of day only; the date is set to 2000-01-01.
    pub const fn hm(hour: u8, minute: u8) -> Self {
        DateTime {
            hour,
            minute,
            ..Self::EPOCH_2000
        }
    }

    // Basic sanity check on decoded RTC time.
    pub fn is_valid(&self) -> bool {
        (2000..=2099).contains(&self.year)
            && (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    /// Seconds since 1970-01-01, saturating at `u32::MAX`.
    pub fn to_unix(&self) -> u32 {
        let days = days_from_civil(self.year as i32, self.month as i32, self.day as i32) as i64;
        let secs = days * 86_400
            + self.hour as i64 * 3_600
            + self.minute as i64 * 60
            + self.second as i64;
        secs.clamp(0, u32::MAX as i64) as u32
    }

    pub fn from_unix(ts: u32) -> Self {
        let days = (ts / 86_400) as i32;
        let rem = ts % 86_400;
        let (year, month, day) = civil_from_days(days);
        DateTime {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            hour: (rem / 3_600) as u8,
            minute: (rem / 60 % 60) as u8,
            second: (rem % 60) as u8,
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

// Days since 1970-01-01 in the proleptic Gregorian calendar (Howard Hinnant's algorithm).
fn days_from_civil(year: i32, month: i32, day: i32) -> i32 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12; // March = 0
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i32) -> (i32, i32, i32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

/// Hour and minute as four ASCII digits, 24-hour, zero padded: 09:05 -> "0905".
/// `None` when the hour or minute is out of range.
pub fn format_hhmm(time: &DateTime) -> Option<[u8; 4]> {
    if time.hour > 23 || time.minute > 59 {
        return None;
    }
    let mut text = heapless::String::<4>::new();
    write!(text, "{:02}{:02}", time.hour, time.minute).ok()?;
    let mut out = [b'0'; 4];
    out.copy_from_slice(text.as_bytes());
    Some(out)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockError {
    /// The bus transaction to the clock chip failed.
    Bus,
    /// The chip lost power or its oscillator stopped; the time is garbage.
    Unreliable,
    /// Registers decoded to an impossible date.
    Invalid,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ClockError::Bus => "clock bus error",
            ClockError::Unreliable => "clock lost power, time unreliable",
            ClockError::Invalid => "clock holds an invalid date",
        };
        f.write_str(msg)
    }
}

/// Source of local wall-clock time.
pub trait WallClock {
    fn now(&mut self) -> Result<DateTime, ClockError>;
}

/// Software clock: a known wall time plus elapsed milliseconds from a
/// monotonic counter. Used when the RTC is absent or lost power.
pub struct SoftClock<M> {
    base_unix: u32,
    base_ms: u64,
    millis: M,
}

impl<M> SoftClock<M>
where
    M: FnMut() -> u64,
{
    pub fn new(start: DateTime, mut millis: M) -> Self {
        let base_ms = millis();
        Self {
            base_unix: start.to_unix(),
            base_ms,
            millis,
        }
    }

    pub fn set(&mut self, now: DateTime) {
        self.base_unix = now.to_unix();
        self.base_ms = (self.millis)();
    }
}

impl<M> WallClock for SoftClock<M>
where
    M: FnMut() -> u64,
{
    fn now(&mut self) -> Result<DateTime, ClockError> {
        let elapsed_s = (self.millis)().saturating_sub(self.base_ms) / 1_000;
        let elapsed_s = elapsed_s.min(u32::MAX as u64) as u32;
        Ok(DateTime::from_unix(self.base_unix.saturating_add(elapsed_s)))
    }
}

/// Minute tick timer: fires once each time the (hour, minute) pair changes.
#[derive(Debug)]
pub struct TickTimer {
    last: Option<(u8, u8)>,
}

impl TickTimer {
    /// Subscribe at `now`; the current minute never fires.
    pub fn subscribe(now: &DateTime) -> Self {
        Self {
            last: Some((now.hour, now.minute)),
        }
    }

    /// A timer with no reference minute: the first poll always fires.
    pub fn armed() -> Self {
        Self { last: None }
    }

    pub fn poll(&mut self, now: DateTime) -> Option<WatchEvent> {
        let current = (now.hour, now.minute);
        if self.last == Some(current) {
            return None;
        }
        self.last = Some(current);
        Some(WatchEvent::Tick(now))
    }
}
