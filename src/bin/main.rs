//! Digit watchface firmware
//! ========================================
//! needs to be run in WSL2 terminal
//! source ~/export-esp.sh
//! cargo run --release --features esp32s3
//! ========================================
//!
//! Shows hh:mm as four large digit glyphs on a 144x168 memory LCD.
//! The wake button toggles focus: blank panel / restore and refresh.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

// Define the application description, which is placed in a special section of the binary.
// This is used by the bootloader to verify the application.
// The macro automatically fills in the fields.
esp_bootloader_esp_idf::esp_app_desc!();

// Module imports
use digit_watchface::{
    app::{WatchEvent, Watchface},
    clock::{ClockError, DateTime, SoftClock, WallClock},
    config::{CLOCK_POLL_MS, DEBOUNCE_MS, VCOM_TOGGLE_MS},
    display::setup_display,
    framebuffer::Framebuffer,
    glyphs::GlyphStore,
    input::WakeButton,
    rtc::Pcf85063,
    wiring::{init_board_pins, BoardPins, RtcPins},
};

use core::sync::atomic::{AtomicBool, Ordering};
use esp_backtrace as _;

// ESP-HAL imports
use esp_hal::{
    delay::Delay,
    handler,
    i2c::master::{Config as I2cConfig, I2c},
    main, ram,
    time::Rate,
    timer::systimer::{SystemTimer, Unit},
    Blocking, Config,
};

use log::{info, warn};

extern crate alloc;

static WAKE: WakeButton<'static> = WakeButton::new();
static WAKE_PRESSED: AtomicBool = AtomicBool::new(false);

// Statically placed so it stays off the main stack
static mut FRAMEBUFFER: Framebuffer = Framebuffer::new();

fn now_ms() -> u64 {
    let t = SystemTimer::unit_value(Unit::Unit0);
    t.saturating_mul(1000) / SystemTimer::ticks_per_second()
}

// Interrupt handler
#[handler]
#[ram]
fn handler() {
    if WAKE.on_interrupt(now_ms(), DEBOUNCE_MS) {
        WAKE_PRESSED.store(true, Ordering::Release);
    }
}

/// RTC when it holds a trustworthy time, otherwise a software clock that
/// starts at midnight and keeps counting from boot.
enum BootClock {
    Rtc(Pcf85063<I2c<'static, Blocking>>),
    Soft(SoftClock<fn() -> u64>),
}

impl BootClock {
    fn open(rtc_pins: RtcPins<'static>) -> Self {
        let cfg = I2cConfig::default().with_frequency(Rate::from_khz(400));
        let i2c = match I2c::new(rtc_pins.i2c0, cfg) {
            Ok(i2c) => i2c.with_sda(rtc_pins.sda).with_scl(rtc_pins.scl),
            Err(e) => {
                warn!("I2C init failed: {:?}, using software clock", e);
                return Self::soft();
            }
        };

        let mut rtc = Pcf85063::new(i2c);
        match rtc.now() {
            Ok(now) => {
                info!("RTC time {}", now);
                BootClock::Rtc(rtc)
            }
            Err(e) => {
                warn!("RTC: {}, using software clock", e);
                Self::soft()
            }
        }
    }

    fn soft() -> Self {
        BootClock::Soft(SoftClock::new(DateTime::EPOCH_2000, now_ms as fn() -> u64))
    }
}

impl WallClock for BootClock {
    fn now(&mut self) -> Result<DateTime, ClockError> {
        match self {
            BootClock::Rtc(rtc) => rtc.now(),
            BootClock::Soft(soft) => soft.now(),
        }
    }
}

// Watchface errors are missing/corrupt assets: nothing sensible to show.
fn dispatch(face: &mut Watchface, event: WatchEvent, clock: &mut BootClock) {
    if let Err(e) = face.handle(event, clock) {
        panic!("watchface: {}", e);
    }
}

#[main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    // Initialize peripherals
    let peripherals = esp_hal::init(Config::default());

    // Decoded glyphs plus the inflater state (~11 KiB while a glyph loads)
    esp_alloc::heap_allocator!(size: 32 * 1024);

    // one call gives you IO handler + all your role pins from wiring.rs
    let (mut io, pins) = init_board_pins(peripherals);
    let BoardPins {
        display_pins,
        rtc_pins,
        wake_btn,
    } = pins;

    WAKE.install(wake_btn);
    io.set_interrupt_handler(handler);

    let mut panel = setup_display(display_pins);
    let mut clock = BootClock::open(rtc_pins);

    // A broken resource pack is fatal; find out before the first frame
    let store = GlyphStore::packaged();
    if let Err(e) = store.verify_all() {
        panic!("{}", e);
    }

    // One clock read seeds both the first frame and the minute ticker
    let mut face = Watchface::new(store);
    let mut ticker = match face.start(&mut clock) {
        Ok(ticker) => ticker,
        Err(e) => panic!("watchface: {}", e),
    };
    let mut in_focus = true;
    let mut next_poll_ms: u64 = 0;
    let mut next_vcom_ms: u64 = 0;
    let delay = Delay::new();

    // Safe because FRAMEBUFFER is only used here
    #[allow(static_mut_refs)]
    let fb = unsafe { &mut FRAMEBUFFER };

    // Main loop: one event at a time, each handled to completion
    loop {
        let now = now_ms();

        // Wake button = focus toggle
        if WAKE_PRESSED.swap(false, Ordering::Acquire) {
            in_focus = !in_focus;
            if let Err(e) = panel.set_enabled(in_focus) {
                warn!("{}", e);
            }
            dispatch(&mut face, WatchEvent::FocusChanged(in_focus), &mut clock);
        }

        // Minute tick
        if now >= next_poll_ms {
            next_poll_ms = now.saturating_add(CLOCK_POLL_MS);
            match clock.now() {
                Ok(time) => {
                    if let Some(event) = ticker.poll(time) {
                        dispatch(&mut face, event, &mut clock);
                    }
                }
                Err(e) => warn!("clock: {}", e),
            }
        }

        if face.take_dirty() {
            // Framebuffer drawing cannot fail
            let _ = face.draw(fb);
            if let Err(e) = panel.flush(fb) {
                warn!("{}", e);
            }
        }

        if now >= next_vcom_ms {
            next_vcom_ms = now.saturating_add(VCOM_TOGGLE_MS);
            if let Err(e) = panel.toggle_vcom() {
                warn!("{}", e);
            }
        }

        // Minimal delay to keep polling responsive
        delay.delay_millis(10);
    }
}
