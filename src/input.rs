//! Wake button handling.
//!
//! The GPIO interrupt handler calls `WakeButton::on_interrupt`; it clears the
//! pending flag and reports a debounced falling edge (button pressed).
//! State lives behind `critical_section` so it can be shared between the
//! handler and the main loop.

use core::cell::{Cell, RefCell};
use critical_section::Mutex;

use esp_hal::gpio::Input;

pub struct WakeButton<'a> {
    input: Mutex<RefCell<Option<Input<'a>>>>,
    last_high: Mutex<Cell<bool>>,
    last_press_ms: Mutex<Cell<u64>>,
}

impl<'a> WakeButton<'a> {
    pub const fn new() -> Self {
        Self {
            input: Mutex::new(RefCell::new(None)),
            last_high: Mutex::new(Cell::new(true)),
            last_press_ms: Mutex::new(Cell::new(0)),
        }
    }

    /// Hand the configured pin over; the button idles high (pull-up).
    pub fn install(&self, input: Input<'a>) {
        critical_section::with(|cs| {
            self.last_high.borrow(cs).set(input.is_high());
            self.input.borrow_ref_mut(cs).replace(input);
        });
    }

    /// Returns true on a debounced press.
    pub fn on_interrupt(&self, now_ms: u64, debounce_ms: u64) -> bool {
        critical_section::with(|cs| {
            let mut slot = self.input.borrow_ref_mut(cs);
            let Some(input) = slot.as_mut() else {
                return false;
            };
            if !input.is_interrupt_set() {
                return false;
            }
            input.clear_interrupt();

            let is_low = input.is_low();
            let was_high = self.last_high.borrow(cs).replace(!is_low);
            if !(was_high && is_low) {
                return false;
            }

            let last = self.last_press_ms.borrow(cs).get();
            if now_ms.saturating_sub(last) <= debounce_ms {
                return false;
            }
            self.last_press_ms.borrow(cs).set(now_ms);
            true
        })
    }
}

impl Default for WakeButton<'_> {
    fn default() -> Self {
        Self::new()
    }
}
