//! Top-level watchface controller.
//!
//! Owns the glyph store and, while the window is loaded, the window itself
//! (root layer tree, background layer and digit slots). Everything runs on one
//! thread: the main loop turns timer, focus and lifecycle sources into
//! `WatchEvent`s and feeds them to `Watchface::handle` one at a time.

use embedded_graphics::{
    draw_target::DrawTarget,
    pixelcolor::BinaryColor,
    prelude::{Point, Size},
    primitives::Rectangle,
};
use log::{debug, info, warn};

use crate::clock::{DateTime, TickTimer, WallClock};
use crate::config::{BACKGROUND_COLOR, SCREEN_HEIGHT, SCREEN_WIDTH, SLOT_COUNT};
use crate::error::WatchfaceError;
use crate::glyphs::GlyphStore;
use crate::layer::{LayerContent, LayerId, LayerTree};
use crate::slots::{DigitSlots, SlotState};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    /// Window pushed: build the layers and show the current time.
    WindowLoad,
    /// Minute boundary crossed.
    Tick(DateTime),
    /// App gained (`true`) or lost (`false`) the foreground.
    FocusChanged(bool),
    /// Window popped: release every layer and image.
    WindowUnload,
}

struct Window {
    root: LayerTree,
    background: LayerId,
    slots: DigitSlots,
}

pub struct Watchface {
    store: GlyphStore,
    window: Option<Window>,
}

impl Watchface {
    pub fn new(store: GlyphStore) -> Self {
        Self { store, window: None }
    }

    pub fn store(&self) -> &GlyphStore {
        &self.store
    }

    pub fn is_loaded(&self) -> bool {
        self.window.is_some()
    }

    /// Slot states, `None` while no window is loaded.
    pub fn slot_states(&self) -> Option<[SlotState; SLOT_COUNT]> {
        self.window.as_ref().map(|w| w.slots.states())
    }

    /// Number of layers on the window root, 0 while unloaded.
    pub fn layer_count(&self) -> usize {
        self.window.as_ref().map_or(0, |w| w.root.len())
    }

    pub fn handle<C: WallClock>(&mut self, event: WatchEvent, clock: &mut C) -> Result<(), WatchfaceError> {
        match event {
            WatchEvent::WindowLoad => self.start(clock).map(|_| ()),
            WatchEvent::Tick(now) => self.refresh(&now),
            WatchEvent::FocusChanged(true) => {
                debug!("focus gained");
                self.refresh_from(clock)
            }
            WatchEvent::FocusChanged(false) => {
                debug!("focus lost");
                Ok(())
            }
            WatchEvent::WindowUnload => {
                self.window_unload();
                Ok(())
            }
        }
    }

    /// Load the window and show the current time. The returned minute timer is
    /// seeded with the same clock reading; with no readable clock it fires on
    /// its first poll.
    pub fn start<C: WallClock>(&mut self, clock: &mut C) -> Result<TickTimer, WatchfaceError> {
        self.window_load()?;
        match clock.now() {
            Ok(now) => {
                self.refresh(&now)?;
                Ok(TickTimer::subscribe(&now))
            }
            Err(e) => {
                warn!("cannot read clock: {}", e);
                Ok(TickTimer::armed())
            }
        }
    }

    fn window_load(&mut self) -> Result<(), WatchfaceError> {
        if self.window.is_some() {
            warn!("window already loaded");
            return Ok(());
        }
        let screen = Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
        let mut root = LayerTree::new(screen);
        let background = root.attach(screen, LayerContent::Fill(BACKGROUND_COLOR))?;
        self.window = Some(Window {
            root,
            background,
            slots: DigitSlots::new(),
        });
        info!("window loaded");
        Ok(())
    }

    fn window_unload(&mut self) {
        if let Some(mut window) = self.window.take() {
            window.slots.unload_all(&mut window.root);
            window.root.detach(window.background);
            info!("window unloaded, {} glyphs still live", self.store.live_images());
        }
    }

    // Clock trouble keeps whatever is on screen; the next tick retries.
    fn refresh_from<C: WallClock>(&mut self, clock: &mut C) -> Result<(), WatchfaceError> {
        match clock.now() {
            Ok(now) => self.refresh(&now),
            Err(e) => {
                warn!("cannot read clock: {}", e);
                Ok(())
            }
        }
    }

    fn refresh(&mut self, now: &DateTime) -> Result<(), WatchfaceError> {
        let Some(window) = self.window.as_mut() else {
            return Ok(());
        };
        debug!("refresh {:02}:{:02}", now.hour, now.minute);
        window.slots.refresh_all(now, &mut window.root, &self.store)
    }

    /// Whether the window changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        self.window.as_mut().is_some_and(|w| w.root.take_dirty())
    }

    /// Composite the window; with no window the target is cleared.
    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        match &self.window {
            Some(window) => window.root.draw(target),
            None => target.clear(BACKGROUND_COLOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockError;
    use crate::framebuffer::Framebuffer;
    use crate::glyphs::{Digit, Style};

    struct FixedClock(Result<DateTime, ClockError>);

    impl WallClock for FixedClock {
        fn now(&mut self) -> Result<DateTime, ClockError> {
            self.0
        }
    }

    fn at(hour: u8, minute: u8) -> FixedClock {
        FixedClock(Ok(DateTime::hm(hour, minute)))
    }

    fn occupied(digit: u8, style: Style) -> SlotState {
        SlotState::Occupied(Digit::new(digit).unwrap(), style)
    }

    fn hhmm(h0: u8, h1: u8, m0: u8, m1: u8) -> [SlotState; SLOT_COUNT] {
        [
            occupied(h0, Style::Bold),
            occupied(h1, Style::Bold),
            occupied(m0, Style::Regular),
            occupied(m1, Style::Regular),
        ]
    }

    #[test]
    fn window_load_shows_time_immediately() {
        let mut face = Watchface::new(GlyphStore::packaged());
        face.handle(WatchEvent::WindowLoad, &mut at(9, 5)).unwrap();
        assert_eq!(face.slot_states(), Some(hhmm(0, 9, 0, 5)));
        // background + 4 digits
        assert_eq!(face.layer_count(), 5);
    }

    #[test]
    fn tick_updates_digits() {
        let mut face = Watchface::new(GlyphStore::packaged());
        let mut clock = at(23, 58);
        face.handle(WatchEvent::WindowLoad, &mut clock).unwrap();
        face.handle(WatchEvent::Tick(DateTime::hm(23, 59)), &mut clock).unwrap();
        assert_eq!(face.slot_states(), Some(hhmm(2, 3, 5, 9)));
        assert_eq!(face.store().live_images(), 4);
    }

    #[test]
    fn focus_regain_rereads_clock() {
        let mut face = Watchface::new(GlyphStore::packaged());
        face.handle(WatchEvent::WindowLoad, &mut at(11, 47)).unwrap();
        assert_eq!(face.slot_states(), Some(hhmm(1, 1, 4, 7)));

        face.handle(WatchEvent::FocusChanged(false), &mut at(11, 50)).unwrap();
        assert_eq!(face.slot_states(), Some(hhmm(1, 1, 4, 7)));

        face.handle(WatchEvent::FocusChanged(true), &mut at(12, 0)).unwrap();
        assert_eq!(face.slot_states(), Some(hhmm(1, 2, 0, 0)));
        assert_eq!(face.store().live_images(), 4);
        assert_eq!(face.layer_count(), 5);
    }

    #[test]
    fn teardown_releases_every_glyph() {
        let mut face = Watchface::new(GlyphStore::packaged());
        let mut clock = at(7, 30);
        face.handle(WatchEvent::WindowLoad, &mut clock).unwrap();
        face.handle(WatchEvent::Tick(DateTime::hm(7, 31)), &mut clock).unwrap();
        face.handle(WatchEvent::WindowUnload, &mut clock).unwrap();

        assert!(!face.is_loaded());
        assert_eq!(face.slot_states(), None);
        assert_eq!(face.layer_count(), 0);
        assert_eq!(face.store().live_images(), 0);
    }

    #[test]
    fn events_without_window_are_ignored() {
        let mut face = Watchface::new(GlyphStore::packaged());
        face.handle(WatchEvent::Tick(DateTime::hm(1, 2)), &mut at(1, 2)).unwrap();
        face.handle(WatchEvent::FocusChanged(true), &mut at(1, 2)).unwrap();
        face.handle(WatchEvent::WindowUnload, &mut at(1, 2)).unwrap();
        assert_eq!(face.store().live_images(), 0);
    }

    #[test]
    fn clock_failure_keeps_current_digits() {
        let mut face = Watchface::new(GlyphStore::packaged());
        face.handle(WatchEvent::WindowLoad, &mut at(6, 15)).unwrap();
        let mut broken = FixedClock(Err(ClockError::Bus));
        face.handle(WatchEvent::FocusChanged(true), &mut broken).unwrap();
        assert_eq!(face.slot_states(), Some(hhmm(0, 6, 1, 5)));
    }

    #[test]
    fn load_with_unreadable_clock_starts_blank() {
        let mut face = Watchface::new(GlyphStore::packaged());
        let mut broken = FixedClock(Err(ClockError::Unreliable));
        face.handle(WatchEvent::WindowLoad, &mut broken).unwrap();
        assert_eq!(face.slot_states(), Some([SlotState::Empty; 4]));
        assert_eq!(face.layer_count(), 1);
    }

    struct SteppingClock(std::vec::Vec<DateTime>);

    impl WallClock for SteppingClock {
        fn now(&mut self) -> Result<DateTime, ClockError> {
            if self.0.len() > 1 {
                Ok(self.0.remove(0))
            } else {
                self.0.first().copied().ok_or(ClockError::Bus)
            }
        }
    }

    #[test]
    fn start_seeds_ticker_with_rendered_minute() {
        let mut face = Watchface::new(GlyphStore::packaged());
        // minute rolls over right after the first read
        let mut clock = SteppingClock(vec![
            DateTime { second: 59, ..DateTime::hm(10, 59) },
            DateTime::hm(11, 0),
        ]);
        let mut ticker = face.start(&mut clock).unwrap();
        assert_eq!(face.slot_states(), Some(hhmm(1, 0, 5, 9)));

        let event = ticker.poll(DateTime { second: 30, ..DateTime::hm(11, 0) });
        assert_eq!(event, Some(WatchEvent::Tick(DateTime { second: 30, ..DateTime::hm(11, 0) })));
        face.handle(event.unwrap(), &mut clock).unwrap();
        assert_eq!(face.slot_states(), Some(hhmm(1, 1, 0, 0)));
    }

    #[test]
    fn start_without_clock_ticks_on_first_poll() {
        let mut face = Watchface::new(GlyphStore::packaged());
        let mut broken = FixedClock(Err(ClockError::Bus));
        let mut ticker = face.start(&mut broken).unwrap();
        assert_eq!(face.layer_count(), 1);

        let event = ticker.poll(DateTime::hm(0, 0)).unwrap();
        face.handle(event, &mut broken).unwrap();
        assert_eq!(face.slot_states(), Some(hhmm(0, 0, 0, 0)));
    }

    #[test]
    fn long_run_keeps_background_and_releases_glyphs() {
        let mut face = Watchface::new(GlyphStore::packaged());
        let mut clock = at(0, 0);
        face.handle(WatchEvent::WindowLoad, &mut clock).unwrap();
        // four layers per tick: enough ticks to wrap the layer id counter
        for n in 1..=16_400u32 {
            let minutes = n % (24 * 60);
            let now = DateTime::hm((minutes / 60) as u8, (minutes % 60) as u8);
            face.handle(WatchEvent::Tick(now), &mut clock).unwrap();
        }
        assert_eq!(face.store().live_images(), 4);
        assert_eq!(face.layer_count(), 5);

        let mut fb = Framebuffer::new();
        fb.clear(BinaryColor::On).unwrap();
        face.draw(&mut fb).unwrap();
        assert_eq!(fb.pixel(0, 0), Some(BinaryColor::Off));

        face.handle(WatchEvent::WindowUnload, &mut clock).unwrap();
        assert_eq!(face.store().live_images(), 0);
    }

    #[test]
    fn dirty_only_after_changes() {
        let mut face = Watchface::new(GlyphStore::packaged());
        assert!(!face.take_dirty());
        let mut clock = at(10, 10);
        face.handle(WatchEvent::WindowLoad, &mut clock).unwrap();
        assert!(face.take_dirty());
        assert!(!face.take_dirty());
        face.handle(WatchEvent::Tick(DateTime::hm(10, 11)), &mut clock).unwrap();
        assert!(face.take_dirty());
    }

    #[test]
    fn draws_digits_on_black() {
        let mut face = Watchface::new(GlyphStore::packaged());
        face.handle(WatchEvent::WindowLoad, &mut at(18, 18)).unwrap();
        let mut fb = Framebuffer::new();
        fb.clear(BinaryColor::On).unwrap();
        face.draw(&mut fb).unwrap();

        // margins are background
        assert_eq!(fb.pixel(0, 0), Some(BinaryColor::Off));
        assert_eq!(fb.pixel(143, 167), Some(BinaryColor::Off));
        // "1" in slot 0 has no top bar, "8" in slot 1 does
        assert_eq!(fb.pixel(4 + 36, 4 + 8), Some(BinaryColor::Off));
        assert_eq!(fb.pixel(74 + 36, 4 + 8), Some(BinaryColor::On));
        // "8" regular in slot 3, middle bar
        assert_eq!(fb.pixel(74 + 36, 86 + 36), Some(BinaryColor::On));
    }
}
