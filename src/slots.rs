//! Digit slot manager.
//!
//! Four fixed screen slots, each either empty or showing one digit glyph.
//! An occupied slot owns its decoded image and the layer it attached to the
//! window root; unloading detaches the layer and releases the image together.
//! Loading into an occupied slot does nothing, so replacing a digit is always
//! an explicit unload followed by a load (`display_digit`).

use alloc::rc::Rc;

use log::{debug, warn};

use crate::clock::{format_hhmm, DateTime};
use crate::config::{SlotLayout, SLOT_COUNT, SLOT_LAYOUT};
use crate::error::WatchfaceError;
use crate::glyphs::{glyph_for, Digit, GlyphImage, GlyphStore, Style};
use crate::layer::{LayerContent, LayerId, LayerTree};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    HourTens,
    HourUnits,
    MinuteTens,
    MinuteUnits,
}

impl Slot {
    // All slots, in refresh order
    pub const ALL: [Slot; SLOT_COUNT] = [
        Slot::HourTens,
        Slot::HourUnits,
        Slot::MinuteTens,
        Slot::MinuteUnits,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Slot::HourTens => 0,
            Slot::HourUnits => 1,
            Slot::MinuteTens => 2,
            Slot::MinuteUnits => 3,
        }
    }

    pub fn from_index(n: usize) -> Option<Self> {
        Self::ALL.get(n).copied()
    }

    #[inline]
    pub fn layout(self) -> &'static SlotLayout {
        &SLOT_LAYOUT[self.index()]
    }
}

/// Observable state of a slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Occupied(Digit, Style),
}

struct Loaded {
    digit: Digit,
    style: Style,
    // Shared with the bitmap layer; both go away on unload
    _image: Rc<GlyphImage>,
    layer: LayerId,
}

enum SlotRecord {
    Empty,
    Occupied(Loaded),
}

pub struct DigitSlots {
    slots: [SlotRecord; SLOT_COUNT],
}

impl DigitSlots {
    pub fn new() -> Self {
        Self {
            slots: [
                SlotRecord::Empty,
                SlotRecord::Empty,
                SlotRecord::Empty,
                SlotRecord::Empty,
            ],
        }
    }

    pub fn state(&self, slot: Slot) -> SlotState {
        match &self.slots[slot.index()] {
            SlotRecord::Empty => SlotState::Empty,
            SlotRecord::Occupied(l) => SlotState::Occupied(l.digit, l.style),
        }
    }

    pub fn states(&self) -> [SlotState; SLOT_COUNT] {
        Slot::ALL.map(|slot| self.state(slot))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|r| matches!(r, SlotRecord::Occupied(_)))
            .count()
    }

    /// Show `digit` in an empty slot. A no-op if the slot is occupied.
    pub fn load(
        &mut self,
        slot: Slot,
        digit: Digit,
        style: Style,
        root: &mut LayerTree,
        store: &GlyphStore,
    ) -> Result<(), WatchfaceError> {
        let record = &mut self.slots[slot.index()];
        if matches!(record, SlotRecord::Occupied(_)) {
            return Ok(());
        }

        let image = Rc::new(store.load(glyph_for(digit, style))?);
        let layer = root.attach(slot.layout().frame, LayerContent::Bitmap(Rc::clone(&image)))?;

        *record = SlotRecord::Occupied(Loaded {
            digit,
            style,
            _image: image,
            layer,
        });
        debug!("slot {} <- {} {:?}", slot.index(), digit.value(), style);
        Ok(())
    }

    /// Empty a slot, detaching its layer and releasing its image.
    pub fn unload(&mut self, slot: Slot, root: &mut LayerTree) {
        let record = core::mem::replace(&mut self.slots[slot.index()], SlotRecord::Empty);
        if let SlotRecord::Occupied(loaded) = record {
            if !root.detach(loaded.layer) {
                warn!("slot {} layer was already detached", slot.index());
            }
            debug!("slot {} emptied", slot.index());
        }
    }

    /// Replace whatever `slot` shows with the ASCII digit `c`.
    pub fn display_digit(
        &mut self,
        c: u8,
        slot: Slot,
        style: Style,
        root: &mut LayerTree,
        store: &GlyphStore,
    ) -> Result<(), WatchfaceError> {
        let digit = Digit::from_ascii(c).ok_or(WatchfaceError::NotADigit(c))?;
        self.unload(slot, root);
        self.load(slot, digit, style, root, store)
    }

    /// Redraw all four slots for `time` (24-hour hh:mm).
    pub fn refresh_all(
        &mut self,
        time: &DateTime,
        root: &mut LayerTree,
        store: &GlyphStore,
    ) -> Result<(), WatchfaceError> {
        let digits = format_hhmm(time).ok_or(WatchfaceError::InvalidTime {
            hour: time.hour,
            minute: time.minute,
        })?;
        for slot in Slot::ALL {
            self.display_digit(digits[slot.index()], slot, slot.layout().style, root, store)?;
        }
        Ok(())
    }

    pub fn unload_all(&mut self, root: &mut LayerTree) {
        for slot in Slot::ALL {
            self.unload(slot, root);
        }
    }
}

impl Default for DigitSlots {
    fn default() -> Self {
        Self::new()
    }
}
