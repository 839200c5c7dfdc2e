//! Window root layer: a flat, fixed-capacity list of child layers that are
//! composited in attach order onto any `BinaryColor` draw target.

use alloc::rc::Rc;
use core::fmt;

use embedded_graphics::{
    draw_target::{DrawTarget, DrawTargetExt},
    image::Image,
    pixelcolor::BinaryColor,
    primitives::Rectangle,
    Drawable,
};

use crate::config::MAX_LAYERS;
use crate::glyphs::GlyphImage;

/// Handle to an attached layer, unique among the layers attached to a tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(u16);

pub enum LayerContent {
    /// Solid fill of the whole frame.
    Fill(BinaryColor),
    /// Bitmap drawn at the frame origin, clipped to the frame.
    Bitmap(Rc<GlyphImage>),
}

impl fmt::Debug for LayerContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerContent::Fill(color) => f.debug_tuple("Fill").field(color).finish(),
            LayerContent::Bitmap(image) => f.debug_tuple("Bitmap").field(&image.id()).finish(),
        }
    }
}

#[derive(Debug)]
pub struct Layer {
    pub id: LayerId,
    pub frame: Rectangle,
    pub content: LayerContent,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LayerTreeFull;

pub struct LayerTree {
    frame: Rectangle,
    children: heapless::Vec<Layer, MAX_LAYERS>,
    next_id: u16,
    dirty: bool,
}

impl LayerTree {
    pub fn new(frame: Rectangle) -> Self {
        Self {
            frame,
            children: heapless::Vec::new(),
            next_id: 0,
            dirty: true,
        }
    }

    pub fn attach(&mut self, frame: Rectangle, content: LayerContent) -> Result<LayerId, LayerTreeFull> {
        if self.children.is_full() {
            return Err(LayerTreeFull);
        }
        let id = self.allocate_id();
        self.children
            .push(Layer { id, frame, content })
            .map_err(|_| LayerTreeFull)?;
        self.dirty = true;
        Ok(id)
    }

    // The counter wraps on long runs; skip ids still held by attached layers.
    fn allocate_id(&mut self) -> LayerId {
        loop {
            let id = LayerId(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            if !self.contains(id) {
                return id;
            }
        }
    }

    /// Remove and drop a child. Returns false if `id` was not attached.
    pub fn detach(&mut self, id: LayerId) -> bool {
        match self.children.iter().position(|l| l.id == id) {
            Some(index) => {
                self.children.remove(index);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.children.iter().any(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns whether the tree changed since the last call, and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        for layer in &self.children {
            let frame = layer.frame.intersection(&self.frame);
            match &layer.content {
                LayerContent::Fill(color) => target.fill_solid(&frame, *color)?,
                LayerContent::Bitmap(image) => {
                    let raw = image.raw();
                    Image::new(&raw, layer.frame.top_left).draw(&mut target.clipped(&frame))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
    use crate::framebuffer::Framebuffer;
    use crate::glyphs::{glyph_for, Digit, GlyphStore, Style};
    use embedded_graphics::prelude::{Point, Size};

    fn screen() -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, SCREEN_HEIGHT))
    }

    #[test]
    fn attach_and_detach() {
        let mut tree = LayerTree::new(screen());
        let a = tree.attach(screen(), LayerContent::Fill(BinaryColor::Off)).unwrap();
        let b = tree.attach(screen(), LayerContent::Fill(BinaryColor::On)).unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.len(), 2);

        assert!(tree.detach(a));
        assert!(!tree.detach(a));
        assert!(!tree.contains(a));
        assert!(tree.contains(b));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut tree = LayerTree::new(screen());
        for _ in 0..MAX_LAYERS {
            tree.attach(screen(), LayerContent::Fill(BinaryColor::Off)).unwrap();
        }
        assert_eq!(
            tree.attach(screen(), LayerContent::Fill(BinaryColor::Off)),
            Err(LayerTreeFull)
        );
        assert_eq!(tree.len(), MAX_LAYERS);
    }

    #[test]
    fn ids_stay_unique_after_counter_wraps() {
        let mut tree = LayerTree::new(screen());
        let background = tree.attach(screen(), LayerContent::Fill(BinaryColor::Off)).unwrap();
        let second = tree.attach(screen(), LayerContent::Fill(BinaryColor::Off)).unwrap();
        assert_eq!(background, LayerId(0));
        assert_eq!(second, LayerId(1));

        tree.next_id = u16::MAX;
        let last = tree.attach(screen(), LayerContent::Fill(BinaryColor::On)).unwrap();
        assert_eq!(last, LayerId(u16::MAX));
        let wrapped = tree.attach(screen(), LayerContent::Fill(BinaryColor::On)).unwrap();
        assert_eq!(wrapped, LayerId(2));

        assert!(tree.detach(wrapped));
        assert!(tree.contains(background));
        assert!(tree.contains(second));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn dirty_flag_tracks_changes() {
        let mut tree = LayerTree::new(screen());
        assert!(tree.take_dirty());
        assert!(!tree.take_dirty());

        let id = tree.attach(screen(), LayerContent::Fill(BinaryColor::Off)).unwrap();
        assert!(tree.take_dirty());
        assert!(!tree.detach(LayerId(999)));
        assert!(!tree.take_dirty());
        tree.detach(id);
        assert!(tree.take_dirty());
    }

    #[test]
    fn layers_composite_in_order() {
        let mut tree = LayerTree::new(screen());
        tree.attach(screen(), LayerContent::Fill(BinaryColor::On)).unwrap();
        let inner = Rectangle::new(Point::new(10, 10), Size::new(5, 5));
        tree.attach(inner, LayerContent::Fill(BinaryColor::Off)).unwrap();

        let mut fb = Framebuffer::new();
        tree.draw(&mut fb).unwrap();
        assert_eq!(fb.pixel(0, 0), Some(BinaryColor::On));
        assert_eq!(fb.pixel(12, 12), Some(BinaryColor::Off));
        assert_eq!(fb.pixel(15, 15), Some(BinaryColor::On));
    }

    #[test]
    fn bitmap_is_placed_at_frame_origin() {
        let store = GlyphStore::packaged();
        let eight = store
            .load(glyph_for(Digit::new(8).unwrap(), Style::Bold))
            .unwrap();
        let frame = Rectangle::new(Point::new(74, 86), eight.size());
        let mut tree = LayerTree::new(screen());
        tree.attach(frame, LayerContent::Bitmap(Rc::new(eight))).unwrap();

        let mut fb = Framebuffer::new();
        tree.draw(&mut fb).unwrap();
        // glyph (36, 8) is ink
        assert_eq!(fb.pixel(74 + 36, 86 + 8), Some(BinaryColor::On));
        assert_eq!(fb.pixel(74, 86), Some(BinaryColor::Off));
    }

    #[test]
    fn dropping_the_tree_releases_bitmaps() {
        let store = GlyphStore::packaged();
        let image = store
            .load(glyph_for(Digit::new(2).unwrap(), Style::Regular))
            .unwrap();
        let mut tree = LayerTree::new(screen());
        let frame = Rectangle::new(Point::zero(), image.size());
        let id = tree.attach(frame, LayerContent::Bitmap(Rc::new(image))).unwrap();
        assert_eq!(store.live_images(), 1);
        tree.detach(id);
        assert_eq!(store.live_images(), 0);
    }
}
