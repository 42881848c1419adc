//! Glyph cache for one font at one size and transform.
//!
//! Resolving a packed id goes through `&self`, so the references a
//! [`StagedGlyphBuffer`](crate::buffer::StagedGlyphBuffer) accepts stay valid
//! for as long as the strike is borrowed. Each glyph is built at most once
//! per subpixel bin by the strike's [`GlyphScaler`].

use std::cell::{Cell, OnceCell};

use crate::glyph::{Glyph, GlyphId, PackedGlyphId, SUBPIXEL_SAMPLES};

const GLYPH_ID_RANGE: usize = GlyphId::MAX as usize + 1;
const BINS_PER_GLYPH: usize = (SUBPIXEL_SAMPLES as usize) * (SUBPIXEL_SAMPLES as usize);

/// Produces glyph metrics for a packed id. Implemented by the rasterizer
/// front end that owns the font.
pub trait GlyphScaler {
    /// `None` when the font has no such glyph.
    fn make_glyph(&self, packed_id: PackedGlyphId) -> Option<Glyph>;
}

type BinSlots = Box<[OnceCell<Option<Glyph>>]>;

pub struct Strike {
    /// Builds glyphs on first lookup.
    scaler: Box<dyn GlyphScaler>,
    /// One lazily allocated row of subpixel bins per glyph id.
    slots: Vec<OnceCell<BinSlots>>,
    /// Glyphs built so far.
    made: Cell<usize>,
}

impl Strike {
    /// A strike for a font with `glyph_count` glyphs, ids `0..glyph_count`.
    /// Counts past the 16-bit id range are clamped to `0x1_0000`.
    pub fn new<S>(scaler: S, glyph_count: usize) -> Self
    where
        S: GlyphScaler + 'static,
    {
        Self {
            scaler: Box::new(scaler),
            slots: (0..glyph_count.min(GLYPH_ID_RANGE))
                .map(|_| OnceCell::new())
                .collect(),
            made: Cell::new(0),
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of glyphs the scaler has been asked for so far.
    pub fn cached_glyphs(&self) -> usize {
        self.made.get()
    }

    /// Resolve a packed id, building the glyph on first use.
    pub fn glyph(&self, packed_id: PackedGlyphId) -> Option<&Glyph> {
        let row = self.slots.get(packed_id.glyph_id() as usize)?;
        let bins = row.get_or_init(|| (0..BINS_PER_GLYPH).map(|_| OnceCell::new()).collect());
        let sub = packed_id.subpixel();
        let index = sub.y as usize * SUBPIXEL_SAMPLES as usize + sub.x as usize;
        bins[index]
            .get_or_init(|| {
                self.made.set(self.made.get() + 1);
                log::trace!("Strike: building glyph {packed_id:?}");
                self.scaler.make_glyph(packed_id)
            })
            .as_ref()
    }
}
