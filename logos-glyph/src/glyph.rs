//! Glyph identifiers, resolved glyph records and the variant slot that
//! holds either of them.

use std::fmt;

use crate::geometry::Point;

/// Index of a glyph in a font's glyph set.
pub type GlyphId = u16;

/// Subpixel samples per pixel along one axis.
pub const SUBPIXEL_SAMPLES: u8 = 4;

const SUBPIXEL_BITS: u32 = 2;
const SUBPIXEL_MASK: u32 = (1 << SUBPIXEL_BITS) - 1;
const SUBPIXEL_X_SHIFT: u32 = 16;
const SUBPIXEL_Y_SHIFT: u32 = SUBPIXEL_X_SHIFT + SUBPIXEL_BITS;

// ───────────────────────────────────────────────────────────────────
// PackedGlyphId
// ───────────────────────────────────────────────────────────────────

/// Which quarter-pixel a glyph origin falls into on each axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SubpixelBins {
    pub x: u8,
    pub y: u8,
}

/// A glyph id plus its subpixel bins, packed into 32 bits.
///
/// ```text
///  31        20 19  18 17  16 15             0
/// +------------+------+------+----------------+
/// |   unused   |  y   |  x   |    glyph id    |
/// +------------+------+------+----------------+
/// ```
///
/// This is the key glyph caches are looked up by.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackedGlyphId(u32);

impl PackedGlyphId {
    /// A packed id with both subpixel bins at zero.
    #[inline]
    pub const fn new(glyph_id: GlyphId) -> Self {
        Self(glyph_id as u32)
    }

    #[inline]
    pub fn with_subpixel(glyph_id: GlyphId, bins: SubpixelBins) -> Self {
        debug_assert!(bins.x < SUBPIXEL_SAMPLES && bins.y < SUBPIXEL_SAMPLES);
        let x = (bins.x as u32) & SUBPIXEL_MASK;
        let y = (bins.y as u32) & SUBPIXEL_MASK;
        Self(glyph_id as u32 | (x << SUBPIXEL_X_SHIFT) | (y << SUBPIXEL_Y_SHIFT))
    }

    #[inline]
    pub const fn glyph_id(self) -> GlyphId {
        (self.0 & 0xFFFF) as GlyphId
    }

    #[inline]
    pub const fn subpixel(self) -> SubpixelBins {
        SubpixelBins {
            x: ((self.0 >> SUBPIXEL_X_SHIFT) & SUBPIXEL_MASK) as u8,
            y: ((self.0 >> SUBPIXEL_Y_SHIFT) & SUBPIXEL_MASK) as u8,
        }
    }

    /// The fractional offset the subpixel bins stand for.
    pub fn subpixel_offset(self) -> Point {
        let bins = self.subpixel();
        let step = 1.0 / SUBPIXEL_SAMPLES as f32;
        Point::new(bins.x as f32 * step, bins.y as f32 * step)
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for PackedGlyphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bins = self.subpixel();
        write!(f, "<{}, {}, {}>", self.glyph_id(), bins.x, bins.y)
    }
}

impl From<GlyphId> for PackedGlyphId {
    fn from(id: GlyphId) -> Self {
        Self::new(id)
    }
}

// ───────────────────────────────────────────────────────────────────
// MaskFormat / Glyph
// ───────────────────────────────────────────────────────────────────

/// Pixel encoding of a rasterized glyph. Draws are batched per format.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaskFormat {
    /// 1 bit per pixel.
    Bw,
    /// 8-bit coverage.
    A8,
    /// 565 per-channel coverage for LCD subpixel text.
    Lcd16,
    /// Premultiplied color (emoji, bitmap fonts).
    Argb32,
    /// Signed distance field.
    Sdf,
}

impl MaskFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            MaskFormat::Bw | MaskFormat::A8 | MaskFormat::Sdf => 1,
            MaskFormat::Lcd16 => 2,
            MaskFormat::Argb32 => 4,
        }
    }
}

/// A glyph resolved by a glyph cache: its image bounds, mask format and
/// whether an outline is available for path drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    id: PackedGlyphId,
    width: u16,
    height: u16,
    left: i16,
    top: i16,
    mask_format: MaskFormat,
    has_path: bool,
}

impl Glyph {
    pub fn new(
        id: PackedGlyphId,
        width: u16,
        height: u16,
        left: i16,
        top: i16,
        mask_format: MaskFormat,
    ) -> Self {
        Self {
            id,
            width,
            height,
            left,
            top,
            mask_format,
            has_path: false,
        }
    }

    /// A glyph with no image, e.g. a space.
    pub fn empty(id: PackedGlyphId) -> Self {
        Self::new(id, 0, 0, 0, 0, MaskFormat::A8)
    }

    pub fn with_path(mut self, has_path: bool) -> Self {
        self.has_path = has_path;
        self
    }

    pub fn packed_id(&self) -> PackedGlyphId {
        self.id
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn left(&self) -> i16 {
        self.left
    }

    pub fn top(&self) -> i16 {
        self.top
    }

    pub fn mask_format(&self) -> MaskFormat {
        self.mask_format
    }

    pub fn has_path(&self) -> bool {
        self.has_path
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn max_dimension(&self) -> u16 {
        self.width.max(self.height)
    }
}

// ───────────────────────────────────────────────────────────────────
// GlyphVariant
// ───────────────────────────────────────────────────────────────────

/// One slot of the staged buffer: a packed id on the way in, a resolved
/// glyph borrowed from a cache on the way out.
///
/// A slot written as one kind must only be read back as that kind; the
/// accessors return `None` otherwise and assert in debug builds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GlyphVariant<'g> {
    #[default]
    Empty,
    Packed(PackedGlyphId),
    Glyph(&'g Glyph),
}

impl<'g> GlyphVariant<'g> {
    pub fn packed_id(&self) -> Option<PackedGlyphId> {
        match *self {
            GlyphVariant::Packed(id) => Some(id),
            _ => {
                debug_assert!(false, "slot read as packed id but holds {self:?}");
                None
            }
        }
    }

    pub fn glyph(&self) -> Option<&'g Glyph> {
        match *self {
            GlyphVariant::Glyph(glyph) => Some(glyph),
            _ => {
                debug_assert!(false, "slot read as glyph but holds {self:?}");
                None
            }
        }
    }

    pub fn is_packed(&self) -> bool {
        matches!(self, GlyphVariant::Packed(_))
    }

    pub fn is_glyph(&self) -> bool {
        matches!(self, GlyphVariant::Glyph(_))
    }
}

impl From<PackedGlyphId> for GlyphVariant<'_> {
    fn from(id: PackedGlyphId) -> Self {
        GlyphVariant::Packed(id)
    }
}

impl<'g> From<&'g Glyph> for GlyphVariant<'g> {
    fn from(glyph: &'g Glyph) -> Self {
        GlyphVariant::Glyph(glyph)
    }
}
