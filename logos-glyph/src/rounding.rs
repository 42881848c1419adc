//! Device-space position quantization.
//!
//! A glyph drawn from a mask lands on an integer pixel. With subpixel
//! positioning enabled, the leftover fraction is kept as a quarter-pixel
//! bin inside the [`PackedGlyphId`](crate::glyph::PackedGlyphId) so the
//! cache can hold one image per bin.
//!
//! The rounding rule is injected through [`RoundingPolicy`]. The default,
//! [`RoundingSpec`], biases by half a sample and floors:
//!
//! ```text
//! pixel = floor(device + half_sample_freq)
//! bin   = floor(fract(device + half_sample_freq) * 4)     (subpixel axes)
//! ```

use serde::Deserialize;

use crate::geometry::{IPoint, Point};
use crate::glyph::{SubpixelBins, SUBPIXEL_SAMPLES};

/// Half of one subpixel step: `1 / (2 * 4)`.
pub const SUBPIXEL_ROUNDING: f32 = 1.0 / (2.0 * SUBPIXEL_SAMPLES as f32);

/// The axis glyphs in a run are laid out along, if any.
///
/// Only the layout axis gets subpixel positions; the other is snapped to
/// whole pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisAlignment {
    #[default]
    None,
    X,
    Y,
}

/// Turns one device-space position into an integer pixel plus the
/// subpixel bins recorded in the packed glyph id.
pub trait RoundingPolicy {
    fn quantize(&self, device: Point) -> (IPoint, SubpixelBins);
}

/// The standard rounding rule, derived from whether the strike is
/// subpixel positioned and how the run is aligned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundingSpec {
    pub is_subpixel: bool,
    pub axis_alignment: AxisAlignment,
    /// Bias added before flooring, per axis.
    pub half_axis_sample_freq: Point,
    /// Axes whose fraction is kept as a subpixel bin.
    pub subpixel_x: bool,
    pub subpixel_y: bool,
}

impl RoundingSpec {
    pub fn new(is_subpixel: bool, axis_alignment: AxisAlignment) -> Self {
        let (half_x, half_y, subpixel_x, subpixel_y) = if !is_subpixel {
            (0.5, 0.5, false, false)
        } else {
            match axis_alignment {
                AxisAlignment::X => (SUBPIXEL_ROUNDING, 0.5, true, false),
                AxisAlignment::Y => (0.5, SUBPIXEL_ROUNDING, false, true),
                AxisAlignment::None => (SUBPIXEL_ROUNDING, SUBPIXEL_ROUNDING, true, true),
            }
        };
        Self {
            is_subpixel,
            axis_alignment,
            half_axis_sample_freq: Point::new(half_x, half_y),
            subpixel_x,
            subpixel_y,
        }
    }

    /// Whole-pixel rounding (round half up on both axes).
    pub fn whole_pixel() -> Self {
        Self::new(false, AxisAlignment::None)
    }
}

impl Default for RoundingSpec {
    fn default() -> Self {
        Self::whole_pixel()
    }
}

#[inline]
fn subpixel_bin(biased: f32) -> u8 {
    let fraction = biased - biased.floor();
    ((fraction * SUBPIXEL_SAMPLES as f32) as u8).min(SUBPIXEL_SAMPLES - 1)
}

impl RoundingPolicy for RoundingSpec {
    fn quantize(&self, device: Point) -> (IPoint, SubpixelBins) {
        let biased = device + self.half_axis_sample_freq;
        let bins = SubpixelBins {
            x: if self.subpixel_x { subpixel_bin(biased.x) } else { 0 },
            y: if self.subpixel_y { subpixel_bin(biased.y) } else { 0 },
        };
        (IPoint::floor(biased), bins)
    }
}

/// Integer shift that moves positions quantized under a matrix whose
/// origin mapped to `initial_origin` onto a translated matrix whose origin
/// maps to `new_origin`.
///
/// The difference should already be integral; rounding absorbs float
/// noise. Only meaningful when the two matrices share a linear part.
pub fn translation_shift(initial_origin: Point, new_origin: Point) -> IPoint {
    IPoint::round(new_origin - initial_origin)
}
