//! Pipeline configuration.
//!
//! Every field has a default, so a JSON document only needs the fields it
//! wants to change:
//!
//! ```json
//! { "subpixel": true, "axis_alignment": "x" }
//! ```

use serde::Deserialize;
use thiserror::Error;

use crate::buffer::DEFAULT_SHRINK_THRESHOLD;
use crate::rounding::{AxisAlignment, RoundingSpec};

/// Glyphs larger than this on either side are drawn as paths.
pub const DEFAULT_MAX_MASK_DIMENSION: u16 = 256;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid glyph config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("max_mask_dimension must be non-zero")]
    ZeroMaskDimension,
    #[error("run_cache_capacity must be non-zero")]
    ZeroRunCacheCapacity,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlyphConfig {
    /// Position glyphs at quarter-pixel precision along the aligned axis.
    pub subpixel: bool,
    /// Layout axis of the runs being drawn.
    pub axis_alignment: AxisAlignment,
    /// Largest glyph side, in pixels, the mask stage accepts.
    pub max_mask_dimension: u16,
    /// Buffer capacity above which storage is released between batches.
    pub shrink_threshold: usize,
    /// Device-positioned runs kept for translation-only redraws.
    pub run_cache_capacity: usize,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            subpixel: false,
            axis_alignment: AxisAlignment::None,
            max_mask_dimension: DEFAULT_MAX_MASK_DIMENSION,
            shrink_threshold: DEFAULT_SHRINK_THRESHOLD,
            run_cache_capacity: 64,
        }
    }
}

impl GlyphConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GlyphConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Glyph config: subpixel={} alignment={:?} max_mask={}",
            config.subpixel,
            config.axis_alignment,
            config.max_mask_dimension
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_mask_dimension == 0 {
            return Err(ConfigError::ZeroMaskDimension);
        }
        if self.run_cache_capacity == 0 {
            return Err(ConfigError::ZeroRunCacheCapacity);
        }
        Ok(())
    }

    pub fn rounding_spec(&self) -> RoundingSpec {
        RoundingSpec::new(self.subpixel, self.axis_alignment)
    }
}
