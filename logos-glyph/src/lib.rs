//! # logos-glyph
//!
//! Glyph staging for the Logos text renderer. Moves a shaped glyph run
//! through the drawing stages (atlas masks, path fallback) while keeping
//! ids and positions paired, quantizing positions to device pixels, and
//! handing each stage's rejects to the next without reallocating.
//!
//! ## Architecture
//!
//! ```text
//!  glyph run (ids + positions)
//!       │
//!       ▼
//!  SourceRejectTracker ──source──► StagedGlyphBuffer.start_device_positioning()
//!       ▲                                  │ input()
//!       │ reject(i)                        ▼
//!       └──────────────────────── Strike.glyph(packed_id) ──► accept_glyph()
//!                                          │ accepted_with_mask_format()
//!                                          ▼
//!                                   MaskBatch per format ──► GlyphSink
//! ```
//!
//! - **`buffer`**: phased packed-id → glyph staging storage.
//! - **`source`**: current source and reject bookkeeping between stages.
//! - **`rounding`**: device-space quantization and subpixel bins.
//! - **`strike`**: per-font glyph cache the stages resolve against.
//! - **`painter`**: the mask → path stage pipeline.
//! - **`run_cache`**: translation-only redraw of positioned runs.
//! - **`config`**: JSON-loadable settings.

pub mod buffer;
pub mod config;
pub mod geometry;
pub mod glyph;
pub mod painter;
pub mod rounding;
pub mod run_cache;
pub mod source;
pub mod strike;
pub mod zip;

// Re-exports for ergonomic use.
pub use buffer::{Input, Phase, StagedGlyphBuffer};
pub use config::{ConfigError, GlyphConfig};
pub use geometry::{IPoint, Matrix, Point};
pub use glyph::{Glyph, GlyphId, GlyphVariant, MaskFormat, PackedGlyphId, SubpixelBins};
pub use painter::{DrawStats, GlyphInstance, GlyphRunPainter, GlyphSink, MaskBatch, PathGlyph};
pub use rounding::{translation_shift, AxisAlignment, RoundingPolicy, RoundingSpec};
pub use run_cache::{CachedRun, RunCache, RunKey};
pub use source::SourceRejectTracker;
pub use strike::{GlyphScaler, Strike};
pub use zip::{Zip, Zip3};
