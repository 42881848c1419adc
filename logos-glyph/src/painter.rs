//! Multi-stage glyph run drawing.
//!
//! ```text
//!  run ─► mask stage ──accepted──► MaskBatch per format ─► sink.draw_masks
//!            │ rejects (too big / unknown)
//!            ▼
//!        path stage ──accepted──► PathGlyph list ───────► sink.draw_paths
//!            │ rejects (no outline)
//!            ▼
//!         dropped
//! ```
//!
//! Both stages run through the same [`StagedGlyphBuffer`]; a
//! [`SourceRejectTracker`] carries each stage's rejects into the next.

use bytemuck::{Pod, Zeroable};
use rustc_hash::FxHashMap;

use crate::buffer::StagedGlyphBuffer;
use crate::config::GlyphConfig;
use crate::geometry::{IPoint, Matrix, Point};
use crate::glyph::{Glyph, GlyphId, MaskFormat, PackedGlyphId};
use crate::rounding::RoundingSpec;
use crate::run_cache::{CachedRun, RunCache, RunKey};
use crate::source::SourceRejectTracker;
use crate::strike::Strike;
use crate::zip::Zip;

// ───────────────────────────────────────────────────────────────────
// Output types
// ───────────────────────────────────────────────────────────────────

/// One glyph quad ready for instanced drawing.
///
/// 24 bytes per instance.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlyphInstance {
    /// Top-left of the glyph image in device pixels.
    pub position: [f32; 2],
    /// Image width and height in pixels.
    pub size: [f32; 2],
    /// Packed glyph id, the atlas lookup key.
    pub packed_id: u32,
    /// `MaskFormat` discriminant.
    pub format: u32,
}

impl GlyphInstance {
    /// Place `glyph` with its origin at the integer device position `origin`.
    pub fn new(glyph: &Glyph, origin: Point) -> Self {
        Self {
            position: [
                origin.x + glyph.left() as f32,
                origin.y + glyph.top() as f32,
            ],
            size: [glyph.width() as f32, glyph.height() as f32],
            packed_id: glyph.packed_id().value(),
            format: glyph.mask_format() as u32,
        }
    }

    pub fn translated(&self, shift: IPoint) -> Self {
        Self {
            position: [
                self.position[0] + shift.x as f32,
                self.position[1] + shift.y as f32,
            ],
            ..*self
        }
    }
}

/// Mask glyphs sharing a format, drawn with one pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskBatch {
    pub format: MaskFormat,
    pub instances: Vec<GlyphInstance>,
}

impl MaskBatch {
    pub fn translated(&self, shift: IPoint) -> MaskBatch {
        MaskBatch {
            format: self.format,
            instances: self.instances.iter().map(|g| g.translated(shift)).collect(),
        }
    }

    /// Instance data as raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// A glyph drawn from its outline, in source space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathGlyph {
    pub packed_id: PackedGlyphId,
    pub position: Point,
}

/// Where drawn glyphs go. Implemented by the rasterizer back end.
pub trait GlyphSink {
    fn draw_masks(&mut self, batch: &MaskBatch);

    /// Path glyphs are in source space; `matrix` maps them to the device.
    fn draw_paths(&mut self, paths: &[PathGlyph], matrix: &Matrix);
}

/// Per-run counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Glyphs drawn from masks.
    pub masks: usize,
    /// Glyphs drawn from paths.
    pub paths: usize,
    /// Glyphs with no image (spaces).
    pub empty: usize,
    /// Glyphs no stage could draw.
    pub dropped: usize,
}

// ───────────────────────────────────────────────────────────────────
// GlyphRunPainter
// ───────────────────────────────────────────────────────────────────

/// Draws glyph runs through the mask and path stages.
///
/// Glyphs are borrowed from strikes living at least as long as `'g`.
pub struct GlyphRunPainter<'g> {
    buffer: StagedGlyphBuffer<'g>,
    rounding: RoundingSpec,
    max_mask_dimension: u16,
    paths: Vec<PathGlyph>,
    run_cache: RunCache,
}

impl<'g> GlyphRunPainter<'g> {
    pub fn new(config: &GlyphConfig) -> Self {
        Self {
            buffer: StagedGlyphBuffer::with_shrink_threshold(config.shrink_threshold),
            rounding: config.rounding_spec(),
            max_mask_dimension: config.max_mask_dimension,
            paths: Vec::new(),
            run_cache: RunCache::new(config.run_cache_capacity),
        }
    }

    pub fn rounding(&self) -> &RoundingSpec {
        &self.rounding
    }

    pub fn run_cache(&self) -> &RunCache {
        &self.run_cache
    }

    /// Draw one run under `matrix`.
    pub fn draw_run<S>(
        &mut self,
        run: Zip<'_, GlyphId, Point>,
        strike: &'g Strike,
        matrix: &Matrix,
        sink: &mut S,
    ) -> DrawStats
    where
        S: GlyphSink + ?Sized,
    {
        let mut stats = DrawStats::default();
        let (batches, _) = self.run_stages(run, strike, matrix, &mut stats);
        for batch in &batches {
            sink.draw_masks(batch);
        }
        if !self.paths.is_empty() {
            sink.draw_paths(&self.paths, matrix);
        }
        stats
    }

    /// Draw a run that is redrawn across frames.
    ///
    /// When `run_id` was last drawn under a matrix with the same linear
    /// part, the cached mask batches are shifted by the change in mapped
    /// origin instead of going through the stages again. Subpixel strikes
    /// additionally need an integral shift to stay in the same bins.
    pub fn draw_run_cached<S>(
        &mut self,
        run_id: u64,
        run: Zip<'_, GlyphId, Point>,
        strike: &'g Strike,
        matrix: &Matrix,
        sink: &mut S,
    ) -> DrawStats
    where
        S: GlyphSink + ?Sized,
    {
        let key = RunKey::new(run_id, matrix);
        let require_integral = self.rounding.is_subpixel;
        if let Some((shift, cached)) = self.run_cache.lookup(&key, matrix, require_integral) {
            log::trace!("Run {run_id}: reusing cached positions, shift {shift:?}");
            for batch in &cached.batches {
                sink.draw_masks(&batch.translated(shift));
            }
            if !cached.paths.is_empty() {
                sink.draw_paths(&cached.paths, matrix);
            }
            return cached.stats;
        }

        let mut stats = DrawStats::default();
        let (batches, origin) = self.run_stages(run, strike, matrix, &mut stats);
        for batch in &batches {
            sink.draw_masks(batch);
        }
        if !self.paths.is_empty() {
            sink.draw_paths(&self.paths, matrix);
        }
        self.run_cache.insert(
            key,
            CachedRun {
                initial_origin: origin,
                batches,
                paths: self.paths.clone(),
                stats,
            },
        );
        stats
    }

    fn run_stages(
        &mut self,
        run: Zip<'_, GlyphId, Point>,
        strike: &'g Strike,
        matrix: &Matrix,
        stats: &mut DrawStats,
    ) -> (Vec<MaskBatch>, Point) {
        let mut rejects = SourceRejectTracker::new(run);
        let (batches, origin) = self.mask_stage(&mut rejects, strike, matrix, stats);

        self.paths.clear();
        if !rejects.flip_rejects_to_source().is_empty() {
            self.path_stage(&mut rejects, strike, stats);
            rejects.flip_rejects_to_source();
        }

        stats.dropped = rejects.source().len();
        if stats.dropped > 0 {
            log::debug!("Dropped {} of {} glyphs no stage could draw", stats.dropped, run.len());
        }
        log::trace!(
            "Run of {}: {} masks in {} batches, {} paths, {} empty",
            run.len(),
            stats.masks,
            batches.len(),
            stats.paths,
            stats.empty
        );
        (batches, origin)
    }

    /// Device-position the source and accept every glyph small enough for
    /// the atlas. Accepted glyphs come back grouped by mask format.
    fn mask_stage(
        &mut self,
        rejects: &mut SourceRejectTracker<'_>,
        strike: &'g Strike,
        matrix: &Matrix,
        stats: &mut DrawStats,
    ) -> (Vec<MaskBatch>, Point) {
        let max_dimension = self.max_mask_dimension;
        let buffer = &mut self.buffer;
        let origin = buffer.start_device_positioning(rejects.source(), matrix, &self.rounding);

        let mut input = buffer.input();
        while let Some((i, packed_id, _)) = input.next_entry() {
            match strike.glyph(packed_id) {
                Some(glyph) if glyph.is_empty() => stats.empty += 1,
                Some(glyph) if glyph.max_dimension() <= max_dimension => {
                    input.accept_glyph(glyph, i)
                }
                _ => rejects.reject(i),
            }
        }

        let mut grouped: FxHashMap<MaskFormat, Vec<GlyphInstance>> = FxHashMap::default();
        for (variant, position, format) in buffer.accepted_with_mask_format().iter() {
            let Some(glyph) = variant.glyph() else {
                continue;
            };
            let format = format.unwrap_or(glyph.mask_format());
            grouped
                .entry(format)
                .or_default()
                .push(GlyphInstance::new(glyph, *position));
            stats.masks += 1;
        }
        buffer.reset();

        let mut batches: Vec<MaskBatch> = grouped
            .into_iter()
            .map(|(format, instances)| MaskBatch { format, instances })
            .collect();
        batches.sort_by_key(|b| b.format);
        (batches, origin)
    }

    /// Accept the remaining glyphs that have an outline, keyed by packed id
    /// at their source positions.
    fn path_stage(
        &mut self,
        rejects: &mut SourceRejectTracker<'_>,
        strike: &'g Strike,
        stats: &mut DrawStats,
    ) {
        let buffer = &mut self.buffer;
        buffer.start_source(rejects.source());

        let mut input = buffer.input();
        while let Some((i, packed_id, position)) = input.next_entry() {
            match strike.glyph(packed_id) {
                Some(glyph) if glyph.has_path() => input.accept_packed(packed_id, position),
                _ => rejects.reject(i),
            }
        }

        for (variant, position) in buffer.accepted().iter() {
            if let Some(packed_id) = variant.packed_id() {
                self.paths.push(PathGlyph {
                    packed_id,
                    position: *position,
                });
            }
        }
        stats.paths += self.paths.len();
        buffer.reset();
    }
}
