//! Staged glyph buffer: packed ids in, resolved glyphs out, one storage.
//!
//! A batch starts by loading packed glyph ids and positions. The consumer
//! walks the input, resolves each packed id against a glyph cache and
//! accepts what it can draw. Accepted entries are compacted to the front of
//! the same arrays, overwriting input that has already been read, so a batch
//! costs no allocation once the buffer is warm.
//!
//! # Phases
//!
//! ```text
//!            start_source*            input()            accepted*()
//!   Reset ────────────────► Input ─────────────► Process ────────────► Draw
//!     ▲                                                                  │
//!     └──────────────────────────────── reset() ─────────────────────────┘
//! ```
//!
//! Calling an operation in the wrong phase is a caller bug. It trips a
//! `debug_assert!` in debug builds and is not checked in release builds;
//! every access is still bounds checked, so misuse cannot read out of
//! bounds, only produce stale glyphs.

use std::fmt::Write as _;

use crate::geometry::{Matrix, Point};
use crate::glyph::{Glyph, GlyphId, GlyphVariant, MaskFormat, PackedGlyphId};
use crate::rounding::RoundingPolicy;
use crate::zip::{Zip, Zip3};

/// Capacity above which `reset` releases storage instead of keeping it.
pub const DEFAULT_SHRINK_THRESHOLD: usize = 200;

/// Where a [`StagedGlyphBuffer`] is in its per-batch cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Reset,
    Input,
    Process,
    Draw,
}

/// Reusable storage for moving one glyph run through a drawing stage.
///
/// `'g` is the lifetime of the glyph cache accepted glyphs are borrowed
/// from; it must outlive every batch staged through this buffer.
pub struct StagedGlyphBuffer<'g> {
    /// Slots allocated in each of the parallel arrays.
    max_size: usize,
    /// Entries loaded for the current batch.
    input_size: usize,
    /// Entries accepted so far; always at the front of the arrays.
    accepted_size: usize,
    /// Packed ids on input, resolved glyphs or packed ids once accepted.
    variants: Vec<GlyphVariant<'g>>,
    positions: Vec<Point>,
    /// Mask format per accepted entry, `None` for plain packed accepts.
    formats: Vec<Option<MaskFormat>>,
    phase: Phase,
    /// Source origin under the last device-positioning matrix.
    mapped_origin: Option<Point>,
    /// Matrix the last adjusted source was mapped through.
    creation_matrix: Option<Matrix>,
    /// Capacity above which `reset` releases storage.
    shrink_threshold: usize,
}

impl Default for StagedGlyphBuffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'g> StagedGlyphBuffer<'g> {
    pub fn new() -> Self {
        Self::with_shrink_threshold(DEFAULT_SHRINK_THRESHOLD)
    }

    pub fn with_shrink_threshold(shrink_threshold: usize) -> Self {
        Self {
            max_size: 0,
            input_size: 0,
            accepted_size: 0,
            variants: Vec::new(),
            positions: Vec::new(),
            formats: Vec::new(),
            phase: Phase::Reset,
            mapped_origin: None,
            creation_matrix: None,
            shrink_threshold,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Entries loaded by the last `start_source*` call.
    pub fn input_len(&self) -> usize {
        self.input_size
    }

    pub fn accepted_len(&self) -> usize {
        self.accepted_size
    }

    /// Grow storage to hold at least `size` entries. Never shrinks.
    pub fn ensure_size(&mut self, size: usize) {
        debug_assert_eq!(self.phase, Phase::Reset, "ensure_size outside Reset");
        if size > self.max_size {
            log::trace!("Glyph buffer grows {} -> {size}", self.max_size);
            self.variants.resize(size, GlyphVariant::Empty);
            self.positions.resize(size, Point::ZERO);
            self.formats.resize(size, None);
            self.max_size = size;
        }
        self.input_size = 0;
        self.accepted_size = 0;
    }

    // ---------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------

    /// Load ids and positions verbatim.
    pub fn start_source(&mut self, source: Zip<'_, GlyphId, Point>) {
        self.begin_input(source.len());
        self.positions[..source.len()].copy_from_slice(source.seconds());
        self.load_packed_ids(source.firsts());
    }

    /// Load ids with positions mapped through the matrix the batch was
    /// created under. The matrix is kept for later redraws.
    pub fn start_source_with_matrix_adjustment(
        &mut self,
        source: Zip<'_, GlyphId, Point>,
        creation_matrix: &Matrix,
    ) {
        self.begin_input(source.len());
        creation_matrix.map_points(&mut self.positions[..source.len()], source.seconds());
        self.load_packed_ids(source.firsts());
        self.creation_matrix = Some(*creation_matrix);
    }

    /// Load ids with positions quantized to integer device coordinates.
    ///
    /// Each position is mapped through `position_matrix` and quantized by
    /// `rounding`; subpixel bins go into the packed ids. Returns where the
    /// source origin lands under `position_matrix`.
    ///
    /// The stored positions can be reused for a matrix that differs only
    /// by translation:
    ///
    /// ```text
    /// (ix', iy') = (ix, iy) + round(new_mapped_origin - initial_mapped_origin)
    /// ```
    ///
    /// Any other change needs a fresh call.
    pub fn start_device_positioning<R>(
        &mut self,
        source: Zip<'_, GlyphId, Point>,
        position_matrix: &Matrix,
        rounding: &R,
    ) -> Point
    where
        R: RoundingPolicy + ?Sized,
    {
        self.begin_input(source.len());
        for (i, (&glyph_id, &position)) in source.iter().enumerate() {
            let (pixel, bins) = rounding.quantize(position_matrix.map_point(position));
            self.variants[i] = GlyphVariant::Packed(PackedGlyphId::with_subpixel(glyph_id, bins));
            self.positions[i] = pixel.to_point();
        }
        let origin = position_matrix.map_origin();
        self.mapped_origin = Some(origin);
        origin
    }

    fn begin_input(&mut self, size: usize) {
        self.ensure_size(size);
        self.input_size = size;
        self.mapped_origin = None;
        self.creation_matrix = None;
        self.phase = Phase::Input;
    }

    fn load_packed_ids(&mut self, glyph_ids: &[GlyphId]) {
        for (slot, &glyph_id) in self.variants.iter_mut().zip(glyph_ids) {
            *slot = GlyphVariant::Packed(PackedGlyphId::new(glyph_id));
        }
    }

    /// Origin mapping recorded by the last `start_device_positioning`.
    pub fn mapped_origin(&self) -> Option<Point> {
        self.mapped_origin
    }

    /// Matrix recorded by the last `start_source_with_matrix_adjustment`.
    pub fn creation_matrix(&self) -> Option<&Matrix> {
        self.creation_matrix.as_ref()
    }

    /// Readable listing of the loaded input, for debugging.
    pub fn dump_input(&self) -> String {
        let mut out = String::from("[");
        for i in 0..self.input_size {
            if i > 0 {
                out.push_str(", ");
            }
            let p = self.positions[i];
            match self.variants[i] {
                GlyphVariant::Packed(id) => {
                    let _ = write!(out, "{id:?}@({}, {})", p.x, p.y);
                }
                GlyphVariant::Glyph(glyph) => {
                    let _ = write!(out, "glyph {:?}@({}, {})", glyph.packed_id(), p.x, p.y);
                }
                GlyphVariant::Empty => out.push_str("empty"),
            }
        }
        out.push(']');
        out
    }

    // ---------------------------------------------------------------
    // Processing
    // ---------------------------------------------------------------

    /// Hand the loaded input to the caller. Moves `Input -> Process`.
    pub fn input(&mut self) -> Input<'_, 'g> {
        debug_assert_eq!(self.phase, Phase::Input, "input() outside Input");
        self.phase = Phase::Process;
        Input {
            buffer: self,
            next: 0,
        }
    }

    /// Call `f(index, packed_id, position)` for every input entry.
    pub fn for_each_input<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, PackedGlyphId, Point),
    {
        let mut input = self.input();
        while let Some((i, packed_id, position)) = input.next_entry() {
            f(i, packed_id, position);
        }
    }

    /// Accept a resolved glyph, taking the position of input entry `from`.
    ///
    /// `from` must not be behind the accepted count: accepted entries are
    /// compacted forward over input that has already been read.
    pub fn accept_glyph(&mut self, glyph: &'g Glyph, from: usize) {
        debug_assert_eq!(self.phase, Phase::Process, "accept outside Process");
        debug_assert!(self.accepted_size <= from, "accept from {from} already overwritten");
        debug_assert!(from < self.input_size, "accept from {from} past input");
        let slot = self.accepted_size;
        self.positions[slot] = self.positions[from];
        self.variants[slot] = GlyphVariant::Glyph(glyph);
        self.formats[slot] = Some(glyph.mask_format());
        self.accepted_size += 1;
    }

    /// Accept an entry still keyed by packed id, e.g. for path drawing.
    pub fn accept_packed(&mut self, packed_id: PackedGlyphId, position: Point) {
        self.push_packed(packed_id, position, None);
    }

    pub fn accept_packed_with_format(
        &mut self,
        packed_id: PackedGlyphId,
        position: Point,
        format: MaskFormat,
    ) {
        self.push_packed(packed_id, position, Some(format));
    }

    fn push_packed(&mut self, packed_id: PackedGlyphId, position: Point, format: Option<MaskFormat>) {
        debug_assert_eq!(self.phase, Phase::Process, "accept outside Process");
        debug_assert!(self.accepted_size < self.input_size, "more accepts than inputs");
        let slot = self.accepted_size;
        self.positions[slot] = position;
        self.variants[slot] = GlyphVariant::Packed(packed_id);
        self.formats[slot] = format;
        self.accepted_size += 1;
    }

    // ---------------------------------------------------------------
    // Drawing
    // ---------------------------------------------------------------

    /// The accepted entries. Moves `Process -> Draw`.
    pub fn accepted(&mut self) -> Zip<'_, GlyphVariant<'g>, Point> {
        self.enter_draw();
        let n = self.accepted_size;
        Zip::new(&self.variants[..n], &self.positions[..n])
    }

    /// The accepted entries with their mask formats. Moves `Process -> Draw`.
    pub fn accepted_with_mask_format(
        &mut self,
    ) -> Zip3<'_, GlyphVariant<'g>, Point, Option<MaskFormat>> {
        self.enter_draw();
        let n = self.accepted_size;
        Zip3::new(&self.variants[..n], &self.positions[..n], &self.formats[..n])
    }

    fn enter_draw(&mut self) {
        debug_assert_eq!(self.phase, Phase::Process, "accepted() outside Process");
        self.phase = Phase::Draw;
    }

    pub fn is_empty(&self) -> bool {
        debug_assert!(
            matches!(self.phase, Phase::Process | Phase::Draw),
            "is_empty() before processing"
        );
        self.accepted_size == 0
    }

    /// Return to `Reset`. Storage is kept unless it grew past the shrink
    /// threshold.
    pub fn reset(&mut self) {
        self.phase = Phase::Reset;
        if self.max_size > self.shrink_threshold {
            log::debug!(
                "Glyph buffer releases {} slots (threshold {})",
                self.max_size,
                self.shrink_threshold
            );
            self.variants = Vec::new();
            self.positions = Vec::new();
            self.formats = Vec::new();
            self.max_size = 0;
        }
        self.input_size = 0;
        self.accepted_size = 0;
        self.mapped_origin = None;
        self.creation_matrix = None;
    }
}

// ───────────────────────────────────────────────────────────────────
// Input cursor
// ───────────────────────────────────────────────────────────────────

/// Cursor over the input of a buffer in the `Process` phase.
///
/// Reads entries front to back and accepts through the same borrow. An
/// accept for entry `i` writes at or before `i`, so entries not yet read
/// are never disturbed.
///
/// ```ignore
/// let mut input = buffer.input();
/// while let Some((i, packed_id, position)) = input.next_entry() {
///     match strike.glyph(packed_id) {
///         Some(glyph) => input.accept_glyph(glyph, i),
///         None => rejects.reject(i),
///     }
/// }
/// ```
pub struct Input<'b, 'g> {
    buffer: &'b mut StagedGlyphBuffer<'g>,
    next: usize,
}

impl<'b, 'g> Input<'b, 'g> {
    pub fn len(&self) -> usize {
        self.buffer.input_size
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.input_size == 0
    }

    /// The next unread entry as `(index, packed_id, position)`.
    pub fn next_entry(&mut self) -> Option<(usize, PackedGlyphId, Point)> {
        let i = self.next;
        if i >= self.buffer.input_size {
            return None;
        }
        let packed_id = self.buffer.variants[i].packed_id()?;
        self.next += 1;
        Some((i, packed_id, self.buffer.positions[i]))
    }

    pub fn accept_glyph(&mut self, glyph: &'g Glyph, from: usize) {
        debug_assert!(from < self.next, "accept of unread entry {from}");
        self.buffer.accept_glyph(glyph, from);
    }

    /// Accept a packed entry. At most one accept per entry read so far.
    pub fn accept_packed(&mut self, packed_id: PackedGlyphId, position: Point) {
        debug_assert!(self.buffer.accepted_size < self.next, "accept before reading");
        self.buffer.accept_packed(packed_id, position);
    }

    pub fn accept_packed_with_format(
        &mut self,
        packed_id: PackedGlyphId,
        position: Point,
        format: MaskFormat,
    ) {
        debug_assert!(self.buffer.accepted_size < self.next, "accept before reading");
        self.buffer.accept_packed_with_format(packed_id, position, format);
    }

    pub fn accepted_len(&self) -> usize {
        self.buffer.accepted_size
    }
}
