//! The source of glyphs between the stages of glyph drawing.
//!
//! The first source is the caller's glyph run. Each stage walks the
//! current source and rejects the glyphs it cannot handle; flipping then
//! makes those rejects the source of the next stage.
//!
//! ```text
//!  run ──► stage 1 ──reject──► [ids|pos] ──flip──► stage 2 ──reject──► ...
//!                               (owned)              (same storage, in place)
//! ```
//!
//! Rejects from the caller's run are copied into owned storage. Once the
//! source *is* that storage, later rejects are written in place: a stage
//! can only reject a subset of what it was given, so the write cursor never
//! passes the read index and the storage never grows.

use crate::geometry::Point;
use crate::glyph::GlyphId;
use crate::zip::Zip;

#[derive(Clone, Copy)]
enum Source<'s> {
    /// A run owned by the caller.
    External(Zip<'s, GlyphId, Point>),
    /// The first `n` entries of the tracker's reject storage.
    Rejects(usize),
}

/// Tracks the current source sequence and the glyphs the current stage
/// rejected from it.
pub struct SourceRejectTracker<'s> {
    /// What the current stage reads from.
    source: Source<'s>,
    /// Rejects recorded by the current stage; also the in-place write cursor.
    reject_count: usize,
    /// Reject storage, parallel to `rejected_positions`.
    rejected_ids: Vec<GlyphId>,
    rejected_positions: Vec<Point>,
}

impl Default for SourceRejectTracker<'_> {
    fn default() -> Self {
        Self {
            source: Source::External(Zip::default()),
            reject_count: 0,
            rejected_ids: Vec::new(),
            rejected_positions: Vec::new(),
        }
    }
}

impl<'s> SourceRejectTracker<'s> {
    pub fn new(source: Zip<'s, GlyphId, Point>) -> Self {
        let mut tracker = Self::default();
        tracker.set_source(source);
        tracker
    }

    /// Start over with a new source. Pending rejects are discarded; reject
    /// storage keeps its capacity.
    pub fn set_source(&mut self, source: Zip<'s, GlyphId, Point>) {
        self.source = Source::External(source);
        self.reject_count = 0;
        self.rejected_ids.clear();
        self.rejected_positions.clear();
    }

    /// Reject the entry at `index` of the current source.
    ///
    /// When the source is the tracker's own storage, rejects must come in
    /// increasing index order.
    pub fn reject(&mut self, index: usize) {
        match self.source {
            Source::External(source) => {
                debug_assert!(index < source.len(), "reject index {index} out of range");
                let Some((&id, &position)) = source.get(index) else {
                    return;
                };
                self.rejected_ids.push(id);
                self.rejected_positions.push(position);
            }
            Source::Rejects(len) => {
                debug_assert!(index < len, "reject index {index} out of range");
                debug_assert!(
                    self.reject_count <= index,
                    "in-place reject {index} behind write cursor {}",
                    self.reject_count
                );
                let slot = self.reject_count;
                self.rejected_ids[slot] = self.rejected_ids[index];
                self.rejected_positions[slot] = self.rejected_positions[index];
            }
        }
        self.reject_count += 1;
    }

    /// Make the rejects collected so far the new source and return it.
    /// Call between stages only.
    pub fn flip_rejects_to_source(&mut self) -> Zip<'_, GlyphId, Point> {
        // Truncation keeps capacity, so in-place rejects never reallocate.
        self.rejected_ids.truncate(self.reject_count);
        self.rejected_positions.truncate(self.reject_count);
        self.source = Source::Rejects(self.reject_count);
        self.reject_count = 0;
        self.source()
    }

    pub fn source(&self) -> Zip<'_, GlyphId, Point> {
        match self.source {
            Source::External(source) => source,
            Source::Rejects(len) => {
                Zip::new(&self.rejected_ids[..len], &self.rejected_positions[..len])
            }
        }
    }

    /// Rejects recorded since the last `set_source` or flip.
    pub fn reject_count(&self) -> usize {
        self.reject_count
    }

    /// True once the source has been flipped onto the reject storage.
    pub fn source_is_rejects(&self) -> bool {
        matches!(self.source, Source::Rejects(_))
    }

    pub fn reject_capacity(&self) -> usize {
        self.rejected_ids.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> (Vec<GlyphId>, Vec<Point>) {
        let ids = vec![10, 11, 12, 13, 14, 15];
        let positions = (0..6).map(|i| Point::new(i as f32, i as f32 * 2.0)).collect();
        (ids, positions)
    }

    fn entries(zip: Zip<'_, GlyphId, Point>) -> Vec<(GlyphId, Point)> {
        zip.iter().map(|(id, p)| (*id, *p)).collect()
    }

    #[test]
    fn test_initial_source_is_the_run() {
        let (ids, positions) = run();
        let tracker = SourceRejectTracker::new(Zip::new(&ids, &positions));
        assert_eq!(tracker.source().len(), 6);
        assert!(std::ptr::eq(tracker.source().firsts().as_ptr(), ids.as_ptr()));
        assert!(!tracker.source_is_rejects());
    }

    #[test]
    fn test_flip_yields_rejects_in_reject_order() {
        let (ids, positions) = run();
        let mut tracker = SourceRejectTracker::new(Zip::new(&ids, &positions));
        tracker.reject(4);
        tracker.reject(1);
        tracker.reject(5);
        assert_eq!(tracker.reject_count(), 3);

        let flipped = entries(tracker.flip_rejects_to_source());
        assert_eq!(
            flipped,
            vec![(14, positions[4]), (11, positions[1]), (15, positions[5])]
        );
        assert_eq!(tracker.reject_count(), 0);
        assert!(tracker.source_is_rejects());
    }

    #[test]
    fn test_rejecting_from_rejects_is_in_place() {
        let (ids, positions) = run();
        let mut tracker = SourceRejectTracker::new(Zip::new(&ids, &positions));
        for i in [0, 2, 3, 5] {
            tracker.reject(i);
        }
        tracker.flip_rejects_to_source();
        let capacity = tracker.reject_capacity();
        let data = tracker.source().firsts().as_ptr();

        // Second stage rejects entries 1 and 3 of [10, 12, 13, 15].
        tracker.reject(1);
        tracker.reject(3);
        let second = entries(tracker.flip_rejects_to_source());
        assert_eq!(second, vec![(12, positions[2]), (15, positions[5])]);
        assert_eq!(tracker.reject_capacity(), capacity);
        assert!(std::ptr::eq(tracker.source().firsts().as_ptr(), data));
    }

    #[test]
    fn test_flip_without_rejects_is_empty() {
        let (ids, positions) = run();
        let mut tracker = SourceRejectTracker::new(Zip::new(&ids, &positions));
        assert!(tracker.flip_rejects_to_source().is_empty());
        assert!(tracker.flip_rejects_to_source().is_empty());
    }

    #[test]
    fn test_set_source_discards_previous_state() {
        let (ids, positions) = run();
        let mut tracker = SourceRejectTracker::new(Zip::new(&ids, &positions));
        tracker.reject(0);
        tracker.reject(1);
        tracker.flip_rejects_to_source();
        tracker.reject(0);

        let other_ids = [99u16];
        let other_positions = [Point::new(7.0, 7.0)];
        tracker.set_source(Zip::new(&other_ids, &other_positions));
        assert_eq!(tracker.reject_count(), 0);
        assert!(!tracker.source_is_rejects());
        assert_eq!(entries(tracker.source()), vec![(99, Point::new(7.0, 7.0))]);

        tracker.reject(0);
        assert_eq!(
            entries(tracker.flip_rejects_to_source()),
            vec![(99, Point::new(7.0, 7.0))]
        );
    }

    #[test]
    fn test_capacity_survives_set_source() {
        let (ids, positions) = run();
        let mut tracker = SourceRejectTracker::new(Zip::new(&ids, &positions));
        for i in 0..6 {
            tracker.reject(i);
        }
        let capacity = tracker.reject_capacity();
        tracker.set_source(Zip::new(&ids, &positions));
        assert!(tracker.reject_capacity() >= capacity);
    }

    #[test]
    fn test_many_stages_shrink_monotonically() {
        let ids: Vec<GlyphId> = (0..32).collect();
        let positions: Vec<Point> = (0..32).map(|i| Point::new(i as f32, 0.0)).collect();
        let mut tracker = SourceRejectTracker::new(Zip::new(&ids, &positions));
        let mut expected: Vec<GlyphId> = ids.clone();
        // Each stage rejects every other entry of its source.
        while expected.len() > 1 {
            let len = tracker.source().len();
            for i in (0..len).step_by(2) {
                tracker.reject(i);
            }
            expected = expected.iter().copied().step_by(2).collect();
            let got: Vec<GlyphId> = tracker.flip_rejects_to_source().firsts().to_vec();
            assert_eq!(got, expected);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn test_reject_out_of_range_asserts() {
        let (ids, positions) = run();
        let mut tracker = SourceRejectTracker::new(Zip::new(&ids, &positions));
        tracker.reject(6);
    }
}
