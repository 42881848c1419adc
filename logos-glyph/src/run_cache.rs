//! Cache of device-positioned runs for translation-only redraws.
//!
//! Integer positions quantized under one matrix stay valid under any
//! matrix with the same linear part; the run just moves by
//! `round(new_origin - initial_origin)`. Entries are keyed by run id and
//! the linear part of the matrix, and evicted least recently used first.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::geometry::{IPoint, Matrix, Point};
use crate::painter::{DrawStats, MaskBatch, PathGlyph};
use crate::rounding::translation_shift;

/// Largest distance from an integer a translation may have and still
/// count as integral.
const INTEGRAL_TOLERANCE: f32 = 1.0 / 256.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunKey {
    run_id: u64,
    linear: [u32; 4],
}

impl RunKey {
    pub fn new(run_id: u64, matrix: &Matrix) -> Self {
        Self {
            run_id,
            linear: matrix.linear_bits(),
        }
    }
}

/// A drawn run: its mask batches at the initial matrix, its path glyphs
/// (source space) and the counts it produced.
#[derive(Clone, Debug)]
pub struct CachedRun {
    pub initial_origin: Point,
    pub batches: Vec<MaskBatch>,
    pub paths: Vec<PathGlyph>,
    pub stats: DrawStats,
}

impl CachedRun {
    /// Shift that moves this run onto `matrix`, or `None` when the run has
    /// to be positioned again.
    pub fn shift_for(&self, matrix: &Matrix, require_integral: bool) -> Option<IPoint> {
        let delta = matrix.map_origin() - self.initial_origin;
        let shift = translation_shift(self.initial_origin, matrix.map_origin());
        if require_integral {
            let off_x = (delta.x - shift.x as f32).abs();
            let off_y = (delta.y - shift.y as f32).abs();
            if off_x > INTEGRAL_TOLERANCE || off_y > INTEGRAL_TOLERANCE {
                return None;
            }
        }
        Some(shift)
    }
}

pub struct RunCache {
    entries: LruCache<RunKey, CachedRun>,
    hits: u64,
    misses: u64,
}

impl RunCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a run, touching it for LRU purposes.
    pub fn get(&mut self, key: &RunKey) -> Option<&CachedRun> {
        match self.entries.get(key) {
            Some(run) => {
                self.hits += 1;
                Some(run)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up a run and the shift that moves it onto `matrix`. An entry
    /// that cannot be shifted counts as a miss.
    pub fn lookup(
        &mut self,
        key: &RunKey,
        matrix: &Matrix,
        require_integral: bool,
    ) -> Option<(IPoint, &CachedRun)> {
        let found = self
            .entries
            .get(key)
            .and_then(|run| Some((run.shift_for(matrix, require_integral)?, run)));
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn insert(&mut self, key: RunKey, run: CachedRun) {
        if let Some((evicted, _)) = self.entries.push(key, run) {
            if evicted != key {
                log::trace!("Run cache evicted run {}", evicted.run_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(origin: Point) -> CachedRun {
        CachedRun {
            initial_origin: origin,
            batches: Vec::new(),
            paths: Vec::new(),
            stats: DrawStats::default(),
        }
    }

    #[test]
    fn test_key_ignores_translation() {
        let a = RunKey::new(1, &Matrix::translate(5.0, 5.0));
        let b = RunKey::new(1, &Matrix::translate(-3.0, 8.5));
        assert_eq!(a, b);
        assert_ne!(a, RunKey::new(2, &Matrix::IDENTITY));
        assert_ne!(a, RunKey::new(1, &Matrix::scale(2.0, 2.0)));
    }

    #[test]
    fn test_shift_for_whole_pixel_rounds() {
        let run = cached(Point::new(10.0, 10.0));
        let shift = run.shift_for(&Matrix::translate(12.4, 7.6), false);
        assert_eq!(shift, Some(IPoint::new(2, -2)));
    }

    #[test]
    fn test_shift_for_subpixel_needs_integral_translation() {
        let run = cached(Point::new(10.25, 0.0));
        assert_eq!(run.shift_for(&Matrix::translate(13.25, 1.0), true), Some(IPoint::new(3, 1)));
        assert_eq!(run.shift_for(&Matrix::translate(13.5, 1.0), true), None);
    }

    #[test]
    fn test_lru_eviction_and_counters() {
        let mut cache = RunCache::new(2);
        let k1 = RunKey::new(1, &Matrix::IDENTITY);
        let k2 = RunKey::new(2, &Matrix::IDENTITY);
        let k3 = RunKey::new(3, &Matrix::IDENTITY);
        cache.insert(k1, cached(Point::ZERO));
        cache.insert(k2, cached(Point::ZERO));
        assert!(cache.get(&k1).is_some());
        cache.insert(k3, cached(Point::ZERO));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&k2).is_none());
        assert!(cache.get(&k3).is_some());
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lookup_counts_unshiftable_entry_as_miss() {
        let mut cache = RunCache::new(4);
        let key = RunKey::new(1, &Matrix::translate(10.25, 0.0));
        cache.insert(key, cached(Point::new(10.25, 0.0)));

        assert!(cache.lookup(&key, &Matrix::translate(10.75, 0.0), true).is_none());
        assert_eq!((cache.hits(), cache.misses()), (0, 1));

        let (shift, _) = cache.lookup(&key, &Matrix::translate(12.25, 1.0), true).unwrap();
        assert_eq!(shift, IPoint::new(2, 1));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_zero_capacity_clamps_to_one() {
        let mut cache = RunCache::new(0);
        cache.insert(RunKey::new(1, &Matrix::IDENTITY), cached(Point::ZERO));
        assert_eq!(cache.len(), 1);
    }
}
