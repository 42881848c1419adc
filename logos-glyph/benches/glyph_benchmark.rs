use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use logos_glyph::{
    Glyph, GlyphConfig, GlyphId, GlyphRunPainter, GlyphScaler, GlyphSink, MaskBatch, MaskFormat,
    Matrix, PackedGlyphId, PathGlyph, Point, RoundingSpec, SourceRejectTracker, StagedGlyphBuffer,
    Strike, Zip,
};

struct BenchScaler;

impl GlyphScaler for BenchScaler {
    fn make_glyph(&self, packed_id: PackedGlyphId) -> Option<Glyph> {
        let side = (packed_id.glyph_id() % 40) + 4;
        Some(Glyph::new(packed_id, side, side, 0, -(side as i16), MaskFormat::A8).with_path(true))
    }
}

struct NullSink;

impl GlyphSink for NullSink {
    fn draw_masks(&mut self, batch: &MaskBatch) {
        black_box(batch.as_bytes());
    }

    fn draw_paths(&mut self, paths: &[PathGlyph], _matrix: &Matrix) {
        black_box(paths);
    }
}

fn run(len: usize) -> (Vec<GlyphId>, Vec<Point>) {
    let ids = (0..len).map(|i| (i % 200) as GlyphId).collect();
    let positions = (0..len)
        .map(|i| Point::new((i % 80) as f32 * 7.3, (i / 80) as f32 * 18.0))
        .collect();
    (ids, positions)
}

fn bench_device_positioning(c: &mut Criterion) {
    let (ids, positions) = run(1000);
    let matrix = Matrix::new(1.25, 0.0, 13.7, 0.0, 1.25, 40.2);
    let spec = RoundingSpec::whole_pixel();
    let mut buffer = StagedGlyphBuffer::with_shrink_threshold(4096);

    c.bench_function("device_positioning_1000", |b| {
        b.iter(|| {
            buffer.start_device_positioning(Zip::new(&ids, &positions), black_box(&matrix), &spec);
            buffer.input();
            buffer.reset();
        });
    });
}

fn bench_reject_flip(c: &mut Criterion) {
    let (ids, positions) = run(1000);

    c.bench_function("reject_every_third_then_flip", |b| {
        let mut tracker = SourceRejectTracker::default();
        b.iter(|| {
            tracker.set_source(Zip::new(&ids, &positions));
            for i in (0..ids.len()).step_by(3) {
                tracker.reject(i);
            }
            let len = tracker.flip_rejects_to_source().len();
            for i in (0..len).step_by(2) {
                tracker.reject(i);
            }
            black_box(tracker.flip_rejects_to_source().len())
        });
    });
}

fn bench_painter(c: &mut Criterion) {
    let (ids, positions) = run(1000);
    let strike = Strike::new(BenchScaler, 200);
    let config = GlyphConfig {
        max_mask_dimension: 32,
        shrink_threshold: 4096,
        ..Default::default()
    };
    let mut painter = GlyphRunPainter::new(&config);
    let matrix = Matrix::translate(10.5, 20.5);

    c.bench_function("painter_draw_run_1000", |b| {
        b.iter(|| painter.draw_run(Zip::new(&ids, &positions), &strike, black_box(&matrix), &mut NullSink));
    });

    c.bench_function("painter_draw_run_cached_translate", |b| {
        let mut dx = 0.0f32;
        b.iter(|| {
            dx += 1.0;
            let moved = matrix.post_translate(dx, 0.0);
            painter.draw_run_cached(1, Zip::new(&ids, &positions), &strike, &moved, &mut NullSink)
        });
    });
}

criterion_group!(benches, bench_device_positioning, bench_reject_flip, bench_painter);
criterion_main!(benches);
