//! Benchmarks for change detection

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geodelta_algorithms::change::{detect_changes, estimate_volumes, VolumeParams};
use geodelta_core::temporal::{DateSource, RasterSeries, TimedRaster};
use geodelta_core::{GeoTransform, Raster};

fn create_series(size: usize, steps: u32) -> RasterSeries<f64> {
    (0..steps)
        .map(|step| {
            let data = (0..size * size)
                .map(|i| ((i * 7 + step as usize * 13) % 200) as f64)
                .collect();
            let mut r = Raster::from_vec(data, 1, size, size).unwrap();
            r.set_transform(GeoTransform::new(0.0, size as f64, 10.0, -10.0));
            let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Days::new(step as u64 * 30);
            TimedRaster::new(date, DateSource::CompactSegment, r)
        })
        .collect()
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("change/detect");
    for size in [256, 512, 1024] {
        let series = create_series(size, 4);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| detect_changes(black_box(&series)))
        });
    }
    group.finish();
}

fn bench_volume(c: &mut Criterion) {
    let mut group = c.benchmark_group("change/volume");
    for size in [256, 512, 1024] {
        let changes = detect_changes(&create_series(size, 4));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| estimate_volumes(black_box(&changes), VolumeParams::default()).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detect, bench_volume);
criterion_main!(benches);
