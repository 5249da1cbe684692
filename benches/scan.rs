mod common;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qr_frame_scanner::generate::{FrameLayout, default_payloads, test_frame};
use qr_frame_scanner::tools::load_image;
use qr_frame_scanner::{ScanProfile, Scanner};

fn bench_generated_frame(c: &mut Criterion) {
    let frame = test_frame(&default_payloads(), &FrameLayout::default()).unwrap();
    let mut group = c.benchmark_group("scan_generated_800x600");
    group.sample_size(10);

    for profile in ScanProfile::ALL {
        let scanner = Scanner::new(profile);
        group.bench_with_input(BenchmarkId::from_parameter(profile), &scanner, |b, s| {
            b.iter(|| s.scan_gray(black_box(&frame), "bench"))
        });
    }
    group.finish();
}

fn bench_dataset(c: &mut Criterion) {
    let (root, images) = common::collect_dataset_images();
    if images.is_empty() {
        eprintln!("No images under {}, skipping dataset bench", root.display());
        return;
    }

    let scanner = Scanner::new(ScanProfile::LowRes);
    let frames: Vec<_> = images
        .iter()
        .filter_map(|path| load_image(path).ok().map(|img| (path.display().to_string(), img)))
        .collect();

    let mut group = c.benchmark_group("scan_dataset_low_res");
    group.sample_size(10);
    for (name, frame) in &frames {
        group.bench_with_input(BenchmarkId::from_parameter(name), frame, |b, f| {
            b.iter(|| scanner.scan_image(black_box(f), "bench"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generated_frame, bench_dataset);
criterion_main!(benches);
