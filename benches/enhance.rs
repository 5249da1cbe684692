use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::imageops::{self, FilterType};
use qr_frame_scanner::EnhanceConfig;
use qr_frame_scanner::enhance::Enhancement;
use qr_frame_scanner::generate::{FrameLayout, default_payloads, test_frame};

/// The four-module frame shrunk to a webcam-ish 320x240
fn low_res_frame() -> image::GrayImage {
    let frame = test_frame(&default_payloads(), &FrameLayout::default()).unwrap();
    imageops::resize(&frame, 320, 240, FilterType::Triangle)
}

fn bench_enhancements(c: &mut Criterion) {
    let gray = low_res_frame();
    let config = EnhanceConfig::default();
    let mut group = c.benchmark_group("enhance_320x240");
    group.sample_size(20);

    for enhancement in Enhancement::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(enhancement.name()),
            &enhancement,
            |b, &e| b.iter(|| e.apply(black_box(&gray), black_box(&config))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_enhancements);
criterion_main!(benches);
