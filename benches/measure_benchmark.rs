use criterion::{black_box, criterion_group, criterion_main, Criterion};
use framecal::{measure, FrameSpec, Mat, MeasureRequest, Point2f};
use image::{DynamicImage, Rgb, RgbImage};

fn synthetic_drawer() -> Mat {
    let mut img = RgbImage::from_pixel(1000, 600, Rgb([90, 90, 90]));
    for y in 30..570 {
        for x in 80..920 {
            img.put_pixel(x, y, Rgb([25, 25, 25]));
        }
    }
    for y in 0..600u32 {
        for x in 0..1000u32 {
            let dx = x as f32 - 400.0;
            let dy = y as f32 - 300.0;
            if (dx * dx + dy * dy).sqrt() <= 80.0 {
                img.put_pixel(x, y, Rgb([230, 230, 230]));
            }
        }
    }
    Mat::new(DynamicImage::ImageRgb8(img))
}

fn benchmark_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");
    group.sample_size(10);

    let image = synthetic_drawer();
    let request = MeasureRequest::new(
        vec![
            Point2f::new(100.0, 50.0),
            Point2f::new(900.0, 50.0),
            Point2f::new(900.0, 550.0),
            Point2f::new(100.0, 550.0),
        ],
        FrameSpec::new(300.0, 180.0),
    );

    group.bench_function("measure_1000x600", |b| {
        b.iter(|| measure(black_box(&image), black_box(&request)).expect("measure failed"))
    });

    group.finish();
}

criterion_group!(benches, benchmark_full_pipeline);
criterion_main!(benches);
