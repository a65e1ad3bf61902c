use criterion::{Criterion, black_box, criterion_group, criterion_main};
use racespace::{
    AnomalyDetector, FormatDispatcher, Sample, SourceFormat, TrackMapRenderer,
    telemetry::{downsample, problem_positions},
};
use serde_json::json;
use std::time::Duration;

fn create_sample(point_no: usize) -> Sample {
    let angle = point_no as f64 / 100.;
    Sample {
        x: Some(angle.cos() * 500.),
        y: Some(angle.sin() * 300.),
        z: Some(0.),
        speed: Some(150. + (point_no % 40) as f64),
        throttle: Some(if point_no % 50 == 0 { 0.6 } else { 1.0 }),
        brake: Some(if point_no % 50 == 0 { 0.9 } else { 0.0 }),
        gear: Some(((point_no / 100) % 6) as i32 + 1),
        ..Default::default()
    }
}

fn create_lap(points: usize) -> Vec<Sample> {
    (0..points).map(create_sample).collect()
}

fn create_csv(points: usize) -> String {
    let mut csv = String::from("Position_X,Position_Z,Speed,Throttle,Brake,Gear\n");
    for sample in create_lap(points) {
        csv.push_str(&format!(
            "{:.3},{:.3},{:.1},{},{},{}\n",
            sample.x.unwrap_or_default(),
            sample.y.unwrap_or_default(),
            sample.speed.unwrap_or_default(),
            sample.throttle.unwrap_or_default(),
            sample.brake.unwrap_or_default(),
            sample.gear.unwrap_or_default()
        ));
    }
    csv
}

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");
    let detector = AnomalyDetector::default();

    for points in [1_000, 10_000, 60_000] {
        let lap = create_lap(points);
        group.bench_function(format!("detect_{}_samples", points), |b| {
            b.iter(|| black_box(detector.detect(black_box(&lap))));
        });
    }

    let lap = create_lap(10_000);
    group.bench_function("problem_positions_10000_samples", |b| {
        b.iter(|| black_box(problem_positions(black_box(&lap))));
    });

    group.finish();
}

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");
    group.measurement_time(Duration::from_secs(10));
    let dispatcher = FormatDispatcher::default();

    let csv = create_csv(10_000);
    group.bench_function("decode_csv_10000_rows", |b| {
        b.iter(|| black_box(dispatcher.decode(black_box(csv.as_bytes()), SourceFormat::Csv)));
    });

    let records = create_lap(10_000)
        .iter()
        .map(|s| json!({"position": {"x": s.x, "y": s.z, "z": s.y}, "speed": s.speed}))
        .collect::<Vec<_>>();
    let document = json!({ "telemetry": records }).to_string();
    group.bench_function("decode_json_10000_records", |b| {
        b.iter(|| {
            black_box(dispatcher.decode(black_box(document.as_bytes()), SourceFormat::Json))
        });
    });

    group.finish();
}

fn bench_track_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("track_map");

    let lap = create_lap(60_000);
    let pairs = lap
        .iter()
        .map(|s| (s.x.unwrap_or_default(), s.y.unwrap_or_default()))
        .collect::<Vec<_>>();
    group.bench_function("downsample_60000_points", |b| {
        b.iter(|| black_box(downsample(black_box(&pairs), 200)));
    });

    let track = downsample(&pairs, 200);
    let problems = AnomalyDetector::default().detect(&lap);
    let renderer = TrackMapRenderer::default();
    group.bench_function("render_svg", |b| {
        b.iter(|| black_box(renderer.render(black_box(&track), black_box(&problems))));
    });

    group.finish();
}

criterion_group!(benches, bench_detection, bench_decoding, bench_track_map);
criterion_main!(benches);
