use criterion::{criterion_group, criterion_main, Criterion};
use geo::Coord;
use runstat::services::map_render::{route_layers_svg, RouteStyle};
use runstat::services::polyline as route_polyline;
use runstat::services::projection::{self, Viewport};
use std::hint::black_box;

/// A wandering loop of `points` fixes around Rancho San Antonio.
fn synthetic_route(points: usize) -> String {
    let coords = (0..points).map(|i| {
        let t = i as f64 / points as f64 * std::f64::consts::TAU;
        Coord {
            x: -122.09 + 0.02 * t.cos() + 0.002 * (7.0 * t).sin(),
            y: 37.33 + 0.015 * t.sin() + 0.002 * (5.0 * t).cos(),
        }
    });
    polyline::encode_coordinates(coords, 5).expect("Failed to encode route")
}

fn benchmark_route_pipeline(c: &mut Criterion) {
    let encoded = synthetic_route(2_000);
    let coords = route_polyline::decode(&encoded);
    let viewport = Viewport::new(1080.0, 1350.0, 40.0);
    let path = projection::project(&coords, viewport);
    let style = RouteStyle::default();

    let mut group = c.benchmark_group("route_pipeline");

    group.bench_function("decode_2000_points", |b| {
        b.iter(|| route_polyline::decode(black_box(&encoded)))
    });

    group.bench_function("project_2000_points", |b| {
        b.iter(|| projection::project(black_box(&coords), viewport))
    });

    group.bench_function("thumbnail_svg_path", |b| {
        b.iter(|| projection::project(black_box(&coords), Viewport::thumbnail()).to_svg_path())
    });

    group.bench_function("route_layers_svg", |b| {
        b.iter(|| route_layers_svg(black_box(&path), &style))
    });

    group.finish();
}

criterion_group!(benches, benchmark_route_pipeline);
criterion_main!(benches);
