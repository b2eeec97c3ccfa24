use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::geometry::Coord;
use viewshed::{ElevationGrid, GridGeometry, Interpolation, Viewpoint, VisibilityGrid};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Rolling ridges around Mount Washington, 30 m cells, 10 km radius.
fn ridges() -> ElevationGrid {
    let center = Coord {
        x: -71.30325,
        y: 44.27058,
    };
    let geometry = GridGeometry::around(center, 10_000.0, 30.0).unwrap();
    ElevationGrid::from_fn(geometry, |row, col| {
        let (y, x) = (row as f64 / 40.0, col as f64 / 55.0);
        1200.0 + 300.0 * x.sin() * y.cos() + 80.0 * (3.1 * x + 1.7 * y).sin()
    })
    .unwrap()
}

fn viewshed(c: &mut Criterion) {
    let mut group = c.benchmark_group("Viewshed");
    group.sample_size(20);

    let grid = ridges();
    let (rows, cols) = grid.dimensions();
    let center = grid.cell_to_latlon(rows / 2, cols / 2);

    for fov in [90.0, 360.0] {
        let viewpoint = Viewpoint::resolve(&grid, center, 1.8, 45.0, fov).unwrap();
        for interpolation in [Interpolation::Nearest, Interpolation::Bilinear] {
            let builder = VisibilityGrid::builder()
                .interpolation(interpolation)
                .earth_curve(true);
            group.bench_with_input(
                BenchmarkId::new(format!("{interpolation:?}"), fov),
                &(&grid, viewpoint),
                |b, (g, v)| b.iter(|| builder.build(g, v).unwrap()),
            );
        }
    }
}

criterion_group!(benches, viewshed);
criterion_main!(benches);
