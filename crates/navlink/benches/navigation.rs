use criterion::{black_box, criterion_group, criterion_main, Criterion};
use navlink::{NavCorridor, NavMeshSource, NavQuery, Navigation, Navigator, Transform, Vec3};

/// `width * height` unit squares in the XZ plane, one mesh per row so rows link across meshes.
fn grid_navigation(width: usize, height: usize, cell: f32) -> Navigation {
    let mut nav = Navigation::new();
    for z in 0..height {
        let mut row = NavMeshSource::default();
        for x in 0..width {
            let x0 = x as f32 * cell;
            let z0 = z as f32 * cell;
            let x1 = (x + 1) as f32 * cell;
            let z1 = (z + 1) as f32 * cell;
            row.push_polygon(&[
                Vec3::new(x0, 0.0, z0),
                Vec3::new(x1, 0.0, z0),
                Vec3::new(x1, 0.0, z1),
                Vec3::new(x0, 0.0, z1),
            ]);
        }
        nav.add_mesh(row, Transform::IDENTITY, ());
    }
    nav
}

fn bench_navigation(c: &mut Criterion) {
    let nav = grid_navigation(64, 64, 1.0);
    let start = Vec3::new(0.1, 0.0, 0.1);
    let goal = Vec3::new(63.9, 0.0, 63.9);

    let mut group = c.benchmark_group("navlink/navigation");

    group.bench_function("simple_path_alloc", |b| {
        b.iter(|| {
            let path = nav.simple_path(start, goal, true).expect("path");
            black_box(path.len());
        })
    });

    let mut query = NavQuery::new();
    let mut out = Vec::new();
    group.bench_function("simple_path_into_reuse", |b| {
        b.iter(|| {
            nav.simple_path_into(start, goal, true, &mut query, &mut out)
                .expect("path");
            black_box(out.len());
        })
    });

    group.bench_function("corridor_alloc", |b| {
        b.iter(|| {
            let corridor = nav.corridor(start, goal).expect("corridor");
            black_box(corridor.regions.len());
        })
    });

    let mut out_corridor = NavCorridor::default();
    group.bench_function("corridor_into_reuse", |b| {
        b.iter(|| {
            nav.find_corridor_into(start, goal, &mut query, &mut out_corridor)
                .expect("corridor");
            black_box(out_corridor.regions.len());
        })
    });

    group.bench_function("closest_point", |b| {
        b.iter(|| black_box(nav.closest_point(black_box(Vec3::new(31.3, 2.0, 17.8)))))
    });

    group.bench_function("relink_row", |b| {
        let mut nav = grid_navigation(64, 8, 1.0);
        let id = nav.mesh_ids().nth(3).expect("row");
        let moved = Transform::from_translation(Vec3::new(0.0, 0.0, 100.0));
        b.iter(|| {
            nav.set_mesh_transform(id, moved).expect("move");
            nav.set_mesh_transform(id, Transform::IDENTITY).expect("move back");
        })
    });

    group.finish();
}

criterion_group!(benches, bench_navigation);
criterion_main!(benches);
