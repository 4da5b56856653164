use criterion::{criterion_group, criterion_main, Criterion, black_box};

use octproj::accumulate::{reconstruct, ReconstructConfig};
use octproj::core::types::UVec3;
use octproj::octree::{Level, RecordedOctree};
use octproj::projection::{project, DenseBuffer, Dims, MergePolicy, PlacementRegion};

/// Grid of `n^3` blocks, alternating between whole-block leaves and voxel-level splits
fn checker_octree(n: u32) -> RecordedOctree {
    let mut oct = RecordedOctree::new(n, n, n, 1);
    for block in 0..n * n * n {
        if block % 2 == 0 {
            oct.uniform_block(block, &[1.0]).unwrap();
        } else {
            oct.split_block(block, Level::FINEST, |p| vec![(p[0] + p[1] + p[2]) as f32]).unwrap();
        }
    }
    oct
}

fn bench_project_levels(c: &mut Criterion) {
    let mut buf = DenseBuffer::zeros(Dims::cube(64));

    for level in Level::ALL {
        let region = PlacementRegion::new(UVec3::new(8, 16, 24), level);
        c.bench_function(&format!("project_level_{}", level.get()), |b| {
            b.iter(|| project(&mut buf, black_box(&region), black_box(&[2.0]), &MergePolicy::TakeMax))
        });
    }
}

fn bench_reconstruct_overwrite_8(c: &mut Criterion) {
    octproj::core::logging::try_init();
    let oct = checker_octree(8);
    let config = ReconstructConfig::default();

    c.bench_function("reconstruct_overwrite_8", |b| {
        b.iter(|| reconstruct(black_box(&oct), &config))
    });
}

fn bench_reconstruct_level_map_8(c: &mut Criterion) {
    let oct = checker_octree(8);
    let config = ReconstructConfig::level_map().with_leafs_only(false);

    c.bench_function("reconstruct_level_map_8", |b| {
        b.iter(|| reconstruct(black_box(&oct), &config))
    });
}

criterion_group!(
    benches,
    bench_project_levels,
    bench_reconstruct_overwrite_8,
    bench_reconstruct_level_map_8,
);
criterion_main!(benches);
