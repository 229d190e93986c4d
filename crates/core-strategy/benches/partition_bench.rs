//! Strategy comparison on a small frame: how much wall time each
//! partitioning protocol spends end to end at a fixed rank count.

use core_scene::{PartitionMode, SceneConfig};
use core_strategy::render_local;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_scene(mode: PartitionMode) -> SceneConfig {
    let mut scene = SceneConfig::default();
    scene.width = 96;
    scene.height = 96;
    scene.mode = mode;
    scene.shader.kind = "spheres".into();
    scene.cycle_size = 8;
    scene.block_width = 16;
    scene.block_height = 16;
    scene
}

fn strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategies_96px_p4");
    for mode in [
        PartitionMode::None,
        PartitionMode::StaticStripsVertical,
        PartitionMode::StaticBlocks,
        PartitionMode::StaticCyclesHorizontal,
        PartitionMode::Dynamic,
    ] {
        let procs = if mode == PartitionMode::None { 1 } else { 4 };
        let scene = bench_scene(mode);
        group.bench_function(mode.name(), |b| {
            b.iter(|| black_box(render_local(&scene, procs).expect("render")));
        });
    }
    group.finish();
}

criterion_group!(benches, strategies);
criterion_main!(benches);
