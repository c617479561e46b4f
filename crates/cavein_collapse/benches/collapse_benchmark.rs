//! Benchmark for collapse scans and queue snapshots.
//!
//! TARGET: a maximum-radius scan well inside one 50ms tick
//!
//! Run with: cargo bench --package cavein_collapse --bench collapse_benchmark

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use cavein_collapse::persistence;
use cavein_collapse::{
    BlockIngredient, CollapseConfig, CollapseEngine, CollapseRecipe, CollapseTransform, NoEffects,
    PendingPropagation, PropagationQueue, RecipeBook, SupportScanner, MAX_COLLAPSE_RADIUS,
};
use cavein_shared::{BlockBox, BlockPos};
use cavein_world::{Block, BlockTag, TagRegistry, VoxelWorld};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const STONE: Block = Block::new(1);
const RUBBLE: Block = Block::new(4);

fn rules() -> (RecipeBook, TagRegistry, SupportScanner) {
    let recipes = RecipeBook::from_recipes([CollapseRecipe::new(
        "stone",
        BlockIngredient::of([STONE.id]),
        CollapseTransform::new(RUBBLE),
    )
    .expect("valid recipe")])
    .expect("valid book");
    let tags = TagRegistry::new()
        .with(BlockTag::CanStartCollapse, [STONE.id])
        .with(BlockTag::CanCollapse, [STONE.id]);
    (recipes, tags, SupportScanner::new())
}

/// Stone mass over a four-block cavity, wide enough for the largest radius.
fn cavern(radius: i32) -> VoxelWorld {
    let mut world = VoxelWorld::new();
    world.ensure_loaded_around(BlockPos::ORIGIN, radius + 8);
    world.fill(
        BlockBox::new(BlockPos::new(-radius, 0, -radius), BlockPos::new(radius, 4, radius)),
        STONE,
    );
    world
}

fn benchmark_start_collapse(c: &mut Criterion) {
    let (recipes, tags, scanner) = rules();
    let mut group = c.benchmark_group("start_collapse");

    for radius in [8u32, 32, MAX_COLLAPSE_RADIUS] {
        let config = CollapseConfig {
            collapse_propagate_chance: 0.55,
            collapse_min_radius: radius,
            collapse_radius_variance: 0,
            ..CollapseConfig::default()
        };
        let engine = CollapseEngine::new(&recipes, &tags, &scanner, config);
        let side = u64::from(2 * radius + 1);
        group.throughput(Throughput::Elements(side * side));
        group.sample_size(10);

        group.bench_function(format!("radius_{radius}"), |b| {
            b.iter_batched(
                || (cavern(radius as i32), ChaCha8Rng::seed_from_u64(42)),
                |(mut world, mut rng)| {
                    black_box(engine.start_collapse(
                        &mut world,
                        &mut rng,
                        &mut PropagationQueue::new(),
                        &mut NoEffects,
                        BlockPos::ORIGIN,
                        0,
                    ))
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn benchmark_scanner(c: &mut Criterion) {
    let (_, tags, scanner) = rules();
    let world = cavern(8);
    let bounds = BlockBox::new(BlockPos::new(-4, -2, -4), BlockPos::new(4, 2, 4));

    let mut group = c.benchmark_group("scanner");
    group.throughput(Throughput::Elements(bounds.volume()));
    group.bench_function("all_trigger_sites", |b| {
        b.iter(|| {
            black_box(
                scanner
                    .find_unsupported_positions(&world, &tags, bounds.min, bounds.max)
                    .count(),
            )
        });
    });
    group.finish();
}

fn benchmark_snapshot(c: &mut Criterion) {
    let mut queue = PropagationQueue::new();
    for i in 0..1_000i32 {
        let frontier = (0..16).map(|j| BlockPos::new(i, j, -i)).collect();
        queue.enqueue(PendingPropagation::new(BlockPos::new(i, 0, -i), frontier, 400), u64::from(i as u32));
    }
    let bytes = persistence::encode(&queue);

    let mut group = c.benchmark_group("queue_snapshot");
    group.throughput(Throughput::Elements(1_000));
    group.bench_function("encode_1000", |b| b.iter(|| black_box(persistence::encode(&queue))));
    group.bench_function("decode_1000", |b| {
        b.iter(|| black_box(persistence::decode(black_box(&bytes)).expect("valid snapshot")))
    });
    group.finish();
}

criterion_group!(benches, benchmark_start_collapse, benchmark_scanner, benchmark_snapshot);
criterion_main!(benches);
