//! # Collapse World Integration Tests
//!
//! Whole-world runs: determinism, save/restore of running cascades, and
//! the bundled rule file.

use std::sync::atomic::{AtomicU64, Ordering};

use cavein::collapse::CollapseRules;
use cavein::grid::{Block, SpatialGrid};
use cavein::shared::{BlockBox, BlockPos, AREA_LOADED_RADIUS};
use cavein::{CaveEvent, CollapseWorld, CollapseWorldConfig, EventBus, EventReceiver};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_path(name: &str) -> std::path::PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("cavein_world_{name}_{}_{id}.cvq", std::process::id()))
}

const RULES: &str = r#"
    [config]
    collapse_trigger_chance = 1.0
    collapse_propagate_chance = 0.6
    collapse_min_radius = 4
    collapse_radius_variance = 6
    propagation_delay_ticks = 3

    [tags]
    can_start_collapse = [1]
    can_collapse = [1]

    [[recipes]]
    name = "stone"
    ingredient = [1]
    transform = { output = { id = 4 } }
"#;

fn world_with_seed(seed: u64) -> (CollapseWorld, EventReceiver) {
    let bus = EventBus::new(1 << 14);
    let rules = CollapseRules::from_toml_str(RULES).unwrap();
    let config = CollapseWorldConfig {
        seed,
        ..CollapseWorldConfig::default()
    };
    let mut world = CollapseWorld::new(rules, config, bus.sender()).unwrap();
    let grid = world.grid_mut();
    grid.ensure_loaded_around(BlockPos::ORIGIN, AREA_LOADED_RADIUS);
    grid.fill(BlockBox::new(BlockPos::new(-12, 0, -12), BlockPos::new(12, 10, 12)), Block::new(1));
    (world, bus.receiver())
}

fn settle(world: &mut CollapseWorld) {
    for _ in 0..200 {
        if world.queue().is_empty() {
            return;
        }
        world.tick();
    }
    panic!("cascade still running after 200 ticks");
}

fn solid_snapshot(world: &CollapseWorld) -> Vec<(BlockPos, Block)> {
    let mut blocks: Vec<_> = world.grid().solid_blocks().collect();
    blocks.sort_unstable_by_key(|(pos, _)| *pos);
    blocks
}

#[test]
fn test_same_seed_replays_identically() {
    let run = |seed| {
        let (mut world, receiver) = world_with_seed(seed);
        world.on_block_disturbed(BlockPos::new(0, -1, 0));
        settle(&mut world);
        (solid_snapshot(&world), receiver.drain(), world.stats())
    };

    let (grid_a, events_a, stats_a) = run(1234);
    let (grid_b, events_b, stats_b) = run(1234);
    assert_eq!(grid_a, grid_b);
    assert_eq!(events_a, events_b);
    assert_eq!(stats_a, stats_b);
    assert!(events_a.iter().any(|e| matches!(e, CaveEvent::CollapseStarted { .. })));
}

#[test]
fn test_restored_queue_continues_cascade() {
    let (mut world, _events) = world_with_seed(99);
    let outcome = world.on_block_disturbed(BlockPos::new(0, -1, 0)).unwrap();
    assert!(!outcome.is_settled());

    let path = temp_path("restore");
    world.save_queue(&path).unwrap();
    let saved_len = world.queue().len();

    // A second world with the same terrain picks the cascade up from disk.
    let (mut reloaded, _reloaded_events) = world_with_seed(99);
    for pos in &outcome.collapsed {
        reloaded.grid_mut().set_block_state(*pos, Block::new(4));
    }
    assert_eq!(reloaded.restore_queue(&path).unwrap(), saved_len);
    let _ = std::fs::remove_file(&path);

    assert_eq!(reloaded.queue(), world.queue());
    settle(&mut reloaded);
    assert!(reloaded.stats().blocks_fallen > 0);
    assert_eq!(reloaded.stats().cascades_settled, 1);
}

#[test]
fn test_failed_restore_keeps_queue() {
    let (mut world, _events) = world_with_seed(5);
    world.on_block_disturbed(BlockPos::new(0, -1, 0)).unwrap();
    let before = world.queue().clone();

    let path = temp_path("garbage");
    std::fs::write(&path, b"not a snapshot").unwrap();
    assert!(world.restore_queue(&path).is_err());
    let _ = std::fs::remove_file(&path);

    assert_eq!(world.queue(), &before);
}

#[test]
fn test_bundled_rules_build_a_world() {
    let rules = CollapseRules::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/collapse.toml")).unwrap();
    let bus = EventBus::new(16);
    let world = CollapseWorld::new(rules, CollapseWorldConfig::default(), bus.sender()).unwrap();
    assert!((world.config().snapshot().collapse_propagate_chance - 0.55).abs() < f32::EPSILON);
}
