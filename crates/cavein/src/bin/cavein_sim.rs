//! # Cave-in Demo
//!
//! Digs a tunnel under a stone hill with the bundled rules and runs the
//! world until every cascade has settled.
//!
//! Run with: cargo run --bin cavein_sim -- [seed] [rules.toml]

use std::process::ExitCode;
use std::time::Instant;

use cavein::collapse::CollapseRules;
use cavein::grid::{Block, SpatialGrid};
use cavein::shared::{BlockBox, BlockPos, AREA_LOADED_RADIUS, TICK_RATE};
use cavein::{CaveEvent, CollapseWorld, CollapseWorldConfig, EventBus};

/// Bundled rule file, used when no path is given.
const DEFAULT_RULES: &str = include_str!("../../../../data/collapse.toml");

const STONE: Block = Block::new(1);
const DIRT: Block = Block::new(3);
const TIMBER: Block = Block::new(20);

/// Tunnel length in blocks.
const TUNNEL_LENGTH: i32 = 48;

/// Upper bound on ticks to wait for cascades (one minute of game time).
const MAX_TICKS: u64 = 60 * TICK_RATE as u64;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let rules = match args.next() {
        Some(path) => CollapseRules::from_file(&path),
        None => CollapseRules::from_toml_str(DEFAULT_RULES),
    };
    let rules = match rules {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("failed to load rules: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("=== CAVEIN SIMULATION ===");
    println!("Seed: {seed}");
    println!(
        "Trigger chance: {:.2}, propagate chance: {:.2}, radius: {}+rand({})",
        rules.config.collapse_trigger_chance,
        rules.config.collapse_propagate_chance,
        rules.config.collapse_min_radius,
        rules.config.collapse_radius_variance
    );

    let bus = EventBus::new(1 << 16);
    let receiver = bus.receiver();
    let config = CollapseWorldConfig {
        seed,
        ..CollapseWorldConfig::default()
    };
    let mut world = match CollapseWorld::new(rules, config, bus.sender()) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    build_hill(&mut world);

    // =========================================================================
    // DIG
    // =========================================================================
    let start = Instant::now();
    let mut triggered = 0;
    for x in 0..TUNNEL_LENGTH {
        for y in 0..2 {
            if world.mine_block(BlockPos::new(x, y, 0)).is_some() {
                triggered += 1;
            }
        }
        // Timber every eighth block holds the roof above it.
        if x % 8 == 4 {
            world.grid_mut().set_block_state(BlockPos::new(x, 0, 1), TIMBER);
        }
        world.tick();
    }

    // =========================================================================
    // SETTLE
    // =========================================================================
    let mut ticks = 0;
    while !world.queue().is_empty() && ticks < MAX_TICKS {
        world.tick();
        ticks += 1;
    }
    let elapsed = start.elapsed();

    let events = receiver.drain();
    let falling = events
        .iter()
        .filter(|e| matches!(e, CaveEvent::FallingBlock { .. }))
        .count();
    let sounds = events
        .iter()
        .filter(|e| matches!(e, CaveEvent::Sound { .. }))
        .count();

    let stats = world.stats();
    println!();
    println!("Disturbances:       {}", stats.disturbances);
    println!("Collapses started:  {} ({triggered} while digging)", stats.collapses_started);
    println!("Blocks fallen:      {}", stats.blocks_fallen);
    println!("Cascades settled:   {}", stats.cascades_settled);
    println!("Still pending:      {}", world.queue().len());
    println!("Falling entities:   {falling}");
    println!("Sounds:             {sounds}");
    println!("Ticks after dig:    {ticks}");
    println!("Time:               {elapsed:?}");

    ExitCode::SUCCESS
}

/// Stone hill with a dirt cap over the tunnel line.
fn build_hill(world: &mut CollapseWorld) {
    let grid = world.grid_mut();
    let center = BlockPos::new(TUNNEL_LENGTH / 2, 0, 0);
    grid.ensure_loaded_around(center, TUNNEL_LENGTH / 2 + AREA_LOADED_RADIUS);
    grid.fill(
        BlockBox::new(BlockPos::new(-8, -6, -12), BlockPos::new(TUNNEL_LENGTH + 8, 10, 12)),
        STONE,
    );
    grid.fill(
        BlockBox::new(BlockPos::new(-8, 11, -12), BlockPos::new(TUNNEL_LENGTH + 8, 13, 12)),
        DIRT,
    );
}
