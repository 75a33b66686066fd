//! Spawn job benchmarks for siege_core.
//!
//! Run with: `cargo bench -p siege_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use siege_core::boss::BossPhaseController;
use siege_core::budget::BudgetTracker;
use siege_core::config::SiegeConfig;
use siege_core::director::SiegeDirector;
use siege_core::host::PlayerRoster;
use siege_core::math::Fixed;
use siege_core::sandbox::{SandboxRoster, SandboxWorld};
use siege_core::spawner::{build_spawn_queue, SpawnContext, SpawnJob, WaveLabel};
use siege_core::waves::SpawnRequest;

fn wave() -> Vec<SpawnRequest> {
    vec![
        SpawnRequest::new("siege_grunt", 10),
        SpawnRequest::new("siege_archer", 8),
        SpawnRequest::new("siege_brute", 4),
    ]
}

/// Drains a full wave for growing player counts.
pub fn drain_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_drain");
    let config = SiegeConfig {
        max_live_mobs: u32::MAX,
        ..SiegeConfig::default()
    };

    for players in [1u32, 4, 8] {
        let roster = SandboxRoster::with_players(players);
        let queue = build_spawn_queue(&wave(), &roster.valid_players(), Fixed::ONE, 24);

        group.bench_with_input(BenchmarkId::from_parameter(players), &queue, |b, queue| {
            b.iter(|| {
                let mut world = SandboxWorld::new();
                let mut budget = BudgetTracker::new(config.max_live_mobs);
                let mut boss = BossPhaseController::new();
                let mut job = SpawnJob::new(WaveLabel::Scripted(1), queue.clone(), &roster, 7);
                let mut ctx = SpawnContext {
                    world: &mut world,
                    roster: &roster,
                    budget: &mut budget,
                    boss: &mut boss,
                    config: &config,
                };
                black_box(job.drain_now(&mut ctx))
            });
        });
    }
    group.finish();
}

/// Ticks a standard siege with steady kills.
pub fn director_benchmark(c: &mut Criterion) {
    c.bench_function("director_600_ticks", |b| {
        b.iter(|| {
            let mut world = SandboxWorld::new();
            let roster = SandboxRoster::with_players(4);
            let mut director = SiegeDirector::standard();
            director.setup_death_listener();
            director.start_siege(&roster);
            for _ in 0..600 {
                director.tick(&mut world, &roster);
                for death in world.kill_tagged("siege_mob", 2) {
                    director.notify_death(&death);
                }
            }
            black_box(director.status())
        });
    });
}

criterion_group!(benches, drain_benchmark, director_benchmark);
criterion_main!(benches);
