//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a siege produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Siege runs must be reproducible so batch reports and bug repros can be
//! replayed from a seed. Sources of non-determinism include:
//!
//! - **Floating-point math**: Spawn scaling and positions use
//!   [`siege_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The sandbox hashes and kills entities in sorted ID order.
//!
//! - **System randomness**: Spawn offsets come from a ChaCha RNG seeded from
//!   the config seed and the launch sequence.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Each component is deterministic on its own
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full sieges are reproducible
//! 4. **Parallel tests**: Running N sieges on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use crate::fixtures::SiegeHarness;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic siege).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Siege is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a started siege harness `runs` times, killing `kills_per_tick` units
/// after every tick.
///
/// # Example
///
/// ```
/// use siege_test_utils::determinism::verify_siege_determinism;
/// use siege_test_utils::fixtures::SiegeHarness;
///
/// let result = verify_siege_determinism(
///     3,
///     200,
///     2,
///     || {
///         let mut harness = SiegeHarness::standard(2);
///         harness.start();
///         harness
///     },
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_siege_determinism<F>(
    runs: usize,
    ticks: u64,
    kills_per_tick: usize,
    setup_fn: F,
) -> DeterminismResult
where
    F: Fn() -> SiegeHarness,
{
    verify_determinism(
        runs,
        ticks,
        setup_fn,
        |harness| {
            harness.tick();
            harness.kill_mobs(kills_per_tick);
        },
        SiegeHarness::state_hash,
    )
}

/// Run N sieges on scoped threads and collect final hashes.
///
/// Each thread builds its own harness, so the setup function only needs to
/// be `Sync`.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_sieges<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
    kills_per_tick: usize,
) -> DeterminismResult
where
    F: Fn() -> SiegeHarness + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut harness = setup_fn();
                    for _ in 0..num_ticks {
                        harness.tick();
                        harness.kill_mobs(kills_per_tick);
                    }
                    harness.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two siege runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, kills_per_tick: usize) -> Option<u64>
where
    F: Fn() -> SiegeHarness,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick();
        a.kill_mobs(kills_per_tick);
        b.tick();
        b.kill_mobs(kills_per_tick);

        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a world and session snapshot round-trip preserves state.
pub fn verify_snapshot_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> SiegeHarness,
{
    let mut harness = setup_fn();
    for _ in 0..num_ticks {
        harness.tick();
    }

    let Ok(world_bytes) = harness.world.serialize() else {
        return false;
    };
    let Ok(session_bytes) = harness.director.snapshot() else {
        return false;
    };
    let Ok(world) = siege_core::sandbox::SandboxWorld::deserialize(&world_bytes) else {
        return false;
    };

    let mut restored = setup_fn();
    if restored.director.restore(&session_bytes).is_err() {
        return false;
    }

    // In-flight jobs are not part of a snapshot.
    let mut expected = harness.director.session().clone();
    expected.in_flight_spawn_jobs = 0;

    world.state_hash() == harness.world.state_hash() && *restored.director.session() == expected
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for siege testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based tests.
pub mod strategies {
    use proptest::prelude::*;
    use siege_core::components::Health;
    use siege_core::math::Fixed;
    use siege_core::waves::{SpawnRequest, WaveCatalog, WaveDefinition};

    /// Entity types used by the shipped catalogs.
    pub const ENTITY_TYPES: [&str; 4] = ["siege_grunt", "siege_archer", "siege_brute", "siege_ravager"];

    /// Generate a spawn request with a base count in 1..=12.
    pub fn arb_spawn_request() -> impl Strategy<Value = SpawnRequest> {
        (0..ENTITY_TYPES.len(), 1u32..=12)
            .prop_map(|(kind, count)| SpawnRequest::new(ENTITY_TYPES[kind], count))
    }

    /// Generate a valid wave catalog of up to `max_waves` waves.
    pub fn arb_wave_catalog(max_waves: usize) -> impl Strategy<Value = WaveCatalog> {
        proptest::collection::vec(
            (proptest::collection::vec(arb_spawn_request(), 1..4), 0u32..40),
            1..=max_waves.max(1),
        )
        .prop_map(|waves| {
            let defs = waves
                .into_iter()
                .enumerate()
                .map(|(i, (spawns, delay))| {
                    let number = i as u32 + 1;
                    WaveDefinition::new(number, if i == 0 { 0 } else { delay }, spawns)
                })
                .collect();
            WaveCatalog::new(defs).expect("generated catalog is valid")
        })
    }

    /// Generate an enemy multiplier between 0.25 and 4.0.
    pub fn arb_multiplier() -> impl Strategy<Value = Fixed> {
        (1i32..=16).prop_map(|quarters| Fixed::from_num(quarters) / Fixed::from_num(4))
    }

    /// Generate a health reading, including degenerate maxima.
    pub fn arb_health() -> impl Strategy<Value = Health> {
        (-20i32..200, -5i32..200).prop_map(|(current, max)| Health { current, max })
    }

    /// Generate a per-tick kill count.
    pub fn arb_kills_per_tick() -> impl Strategy<Value = usize> {
        0usize..6
    }
}
