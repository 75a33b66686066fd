//! Wave spawning.
//!
//! A wave is turned into a flat queue of `(entity_type, target player)`
//! entries, scaled for difficulty and player count and capped per player.
//! A [`SpawnJob`] then drains that queue a few entries at a time. The
//! director calls [`SpawnJob::step`] once per tick for every job in flight,
//! so a fifty-unit wave costs a handful of spawns per tick instead of
//! stalling one tick with all fifty.
//!
//! # Job lifecycle
//!
//! ```text
//!            budget full (checked every Nth yield)
//! Draining ─────────────────────────────────────▶ AwaitingBudget
//!    ▲                                                  │
//!    └──────────── headroom again, roster refreshed ────┘
//!    │
//!    └── queue exhausted ──▶ Finished
//! ```

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::boss::BossPhaseController;
use crate::budget::BudgetTracker;
use crate::components::{EntityId, PlayerId, PlayerState};
use crate::config::SiegeConfig;
use crate::host::{PlayerRoster, SiegeWorld};
use crate::math::{percent, round_to_u32, Fixed, Vec2Fixed};
use crate::waves::SpawnRequest;

/// Enemy-count scale for the number of players sharing a siege.
///
/// Each extra player still adds enemies, just fewer per head.
#[must_use]
pub fn multiplayer_scale(player_count: usize) -> Fixed {
    match player_count {
        0 | 1 => Fixed::ONE,
        2 => percent(75),
        _ => percent(60),
    }
}

/// Units of one spawn request aimed at one player, after scaling.
///
/// Never less than one.
#[must_use]
pub fn scaled_count(base_count: u32, enemy_multiplier: Fixed, player_count: usize) -> u32 {
    let scaled = Fixed::saturating_from_num(base_count)
        .saturating_mul(enemy_multiplier)
        .saturating_mul(multiplayer_scale(player_count));
    round_to_u32(scaled).max(1)
}

/// One unit waiting to be spawned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnQueueEntry {
    /// Host entity type.
    pub entity_type: String,
    /// Player the unit spawns next to.
    pub target: PlayerId,
}

/// Flatten spawn requests into a per-player queue.
///
/// The queue is player-major: every entry for the first player, then the
/// second, and so on, each in request order. Once a player has
/// `max_per_player` entries the rest of their requests are dropped.
#[must_use]
pub fn build_spawn_queue(
    spawns: &[SpawnRequest],
    players: &[PlayerState],
    enemy_multiplier: Fixed,
    max_per_player: u32,
) -> Vec<SpawnQueueEntry> {
    let player_count = players.len();
    let mut queue = Vec::new();

    for player in players {
        let mut budget = max_per_player;
        for request in spawns {
            if budget == 0 {
                break;
            }
            let count = scaled_count(request.base_count, enemy_multiplier, player_count).min(budget);
            budget -= count;
            queue.extend((0..count).map(|_| SpawnQueueEntry {
                entity_type: request.entity_type.clone(),
                target: player.id,
            }));
        }
    }

    #[cfg(feature = "debug-validation")]
    for player in players {
        let queued = queue.iter().filter(|e| e.target == player.id).count();
        debug_assert!(queued <= max_per_player as usize, "per-player cap exceeded");
    }

    queue
}

/// Which wave a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveLabel {
    /// A scripted wave, numbered from 1.
    Scripted(u32),
    /// An endless wave-set, by catalog index.
    Endless(usize),
}

/// Where a job is in its drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Spawning entries each step.
    Draining,
    /// Parked until the live count drops below the ceiling.
    AwaitingBudget,
    /// Queue exhausted.
    Finished,
}

/// Result of one [`SpawnJob::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Made progress and gave control back.
    Yielded,
    /// Parked on the budget ceiling; nothing spawned.
    Waiting,
    /// Queue exhausted. Further steps do nothing.
    Finished,
}

/// What happened during one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Job state after the step.
    pub outcome: StepOutcome,
    /// Units that spawned this step.
    pub spawned: Vec<EntityId>,
    /// Boss unit spawned this step, if any.
    pub boss: Option<EntityId>,
}

impl StepReport {
    fn new(outcome: StepOutcome) -> Self {
        Self {
            outcome,
            spawned: Vec::new(),
            boss: None,
        }
    }
}

/// Running totals for a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    /// Units successfully spawned.
    pub spawned: u32,
    /// Entries dropped because their player was gone.
    pub skipped: u32,
    /// Spawn attempts the host rejected.
    pub failed: u32,
    /// Units that spawned but could not be tagged.
    pub untagged: u32,
}

/// Borrowed engine state a job needs while stepping.
pub struct SpawnContext<'a> {
    /// Host world.
    pub world: &'a mut dyn SiegeWorld,
    /// Connected players.
    pub roster: &'a dyn PlayerRoster,
    /// Live-unit budget.
    pub budget: &'a mut BudgetTracker,
    /// Boss tracking; captures the boss when it spawns.
    pub boss: &'a mut BossPhaseController,
    /// Tunables.
    pub config: &'a SiegeConfig,
}

/// A resumable wave drain: `{queue, cursor, state}` plus the player map and
/// offset RNG.
#[derive(Debug, Clone)]
pub struct SpawnJob {
    label: WaveLabel,
    queue: Vec<SpawnQueueEntry>,
    cursor: usize,
    state: JobState,
    yields: u32,
    players: HashMap<PlayerId, Vec2Fixed>,
    rng: ChaCha8Rng,
    stats: JobStats,
}

impl SpawnJob {
    /// Create a job over `queue`, snapshotting the roster's valid players.
    #[must_use]
    pub fn new(
        label: WaveLabel,
        queue: Vec<SpawnQueueEntry>,
        roster: &dyn PlayerRoster,
        seed: u64,
    ) -> Self {
        let state = if queue.is_empty() {
            JobState::Finished
        } else {
            JobState::Draining
        };
        let mut job = Self {
            label,
            queue,
            cursor: 0,
            state,
            yields: 0,
            players: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            stats: JobStats::default(),
        };
        job.refresh_players(roster);
        job
    }

    /// Wave this job is draining.
    #[must_use]
    pub const fn label(&self) -> WaveLabel {
        self.label
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> JobState {
        self.state
    }

    /// Whether the queue is exhausted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == JobState::Finished
    }

    /// Entries not yet processed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len() - self.cursor
    }

    /// Total entries in the queue.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> JobStats {
        self.stats
    }

    /// Advance the drain by one batch.
    pub fn step(&mut self, ctx: &mut SpawnContext<'_>) -> StepReport {
        match self.state {
            JobState::Finished => return StepReport::new(StepOutcome::Finished),
            JobState::AwaitingBudget => {
                if !ctx.budget.has_headroom() {
                    return StepReport::new(StepOutcome::Waiting);
                }
                self.refresh_players(ctx.roster);
                self.state = JobState::Draining;
            }
            JobState::Draining => {}
        }

        let mut report = StepReport::new(StepOutcome::Yielded);
        let mut attempts = 0;
        while attempts < ctx.config.batch_size.max(1) && self.cursor < self.queue.len() {
            let index = self.cursor;
            self.cursor += 1;

            let Some(&anchor) = self.players.get(&self.queue[index].target) else {
                self.stats.skipped += 1;
                continue;
            };
            attempts += 1;

            let position = anchor
                + spawn_offset(
                    &mut self.rng,
                    ctx.config.spawn_radius_min,
                    ctx.config.spawn_radius_max,
                );
            let entity_type = self.queue[index].entity_type.as_str();
            match ctx.world.spawn_unit(entity_type, position) {
                Ok(unit) => {
                    self.stats.spawned += 1;
                    // Deaths and recounts only see tagged units, so only
                    // those count against the budget.
                    match ctx.world.add_tag(unit, &ctx.config.mob_tag) {
                        Ok(()) => ctx.budget.increment(),
                        Err(e) => {
                            self.stats.untagged += 1;
                            tracing::trace!(unit, "Siege tag not applied, unit not counted: {e}");
                        }
                    }
                    if entity_type == ctx.config.boss_entity_type {
                        if let Err(e) = ctx.world.add_tag(unit, &ctx.config.boss_tag) {
                            tracing::trace!(unit, "Boss tag not applied: {e}");
                        }
                        ctx.boss.track(unit);
                        report.boss = Some(unit);
                    }
                    report.spawned.push(unit);
                }
                Err(e) => {
                    self.stats.failed += 1;
                    tracing::trace!("Spawn dropped: {e}");
                }
            }
        }

        if self.cursor >= self.queue.len() {
            self.state = JobState::Finished;
            report.outcome = StepOutcome::Finished;
            tracing::debug!(
                label = ?self.label,
                spawned = self.stats.spawned,
                skipped = self.stats.skipped,
                failed = self.stats.failed,
                untagged = self.stats.untagged,
                "Spawn job finished"
            );
            return report;
        }

        self.yields += 1;
        if self.yields % ctx.config.roster_refresh_yields.max(1) == 0 {
            self.refresh_players(ctx.roster);
        }
        if self.yields % ctx.config.budget_check_yields.max(1) == 0 && !ctx.budget.has_headroom() {
            tracing::debug!(label = ?self.label, live = ctx.budget.live(), "Spawn job waiting on budget");
            self.state = JobState::AwaitingBudget;
        }
        report
    }

    /// Run the job to completion, ignoring per-tick pacing.
    ///
    /// Stops early if the job parks on a full budget, since nothing inside a
    /// single call can free room. Returns the number of units spawned.
    pub fn drain_now(&mut self, ctx: &mut SpawnContext<'_>) -> usize {
        let mut spawned = 0;
        loop {
            let report = self.step(ctx);
            spawned += report.spawned.len();
            match report.outcome {
                StepOutcome::Yielded => {}
                StepOutcome::Waiting | StepOutcome::Finished => return spawned,
            }
        }
    }

    fn refresh_players(&mut self, roster: &dyn PlayerRoster) {
        self.players = roster
            .valid_players()
            .into_iter()
            .map(|p| (p.id, p.position))
            .collect();
    }
}

/// Random offset in a square ring around the origin.
///
/// One axis is pushed out to at least `min`; the other ranges over
/// `[-max, max]`. Negative or inverted radii are clamped into a valid ring.
fn spawn_offset(rng: &mut ChaCha8Rng, min: i32, max: i32) -> Vec2Fixed {
    let min = min.max(0);
    let max = max.max(min);
    let mut along = rng.gen_range(min..=max);
    if rng.gen::<bool>() {
        along = -along;
    }
    let across = rng.gen_range(-max..=max);
    if rng.gen::<bool>() {
        Vec2Fixed::from_ints(along, across)
    } else {
        Vec2Fixed::from_ints(across, along)
    }
}
