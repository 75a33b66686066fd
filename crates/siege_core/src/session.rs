//! Siege session state.
//!
//! A [`SiegeSession`] is plain data owned by one
//! [`crate::director::SiegeDirector`]. It holds the counters and handles the
//! lifecycle state machine reads and writes each tick; the transitions
//! themselves live in the director.

use serde::{Deserialize, Serialize};

use crate::boss::{BossPhase, BossPhaseController};
use crate::budget::BudgetTracker;
use crate::components::EntityId;
use crate::error::{Result, SiegeError};

/// Which flavor of siege is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SiegeMode {
    /// The scripted wave catalog.
    #[default]
    Normal,
    /// A single escalating wave-set chosen by day.
    Endless,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiegeResult {
    /// Every wave launched and every siege unit died.
    Victory,
    /// Every tracked player was down at once.
    Defeat,
}

/// Summary of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiegeOutcome {
    /// Mode the session ran in.
    pub mode: SiegeMode,
    /// Victory or defeat.
    pub result: SiegeResult,
    /// Director tick on which the session ended.
    pub tick: u64,
    /// Ticks the session lasted.
    pub duration_ticks: u64,
    /// Waves (or wave-sets) launched.
    pub waves_launched: usize,
    /// Live count when the session ended.
    pub live_mobs: u32,
}

/// Mutable state of the current (or last) siege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiegeSession {
    /// Whether a siege is running.
    pub active: bool,
    /// Mode of the running (or last) siege.
    pub mode: SiegeMode,
    /// Next wave to launch. Equals `wave_total` once every wave has launched.
    pub current_wave_index: usize,
    /// Waves this session will launch in total.
    pub wave_total: usize,
    /// Ticks since the last wave launched.
    pub ticks_since_wave_timer: u32,
    /// Ticks since the last victory check.
    pub ticks_since_victory_check: u32,
    /// Ticks since the last authoritative recount.
    pub ticks_since_recount: u32,
    /// Spawn jobs launched but not yet finished.
    pub in_flight_spawn_jobs: u32,
    /// Live siege-unit count.
    pub budget: BudgetTracker,
    /// Boss handle and phase.
    pub boss: BossPhaseController,
    /// Director tick the session started on.
    pub started_at: u64,
    /// Endless wave-set index, for endless sessions.
    pub endless_set: Option<usize>,
}

impl SiegeSession {
    /// An idle session with the given budget ceiling.
    #[must_use]
    pub const fn idle(ceiling: u32) -> Self {
        Self {
            active: false,
            mode: SiegeMode::Normal,
            current_wave_index: 0,
            wave_total: 0,
            ticks_since_wave_timer: 0,
            ticks_since_victory_check: 0,
            ticks_since_recount: 0,
            in_flight_spawn_jobs: 0,
            budget: BudgetTracker::new(ceiling),
            boss: BossPhaseController::new(),
            started_at: 0,
            endless_set: None,
        }
    }

    /// Reset every session counter for a fresh start.
    ///
    /// The recount timer is left alone; it runs independently of sessions.
    pub fn begin(&mut self, mode: SiegeMode, wave_total: usize, tick: u64) {
        self.active = true;
        self.mode = mode;
        self.current_wave_index = 0;
        self.wave_total = wave_total;
        self.ticks_since_wave_timer = 0;
        self.ticks_since_victory_check = 0;
        self.in_flight_spawn_jobs = 0;
        self.budget.reset();
        self.boss.reset();
        self.started_at = tick;
        self.endless_set = None;
    }

    /// Live siege-unit count.
    #[must_use]
    pub const fn live_mob_count(&self) -> u32 {
        self.budget.live()
    }

    /// Tracked boss, if any.
    #[must_use]
    pub const fn boss_ref(&self) -> Option<EntityId> {
        self.boss.boss()
    }

    /// Current boss phase.
    #[must_use]
    pub const fn boss_phase(&self) -> BossPhase {
        self.boss.phase()
    }

    /// Whether every wave of this session has launched.
    #[must_use]
    pub const fn all_waves_launched(&self) -> bool {
        self.current_wave_index >= self.wave_total
    }

    /// Whether the victory condition holds right now.
    ///
    /// Never true while a spawn job is in flight.
    #[must_use]
    pub const fn victory_ready(&self) -> bool {
        self.active
            && self.all_waves_launched()
            && self.in_flight_spawn_jobs == 0
            && self.budget.live() == 0
    }

    /// Encode the session for a save snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SiegeError::Serialization(format!("Failed to serialize session: {e}")))
    }

    /// Decode a session snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| SiegeError::Serialization(format!("Failed to deserialize session: {e}")))
    }
}

/// Read-only view for journal and HUD collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiegeStatus {
    /// Whether a siege is running.
    pub active: bool,
    /// Mode of the running (or last) siege.
    pub mode: SiegeMode,
    /// Waves launched so far.
    pub waves_launched: usize,
    /// Waves in this session.
    pub wave_total: usize,
    /// Live siege units.
    pub live_mobs: u32,
    /// Budget ceiling.
    pub ceiling: u32,
    /// Spawn jobs still draining.
    pub in_flight_jobs: u32,
    /// Boss phase (0, 1 or 2).
    pub boss_phase: u8,
    /// Whether a boss is currently tracked.
    pub boss_present: bool,
    /// Whether endless sieges have been unlocked.
    pub endless_unlocked: bool,
}
