//! Siege lifecycle state machine.
//!
//! The [`SiegeDirector`] owns one [`SiegeSession`], the wave catalogs and
//! every spawn job in flight. The host calls [`SiegeDirector::tick`] once per
//! simulation tick and forwards death events through
//! [`SiegeDirector::notify_death`].
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start_siege()──────────▶ Active(Normal) ──┬─▶ Victory ─┐
//!  ▲                                               └─▶ Defeat  ─┤
//!  │   ──start_endless_siege()──▶ Active(Endless) ─┬─▶ Victory ─┤
//!  │                                               └─▶ Defeat  ─┤
//!  └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Victory and defeat fall straight back to idle within the same tick.
//!
//! # Per-tick order
//!
//! 1. Endless-unlock countdown
//! 2. Budget recount (runs even while idle)
//! 3. Defeat check
//! 4. Wave timer and launch
//! 5. Spawn job steps
//! 6. Boss phase evaluation
//! 7. Victory check (every `victory_check_interval` ticks)
//!
//! # Example
//!
//! ```
//! use siege_core::director::SiegeDirector;
//! use siege_core::sandbox::{SandboxRoster, SandboxWorld};
//!
//! let mut world = SandboxWorld::new();
//! let roster = SandboxRoster::with_players(1);
//! let mut director = SiegeDirector::standard();
//! director.setup_death_listener();
//!
//! assert!(director.start_siege(&roster));
//! let events = director.tick(&mut world, &roster);
//! assert_eq!(events.spawned.len(), 1);
//! assert!(director.is_active());
//! ```

use std::fmt;

use crate::boss::BossPhaseChange;
use crate::components::{DeathEvent, EntityId};
use crate::config::SiegeConfig;
use crate::error::Result;
use crate::escalation::wave_set_index;
use crate::host::{default_enemy_multiplier, EnemyMultiplierFn, PlayerRoster, SiegeWorld};
use crate::math::Fixed;
use crate::session::{SiegeMode, SiegeOutcome, SiegeResult, SiegeSession, SiegeStatus};
use crate::spawner::{
    build_spawn_queue, JobStats, SpawnContext, SpawnJob, StepOutcome, WaveLabel,
};
use crate::waves::{EndlessCatalog, SpawnRequest, WaveCatalog};

/// Something the host may want to react to (messaging, sounds, journal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiegeEvent {
    /// A session started.
    SiegeStarted {
        /// Mode of the new session.
        mode: SiegeMode,
    },
    /// A wave's spawn job was launched.
    WaveLaunched {
        /// Which wave.
        label: WaveLabel,
        /// Entries queued after scaling and capping.
        queued: usize,
    },
    /// A spawn job drained its queue.
    SpawnJobFinished {
        /// Which wave.
        label: WaveLabel,
        /// Final totals.
        stats: JobStats,
    },
    /// The boss unit spawned.
    BossSpawned {
        /// Boss entity.
        boss: EntityId,
    },
    /// The boss crossed a health threshold.
    BossPhaseChanged(BossPhaseChange),
    /// The session was won.
    Victory(SiegeOutcome),
    /// The session was lost.
    Defeat(SiegeOutcome),
    /// Endless sieges became available.
    EndlessUnlocked,
    /// The live count was replaced by an authoritative recount.
    Resynced {
        /// Count after the recount.
        live: u32,
    },
}

/// Everything that happened during one [`SiegeDirector::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Director tick number.
    pub tick: u64,
    /// Lifecycle events, in the order they happened.
    pub events: Vec<SiegeEvent>,
    /// Units spawned this tick.
    pub spawned: Vec<EntityId>,
}

impl TickEvents {
    /// Find the outcome if the session ended this tick.
    #[must_use]
    pub fn outcome(&self) -> Option<SiegeOutcome> {
        self.events.iter().find_map(|event| match event {
            SiegeEvent::Victory(outcome) | SiegeEvent::Defeat(outcome) => Some(*outcome),
            _ => None,
        })
    }
}

type VictoryCallback = Box<dyn FnMut(&SiegeOutcome)>;

/// Owns a siege session and drives it tick by tick.
pub struct SiegeDirector {
    config: SiegeConfig,
    catalog: WaveCatalog,
    endless: EndlessCatalog,
    session: SiegeSession,
    jobs: Vec<SpawnJob>,
    enemy_multiplier: EnemyMultiplierFn,
    victory_callbacks: Vec<VictoryCallback>,
    death_listener: bool,
    tick: u64,
    launches: u64,
    unlock_countdown: Option<u32>,
    endless_unlocked: bool,
    last_outcome: Option<SiegeOutcome>,
    pending: Vec<SiegeEvent>,
}

impl SiegeDirector {
    /// Create a director over the given catalogs.
    #[must_use]
    pub fn new(config: SiegeConfig, catalog: WaveCatalog, endless: EndlessCatalog) -> Self {
        let session = SiegeSession::idle(config.max_live_mobs);
        Self {
            config,
            catalog,
            endless,
            session,
            jobs: Vec::new(),
            enemy_multiplier: default_enemy_multiplier(),
            victory_callbacks: Vec::new(),
            death_listener: false,
            tick: 0,
            launches: 0,
            unlock_countdown: None,
            endless_unlocked: false,
            last_outcome: None,
            pending: Vec::new(),
        }
    }

    /// Director with default config and the shipped catalogs.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            SiegeConfig::default(),
            WaveCatalog::standard(),
            EndlessCatalog::standard(),
        )
    }

    /// Replace the difficulty collaborator.
    pub fn set_enemy_multiplier_getter(&mut self, getter: impl Fn() -> Fixed + 'static) {
        self.enemy_multiplier = Box::new(getter);
    }

    /// Register a callback run on every victory, after the session ends.
    pub fn on_victory(&mut self, callback: impl FnMut(&SiegeOutcome) + 'static) {
        self.victory_callbacks.push(Box::new(callback));
    }

    /// Start accepting death events. Idempotent.
    ///
    /// Returns `true` the first time.
    pub fn setup_death_listener(&mut self) -> bool {
        let first = !self.death_listener;
        self.death_listener = true;
        first
    }

    /// Mark endless mode as already unlocked (restored from the host's store).
    pub fn restore_endless_unlocked(&mut self, unlocked: bool) {
        self.endless_unlocked = unlocked;
    }

    /// Feed one death from the host's death feed.
    ///
    /// Ignored unless the listener is set up and a session is active.
    /// Returns `true` if the death was counted against the budget.
    pub fn notify_death(&mut self, event: &DeathEvent) -> bool {
        if !self.death_listener || !self.session.active {
            return false;
        }
        self.session
            .budget
            .decrement_on_death(event, &self.config.mob_tag)
    }

    /// Start a normal siege and launch its first wave.
    ///
    /// Returns `false` (and changes nothing) if a siege is already running.
    pub fn start_siege(&mut self, roster: &dyn PlayerRoster) -> bool {
        if self.session.active {
            return false;
        }
        self.session
            .begin(SiegeMode::Normal, self.catalog.len(), self.tick);
        tracing::info!(waves = self.catalog.len(), "Siege started");
        self.pending.push(SiegeEvent::SiegeStarted {
            mode: SiegeMode::Normal,
        });
        self.launch_next_wave(roster);
        true
    }

    /// Start an endless siege using the wave-set for `day`.
    ///
    /// Returns `false` (and changes nothing) if a siege is already running.
    pub fn start_endless_siege(&mut self, day: u32, roster: &dyn PlayerRoster) -> bool {
        if self.session.active {
            return false;
        }
        let index = wave_set_index(
            day,
            self.config.endless_base_day,
            self.config.endless_days_per_set,
            self.endless.len(),
        );
        let Some(set) = self.endless.get(index) else {
            return false;
        };
        let spawns = set.spawns.clone();

        self.session.begin(SiegeMode::Endless, 1, self.tick);
        self.session.endless_set = Some(index);
        self.session.current_wave_index = self.session.wave_total;
        tracing::info!(day, set = index, "Endless siege started");
        self.pending.push(SiegeEvent::SiegeStarted {
            mode: SiegeMode::Endless,
        });
        self.launch(WaveLabel::Endless(index), &spawns, roster);
        true
    }

    /// Advance the director by one tick.
    pub fn tick(&mut self, world: &mut dyn SiegeWorld, roster: &dyn PlayerRoster) -> TickEvents {
        self.tick += 1;
        let mut out = TickEvents {
            tick: self.tick,
            events: std::mem::take(&mut self.pending),
            spawned: Vec::new(),
        };

        self.advance_unlock_countdown(&mut out);
        self.advance_recount(world, &mut out);

        if !self.session.active {
            return out;
        }

        if all_players_down(roster) {
            self.finish(SiegeResult::Defeat, &mut out);
            return out;
        }

        self.advance_wave_timer(roster);
        out.events.append(&mut self.pending);
        self.step_jobs(world, roster, &mut out);

        if let Some(change) = self.session.boss.evaluate(world, &self.config) {
            out.events.push(SiegeEvent::BossPhaseChanged(change));
        }

        self.session.ticks_since_victory_check += 1;
        if self.session.ticks_since_victory_check >= self.config.victory_check_interval {
            self.session.ticks_since_victory_check = 0;
            if self.session.victory_ready() {
                self.finish(SiegeResult::Victory, &mut out);
            }
        }

        out
    }

    /// Whether a siege is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session.active
    }

    /// Current session state.
    #[must_use]
    pub const fn session(&self) -> &SiegeSession {
        &self.session
    }

    /// Tunables in use.
    #[must_use]
    pub const fn config(&self) -> &SiegeConfig {
        &self.config
    }

    /// Normal-mode wave catalog.
    #[must_use]
    pub const fn catalog(&self) -> &WaveCatalog {
        &self.catalog
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Whether a normal-mode victory has unlocked endless sieges.
    #[must_use]
    pub const fn endless_unlocked(&self) -> bool {
        self.endless_unlocked
    }

    /// Outcome of the most recent finished session.
    #[must_use]
    pub const fn last_outcome(&self) -> Option<SiegeOutcome> {
        self.last_outcome
    }

    /// Spawn jobs currently held by the director.
    #[must_use]
    pub fn jobs(&self) -> &[SpawnJob] {
        &self.jobs
    }

    /// Snapshot for journal/HUD collaborators.
    #[must_use]
    pub fn status(&self) -> SiegeStatus {
        SiegeStatus {
            active: self.session.active,
            mode: self.session.mode,
            waves_launched: self.session.current_wave_index,
            wave_total: self.session.wave_total,
            live_mobs: self.session.live_mob_count(),
            ceiling: self.session.budget.ceiling(),
            in_flight_jobs: self.session.in_flight_spawn_jobs,
            boss_phase: self.session.boss_phase().index(),
            boss_present: self.session.boss_ref().is_some(),
            endless_unlocked: self.endless_unlocked,
        }
    }

    /// Encode the session for a save.
    ///
    /// In-flight spawn jobs are not part of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        self.session.to_bytes()
    }

    /// Restore a session saved with [`SiegeDirector::snapshot`].
    ///
    /// Jobs that were draining when the snapshot was taken are dropped, so a
    /// restored session picks up at the next wave.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be decoded.
    pub fn restore(&mut self, data: &[u8]) -> Result<()> {
        let mut session = SiegeSession::from_bytes(data)?;
        session.in_flight_spawn_jobs = 0;
        self.jobs.clear();
        self.session = session;
        tracing::debug!(active = self.session.active, "Siege session restored");
        Ok(())
    }

    fn advance_unlock_countdown(&mut self, out: &mut TickEvents) {
        let Some(remaining) = self.unlock_countdown else {
            return;
        };
        if remaining > 1 {
            self.unlock_countdown = Some(remaining - 1);
            return;
        }
        self.unlock_countdown = None;
        self.endless_unlocked = true;
        tracing::info!("Endless sieges unlocked");
        out.events.push(SiegeEvent::EndlessUnlocked);
    }

    fn advance_recount(&mut self, world: &dyn SiegeWorld, out: &mut TickEvents) {
        self.session.ticks_since_recount += 1;
        if self.session.ticks_since_recount < self.config.recount_interval {
            return;
        }
        self.session.ticks_since_recount = 0;
        if let Some(live) = self.session.budget.resync(world, &self.config.mob_tag) {
            out.events.push(SiegeEvent::Resynced { live });
        }
    }

    fn advance_wave_timer(&mut self, roster: &dyn PlayerRoster) {
        if self.session.mode != SiegeMode::Normal || self.session.all_waves_launched() {
            return;
        }
        self.session.ticks_since_wave_timer =
            self.session.ticks_since_wave_timer.saturating_add(1);

        let Some(wave) = self.catalog.get(self.session.current_wave_index) else {
            return;
        };
        if self.session.ticks_since_wave_timer >= wave.delay_ticks
            && self.session.budget.has_headroom()
        {
            self.launch_next_wave(roster);
        }
    }

    fn launch_next_wave(&mut self, roster: &dyn PlayerRoster) {
        let Some(wave) = self.catalog.get(self.session.current_wave_index) else {
            return;
        };
        let label = WaveLabel::Scripted(wave.wave_number);
        let spawns = wave.spawns.clone();
        self.session.current_wave_index += 1;
        self.session.ticks_since_wave_timer = 0;
        self.launch(label, &spawns, roster);
    }

    fn launch(&mut self, label: WaveLabel, spawns: &[SpawnRequest], roster: &dyn PlayerRoster) {
        let players = roster.valid_players();
        let multiplier = (self.enemy_multiplier)();
        let queue = build_spawn_queue(
            spawns,
            &players,
            multiplier,
            self.config.max_spawns_per_player,
        );
        let queued = queue.len();

        self.launches += 1;
        let seed = self.config.seed ^ self.launches.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        self.jobs.push(SpawnJob::new(label, queue, roster, seed));
        self.session.in_flight_spawn_jobs += 1;

        tracing::debug!(?label, queued, players = players.len(), "Wave launched");
        self.pending.push(SiegeEvent::WaveLaunched { label, queued });
    }

    fn step_jobs(
        &mut self,
        world: &mut dyn SiegeWorld,
        roster: &dyn PlayerRoster,
        out: &mut TickEvents,
    ) {
        if self.jobs.is_empty() {
            return;
        }

        let mut ctx = SpawnContext {
            world,
            roster,
            budget: &mut self.session.budget,
            boss: &mut self.session.boss,
            config: &self.config,
        };

        for job in &mut self.jobs {
            let report = job.step(&mut ctx);
            if let Some(boss) = report.boss {
                out.events.push(SiegeEvent::BossSpawned { boss });
            }
            out.spawned.extend(report.spawned);
            if report.outcome == StepOutcome::Finished {
                out.events.push(SiegeEvent::SpawnJobFinished {
                    label: job.label(),
                    stats: job.stats(),
                });
            }
        }

        let before = self.jobs.len();
        self.jobs.retain(|job| !job.is_finished());
        let finished = u32::try_from(before - self.jobs.len()).unwrap_or(u32::MAX);
        self.session.in_flight_spawn_jobs = self.session.in_flight_spawn_jobs.saturating_sub(finished);
    }

    fn finish(&mut self, result: SiegeResult, out: &mut TickEvents) {
        let outcome = SiegeOutcome {
            mode: self.session.mode,
            result,
            tick: self.tick,
            duration_ticks: self.tick.saturating_sub(self.session.started_at),
            waves_launched: self.session.current_wave_index,
            live_mobs: self.session.live_mob_count(),
        };

        if !self.jobs.is_empty() {
            tracing::debug!(cancelled = self.jobs.len(), "Cancelling in-flight spawn jobs");
            self.jobs.clear();
        }
        self.session.in_flight_spawn_jobs = 0;
        self.session.active = false;
        self.session.boss.reset();
        self.last_outcome = Some(outcome);

        match result {
            SiegeResult::Victory => {
                tracing::info!(mode = ?outcome.mode, tick = self.tick, "Siege won");
                out.events.push(SiegeEvent::Victory(outcome));
                if outcome.mode == SiegeMode::Normal
                    && !self.endless_unlocked
                    && self.unlock_countdown.is_none()
                {
                    self.unlock_countdown = Some(self.config.endless_unlock_delay.max(1));
                }
                for callback in &mut self.victory_callbacks {
                    callback(&outcome);
                }
            }
            SiegeResult::Defeat => {
                tracing::info!(mode = ?outcome.mode, tick = self.tick, "Siege lost");
                out.events.push(SiegeEvent::Defeat(outcome));
            }
        }
    }
}

impl Default for SiegeDirector {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for SiegeDirector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiegeDirector")
            .field("tick", &self.tick)
            .field("session", &self.session)
            .field("jobs", &self.jobs.len())
            .field("endless_unlocked", &self.endless_unlocked)
            .field("victory_callbacks", &self.victory_callbacks.len())
            .finish_non_exhaustive()
    }
}

/// Every tracked player is down at once. An empty roster is not a defeat.
fn all_players_down(roster: &dyn PlayerRoster) -> bool {
    let players = roster.valid_players();
    !players.is_empty() && players.iter().all(|p| !p.alive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlayerId;
    use crate::sandbox::{SandboxRoster, SandboxWorld};
    use crate::waves::{EndlessWaveSet, WaveDefinition};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn small_config() -> SiegeConfig {
        SiegeConfig {
            victory_check_interval: 1,
            endless_unlock_delay: 3,
            ..SiegeConfig::default()
        }
    }

    fn two_wave_director() -> SiegeDirector {
        let catalog = WaveCatalog::new(vec![
            WaveDefinition::new(1, 0, vec![SpawnRequest::new("siege_grunt", 2)]),
            WaveDefinition::new(2, 5, vec![SpawnRequest::new("siege_grunt", 1)]),
        ])
        .unwrap();
        let mut director = SiegeDirector::new(small_config(), catalog, EndlessCatalog::standard());
        director.setup_death_listener();
        director
    }

    fn kill_all(director: &mut SiegeDirector, world: &mut SandboxWorld) {
        for death in world.kill_tagged("siege_mob", usize::MAX) {
            director.notify_death(&death);
        }
    }

    #[test]
    fn test_double_start_is_rejected() {
        let roster = SandboxRoster::with_players(1);
        let mut director = SiegeDirector::standard();
        assert!(director.start_siege(&roster));
        let jobs = director.jobs().len();
        assert!(!director.start_siege(&roster));
        assert!(!director.start_endless_siege(200, &roster));
        assert_eq!(director.jobs().len(), jobs);
        assert_eq!(director.session().in_flight_spawn_jobs, 1);
    }

    #[test]
    fn test_first_wave_launches_immediately() {
        let roster = SandboxRoster::with_players(1);
        let mut director = two_wave_director();
        director.start_siege(&roster);
        assert_eq!(director.session().current_wave_index, 1);
        assert_eq!(director.status().waves_launched, 1);
    }

    #[test]
    fn test_victory_after_all_waves_and_kills() {
        let mut world = SandboxWorld::new();
        let roster = SandboxRoster::with_players(1);
        let mut director = two_wave_director();
        let wins = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&wins);
        director.on_victory(move |outcome| sink.borrow_mut().push(*outcome));

        director.start_siege(&roster);
        let mut outcome = None;
        for _ in 0..50 {
            let events = director.tick(&mut world, &roster);
            kill_all(&mut director, &mut world);
            if let Some(o) = events.outcome() {
                outcome = Some(o);
                break;
            }
        }

        let outcome = outcome.unwrap();
        assert_eq!(outcome.result, SiegeResult::Victory);
        assert_eq!(outcome.waves_launched, 2);
        assert!(!director.is_active());
        assert_eq!(director.session().in_flight_spawn_jobs, 0);
        assert_eq!(wins.borrow().len(), 1);
    }

    #[test]
    fn test_no_victory_while_job_in_flight() {
        let mut world = SandboxWorld::new();
        let roster = SandboxRoster::with_players(1);
        let catalog = WaveCatalog::new(vec![WaveDefinition::new(
            1,
            0,
            vec![SpawnRequest::new("siege_grunt", 3)],
        )])
        .unwrap();
        let mut director = SiegeDirector::new(small_config(), catalog, EndlessCatalog::standard());
        director.setup_death_listener();
        director.start_siege(&roster);

        // Each tick spawns one unit which is killed at once, so the live count
        // is zero between ticks while the job still has entries left.
        for _ in 0..2 {
            let events = director.tick(&mut world, &roster);
            kill_all(&mut director, &mut world);
            assert!(events.outcome().is_none());
            assert!(director.is_active());
        }
        let events = director.tick(&mut world, &roster);
        assert!(events.outcome().is_none());
        kill_all(&mut director, &mut world);
        let events = director.tick(&mut world, &roster);
        assert_eq!(events.outcome().map(|o| o.result), Some(SiegeResult::Victory));
    }

    #[test]
    fn test_defeat_when_all_players_down() {
        let mut world = SandboxWorld::new();
        let mut roster = SandboxRoster::with_players(2);
        let mut director = two_wave_director();
        director.start_siege(&roster);
        director.tick(&mut world, &roster);

        roster.set_alive(PlayerId(1), false);
        assert!(director.tick(&mut world, &roster).outcome().is_none());

        roster.set_alive(PlayerId(2), false);
        let events = director.tick(&mut world, &roster);
        assert_eq!(events.outcome().map(|o| o.result), Some(SiegeResult::Defeat));
        assert!(!director.is_active());
        assert!(director.jobs().is_empty());
        assert_eq!(director.session().in_flight_spawn_jobs, 0);
        assert!(!director.endless_unlocked());
    }

    #[test]
    fn test_empty_roster_is_not_defeat() {
        let mut world = SandboxWorld::new();
        let roster = SandboxRoster::new();
        let mut director = two_wave_director();
        director.start_siege(&roster);
        assert!(director.tick(&mut world, &roster).outcome().is_none());
        assert!(director.is_active());
    }

    #[test]
    fn test_deaths_ignored_without_listener() {
        let mut world = SandboxWorld::new();
        let roster = SandboxRoster::with_players(1);
        let mut director = SiegeDirector::new(
            small_config(),
            WaveCatalog::standard(),
            EndlessCatalog::standard(),
        );
        director.start_siege(&roster);
        director.tick(&mut world, &roster);
        let death = world.kill_tagged("siege_mob", 1).remove(0);
        assert!(!director.notify_death(&death));
        assert_eq!(director.session().live_mob_count(), 1);

        assert!(director.setup_death_listener());
        assert!(!director.setup_death_listener());
    }

    #[test]
    fn test_endless_picks_set_by_day() {
        let roster = SandboxRoster::with_players(1);
        let mut director = SiegeDirector::standard();
        assert!(director.start_endless_siege(185, &roster));
        assert_eq!(director.session().endless_set, Some(2));
        assert_eq!(director.session().mode, SiegeMode::Endless);
        assert!(director.session().all_waves_launched());
        assert_eq!(director.jobs()[0].label(), WaveLabel::Endless(2));
    }

    #[test]
    fn test_single_endless_set_covers_every_day() {
        let roster = SandboxRoster::with_players(1);
        let mut director = SiegeDirector::new(
            SiegeConfig::default(),
            WaveCatalog::standard(),
            EndlessCatalog::new(vec![EndlessWaveSet::new(vec![SpawnRequest::new(
                "siege_grunt",
                1,
            )])])
            .unwrap(),
        );
        assert!(director.start_endless_siege(10_000, &roster));
        assert_eq!(director.session().endless_set, Some(0));
    }

    #[test]
    fn test_endless_unlocks_after_delay() {
        let mut world = SandboxWorld::new();
        let roster = SandboxRoster::with_players(1);
        let mut director = two_wave_director();
        director.start_siege(&roster);

        let mut ended = false;
        while !ended {
            ended = director.tick(&mut world, &roster).outcome().is_some();
            kill_all(&mut director, &mut world);
        }
        assert!(!director.endless_unlocked());

        let mut unlocked_at = 0;
        for i in 1..=3 {
            let events = director.tick(&mut world, &roster);
            if events.events.contains(&SiegeEvent::EndlessUnlocked) {
                unlocked_at = i;
            }
        }
        assert_eq!(unlocked_at, 3);
        assert!(director.endless_unlocked());
    }

    #[test]
    fn test_restored_unlock_is_not_rearmed() {
        let mut world = SandboxWorld::new();
        let roster = SandboxRoster::with_players(1);
        let mut director = two_wave_director();
        director.restore_endless_unlocked(true);
        director.start_siege(&roster);

        let mut ended = false;
        while !ended {
            ended = director.tick(&mut world, &roster).outcome().is_some();
            kill_all(&mut director, &mut world);
        }
        assert!(director.unlock_countdown.is_none());
        for _ in 0..5 {
            let events = director.tick(&mut world, &roster);
            assert!(!events.events.contains(&SiegeEvent::EndlessUnlocked));
        }
        assert!(director.endless_unlocked());
        assert!(director.status().endless_unlocked);
    }

    #[test]
    fn test_inverted_spawn_radius_does_not_panic() {
        let mut world = SandboxWorld::new();
        let roster = SandboxRoster::with_players(1);
        let config = SiegeConfig {
            spawn_radius_min: -5,
            spawn_radius_max: -10,
            ..small_config()
        };
        assert!(config.validate().is_err());
        let mut director =
            SiegeDirector::new(config, WaveCatalog::standard(), EndlessCatalog::standard());
        director.start_siege(&roster);

        let mut spawned = 0;
        for _ in 0..10 {
            spawned += director.tick(&mut world, &roster).spawned.len();
        }
        assert!(spawned > 0);
        assert!(director.is_active());
    }

    #[test]
    fn test_recount_corrects_drift() {
        let mut world = SandboxWorld::new();
        let roster = SandboxRoster::with_players(1);
        let config = SiegeConfig {
            recount_interval: 4,
            ..SiegeConfig::default()
        };
        let mut director =
            SiegeDirector::new(config, WaveCatalog::standard(), EndlessCatalog::standard());
        director.setup_death_listener();
        director.start_siege(&roster);

        director.tick(&mut world, &roster);
        director.tick(&mut world, &roster);
        // Vanish without a death event.
        for id in world.tagged_ids("siege_mob") {
            world.despawn(id).unwrap();
        }
        assert_eq!(director.session().live_mob_count(), 2);

        director.tick(&mut world, &roster);
        let events = director.tick(&mut world, &roster);
        assert!(events.events.contains(&SiegeEvent::Resynced { live: 1 }));
        // Recount runs before this tick's spawn.
        assert_eq!(director.session().live_mob_count(), 2);
    }

    #[test]
    fn test_multiplier_getter_scales_waves() {
        let roster = SandboxRoster::with_players(1);
        let mut director = two_wave_director();
        director.set_enemy_multiplier_getter(|| Fixed::from_num(3));
        director.start_siege(&roster);
        assert_eq!(director.jobs()[0].queue_len(), 6);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut world = SandboxWorld::new();
        let roster = SandboxRoster::with_players(1);
        let mut director = two_wave_director();
        director.start_siege(&roster);
        director.tick(&mut world, &roster);
        let bytes = director.snapshot().unwrap();

        let mut restored = two_wave_director();
        restored.restore(&bytes).unwrap();
        assert!(restored.is_active());
        assert_eq!(restored.session().live_mob_count(), 1);
        assert_eq!(restored.session().in_flight_spawn_jobs, 0);
        assert!(restored.restore(&[1, 2]).is_err());
    }
}
