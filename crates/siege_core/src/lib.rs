//! # Siege Core
//!
//! Wave orchestration for colony sieges.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (spawn offsets come from a seeded RNG)
//! - No floating-point math (uses fixed-point)
//!
//! The host world is reached through the [`host::SiegeWorld`] and
//! [`host::PlayerRoster`] traits, so the same director drives a real game,
//! the in-memory [`sandbox`] world, or a headless batch run.
//!
//! ## Crate Structure
//!
//! - [`director`] - Siege lifecycle state machine
//! - [`spawner`] - Spawn queues and resumable spawn jobs
//! - [`budget`] - Live siege-unit accounting
//! - [`boss`] - Boss phase escalation
//! - [`escalation`] - Endless wave-set selection
//! - [`waves`] - Wave catalogs
//! - [`session`] - Session state and snapshots
//! - [`sandbox`] - In-memory host for tests and tools
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod boss;
pub mod budget;
pub mod components;
pub mod config;
pub mod director;
pub mod error;
pub mod escalation;
pub mod host;
pub mod math;
pub mod sandbox;
pub mod session;
pub mod spawner;
pub mod waves;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::boss::{BossPhase, BossPhaseChange};
    pub use crate::components::*;
    pub use crate::config::SiegeConfig;
    pub use crate::director::{SiegeDirector, SiegeEvent, TickEvents};
    pub use crate::error::{Result, SiegeError};
    pub use crate::host::{PlayerRoster, SiegeWorld};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::sandbox::{SandboxRoster, SandboxWorld};
    pub use crate::session::{SiegeMode, SiegeOutcome, SiegeResult, SiegeStatus};
    pub use crate::spawner::WaveLabel;
    pub use crate::waves::{
        EndlessCatalog, EndlessWaveSet, SiegeCatalogs, SpawnRequest, WaveCatalog, WaveDefinition,
    };
}
