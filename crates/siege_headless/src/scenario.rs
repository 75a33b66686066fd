//! Scenario definitions.
//!
//! A scenario describes one scripted siege: who is defending, which mode is
//! played, and how fast the defenders kill siege units.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::loader::{load_ron, LoadError};

/// Which siege a scenario starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScenarioMode {
    /// The scripted wave catalog.
    #[default]
    Normal,
    /// An endless siege on the given day.
    Endless {
        /// Colony day used to pick the wave-set.
        day: u32,
    },
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Connected players.
    pub players: u32,
    /// Siege mode.
    pub mode: ScenarioMode,
    /// Difficulty multiplier, in percent.
    pub enemy_multiplier_pct: u32,
    /// Siege units the defenders kill per tick.
    pub kills_per_tick: u32,
    /// Ticks before the defenders start killing.
    pub kill_delay_ticks: u64,
    /// Every player goes down on this tick, if set.
    pub all_down_at: Option<u64>,
    /// Give up after this many ticks.
    pub max_ticks: u64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "standard_siege".to_string(),
            players: 1,
            mode: ScenarioMode::Normal,
            enemy_multiplier_pct: 100,
            kills_per_tick: 1,
            kill_delay_ticks: 0,
            all_down_at: None,
            max_ticks: 20 * 60 * 20,
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        load_ron(path.as_ref())
    }

    /// The shipped siege with `players` defenders.
    #[must_use]
    pub fn standard(players: u32) -> Self {
        Self {
            players,
            ..Self::default()
        }
    }

    /// An endless siege on `day`.
    #[must_use]
    pub fn endless(players: u32, day: u32) -> Self {
        Self {
            name: format!("endless_day_{day}"),
            players,
            mode: ScenarioMode::Endless { day },
            ..Self::default()
        }
    }

    /// Set the kill rate.
    #[must_use]
    pub fn with_kills(mut self, kills_per_tick: u32) -> Self {
        self.kills_per_tick = kills_per_tick;
        self
    }

    /// Set the difficulty multiplier.
    #[must_use]
    pub fn with_multiplier_pct(mut self, pct: u32) -> Self {
        self.enemy_multiplier_pct = pct;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let scenario = Scenario::default();
        assert_eq!(scenario.players, 1);
        assert_eq!(scenario.mode, ScenarioMode::Normal);
        assert_eq!(scenario.enemy_multiplier_pct, 100);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "(name: \"night_raid\", players: 3, mode: Endless(day: 150), kills_per_tick: 2)"
        )
        .unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.name, "night_raid");
        assert_eq!(scenario.players, 3);
        assert_eq!(scenario.mode, ScenarioMode::Endless { day: 150 });
        assert_eq!(scenario.kills_per_tick, 2);
        assert_eq!(scenario.max_ticks, Scenario::default().max_ticks);
    }
}
