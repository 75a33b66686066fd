//! Wave catalogs.
//!
//! Pure data: the scripted wave list for a normal siege and the escalating
//! wave-sets used by endless sieges. Nothing here spawns anything; see
//! [`crate::spawner`] for that.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiegeError};

/// One line of a wave: spawn `base_count` units of `entity_type` per player,
/// before scaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Host entity type identifier.
    pub entity_type: String,
    /// Unscaled count per player.
    pub base_count: u32,
}

impl SpawnRequest {
    /// Create a spawn request.
    #[must_use]
    pub fn new(entity_type: impl Into<String>, base_count: u32) -> Self {
        Self {
            entity_type: entity_type.into(),
            base_count,
        }
    }
}

/// A scripted wave in a normal siege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// 1-based position in the catalog.
    pub wave_number: u32,
    /// What to spawn.
    pub spawns: Vec<SpawnRequest>,
    /// Ticks to wait after the previous wave launched.
    pub delay_ticks: u32,
}

impl WaveDefinition {
    /// Create a wave definition.
    #[must_use]
    pub fn new(wave_number: u32, delay_ticks: u32, spawns: Vec<SpawnRequest>) -> Self {
        Self {
            wave_number,
            spawns,
            delay_ticks,
        }
    }

    /// Check whether the wave spawns any unit of `entity_type`.
    #[must_use]
    pub fn contains(&self, entity_type: &str) -> bool {
        self.spawns.iter().any(|s| s.entity_type == entity_type)
    }

    /// Sum of unscaled counts.
    #[must_use]
    pub fn base_total(&self) -> u32 {
        self.spawns.iter().map(|s| s.base_count).sum()
    }
}

/// Ordered list of waves for a normal siege.
///
/// # Example RON
///
/// ```ron
/// WaveCatalog(
///     waves: [
///         (wave_number: 1, delay_ticks: 0, spawns: [(entity_type: "siege_grunt", base_count: 4)]),
///         (wave_number: 2, delay_ticks: 600, spawns: [(entity_type: "siege_archer", base_count: 3)]),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveCatalog {
    waves: Vec<WaveDefinition>,
}

impl WaveCatalog {
    /// Build a catalog, checking its structure.
    ///
    /// # Errors
    ///
    /// Returns [`SiegeError::InvalidCatalog`] if the waves are empty, not
    /// numbered 1..=n in order, the first wave has a delay, or any spawn
    /// line has a zero count.
    pub fn new(waves: Vec<WaveDefinition>) -> Result<Self> {
        let catalog = Self { waves };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from RON.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed RON, or a catalog error if the
    /// parsed waves break the structural rules.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let catalog: Self = ron::from_str(source).map_err(|e| SiegeError::DataParseError {
            source_name: "wave catalog".to_string(),
            message: e.to_string(),
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the structural rules of the catalog.
    ///
    /// # Errors
    ///
    /// See [`WaveCatalog::new`].
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.waves.first() else {
            return Err(SiegeError::InvalidCatalog("catalog has no waves".into()));
        };
        if first.delay_ticks != 0 {
            return Err(SiegeError::InvalidCatalog(format!(
                "first wave must have delay 0, found {}",
                first.delay_ticks
            )));
        }

        for (index, wave) in self.waves.iter().enumerate() {
            let expected = index as u32 + 1;
            if wave.wave_number != expected {
                return Err(SiegeError::InvalidCatalog(format!(
                    "wave at position {index} is numbered {}, expected {expected}",
                    wave.wave_number
                )));
            }
            validate_spawns(&wave.spawns, &format!("wave {expected}"))?;
        }
        Ok(())
    }

    /// Get a wave by zero-based index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&WaveDefinition> {
        self.waves.get(index)
    }

    /// All waves in launch order.
    #[must_use]
    pub fn waves(&self) -> &[WaveDefinition] {
        &self.waves
    }

    /// Number of waves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    /// A validated catalog is never empty; provided for completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// The ten-wave siege shipped with the add-on.
    ///
    /// The warlord only appears in the final wave.
    #[must_use]
    pub fn standard() -> Self {
        let minute = 60 * crate::config::TICK_RATE;
        let waves = vec![
            WaveDefinition::new(1, 0, vec![SpawnRequest::new("siege_grunt", 4)]),
            WaveDefinition::new(
                2,
                minute / 2,
                vec![
                    SpawnRequest::new("siege_grunt", 5),
                    SpawnRequest::new("siege_archer", 2),
                ],
            ),
            WaveDefinition::new(
                3,
                minute / 2,
                vec![
                    SpawnRequest::new("siege_grunt", 6),
                    SpawnRequest::new("siege_archer", 3),
                ],
            ),
            WaveDefinition::new(
                4,
                minute / 2,
                vec![
                    SpawnRequest::new("siege_grunt", 6),
                    SpawnRequest::new("siege_archer", 4),
                    SpawnRequest::new("siege_brute", 1),
                ],
            ),
            WaveDefinition::new(
                5,
                minute,
                vec![
                    SpawnRequest::new("siege_grunt", 8),
                    SpawnRequest::new("siege_archer", 4),
                    SpawnRequest::new("siege_brute", 2),
                ],
            ),
            WaveDefinition::new(
                6,
                minute / 2,
                vec![
                    SpawnRequest::new("siege_archer", 6),
                    SpawnRequest::new("siege_brute", 3),
                    SpawnRequest::new("siege_ravager", 1),
                ],
            ),
            WaveDefinition::new(
                7,
                minute / 2,
                vec![
                    SpawnRequest::new("siege_grunt", 10),
                    SpawnRequest::new("siege_ravager", 2),
                ],
            ),
            WaveDefinition::new(
                8,
                minute / 2,
                vec![
                    SpawnRequest::new("siege_grunt", 8),
                    SpawnRequest::new("siege_archer", 6),
                    SpawnRequest::new("siege_brute", 4),
                ],
            ),
            WaveDefinition::new(
                9,
                minute,
                vec![
                    SpawnRequest::new("siege_brute", 5),
                    SpawnRequest::new("siege_ravager", 4),
                ],
            ),
            WaveDefinition::new(
                10,
                minute,
                vec![
                    SpawnRequest::new("siege_grunt", 8),
                    SpawnRequest::new("siege_ravager", 3),
                    SpawnRequest::new("siege_warlord", 1),
                ],
            ),
        ];
        Self { waves }
    }
}

/// One endless-mode wave-set. Launched all at once as a single wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndlessWaveSet {
    /// What to spawn.
    pub spawns: Vec<SpawnRequest>,
}

impl EndlessWaveSet {
    /// Create a wave-set.
    #[must_use]
    pub fn new(spawns: Vec<SpawnRequest>) -> Self {
        Self { spawns }
    }

    /// Sum of unscaled counts, a rough severity measure.
    #[must_use]
    pub fn base_total(&self) -> u32 {
        self.spawns.iter().map(|s| s.base_count).sum()
    }
}

/// Escalating wave-sets for endless sieges, mildest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndlessCatalog {
    sets: Vec<EndlessWaveSet>,
}

impl EndlessCatalog {
    /// Build a catalog, checking its structure.
    ///
    /// # Errors
    ///
    /// Returns [`SiegeError::InvalidCatalog`] if there are no sets or any
    /// spawn line has a zero count.
    pub fn new(sets: Vec<EndlessWaveSet>) -> Result<Self> {
        let catalog = Self { sets };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the structural rules of the catalog.
    ///
    /// # Errors
    ///
    /// See [`EndlessCatalog::new`].
    pub fn validate(&self) -> Result<()> {
        if self.sets.is_empty() {
            return Err(SiegeError::InvalidCatalog(
                "endless catalog has no wave-sets".into(),
            ));
        }
        for (index, set) in self.sets.iter().enumerate() {
            validate_spawns(&set.spawns, &format!("endless set {index}"))?;
        }
        Ok(())
    }

    /// Get a wave-set by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EndlessWaveSet> {
        self.sets.get(index)
    }

    /// All wave-sets, mildest first.
    #[must_use]
    pub fn sets(&self) -> &[EndlessWaveSet] {
        &self.sets
    }

    /// Number of wave-sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// A validated catalog is never empty; provided for completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The endless wave-sets shipped with the add-on.
    ///
    /// The warlord leads every set so the per-player cap trims escorts
    /// rather than the boss.
    #[must_use]
    pub fn standard() -> Self {
        let sets = vec![
            EndlessWaveSet::new(vec![
                SpawnRequest::new("siege_warlord", 1),
                SpawnRequest::new("siege_grunt", 10),
                SpawnRequest::new("siege_archer", 6),
                SpawnRequest::new("siege_brute", 3),
            ]),
            EndlessWaveSet::new(vec![
                SpawnRequest::new("siege_warlord", 1),
                SpawnRequest::new("siege_grunt", 10),
                SpawnRequest::new("siege_archer", 8),
                SpawnRequest::new("siege_brute", 4),
                SpawnRequest::new("siege_ravager", 2),
            ]),
            EndlessWaveSet::new(vec![
                SpawnRequest::new("siege_warlord", 1),
                SpawnRequest::new("siege_grunt", 12),
                SpawnRequest::new("siege_archer", 8),
                SpawnRequest::new("siege_brute", 6),
                SpawnRequest::new("siege_ravager", 4),
            ]),
            EndlessWaveSet::new(vec![
                SpawnRequest::new("siege_warlord", 2),
                SpawnRequest::new("siege_grunt", 6),
                SpawnRequest::new("siege_archer", 10),
                SpawnRequest::new("siege_brute", 10),
                SpawnRequest::new("siege_ravager", 8),
            ]),
        ];
        Self { sets }
    }
}

/// Both catalogs as stored in one RON data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiegeCatalogs {
    /// Normal-mode waves.
    pub waves: WaveCatalog,
    /// Endless-mode wave-sets.
    pub endless: EndlessCatalog,
}

impl SiegeCatalogs {
    /// Parse and validate both catalogs from RON.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed RON, or a catalog error if either
    /// catalog breaks its structural rules.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let catalogs: Self = ron::from_str(source).map_err(|e| SiegeError::DataParseError {
            source_name: "siege catalogs".to_string(),
            message: e.to_string(),
        })?;
        catalogs.waves.validate()?;
        catalogs.endless.validate()?;
        Ok(catalogs)
    }
}

impl Default for SiegeCatalogs {
    fn default() -> Self {
        Self {
            waves: WaveCatalog::standard(),
            endless: EndlessCatalog::standard(),
        }
    }
}

fn validate_spawns(spawns: &[SpawnRequest], context: &str) -> Result<()> {
    if spawns.is_empty() {
        return Err(SiegeError::InvalidCatalog(format!("{context} spawns nothing")));
    }
    if let Some(bad) = spawns.iter().find(|s| s.base_count == 0) {
        return Err(SiegeError::InvalidCatalog(format!(
            "{context} has zero count for '{}'",
            bad.entity_type
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = WaveCatalog::standard();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.get(0).unwrap().delay_ticks, 0);
    }

    #[test]
    fn test_standard_boss_only_in_final_wave() {
        let catalog = WaveCatalog::standard();
        let boss_waves: Vec<u32> = catalog
            .waves()
            .iter()
            .filter(|w| w.contains("siege_warlord"))
            .map(|w| w.wave_number)
            .collect();
        assert_eq!(boss_waves, vec![10]);
    }

    #[test]
    fn test_rejects_nonzero_first_delay() {
        let result = WaveCatalog::new(vec![WaveDefinition::new(
            1,
            5,
            vec![SpawnRequest::new("siege_grunt", 1)],
        )]);
        assert!(matches!(result, Err(SiegeError::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_gap_in_numbering() {
        let result = WaveCatalog::new(vec![
            WaveDefinition::new(1, 0, vec![SpawnRequest::new("siege_grunt", 1)]),
            WaveDefinition::new(3, 10, vec![SpawnRequest::new("siege_grunt", 1)]),
        ]);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("expected 2"), "{err}");
    }

    #[test]
    fn test_rejects_zero_count_and_empty() {
        assert!(WaveCatalog::new(vec![]).is_err());
        assert!(WaveCatalog::new(vec![WaveDefinition::new(
            1,
            0,
            vec![SpawnRequest::new("siege_grunt", 0)]
        )])
        .is_err());
        assert!(EndlessCatalog::new(vec![]).is_err());
    }

    #[test]
    fn test_endless_severity_increases() {
        let catalog = EndlessCatalog::standard();
        let totals: Vec<u32> = catalog.sets().iter().map(EndlessWaveSet::base_total).collect();
        assert!(totals.windows(2).all(|pair| pair[0] <= pair[1]), "{totals:?}");
    }

    #[test]
    fn test_endless_boss_survives_solo_cap() {
        let config = crate::config::SiegeConfig::default();
        let players = [crate::components::PlayerState::new(
            crate::components::PlayerId(1),
            crate::math::Vec2Fixed::ZERO,
        )];
        for set in EndlessCatalog::standard().sets() {
            let queue = crate::spawner::build_spawn_queue(
                &set.spawns,
                &players,
                crate::math::Fixed::ONE,
                config.max_spawns_per_player,
            );
            assert!(queue.iter().any(|e| e.entity_type == config.boss_entity_type));
        }
    }

    #[test]
    fn test_catalog_from_ron() {
        let source = r#"(
            waves: [
                (wave_number: 1, delay_ticks: 0, spawns: [(entity_type: "siege_grunt", base_count: 4)]),
                (wave_number: 2, delay_ticks: 600, spawns: [(entity_type: "siege_archer", base_count: 3)]),
            ],
        )"#;
        let catalog = WaveCatalog::from_ron_str(source).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap().delay_ticks, 600);
    }

    #[test]
    fn test_default_catalogs_round_trip_through_ron() {
        let catalogs = SiegeCatalogs::default();
        let text = ron::to_string(&catalogs).unwrap();
        let parsed = SiegeCatalogs::from_ron_str(&text).unwrap();
        assert_eq!(parsed, catalogs);
    }
}
