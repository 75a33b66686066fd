//! Data file loading.
//!
//! Catalogs, configs and scenarios live in RON files. Everything loaded here
//! is validated before it is handed to the director.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use siege_core::config::SiegeConfig;
use siege_core::error::SiegeError;
use siege_core::waves::{SiegeCatalogs, WaveCatalog};

/// Error type for data file operations.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    /// Failed to read file.
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse RON.
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Parser error with position.
        source: ron::error::SpannedError,
    },
    /// Parsed but broke a structural rule.
    #[error("Invalid data in '{path}': {source}")]
    Invalid {
        /// File being validated.
        path: PathBuf,
        /// Validation failure.
        source: SiegeError,
    },
}

/// Read and deserialize a RON file.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable or malformed.
pub fn load_ron<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a normal-mode wave catalog.
///
/// # Errors
///
/// Returns an error if loading fails or the catalog is invalid.
pub fn load_wave_catalog(path: &Path) -> Result<WaveCatalog, LoadError> {
    let catalog: WaveCatalog = load_ron(path)?;
    catalog.validate().map_err(|source| invalid(path, source))?;
    tracing::debug!(path = %path.display(), waves = catalog.len(), "Loaded wave catalog");
    Ok(catalog)
}

/// Load both catalogs from one file.
///
/// # Errors
///
/// Returns an error if loading fails or either catalog is invalid.
pub fn load_catalogs(path: &Path) -> Result<SiegeCatalogs, LoadError> {
    let catalogs: SiegeCatalogs = load_ron(path)?;
    catalogs
        .waves
        .validate()
        .and_then(|()| catalogs.endless.validate())
        .map_err(|source| invalid(path, source))?;
    tracing::debug!(
        path = %path.display(),
        waves = catalogs.waves.len(),
        endless_sets = catalogs.endless.len(),
        "Loaded siege catalogs"
    );
    Ok(catalogs)
}

/// Load a siege config. Missing fields take their defaults.
///
/// # Errors
///
/// Returns an error if loading fails or the config is invalid.
pub fn load_config(path: &Path) -> Result<SiegeConfig, LoadError> {
    let config: SiegeConfig = load_ron(path)?;
    config.validate().map_err(|source| invalid(path, source))?;
    Ok(config)
}

/// Load a catalog file if given, else the shipped catalogs.
///
/// A file holding only a wave catalog is accepted too; it is paired with the
/// shipped endless sets.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded as either shape.
pub fn catalogs_or_default(path: Option<&Path>) -> Result<SiegeCatalogs, LoadError> {
    let Some(path) = path else {
        return Ok(SiegeCatalogs::default());
    };
    match load_catalogs(path) {
        Ok(catalogs) => Ok(catalogs),
        Err(LoadError::Parse { .. }) => Ok(SiegeCatalogs {
            waves: load_wave_catalog(path)?,
            ..SiegeCatalogs::default()
        }),
        Err(e) => Err(e),
    }
}

/// Load a config file if given, else the defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded.
pub fn config_or_default(path: Option<&Path>) -> Result<SiegeConfig, LoadError> {
    path.map_or_else(|| Ok(SiegeConfig::default()), load_config)
}

fn invalid(path: &Path, source: SiegeError) -> LoadError {
    LoadError::Invalid {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_test_utils::fixtures::{boss_catalog, to_ron};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let err = load_wave_catalog(Path::new("/nonexistent/waves.ron")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound(_)));
    }

    #[test]
    fn test_load_wave_catalog() {
        let file = write_temp(&to_ron(&boss_catalog(3, 20)));
        let catalog = load_wave_catalog(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_parse_error_has_path() {
        let file = write_temp("(waves: [ oops");
        let err = load_wave_catalog(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_invalid_catalog_rejected() {
        let file = write_temp(
            r#"(waves: [
                (wave_number: 1, spawns: [(entity_type: "siege_grunt", base_count: 2)], delay_ticks: 0),
                (wave_number: 3, spawns: [(entity_type: "siege_grunt", base_count: 2)], delay_ticks: 10),
            ])"#,
        );
        let err = load_wave_catalog(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                source: SiegeError::InvalidCatalog(_),
                ..
            }
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = write_temp("(max_live_mobs: 12, batch_size: 3)");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.max_live_mobs, 12);
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.max_spawns_per_player, 24);
    }

    #[test]
    fn test_catalogs_fall_back_to_wave_only_file() {
        let file = write_temp(&to_ron(&boss_catalog(2, 5)));
        let catalogs = catalogs_or_default(Some(file.path())).unwrap();
        assert_eq!(catalogs.waves.len(), 2);
        assert_eq!(catalogs.endless.len(), 4);
    }

    #[test]
    fn test_full_catalogs_file() {
        let file = write_temp(&to_ron(&SiegeCatalogs::default()));
        let catalogs = load_catalogs(file.path()).unwrap();
        assert_eq!(catalogs, SiegeCatalogs::default());
    }
}
