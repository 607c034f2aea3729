//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use lane_core::{AggregationConfig, CommitConfig, ConsistencyConfig};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Quiet period after the last edit before a draft is autosaved.
    pub autosave_debounce_ms: u64,

    pub aggregation: AggregationConfig,

    pub consistency: ConsistencyConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("lane.db"),
            autosave_debounce_ms: 1000,
            aggregation: AggregationConfig::default(),
            consistency: ConsistencyConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, the user config file, `config_path`, then
    /// `LANE_*` environment variables (`LANE_AGGREGATION__REVIEW_TOLERANCE_CS=50`).
    /// The merged consistency breakpoints must be strictly ascending.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("LANE_").split("__"));

        let config: Self = figment.extract()?;
        config
            .consistency
            .validate()
            .map_err(|err| figment::Error::from(err.to_string()))?;
        Ok(config)
    }

    pub const fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// Settings applied to every commit.
    pub fn commit_config(&self) -> CommitConfig {
        CommitConfig {
            aggregation: self.aggregation.clone(),
            consistency: self.consistency.clone(),
        }
    }
}

/// Returns the platform-specific config directory for lane.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("lane"))
}

/// Returns the platform-specific data directory for lane.
///
/// On Linux: `~/.local/share/lane`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("lane"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("lane.db"));
        assert_eq!(config.autosave_debounce(), Duration::from_secs(1));
        assert_eq!(config.aggregation.review_tolerance_cs, 40);
    }

    #[test]
    fn config_file_overrides_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lane.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "database_path = \"/tmp/meet.db\"\nautosave_debounce_ms = 250\n\n[aggregation]\nreview_tolerance_cs = 25\n\n[consistency]\nscore_weight = 5.0"
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/meet.db"));
        assert_eq!(config.autosave_debounce_ms, 250);
        assert_eq!(config.commit_config().aggregation.review_tolerance_cs, 25);
        assert!((config.consistency.score_weight - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.consistency.breakpoints, [2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn descending_breakpoints_are_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lane.toml");
        std::fs::write(&path, "[consistency]\nbreakpoints = [8.0, 6.0, 4.0, 2.0]\n").unwrap();

        let err = Config::load_from(Some(&path)).unwrap_err();
        assert!(
            err.to_string()
                .contains("consistency breakpoints must be strictly ascending"),
            "{err}"
        );
    }
}
