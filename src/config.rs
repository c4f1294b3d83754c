//! Application-level configuration loading: engine tunables and the ranking window.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::games::{minesweeper::MinesweeperConfig, num_guess::NumGuessConfig, simon::SimonConfig};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAUNTLET_BACK_CONFIG_PATH";
/// Length of a ranking window when none is configured.
const DEFAULT_WINDOW: Duration = Duration::from_secs(2 * 60 * 60);

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Grid dimension, mine count and ranking direction of minesweeper.
    pub minesweeper: MinesweeperConfig,
    /// Sequence length and ranking direction of simon.
    pub simon: SimonConfig,
    /// Turn budget and ranking direction of the number guessing game.
    pub num_guess: NumGuessConfig,
    /// Reset schedule of the leaderboard.
    pub rankings: RankingsConfig,
}

/// Leaderboard reset schedule.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RankingsConfig {
    /// Interval between two leaderboard announcements.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "window_secs")]
    pub window: Duration,
}

impl Default for RankingsConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

impl RankingsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.window.is_zero() {
            return Err("window_secs must be at least 1".into());
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        window_secs = config.rankings.window.as_secs(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document and replace invalid sections by their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(contents)?;
        config.sanitize();
        Ok(config)
    }

    fn sanitize(&mut self) {
        if let Err(reason) = self.minesweeper.validate() {
            warn!(section = "minesweeper", %reason, "invalid section; using defaults");
            self.minesweeper = MinesweeperConfig::default();
        }
        if let Err(reason) = self.simon.validate() {
            warn!(section = "simon", %reason, "invalid section; using defaults");
            self.simon = SimonConfig::default();
        }
        if let Err(reason) = self.num_guess.validate() {
            warn!(section = "num_guess", %reason, "invalid section; using defaults");
            self.num_guess = NumGuessConfig::default();
        }
        if let Err(reason) = self.rankings.validate() {
            warn!(section = "rankings", %reason, "invalid section; using defaults");
            self.rankings = RankingsConfig::default();
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::RankOrder;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.rankings.window, Duration::from_secs(7200));
        assert_eq!(config.minesweeper.ndim, 8);
        assert_eq!(config.num_guess.rank_order, RankOrder::Asc);
    }

    #[test]
    fn sections_override_independently() {
        let config = AppConfig::from_json(
            r#"{"simon": {"max_sequence": 5}, "rankings": {"window_secs": 60}}"#,
        )
        .unwrap();
        assert_eq!(config.simon.max_sequence, 5);
        assert_eq!(config.rankings.window, Duration::from_secs(60));
        assert_eq!(config.minesweeper, MinesweeperConfig::default());
    }

    #[test]
    fn invalid_sections_fall_back_to_defaults() {
        let config = AppConfig::from_json(
            r#"{"minesweeper": {"ndim": 2, "mine_count": 4}, "rankings": {"window_secs": 0},
                "num_guess": {"max_turns": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.minesweeper, MinesweeperConfig::default());
        assert_eq!(config.rankings, RankingsConfig::default());
        assert_eq!(config.num_guess.max_turns, 3);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(AppConfig::from_json("{ not json").is_err());
    }
}
