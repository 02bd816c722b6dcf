// Configuration module for reading Capture.toml
// Every tunable constant of the agents lives here; nothing is learned at runtime

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub tracking: TrackingConfig,
    pub features: FeatureConfig,
    pub weights: WeightsConfig,
    pub rules: RulesConfig,
    pub agent: AgentConfig,
    pub debug: DebugConfig,
}

/// Adversarial search constants
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Minimizer depth at which the tree is cut off and evaluated
    pub depth: u32,
}

/// Opponent tracking constants
#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// Unseen tick on which the estimate is picked at random
    pub coin_flip_tick: u32,
    /// Unseen tick from which the estimate is dropped
    pub expiry_tick: u32,
}

/// Feature extraction thresholds
#[derive(Debug, Deserialize, Clone)]
pub struct FeatureConfig {
    pub danger_distance: f64,
    pub caution_distance: f64,
    pub danger_penalty: f64,
    pub invader_distance_cap: f64,
}

/// Linear evaluation weights per role, keyed by feature name
#[derive(Debug, Deserialize, Clone)]
pub struct WeightsConfig {
    pub offensive: BTreeMap<String, f64>,
    pub defensive: BTreeMap<String, f64>,
}

/// Rules of the reference environment
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RulesConfig {
    pub scared_time: u32,
    pub sight_range: i32,
}

/// Per-agent constants
#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    /// Fixed seed for tie-breaking; entropy-seeded when absent
    pub random_seed: Option<u64>,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

fn weight_table(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(name, weight)| (name.to_string(), *weight))
        .collect()
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Capture.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Capture.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Capture.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Capture.toml
    pub fn default_hardcoded() -> Self {
        Config {
            search: SearchConfig { depth: 4 },
            tracking: TrackingConfig {
                coin_flip_tick: 5,
                expiry_tick: 6,
            },
            features: FeatureConfig {
                danger_distance: 2.0,
                caution_distance: 5.0,
                danger_penalty: 100.0,
                invader_distance_cap: 100.0,
            },
            weights: WeightsConfig {
                offensive: weight_table(&[
                    ("successorScore", 100.0),
                    ("averageDist", 0.0),
                    ("minDist", -1.0),
                    ("dist2enemy", 1.0),
                    ("scaredTime", 1.0),
                    ("dist2Capsules", -5.0),
                    ("foodRemaining", -40.0),
                ]),
                defensive: weight_table(&[
                    ("numInvaders", -1000.0),
                    ("onDefense", 100.0),
                    ("invaderDistance", -10.0),
                    ("stop", -100.0),
                    ("reverse", -2.0),
                ]),
            },
            rules: RulesConfig {
                scared_time: 40,
                sight_range: 5,
            },
            agent: AgentConfig { random_seed: None },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "capture_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!(
                "Could not load Capture.toml ({}), using hardcoded defaults",
                e
            );
            Self::default_hardcoded()
        })
    }

    /// Same configuration with a fixed tie-breaking seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.agent.random_seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_can_be_created() {
        let config = Config::default_hardcoded();
        assert_eq!(config.search.depth, 4);
        assert_eq!(config.tracking.expiry_tick, 6);
        assert_eq!(config.weights.offensive["foodRemaining"], -40.0);
        assert_eq!(config.weights.defensive["numInvaders"], -1000.0);
    }

    #[test]
    fn test_capture_toml_can_be_parsed() {
        // This test ensures Capture.toml is valid and can be parsed
        let result = Config::from_file("Capture.toml");
        assert!(
            result.is_ok(),
            "Failed to parse Capture.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = Config::from_file("Capture.toml").expect("Capture.toml should be parseable");
        let hardcoded_config = Config::default_hardcoded();

        assert_eq!(file_config.search.depth, hardcoded_config.search.depth);
        assert_eq!(
            file_config.tracking.coin_flip_tick,
            hardcoded_config.tracking.coin_flip_tick
        );
        assert_eq!(
            file_config.tracking.expiry_tick,
            hardcoded_config.tracking.expiry_tick
        );
        assert_eq!(
            file_config.features.danger_penalty,
            hardcoded_config.features.danger_penalty
        );
        assert_eq!(file_config.weights.offensive, hardcoded_config.weights.offensive);
        assert_eq!(file_config.weights.defensive, hardcoded_config.weights.defensive);
        assert_eq!(file_config.rules, hardcoded_config.rules);
        assert_eq!(file_config.agent.random_seed, None);
    }

    #[test]
    fn test_with_seed_overrides_seed() {
        let config = Config::default_hardcoded().with_seed(7);
        assert_eq!(config.agent.random_seed, Some(7));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());
    }
}
