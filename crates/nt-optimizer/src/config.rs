//! Run configuration, loaded from JSON with defaults for every field.

use nt_types::{config_error, NtResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bandit::BanditConfig;
use crate::landscape::{ExplorationRule, LandscapeConfig, NoInformation, TupleConfig};
use crate::osd::OsdConfig;

fn default_iterations() -> usize {
    1000
}

fn default_repeats() -> usize {
    1
}

fn default_k_explore() -> f64 {
    1.0
}

fn default_neighbourhood() -> usize {
    50
}

fn default_min_tuple_size() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NtbeaConfig {
    /// Evaluations per repeat.
    #[serde(default = "default_iterations")]
    pub iterations_per_run: usize,
    #[serde(default = "default_repeats")]
    pub repeats: usize,
    #[serde(default = "default_k_explore")]
    pub k_explore: f64,
    #[serde(default = "default_neighbourhood")]
    pub neighbourhood_size: usize,
    /// Base seed; repeat `r` runs with `seed + r`.
    #[serde(default)]
    pub seed: u64,
    /// Fresh evaluations of each repeat's winner. `None` means a fifth of
    /// `iterations_per_run`; zero scores winners from the model instead.
    #[serde(default)]
    pub eval_games: Option<usize>,
    #[serde(default)]
    pub tuples: TupleConfig,
    #[serde(default)]
    pub exploration: ExplorationRule,
    #[serde(default)]
    pub no_information: NoInformation,
    #[serde(default = "default_min_tuple_size")]
    pub min_tuple_size: usize,
    /// Pick each repeat's winner by current model estimate rather than the
    /// estimate recorded when it was sampled.
    #[serde(default)]
    pub rescore_winner: bool,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub verbose: bool,
    /// Refine the overall winner with one-step deviations.
    #[serde(default)]
    pub osd: Option<OsdConfig>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub settings_file: Option<PathBuf>,
}

impl Default for NtbeaConfig {
    fn default() -> Self {
        Self {
            iterations_per_run: default_iterations(),
            repeats: default_repeats(),
            k_explore: default_k_explore(),
            neighbourhood_size: default_neighbourhood(),
            seed: 0,
            eval_games: None,
            tuples: TupleConfig::default(),
            exploration: ExplorationRule::default(),
            no_information: NoInformation::default(),
            min_tuple_size: default_min_tuple_size(),
            rescore_winner: false,
            parallel: false,
            verbose: false,
            osd: None,
            log_file: None,
            settings_file: None,
        }
    }
}

impl NtbeaConfig {
    pub fn from_json(text: &str) -> NtResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> NtResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> NtResult<()> {
        if self.iterations_per_run == 0 {
            return Err(config_error!("iterations_per_run must be at least 1"));
        }
        if self.repeats == 0 {
            return Err(config_error!("repeats must be at least 1"));
        }
        if self.neighbourhood_size == 0 {
            return Err(config_error!("neighbourhood_size must be at least 1"));
        }
        if !self.k_explore.is_finite() || self.k_explore < 0.0 {
            return Err(config_error!(
                "k_explore must be a non-negative number, got {}",
                self.k_explore
            ));
        }
        if let Some(osd) = &self.osd {
            osd.validate()?;
        }
        Ok(())
    }

    pub fn eval_games(&self) -> usize {
        self.eval_games.unwrap_or(self.iterations_per_run / 5)
    }

    pub fn landscape_config(&self) -> LandscapeConfig {
        LandscapeConfig {
            tuples: self.tuples.clone(),
            k_explore: self.k_explore,
            exploration: self.exploration,
            no_information: self.no_information,
            min_tuple_size: self.min_tuple_size,
        }
    }

    pub fn bandit_config(&self) -> BanditConfig {
        BanditConfig {
            neighbourhood_size: self.neighbourhood_size,
            seed: self.seed,
        }
    }

    /// Seed for repeat number `repeat`.
    pub fn repeat_seed(&self, repeat: usize) -> u64 {
        self.seed.wrapping_add(repeat as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nt_types::NtError;

    #[test]
    fn empty_object_gives_defaults() {
        let config = NtbeaConfig::from_json("{}").unwrap();
        assert_eq!(config, NtbeaConfig::default());
        assert_eq!(config.iterations_per_run, 1000);
        assert_eq!(config.eval_games(), 200);
        assert!(config.tuples.one && config.tuples.n);
        assert!(!config.tuples.two);
        assert_eq!(config.exploration, ExplorationRule::WeakestLink);
        assert_eq!(config.no_information, NoInformation::GlobalMean);
    }

    #[test]
    fn parses_full_config() {
        let config = NtbeaConfig::from_json(
            r#"{
                "iterations_per_run": 300,
                "repeats": 4,
                "k_explore": 0.5,
                "seed": 17,
                "eval_games": 0,
                "tuples": {"two": true, "extra": [[0, 2]]},
                "exploration": {"rule": "generalised_mean", "exponent": -2.0, "simple_regret": false},
                "no_information": {"value": 0.25},
                "rescore_winner": true,
                "osd": {"games_per_round": 20},
                "settings_file": "best.json"
            }"#,
        )
        .unwrap();
        assert_eq!(config.repeats, 4);
        assert_eq!(config.eval_games(), 0);
        assert!(config.tuples.one && config.tuples.two && config.tuples.n);
        assert_eq!(config.tuples.extra, vec![vec![0, 2]]);
        assert_eq!(
            config.exploration,
            ExplorationRule::GeneralisedMean {
                exponent: -2.0,
                simple_regret: false
            }
        );
        assert_eq!(config.no_information, NoInformation::Value(0.25));
        assert_eq!(config.osd.as_ref().map(|o| o.games_per_round), Some(20));
        assert_eq!(config.repeat_seed(3), 20);
        assert_eq!(config.landscape_config().k_explore, 0.5);
        assert_eq!(config.bandit_config().seed, 17);
    }

    #[test]
    fn rejects_zero_budget() {
        for text in [
            r#"{"iterations_per_run": 0}"#,
            r#"{"repeats": 0}"#,
            r#"{"neighbourhood_size": 0}"#,
            r#"{"k_explore": -0.1}"#,
        ] {
            assert!(
                matches!(NtbeaConfig::from_json(text), Err(NtError::Config(_))),
                "{text} should be rejected"
            );
        }
        assert!(matches!(
            NtbeaConfig::from_json(r#"{"repeats": "many"}"#),
            Err(NtError::Serialization(_))
        ));
    }
}
