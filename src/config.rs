// Game configuration: discussion timer, dealing mode and RNG seed, with
// environment overrides.

use std::env;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_DISCUSSION_TIMER: u32 = 5;

/// How characters are handed out to seats at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Deal {
    /// Seat `i` gets the `i`-th character of the pool.
    InOrder,
    #[default]
    Shuffled,
}

impl Deal {
    pub fn from_name(name: &str) -> Option<Deal> {
        match name.to_lowercase().replace('_', "-").as_str() {
            "in-order" | "inorder" | "ordered" => Some(Deal::InOrder),
            "shuffled" | "shuffle" | "random" => Some(Deal::Shuffled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Chat messages allowed before nominations open (`meta.timer`).
    pub discussion_timer: u32,
    pub deal: Deal,
    /// Seed for dealing, deck shuffles and storyteller misinformation.
    pub seed: Option<u64>,
    /// Minimum table size at which the evil team learns each other on the first night.
    pub evil_info_min_players: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            discussion_timer: DEFAULT_DISCUSSION_TIMER,
            deal: Deal::default(),
            seed: None,
            evil_info_min_players: 7,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let discussion_timer = env::var("BOTC_DISCUSSION_TIMER")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.discussion_timer);
        let deal = env::var("BOTC_DEAL")
            .ok()
            .and_then(|v| Deal::from_name(&v))
            .unwrap_or(defaults.deal);
        let seed = env::var("BOTC_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        Self {
            discussion_timer,
            deal,
            seed,
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discussion_timer == 0 {
            return Err(ConfigError::InvalidTimer(self.discussion_timer));
        }
        Ok(())
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.discussion_timer, 5);
        assert_eq!(config.deal, Deal::Shuffled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timer_rejected() {
        let config = GameConfig {
            discussion_timer: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimer(0)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"deal": "in-order", "seed": 42}"#).unwrap();
        assert_eq!(config.deal, Deal::InOrder);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.discussion_timer, 5);
    }

    #[test]
    fn test_from_env() {
        // Only this test touches BOTC_* variables.
        env::set_var("BOTC_DISCUSSION_TIMER", "3");
        env::set_var("BOTC_DEAL", "in_order");
        env::set_var("BOTC_SEED", "99");
        let config = GameConfig::from_env();
        env::remove_var("BOTC_DISCUSSION_TIMER");
        env::remove_var("BOTC_DEAL");
        env::remove_var("BOTC_SEED");

        assert_eq!(config.discussion_timer, 3);
        assert_eq!(config.deal, Deal::InOrder);
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn test_deal_names() {
        assert_eq!(Deal::from_name("Shuffled"), Some(Deal::Shuffled));
        assert_eq!(Deal::from_name("in-order"), Some(Deal::InOrder));
        assert_eq!(Deal::from_name("sideways"), None);
    }
}
