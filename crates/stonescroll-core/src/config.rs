//! Rules configuration.
//!
//! Every tunable number of the ruleset lives here so hosts can load a
//! variant from JSON. `RulesConfig::default()` is the standard game.

use crate::hex::{DEFAULT_HEX_SIZE, SAME_HEX_EPSILON};
use serde::{Deserialize, Serialize};

/// Tunable rule constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Hex radius in pixels for pixel conversions
    pub hex_size: f64,
    /// Pixel distance under which two positions are the same hex
    pub same_hex_epsilon: f64,
    /// AP refilled at the start of each turn
    pub max_ap: u32,
    /// Cost of casting a scroll without buffs
    pub base_cast_cost: u32,
    /// Cost of casting under the cast-cost-reduced buff
    pub reduced_cast_cost: u32,
    /// Cost of responding in a response window (buffs never apply)
    pub response_cost: u32,
    /// Cost of placing a stone from the player pool
    pub place_stone_cost: u32,
    /// Cost of breaking a stone on the board
    pub break_stone_cost: u32,
    /// Scrolls a hand may hold
    pub hand_capacity: usize,
    /// Scrolls an active area may hold
    pub active_capacity: usize,
    /// Stones per element a player pool may hold
    pub player_pool_capacity: u32,
    /// Stones per element in the whole game (source pool when nothing is drawn)
    pub source_pool_capacity: u32,
    /// Stones per element each player starts with
    pub starting_stones: u32,
    /// Time each eligible player gets to answer a response window
    pub response_timeout_ms: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            hex_size: DEFAULT_HEX_SIZE,
            same_hex_epsilon: SAME_HEX_EPSILON,
            max_ap: 5,
            base_cast_cost: 2,
            reduced_cast_cost: 1,
            response_cost: 2,
            place_stone_cost: 1,
            break_stone_cost: 1,
            hand_capacity: 2,
            active_capacity: 2,
            player_pool_capacity: 5,
            source_pool_capacity: 25,
            starting_stones: 1,
            response_timeout_ms: 30_000,
        }
    }
}

impl RulesConfig {
    /// Parse a (possibly partial) JSON rules file; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = RulesConfig::default();
        assert_eq!(rules.max_ap, 5);
        assert_eq!(rules.hand_capacity, 2);
        assert_eq!(rules.active_capacity, 2);
        assert_eq!(rules.player_pool_capacity, 5);
        assert_eq!(rules.source_pool_capacity, 25);
        assert_eq!(rules.response_cost, 2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let rules = RulesConfig::from_json(r#"{"response_timeout_ms": 500, "max_ap": 6}"#).unwrap();
        assert_eq!(rules.response_timeout_ms, 500);
        assert_eq!(rules.max_ap, 6);
        assert_eq!(rules.base_cast_cost, 2);
    }
}
