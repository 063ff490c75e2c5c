//! Host settings read from the environment.

use anyhow::Context;
use std::time::{SystemTime, UNIX_EPOCH};
use stonescroll_core::RulesConfig;

const DEFAULT_PLAYERS: &str = "Player 1,Player 2";
const DEFAULT_TICK_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub players: Vec<String>,
    pub seed: u64,
    /// Interval of the deadline check
    pub tick_ms: u64,
    pub rules: RulesConfig,
    /// Saved game to resume instead of starting fresh
    pub resume: Option<String>,
}

impl HostConfig {
    /// Read `STONESCROLL_*` variables; anything unset keeps its default
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let players = parse_players(&var("STONESCROLL_PLAYERS").unwrap_or_else(|| DEFAULT_PLAYERS.into()));

        let seed = match var("STONESCROLL_SEED") {
            Some(seed) => seed.trim().parse().context("STONESCROLL_SEED must be a u64")?,
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default(),
        };

        let tick_ms = match var("STONESCROLL_TICK_MS") {
            Some(ms) => ms.trim().parse().context("STONESCROLL_TICK_MS must be a u64")?,
            None => DEFAULT_TICK_MS,
        };

        let rules = match var("STONESCROLL_RULES") {
            Some(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading rules file {}", path))?;
                RulesConfig::from_json(&json).with_context(|| format!("parsing rules file {}", path))?
            }
            None => RulesConfig::default(),
        };

        let resume = match var("STONESCROLL_RESUME") {
            Some(path) => Some(
                std::fs::read_to_string(&path).with_context(|| format!("reading saved game {}", path))?,
            ),
            None => None,
        };

        Ok(Self {
            players,
            seed,
            tick_ms,
            rules,
            resume,
        })
    }
}

fn parse_players(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}
