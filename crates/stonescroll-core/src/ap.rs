//! Action point economy.
//!
//! Each player has ordinary AP (refilled to the maximum every turn) and void
//! AP, a supplement equal to the void stones they hold when their turn
//! starts. Void AP is spent first and can only shrink during a turn.

use crate::scroll::ScrollDefinition;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A player's action points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApState {
    /// Ordinary AP (0..=max)
    pub current: u32,
    /// Supplemental AP from void stones, spent before `current`
    pub void: u32,
}

impl ApState {
    /// Create an AP state with explicit values
    pub fn new(current: u32, void: u32) -> Self {
        Self { current, void }
    }

    /// Total spendable AP
    pub fn total(&self) -> u32 {
        self.current + self.void
    }

    /// Check if a cost can be paid
    pub fn can_afford(&self, cost: u32) -> bool {
        self.total() >= cost
    }

    /// Pay a cost: void AP first, the remainder from current AP.
    ///
    /// Callers must check `can_afford` first. An overspend is a rules bug: it
    /// is logged and the state bottoms out at zero.
    pub fn spend(&mut self, cost: u32) {
        if !self.can_afford(cost) {
            warn!(cost, current = self.current, void = self.void, "AP overspend");
            debug_assert!(false, "AP overspend: cost {} with {:?}", cost, self);
        }

        let from_void = cost.min(self.void);
        self.void -= from_void;
        self.current = self.current.saturating_sub(cost - from_void);
    }

    /// Start-of-turn reset: current to the maximum, void to the void stone
    /// count. Replaces, never adds.
    pub fn refresh(&mut self, max_ap: u32, void_stones: u32) {
        self.current = max_ap;
        self.void = void_stones;
    }

    /// Grant AP: fills current up to the maximum, overflow raises void AP up
    /// to (never beyond) the void stone count.
    pub fn add(&mut self, amount: u32, max_ap: u32, void_stones: u32) {
        let to_current = amount.min(max_ap.saturating_sub(self.current));
        self.current += to_current;

        let overflow = amount - to_current;
        if overflow > 0 && self.void < void_stones {
            self.void = (self.void + overflow).min(void_stones);
        }
    }

    /// Void stones were lost mid-turn: void AP may not exceed what is left
    pub fn clamp_void(&mut self, void_stones: u32) {
        self.void = self.void.min(void_stones);
    }
}

/// A turn-scoped effect granted by a resolved scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnBuff {
    /// Earth and water cost 0 to enter for this mover
    EarthWaterAsWind,
    /// Every other paid step is free
    AlternatingFreeSteps,
    /// Casting costs the reduced cost
    CastCostReduced,
    /// Level-1 scrolls cost nothing for this caster
    LevelOneFree,
}

/// Buffs active for one player during their turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnBuffs {
    pub earth_water_as_wind: bool,
    pub alternating_free_steps: bool,
    /// A paid step has banked a free one (alternating buff only)
    pub banked_free_step: bool,
    pub cast_cost_reduced: bool,
    pub level_one_free: bool,
}

impl TurnBuffs {
    /// Switch a buff on
    pub fn grant(&mut self, buff: TurnBuff) {
        match buff {
            TurnBuff::EarthWaterAsWind => self.earth_water_as_wind = true,
            TurnBuff::AlternatingFreeSteps => self.alternating_free_steps = true,
            TurnBuff::CastCostReduced => self.cast_cost_reduced = true,
            TurnBuff::LevelOneFree => self.level_one_free = true,
        }
    }

    /// Drop every buff (end of turn)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// AP cost of casting `scroll` under `buffs`.
///
/// Level-1-free wins over the flat reduction for level-1 scrolls.
pub fn cast_cost(
    scroll: &ScrollDefinition,
    buffs: &TurnBuffs,
    base_cost: u32,
    reduced_cost: u32,
) -> u32 {
    if buffs.level_one_free && scroll.level == 1 {
        0
    } else if buffs.cast_cost_reduced {
        reduced_cost.min(base_cost)
    } else {
        base_cost
    }
}
