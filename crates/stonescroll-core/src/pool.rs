//! Stone pools.
//!
//! Every element's stones live in exactly one of three places: the shared
//! source pool, a player's pool, or the board. `StoneCounts` is the counter
//! used for both pools; transfers between them are clamped rather than
//! failing, so running a pool dry is a soft limit.

use crate::board::Element;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-element stone counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoneCounts {
    pub earth: u32,
    pub water: u32,
    pub fire: u32,
    pub wind: u32,
    pub void: u32,
}

impl StoneCounts {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool holding `amount` of every element
    pub fn uniform(amount: u32) -> Self {
        Self::with_amounts(amount, amount, amount, amount, amount)
    }

    /// Create a pool with specific amounts
    pub fn with_amounts(earth: u32, water: u32, fire: u32, wind: u32, void: u32) -> Self {
        Self {
            earth,
            water,
            fire,
            wind,
            void,
        }
    }

    /// Total number of stones
    pub fn total(&self) -> u32 {
        self.earth + self.water + self.fire + self.wind + self.void
    }

    /// Check if pool is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific element
    pub fn get(&self, element: Element) -> u32 {
        match element {
            Element::Earth => self.earth,
            Element::Water => self.water,
            Element::Fire => self.fire,
            Element::Wind => self.wind,
            Element::Void => self.void,
        }
    }

    fn slot_mut(&mut self, element: Element) -> &mut u32 {
        match element {
            Element::Earth => &mut self.earth,
            Element::Water => &mut self.water,
            Element::Fire => &mut self.fire,
            Element::Wind => &mut self.wind,
            Element::Void => &mut self.void,
        }
    }

    /// Set count of a specific element
    pub fn set(&mut self, element: Element, count: u32) {
        *self.slot_mut(element) = count;
    }

    /// Add stones, never exceeding `capacity`. Returns how many were added.
    pub fn add_capped(&mut self, element: Element, amount: u32, capacity: u32) -> u32 {
        let slot = self.slot_mut(element);
        let added = amount.min(capacity.saturating_sub(*slot));
        *slot += added;
        added
    }

    /// Take one stone out. Returns false if none are left.
    pub fn take_one(&mut self, element: Element) -> bool {
        let slot = self.slot_mut(element);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Return a stone that came off the board. Overflowing `capacity` means
    /// the conservation count is already broken, which is logged and clamped.
    pub fn return_stone(&mut self, element: Element, capacity: u32) {
        if self.add_capped(element, 1, capacity) == 0 {
            warn!(%element, capacity, "pool overflow while returning a stone");
            debug_assert!(false, "pool overflow returning {element}");
        }
    }

    /// Move up to `amount` stones of `element` from `self` into `target`,
    /// limited by what `self` holds and by `target_capacity`.
    /// Returns how many moved.
    pub fn transfer_to(
        &mut self,
        target: &mut StoneCounts,
        element: Element,
        amount: u32,
        target_capacity: u32,
    ) -> u32 {
        let available = self.get(element).min(amount);
        let moved = target.add_capped(element, available, target_capacity);
        *self.slot_mut(element) -= moved;
        moved
    }

    /// Non-empty counts, in element order
    pub fn iter(&self) -> impl Iterator<Item = (Element, u32)> + '_ {
        Element::ALL
            .into_iter()
            .map(|e| (e, self.get(e)))
            .filter(|(_, n)| *n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_total() {
        let pool = StoneCounts::with_amounts(1, 2, 3, 4, 5);
        assert_eq!(pool.total(), 15);
        assert_eq!(StoneCounts::uniform(25).total(), 125);
    }

    #[test]
    fn test_add_capped() {
        let mut pool = StoneCounts::with_amounts(4, 0, 0, 0, 0);
        assert_eq!(pool.add_capped(Element::Earth, 3, 5), 1);
        assert_eq!(pool.earth, 5);
        assert_eq!(pool.add_capped(Element::Earth, 1, 5), 0);
    }

    #[test]
    fn test_take_one() {
        let mut pool = StoneCounts::with_amounts(0, 1, 0, 0, 0);
        assert!(pool.take_one(Element::Water));
        assert!(!pool.take_one(Element::Water));
        assert!(!pool.take_one(Element::Fire));
    }

    #[test]
    fn test_transfer_clamps_both_sides() {
        let mut source = StoneCounts::with_amounts(0, 0, 2, 0, 0);
        let mut player = StoneCounts::with_amounts(0, 0, 4, 0, 0);

        // Capacity clamps to 1
        assert_eq!(source.transfer_to(&mut player, Element::Fire, 3, 5), 1);
        assert_eq!(source.fire, 1);
        assert_eq!(player.fire, 5);

        // Source stock clamps to what's left
        let mut other = StoneCounts::new();
        assert_eq!(source.transfer_to(&mut other, Element::Fire, 3, 5), 1);
        assert_eq!(source.fire, 0);
        assert_eq!(source.fire + player.fire + other.fire, 6);
    }

    #[test]
    fn test_iter_skips_empty() {
        let pool = StoneCounts::with_amounts(0, 2, 0, 0, 1);
        let items: Vec<_> = pool.iter().collect();
        assert_eq!(items, vec![(Element::Water, 2), (Element::Void, 1)]);
    }
}
