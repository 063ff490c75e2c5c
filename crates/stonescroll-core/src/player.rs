//! Player state and scroll collections.
//!
//! This module contains:
//! - Player struct with position, AP, stone pool and turn buffs
//! - PlayerScrolls (hand, active area, activated elements)
//! - The shared common area and the six scroll decks
//! - The pending cascade raised when a draw overflows a full hand

use crate::ap::{ApState, TurnBuffs};
use crate::board::{Element, PlayerId};
use crate::hex::HexCoord;
use crate::pool::StoneCounts;
use crate::scroll::{ScrollCatalogue, ScrollElement};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Where a player keeps a scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollLocation {
    Hand,
    Active,
}

/// A player's scrolls and the elements they have activated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScrolls {
    pub hand: Vec<String>,
    pub active: Vec<String>,
    /// Elements activated so far; all five wins the game
    pub activated: BTreeSet<Element>,
}

impl PlayerScrolls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where this player holds `name`, if anywhere
    pub fn location(&self, name: &str) -> Option<ScrollLocation> {
        if self.hand.iter().any(|s| s == name) {
            Some(ScrollLocation::Hand)
        } else if self.active.iter().any(|s| s == name) {
            Some(ScrollLocation::Active)
        } else {
            None
        }
    }

    /// Add to the hand. Returns false for a duplicate name.
    pub fn add_to_hand(&mut self, name: String) -> bool {
        if self.location(&name).is_some() {
            return false;
        }
        self.hand.push(name);
        true
    }

    /// Add to the active area. Returns false for a duplicate name.
    pub fn add_to_active(&mut self, name: String) -> bool {
        if self.location(&name).is_some() {
            return false;
        }
        self.active.push(name);
        true
    }

    /// Take a scroll out of hand or active area
    pub fn remove(&mut self, name: &str) -> Option<ScrollLocation> {
        if let Some(i) = self.hand.iter().position(|s| s == name) {
            self.hand.remove(i);
            return Some(ScrollLocation::Hand);
        }
        if let Some(i) = self.active.iter().position(|s| s == name) {
            self.active.remove(i);
            return Some(ScrollLocation::Active);
        }
        None
    }

    /// Record activated elements. Returns the ones that are new.
    pub fn record_activation(&mut self, elements: &[Element]) -> Vec<Element> {
        elements
            .iter()
            .filter(|e| self.activated.insert(**e))
            .copied()
            .collect()
    }

    pub fn has_all_elements(&self) -> bool {
        Element::ALL.iter().all(|e| self.activated.contains(e))
    }

    /// Hand or active area holds more than allowed
    pub fn is_overflowing(&self, hand_capacity: usize, active_capacity: usize) -> bool {
        self.hand.len() > hand_capacity || self.active.len() > active_capacity
    }
}

/// A player in the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Hex the player's token stands on
    pub position: HexCoord,
    pub ap: ApState,
    pub pool: StoneCounts,
    pub buffs: TurnBuffs,
    pub scrolls: PlayerScrolls,
    /// Last scroll this player resolved during the current turn
    pub previous_scroll: Option<String>,
}

impl Player {
    /// Create a new player standing at `position`
    pub fn new(id: PlayerId, name: String, position: HexCoord) -> Self {
        Self {
            id,
            name,
            position,
            ap: ApState::default(),
            pool: StoneCounts::new(),
            buffs: TurnBuffs::default(),
            scrolls: PlayerScrolls::new(),
            previous_scroll: None,
        }
    }

    /// Void stones in the pool, the ceiling for void AP
    pub fn void_stones(&self) -> u32 {
        self.pool.void
    }

    /// Scrolls this player could cast from their own collection
    pub fn castable_candidates(&self) -> &[String] {
        &self.scrolls.active
    }

    /// Reset turn-scoped state
    pub fn end_turn(&mut self) {
        self.buffs.clear();
        self.previous_scroll = None;
    }
}

/// The shared common area: one slot per scroll element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonArea {
    slots: [Option<String>; 6],
}

impl CommonArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scroll in one element's slot
    pub fn get(&self, element: ScrollElement) -> Option<&String> {
        self.slots[element.index()].as_ref()
    }

    /// Slot holding `name`, if any
    pub fn slot_of(&self, name: &str) -> Option<ScrollElement> {
        ScrollElement::ALL
            .into_iter()
            .find(|e| self.slots[e.index()].as_deref() == Some(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slot_of(name).is_some()
    }

    /// Put a scroll in its slot. Returns the scroll it displaced.
    pub fn place(&mut self, element: ScrollElement, name: String) -> Option<String> {
        self.slots[element.index()].replace(name)
    }

    /// Take a scroll out. Returns the slot it was in.
    pub fn remove(&mut self, name: &str) -> Option<ScrollElement> {
        let slot = self.slot_of(name)?;
        self.slots[slot.index()] = None;
        Some(slot)
    }

    /// All scrolls on display, in slot order
    pub fn scrolls(&self) -> impl Iterator<Item = &String> {
        self.slots.iter().flatten()
    }
}

/// The six scroll decks, drawn from the front
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollDecks {
    decks: [VecDeque<String>; 6],
}

impl ScrollDecks {
    /// Empty decks
    pub fn new() -> Self {
        Self::default()
    }

    /// One shuffled deck per scroll element from the catalogue
    pub fn from_catalogue<R: Rng>(catalogue: &ScrollCatalogue, rng: &mut R) -> Self {
        let mut decks = Self::new();
        for element in ScrollElement::ALL {
            let mut names: Vec<String> = catalogue
                .scrolls_of(element)
                .into_iter()
                .map(|s| s.name.clone())
                .collect();
            names.shuffle(rng);
            decks.decks[element.index()] = names.into();
        }
        decks
    }

    /// Draw the top scroll of a deck
    pub fn draw(&mut self, element: ScrollElement) -> Option<String> {
        self.decks[element.index()].pop_front()
    }

    /// Return a scroll to the bottom of its deck
    pub fn put_bottom(&mut self, element: ScrollElement, name: String) {
        self.decks[element.index()].push_back(name);
    }

    /// Replace one deck's contents, top first (tests and custom setups)
    pub fn set_deck(&mut self, element: ScrollElement, names: Vec<String>) {
        self.decks[element.index()] = names.into();
    }

    pub fn len(&self, element: ScrollElement) -> usize {
        self.decks[element.index()].len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decks.iter().any(|d| d.iter().any(|s| s == name))
    }

    /// Scrolls left in one deck, top first
    pub fn deck(&self, element: ScrollElement) -> impl Iterator<Item = &String> {
        self.decks[element.index()].iter()
    }
}

/// Where a cascading scroll is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CascadeDestination {
    Active,
    Common,
}

/// A draw that found the hand full and waits for the player's choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCascade {
    pub player: PlayerId,
    /// The scroll just drawn (held by nobody until the cascade resolves)
    pub drawn: String,
    /// The active area has room for one more
    pub can_cascade_to_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_scroll_names_are_unique_per_player() {
        let mut scrolls = PlayerScrolls::new();
        assert!(scrolls.add_to_hand("Spark".into()));
        assert!(!scrolls.add_to_hand("Spark".into()));
        assert!(!scrolls.add_to_active("Spark".into()));
        assert_eq!(scrolls.location("Spark"), Some(ScrollLocation::Hand));

        assert_eq!(scrolls.remove("Spark"), Some(ScrollLocation::Hand));
        assert!(scrolls.add_to_active("Spark".into()));
        assert_eq!(scrolls.location("Spark"), Some(ScrollLocation::Active));
    }

    #[test]
    fn test_overflow() {
        let mut scrolls = PlayerScrolls::new();
        scrolls.add_to_hand("a".into());
        scrolls.add_to_hand("b".into());
        assert!(!scrolls.is_overflowing(2, 2));
        scrolls.add_to_hand("c".into());
        assert!(scrolls.is_overflowing(2, 2));
    }

    #[test]
    fn test_record_activation() {
        let mut scrolls = PlayerScrolls::new();
        assert_eq!(
            scrolls.record_activation(&[Element::Fire, Element::Earth]),
            vec![Element::Fire, Element::Earth]
        );
        assert!(scrolls.record_activation(&[Element::Fire]).is_empty());
        assert!(!scrolls.has_all_elements());

        scrolls.record_activation(&[Element::Water, Element::Wind, Element::Void]);
        assert!(scrolls.has_all_elements());
    }

    #[test]
    fn test_common_area_bumps() {
        let mut common = CommonArea::new();
        let fire = ScrollElement::Element(Element::Fire);
        assert_eq!(common.place(fire, "Spark".into()), None);
        assert_eq!(common.place(fire, "Kindle".into()), Some("Spark".to_string()));
        assert!(common.contains("Kindle"));
        assert!(!common.contains("Spark"));
        assert_eq!(common.remove("Kindle"), Some(fire));
        assert_eq!(common.scrolls().count(), 0);
    }

    #[test]
    fn test_decks_from_catalogue() {
        let catalogue = ScrollCatalogue::standard();
        let mut decks = ScrollDecks::from_catalogue(&catalogue, &mut StdRng::seed_from_u64(3));
        assert_eq!(decks.len(ScrollElement::Catacomb), 3);
        assert_eq!(decks.len(ScrollElement::Element(Element::Void)), 5);

        let drawn = decks.draw(ScrollElement::Catacomb).unwrap();
        assert_eq!(decks.len(ScrollElement::Catacomb), 2);
        assert!(!decks.contains(&drawn));

        decks.put_bottom(ScrollElement::Catacomb, drawn.clone());
        assert_eq!(decks.deck(ScrollElement::Catacomb).last(), Some(&drawn));
    }
}
