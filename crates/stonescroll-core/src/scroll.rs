//! Scroll definitions and pattern matching.
//!
//! A scroll can be cast when the caster stands at the center of one of its
//! pattern variants: every `{offset, element}` of the variant must hold a
//! stone of exactly that element. Variants are alternatives, and rotated
//! variants are generated once when the catalogue is built.

use crate::board::{Board, Element};
use crate::hex::{Direction, HexCoord};
use serde::{Deserialize, Serialize};

/// Level of every catacomb scroll
pub const CATACOMB_LEVEL: u8 = 2;

/// Stones of each element granted by the default catacomb effect
pub const CATACOMB_GRANT: u32 = 2;

/// The deck a scroll belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollElement {
    Element(Element),
    Catacomb,
}

impl ScrollElement {
    /// All six decks (and common-area slots)
    pub const ALL: [ScrollElement; 6] = [
        ScrollElement::Element(Element::Earth),
        ScrollElement::Element(Element::Water),
        ScrollElement::Element(Element::Fire),
        ScrollElement::Element(Element::Wind),
        ScrollElement::Element(Element::Void),
        ScrollElement::Catacomb,
    ];

    /// Position in `ALL`, used to index per-deck arrays
    pub fn index(&self) -> usize {
        match self {
            ScrollElement::Element(Element::Earth) => 0,
            ScrollElement::Element(Element::Water) => 1,
            ScrollElement::Element(Element::Fire) => 2,
            ScrollElement::Element(Element::Wind) => 3,
            ScrollElement::Element(Element::Void) => 4,
            ScrollElement::Catacomb => 5,
        }
    }
}

impl std::fmt::Display for ScrollElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrollElement::Element(e) => write!(f, "{}", e),
            ScrollElement::Catacomb => f.write_str("catacomb"),
        }
    }
}

/// One required stone of a pattern, relative to the caster's hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternStone {
    pub offset: HexCoord,
    pub element: Element,
}

impl PatternStone {
    pub const fn new(offset: HexCoord, element: Element) -> Self {
        Self { offset, element }
    }
}

/// A static scroll definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollDefinition {
    pub name: String,
    pub description: String,
    /// 1-5 for element scrolls, always 2 for catacomb scrolls
    pub level: u8,
    pub element: ScrollElement,
    /// Alternative patterns; any one satisfied is enough
    pub variants: Vec<Vec<PatternStone>>,
    /// Cancels the entry beneath it on the response stack
    pub can_counter_any: bool,
    /// May only be cast into an open response window
    pub is_response_only: bool,
}

impl ScrollDefinition {
    /// Elements recorded as activated when this scroll resolves.
    ///
    /// Catacomb scrolls count every element present in their pattern.
    pub fn activated_elements(&self) -> Vec<Element> {
        match self.element {
            ScrollElement::Element(e) => vec![e],
            ScrollElement::Catacomb => {
                let mut elements: Vec<Element> = self
                    .variants
                    .first()
                    .map(|v| v.iter().map(|p| p.element).collect())
                    .unwrap_or_default();
                elements.sort();
                elements.dedup();
                elements
            }
        }
    }

    /// Index of the first satisfied variant, if any
    pub fn matching_variant(&self, player_hex: HexCoord, board: &Board) -> Option<usize> {
        self.variants.iter().position(|variant| {
            variant
                .iter()
                .all(|req| board.element_at(&(player_hex + req.offset)) == Some(req.element))
        })
    }
}

/// Whether a player standing at `player_hex` satisfies any variant of `scroll`
pub fn matches(scroll: &ScrollDefinition, player_hex: HexCoord, board: &Board) -> bool {
    scroll.matching_variant(player_hex, board).is_some()
}

/// Rotate a base pattern by each of `steps` (×60°) into a list of variants
fn rotations(base: &[PatternStone], steps: &[i32]) -> Vec<Vec<PatternStone>> {
    steps
        .iter()
        .map(|s| {
            base.iter()
                .map(|p| PatternStone::new(p.offset.rotate(*s), p.element))
                .collect()
        })
        .collect()
}

/// Same element on each of `dirs`
fn ring_pattern(element: Element, dirs: &[Direction]) -> Vec<PatternStone> {
    dirs.iter()
        .map(|d| PatternStone::new(d.offset(), element))
        .collect()
}

/// Variants for an element scroll of `level`
fn element_variants(element: Element, level: u8) -> Vec<Vec<PatternStone>> {
    use Direction::*;
    match level {
        // One stone on any side
        1 => rotations(&ring_pattern(element, &[East]), &[0, 1, 2, 3, 4, 5]),
        // A pair on opposite sides
        2 => rotations(&ring_pattern(element, &[East, West]), &[0, 1, 2]),
        // Every other side
        3 => rotations(&ring_pattern(element, &[East, SouthWest, NorthWest]), &[0, 1]),
        // Two opposite pairs
        4 => rotations(
            &ring_pattern(element, &[East, West, SouthEast, NorthWest]),
            &[0, 1, 2],
        ),
        // All sides but one
        _ => rotations(
            &ring_pattern(element, &[East, SouthEast, SouthWest, West, NorthWest]),
            &[0, 1, 2, 3, 4, 5],
        ),
    }
}

/// The three catacomb rotations: 0°, 120°, 240°
fn catacomb_variants(base: &[PatternStone]) -> Vec<Vec<PatternStone>> {
    rotations(base, &[0, 2, 4])
}

/// The static scroll catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollCatalogue {
    scrolls: Vec<ScrollDefinition>,
}

impl ScrollCatalogue {
    /// Build a catalogue from definitions (names must be unique)
    pub fn new(scrolls: Vec<ScrollDefinition>) -> Self {
        Self { scrolls }
    }

    /// The standard set: five scrolls per element, three catacomb scrolls
    pub fn standard() -> Self {
        // (name, element, level, description, counters, response only)
        let table: [(&str, Element, u8, &str, bool, bool); 25] = [
            ("Stone Skin", Element::Earth, 1, "Gain an earth stone.", false, false),
            ("Bedrock", Element::Earth, 2, "Gain two earth stones.", false, false),
            ("Landslide", Element::Earth, 3, "Draw an earth scroll straight into your hand.", false, false),
            ("Mountain's Patience", Element::Earth, 4, "Gain four earth stones.", false, false),
            ("Tectonic Shift", Element::Earth, 5, "Gain five earth stones.", false, false),
            ("Ripple", Element::Water, 1, "Gain a water stone.", false, false),
            ("Undertow", Element::Water, 2, "Gain two water stones, then send this scroll to the common area.", false, false),
            ("Reflection", Element::Water, 3, "Repeat the stones granted by the last scroll you cast this turn.", false, false),
            ("Tidal Surge", Element::Water, 4, "Gain two action points.", false, false),
            ("Deluge", Element::Water, 5, "Gain five water stones.", false, false),
            ("Spark", Element::Fire, 1, "Gain a fire stone.", false, false),
            ("Kindle", Element::Fire, 2, "Casting costs one action point for the rest of the turn.", false, false),
            ("Wildfire", Element::Fire, 3, "Gain three fire stones.", false, false),
            ("Immolate", Element::Fire, 4, "Gain four fire stones.", false, false),
            ("Inferno", Element::Fire, 5, "Gain five fire stones.", false, false),
            ("Breeze", Element::Wind, 1, "Level-1 scrolls cost nothing for the rest of the turn.", false, false),
            ("Tailwind", Element::Wind, 2, "Earth and water count as wind for your movement this turn.", false, false),
            ("Gale Step", Element::Wind, 3, "Every other paid step is free this turn.", false, false),
            ("Cyclone", Element::Wind, 4, "Gain four wind stones.", false, false),
            ("Tempest", Element::Wind, 5, "Gain five wind stones.", false, false),
            ("Hush", Element::Void, 1, "Gain one action point.", false, false),
            ("Nullify", Element::Void, 2, "Counter the scroll beneath this one.", true, true),
            ("Echo of Nothing", Element::Void, 3, "Gain three void stones.", false, false),
            ("Unmake", Element::Void, 4, "Counter the scroll beneath this one.", true, false),
            ("Oblivion", Element::Void, 5, "Gain five void stones.", false, false),
        ];

        let mut scrolls: Vec<ScrollDefinition> = table
            .iter()
            .map(|(name, element, level, description, counters, response_only)| {
                ScrollDefinition {
                    name: (*name).to_string(),
                    description: (*description).to_string(),
                    level: *level,
                    element: ScrollElement::Element(*element),
                    variants: element_variants(*element, *level),
                    can_counter_any: *counters,
                    is_response_only: *response_only,
                }
            })
            .collect();

        use Direction::*;
        let catacombs = [
            (
                "Ossuary Rite",
                [(East, Element::Earth), (SouthWest, Element::Water), (NorthWest, Element::Fire)],
            ),
            (
                "Bone Lantern",
                [(NorthEast, Element::Wind), (West, Element::Void), (SouthEast, Element::Fire)],
            ),
            (
                "Crypt Ward",
                [(NorthEast, Element::Earth), (West, Element::Wind), (SouthEast, Element::Water)],
            ),
        ];

        for (name, base) in catacombs {
            let base: Vec<PatternStone> = base
                .iter()
                .map(|(dir, element)| PatternStone::new(dir.offset(), *element))
                .collect();
            scrolls.push(ScrollDefinition {
                name: name.to_string(),
                description: "Gain two stones of each element in the pattern.".to_string(),
                level: CATACOMB_LEVEL,
                element: ScrollElement::Catacomb,
                variants: catacomb_variants(&base),
                can_counter_any: false,
                is_response_only: false,
            });
        }

        Self::new(scrolls)
    }

    /// Look up a scroll by name
    pub fn get(&self, name: &str) -> Option<&ScrollDefinition> {
        self.scrolls.iter().find(|s| s.name == name)
    }

    /// All scrolls in catalogue order
    pub fn iter(&self) -> impl Iterator<Item = &ScrollDefinition> {
        self.scrolls.iter()
    }

    /// Scrolls belonging to one deck
    pub fn scrolls_of(&self, element: ScrollElement) -> Vec<&ScrollDefinition> {
        self.scrolls.iter().filter(|s| s.element == element).collect()
    }

    /// Names of the scrolls in `candidates` whose pattern holds at `player_hex`
    pub fn castable_at<'a, I>(&self, candidates: I, player_hex: HexCoord, board: &Board) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        candidates
            .into_iter()
            .filter(|name| {
                self.get(name)
                    .map(|def| matches(def, player_hex, board))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

impl Default for ScrollCatalogue {
    fn default() -> Self {
        Self::standard()
    }
}
