//! Board representation: tiles, stones, and the shrine deck.
//!
//! This module contains:
//! - The five elements and the shrine kinds a tile can carry
//! - Tiles (19-cell hexagons that are revealed as players explore)
//! - Placed stones, at most one per hex
//! - Board queries used by the interaction engine and the path search

use crate::hex::{Direction, HexCoord};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Player identifier (index into the player list)
pub type PlayerId = u8;

/// Tile identifier
pub type TileId = u32;

/// Stone identifier
pub type StoneId = u32;

/// Radius of a tile measured in hex cells from its origin
pub const TILE_RADIUS: u32 = 2;

/// Distance between the origins of two neighboring tiles
pub const TILE_SPACING: i32 = 4;

/// The five stone elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Earth,
    Water,
    Fire,
    Wind,
    Void,
}

impl Element {
    /// All elements
    pub const ALL: [Element; 5] = [
        Element::Earth,
        Element::Water,
        Element::Fire,
        Element::Wind,
        Element::Void,
    ];

    /// Priority used when a water stone mimics its neighbors.
    ///
    /// void(1) < wind(2) < fire(3) < water(4) < earth(5)
    pub fn mimicry_rank(&self) -> u8 {
        match self {
            Element::Void => 1,
            Element::Wind => 2,
            Element::Fire => 3,
            Element::Water => 4,
            Element::Earth => 5,
        }
    }

    /// Lowercase name used in status messages
    pub fn name(&self) -> &'static str {
        match self {
            Element::Earth => "earth",
            Element::Water => "water",
            Element::Fire => "fire",
            Element::Wind => "wind",
            Element::Void => "void",
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What sits at the center of a revealed tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shrine {
    /// Replenishes this element's stones for a player ending a turn on it
    Element(Element),
    /// Draws from the catacomb scroll deck
    Catacomb,
    /// A player's home tile
    Player,
}

impl Shrine {
    /// The shrine deck: one card per element and two catacombs
    pub fn standard_deck() -> Vec<Shrine> {
        let mut deck: Vec<Shrine> = Element::ALL.iter().map(|e| Shrine::Element(*e)).collect();
        deck.push(Shrine::Catacomb);
        deck.push(Shrine::Catacomb);
        deck
    }
}

/// A board tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    /// Center cell of the tile
    pub origin: HexCoord,
    /// Rotation in 60° steps (0-5), kept for the renderer
    pub rotation: u8,
    pub revealed: bool,
    /// Assigned on reveal; home tiles carry `Shrine::Player` from the start
    pub shrine: Option<Shrine>,
    pub owner: Option<PlayerId>,
}

impl Tile {
    /// Create an unrevealed tile
    pub fn hidden(id: TileId, origin: HexCoord, rotation: u8) -> Self {
        Self {
            id,
            origin,
            rotation: rotation % 6,
            revealed: false,
            shrine: None,
            owner: None,
        }
    }

    /// Create a player's home tile (always revealed, never draws a shrine)
    pub fn home(id: TileId, origin: HexCoord, owner: PlayerId) -> Self {
        Self {
            id,
            origin,
            rotation: 0,
            revealed: true,
            shrine: Some(Shrine::Player),
            owner: Some(owner),
        }
    }

    /// The six shared edge cells (ring-2 corners)
    pub fn edge_cells(&self) -> [HexCoord; 6] {
        Direction::ALL.map(|dir| self.origin + dir.offset().scale(TILE_RADIUS as i32))
    }

    /// All 19 cells of the tile
    pub fn all_cells(&self) -> Vec<HexCoord> {
        self.origin.spiral(TILE_RADIUS)
    }

    /// Cells currently exposed: all 19 once revealed, the 6 edge cells before
    pub fn visible_cells(&self) -> Vec<HexCoord> {
        if self.revealed {
            self.all_cells()
        } else {
            self.edge_cells().to_vec()
        }
    }

    /// Whether `hex` is one of the exposed cells
    pub fn covers(&self, hex: &HexCoord) -> bool {
        let distance = self.origin.distance_to(hex);
        if self.revealed {
            distance <= TILE_RADIUS
        } else {
            self.edge_cells().contains(hex)
        }
    }

    /// Whether this tile's shrine sits at `hex`
    pub fn is_shrine_cell(&self, hex: &HexCoord) -> bool {
        self.revealed && self.origin == *hex
    }
}

/// A stone placed on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stone {
    pub id: StoneId,
    pub hex: HexCoord,
    pub element: Element,
}

/// The game board: tiles and stones
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    /// All tiles indexed by id
    tiles: BTreeMap<TileId, Tile>,
    /// Stones indexed by the hex they occupy
    #[serde(with = "stone_map")]
    stones: HashMap<HexCoord, Stone>,
    /// Undrawn shrine cards
    shrine_deck: Vec<Shrine>,
    next_stone_id: StoneId,
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the standard layout with a provided RNG.
    ///
    /// A center tile plus a ring of six tiles, spaced so neighboring tiles
    /// share one edge cell. Home tiles are spread evenly over the ring.
    pub fn standard_with_rng<R: Rng>(player_count: u8, rng: &mut R) -> Self {
        let mut board = Self::new();

        let mut shrine_deck = Shrine::standard_deck();
        shrine_deck.shuffle(rng);
        board.shrine_deck = shrine_deck;

        board.add_tile(Tile::hidden(0, HexCoord::ORIGIN, rng.gen_range(0..6)));

        let player_count = player_count.max(1) as usize;
        let home_slots: Vec<usize> = (0..player_count).map(|p| p * 6 / player_count).collect();

        for (slot, dir) in Direction::ALL.iter().enumerate() {
            let id = slot as TileId + 1;
            let origin = dir.offset().scale(TILE_SPACING);
            let tile = match home_slots.iter().position(|s| *s == slot) {
                Some(player) => Tile::home(id, origin, player as PlayerId),
                None => Tile::hidden(id, origin, rng.gen_range(0..6)),
            };
            board.add_tile(tile);
        }

        board
    }

    /// Add a tile (replaces any tile with the same id)
    pub fn add_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.id, tile);
    }

    /// Replace the shrine deck (tests and custom layouts)
    pub fn set_shrine_deck(&mut self, deck: Vec<Shrine>) {
        self.shrine_deck = deck;
    }

    /// Get a tile by id
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    /// All tiles in id order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// The home tile of a player
    pub fn home_tile(&self, player: PlayerId) -> Option<&Tile> {
        self.tiles.values().find(|t| t.owner == Some(player))
    }

    /// The tile exposing `hex`, preferring revealed tiles where edge cells overlap
    pub fn tile_at_cell(&self, hex: &HexCoord) -> Option<&Tile> {
        self.tiles
            .values()
            .filter(|t| t.covers(hex))
            .max_by_key(|t| (t.revealed, std::cmp::Reverse(t.id)))
    }

    /// Unrevealed tile whose edge cell is `hex`, if any
    pub fn hidden_tile_at_cell(&self, hex: &HexCoord) -> Option<TileId> {
        self.tiles
            .values()
            .find(|t| !t.revealed && t.covers(hex))
            .map(|t| t.id)
    }

    /// Whether a token can stand on or pass through `hex`
    pub fn is_walkable(&self, hex: &HexCoord) -> bool {
        self.tile_at_cell(hex).is_some()
    }

    /// Whether `hex` is a cell of a revealed tile
    pub fn is_revealed_cell(&self, hex: &HexCoord) -> bool {
        self.tiles.values().any(|t| t.revealed && t.covers(hex))
    }

    /// Reveal a tile and draw its shrine. Returns the shrine, or `None` if
    /// the tile was already revealed or does not exist.
    pub fn reveal_tile(&mut self, id: TileId) -> Option<Shrine> {
        let tile = self.tiles.get_mut(&id)?;
        if tile.revealed {
            return None;
        }

        tile.revealed = true;
        if tile.owner.is_some() {
            warn!(tile = id, "owned tile was unrevealed, revealing without a shrine draw");
            return tile.shrine;
        }

        // Empty deck degrades to a catacomb shrine
        let shrine = self.shrine_deck.pop().unwrap_or(Shrine::Catacomb);
        tile.shrine = Some(shrine);
        Some(shrine)
    }

    /// The stone at `hex`, if any
    pub fn stone_at(&self, hex: &HexCoord) -> Option<&Stone> {
        self.stones.get(hex)
    }

    /// Element of the stone at `hex`, if any
    pub fn element_at(&self, hex: &HexCoord) -> Option<Element> {
        self.stones.get(hex).map(|s| s.element)
    }

    /// Stones on the six neighbors of `hex`
    pub fn neighbor_stones(&self, hex: &HexCoord) -> Vec<&Stone> {
        hex.neighbors()
            .iter()
            .filter_map(|n| self.stones.get(n))
            .collect()
    }

    /// Whether any neighbor of `hex` holds a stone of `element`
    pub fn has_neighbor(&self, hex: &HexCoord, element: Element) -> bool {
        hex.neighbors()
            .iter()
            .any(|n| self.element_at(n) == Some(element))
    }

    /// Place a stone. Fails (returns `None`) if the hex is already occupied.
    pub fn insert_stone(&mut self, hex: HexCoord, element: Element) -> Option<Stone> {
        if self.stones.contains_key(&hex) {
            return None;
        }

        let stone = Stone {
            id: self.next_stone_id,
            hex,
            element,
        };
        self.next_stone_id += 1;
        self.stones.insert(hex, stone);
        Some(stone)
    }

    /// Remove the stone at `hex`
    pub fn remove_stone(&mut self, hex: &HexCoord) -> Option<Stone> {
        self.stones.remove(hex)
    }

    /// All stones, sorted by hex for deterministic iteration
    pub fn stones(&self) -> Vec<&Stone> {
        let mut stones: Vec<&Stone> = self.stones.values().collect();
        stones.sort_by_key(|s| s.hex);
        stones
    }

    /// Hexes holding a stone of `element`, sorted
    pub fn stones_of(&self, element: Element) -> Vec<HexCoord> {
        let mut hexes: Vec<HexCoord> = self
            .stones
            .values()
            .filter(|s| s.element == element)
            .map(|s| s.hex)
            .collect();
        hexes.sort();
        hexes
    }

    /// Number of stones of `element` on the board
    pub fn count_of(&self, element: Element) -> u32 {
        self.stones.values().filter(|s| s.element == element).count() as u32
    }
}

/// JSON object keys must be strings, so the stone map travels as a list
mod stone_map {
    use super::{HexCoord, Stone};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        map: &HashMap<HexCoord, Stone>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut stones: Vec<&Stone> = map.values().collect();
        stones.sort_by_key(|s| s.hex);
        stones.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<HexCoord, Stone>, D::Error> {
        let stones = Vec::<Stone>::deserialize(deserializer)?;
        Ok(stones.into_iter().map(|s| (s.hex, s)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board(players: u8) -> Board {
        Board::standard_with_rng(players, &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_standard_board_tiles() {
        let board = board(2);
        assert_eq!(board.tiles().count(), 7);

        let homes: Vec<_> = board.tiles().filter(|t| t.owner.is_some()).collect();
        assert_eq!(homes.len(), 2);
        for home in homes {
            assert!(home.revealed);
            assert_eq!(home.shrine, Some(Shrine::Player));
        }

        // Home tiles sit on opposite sides of the ring
        let a = board.home_tile(0).unwrap().origin;
        let b = board.home_tile(1).unwrap().origin;
        assert_eq!(a.distance_to(&b), 8);
    }

    #[test]
    fn test_tile_cells() {
        let tile = Tile::hidden(9, HexCoord::new(4, 0), 0);
        assert_eq!(tile.all_cells().len(), 19);
        assert_eq!(tile.visible_cells().len(), 6);
        assert!(tile.covers(&HexCoord::new(6, 0)));
        assert!(!tile.covers(&HexCoord::new(4, 0)));

        let home = Tile::home(1, HexCoord::new(4, 0), 0);
        assert_eq!(home.visible_cells().len(), 19);
        assert!(home.covers(&HexCoord::new(4, 0)));
        assert!(home.is_shrine_cell(&HexCoord::new(4, 0)));
    }

    #[test]
    fn test_neighboring_tiles_share_edge_cell() {
        let center = Tile::hidden(0, HexCoord::ORIGIN, 0);
        let east = Tile::hidden(1, HexCoord::new(TILE_SPACING, 0), 0);
        let shared: Vec<_> = center
            .edge_cells()
            .into_iter()
            .filter(|c| east.edge_cells().contains(c))
            .collect();
        assert_eq!(shared, vec![HexCoord::new(2, 0)]);
    }

    #[test]
    fn test_reveal_draws_shrine_once() {
        let mut board = board(2);
        board.set_shrine_deck(vec![Shrine::Element(Element::Fire)]);

        let hidden = board.tiles().find(|t| !t.revealed).unwrap().id;
        assert_eq!(board.reveal_tile(hidden), Some(Shrine::Element(Element::Fire)));
        assert_eq!(board.reveal_tile(hidden), None);

        // Deck is empty now: next reveal falls back to a catacomb
        let next = board.tiles().find(|t| !t.revealed).unwrap().id;
        assert_eq!(board.reveal_tile(next), Some(Shrine::Catacomb));
    }

    #[test]
    fn test_one_stone_per_hex() {
        let mut board = Board::new();
        let hex = HexCoord::new(1, 1);
        assert!(board.insert_stone(hex, Element::Earth).is_some());
        assert!(board.insert_stone(hex, Element::Fire).is_none());
        assert_eq!(board.element_at(&hex), Some(Element::Earth));

        let removed = board.remove_stone(&hex).unwrap();
        assert_eq!(removed.element, Element::Earth);
        assert!(board.stone_at(&hex).is_none());
    }

    #[test]
    fn test_neighbor_queries() {
        let mut board = Board::new();
        let center = HexCoord::ORIGIN;
        board.insert_stone(HexCoord::new(1, 0), Element::Void);
        board.insert_stone(HexCoord::new(0, 1), Element::Fire);
        board.insert_stone(HexCoord::new(3, 0), Element::Void);

        assert_eq!(board.neighbor_stones(&center).len(), 2);
        assert!(board.has_neighbor(&center, Element::Void));
        assert!(!board.has_neighbor(&center, Element::Earth));
        assert_eq!(board.count_of(Element::Void), 2);
    }

    #[test]
    fn test_board_serializes_stones_as_list() {
        let mut board = Board::new();
        board.insert_stone(HexCoord::new(1, 0), Element::Water);
        let json = serde_json::to_string(&board).unwrap();
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back.element_at(&HexCoord::new(1, 0)), Some(Element::Water));
    }
}
