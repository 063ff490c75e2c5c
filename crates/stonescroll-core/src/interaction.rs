//! Elemental interactions between neighboring stones.
//!
//! - Water mimics the highest-ranked neighboring element (advisory only)
//! - Water chains the ability of a wind or earth stone reachable through
//!   contiguous water
//! - A void neighbor nullifies fire, wind and earth
//! - Active fire destroys every non-void, non-fire neighbor

use crate::board::{Board, Element, Stone};
use crate::hex::HexCoord;
use crate::pool::StoneCounts;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Ability a water stone borrows through a chain of water
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainedAbility {
    Wind,
    Earth,
    None,
}

/// Whether the stone at `hex` has its ability switched off by a void neighbor.
///
/// Only fire, wind and earth can be nullified. Empty hexes are never nullified.
pub fn is_nullified(board: &Board, hex: &HexCoord) -> bool {
    match board.element_at(hex) {
        Some(Element::Fire | Element::Wind | Element::Earth) => {
            board.has_neighbor(hex, Element::Void)
        }
        _ => false,
    }
}

/// The element a stone presents to the player.
///
/// Non-water stones are what they are. Water takes the highest-ranked
/// neighboring element other than water, or stays water.
pub fn effective_type(board: &Board, hex: &HexCoord) -> Option<Element> {
    let element = board.element_at(hex)?;
    if element != Element::Water {
        return Some(element);
    }

    let mimicked = board
        .neighbor_stones(hex)
        .into_iter()
        .map(|s| s.element)
        .filter(|e| *e != Element::Water)
        .max_by_key(|e| e.mimicry_rank());

    Some(mimicked.unwrap_or(Element::Water))
}

/// Ability borrowed by the water stone at `hex`.
///
/// Flood-fills through water stones that have no void neighbor. Wind found
/// anywhere in the reachable set outranks earth. Returns `None` for non-water
/// hexes and for void-adjacent water.
pub fn chained_ability(board: &Board, hex: &HexCoord) -> ChainedAbility {
    let chainable = |h: &HexCoord| {
        board.element_at(h) == Some(Element::Water) && !board.has_neighbor(h, Element::Void)
    };

    if !chainable(hex) {
        return ChainedAbility::None;
    }

    let mut visited: HashSet<HexCoord> = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(*hex);
    queue.push_back(*hex);

    let mut found_earth = false;

    while let Some(current) = queue.pop_front() {
        for neighbor in current.neighbors() {
            match board.element_at(&neighbor) {
                Some(Element::Wind) if !is_nullified(board, &neighbor) => {
                    return ChainedAbility::Wind;
                }
                Some(Element::Earth) if !is_nullified(board, &neighbor) => {
                    found_earth = true;
                }
                Some(Element::Water) => {
                    if !visited.contains(&neighbor) && chainable(&neighbor) {
                        visited.insert(neighbor);
                        queue.push_back(neighbor);
                    }
                }
                _ => {}
            }
        }
    }

    if found_earth {
        ChainedAbility::Earth
    } else {
        ChainedAbility::None
    }
}

/// Hexes of every fire stone currently able to burn (sorted)
pub fn active_fires(board: &Board) -> Vec<HexCoord> {
    board
        .stones_of(Element::Fire)
        .into_iter()
        .filter(|hex| !is_nullified(board, hex))
        .collect()
}

/// Re-evaluate every fire stone and destroy what it burns.
///
/// Destroyed stones leave the board and go back to the source pool. Returns
/// the destroyed stones in destruction order (fires by hex, neighbors in
/// direction order). Destruction never removes a void, so one pass is enough.
pub fn recheck_all_stone_interactions(
    board: &mut Board,
    source_pool: &mut StoneCounts,
    source_capacity: u32,
) -> Vec<Stone> {
    let mut destroyed = Vec::new();

    for fire in active_fires(board) {
        // An earlier fire in this pass can't touch another fire, but check anyway
        if board.element_at(&fire) != Some(Element::Fire) {
            continue;
        }

        for neighbor in fire.neighbors() {
            let burns = matches!(
                board.element_at(&neighbor),
                Some(Element::Earth | Element::Water | Element::Wind)
            );
            if !burns {
                continue;
            }

            if let Some(stone) = board.remove_stone(&neighbor) {
                debug!(fire = %fire, target = %stone.hex, element = %stone.element, "fire destroyed stone");
                source_pool.return_stone(stone.element, source_capacity);
                destroyed.push(stone);
            }
        }
    }

    destroyed
}
