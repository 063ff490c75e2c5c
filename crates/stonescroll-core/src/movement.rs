//! Movement costs and path finding.
//!
//! The cost of entering a hex depends on the stone there and on the
//! interaction engine (nullification, chained water). Paths add step costs
//! left to right, with the alternating-free-step buff applied through a
//! single banked flag.

use crate::board::{Board, Element};
use crate::hex::HexCoord;
use crate::interaction::{chained_ability, is_nullified, ChainedAbility};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use thiserror::Error;

/// Why a hex cannot be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReason {
    /// Another player's token stands there
    Occupied,
    /// Not a visible cell of any tile
    OffBoard,
    /// Active earth stone
    Earth,
    /// Water chained to an active earth stone
    ChainedEarth,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BlockReason::Occupied => "occupied by another player",
            BlockReason::OffBoard => "not on the board",
            BlockReason::Earth => "blocked by earth",
            BlockReason::ChainedEarth => "blocked by water chained to earth",
        };
        f.write_str(text)
    }
}

/// Result of evaluating a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepCost {
    Blocked(BlockReason),
    Cost(u32),
}

impl StepCost {
    pub fn can_move(&self) -> bool {
        matches!(self, StepCost::Cost(_))
    }
}

/// Errors while validating or building a path
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Step to {0} is not adjacent")]
    NotAdjacent(HexCoord),

    #[error("Cannot enter {hex}: {reason}")]
    Blocked { hex: HexCoord, reason: BlockReason },

    #[error("Path costs {cost} AP but only {available} available")]
    CannotAfford { cost: u32, available: u32 },

    #[error("Cannot end movement on a stone at {0}")]
    CannotLand(HexCoord),

    #[error("No route to {0}")]
    NoRoute(HexCoord),
}

/// Everything the step cost function looks at
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    pub board: &'a Board,
    /// Hexes holding other players' tokens
    pub occupied: &'a [HexCoord],
    /// Mover's earth/water-as-wind buff
    pub earth_water_as_wind: bool,
}

impl<'a> MoveContext<'a> {
    pub fn new(board: &'a Board, occupied: &'a [HexCoord], earth_water_as_wind: bool) -> Self {
        Self {
            board,
            occupied,
            earth_water_as_wind,
        }
    }

    /// Cost of entering `target`. Pure function of the board.
    pub fn step_cost(&self, target: &HexCoord) -> StepCost {
        if self.occupied.contains(target) {
            return StepCost::Blocked(BlockReason::Occupied);
        }
        if !self.board.is_walkable(target) {
            return StepCost::Blocked(BlockReason::OffBoard);
        }

        let Some(element) = self.board.element_at(target) else {
            return StepCost::Cost(1);
        };

        match element {
            // The buff applies before nullification is looked at
            Element::Earth | Element::Water if self.earth_water_as_wind => StepCost::Cost(0),
            Element::Earth => {
                if is_nullified(self.board, target) {
                    StepCost::Cost(1)
                } else {
                    StepCost::Blocked(BlockReason::Earth)
                }
            }
            Element::Wind => {
                if is_nullified(self.board, target) {
                    StepCost::Cost(1)
                } else {
                    StepCost::Cost(0)
                }
            }
            Element::Water => match chained_ability(self.board, target) {
                ChainedAbility::Wind => StepCost::Cost(0),
                ChainedAbility::Earth => StepCost::Blocked(BlockReason::ChainedEarth),
                ChainedAbility::None => StepCost::Cost(2),
            },
            Element::Fire | Element::Void => StepCost::Cost(1),
        }
    }
}

/// Whether a token may end its movement on `hex` (empty or void only)
pub fn can_land(board: &Board, hex: &HexCoord) -> bool {
    matches!(board.element_at(hex), None | Some(Element::Void))
}

/// Apply the alternating-free-step bank to one step's raw cost.
///
/// Zero-cost steps never touch the bank. A nonzero step is free if a free
/// step is banked (clearing it); otherwise it pays and banks one.
pub fn apply_bank(cost: u32, alternating: bool, banked: &mut bool) -> u32 {
    if !alternating || cost == 0 {
        return cost;
    }
    if *banked {
        *banked = false;
        0
    } else {
        *banked = true;
        cost
    }
}

/// Cost breakdown of a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCost {
    /// AP actually charged per step
    pub steps: Vec<u32>,
    pub total: u32,
    /// Bank state after the last step
    pub banked_after: bool,
}

/// Cost of walking `path` (excluding `start`) step by step.
pub fn path_cost(
    ctx: &MoveContext<'_>,
    start: HexCoord,
    path: &[HexCoord],
    alternating: bool,
    banked: bool,
) -> Result<PathCost, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let mut banked = banked;
    let mut previous = start;
    let mut steps = Vec::with_capacity(path.len());

    for hex in path {
        if !previous.is_adjacent(hex) {
            return Err(PathError::NotAdjacent(*hex));
        }
        match ctx.step_cost(hex) {
            StepCost::Blocked(reason) => return Err(PathError::Blocked { hex: *hex, reason }),
            StepCost::Cost(cost) => steps.push(apply_bank(cost, alternating, &mut banked)),
        }
        previous = *hex;
    }

    Ok(PathCost {
        total: steps.iter().sum(),
        steps,
        banked_after: banked,
    })
}

/// Incremental path built one neighbor at a time (free-form dragging).
///
/// Each extension is checked against the AP budget before it is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathBuilder {
    start: HexCoord,
    budget: u32,
    alternating: bool,
    banked: bool,
    /// (hex, AP charged, bank state before the step)
    steps: Vec<(HexCoord, u32, bool)>,
    total: u32,
}

impl PathBuilder {
    pub fn new(start: HexCoord, budget: u32, alternating: bool, banked: bool) -> Self {
        Self {
            start,
            budget,
            alternating,
            banked,
            steps: Vec::new(),
            total: 0,
        }
    }

    /// Current end of the path
    pub fn head(&self) -> HexCoord {
        self.steps.last().map(|(h, _, _)| *h).unwrap_or(self.start)
    }

    /// Hexes of the path so far (excluding the start)
    pub fn hexes(&self) -> Vec<HexCoord> {
        self.steps.iter().map(|(h, _, _)| *h).collect()
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Bank state after the last committed step
    pub fn banked(&self) -> bool {
        self.banked
    }

    /// Extend the path by one neighbor. Returns the AP charged for the step.
    pub fn try_extend(&mut self, ctx: &MoveContext<'_>, hex: HexCoord) -> Result<u32, PathError> {
        if !self.head().is_adjacent(&hex) {
            return Err(PathError::NotAdjacent(hex));
        }

        let raw = match ctx.step_cost(&hex) {
            StepCost::Blocked(reason) => return Err(PathError::Blocked { hex, reason }),
            StepCost::Cost(cost) => cost,
        };

        let mut banked = self.banked;
        let charged = apply_bank(raw, self.alternating, &mut banked);
        if self.total + charged > self.budget {
            return Err(PathError::CannotAfford {
                cost: self.total + charged,
                available: self.budget,
            });
        }

        self.steps.push((hex, charged, self.banked));
        self.banked = banked;
        self.total += charged;
        Ok(charged)
    }

    /// Drop the last step (dragging back). Returns the removed hex.
    pub fn retract(&mut self) -> Option<HexCoord> {
        let (hex, charged, banked_before) = self.steps.pop()?;
        self.total -= charged;
        self.banked = banked_before;
        Some(hex)
    }
}

/// A cheapest route between two hexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Hexes after the start, ending at the goal
    pub path: Vec<HexCoord>,
    pub cost: u32,
    pub banked_after: bool,
}

/// Cheapest route from `start` to `goal` using the same step costs.
///
/// Searches over (hex, bank) states so the alternating buff is priced
/// exactly. Ties break by discovery order, which follows the fixed neighbor
/// order, so results are deterministic. The search stays on walkable cells.
pub fn shortest_path(
    ctx: &MoveContext<'_>,
    start: HexCoord,
    goal: HexCoord,
    alternating: bool,
    banked: bool,
) -> Option<Route> {
    if start == goal {
        return None;
    }

    type State = (HexCoord, bool);

    let mut best: HashMap<State, u32> = HashMap::new();
    let mut came_from: HashMap<State, State> = HashMap::new();
    let mut heap = BinaryHeap::new();
    let mut sequence: u64 = 0;

    let origin: State = (start, banked);
    best.insert(origin, 0);
    heap.push(Reverse((0u32, sequence, origin)));

    while let Some(Reverse((cost, _, state))) = heap.pop() {
        if best.get(&state).is_some_and(|b| *b < cost) {
            continue;
        }

        let (hex, bank) = state;
        if hex == goal {
            let mut path = vec![hex];
            let mut cursor = state;
            while let Some(prev) = came_from.get(&cursor) {
                if *prev == origin {
                    break;
                }
                path.push(prev.0);
                cursor = *prev;
            }
            path.reverse();
            return Some(Route {
                path,
                cost,
                banked_after: bank,
            });
        }

        for neighbor in hex.neighbors() {
            let StepCost::Cost(raw) = ctx.step_cost(&neighbor) else {
                continue;
            };

            let mut next_bank = bank;
            let next_cost = cost + apply_bank(raw, alternating, &mut next_bank);
            let next: State = (neighbor, next_bank);

            if best.get(&next).map_or(true, |b| next_cost < *b) {
                best.insert(next, next_cost);
                came_from.insert(next, state);
                sequence += 1;
                heap.push(Reverse((next_cost, sequence, next)));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Tile;

    /// Two revealed tiles, at the origin and at (4, 0)
    fn open_board() -> Board {
        let mut board = Board::new();
        board.add_tile(Tile::home(0, HexCoord::ORIGIN, 0));
        board.add_tile(Tile::home(1, HexCoord::new(4, 0), 1));
        board
    }

    fn hex(q: i32, r: i32) -> HexCoord {
        HexCoord::new(q, r)
    }

    #[test]
    fn test_step_costs_by_element() {
        let mut board = open_board();
        board.insert_stone(hex(1, 0), Element::Earth);
        board.insert_stone(hex(0, 1), Element::Wind);
        board.insert_stone(hex(-1, 1), Element::Water);
        board.insert_stone(hex(-1, 0), Element::Fire);
        board.insert_stone(hex(0, -1), Element::Void);
        let ctx = MoveContext::new(&board, &[], false);

        assert_eq!(ctx.step_cost(&hex(1, -1)), StepCost::Cost(1));
        assert_eq!(ctx.step_cost(&hex(1, 0)), StepCost::Blocked(BlockReason::Earth));
        assert_eq!(ctx.step_cost(&hex(0, 1)), StepCost::Cost(0));
        // Water next to wind chains it
        assert_eq!(ctx.step_cost(&hex(-1, 1)), StepCost::Cost(0));
        assert_eq!(ctx.step_cost(&hex(-1, 0)), StepCost::Cost(1));
        assert_eq!(ctx.step_cost(&hex(0, -1)), StepCost::Cost(1));
        assert_eq!(ctx.step_cost(&hex(9, 9)), StepCost::Blocked(BlockReason::OffBoard));
    }

    #[test]
    fn test_water_costs() {
        let mut board = open_board();
        board.insert_stone(hex(0, 1), Element::Water);
        let ctx = MoveContext::new(&board, &[], false);
        assert_eq!(ctx.step_cost(&hex(0, 1)), StepCost::Cost(2));

        board.insert_stone(hex(0, 2), Element::Earth);
        let ctx = MoveContext::new(&board, &[], false);
        assert_eq!(
            ctx.step_cost(&hex(0, 1)),
            StepCost::Blocked(BlockReason::ChainedEarth)
        );
    }

    #[test]
    fn test_nullified_stones_cost_one() {
        let mut board = open_board();
        board.insert_stone(hex(1, 0), Element::Earth);
        board.insert_stone(hex(1, 1), Element::Wind);
        board.insert_stone(hex(2, 0), Element::Void);
        let ctx = MoveContext::new(&board, &[], false);
        assert_eq!(ctx.step_cost(&hex(1, 0)), StepCost::Cost(1));
        assert_eq!(ctx.step_cost(&hex(1, 1)), StepCost::Cost(1));
    }

    #[test]
    fn test_buff_short_circuits() {
        let mut board = open_board();
        board.insert_stone(hex(1, 0), Element::Earth);
        board.insert_stone(hex(0, 1), Element::Water);
        board.insert_stone(hex(1, 1), Element::Void);
        let ctx = MoveContext::new(&board, &[], true);
        assert_eq!(ctx.step_cost(&hex(1, 0)), StepCost::Cost(0));
        assert_eq!(ctx.step_cost(&hex(0, 1)), StepCost::Cost(0));
    }

    #[test]
    fn test_occupied_blocks() {
        let board = open_board();
        let occupied = [hex(1, 0)];
        let ctx = MoveContext::new(&board, &occupied, false);
        assert_eq!(ctx.step_cost(&hex(1, 0)), StepCost::Blocked(BlockReason::Occupied));
        assert!(!ctx.step_cost(&hex(1, 0)).can_move());
    }

    #[test]
    fn test_step_cost_is_deterministic() {
        let mut board = open_board();
        board.insert_stone(hex(0, 1), Element::Water);
        board.insert_stone(hex(1, 1), Element::Water);
        board.insert_stone(hex(2, 0), Element::Wind);
        let ctx = MoveContext::new(&board, &[], false);
        for target in HexCoord::ORIGIN.spiral(2) {
            assert_eq!(ctx.step_cost(&target), ctx.step_cost(&target));
        }
    }

    #[test]
    fn test_path_cost_sums_steps() {
        let mut board = open_board();
        board.insert_stone(hex(2, 0), Element::Water);
        let ctx = MoveContext::new(&board, &[], false);
        let cost = path_cost(&ctx, HexCoord::ORIGIN, &[hex(1, 0), hex(2, 0)], false, false).unwrap();
        assert_eq!(cost.steps, vec![1, 2]);
        assert_eq!(cost.total, 3);
        assert!(!cost.banked_after);

        assert_eq!(
            path_cost(&ctx, HexCoord::ORIGIN, &[hex(2, 0)], false, false),
            Err(PathError::NotAdjacent(hex(2, 0)))
        );
    }

    #[test]
    fn test_alternating_bank() {
        let mut board = open_board();
        board.insert_stone(hex(2, 0), Element::Wind);
        let ctx = MoveContext::new(&board, &[], false);
        let path = [hex(1, 0), hex(2, 0), hex(1, 1), hex(0, 1), hex(-1, 1)];

        // 1 (banks), 0 (wind, bank untouched), 1 free, 1 (banks), 1 free
        let cost = path_cost(&ctx, HexCoord::ORIGIN, &path, true, false).unwrap();
        assert_eq!(cost.steps, vec![1, 0, 0, 1, 0]);
        assert_eq!(cost.total, 2);
        assert!(!cost.banked_after);

        // Starting with a banked step flips the parity
        let cost = path_cost(&ctx, HexCoord::ORIGIN, &path, true, true).unwrap();
        assert_eq!(cost.steps, vec![0, 0, 1, 0, 1]);
        assert!(cost.banked_after);
    }

    #[test]
    fn test_builder_checks_budget_before_commit() {
        let mut board = open_board();
        board.insert_stone(hex(2, 0), Element::Water);
        let ctx = MoveContext::new(&board, &[], false);

        let mut builder = PathBuilder::new(HexCoord::ORIGIN, 2, false, false);
        assert_eq!(builder.try_extend(&ctx, hex(1, 0)), Ok(1));
        assert!(matches!(
            builder.try_extend(&ctx, hex(2, 0)),
            Err(PathError::CannotAfford { cost: 3, available: 2 })
        ));
        assert_eq!(builder.hexes(), vec![hex(1, 0)]);
        assert!(matches!(
            builder.try_extend(&ctx, hex(-1, 0)),
            Err(PathError::NotAdjacent(_))
        ));

        assert_eq!(builder.try_extend(&ctx, hex(1, 1)), Ok(1));
        assert_eq!(builder.total(), 2);
        assert_eq!(builder.retract(), Some(hex(1, 1)));
        assert_eq!(builder.total(), 1);
        assert_eq!(builder.head(), hex(1, 0));
    }

    #[test]
    fn test_builder_restores_bank_on_retract() {
        let board = open_board();
        let ctx = MoveContext::new(&board, &[], false);
        let mut builder = PathBuilder::new(HexCoord::ORIGIN, 5, true, false);
        builder.try_extend(&ctx, hex(1, 0)).unwrap();
        assert!(builder.banked());
        assert_eq!(builder.try_extend(&ctx, hex(2, 0)), Ok(0));
        assert!(!builder.banked());
        builder.retract();
        assert!(builder.banked());
    }

    #[test]
    fn test_shortest_path_avoids_expensive_water() {
        let mut board = open_board();
        board.insert_stone(hex(1, 0), Element::Water);
        board.insert_stone(hex(2, 0), Element::Water);
        let ctx = MoveContext::new(&board, &[], false);

        // Straight through the water costs 5, around it costs 4
        let route = shortest_path(&ctx, HexCoord::ORIGIN, hex(3, 0), false, false).unwrap();
        assert_eq!(route.cost, 4);
        assert_eq!(route.path.len(), 4);
        assert_eq!(*route.path.last().unwrap(), hex(3, 0));
        assert!(!route.path.contains(&hex(1, 0)));
        assert!(!route.path.contains(&hex(2, 0)));

        // The reported cost agrees with the step-by-step evaluation
        let cost = path_cost(&ctx, HexCoord::ORIGIN, &route.path, false, false).unwrap();
        assert_eq!(cost.total, route.cost);
    }

    #[test]
    fn test_shortest_path_uses_wind() {
        let mut board = open_board();
        board.insert_stone(hex(1, 0), Element::Wind);
        board.insert_stone(hex(2, 0), Element::Wind);
        let ctx = MoveContext::new(&board, &[], false);

        let route = shortest_path(&ctx, HexCoord::ORIGIN, hex(2, 1), false, false).unwrap();
        assert_eq!(route.cost, 1);
    }

    #[test]
    fn test_shortest_path_unreachable() {
        let mut board = open_board();
        for n in hex(2, 0).neighbors() {
            board.insert_stone(n, Element::Earth);
        }
        let ctx = MoveContext::new(&board, &[], false);
        assert!(shortest_path(&ctx, HexCoord::ORIGIN, hex(2, 0), false, false).is_none());
        assert!(shortest_path(&ctx, HexCoord::ORIGIN, hex(7, 7), false, false).is_none());
    }

    #[test]
    fn test_can_land() {
        let mut board = open_board();
        board.insert_stone(hex(1, 0), Element::Void);
        board.insert_stone(hex(0, 1), Element::Wind);
        assert!(can_land(&board, &hex(1, 1)));
        assert!(can_land(&board, &hex(1, 0)));
        assert!(!can_land(&board, &hex(0, 1)));
    }
}
