//! Game actions that players can take.
//!
//! This module defines all possible actions in the game, the events that
//! result from those actions, and the flat result object handed to callers
//! that want a success flag and a reason string instead of a `Result`.

use crate::ap::{ApState, TurnBuff};
use crate::board::{Element, PlayerId, Shrine, TileId};
use crate::game::GameError;
use crate::hex::HexCoord;
use crate::player::CascadeDestination;
use crate::response::{ResolutionResult, ResolvedEntry, ScrollSource};
use crate::scroll::ScrollElement;
use serde::{Deserialize, Serialize};

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Scrolls ====================
    /// Cast a scroll from the active area or the common area
    CastScroll { scroll: String },
    /// Answer the open response window with a scroll
    Respond { scroll: String },
    /// Decline to answer the current top of the stack
    Pass,

    // ==================== Movement ====================
    /// Walk an explicit path of neighboring hexes
    MoveAlongPath { path: Vec<HexCoord> },
    /// Walk the cheapest route to a hex
    MoveToHex { hex: HexCoord },

    // ==================== Stones ====================
    /// Place a stone from the player pool next to (or under) the player
    PlaceStone { hex: HexCoord, element: Element },
    /// Break a stone next to (or under) the player
    BreakStone { hex: HexCoord },

    // ==================== Scroll Collections ====================
    /// Route a scroll while a cascade is pending
    ResolveCascade {
        scroll: String,
        destination: CascadeDestination,
    },
    /// Move a scroll from hand to the active area
    ActivateScroll { scroll: String },
    /// Put a held scroll on display in the common area
    MoveScrollToCommon { scroll: String },

    // ==================== Turn Management ====================
    /// End your turn
    EndTurn,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A scroll was cast and paid for
    ScrollCast {
        player: PlayerId,
        scroll: String,
        cost: u32,
        source: ScrollSource,
        remaining: ApState,
    },

    /// Somebody can answer the cast
    ResponseWindowOpened {
        caster: PlayerId,
        scroll: String,
        eligible: Vec<PlayerId>,
    },

    /// A response was pushed on the stack
    ResponseAdded {
        player: PlayerId,
        scroll: String,
        is_counter: bool,
        cost: u32,
    },

    /// A player passed on the current top of the stack
    PlayerPassed {
        player: PlayerId,
        /// Passed by the deadline rather than by the player
        timed_out: bool,
    },

    /// The stack resolved (`skipped` when no window was opened)
    StackResolved {
        results: Vec<ResolvedEntry>,
        skipped: bool,
    },

    /// Stones moved from the source pool to a player
    StonesGranted {
        player: PlayerId,
        element: Element,
        requested: u32,
        granted: u32,
    },

    /// AP granted by an effect
    ApGranted {
        player: PlayerId,
        amount: u32,
        ap: ApState,
    },

    /// A turn buff was switched on
    BuffGranted { player: PlayerId, buff: TurnBuff },

    /// New elements were activated
    ElementsActivated {
        player: PlayerId,
        elements: Vec<Element>,
    },

    /// A scroll was drawn into a player's hand
    ScrollDrawn {
        player: PlayerId,
        scroll: String,
        deck: ScrollElement,
    },

    /// A draw found nothing to draw
    ScrollDeckEmpty { deck: ScrollElement },

    /// A draw found the hand full; the player must route a scroll
    CascadeRequired {
        player: PlayerId,
        drawn: String,
        can_cascade_to_active: bool,
    },

    /// The pending cascade was settled
    CascadeResolved {
        player: PlayerId,
        scroll: String,
        destination: CascadeDestination,
    },

    /// A scroll moved from hand to the active area
    ScrollActivated { player: PlayerId, scroll: String },

    /// A scroll was put on display in the common area
    ScrollMovedToCommon {
        player: Option<PlayerId>,
        scroll: String,
    },

    /// A scroll went to the bottom of its deck
    ScrollReturnedToDeck { scroll: String, deck: ScrollElement },

    /// A player's token moved
    PlayerMoved {
        player: PlayerId,
        path: Vec<HexCoord>,
        cost: u32,
    },

    /// A tile was turned over
    TileRevealed { tile: TileId, shrine: Shrine },

    /// A stone was placed
    StonePlaced {
        player: PlayerId,
        hex: HexCoord,
        element: Element,
        /// What a water stone mimics, if anything
        appears_as: Option<Element>,
    },

    /// A stone was broken by a player
    StoneBroken {
        player: PlayerId,
        hex: HexCoord,
        element: Element,
    },

    /// A stone was burned by fire
    StoneDestroyed { hex: HexCoord, element: Element },

    /// A shrine refilled a player's stones at the end of the turn
    StonesReplenished {
        player: PlayerId,
        element: Element,
        amount: u32,
    },

    /// Turn ended
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    /// A player activated all five elements
    GameWon { player: PlayerId },
}

impl GameEvent {
    /// One-line description for a status display
    pub fn status_message(&self) -> String {
        match self {
            GameEvent::ScrollCast {
                player,
                scroll,
                cost,
                ..
            } => format!("Player {} cast {} for {} AP", player, scroll, cost),
            GameEvent::ResponseWindowOpened { scroll, eligible, .. } => format!(
                "{} can be answered by {} player(s)",
                scroll,
                eligible.len()
            ),
            GameEvent::ResponseAdded {
                player,
                scroll,
                is_counter,
                ..
            } => {
                if *is_counter {
                    format!("Player {} counters with {}", player, scroll)
                } else {
                    format!("Player {} responds with {}", player, scroll)
                }
            }
            GameEvent::PlayerPassed { player, timed_out } => {
                if *timed_out {
                    format!("Player {} ran out of time and passed", player)
                } else {
                    format!("Player {} passed", player)
                }
            }
            GameEvent::StackResolved { results, .. } => {
                let parts: Vec<String> = results
                    .iter()
                    .map(|r| {
                        let outcome = match r.result {
                            ResolutionResult::Resolved => "resolved",
                            ResolutionResult::Countered => "countered",
                            ResolutionResult::CounteredTarget => "countered its target",
                        };
                        format!("{} {}", r.entry.scroll, outcome)
                    })
                    .collect();
                parts.join(", ")
            }
            GameEvent::StonesGranted {
                player,
                element,
                requested,
                granted,
            } => {
                if granted < requested {
                    format!(
                        "Player {} gained {} {} stone(s) ({} requested)",
                        player, granted, element, requested
                    )
                } else {
                    format!("Player {} gained {} {} stone(s)", player, granted, element)
                }
            }
            GameEvent::ApGranted { player, amount, .. } => {
                format!("Player {} gained {} AP", player, amount)
            }
            GameEvent::BuffGranted { player, buff } => {
                format!("Player {} gained {:?} for this turn", player, buff)
            }
            GameEvent::ElementsActivated { player, elements } => {
                let names: Vec<&str> = elements.iter().map(|e| e.name()).collect();
                format!("Player {} activated {}", player, names.join(", "))
            }
            GameEvent::ScrollDrawn { player, scroll, .. } => {
                format!("Player {} drew {}", player, scroll)
            }
            GameEvent::ScrollDeckEmpty { deck } => format!("The {} deck is empty", deck),
            GameEvent::CascadeRequired { player, drawn, .. } => format!(
                "Player {} drew {} with a full hand and must route a scroll",
                player, drawn
            ),
            GameEvent::CascadeResolved {
                player,
                scroll,
                destination,
            } => format!("Player {} sent {} to {:?}", player, scroll, destination),
            GameEvent::ScrollActivated { player, scroll } => {
                format!("Player {} activated {}", player, scroll)
            }
            GameEvent::ScrollMovedToCommon { scroll, .. } => {
                format!("{} is now in the common area", scroll)
            }
            GameEvent::ScrollReturnedToDeck { scroll, deck } => {
                format!("{} returned to the {} deck", scroll, deck)
            }
            GameEvent::PlayerMoved {
                player, path, cost, ..
            } => match path.last() {
                Some(end) => format!("Player {} moved to {} for {} AP", player, end, cost),
                None => format!("Player {} stayed put", player),
            },
            GameEvent::TileRevealed { shrine, .. } => match shrine {
                Shrine::Element(e) => format!("A {} shrine was revealed", e),
                Shrine::Catacomb => "A catacomb was revealed".to_string(),
                Shrine::Player => "A home tile was revealed".to_string(),
            },
            GameEvent::StonePlaced {
                player,
                hex,
                element,
                appears_as,
            } => match appears_as {
                Some(mimic) if mimic != element => format!(
                    "Player {} placed {} at {}, which acts as {}",
                    player, element, hex, mimic
                ),
                _ => format!("Player {} placed {} at {}", player, element, hex),
            },
            GameEvent::StoneBroken {
                player,
                hex,
                element,
            } => format!("Player {} broke {} at {}", player, element, hex),
            GameEvent::StoneDestroyed { hex, element } => {
                format!("Fire destroyed {} at {}", element, hex)
            }
            GameEvent::StonesReplenished {
                player,
                element,
                amount,
            } => format!(
                "Player {} replenished {} {} stone(s) at the shrine",
                player, amount, element
            ),
            GameEvent::TurnEnded {
                player,
                next_player,
            } => format!("Player {} ended their turn; player {} is up", player, next_player),
            GameEvent::GameWon { player } => {
                format!("Player {} activated all five elements and wins", player)
            }
        }
    }
}

/// Flat result object: success flag, failure reason, and the events produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub reason: Option<String>,
    pub events: Vec<GameEvent>,
}

impl From<Result<Vec<GameEvent>, GameError>> for ActionOutcome {
    fn from(result: Result<Vec<GameEvent>, GameError>) -> Self {
        match result {
            Ok(events) => Self {
                success: true,
                reason: None,
                events,
            },
            Err(err) => Self {
                success: false,
                reason: Some(err.to_string()),
                events: Vec::new(),
            },
        }
    }
}
