//! Stonescroll - a hex-board game of elemental stones and pattern scrolls
//!
//! This crate provides the core rules engine for Stonescroll, including:
//! - Hex coordinate system and the tiled board
//! - Elemental interactions between neighboring stones
//! - Movement costs and path finding
//! - Scroll pattern matching and the cast/response stack
//! - The action point economy
//!
//! # Architecture
//!
//! The engine is deterministic and does no I/O. A host owns one
//! [`GameState`], feeds it actions and clock ticks, and forwards the
//! resulting [`GameEvent`]s to whoever is watching.
//!
//! # Modules
//!
//! - [`hex`]: Axial coordinates, pixel conversion, rotation
//! - [`board`]: Tiles, stones, shrines
//! - [`interaction`]: Mimicry, chaining, nullification, fire
//! - [`movement`]: Step costs, path costs, shortest routes
//! - [`scroll`]: Scroll catalogue and pattern matcher
//! - [`response`]: Response window and LIFO resolution
//! - [`game`]: Game state machine

pub mod actions;
pub mod ap;
pub mod board;
pub mod config;
pub mod effects;
pub mod game;
pub mod hex;
pub mod interaction;
pub mod movement;
pub mod player;
pub mod pool;
pub mod response;
pub mod scroll;

// Re-export commonly used types
pub use actions::{ActionOutcome, GameAction, GameEvent};
pub use ap::{ApState, TurnBuff, TurnBuffs};
pub use board::{Board, Element, PlayerId, Shrine, Stone, Tile, TileId};
pub use config::RulesConfig;
pub use effects::{EffectCatalogue, EffectCommand, EffectContext, StandardEffects};
pub use game::{GameError, GamePhase, GameState};
pub use hex::{Direction, HexCoord};
pub use movement::{PathBuilder, PathCost, PathError, Route, StepCost};
pub use player::{CascadeDestination, CommonArea, PendingCascade, Player, PlayerScrolls};
pub use pool::StoneCounts;
pub use response::{ResolutionResult, ResolvedEntry, ResponseWindow, ScrollSource, StackEntry};
pub use scroll::{ScrollCatalogue, ScrollDefinition, ScrollElement};
