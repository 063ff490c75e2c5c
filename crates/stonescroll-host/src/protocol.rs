//! JSON-line protocol between the host and whoever drives it.

use serde::{Deserialize, Serialize};
use stonescroll_core::{GameAction, GameEvent, PlayerId};

/// Commands read from stdin, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum HostCommand {
    /// Apply an action on behalf of a player
    Action { player: PlayerId, action: GameAction },

    /// Move the game clock to `now_ms` and run the deadline check
    Tick { now_ms: u64 },

    /// Request the full game state
    Snapshot,

    /// Write the game state to a file
    Save { path: String },
}

/// Messages written to stdout, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum HostMessage {
    /// Events produced by an action or a tick
    Events {
        events: Vec<GameEvent>,
        /// Human-readable line per event
        messages: Vec<String>,
        current_player: PlayerId,
        winner: Option<PlayerId>,
    },

    /// A command failed; nothing changed
    Rejected { reason: String },

    /// Full game state
    State { state: serde_json::Value },

    /// Game state written to `path`
    Saved { path: String },
}

impl HostMessage {
    pub fn rejected(reason: impl ToString) -> Self {
        HostMessage::Rejected {
            reason: reason.to_string(),
        }
    }
}
