//! The game session owned by the host.

use stonescroll_core::{GameAction, GameError, GameEvent, GameState, PlayerId, RulesConfig};
use thiserror::Error;
use tracing::{debug, info};

use crate::protocol::HostMessage;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("No player {0} at this table")]
    UnknownPlayer(PlayerId),

    #[error("Game state JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The one game this host serves.
pub struct Session {
    pub game: GameState,
}

impl Session {
    pub fn new(player_names: Vec<String>, rules: RulesConfig, seed: u64) -> Result<Self, SessionError> {
        let game = GameState::new(player_names, rules, seed)?;
        info!(players = game.player_count(), seed, "session started");
        Ok(Self { game })
    }

    /// Resume from a saved game
    pub fn resume(json: &str) -> Result<Self, SessionError> {
        let game = GameState::from_json(json)?;
        info!(players = game.player_count(), turn = game.turn_number, "session resumed");
        Ok(Self { game })
    }

    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, SessionError> {
        if self.game.get_player(player).is_none() {
            return Err(SessionError::UnknownPlayer(player));
        }
        debug!(player, ?action, "applying action");
        Ok(self.game.apply_action(player, action)?)
    }

    /// Advance the clock; auto-passes whoever ran out of time
    pub fn tick(&mut self, now_ms: u64) -> Result<Vec<GameEvent>, SessionError> {
        Ok(self.game.advance_clock(now_ms)?)
    }

    pub fn snapshot(&self) -> Result<serde_json::Value, SessionError> {
        Ok(serde_json::to_value(&self.game)?)
    }

    pub fn save_json(&self) -> Result<String, SessionError> {
        Ok(self.game.to_json()?)
    }

    pub fn winner(&self) -> Option<(PlayerId, String)> {
        let winner = self.game.get_winner()?;
        let name = self.game.get_player(winner)?.name.clone();
        Some((winner, name))
    }

    /// Wrap events for the wire
    pub fn events_message(&self, events: Vec<GameEvent>) -> HostMessage {
        let messages = events.iter().map(|e| e.status_message()).collect();
        HostMessage::Events {
            events,
            messages,
            current_player: self.game.current_player,
            winner: self.game.get_winner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        Session::new(vec!["Ada".into(), "Bo".into()], RulesConfig::default(), 5).unwrap()
    }

    #[test]
    fn test_new_session() {
        let session = session();
        assert_eq!(session.game.player_count(), 2);
        assert_eq!(session.winner(), None);

        let err = Session::new(vec!["Solo".into()], RulesConfig::default(), 5).err().unwrap();
        assert_eq!(err.to_string(), "A game needs 2 to 6 players, got 1");
    }

    #[test]
    fn test_apply_action() {
        let mut session = session();
        assert!(matches!(
            session.apply_action(9, GameAction::EndTurn),
            Err(SessionError::UnknownPlayer(9))
        ));

        let err = session.apply_action(1, GameAction::EndTurn).err().unwrap();
        assert_eq!(err.to_string(), "Not your turn");

        let events = session.apply_action(0, GameAction::EndTurn).unwrap();
        match session.events_message(events) {
            HostMessage::Events {
                current_player,
                messages,
                ..
            } => {
                assert_eq!(current_player, 1);
                assert_eq!(messages.last().map(String::as_str), Some("Player 0 ended their turn; player 1 is up"));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_save_and_resume() {
        let mut session = session();
        session.apply_action(0, GameAction::EndTurn).unwrap();
        session.tick(1_000).unwrap();

        let json = session.save_json().unwrap();
        let resumed = Session::resume(&json).unwrap();
        assert_eq!(resumed.game.current_player, 1);
        assert_eq!(resumed.game.clock_ms(), 1_000);
        assert_eq!(resumed.snapshot().unwrap(), session.snapshot().unwrap());
    }
}
