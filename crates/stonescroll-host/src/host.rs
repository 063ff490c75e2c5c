//! Stdin/stdout host loop.
//!
//! Commands come in as JSON lines on stdin. Replies go out through a channel
//! to a writer task that owns stdout. A tokio interval drives the response
//! deadline check between commands.

use crate::protocol::{HostCommand, HostMessage};
use crate::session::Session;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Run the host until stdin closes.
pub async fn run_host(mut session: Session, tick_ms: u64) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<HostMessage>();

    // Forward replies to stdout
    let send_task = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(msg) = rx.recv().await {
            let Ok(mut line) = serde_json::to_string(&msg) else {
                continue;
            };
            line.push('\n');
            if stdout.write_all(line.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = time::interval(Duration::from_millis(tick_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    // The clock the game sees never runs backwards, so explicit Tick commands
    // and the interval can share it.
    let base_ms = session.game.clock_ms();

    info!(tick_ms, "host ready");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let replies = match serde_json::from_str::<HostCommand>(line) {
                            Ok(cmd) => handle_command(&mut session, cmd).await,
                            Err(e) => {
                                warn!("Invalid command: {}", e);
                                vec![HostMessage::rejected(format!("Invalid command: {}", e))]
                            }
                        };
                        if !forward(&tx, replies) {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                let now_ms = base_ms + started.elapsed().as_millis() as u64;
                match session.tick(now_ms) {
                    Ok(events) if !events.is_empty() => {
                        if !forward(&tx, vec![session.events_message(events)]) {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Tick failed: {}", e),
                }
            }
        }
    }

    // Let the writer drain what is queued
    drop(tx);
    if let Err(e) = send_task.await {
        error!("Writer task failed: {}", e);
    }

    if let Some((winner, name)) = session.winner() {
        info!(winner, %name, "game finished");
    }
    Ok(())
}

/// Queue replies for the writer. Returns false once the writer is gone.
fn forward(tx: &mpsc::UnboundedSender<HostMessage>, replies: Vec<HostMessage>) -> bool {
    for reply in replies {
        if tx.send(reply).is_err() {
            warn!("stdout writer stopped, shutting down");
            return false;
        }
    }
    true
}

/// Handle one command. Failures become a `Rejected` reply.
async fn handle_command(session: &mut Session, cmd: HostCommand) -> Vec<HostMessage> {
    match cmd {
        HostCommand::Action { player, action } => match session.apply_action(player, action) {
            Ok(events) => vec![session.events_message(events)],
            Err(e) => vec![HostMessage::rejected(e)],
        },

        HostCommand::Tick { now_ms } => match session.tick(now_ms) {
            Ok(events) => vec![session.events_message(events)],
            Err(e) => vec![HostMessage::rejected(e)],
        },

        HostCommand::Snapshot => match session.snapshot() {
            Ok(state) => vec![HostMessage::State { state }],
            Err(e) => vec![HostMessage::rejected(e)],
        },

        HostCommand::Save { path } => {
            let json = match session.save_json() {
                Ok(json) => json,
                Err(e) => return vec![HostMessage::rejected(e)],
            };
            match tokio::fs::write(&path, json).await {
                Ok(()) => {
                    info!(%path, "game saved");
                    vec![HostMessage::Saved { path }]
                }
                Err(e) => vec![HostMessage::rejected(format!("Could not write {}: {}", path, e))],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stonescroll_core::{GameAction, RulesConfig};

    fn session() -> Session {
        Session::new(vec!["Ada".into(), "Bo".into()], RulesConfig::default(), 9).unwrap()
    }

    #[tokio::test]
    async fn test_rejected_action() {
        let mut session = session();
        let replies = handle_command(
            &mut session,
            HostCommand::Action {
                player: 1,
                action: GameAction::EndTurn,
            },
        )
        .await;
        assert_eq!(replies, vec![HostMessage::rejected("Not your turn")]);
    }

    #[tokio::test]
    async fn test_tick_and_snapshot() {
        let mut session = session();
        let replies = handle_command(&mut session, HostCommand::Tick { now_ms: 250 }).await;
        assert!(matches!(&replies[0], HostMessage::Events { events, .. } if events.is_empty()));
        assert_eq!(session.game.clock_ms(), 250);

        let replies = handle_command(&mut session, HostCommand::Snapshot).await;
        match &replies[0] {
            HostMessage::State { state } => assert_eq!(state["current_player"], 0),
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_forward_stops_when_writer_is_gone() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(forward(&tx, vec![HostMessage::rejected("first")]));
        assert_eq!(rx.try_recv().ok(), Some(HostMessage::rejected("first")));

        drop(rx);
        assert!(!forward(&tx, vec![HostMessage::rejected("lost")]));
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let mut session = session();
        let path = std::env::temp_dir().join(format!("stonescroll-save-{}.json", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        let replies = handle_command(&mut session, HostCommand::Save { path: path.clone() }).await;
        assert_eq!(replies, vec![HostMessage::Saved { path: path.clone() }]);

        let json = tokio::fs::read_to_string(&path).await.unwrap();
        let resumed = Session::resume(&json).unwrap();
        assert_eq!(resumed.game.rng_seed(), 9);
        let _ = tokio::fs::remove_file(&path).await;
    }
}
