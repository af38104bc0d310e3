//! Adapter runtime integration
//!
//! Bridges the synchronous game loop with the async TCP server. The game loop owns the
//! engine; it polls [`Adapter::try_recv`] between ticks, applies commands, and pushes
//! acks, observations, and events back out.

use std::net::SocketAddr;

use anyhow::Context;
use arrayvec::ArrayVec;
use log::{debug, info, warn};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};

use crate::core::{EngineEvent, GameSnapshot, GameState};
use crate::protocol::{
    build_event, build_observation, create_ack, create_error, ErrorCode, MAX_ACTIONS,
};
use crate::server::{run_server, ServerConfig};
use crate::types::GameAction;

/// Command delivered to the game loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub client_id: u64,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    Actions(ArrayVec<GameAction, MAX_ACTIONS>),
    Restart,
    /// A client just said hello and wants the current state
    SnapshotRequest,
}

/// Line to be delivered by the server
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient { client_id: u64, line: String },
    /// Sent to every handshaken client streaming observations
    Broadcast { line: String },
}

/// Apply a command to the engine, returning how many actions it accepted
///
/// A restart counts as one accepted action; a snapshot request changes nothing.
pub fn apply_payload(game: &mut GameState, payload: &InboundPayload) -> u32 {
    match payload {
        InboundPayload::Actions(actions) => actions
            .iter()
            .filter(|&&action| game.apply_action(action))
            .count() as u32,
        InboundPayload::Restart => {
            game.start_game();
            1
        }
        InboundPayload::SnapshotRequest => 0,
    }
}

/// Whether an action list may still run once the game is over
///
/// Only a list that restarts the game does anything in that state.
fn allowed_after_game_over(payload: &InboundPayload) -> bool {
    match payload {
        InboundPayload::Actions(actions) => actions.contains(&GameAction::Restart),
        InboundPayload::Restart | InboundPayload::SnapshotRequest => true,
    }
}

fn line_for<T: serde::Serialize>(msg: &T) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!("failed to serialize outbound message: {}", e);
            None
        }
    }
}

/// Turns inbound commands and engine output into outbound lines
///
/// Holds the outbound `seq` counter; it does no I/O, so the same code serves the
/// [`Adapter`] and any other loop that owns a [`GameState`].
#[derive(Debug, Default)]
pub struct EngineBridge {
    seq: u64,
}

impl EngineBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Apply one command and build the reply for its sender
    ///
    /// Snapshot requests get an observation; actions sent after game over get
    /// `invalid_command` unless they restart; everything else gets an ack.
    pub fn respond(
        &mut self,
        game: &mut GameState,
        cmd: &InboundCommand,
    ) -> Option<OutboundMessage> {
        let reply = if cmd.payload == InboundPayload::SnapshotRequest {
            line_for(&build_observation(&game.snapshot(), self.next_seq()))
        } else if game.is_game_over() && !allowed_after_game_over(&cmd.payload) {
            line_for(&create_error(
                cmd.seq,
                ErrorCode::InvalidCommand,
                "game is over",
            ))
        } else {
            let applied = apply_payload(game, &cmd.payload);
            debug!(
                "command {} from client {}: {} applied",
                cmd.seq, cmd.client_id, applied
            );
            line_for(&create_ack(cmd.seq, applied))
        };
        reply.map(|line| OutboundMessage::ToClient {
            client_id: cmd.client_id,
            line,
        })
    }

    /// One broadcast per event, then a fresh observation
    ///
    /// `PieceMoved` is left to the observation that follows.
    pub fn broadcasts(
        &mut self,
        events: &[EngineEvent],
        snapshot: &GameSnapshot,
    ) -> Vec<OutboundMessage> {
        let mut out = Vec::with_capacity(events.len() + 1);
        for event in events.iter().filter(|e| **e != EngineEvent::PieceMoved) {
            if let Some(line) = line_for(&build_event(event, self.next_seq())) {
                out.push(OutboundMessage::Broadcast { line });
            }
        }
        if let Some(line) = line_for(&build_observation(snapshot, self.next_seq())) {
            out.push(OutboundMessage::Broadcast { line });
        }
        out
    }
}

/// Running adapter instance
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    local_addr: SocketAddr,
    bridge: EngineBridge,
}

impl Adapter {
    /// Start the adapter from environment variables
    ///
    /// Returns `Ok(None)` if `MINTRIS_AI_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if ServerConfig::is_disabled() {
            info!("adapter disabled via MINTRIS_AI_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()?).map(Some)
    }

    /// Start the server on its own tokio runtime and wait until it is listening
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (ready_tx, ready_rx) = oneshot::channel();

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        let server = rt.spawn(run_server(config, cmd_tx, out_rx, Some(ready_tx)));

        let local_addr = match rt.block_on(ready_rx) {
            Ok(addr) => addr,
            // The sender is dropped without a value only when startup failed
            Err(_) => {
                return Err(match rt.block_on(server) {
                    Ok(Err(e)) => e,
                    Ok(Ok(())) => anyhow::anyhow!("adapter server exited before listening"),
                    Err(e) => anyhow::Error::new(e).context("adapter server task failed"),
                });
            }
        };

        rt.spawn(async move {
            match server.await {
                Ok(Err(e)) => log::error!("adapter server stopped: {:#}", e),
                Err(e) => log::error!("adapter server task failed: {}", e),
                Ok(Ok(())) => {}
            }
        });

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
            local_addr,
            bridge: EngineBridge::new(),
        })
    }

    /// Address the server is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    /// Apply every queued command, answering each one to its sender
    ///
    /// Returns the number of commands handled.
    pub fn drain_commands(&mut self, game: &mut GameState) -> usize {
        let mut handled = 0;
        while let Some(cmd) = self.try_recv() {
            handled += 1;
            if let Some(reply) = self.bridge.respond(game, &cmd) {
                self.send(reply);
            }
        }
        handled
    }

    /// Broadcast each event, then a fresh observation
    pub fn publish(&mut self, events: &[EngineEvent], snapshot: &GameSnapshot) {
        for msg in self.bridge.broadcasts(events, snapshot) {
            self.send(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameConfig;

    fn started() -> GameState {
        let mut game = GameState::new(GameConfig::default().with_spawn_grace_ms(0));
        game.start_game();
        game
    }

    #[test]
    fn test_apply_payload_counts_accepted_actions() {
        let mut game = started();
        let actions: ArrayVec<GameAction, MAX_ACTIONS> =
            std::iter::repeat(GameAction::MoveLeft).take(8).collect();
        let applied = apply_payload(&mut game, &InboundPayload::Actions(actions));
        // The left wall stops the piece before all eight moves
        assert!(applied >= 3 && applied < 8);
        assert!(!game.can_move(-1, 0));
    }

    #[test]
    fn test_apply_restart() {
        let mut game = started();
        game.apply_action(GameAction::HardDrop);
        assert!(game.score() > 0);
        assert_eq!(apply_payload(&mut game, &InboundPayload::Restart), 1);
        assert_eq!(game.score(), 0);
        assert!(game.current_piece().is_some());
    }

    fn game_over() -> GameState {
        let mut game = started();
        let board = game.board_mut();
        for y in 2..20 {
            for x in 0..9 {
                board.set(x, y, Some(crate::types::PieceKind::Z));
            }
        }
        while !game.is_game_over() {
            game.apply_action(GameAction::HardDrop);
        }
        game
    }

    fn command(seq: u64, actions: &[GameAction]) -> InboundCommand {
        InboundCommand {
            client_id: 7,
            seq,
            payload: InboundPayload::Actions(actions.iter().copied().collect()),
        }
    }

    fn reply_json(msg: Option<OutboundMessage>) -> serde_json::Value {
        match msg {
            Some(OutboundMessage::ToClient { client_id, line }) => {
                assert_eq!(client_id, 7);
                serde_json::from_str(&line).unwrap()
            }
            other => panic!("expected a direct reply, got {:?}", other),
        }
    }

    #[test]
    fn test_respond_acks_with_accepted_count() {
        let mut game = started();
        let mut bridge = EngineBridge::new();
        let left = [GameAction::MoveLeft; 8];
        let v = reply_json(bridge.respond(&mut game, &command(3, &left)));
        assert_eq!(v["type"], "ack");
        assert_eq!(v["seq"], 3);
        let applied = v["applied"].as_u64().unwrap();
        assert!(applied >= 3 && applied < 8);
    }

    #[test]
    fn test_respond_refuses_actions_after_game_over() {
        let mut game = game_over();
        let mut bridge = EngineBridge::new();
        let v = reply_json(bridge.respond(&mut game, &command(4, &[GameAction::MoveLeft])));
        assert_eq!(v["type"], "error");
        assert_eq!(v["code"], "invalid_command");
        assert!(game.is_game_over());
    }

    #[test]
    fn test_restart_action_works_after_game_over() {
        let mut game = game_over();
        let mut bridge = EngineBridge::new();
        let v = reply_json(bridge.respond(&mut game, &command(5, &[GameAction::Restart])));
        assert_eq!(v["type"], "ack");
        assert_eq!(v["applied"], 1);
        assert!(!game.is_game_over());
        assert!(game.current_piece().is_some());
    }

    #[test]
    fn test_snapshot_request_gets_observation() {
        let mut game = started();
        let mut bridge = EngineBridge::new();
        let cmd = InboundCommand {
            client_id: 7,
            seq: 1,
            payload: InboundPayload::SnapshotRequest,
        };
        let v = reply_json(bridge.respond(&mut game, &cmd));
        assert_eq!(v["type"], "observation");
        assert_eq!(v["seq"], 1);
    }

    #[test]
    fn test_broadcasts_skip_piece_moved() {
        let mut game = started();
        game.take_events();
        game.apply_action(GameAction::HardDrop);
        let events = game.take_events();
        assert!(events.contains(&EngineEvent::PieceMoved));

        let mut bridge = EngineBridge::new();
        let lines: Vec<serde_json::Value> = bridge
            .broadcasts(&events, &game.snapshot())
            .into_iter()
            .map(|msg| match msg {
                OutboundMessage::Broadcast { line } => serde_json::from_str(&line).unwrap(),
                other => panic!("expected a broadcast, got {:?}", other),
            })
            .collect();

        // piece_locked, next_piece_changed, then the observation
        assert_eq!(lines.len(), events.len());
        assert!(lines[..lines.len() - 1].iter().all(|v| v["type"] == "event"));
        assert_eq!(lines[0]["event"], "piece_locked");
        assert_eq!(lines.last().unwrap()["type"], "observation");
        let seqs: Vec<u64> = lines.iter().map(|v| v["seq"].as_u64().unwrap()).collect();
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_snapshot_request_changes_nothing() {
        let mut game = started();
        let before = game.snapshot();
        assert_eq!(apply_payload(&mut game, &InboundPayload::SnapshotRequest), 0);
        assert_eq!(game.snapshot(), before);
    }
}
