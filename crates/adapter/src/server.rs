//! TCP server for the engine adapter
//!
//! Handles incoming connections and manages client lifecycle. The server never touches
//! the engine: parsed commands go to the game loop over a bounded channel and the game
//! loop sends serialized lines back.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::protocol::*;
use crate::runtime::{InboundCommand, InboundPayload, OutboundMessage};

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Capacity of the command queue; commands beyond it are refused with `backpressure`
    pub max_pending_commands: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            max_pending_commands: 16,
        }
    }
}

impl ServerConfig {
    /// Read `MINTRIS_AI_HOST`, `MINTRIS_AI_PORT`, and `MINTRIS_AI_MAX_PENDING`
    ///
    /// Unset variables take their defaults; set but unparsable ones are errors.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let host = lookup("MINTRIS_AI_HOST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);

        let port = match lookup("MINTRIS_AI_PORT") {
            Some(s) => s
                .trim()
                .parse()
                .with_context(|| format!("MINTRIS_AI_PORT is not a port number: {:?}", s))?,
            None => defaults.port,
        };

        let max_pending_commands = match lookup("MINTRIS_AI_MAX_PENDING") {
            Some(s) => s
                .trim()
                .parse()
                .with_context(|| format!("MINTRIS_AI_MAX_PENDING is not a count: {:?}", s))?,
            None => defaults.max_pending_commands,
        };

        Ok(Self {
            host,
            port,
            max_pending_commands,
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid adapter address {}:{}", self.host, self.port))
    }

    /// `MINTRIS_AI_DISABLED` set to `1` or `true`
    pub fn is_disabled() -> bool {
        std::env::var("MINTRIS_AI_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

/// Shared server state
struct ServerState {
    clients: RwLock<Vec<ClientHandle>>,
    /// Id of the controlling client
    controller: RwLock<Option<u64>>,
}

/// Handle to a connected client
struct ClientHandle {
    id: u64,
    handshaken: bool,
    stream_observations: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<String>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
        }
    }

    async fn is_handshaken(&self, client_id: u64) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    async fn is_controller(&self, client_id: u64) -> bool {
        *self.controller.read().await == Some(client_id)
    }

    /// Record `seq` if it is strictly greater than the last one seen
    async fn check_and_update_seq(&self, client_id: u64, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };
        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn send_to(&self, client_id: u64, line: String) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(line);
        }
    }

    async fn broadcast(&self, line: String) {
        let clients = self.clients.read().await;
        for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
            let _ = c.tx.send(line.clone());
        }
    }
}

fn to_line<T: serde::Serialize>(msg: &T) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!("failed to serialize outbound message: {}", e);
            None
        }
    }
}

fn send_error(tx: &mpsc::UnboundedSender<String>, seq: u64, code: ErrorCode, message: &str) {
    if let Some(line) = to_line(&create_error(seq, code, message)) {
        let _ = tx.send(line);
    }
}

/// Start the TCP server
///
/// Runs until the listener fails. `ready_tx` receives the bound address, which is
/// how callers learn the port when `config.port` is 0.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind adapter on {}", addr))?;
    let bound = listener.local_addr()?;
    info!("adapter listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new());
    let mut client_id_counter = 0u64;

    // Outbound dispatcher
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::ToClient { client_id, line } => {
                        state.send_to(client_id, line).await;
                    }
                    OutboundMessage::Broadcast { line } => {
                        state.broadcast(line).await;
                    }
                }
            }
        });
    }

    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;
        info!("client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state, command_tx).await {
                warn!("client {} error: {:#}", client_id, e);
            }
            info!("client {} disconnected", client_id);
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: u64,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            handshaken: false,
            stream_observations: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                break;
            }
        }
    });

    let result = read_loop(&mut reader, client_id, &state, &tx, &command_tx).await;

    // Remove the client; hand control to the oldest remaining handshaken client
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            *controller = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
            match *controller {
                Some(new_id) => info!("client {} promoted to controller", new_id),
                None => info!("controller {} released", client_id),
            }
        }
    }

    drop(tx);
    let _ = write_task.await;
    debug!("client {} at {} cleaned up", client_id, addr);

    result
}

async fn read_loop<R>(
    reader: &mut BufReader<R>,
    client_id: u64,
    state: &Arc<ServerState>,
    tx: &mpsc::UnboundedSender<String>,
    command_tx: &mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        debug!("client {} -> {}", client_id, trimmed);

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    send_error(
                        tx,
                        hello.seq,
                        ErrorCode::OutOfOrder,
                        "seq must be strictly increasing",
                    );
                    continue;
                }

                if !hello.protocol_version.starts_with("1.") {
                    send_error(
                        tx,
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("protocol version {} not supported", hello.protocol_version),
                    );
                    return Ok(());
                }

                // First client to hello becomes controller
                let role = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.stream_observations;
                    }
                    match *controller {
                        None => {
                            *controller = Some(client_id);
                            info!(
                                "client {} ({}) is now controller",
                                client_id, hello.client.name
                            );
                            AssignedRole::Controller
                        }
                        Some(id) if id == client_id => AssignedRole::Controller,
                        Some(_) => AssignedRole::Observer,
                    }
                };

                if let Some(line) = to_line(&create_welcome(hello.seq, client_id, role)) {
                    let _ = tx.send(line);
                }

                if hello.stream_observations {
                    let request = InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    };
                    if command_tx.try_send(request).is_err() {
                        warn!(
                            "client {}: command queue full, no initial observation",
                            client_id
                        );
                        send_error(
                            tx,
                            hello.seq,
                            ErrorCode::Backpressure,
                            "command queue is full; observation will follow the next update",
                        );
                    }
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if let Some((code, message)) = gate(state, client_id, cmd.seq).await {
                    send_error(tx, cmd.seq, code, message);
                    continue;
                }
                if cmd.actions.0.is_empty() {
                    send_error(tx, cmd.seq, ErrorCode::InvalidCommand, "no actions");
                    continue;
                }
                forward(
                    tx,
                    command_tx,
                    InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Actions(cmd.actions.0),
                    },
                );
            }

            Ok(ParsedMessage::Restart(restart)) => {
                if let Some((code, message)) = gate(state, client_id, restart.seq).await {
                    send_error(tx, restart.seq, code, message);
                    continue;
                }
                forward(
                    tx,
                    command_tx,
                    InboundCommand {
                        client_id,
                        seq: restart.seq,
                        payload: InboundPayload::Restart,
                    },
                );
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                send_error(
                    tx,
                    unknown.seq,
                    ErrorCode::InvalidCommand,
                    "unknown message type",
                );
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                send_error(
                    tx,
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
            }
        }
    }
}

/// Checks shared by every controller-only message, in order: handshake, controller, seq
async fn gate(
    state: &ServerState,
    client_id: u64,
    seq: u64,
) -> Option<(ErrorCode, &'static str)> {
    if !state.is_handshaken(client_id).await {
        return Some((ErrorCode::HandshakeRequired, "send hello first"));
    }
    if !state.is_controller(client_id).await {
        return Some((ErrorCode::NotController, "only the controller may send commands"));
    }
    if !state.check_and_update_seq(client_id, seq).await {
        return Some((ErrorCode::OutOfOrder, "seq must be strictly increasing"));
    }
    None
}

/// Queue a command for the game loop; the ack is sent once it has been applied
fn forward(
    tx: &mpsc::UnboundedSender<String>,
    command_tx: &mpsc::Sender<InboundCommand>,
    command: InboundCommand,
) {
    let seq = command.seq;
    if command_tx.try_send(command).is_err() {
        send_error(tx, seq, ErrorCode::Backpressure, "command queue is full");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 7777);
    }

    #[test]
    fn test_config_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("MINTRIS_AI_HOST", "0.0.0.0"),
            ("MINTRIS_AI_PORT", "9000"),
            ("MINTRIS_AI_MAX_PENDING", "4"),
        ]))
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_pending_commands, 4);
    }

    #[test]
    fn test_config_rejects_bad_port() {
        let err = ServerConfig::from_lookup(lookup(&[("MINTRIS_AI_PORT", "seventy")]))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("MINTRIS_AI_PORT"));
    }

    #[test]
    fn test_bad_host_is_error() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
