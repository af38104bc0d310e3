//! Protocol module - JSON message types for the engine adapter
//!
//! Every message is a single JSON object on its own line with a `type` tag and a
//! `seq` number. Outbound messages also carry `ts`, milliseconds since the Unix epoch.

use serde::{Deserialize, Serialize};

use arrayvec::ArrayVec;

use crate::core::{EngineEvent, GameSnapshot};
use crate::types::GameAction;

pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Most actions accepted in one command
pub const MAX_ACTIONS: usize = 32;

// ============== Client -> Engine Messages ==============

/// First message of every connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub client: ClientInfo,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    /// Whether the client wants observations and events pushed to it
    #[serde(default = "default_true")]
    pub stream_observations: bool,
}

fn default_protocol_version() -> String {
    PROTOCOL_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Batch of actions, applied in order (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub actions: ActionList,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionList(pub ArrayVec<GameAction, MAX_ACTIONS>);

impl<'de> Deserialize<'de> for ActionList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = ActionList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of action names")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::<GameAction, MAX_ACTIONS>::new();
                while let Some(name) = seq.next_element::<String>()? {
                    let action = GameAction::from_str(&name).ok_or_else(|| {
                        serde::de::Error::custom(format!("unknown action: {}", name))
                    })?;
                    out.try_push(action)
                        .map_err(|_| serde::de::Error::custom("too many actions"))?;
                }
                Ok(ActionList(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

/// Start a new game (controller only)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RestartMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Restart(RestartMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

/// Parse one inbound line
///
/// A well-formed object with an unrecognized `type` is not a parse error; it comes
/// back as [`ParsedMessage::Unknown`] so the server can answer it.
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
        #[serde(rename = "restart")]
        Restart(RestartMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Ok(InboundMessage::Restart(m)) => Ok(ParsedMessage::Restart(m)),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct Header<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
                seq: Option<u64>,
            }
            let header = serde_json::from_str::<Header>(json)?;
            match header.msg_type {
                Some("hello") | Some("command") | Some("restart") => Err(e),
                _ => Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: header.seq.unwrap_or(0),
                })),
            }
        }
    }
}

/// Pull `seq` out of a line that failed to parse, if it is there at all
pub fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

// ============== Engine -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedRole {
    Controller,
    Observer,
}

/// Response to hello
#[derive(Debug, Clone, Serialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
}

/// Command applied; `applied` counts the actions the engine accepted
#[derive(Debug, Clone, Serialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub seq: u64,
    pub ts: u64,
    pub status: &'static str,
    pub applied: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    HandshakeRequired,
    NotController,
    InvalidCommand,
    OutOfOrder,
    Backpressure,
    ProtocolMismatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardCells {
    pub width: u8,
    pub height: u8,
    /// Row-major, 0 empty, 1..=7 piece kind
    pub cells: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivePiece {
    pub kind: &'static str,
    pub rotation: &'static str,
    pub x: i32,
    pub y: i32,
    pub cells: [(i32, i32); 4],
}

/// Full engine state, pushed after every applied command and every gravity step
#[derive(Debug, Clone, Serialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub seq: u64,
    pub ts: u64,
    pub board: BoardCells,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<ActivePiece>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghost_y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold: Option<&'static str>,
    pub can_hold: bool,
    pub score: u64,
    pub level: u32,
    pub lines: u32,
    pub combo: u32,
    pub game_over: bool,
    pub drop_interval_ms: u32,
}

/// One engine event
#[derive(Debug, Clone, Serialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub seq: u64,
    pub ts: u64,
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combo: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str) -> HelloMessage {
    HelloMessage {
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: PROTOCOL_VERSION.to_string(),
        stream_observations: true,
    }
}

pub fn create_welcome(seq: u64, client_id: u64, role: AssignedRole) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: "welcome",
        seq,
        ts: current_timestamp_ms(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        client_id,
        role,
    }
}

pub fn create_ack(seq: u64, applied: u32) -> AckMessage {
    AckMessage {
        msg_type: "ack",
        seq,
        ts: current_timestamp_ms(),
        status: "ok",
        applied,
    }
}

pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: "error",
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Build an observation from a snapshot
pub fn build_observation(snapshot: &GameSnapshot, seq: u64) -> ObservationMessage {
    ObservationMessage {
        msg_type: "observation",
        seq,
        ts: current_timestamp_ms(),
        board: BoardCells {
            width: snapshot.width,
            height: snapshot.height,
            cells: snapshot.board.clone(),
        },
        active: snapshot.active.map(|a| ActivePiece {
            kind: a.kind.as_str(),
            rotation: a.rotation.as_str(),
            x: a.x,
            y: a.y,
            cells: a.cells,
        }),
        ghost_y: snapshot.ghost_y,
        next: snapshot.next.map(|k| k.as_str()),
        hold: snapshot.hold.map(|k| k.as_str()),
        can_hold: snapshot.can_hold,
        score: snapshot.score,
        level: snapshot.level,
        lines: snapshot.lines,
        combo: snapshot.combo,
        game_over: snapshot.game_over,
        drop_interval_ms: snapshot.drop_interval_ms,
    }
}

/// Build the wire form of one engine event
pub fn build_event(event: &EngineEvent, seq: u64) -> EventMessage {
    let mut msg = EventMessage {
        msg_type: "event",
        seq,
        ts: current_timestamp_ms(),
        event: event.name(),
        kind: None,
        rotation: None,
        x: None,
        y: None,
        count: None,
        rows: Vec::new(),
        combo: None,
        points: None,
        level: None,
    };
    match event {
        EngineEvent::PieceLocked {
            kind,
            rotation,
            x,
            y,
        } => {
            msg.kind = Some(kind.as_str());
            msg.rotation = Some(rotation.as_str());
            msg.x = Some(*x);
            msg.y = Some(*y);
        }
        EngineEvent::LinesCleared {
            count,
            rows,
            combo,
            score,
        } => {
            msg.count = Some(*count);
            msg.rows = rows.to_vec();
            msg.combo = Some(*combo);
            msg.points = Some(score.total);
        }
        EngineEvent::NextPieceChanged { kind } | EngineEvent::HoldChanged { kind } => {
            msg.kind = Some(kind.as_str());
        }
        EngineEvent::LevelChanged { level } => {
            msg.level = Some(*level);
        }
        EngineEvent::PieceMoved | EngineEvent::GameOver => {}
    }
    msg
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameConfig, GameState};
    use crate::types::PieceKind;

    #[test]
    fn test_parse_hello() {
        let json = r#"{"type":"hello","seq":1,"ts":1234567890,"client":{"name":"test-ai","version":"1.0.0"},"protocol_version":"1.0.0"}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Hello(msg) => {
                assert_eq!(msg.seq, 1);
                assert_eq!(msg.client.name, "test-ai");
                assert!(msg.stream_observations);
            }
            other => panic!("Expected Hello message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_command() {
        let json =
            r#"{"type":"command","seq":2,"actions":["moveLeft","rotate","HARDDROP","hold"]}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Command(msg) => {
                assert_eq!(
                    msg.actions.0.as_slice(),
                    &[
                        GameAction::MoveLeft,
                        GameAction::Rotate,
                        GameAction::HardDrop,
                        GameAction::Hold
                    ]
                );
            }
            other => panic!("Expected Command message, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_is_parse_error() {
        let json = r#"{"type":"command","seq":2,"actions":["teleport"]}"#;
        assert!(parse_message(json).is_err());
    }

    #[test]
    fn test_too_many_actions() {
        let actions = vec!["\"moveLeft\""; MAX_ACTIONS + 1].join(",");
        let json = format!(r#"{{"type":"command","seq":2,"actions":[{}]}}"#, actions);
        assert!(parse_message(&json).is_err());
    }

    #[test]
    fn test_parse_restart_and_unknown() {
        assert!(matches!(
            parse_message(r#"{"type":"restart","seq":9}"#).unwrap(),
            ParsedMessage::Restart(RestartMessage { seq: 9, .. })
        ));
        assert!(matches!(
            parse_message(r#"{"type":"dance","seq":4}"#).unwrap(),
            ParsedMessage::Unknown(UnknownMessage { seq: 4 })
        ));
        assert!(parse_message("not json").is_err());
    }

    #[test]
    fn test_extract_seq_best_effort() {
        assert_eq!(extract_seq_best_effort(r#"{"seq": 42, "type":"#), Some(42));
        assert_eq!(extract_seq_best_effort(r#"{"type":"x"}"#), None);
    }

    #[test]
    fn test_error_code_wire_names() {
        let err = create_error(3, ErrorCode::NotController, "nope");
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["code"], "not_controller");
        assert_eq!(v["seq"], 3);
    }

    #[test]
    fn test_observation_shape() {
        let mut state = GameState::new(GameConfig::default().with_seed(3));
        state.start_game();
        let obs = build_observation(&state.snapshot(), 5);
        let v = serde_json::to_value(&obs).unwrap();

        assert_eq!(v["type"], "observation");
        assert_eq!(v["board"]["width"], 10);
        assert_eq!(v["board"]["cells"].as_array().unwrap().len(), 20);
        assert!(v["active"]["kind"].is_string());
        assert!(v.get("hold").is_none());
        assert_eq!(v["game_over"], false);
    }

    #[test]
    fn test_event_fields() {
        let v = serde_json::to_value(build_event(
            &EngineEvent::HoldChanged { kind: PieceKind::T },
            1,
        ))
        .unwrap();
        assert_eq!(v["event"], "hold_changed");
        assert_eq!(v["kind"], "t");
        assert!(v.get("rows").is_none());

        let v = serde_json::to_value(build_event(&EngineEvent::LevelChanged { level: 3 }, 2))
            .unwrap();
        assert_eq!(v["level"], 3);
    }
}
