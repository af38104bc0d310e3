//! Adapter - drive the engine over a TCP socket with a JSON line protocol
//!
//! Lets external agents (bots, test harnesses, remote renderers) play and watch a game.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: client connects to the TCP socket (default `127.0.0.1:7777`)
//! 2. **Handshake**: client sends `hello`, server answers `welcome` with the assigned role
//! 3. **Controller**: the first client to say hello controls the game; later clients
//!    observe. When the controller disconnects the oldest remaining client takes over.
//! 4. **Streaming**: after each applied command and each gravity step the server
//!    broadcasts `event` messages followed by an `observation`
//! 5. **Commanding**: the controller sends `command` (a list of actions) or `restart`;
//!    each is answered with `ack` once applied, or `error`
//!
//! `seq` must increase strictly per client. Error codes: `handshake_required`,
//! `not_controller`, `invalid_command`, `out_of_order`, `backpressure`,
//! `protocol_mismatch`.
//!
//! # Environment Variables
//!
//! - `MINTRIS_AI_HOST`: bind address (default `127.0.0.1`)
//! - `MINTRIS_AI_PORT`: port number (default 7777)
//! - `MINTRIS_AI_MAX_PENDING`: command queue capacity (default 16)
//! - `MINTRIS_AI_DISABLED`: `1` or `true` disables the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"client":{"name":"my-bot","version":"1.0"}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1700000000000,"protocol_version":"1.0.0","client_id":1,"role":"controller"}
//! Server -> Client: {"type":"observation","seq":1,"ts":1700000000001,"board":{...},"active":{...},...}
//! Client -> Server: {"type":"command","seq":2,"actions":["moveLeft","rotate","hardDrop"]}
//! Server -> Client: {"type":"ack","seq":2,"ts":1700000000002,"status":"ok","applied":3}
//! Server -> Client: {"type":"event","seq":2,"ts":1700000000002,"event":"piece_locked","kind":"t",...}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use mintris_core as core;
pub use mintris_types as types;

pub use runtime::{
    apply_payload, Adapter, EngineBridge, InboundCommand, InboundPayload, OutboundMessage,
};
pub use server::{run_server, ServerConfig};
