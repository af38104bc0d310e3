//! Core engine - pure, deterministic, and testable
//!
//! Everything needed to play a game of falling tetrominoes with no UI, networking, or
//! I/O. The same seed and the same sequence of calls always produce the same game.
//!
//! # Module Structure
//!
//! - [`board`]: configurable grid of locked cells, collision and line clearing
//! - [`pieces`]: tetromino rotation tables and wall kicks
//! - [`rng`]: seeded 7-bag randomizer
//! - [`scoring`]: pure line-clear scoring, leveling, and gravity speed
//! - [`game_state`]: the state machine tying the above together
//! - [`event`]: events pushed by every mutating call
//! - [`snapshot`]: plain-data copies for renderers and the network adapter
//! - [`stats`]: session totals folded from events
//!
//! # Example
//!
//! ```
//! use mintris_core::{GameConfig, GameState};
//! use mintris_types::GameAction;
//!
//! let mut game = GameState::new(GameConfig::default().with_seed(12345));
//! game.start_game();
//!
//! // Hard drop is refused during the spawn grace period
//! assert!(!game.apply_action(GameAction::HardDrop));
//! game.advance_clock(250);
//!
//! game.apply_action(GameAction::MoveRight);
//! game.apply_action(GameAction::Rotate);
//! assert!(game.apply_action(GameAction::HardDrop));
//! assert!(game.score() > 0);
//! ```
//!
//! # Timing
//!
//! The engine never reads a clock. Call [`GameState::tick`] every frame (normally
//! [`types::TICK_MS`]) with the elapsed time; gravity fires once per
//! [`GameState::drop_interval_ms`].

pub mod board;
pub mod config;
pub mod event;
pub mod game_state;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;
pub mod stats;

pub use mintris_types as types;

pub use board::{Board, ClearedRows};
pub use config::GameConfig;
pub use event::EngineEvent;
pub use game_state::{GameState, Phase};
pub use pieces::{get_shape, try_rotate, Tetromino};
pub use rng::{Bag, SimpleRng};
pub use scoring::{calculate_score, drop_interval_ms, drop_score, ScoreInput, ScoreResult};
pub use snapshot::{ActiveSnapshot, GameSnapshot};
pub use stats::SessionStats;
