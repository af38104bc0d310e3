//! Mintris (workspace facade crate).
//!
//! Re-exports the engine crates under `mintris::{core,adapter,types}` and holds the
//! pieces shared by the headless runner: environment configuration and logging setup.

pub mod config;
pub mod logging;

pub use mintris_adapter as adapter;
pub use mintris_core as core;
pub use mintris_types as types;
