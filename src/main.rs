//! Headless runner (default binary).
//!
//! Owns one engine and drives it at a fixed tick. With the adapter enabled, remote
//! clients control the game and it runs until interrupted; with
//! `MINTRIS_AI_DISABLED=1` pieces only fall under gravity and the runner exits at game
//! over, logging the session totals.

use std::time::{Duration, Instant};

use anyhow::Result;
use log::info;

use mintris::adapter::Adapter;
use mintris::config::AppConfig;
use mintris::core::{GameState, SessionStats};
use mintris::logging;
use mintris::types::TICK_MS;

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    let _log_handle = logging::init(&config.log)?;
    info!(
        "mintris {} starting: {}x{} board, level {}, seed {}",
        env!("CARGO_PKG_VERSION"),
        config.game.width,
        config.game.height,
        config.game.starting_level,
        config.game.seed
    );

    let adapter = Adapter::start_from_env()?;
    run(GameState::new(config.game), adapter)
}

fn run(mut game: GameState, mut adapter: Option<Adapter>) -> Result<()> {
    let mut stats = SessionStats::new();
    let tick = Duration::from_millis(TICK_MS as u64);
    let mut next_tick = Instant::now();

    game.start_game();

    loop {
        if let Some(adapter) = adapter.as_mut() {
            adapter.drain_commands(&mut game);
        }

        game.tick(TICK_MS);

        let events = game.take_events();
        if !events.is_empty() {
            stats.record_all(&events);
            if let Some(adapter) = adapter.as_mut() {
                adapter.publish(&events, &game.snapshot());
            }
        }

        if game.is_game_over() && adapter.is_none() {
            break;
        }

        next_tick += tick;
        let now = Instant::now();
        if next_tick > now {
            std::thread::sleep(next_tick - now);
        } else {
            // Fell behind; do not try to catch up with a burst of ticks
            next_tick = now;
        }
    }

    info!(
        "session over: score {} lines {} level {} pieces {} tetrises {} max combo {}",
        game.score(),
        game.lines(),
        game.level(),
        stats.pieces_locked,
        stats.tetrises,
        stats.max_combo
    );
    Ok(())
}
