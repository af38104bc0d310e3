//! Seeded random play - engine invariants checked after every step

use mintris::core::{GameConfig, GameState, SimpleRng};
use mintris::types::GameAction;

const SEEDS: u32 = 64;
const STEPS_PER_SEED: usize = 3000;

const ACTIONS: [GameAction; 6] = [
    GameAction::MoveLeft,
    GameAction::MoveRight,
    GameAction::SoftDrop,
    GameAction::HardDrop,
    GameAction::Rotate,
    GameAction::Hold,
];

struct Watermarks {
    lines: u32,
    score: u64,
}

fn check(state: &GameState, marks: &mut Watermarks, context: &str) {
    let width = state.board().width() as i32;
    let height = state.board().height() as i32;

    match state.current_piece() {
        Some(piece) => {
            assert!(!state.is_game_over(), "{}: piece present after game over", context);
            for (x, y) in piece.cells() {
                assert!(
                    (0..width).contains(&x) && y < height,
                    "{}: cell ({}, {}) out of bounds",
                    context,
                    x,
                    y
                );
                assert!(
                    !state.is_occupied(x, y),
                    "{}: active cell ({}, {}) overlaps the stack",
                    context,
                    x,
                    y
                );
            }
        }
        None => assert!(state.is_game_over(), "{}: no piece while playing", context),
    }

    assert!(state.lines() >= marks.lines, "{}: lines went down", context);
    assert!(state.score() >= marks.score, "{}: score went down", context);
    assert!(
        state.level() >= state.starting_level(),
        "{}: level {} below starting level {}",
        context,
        state.level(),
        state.starting_level()
    );
    marks.lines = state.lines();
    marks.score = state.score();
}

#[test]
fn test_random_play_keeps_invariants() {
    let mut games = 0;

    for seed in 1..=SEEDS {
        let grace = if seed % 2 == 0 { 0 } else { 250 };
        let mut state = GameState::new(
            GameConfig::default()
                .with_seed(seed)
                .with_starting_level(1 + seed % 3)
                .with_spawn_grace_ms(grace),
        );
        state.start_game();
        games += 1;

        let mut rng = SimpleRng::new(seed.wrapping_mul(7919));
        let mut marks = Watermarks { lines: 0, score: 0 };
        check(&state, &mut marks, "start");

        for step in 0..STEPS_PER_SEED {
            if state.is_game_over() {
                state.start_game();
                games += 1;
                marks = Watermarks { lines: 0, score: 0 };
            }

            let roll = rng.next_range(ACTIONS.len() as u32 + 2) as usize;
            let context = match ACTIONS.get(roll) {
                Some(&action) => {
                    state.apply_action(action);
                    format!("seed {} step {} {:?}", seed, step, action)
                }
                None => {
                    state.tick(16 * (1 + roll as u32));
                    format!("seed {} step {} tick", seed, step)
                }
            };
            check(&state, &mut marks, &context);
            state.take_events();
        }
    }

    assert!(games > SEEDS as usize);
}

#[test]
fn test_random_play_is_reproducible() {
    let play = |seed: u32| {
        let mut state = GameState::new(GameConfig::default().with_seed(seed));
        state.start_game();
        let mut rng = SimpleRng::new(seed);
        for _ in 0..1000 {
            let roll = rng.next_range(ACTIONS.len() as u32 + 1) as usize;
            match ACTIONS.get(roll) {
                Some(&action) => {
                    state.apply_action(action);
                }
                None => {
                    state.tick(100);
                }
            }
        }
        (state.snapshot(), state.take_events())
    };

    for seed in [3, 99, 4242] {
        assert_eq!(play(seed), play(seed));
    }
}
