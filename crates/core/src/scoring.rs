//! Scoring module - pure line-clear scoring, leveling, and gravity speed
//!
//! A line clear is scored as
//!
//! ```text
//! round(base × level × combo × back_to_back × perfect_clear × all_clear × t_spin)
//! ```
//!
//! where every factor except `base` and `level` is a multiplier that defaults to 1.0.
//! Nothing here touches engine state, so callers may evaluate it anywhere (including on
//! a worker thread) and get the same answer.

use crate::types::{
    BASE_DROP_MS, DROP_SPEEDUP, HARD_DROP_POINTS_PER_CELL, LINES_PER_LEVEL, LINE_SCORES,
    MAX_START_LEVEL, MIN_LEVEL, SOFT_DROP_POINTS, TICK_MS,
};

/// Everything the score of one clear depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreInput {
    /// Rows removed by this lock (0-4)
    pub lines_cleared: u32,
    /// Level before the clear is applied
    pub level: u32,
    /// Combo counter including this clear (1 on the first clear of a streak)
    pub combo: u32,
    /// Whether the previous clear removed four rows
    pub last_clear_was_tetris: bool,
    /// Whether the grid is empty after the rows are removed
    pub board_empty_after: bool,
    /// Whether a current or next piece is still pending
    pub pieces_pending: bool,
    /// Whether the locking piece was a T with 3+ occupied corners
    pub t_spin: bool,
}

/// Score of one clear with each factor exposed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreResult {
    pub base: u32,
    pub combo_multiplier: f64,
    pub back_to_back_multiplier: f64,
    pub perfect_clear_multiplier: f64,
    pub all_clear_multiplier: f64,
    pub t_spin_multiplier: f64,
    /// Points added to the total score
    pub total: u64,
}

impl ScoreResult {
    pub fn is_back_to_back(&self) -> bool {
        self.back_to_back_multiplier > 1.0
    }

    pub fn is_perfect_clear(&self) -> bool {
        self.perfect_clear_multiplier > 1.0
    }

    pub fn is_t_spin(&self) -> bool {
        self.t_spin_multiplier > 1.0
    }
}

/// Base points for a clear; anything outside 1..=4 scores nothing
pub fn base_score(lines: u32) -> u32 {
    LINE_SCORES.get(lines as usize).copied().unwrap_or(0)
}

/// Combo multiplier: 1.0 up to the first clear, +0.5 per extra clear, capped at 3.0
pub fn combo_multiplier(combo: u32) -> f64 {
    match combo {
        0 | 1 => 1.0,
        2 => 1.5,
        3 => 2.0,
        4 => 2.5,
        _ => 3.0,
    }
}

/// 1.5 when a four-row clear follows another four-row clear
pub fn back_to_back_multiplier(lines: u32, last_clear_was_tetris: bool) -> f64 {
    if lines == 4 && last_clear_was_tetris {
        1.5
    } else {
        1.0
    }
}

/// Bonus for leaving the grid empty, keyed to the rows just cleared
pub fn perfect_clear_multiplier(lines: u32, board_empty_after: bool) -> f64 {
    if !board_empty_after {
        return 1.0;
    }
    match lines {
        1 => 2.0,
        2 => 3.0,
        3 => 4.0,
        4 => 5.0,
        _ => 1.0,
    }
}

/// 2.0 when the grid is empty and no piece is pending
pub fn all_clear_multiplier(board_empty_after: bool, pieces_pending: bool) -> f64 {
    if board_empty_after && !pieces_pending {
        2.0
    } else {
        1.0
    }
}

/// T-spin bonus keyed to rows cleared
pub fn t_spin_multiplier(lines: u32, t_spin: bool) -> f64 {
    if !t_spin {
        return 1.0;
    }
    match lines {
        1 => 2.0,
        2 => 4.0,
        3 => 6.0,
        _ => 1.0,
    }
}

/// Score one line clear
///
/// A zero-line input scores nothing and reports neutral multipliers.
pub fn calculate_score(input: ScoreInput) -> ScoreResult {
    let lines = input.lines_cleared;
    let base = base_score(lines);
    if base == 0 {
        return ScoreResult {
            combo_multiplier: 1.0,
            back_to_back_multiplier: 1.0,
            perfect_clear_multiplier: 1.0,
            all_clear_multiplier: 1.0,
            t_spin_multiplier: 1.0,
            ..ScoreResult::default()
        };
    }

    let combo = combo_multiplier(input.combo);
    let back_to_back = back_to_back_multiplier(lines, input.last_clear_was_tetris);
    let perfect_clear = perfect_clear_multiplier(lines, input.board_empty_after);
    let all_clear = all_clear_multiplier(input.board_empty_after, input.pieces_pending);
    let t_spin = t_spin_multiplier(lines, input.t_spin);

    let raw = base as f64
        * input.level as f64
        * combo
        * back_to_back
        * perfect_clear
        * all_clear
        * t_spin;

    ScoreResult {
        base,
        combo_multiplier: combo,
        back_to_back_multiplier: back_to_back,
        perfect_clear_multiplier: perfect_clear,
        all_clear_multiplier: all_clear,
        t_spin_multiplier: t_spin,
        total: raw.round() as u64,
    }
}

/// Drop points: soft drop +1 per row, hard drop +2 per row
pub fn drop_score(cells: u32, is_hard_drop: bool) -> u32 {
    if is_hard_drop {
        cells * HARD_DROP_POINTS_PER_CELL
    } else {
        cells * SOFT_DROP_POINTS
    }
}

/// Level after `total_lines`, never below the starting level
pub fn level_for_lines(total_lines: u32, starting_level: u32) -> u32 {
    (total_lines / LINES_PER_LEVEL + 1).max(starting_level)
}

/// Clamp a requested starting level to the accepted range
pub fn clamp_start_level(level: u32) -> u32 {
    level.clamp(MIN_LEVEL, MAX_START_LEVEL)
}

/// Gravity interval for a level: `1000ms × 0.8^(level-1)`, truncated, floored at one tick
pub fn drop_interval_ms(level: u32) -> u32 {
    let exponent = (level.max(MIN_LEVEL) - 1).min(1000) as i32;
    let interval = BASE_DROP_MS as f64 * DROP_SPEEDUP.powi(exponent);
    (interval as u32).max(TICK_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(lines: u32, level: u32, combo: u32) -> ScoreInput {
        ScoreInput {
            lines_cleared: lines,
            level,
            combo,
            pieces_pending: true,
            ..ScoreInput::default()
        }
    }

    #[test]
    fn test_base_scores() {
        assert_eq!(base_score(0), 0);
        assert_eq!(base_score(1), 40);
        assert_eq!(base_score(2), 100);
        assert_eq!(base_score(3), 300);
        assert_eq!(base_score(4), 1200);
        assert_eq!(base_score(5), 0);
    }

    #[test]
    fn test_single_at_level_one() {
        let result = calculate_score(input(1, 1, 1));
        assert_eq!(result.total, 40);
        assert!(!result.is_back_to_back());
    }

    #[test]
    fn test_level_multiplies() {
        assert_eq!(calculate_score(input(4, 3, 1)).total, 3600);
    }

    #[test]
    fn test_combo_steps_and_cap() {
        assert_eq!(combo_multiplier(0), 1.0);
        assert_eq!(combo_multiplier(1), 1.0);
        assert_eq!(combo_multiplier(2), 1.5);
        assert_eq!(combo_multiplier(4), 2.5);
        assert_eq!(combo_multiplier(5), 3.0);
        assert_eq!(combo_multiplier(50), 3.0);
        assert_eq!(calculate_score(input(2, 1, 3)).total, 200);
    }

    #[test]
    fn test_back_to_back_tetris() {
        let isolated = calculate_score(input(4, 1, 1));
        let b2b = calculate_score(ScoreInput {
            last_clear_was_tetris: true,
            ..input(4, 1, 1)
        });
        assert_eq!(isolated.total, 1200);
        assert_eq!(b2b.total, 1800);
        assert!(b2b.is_back_to_back());

        // Only four-row clears chain
        let triple = calculate_score(ScoreInput {
            last_clear_was_tetris: true,
            ..input(3, 1, 1)
        });
        assert_eq!(triple.total, 300);
    }

    #[test]
    fn test_perfect_clear_table() {
        for (lines, factor) in [(1, 2.0), (2, 3.0), (3, 4.0), (4, 5.0)] {
            let result = calculate_score(ScoreInput {
                board_empty_after: true,
                ..input(lines, 1, 1)
            });
            assert_eq!(result.perfect_clear_multiplier, factor);
            assert_eq!(result.all_clear_multiplier, 1.0);
        }
    }

    #[test]
    fn test_all_clear_needs_no_pending_pieces() {
        let result = calculate_score(ScoreInput {
            board_empty_after: true,
            pieces_pending: false,
            ..input(1, 1, 1)
        });
        assert_eq!(result.all_clear_multiplier, 2.0);
        // 40 × perfect 2.0 × all-clear 2.0
        assert_eq!(result.total, 160);
    }

    #[test]
    fn test_t_spin_table() {
        let double = calculate_score(ScoreInput {
            t_spin: true,
            ..input(2, 1, 1)
        });
        assert_eq!(double.total, 400);
        assert!(double.is_t_spin());
        assert_eq!(t_spin_multiplier(4, true), 1.0);
    }

    #[test]
    fn test_fractional_multipliers() {
        assert_eq!(calculate_score(input(1, 3, 2)).total, 180);
        assert_eq!(calculate_score(input(2, 1, 4)).total, 250);
        assert_eq!(calculate_score(input(1, 7, 2)).total, 420);
    }

    #[test]
    fn test_zero_lines_scores_nothing() {
        let result = calculate_score(input(0, 5, 0));
        assert_eq!(result.total, 0);
        assert_eq!(result.combo_multiplier, 1.0);
    }

    #[test]
    fn test_drop_scores() {
        assert_eq!(drop_score(10, false), 10);
        assert_eq!(drop_score(10, true), 20);
    }

    #[test]
    fn test_level_for_lines() {
        assert_eq!(level_for_lines(0, 1), 1);
        assert_eq!(level_for_lines(1, 1), 1);
        assert_eq!(level_for_lines(9, 1), 1);
        assert_eq!(level_for_lines(10, 1), 2);
        assert_eq!(level_for_lines(35, 1), 4);
        assert_eq!(level_for_lines(35, 8), 8);
    }

    #[test]
    fn test_drop_intervals() {
        assert_eq!(drop_interval_ms(1), 1000);
        assert_eq!(drop_interval_ms(2), 800);
        assert_eq!(drop_interval_ms(5), 409);
        assert_eq!(drop_interval_ms(0), 1000);
        // 1000 × 0.8^19 ≈ 14.4ms, floored at one tick
        assert_eq!(drop_interval_ms(20), TICK_MS);
        assert_eq!(drop_interval_ms(500), TICK_MS);
    }

    #[test]
    fn test_clamp_start_level() {
        assert_eq!(clamp_start_level(0), 1);
        assert_eq!(clamp_start_level(7), 7);
        assert_eq!(clamp_start_level(99), 20);
    }
}
