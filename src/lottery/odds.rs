//! Pre-draw ("pre-lottery") odds.
//!
//! The chance that a team lands pick `n` is estimated sequentially as
//!
//!   P(miss pick 1) · … · P(miss pick n-1) · P(win pick n)
//!
//! where `P(win pick k) = team_balls / pool_balls_k`. After each earlier pick
//! the pool shrinks by the *average* balls of the other eligible teams rather
//! than branching over every possible winner. This is an approximation, not
//! exact order statistics: rows of the resulting table do not sum to exactly
//! 100. Replacing it with full enumeration changes the published numbers and
//! costs exponential time.

use super::error::ConfigurationError;
use super::models::{round1, MatrixRow, ProbabilityMatrix};
use super::setup::LotterySetup;

/// Percent chance (0–100) that team `team` lands `pick`, computed before any
/// draw. Unrounded.
pub fn pre_draw_probability(setup: &LotterySetup, team: usize, pick: usize) -> f64 {
    if pick == 0 || pick > setup.len() {
        return 0.0;
    }
    if let Some(locked) = setup.locked_pick(team) {
        return if locked == pick { 100.0 } else { 0.0 };
    }
    if setup.is_locked_pick(pick) || !setup.in_pool(team) || !setup.is_eligible(team, pick) {
        return 0.0;
    }

    let team_balls = setup.balls(team) as f64;
    let others: Vec<usize> = setup.pool().into_iter().filter(|&i| i != team).collect();

    let mut survive = 1.0;
    let mut reduction = 0.0;

    for k in 1..=pick {
        if setup.is_locked_pick(k) {
            continue;
        }

        let (others_sum, others_count) = others
            .iter()
            .filter(|&&o| setup.is_eligible(o, k))
            .fold((0.0, 0usize), |(sum, count), &o| {
                (sum + setup.balls(o) as f64, count + 1)
            });
        let remaining_others = (others_sum - reduction).max(0.0);
        let team_eligible = setup.is_eligible(team, k);
        let pool_balls = remaining_others + if team_eligible { team_balls } else { 0.0 };

        if k == pick {
            if pool_balls <= 0.0 {
                return 0.0;
            }
            return (survive * team_balls / pool_balls * 100.0).clamp(0.0, 100.0);
        }

        if team_eligible && pool_balls > 0.0 {
            survive *= 1.0 - team_balls / pool_balls;
        }
        if survive <= 0.0 {
            return 0.0;
        }
        // someone else took pick k: expect an average-sized ticket holder gone
        if others_count > 0 {
            reduction += others_sum / others_count as f64;
        }
    }

    0.0
}

/// [`pre_draw_probability`] addressed by team id, with range checks.
pub fn pre_draw_probability_for(
    setup: &LotterySetup,
    team_id: &str,
    pick: usize,
) -> Result<f64, ConfigurationError> {
    let team = setup.index_of(team_id)?;
    if !(1..=setup.len()).contains(&pick) {
        return Err(ConfigurationError::PickOutOfRange {
            team: team_id.to_string(),
            pick,
            total: setup.len(),
        });
    }
    Ok(pre_draw_probability(setup, team, pick))
}

/// Closed-form odds for every team and pick, rounded to one decimal.
///
/// Locked teams sit at 100% on their pick; teams outside the weighted pool sit
/// at 100% on their fallback position after the weighted picks.
pub fn odds_table(setup: &LotterySetup) -> ProbabilityMatrix {
    let n = setup.len();
    let mut rows: Vec<MatrixRow> = setup
        .teams()
        .iter()
        .map(|t| MatrixRow {
            team_id: t.id.clone(),
            percents: vec![0.0; n],
        })
        .collect();

    for (idx, row) in rows.iter_mut().enumerate() {
        if setup.in_pool(idx) {
            for pick in 1..=n {
                row.percents[pick - 1] = round1(pre_draw_probability(setup, idx, pick));
            }
        } else if let Some(pick) = setup.locked_pick(idx) {
            row.percents[pick - 1] = 100.0;
        }
    }
    for (pick, idx) in setup.fallback_positions() {
        rows[idx].percents[pick - 1] = 100.0;
    }

    ProbabilityMatrix { picks: n, rows }
}
