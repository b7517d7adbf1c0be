//! Plain-text tables for the CLI.

use std::fmt::{self, Write};

use crate::lottery::models::{LotteryResult, Participation, ProbabilityMatrix, SimulationReport};
use crate::lottery::LotterySetup;

fn team_label(setup: &LotterySetup, team_id: &str) -> String {
    setup
        .index_of(team_id)
        .map(|idx| setup.team(idx).display_name().to_string())
        .unwrap_or_else(|_| team_id.to_string())
}

/// Balls and pool share per team.
pub fn render_balls(setup: &LotterySetup) -> Result<String, fmt::Error> {
    let total: u64 = (0..setup.len()).map(|i| setup.balls(i) as u64).sum();
    let mut out = String::new();
    writeln!(
        out,
        "{:<4} {:<24} {:>8} {:>7}  {}",
        "Rank", "Team", "Balls", "Share", "Status"
    )?;
    for &idx in setup.record_order() {
        let team = setup.team(idx);
        let balls = setup.balls(idx);
        let share = if total == 0 {
            0.0
        } else {
            balls as f64 / total as f64 * 100.0
        };
        let status = match setup.participation(idx) {
            Participation::Locked(pick) => format!("locked #{pick}"),
            Participation::Weighted if balls == 0 => "no balls".to_string(),
            Participation::Weighted => String::new(),
            Participation::Excluded => "excluded".to_string(),
        };
        writeln!(
            out,
            "{:<4} {:<24} {:>8} {:>6.1}%  {}",
            setup.rank(idx),
            team.display_name(),
            balls,
            share,
            status
        )?;
    }
    Ok(out)
}

/// One concrete draft order.
pub fn render_result(setup: &LotterySetup, result: &LotteryResult) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{:>4}  {:<24} {:>7}", "Pick", "Team", "Odds")?;
    for pick in &result.picks {
        let odds = if pick.was_locked {
            "locked".to_string()
        } else {
            format!("{:.1}%", pick.odds_percent)
        };
        writeln!(
            out,
            "{:>4}  {:<24} {:>7}",
            pick.pick,
            team_label(setup, &pick.team_id),
            odds
        )?;
    }
    Ok(out)
}

/// Team × pick grid; zero cells are left blank.
pub fn render_matrix(
    setup: &LotterySetup,
    matrix: &ProbabilityMatrix,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write!(out, "{:<24}", "Team")?;
    for pick in 1..=matrix.picks {
        write!(out, " {:>6}", format!("#{pick}"))?;
    }
    out.push('\n');
    for row in &matrix.rows {
        write!(out, "{:<24}", team_label(setup, &row.team_id))?;
        for percent in &row.percents {
            if *percent > 0.0 {
                write!(out, " {:>6.1}", percent)?;
            } else {
                write!(out, " {:>6}", "")?;
            }
        }
        out.push('\n');
    }
    Ok(out)
}

/// Matrix plus per-team summary from a permutation analysis.
pub fn render_simulation(
    setup: &LotterySetup,
    report: &SimulationReport,
) -> Result<String, fmt::Error> {
    let mut out = render_matrix(setup, &report.matrix)?;
    writeln!(
        out,
        "\n{} trials, {} valid, {} discarded\n",
        report.requested_trials, report.valid_trials, report.discarded_trials
    )?;
    writeln!(
        out,
        "{:<24} {:>9} {:>7} {:>5} {:>6}",
        "Team", "Expected", "Likely", "Best", "Worst"
    )?;
    for s in report.matrix.summaries() {
        writeln!(
            out,
            "{:<24} {:>9.2} {:>7} {:>5} {:>6}",
            team_label(setup, &s.team_id),
            s.expected_pick,
            s.most_likely_pick,
            s.best_pick,
            s.worst_pick
        )?;
    }
    Ok(out)
}
