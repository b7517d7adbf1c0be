//! Worst-to-best ordering of teams by record.
//!
//! Lottery position is driven by record: the worst team is rank 1. Teams with
//! identical records are separated by ball count (more balls is treated as the
//! worse team) and finally by id so the order is stable between runs.

use std::cmp::Ordering;

use super::models::Team;

/// Compare two records, worse record first.
///
/// Order: win percentage, then wins, then losses, then ties, all ascending.
pub fn compare_records(a: &Team, b: &Team) -> Ordering {
    a.win_pct()
        .total_cmp(&b.win_pct())
        .then_with(|| a.wins.cmp(&b.wins))
        .then_with(|| a.losses.cmp(&b.losses))
        .then_with(|| a.ties.cmp(&b.ties))
}

/// Indices of `teams` sorted worst-to-best by record, ties broken by id.
pub fn record_order(teams: &[Team]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..teams.len()).collect();
    order.sort_by(|&a, &b| {
        compare_records(&teams[a], &teams[b]).then_with(|| teams[a].id.cmp(&teams[b].id))
    });
    order
}

/// Indices sorted worst-to-best, with record ties going to the team holding
/// more balls. `balls[i]` belongs to `teams[i]`.
pub fn ranked_order(teams: &[Team], balls: &[u32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..teams.len()).collect();
    order.sort_by(|&a, &b| {
        compare_records(&teams[a], &teams[b])
            .then_with(|| balls[b].cmp(&balls[a]))
            .then_with(|| teams[a].id.cmp(&teams[b].id))
    });
    order
}

/// 1-based record rank per team index (1 = worst record).
pub fn record_ranks(teams: &[Team], balls: &[u32]) -> Vec<usize> {
    let mut ranks = vec![0; teams.len()];
    for (position, idx) in ranked_order(teams, balls).into_iter().enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}
