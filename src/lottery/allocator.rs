//! Default ball allocation from record rank.
//!
//! The worst team starts from a relative weight of 26 and each better team
//! drops by 4, floored at 2. Weights are scaled against a 1000-ball pool and
//! the worst team is pinned to exactly 26% of the integer total, with the
//! rest of the pool shared out proportionally among everyone else. In leagues
//! of two to four teams this leaves the worst team below the next one.
//!
//! These are only defaults for seeding a configuration; callers may override
//! any value.

use super::error::{ConfigurationError, MAX_PERCENT_TOTAL};
use super::models::Team;
use super::standings;

/// Share of the pool reserved for the worst team.
pub const WORST_TEAM_SHARE: f64 = 0.26;
/// Relative weight of the worst team.
const RELATIVE_TOP: u32 = 26;
/// Relative weight lost per rank.
const RELATIVE_STEP: u32 = 4;
/// Lowest relative weight any team can have.
const RELATIVE_FLOOR: u32 = 2;
/// Balls in the base pool.
pub const BASE_POOL: u32 = 1000;

fn relative_weight(position: usize) -> u32 {
    let step = RELATIVE_STEP.saturating_mul(position as u32);
    RELATIVE_TOP.saturating_sub(step).max(RELATIVE_FLOOR)
}

/// Default balls for every team in `teams`, which should already be limited
/// to the teams taking part. Returned in worst-to-best order.
pub fn default_balls(teams: &[Team]) -> Vec<(String, u32)> {
    let order = standings::record_order(teams);
    match order.len() {
        0 => return Vec::new(),
        1 => return vec![(teams[order[0]].id.clone(), BASE_POOL)],
        _ => {}
    }

    let relative: Vec<u32> = (0..order.len()).map(relative_weight).collect();
    let worst = (WORST_TEAM_SHARE * BASE_POOL as f64).round() as u32;
    let others = apportion(&relative[1..], BASE_POOL - worst);

    std::iter::once(worst)
        .chain(others)
        .zip(order)
        .map(|(balls, idx)| (teams[idx].id.clone(), balls))
        .collect()
}

/// Split `total` integer balls proportionally to `weights` (largest remainder).
/// Every entry gets at least one ball.
fn apportion(weights: &[u32], total: u32) -> Vec<u32> {
    let weight_sum: u32 = weights.iter().sum();
    if weight_sum == 0 {
        return vec![1; weights.len()];
    }

    let exact: Vec<f64> = weights
        .iter()
        .map(|&w| w as f64 / weight_sum as f64 * total as f64)
        .collect();
    let mut shares: Vec<u32> = exact.iter().map(|x| x.floor() as u32).collect();
    let assigned: u32 = shares.iter().sum();

    let mut by_fraction: Vec<usize> = (0..weights.len()).collect();
    by_fraction.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa).then(a.cmp(&b))
    });
    for &i in by_fraction.iter().take(total.saturating_sub(assigned) as usize) {
        shares[i] += 1;
    }

    shares.into_iter().map(|s| s.max(1)).collect()
}

/// Convert a target percentage into balls against the base pool.
pub fn balls_for_percent(percent: f64) -> u32 {
    if percent <= 0.0 {
        return 0;
    }
    ((percent / 100.0 * BASE_POOL as f64).round() as u32).max(1)
}

/// Convert explicit percentages into balls, rejecting invalid entries and
/// totals above 100% (plus rounding buffer).
pub fn balls_from_percentages(
    entries: &[(String, f64)],
) -> Result<Vec<(String, u32)>, ConfigurationError> {
    let mut total = 0.0;
    for (team, percent) in entries {
        if !percent.is_finite() || !(0.0..=100.0).contains(percent) {
            return Err(ConfigurationError::InvalidPercentage {
                team: team.clone(),
                percent: *percent,
            });
        }
        total += percent;
    }
    if total > MAX_PERCENT_TOTAL {
        return Err(ConfigurationError::PercentagesExceedTotal { total });
    }
    Ok(entries
        .iter()
        .map(|(team, percent)| (team.clone(), balls_for_percent(*percent)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn teams(n: usize) -> Vec<Team> {
        // t0 has the worst record, t{n-1} the best
        (0..n)
            .map(|i| Team {
                id: format!("t{i}"),
                name: None,
                wins: i as u32,
                losses: (n - i) as u32,
                ties: 0,
                playoff: false,
            })
            .collect()
    }

    fn total(balls: &[(String, u32)]) -> u32 {
        balls.iter().map(|(_, b)| *b).sum()
    }

    #[test]
    fn single_team_gets_whole_pool() {
        let balls = default_balls(&teams(1));
        assert_eq!(balls, vec![("t0".to_string(), BASE_POOL)]);
    }

    #[test]
    fn empty_input_gives_nothing() {
        assert!(default_balls(&[]).is_empty());
    }

    #[test]
    fn fourteen_team_league_pins_worst_at_26_percent() {
        let balls = default_balls(&teams(14));
        assert_eq!(balls.len(), 14);
        assert_eq!(balls[0].0, "t0");
        assert_eq!(balls[0].1, 260);
        assert_eq!(total(&balls), BASE_POOL);
        assert_relative_eq!(balls[0].1 as f64 / total(&balls) as f64, 0.26, epsilon = 1e-9);
    }

    #[test]
    fn weights_never_increase_with_better_record() {
        let balls = default_balls(&teams(14));
        for pair in balls.windows(2) {
            assert!(pair[0].1 >= pair[1].1, "{:?} before {:?}", pair[0], pair[1]);
        }
        // floor teams share the same weight
        assert_eq!(balls[12].1, balls[13].1);
        assert!(balls.iter().all(|(_, b)| *b > 0));
    }

    #[test]
    fn small_league_still_pins_worst_at_26_percent() {
        // remainder 740 over 22/18/14: 301.48, 246.67, 191.85
        let balls = default_balls(&teams(4));
        let values: Vec<u32> = balls.iter().map(|(_, b)| *b).collect();
        assert_eq!(values, vec![260, 301, 247, 192]);
    }

    #[test]
    fn worst_share_is_26_percent_for_every_league_size() {
        for n in 2..=20 {
            let balls = default_balls(&teams(n));
            assert_eq!(total(&balls), BASE_POOL, "{n} teams");
            assert_eq!(balls[0].1, 260, "{n} teams");
            assert_relative_eq!(balls[0].1 as f64 / total(&balls) as f64, 0.26, epsilon = 1e-9);
        }
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut shuffled = teams(6);
        shuffled.reverse();
        assert_eq!(default_balls(&shuffled), default_balls(&teams(6)));
    }

    #[test]
    fn percentages_convert_against_base_pool() {
        let balls = balls_from_percentages(&[
            ("a".into(), 14.0),
            ("b".into(), 0.05),
            ("c".into(), 0.0),
        ])
        .unwrap();
        assert_eq!(balls[0].1, 140);
        assert_eq!(balls[1].1, 1);
        assert_eq!(balls[2].1, 0);
    }

    #[test]
    fn percentages_over_total_rejected() {
        let err = balls_from_percentages(&[("a".into(), 70.0), ("b".into(), 30.5)]).unwrap_err();
        assert!(matches!(err, ConfigurationError::PercentagesExceedTotal { .. }));
        let err = balls_from_percentages(&[("a".into(), -1.0)]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPercentage { .. }));
    }
}
