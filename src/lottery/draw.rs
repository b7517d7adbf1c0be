use chrono::Utc;
use rand::Rng;
use tracing::debug;

use super::error::ConfigurationError;
use super::models::{round1, DrawPick, LotteryResult};
use super::odds::pre_draw_probability;
use super::setup::LotterySetup;

/// Pick one index from `pool` with probability proportional to its balls.
///
/// Returns `None` when the pool is empty or holds no balls.
pub fn weighted_choice<R: Rng + ?Sized>(
    setup: &LotterySetup,
    pool: &[usize],
    rng: &mut R,
) -> Option<usize> {
    let total: u64 = pool.iter().map(|&i| setup.balls(i) as u64).sum();
    if total == 0 {
        return None;
    }
    let roll = rng.gen_range(0..total);
    let mut cumulative = 0u64;
    for &idx in pool {
        cumulative += setup.balls(idx) as u64;
        if cumulative > roll {
            return Some(idx);
        }
    }
    None
}

/// Run one lottery and produce a concrete draft order.
///
/// Locked picks are placed first. Every other pick, in order, is drawn from
/// the still-unassigned weighted teams that fall protection allows at that
/// pick. When nobody in the pool can take a pick, the worst remaining team
/// outside the pool gets it (odds 0); if none is left, the worst remaining
/// weighted team does.
pub fn draw<R: Rng + ?Sized>(
    setup: &LotterySetup,
    rng: &mut R,
) -> Result<LotteryResult, ConfigurationError> {
    setup.ensure_drawable()?;

    let n = setup.len();
    let mut slots: Vec<Option<DrawPick>> = vec![None; n];
    let mut assigned = vec![false; n];

    for (&pick, &idx) in setup.locks() {
        slots[pick - 1] = Some(DrawPick {
            pick,
            team_id: setup.team(idx).id.clone(),
            odds_percent: 100.0,
            was_locked: true,
        });
        assigned[idx] = true;
    }

    for pick in 1..=n {
        if slots[pick - 1].is_some() {
            continue;
        }

        let pool: Vec<usize> = (0..n)
            .filter(|&i| !assigned[i] && setup.in_pool(i) && setup.is_eligible(i, pick))
            .collect();

        let entry = match weighted_choice(setup, &pool, rng) {
            Some(idx) => {
                assigned[idx] = true;
                DrawPick {
                    pick,
                    team_id: setup.team(idx).id.clone(),
                    odds_percent: round1(pre_draw_probability(setup, idx, pick)),
                    was_locked: false,
                }
            }
            None => {
                let idx = fallback_team(setup, &assigned).ok_or(ConfigurationError::NothingToDraw)?;
                debug!(
                    "Pick {} has no eligible weighted team; assigning '{}' by record",
                    pick,
                    setup.team(idx).id
                );
                assigned[idx] = true;
                DrawPick {
                    pick,
                    team_id: setup.team(idx).id.clone(),
                    odds_percent: 0.0,
                    was_locked: false,
                }
            }
        };
        slots[pick - 1] = Some(entry);
    }

    Ok(LotteryResult {
        picks: slots.into_iter().flatten().collect(),
        drawn_at: Utc::now(),
    })
}

/// Worst remaining team outside the weighted pool, else the worst remaining
/// weighted team (one stranded by fall protection).
fn fallback_team(setup: &LotterySetup, assigned: &[bool]) -> Option<usize> {
    let order = setup.record_order();
    order
        .iter()
        .copied()
        .find(|&i| !assigned[i] && !setup.in_pool(i))
        .or_else(|| order.iter().copied().find(|&i| !assigned[i]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lottery::models::{FallProtection, Team, TeamLotteryConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn team(id: &str, wins: u32) -> Team {
        Team {
            id: id.into(),
            name: None,
            wins,
            losses: 10 - wins,
            ties: 0,
            playoff: false,
        }
    }

    fn league() -> Vec<Team> {
        vec![team("A", 1), team("B", 2), team("C", 3), team("D", 4)]
    }

    fn configs(balls: [u32; 4]) -> HashMap<String, TeamLotteryConfig> {
        league()
            .iter()
            .zip(balls)
            .map(|(t, b)| (t.id.clone(), TeamLotteryConfig::with_balls(b)))
            .collect()
    }

    fn assert_permutation(result: &LotteryResult, n: usize) {
        assert_eq!(result.picks.len(), n);
        let picks: HashSet<usize> = result.picks.iter().map(|p| p.pick).collect();
        assert_eq!(picks, (1..=n).collect());
        let teams: HashSet<&str> = result.picks.iter().map(|p| p.team_id.as_str()).collect();
        assert_eq!(teams.len(), n);
    }

    #[test]
    fn produces_a_permutation() {
        let setup = LotterySetup::new(league(), &configs([10, 5, 3, 2]), None).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let result = draw(&setup, &mut rng).unwrap();
            assert_permutation(&result, 4);
            for (i, p) in result.picks.iter().enumerate() {
                assert_eq!(p.pick, i + 1);
                assert!(!p.was_locked);
            }
        }
    }

    #[test]
    fn locked_team_keeps_its_pick() {
        let mut cfg = configs([10, 5, 3, 2]);
        cfg.insert("D".to_string(), TeamLotteryConfig::locked_at(1));
        let setup = LotterySetup::new(league(), &cfg, None).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let result = draw(&setup, &mut rng).unwrap();
            assert_permutation(&result, 4);
            let first = result.team_at(1).unwrap();
            assert_eq!(first.team_id, "D");
            assert!(first.was_locked);
            assert!(result.picks[1..].iter().all(|p| p.team_id != "D" && !p.was_locked));
        }
    }

    #[test]
    fn zero_ball_team_only_takes_leftover_slot() {
        let setup = LotterySetup::new(league(), &configs([10, 0, 3, 2]), None).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let result = draw(&setup, &mut rng).unwrap();
            let b = result.picks.iter().find(|p| p.team_id == "B").unwrap();
            assert_eq!(b.pick, 4);
            assert_eq!(b.odds_percent, 0.0);
        }
    }

    #[test]
    fn excluded_teams_follow_weighted_picks_worst_first() {
        let mut cfg = configs([10, 5, 3, 2]);
        cfg.insert("C".to_string(), TeamLotteryConfig::excluded());
        cfg.insert("A".to_string(), TeamLotteryConfig::excluded());
        let setup = LotterySetup::new(league(), &cfg, None).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let result = draw(&setup, &mut rng).unwrap();
        assert_eq!(result.pick_of("A"), Some(3));
        assert_eq!(result.pick_of("C"), Some(4));
    }

    #[test]
    fn single_team_draw_is_deterministic() {
        let teams = vec![team("solo", 2)];
        let mut cfg = HashMap::new();
        cfg.insert("solo".to_string(), TeamLotteryConfig::with_balls(1));
        let setup = LotterySetup::new(teams, &cfg, None).unwrap();
        let result = draw(&setup, &mut rand::thread_rng()).unwrap();
        assert_eq!(result.picks.len(), 1);
        assert_eq!(result.picks[0].team_id, "solo");
        assert_eq!(result.picks[0].odds_percent, 100.0);
    }

    #[test]
    fn refuses_when_nothing_to_draw() {
        let cfg: HashMap<String, TeamLotteryConfig> = league()
            .iter()
            .map(|t| (t.id.clone(), TeamLotteryConfig::excluded()))
            .collect();
        let setup = LotterySetup::new(league(), &cfg, None).unwrap();
        let err = draw(&setup, &mut rand::thread_rng()).unwrap_err();
        assert_eq!(err, ConfigurationError::NothingToDraw);
    }

    #[test]
    fn heavy_favourite_wins_most_first_picks() {
        let setup = LotterySetup::new(league(), &configs([90, 5, 3, 2]), None).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let wins = (0..2000)
            .filter(|_| draw(&setup, &mut rng).unwrap().picks[0].team_id == "A")
            .count();
        assert!(wins > 1700, "A won pick 1 only {} times", wins);
    }

    #[test]
    fn recorded_odds_match_estimator() {
        let setup = LotterySetup::new(league(), &configs([10, 5, 3, 2]), None).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let result = draw(&setup, &mut rng).unwrap();
        let first = &result.picks[0];
        let idx = setup.index_of(&first.team_id).unwrap();
        assert_eq!(first.odds_percent, round1(pre_draw_probability(&setup, idx, 1)));
    }

    #[test]
    fn fall_protection_draw_still_yields_full_order() {
        let fp = FallProtection {
            enabled: true,
            max_spots: 1,
        };
        // A is often stranded past pick 2 and lands on the leftover slot
        let setup = LotterySetup::new(league(), &configs([1, 50, 50, 50]), Some(fp)).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..300 {
            let result = draw(&setup, &mut rng).unwrap();
            assert_permutation(&result, 4);
        }
    }

    #[test]
    fn weighted_choice_respects_weights() {
        let setup = LotterySetup::new(league(), &configs([0, 5, 0, 0]), None).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(weighted_choice(&setup, &[0, 1, 2], &mut rng), Some(1));
        assert_eq!(weighted_choice(&setup, &[0, 2], &mut rng), None);
        assert_eq!(weighted_choice(&setup, &[], &mut rng), None);
    }
}
