//! Monte Carlo permutation analysis.
//!
//! Every trial seeds the locked picks and the fixed positions of teams outside
//! the weighted pool, then draws the weighted picks in order from teams that
//! fall protection still allows. A team stranded past its deadline is put back
//! by bumping occupants to worse picks they are still allowed to take (an
//! augmenting chain of swaps, depth bounded by the team count). Trials that
//! cannot be repaired are discarded rather than counted.

use rand::Rng;
use tracing::{debug, info, warn};

use super::draw::weighted_choice;
use super::error::{ConfigurationError, TrialError};
use super::models::{round1, MatrixRow, ProbabilityMatrix, SimulationReport};
use super::setup::LotterySetup;

pub const DEFAULT_TRIALS: usize = 10_000;

/// Share of discarded trials above which a warning is logged.
const DISCARD_WARN_RATIO: f64 = 0.10;

/// Everything a trial needs that does not change between trials.
struct TrialPlan<'a> {
    setup: &'a LotterySetup,
    /// Locked and fixed assignments, index = pick - 1
    base: Vec<Option<usize>>,
    /// Picks decided by weighted draw, ascending
    weighted_slots: Vec<usize>,
    /// Weighted teams, worst record first
    pool: Vec<usize>,
}

impl<'a> TrialPlan<'a> {
    fn new(setup: &'a LotterySetup) -> Self {
        let n = setup.len();
        let mut base = vec![None; n];
        for (&pick, &idx) in setup.locks() {
            base[pick - 1] = Some(idx);
        }
        for (pick, idx) in setup.fallback_positions() {
            base[pick - 1] = Some(idx);
        }

        let pool: Vec<usize> = setup
            .record_order()
            .iter()
            .copied()
            .filter(|&i| setup.in_pool(i))
            .collect();
        let weighted_slots = setup.open_picks().into_iter().take(pool.len()).collect();

        Self {
            setup,
            base,
            weighted_slots,
            pool,
        }
    }

    /// Run one trial. Returns the team index per pick.
    fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<usize>, TrialError> {
        let setup = self.setup;
        let mut slots = self.base.clone();
        let mut remaining = self.pool.clone();

        for &pick in &self.weighted_slots {
            let eligible: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| setup.is_eligible(i, pick))
                .collect();
            if let Some(idx) = weighted_choice(setup, &eligible, rng) {
                slots[pick - 1] = Some(idx);
                remaining.retain(|&i| i != idx);
            }
        }

        for team in remaining {
            let mut visited = vec![false; setup.len()];
            if !self.place(team, 0, &mut slots, &mut visited, 0) {
                return Err(TrialError::InvalidTrial {
                    team: setup.team(team).id.clone(),
                    deadline: setup.deadline(team).unwrap_or(setup.len()),
                });
            }
        }

        self.validate(slots)
    }

    /// Put `team` on the lowest weighted pick in `(after, deadline]`, moving the
    /// current occupant to a later pick it may still take when needed.
    fn place(
        &self,
        team: usize,
        after: usize,
        slots: &mut [Option<usize>],
        visited: &mut [bool],
        depth: usize,
    ) -> bool {
        let setup = self.setup;
        if depth > setup.len() {
            return false;
        }
        let limit = setup.deadline(team).unwrap_or(setup.len());

        for &pick in &self.weighted_slots {
            if pick <= after || visited[pick - 1] {
                continue;
            }
            if pick > limit {
                break;
            }
            visited[pick - 1] = true;
            match slots[pick - 1] {
                None => {
                    slots[pick - 1] = Some(team);
                    return true;
                }
                Some(occupant) => {
                    let can_move = setup.deadline(occupant).map_or(true, |d| d > pick);
                    if can_move && self.place(occupant, pick, slots, visited, depth + 1) {
                        debug!(
                            "Bumped '{}' from pick {} to seat '{}'",
                            setup.team(occupant).id,
                            pick,
                            setup.team(team).id
                        );
                        slots[pick - 1] = Some(team);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Every pick filled and every weighted team within its deadline.
    fn validate(&self, slots: Vec<Option<usize>>) -> Result<Vec<usize>, TrialError> {
        let setup = self.setup;
        let mut assigned = Vec::with_capacity(slots.len());
        for (i, slot) in slots.into_iter().enumerate() {
            let pick = i + 1;
            let idx = slot.ok_or(TrialError::EmptyPool { pick })?;
            if setup.in_pool(idx) && !setup.is_eligible(idx, pick) {
                return Err(TrialError::InvalidTrial {
                    team: setup.team(idx).id.clone(),
                    deadline: setup.deadline(idx).unwrap_or(setup.len()),
                });
            }
            assigned.push(idx);
        }
        Ok(assigned)
    }
}

/// Estimate the full team × pick distribution from `trials` independent draws.
///
/// Percentages are normalised by the number of valid trials. Fails when the
/// configuration cannot be drawn at all or when every trial had to be
/// discarded.
pub fn simulate<R: Rng + ?Sized>(
    setup: &LotterySetup,
    trials: usize,
    rng: &mut R,
) -> Result<SimulationReport, ConfigurationError> {
    if trials == 0 {
        return Err(ConfigurationError::NoTrials);
    }
    setup.ensure_drawable()?;

    let n = setup.len();
    let plan = TrialPlan::new(setup);
    let mut counts = vec![vec![0u32; n]; n];
    let mut valid = 0usize;

    for trial in 0..trials {
        match plan.run(rng) {
            Ok(order) => {
                for (i, idx) in order.into_iter().enumerate() {
                    counts[idx][i] += 1;
                }
                valid += 1;
            }
            Err(e) => debug!("Discarding trial {}: {}", trial, e),
        }
    }

    if valid == 0 {
        return Err(ConfigurationError::Unsatisfiable { trials });
    }

    let discarded = trials - valid;
    info!(
        "Permutation analysis: {} of {} trials valid ({} discarded)",
        valid, trials, discarded
    );
    if discarded as f64 / trials as f64 > DISCARD_WARN_RATIO {
        warn!(
            "{:.1}% of trials violated fall protection and were discarded",
            discarded as f64 / trials as f64 * 100.0
        );
    }

    let rows = setup
        .teams()
        .iter()
        .zip(&counts)
        .map(|(team, row)| MatrixRow {
            team_id: team.id.clone(),
            percents: row
                .iter()
                .map(|&c| round1(c as f64 / valid as f64 * 100.0))
                .collect(),
        })
        .collect();

    Ok(SimulationReport {
        matrix: ProbabilityMatrix { picks: n, rows },
        requested_trials: trials,
        valid_trials: valid,
        discarded_trials: discarded,
    })
}
