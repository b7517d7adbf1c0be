use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team as loaded from the league source. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Opaque identifier from the league source
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub wins: u32,
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    /// Whether the team made the playoffs (excluded from the draw by default)
    #[serde(default)]
    pub playoff: bool,
}

impl Team {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Win percentage with ties counted as half a win. A team with no games
    /// played sits at 0.0.
    pub fn win_pct(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.ties as f64) / games as f64
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Per-team lottery configuration supplied by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLotteryConfig {
    /// Participates in the weighted draw
    #[serde(default = "default_included")]
    pub included: bool,
    /// Weight in the draw. Kept while locked so it can be restored on unlock.
    #[serde(default)]
    pub balls: u32,
    /// Pick is fixed to `manual_pick` and removed from the weighted draw
    #[serde(default)]
    pub locked: bool,
    /// 1-based pick position, required when `locked`
    #[serde(default)]
    pub manual_pick: Option<usize>,
    /// Share of the pool in percent when entering odds directly
    #[serde(default)]
    pub target_percent: Option<f64>,
}

fn default_included() -> bool {
    true
}

impl TeamLotteryConfig {
    /// Default configuration for a freshly loaded team: playoff teams sit out.
    pub fn for_team(team: &Team) -> Self {
        Self {
            included: !team.playoff,
            balls: 0,
            locked: false,
            manual_pick: None,
            target_percent: None,
        }
    }

    #[cfg(test)]
    pub fn with_balls(balls: u32) -> Self {
        Self {
            included: true,
            balls,
            locked: false,
            manual_pick: None,
            target_percent: None,
        }
    }

    #[cfg(test)]
    pub fn locked_at(pick: usize) -> Self {
        Self {
            included: true,
            balls: 0,
            locked: true,
            manual_pick: Some(pick),
            target_percent: None,
        }
    }

    #[cfg(test)]
    pub fn excluded() -> Self {
        Self {
            included: false,
            balls: 0,
            locked: false,
            manual_pick: None,
            target_percent: None,
        }
    }
}

/// Caps how far a team may fall below its record rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallProtection {
    pub enabled: bool,
    /// Allowed positions below record rank (1..=10)
    pub max_spots: usize,
}

/// How a team takes part in a draw once its configuration is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participation {
    /// Fixed to the given 1-based pick
    Locked(usize),
    /// Included in the weighted draw
    Weighted,
    /// Not included; placed after all weighted picks in record order
    Excluded,
}

/// One slot of a concrete draft order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawPick {
    pub pick: usize,
    pub team_id: String,
    /// Closed-form odds of this team landing this pick, one decimal
    pub odds_percent: f64,
    pub was_locked: bool,
}

/// A concrete draft order produced by one draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryResult {
    pub picks: Vec<DrawPick>,
    pub drawn_at: DateTime<Utc>,
}

impl LotteryResult {
    #[cfg(test)]
    pub fn team_at(&self, pick: usize) -> Option<&DrawPick> {
        self.picks.iter().find(|p| p.pick == pick)
    }

    #[cfg(test)]
    pub fn pick_of(&self, team_id: &str) -> Option<usize> {
        self.picks
            .iter()
            .find(|p| p.team_id == team_id)
            .map(|p| p.pick)
    }
}

/// One team's distribution over picks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub team_id: String,
    /// Percent per pick, index 0 = pick 1
    pub percents: Vec<f64>,
}

/// Team × pick probabilities in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityMatrix {
    pub picks: usize,
    pub rows: Vec<MatrixRow>,
}

/// Condensed view of one matrix row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickSummary {
    pub team_id: String,
    pub expected_pick: f64,
    pub most_likely_pick: usize,
    pub best_pick: usize,
    pub worst_pick: usize,
}

impl ProbabilityMatrix {
    #[cfg(test)]
    pub fn row(&self, team_id: &str) -> Option<&MatrixRow> {
        self.rows.iter().find(|r| r.team_id == team_id)
    }

    /// Percent chance `team_id` lands `pick`; 0.0 for unknown teams or picks.
    #[cfg(test)]
    pub fn percent(&self, team_id: &str, pick: usize) -> f64 {
        if pick == 0 {
            return 0.0;
        }
        self.row(team_id)
            .and_then(|r| r.percents.get(pick - 1).copied())
            .unwrap_or(0.0)
    }

    #[cfg(test)]
    pub fn row_sum(&self, team_id: &str) -> f64 {
        self.row(team_id)
            .map(|r| r.percents.iter().sum())
            .unwrap_or(0.0)
    }

    pub fn summaries(&self) -> Vec<PickSummary> {
        self.rows
            .iter()
            .filter_map(|row| {
                let total: f64 = row.percents.iter().sum();
                if total <= 0.0 {
                    return None;
                }
                let expected_pick = row
                    .percents
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (i + 1) as f64 * p)
                    .sum::<f64>()
                    / total;
                let mut most_likely_pick = 1;
                let mut best_percent = f64::MIN;
                for (i, p) in row.percents.iter().enumerate() {
                    if *p > best_percent {
                        best_percent = *p;
                        most_likely_pick = i + 1;
                    }
                }
                let best_pick = row.percents.iter().position(|p| *p > 0.0)? + 1;
                let worst_pick = row.percents.iter().rposition(|p| *p > 0.0)? + 1;
                Some(PickSummary {
                    team_id: row.team_id.clone(),
                    expected_pick,
                    most_likely_pick,
                    best_pick,
                    worst_pick,
                })
            })
            .collect()
    }
}

/// Output of a Monte Carlo permutation analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub matrix: ProbabilityMatrix,
    pub requested_trials: usize,
    pub valid_trials: usize,
    pub discarded_trials: usize,
}

/// Round a percentage to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
