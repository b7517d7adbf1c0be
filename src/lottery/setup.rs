use std::collections::{BTreeMap, HashMap, HashSet};

use super::error::{ConfigurationError, MAX_BALLS, MAX_PERCENT_TOTAL};
use super::models::{FallProtection, Participation, Team, TeamLotteryConfig};
use super::standings;

/// Validated, immutable snapshot of a lottery configuration.
///
/// Built once per computation from the team list and per-team configs. All
/// engine operations read from it; none mutate it. Teams are addressed by their
/// index in the original team list.
#[derive(Debug, Clone)]
pub struct LotterySetup {
    teams: Vec<Team>,
    configs: Vec<TeamLotteryConfig>,
    participation: Vec<Participation>,
    /// Effective balls: zero unless the team is in the weighted draw
    balls: Vec<u32>,
    ranks: Vec<usize>,
    record_order: Vec<usize>,
    /// pick -> team index
    locks: BTreeMap<usize, usize>,
    fall_protection: Option<FallProtection>,
}

impl LotterySetup {
    /// Validate the configuration and build the snapshot.
    ///
    /// Teams without an entry in `configs` get [`TeamLotteryConfig::for_team`].
    /// A disabled fall-protection config is treated as absent.
    pub fn new(
        teams: Vec<Team>,
        configs: &HashMap<String, TeamLotteryConfig>,
        fall_protection: Option<FallProtection>,
    ) -> Result<Self, ConfigurationError> {
        if teams.is_empty() {
            return Err(ConfigurationError::NoTeams);
        }
        let total = teams.len();

        let mut seen = HashSet::new();
        for team in &teams {
            if !seen.insert(team.id.as_str()) {
                return Err(ConfigurationError::DuplicateTeam(team.id.clone()));
            }
        }
        if let Some(unknown) = configs.keys().find(|id| !seen.contains(id.as_str())) {
            return Err(ConfigurationError::UnknownTeam(unknown.clone()));
        }

        let fall_protection = match fall_protection {
            Some(fp) if fp.enabled => {
                if !(1..=10).contains(&fp.max_spots) {
                    return Err(ConfigurationError::FallProtectionOutOfRange(fp.max_spots));
                }
                Some(fp)
            }
            _ => None,
        };

        let configs: Vec<TeamLotteryConfig> = teams
            .iter()
            .map(|t| {
                configs
                    .get(&t.id)
                    .cloned()
                    .unwrap_or_else(|| TeamLotteryConfig::for_team(t))
            })
            .collect();

        let mut locks: BTreeMap<usize, usize> = BTreeMap::new();
        let mut participation = Vec::with_capacity(total);
        let mut balls = Vec::with_capacity(total);
        let mut percent_total = 0.0;

        for (idx, (team, config)) in teams.iter().zip(&configs).enumerate() {
            if config.balls > MAX_BALLS {
                return Err(ConfigurationError::BallsOutOfRange {
                    team: team.id.clone(),
                    balls: config.balls,
                });
            }

            if config.locked {
                let pick = config
                    .manual_pick
                    .ok_or_else(|| ConfigurationError::MissingManualPick(team.id.clone()))?;
                if !(1..=total).contains(&pick) {
                    return Err(ConfigurationError::PickOutOfRange {
                        team: team.id.clone(),
                        pick,
                        total,
                    });
                }
                if let Some(&other) = locks.get(&pick) {
                    return Err(ConfigurationError::DuplicateLockedPick {
                        pick,
                        first: teams[other].id.clone(),
                        second: team.id.clone(),
                    });
                }
                locks.insert(pick, idx);
                participation.push(Participation::Locked(pick));
                balls.push(0);
            } else if config.included {
                if let Some(percent) = config.target_percent {
                    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
                        return Err(ConfigurationError::InvalidPercentage {
                            team: team.id.clone(),
                            percent,
                        });
                    }
                    percent_total += percent;
                }
                participation.push(Participation::Weighted);
                balls.push(config.balls);
            } else {
                participation.push(Participation::Excluded);
                balls.push(0);
            }
        }

        if percent_total > MAX_PERCENT_TOTAL {
            return Err(ConfigurationError::PercentagesExceedTotal {
                total: percent_total,
            });
        }

        let ranks = standings::record_ranks(&teams, &balls);
        let record_order = standings::record_order(&teams);

        Ok(Self {
            teams,
            configs,
            participation,
            balls,
            ranks,
            record_order,
            locks,
            fall_protection,
        })
    }

    /// Number of teams, which is also the number of picks.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, idx: usize) -> &Team {
        &self.teams[idx]
    }

    #[cfg(test)]
    pub fn config(&self, idx: usize) -> &TeamLotteryConfig {
        &self.configs[idx]
    }

    pub fn index_of(&self, team_id: &str) -> Result<usize, ConfigurationError> {
        self.teams
            .iter()
            .position(|t| t.id == team_id)
            .ok_or_else(|| ConfigurationError::UnknownTeam(team_id.to_string()))
    }

    pub fn participation(&self, idx: usize) -> Participation {
        self.participation[idx]
    }

    /// Balls the team holds in the weighted draw (0 when locked or excluded).
    pub fn balls(&self, idx: usize) -> u32 {
        self.balls[idx]
    }

    /// 1-based record rank (1 = worst).
    pub fn rank(&self, idx: usize) -> usize {
        self.ranks[idx]
    }

    pub fn locks(&self) -> &BTreeMap<usize, usize> {
        &self.locks
    }

    pub fn locked_pick(&self, idx: usize) -> Option<usize> {
        match self.participation[idx] {
            Participation::Locked(pick) => Some(pick),
            _ => None,
        }
    }

    pub fn is_locked_pick(&self, pick: usize) -> bool {
        self.locks.contains_key(&pick)
    }

    pub fn fall_protection(&self) -> Option<FallProtection> {
        self.fall_protection
    }

    /// Worst pick the team may receive under fall protection.
    pub fn deadline(&self, idx: usize) -> Option<usize> {
        self.fall_protection
            .map(|fp| self.ranks[idx] + fp.max_spots)
    }

    /// Whether fall protection allows the team to take `pick`.
    pub fn is_eligible(&self, idx: usize, pick: usize) -> bool {
        self.deadline(idx).map_or(true, |deadline| pick <= deadline)
    }

    /// Team takes part in weighted draws: included, unlocked, holding balls.
    pub fn in_pool(&self, idx: usize) -> bool {
        self.participation[idx] == Participation::Weighted && self.balls[idx] > 0
    }

    pub fn pool(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.in_pool(i)).collect()
    }

    /// Team indices worst-to-best by record.
    pub fn record_order(&self) -> &[usize] {
        &self.record_order
    }

    /// Unlocked teams outside the weighted pool, worst record first.
    pub fn non_pool_in_record_order(&self) -> Vec<usize> {
        self.record_order
            .iter()
            .copied()
            .filter(|&i| self.locked_pick(i).is_none() && !self.in_pool(i))
            .collect()
    }

    /// Unlocked picks in ascending order.
    pub fn open_picks(&self) -> Vec<usize> {
        (1..=self.len())
            .filter(|p| !self.locks.contains_key(p))
            .collect()
    }

    /// Deterministic positions for teams outside the weighted pool: they
    /// follow every weighted pick, worst record first. Returns `(pick, idx)`.
    pub fn fallback_positions(&self) -> Vec<(usize, usize)> {
        let open = self.open_picks();
        let weighted_slots = self.pool().len();
        open.into_iter()
            .skip(weighted_slots)
            .zip(self.non_pool_in_record_order())
            .collect()
    }

    /// Refuse to run a draw when there is nothing to draw or lock.
    pub fn ensure_drawable(&self) -> Result<(), ConfigurationError> {
        if self.locks.is_empty() && !(0..self.len()).any(|i| self.in_pool(i)) {
            return Err(ConfigurationError::NothingToDraw);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, wins: u32, losses: u32) -> Team {
        Team {
            id: id.into(),
            name: None,
            wins,
            losses,
            ties: 0,
            playoff: false,
        }
    }

    fn league() -> Vec<Team> {
        vec![team("a", 1, 9), team("b", 3, 7), team("c", 5, 5), team("d", 8, 2)]
    }

    #[test]
    fn partitions_locked_weighted_and_excluded() {
        let mut configs = HashMap::new();
        configs.insert("a".to_string(), TeamLotteryConfig::with_balls(10));
        configs.insert("b".to_string(), TeamLotteryConfig::locked_at(1));
        configs.insert("c".to_string(), TeamLotteryConfig::excluded());
        configs.insert("d".to_string(), TeamLotteryConfig::with_balls(0));
        let setup = LotterySetup::new(league(), &configs, None).unwrap();

        assert_eq!(setup.participation(0), Participation::Weighted);
        assert_eq!(setup.participation(1), Participation::Locked(1));
        assert_eq!(setup.participation(2), Participation::Excluded);
        assert_eq!(setup.pool(), vec![0]);
        assert_eq!(setup.non_pool_in_record_order(), vec![2, 3]);
        assert_eq!(setup.open_picks(), vec![2, 3, 4]);
        assert_eq!(setup.fallback_positions(), vec![(3, 2), (4, 3)]);
    }

    #[test]
    fn locked_team_keeps_configured_balls() {
        let mut configs = HashMap::new();
        let mut locked = TeamLotteryConfig::locked_at(2);
        locked.balls = 140;
        configs.insert("a".to_string(), locked);
        let setup = LotterySetup::new(league(), &configs, None).unwrap();
        assert_eq!(setup.balls(0), 0);
        assert_eq!(setup.config(0).balls, 140);
    }

    #[test]
    fn rejects_duplicate_locked_pick() {
        let mut configs = HashMap::new();
        configs.insert("a".to_string(), TeamLotteryConfig::locked_at(2));
        configs.insert("b".to_string(), TeamLotteryConfig::locked_at(2));
        let err = LotterySetup::new(league(), &configs, None).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateLockedPick { pick: 2, .. }));
    }

    #[test]
    fn rejects_out_of_range_pick() {
        let mut configs = HashMap::new();
        configs.insert("a".to_string(), TeamLotteryConfig::locked_at(5));
        let err = LotterySetup::new(league(), &configs, None).unwrap_err();
        assert!(matches!(err, ConfigurationError::PickOutOfRange { pick: 5, total: 4, .. }));

        configs.insert("a".to_string(), TeamLotteryConfig::locked_at(0));
        assert!(LotterySetup::new(league(), &configs, None).is_err());
    }

    #[test]
    fn rejects_lock_without_pick() {
        let mut configs = HashMap::new();
        let mut cfg = TeamLotteryConfig::locked_at(1);
        cfg.manual_pick = None;
        configs.insert("c".to_string(), cfg);
        let err = LotterySetup::new(league(), &configs, None).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingManualPick("c".into()));
    }

    #[test]
    fn rejects_too_many_balls() {
        let mut configs = HashMap::new();
        configs.insert("a".to_string(), TeamLotteryConfig::with_balls(10_001));
        let err = LotterySetup::new(league(), &configs, None).unwrap_err();
        assert!(matches!(err, ConfigurationError::BallsOutOfRange { balls: 10_001, .. }));
    }

    #[test]
    fn rejects_percentages_over_total() {
        let mut configs = HashMap::new();
        for (id, pct) in [("a", 60.0), ("b", 40.2)] {
            let mut cfg = TeamLotteryConfig::with_balls(1);
            cfg.target_percent = Some(pct);
            configs.insert(id.to_string(), cfg);
        }
        let err = LotterySetup::new(league(), &configs, None).unwrap_err();
        assert!(matches!(err, ConfigurationError::PercentagesExceedTotal { .. }));

        // within the rounding buffer
        configs.get_mut("b").unwrap().target_percent = Some(40.05);
        assert!(LotterySetup::new(league(), &configs, None).is_ok());
    }

    #[test]
    fn rejects_unknown_and_duplicate_teams() {
        let mut configs = HashMap::new();
        configs.insert("nope".to_string(), TeamLotteryConfig::with_balls(1));
        assert_eq!(
            LotterySetup::new(league(), &configs, None).unwrap_err(),
            ConfigurationError::UnknownTeam("nope".into())
        );

        let mut teams = league();
        teams.push(team("a", 0, 0));
        assert_eq!(
            LotterySetup::new(teams, &HashMap::new(), None).unwrap_err(),
            ConfigurationError::DuplicateTeam("a".into())
        );
    }

    #[test]
    fn validates_fall_protection_range() {
        let fp = FallProtection {
            enabled: true,
            max_spots: 11,
        };
        assert_eq!(
            LotterySetup::new(league(), &HashMap::new(), Some(fp)).unwrap_err(),
            ConfigurationError::FallProtectionOutOfRange(11)
        );

        let disabled = FallProtection {
            enabled: false,
            max_spots: 0,
        };
        let setup = LotterySetup::new(league(), &HashMap::new(), Some(disabled)).unwrap();
        assert!(setup.fall_protection().is_none());
        assert!(setup.is_eligible(0, 4));
    }

    #[test]
    fn deadline_is_rank_plus_max_spots() {
        let fp = FallProtection {
            enabled: true,
            max_spots: 1,
        };
        let setup = LotterySetup::new(league(), &HashMap::new(), Some(fp)).unwrap();
        assert_eq!(setup.rank(0), 1);
        assert_eq!(setup.deadline(0), Some(2));
        assert!(setup.is_eligible(0, 2));
        assert!(!setup.is_eligible(0, 3));
    }

    #[test]
    fn nothing_to_draw_when_all_excluded() {
        let configs: HashMap<String, TeamLotteryConfig> = league()
            .iter()
            .map(|t| (t.id.clone(), TeamLotteryConfig::excluded()))
            .collect();
        let setup = LotterySetup::new(league(), &configs, None).unwrap();
        assert_eq!(setup.ensure_drawable(), Err(ConfigurationError::NothingToDraw));
    }
}
