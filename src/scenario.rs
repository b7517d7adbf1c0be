use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::lottery::allocator::{balls_from_percentages, default_balls};
use crate::lottery::{ConfigurationError, FallProtection, LotterySetup, Team, TeamLotteryConfig};

/// A lottery scenario as read from a JSON file or an API request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub teams: Vec<Team>,
    /// Per-team overrides keyed by team id
    #[serde(default)]
    pub configs: HashMap<String, ConfigEntry>,
    #[serde(default)]
    pub fall_protection: Option<FallProtection>,
}

/// User-supplied overrides. Anything left out falls back to the team default;
/// missing balls are seeded from the default allocation or `target_percent`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub included: Option<bool>,
    pub balls: Option<u32>,
    #[serde(default)]
    pub locked: bool,
    pub manual_pick: Option<usize>,
    pub target_percent: Option<f64>,
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Resolve every team's full configuration, seeding balls where the
    /// scenario leaves them out.
    pub fn resolve_configs(&self) -> Result<HashMap<String, TeamLotteryConfig>, ConfigurationError> {
        if let Some(unknown) = self
            .configs
            .keys()
            .find(|id| !self.teams.iter().any(|t| &t.id == *id))
        {
            return Err(ConfigurationError::UnknownTeam(unknown.clone()));
        }

        let mut resolved: HashMap<String, TeamLotteryConfig> = HashMap::new();
        let mut needs_default: Vec<String> = Vec::new();
        let mut percentages: Vec<(String, f64)> = Vec::new();

        for team in &self.teams {
            let mut config = TeamLotteryConfig::for_team(team);
            let entry = self.configs.get(&team.id).cloned().unwrap_or_default();
            if let Some(included) = entry.included {
                config.included = included;
            }
            config.locked = entry.locked;
            config.manual_pick = entry.manual_pick;
            config.target_percent = entry.target_percent;

            let drawn = config.included && !config.locked;
            match (entry.balls, entry.target_percent) {
                (Some(balls), _) => config.balls = balls,
                (None, Some(percent)) if drawn => percentages.push((team.id.clone(), percent)),
                (None, _) if drawn => needs_default.push(team.id.clone()),
                _ => {}
            }
            resolved.insert(team.id.clone(), config);
        }

        for (id, balls) in balls_from_percentages(&percentages)? {
            if let Some(config) = resolved.get_mut(&id) {
                config.balls = balls;
            }
        }

        if !needs_default.is_empty() {
            // rank against the whole drawn field, not just the teams being seeded
            let field: Vec<Team> = self
                .teams
                .iter()
                .filter(|t| resolved.get(&t.id).map_or(false, |c| c.included && !c.locked))
                .cloned()
                .collect();
            for (id, balls) in default_balls(&field) {
                if needs_default.contains(&id) {
                    if let Some(config) = resolved.get_mut(&id) {
                        config.balls = balls;
                    }
                }
            }
        }

        Ok(resolved)
    }

    /// Validate the scenario and build the engine snapshot.
    pub fn into_setup(self) -> Result<LotterySetup, ConfigurationError> {
        let configs = self.resolve_configs()?;
        LotterySetup::new(self.teams, &configs, self.fall_protection)
    }
}
