use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Upper bound on Monte Carlo trials accepted from the command line.
pub const MAX_TRIALS: usize = 1_000_000;

/// Weighted draft lottery: single draws, pre-lottery odds, permutation analysis
#[derive(Parser, Debug, Clone)]
#[command(name = "draft-lottery", version, about)]
pub struct Config {
    /// Seed for the random source (omit for a fresh draw every run)
    #[arg(long, env = "LOTTERY_SEED", global = true)]
    pub seed: Option<u64>,

    /// Print JSON instead of text tables
    #[arg(long, env = "LOTTERY_JSON", default_value = "false", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the balls each team holds once defaults are applied
    Balls {
        /// Scenario JSON file
        scenario: PathBuf,
    },

    /// Closed-form pre-lottery odds (full table, or one team/pick)
    Odds {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Team id for a single-cell query
        #[arg(long, requires = "pick")]
        team: Option<String>,

        /// Pick number for a single-cell query
        #[arg(long, requires = "team")]
        pick: Option<usize>,
    },

    /// Run one lottery draw
    Draw {
        /// Scenario JSON file
        scenario: PathBuf,
    },

    /// Monte Carlo permutation analysis
    Simulate {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Number of independent trials
        #[arg(long, env = "LOTTERY_TRIALS", default_value = "10000")]
        trials: usize,
    },

    /// Serve the JSON API
    Serve {
        /// API listen address
        #[arg(long, env = "LOTTERY_API_ADDR", default_value = "0.0.0.0:8080")]
        addr: String,

        /// Largest trial count a single request may ask for
        #[arg(long, env = "LOTTERY_MAX_TRIALS", default_value = "100000")]
        max_trials: usize,
    },
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        match &self.command {
            Command::Simulate { trials, .. } => {
                if !(1..=MAX_TRIALS).contains(trials) {
                    anyhow::bail!("trials must be between 1 and {}", MAX_TRIALS);
                }
            }
            Command::Serve { addr, max_trials } => {
                if addr.parse::<SocketAddr>().is_err() {
                    anyhow::bail!("invalid listen address '{}'", addr);
                }
                if !(1..=MAX_TRIALS).contains(max_trials) {
                    anyhow::bail!("max_trials must be between 1 and {}", MAX_TRIALS);
                }
            }
            Command::Odds { pick: Some(0), .. } => {
                anyhow::bail!("pick numbers start at 1");
            }
            _ => {}
        }
        Ok(())
    }
}
