use thiserror::Error;

/// Upper bound on balls a single team may hold.
pub const MAX_BALLS: u32 = 10_000;

/// Percent total tolerated for explicit target percentages (rounding buffer).
pub const MAX_PERCENT_TOTAL: f64 = 100.1;

/// Invalid lottery configuration. Raised before any draw or simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("no teams supplied")]
    NoTeams,

    #[error("team '{0}' appears more than once")]
    DuplicateTeam(String),

    #[error("unknown team '{0}'")]
    UnknownTeam(String),

    #[error("team '{0}' is locked but has no manual pick")]
    MissingManualPick(String),

    #[error("pick {pick} for team '{team}' is outside 1..={total}")]
    PickOutOfRange {
        team: String,
        pick: usize,
        total: usize,
    },

    #[error("pick {pick} is locked to both '{first}' and '{second}'")]
    DuplicateLockedPick {
        pick: usize,
        first: String,
        second: String,
    },

    #[error("team '{team}' has {balls} balls (maximum {})", MAX_BALLS)]
    BallsOutOfRange { team: String, balls: u32 },

    #[error("team '{team}' has invalid target percentage {percent}")]
    InvalidPercentage { team: String, percent: f64 },

    #[error("target percentages add up to {total:.1}% (maximum {}%)", MAX_PERCENT_TOTAL)]
    PercentagesExceedTotal { total: f64 },

    #[error("fall protection max_spots must be between 1 and 10, got {0}")]
    FallProtectionOutOfRange(usize),

    #[error("nothing to draw: no weighted teams and no locked picks")]
    NothingToDraw,

    #[error("trial count must be at least 1")]
    NoTrials,

    #[error("constraints are unsatisfiable: all {trials} trials were discarded")]
    Unsatisfiable { trials: usize },
}

/// Recoverable failures inside a single draw or trial. Never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum TrialError {
    #[error("no eligible team for pick {pick}")]
    EmptyPool { pick: usize },

    #[error("team '{team}' cannot be placed at or above pick {deadline}")]
    InvalidTrial { team: String, deadline: usize },
}
