pub mod allocator;
pub mod draw;
pub mod error;
pub mod models;
pub mod odds;
pub mod setup;
pub mod simulator;
pub mod standings;

pub use draw::draw;
pub use error::ConfigurationError;
pub use models::{FallProtection, Team, TeamLotteryConfig};
pub use odds::{odds_table, pre_draw_probability_for};
pub use setup::LotterySetup;
pub use simulator::{simulate, DEFAULT_TRIALS};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Random source for draws: reproducible when seeded, fresh entropy otherwise.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
