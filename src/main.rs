use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::net::SocketAddr;
use tracing::info;

mod api;
mod config;
mod lottery;
mod report;
mod scenario;

use api::AppState;
use config::{Command, Config};
use lottery::{odds_table, pre_draw_probability_for, rng_from_seed, LotterySetup};
use scenario::Scenario;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging (stderr, so stdout stays clean for --json)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    if let Some(seed) = config.seed {
        info!("Using fixed random seed {}", seed);
    }

    match config.command.clone() {
        Command::Balls { scenario } => {
            let setup = load_setup(&scenario)?;
            if config.json {
                let configs: Vec<_> = (0..setup.len())
                    .map(|i| (setup.team(i).id.clone(), setup.balls(i)))
                    .collect();
                print_json(&configs)?;
            } else {
                print!("{}", report::render_balls(&setup)?);
            }
        }
        Command::Odds {
            scenario,
            team,
            pick,
        } => {
            let setup = load_setup(&scenario)?;
            if let (Some(team), Some(pick)) = (team, pick) {
                let percent = pre_draw_probability_for(&setup, &team, pick)?;
                if config.json {
                    print_json(&serde_json::json!({
                        "team_id": team,
                        "pick": pick,
                        "percent": lottery::models::round1(percent),
                    }))?;
                } else {
                    println!("{} at pick {}: {:.1}%", team, pick, percent);
                }
            } else {
                let table = odds_table(&setup);
                if config.json {
                    print_json(&table)?;
                } else {
                    print!("{}", report::render_matrix(&setup, &table)?);
                }
            }
        }
        Command::Draw { scenario } => {
            let setup = load_setup(&scenario)?;
            let seed = config.seed;
            let (setup, result) = tokio::task::spawn_blocking(move || {
                let mut rng = rng_from_seed(seed);
                lottery::draw(&setup, &mut rng).map(|result| (setup, result))
            })
            .await??;
            if config.json {
                print_json(&result)?;
            } else {
                print!("{}", report::render_result(&setup, &result)?);
            }
        }
        Command::Simulate { scenario, trials } => {
            let setup = load_setup(&scenario)?;
            let seed = config.seed;
            info!("Simulating {} trials over {} teams", trials, setup.len());
            let (setup, sim) = tokio::task::spawn_blocking(move || {
                let mut rng = rng_from_seed(seed);
                lottery::simulate(&setup, trials, &mut rng).map(|sim| (setup, sim))
            })
            .await??;
            if config.json {
                print_json(&sim)?;
            } else {
                print!("{}", report::render_simulation(&setup, &sim)?);
            }
        }
        Command::Serve { addr, max_trials } => {
            let app = api::router(AppState {
                seed: config.seed,
                max_trials,
            });
            let addr: SocketAddr = addr.parse()?;
            info!("Lottery API listening on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn load_setup(path: &std::path::Path) -> Result<LotterySetup> {
    let scenario = Scenario::from_path(path)?;
    let setup = scenario.into_setup()?;
    info!(
        "Loaded {} teams ({} in the weighted draw, {} locked)",
        setup.len(),
        setup.pool().len(),
        setup.locks().len()
    );
    if let Some(fp) = setup.fall_protection() {
        info!("Fall protection: at most {} spots below record rank", fp.max_spots);
    }
    Ok(setup)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
