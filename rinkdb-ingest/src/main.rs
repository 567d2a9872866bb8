#![recursion_limit = "256"]

mod config;
mod item;
mod pipeline;
mod signal;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_humanize::HumanTime;
use futures::pin_mut;
use log::{info, warn};
use miette::IntoDiagnostic;
use tokio_util::sync::CancellationToken;

use config::IngestConfig;
use rinkdb_db::Store;
use rinkdb_sync::Game;
use rinkdb_sync::refresh::{refresh_games, scheduled_game_ids};
use statsapi::StatsApi;
use statsapi::teams::all_team_ids;

#[tokio::main]
async fn main() -> miette::Result<()> {
    env_logger::init();

    let config = IngestConfig::config().into_diagnostic()?;
    let config: &'static IngestConfig = Box::leak(Box::new(config));

    let store = Arc::new(Store::open(&config.db_path).into_diagnostic()?);
    let transport = Arc::new(StatsApi::new());

    let needs_population =
        config.populate_on_launch || rinkdb_db::team_count(&store).into_diagnostic()? == 0;
    if needs_population {
        let abort = CancellationToken::new();
        info!("Starting population run");
        let start = Utc::now();

        let team_ids = all_team_ids();
        let run = pipeline::populate(
            Arc::clone(&transport),
            Arc::clone(&store),
            config,
            &team_ids,
            abort.clone(),
        );
        pin_mut!(run);

        let report = tokio::select! {
            report = &mut run => report,
            _ = signal::wait_for_signal() => {
                abort.cancel();
                // In-flight fetches finish; the sentinels drain the rest.
                run.await
            }
        };

        info!(
            "Population ran {} with {} failed item(s)",
            HumanTime::from(Utc::now() - start),
            report.total_failed(),
        );
        if abort.is_cancelled() {
            return Ok(());
        }
    }

    // Track the day's games and refresh them until shutdown. The game
    // list is rebuilt when the date rolls over; within a day, each pass
    // only fetches games that are not yet Final.
    let mut games: Vec<Game> = Vec::new();
    let mut games_date = None;
    loop {
        let today = Utc::now().date_naive();
        if games_date != Some(today) {
            match scheduled_game_ids(transport.as_ref(), today).await {
                Ok(ids) => {
                    info!("Tracking {} game(s) on {today}", ids.len());
                    games.clear();
                    for game_id in ids {
                        match Game::fetch(transport.as_ref(), game_id).await {
                            Ok(game) => games.push(game),
                            Err(err) => warn!("Failed to load game {game_id}: {err}"),
                        }
                    }
                    games_date = Some(today);
                }
                Err(err) => warn!("Failed to fetch the schedule: {err}"),
            }
        }

        refresh_games(transport.as_ref(), &store, &mut games).await;

        let period = chrono::Duration::seconds(config.refresh_period.max(1));
        info!("Next refresh {}", HumanTime::from(period));
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(config.refresh_period.max(1) as u64)) => {}
            _ = signal::wait_for_signal() => break,
        }
    }

    Ok(())
}
