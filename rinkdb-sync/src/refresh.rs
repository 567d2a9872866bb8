//! Batch refresh across all tracked games.

use chrono::NaiveDate;
use log::{error, info};
use statsapi::Transport;
use statsapi::parse;
use statsapi::urls::Endpoint;

use rinkdb_db::Store;

use crate::game::{Game, RefreshOutcome};
use crate::SyncError;

/// Outcome counts for one refresh pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: usize,
    pub status_only: usize,
    pub skipped_final: usize,
    pub failed: usize,
}

/// Refreshes every game in the batch. One game failing does not stop the
/// rest; failures are logged and counted.
pub async fn refresh_games<T: Transport>(
    transport: &T,
    store: &Store,
    games: &mut [Game],
) -> RefreshReport {
    let mut report = RefreshReport::default();
    for game in games.iter_mut() {
        match game.refresh(transport, store).await {
            Ok(RefreshOutcome::Updated) => report.updated += 1,
            Ok(RefreshOutcome::StatusOnly) => report.status_only += 1,
            Ok(RefreshOutcome::SkippedFinal) => report.skipped_final += 1,
            Err(err) => {
                report.failed += 1;
                error!("Failed to refresh game {}: {err}", game.game_id);
            }
        }
    }
    info!(
        "Refresh pass: {} updated, {} status-only, {} final, {} failed",
        report.updated, report.status_only, report.skipped_final, report.failed
    );
    report
}

/// Game ids scheduled on `date`.
pub async fn scheduled_game_ids<T: Transport>(
    transport: &T,
    date: NaiveDate,
) -> Result<Vec<i64>, SyncError> {
    let date = date.format("%Y-%m-%d").to_string();
    let doc = transport
        .fetch(Endpoint::Schedule.base(), &[("date", date)])
        .await?;
    Ok(parse::schedule_game_ids(&doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use statsapi::mock::MockTransport;

    #[tokio::test]
    async fn one_bad_game_does_not_stop_the_batch() {
        let mock = MockTransport::new();
        let store = Store::open_in_memory().unwrap();

        let good = json!({
            "gameData": {
                "status": {"statusCode": "1"},
                "datetime": {"dateTime": "2020-02-01T00:00:00Z"},
                "teams": {
                    "home": {
                        "id": 6, "name": "B", "abbreviation": "BOS",
                        "division": {"name": "Atlantic"},
                        "conference": {"name": "Eastern"},
                    },
                    "away": {
                        "id": 10, "name": "T", "abbreviation": "TOR",
                        "division": {"name": "Atlantic"},
                        "conference": {"name": "Eastern"},
                    },
                },
            },
            "liveData": {}
        });
        mock.respond(Endpoint::GameFeed.url(1), good.clone());
        mock.respond(Endpoint::GameFeed.url(2), good);
        // Game 1's refresh fetch fails; game 2's succeeds.
        mock.fail(Endpoint::GameFeed.url(1), "connection reset");

        let mut games = vec![
            Game::fetch(&mock, 1).await.unwrap(),
            Game::fetch(&mock, 2).await.unwrap(),
        ];
        let report = refresh_games(&mock, &store, &mut games).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.status_only, 1);
        assert_eq!(report.updated, 0);
    }

    #[tokio::test]
    async fn schedule_lookup_passes_the_date() {
        let mock = MockTransport::new();
        mock.respond(
            Endpoint::Schedule.base(),
            json!({"dates": [{"games": [{"gamePk": 2019020001i64}]}]}),
        );

        let ids = scheduled_game_ids(&mock, NaiveDate::from_ymd_opt(2020, 2, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(ids, vec![2019020001]);
    }
}
