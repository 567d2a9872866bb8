//! Roster reconciliation and the per-game player index.
//!
//! A [`PlayerCollection`] is cheap to construct: it compares the upstream
//! roster against what the store records and remembers the difference.
//! The actual network round-trips to correct that difference happen only
//! when [`PlayerCollection::replace_players`] is invoked, because
//! collections are built far more often than rosters actually change.

use futures::future::join_all;
use hashbrown::HashSet;
use log::{info, warn};
use statsapi::Transport;
use statsapi::parse::{self, BoxscorePlayer, PlayerInfo};
use statsapi::urls::Endpoint;

use rinkdb_db::Store;

use crate::SyncError;

/// Per-game partition of a roster by position. Scratches land in
/// `not_playing` and nowhere else.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RosterIndex {
    pub forwards: Vec<i64>,
    pub defense: Vec<i64>,
    pub goalies: Vec<i64>,
    pub not_playing: Vec<i64>,
}

impl RosterIndex {
    pub fn from_boxscore(players: &[BoxscorePlayer]) -> Self {
        let mut index = RosterIndex::default();
        for player in players {
            if player.stats.is_none() {
                index.not_playing.push(player.player_id);
                continue;
            }
            match player.position.as_str() {
                "D" => index.defense.push(player.player_id),
                "G" => index.goalies.push(player.player_id),
                _ => index.forwards.push(player.player_id),
            }
        }
        index
    }
}

/// Outcome of a `replace_players` pass. Individual player failures are
/// isolated and counted, not propagated.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaceReport {
    pub updated: usize,
    pub failed: usize,
}

/// A team's roster for one game, reconciled against the store.
#[derive(Debug)]
pub struct PlayerCollection {
    pub team_id: i64,
    /// Player ids upstream currently lists on the roster.
    pub upstream_ids: Vec<i64>,
    /// Ids whose stored team assignment is stale or missing: the
    /// symmetric difference of the upstream set and the stored set.
    /// Players in both sets need nothing.
    pub need_to_update: Vec<i64>,
    pub index: RosterIndex,
    /// Filled by `create_players`; most callers never need it.
    players: Option<Vec<PlayerInfo>>,
}

impl PlayerCollection {
    /// Records the roster delta for `team_id` without touching the
    /// network. `boxscore` drives the position index; reconciliation is
    /// deferred until `replace_players`.
    pub fn new(
        store: &Store,
        team_id: i64,
        upstream_ids: Vec<i64>,
        boxscore: &[BoxscorePlayer],
    ) -> Result<Self, SyncError> {
        let stored: HashSet<i64> = rinkdb_db::roster_player_ids(store, team_id)?
            .into_iter()
            .collect();
        let upstream: HashSet<i64> = upstream_ids.iter().copied().collect();

        let need_to_update: Vec<i64> =
            upstream.symmetric_difference(&stored).copied().collect();
        if !need_to_update.is_empty() {
            info!(
                "Team {team_id}: {} player(s) out of sync with the store",
                need_to_update.len()
            );
        }

        Ok(PlayerCollection {
            team_id,
            upstream_ids,
            need_to_update,
            index: RosterIndex::from_boxscore(boxscore),
            players: None,
        })
    }

    /// Fetches and writes every player in `need_to_update`, correcting
    /// stale team assignments. Fetches run concurrently; a failure on one
    /// player does not stop the others.
    pub async fn replace_players<T: Transport>(
        &mut self,
        transport: &T,
        store: &Store,
    ) -> ReplaceReport {
        let fetches = self.need_to_update.iter().map(|&player_id| async move {
            (player_id, fetch_player(transport, player_id).await)
        });

        let mut report = ReplaceReport::default();
        let mut corrected = Vec::new();
        for (player_id, result) in join_all(fetches).await {
            match result.and_then(|info| Ok(rinkdb_db::write_player(store, &info)?)) {
                Ok(()) => {
                    report.updated += 1;
                    corrected.push(player_id);
                }
                Err(err) => {
                    report.failed += 1;
                    warn!("Failed to reconcile player {player_id}: {err}");
                }
            }
        }

        self.need_to_update.retain(|id| !corrected.contains(id));
        report
    }

    /// Materializes full player records for the upstream roster. Lazy for
    /// the same reason reconciliation is: a roster has ~23 players and
    /// most callers only want aggregates.
    pub async fn create_players<T: Transport>(
        &mut self,
        transport: &T,
    ) -> Result<&[PlayerInfo], SyncError> {
        if self.players.is_none() {
            let fetches = self
                .upstream_ids
                .iter()
                .map(|&player_id| fetch_player(transport, player_id));
            let players = join_all(fetches)
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;
            self.players = Some(players);
        }
        // Just assigned above when it was empty.
        Ok(self.players.as_deref().unwrap_or_default())
    }

    pub fn materialized(&self) -> Option<&[PlayerInfo]> {
        self.players.as_deref()
    }
}

async fn fetch_player<T: Transport>(transport: &T, player_id: i64) -> Result<PlayerInfo, SyncError> {
    let doc = transport
        .fetch(&Endpoint::People.url(player_id), &[])
        .await?;
    Ok(parse::player_info(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use statsapi::mock::MockTransport;

    fn player_doc(id: i64, team_id: i64) -> serde_json::Value {
        json!({
            "people": [{
                "id": id,
                "currentTeam": {"id": team_id},
                "firstName": "Player",
                "lastName": format!("{id}"),
                "primaryNumber": "10",
                "primaryPosition": {"abbreviation": "C"},
                "shootsCatches": "L",
                "rookie": false,
                "currentAge": 25,
                "birthDate": "1995-01-01",
                "birthCity": "Boston",
                "birthCountry": "USA",
                "height": "6' 0\"",
                "weight": 190,
            }]
        })
    }

    fn seed_team(store: &Store, team_id: i64) {
        rinkdb_db::write_team(
            store,
            &statsapi::parse::TeamInfo {
                team_id,
                full_name: "Team".to_string(),
                abbreviation: "TST".to_string(),
                division: 17,
                conference: 6,
                active: true,
                franchise_id: team_id,
            },
        )
        .unwrap();
    }

    fn seed_player(store: &Store, player_id: i64, team_id: i64) {
        let doc = player_doc(player_id, team_id);
        let info = parse::player_info(&doc).unwrap();
        rinkdb_db::write_player(store, &info).unwrap();
    }

    #[test]
    fn roster_delta_is_the_symmetric_difference() {
        let store = Store::open_in_memory().unwrap();
        seed_team(&store, 6);
        for id in [1, 2, 3] {
            seed_player(&store, id, 6);
        }

        let collection = PlayerCollection::new(&store, 6, vec![2, 3, 4], &[]).unwrap();

        let delta: HashSet<i64> = collection.need_to_update.iter().copied().collect();
        let expected: HashSet<i64> = [1, 4].into_iter().collect();
        assert_eq!(delta, expected);
    }

    #[test]
    fn scratches_index_as_not_playing() {
        let boxscore = vec![
            BoxscorePlayer {
                player_id: 1,
                position: "C".to_string(),
                stats: None,
            },
            BoxscorePlayer {
                player_id: 2,
                position: "D".to_string(),
                stats: Some(statsapi::parse::GamePlayerStats::Skater(skater_stats())),
            },
        ];

        let index = RosterIndex::from_boxscore(&boxscore);
        assert_eq!(index.not_playing, vec![1]);
        assert_eq!(index.defense, vec![2]);
        assert!(index.forwards.is_empty());
        assert!(index.goalies.is_empty());
    }

    #[tokio::test]
    async fn replace_players_corrects_stale_team_ids() {
        let store = Store::open_in_memory().unwrap();
        seed_team(&store, 6);
        seed_team(&store, 10);
        // Player 1 is recorded on team 6 but upstream has moved them to 10.
        seed_player(&store, 1, 6);

        let mock = MockTransport::new();
        mock.respond(Endpoint::People.url(1), player_doc(1, 10));
        mock.respond(Endpoint::People.url(4), player_doc(4, 10));

        let mut collection = PlayerCollection::new(&store, 10, vec![1, 4], &[]).unwrap();
        let report = collection.replace_players(&mock, &store).await;

        assert_eq!(report, ReplaceReport { updated: 2, failed: 0 });
        assert!(collection.need_to_update.is_empty());
        let mut roster = rinkdb_db::roster_player_ids(&store, 10).unwrap();
        roster.sort_unstable();
        assert_eq!(roster, vec![1, 4]);
        assert!(rinkdb_db::roster_player_ids(&store, 6).unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_players_materializes_once() {
        let store = Store::open_in_memory().unwrap();
        seed_team(&store, 6);
        seed_player(&store, 1, 6);
        seed_player(&store, 2, 6);

        let mock = MockTransport::new();
        mock.respond(Endpoint::People.url(1), player_doc(1, 6));
        mock.respond(Endpoint::People.url(2), player_doc(2, 6));

        let mut collection = PlayerCollection::new(&store, 6, vec![1, 2], &[]).unwrap();
        assert!(collection.materialized().is_none());

        let players = collection.create_players(&mock).await.unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(mock.fetch_count(), 2);

        // A second call serves the cached records without refetching.
        let players = collection.create_players(&mock).await.unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(mock.fetch_count(), 2);
        assert!(collection.materialized().is_some());
    }

    #[tokio::test]
    async fn replace_players_isolates_per_player_failures() {
        let store = Store::open_in_memory().unwrap();
        seed_team(&store, 6);

        let mock = MockTransport::new();
        mock.respond(Endpoint::People.url(1), player_doc(1, 6));
        // No script for player 2: its fetch fails.

        let mut collection = PlayerCollection::new(&store, 6, vec![1, 2], &[]).unwrap();
        let report = collection.replace_players(&mock, &store).await;

        assert_eq!(report, ReplaceReport { updated: 1, failed: 1 });
        assert_eq!(collection.need_to_update, vec![2]);
    }

    fn skater_stats() -> statsapi::parse::SkaterGameStats {
        statsapi::parse::SkaterGameStats {
            time_on_ice: "20:00".to_string(),
            assists: 0,
            goals: 0,
            pims: 0,
            shots: 0,
            hits: 0,
            pp_goals: 0,
            sh_goals: 0,
            ev_goals: 0,
            pp_assists: 0,
            sh_assists: 0,
            ev_assists: 0,
            faceoff_pct: 0.0,
            faceoff_wins: 0,
            faceoff_taken: 0,
            takeaways: 0,
            giveaways: 0,
            blocked: 0,
            plus_minus: 0,
            ev_toi: "15:00".to_string(),
            pp_toi: "3:00".to_string(),
            sh_toi: "2:00".to_string(),
        }
    }
}
