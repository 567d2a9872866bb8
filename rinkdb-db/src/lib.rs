//! Local relational mirror of the stats API.
//!
//! Owns the SQLite schema, the generic store boundary, and the
//! entity-specific write paths the population pipeline and the
//! synchronization engine go through.

use miette::Diagnostic;
use thiserror::Error;

pub mod schema;
pub mod store;
mod to_row;

pub use store::{FieldMap, FieldValue, Predicate, Row, Store};

use statsapi::parse::{GoalieSeason, PlayerInfo, SkaterSeason, TeamInfo, TeamSeason};

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("duplicate key in table `{table}`")]
    Duplicate { table: String },

    #[error("table `{table}` does not declare field `{field}`")]
    UnknownField { table: String, field: String },

    #[error("unknown table `{0}`")]
    UnknownTable(String),

    #[error("expected an integer in column `{0}`")]
    ColumnType(String),

    #[error("database error")]
    Sqlite(#[from] rusqlite::Error),
}

fn row_i64(row: &Row, column: &str) -> Result<i64, StoreError> {
    row.get(column)
        .and_then(FieldValue::as_i64)
        .ok_or_else(|| StoreError::ColumnType(column.to_string()))
}

/// Inserts a team, skipping one already present. Teams are created once
/// during population and essentially never change.
pub fn write_team(store: &Store, team: &TeamInfo) -> Result<bool, StoreError> {
    store.insert_or_skip("team", &to_row::team_row(team))
}

/// Inserts a player, or rewrites their row if they already exist. The
/// update path is what corrects a stale `team_id` during reconciliation;
/// the table trigger refreshes `last_updated` on its own.
pub fn write_player(store: &Store, player: &PlayerInfo) -> Result<(), StoreError> {
    let fields = to_row::player_row(player);
    match store.insert("player", &fields) {
        Ok(()) => Ok(()),
        Err(StoreError::Duplicate { .. }) => {
            store.update("player", &fields, &[("player_id", player.player_id.into())])?;
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Player ids the store currently records on `team_id`'s roster.
pub fn roster_player_ids(store: &Store, team_id: i64) -> Result<Vec<i64>, StoreError> {
    store
        .select("player", &["player_id"], &[("team_id", team_id.into())])?
        .iter()
        .map(|row| row_i64(row, "player_id"))
        .collect()
}

pub fn team_count(store: &Store) -> Result<usize, StoreError> {
    Ok(store.select("team", &["team_id"], &[])?.len())
}

pub fn player_count(store: &Store) -> Result<usize, StoreError> {
    Ok(store.select("player", &["player_id"], &[])?.len())
}

fn team_season_unique_id(
    store: &Store,
    team_id: i64,
    season: &str,
) -> Result<Option<i64>, StoreError> {
    let rows = store.select(
        "team_season",
        &["unique_id"],
        &[("team_id", team_id.into()), ("season", season.into())],
    )?;
    rows.first().map(|row| row_i64(row, "unique_id")).transpose()
}

/// Writes a team's season in two phases: the metadata row first, then
/// the stats row keyed by the metadata row's generated id. The id is not
/// known before insertion, hence the re-select in between. Re-running
/// for an already-written season is a no-op.
pub fn write_team_season(store: &Store, season: &TeamSeason) -> Result<(), StoreError> {
    let meta = &season.meta;
    let unique_id = match team_season_unique_id(store, meta.team_id, &meta.season)? {
        Some(id) => id,
        None => {
            store.insert("team_season", &to_row::team_season_row(meta))?;
            team_season_unique_id(store, meta.team_id, &meta.season)?
                .ok_or_else(|| StoreError::ColumnType("unique_id".to_string()))?
        }
    };

    store.insert_or_skip(
        "team_season_stats",
        &to_row::team_season_stats_row(unique_id, &season.stats),
    )?;
    Ok(())
}

fn player_season_unique_id(
    store: &Store,
    player_id: i64,
    season: &str,
) -> Result<Option<i64>, StoreError> {
    let rows = store.select(
        "player_season",
        &["unique_id"],
        &[("player_id", player_id.into()), ("season", season.into())],
    )?;
    rows.first().map(|row| row_i64(row, "unique_id")).transpose()
}

fn ensure_player_season(
    store: &Store,
    meta: &statsapi::parse::PlayerSeasonMeta,
) -> Result<i64, StoreError> {
    match player_season_unique_id(store, meta.player_id, &meta.season)? {
        Some(id) => Ok(id),
        None => {
            store.insert("player_season", &to_row::player_season_row(meta))?;
            player_season_unique_id(store, meta.player_id, &meta.season)?
                .ok_or_else(|| StoreError::ColumnType("unique_id".to_string()))
        }
    }
}

pub fn write_skater_season(store: &Store, season: &SkaterSeason) -> Result<(), StoreError> {
    let unique_id = ensure_player_season(store, &season.meta)?;
    store.insert_or_skip(
        "skater_season_stats",
        &to_row::skater_season_stats_row(unique_id, &season.stats),
    )?;
    Ok(())
}

pub fn write_goalie_season(store: &Store, season: &GoalieSeason) -> Result<(), StoreError> {
    let unique_id = ensure_player_season(store, &season.meta)?;
    store.insert_or_skip(
        "goalie_season_stats",
        &to_row::goalie_season_stats_row(unique_id, &season.stats),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use statsapi::parse::{PlayerSeasonMeta, TeamSeasonMeta, TeamSeasonStats};

    fn team(id: i64, abbr: &str) -> TeamInfo {
        TeamInfo {
            team_id: id,
            full_name: format!("Team {abbr}"),
            abbreviation: abbr.to_string(),
            division: 17,
            conference: 6,
            active: true,
            franchise_id: id,
        }
    }

    fn player(id: i64, team_id: i64) -> PlayerInfo {
        PlayerInfo {
            player_id: id,
            team_id,
            first_name: "Patrice".to_string(),
            last_name: "Bergeron".to_string(),
            number: Some("37".to_string()),
            position: "C".to_string(),
            handedness: "R".to_string(),
            rookie: false,
            age: 34,
            birth_date: "1985-07-24".to_string(),
            birth_city: "L'Ancienne-Lorette".to_string(),
            birth_state: Some("QC".to_string()),
            birth_country: "CAN".to_string(),
            height: "6' 1\"".to_string(),
            weight: 195,
        }
    }

    #[test]
    fn write_team_skips_existing_rows() {
        let store = Store::open_in_memory().unwrap();
        assert!(write_team(&store, &team(6, "BOS")).unwrap());
        assert!(!write_team(&store, &team(6, "BOS")).unwrap());
        assert_eq!(team_count(&store).unwrap(), 1);
    }

    #[test]
    fn write_player_corrects_team_on_rerun() {
        let store = Store::open_in_memory().unwrap();
        write_team(&store, &team(6, "BOS")).unwrap();
        write_team(&store, &team(10, "TOR")).unwrap();

        write_player(&store, &player(37, 6)).unwrap();
        write_player(&store, &player(37, 10)).unwrap();

        assert_eq!(player_count(&store).unwrap(), 1);
        assert_eq!(roster_player_ids(&store, 6).unwrap(), Vec::<i64>::new());
        assert_eq!(roster_player_ids(&store, 10).unwrap(), vec![37]);
    }

    #[test]
    fn write_player_surfaces_missing_team() {
        let store = Store::open_in_memory().unwrap();

        let err = write_player(&store, &player(37, 55)).unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert_eq!(player_count(&store).unwrap(), 0);
    }

    fn team_season_fixture(team_id: i64) -> TeamSeason {
        TeamSeason {
            meta: TeamSeasonMeta {
                team_id,
                season: "20192020".to_string(),
                franchise_id: team_id,
                division_id: 17,
                conference_id: 6,
            },
            stats: TeamSeasonStats {
                games_played: 70,
                wins: 44,
                losses: 14,
                ot_losses: 12,
                points: 100,
                pt_pct: 71.4,
                goals_for_pg: 3.24,
                goals_ag_pg: 2.39,
                evgga_ratio: 1.33,
                pp_pct: 25.2,
                pp_goals_for: 57,
                pp_opp: 226,
                pk_pct: 84.3,
                pp_goals_ag: 33,
                shots_for_pg: 32.1,
                shots_ag_pg: 30.0,
                win_score_first: 0.757,
                win_opp_score_first: 0.424,
                win_lead_first_per: 0.84,
                win_lead_second_per: 0.92,
                win_outshoot_opp: 0.639,
                win_outshot_by_opp: 0.6,
                faceoffs_taken: 3966,
                faceoff_wins: 2140,
                faceoff_losses: 1826,
                faceoff_pct: 54.0,
                save_pct: 0.921,
                shooting_pct: 10.1,
            },
        }
    }

    #[test]
    fn team_season_write_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        write_team(&store, &team(6, "BOS")).unwrap();

        let season = team_season_fixture(6);
        write_team_season(&store, &season).unwrap();
        write_team_season(&store, &season).unwrap();

        let meta_rows = store
            .select("team_season", &["unique_id"], &[("team_id", 6i64.into())])
            .unwrap();
        assert_eq!(meta_rows.len(), 1);
        let stats_rows = store.select("team_season_stats", &["unique_id"], &[]).unwrap();
        assert_eq!(stats_rows.len(), 1);
    }

    #[test]
    fn skater_assists_splits_are_derived_on_insert() {
        let store = Store::open_in_memory().unwrap();
        write_team(&store, &team(6, "BOS")).unwrap();
        write_player(&store, &player(37, 6)).unwrap();

        let season = SkaterSeason {
            meta: PlayerSeasonMeta {
                player_id: 37,
                season: "20192020".to_string(),
                league_id: Some(133),
                league_name: "NHL".to_string(),
                team_id: Some(6),
                team_name: "Boston Bruins".to_string(),
            },
            stats: statsapi::parse::SkaterSeasonStats {
                time_on_ice: Some("1200:00".to_string()),
                assists: Some(25),
                goals: Some(31),
                points: Some(56),
                pims: Some(12),
                shots: Some(200),
                games: Some(61),
                hits: Some(30),
                pp_goals: Some(12),
                pp_points: Some(24),
                pp_toi: Some("180:00".to_string()),
                sh_goals: Some(1),
                sh_points: Some(2),
                sh_toi: Some("90:00".to_string()),
                ev_toi: Some("930:00".to_string()),
                faceoff_pct: Some(57.9),
                shooting_pct: Some(15.5),
                gwg: Some(6),
                ot_goals: Some(1),
                plus_minus: Some(23),
                blocked: Some(40),
                shifts: Some(1400),
            },
        };
        write_skater_season(&store, &season).unwrap();

        let rows = store
            .select("skater_season_stats", &["pp_assists", "sh_assists"], &[])
            .unwrap();
        assert_eq!(rows[0]["pp_assists"], FieldValue::Integer(12));
        assert_eq!(rows[0]["sh_assists"], FieldValue::Integer(1));
    }
}
