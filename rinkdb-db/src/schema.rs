//! Table definitions and the column registry.
//!
//! The registry is the authoritative list of what each table looks like.
//! The store validates every field name against it before building SQL,
//! so a parser and a table drifting apart fails loudly instead of
//! silently growing columns.

use rusqlite::Connection;

pub const TEAM_TABLE: &str = r#"
CREATE TABLE "team" (
    "team_id"       INTEGER NOT NULL UNIQUE,
    "full_name"     TEXT NOT NULL,
    "abbreviation"  TEXT NOT NULL CHECK(length("abbreviation") <= 3),
    "division"      INTEGER NOT NULL,
    "conference"    INTEGER NOT NULL,
    "active"        INTEGER CHECK("active" == 1 OR "active" == 0),
    "franchise_id"  INTEGER NOT NULL,
    PRIMARY KEY("team_id")
);
"#;

pub const PLAYER_TABLE: &str = r#"
CREATE TABLE "player" (
    "player_id"     INTEGER NOT NULL UNIQUE,
    "team_id"       INTEGER NOT NULL,
    "first_name"    TEXT NOT NULL,
    "last_name"     TEXT NOT NULL,
    "number"        TEXT,
    "position"      TEXT NOT NULL CHECK(
        "position" == "D" OR
        "position" == "G" OR
        "position" == "LW" OR
        "position" == "RW" OR
        "position" == "C"
        ),
    "handedness"    TEXT NOT NULL CHECK(
        "handedness" == "R" OR
        "handedness" == "L"
        ),
    "rookie"        INTEGER CHECK("rookie" == 0 OR "rookie" == 1),
    "age"           INTEGER,
    "birth_date"    TEXT,
    "birth_city"    TEXT,
    "birth_state"   TEXT,
    "birth_country" TEXT,
    "height"        TEXT,
    "weight"        INTEGER,
    "last_updated"  TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY("team_id") REFERENCES "team"("team_id"),
    PRIMARY KEY("player_id")
);
"#;

pub const TEAM_SEASON_TABLE: &str = r#"
CREATE TABLE "team_season" (
    "unique_id"     INTEGER NOT NULL UNIQUE,
    "team_id"       INTEGER NOT NULL,
    "season"        TEXT NOT NULL,
    "franchise_id"  INTEGER,
    "division_id"   INTEGER,
    "conference_id" INTEGER,
    PRIMARY KEY("unique_id" AUTOINCREMENT),
    FOREIGN KEY("team_id") REFERENCES "team"("team_id")
);
"#;

pub const TEAM_SEASON_STATS_TABLE: &str = r#"
CREATE TABLE "team_season_stats" (
    "unique_id"             INTEGER NOT NULL UNIQUE,
    "games_played"          INTEGER,
    "wins"                  INTEGER,
    "losses"                INTEGER,
    "ot_losses"             INTEGER,
    "points"                INTEGER,
    "pt_pct"                REAL,
    "goals_for_pg"          REAL,
    "goals_ag_pg"           REAL,
    "evgga_ratio"           REAL,
    "pp_pct"                REAL,
    "pp_goals_for"          INTEGER,
    "pp_opp"                INTEGER,
    "pk_pct"                REAL,
    "pp_goals_ag"           INTEGER,
    "shots_for_pg"          REAL,
    "shots_ag_pg"           REAL,
    "win_score_first"       REAL,
    "win_opp_score_first"   REAL,
    "win_lead_first_per"    REAL,
    "win_lead_second_per"   REAL,
    "win_outshoot_opp"      REAL,
    "win_outshot_by_opp"    REAL,
    "faceoffs_taken"        INTEGER,
    "faceoff_wins"          INTEGER,
    "faceoff_losses"        INTEGER,
    "faceoff_pct"           REAL,
    "save_pct"              REAL,
    "shooting_pct"          REAL,
    "last_updated"          TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY("unique_id") REFERENCES "team_season"("unique_id"),
    PRIMARY KEY("unique_id")
);
"#;

pub const PLAYER_SEASON_TABLE: &str = r#"
CREATE TABLE "player_season" (
    "unique_id"     INTEGER UNIQUE,
    "player_id"     INTEGER NOT NULL,
    "season"        TEXT NOT NULL,
    "league_id"     INTEGER,
    "league_name"   TEXT NOT NULL,
    "team_id"       INTEGER,
    "team_name"     TEXT NOT NULL,
    FOREIGN KEY("player_id") REFERENCES "player"("player_id"),
    PRIMARY KEY("unique_id" AUTOINCREMENT)
);
"#;

pub const SKATER_SEASON_STATS_TABLE: &str = r#"
CREATE TABLE "skater_season_stats" (
    "unique_id"     INTEGER NOT NULL,
    "time_on_ice"   TEXT,
    "assists"       INTEGER,
    "goals"         INTEGER,
    "points"        INTEGER,
    "pims"          INTEGER,
    "shots"         INTEGER,
    "games"         INTEGER,
    "hits"          INTEGER,
    "pp_goals"      INTEGER,
    "pp_assists"    INTEGER,
    "pp_points"     INTEGER,
    "pp_toi"        TEXT,
    "sh_goals"      INTEGER,
    "sh_assists"    INTEGER,
    "sh_points"     INTEGER,
    "sh_toi"        TEXT,
    "ev_toi"        TEXT,
    "faceoff_pct"   REAL,
    "shooting_pct"  REAL,
    "gwg"           INTEGER,
    "ot_goals"      INTEGER,
    "plus_minus"    INTEGER,
    "blocked"       INTEGER,
    "shifts"        INTEGER,
    "last_updated"  TEXT DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY("unique_id"),
    FOREIGN KEY("unique_id") REFERENCES "player_season"("unique_id")
);
"#;

pub const GOALIE_SEASON_STATS_TABLE: &str = r#"
CREATE TABLE "goalie_season_stats" (
    "unique_id"     INTEGER NOT NULL UNIQUE,
    "time_on_ice"   TEXT,
    "shutouts"      INTEGER,
    "wins"          INTEGER,
    "losses"        INTEGER,
    "ot_losses"     INTEGER,
    "ties"          INTEGER,
    "saves"         INTEGER,
    "pp_saves"      INTEGER,
    "sh_saves"      INTEGER,
    "ev_saves"      INTEGER,
    "pp_shots"      INTEGER,
    "sh_shots"      INTEGER,
    "ev_shots"      INTEGER,
    "save_pct"      REAL,
    "gaa"           REAL,
    "games"         INTEGER,
    "games_started" INTEGER,
    "shots_against" INTEGER,
    "goals_against" INTEGER,
    "pp_save_pct"   REAL,
    "sh_save_pct"   REAL,
    "ev_save_pct"   REAL,
    "last_updated"  TEXT DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY("unique_id"),
    FOREIGN KEY("unique_id") REFERENCES "player_season"("unique_id")
);
"#;

const UPDATE_TIME_PLAYER_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS update_time_player AFTER UPDATE ON player
    BEGIN
        UPDATE player SET last_updated = CURRENT_TIMESTAMP
            WHERE player_id = NEW.player_id;
    END;
"#;

const UPDATE_TIME_TEAM_STATS_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS update_time_team_stats AFTER UPDATE ON team_season_stats
    BEGIN
        UPDATE team_season_stats SET last_updated = CURRENT_TIMESTAMP
            WHERE unique_id = NEW.unique_id;
    END;
"#;

const UPDATE_TIME_SKATER_STATS_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS update_time_skater_stats AFTER UPDATE ON skater_season_stats
    BEGIN
        UPDATE skater_season_stats SET last_updated = CURRENT_TIMESTAMP
            WHERE unique_id = NEW.unique_id;
    END;
"#;

const UPDATE_TIME_GOALIE_STATS_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS update_time_goalie_stats AFTER UPDATE ON goalie_season_stats
    BEGIN
        UPDATE goalie_season_stats SET last_updated = CURRENT_TIMESTAMP
            WHERE unique_id = NEW.unique_id;
    END;
"#;

// Upstream reports power-play and short-handed assists only as
// points-minus-goals, so the table derives them.
const COMPUTE_ASSISTS_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS compute_assists_ins AFTER INSERT ON skater_season_stats
    BEGIN
        UPDATE skater_season_stats
            SET pp_assists = (NEW.pp_points - NEW.pp_goals),
                sh_assists = (NEW.sh_points - NEW.sh_goals)
            WHERE unique_id = NEW.unique_id;
    END;
"#;

const TRIGGERS: &[&str] = &[
    UPDATE_TIME_PLAYER_TRIGGER,
    UPDATE_TIME_TEAM_STATS_TRIGGER,
    UPDATE_TIME_SKATER_STATS_TRIGGER,
    UPDATE_TIME_GOALIE_STATS_TRIGGER,
    COMPUTE_ASSISTS_TRIGGER,
];

pub const BASE_TABLES: &[(&str, &str)] = &[
    ("team", TEAM_TABLE),
    ("player", PLAYER_TABLE),
    ("team_season", TEAM_SEASON_TABLE),
    ("team_season_stats", TEAM_SEASON_STATS_TABLE),
    ("player_season", PLAYER_SEASON_TABLE),
    ("skater_season_stats", SKATER_SEASON_STATS_TABLE),
    ("goalie_season_stats", GOALIE_SEASON_STATS_TABLE),
];

pub const TEAM_COLS: &[&str] = &[
    "team_id",
    "full_name",
    "abbreviation",
    "division",
    "conference",
    "active",
    "franchise_id",
];

pub const PLAYER_COLS: &[&str] = &[
    "player_id",
    "team_id",
    "first_name",
    "last_name",
    "number",
    "position",
    "handedness",
    "rookie",
    "age",
    "birth_date",
    "birth_city",
    "birth_state",
    "birth_country",
    "height",
    "weight",
    "last_updated",
];

pub const TEAM_SEASON_COLS: &[&str] = &[
    "unique_id",
    "team_id",
    "season",
    "franchise_id",
    "division_id",
    "conference_id",
];

pub const TEAM_SEASON_STATS_COLS: &[&str] = &[
    "unique_id",
    "games_played",
    "wins",
    "losses",
    "ot_losses",
    "points",
    "pt_pct",
    "goals_for_pg",
    "goals_ag_pg",
    "evgga_ratio",
    "pp_pct",
    "pp_goals_for",
    "pp_opp",
    "pk_pct",
    "pp_goals_ag",
    "shots_for_pg",
    "shots_ag_pg",
    "win_score_first",
    "win_opp_score_first",
    "win_lead_first_per",
    "win_lead_second_per",
    "win_outshoot_opp",
    "win_outshot_by_opp",
    "faceoffs_taken",
    "faceoff_wins",
    "faceoff_losses",
    "faceoff_pct",
    "save_pct",
    "shooting_pct",
    "last_updated",
];

pub const PLAYER_SEASON_COLS: &[&str] = &[
    "unique_id",
    "player_id",
    "season",
    "league_id",
    "league_name",
    "team_id",
    "team_name",
];

pub const SKATER_SEASON_STATS_COLS: &[&str] = &[
    "unique_id",
    "time_on_ice",
    "assists",
    "goals",
    "points",
    "pims",
    "shots",
    "games",
    "hits",
    "pp_goals",
    "pp_assists",
    "pp_points",
    "pp_toi",
    "sh_goals",
    "sh_assists",
    "sh_points",
    "sh_toi",
    "ev_toi",
    "faceoff_pct",
    "shooting_pct",
    "gwg",
    "ot_goals",
    "plus_minus",
    "blocked",
    "shifts",
    "last_updated",
];

pub const GOALIE_SEASON_STATS_COLS: &[&str] = &[
    "unique_id",
    "time_on_ice",
    "shutouts",
    "wins",
    "losses",
    "ot_losses",
    "ties",
    "saves",
    "pp_saves",
    "sh_saves",
    "ev_saves",
    "pp_shots",
    "sh_shots",
    "ev_shots",
    "save_pct",
    "gaa",
    "games",
    "games_started",
    "shots_against",
    "goals_against",
    "pp_save_pct",
    "sh_save_pct",
    "ev_save_pct",
    "last_updated",
];

/// Columns of `table`, or `None` for a table this schema doesn't define.
pub fn columns(table: &str) -> Option<&'static [&'static str]> {
    match table {
        "team" => Some(TEAM_COLS),
        "player" => Some(PLAYER_COLS),
        "team_season" => Some(TEAM_SEASON_COLS),
        "team_season_stats" => Some(TEAM_SEASON_STATS_COLS),
        "player_season" => Some(PLAYER_SEASON_COLS),
        "skater_season_stats" => Some(SKATER_SEASON_STATS_COLS),
        "goalie_season_stats" => Some(GOALIE_SEASON_STATS_COLS),
        _ => None,
    }
}

const GET_TABLES: &str = "SELECT tbl_name FROM sqlite_master WHERE type = 'table'";

/// Base tables not yet present in the database. Non-empty on first open;
/// a partial result means an interrupted install or a foreign file.
pub fn undefined_tables(conn: &Connection) -> Result<Vec<&'static str>, rusqlite::Error> {
    let mut stmt = conn.prepare(GET_TABLES)?;
    let existing = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BASE_TABLES
        .iter()
        .filter(|(name, _)| !existing.iter().any(|e| e == name))
        .map(|(name, _)| *name)
        .collect())
}

/// Creates any missing base tables and all triggers. Returns the names of
/// the tables it created.
pub fn ensure_schema(conn: &Connection) -> Result<Vec<&'static str>, rusqlite::Error> {
    let missing = undefined_tables(conn)?;
    for (name, ddl) in BASE_TABLES {
        if missing.contains(name) {
            conn.execute_batch(ddl)?;
        }
    }
    for trigger in TRIGGERS {
        conn.execute_batch(trigger)?;
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reports_all_tables_missing() {
        let conn = Connection::open_in_memory().unwrap();
        let missing = undefined_tables(&conn).unwrap();
        assert_eq!(missing.len(), BASE_TABLES.len());
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let created = ensure_schema(&conn).unwrap();
        assert_eq!(created.len(), BASE_TABLES.len());

        let created_again = ensure_schema(&conn).unwrap();
        assert!(created_again.is_empty());
    }

    #[test]
    fn every_base_table_has_a_column_registry() {
        for (name, _) in BASE_TABLES {
            assert!(columns(name).is_some(), "no registry for {name}");
        }
        assert!(columns("boxscore").is_none());
    }
}
