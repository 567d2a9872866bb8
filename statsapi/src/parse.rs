//! Entity parsers for upstream JSON documents.
//!
//! Every parser is a pure function from a raw `serde_json::Value` to a
//! typed record. Upstream field names are an external contract and are
//! accessed verbatim; a missing or mistyped key is a `ParseError` naming
//! the full path, never a panic.

use chrono::{DateTime, NaiveDate, Utc};
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::status::GameStatus;

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("{doc}: missing key `{path}`")]
    MissingKey { doc: &'static str, path: String },

    #[error("{doc}: unexpected value type at `{path}`")]
    WrongType { doc: &'static str, path: String },

    #[error("unrecognized game status code {0}")]
    UnknownStatusCode(i64),
}

/// Cursor into a JSON document that tracks its own path for error messages.
#[derive(Clone, Copy)]
struct Node<'a> {
    doc: &'static str,
    value: &'a Value,
}

impl<'a> Node<'a> {
    fn root(doc: &'static str, value: &'a Value) -> Self {
        Node { doc, value }
    }

    fn missing(&self, path: &str) -> ParseError {
        ParseError::MissingKey {
            doc: self.doc,
            path: path.to_string(),
        }
    }

    fn wrong_type(&self, path: &str) -> ParseError {
        ParseError::WrongType {
            doc: self.doc,
            path: path.to_string(),
        }
    }

    /// Walks a dotted path of object keys and array indexes.
    fn at(&self, path: &str) -> Result<Node<'a>, ParseError> {
        let mut value = self.value;
        for step in path.split('.') {
            value = if let Ok(idx) = step.parse::<usize>() {
                value.get(idx).ok_or_else(|| self.missing(path))?
            } else {
                value.get(step).ok_or_else(|| self.missing(path))?
            };
        }
        Ok(Node {
            doc: self.doc,
            value,
        })
    }

    fn opt(&self, path: &str) -> Option<Node<'a>> {
        self.at(path).ok().filter(|n| !n.value.is_null())
    }

    fn i64(&self, path: &str) -> Result<i64, ParseError> {
        let node = self.at(path)?;
        node.int_like(path)
    }

    /// Accepts both JSON numbers and numeric strings; upstream is not
    /// consistent about which it sends (statusCode in particular is a
    /// string).
    fn int_like(&self, path: &str) -> Result<i64, ParseError> {
        match self.value {
            Value::Number(n) => n.as_i64().ok_or_else(|| self.wrong_type(path)),
            Value::String(s) => s.parse().map_err(|_| self.wrong_type(path)),
            _ => Err(self.wrong_type(path)),
        }
    }

    fn f64(&self, path: &str) -> Result<f64, ParseError> {
        let node = self.at(path)?;
        node.float_like(path)
    }

    fn float_like(&self, path: &str) -> Result<f64, ParseError> {
        match self.value {
            Value::Number(n) => n.as_f64().ok_or_else(|| self.wrong_type(path)),
            Value::String(s) => s.parse().map_err(|_| self.wrong_type(path)),
            _ => Err(self.wrong_type(path)),
        }
    }

    fn str(&self, path: &str) -> Result<&'a str, ParseError> {
        self.at(path)?
            .value
            .as_str()
            .ok_or_else(|| self.wrong_type(path))
    }

    fn string(&self, path: &str) -> Result<String, ParseError> {
        self.str(path).map(str::to_string)
    }

    fn bool(&self, path: &str) -> Result<bool, ParseError> {
        self.at(path)?
            .value
            .as_bool()
            .ok_or_else(|| self.wrong_type(path))
    }

    fn array(&self, path: &str) -> Result<&'a Vec<Value>, ParseError> {
        self.at(path)?
            .value
            .as_array()
            .ok_or_else(|| self.wrong_type(path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamSide::Home => "home",
            TeamSide::Away => "away",
        }
    }
}

// ---------------------------------------------------------------------------
// Teams endpoint
// ---------------------------------------------------------------------------

/// Basic team info, shaped for the `team` table.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamInfo {
    pub team_id: i64,
    pub full_name: String,
    pub abbreviation: String,
    pub division: i64,
    pub conference: i64,
    pub active: bool,
    pub franchise_id: i64,
}

pub fn team_info(doc: &Value) -> Result<TeamInfo, ParseError> {
    let team = Node::root("team_info", doc).at("teams.0")?;

    Ok(TeamInfo {
        team_id: team.i64("id")?,
        full_name: team.string("name")?,
        abbreviation: team.string("abbreviation")?,
        division: team.i64("division.id")?,
        conference: team.i64("conference.id")?,
        active: team.bool("active")?,
        franchise_id: team.i64("franchiseId")?,
    })
}

// ---------------------------------------------------------------------------
// Roster and people endpoints
// ---------------------------------------------------------------------------

/// Player ids on a team's current roster.
pub fn roster(doc: &Value) -> Result<Vec<i64>, ParseError> {
    let root = Node::root("roster", doc);
    root.array("roster")?
        .iter()
        .map(|person| Node::root("roster", person).i64("person.id"))
        .collect()
}

/// Biographical player info, shaped for the `player` table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub player_id: i64,
    pub team_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub number: Option<String>,
    pub position: String,
    pub handedness: String,
    pub rookie: bool,
    pub age: i64,
    pub birth_date: String,
    pub birth_city: String,
    pub birth_state: Option<String>,
    pub birth_country: String,
    pub height: String,
    pub weight: i64,
}

pub fn player_info(doc: &Value) -> Result<PlayerInfo, ParseError> {
    let person = Node::root("player_info", doc).at("people.0")?;

    Ok(PlayerInfo {
        player_id: person.i64("id")?,
        team_id: person.i64("currentTeam.id")?,
        first_name: person.string("firstName")?,
        last_name: person.string("lastName")?,
        number: person
            .opt("primaryNumber")
            .and_then(|n| n.value.as_str().map(str::to_string)),
        position: person.string("primaryPosition.abbreviation")?,
        handedness: person.string("shootsCatches")?,
        rookie: person.bool("rookie")?,
        age: person.i64("currentAge")?,
        birth_date: person.string("birthDate")?,
        birth_city: person.string("birthCity")?,
        birth_state: person
            .opt("birthStateProvince")
            .and_then(|n| n.value.as_str().map(str::to_string)),
        birth_country: person.string("birthCountry")?,
        height: person.string("height")?,
        weight: person.i64("weight")?,
    })
}

// ---------------------------------------------------------------------------
// Schedule endpoint
// ---------------------------------------------------------------------------

/// Game ids in a schedule response. Days or games being absent is a
/// legitimate empty schedule, not an error.
pub fn schedule_game_ids(doc: &Value) -> Vec<i64> {
    let mut ids = Vec::new();
    let Some(dates) = doc.get("dates").and_then(Value::as_array) else {
        return ids;
    };
    for day in dates {
        let Some(games) = day.get("games").and_then(Value::as_array) else {
            continue;
        };
        for game in games {
            if let Some(id) = game.get("gamePk").and_then(Value::as_i64) {
                ids.push(id);
            }
        }
    }
    ids
}

// ---------------------------------------------------------------------------
// Game feed endpoint
// ---------------------------------------------------------------------------

/// Fields live only while a game is in progress or finished; a Preview
/// payload structurally omits the linescore subtree they come from.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveState {
    pub period: String,
    pub time_remaining: String,
    pub in_intermission: bool,
}

/// The game-level slice of a feed document. `live` is `Some` exactly when
/// the status is not Preview.
#[derive(Debug, Clone, PartialEq)]
pub struct GameFeed {
    pub status_code: i64,
    pub status: GameStatus,
    pub start_time: DateTime<Utc>,
    pub game_date: NaiveDate,
    pub live: Option<LiveState>,
}

pub fn game_feed(doc: &Value) -> Result<GameFeed, ParseError> {
    let root = Node::root("game_feed", doc);

    let status_code = root.i64("gameData.status.statusCode")?;
    let status = GameStatus::from_code(status_code)?;

    let start_raw = root.str("gameData.datetime.dateTime")?;
    let start_time = DateTime::parse_from_rfc3339(start_raw)
        .map_err(|_| root.wrong_type("gameData.datetime.dateTime"))?
        .with_timezone(&Utc);

    let live = if status.is_preview() {
        None
    } else {
        let linescore = root.at("liveData.linescore")?;
        Some(LiveState {
            period: linescore.string("currentPeriodOrdinal")?,
            time_remaining: linescore.string("currentPeriodTimeRemaining")?,
            in_intermission: linescore.bool("intermissionInfo.inIntermission")?,
        })
    };

    Ok(GameFeed {
        status_code,
        status,
        start_time,
        game_date: start_time.date_naive(),
        live,
    })
}

/// Identity of one side of a game, from the feed's `gameData` subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamCore {
    pub team_id: i64,
    pub full_name: String,
    pub abbreviation: String,
    pub division: String,
    pub conference: String,
}

pub fn team_core(doc: &Value, side: TeamSide) -> Result<TeamCore, ParseError> {
    let team = Node::root("team_core", doc).at("gameData.teams")?.at(side.as_str())?;

    Ok(TeamCore {
        team_id: team.i64("id")?,
        full_name: team.string("name")?,
        abbreviation: team.string("abbreviation")?,
        division: team.string("division.name")?,
        conference: team.string("conference.name")?,
    })
}

pub fn team_goals(doc: &Value, side: TeamSide) -> Result<i64, ParseError> {
    Node::root("team_goals", doc)
        .at("liveData.linescore.teams")?
        .at(side.as_str())?
        .i64("goals")
}

/// One side's aggregate skater stats for a game, from the boxscore.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGameStats {
    pub goals: i64,
    pub pims: i64,
    pub shots: i64,
    pub pp_pct: f64,
    pub pp_goals: i64,
    pub pp_att: i64,
    pub faceoff_pct: f64,
    pub blocked: i64,
    pub takeaways: i64,
    pub giveaways: i64,
    pub hits: i64,
}

pub fn team_game_stats(doc: &Value, side: TeamSide) -> Result<TeamGameStats, ParseError> {
    let stats = Node::root("team_game_stats", doc)
        .at("liveData.boxscore.teams")?
        .at(side.as_str())?
        .at("teamStats.teamSkaterStats")?;

    Ok(TeamGameStats {
        goals: stats.i64("goals")?,
        pims: stats.i64("pim")?,
        shots: stats.i64("shots")?,
        pp_pct: stats.f64("powerPlayPercentage")?,
        pp_goals: stats.i64("powerPlayGoals")?,
        pp_att: stats.i64("powerPlayOpportunities")?,
        faceoff_pct: stats.f64("faceOffWinPercentage")?,
        blocked: stats.i64("blocked")?,
        takeaways: stats.i64("takeaways")?,
        giveaways: stats.i64("giveaways")?,
        hits: stats.i64("hits")?,
    })
}

/// One period's line for one side.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodLine {
    pub ordinal: String,
    pub goals: i64,
    pub shots: i64,
}

pub fn period_lines(doc: &Value, side: TeamSide) -> Result<Vec<PeriodLine>, ParseError> {
    let root = Node::root("period_lines", doc);
    root.array("liveData.linescore.periods")?
        .iter()
        .map(|per| {
            let per = Node::root("period_lines", per);
            let for_side = per.at(side.as_str())?;
            Ok(PeriodLine {
                ordinal: per.string("ordinalNum")?,
                goals: for_side.i64("goals")?,
                shots: for_side.i64("shotsOnGoal")?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShootoutLine {
    pub goals: i64,
    pub attempts: i64,
}

pub fn shootout(doc: &Value, side: TeamSide) -> Result<Option<ShootoutLine>, ParseError> {
    let root = Node::root("shootout", doc);
    if !root.bool("liveData.linescore.hasShootout")? {
        return Ok(None);
    }

    let info = root.at("liveData.linescore.shootoutInfo")?.at(side.as_str())?;
    Ok(Some(ShootoutLine {
        goals: info.i64("scores")?,
        attempts: info.i64("attempts")?,
    }))
}

// ---------------------------------------------------------------------------
// Boxscore players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SkaterGameStats {
    pub time_on_ice: String,
    pub assists: i64,
    pub goals: i64,
    pub pims: i64,
    pub shots: i64,
    pub hits: i64,
    pub pp_goals: i64,
    pub sh_goals: i64,
    pub ev_goals: i64,
    pub pp_assists: i64,
    pub sh_assists: i64,
    pub ev_assists: i64,
    pub faceoff_pct: f64,
    pub faceoff_wins: i64,
    pub faceoff_taken: i64,
    pub takeaways: i64,
    pub giveaways: i64,
    pub blocked: i64,
    pub plus_minus: i64,
    pub ev_toi: String,
    pub pp_toi: String,
    pub sh_toi: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalieGameStats {
    pub time_on_ice: String,
    pub assists: i64,
    pub goals: i64,
    pub pims: i64,
    pub shots_against: i64,
    pub saves: i64,
    pub pp_saves: i64,
    pub sh_saves: i64,
    pub ev_saves: i64,
    pub pp_shots: i64,
    pub sh_shots: i64,
    pub ev_shots: i64,
    pub decision: Option<String>,
    pub save_pct: f64,
    pub pp_save_pct: f64,
    pub sh_save_pct: f64,
    pub ev_save_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GamePlayerStats {
    Skater(SkaterGameStats),
    Goalie(GoalieGameStats),
}

/// One rostered player in a game's boxscore. `stats` is `None` for a
/// healthy scratch: the upstream payload simply omits their stat block,
/// which is not an error condition.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxscorePlayer {
    pub player_id: i64,
    pub position: String,
    pub stats: Option<GamePlayerStats>,
}

pub fn boxscore_players(doc: &Value, side: TeamSide) -> Result<Vec<BoxscorePlayer>, ParseError> {
    let root = Node::root("boxscore_players", doc);
    let players = root
        .at("liveData.boxscore.teams")?
        .at(side.as_str())?
        .at("players")?;
    let map = players
        .value
        .as_object()
        .ok_or_else(|| root.wrong_type("liveData.boxscore.teams.players"))?;

    map.values().map(boxscore_player).collect()
}

fn boxscore_player(entry: &Value) -> Result<BoxscorePlayer, ParseError> {
    let node = Node::root("boxscore_players", entry);
    let player_id = node.i64("person.id")?;
    let position = node.string("position.abbreviation")?;

    // An empty stats object, or one without a skater/goalie block, means
    // a scratch.
    let stats = match node.opt("stats") {
        None => None,
        Some(stats) => {
            if position == "G" {
                match stats.opt("goalieStats") {
                    Some(goalie) => Some(GamePlayerStats::Goalie(goalie_game_stats(&goalie)?)),
                    None => None,
                }
            } else {
                match stats.opt("skaterStats") {
                    Some(skater) => Some(GamePlayerStats::Skater(skater_game_stats(&skater)?)),
                    None => None,
                }
            }
        }
    };

    Ok(BoxscorePlayer {
        player_id,
        position,
        stats,
    })
}

fn skater_game_stats(stats: &Node) -> Result<SkaterGameStats, ParseError> {
    let goals = stats.i64("goals")?;
    let assists = stats.i64("assists")?;
    let pp_goals = stats.i64("powerPlayGoals")?;
    let sh_goals = stats.i64("shortHandedGoals")?;
    let pp_assists = stats.i64("powerPlayAssists")?;
    let sh_assists = stats.i64("shortHandedAssists")?;

    Ok(SkaterGameStats {
        time_on_ice: stats.string("timeOnIce")?,
        assists,
        goals,
        pims: stats.i64("penaltyMinutes")?,
        shots: stats.i64("shots")?,
        hits: stats.i64("hits")?,
        pp_goals,
        sh_goals,
        ev_goals: goals - pp_goals - sh_goals,
        pp_assists,
        sh_assists,
        ev_assists: assists - pp_assists - sh_assists,
        // Non-forwards don't get this key.
        faceoff_pct: stats
            .opt("faceOffPct")
            .map(|n| n.float_like("faceOffPct"))
            .transpose()?
            .unwrap_or(0.0),
        faceoff_wins: stats.i64("faceOffWins")?,
        faceoff_taken: stats.i64("faceoffTaken")?,
        takeaways: stats.i64("takeaways")?,
        giveaways: stats.i64("giveaways")?,
        blocked: stats.i64("blocked")?,
        plus_minus: stats.i64("plusMinus")?,
        ev_toi: stats.string("evenTimeOnIce")?,
        pp_toi: stats.string("powerPlayTimeOnIce")?,
        sh_toi: stats.string("shortHandedTimeOnIce")?,
    })
}

fn goalie_game_stats(stats: &Node) -> Result<GoalieGameStats, ParseError> {
    let pct = |key: &str| -> Result<f64, ParseError> {
        // Absent until the goalie has faced a shot.
        stats
            .opt(key)
            .map(|n| n.float_like(key))
            .transpose()
            .map(|v| v.unwrap_or(0.0))
    };

    Ok(GoalieGameStats {
        time_on_ice: stats.string("timeOnIce")?,
        assists: stats.i64("assists")?,
        goals: stats.i64("goals")?,
        pims: stats.i64("pim")?,
        shots_against: stats.i64("shots")?,
        saves: stats.i64("saves")?,
        pp_saves: stats.i64("powerPlaySaves")?,
        sh_saves: stats.i64("shortHandedSaves")?,
        ev_saves: stats.i64("evenSaves")?,
        pp_shots: stats.i64("powerPlayShotsAgainst")?,
        sh_shots: stats.i64("shortHandedShotsAgainst")?,
        ev_shots: stats.i64("evenShotsAgainst")?,
        // Absent until the game is decided.
        decision: stats.opt("decision").and_then(|n| n.value.as_str().map(str::to_string)),
        save_pct: pct("savePercentage")?,
        pp_save_pct: pct("powerPlaySavePercentage")?,
        sh_save_pct: pct("shortHandedSavePercentage")?,
        ev_save_pct: pct("evenStrengthSavePercentage")?,
    })
}

// ---------------------------------------------------------------------------
// Season stats (two-phase writes)
// ---------------------------------------------------------------------------

/// Metadata row for a team's season; the stats row is keyed by the
/// generated id of this row.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSeasonMeta {
    pub team_id: i64,
    pub season: String,
    pub franchise_id: i64,
    pub division_id: i64,
    pub conference_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSeasonStats {
    pub games_played: i64,
    pub wins: i64,
    pub losses: i64,
    pub ot_losses: i64,
    pub points: i64,
    pub pt_pct: f64,
    pub goals_for_pg: f64,
    pub goals_ag_pg: f64,
    pub evgga_ratio: f64,
    pub pp_pct: f64,
    pub pp_goals_for: i64,
    pub pp_opp: i64,
    pub pk_pct: f64,
    pub pp_goals_ag: i64,
    pub shots_for_pg: f64,
    pub shots_ag_pg: f64,
    pub win_score_first: f64,
    pub win_opp_score_first: f64,
    pub win_lead_first_per: f64,
    pub win_lead_second_per: f64,
    pub win_outshoot_opp: f64,
    pub win_outshot_by_opp: f64,
    pub faceoffs_taken: i64,
    pub faceoff_wins: i64,
    pub faceoff_losses: i64,
    pub faceoff_pct: f64,
    pub save_pct: f64,
    pub shooting_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSeason {
    pub meta: TeamSeasonMeta,
    pub stats: TeamSeasonStats,
}

pub fn team_season(doc: &Value, season: &str) -> Result<TeamSeason, ParseError> {
    let team = Node::root("team_season", doc).at("teams.0")?;

    let meta = TeamSeasonMeta {
        team_id: team.i64("id")?,
        season: season.to_string(),
        franchise_id: team.i64("franchise.franchiseId")?,
        division_id: team.i64("division.id")?,
        conference_id: team.i64("conference.id")?,
    };

    let stat = team.at("teamStats.0.splits.0.stat")?;
    let stats = TeamSeasonStats {
        games_played: stat.i64("gamesPlayed")?,
        wins: stat.i64("wins")?,
        losses: stat.i64("losses")?,
        ot_losses: stat.i64("ot")?,
        points: stat.i64("pts")?,
        pt_pct: stat.f64("ptPctg")?,
        goals_for_pg: stat.f64("goalsPerGame")?,
        goals_ag_pg: stat.f64("goalsAgainstPerGame")?,
        evgga_ratio: stat.f64("evGGARatio")?,
        pp_pct: stat.f64("powerPlayPercentage")?,
        pp_goals_for: stat.i64("powerPlayGoals")?,
        pp_opp: stat.i64("powerPlayOpportunities")?,
        pk_pct: stat.f64("penaltyKillPercentage")?,
        pp_goals_ag: stat.i64("powerPlayGoalsAgainst")?,
        shots_for_pg: stat.f64("shotsPerGame")?,
        shots_ag_pg: stat.f64("shotsAllowed")?,
        win_score_first: stat.f64("winScoreFirst")?,
        win_opp_score_first: stat.f64("winOppScoreFirst")?,
        win_lead_first_per: stat.f64("winLeadFirstPer")?,
        win_lead_second_per: stat.f64("winLeadSecondPer")?,
        win_outshoot_opp: stat.f64("winOutshootOpp")?,
        win_outshot_by_opp: stat.f64("winOutshotByOpp")?,
        faceoffs_taken: stat.i64("faceOffsTaken")?,
        faceoff_wins: stat.i64("faceOffsWon")?,
        faceoff_losses: stat.i64("faceOffsLost")?,
        faceoff_pct: stat.f64("faceOffWinPercentage")?,
        save_pct: stat.f64("savePctg")?,
        shooting_pct: stat.f64("shootingPctg")?,
    };

    Ok(TeamSeason { meta, stats })
}

/// Metadata row for one player-season; skater/goalie stat rows are keyed
/// by the generated id of this row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSeasonMeta {
    pub player_id: i64,
    pub season: String,
    pub league_id: Option<i64>,
    pub league_name: String,
    pub team_id: Option<i64>,
    pub team_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkaterSeasonStats {
    pub time_on_ice: Option<String>,
    pub assists: Option<i64>,
    pub goals: Option<i64>,
    pub points: Option<i64>,
    pub pims: Option<i64>,
    pub shots: Option<i64>,
    pub games: Option<i64>,
    pub hits: Option<i64>,
    pub pp_goals: Option<i64>,
    pub pp_points: Option<i64>,
    pub pp_toi: Option<String>,
    pub sh_goals: Option<i64>,
    pub sh_points: Option<i64>,
    pub sh_toi: Option<String>,
    pub ev_toi: Option<String>,
    pub faceoff_pct: Option<f64>,
    pub shooting_pct: Option<f64>,
    pub gwg: Option<i64>,
    pub ot_goals: Option<i64>,
    pub plus_minus: Option<i64>,
    pub blocked: Option<i64>,
    pub shifts: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalieSeasonStats {
    pub time_on_ice: Option<String>,
    pub shutouts: Option<i64>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
    pub ot_losses: Option<i64>,
    pub ties: Option<i64>,
    pub saves: Option<i64>,
    pub pp_saves: Option<i64>,
    pub sh_saves: Option<i64>,
    pub ev_saves: Option<i64>,
    pub pp_shots: Option<i64>,
    pub sh_shots: Option<i64>,
    pub ev_shots: Option<i64>,
    pub save_pct: Option<f64>,
    pub gaa: Option<f64>,
    pub games: Option<i64>,
    pub games_started: Option<i64>,
    pub shots_against: Option<i64>,
    pub goals_against: Option<i64>,
    pub pp_save_pct: Option<f64>,
    pub sh_save_pct: Option<f64>,
    pub ev_save_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkaterSeason {
    pub meta: PlayerSeasonMeta,
    pub stats: SkaterSeasonStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalieSeason {
    pub meta: PlayerSeasonMeta,
    pub stats: GoalieSeasonStats,
}

/// The first stats split of the response, or `None` when the player has
/// no stats for the requested season (skip, not an error).
fn season_split<'a>(doc: &'a Value) -> Result<Option<Node<'a>>, ParseError> {
    let root = Node::root("player_season", doc);
    let splits = root.array("stats.0.splits")?;
    Ok(splits.first().map(|split| Node::root("player_season", split)))
}

fn player_season_meta(player_id: i64, split: &Node) -> Result<PlayerSeasonMeta, ParseError> {
    Ok(PlayerSeasonMeta {
        player_id,
        season: split.string("season")?,
        // Minor-league teams and leagues frequently have no upstream id.
        league_id: split.opt("league.id").map(|n| n.int_like("league.id")).transpose()?,
        league_name: split.string("league.name")?,
        team_id: split.opt("team.id").map(|n| n.int_like("team.id")).transpose()?,
        team_name: split.string("team.name")?,
    })
}

pub fn skater_season(player_id: i64, doc: &Value) -> Result<Option<SkaterSeason>, ParseError> {
    let Some(split) = season_split(doc)? else {
        return Ok(None);
    };
    let meta = player_season_meta(player_id, &split)?;
    let stat = split.at("stat")?;

    let int = |key: &str| stat.opt(key).map(|n| n.int_like(key)).transpose();
    let float = |key: &str| stat.opt(key).map(|n| n.float_like(key)).transpose();
    let text = |key: &str| stat.opt(key).and_then(|n| n.value.as_str().map(str::to_string));

    let stats = SkaterSeasonStats {
        time_on_ice: text("timeOnIce"),
        assists: int("assists")?,
        goals: int("goals")?,
        points: int("points")?,
        pims: int("pim")?,
        shots: int("shots")?,
        games: int("games")?,
        hits: int("hits")?,
        pp_goals: int("powerPlayGoals")?,
        pp_points: int("powerPlayPoints")?,
        pp_toi: text("powerPlayTimeOnIce"),
        sh_goals: int("shortHandedGoals")?,
        sh_points: int("shortHandedPoints")?,
        sh_toi: text("shortHandedTimeOnIce"),
        ev_toi: text("evenTimeOnIce"),
        faceoff_pct: float("faceOffPct")?,
        shooting_pct: float("shotPct")?,
        gwg: int("gameWinningGoals")?,
        ot_goals: int("overTimeGoals")?,
        plus_minus: int("plusMinus")?,
        blocked: int("blocked")?,
        shifts: int("shifts")?,
    };

    Ok(Some(SkaterSeason { meta, stats }))
}

pub fn goalie_season(player_id: i64, doc: &Value) -> Result<Option<GoalieSeason>, ParseError> {
    let Some(split) = season_split(doc)? else {
        return Ok(None);
    };
    let meta = player_season_meta(player_id, &split)?;
    let stat = split.at("stat")?;

    let int = |key: &str| stat.opt(key).map(|n| n.int_like(key)).transpose();
    let float = |key: &str| stat.opt(key).map(|n| n.float_like(key)).transpose();
    let text = |key: &str| stat.opt(key).and_then(|n| n.value.as_str().map(str::to_string));

    let stats = GoalieSeasonStats {
        time_on_ice: text("timeOnIce"),
        shutouts: int("shutouts")?,
        wins: int("wins")?,
        losses: int("losses")?,
        ot_losses: int("ot")?,
        ties: int("ties")?,
        saves: int("saves")?,
        pp_saves: int("powerPlaySaves")?,
        sh_saves: int("shortHandedSaves")?,
        ev_saves: int("evenSaves")?,
        pp_shots: int("powerPlayShots")?,
        sh_shots: int("shortHandedShots")?,
        ev_shots: int("evenShots")?,
        save_pct: float("savePercentage")?,
        gaa: float("goalAgainstAverage")?,
        games: int("games")?,
        games_started: int("gamesStarted")?,
        shots_against: int("shotsAgainst")?,
        goals_against: int("goalsAgainst")?,
        pp_save_pct: float("powerPlaySavePercentage")?,
        sh_save_pct: float("shortHandedSavePercentage")?,
        ev_save_pct: float("evenStrengthSavePercentage")?,
    };

    Ok(Some(GoalieSeason { meta, stats }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn team_info_reads_nested_ids() {
        let doc = json!({
            "teams": [{
                "id": 6,
                "name": "Boston Bruins",
                "abbreviation": "BOS",
                "division": {"id": 17, "name": "Atlantic"},
                "conference": {"id": 6, "name": "Eastern"},
                "active": true,
                "franchiseId": 6,
            }]
        });

        let info = team_info(&doc).unwrap();
        assert_eq!(info.team_id, 6);
        assert_eq!(info.division, 17);
        assert_eq!(info.conference, 6);
        assert!(info.active);
    }

    #[test]
    fn team_info_missing_key_names_the_path() {
        let doc = json!({"teams": [{"id": 6}]});
        let err = team_info(&doc).unwrap_err();
        assert!(matches!(err, ParseError::MissingKey { doc: "team_info", .. }));
    }

    #[test]
    fn player_info_optional_fields_default_to_none() {
        let doc = json!({
            "people": [{
                "id": 8470600,
                "currentTeam": {"id": 6},
                "firstName": "Zdeno",
                "lastName": "Chara",
                "primaryPosition": {"abbreviation": "D"},
                "shootsCatches": "L",
                "rookie": false,
                "currentAge": 42,
                "birthDate": "1977-03-18",
                "birthCity": "Trencin",
                "birthCountry": "SVK",
                "height": "6' 9\"",
                "weight": 250,
            }]
        });

        let info = player_info(&doc).unwrap();
        assert_eq!(info.player_id, 8470600);
        assert_eq!(info.number, None);
        assert_eq!(info.birth_state, None);
        assert_eq!(info.team_id, 6);
    }

    #[test]
    fn roster_extracts_person_ids() {
        let doc = json!({
            "roster": [
                {"person": {"id": 1, "fullName": "A"}},
                {"person": {"id": 2, "fullName": "B"}},
            ]
        });
        assert_eq!(roster(&doc).unwrap(), vec![1, 2]);
    }

    #[test]
    fn schedule_with_no_dates_is_empty() {
        assert!(schedule_game_ids(&json!({})).is_empty());
        let doc = json!({"dates": [{"games": [{"gamePk": 99}]}]});
        assert_eq!(schedule_game_ids(&doc), vec![99]);
    }

    fn preview_feed() -> Value {
        json!({
            "gameData": {
                "status": {"statusCode": "1"},
                "datetime": {"dateTime": "2020-02-01T00:00:00Z"},
            },
            "liveData": {}
        })
    }

    #[test]
    fn preview_feed_has_no_live_state() {
        let feed = game_feed(&preview_feed()).unwrap();
        assert_eq!(feed.status, GameStatus::Preview);
        assert_eq!(feed.status_code, 1);
        assert!(feed.live.is_none());
    }

    #[test]
    fn live_feed_reads_linescore() {
        let doc = json!({
            "gameData": {
                "status": {"statusCode": "3"},
                "datetime": {"dateTime": "2020-02-01T00:00:00Z"},
            },
            "liveData": {
                "linescore": {
                    "currentPeriodOrdinal": "2nd",
                    "currentPeriodTimeRemaining": "12:34",
                    "intermissionInfo": {"inIntermission": false},
                }
            }
        });

        let feed = game_feed(&doc).unwrap();
        assert_eq!(feed.status, GameStatus::Live);
        let live = feed.live.unwrap();
        assert_eq!(live.period, "2nd");
        assert_eq!(live.time_remaining, "12:34");
        assert!(!live.in_intermission);
    }

    #[test]
    fn scratched_player_has_no_stats() {
        let entry = json!({
            "person": {"id": 42},
            "position": {"abbreviation": "C"},
            "stats": {},
        });
        let player = boxscore_player(&entry).unwrap();
        assert_eq!(player.player_id, 42);
        assert!(player.stats.is_none());
    }

    #[test]
    fn goalie_percentages_default_before_first_shot() {
        let entry = json!({
            "person": {"id": 7},
            "position": {"abbreviation": "G"},
            "stats": {
                "goalieStats": {
                    "timeOnIce": "20:00",
                    "assists": 0,
                    "goals": 0,
                    "pim": 0,
                    "shots": 0,
                    "saves": 0,
                    "powerPlaySaves": 0,
                    "shortHandedSaves": 0,
                    "evenSaves": 0,
                    "powerPlayShotsAgainst": 0,
                    "shortHandedShotsAgainst": 0,
                    "evenShotsAgainst": 0,
                }
            },
        });
        let player = boxscore_player(&entry).unwrap();
        match player.stats.unwrap() {
            GamePlayerStats::Goalie(g) => {
                assert_eq!(g.save_pct, 0.0);
                assert_eq!(g.decision, None);
            }
            other => panic!("expected goalie stats, got {other:?}"),
        }
    }

    #[test]
    fn skater_derived_even_strength_counts() {
        let entry = json!({
            "person": {"id": 9},
            "position": {"abbreviation": "C"},
            "stats": {
                "skaterStats": {
                    "timeOnIce": "18:21",
                    "assists": 3,
                    "goals": 2,
                    "penaltyMinutes": 0,
                    "shots": 5,
                    "hits": 1,
                    "powerPlayGoals": 1,
                    "shortHandedGoals": 0,
                    "powerPlayAssists": 1,
                    "shortHandedAssists": 1,
                    "faceOffPct": "55.0",
                    "faceOffWins": 11,
                    "faceoffTaken": 20,
                    "takeaways": 1,
                    "giveaways": 2,
                    "blocked": 0,
                    "plusMinus": 2,
                    "evenTimeOnIce": "14:01",
                    "powerPlayTimeOnIce": "3:10",
                    "shortHandedTimeOnIce": "1:10",
                }
            },
        });
        let player = boxscore_player(&entry).unwrap();
        match player.stats.unwrap() {
            GamePlayerStats::Skater(s) => {
                assert_eq!(s.ev_goals, 1);
                assert_eq!(s.ev_assists, 1);
                assert_eq!(s.faceoff_pct, 55.0);
            }
            other => panic!("expected skater stats, got {other:?}"),
        }
    }

    #[test]
    fn skater_season_with_no_splits_is_none() {
        let doc = json!({"stats": [{"splits": []}]});
        assert!(skater_season(1, &doc).unwrap().is_none());
    }

    #[test]
    fn skater_season_meta_tolerates_missing_league_id() {
        let doc = json!({
            "stats": [{
                "splits": [{
                    "season": "20192020",
                    "team": {"name": "Providence Bruins"},
                    "league": {"name": "AHL"},
                    "stat": {"goals": 10, "assists": 20},
                }]
            }]
        });
        let season = skater_season(55, &doc).unwrap().unwrap();
        assert_eq!(season.meta.player_id, 55);
        assert_eq!(season.meta.team_id, None);
        assert_eq!(season.meta.league_id, None);
        assert_eq!(season.stats.goals, Some(10));
        assert_eq!(season.stats.shifts, None);
    }
}
