//! Conversions from parsed upstream entities to insertable field maps.
//!
//! Field order here matches the registry in [`crate::schema`]; the store
//! validates every name again at write time.

use statsapi::parse::{
    GoalieSeasonStats, PlayerInfo, PlayerSeasonMeta, SkaterSeasonStats, TeamInfo, TeamSeasonMeta,
    TeamSeasonStats,
};

use crate::store::FieldMap;

pub fn team_row(team: &TeamInfo) -> FieldMap {
    vec![
        ("team_id", team.team_id.into()),
        ("full_name", team.full_name.clone().into()),
        ("abbreviation", team.abbreviation.clone().into()),
        ("division", team.division.into()),
        ("conference", team.conference.into()),
        ("active", team.active.into()),
        ("franchise_id", team.franchise_id.into()),
    ]
}

// last_updated is deliberately absent: the column default covers the
// insert and the update trigger covers everything after.
pub fn player_row(player: &PlayerInfo) -> FieldMap {
    vec![
        ("player_id", player.player_id.into()),
        ("team_id", player.team_id.into()),
        ("first_name", player.first_name.clone().into()),
        ("last_name", player.last_name.clone().into()),
        ("number", player.number.clone().into()),
        ("position", player.position.clone().into()),
        ("handedness", player.handedness.clone().into()),
        ("rookie", player.rookie.into()),
        ("age", player.age.into()),
        ("birth_date", player.birth_date.clone().into()),
        ("birth_city", player.birth_city.clone().into()),
        ("birth_state", player.birth_state.clone().into()),
        ("birth_country", player.birth_country.clone().into()),
        ("height", player.height.clone().into()),
        ("weight", player.weight.into()),
    ]
}

pub fn team_season_row(meta: &TeamSeasonMeta) -> FieldMap {
    vec![
        ("team_id", meta.team_id.into()),
        ("season", meta.season.clone().into()),
        ("franchise_id", meta.franchise_id.into()),
        ("division_id", meta.division_id.into()),
        ("conference_id", meta.conference_id.into()),
    ]
}

pub fn team_season_stats_row(unique_id: i64, stats: &TeamSeasonStats) -> FieldMap {
    vec![
        ("unique_id", unique_id.into()),
        ("games_played", stats.games_played.into()),
        ("wins", stats.wins.into()),
        ("losses", stats.losses.into()),
        ("ot_losses", stats.ot_losses.into()),
        ("points", stats.points.into()),
        ("pt_pct", stats.pt_pct.into()),
        ("goals_for_pg", stats.goals_for_pg.into()),
        ("goals_ag_pg", stats.goals_ag_pg.into()),
        ("evgga_ratio", stats.evgga_ratio.into()),
        ("pp_pct", stats.pp_pct.into()),
        ("pp_goals_for", stats.pp_goals_for.into()),
        ("pp_opp", stats.pp_opp.into()),
        ("pk_pct", stats.pk_pct.into()),
        ("pp_goals_ag", stats.pp_goals_ag.into()),
        ("shots_for_pg", stats.shots_for_pg.into()),
        ("shots_ag_pg", stats.shots_ag_pg.into()),
        ("win_score_first", stats.win_score_first.into()),
        ("win_opp_score_first", stats.win_opp_score_first.into()),
        ("win_lead_first_per", stats.win_lead_first_per.into()),
        ("win_lead_second_per", stats.win_lead_second_per.into()),
        ("win_outshoot_opp", stats.win_outshoot_opp.into()),
        ("win_outshot_by_opp", stats.win_outshot_by_opp.into()),
        ("faceoffs_taken", stats.faceoffs_taken.into()),
        ("faceoff_wins", stats.faceoff_wins.into()),
        ("faceoff_losses", stats.faceoff_losses.into()),
        ("faceoff_pct", stats.faceoff_pct.into()),
        ("save_pct", stats.save_pct.into()),
        ("shooting_pct", stats.shooting_pct.into()),
    ]
}

pub fn player_season_row(meta: &PlayerSeasonMeta) -> FieldMap {
    vec![
        ("player_id", meta.player_id.into()),
        ("season", meta.season.clone().into()),
        ("league_id", meta.league_id.into()),
        ("league_name", meta.league_name.clone().into()),
        ("team_id", meta.team_id.into()),
        ("team_name", meta.team_name.clone().into()),
    ]
}

pub fn skater_season_stats_row(unique_id: i64, stats: &SkaterSeasonStats) -> FieldMap {
    vec![
        ("unique_id", unique_id.into()),
        ("time_on_ice", stats.time_on_ice.clone().into()),
        ("assists", stats.assists.into()),
        ("goals", stats.goals.into()),
        ("points", stats.points.into()),
        ("pims", stats.pims.into()),
        ("shots", stats.shots.into()),
        ("games", stats.games.into()),
        ("hits", stats.hits.into()),
        ("pp_goals", stats.pp_goals.into()),
        ("pp_points", stats.pp_points.into()),
        ("pp_toi", stats.pp_toi.clone().into()),
        ("sh_goals", stats.sh_goals.into()),
        ("sh_points", stats.sh_points.into()),
        ("sh_toi", stats.sh_toi.clone().into()),
        ("ev_toi", stats.ev_toi.clone().into()),
        ("faceoff_pct", stats.faceoff_pct.into()),
        ("shooting_pct", stats.shooting_pct.into()),
        ("gwg", stats.gwg.into()),
        ("ot_goals", stats.ot_goals.into()),
        ("plus_minus", stats.plus_minus.into()),
        ("blocked", stats.blocked.into()),
        ("shifts", stats.shifts.into()),
    ]
}

pub fn goalie_season_stats_row(unique_id: i64, stats: &GoalieSeasonStats) -> FieldMap {
    vec![
        ("unique_id", unique_id.into()),
        ("time_on_ice", stats.time_on_ice.clone().into()),
        ("shutouts", stats.shutouts.into()),
        ("wins", stats.wins.into()),
        ("losses", stats.losses.into()),
        ("ot_losses", stats.ot_losses.into()),
        ("ties", stats.ties.into()),
        ("saves", stats.saves.into()),
        ("pp_saves", stats.pp_saves.into()),
        ("sh_saves", stats.sh_saves.into()),
        ("ev_saves", stats.ev_saves.into()),
        ("pp_shots", stats.pp_shots.into()),
        ("sh_shots", stats.sh_shots.into()),
        ("ev_shots", stats.ev_shots.into()),
        ("save_pct", stats.save_pct.into()),
        ("gaa", stats.gaa.into()),
        ("games", stats.games.into()),
        ("games_started", stats.games_started.into()),
        ("shots_against", stats.shots_against.into()),
        ("goals_against", stats.goals_against.into()),
        ("pp_save_pct", stats.pp_save_pct.into()),
        ("sh_save_pct", stats.sh_save_pct.into()),
        ("ev_save_pct", stats.ev_save_pct.into()),
    ]
}
