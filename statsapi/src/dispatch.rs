//! Work units routed through the population pipeline.
//!
//! A [`Dispatch`] pairs an upstream entity id with the kind of fetch to
//! perform for it; the kind determines the endpoint, query parameters,
//! parser, and destination table.

use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error;

use crate::urls::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    TeamInfo,
    TeamRoster,
    PlayerInfo,
    TeamSeason,
    SkaterSeason,
    GoalieSeason,
}

impl DispatchKind {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            DispatchKind::TeamInfo => Endpoint::Teams,
            DispatchKind::TeamRoster => Endpoint::TeamRoster,
            DispatchKind::PlayerInfo => Endpoint::People,
            DispatchKind::TeamSeason => Endpoint::Teams,
            DispatchKind::SkaterSeason | DispatchKind::GoalieSeason => Endpoint::PlayerStats,
        }
    }

    /// Table the parsed result lands in. Roster items only produce
    /// follow-on work, so they have no destination of their own.
    pub fn table(&self) -> Option<&'static str> {
        match self {
            DispatchKind::TeamInfo => Some("team"),
            DispatchKind::TeamRoster => None,
            DispatchKind::PlayerInfo => Some("player"),
            DispatchKind::TeamSeason => Some("team_season"),
            DispatchKind::SkaterSeason => Some("skater_season_stats"),
            DispatchKind::GoalieSeason => Some("goalie_season_stats"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchKind::TeamInfo => "team_info",
            DispatchKind::TeamRoster => "team_roster",
            DispatchKind::PlayerInfo => "player_info",
            DispatchKind::TeamSeason => "team_season",
            DispatchKind::SkaterSeason => "skater_season",
            DispatchKind::GoalieSeason => "goalie_season",
        }
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("unrecognized dispatch kind `{0}`")]
pub struct UnknownDispatchKind(pub String);

impl FromStr for DispatchKind {
    type Err = UnknownDispatchKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team_info" => Ok(DispatchKind::TeamInfo),
            "team_roster" => Ok(DispatchKind::TeamRoster),
            "player_info" => Ok(DispatchKind::PlayerInfo),
            "team_season" => Ok(DispatchKind::TeamSeason),
            "skater_season" => Ok(DispatchKind::SkaterSeason),
            "goalie_season" => Ok(DispatchKind::GoalieSeason),
            other => Err(UnknownDispatchKind(other.to_string())),
        }
    }
}

/// One unit of pipeline work: fetch `kind` for `entity_id`. Season-scoped
/// kinds carry the season they address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub kind: DispatchKind,
    pub entity_id: i64,
    pub season: Option<String>,
}

impl Dispatch {
    pub fn team_info(team_id: i64) -> Self {
        Dispatch {
            kind: DispatchKind::TeamInfo,
            entity_id: team_id,
            season: None,
        }
    }

    pub fn team_roster(team_id: i64) -> Self {
        Dispatch {
            kind: DispatchKind::TeamRoster,
            entity_id: team_id,
            season: None,
        }
    }

    pub fn player_info(player_id: i64) -> Self {
        Dispatch {
            kind: DispatchKind::PlayerInfo,
            entity_id: player_id,
            season: None,
        }
    }

    pub fn team_season(team_id: i64, season: &str) -> Self {
        Dispatch {
            kind: DispatchKind::TeamSeason,
            entity_id: team_id,
            season: Some(season.to_string()),
        }
    }

    pub fn skater_season(player_id: i64, season: &str) -> Self {
        Dispatch {
            kind: DispatchKind::SkaterSeason,
            entity_id: player_id,
            season: Some(season.to_string()),
        }
    }

    pub fn goalie_season(player_id: i64, season: &str) -> Self {
        Dispatch {
            kind: DispatchKind::GoalieSeason,
            entity_id: player_id,
            season: Some(season.to_string()),
        }
    }

    pub fn url(&self) -> String {
        self.kind.endpoint().url(self.entity_id)
    }

    /// Query parameters for the fetch. Season-scoped kinds address a
    /// single season; the rest take no parameters.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        match self.kind {
            DispatchKind::TeamSeason => {
                params.push(("expand", "team.stats".to_string()));
            }
            DispatchKind::SkaterSeason | DispatchKind::GoalieSeason => {
                params.push(("stats", "statsSingleSeason".to_string()));
            }
            _ => {}
        }
        if let Some(season) = &self.season {
            params.push(("season", season.clone()));
        }
        params
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.season {
            Some(season) => write!(f, "{} {} ({season})", self.kind, self.entity_id),
            None => write!(f, "{} {}", self.kind, self.entity_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            DispatchKind::TeamInfo,
            DispatchKind::TeamRoster,
            DispatchKind::PlayerInfo,
            DispatchKind::TeamSeason,
            DispatchKind::SkaterSeason,
            DispatchKind::GoalieSeason,
        ] {
            assert_eq!(kind.as_str().parse::<DispatchKind>().unwrap(), kind);
        }
        assert!("boxscore".parse::<DispatchKind>().is_err());
    }

    #[test]
    fn season_kinds_carry_season_params() {
        let dispatch = Dispatch::skater_season(8470600, "20192020");
        assert!(dispatch.url().ends_with("/people/8470600/stats"));
        assert_eq!(
            dispatch.params(),
            vec![
                ("stats", "statsSingleSeason".to_string()),
                ("season", "20192020".to_string()),
            ]
        );
    }

    #[test]
    fn plain_kinds_take_no_params() {
        let dispatch = Dispatch::team_roster(6);
        assert!(dispatch.url().ends_with("/teams/6/roster"));
        assert!(dispatch.params().is_empty());
    }
}
