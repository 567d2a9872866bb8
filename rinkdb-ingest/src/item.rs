//! Processing for one pipeline work item.
//!
//! Each item is one fetch, one parse, and one (or one two-phase) write.
//! Items can hand follow-on work to the next stage: a team item produces
//! its roster item, a roster item produces one item per player.

use log::debug;
use miette::Diagnostic;
use thiserror::Error;

use rinkdb_db::{Store, StoreError};
use statsapi::dispatch::{Dispatch, DispatchKind};
use statsapi::parse::{self, ParseError};
use statsapi::{FetchError, Transport};

#[derive(Debug, Error, Diagnostic)]
pub enum ItemError {
    #[error("error fetching from the stats API")]
    Fetch(#[from] FetchError),

    #[error("error parsing a stats API document")]
    Parse(#[from] ParseError),

    #[error("error writing to the local store")]
    Store(#[from] StoreError),

    #[error("dispatch `{0}` requires a season")]
    MissingSeason(Dispatch),
}

/// Runs one dispatch to completion and returns the follow-on work it
/// produced for the next stage.
pub async fn process_item<T: Transport>(
    transport: &T,
    store: &Store,
    dispatch: &Dispatch,
    seasons: &[String],
) -> Result<Vec<Dispatch>, ItemError> {
    debug!("Processing {dispatch}");
    let doc = transport.fetch(&dispatch.url(), &dispatch.params()).await?;

    match dispatch.kind {
        DispatchKind::TeamInfo => {
            let team = parse::team_info(&doc)?;
            rinkdb_db::write_team(store, &team)?;
            Ok(vec![Dispatch::team_roster(team.team_id)])
        }
        DispatchKind::TeamRoster => {
            let player_ids = parse::roster(&doc)?;
            Ok(player_ids.into_iter().map(Dispatch::player_info).collect())
        }
        DispatchKind::PlayerInfo => {
            let player = parse::player_info(&doc)?;
            rinkdb_db::write_player(store, &player)?;

            // Season aggregates are pulled here rather than through a
            // fourth stage: the last stage has no downstream queue to
            // hand them to.
            for season in seasons {
                let kind = if player.position == "G" {
                    DispatchKind::GoalieSeason
                } else {
                    DispatchKind::SkaterSeason
                };
                let follow = Dispatch {
                    kind,
                    entity_id: player.player_id,
                    season: Some(season.clone()),
                };
                let doc = transport.fetch(&follow.url(), &follow.params()).await?;
                write_player_season(store, &follow, &doc)?;
            }
            Ok(Vec::new())
        }
        DispatchKind::TeamSeason => {
            let season = dispatch
                .season
                .as_deref()
                .ok_or_else(|| ItemError::MissingSeason(dispatch.clone()))?;
            let team_season = parse::team_season(&doc, season)?;
            rinkdb_db::write_team_season(store, &team_season)?;
            Ok(Vec::new())
        }
        DispatchKind::SkaterSeason | DispatchKind::GoalieSeason => {
            write_player_season(store, dispatch, &doc)?;
            Ok(Vec::new())
        }
    }
}

/// A player with no stats for the requested season is a skip, not a
/// failure.
fn write_player_season(
    store: &Store,
    dispatch: &Dispatch,
    doc: &serde_json::Value,
) -> Result<(), ItemError> {
    match dispatch.kind {
        DispatchKind::GoalieSeason => {
            if let Some(season) = parse::goalie_season(dispatch.entity_id, doc)? {
                rinkdb_db::write_goalie_season(store, &season)?;
            } else {
                debug!("No season stats for {dispatch}");
            }
        }
        _ => {
            if let Some(season) = parse::skater_season(dispatch.entity_id, doc)? {
                rinkdb_db::write_skater_season(store, &season)?;
            } else {
                debug!("No season stats for {dispatch}");
            }
        }
    }
    Ok(())
}
