//! The game entity and its refresh state machine.
//!
//! Preview, Live, and Final are a one-way street. Final is terminal: a
//! refresh of a Final game makes no network call at all, which is the
//! single biggest traffic saving the engine makes across a season of
//! mostly-finished games.

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde_json::Value;
use statsapi::parse::{self, TeamSide};
use statsapi::urls::Endpoint;
use statsapi::{GameStatus, Transport};

use rinkdb_db::Store;

use crate::SyncError;
use crate::player::PlayerCollection;
use crate::team::GameTeam;

/// What a refresh actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The game was already Final; nothing was fetched.
    SkippedFinal,
    /// Preview to Preview: only the status code was rewritten.
    StatusOnly,
    /// Live fields and both team stat lines were refreshed.
    Updated,
}

#[derive(Debug)]
pub struct Game {
    pub game_id: i64,
    pub status_code: i64,
    pub status: GameStatus,
    pub start_time: DateTime<Utc>,
    pub game_date: NaiveDate,
    /// `None` until the game leaves Preview; the Preview payload has no
    /// linescore to read them from.
    pub period: Option<String>,
    pub time_remaining: Option<String>,
    pub in_intermission: Option<bool>,
    pub home: GameTeam,
    pub away: GameTeam,
}

impl Game {
    /// Builds a game from a single feed fetch.
    pub async fn fetch<T: Transport>(transport: &T, game_id: i64) -> Result<Game, SyncError> {
        let doc = transport
            .fetch(&Endpoint::GameFeed.url(game_id), &[])
            .await?;
        Game::from_feed(game_id, &doc)
    }

    pub fn from_feed(game_id: i64, doc: &Value) -> Result<Game, SyncError> {
        let feed = parse::game_feed(doc)?;
        let home = GameTeam::from_feed(doc, TeamSide::Home, feed.status)?;
        let away = GameTeam::from_feed(doc, TeamSide::Away, feed.status)?;

        let (period, time_remaining, in_intermission) = match feed.live {
            Some(live) => (
                Some(live.period),
                Some(live.time_remaining),
                Some(live.in_intermission),
            ),
            None => (None, None, None),
        };

        Ok(Game {
            game_id,
            status_code: feed.status_code,
            status: feed.status,
            start_time: feed.start_time,
            game_date: feed.game_date,
            period,
            time_remaining,
            in_intermission,
            home,
            away,
        })
    }

    /// Refreshes this game from the feed, doing as little as the status
    /// allows.
    ///
    /// The branch order is a correctness requirement, not a tuning knob:
    /// a Final game must not be fetched at all, and a Preview-to-Preview
    /// refresh must not touch the live fields, whose source subtree the
    /// Preview payload omits.
    pub async fn refresh<T: Transport>(
        &mut self,
        transport: &T,
        store: &Store,
    ) -> Result<RefreshOutcome, SyncError> {
        if self.status.is_final() {
            debug!("Game {} is final, skipping fetch", self.game_id);
            return Ok(RefreshOutcome::SkippedFinal);
        }

        let doc = transport
            .fetch(&Endpoint::GameFeed.url(self.game_id), &[])
            .await?;
        let feed = parse::game_feed(&doc)?;

        if self.status.is_preview() && feed.status.is_preview() {
            self.status_code = feed.status_code;
            return Ok(RefreshOutcome::StatusOnly);
        }

        self.status_code = feed.status_code;
        self.status = feed.status;
        if let Some(live) = feed.live {
            self.period = Some(live.period);
            self.time_remaining = Some(live.time_remaining);
            self.in_intermission = Some(live.in_intermission);
        }
        self.home.apply_feed(&doc)?;
        self.away.apply_feed(&doc)?;

        // A roster delta noticed here stays deferred; the cascade only
        // records it.
        for team in [&mut self.home, &mut self.away] {
            let roster = parse::boxscore_players(&doc, team.side)?;
            let upstream_ids: Vec<i64> = roster.iter().map(|p| p.player_id).collect();
            team.players = Some(PlayerCollection::new(
                store,
                team.core.team_id,
                upstream_ids,
                &roster,
            )?);
        }

        Ok(RefreshOutcome::Updated)
    }
}
