//! Incremental synchronization of games, teams, and players against the
//! stats API.
//!
//! The engine's whole purpose is to avoid redundant network traffic: a
//! Final game is never fetched again, a Preview-to-Preview refresh only
//! touches the status code, and roster corrections are deferred until a
//! caller explicitly asks for them.

use miette::Diagnostic;
use thiserror::Error;

pub mod game;
pub mod player;
pub mod refresh;
pub mod team;

pub use game::{Game, RefreshOutcome};
pub use player::{PlayerCollection, ReplaceReport, RosterIndex};
pub use refresh::{RefreshReport, refresh_games};
pub use team::GameTeam;

#[derive(Debug, Error, Diagnostic)]
pub enum SyncError {
    #[error("error fetching from the stats API")]
    Fetch(
        #[from]
        #[diagnostic_source]
        statsapi::FetchError,
    ),

    #[error("error parsing a stats API document")]
    Parse(
        #[from]
        #[diagnostic_source]
        statsapi::ParseError,
    ),

    #[error("error writing to the local store")]
    Store(
        #[from]
        #[diagnostic_source]
        rinkdb_db::StoreError,
    ),
}
