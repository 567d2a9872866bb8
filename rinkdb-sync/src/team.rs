//! One side of a game: identity plus the stat line that accretes while
//! the game runs.

use serde_json::Value;
use statsapi::GameStatus;
use statsapi::parse::{
    self, PeriodLine, ShootoutLine, TeamCore, TeamGameStats, TeamSide,
};

use crate::SyncError;
use crate::player::PlayerCollection;

/// A team's view of one game. `core` never changes after construction;
/// everything else is rewritten from the feed on each full refresh. The
/// stat fields stay `None`/empty while the game is a Preview, whose
/// payload structurally omits the subtrees they come from.
#[derive(Debug)]
pub struct GameTeam {
    pub side: TeamSide,
    pub core: TeamCore,
    pub goals: i64,
    pub stats: Option<TeamGameStats>,
    pub periods: Vec<PeriodLine>,
    pub shootout: Option<ShootoutLine>,
    /// Materialized on demand; most callers only want the aggregates.
    pub players: Option<PlayerCollection>,
}

impl GameTeam {
    pub fn from_feed(doc: &Value, side: TeamSide, status: GameStatus) -> Result<Self, SyncError> {
        let core = parse::team_core(doc, side)?;

        let mut team = GameTeam {
            side,
            core,
            goals: 0,
            stats: None,
            periods: Vec::new(),
            shootout: None,
            players: None,
        };
        if !status.is_preview() {
            team.apply_feed(doc)?;
        }
        Ok(team)
    }

    /// Re-parses this side's stat line from a fresh feed document. Every
    /// field written here was declared at construction; the struct shape
    /// is the contract between the parser and this entity.
    pub fn apply_feed(&mut self, doc: &Value) -> Result<(), SyncError> {
        self.goals = parse::team_goals(doc, self.side)?;
        self.stats = Some(parse::team_game_stats(doc, self.side)?);
        self.periods = parse::period_lines(doc, self.side)?;
        self.shootout = parse::shootout(doc, self.side)?;
        Ok(())
    }
}
