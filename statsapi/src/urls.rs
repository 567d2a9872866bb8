//! Directory of upstream endpoints.

const BASE: &str = "https://statsapi.web.nhl.com/api/v1";

/// One upstream endpoint. Templated endpoints take the entity id in the
/// path; `Schedule` is parameterized by query string only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Teams,
    TeamRoster,
    People,
    PlayerStats,
    GameFeed,
    Schedule,
}

impl Endpoint {
    pub fn url(&self, id: i64) -> String {
        match self {
            Endpoint::Teams => format!("{BASE}/teams/{id}"),
            Endpoint::TeamRoster => format!("{BASE}/teams/{id}/roster"),
            Endpoint::People => format!("{BASE}/people/{id}"),
            Endpoint::PlayerStats => format!("{BASE}/people/{id}/stats"),
            Endpoint::GameFeed => format!("{BASE}/game/{id}/feed/live"),
            Endpoint::Schedule => self.base().to_string(),
        }
    }

    pub fn base(&self) -> &'static str {
        match self {
            Endpoint::Schedule => "https://statsapi.web.nhl.com/api/v1/schedule",
            Endpoint::Teams => "https://statsapi.web.nhl.com/api/v1/teams",
            Endpoint::TeamRoster => "https://statsapi.web.nhl.com/api/v1/teams",
            Endpoint::People => "https://statsapi.web.nhl.com/api/v1/people",
            Endpoint::PlayerStats => "https://statsapi.web.nhl.com/api/v1/people",
            Endpoint::GameFeed => "https://statsapi.web.nhl.com/api/v1/game",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templated_urls_embed_the_id() {
        assert_eq!(
            Endpoint::GameFeed.url(2019020001),
            "https://statsapi.web.nhl.com/api/v1/game/2019020001/feed/live"
        );
        assert_eq!(
            Endpoint::TeamRoster.url(5),
            "https://statsapi.web.nhl.com/api/v1/teams/5/roster"
        );
    }
}
