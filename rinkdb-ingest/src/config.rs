use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct IngestConfig {
    pub db_path: PathBuf,
    /// Logical tasks per pipeline stage, not OS threads.
    pub workers_per_stage: usize,
    /// Capacity of the player-fetch queue; roster workers block once it
    /// fills, which is the pipeline's only backpressure.
    pub player_queue_capacity: usize,
    pub populate_on_launch: bool,
    pub include_season_stats: bool,
    /// Seasons to pull aggregate stats for, in upstream "20192020" form.
    pub seasons: Vec<String>,
    /// Seconds between refresh passes over the day's games.
    pub refresh_period: i64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("rinkdb.sqlite"),
            workers_per_stage: 3,
            player_queue_capacity: 12,
            populate_on_launch: true,
            include_season_stats: true,
            seasons: vec!["20192020".to_string()],
            refresh_period: 30 * 60, // 30 minutes in seconds
        }
    }
}

impl IngestConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("RINKDB.toml"))
            .merge(Env::prefixed("RINKDB_"))
    }

    pub fn config() -> figment::Result<Self> {
        Self::figment().extract()
    }
}
