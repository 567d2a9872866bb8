//! Static table of franchise abbreviations and their API team ids.
//!
//! Loaded once at compile time; the population pipeline seeds itself from
//! this table, and callers can resolve an abbreviation to an id without a
//! network round-trip.

use phf::phf_map;

pub static TEAM_IDS: phf::Map<&'static str, i64> = phf_map! {
    "NJD" => 1, "NYI" => 2, "NYR" => 3, "PHI" => 4,
    "PIT" => 5, "BOS" => 6, "BUF" => 7, "MTL" => 8,
    "OTT" => 9, "TOR" => 10, "CAR" => 12, "FLA" => 13,
    "TBL" => 14, "WSH" => 15, "CHI" => 16, "DET" => 17,
    "NSH" => 18, "STL" => 19, "CGY" => 20, "COL" => 21,
    "EDM" => 22, "VAN" => 23, "ANA" => 24, "DAL" => 25,
    "LAK" => 26, "SJS" => 28, "CBJ" => 29, "MIN" => 30,
    "WPG" => 52, "ARI" => 53, "VGK" => 54,
};

pub fn team_id(abbreviation: &str) -> Option<i64> {
    TEAM_IDS.get(abbreviation).copied()
}

/// All known team ids in ascending order. Sorted so pipeline seeding is
/// deterministic.
pub fn all_team_ids() -> Vec<i64> {
    let mut ids: Vec<i64> = TEAM_IDS.values().copied().collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_abbreviation() {
        assert_eq!(team_id("BOS"), Some(6));
        assert_eq!(team_id("XXX"), None);
    }

    #[test]
    fn all_ids_are_unique_and_sorted() {
        let ids = all_team_ids();
        assert_eq!(ids.len(), TEAM_IDS.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
