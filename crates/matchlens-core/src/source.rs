// Upstream data source seam.
//
// The provider is an external collaborator: four read-only bulk calls that
// return raw records. Implementations live in their own crates; tests use
// in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::{Competition, Match, RawEvent};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        source: serde_json::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("not found: {0}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// Tournament query
// ---------------------------------------------------------------------------

/// Identifies a tournament-wide event dump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TournamentQuery {
    pub country: String,
    pub division: String,
    pub season: String,
    pub gender: String,
}

impl fmt::Display for TournamentQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} {} ({})",
            self.country, self.division, self.season, self.gender
        )
    }
}

/// Find the competition season a query refers to. Matching ignores case and
/// surrounding whitespace.
pub fn resolve_competition<'a>(
    competitions: &'a [Competition],
    query: &TournamentQuery,
) -> Option<&'a Competition> {
    let same = |a: &str, b: &str| a.trim().eq_ignore_ascii_case(b.trim());
    competitions.iter().find(|c| {
        same(&c.country_name, &query.country)
            && same(&c.competition_name, &query.division)
            && same(&c.season_name, &query.season)
            && same(&c.competition_gender, &query.gender)
    })
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Read-only access to the provider. Every call is a potentially slow bulk
/// fetch; callers go through `TournamentCache` instead of calling this
/// directly.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn competitions(&self) -> Result<Vec<Competition>, FetchError>;

    async fn matches(&self, competition_id: u32, season_id: u32) -> Result<Vec<Match>, FetchError>;

    /// Events of one match. Each record carries `match_id`.
    async fn events(&self, match_id: u64) -> Result<Vec<RawEvent>, FetchError>;

    /// Every event of every match in the tournament.
    async fn tournament_events(&self, query: &TournamentQuery) -> Result<Vec<RawEvent>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competition(country: &str, name: &str, season: &str, gender: &str) -> Competition {
        Competition {
            competition_id: 1,
            season_id: 2,
            country_name: country.into(),
            competition_name: name.into(),
            competition_gender: gender.into(),
            season_name: season.into(),
        }
    }

    #[test]
    fn resolves_matching_competition() {
        let comps = vec![
            competition("Europe", "UEFA Euro", "2020", "male"),
            competition("Europe", "UEFA Euro", "2024", "male"),
            competition("Europe", "UEFA Women's Euro", "2022", "female"),
        ];
        let query = TournamentQuery {
            country: "europe".into(),
            division: "UEFA Euro ".into(),
            season: "2024".into(),
            gender: "Male".into(),
        };
        let found = resolve_competition(&comps, &query).unwrap();
        assert_eq!(found.season_name, "2024");
    }

    #[test]
    fn unknown_tournament_is_none() {
        let comps = vec![competition("Europe", "UEFA Euro", "2024", "male")];
        let query = TournamentQuery {
            country: "Europe".into(),
            division: "Copa America".into(),
            season: "2024".into(),
            gender: "male".into(),
        };
        assert!(resolve_competition(&comps, &query).is_none());
    }
}
