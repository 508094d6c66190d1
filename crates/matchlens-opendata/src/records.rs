// Decoding of provider JSON files and tournament-wide assembly shared by the
// HTTP and local-directory sources.

use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::{info, warn};

use matchlens_core::model::RawEvent;
use matchlens_core::source::{resolve_competition, EventSource, FetchError, TournamentQuery};

/// Provider paths, relative to the data root.
pub const COMPETITIONS_PATH: &str = "competitions.json";

pub fn matches_path(competition_id: u32, season_id: u32) -> String {
    format!("matches/{competition_id}/{season_id}.json")
}

pub fn events_path(match_id: u64) -> String {
    format!("events/{match_id}.json")
}

/// Every provider file is a top-level JSON array.
pub fn decode_array(what: &str, bytes: &[u8]) -> Result<Vec<Value>, FetchError> {
    serde_json::from_slice(bytes).map_err(|source| FetchError::Decode {
        what: what.to_string(),
        source,
    })
}

/// Wrap event objects as raw records stamped with their match id. Entries that
/// are not JSON objects are skipped.
pub fn into_raw_events(values: Vec<Value>, match_id: u64) -> Vec<RawEvent> {
    let total = values.len();
    let events: Vec<RawEvent> = values
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(RawEvent(map).with_match_id(match_id)),
            _ => None,
        })
        .collect();
    if events.len() < total {
        warn!(
            "match {}: skipped {} non-object event entries",
            match_id,
            total - events.len()
        );
    }
    events
}

/// Resolve the tournament, list its matches and fetch every match's events
/// with at most `max_concurrent` requests in flight. Output keeps match order.
pub async fn collect_tournament<S>(
    source: &S,
    query: &TournamentQuery,
    max_concurrent: usize,
) -> Result<Vec<RawEvent>, FetchError>
where
    S: EventSource + ?Sized,
{
    let competitions = source.competitions().await?;
    let competition = resolve_competition(&competitions, query)
        .ok_or_else(|| FetchError::NotFound(format!("competition {query}")))?;
    let matches = source
        .matches(competition.competition_id, competition.season_id)
        .await?;
    info!(
        "fetching events for {} matches of {} ({} at a time)",
        matches.len(),
        query,
        max_concurrent
    );

    // Owned ids keep the stream `Send` inside the async-trait callers.
    let ids: Vec<u64> = matches.iter().map(|m| m.match_id).collect();
    let per_match: Vec<Vec<RawEvent>> = stream::iter(ids.into_iter().map(|id| source.events(id)))
        .buffered(max_concurrent.max(1))
        .try_collect()
        .await?;
    Ok(per_match.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_follow_provider_layout() {
        assert_eq!(matches_path(55, 282), "matches/55/282.json");
        assert_eq!(events_path(3942819), "events/3942819.json");
    }

    #[test]
    fn non_objects_skipped_and_match_id_stamped() {
        let values = vec![json!({"type": {"name": "Pass"}}), json!(42), json!(null)];
        let events = into_raw_events(values, 7);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].get("match_id"), Some(&json!(7)));
    }

    #[test]
    fn decode_error_names_the_file() {
        let err = decode_array("events/1.json", b"{not json").unwrap_err();
        assert!(err.to_string().contains("events/1.json"));
    }
}
