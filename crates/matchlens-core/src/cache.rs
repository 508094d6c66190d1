// Tournament data cache: memoized bulk fetches keyed by query parameters.
//
// Each fetch function has its own key space. A key is fetched upstream at
// most once per successful result; failures are never stored, so the next
// request retries. Concurrent misses on the same key may both fetch; the
// first result inserted wins and both callers receive it.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::model::{Competition, EventTable, Match, TournamentEvents};
use crate::normalize::normalize_events;
use crate::source::{EventSource, FetchError, TournamentQuery};

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A cache key: which fetch, with which arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchKey {
    Competitions,
    Matches { competition_id: u32, season_id: u32 },
    MatchEvents(BTreeSet<u64>),
    TournamentEvents(TournamentQuery),
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKey::Competitions => write!(f, "competitions"),
            FetchKey::Matches {
                competition_id,
                season_id,
            } => write!(f, "matches({competition_id}, {season_id})"),
            FetchKey::MatchEvents(ids) => write!(f, "events({ids:?})"),
            FetchKey::TournamentEvents(q) => write!(f, "tournament({q})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Memo table
// ---------------------------------------------------------------------------

struct Memo<V> {
    entries: Mutex<HashMap<FetchKey, Arc<V>>>,
}

impl<V> Memo<V> {
    fn new() -> Self {
        Memo {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<FetchKey, Arc<V>>> {
        self.entries.lock().expect("cache mutex poisoned")
    }

    fn lookup(&self, key: &FetchKey) -> Option<Arc<V>> {
        self.entries().get(key).cloned()
    }

    /// Store `value` unless another caller got there first; return whichever
    /// value the cache now holds.
    fn insert_first(&self, key: FetchKey, value: V) -> Arc<V> {
        self.entries()
            .entry(key)
            .or_insert_with(|| Arc::new(value))
            .clone()
    }

    fn contains(&self, key: &FetchKey) -> bool {
        self.entries().contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

// ---------------------------------------------------------------------------
// TournamentCache
// ---------------------------------------------------------------------------

/// Process-lifetime memoization of the four provider calls.
pub struct TournamentCache<S> {
    source: S,
    competitions: Memo<Vec<Competition>>,
    matches: Memo<Vec<Match>>,
    match_events: Memo<EventTable>,
    tournament: Memo<TournamentEvents>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<S: EventSource> TournamentCache<S> {
    pub fn new(source: S) -> Self {
        TournamentCache {
            source,
            competitions: Memo::new(),
            matches: Memo::new(),
            match_events: Memo::new(),
            tournament: Memo::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.competitions.len()
                + self.matches.len()
                + self.match_events.len()
                + self.tournament.len(),
        }
    }

    /// Whether a successful result is stored for `key`.
    pub fn contains(&self, key: &FetchKey) -> bool {
        match key {
            FetchKey::Competitions => self.competitions.contains(key),
            FetchKey::Matches { .. } => self.matches.contains(key),
            FetchKey::MatchEvents(_) => self.match_events.contains(key),
            FetchKey::TournamentEvents(_) => self.tournament.contains(key),
        }
    }

    async fn get_or_fetch<V, F, Fut>(
        &self,
        memo: &Memo<V>,
        key: FetchKey,
        fetch: F,
    ) -> Result<Arc<V>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>>,
    {
        if let Some(value) = memo.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("cache hit: {key}");
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("cache miss: {key}");
        let value = fetch().await?;
        Ok(memo.insert_first(key, value))
    }

    pub async fn competitions(&self) -> Result<Arc<Vec<Competition>>, FetchError> {
        self.get_or_fetch(&self.competitions, FetchKey::Competitions, || {
            self.source.competitions()
        })
        .await
    }

    pub async fn matches(
        &self,
        competition_id: u32,
        season_id: u32,
    ) -> Result<Arc<Vec<Match>>, FetchError> {
        let key = FetchKey::Matches {
            competition_id,
            season_id,
        };
        self.get_or_fetch(&self.matches, key, || {
            self.source.matches(competition_id, season_id)
        })
        .await
    }

    /// Normalized events for a set of matches. The key is the exact set, so a
    /// different selection is a separate entry. An empty set yields an empty
    /// table without calling upstream.
    pub async fn match_events<I>(&self, match_ids: I) -> Result<Arc<EventTable>, FetchError>
    where
        I: IntoIterator<Item = u64>,
    {
        let ids: BTreeSet<u64> = match_ids.into_iter().collect();
        let key = FetchKey::MatchEvents(ids.clone());
        self.get_or_fetch(&self.match_events, key, || async {
            let mut tables = Vec::with_capacity(ids.len());
            for id in &ids {
                let raws = self.source.events(*id).await?;
                tables.push(normalize_events(&raws));
            }
            let table = EventTable::concat(tables);
            info!("fetched {} events for {} match(es)", table.len(), ids.len());
            Ok(table)
        })
        .await
    }

    /// Normalized tournament-wide events.
    pub async fn tournament_events(
        &self,
        query: &TournamentQuery,
    ) -> Result<Arc<TournamentEvents>, FetchError> {
        let key = FetchKey::TournamentEvents(query.clone());
        self.get_or_fetch(&self.tournament, key, || async {
            let raws = self.source.tournament_events(query).await?;
            let table = normalize_events(&raws);
            info!("fetched {} tournament events for {}", table.len(), query);
            Ok(TournamentEvents::new(table))
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawEvent;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicBool;

    /// Counts every upstream call; optionally fails event fetches.
    #[derive(Default)]
    struct CountingSource {
        competition_calls: AtomicUsize,
        match_calls: AtomicUsize,
        event_calls: AtomicUsize,
        tournament_calls: AtomicUsize,
        fail_events: AtomicBool,
    }

    #[async_trait]
    impl EventSource for CountingSource {
        async fn competitions(&self) -> Result<Vec<Competition>, FetchError> {
            self.competition_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn matches(&self, _c: u32, _s: u32) -> Result<Vec<Match>, FetchError> {
            self.match_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn events(&self, match_id: u64) -> Result<Vec<RawEvent>, FetchError> {
            self.event_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_events.load(Ordering::SeqCst) {
                return Err(FetchError::NotFound(format!("events/{match_id}.json")));
            }
            let raw: RawEvent =
                serde_json::from_value(json!({"type": "Pass", "team": "A", "location": [1.0, 2.0]}))
                    .unwrap();
            Ok(vec![raw.with_match_id(match_id)])
        }

        async fn tournament_events(
            &self,
            _q: &TournamentQuery,
        ) -> Result<Vec<RawEvent>, FetchError> {
            self.tournament_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    fn query() -> TournamentQuery {
        TournamentQuery {
            country: "Europe".into(),
            division: "UEFA Euro".into(),
            season: "2024".into(),
            gender: "male".into(),
        }
    }

    #[tokio::test]
    async fn same_match_set_returns_identical_table() {
        let cache = TournamentCache::new(CountingSource::default());
        let first = cache.match_events([1, 2]).await.unwrap();
        let second = cache.match_events([2, 1]).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.source().event_calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.len(), 2);
        assert_eq!(first.match_ids(), [1, 2].into_iter().collect());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn different_match_set_is_a_miss() {
        let cache = TournamentCache::new(CountingSource::default());
        let a = cache.match_events([1, 2]).await.unwrap();
        let b = cache.match_events([1]).await.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.len(), 1);
        assert_eq!(cache.source().event_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_match_set_skips_upstream() {
        let cache = TournamentCache::new(CountingSource::default());
        let table = cache.match_events(Vec::new()).await.unwrap();
        assert!(table.is_empty());
        assert_eq!(cache.source().event_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_fetch_not_memoized() {
        let cache = TournamentCache::new(CountingSource::default());
        cache.source().fail_events.store(true, Ordering::SeqCst);
        assert!(cache.match_events([7]).await.is_err());
        assert!(!cache.contains(&FetchKey::MatchEvents([7].into_iter().collect())));

        cache.source().fail_events.store(false, Ordering::SeqCst);
        let table = cache.match_events([7]).await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(cache.source().event_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_fetches_memoized_per_key() {
        let cache = TournamentCache::new(CountingSource::default());
        cache.competitions().await.unwrap();
        cache.competitions().await.unwrap();
        cache.matches(55, 282).await.unwrap();
        cache.matches(55, 282).await.unwrap();
        cache.matches(43, 106).await.unwrap();
        cache.tournament_events(&query()).await.unwrap();
        cache.tournament_events(&query()).await.unwrap();

        let source = cache.source();
        assert_eq!(source.competition_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.match_calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.tournament_calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&FetchKey::TournamentEvents(query())));
        assert_eq!(cache.stats().entries, 4);
    }

    #[test]
    fn keys_display() {
        let key = FetchKey::Matches {
            competition_id: 55,
            season_id: 282,
        };
        assert_eq!(key.to_string(), "matches(55, 282)");
        assert_eq!(FetchKey::Competitions.to_string(), "competitions");
    }
}
