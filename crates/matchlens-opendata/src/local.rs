// Reader over a local checkout of the open-data repository's `data/` folder.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use matchlens_core::model::{parse_competitions, parse_matches, Competition, Match, RawEvent};
use matchlens_core::source::{EventSource, FetchError, TournamentQuery};

use crate::records::{self, COMPETITIONS_PATH};

pub struct LocalOpenData {
    root: PathBuf,
    max_concurrent: usize,
}

impl LocalOpenData {
    pub fn new(root: impl Into<PathBuf>, max_concurrent: usize) -> Self {
        Self {
            root: root.into(),
            max_concurrent,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_array(&self, relative: &str) -> Result<Vec<Value>, FetchError> {
        let path = self.root.join(relative);
        debug!("reading {}", path.display());
        let bytes = tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound(path.display().to_string())
            } else {
                FetchError::Io {
                    path: path.display().to_string(),
                    source,
                }
            }
        })?;
        records::decode_array(&path.display().to_string(), &bytes)
    }
}

#[async_trait]
impl EventSource for LocalOpenData {
    async fn competitions(&self) -> Result<Vec<Competition>, FetchError> {
        Ok(parse_competitions(self.read_array(COMPETITIONS_PATH).await?))
    }

    async fn matches(&self, competition_id: u32, season_id: u32) -> Result<Vec<Match>, FetchError> {
        let path = records::matches_path(competition_id, season_id);
        Ok(parse_matches(self.read_array(&path).await?))
    }

    async fn events(&self, match_id: u64) -> Result<Vec<RawEvent>, FetchError> {
        let values = self.read_array(&records::events_path(match_id)).await?;
        Ok(records::into_raw_events(values, match_id))
    }

    async fn tournament_events(
        &self,
        query: &TournamentQuery,
    ) -> Result<Vec<RawEvent>, FetchError> {
        records::collect_tournament(self, query, self.max_concurrent).await
    }
}
